//! Point-of-interest query, result and composed answer

use serde::{Deserialize, Serialize};

use super::Coordinate;

/// What the caller is looking for and where
#[derive(Debug, Clone, PartialEq)]
pub struct PoiQuery {
    pub location: Coordinate,
    /// Free-text category, passed through verbatim (e.g. "restaurant")
    pub category: String,
}

impl PoiQuery {
    #[must_use]
    pub fn new(location: Coordinate, category: impl Into<String>) -> Self {
        Self {
            location,
            category: category.into(),
        }
    }
}

/// First match returned by the places-search provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoiResult {
    pub name: String,
    pub address: String,
}

/// Narrative and nearest place merged into one response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedAnswer {
    #[serde(rename = "query")]
    pub narrative: String,
    #[serde(rename = "nearest_place")]
    pub nearest_place_name: String,
    #[serde(rename = "address")]
    pub nearest_place_address: String,
}

impl LocalizedAnswer {
    #[must_use]
    pub fn new(narrative: String, place: PoiResult) -> Self {
        Self {
            narrative,
            nearest_place_name: place.name,
            nearest_place_address: place.address,
        }
    }

    /// One-line summary used by the command line
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "{}. The nearest place is {}, located at {}.",
            self.narrative, self.nearest_place_name, self.nearest_place_address
        )
    }
}
