//! Narrative generation through a chat-completion model
//!
//! The model is asked, in natural language, for the nearest point of interest
//! of a category around a coordinate. Its answer is returned as free text.

pub mod client;
pub mod sse;

use async_trait::async_trait;

use crate::Result;
use crate::models::PoiQuery;

pub use client::ChatCompletionClient;

/// System instruction sent with every prompt
pub const SYSTEM_PROMPT: &str = "You are an assistant providing geospatial information.";

/// Produces a natural-language answer for a POI query
#[async_trait]
pub trait NarrativeGenerator: Send + Sync {
    async fn generate(&self, query: &PoiQuery) -> Result<String>;
}

/// User message for a query
#[must_use]
pub fn user_prompt(query: &PoiQuery) -> String {
    format!(
        "Find the nearest {} to the location {}.",
        query.category,
        query.location.describe()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Coordinate;

    #[test]
    fn test_user_prompt() {
        let query = PoiQuery::new(Coordinate::new(40.7128, -74.006).unwrap(), "restaurant");
        assert_eq!(
            user_prompt(&query),
            "Find the nearest restaurant to the location latitude 40.7128, longitude -74.006."
        );
    }

    #[test]
    fn test_category_passed_verbatim() {
        let query = PoiQuery::new(Coordinate::new(0.5, 0.25).unwrap(), "24h pharmacy & café");
        assert!(user_prompt(&query).starts_with("Find the nearest 24h pharmacy & café to"));
    }
}
