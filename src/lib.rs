//! `GeoGuide` - nearest point-of-interest lookup
//!
//! Combines a language-model narrative about the nearest place of a given
//! category with the actual result of a places search, and resolves a
//! caller's approximate position from their network address.

pub mod api;
pub mod config;
pub mod error;
pub mod geolocation;
pub mod localizer;
pub mod logging;
pub mod maps;
pub mod models;
pub mod narrative;
pub mod web;

// Re-export core types for public API
pub use crate::config::GeoguideConfig;
pub use error::GeoguideError;
pub use geolocation::{GeoLocator, IpInfoLocator};
pub use localizer::LocalizedInformationService;
pub use maps::{AzureMapsClient, PoiSearch};
pub use models::{Coordinate, LocalizedAnswer, PoiQuery, PoiResult};
pub use narrative::{ChatCompletionClient, NarrativeGenerator};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, GeoguideError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
