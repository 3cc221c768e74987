//! Data models for `GeoGuide`
//!
//! All values are built per request and dropped once the response is sent:
//! - Location: geographic coordinates
//! - Poi: search queries, search results and the composed answer

pub mod location;
pub mod poi;

pub use location::Coordinate;
pub use poi::{LocalizedAnswer, PoiQuery, PoiResult};
