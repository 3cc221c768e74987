//! HTTP routes of the service
//!
//! `GET /` greets, `GET /coordinates` reports the caller's approximate
//! position and `GET /poi` answers a nearest-place query. Each path is
//! also served with a trailing slash.

mod handlers;
mod types;

use std::sync::Arc;

use axum::{Router, routing::get};

use crate::geolocation::GeoLocator;
use crate::localizer::LocalizedInformationService;

pub use types::{ApiError, FieldError, Greeting, PoiParams};

/// Collaborators shared by every request, built once at startup
#[derive(Clone)]
pub struct AppState {
    pub locator: Arc<dyn GeoLocator>,
    pub localizer: LocalizedInformationService,
}

impl AppState {
    pub fn new(locator: Arc<dyn GeoLocator>, localizer: LocalizedInformationService) -> Self {
        Self { locator, localizer }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/coordinates", get(handlers::get_coordinates))
        .route("/coordinates/", get(handlers::get_coordinates))
        .route("/poi", get(handlers::get_poi))
        .route("/poi/", get(handlers::get_poi))
        .with_state(state)
}
