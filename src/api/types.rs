use std::collections::HashMap;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;
use tracing::{error, warn};

use crate::GeoguideError;
use crate::models::{Coordinate, PoiQuery};

/// Body of `GET /`
#[derive(Serialize, Debug, PartialEq, Eq)]
pub struct Greeting {
    pub message: &'static str,
}

/// One rejected request field
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Location of the field, e.g. `["query", "latitude"]`
    pub loc: Vec<String>,
    pub msg: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl FieldError {
    pub fn query(field: &str, msg: impl Into<String>, kind: &str) -> Self {
        Self {
            loc: vec!["query".to_string(), field.to_string()],
            msg: msg.into(),
            kind: kind.to_string(),
        }
    }
}

/// Error returned by a handler
#[derive(Debug)]
pub enum ApiError {
    /// Request parameters rejected, one entry per field
    Validation(Vec<FieldError>),
    /// A collaborator failed or had no answer
    Service(GeoguideError),
}

impl From<GeoguideError> for ApiError {
    fn from(err: GeoguideError) -> Self {
        match err {
            GeoguideError::Validation { field, message, kind } => {
                ApiError::Validation(vec![FieldError::query(&field, message, kind)])
            }
            other => ApiError::Service(other),
        }
    }
}

impl ApiError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Service(err) => match err {
                GeoguideError::NotFound { .. } => StatusCode::NOT_FOUND,
                GeoguideError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
                GeoguideError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                GeoguideError::Upstream { .. }
                | GeoguideError::Config { .. }
                | GeoguideError::Io { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            ApiError::Validation(fields) => {
                warn!("Rejected request parameters: {:?}", fields);
                json!({ "detail": fields })
            }
            ApiError::Service(err) => {
                if status.is_server_error() {
                    error!("Request failed: {}", err);
                } else {
                    warn!("Request failed: {}", err);
                }
                json!({ "detail": err.to_string() })
            }
        };
        (status, Json(body)).into_response()
    }
}

/// Raw `/poi` query parameters
#[derive(Debug, Default)]
pub struct PoiParams {
    params: HashMap<String, String>,
}

impl From<HashMap<String, String>> for PoiParams {
    fn from(params: HashMap<String, String>) -> Self {
        Self { params }
    }
}

impl PoiParams {
    /// Validate every field, reporting all failures at once
    pub fn into_query(self) -> Result<PoiQuery, ApiError> {
        let mut errors = Vec::new();

        let latitude = self.coordinate_field("latitude", 90.0, &mut errors);
        let longitude = self.coordinate_field("longitude", 180.0, &mut errors);

        let category = match self.params.get("poi_type") {
            None => {
                errors.push(FieldError::query("poi_type", "field required", "missing"));
                None
            }
            Some(value) if value.is_empty() => {
                errors.push(FieldError::query(
                    "poi_type",
                    "poi_type must not be empty",
                    "string_too_short",
                ));
                None
            }
            Some(value) => Some(value.clone()),
        };

        match (latitude, longitude, category) {
            (Some(lat), Some(lon), Some(category)) if errors.is_empty() => {
                let location = Coordinate::new(lat, lon)?;
                Ok(PoiQuery::new(location, category))
            }
            _ => Err(ApiError::Validation(errors)),
        }
    }

    fn coordinate_field(
        &self,
        name: &str,
        bound: f64,
        errors: &mut Vec<FieldError>,
    ) -> Option<f64> {
        let Some(raw) = self.params.get(name) else {
            errors.push(FieldError::query(name, "field required", "missing"));
            return None;
        };

        match raw.trim().parse::<f64>() {
            Ok(value) if value.is_finite() => {
                if (-bound..=bound).contains(&value) {
                    Some(value)
                } else {
                    errors.push(FieldError::query(
                        name,
                        format!("{name} must be between -{bound} and {bound}"),
                        "value_error.range",
                    ));
                    None
                }
            }
            _ => {
                errors.push(FieldError::query(
                    name,
                    "value is not a valid float",
                    "float_parsing",
                ));
                None
            }
        }
    }
}
