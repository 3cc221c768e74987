use std::collections::HashMap;

use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
};
use tracing::{debug, instrument};

use super::AppState;
use super::types::{ApiError, FieldError, Greeting, PoiParams};
use crate::GeoguideError;
use crate::models::{Coordinate, LocalizedAnswer};

pub async fn root() -> Json<Greeting> {
    Json(Greeting {
        message: "Hello World",
    })
}

#[instrument(skip_all)]
pub async fn get_coordinates(State(state): State<AppState>) -> Result<Json<Coordinate>, ApiError> {
    let coordinate = state
        .locator
        .resolve()
        .await
        .ok_or_else(GeoguideError::coordinates_not_found)?;
    Ok(Json(coordinate))
}

#[instrument(skip_all)]
pub async fn get_poi(
    State(state): State<AppState>,
    params: Result<Query<HashMap<String, String>>, QueryRejection>,
) -> Result<Json<LocalizedAnswer>, ApiError> {
    let Query(params) = params.map_err(|rejection| {
        ApiError::Validation(vec![FieldError {
            loc: vec!["query".to_string()],
            msg: rejection.body_text(),
            kind: "query_parsing".to_string(),
        }])
    })?;

    let query = PoiParams::from(params).into_query()?;
    debug!(
        "POI query for {} at {}",
        query.category,
        query.location.format_coordinates()
    );

    let answer = state.localizer.localize(&query).await?;
    Ok(Json(answer))
}
