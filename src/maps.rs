//! Azure Maps POI search client
//!
//! Looks up the single nearest point of interest matching a free-text
//! category around a coordinate.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, instrument};

use crate::config::MapsConfig;
use crate::models::{PoiQuery, PoiResult};
use crate::{GeoguideError, Result};

const SERVICE: &str = "Azure Maps";
const POI_SEARCH_PATH: &str = "search/poi/json";

/// Places search returning the best match for a query
#[async_trait]
pub trait PoiSearch: Send + Sync {
    async fn search(&self, query: &PoiQuery) -> Result<PoiResult>;
}

/// POI search response body
#[derive(Debug, Deserialize)]
pub struct PoiSearchResponse {
    #[serde(default)]
    pub results: Vec<PoiSearchResult>,
}

#[derive(Debug, Deserialize)]
pub struct PoiSearchResult {
    pub poi: Option<PoiDetails>,
    pub address: Option<PoiAddress>,
}

#[derive(Debug, Deserialize)]
pub struct PoiDetails {
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PoiAddress {
    #[serde(rename = "freeformAddress")]
    pub freeform_address: Option<String>,
}

impl PoiSearchResponse {
    /// Take the first result, requiring both its name and its address
    pub fn into_first_result(self) -> Result<PoiResult> {
        let first = self
            .results
            .into_iter()
            .next()
            .ok_or_else(|| GeoguideError::upstream(SERVICE, "no results found"))?;

        let name = first
            .poi
            .and_then(|poi| poi.name)
            .ok_or_else(|| GeoguideError::upstream(SERVICE, "result is missing poi.name"))?;
        let address = first
            .address
            .and_then(|address| address.freeform_address)
            .ok_or_else(|| {
                GeoguideError::upstream(SERVICE, "result is missing address.freeformAddress")
            })?;

        Ok(PoiResult { name, address })
    }
}

/// Azure Maps search API client
pub struct AzureMapsClient {
    client: Client,
    subscription_key: String,
    endpoint: String,
    api_version: String,
    timeout_seconds: u64,
}

impl AzureMapsClient {
    /// Create a new client from validated configuration
    pub fn new(config: &MapsConfig) -> Result<Self> {
        let subscription_key = config
            .subscription_key
            .clone()
            .ok_or_else(|| GeoguideError::config("Missing Azure Maps subscription key"))?;

        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("GeoGuide/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| GeoguideError::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            subscription_key,
            endpoint: config.endpoint.clone(),
            api_version: config.api_version.clone(),
            timeout_seconds: config.timeout_seconds,
        })
    }

    fn search_url(&self) -> String {
        format!("{}/{}", self.endpoint.trim_end_matches('/'), POI_SEARCH_PATH)
    }
}

#[async_trait]
impl PoiSearch for AzureMapsClient {
    #[instrument(
        skip_all,
        fields(category = %query.category, lat = query.location.latitude, lon = query.location.longitude)
    )]
    async fn search(&self, query: &PoiQuery) -> Result<PoiResult> {
        let url = self.search_url();
        debug!("POI search request to {}", url);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("api-version", self.api_version.as_str()),
                ("subscription-key", self.subscription_key.as_str()),
                ("query", query.category.as_str()),
                ("limit", "1"),
            ])
            .query(&[
                ("lat", query.location.latitude),
                ("lon", query.location.longitude),
            ])
            .send()
            .await
            .map_err(|e| GeoguideError::from_reqwest(SERVICE, self.timeout_seconds, &e))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(GeoguideError::upstream(
                SERVICE,
                format!("POI search returned HTTP {status}: {error_text}"),
            ));
        }

        let body: PoiSearchResponse = response.json().await.map_err(|e| {
            GeoguideError::upstream(SERVICE, format!("Failed to parse POI search response: {e}"))
        })?;

        let place = body.into_first_result()?;
        info!("Nearest {} is {}", query.category, place.name);
        Ok(place)
    }
}
