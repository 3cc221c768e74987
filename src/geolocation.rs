//! Geolocation resolution
//!
//! Turns the caller's apparent network origin into a coordinate using an
//! IP geolocation service that answers for the requesting address.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use crate::config::GeolocationConfig;
use crate::models::Coordinate;
use crate::{GeoguideError, Result};

const SERVICE: &str = "Geolocation";

/// Source of the caller's approximate position
#[async_trait]
pub trait GeoLocator: Send + Sync {
    /// Resolve the current position, `None` when no usable coordinate exists
    async fn resolve(&self) -> Option<Coordinate>;
}

/// Lookup payload; covers the `loc` string of ipinfo.io as well as the
/// numeric field pairs used by ipapi.co and ip-api.com
#[derive(Debug, Default, Deserialize)]
pub struct IpLookupResponse {
    pub loc: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

impl IpLookupResponse {
    /// Extract a valid coordinate, whichever shape the provider used
    #[must_use]
    pub fn coordinate(&self) -> Option<Coordinate> {
        if let Some(coordinate) = self.loc.as_deref().and_then(Coordinate::parse_pair) {
            return Some(coordinate);
        }
        let (latitude, longitude) = match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => (lat, lon),
            _ => (self.lat?, self.lon?),
        };
        Coordinate::new(latitude, longitude).ok()
    }
}

/// IP geolocation client
pub struct IpInfoLocator {
    client: Client,
    endpoint: String,
    timeout_seconds: u64,
}

impl IpInfoLocator {
    /// Create a new client
    pub fn new(config: &GeolocationConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("GeoGuide/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| GeoguideError::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            timeout_seconds: config.timeout_seconds,
        })
    }

    /// Query the provider, keeping transport and decoding failures visible
    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    pub async fn lookup(&self) -> Result<IpLookupResponse> {
        let response = self
            .client
            .get(&self.endpoint)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| GeoguideError::from_reqwest(SERVICE, self.timeout_seconds, &e))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(GeoguideError::upstream(
                SERVICE,
                format!("HTTP {status}: {error_text}"),
            ));
        }

        response.json().await.map_err(|e| {
            GeoguideError::upstream(SERVICE, format!("Failed to parse lookup response: {e}"))
        })
    }
}

#[async_trait]
impl GeoLocator for IpInfoLocator {
    async fn resolve(&self) -> Option<Coordinate> {
        match self.lookup().await {
            Ok(body) => {
                let coordinate = body.coordinate();
                match &coordinate {
                    Some(c) => info!("Resolved caller location to {}", c.format_coordinates()),
                    None => debug!("Lookup response carried no usable coordinate: {:?}", body),
                }
                coordinate
            }
            Err(e) => {
                warn!("IP geolocation failed: {}", e);
                None
            }
        }
    }
}
