use std::time::Duration;

use aerocrawl_core::Coordinates;
use crawl_logging::{crawl_debug, crawl_warn};

use crate::fetch::{FailureKind, FetchError};

#[derive(Debug, Clone)]
pub struct GeocoderSettings {
    /// Nominatim-compatible search endpoint root.
    pub base_url: String,
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for GeocoderSettings {
    fn default() -> Self {
        Self {
            base_url: "https://nominatim.openstreetmap.org".to_string(),
            timeout: Duration::from_secs(30),
            user_agent: concat!("aerocrawl/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Maps a free-text address to a coordinate pair. Failure mode is omission:
/// a resolver never errors, it returns `None` and the record is written
/// without coordinates.
#[async_trait::async_trait]
pub trait AddressResolver: Send + Sync {
    async fn resolve(&self, address: &str) -> Option<Coordinates>;
}

pub struct HttpAddressResolver {
    client: reqwest::Client,
    base_url: String,
}

impl HttpAddressResolver {
    pub fn new(settings: GeocoderSettings) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .user_agent(settings.user_agent)
            .build()
            .map_err(|err| FetchError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self {
            client,
            base_url: settings.base_url,
        })
    }

    fn search_url(&self, address: &str) -> Option<reqwest::Url> {
        let mut url =
            reqwest::Url::parse(&format!("{}/search", self.base_url.trim_end_matches('/'))).ok()?;
        url.query_pairs_mut()
            .append_pair("q", address)
            .append_pair("format", "json")
            .append_pair("limit", "1");
        Some(url)
    }
}

#[async_trait::async_trait]
impl AddressResolver for HttpAddressResolver {
    async fn resolve(&self, address: &str) -> Option<Coordinates> {
        let url = match self.search_url(address) {
            Some(url) => url,
            None => {
                crawl_warn!("geocoder base url is not parseable; skipping lookup");
                return None;
            }
        };

        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(err) => {
                crawl_warn!("coordinate lookup failed for '{address}': {err}");
                return None;
            }
        };
        if !response.status().is_success() {
            crawl_warn!(
                "coordinate lookup for '{address}' returned {}",
                response.status()
            );
            return None;
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(err) => {
                crawl_warn!("coordinate lookup body unreadable for '{address}': {err}");
                return None;
            }
        };

        match first_result_coordinates(&body) {
            Some(coords) => Some(coords),
            None => {
                crawl_debug!("no coordinate match for '{address}'");
                None
            }
        }
    }
}

/// Pulls `lat`/`lon` out of the first element of a Nominatim-style JSON
/// result array.
fn first_result_coordinates(body: &str) -> Option<Coordinates> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let first = value.as_array()?.first()?;
    let latitude = first.get("lat")?.as_str()?.to_string();
    let longitude = first.get("lon")?.as_str()?.to_string();
    Some(Coordinates {
        latitude,
        longitude,
    })
}
