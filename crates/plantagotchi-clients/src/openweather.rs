//! Current-conditions lookup against the `OpenWeather` one-call API.
//!
//! Sends `GET {api_url}?lat=..&lon=..&exclude=..&appid=<key>` and reads the
//! human-readable condition from `current.weather[0].description`.

use chrono::Utc;
use futures::future::BoxFuture;
use plantagotchi_core::config::WeatherApiConfig;
use plantagotchi_core::{LookupError, WeatherLookup};
use plantagotchi_types::{GeoPosition, WeatherSummary};
use tracing::debug;

use crate::http;
use crate::keys::ApiKeyRing;

/// Client for the `OpenWeather` API.
#[derive(Debug)]
pub struct OpenWeatherClient {
    client: reqwest::Client,
    api_url: String,
    exclude: String,
    keys: ApiKeyRing,
    timeout_ms: u64,
}

impl OpenWeatherClient {
    /// Create a client from the `weather` config section.
    ///
    /// An empty key list is accepted here; every lookup then fails with
    /// [`LookupError::Config`].
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::Config`] if the HTTP client cannot be built.
    pub fn new(config: &WeatherApiConfig) -> Result<Self, LookupError> {
        Ok(Self {
            client: http::build_client(config.request_timeout_ms)?,
            api_url: config.api_url.clone(),
            exclude: config.exclude.clone(),
            keys: ApiKeyRing::new(config.api_keys.iter().cloned()),
            timeout_ms: config.request_timeout_ms,
        })
    }

    /// Number of usable API keys.
    pub fn key_count(&self) -> usize {
        self.keys.len()
    }

    /// Fetch the current condition at `position`.
    ///
    /// # Errors
    ///
    /// Returns a [`LookupError`] on missing keys, network failure, timeout,
    /// non-success status or an unexpected response shape.
    pub async fn fetch(&self, position: GeoPosition) -> Result<WeatherSummary, LookupError> {
        let key = self.keys.pick()?;
        debug!(
            lat = position.latitude,
            lon = position.longitude,
            "requesting current weather"
        );

        let request = self.client.get(&self.api_url).query(&[
            ("lat", position.latitude.to_string()),
            ("lon", position.longitude.to_string()),
            ("exclude", self.exclude.clone()),
            ("appid", key.to_owned()),
        ]);
        let json = http::fetch_json(request, "OpenWeather", self.timeout_ms).await?;

        Ok(WeatherSummary {
            condition: extract_condition(&json)?,
            observed_at: Utc::now(),
        })
    }
}

impl WeatherLookup for OpenWeatherClient {
    fn current_weather(
        &self,
        position: GeoPosition,
    ) -> BoxFuture<'_, Result<WeatherSummary, LookupError>> {
        Box::pin(self.fetch(position))
    }
}

/// Extract the condition text from a one-call response.
///
/// Prefers `description` and falls back to the terse `main` group.
///
/// # Errors
///
/// Returns [`LookupError::Parse`] if neither field is present.
pub fn extract_condition(json: &serde_json::Value) -> Result<String, LookupError> {
    let entry = json
        .get("current")
        .and_then(|c| c.get("weather"))
        .and_then(|w| w.get(0))
        .ok_or_else(|| LookupError::Parse("response missing current.weather[0]".to_owned()))?;

    entry
        .get("description")
        .or_else(|| entry.get("main"))
        .and_then(serde_json::Value::as_str)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
        .ok_or_else(|| {
            LookupError::Parse("current.weather[0] has no description or main".to_owned())
        })
}
