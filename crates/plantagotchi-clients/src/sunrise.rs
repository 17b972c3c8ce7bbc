//! Sunrise and sunset lookup against sunrise-sunset.org.

use chrono::{DateTime, FixedOffset};
use futures::future::BoxFuture;
use plantagotchi_core::config::DayNightApiConfig;
use plantagotchi_core::{DayNightLookup, LookupError};
use plantagotchi_types::{GeoPosition, SunTimes};
use tracing::debug;

use crate::http;

/// Client for the sunrise-sunset.org JSON API.
#[derive(Debug)]
pub struct SunriseSunsetClient {
    client: reqwest::Client,
    api_url: String,
    invert_longitude: bool,
    timeout_ms: u64,
}

impl SunriseSunsetClient {
    /// Create a client from the `daynight` config section.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::Config`] if the HTTP client cannot be built.
    pub fn new(config: &DayNightApiConfig) -> Result<Self, LookupError> {
        Ok(Self {
            client: http::build_client(config.request_timeout_ms)?,
            api_url: config.api_url.clone(),
            invert_longitude: config.invert_longitude,
            timeout_ms: config.request_timeout_ms,
        })
    }

    /// Longitude as sent in the `lng` query parameter.
    fn query_longitude(&self, position: GeoPosition) -> f64 {
        if self.invert_longitude {
            -position.longitude
        } else {
            position.longitude
        }
    }

    /// Fetch today's sunrise and sunset at `position`.
    ///
    /// # Errors
    ///
    /// Returns a [`LookupError`] on network failure, timeout, non-success
    /// status, a non-`OK` API status or unparseable timestamps.
    pub async fn fetch(&self, position: GeoPosition) -> Result<SunTimes, LookupError> {
        let lng = self.query_longitude(position);
        debug!(lat = position.latitude, lng, "requesting sun times");

        // formatted=0 returns ISO 8601 timestamps instead of 12h clock strings.
        let request = self.client.get(&self.api_url).query(&[
            ("lat", position.latitude.to_string()),
            ("lng", lng.to_string()),
            ("formatted", "0".to_owned()),
        ]);
        let json = http::fetch_json(request, "sunrise-sunset", self.timeout_ms).await?;
        extract_sun_times(&json)
    }
}

impl DayNightLookup for SunriseSunsetClient {
    fn sun_times(&self, position: GeoPosition) -> BoxFuture<'_, Result<SunTimes, LookupError>> {
        Box::pin(self.fetch(position))
    }
}

/// Extract sunrise and sunset from an API response.
///
/// # Errors
///
/// Returns [`LookupError::Parse`] if `status` is present and not `OK`, or if
/// either timestamp is missing or not RFC 3339.
pub fn extract_sun_times(json: &serde_json::Value) -> Result<SunTimes, LookupError> {
    if let Some(status) = json.get("status").and_then(serde_json::Value::as_str)
        && status != "OK"
    {
        return Err(LookupError::Parse(format!("API status {status}")));
    }

    let results = json
        .get("results")
        .ok_or_else(|| LookupError::Parse("response missing results".to_owned()))?;

    Ok(SunTimes {
        sunrise: timestamp(results, "sunrise")?,
        sunset: timestamp(results, "sunset")?,
    })
}

fn timestamp(
    results: &serde_json::Value,
    field: &str,
) -> Result<DateTime<FixedOffset>, LookupError> {
    let raw = results
        .get(field)
        .and_then(serde_json::Value::as_str)
        .ok_or_else(|| LookupError::Parse(format!("response missing results.{field}")))?;
    DateTime::parse_from_rfc3339(raw)
        .map_err(|e| LookupError::Parse(format!("results.{field} {raw:?}: {e}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn client(invert_longitude: bool) -> SunriseSunsetClient {
        SunriseSunsetClient::new(&DayNightApiConfig {
            invert_longitude,
            ..DayNightApiConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn extract_valid_response() {
        let json = serde_json::json!({
            "results": {
                "sunrise": "2021-04-13T04:41:19+00:00",
                "sunset": "2021-04-13T18:17:42+00:00",
                "solar_noon": "2021-04-13T11:29:30+00:00",
                "day_length": 48983
            },
            "status": "OK"
        });
        let sun = extract_sun_times(&json).unwrap();
        assert_eq!(
            sun.sunrise,
            Utc.with_ymd_and_hms(2021, 4, 13, 4, 41, 19).unwrap()
        );
        assert_eq!(
            sun.sunset,
            Utc.with_ymd_and_hms(2021, 4, 13, 18, 17, 42).unwrap()
        );
    }

    #[test]
    fn keeps_non_utc_offsets() {
        let json = serde_json::json!({
            "results": {
                "sunrise": "2021-04-13T06:41:19+02:00",
                "sunset": "2021-04-13T20:17:42+02:00"
            }
        });
        let sun = extract_sun_times(&json).unwrap();
        assert_eq!(sun.sunrise.offset().local_minus_utc(), 7200);
    }

    #[test]
    fn non_ok_status_is_a_parse_error() {
        let json = serde_json::json!({"results": "", "status": "INVALID_REQUEST"});
        assert!(matches!(
            extract_sun_times(&json),
            Err(LookupError::Parse(_))
        ));
    }

    #[test]
    fn twelve_hour_strings_are_rejected() {
        let json = serde_json::json!({
            "results": {"sunrise": "4:41:19 AM", "sunset": "6:17:42 PM"},
            "status": "OK"
        });
        assert!(extract_sun_times(&json).is_err());
    }

    #[test]
    fn missing_sunset_is_a_parse_error() {
        let json = serde_json::json!({
            "results": {"sunrise": "2021-04-13T04:41:19+00:00"},
            "status": "OK"
        });
        assert!(extract_sun_times(&json).is_err());
    }

    #[test]
    fn longitude_is_sent_as_is_by_default() {
        let position = GeoPosition::new(47.48, 8.21);
        assert!((client(false).query_longitude(position) - 8.21).abs() < f64::EPSILON);
        assert!((client(true).query_longitude(position) + 8.21).abs() < f64::EPSILON);
    }
}
