//! Configuration loading and typed config structures.
//!
//! The canonical configuration lives in `plantagotchi-config.yaml`. Every
//! field has a default so an empty file (or no file at all) yields a usable
//! configuration; the loader then applies environment overrides and
//! validates the result.

use std::path::Path;
use std::time::Duration;

use plantagotchi_types::{GeoPosition, PlayerId, STAT_MAX};
use serde::Deserialize;
use uuid::Uuid;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value parsed but is not usable.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PlantConfig {
    /// Tick cadence and stat tuning.
    #[serde(default)]
    pub game: GameConfig,

    /// Weather API settings.
    #[serde(default)]
    pub weather: WeatherApiConfig,

    /// Sunrise/sunset API settings.
    #[serde(default)]
    pub daynight: DayNightApiConfig,

    /// Location lookup settings.
    #[serde(default)]
    pub location: LocationConfig,

    /// Remote state store settings.
    #[serde(default)]
    pub store: StoreConfig,

    /// Player identity.
    #[serde(default)]
    pub player: PlayerConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl PlantConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override file values:
    /// - `DRAGONFLY_URL` overrides `store.dragonfly_url`
    /// - `OPENWEATHER_API_KEYS` (comma separated) overrides `weather.api_keys`
    /// - `PLAYER_ID` overrides `player.id`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if it is not valid YAML, or
    /// [`ConfigError::Invalid`] if validation fails.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string and apply environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if validation fails.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.apply_overrides(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    /// Built-in defaults with environment overrides, for hosts without a
    /// config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if an override is not usable.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_overrides(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup (the process environment in
    /// production, a map in tests).
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("DRAGONFLY_URL") {
            self.store.dragonfly_url = val;
        }
        if let Some(val) = lookup("OPENWEATHER_API_KEYS") {
            self.weather.api_keys = val
                .split(',')
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(ToOwned::to_owned)
                .collect();
        }
        if let Some(val) = lookup("PLAYER_ID") {
            self.player.id = Some(val);
        }
    }

    /// Check that every value is usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.game.validate()?;
        if self.weather.request_timeout_ms == 0 || self.daynight.request_timeout_ms == 0 {
            return Err(invalid("request_timeout_ms must be at least 1"));
        }
        if self.location.timeout_ms == 0 {
            return Err(invalid("location.timeout_ms must be at least 1"));
        }
        self.player.player_id()?;
        Ok(())
    }
}

fn invalid(reason: &str) -> ConfigError {
    ConfigError::Invalid {
        reason: reason.to_owned(),
    }
}

/// Tick cadence and stat tuning.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GameConfig {
    /// Fast tick period in milliseconds (stat adjustment).
    #[serde(default = "default_fast_tick_ms")]
    pub fast_tick_ms: u64,

    /// Slow tick period in milliseconds (location, weather, day/night).
    #[serde(default = "default_slow_tick_ms")]
    pub slow_tick_ms: u64,

    /// Ambient light (lux) strictly above which the plant gains light.
    #[serde(default = "default_bright_light_threshold")]
    pub bright_light_threshold: f32,

    /// Lux stat gained per bright tick.
    #[serde(default = "default_lux_step")]
    pub lux_step: f64,

    /// Seconds for a full stat to decay to zero in darkness.
    #[serde(default = "default_full_decay_seconds")]
    pub full_decay_seconds: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            fast_tick_ms: default_fast_tick_ms(),
            slow_tick_ms: default_slow_tick_ms(),
            bright_light_threshold: default_bright_light_threshold(),
            lux_step: default_lux_step(),
            full_decay_seconds: default_full_decay_seconds(),
        }
    }
}

impl GameConfig {
    /// Fast tick period.
    pub const fn fast_period(&self) -> Duration {
        Duration::from_millis(self.fast_tick_ms)
    }

    /// Slow tick period.
    pub const fn slow_period(&self) -> Duration {
        Duration::from_millis(self.slow_tick_ms)
    }

    /// Lux stat lost per dim fast tick.
    ///
    /// A full stat reaches zero after `full_decay_seconds` of darkness, so
    /// with a one second tick this is `100 / 86400`.
    pub fn decay_per_tick(&self) -> f64 {
        let full = Duration::from_secs(self.full_decay_seconds).as_secs_f64();
        if full <= 0.0 {
            return 0.0;
        }
        STAT_MAX * self.fast_period().as_secs_f64() / full
    }

    /// Validate tick periods and decay parameters.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for zero periods, a zero decay
    /// window, or a non-finite / negative step.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fast_tick_ms == 0 || self.slow_tick_ms == 0 {
            return Err(invalid("tick periods must be at least 1ms"));
        }
        if self.full_decay_seconds == 0 {
            return Err(invalid("game.full_decay_seconds must be at least 1"));
        }
        if !self.lux_step.is_finite() || self.lux_step < 0.0 {
            return Err(invalid("game.lux_step must be a non-negative number"));
        }
        if !self.bright_light_threshold.is_finite() {
            return Err(invalid("game.bright_light_threshold must be finite"));
        }
        Ok(())
    }
}

/// Weather API settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WeatherApiConfig {
    /// Endpoint URL (query parameters are appended).
    #[serde(default = "default_weather_api_url")]
    pub api_url: String,

    /// Equivalent API credentials; one is picked per call.
    #[serde(default)]
    pub api_keys: Vec<String>,

    /// Comma separated response sections to exclude.
    #[serde(default = "default_weather_exclude")]
    pub exclude: String,

    /// Request timeout in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl Default for WeatherApiConfig {
    fn default() -> Self {
        Self {
            api_url: default_weather_api_url(),
            api_keys: Vec::new(),
            exclude: default_weather_exclude(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

/// Sunrise/sunset API settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DayNightApiConfig {
    /// Endpoint URL (query parameters are appended).
    #[serde(default = "default_daynight_api_url")]
    pub api_url: String,

    /// Request timeout in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Send the longitude with its sign flipped, as older app builds did.
    #[serde(default)]
    pub invert_longitude: bool,
}

impl Default for DayNightApiConfig {
    fn default() -> Self {
        Self {
            api_url: default_daynight_api_url(),
            request_timeout_ms: default_request_timeout_ms(),
            invert_longitude: false,
        }
    }
}

/// Location lookup settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LocationConfig {
    /// Upper bound for one location lookup in milliseconds.
    #[serde(default = "default_location_timeout_ms")]
    pub timeout_ms: u64,

    /// Static position for hosts without a location provider.
    #[serde(default)]
    pub fixed: Option<GeoPosition>,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_location_timeout_ms(),
            fixed: None,
        }
    }
}

impl LocationConfig {
    /// Lookup timeout.
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Remote state store settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StoreConfig {
    /// Dragonfly (Redis-compatible) URL.
    #[serde(default = "default_dragonfly_url")]
    pub dragonfly_url: String,

    /// Prefix for every key written by this app.
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            dragonfly_url: default_dragonfly_url(),
            key_prefix: default_key_prefix(),
        }
    }
}

/// Player identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PlayerConfig {
    /// Player UUID. A new one is generated when absent.
    #[serde(default)]
    pub id: Option<String>,
}

impl PlayerConfig {
    /// Resolve the configured player id, generating one if none is set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the configured id is not a UUID.
    pub fn player_id(&self) -> Result<PlayerId, ConfigError> {
        self.id.as_deref().map_or_else(
            || Ok(PlayerId::new()),
            |raw| {
                Uuid::parse_str(raw.trim())
                    .map(PlayerId::from)
                    .map_err(|e| ConfigError::Invalid {
                        reason: format!("player.id is not a UUID: {e}"),
                    })
            },
        )
    }
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default log filter when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

const fn default_fast_tick_ms() -> u64 {
    1_000
}

const fn default_slow_tick_ms() -> u64 {
    60_000
}

const fn default_bright_light_threshold() -> f32 {
    1_000.0
}

const fn default_lux_step() -> f64 {
    0.1
}

const fn default_full_decay_seconds() -> u64 {
    86_400
}

fn default_weather_api_url() -> String {
    "https://api.openweathermap.org/data/2.5/onecall".to_owned()
}

fn default_weather_exclude() -> String {
    "daily,minutely,hourly,alerts".to_owned()
}

fn default_daynight_api_url() -> String {
    "https://api.sunrise-sunset.org/json".to_owned()
}

const fn default_request_timeout_ms() -> u64 {
    5_000
}

const fn default_location_timeout_ms() -> u64 {
    10_000
}

fn default_dragonfly_url() -> String {
    "redis://localhost:6379".to_owned()
}

fn default_key_prefix() -> String {
    "plantagotchi".to_owned()
}

fn default_log_level() -> String {
    "info".to_owned()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn parse_without_env(yaml: &str) -> PlantConfig {
        let mut config: PlantConfig = serde_yml::from_str(yaml).unwrap();
        config.apply_overrides(no_env);
        config
    }

    #[test]
    fn bundled_config_matches_defaults() {
        let yaml = include_str!("../../../plantagotchi-config.yaml");
        let config = parse_without_env(yaml);
        assert!(config.validate().is_ok());
        assert_eq!(config, PlantConfig::default());
    }

    #[test]
    fn empty_document_uses_defaults() {
        let config = parse_without_env("{}");
        assert_eq!(config.game.fast_tick_ms, 1_000);
        assert_eq!(config.game.slow_tick_ms, 60_000);
        assert_eq!(config.game.full_decay_seconds, 86_400);
        assert_eq!(config.weather.exclude, "daily,minutely,hourly,alerts");
        assert!(!config.daynight.invert_longitude);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn decay_per_tick_matches_one_day() {
        let game = GameConfig::default();
        let expected = 100.0 / 86_400.0;
        assert!((game.decay_per_tick() - expected).abs() < 1e-12);
    }

    #[test]
    fn decay_scales_with_tick_period() {
        let game = GameConfig {
            fast_tick_ms: 2_000,
            ..GameConfig::default()
        };
        let expected = 200.0 / 86_400.0;
        assert!((game.decay_per_tick() - expected).abs() < 1e-12);
    }

    #[test]
    fn yaml_overrides_defaults() {
        let config = parse_without_env(
            r"
game:
  fast_tick_ms: 500
  bright_light_threshold: 250.0
weather:
  api_keys: [a, b, c]
location:
  fixed:
    latitude: 47.48
    longitude: 8.21
",
        );
        assert_eq!(config.game.fast_tick_ms, 500);
        assert_eq!(config.game.slow_tick_ms, 60_000);
        assert_eq!(config.weather.api_keys.len(), 3);
        assert_eq!(config.location.fixed, Some(GeoPosition::new(47.48, 8.21)));
    }

    #[test]
    fn overrides_replace_store_url_and_keys() {
        let env: BTreeMap<&str, &str> = BTreeMap::from([
            ("DRAGONFLY_URL", "redis://cache:6379"),
            ("OPENWEATHER_API_KEYS", "k1, k2,,k3"),
        ]);
        let mut config = PlantConfig::default();
        config.apply_overrides(|name| env.get(name).map(|v| (*v).to_owned()));
        assert_eq!(config.store.dragonfly_url, "redis://cache:6379");
        assert_eq!(config.weather.api_keys, vec!["k1", "k2", "k3"]);
    }

    #[test]
    fn zero_tick_period_is_rejected() {
        let config = parse_without_env("game:\n  fast_tick_ms: 0\n");
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn zero_decay_window_is_rejected() {
        let config = parse_without_env("game:\n  full_decay_seconds: 0\n");
        assert!(config.validate().is_err());
    }

    #[test]
    fn player_id_must_be_uuid() {
        let bad = PlayerConfig {
            id: Some("not-a-uuid".to_owned()),
        };
        assert!(bad.player_id().is_err());

        let raw = Uuid::now_v7();
        let good = PlayerConfig {
            id: Some(raw.to_string()),
        };
        assert_eq!(good.player_id().unwrap().into_inner(), raw);
    }

    #[test]
    fn malformed_yaml_is_an_error() {
        let result: Result<PlantConfig, _> = serde_yml::from_str("game: [1, 2");
        assert!(result.is_err());
    }
}
