//! Core records: player stats, game state, sensor cache and derived
//! weather / day-night projections.

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::{DayPhase, LoadPhase, PositionStatus};
use crate::ids::PlayerId;

/// Upper bound of every player stat.
pub const STAT_MAX: f64 = 100.0;

/// Lower bound of every player stat.
pub const STAT_MIN: f64 = 0.0;

/// Latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GeoPosition {
    /// Latitude, positive north.
    pub latitude: f64,
    /// Longitude, positive east.
    pub longitude: f64,
}

impl GeoPosition {
    /// Create a position from latitude and longitude.
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Bounded stat values of one plant.
///
/// All stats live in `[0, 100]`. Only `lux` changes on its own; the other
/// stats are carried for the presentation layer and reset on a new game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    /// Light satisfaction.
    pub lux: f64,
    /// Affection.
    pub love: f64,
    /// Air quality.
    pub co2: f64,
    /// Nutrients.
    pub fertilizer: f64,
    /// Last position reported by the location provider.
    #[serde(default)]
    pub last_position: GeoPosition,
}

impl Default for PlayerState {
    fn default() -> Self {
        Self {
            lux: STAT_MAX,
            love: STAT_MAX,
            co2: STAT_MAX,
            fertilizer: STAT_MAX,
            last_position: GeoPosition::default(),
        }
    }
}

impl PlayerState {
    /// Force every stat into `[0, 100]`. NaN collapses to the floor.
    pub fn clamp_stats(&mut self) {
        for stat in [
            &mut self.lux,
            &mut self.love,
            &mut self.co2,
            &mut self.fertilizer,
        ] {
            *stat = clamp_stat(*stat);
        }
    }

    /// Reset every stat to its maximum, keeping the last position.
    pub const fn refill(&mut self) {
        self.lux = STAT_MAX;
        self.love = STAT_MAX;
        self.co2 = STAT_MAX;
        self.fertilizer = STAT_MAX;
    }
}

/// Clamp a single stat value into `[0, 100]`.
pub fn clamp_stat(value: f64) -> f64 {
    if value.is_nan() {
        return STAT_MIN;
    }
    value.clamp(STAT_MIN, STAT_MAX)
}

/// The persisted document: one player and their plant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    /// Owner of this game.
    pub player_id: PlayerId,
    /// The plant's stats.
    pub player_state: PlayerState,
}

impl GameState {
    /// A brand-new game with every stat at 100.
    pub fn fresh(player_id: PlayerId) -> Self {
        Self {
            player_id,
            player_state: PlayerState::default(),
        }
    }
}

/// One accelerometer sample in m/s^2.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Accelerometer {
    /// X axis.
    pub x: f32,
    /// Y axis.
    pub y: f32,
    /// Z axis.
    pub z: f32,
}

impl core::fmt::Display for Accelerometer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        // Axis order matches the on-device readout: y/x/z.
        write!(f, "{}/{}/{}", self.y, self.x, self.z)
    }
}

/// Most recent raw sensor values pushed by the host.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SensorReading {
    /// Ambient light in lux.
    pub ambient_lux: f32,
    /// Last accelerometer sample, if the device has one.
    #[serde(default)]
    pub accelerometer: Option<Accelerometer>,
}

/// Current weather condition text at the player's position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherSummary {
    /// Condition text, e.g. "light rain".
    pub condition: String,
    /// When the lookup completed.
    pub observed_at: DateTime<Utc>,
}

/// Sunrise and sunset for the current day, in the API's offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SunTimes {
    /// Sunrise instant.
    pub sunrise: DateTime<FixedOffset>,
    /// Sunset instant.
    pub sunset: DateTime<FixedOffset>,
}

/// Derived day/night projection, recomputed on every slow tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayNightStatus {
    /// Daylight or nighttime.
    pub phase: DayPhase,
    /// Sun times the phase was derived from.
    pub sun: SunTimes,
    /// When the determination was made.
    pub checked_at: DateTime<Utc>,
}

impl DayNightStatus {
    /// Whether the plant should render in dark mode.
    pub const fn is_dark(&self) -> bool {
        matches!(self.phase, DayPhase::Nighttime)
    }
}

/// Outcome of the most recent persistence attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SaveStatus {
    /// Nothing saved yet.
    Never,
    /// Last save succeeded at the given time.
    Saved(DateTime<Utc>),
    /// Last save failed with the given message.
    Failed(String),
}

/// Read-only projection of the whole model for the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlantSnapshot {
    /// Current game state.
    pub game: GameState,
    /// Progress of the initial load.
    pub load_phase: LoadPhase,
    /// Latest sensor values.
    pub sensor: SensorReading,
    /// Location status.
    pub position: PositionStatus,
    /// Latest weather, if any lookup has succeeded.
    pub weather: Option<WeatherSummary>,
    /// Latest day/night determination, if any lookup has succeeded.
    pub day_night: Option<DayNightStatus>,
    /// Number of fast ticks applied since startup.
    pub fast_ticks: u64,
    /// Outcome of the most recent save.
    pub last_save: SaveStatus,
}

impl PlantSnapshot {
    /// Initial snapshot before anything has been loaded.
    pub fn loading(player_id: PlayerId) -> Self {
        Self {
            game: GameState::fresh(player_id),
            load_phase: LoadPhase::Loading,
            sensor: SensorReading::default(),
            position: PositionStatus::Pending,
            weather: None,
            day_night: None,
            fast_ticks: 0,
            last_save: SaveStatus::Never,
        }
    }

    /// Weather text, or the placeholder shown before the first lookup.
    pub fn weather_text(&self) -> &str {
        self.weather
            .as_ref()
            .map_or("Getting current weather ...", |w| w.condition.as_str())
    }

    /// Day/night text, or the placeholder shown before the first lookup.
    pub fn day_night_text(&self) -> &'static str {
        self.day_night
            .as_ref()
            .map_or("Checking Night or Day ...", |d| d.phase.label())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn fresh_game_has_full_stats() {
        let game = GameState::fresh(PlayerId::new());
        assert_eq!(game.player_state.lux, STAT_MAX);
        assert_eq!(game.player_state.love, STAT_MAX);
        assert_eq!(game.player_state.co2, STAT_MAX);
        assert_eq!(game.player_state.fertilizer, STAT_MAX);
    }

    #[test]
    fn clamp_pulls_stats_into_range() {
        let mut state = PlayerState {
            lux: -3.0,
            love: 140.0,
            co2: f64::NAN,
            fertilizer: 42.0,
            last_position: GeoPosition::default(),
        };
        state.clamp_stats();
        assert_eq!(state.lux, 0.0);
        assert_eq!(state.love, 100.0);
        assert_eq!(state.co2, 0.0);
        assert_eq!(state.fertilizer, 42.0);
    }

    #[test]
    fn refill_keeps_position() {
        let mut state = PlayerState {
            lux: 1.0,
            love: 2.0,
            co2: 3.0,
            fertilizer: 4.0,
            last_position: GeoPosition::new(1.5, -2.5),
        };
        state.refill();
        assert_eq!(state.lux, STAT_MAX);
        assert_eq!(state.last_position, GeoPosition::new(1.5, -2.5));
    }

    #[test]
    fn accelerometer_renders_y_x_z() {
        let acc = Accelerometer {
            x: 1.0,
            y: 2.0,
            z: 3.0,
        };
        assert_eq!(acc.to_string(), "2/1/3");
    }

    #[test]
    fn game_state_json_shape() {
        let game = GameState::fresh(PlayerId::new());
        let json = serde_json::to_value(&game).unwrap();
        assert!(json.get("player_state").and_then(|p| p.get("lux")).is_some());
        let back: GameState = serde_json::from_value(json).unwrap();
        assert_eq!(back, game);
    }

    #[test]
    fn snapshot_placeholders_before_first_lookup() {
        let snap = PlantSnapshot::loading(PlayerId::new());
        assert_eq!(snap.weather_text(), "Getting current weather ...");
        assert_eq!(snap.day_night_text(), "Checking Night or Day ...");
    }
}
