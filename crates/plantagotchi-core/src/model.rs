//! The plant model: the single owner of all mutable game state.
//!
//! [`PlantModel`] is plain synchronous state. The service task in
//! [`crate::service`] feeds it one event at a time, so every mutation is
//! serialized without locks. Methods that need follow-up I/O return an
//! effect value instead of doing the I/O themselves.
//!
//! Results from background lookups carry the refresh generation of the slow
//! tick that started them. A result older than the one already applied to
//! the same field is dropped, so out-of-order completions cannot roll the
//! display back.

use chrono::{DateTime, Utc};
use plantagotchi_types::{
    GameState, GeoPosition, LoadPhase, PlantSnapshot, PlayerId, PositionStatus, SaveStatus,
    SensorReading, SunTimes, WeatherSummary,
};
use tracing::{debug, info, warn};

use crate::collaborators::{LocationOutcome, LookupError, StoreError};
use crate::daynight;
use crate::vitals::{self, LightRules, LightTickResult};

/// Text shown when the location lookup fails.
pub const POSITION_UNAVAILABLE: &str = "Cannot get current position";

/// Follow-up work after a location result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LocationEffect {
    /// Start the weather and day/night lookups for this position.
    Lookup(GeoPosition),
    /// Ask the host for location permission.
    RequestPermission,
    /// Nothing to do.
    None,
}

/// Follow-up work after a load result.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadEffect {
    /// No game existed; write this fresh one to the store.
    Create(GameState),
    /// Nothing to do.
    None,
}

/// The serialized owner of the game state and every cached reading.
#[derive(Debug, Clone)]
pub struct PlantModel {
    view: PlantSnapshot,
    rules: LightRules,
    next_generation: u64,
    location_generation: u64,
    weather_generation: u64,
    day_night_generation: u64,
}

impl PlantModel {
    /// Create a model for `player_id` that is waiting for its initial load.
    pub fn new(player_id: PlayerId, rules: LightRules) -> Self {
        Self {
            view: PlantSnapshot::loading(player_id),
            rules,
            next_generation: 0,
            location_generation: 0,
            weather_generation: 0,
            day_night_generation: 0,
        }
    }

    /// Current read-only projection.
    pub const fn snapshot(&self) -> &PlantSnapshot {
        &self.view
    }

    /// Current game state.
    pub const fn game(&self) -> &GameState {
        &self.view.game
    }

    /// Owner of the game.
    pub const fn player_id(&self) -> PlayerId {
        self.view.game.player_id
    }

    /// Whether the initial load still has to succeed.
    pub const fn needs_load(&self) -> bool {
        !self.view.load_phase.is_ready()
    }

    // -----------------------------------------------------------------------
    // Load / create
    // -----------------------------------------------------------------------

    /// Apply the result of loading the game from the store.
    ///
    /// A stored game replaces the current one wholesale. A missing game is
    /// replaced by a fresh one that the caller must write back, keeping any
    /// position already seen. Once the game is ready (loaded earlier or
    /// started over with [`new_game`](Self::new_game)) late results are
    /// ignored.
    pub fn apply_loaded(&mut self, result: Result<Option<GameState>, StoreError>) -> LoadEffect {
        if self.view.load_phase.is_ready() {
            match &result {
                Ok(_) => debug!("late load result ignored"),
                Err(e) => warn!(error = %e, "late load failed, keeping current game"),
            }
            return LoadEffect::None;
        }
        match result {
            Ok(Some(mut game)) => {
                game.player_state.clamp_stats();
                info!(player_id = %game.player_id, lux = game.player_state.lux, "game state loaded");
                self.view.game = game;
                self.view.load_phase = LoadPhase::Ready;
                LoadEffect::None
            }
            Ok(None) => {
                let mut game = GameState::fresh(self.player_id());
                game.player_state.last_position = self.view.game.player_state.last_position;
                info!(player_id = %game.player_id, "no stored game, starting a fresh one");
                self.view.game = game.clone();
                self.view.load_phase = LoadPhase::Ready;
                LoadEffect::Create(game)
            }
            Err(e) => {
                warn!(error = %e, "failed to load game state");
                self.view.load_phase = LoadPhase::Failed(e.to_string());
                LoadEffect::None
            }
        }
    }

    /// Start over: every stat back to 100. Returns the game to persist.
    pub fn new_game(&mut self) -> GameState {
        self.view.game.player_state.refill();
        self.view.load_phase = LoadPhase::Ready;
        info!(player_id = %self.player_id(), "new game created");
        self.view.game.clone()
    }

    // -----------------------------------------------------------------------
    // Fast tick
    // -----------------------------------------------------------------------

    /// Apply one fast tick. Returns `None` while the game is not loaded.
    pub fn fast_tick(&mut self) -> Option<LightTickResult> {
        if self.needs_load() {
            return None;
        }
        let result =
            vitals::apply_light_tick(&mut self.view.game.player_state, &self.view.sensor, &self.rules);
        self.view.fast_ticks = self.view.fast_ticks.saturating_add(1);
        debug!(
            tick = self.view.fast_ticks,
            lux = result.after,
            outcome = ?result.outcome,
            "fast tick applied"
        );
        Some(result)
    }

    /// Cache a sensor reading. A reading without accelerometer data keeps
    /// the previous accelerometer sample.
    pub fn apply_sensor(&mut self, reading: SensorReading) {
        self.view.sensor.ambient_lux = reading.ambient_lux;
        if reading.accelerometer.is_some() {
            self.view.sensor.accelerometer = reading.accelerometer;
        }
    }

    // -----------------------------------------------------------------------
    // Slow tick
    // -----------------------------------------------------------------------

    /// Allocate the generation number for a new slow-tick refresh.
    pub const fn begin_refresh(&mut self) -> u64 {
        self.next_generation = self.next_generation.saturating_add(1);
        self.next_generation
    }

    /// Apply a location result from refresh `generation`.
    pub fn apply_location(&mut self, generation: u64, outcome: LocationOutcome) -> LocationEffect {
        if generation < self.location_generation {
            debug!(generation, latest = self.location_generation, "stale location result dropped");
            return LocationEffect::None;
        }
        self.location_generation = generation;

        match outcome {
            LocationOutcome::Found(position) => {
                self.view.position = PositionStatus::Known(position);
                self.view.game.player_state.last_position = position;
                LocationEffect::Lookup(position)
            }
            LocationOutcome::Failed(reason) => {
                warn!(reason = reason, "location lookup failed");
                self.view.position = PositionStatus::Unavailable(POSITION_UNAVAILABLE.to_owned());
                LocationEffect::None
            }
            LocationOutcome::PermissionDenied => {
                info!("location permission denied, asking host");
                self.view.position = PositionStatus::PermissionRequested;
                LocationEffect::RequestPermission
            }
        }
    }

    /// Apply a weather result from refresh `generation`. Returns whether the
    /// displayed weather changed.
    pub fn apply_weather(
        &mut self,
        generation: u64,
        result: Result<WeatherSummary, LookupError>,
    ) -> bool {
        match result {
            Ok(summary) => {
                if generation < self.weather_generation {
                    debug!(generation, latest = self.weather_generation, "stale weather dropped");
                    return false;
                }
                self.weather_generation = generation;
                debug!(condition = summary.condition, "weather updated");
                self.view.weather = Some(summary);
                true
            }
            Err(e) => {
                warn!(generation, error = %e, "weather lookup failed");
                false
            }
        }
    }

    /// Apply a sunrise/sunset result from refresh `generation`, determining
    /// the phase at `checked_at`. Returns whether the status changed.
    pub fn apply_day_night(
        &mut self,
        generation: u64,
        result: Result<SunTimes, LookupError>,
        checked_at: DateTime<Utc>,
    ) -> bool {
        match result {
            Ok(sun) => {
                if generation < self.day_night_generation {
                    debug!(generation, latest = self.day_night_generation, "stale sun times dropped");
                    return false;
                }
                self.day_night_generation = generation;
                let status = daynight::status(sun, checked_at);
                debug!(phase = ?status.phase, "day/night updated");
                self.view.day_night = Some(status);
                true
            }
            Err(e) => {
                warn!(generation, error = %e, "sunrise/sunset lookup failed");
                false
            }
        }
    }

    /// Record the outcome of a save. Failures are logged only.
    pub fn apply_saved(&mut self, result: Result<DateTime<Utc>, StoreError>) {
        match result {
            Ok(at) => self.view.last_save = SaveStatus::Saved(at),
            Err(e) => {
                warn!(error = %e, "failed to save game state");
                self.view.last_save = SaveStatus::Failed(e.to_string());
            }
        }
    }
}
