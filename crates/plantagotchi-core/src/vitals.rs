//! Light-satisfaction mechanics applied on every fast tick.
//!
//! - Ambient light strictly above the bright threshold raises `lux` by
//!   `lux_step`, never past 100.
//! - Anything else lowers `lux` by the per-tick decay, never below 0.
//!
//! The caller owns the state; this module only does the arithmetic.

use plantagotchi_types::{PlayerState, STAT_MAX, STAT_MIN, SensorReading};

use crate::config::GameConfig;

/// Which branch a fast tick took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightOutcome {
    /// Bright light: the stat grew (or stayed capped at 100).
    Gained,
    /// Dim light: the stat decayed (or stayed floored at 0).
    Decayed,
}

/// Result of one fast tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightTickResult {
    /// Branch taken.
    pub outcome: LightOutcome,
    /// `lux` before the tick.
    pub before: f64,
    /// `lux` after the tick.
    pub after: f64,
}

/// Precomputed per-tick parameters, derived once from [`GameConfig`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightRules {
    /// Ambient lux strictly above which the plant gains light.
    pub bright_threshold: f32,
    /// Gain per bright tick.
    pub step: f64,
    /// Loss per dim tick.
    pub decay: f64,
}

impl LightRules {
    /// Derive the rules from configuration.
    pub fn from_config(config: &GameConfig) -> Self {
        Self {
            bright_threshold: config.bright_light_threshold,
            step: config.lux_step,
            decay: config.decay_per_tick(),
        }
    }
}

/// Apply one fast tick of light mechanics to `state`.
///
/// The other stats are clamped as a side effect so a state loaded from an
/// older store document cannot carry out-of-range values forward.
pub fn apply_light_tick(
    state: &mut PlayerState,
    sensor: &SensorReading,
    rules: &LightRules,
) -> LightTickResult {
    let before = state.lux;

    let outcome = if sensor.ambient_lux > rules.bright_threshold {
        state.lux = (state.lux + rules.step).min(STAT_MAX);
        LightOutcome::Gained
    } else {
        state.lux = (state.lux - rules.decay).max(STAT_MIN);
        LightOutcome::Decayed
    };

    state.clamp_stats();

    LightTickResult {
        outcome,
        before,
        after: state.lux,
    }
}
