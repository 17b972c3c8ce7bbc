//! Shared type definitions for the Plantagotchi model layer.
//!
//! Everything the model owns, persists, or exposes to the presentation
//! layer is defined here so the store, clients and host crates agree on
//! one shape.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers
//! - [`enums`] -- Day phase, load phase, position status
//! - [`structs`] -- Player/game state, sensor cache, weather and sun times

pub mod enums;
pub mod ids;
pub mod structs;

pub use enums::{DayPhase, LoadPhase, PositionStatus};
pub use ids::PlayerId;
pub use structs::{
    Accelerometer, DayNightStatus, GameState, GeoPosition, PlantSnapshot, PlayerState,
    SaveStatus, SensorReading, STAT_MAX, STAT_MIN, SunTimes, WeatherSummary, clamp_stat,
};
