//! Stat decay, day/night determination and the serialized update loop for
//! the Plantagotchi model layer.
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `plantagotchi-config.yaml`.
//! - [`vitals`] -- Light-satisfaction mechanics applied on each fast tick.
//! - [`daynight`] -- Day/night determination from sunrise and sunset.
//! - [`collaborators`] -- Traits for location, permissions, lookups and the
//!   state store, plus in-process implementations.
//! - [`model`] -- [`PlantModel`], the single owner of all mutable state.
//! - [`loops`] -- Fixed-rate timers behind a start-once gate.
//! - [`persist`] -- Coalescing background persister.
//! - [`service`] -- [`PlantService`], the handle that wires it all together.
//!
//! [`PlantModel`]: model::PlantModel
//! [`PlantService`]: service::PlantService

pub mod collaborators;
pub mod config;
pub mod daynight;
pub mod loops;
pub mod model;
pub mod persist;
pub mod service;
pub mod vitals;

pub use collaborators::{
    Collaborators, DayNightLookup, FixedLocation, LocationOutcome, LocationProvider,
    LogOnlyPermissionHost, LookupError, MemoryStore, PermissionHost, StateStore, StoreError,
    WeatherLookup,
};
pub use config::{ConfigError, PlantConfig};
pub use loops::LoopKind;
pub use service::{PlantService, ServiceError, ServiceSettings};
