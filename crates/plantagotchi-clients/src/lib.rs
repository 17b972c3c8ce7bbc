//! HTTP lookups for the Plantagotchi slow loop.
//!
//! - [`openweather`] -- current weather condition text.
//! - [`sunrise`] -- sunrise and sunset for the day/night phase.
//! - [`keys`] -- the API key ring used by the weather client.
//!
//! Both clients implement the collaborator traits from `plantagotchi-core`
//! and map every failure into [`LookupError`](plantagotchi_core::LookupError).

mod http;
pub mod keys;
pub mod openweather;
pub mod sunrise;

pub use keys::ApiKeyRing;
pub use openweather::OpenWeatherClient;
pub use sunrise::SunriseSunsetClient;
