//! Error types for the host binary.
//!
//! [`HostError`] covers everything that can stop the host during startup.
//! Once the service runs, failures are logged and never surface here.

use plantagotchi_core::{ConfigError, LookupError, ServiceError};

/// Top-level error for the host binary.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: ConfigError,
    },

    /// A lookup client could not be built.
    #[error("client error: {source}")]
    Client {
        /// The underlying lookup error.
        #[from]
        source: LookupError,
    },

    /// The plant service failed while shutting down.
    #[error("service error: {source}")]
    Service {
        /// The underlying service error.
        #[from]
        source: ServiceError,
    },

    /// Waiting for the shutdown signal failed.
    #[error("signal error: {message}")]
    Signal {
        /// Description of the failure.
        message: String,
    },
}
