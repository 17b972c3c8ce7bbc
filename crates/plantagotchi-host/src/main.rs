//! Headless host for the Plantagotchi model.
//!
//! Stands in for the app shell: it owns logging, configuration and the
//! concrete collaborators, and feeds sensor readings from stdin.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `PLANTAGOTCHI_CONFIG` or
//!    `plantagotchi-config.yaml` (defaults if absent)
//! 2. Initialize structured logging (tracing)
//! 3. Build the weather and sunrise/sunset clients
//! 4. Connect to Dragonfly, falling back to an in-memory store
//! 5. Start the plant service and both loops
//! 6. Forward stdin lines until ctrl-c, then shut down

mod bridge;
mod error;

use std::path::PathBuf;
use std::sync::Arc;

use plantagotchi_clients::{OpenWeatherClient, SunriseSunsetClient};
use plantagotchi_core::config::{PlantConfig, StoreConfig};
use plantagotchi_core::{
    Collaborators, FixedLocation, LocationProvider, LogOnlyPermissionHost, MemoryStore,
    PlantService, ServiceSettings, StateStore,
};
use plantagotchi_store::DragonflyStore;
use tokio::io::BufReader;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::HostError;

/// Default config file, relative to the working directory.
const DEFAULT_CONFIG_PATH: &str = "plantagotchi-config.yaml";

/// Application entry point for the host.
///
/// # Errors
///
/// Returns an error if configuration, client construction or shutdown fails.
#[tokio::main]
async fn main() -> Result<(), HostError> {
    // 1. Load configuration. Logging is not up yet, so note the source and
    //    report it afterwards.
    let (config, source) = load_config()?;

    // 2. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .init();

    info!(
        source = source.as_str(),
        fast_tick_ms = config.game.fast_tick_ms,
        slow_tick_ms = config.game.slow_tick_ms,
        weather_keys = config.weather.api_keys.len(),
        "configuration loaded"
    );

    // 3. Lookup clients.
    let weather = OpenWeatherClient::new(&config.weather)?;
    if weather.key_count() == 0 {
        warn!("no OpenWeather API keys configured, weather lookups will fail");
    }
    let day_night = SunriseSunsetClient::new(&config.daynight)?;

    let location: Arc<dyn LocationProvider> = match config.location.fixed {
        Some(position) => {
            info!(
                lat = position.latitude,
                lon = position.longitude,
                "using fixed location"
            );
            Arc::new(FixedLocation::new(position))
        }
        None => {
            warn!("no location source configured, position will be unavailable");
            Arc::new(FixedLocation::unavailable())
        }
    };

    // 4. State store.
    let store = connect_store(&config.store).await;

    // 5. Plant service.
    let player_id = config.player.player_id()?;
    let service = PlantService::start(
        player_id,
        ServiceSettings::from_config(&config),
        Collaborators {
            location,
            permissions: Arc::new(LogOnlyPermissionHost),
            weather: Arc::new(weather),
            day_night: Arc::new(day_night),
            store,
        },
    );
    service.ensure_all_running().await;
    let reporter = tokio::spawn(bridge::report_snapshots(service.subscribe()));
    info!(player_id = %player_id, "plantagotchi host running, reading sensor lines from stdin");

    // 6. Run until ctrl-c.
    let signal = tokio::signal::ctrl_c();
    tokio::pin!(signal);
    let stdin = BufReader::new(tokio::io::stdin());
    tokio::select! {
        result = &mut signal => {
            result.map_err(|e| HostError::Signal { message: e.to_string() })?;
        }
        applied = bridge::forward_lines(stdin, &service) => {
            info!(applied, "stdin closed, waiting for ctrl-c");
            signal.await.map_err(|e| HostError::Signal { message: e.to_string() })?;
        }
    }

    info!("shutting down");
    service.shutdown().await?;
    if let Err(e) = reporter.await {
        warn!(error = %e, "status reporter failed");
    }
    Ok(())
}

/// Load the config file named by `PLANTAGOTCHI_CONFIG`, or the default path.
///
/// A missing file means built-in defaults plus environment overrides.
fn load_config() -> Result<(PlantConfig, String), HostError> {
    let path = std::env::var("PLANTAGOTCHI_CONFIG")
        .map_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    if path.exists() {
        let config = PlantConfig::from_file(&path)?;
        Ok((config, path.display().to_string()))
    } else {
        Ok((PlantConfig::from_env()?, "defaults".to_owned()))
    }
}

/// Connect to Dragonfly, or fall back to a store that lives only as long as
/// this process.
async fn connect_store(config: &StoreConfig) -> Arc<dyn StateStore> {
    match DragonflyStore::connect(&config.dragonfly_url, &config.key_prefix).await {
        Ok(store) => Arc::new(store),
        Err(e) => {
            warn!(
                url = config.dragonfly_url.as_str(),
                error = %e,
                "Dragonfly unavailable, game state will not survive a restart"
            );
            Arc::new(MemoryStore::new())
        }
    }
}
