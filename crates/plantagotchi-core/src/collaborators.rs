//! External collaborators the model calls into.
//!
//! The model never talks to a platform API, an HTTP endpoint or a database
//! directly. Each of those is an object-safe trait here, implemented by the
//! clients and store crates or by the hosting application. Async methods
//! return [`BoxFuture`] so the traits can sit behind `Arc<dyn ...>`.

use std::collections::BTreeMap;
use std::sync::Arc;

use futures::future::BoxFuture;
use plantagotchi_types::{GameState, GeoPosition, PlayerId, SunTimes, WeatherSummary};
use tokio::sync::Mutex;

/// Errors from a weather or day/night lookup.
///
/// Every variant is transient from the model's point of view: the previous
/// value stays on screen and the next slow tick tries again.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    /// The request never produced a response.
    #[error("network error: {0}")]
    Network(String),

    /// The endpoint answered with a non-success status.
    #[error("endpoint returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body (possibly truncated).
        body: String,
    },

    /// The response did not have the expected shape.
    #[error("unexpected response: {0}")]
    Parse(String),

    /// The request exceeded its deadline.
    #[error("lookup timed out after {0}ms")]
    Timeout(u64),

    /// The client is not usable as configured (e.g. no API key).
    #[error("lookup misconfigured: {0}")]
    Config(String),
}

/// Errors from the persistent state store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The backend rejected or failed the operation.
    #[error("store backend error: {0}")]
    Backend(String),

    /// The stored document could not be encoded or decoded.
    #[error("store serialization error: {0}")]
    Serialization(String),

    /// The store is not reachable at all.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Three-way result of a location lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationOutcome {
    /// The device reported a position.
    Found(GeoPosition),
    /// The lookup failed; the reason is for logs only.
    Failed(String),
    /// The app lacks location permission.
    PermissionDenied,
}

/// Supplies the device position.
pub trait LocationProvider: Send + Sync {
    /// Look up the current position.
    fn locate(&self) -> BoxFuture<'_, LocationOutcome>;
}

/// Host-side hook for permission grant flows.
pub trait PermissionHost: Send + Sync {
    /// Ask the host to start its location permission flow. Fire and forget.
    fn request_location_permission(&self);
}

/// Current-weather lookup.
pub trait WeatherLookup: Send + Sync {
    /// Fetch the current weather condition at `position`.
    fn current_weather(
        &self,
        position: GeoPosition,
    ) -> BoxFuture<'_, Result<WeatherSummary, LookupError>>;
}

/// Sunrise/sunset lookup.
pub trait DayNightLookup: Send + Sync {
    /// Fetch today's sunrise and sunset at `position`.
    fn sun_times(&self, position: GeoPosition) -> BoxFuture<'_, Result<SunTimes, LookupError>>;
}

/// Remote document store holding one [`GameState`] per player.
pub trait StateStore: Send + Sync {
    /// Load the player's game. `Ok(None)` means no game exists yet.
    fn load_initial(&self, player: PlayerId) -> BoxFuture<'_, Result<Option<GameState>, StoreError>>;

    /// Overwrite the player's game with `state`.
    fn save<'a>(&'a self, state: &'a GameState) -> BoxFuture<'a, Result<(), StoreError>>;

    /// Create (or replace) the player's game document.
    fn create<'a>(&'a self, state: &'a GameState) -> BoxFuture<'a, Result<(), StoreError>>;
}

/// Everything the model needs from the outside world.
#[derive(Clone)]
pub struct Collaborators {
    /// Device position.
    pub location: Arc<dyn LocationProvider>,
    /// Permission grant flow.
    pub permissions: Arc<dyn PermissionHost>,
    /// Weather lookup.
    pub weather: Arc<dyn WeatherLookup>,
    /// Sunrise/sunset lookup.
    pub day_night: Arc<dyn DayNightLookup>,
    /// Persistent state store.
    pub store: Arc<dyn StateStore>,
}

// ---------------------------------------------------------------------------
// Built-in implementations
// ---------------------------------------------------------------------------

/// Location provider that always reports the same position, or always fails
/// when constructed without one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedLocation {
    position: Option<GeoPosition>,
}

impl FixedLocation {
    /// Always report `position`.
    pub const fn new(position: GeoPosition) -> Self {
        Self {
            position: Some(position),
        }
    }

    /// Always fail.
    pub const fn unavailable() -> Self {
        Self { position: None }
    }
}

impl LocationProvider for FixedLocation {
    fn locate(&self) -> BoxFuture<'_, LocationOutcome> {
        let outcome = self.position.map_or_else(
            || LocationOutcome::Failed("no fixed position configured".to_owned()),
            LocationOutcome::Found,
        );
        Box::pin(async move { outcome })
    }
}

/// Permission host for headless runs: there is nobody to ask, so it logs.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogOnlyPermissionHost;

impl PermissionHost for LogOnlyPermissionHost {
    fn request_location_permission(&self) {
        tracing::warn!("location permission requested but no interactive host is attached");
    }
}

/// In-process store, used by tests and offline hosts.
#[derive(Debug, Default)]
pub struct MemoryStore {
    games: Mutex<BTreeMap<PlayerId, GameState>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds `state`.
    pub fn with_game(state: GameState) -> Self {
        Self {
            games: Mutex::new(BTreeMap::from([(state.player_id, state)])),
        }
    }

    /// Read back what is stored for `player`.
    pub async fn get(&self, player: PlayerId) -> Option<GameState> {
        self.games.lock().await.get(&player).cloned()
    }
}

impl StateStore for MemoryStore {
    fn load_initial(&self, player: PlayerId) -> BoxFuture<'_, Result<Option<GameState>, StoreError>> {
        Box::pin(async move { Ok(self.games.lock().await.get(&player).cloned()) })
    }

    fn save<'a>(&'a self, state: &'a GameState) -> BoxFuture<'a, Result<(), StoreError>> {
        Box::pin(async move {
            self.games
                .lock()
                .await
                .insert(state.player_id, state.clone());
            Ok(())
        })
    }

    fn create<'a>(&'a self, state: &'a GameState) -> BoxFuture<'a, Result<(), StoreError>> {
        self.save(state)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fixed_location_reports_position() {
        let provider = FixedLocation::new(GeoPosition::new(1.0, 2.0));
        assert_eq!(
            provider.locate().await,
            LocationOutcome::Found(GeoPosition::new(1.0, 2.0))
        );
    }

    #[tokio::test]
    async fn unavailable_location_fails() {
        let provider = FixedLocation::unavailable();
        assert!(matches!(provider.locate().await, LocationOutcome::Failed(_)));
    }

    #[tokio::test]
    async fn memory_store_round_trips_game() {
        let store = MemoryStore::new();
        let player = PlayerId::new();
        assert_eq!(store.load_initial(player).await.unwrap(), None);

        let mut game = GameState::fresh(player);
        game.player_state.lux = 42.0;
        store.save(&game).await.unwrap();

        assert_eq!(store.load_initial(player).await.unwrap(), Some(game));
    }
}
