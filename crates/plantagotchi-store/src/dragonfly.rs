//! `Dragonfly` (Redis-compatible) game state documents.
//!
//! # Key Patterns
//!
//! | Pattern | Type | Description |
//! |---------|------|-------------|
//! | `{prefix}:player:{id}:game_state` | JSON | Full [`GameState`] of one player |

use fred::prelude::*;
use futures::future::BoxFuture;
use plantagotchi_core::{StateStore, StoreError};
use plantagotchi_types::{GameState, PlayerId};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::error::DbError;

/// Game state store backed by a `Dragonfly` instance.
#[derive(Clone)]
pub struct DragonflyStore {
    client: Client,
    prefix: String,
}

impl DragonflyStore {
    /// Connect to `Dragonfly` at the given URL.
    ///
    /// The URL follows the Redis scheme: `redis://host:port` or
    /// `redis://host:port/db`. Keys are namespaced under `prefix`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Config`] if the URL cannot be parsed.
    /// Returns [`DbError::Dragonfly`] if the connection fails.
    pub async fn connect(url: &str, prefix: &str) -> Result<Self, DbError> {
        let config = Config::from_url(url)
            .map_err(|e| DbError::Config(format!("Invalid Dragonfly URL: {e}")))?;

        let client = Builder::from_config(config).build()?;
        client.init().await?;

        info!(prefix, "connected to Dragonfly");
        Ok(Self {
            client,
            prefix: prefix.to_owned(),
        })
    }

    /// Key holding `player`'s game state.
    pub fn game_key(&self, player: PlayerId) -> String {
        game_key(&self.prefix, player)
    }

    async fn set_json<T: Serialize>(&self, key: &str, value: &T) -> Result<(), DbError> {
        let json = serde_json::to_string(value)?;
        let _: () = self.client.set(key, json.as_str(), None, None, false).await?;
        Ok(())
    }

    async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, DbError> {
        let value: Option<String> = self.client.get(key).await?;
        value
            .map(|s| serde_json::from_str(&s))
            .transpose()
            .map_err(DbError::from)
    }

    /// Read `player`'s game state, `None` if never written.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the read or deserialization fails.
    pub async fn load_game(&self, player: PlayerId) -> Result<Option<GameState>, DbError> {
        let key = self.game_key(player);
        let game = self.get_json(&key).await?;
        debug!(key = %key, found = game.is_some(), "game state read");
        Ok(game)
    }

    /// Write `state` over whatever is stored for its player.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if serialization or the write fails.
    pub async fn store_game(&self, state: &GameState) -> Result<(), DbError> {
        let key = self.game_key(state.player_id);
        self.set_json(&key, state).await
    }

    /// Remove `player`'s game state.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Dragonfly`] if the delete fails.
    pub async fn delete_game(&self, player: PlayerId) -> Result<(), DbError> {
        let _: u32 = self.client.del(self.game_key(player)).await?;
        Ok(())
    }
}

/// Build the game state key for `player` under `prefix`.
pub fn game_key(prefix: &str, player: PlayerId) -> String {
    format!("{prefix}:player:{player}:game_state")
}

impl StateStore for DragonflyStore {
    fn load_initial(
        &self,
        player: PlayerId,
    ) -> BoxFuture<'_, Result<Option<GameState>, StoreError>> {
        Box::pin(async move { Ok(self.load_game(player).await?) })
    }

    fn save<'a>(&'a self, state: &'a GameState) -> BoxFuture<'a, Result<(), StoreError>> {
        Box::pin(async move { Ok(self.store_game(state).await?) })
    }

    fn create<'a>(&'a self, state: &'a GameState) -> BoxFuture<'a, Result<(), StoreError>> {
        Box::pin(async move {
            self.store_game(state).await?;
            info!(player_id = %state.player_id, "game state document created");
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_is_namespaced_per_player() {
        let player = PlayerId::new();
        let key = game_key("plantagotchi", player);
        assert_eq!(key, format!("plantagotchi:player:{player}:game_state"));
        assert_ne!(key, game_key("plantagotchi", PlayerId::new()));
    }
}
