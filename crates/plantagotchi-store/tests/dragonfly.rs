//! Integration tests for the `Dragonfly` game state store.
//!
//! These tests require a live Dragonfly (or Redis) instance. Run with:
//!
//! ```bash
//! docker run -d -p 6379:6379 docker.dragonflydb.io/dragonflydb/dragonfly
//! cargo test -p plantagotchi-store -- --ignored
//! ```
//!
//! All tests are marked `#[ignore]` so they are skipped during normal
//! `cargo test` runs.

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::missing_panics_doc)]

use plantagotchi_core::StateStore;
use plantagotchi_store::{DbError, DragonflyStore};
use plantagotchi_types::{GameState, GeoPosition, PlayerId};

const DRAGONFLY_URL: &str = "redis://localhost:6379";
const PREFIX: &str = "plantagotchi-test";

async fn connect() -> DragonflyStore {
    DragonflyStore::connect(DRAGONFLY_URL, PREFIX)
        .await
        .expect("Failed to connect to Dragonfly")
}

#[tokio::test]
#[ignore = "requires live Dragonfly instance"]
async fn missing_game_loads_as_none() {
    let store = connect().await;
    let loaded = store.load_initial(PlayerId::new()).await.unwrap();
    assert!(loaded.is_none());
}

#[tokio::test]
#[ignore = "requires live Dragonfly instance"]
async fn create_save_and_reload() {
    let store = connect().await;
    let player = PlayerId::new();

    let mut game = GameState::fresh(player);
    store.create(&game).await.unwrap();
    assert_eq!(store.load_initial(player).await.unwrap(), Some(game.clone()));

    game.player_state.lux = 12.5;
    game.player_state.last_position = GeoPosition::new(47.48, 8.21);
    store.save(&game).await.unwrap();
    assert_eq!(store.load_game(player).await.unwrap(), Some(game));

    store.delete_game(player).await.unwrap();
    assert!(store.load_game(player).await.unwrap().is_none());
}

#[tokio::test]
async fn invalid_url_is_a_config_error() {
    let result = DragonflyStore::connect("not a url", PREFIX).await;
    assert!(matches!(result, Err(DbError::Config(_))));
}
