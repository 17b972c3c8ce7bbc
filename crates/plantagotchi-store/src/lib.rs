//! Remote game state storage for Plantagotchi.
//!
//! Each player's [`GameState`](plantagotchi_types::GameState) is one JSON
//! document in `Dragonfly`. [`DragonflyStore`] implements the
//! [`StateStore`](plantagotchi_core::StateStore) seam used by the model.

pub mod dragonfly;
pub mod error;

pub use dragonfly::DragonflyStore;
pub use error::DbError;
