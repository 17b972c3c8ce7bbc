//! Background persister.
//!
//! The model publishes every updated game state into a `watch` channel and
//! moves on without waiting. This task saves whatever is newest: at most one
//! save is in flight, and states published while a save runs collapse into
//! the next one.

use std::sync::Arc;

use chrono::Utc;
use plantagotchi_types::GameState;
use tokio::sync::{mpsc, watch};
use tracing::debug;

use crate::collaborators::StateStore;
use crate::service::ModelCommand;

/// Save published states until the publishing side goes away.
///
/// Each outcome is reported back to the model as [`ModelCommand::Saved`].
pub async fn run_persister(
    store: Arc<dyn StateStore>,
    mut pending: watch::Receiver<Option<GameState>>,
    mailbox: mpsc::Sender<ModelCommand>,
) {
    while pending.changed().await.is_ok() {
        let Some(state) = pending.borrow_and_update().clone() else {
            continue;
        };
        let result = store.save(&state).await.map(|()| Utc::now());
        if mailbox.send(ModelCommand::Saved(result)).await.is_err() {
            break;
        }
    }
    debug!("persister stopped");
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use plantagotchi_types::PlayerId;

    use super::*;
    use crate::collaborators::MemoryStore;

    #[tokio::test]
    async fn saves_latest_state_and_reports_back() {
        let store = Arc::new(MemoryStore::new());
        let (state_tx, state_rx) = watch::channel(None);
        let (mail_tx, mut mail_rx) = mpsc::channel(8);
        let task = tokio::spawn(run_persister(store.clone(), state_rx, mail_tx));

        let player = PlayerId::new();
        let mut game = GameState::fresh(player);
        game.player_state.lux = 33.0;
        state_tx.send_replace(Some(game.clone()));

        let reply = mail_rx.recv().await.unwrap();
        assert!(matches!(reply, ModelCommand::Saved(Ok(_))));
        assert_eq!(store.get(player).await, Some(game));

        drop(state_tx);
        task.await.unwrap();
    }
}
