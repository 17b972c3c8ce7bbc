//! Fixed-rate timers and the start-once gate that guards them.
//!
//! Each [`LoopKind`] has at most one live timer task. The timer never
//! touches game state; it only posts a tick command into the model's
//! mailbox. [`LoopRegistry::ensure_running`] is idempotent, and
//! [`LoopRegistry::stop`] waits for the aborted task to finish so a restart
//! cannot overlap with the old timer.

use std::collections::BTreeMap;
use std::time::Duration;

use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::service::ModelCommand;

/// Identity of a periodic loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LoopKind {
    /// Stat adjustment from the cached light sample.
    Fast,
    /// Location, weather and day/night refresh.
    Slow,
}

impl LoopKind {
    /// Name used in logs.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Fast => "plantagotchi-game-loop",
            Self::Slow => "plantagotchi-data-loop",
        }
    }

    /// Command posted on every tick of this loop.
    pub const fn command(self) -> ModelCommand {
        match self {
            Self::Fast => ModelCommand::FastTick,
            Self::Slow => ModelCommand::SlowTick,
        }
    }
}

/// Registry of running timer tasks, keyed by loop identity.
#[derive(Debug, Default)]
pub struct LoopRegistry {
    running: Mutex<BTreeMap<LoopKind, JoinHandle<()>>>,
}

impl LoopRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the timer for `kind` unless one is already live.
    ///
    /// `spawn` is only called when a new timer is needed. Returns `true` if
    /// a timer was started.
    pub async fn ensure_running<F>(&self, kind: LoopKind, spawn: F) -> bool
    where
        F: FnOnce() -> JoinHandle<()>,
    {
        let mut running = self.running.lock().await;
        if let Some(handle) = running.get(&kind)
            && !handle.is_finished()
        {
            debug!(loop_name = kind.name(), "loop already running");
            return false;
        }
        running.insert(kind, spawn());
        info!(loop_name = kind.name(), "loop started");
        true
    }

    /// Whether a live timer exists for `kind`.
    pub async fn is_running(&self, kind: LoopKind) -> bool {
        self.running
            .lock()
            .await
            .get(&kind)
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Stop the timer for `kind` and wait until it has exited.
    ///
    /// Returns `true` if a timer was registered.
    pub async fn stop(&self, kind: LoopKind) -> bool {
        let handle = self.running.lock().await.remove(&kind);
        let Some(handle) = handle else {
            return false;
        };
        handle.abort();
        if let Err(e) = handle.await
            && !e.is_cancelled()
        {
            warn!(loop_name = kind.name(), error = %e, "loop task failed");
        }
        info!(loop_name = kind.name(), "loop stopped");
        true
    }

    /// Stop every registered timer.
    pub async fn stop_all(&self) {
        for kind in [LoopKind::Fast, LoopKind::Slow] {
            self.stop(kind).await;
        }
    }

    /// Abort every registered timer without waiting, for use from `Drop`.
    pub fn abort_all(&mut self) {
        for (kind, handle) in std::mem::take(self.running.get_mut()) {
            handle.abort();
            debug!(loop_name = kind.name(), "loop aborted");
        }
    }
}

/// Spawn a timer that posts `kind`'s command into `mailbox` every `period`.
///
/// The first tick fires immediately. Late ticks are delayed rather than
/// burst, so a stalled mailbox never produces catch-up decay.
pub fn spawn_ticker(
    kind: LoopKind,
    period: Duration,
    mailbox: mpsc::Sender<ModelCommand>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            if mailbox.send(kind.command()).await.is_err() {
                debug!(loop_name = kind.name(), "mailbox closed, timer exiting");
                break;
            }
        }
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn idle_task() -> JoinHandle<()> {
        tokio::spawn(std::future::pending::<()>())
    }

    #[tokio::test]
    async fn second_start_is_a_no_op() {
        let registry = LoopRegistry::new();
        assert!(registry.ensure_running(LoopKind::Fast, idle_task).await);
        assert!(!registry.ensure_running(LoopKind::Fast, idle_task).await);
        assert!(registry.is_running(LoopKind::Fast).await);
        assert!(!registry.is_running(LoopKind::Slow).await);
    }

    #[tokio::test]
    async fn loops_are_keyed_independently() {
        let registry = LoopRegistry::new();
        assert!(registry.ensure_running(LoopKind::Fast, idle_task).await);
        assert!(registry.ensure_running(LoopKind::Slow, idle_task).await);
    }

    #[tokio::test]
    async fn stop_then_restart() {
        let registry = LoopRegistry::new();
        registry.ensure_running(LoopKind::Slow, idle_task).await;
        assert!(registry.stop(LoopKind::Slow).await);
        assert!(!registry.is_running(LoopKind::Slow).await);
        assert!(!registry.stop(LoopKind::Slow).await);
        assert!(registry.ensure_running(LoopKind::Slow, idle_task).await);
    }

    #[tokio::test]
    async fn finished_task_can_be_replaced() {
        let registry = LoopRegistry::new();
        registry
            .ensure_running(LoopKind::Fast, || tokio::spawn(async {}))
            .await;
        tokio::task::yield_now().await;
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(registry.ensure_running(LoopKind::Fast, idle_task).await);
    }

    #[tokio::test(start_paused = true)]
    async fn abort_all_ends_live_timers() {
        let (tx, mut rx) = mpsc::channel(16);
        let mut registry = LoopRegistry::new();
        registry
            .ensure_running(LoopKind::Fast, || {
                spawn_ticker(LoopKind::Fast, Duration::from_secs(1), tx)
            })
            .await;
        assert!(matches!(rx.recv().await.unwrap(), ModelCommand::FastTick));

        registry.abort_all();
        assert!(!registry.is_running(LoopKind::Fast).await);
        // The aborted ticker drops its sender, closing the channel.
        while rx.recv().await.is_some() {}
    }

    #[tokio::test(start_paused = true)]
    async fn ticker_posts_commands_at_fixed_rate() {
        let (tx, mut rx) = mpsc::channel(16);
        let handle = spawn_ticker(LoopKind::Slow, Duration::from_secs(60), tx);

        // First tick is immediate.
        assert!(matches!(rx.recv().await.unwrap(), ModelCommand::SlowTick));
        tokio::time::sleep(Duration::from_secs(59)).await;
        assert!(rx.try_recv().is_err());
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(matches!(rx.try_recv().unwrap(), ModelCommand::SlowTick));

        handle.abort();
    }
}
