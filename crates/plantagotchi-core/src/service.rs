//! The running plant service: owner task, mailbox, timers and persister.
//!
//! ```text
//! sensor push ──┐
//! fast timer ───┤                       ┌──> watch<PlantSnapshot> (presentation)
//! slow timer ───┼──> mailbox ──> owner ─┤
//! lookups ──────┤                       └──> watch<GameState> ──> persister ──> store
//! persister ────┘
//! ```
//!
//! Only the owner task mutates [`PlantModel`]. Everything else talks to it
//! through [`ModelCommand`]s. Network work (location, weather, day/night,
//! store writes) runs on spawned tasks that post their results back, so a
//! fast tick never waits on I/O.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use plantagotchi_types::{
    GameState, GeoPosition, PlantSnapshot, PlayerId, SensorReading, SunTimes, WeatherSummary,
};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::collaborators::{Collaborators, LocationOutcome, LookupError, StoreError};
use crate::config::PlantConfig;
use crate::loops::{self, LoopKind, LoopRegistry};
use crate::model::{LoadEffect, LocationEffect, PlantModel};
use crate::persist;
use crate::vitals::LightRules;

/// Mailbox capacity of the owner task.
const MAILBOX_CAPACITY: usize = 64;

/// Errors surfaced by the service handle.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// The owner task has stopped; nothing can be delivered.
    #[error("plant model is not running")]
    Closed,

    /// The mailbox is full (only from non-blocking pushes).
    #[error("plant model mailbox is full")]
    Busy,

    /// A background task panicked or was cancelled unexpectedly.
    #[error("background task failed: {0}")]
    Join(String),
}

/// Messages processed by the owner task, one at a time.
#[derive(Debug)]
pub enum ModelCommand {
    /// Adjust stats from the cached light sample.
    FastTick,
    /// Refresh location-derived data.
    SlowTick,
    /// New sensor values from the host.
    Sensor(SensorReading),
    /// Initial load finished.
    Loaded(Result<Option<GameState>, StoreError>),
    /// Location lookup finished.
    Located {
        /// Refresh generation that started the lookup.
        generation: u64,
        /// What the provider reported.
        outcome: LocationOutcome,
    },
    /// Weather lookup finished.
    Weather {
        /// Refresh generation that started the lookup.
        generation: u64,
        /// Lookup result.
        result: Result<WeatherSummary, LookupError>,
    },
    /// Sunrise/sunset lookup finished.
    DayNight {
        /// Refresh generation that started the lookup.
        generation: u64,
        /// Lookup result.
        result: Result<SunTimes, LookupError>,
        /// Instant the phase should be determined at.
        checked_at: DateTime<Utc>,
    },
    /// A save or create finished.
    Saved(Result<DateTime<Utc>, StoreError>),
    /// Reset every stat and write a new game document.
    NewGame,
    /// Stop the owner task.
    Shutdown,
}

/// Timing parameters of the service.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ServiceSettings {
    /// Fast tick period.
    pub fast_period: Duration,
    /// Slow tick period.
    pub slow_period: Duration,
    /// Upper bound for one location lookup.
    pub location_timeout: Duration,
    /// Upper bound for one weather or sunrise/sunset lookup.
    pub lookup_timeout: Duration,
    /// Light mechanics.
    pub rules: LightRules,
}

impl ServiceSettings {
    /// Derive settings from the loaded configuration.
    pub fn from_config(config: &PlantConfig) -> Self {
        let request_ms = config
            .weather
            .request_timeout_ms
            .max(config.daynight.request_timeout_ms);
        Self {
            fast_period: config.game.fast_period(),
            slow_period: config.game.slow_period(),
            location_timeout: config.location.timeout(),
            // The clients enforce their own timeout; this one only catches
            // lookups that never resolve at all.
            lookup_timeout: Duration::from_millis(request_ms.saturating_mul(2)),
            rules: LightRules::from_config(&config.game),
        }
    }
}

/// Handle to a running plant model.
pub struct PlantService {
    mailbox: mpsc::Sender<ModelCommand>,
    snapshots: watch::Receiver<PlantSnapshot>,
    loops: LoopRegistry,
    settings: ServiceSettings,
    owner: Option<JoinHandle<()>>,
    persister: Option<JoinHandle<()>>,
}

impl PlantService {
    /// Spawn the owner task and the persister, and start loading the game.
    ///
    /// Timers are not started; call [`ensure_running`](Self::ensure_running)
    /// or [`ensure_all_running`](Self::ensure_all_running). Must be called
    /// inside a Tokio runtime.
    pub fn start(
        player_id: PlayerId,
        settings: ServiceSettings,
        collaborators: Collaborators,
    ) -> Self {
        let (mailbox, inbox) = mpsc::channel(MAILBOX_CAPACITY);
        let model = PlantModel::new(player_id, settings.rules);
        let (snapshot_tx, snapshots) = watch::channel(model.snapshot().clone());
        let (pending_tx, pending_rx) = watch::channel(None);

        let persister = tokio::spawn(persist::run_persister(
            Arc::clone(&collaborators.store),
            pending_rx,
            mailbox.clone(),
        ));

        let owner = Owner {
            model,
            collaborators,
            mailbox: mailbox.clone(),
            snapshots: snapshot_tx,
            pending: pending_tx,
            settings,
            load_in_flight: false,
        };
        let owner = tokio::spawn(owner.run(inbox));

        info!(player_id = %player_id, "plant service started");

        Self {
            mailbox,
            snapshots,
            loops: LoopRegistry::new(),
            settings,
            owner: Some(owner),
            persister: Some(persister),
        }
    }

    /// Start the timer for `kind` unless it is already running.
    ///
    /// Returns `true` if a timer was started. Calling this repeatedly never
    /// creates a second timer for the same loop.
    pub async fn ensure_running(&self, kind: LoopKind) -> bool {
        let period = match kind {
            LoopKind::Fast => self.settings.fast_period,
            LoopKind::Slow => self.settings.slow_period,
        };
        let mailbox = self.mailbox.clone();
        self.loops
            .ensure_running(kind, move || loops::spawn_ticker(kind, period, mailbox))
            .await
    }

    /// Start both timers unless they are already running.
    pub async fn ensure_all_running(&self) {
        self.ensure_running(LoopKind::Fast).await;
        self.ensure_running(LoopKind::Slow).await;
    }

    /// Whether the timer for `kind` is live.
    pub async fn is_running(&self, kind: LoopKind) -> bool {
        self.loops.is_running(kind).await
    }

    /// Stop the timer for `kind` and wait for it to exit.
    pub async fn stop_loop(&self, kind: LoopKind) -> bool {
        self.loops.stop(kind).await
    }

    /// Push a sensor reading, waiting for mailbox space.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Closed`] if the owner task has stopped.
    pub async fn push_sensor(&self, reading: SensorReading) -> Result<(), ServiceError> {
        self.send(ModelCommand::Sensor(reading)).await
    }

    /// Push a sensor reading without waiting, for synchronous callbacks.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Busy`] if the mailbox is full, or
    /// [`ServiceError::Closed`] if the owner task has stopped.
    pub fn try_push_sensor(&self, reading: SensorReading) -> Result<(), ServiceError> {
        self.mailbox
            .try_send(ModelCommand::Sensor(reading))
            .map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => ServiceError::Busy,
                mpsc::error::TrySendError::Closed(_) => ServiceError::Closed,
            })
    }

    /// Reset every stat to 100 and write a new game document.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Closed`] if the owner task has stopped.
    pub async fn create_new_game(&self) -> Result<(), ServiceError> {
        self.send(ModelCommand::NewGame).await
    }

    /// Latest snapshot.
    pub fn snapshot(&self) -> PlantSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Subscribe to snapshot updates.
    pub fn subscribe(&self) -> watch::Receiver<PlantSnapshot> {
        self.snapshots.clone()
    }

    /// Stop both timers, then the owner and the persister, waiting for each.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Join`] if a background task panicked.
    pub async fn shutdown(mut self) -> Result<(), ServiceError> {
        self.loops.stop_all().await;
        if self.mailbox.send(ModelCommand::Shutdown).await.is_err() {
            debug!("owner already stopped");
        }
        // The persister exits once the owner drops its state channel.
        if let Some(owner) = self.owner.take() {
            owner.await.map_err(|e| ServiceError::Join(e.to_string()))?;
        }
        if let Some(persister) = self.persister.take() {
            persister
                .await
                .map_err(|e| ServiceError::Join(e.to_string()))?;
        }
        info!("plant service stopped");
        Ok(())
    }

    async fn send(&self, command: ModelCommand) -> Result<(), ServiceError> {
        self.mailbox
            .send(command)
            .await
            .map_err(|_closed| ServiceError::Closed)
    }
}

/// Dropping the handle without [`PlantService::shutdown`] still stops every
/// background task: timers are aborted and the owner is told to stop, which
/// in turn ends the persister.
impl Drop for PlantService {
    fn drop(&mut self) {
        self.loops.abort_all();
        let Some(owner) = self.owner.take() else {
            return;
        };
        if self.mailbox.try_send(ModelCommand::Shutdown).is_err() {
            owner.abort();
            if let Some(persister) = self.persister.take() {
                persister.abort();
            }
        }
        warn!("plant service dropped without shutdown");
    }
}

/// State of the owner task.
struct Owner {
    model: PlantModel,
    collaborators: Collaborators,
    mailbox: mpsc::Sender<ModelCommand>,
    snapshots: watch::Sender<PlantSnapshot>,
    pending: watch::Sender<Option<GameState>>,
    settings: ServiceSettings,
    load_in_flight: bool,
}

impl Owner {
    async fn run(mut self, mut inbox: mpsc::Receiver<ModelCommand>) {
        self.spawn_load();
        while let Some(command) = inbox.recv().await {
            if matches!(command, ModelCommand::Shutdown) {
                break;
            }
            self.handle(command);
            self.snapshots.send_replace(self.model.snapshot().clone());
        }
        info!(player_id = %self.model.player_id(), "plant model stopped");
    }

    fn handle(&mut self, command: ModelCommand) {
        match command {
            ModelCommand::FastTick => {
                if self.model.fast_tick().is_some() {
                    self.pending.send_replace(Some(self.model.game().clone()));
                }
            }
            ModelCommand::SlowTick => {
                if self.model.needs_load() {
                    self.spawn_load();
                }
                let generation = self.model.begin_refresh();
                self.spawn_locate(generation);
            }
            ModelCommand::Sensor(reading) => self.model.apply_sensor(reading),
            ModelCommand::Loaded(result) => {
                self.load_in_flight = false;
                if let LoadEffect::Create(game) = self.model.apply_loaded(result) {
                    self.spawn_create(game);
                }
            }
            ModelCommand::Located {
                generation,
                outcome,
            } => match self.model.apply_location(generation, outcome) {
                LocationEffect::Lookup(position) => self.spawn_lookups(generation, position),
                LocationEffect::RequestPermission => {
                    self.collaborators.permissions.request_location_permission();
                }
                LocationEffect::None => {}
            },
            ModelCommand::Weather { generation, result } => {
                self.model.apply_weather(generation, result);
            }
            ModelCommand::DayNight {
                generation,
                result,
                checked_at,
            } => {
                self.model.apply_day_night(generation, result, checked_at);
            }
            ModelCommand::Saved(result) => self.model.apply_saved(result),
            ModelCommand::NewGame => {
                let game = self.model.new_game();
                // Supersede any queued save of the old game.
                self.pending.send_replace(Some(game.clone()));
                self.spawn_create(game);
            }
            ModelCommand::Shutdown => {}
        }
    }

    fn spawn_load(&mut self) {
        if self.load_in_flight {
            return;
        }
        self.load_in_flight = true;
        let store = Arc::clone(&self.collaborators.store);
        let mailbox = self.mailbox.clone();
        let player = self.model.player_id();
        tokio::spawn(async move {
            let result = store.load_initial(player).await;
            if mailbox.send(ModelCommand::Loaded(result)).await.is_err() {
                debug!("model stopped before load finished");
            }
        });
    }

    fn spawn_create(&self, game: GameState) {
        let store = Arc::clone(&self.collaborators.store);
        let mailbox = self.mailbox.clone();
        tokio::spawn(async move {
            let result = store.create(&game).await.map(|()| Utc::now());
            if mailbox.send(ModelCommand::Saved(result)).await.is_err() {
                debug!("model stopped before create finished");
            }
        });
    }

    fn spawn_locate(&self, generation: u64) {
        let location = Arc::clone(&self.collaborators.location);
        let mailbox = self.mailbox.clone();
        let timeout = self.settings.location_timeout;
        tokio::spawn(async move {
            let outcome = match tokio::time::timeout(timeout, location.locate()).await {
                Ok(outcome) => outcome,
                Err(_elapsed) => {
                    LocationOutcome::Failed(format!("timed out after {}ms", timeout.as_millis()))
                }
            };
            let command = ModelCommand::Located {
                generation,
                outcome,
            };
            if mailbox.send(command).await.is_err() {
                debug!(generation, "model stopped before location arrived");
            }
        });
    }

    /// Dispatch the weather and day/night lookups as independent tasks.
    fn spawn_lookups(&self, generation: u64, position: GeoPosition) {
        let timeout = self.settings.lookup_timeout;
        let timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);

        let weather = Arc::clone(&self.collaborators.weather);
        let mailbox = self.mailbox.clone();
        tokio::spawn(async move {
            let result = tokio::time::timeout(timeout, weather.current_weather(position))
                .await
                .unwrap_or(Err(LookupError::Timeout(timeout_ms)));
            let command = ModelCommand::Weather { generation, result };
            if mailbox.send(command).await.is_err() {
                debug!(generation, "model stopped before weather arrived");
            }
        });

        let day_night = Arc::clone(&self.collaborators.day_night);
        let mailbox = self.mailbox.clone();
        tokio::spawn(async move {
            let result = tokio::time::timeout(timeout, day_night.sun_times(position))
                .await
                .unwrap_or(Err(LookupError::Timeout(timeout_ms)));
            let command = ModelCommand::DayNight {
                generation,
                result,
                checked_at: Utc::now(),
            };
            if mailbox.send(command).await.is_err() {
                debug!(generation, "model stopped before sun times arrived");
            }
        });
    }
}
