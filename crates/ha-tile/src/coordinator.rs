//! Per-Tile update coordinator
//!
//! Each Tile gets one coordinator that refreshes it on a fixed interval and
//! tells its listeners (the device tracker entity) when fresh data arrived.

use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;

use ha_config_entries::ConfigEntryError;
use ha_tile_client::{Tile, TileError};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

type Listener = Box<dyn Fn() + Send + Sync>;

/// Outcome of the most recent refresh
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateStatus {
    /// No refresh has run yet
    Pending,
    Success,
    /// The refresh failed; the previous data is kept
    Failed(String),
    /// The Tile session is no longer valid
    AuthFailed(String),
}

pub struct TileCoordinator {
    tile: Arc<Tile>,
    update_interval: Duration,
    status: Mutex<UpdateStatus>,
    listeners: Mutex<Vec<Listener>>,
    refresh_task: Mutex<Option<JoinHandle<()>>>,
}

impl TileCoordinator {
    pub fn new(tile: Arc<Tile>, update_interval: Duration) -> Arc<Self> {
        Arc::new(Self {
            tile,
            update_interval,
            status: Mutex::new(UpdateStatus::Pending),
            listeners: Mutex::new(Vec::new()),
            refresh_task: Mutex::new(None),
        })
    }

    pub fn tile(&self) -> &Arc<Tile> {
        &self.tile
    }

    pub fn status(&self) -> UpdateStatus {
        self.status
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn last_update_success(&self) -> bool {
        self.status() == UpdateStatus::Success
    }

    /// Call `listener` after every refresh
    pub fn add_listener(&self, listener: impl Fn() + Send + Sync + 'static) {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Box::new(listener));
    }

    fn notify_listeners(&self) {
        let listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        for listener in listeners.iter() {
            listener();
        }
    }

    /// Refresh the Tile once and notify listeners
    pub async fn async_refresh(&self) -> UpdateStatus {
        let status = match self.tile.async_update().await {
            Ok(()) => UpdateStatus::Success,
            Err(err @ TileError::SessionExpired(_)) | Err(err @ TileError::InvalidAuth(_)) => {
                warn!(tile = %self.tile.uuid(), "Tile session is no longer valid: {}", err);
                UpdateStatus::AuthFailed(err.to_string())
            }
            Err(err) => {
                warn!(tile = %self.tile.uuid(), "Error while updating Tile: {}", err);
                UpdateStatus::Failed(err.to_string())
            }
        };

        *self.status.lock().unwrap_or_else(PoisonError::into_inner) = status.clone();
        self.notify_listeners();
        status
    }

    /// Initial refresh during entry setup, mapped onto setup outcomes
    pub async fn async_config_entry_first_refresh(&self) -> Result<(), ConfigEntryError> {
        match self.async_refresh().await {
            UpdateStatus::Success | UpdateStatus::Pending => Ok(()),
            UpdateStatus::AuthFailed(reason) => Err(ConfigEntryError::AuthFailed(reason)),
            UpdateStatus::Failed(reason) => Err(ConfigEntryError::NotReady(reason)),
        }
    }

    /// Start the periodic refresh loop, replacing any running one
    ///
    /// The loop holds only a weak reference and ends once the coordinator
    /// is dropped.
    pub fn start(self: &Arc<Self>) {
        let weak: Weak<Self> = Arc::downgrade(self);
        let period = self.update_interval;

        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                let Some(coordinator) = weak.upgrade() else {
                    break;
                };
                debug!(tile = %coordinator.tile.uuid(), "Scheduled Tile refresh");
                coordinator.async_refresh().await;
            }
        });

        if let Some(previous) = self
            .refresh_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(handle)
        {
            previous.abort();
        }
        info!(
            tile = %self.tile.uuid(),
            interval = ?self.update_interval,
            "Started Tile refresh"
        );
    }

    /// Stop the periodic refresh loop
    pub fn shutdown(&self) {
        if let Some(handle) = self
            .refresh_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            handle.abort();
            debug!(tile = %self.tile.uuid(), "Stopped Tile refresh");
        }
    }

    pub fn is_running(&self) -> bool {
        self.refresh_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }
}

impl Drop for TileCoordinator {
    fn drop(&mut self) {
        self.shutdown();
    }
}
