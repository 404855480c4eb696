//! Tile integration
//!
//! Tracks Tile Bluetooth trackers as device tracker entities. Each config
//! entry is one Tile account; every Tile on the account gets its own update
//! coordinator and device tracker.
//!
//! Both the config flow and entry setup log in through a [`LoginHandle`], so
//! tests can swap the cloud login for a double.

pub mod config_flow;
pub mod constants;
pub mod coordinator;
pub mod device_tracker;
pub mod diagnostics;
pub mod login;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use ha_config_entries::{ConfigEntry, ConfigEntryError, IntegrationSetup};
use ha_core::{HomeAssistant, CONF_PASSWORD, CONF_USERNAME};
use ha_tile_client::{TileApi, TileError};
use tracing::{debug, error, info, instrument};

pub use config_flow::TileConfigFlow;
pub use constants::{DEFAULT_UPDATE_INTERVAL, DOMAIN};
pub use coordinator::{TileCoordinator, UpdateStatus};
pub use device_tracker::TileDeviceTracker;
pub use login::{CloudLogin, LoginHandle, LoginPatch, TileLogin};

/// Everything a loaded entry owns
pub struct TileRuntimeData {
    pub api: Arc<dyn TileApi>,
    /// Tile UUID -> coordinator
    pub coordinators: HashMap<String, Arc<TileCoordinator>>,
    pub trackers: Mutex<Vec<Arc<TileDeviceTracker>>>,
}

impl TileRuntimeData {
    pub fn trackers(&self) -> Vec<Arc<TileDeviceTracker>> {
        self.trackers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Runtime data of a loaded Tile entry
pub fn runtime_data(hass: &HomeAssistant, entry_id: &str) -> Option<Arc<TileRuntimeData>> {
    hass.get_data::<TileRuntimeData>(DOMAIN, entry_id)
}

/// Entry setup and unload for Tile accounts
pub struct TileIntegration {
    login: LoginHandle,
    update_interval: Duration,
}

impl TileIntegration {
    pub fn new(login: LoginHandle) -> Self {
        Self {
            login,
            update_interval: DEFAULT_UPDATE_INTERVAL,
        }
    }

    pub fn with_update_interval(mut self, update_interval: Duration) -> Self {
        self.update_interval = update_interval;
        self
    }

    pub fn login(&self) -> &LoginHandle {
        &self.login
    }
}

impl Default for TileIntegration {
    fn default() -> Self {
        Self::new(LoginHandle::default())
    }
}

#[async_trait]
impl IntegrationSetup for TileIntegration {
    #[instrument(skip_all, fields(entry_id = %entry.entry_id))]
    async fn setup_entry(
        &self,
        hass: &Arc<HomeAssistant>,
        entry: &ConfigEntry,
    ) -> Result<(), ConfigEntryError> {
        let (Some(username), Some(password)) =
            (entry.data_str(CONF_USERNAME), entry.data_str(CONF_PASSWORD))
        else {
            return Err(ConfigEntryError::Failed("missing credentials".to_string()));
        };

        let api = match self.login.login(username, password).await {
            Ok(api) => api,
            Err(err @ TileError::InvalidAuth(_)) => {
                return Err(ConfigEntryError::AuthFailed(err.to_string()))
            }
            Err(err) => return Err(ConfigEntryError::NotReady(err.to_string())),
        };

        let tiles = api.async_get_tiles().await.map_err(|err| match err {
            TileError::InvalidAuth(_) | TileError::SessionExpired(_) => {
                ConfigEntryError::AuthFailed(err.to_string())
            }
            _ => ConfigEntryError::NotReady(err.to_string()),
        })?;

        let coordinators: HashMap<String, Arc<TileCoordinator>> = tiles
            .into_iter()
            .map(|(uuid, tile)| (uuid, TileCoordinator::new(tile, self.update_interval)))
            .collect();

        for result in join_all(
            coordinators
                .values()
                .map(|c| c.async_config_entry_first_refresh()),
        )
        .await
        {
            result?;
        }

        for coordinator in coordinators.values() {
            coordinator.start();
        }

        let mut ordered: Vec<Arc<TileCoordinator>> = coordinators.values().cloned().collect();
        ordered.sort_by(|a, b| a.tile().uuid().cmp(b.tile().uuid()));

        let tile_count = coordinators.len();
        let runtime = Arc::new(TileRuntimeData {
            api,
            coordinators,
            trackers: Mutex::new(Vec::new()),
        });
        hass.set_data(DOMAIN, &entry.entry_id, runtime.clone());

        // Platform setup runs as tracked work; `block_till_done` waits for it
        let platform_hass = hass.clone();
        let username = username.to_string();
        hass.async_create_task("tile_device_tracker_setup", async move {
            match device_tracker::async_setup_entry(&platform_hass, &username, &ordered) {
                Ok(trackers) => {
                    debug!(count = trackers.len(), "Device trackers ready");
                    runtime
                        .trackers
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .extend(trackers);
                }
                Err(err) => error!("Could not set up Tile device trackers: {}", err),
            }
        });

        info!(tiles = tile_count, "Tile entry set up");
        Ok(())
    }

    async fn unload_entry(
        &self,
        hass: &Arc<HomeAssistant>,
        entry: &ConfigEntry,
    ) -> Result<bool, ConfigEntryError> {
        // The platform task may still be writing states
        hass.block_till_done().await;

        let Some(runtime) = hass.remove_data::<TileRuntimeData>(DOMAIN, &entry.entry_id) else {
            return Ok(true);
        };

        for coordinator in runtime.coordinators.values() {
            coordinator.shutdown();
        }
        for tracker in runtime.trackers() {
            hass.states.remove(tracker.entity_id());
        }

        info!(entry_id = %entry.entry_id, "Tile entry unloaded");
        Ok(true)
    }
}
