//! Config Entries Manager
//!
//! Tracks every config entry of a runtime and drives their lifecycle through
//! the integration handlers registered per domain.

use std::collections::HashSet;
use std::sync::{Arc, Weak};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use ha_core::HomeAssistant;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::entry::{ConfigEntry, ConfigEntryState, ConfigEntryUpdate};
use crate::state_machine::{calculate_retry_delay, InvalidTransition};

/// Config entries errors
#[derive(Debug, Error)]
pub enum ConfigEntriesError {
    #[error("Entry not found: {0}")]
    NotFound(String),

    #[error("Entry already exists for domain {domain} with unique_id {unique_id}")]
    AlreadyExists { domain: String, unique_id: String },

    #[error("Cannot unload entry in state {0:?}")]
    CannotUnload(ConfigEntryState),

    #[error(transparent)]
    InvalidState(#[from] InvalidTransition),
}

pub type ConfigEntriesResult<T> = Result<T, ConfigEntriesError>;

/// Failure reported by an integration while setting up or unloading an entry
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigEntryError {
    /// Credentials were rejected; the entry needs re-authentication
    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    /// A dependency is temporarily unavailable; setup will be retried
    #[error("Not ready: {0}")]
    NotReady(String),

    #[error("Setup failed: {0}")]
    Failed(String),
}

/// Entry lifecycle hooks implemented by an integration
#[async_trait]
pub trait IntegrationSetup: Send + Sync {
    async fn setup_entry(
        &self,
        hass: &Arc<HomeAssistant>,
        entry: &ConfigEntry,
    ) -> Result<(), ConfigEntryError>;

    /// Tear down what `setup_entry` created; `Ok(false)` means the unload failed
    async fn unload_entry(
        &self,
        hass: &Arc<HomeAssistant>,
        entry: &ConfigEntry,
    ) -> Result<bool, ConfigEntryError>;
}

/// Config Entries Manager
///
/// Manages the lifecycle of configuration entries including:
/// - Entry creation and removal
/// - Duplicate prevention by (domain, unique_id)
/// - Validated state transitions
/// - Dispatch to integration setup/unload handlers
pub struct ConfigEntries {
    hass: Arc<HomeAssistant>,

    /// Primary index: entry_id -> ConfigEntry
    entries: DashMap<String, ConfigEntry>,

    /// Index: domain -> set of entry_ids
    by_domain: DashMap<String, HashSet<String>>,

    /// Index: (domain, unique_id) -> entry_id
    by_unique_id: DashMap<(String, String), String>,

    /// Serializes setup/unload
    setup_lock: Mutex<()>,

    handlers: DashMap<String, Arc<dyn IntegrationSetup>>,

    /// Pending setup retries: entry_id -> timer task
    retries: DashMap<String, JoinHandle<()>>,

    /// Handed to retry timers so they never keep the manager alive
    this: Weak<ConfigEntries>,
}

impl ConfigEntries {
    pub fn new(hass: Arc<HomeAssistant>) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            hass,
            entries: DashMap::new(),
            by_domain: DashMap::new(),
            by_unique_id: DashMap::new(),
            setup_lock: Mutex::new(()),
            handlers: DashMap::new(),
            retries: DashMap::new(),
            this: this.clone(),
        })
    }

    /// The runtime entries are set up against
    pub fn hass(&self) -> &Arc<HomeAssistant> {
        &self.hass
    }

    fn index_entry(&self, entry: &ConfigEntry) {
        let entry_id = entry.entry_id.clone();

        self.entries.insert(entry_id.clone(), entry.clone());

        self.by_domain
            .entry(entry.domain.clone())
            .or_default()
            .insert(entry_id.clone());

        if let Some(ref unique_id) = entry.unique_id {
            self.by_unique_id
                .insert((entry.domain.clone(), unique_id.clone()), entry_id);
        }
    }

    fn unindex_entry(&self, entry: &ConfigEntry) {
        if let Some(mut ids) = self.by_domain.get_mut(&entry.domain) {
            ids.remove(&entry.entry_id);
        }

        if let Some(ref unique_id) = entry.unique_id {
            self.by_unique_id
                .remove(&(entry.domain.clone(), unique_id.clone()));
        }

        self.entries.remove(&entry.entry_id);
    }

    /// Get an entry by ID
    pub fn get(&self, entry_id: &str) -> Option<ConfigEntry> {
        self.entries.get(entry_id).map(|r| r.value().clone())
    }

    fn require(&self, entry_id: &str) -> ConfigEntriesResult<ConfigEntry> {
        self.get(entry_id)
            .ok_or_else(|| ConfigEntriesError::NotFound(entry_id.to_string()))
    }

    /// Get all entries for a domain
    pub fn get_by_domain(&self, domain: &str) -> Vec<ConfigEntry> {
        self.by_domain
            .get(domain)
            .map(|ids| ids.iter().filter_map(|id| self.get(id)).collect())
            .unwrap_or_default()
    }

    pub fn get_by_unique_id(&self, domain: &str, unique_id: &str) -> Option<ConfigEntry> {
        self.by_unique_id
            .get(&(domain.to_string(), unique_id.to_string()))
            .and_then(|entry_id| self.get(&entry_id))
    }

    /// Register a new config entry
    pub fn add(&self, entry: ConfigEntry) -> ConfigEntriesResult<ConfigEntry> {
        if let Some(ref unique_id) = entry.unique_id {
            if self.get_by_unique_id(&entry.domain, unique_id).is_some() {
                return Err(ConfigEntriesError::AlreadyExists {
                    domain: entry.domain.clone(),
                    unique_id: unique_id.clone(),
                });
            }
        }

        self.index_entry(&entry);

        info!(
            "Added config entry: {} ({}) [{}]",
            entry.title, entry.domain, entry.entry_id
        );

        Ok(entry)
    }

    /// Update an existing entry
    pub fn update(
        &self,
        entry_id: &str,
        update: ConfigEntryUpdate,
    ) -> ConfigEntriesResult<ConfigEntry> {
        let entry = self.require(entry_id)?;

        self.unindex_entry(&entry);

        let mut updated = entry;
        if let Some(title) = update.title {
            updated.title = title;
        }
        if let Some(data) = update.data {
            updated.data = data;
        }
        if let Some(options) = update.options {
            updated.options = options;
        }
        if let Some(unique_id) = update.unique_id {
            updated.unique_id = unique_id;
        }
        updated.modified_at = Utc::now();

        self.index_entry(&updated);

        debug!("Updated config entry: {}", entry_id);
        Ok(updated)
    }

    /// Remove an entry, unloading it first if needed
    pub async fn remove(&self, entry_id: &str) -> ConfigEntriesResult<ConfigEntry> {
        self.unload(entry_id).await?;
        let entry = self.require(entry_id)?;

        self.unindex_entry(&entry);

        info!(
            "Removed config entry: {} ({}) [{}]",
            entry.title, entry.domain, entry_id
        );

        Ok(entry)
    }

    /// Apply a validated state transition to a stored entry
    fn transition(
        &self,
        entry_id: &str,
        state: ConfigEntryState,
        reason: Option<String>,
    ) -> ConfigEntriesResult<()> {
        let mut entry = self
            .entries
            .get_mut(entry_id)
            .ok_or_else(|| ConfigEntriesError::NotFound(entry_id.to_string()))?;
        entry.try_set_state(state, reason)?;
        debug!("Entry {} state changed to {:?}", entry_id, state);
        Ok(())
    }

    /// Register the setup/unload handler for a domain
    pub fn register_handler(&self, domain: &str, handler: Arc<dyn IntegrationSetup>) {
        self.handlers.insert(domain.to_string(), handler);
        debug!("Registered setup handler for domain: {}", domain);
    }

    fn handler(&self, domain: &str) -> Option<Arc<dyn IntegrationSetup>> {
        self.handlers.get(domain).map(|h| h.value().clone())
    }

    /// Set up an entry through its integration
    ///
    /// Returns `Ok(true)` when the entry ends up loaded and `Ok(false)` when
    /// the integration reported a failure (the entry is then in SetupError or
    /// SetupRetry). Setting up an entry that is already loaded is an error.
    pub async fn setup(&self, entry_id: &str) -> ConfigEntriesResult<bool> {
        let _lock = self.setup_lock.lock().await;
        self.setup_locked(entry_id).await
    }

    async fn setup_locked(&self, entry_id: &str) -> ConfigEntriesResult<bool> {
        let entry = self.require(entry_id)?;
        self.transition(entry_id, ConfigEntryState::SetupInProgress, None)?;

        let Some(handler) = self.handler(&entry.domain) else {
            debug!(
                "No setup handler for domain {}, marking as loaded",
                entry.domain
            );
            self.transition(entry_id, ConfigEntryState::Loaded, None)?;
            return Ok(true);
        };

        match handler.setup_entry(&self.hass, &entry).await {
            Ok(()) => {
                self.transition(entry_id, ConfigEntryState::Loaded, None)?;
                info!("Setup completed for entry: {} ({})", entry.title, entry_id);
                Ok(true)
            }
            Err(ConfigEntryError::NotReady(reason)) => {
                self.transition(
                    entry_id,
                    ConfigEntryState::SetupRetry,
                    Some(reason.clone()),
                )?;
                let tries = self
                    .entries
                    .get_mut(entry_id)
                    .map(|mut e| e.increment_tries())
                    .unwrap_or_default();
                let delay = calculate_retry_delay(tries);
                warn!(
                    "Config entry {} for {} is not ready yet: {}; retrying in {:?}",
                    entry.title, entry.domain, reason, delay
                );
                self.schedule_retry(entry_id, delay);
                Ok(false)
            }
            Err(err @ ConfigEntryError::AuthFailed(_)) | Err(err @ ConfigEntryError::Failed(_)) => {
                warn!("Setup failed for entry {}: {}", entry_id, err);
                self.transition(entry_id, ConfigEntryState::SetupError, Some(err.to_string()))?;
                Ok(false)
            }
        }
    }

    /// Run setup again for `entry_id` once `delay` has passed
    ///
    /// Replaces any retry already pending for the entry. The timer is
    /// untracked, so `block_till_done` does not wait for it.
    fn schedule_retry(&self, entry_id: &str, delay: Duration) {
        let this = self.this.clone();
        let id = entry_id.to_string();

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let Some(manager) = this.upgrade() else {
                return;
            };
            let _lock = manager.setup_lock.lock().await;
            manager.retries.remove(&id);

            // Unloaded, removed or set up by hand while waiting
            let due = manager
                .get(&id)
                .is_some_and(|e| e.state == ConfigEntryState::SetupRetry);
            if !due {
                return;
            }
            debug!("Retrying setup of entry {}", id);
            if let Err(err) = manager.setup_locked(&id).await {
                warn!("Retrying setup of entry {} failed: {}", id, err);
            }
        });

        if let Some(previous) = self.retries.insert(entry_id.to_string(), handle) {
            previous.abort();
        }
    }

    fn cancel_retry(&self, entry_id: &str) {
        if let Some((_, handle)) = self.retries.remove(entry_id) {
            handle.abort();
            debug!("Cancelled setup retry for entry {}", entry_id);
        }
    }

    /// Whether a setup retry is pending for the entry
    pub fn retry_pending(&self, entry_id: &str) -> bool {
        self.retries.contains_key(entry_id)
    }

    /// Unload an entry
    ///
    /// Unloading an entry that is not loaded is a no-op returning `Ok(true)`.
    pub async fn unload(&self, entry_id: &str) -> ConfigEntriesResult<bool> {
        let _lock = self.setup_lock.lock().await;
        self.unload_locked(entry_id).await
    }

    async fn unload_locked(&self, entry_id: &str) -> ConfigEntriesResult<bool> {
        let entry = self.require(entry_id)?;
        self.cancel_retry(entry_id);

        if entry.state == ConfigEntryState::NotLoaded {
            return Ok(true);
        }
        if !entry.state.is_recoverable() {
            return Err(ConfigEntriesError::CannotUnload(entry.state));
        }

        self.transition(entry_id, ConfigEntryState::UnloadInProgress, None)?;

        // Failed setups left nothing behind to tear down
        let handler = match entry.state {
            ConfigEntryState::Loaded => self.handler(&entry.domain),
            _ => None,
        };

        let outcome = match handler {
            Some(handler) => handler.unload_entry(&self.hass, &entry).await,
            None => Ok(true),
        };

        match outcome {
            Ok(true) => {
                self.transition(entry_id, ConfigEntryState::NotLoaded, None)?;
                info!("Unloaded entry: {} ({})", entry.title, entry_id);
                Ok(true)
            }
            Ok(false) => {
                self.transition(entry_id, ConfigEntryState::FailedUnload, None)?;
                warn!("Integration refused to unload entry {}", entry_id);
                Ok(false)
            }
            Err(err) => {
                warn!("Unload failed for entry {}: {}", entry_id, err);
                self.transition(entry_id, ConfigEntryState::FailedUnload, Some(err.to_string()))?;
                Ok(false)
            }
        }
    }

    /// Reload an entry (unload + setup)
    pub async fn reload(&self, entry_id: &str) -> ConfigEntriesResult<bool> {
        let _lock = self.setup_lock.lock().await;
        if !self.unload_locked(entry_id).await? {
            return Ok(false);
        }
        self.setup_locked(entry_id).await
    }

    pub fn entry_ids(&self) -> Vec<String> {
        self.entries.iter().map(|r| r.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Handler returning a fixed setup outcome and counting calls
    struct FixedHandler {
        outcome: Result<(), ConfigEntryError>,
        setups: AtomicUsize,
        unloads: AtomicUsize,
    }

    impl FixedHandler {
        fn new(outcome: Result<(), ConfigEntryError>) -> Arc<Self> {
            Arc::new(Self {
                outcome,
                setups: AtomicUsize::new(0),
                unloads: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl IntegrationSetup for FixedHandler {
        async fn setup_entry(
            &self,
            _hass: &Arc<HomeAssistant>,
            _entry: &ConfigEntry,
        ) -> Result<(), ConfigEntryError> {
            self.setups.fetch_add(1, Ordering::SeqCst);
            self.outcome.clone()
        }

        async fn unload_entry(
            &self,
            _hass: &Arc<HomeAssistant>,
            _entry: &ConfigEntry,
        ) -> Result<bool, ConfigEntryError> {
            self.unloads.fetch_add(1, Ordering::SeqCst);
            Ok(true)
        }
    }

    fn create_test_manager() -> Arc<ConfigEntries> {
        ConfigEntries::new(Arc::new(HomeAssistant::new()))
    }

    fn state_of(manager: &ConfigEntries, entry_id: &str) -> ConfigEntryState {
        manager.get(entry_id).unwrap().state
    }

    #[test]
    fn test_add_and_lookup() {
        let manager = create_test_manager();

        let added = manager
            .add(ConfigEntry::new("tile", "user@host.com").with_unique_id("user@host.com"))
            .unwrap();

        assert_eq!(manager.len(), 1);
        assert_eq!(manager.get_by_domain("tile").len(), 1);
        assert_eq!(
            manager
                .get_by_unique_id("tile", "user@host.com")
                .unwrap()
                .entry_id,
            added.entry_id
        );
    }

    #[test]
    fn test_duplicate_unique_id_rejected() {
        let manager = create_test_manager();

        manager
            .add(ConfigEntry::new("tile", "Account 1").with_unique_id("same-id"))
            .unwrap();
        let result = manager.add(ConfigEntry::new("tile", "Account 2").with_unique_id("same-id"));

        assert!(matches!(
            result,
            Err(ConfigEntriesError::AlreadyExists { .. })
        ));
    }

    #[test]
    fn test_update_reindexes_unique_id() {
        let manager = create_test_manager();
        let entry = manager
            .add(ConfigEntry::new("tile", "Old").with_unique_id("old"))
            .unwrap();

        let mut update = ConfigEntryUpdate::new().title("New");
        update.unique_id = Some(Some("new".to_string()));
        let updated = manager.update(&entry.entry_id, update).unwrap();

        assert_eq!(updated.title, "New");
        assert!(manager.get_by_unique_id("tile", "old").is_none());
        assert!(manager.get_by_unique_id("tile", "new").is_some());
    }

    #[tokio::test]
    async fn test_setup_and_unload() {
        let manager = create_test_manager();
        let handler = FixedHandler::new(Ok(()));
        manager.register_handler("tile", handler.clone());

        let entry = manager.add(ConfigEntry::new("tile", "Test")).unwrap();
        assert!(manager.setup(&entry.entry_id).await.unwrap());
        assert_eq!(state_of(&manager, &entry.entry_id), ConfigEntryState::Loaded);

        assert!(manager.unload(&entry.entry_id).await.unwrap());
        assert_eq!(state_of(&manager, &entry.entry_id), ConfigEntryState::NotLoaded);
        assert_eq!(handler.setups.load(Ordering::SeqCst), 1);
        assert_eq!(handler.unloads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_second_setup_fails_loudly() {
        let manager = create_test_manager();
        manager.register_handler("tile", FixedHandler::new(Ok(())));

        let entry = manager.add(ConfigEntry::new("tile", "Test")).unwrap();
        assert!(manager.setup(&entry.entry_id).await.unwrap());

        let result = manager.setup(&entry.entry_id).await;
        assert!(matches!(result, Err(ConfigEntriesError::InvalidState(_))));
        assert_eq!(state_of(&manager, &entry.entry_id), ConfigEntryState::Loaded);
    }

    #[tokio::test]
    async fn test_not_ready_moves_to_retry() {
        let manager = create_test_manager();
        manager.register_handler(
            "tile",
            FixedHandler::new(Err(ConfigEntryError::NotReady("cloud offline".into()))),
        );

        let entry = manager.add(ConfigEntry::new("tile", "Test")).unwrap();
        assert!(!manager.setup(&entry.entry_id).await.unwrap());

        let stored = manager.get(&entry.entry_id).unwrap();
        assert_eq!(stored.state, ConfigEntryState::SetupRetry);
        assert_eq!(stored.tries, 1);
        assert_eq!(stored.reason.as_deref(), Some("cloud offline"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_ready_schedules_setup_again() {
        let manager = create_test_manager();
        let handler = FixedHandler::new(Err(ConfigEntryError::NotReady("cloud offline".into())));
        manager.register_handler("tile", handler.clone());

        let entry = manager.add(ConfigEntry::new("tile", "Test")).unwrap();
        assert!(!manager.setup(&entry.entry_id).await.unwrap());
        assert!(manager.retry_pending(&entry.entry_id));
        assert_eq!(handler.setups.load(Ordering::SeqCst), 1);

        // First retry waits 10s plus jitter
        tokio::time::sleep(Duration::from_secs(9)).await;
        assert_eq!(handler.setups.load(Ordering::SeqCst), 1);
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(handler.setups.load(Ordering::SeqCst), 2);

        let stored = manager.get(&entry.entry_id).unwrap();
        assert_eq!(stored.state, ConfigEntryState::SetupRetry);
        assert_eq!(stored.tries, 2);
        assert!(manager.retry_pending(&entry.entry_id));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unload_cancels_pending_retry() {
        let manager = create_test_manager();
        let handler = FixedHandler::new(Err(ConfigEntryError::NotReady("cloud offline".into())));
        manager.register_handler("tile", handler.clone());

        let entry = manager.add(ConfigEntry::new("tile", "Test")).unwrap();
        manager.setup(&entry.entry_id).await.unwrap();
        assert!(manager.unload(&entry.entry_id).await.unwrap());
        assert!(!manager.retry_pending(&entry.entry_id));

        tokio::time::sleep(Duration::from_secs(300)).await;
        assert_eq!(handler.setups.load(Ordering::SeqCst), 1);
        assert_eq!(state_of(&manager, &entry.entry_id), ConfigEntryState::NotLoaded);
    }

    #[tokio::test(start_paused = true)]
    async fn test_remove_cancels_pending_retry() {
        let manager = create_test_manager();
        let handler = FixedHandler::new(Err(ConfigEntryError::NotReady("cloud offline".into())));
        manager.register_handler("tile", handler.clone());

        let entry = manager.add(ConfigEntry::new("tile", "Test")).unwrap();
        manager.setup(&entry.entry_id).await.unwrap();
        manager.remove(&entry.entry_id).await.unwrap();

        tokio::time::sleep(Duration::from_secs(300)).await;
        assert_eq!(handler.setups.load(Ordering::SeqCst), 1);
        assert!(manager.is_empty());
    }

    /// Handler that is not ready for its first `failures` setups
    struct RecoveringHandler {
        failures: usize,
        setups: AtomicUsize,
    }

    #[async_trait]
    impl IntegrationSetup for RecoveringHandler {
        async fn setup_entry(
            &self,
            _hass: &Arc<HomeAssistant>,
            _entry: &ConfigEntry,
        ) -> Result<(), ConfigEntryError> {
            if self.setups.fetch_add(1, Ordering::SeqCst) < self.failures {
                return Err(ConfigEntryError::NotReady("cloud offline".into()));
            }
            Ok(())
        }

        async fn unload_entry(
            &self,
            _hass: &Arc<HomeAssistant>,
            _entry: &ConfigEntry,
        ) -> Result<bool, ConfigEntryError> {
            Ok(true)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_loads_entry_once_ready() {
        let manager = create_test_manager();
        let handler = Arc::new(RecoveringHandler {
            failures: 2,
            setups: AtomicUsize::new(0),
        });
        manager.register_handler("tile", handler.clone());

        let entry = manager.add(ConfigEntry::new("tile", "Test")).unwrap();
        assert!(!manager.setup(&entry.entry_id).await.unwrap());

        // 10s then 20s
        tokio::time::sleep(Duration::from_secs(31)).await;

        let stored = manager.get(&entry.entry_id).unwrap();
        assert_eq!(stored.state, ConfigEntryState::Loaded);
        assert_eq!(stored.tries, 0);
        assert_eq!(handler.setups.load(Ordering::SeqCst), 3);
        assert!(!manager.retry_pending(&entry.entry_id));
    }

    #[tokio::test]
    async fn test_auth_failure_is_setup_error() {
        let manager = create_test_manager();
        let handler = FixedHandler::new(Err(ConfigEntryError::AuthFailed("bad password".into())));
        manager.register_handler("tile", handler.clone());

        let entry = manager.add(ConfigEntry::new("tile", "Test")).unwrap();
        assert!(!manager.setup(&entry.entry_id).await.unwrap());
        assert_eq!(state_of(&manager, &entry.entry_id), ConfigEntryState::SetupError);

        // A failed setup has nothing to tear down
        assert!(manager.unload(&entry.entry_id).await.unwrap());
        assert_eq!(handler.unloads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_reload_runs_setup_again() {
        let manager = create_test_manager();
        let handler = FixedHandler::new(Ok(()));
        manager.register_handler("tile", handler.clone());

        let entry = manager.add(ConfigEntry::new("tile", "Test")).unwrap();
        manager.setup(&entry.entry_id).await.unwrap();
        assert!(manager.reload(&entry.entry_id).await.unwrap());

        assert_eq!(handler.setups.load(Ordering::SeqCst), 2);
        assert_eq!(state_of(&manager, &entry.entry_id), ConfigEntryState::Loaded);
    }

    #[tokio::test]
    async fn test_remove_unloads_first() {
        let manager = create_test_manager();
        let handler = FixedHandler::new(Ok(()));
        manager.register_handler("tile", handler.clone());

        let entry = manager
            .add(ConfigEntry::new("tile", "Test").with_unique_id("u"))
            .unwrap();
        manager.setup(&entry.entry_id).await.unwrap();
        manager.remove(&entry.entry_id).await.unwrap();

        assert!(manager.is_empty());
        assert!(manager.get_by_unique_id("tile", "u").is_none());
        assert_eq!(handler.unloads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_setup_unknown_entry() {
        let manager = create_test_manager();
        assert!(matches!(
            manager.setup("missing").await,
            Err(ConfigEntriesError::NotFound(_))
        ));
    }
}
