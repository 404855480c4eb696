//! The runtime context handed to integrations
//!
//! A [`HomeAssistant`] owns the entity state store, the set of tracked
//! background tasks, and per-integration runtime data. Each instance is
//! independent, so tests build a fresh one and drop it at teardown.

use std::any::Any;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use dashmap::DashMap;
use tokio::task::JoinSet;
use tracing::{debug, error, Instrument};

use crate::StateStore;

/// Type-erased integration data, keyed by `"{domain}.{entry_id}"`
type RuntimeData = Arc<dyn Any + Send + Sync>;

pub struct HomeAssistant {
    /// Entity states
    pub states: Arc<StateStore>,

    /// Work scheduled through `async_create_task`, drained by `block_till_done`
    tasks: Mutex<JoinSet<()>>,

    data: DashMap<String, RuntimeData>,
}

impl HomeAssistant {
    pub fn new() -> Self {
        Self {
            states: Arc::new(StateStore::new()),
            tasks: Mutex::new(JoinSet::new()),
            data: DashMap::new(),
        }
    }

    fn lock_tasks(&self) -> MutexGuard<'_, JoinSet<()>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Schedule tracked work on the current tokio runtime
    ///
    /// Must be called from within a runtime context.
    pub fn async_create_task<F>(&self, name: &str, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        debug!(task = name, "Scheduling task");
        let span = tracing::debug_span!("hass_task", task = %name);
        self.lock_tasks().spawn(future.instrument(span));
    }

    /// Number of tracked tasks not yet collected
    pub fn pending_tasks(&self) -> usize {
        self.lock_tasks().len()
    }

    /// Wait until every tracked task has finished
    ///
    /// Tasks scheduled while waiting are awaited too. A panicking task is
    /// logged and does not abort the wait.
    pub async fn block_till_done(&self) {
        loop {
            let mut pending = std::mem::take(&mut *self.lock_tasks());
            if pending.is_empty() {
                return;
            }

            while let Some(result) = pending.join_next().await {
                if let Err(err) = result {
                    error!("Tracked task failed: {}", err);
                }
            }
        }
    }

    /// Store runtime data for an integration entry, replacing any previous value
    pub fn set_data<T: Any + Send + Sync>(&self, domain: &str, entry_id: &str, value: Arc<T>) {
        self.data.insert(data_key(domain, entry_id), value);
    }

    pub fn get_data<T: Any + Send + Sync>(&self, domain: &str, entry_id: &str) -> Option<Arc<T>> {
        self.data
            .get(&data_key(domain, entry_id))
            .and_then(|v| v.value().clone().downcast::<T>().ok())
    }

    pub fn remove_data<T: Any + Send + Sync>(
        &self,
        domain: &str,
        entry_id: &str,
    ) -> Option<Arc<T>> {
        self.data
            .remove(&data_key(domain, entry_id))
            .and_then(|(_, v)| v.downcast::<T>().ok())
    }
}

impl Default for HomeAssistant {
    fn default() -> Self {
        Self::new()
    }
}

fn data_key(domain: &str, entry_id: &str) -> String {
    format!("{domain}.{entry_id}")
}
