//! Swappable login strategy
//!
//! The config flow and entry setup both log in through a [`LoginHandle`].
//! Production code leaves the [`CloudLogin`] in place; tests swap in a
//! double with [`LoginHandle::patch`] and get the original back when the
//! returned guard drops.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use ha_tile_client::{async_login, ClientOptions, TileApi, TileResult};
use tracing::debug;

/// Turns credentials into an authenticated Tile client
#[async_trait]
pub trait TileLogin: Send + Sync {
    async fn login(&self, username: &str, password: &str) -> TileResult<Arc<dyn TileApi>>;
}

/// Logs in against the real Tile cloud
#[derive(Debug, Clone, Default)]
pub struct CloudLogin {
    options: ClientOptions,
}

impl CloudLogin {
    pub fn new(options: ClientOptions) -> Self {
        Self { options }
    }
}

#[async_trait]
impl TileLogin for CloudLogin {
    async fn login(&self, username: &str, password: &str) -> TileResult<Arc<dyn TileApi>> {
        let api = async_login(username, password, self.options.clone()).await?;
        Ok(Arc::new(api))
    }
}

struct Slot {
    login: RwLock<Arc<dyn TileLogin>>,
    patches: AtomicUsize,
}

/// Shared, swappable login strategy
#[derive(Clone)]
pub struct LoginHandle {
    slot: Arc<Slot>,
}

impl LoginHandle {
    pub fn new(login: Arc<dyn TileLogin>) -> Self {
        Self {
            slot: Arc::new(Slot {
                login: RwLock::new(login),
                patches: AtomicUsize::new(0),
            }),
        }
    }

    /// Handle that logs in against the Tile cloud with default options
    pub fn cloud() -> Self {
        Self::new(Arc::new(CloudLogin::default()))
    }

    /// The strategy currently in effect
    pub fn current(&self) -> Arc<dyn TileLogin> {
        self.slot
            .login
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Log in with the strategy currently in effect
    pub async fn login(&self, username: &str, password: &str) -> TileResult<Arc<dyn TileApi>> {
        let login = self.current();
        login.login(username, password).await
    }

    /// Replace the strategy until the returned guard is dropped
    ///
    /// Nested patches must be dropped in reverse order of creation.
    #[must_use = "the patch is reverted as soon as the guard is dropped"]
    pub fn patch(&self, login: Arc<dyn TileLogin>) -> LoginPatch {
        let previous = std::mem::replace(
            &mut *self
                .slot
                .login
                .write()
                .unwrap_or_else(PoisonError::into_inner),
            login,
        );
        let depth = self.slot.patches.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(depth, "Patched Tile login");

        LoginPatch {
            slot: self.slot.clone(),
            previous: Some(previous),
        }
    }

    pub fn is_patched(&self) -> bool {
        self.slot.patches.load(Ordering::SeqCst) > 0
    }
}

impl Default for LoginHandle {
    fn default() -> Self {
        Self::cloud()
    }
}

/// Restores the previous login strategy on drop, including during unwinding
pub struct LoginPatch {
    slot: Arc<Slot>,
    previous: Option<Arc<dyn TileLogin>>,
}

impl Drop for LoginPatch {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            *self
                .slot
                .login
                .write()
                .unwrap_or_else(PoisonError::into_inner) = previous;
            self.slot.patches.fetch_sub(1, Ordering::SeqCst);
            debug!("Restored Tile login");
        }
    }
}
