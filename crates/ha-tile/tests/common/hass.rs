//! Test Home Assistant instance with the Tile integration registered
//!
//! Each test builds its own [`TestHomeAssistant`]; nothing here outlives
//! the test that created it.

use std::collections::HashMap;
use std::sync::{Arc, Once};

use ha_config_entries::{ConfigEntries, ConfigEntry, ConfigEntryState};
use ha_core::{HomeAssistant, State, CONF_USERNAME};
use ha_tile::{LoginHandle, LoginPatch, TileConfigFlow, TileIntegration, TileLogin, DOMAIN};
use ha_tile_client::TileApi;
use rstest::fixture;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use super::mocks::login_returning;

static TRACING: Once = Once::new();

/// Install a test subscriber honoring `RUST_LOG`
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

pub struct TestHomeAssistant {
    pub hass: Arc<HomeAssistant>,
    pub config_entries: Arc<ConfigEntries>,
    /// Login used by the config flow
    pub flow_login: LoginHandle,
    /// Login used by entry setup
    pub setup_login: LoginHandle,
}

impl TestHomeAssistant {
    pub fn new() -> Self {
        init_tracing();

        let hass = Arc::new(HomeAssistant::new());
        let config_entries = ConfigEntries::new(hass.clone());
        let setup_login = LoginHandle::cloud();
        config_entries.register_handler(
            DOMAIN,
            Arc::new(TileIntegration::new(setup_login.clone())),
        );

        Self {
            hass,
            config_entries,
            flow_login: LoginHandle::cloud(),
            setup_login,
        }
    }

    /// A fresh config flow wired to this instance
    pub fn config_flow(&self) -> TileConfigFlow {
        TileConfigFlow::new(self.config_entries.clone(), self.flow_login.clone())
    }

    pub fn entry(&self, entry_id: &str) -> ConfigEntry {
        self.config_entries
            .get(entry_id)
            .unwrap_or_else(|| panic!("No config entry {}", entry_id))
    }

    pub fn entry_state(&self, entry_id: &str) -> ConfigEntryState {
        self.entry(entry_id).state
    }

    pub fn get_state(&self, entity_id: &str) -> Option<State> {
        self.hass.states.get(entity_id)
    }

    /// Assert that an entity is in a specific state
    pub fn assert_state(&self, entity_id: &str, expected: &str) {
        let state = self.hass.states.get_state(entity_id);
        assert_eq!(
            state.as_deref(),
            Some(expected),
            "Expected entity {} to be in state '{}', but was {:?}",
            entity_id,
            expected,
            state
        );
    }
}

impl Default for TestHomeAssistant {
    fn default() -> Self {
        Self::new()
    }
}

#[fixture]
pub fn test_hass() -> TestHomeAssistant {
    TestHomeAssistant::new()
}

/// Build a Tile config entry from `config` and register it
///
/// Panics when an entry for the same username is already registered.
pub fn config_entry(test_hass: &TestHomeAssistant, config: HashMap<String, Value>) -> ConfigEntry {
    let username = config
        .get(CONF_USERNAME)
        .and_then(Value::as_str)
        .unwrap_or_else(|| panic!("Config has no {}", CONF_USERNAME))
        .to_string();

    let entry = ConfigEntry::new(DOMAIN, username.clone())
        .with_unique_id(username)
        .with_data(config);

    test_hass
        .config_entries
        .add(entry)
        .unwrap_or_else(|e| panic!("Failed to add Tile config entry: {}", e))
}

/// Both login call sites patched; dropping this restores them
pub struct MockTileLogin {
    _flow: LoginPatch,
    _setup: LoginPatch,
}

/// Route both the config flow and entry setup logins to `login`
pub fn patch_login(test_hass: &TestHomeAssistant, login: Arc<dyn TileLogin>) -> MockTileLogin {
    MockTileLogin {
        _flow: test_hass.flow_login.patch(login.clone()),
        _setup: test_hass.setup_login.patch(login),
    }
}

/// Patch both login call sites to hand out `api`
pub fn mock_tile_login(test_hass: &TestHomeAssistant, api: Arc<dyn TileApi>) -> MockTileLogin {
    patch_login(test_hass, login_returning(api))
}

/// Set up `entry_id` and wait for everything scheduled during setup
pub async fn setup_config_entry(test_hass: &TestHomeAssistant, entry_id: &str) {
    let loaded = test_hass
        .config_entries
        .setup(entry_id)
        .await
        .unwrap_or_else(|e| panic!("Setting up Tile entry {} failed: {}", entry_id, e));
    assert!(loaded, "Tile entry {} did not load", entry_id);

    test_hass.hass.block_till_done().await;
}

/// A loaded Tile entry with its login doubles in place
pub struct TileTestContext {
    pub test_hass: TestHomeAssistant,
    pub entry: ConfigEntry,
    pub login: MockTileLogin,
}

/// Register the test entry, patch logins with `api` and set the entry up
pub async fn setup_tile(api: Arc<dyn TileApi>, config: HashMap<String, Value>) -> TileTestContext {
    let test_hass = TestHomeAssistant::new();
    let entry = config_entry(&test_hass, config);
    let login = mock_tile_login(&test_hass, api);
    setup_config_entry(&test_hass, &entry.entry_id).await;

    TileTestContext {
        test_hass,
        entry,
        login,
    }
}
