//! Test fixtures and data loading
//!
//! Fixture files live in `tests/fixtures/`. The Tile details payload is read
//! from disk once per test binary and shared read-only afterwards.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::OnceLock;

use ha_core::{CONF_PASSWORD, CONF_USERNAME};
use ha_tile_client::TileDetailsResponse;
use rstest::fixture;
use serde_json::{json, Value};

pub const TEST_USERNAME: &str = "user@host.com";
pub const TEST_PASSWORD: &str = "123abc";

pub const TILE_DETAILS_FIXTURE: &str = "tile_details_data.json";

/// Load a fixture file as a string
pub fn load_fixture(name: &str) -> String {
    let path = fixture_path(name);
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to load fixture '{}' from {:?}: {}", name, path, e))
}

/// Load a fixture file as JSON
pub fn load_json_fixture(name: &str) -> Value {
    let content = load_fixture(name);
    serde_json::from_str(&content).unwrap_or_else(|e| {
        panic!(
            "Failed to parse fixture '{}' from {:?} as JSON: {}",
            name,
            fixture_path(name),
            e
        )
    })
}

fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Config entry data for the test account
#[fixture]
pub fn config() -> HashMap<String, Value> {
    HashMap::from([
        (CONF_USERNAME.to_string(), json!(TEST_USERNAME)),
        (CONF_PASSWORD.to_string(), json!(TEST_PASSWORD)),
    ])
}

static TILE_DETAILS: OnceLock<TileDetailsResponse> = OnceLock::new();
static TILE_DETAILS_LOADS: AtomicUsize = AtomicUsize::new(0);

/// The Tile details payload, loaded on first use
#[fixture]
pub fn data_tile_details() -> &'static TileDetailsResponse {
    TILE_DETAILS.get_or_init(|| {
        TILE_DETAILS_LOADS.fetch_add(1, Ordering::SeqCst);
        let raw = load_json_fixture(TILE_DETAILS_FIXTURE);
        serde_json::from_value(raw).unwrap_or_else(|e| {
            panic!(
                "Fixture '{}' is not a Tile details payload: {}",
                TILE_DETAILS_FIXTURE, e
            )
        })
    })
}

/// How many times the Tile details payload was read from disk
pub fn tile_details_loads() -> usize {
    TILE_DETAILS_LOADS.load(Ordering::SeqCst)
}
