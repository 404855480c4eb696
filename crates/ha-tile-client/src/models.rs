//! Wire payloads returned by the Tile cloud

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Envelope of `GET tiles/{tile_uuid}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileDetailsResponse {
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub revision: u32,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub timestamp_ms: Option<i64>,
    #[serde(default)]
    pub result_code: i32,
    pub result: TileDetails,
}

/// Static and last-known data of one Tile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileDetails {
    pub tile_uuid: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub archetype: Option<String>,
    #[serde(default)]
    pub is_dead: bool,
    #[serde(default = "default_visible")]
    pub visible: bool,
    #[serde(default)]
    pub firmware_version: Option<String>,
    #[serde(default)]
    pub hw_version: Option<String>,
    #[serde(default)]
    pub tile_type: Option<String>,
    #[serde(default)]
    pub last_tile_state: Option<TileState>,

    /// Fields this client does not interpret, kept for diagnostics
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_visible() -> bool {
    true
}

/// Last location report of a Tile
///
/// Timestamps are epoch milliseconds; a `lost_timestamp` of -1 means the
/// Tile was never marked lost.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TileState {
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub altitude: Option<f64>,
    #[serde(default)]
    pub h_accuracy: Option<f64>,
    #[serde(default)]
    pub v_accuracy: Option<f64>,
    #[serde(default)]
    pub timestamp: Option<i64>,
    #[serde(default)]
    pub lost_timestamp: Option<i64>,
    #[serde(default)]
    pub is_lost: bool,
    #[serde(default)]
    pub ring_state: Option<String>,
    #[serde(default)]
    pub voip_state: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One item of `GET users/{user_uuid}/user_tiles`
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct UserTile {
    pub tile_uuid: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct UserTilesResponse {
    #[serde(default)]
    pub result: Vec<UserTile>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SessionUser {
    pub user_uuid: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SessionResult {
    pub user: SessionUser,
    /// Epoch milliseconds
    pub session_expiration_timestamp: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SessionResponse {
    pub result: SessionResult,
}
