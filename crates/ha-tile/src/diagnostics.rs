//! Config entry diagnostics with location data redacted

use serde_json::{json, Map, Value};

use crate::TileRuntimeData;

pub const REDACTED: &str = "**REDACTED**";

/// Keys never included in diagnostics output
pub const TO_REDACT: &[&str] = &["altitude", "latitude", "longitude", "user_uuid"];

/// Replace the value of every key in `keys`, at any depth
pub fn async_redact_data(data: &Value, keys: &[&str]) -> Value {
    match data {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| {
                    let v = if keys.contains(&k.as_str()) && !v.is_null() {
                        json!(REDACTED)
                    } else {
                        async_redact_data(v, keys)
                    };
                    (k.clone(), v)
                })
                .collect::<Map<String, Value>>(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(|v| async_redact_data(v, keys)).collect()),
        other => other.clone(),
    }
}

/// Diagnostics for one loaded Tile entry
pub fn async_get_config_entry_diagnostics(runtime: &TileRuntimeData) -> Value {
    let mut tiles: Vec<Value> = runtime
        .coordinators
        .values()
        .map(|c| c.tile().as_json())
        .collect();
    tiles.sort_by(|a, b| a["tile_uuid"].as_str().cmp(&b["tile_uuid"].as_str()));

    async_redact_data(&json!({ "tiles": tiles }), TO_REDACT)
}
