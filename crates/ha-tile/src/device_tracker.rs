//! Device tracker entities for Tiles

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use ha_core::{Context, EntityId, EntityIdError, HomeAssistant, State, StateStore};
use ha_core::{STATE_UNAVAILABLE, STATE_UNKNOWN};
use serde_json::{json, Value};
use tracing::debug;

use crate::constants::*;
use crate::coordinator::{TileCoordinator, UpdateStatus};

/// A Tile exposed as a GPS device tracker
pub struct TileDeviceTracker {
    entity_id: EntityId,
    unique_id: String,
    coordinator: Arc<TileCoordinator>,
}

impl TileDeviceTracker {
    pub fn new(entity_id: EntityId, username: &str, coordinator: Arc<TileCoordinator>) -> Self {
        let unique_id = format!("{}_{}", username, coordinator.tile().uuid());
        Self {
            entity_id,
            unique_id,
            coordinator,
        }
    }

    pub fn entity_id(&self) -> &EntityId {
        &self.entity_id
    }

    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    /// Dead Tiles and failed refreshes make the entity unavailable
    pub fn available(&self) -> bool {
        !self.coordinator.tile().dead()
            && matches!(
                self.coordinator.status(),
                UpdateStatus::Success | UpdateStatus::Pending
            )
    }

    pub fn state(&self) -> &'static str {
        let tile = self.coordinator.tile();
        if !self.available() {
            STATE_UNAVAILABLE
        } else if tile.latitude().is_some() && tile.longitude().is_some() {
            STATE_NOT_HOME
        } else {
            STATE_UNKNOWN
        }
    }

    pub fn attributes(&self) -> HashMap<String, Value> {
        let tile = self.coordinator.tile();
        let timestamp = |t: Option<chrono::DateTime<chrono::Utc>>| {
            t.map(|t| json!(t.to_rfc3339())).unwrap_or(Value::Null)
        };

        HashMap::from([
            (ATTR_SOURCE_TYPE.to_string(), json!(SOURCE_TYPE_GPS)),
            (ATTR_LATITUDE.to_string(), json!(tile.latitude())),
            (ATTR_LONGITUDE.to_string(), json!(tile.longitude())),
            (ATTR_GPS_ACCURACY.to_string(), json!(tile.accuracy())),
            (ATTR_ALTITUDE.to_string(), json!(tile.altitude())),
            (ATTR_IS_LOST.to_string(), json!(tile.lost())),
            (
                ATTR_LAST_LOST_TIMESTAMP.to_string(),
                timestamp(tile.lost_timestamp()),
            ),
            (ATTR_LAST_TIMESTAMP.to_string(), timestamp(tile.last_timestamp())),
            (ATTR_RING_STATE.to_string(), json!(tile.ring_state())),
            (ATTR_VOIP_STATE.to_string(), json!(tile.voip_state())),
        ])
    }

    /// Write the current state into the store
    pub fn write_state(&self, states: &StateStore) -> State {
        states.set(
            self.entity_id.clone(),
            self.state(),
            self.attributes(),
            Context::new(),
        )
    }
}

/// Create one tracker per coordinator, write initial states, and keep them
/// updated from coordinator refreshes
///
/// Coordinator listeners only hold weak references: states stop following
/// refreshes once the returned trackers are dropped.
pub fn async_setup_entry(
    hass: &Arc<HomeAssistant>,
    username: &str,
    coordinators: &[Arc<TileCoordinator>],
) -> Result<Vec<Arc<TileDeviceTracker>>, EntityIdError> {
    let mut taken: HashSet<String> = HashSet::new();
    let mut trackers = Vec::with_capacity(coordinators.len());

    for coordinator in coordinators {
        let tile = coordinator.tile();
        let mut entity_id = EntityId::from_name(PLATFORM_DEVICE_TRACKER, &tile.name(), tile.uuid())?;

        // Two Tiles with the same name get numbered object ids
        let base = entity_id.object_id().to_string();
        let mut suffix = 2;
        while taken.contains(&entity_id.to_string())
            || hass.states.get(&entity_id.to_string()).is_some()
        {
            entity_id = EntityId::new(PLATFORM_DEVICE_TRACKER, format!("{base}_{suffix}"))?;
            suffix += 1;
        }
        taken.insert(entity_id.to_string());

        let tracker = Arc::new(TileDeviceTracker::new(
            entity_id,
            username,
            coordinator.clone(),
        ));
        tracker.write_state(&hass.states);

        let states = hass.states.clone();
        let weak = Arc::downgrade(&tracker);
        coordinator.add_listener(move || {
            if let Some(tracker) = weak.upgrade() {
                tracker.write_state(&states);
            }
        });

        debug!(entity_id = %tracker.entity_id(), "Added Tile device tracker");
        trackers.push(tracker);
    }

    Ok(trackers)
}
