//! A single Tile tracker

use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use tracing::debug;

use crate::errors::{TileError, TileResult};
use crate::models::{TileDetails, TileDetailsResponse, TileState};

/// Fetches fresh details for a Tile
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait TileConnection: Send + Sync {
    async fn tile_details(&self, tile_uuid: &str) -> TileResult<TileDetailsResponse>;
}

/// A Tile and its last-known data
///
/// Cheap to read from many places; [`Tile::async_update`] swaps the data in
/// place through the connection it was built with.
pub struct Tile {
    uuid: String,
    connection: Option<Arc<dyn TileConnection>>,
    details: RwLock<TileDetails>,
}

impl std::fmt::Debug for Tile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tile")
            .field("uuid", &self.uuid)
            .field("name", &self.name())
            .finish()
    }
}

fn millis_to_datetime(ms: Option<i64>) -> Option<DateTime<Utc>> {
    ms.filter(|ms| *ms >= 0)
        .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
}

impl Tile {
    /// Build a Tile from a details payload
    ///
    /// Without a connection the Tile is read-only and `async_update` fails.
    pub fn new(connection: Option<Arc<dyn TileConnection>>, payload: TileDetailsResponse) -> Self {
        Self {
            uuid: payload.result.tile_uuid.clone(),
            connection,
            details: RwLock::new(payload.result),
        }
    }

    /// Build a Tile from an untyped details payload
    pub fn from_json(
        connection: Option<Arc<dyn TileConnection>>,
        payload: &serde_json::Value,
    ) -> TileResult<Self> {
        let payload: TileDetailsResponse = serde_json::from_value(payload.clone())?;
        Ok(Self::new(connection, payload))
    }

    fn read<T>(&self, f: impl FnOnce(&TileDetails) -> T) -> T {
        let details = self.details.read().unwrap_or_else(PoisonError::into_inner);
        f(&details)
    }

    fn read_state<T>(&self, f: impl FnOnce(&TileState) -> Option<T>) -> Option<T> {
        self.read(|d| d.last_tile_state.as_ref().and_then(f))
    }

    /// Refresh this Tile's data from the cloud
    pub async fn async_update(&self) -> TileResult<()> {
        let connection = self.connection.as_ref().ok_or_else(|| {
            TileError::Request(format!("Tile {} has no connection to update through", self.uuid))
        })?;

        let payload = connection.tile_details(&self.uuid).await?;
        if payload.result.tile_uuid != self.uuid {
            return Err(TileError::InvalidPayload(format!(
                "expected details for {}, got {}",
                self.uuid, payload.result.tile_uuid
            )));
        }

        debug!(tile = %self.uuid, "Updated Tile data");
        *self.details.write().unwrap_or_else(PoisonError::into_inner) = payload.result;
        Ok(())
    }

    pub fn uuid(&self) -> &str {
        &self.uuid
    }

    pub fn name(&self) -> String {
        self.read(|d| d.name.clone())
    }

    pub fn archetype(&self) -> Option<String> {
        self.read(|d| d.archetype.clone())
    }

    pub fn kind(&self) -> Option<String> {
        self.read(|d| d.tile_type.clone())
    }

    pub fn dead(&self) -> bool {
        self.read(|d| d.is_dead)
    }

    pub fn visible(&self) -> bool {
        self.read(|d| d.visible)
    }

    pub fn firmware_version(&self) -> Option<String> {
        self.read(|d| d.firmware_version.clone())
    }

    pub fn hardware_version(&self) -> Option<String> {
        self.read(|d| d.hw_version.clone())
    }

    /// Horizontal accuracy in meters
    pub fn accuracy(&self) -> Option<f64> {
        self.read_state(|s| s.h_accuracy)
    }

    pub fn altitude(&self) -> Option<f64> {
        self.read_state(|s| s.altitude)
    }

    pub fn latitude(&self) -> Option<f64> {
        self.read_state(|s| s.latitude)
    }

    pub fn longitude(&self) -> Option<f64> {
        self.read_state(|s| s.longitude)
    }

    pub fn lost(&self) -> bool {
        self.read_state(|s| Some(s.is_lost)).unwrap_or(false)
    }

    pub fn lost_timestamp(&self) -> Option<DateTime<Utc>> {
        millis_to_datetime(self.read_state(|s| s.lost_timestamp))
    }

    pub fn last_timestamp(&self) -> Option<DateTime<Utc>> {
        millis_to_datetime(self.read_state(|s| s.timestamp))
    }

    pub fn ring_state(&self) -> Option<String> {
        self.read_state(|s| s.ring_state.clone())
    }

    pub fn voip_state(&self) -> Option<String> {
        self.read_state(|s| s.voip_state.clone())
    }

    /// Snapshot of the current details
    pub fn details(&self) -> TileDetails {
        self.read(Clone::clone)
    }

    /// Current details as JSON
    pub fn as_json(&self) -> serde_json::Value {
        self.read(|d| serde_json::to_value(d).unwrap_or_default())
    }
}
