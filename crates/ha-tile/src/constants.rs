//! Tile integration constants

use std::time::Duration;

pub const DOMAIN: &str = "tile";

/// Entity platform the integration provides
pub const PLATFORM_DEVICE_TRACKER: &str = "device_tracker";

/// How often each Tile is refreshed
pub const DEFAULT_UPDATE_INTERVAL: Duration = Duration::from_secs(2 * 60);

pub const ATTR_ALTITUDE: &str = "altitude";
pub const ATTR_GPS_ACCURACY: &str = "gps_accuracy";
pub const ATTR_IS_LOST: &str = "is_lost";
pub const ATTR_LAST_LOST_TIMESTAMP: &str = "last_lost_timestamp";
pub const ATTR_LAST_TIMESTAMP: &str = "last_timestamp";
pub const ATTR_LATITUDE: &str = "latitude";
pub const ATTR_LONGITUDE: &str = "longitude";
pub const ATTR_RING_STATE: &str = "ring_state";
pub const ATTR_SOURCE_TYPE: &str = "source_type";
pub const ATTR_VOIP_STATE: &str = "voip_state";

pub const SOURCE_TYPE_GPS: &str = "gps";

/// Device tracker state for a located device outside any zone
pub const STATE_NOT_HOME: &str = "not_home";

// Config flow step ids, errors and abort reasons
pub const STEP_USER: &str = "user";
pub const STEP_REAUTH_CONFIRM: &str = "reauth_confirm";
pub const ERROR_INVALID_AUTH: &str = "invalid_auth";
pub const ERROR_UNKNOWN: &str = "unknown";
pub const ABORT_ALREADY_CONFIGURED: &str = "already_configured";
pub const ABORT_REAUTH_SUCCESSFUL: &str = "reauth_successful";
