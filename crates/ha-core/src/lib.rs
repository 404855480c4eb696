//! Core runtime types for Home Assistant integrations
//!
//! This crate provides the pieces an integration touches while it runs:
//! the [`HomeAssistant`] context (state store, tracked tasks, runtime data),
//! [`EntityId`], [`State`], and the configuration keys shared across
//! integrations.

mod entity_id;
mod hass;
mod state;

pub use entity_id::{slugify, EntityId, EntityIdError};
pub use hass::HomeAssistant;
pub use state::{Context, State, StateStore, STATE_UNAVAILABLE, STATE_UNKNOWN};

/// Configuration keys shared by integrations
pub mod constants {
    pub const CONF_USERNAME: &str = "username";
    pub const CONF_PASSWORD: &str = "password";
}

pub use constants::{CONF_PASSWORD, CONF_USERNAME};
