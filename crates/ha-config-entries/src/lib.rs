//! Config Entries
//!
//! This crate provides the configuration entry system for Home Assistant.
//! Config entries represent individual integration instances and manage
//! their lifecycle (setup, unload, reload).
//!
//! # Key Types
//!
//! - [`ConfigEntry`] - A single integration configuration
//! - [`ConfigEntryState`] - Lifecycle state of an entry
//! - [`ConfigEntries`] - Registry and lifecycle driver for all entries
//! - [`IntegrationSetup`] - Hooks an integration implements per domain
//! - [`FlowResult`] - Outcome of a config flow step

pub mod entry;
pub mod flow;
pub mod manager;
pub mod state_machine;

pub use entry::{ConfigEntry, ConfigEntrySource, ConfigEntryState, ConfigEntryUpdate};

pub use flow::{FlowResult, ERROR_BASE};

pub use manager::{
    ConfigEntries, ConfigEntriesError, ConfigEntriesResult, ConfigEntryError, IntegrationSetup,
};

pub use state_machine::{calculate_retry_delay, InvalidTransition};
