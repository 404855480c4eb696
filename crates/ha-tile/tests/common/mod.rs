//! Common test utilities for the Tile integration
//!
//! Dependency order of the fixtures: `config` -> `config_entry`;
//! `data_tile_details` -> `api` -> `mock_tile_login` -> `setup_config_entry`.

#![allow(dead_code)]

mod fixtures;
mod hass;
mod mocks;

pub use fixtures::*;
pub use hass::*;
pub use mocks::*;
