//! Tile cloud client
//!
//! Logs in to the Tile cloud, lists the Tiles on an account and refreshes
//! their last-known location.
//!
//! # Key Types
//!
//! - [`Api`] - Authenticated client, created by [`async_login`]
//! - [`TileApi`] - Account-level operations (fetch all Tiles)
//! - [`Tile`] - One tracker and its data
//! - [`TileConnection`] - What a [`Tile`] refreshes itself through
//!
//! Enable the `mock` feature to get `MockTileApi` and `MockTileConnection`
//! for tests of code built on this crate.

pub mod api;
pub mod errors;
pub mod models;
pub mod tile;

pub use api::{async_login, Api, ClientOptions, TileApi, TileMap};
pub use errors::{TileError, TileResult};
pub use models::{TileDetails, TileDetailsResponse, TileState};
pub use tile::{Tile, TileConnection};

#[cfg(any(test, feature = "mock"))]
pub use api::MockTileApi;
#[cfg(any(test, feature = "mock"))]
pub use tile::MockTileConnection;
