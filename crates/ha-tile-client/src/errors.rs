//! Tile client errors

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TileError {
    /// The cloud rejected the credentials
    #[error("Invalid credentials: {0}")]
    InvalidAuth(String),

    /// The session must be re-established before further requests
    #[error("Session expired: {0}")]
    SessionExpired(String),

    /// Transport failure or unexpected HTTP status
    #[error("Request failed: {0}")]
    Request(String),

    /// A payload did not match the expected shape
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),
}

impl TileError {
    /// Whether the caller should re-authenticate rather than retry
    pub fn is_auth_error(&self) -> bool {
        matches!(self, TileError::InvalidAuth(_) | TileError::SessionExpired(_))
    }
}

impl From<reqwest::Error> for TileError {
    fn from(err: reqwest::Error) -> Self {
        TileError::Request(err.to_string())
    }
}

impl From<serde_json::Error> for TileError {
    fn from(err: serde_json::Error) -> Self {
        TileError::InvalidPayload(err.to_string())
    }
}

pub type TileResult<T> = Result<T, TileError>;
