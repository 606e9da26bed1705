// src/error.rs
//! Typed error taxonomy for the ingestion core.
//!
//! Cycle-level failures (`ConfigError`, `FetchError`, `StoreError::Unavailable`)
//! are captured by the runner into the cycle summary; per-item failures
//! (`ValidationError`, `StoreError::DuplicateKey`) only affect a single item.

use std::time::Duration;

use thiserror::Error;

/// Missing or invalid setting. Aborts a cycle as a clean skip.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("provider API key is not configured")]
    MissingApiKey,

    #[error("fetch query is empty")]
    EmptyQuery,

    #[error("invalid setting {name}: {message}")]
    Invalid { name: &'static str, message: String },
}

/// Failure of the outbound provider call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("provider request timed out after {0:?}")]
    Timeout(Duration),

    #[error("provider transport error: {0}")]
    Transport(String),

    #[error("provider response could not be decoded: {0}")]
    Decode(String),
}

impl FetchError {
    /// Short status label: the HTTP code, or one of
    /// `timeout` / `transport` / `decode` / `config`.
    pub fn status(&self) -> String {
        match self {
            FetchError::Config(_) => "config".to_string(),
            FetchError::Status { status, .. } => status.to_string(),
            FetchError::Timeout(_) => "timeout".to_string(),
            FetchError::Transport(_) => "transport".to_string(),
            FetchError::Decode(_) => "decode".to_string(),
        }
    }

    /// Response body (or error detail) attached to the failure.
    pub fn body(&self) -> String {
        match self {
            FetchError::Status { body, .. } => body.clone(),
            other => other.to_string(),
        }
    }
}

/// A single raw record could not be turned into an item.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("item has no url")]
    MissingUrl,

    #[error("item has no title")]
    MissingTitle,

    #[error("item url {url:?} is not an absolute http(s) url: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The provider entry was not a record at all.
    #[error("malformed provider entry: {0}")]
    Malformed(String),
}

/// Persistence failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The `url` uniqueness constraint rejected the write.
    #[error("an item with url {0:?} already exists")]
    DuplicateKey(String),

    /// Connection/transport failure of the persistence layer.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn unavailable(message: impl std::fmt::Display) -> Self {
        Self::Unavailable(message.to_string())
    }
}
