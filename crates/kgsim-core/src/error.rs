//! Error types for kgsim-core.
//!
//! This module defines the central error type [`SimError`] used throughout
//! the workspace, along with the [`SimResult<T>`] type alias.

use thiserror::Error;

/// Top-level error type for similarity-explorer operations.
#[derive(Debug, Error)]
pub enum SimError {
    /// Configuration is invalid or missing.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A field value failed validation constraints.
    #[error("Validation error: {field} - {message}")]
    Validation {
        /// Name of the field that failed validation
        field: String,
        /// Description of the validation failure
        message: String,
    },

    /// The entity search endpoint could not be reached or returned a
    /// malformed response. Recoverable: the previous result list is kept.
    #[error("Search request failed: {0}")]
    Search(String),

    /// A pairwise similarity request failed. Recoverable: the affected
    /// cell is marked unavailable, sibling fetches are unaffected.
    #[error("Similarity request failed: {0}")]
    Similarity(String),

    /// A requested qnode was not present in the expected collection.
    #[error("Entity not found: {qnode}")]
    EntityNotFound {
        /// The qnode that was not found
        qnode: String,
    },

    /// CSV export was requested in a state that cannot produce one.
    #[error("Export error: {0}")]
    Export(String),

    /// A controller worker is no longer running.
    ///
    /// Surfaces when a command is sent after shutdown; indicates a
    /// lifecycle bug in the caller rather than a remote failure.
    #[error("Controller unavailable: {0}")]
    ChannelClosed(String),

    /// Error during serialization or deserialization.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for SimError {
    fn from(err: serde_json::Error) -> Self {
        SimError::Serialization(err.to_string())
    }
}

impl From<config::ConfigError> for SimError {
    fn from(err: config::ConfigError) -> Self {
        SimError::Config(err.to_string())
    }
}

/// Result type alias for similarity-explorer operations.
pub type SimResult<T> = Result<T, SimError>;
