//! Error types for Neuromode
//!
//! Scoring and rule evaluation are total; these errors only surface at the
//! JSON, FFI and session-history boundaries.

use thiserror::Error;

/// Errors that can occur around the engine
#[derive(Debug, Error)]
pub enum ComputeError {
    #[error("Failed to parse input: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Encoding error: {0}")]
    EncodingError(String),

    #[error("Unknown history entry: {0}")]
    UnknownHistoryEntry(String),
}
