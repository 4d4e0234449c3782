//! Error types for meta-tree loading and change construction.
//!
//! Provides a unified error type covering snapshot I/O, JSON parsing,
//! snapshot shape problems, and change-record invariant violations.

use thiserror::Error;

/// Errors that can occur while loading snapshots or building changes.
#[derive(Debug, Error)]
pub enum MetaError {
    /// Snapshot file missing, unreadable, not JSON, or not a meta tree.
    #[error("invalid snapshot '{path}': {reason}")]
    InvalidSnapshot { path: String, reason: String },

    /// Two snapshots describe different modules.
    #[error("snapshot module mismatch: base is '{base}', diff is '{diff}'")]
    SnapshotMismatch { base: String, diff: String },

    /// A change record was constructed with an empty locator.
    ///
    /// This indicates a bug in the differ, not bad user input.
    #[error("invalid change record: {0}")]
    InvalidChangeRecord(String),

    /// File I/O failure outside snapshot loading (e.g. writing results).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias for results with [`MetaError`].
pub type Result<T> = std::result::Result<T, MetaError>;
