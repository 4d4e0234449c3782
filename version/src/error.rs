//! Error types for version parsing and next-version computation.

use thiserror::Error;

/// Errors that can occur while computing a module's next version.
#[derive(Debug, Error)]
pub enum VersionError {
    /// Current version string does not parse.
    #[error("invalid version '{0}'")]
    InvalidVersion(String),

    /// Caller-supplied pre tag is not `stable` or `preview`.
    #[error("unsupported pre tag '{0}', expected stable or preview")]
    UnknownPreTag(String),

    /// Caller-supplied segment tag is not `major`, `minor`, `patch`, or
    /// `pre`.
    #[error("unsupported segment tag '{0}', expected major, minor, patch, or pre")]
    UnknownSegmentTag(String),

    /// Package index could not be fetched or had an unexpected shape.
    ///
    /// Recoverable: the engine treats the module as unknown to the
    /// index.
    #[error("package index unavailable: {0}")]
    IndexUnavailable(String),

    /// Failure while diffing the two snapshots.
    #[error(transparent)]
    Meta(#[from] cli_meta_core::MetaError),
}

/// Convenience alias for results with [`VersionError`].
pub type Result<T> = std::result::Result<T, VersionError>;
