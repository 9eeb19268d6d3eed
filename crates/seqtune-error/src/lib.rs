//! Workspace-wide error type.
//!
//! Every fallible public API in the workspace returns [`Result`]. Variants
//! distinguish what the caller can do about a failure: per-sequence problems
//! are handled locally by the cores and never reach here; anything touching
//! global state (stores, checkpoints, configuration) surfaces as a
//! `TuneError`.

use std::path::PathBuf;

use thiserror::Error;

/// Convenience alias used across the workspace.
pub type Result<T> = std::result::Result<T, TuneError>;

#[derive(Debug, Error)]
pub enum TuneError {
    /// Malformed command-line argument or sequence string.
    #[error("parse error: {0}")]
    Parse(String),

    /// A right-side attribute key the codec does not recognize.
    #[error("unknown attribute: {0}")]
    UnknownAttribute(String),

    /// A transform name that matches more than one registry entry.
    #[error("ambiguous transform name: {0}")]
    AmbiguousTransformName(String),

    /// A transform id or name absent from the registry.
    #[error("unknown transform: {0}")]
    UnknownTransform(String),

    /// Pool filters that cannot be satisfied, e.g. a required set larger
    /// than the sequence length.
    #[error("filter conflict: {0}")]
    FilterConflict(String),

    /// Failure-database backing could not be opened, read, or written.
    #[error("failure store: {0}")]
    Store(String),

    /// Store operation attempted before `open` or after `close`.
    #[error("failure store is not open")]
    StoreClosed,

    /// A checkpoint file exists but cannot be parsed. Callers log a warning
    /// and start fresh.
    #[error("checkpoint corrupt at {path}: {detail}")]
    CheckpointCorrupt { path: PathBuf, detail: String },

    /// The analyzer failed on a buffer.
    #[error("metric analysis: {0}")]
    MetricAnalysis(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Invariant violation that indicates a bug rather than bad input.
    #[error("internal error: {0}")]
    Internal(String),
}

impl TuneError {
    /// Construct an [`TuneError::Internal`] from any displayable value.
    pub fn internal(msg: impl std::fmt::Display) -> Self {
        Self::Internal(msg.to_string())
    }

    /// Construct a [`TuneError::Store`] from any displayable value.
    pub fn store(msg: impl std::fmt::Display) -> Self {
        Self::Store(msg.to_string())
    }

    /// Construct a [`TuneError::Parse`] from any displayable value.
    pub fn parse(msg: impl std::fmt::Display) -> Self {
        Self::Parse(msg.to_string())
    }
}
