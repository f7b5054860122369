//! Error types for the asynchronous spatial index.

use thiserror::Error;

/// Errors surfaced to callers of [`crate::SpatialIndex`].
///
/// Precondition failures (`NotOpen`, `InvalidInput`) are reported
/// synchronously from the submitting call and the operation is never
/// enqueued. `Engine` failures are detected on a worker thread and delivered
/// through the completion callback's error slot.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SidxError {
    /// An operation was attempted before the index was opened.
    #[error("Index must be open")]
    NotOpen,

    /// The caller supplied arguments the binding layer rejects, such as
    /// min/max coordinate arrays of different lengths.
    #[error("{0}")]
    InvalidInput(String),

    /// An underlying engine call failed. The message carries a fixed
    /// operation prefix followed by the engine's diagnostic text.
    #[error("{0}")]
    Engine(String),
}

impl SidxError {
    /// Wraps an engine diagnostic with the fixed prefix of the failing
    /// operation, e.g. `"Error inserting data: "`.
    pub(crate) fn engine(prefix: &str, diagnostic: impl std::fmt::Display) -> Self {
        SidxError::Engine(format!("{}{}", prefix, diagnostic))
    }
}

/// A result type alias for spatial index operations.
pub type SidxResult<T> = Result<T, SidxError>;
