//! Error types for cloudtree index operations.

use thiserror::Error;

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, CloudtreeError>;

/// Errors raised by the index structures.
///
/// Argument validation errors are raised synchronously at the call boundary;
/// no operation mutates the index before validation passes. Invariant
/// violations indicate a corrupted node graph and are not recoverable:
/// continuing to use an index after one risks silent data loss.
#[derive(Debug, Error)]
pub enum CloudtreeError {
    /// An invalid argument (non-finite coordinate, inverted or non-finite
    /// envelope, non-positive tuning parameter) was passed to an operation.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A structural invariant of the index was broken, e.g. a coordinate
    /// accepted by a node's envelope but rejected by every child envelope
    /// during subdivision.
    #[error("index invariant violated: {0}")]
    InvariantViolation(String),
}
