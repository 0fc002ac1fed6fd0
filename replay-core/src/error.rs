//! Errors in the library.
use thiserror::Error;

/// Errors in the library.
///
/// Every variant is a contract violation of a single call. The call that
/// returns it leaves the buffer (or tree) unchanged.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReplayError {
    /// Capacity is zero, or not a power of two where one is required.
    #[error("Invalid capacity: {0}")]
    InvalidCapacity(usize),

    /// Slot or leaf index outside of the valid range.
    #[error("Index {index} out of range (len = {len})")]
    IndexOutOfRange {
        /// Requested index.
        index: usize,
        /// Number of valid indices.
        len: usize,
    },

    /// Target of the prefix-sum descent is not in `[0, total)`.
    #[error("Prefix sum target {target} out of range (total = {total})")]
    PrefixOutOfRange {
        /// Requested cumulative mass.
        target: f64,
        /// Total mass in the tree.
        total: f64,
    },

    /// Priority is not a finite positive value.
    #[error("Invalid priority: {0}")]
    InvalidPriority(f32),

    /// Sampling was requested from a buffer without transitions.
    #[error("Replay buffer is empty")]
    EmptyBuffer,

    /// Indices and priorities given to an update have different lengths.
    #[error("Length mismatch: {0} indices, {1} priorities")]
    LengthMismatch(usize, usize),

    /// A transition field does not have the length the buffer was built for.
    #[error("Shape mismatch in {field}: expected {expected}, got {actual}")]
    ShapeMismatch {
        /// Name of the field.
        field: &'static str,
        /// Configured length.
        expected: usize,
        /// Length of the rejected transition.
        actual: usize,
    },

    /// A thread panicked while holding the lock of a shared buffer.
    #[error("Replay buffer lock poisoned")]
    Poisoned,
}

/// Result type of operations in the library.
pub type Result<T> = std::result::Result<T, ReplayError>;
