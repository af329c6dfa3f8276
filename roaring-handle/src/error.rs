//! Error types for bitmap, buffer and view operations

use crate::serialize::Format;
use thiserror::Error;

/// Errors that can occur when working with engine-backed bitmaps
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed range, offset/count window, buffer size or format tag.
    ///
    /// Always raised before the engine is asked to mutate anything.
    #[error("Invalid range: {0}")]
    Range(String),

    /// Serialized bytes could not be interpreted in the requested layout
    #[error("Failed to decode {format} bitmap: {reason}")]
    Decode { format: Format, reason: String },

    /// Operation against a resource whose native state was already released
    #[error("{resource} has already been released")]
    Disposed { resource: &'static str },

    #[error("Unsupported operation: {0}")]
    Unsupported(&'static str),

    /// Cooperative cancellation observed before a buffer write
    #[error("Operation cancelled")]
    Cancelled,

    /// The engine returned a null handle
    #[error("Engine failed to allocate {0}")]
    Allocation(&'static str),

    /// Writes are refused while frozen views read the buffer's bytes
    #[error("Memory buffer is pinned by {views} frozen view(s)")]
    BufferInUse { views: usize },
}

impl Error {
    pub(crate) fn range(msg: impl Into<String>) -> Self {
        Error::Range(msg.into())
    }

    pub(crate) fn decode(format: Format, reason: impl Into<String>) -> Self {
        Error::Decode {
            format,
            reason: reason.into(),
        }
    }
}

/// A specialized Result type for bitmap operations
pub type Result<T> = std::result::Result<T, Error>;

/// Validate a closed interval `[min, max]`.
pub(crate) fn check_interval<V: PartialOrd + std::fmt::Display>(min: V, max: V) -> Result<()> {
    if min > max {
        return Err(Error::range(format!("min {min} is greater than max {max}")));
    }
    Ok(())
}

/// Resolve an `offset`/`count` window over `values`.
pub(crate) fn window<T>(values: &[T], offset: usize, count: usize) -> Result<&[T]> {
    match offset.checked_add(count) {
        Some(end) if end <= values.len() => Ok(&values[offset..end]),
        _ => Err(Error::range(format!(
            "offset {offset} + count {count} exceeds length {}",
            values.len()
        ))),
    }
}
