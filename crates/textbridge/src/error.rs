use core::ops::Range;

use thiserror::Error;

/// Errors reported by providers, resources and the temporary-buffer
/// allocator.
///
/// Every error is reported by the call that detects it. Nothing is retried
/// and no partial effect is left behind.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderError {
    /// An index or range lies outside `[0, len)` (indices) or `[0, len]`
    /// (range limits).
    #[error("range {start}..{end} is out of bounds for text of length {len}")]
    OutOfRange {
        /// First index of the rejected range.
        start: usize,
        /// End of the rejected range; equal to `start + 1` for single indices.
        end: usize,
        /// Length of the text at the time of the call.
        len: usize,
    },
    /// A mutation was requested from a provider that was not bound writable.
    #[error("provider is not writable")]
    NotWritable,
    /// A heap buffer of `units` code units could not be allocated.
    #[error("failed to allocate a buffer of {units} code units")]
    ResourceExhausted {
        /// Number of code units requested.
        units: usize,
    },
    /// The binding is unusable: closed provider, undersized caller buffer or
    /// uninitialised protocol structure.
    #[error("invalid binding: {0}")]
    InvalidBinding(&'static str),
    /// A shared mutable resource is already borrowed by another holder.
    #[error("resource is borrowed elsewhere")]
    ResourceBusy,
}

impl ProviderError {
    pub(crate) fn range(range: &Range<usize>, len: usize) -> Self {
        Self::OutOfRange {
            start: range.start,
            end: range.end,
            len,
        }
    }

    pub(crate) fn index(index: usize, len: usize) -> Self {
        Self::OutOfRange {
            start: index,
            end: index.saturating_add(1),
            len,
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T, E = ProviderError> = core::result::Result<T, E>;

/// Checks `start <= end <= len`.
pub(crate) fn check_range(range: &Range<usize>, len: usize) -> Result<()> {
    if range.start > range.end || range.end > len {
        return Err(ProviderError::range(range, len));
    }
    Ok(())
}
