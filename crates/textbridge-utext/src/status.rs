use core::ops::Range;

use textbridge::ProviderError;

use crate::sys::{
    U_ILLEGAL_ARGUMENT_ERROR, U_INDEX_OUTOFBOUNDS_ERROR, U_INVALID_STATE_ERROR,
    U_MEMORY_ALLOCATION_ERROR, U_NO_WRITE_PERMISSION, U_UNSUPPORTED_ERROR, UErrorCode, failure,
};

/// The ICU status reported for `err`.
#[must_use]
pub const fn error_code(err: &ProviderError) -> UErrorCode {
    match err {
        ProviderError::OutOfRange { .. } => U_INDEX_OUTOFBOUNDS_ERROR,
        ProviderError::NotWritable => U_NO_WRITE_PERMISSION,
        ProviderError::ResourceExhausted { .. } => U_MEMORY_ALLOCATION_ERROR,
        ProviderError::InvalidBinding(_) => U_ILLEGAL_ARGUMENT_ERROR,
        ProviderError::ResourceBusy => U_INVALID_STATE_ERROR,
    }
}

/// Interprets a status returned by a foreign callback for an operation on
/// `range` of a text of length `len`. Warnings are successes.
pub(crate) fn check_status(code: UErrorCode, range: &Range<usize>, len: usize) -> Result<(), ProviderError> {
    if !failure(code) {
        return Ok(());
    }
    Err(match code {
        U_INDEX_OUTOFBOUNDS_ERROR => ProviderError::OutOfRange {
            start: range.start,
            end: range.end,
            len,
        },
        U_NO_WRITE_PERMISSION | U_UNSUPPORTED_ERROR => ProviderError::NotWritable,
        U_MEMORY_ALLOCATION_ERROR => ProviderError::ResourceExhausted { units: range.len() },
        U_INVALID_STATE_ERROR => ProviderError::ResourceBusy,
        _ => ProviderError::InvalidBinding("foreign text reported a failure"),
    })
}
