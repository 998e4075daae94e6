//! Boundaries of composed character sequences.
//!
//! A composed sequence is a base code point followed by any number of
//! combining marks. A code point may itself take two code units (a surrogate
//! pair). An unpaired surrogate counts as a one-unit code point that never
//! extends its neighbour.

use core::ops::Range;

use unicode_normalization::char::{canonical_combining_class, is_combining_mark};

use crate::{
    error::{ProviderError, Result},
    resource::TextResource,
};

/// `true` for a UTF-16 leading surrogate (`0xD800..=0xDBFF`).
#[must_use]
pub const fn is_high_surrogate(unit: u16) -> bool {
    unit & 0xFC00 == 0xD800
}

/// `true` for a UTF-16 trailing surrogate (`0xDC00..=0xDFFF`).
#[must_use]
pub const fn is_low_surrogate(unit: u16) -> bool {
    unit & 0xFC00 == 0xDC00
}

/// Whether `c` attaches to the preceding character.
fn extends(c: char) -> bool {
    canonical_combining_class(c) != 0 || is_combining_mark(c)
}

/// Decodes the code point starting at `index`. Returns `None` for an unpaired
/// surrogate, together with the number of code units consumed.
fn code_point_at<R: TextResource + ?Sized>(
    text: &R,
    index: usize,
    len: usize,
) -> Result<(Option<char>, usize)> {
    let unit = text.unit_at(index)?;
    if is_high_surrogate(unit) && index + 1 < len {
        let next = text.unit_at(index + 1)?;
        if is_low_surrogate(next) {
            let scalar =
                0x1_0000 + ((u32::from(unit) - 0xD800) << 10) + (u32::from(next) - 0xDC00);
            return Ok((char::from_u32(scalar), 2));
        }
    }
    Ok((char::from_u32(u32::from(unit)), 1))
}

/// Index of the first code unit of the code point containing `index`.
pub(crate) fn code_point_start<R: TextResource + ?Sized>(text: &R, index: usize) -> Result<usize> {
    if index > 0
        && is_low_surrogate(text.unit_at(index)?)
        && is_high_surrogate(text.unit_at(index - 1)?)
    {
        return Ok(index - 1);
    }
    Ok(index)
}

/// `true` when `index` falls between the two halves of a surrogate pair.
pub(crate) fn splits_pair<R: TextResource + ?Sized>(
    text: &R,
    index: usize,
    len: usize,
) -> Result<bool> {
    if index == 0 || index >= len {
        return Ok(false);
    }
    Ok(is_high_surrogate(text.unit_at(index - 1)?) && is_low_surrogate(text.unit_at(index)?))
}

/// Returns the `[start, end)` range of the composed sequence containing the
/// code unit at `index`.
///
/// The result always satisfies `start <= index < end <= len`, and querying
/// any index inside the returned range yields the same range.
///
/// ```rust
/// use textbridge::composed_sequence_range;
///
/// // U+1F600 (a surrogate pair) followed by "a".
/// let text: Vec<u16> = "\u{1F600}a".encode_utf16().collect();
/// assert_eq!(composed_sequence_range(&text, 0).unwrap(), 0..2);
/// assert_eq!(composed_sequence_range(&text, 1).unwrap(), 0..2);
/// assert_eq!(composed_sequence_range(&text, 2).unwrap(), 2..3);
/// ```
///
/// # Errors
///
/// [`ProviderError::OutOfRange`] when `index >= text.len_utf16()`; errors
/// from reading the resource are propagated.
pub fn composed_sequence_range<R: TextResource + ?Sized>(
    text: &R,
    index: usize,
) -> Result<Range<usize>> {
    let len = text.len_utf16();
    if index >= len {
        return Err(ProviderError::index(index, len));
    }

    let mut start = code_point_start(text, index)?;
    while start > 0 {
        match code_point_at(text, start, len)? {
            (Some(c), _) if extends(c) => start = code_point_start(text, start - 1)?,
            _ => break,
        }
    }

    let (_, width) = code_point_at(text, start, len)?;
    let mut end = start + width;
    while end < len {
        match code_point_at(text, end, len)? {
            (Some(c), width) if extends(c) => end += width,
            _ => break,
        }
    }

    debug_assert!(start <= index && index < end && end <= len);
    Ok(start..end)
}
