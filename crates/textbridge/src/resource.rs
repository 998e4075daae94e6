use alloc::{boxed::Box, string::String, vec::Vec};
use core::ops::Range;

use crate::error::{ProviderError, Result, check_range};

/// A string resource addressed in UTF-16 code units.
///
/// The concrete storage is up to the implementor; providers only need the
/// length and the ability to copy a run of code units out. Resources that
/// keep their units in one contiguous slice can also expose it through
/// [`as_contiguous`](Self::as_contiguous), which lets read-only providers
/// hand out chunks without copying.
pub trait TextResource {
    /// Length of the text in UTF-16 code units.
    fn len_utf16(&self) -> usize;

    /// Copies `dest.len()` code units starting at `start` into `dest`.
    ///
    /// # Errors
    ///
    /// [`ProviderError::OutOfRange`] when `start + dest.len()` exceeds the
    /// text length. Implementations backed by another provider may report
    /// that provider's errors.
    fn read_units(&self, start: usize, dest: &mut [u16]) -> Result<()>;

    /// Returns the code unit at `index`.
    ///
    /// # Errors
    ///
    /// [`ProviderError::OutOfRange`] when `index >= len_utf16()`.
    fn unit_at(&self, index: usize) -> Result<u16> {
        let mut unit = [0u16; 1];
        self.read_units(index, &mut unit)?;
        Ok(unit[0])
    }

    /// Returns the whole text as one slice when the storage allows it.
    fn as_contiguous(&self) -> Option<&[u16]> {
        None
    }

    /// Returns `true` when the text has no code units.
    fn is_empty(&self) -> bool {
        self.len_utf16() == 0
    }

    /// Decodes the text, replacing unpaired surrogates with U+FFFD.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`read_units`](Self::read_units) and reports
    /// [`ProviderError::ResourceExhausted`] when the staging copy cannot be
    /// allocated.
    fn to_string_lossy(&self) -> Result<String> {
        let units = copy_units(self, 0..self.len_utf16())?;
        Ok(char::decode_utf16(units.iter().copied())
            .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
            .collect())
    }
}

/// A [`TextResource`] that can be edited in place.
pub trait MutableTextResource: TextResource {
    /// Replaces the code units in `range` with `units`.
    ///
    /// # Errors
    ///
    /// [`ProviderError::OutOfRange`] when `range` is not within
    /// `[0, len_utf16()]` or is reversed.
    fn replace_units(&mut self, range: Range<usize>, units: &[u16]) -> Result<()>;
}

/// Copies `range` out of `text` into a fresh vector.
pub(crate) fn copy_units<R: TextResource + ?Sized>(
    text: &R,
    range: Range<usize>,
) -> Result<Vec<u16>> {
    check_range(&range, text.len_utf16())?;
    let len = range.len();
    let mut units = Vec::new();
    units
        .try_reserve_exact(len)
        .map_err(|_| ProviderError::ResourceExhausted { units: len })?;
    units.resize(len, 0);
    text.read_units(range.start, &mut units)?;
    Ok(units)
}

impl TextResource for [u16] {
    fn len_utf16(&self) -> usize {
        self.len()
    }

    fn read_units(&self, start: usize, dest: &mut [u16]) -> Result<()> {
        let range = start..start.saturating_add(dest.len());
        let src = self
            .get(range.clone())
            .ok_or_else(|| ProviderError::range(&range, self.len()))?;
        dest.copy_from_slice(src);
        Ok(())
    }

    fn unit_at(&self, index: usize) -> Result<u16> {
        self.get(index)
            .copied()
            .ok_or_else(|| ProviderError::index(index, self.len()))
    }

    fn as_contiguous(&self) -> Option<&[u16]> {
        Some(self)
    }
}

impl TextResource for Vec<u16> {
    fn len_utf16(&self) -> usize {
        self.len()
    }

    fn read_units(&self, start: usize, dest: &mut [u16]) -> Result<()> {
        self.as_slice().read_units(start, dest)
    }

    fn unit_at(&self, index: usize) -> Result<u16> {
        self.as_slice().unit_at(index)
    }

    fn as_contiguous(&self) -> Option<&[u16]> {
        Some(self)
    }
}

impl TextResource for Box<[u16]> {
    fn len_utf16(&self) -> usize {
        self.len()
    }

    fn read_units(&self, start: usize, dest: &mut [u16]) -> Result<()> {
        (**self).read_units(start, dest)
    }

    fn unit_at(&self, index: usize) -> Result<u16> {
        (**self).unit_at(index)
    }

    fn as_contiguous(&self) -> Option<&[u16]> {
        Some(self)
    }
}

impl<T: TextResource + ?Sized> TextResource for &T {
    fn len_utf16(&self) -> usize {
        (**self).len_utf16()
    }

    fn read_units(&self, start: usize, dest: &mut [u16]) -> Result<()> {
        (**self).read_units(start, dest)
    }

    fn unit_at(&self, index: usize) -> Result<u16> {
        (**self).unit_at(index)
    }

    fn as_contiguous(&self) -> Option<&[u16]> {
        (**self).as_contiguous()
    }
}

impl MutableTextResource for Vec<u16> {
    fn replace_units(&mut self, range: Range<usize>, units: &[u16]) -> Result<()> {
        check_range(&range, self.len())?;
        self.splice(range, units.iter().copied());
        Ok(())
    }
}
