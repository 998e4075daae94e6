//! Scoped scratch storage for UTF-16 code units.
//!
//! A [`TempBuffer`] lives exactly as long as the binding that holds it. Small
//! requests (at most [`INLINE_BYTES`] bytes) are served from inline storage
//! inside the value itself, so a buffer declared as a local never touches
//! the heap; larger requests are backed by one heap allocation that is
//! released when the value is dropped, whichever way the enclosing scope is
//! left (`return`, `?`, or unwinding).
//!
//! Heap allocation is fallible: a failed reservation surfaces as
//! [`ProviderError::ResourceExhausted`] instead of aborting. There is no
//! smaller fallback because callers need one contiguous run of units.

use core::{
    mem::size_of,
    ops::{Deref, DerefMut},
};

use smallvec::SmallVec;

use crate::error::{ProviderError, Result};

/// Largest request, in bytes, served without a heap allocation.
pub const INLINE_BYTES: usize = 64;

/// [`INLINE_BYTES`] expressed in UTF-16 code units.
pub const INLINE_UNITS: usize = INLINE_BYTES / size_of::<u16>();

pub(crate) type UnitVec = SmallVec<[u16; INLINE_UNITS]>;

/// Zero-initialised scratch buffer of UTF-16 code units.
///
/// ```rust
/// use textbridge::{INLINE_UNITS, TempBuffer};
///
/// let small = TempBuffer::zeroed(INLINE_UNITS).unwrap();
/// assert!(small.is_inline());
///
/// let large = TempBuffer::zeroed(INLINE_UNITS + 1).unwrap();
/// assert!(!large.is_inline());
/// ```
#[derive(Debug)]
pub struct TempBuffer {
    units: UnitVec,
}

impl TempBuffer {
    /// Acquires a buffer of `len` zeroed code units.
    ///
    /// # Errors
    ///
    /// [`ProviderError::ResourceExhausted`] when `len` does not fit inline
    /// and the heap allocation fails.
    pub fn zeroed(len: usize) -> Result<Self> {
        let mut units = UnitVec::new();
        reserve_exact(&mut units, len)?;
        units.resize(len, 0);
        Ok(Self { units })
    }

    /// Acquires a buffer holding a copy of `src`.
    ///
    /// # Errors
    ///
    /// [`ProviderError::ResourceExhausted`] as for [`zeroed`](Self::zeroed).
    pub fn copy_of(src: &[u16]) -> Result<Self> {
        let mut units = UnitVec::new();
        reserve_exact(&mut units, src.len())?;
        units.extend_from_slice(src);
        Ok(Self { units })
    }

    /// `true` while the contents live in the inline storage.
    #[must_use]
    pub fn is_inline(&self) -> bool {
        !self.units.spilled()
    }
}

impl Deref for TempBuffer {
    type Target = [u16];

    fn deref(&self) -> &[u16] {
        &self.units
    }
}

impl DerefMut for TempBuffer {
    fn deref_mut(&mut self) -> &mut [u16] {
        &mut self.units
    }
}

/// Grows `units` so that it can hold `len` code units in total.
pub(crate) fn reserve_exact(units: &mut UnitVec, len: usize) -> Result<()> {
    let additional = len.saturating_sub(units.len());
    units.try_reserve_exact(additional).map_err(|_| {
        tracing::warn!(units = len, "code unit buffer allocation failed");
        ProviderError::ResourceExhausted { units: len }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_is_sixty_four_bytes() {
        assert_eq!(INLINE_UNITS, 32);
        assert!(TempBuffer::zeroed(0).unwrap().is_inline());
        assert!(TempBuffer::zeroed(32).unwrap().is_inline());
        assert!(!TempBuffer::zeroed(33).unwrap().is_inline());
    }

    #[test]
    fn copy_of_preserves_contents() {
        let src: alloc::vec::Vec<u16> = (0..100).collect();
        let copy = TempBuffer::copy_of(&src).unwrap();
        assert!(!copy.is_inline());
        assert_eq!(&copy[..], &src[..]);
    }

    #[test]
    fn buffer_is_writable_in_place() {
        let mut buf = TempBuffer::zeroed(4).unwrap();
        buf.copy_from_slice(&[1, 2, 3, 4]);
        buf[0] = 9;
        assert_eq!(&buf[..], &[9, 2, 3, 4]);
    }

    #[test]
    fn oversized_request_is_resource_exhausted() {
        let err = TempBuffer::zeroed(usize::MAX / 2).unwrap_err();
        assert_eq!(
            err,
            ProviderError::ResourceExhausted {
                units: usize::MAX / 2
            }
        );
    }

    #[test]
    fn early_return_releases_buffer() {
        fn stage(len: usize, fail: bool) -> Result<usize> {
            let buf = TempBuffer::zeroed(len)?;
            if fail {
                return Err(ProviderError::NotWritable);
            }
            Ok(buf.len())
        }

        assert_eq!(stage(1000, false), Ok(1000));
        assert_eq!(stage(1000, true), Err(ProviderError::NotWritable));
    }
}
