use core::{fmt, mem::ManuallyDrop, ops::Range, ptr::NonNull};

use textbridge::{MutableTextResource, ProviderError, Result, TextResource};

use crate::{
    callbacks::to_i64,
    open::utext_close,
    status::check_status,
    sys::{U_ZERO_ERROR, UTEXT_PROVIDER_WRITABLE, UText, UTextFuncs},
};

/// Closes a `UText`; ICU's own `utext_close` has this signature.
pub type CloseFn = unsafe extern "C" fn(*mut UText) -> *mut UText;

/// Largest run passed to a single `extract` call.
const MAX_EXTRACT: usize = 1 << 30;

/// A `UText` created elsewhere, read and edited through its callback table.
///
/// Native indices are taken to be UTF-16 offsets, which holds for every
/// UTF-16 backed text. The wrapped text is closed when this value drops.
pub struct ForeignText {
    ut: NonNull<UText>,
    funcs: UTextFuncs,
    close: Option<CloseFn>,
}

impl ForeignText {
    /// Takes ownership of an open text opened by this crate.
    ///
    /// # Errors
    ///
    /// [`ProviderError::InvalidBinding`] for a null, closed or incomplete
    /// text.
    ///
    /// # Safety
    ///
    /// `ut` is valid until this value drops and is not used elsewhere in the
    /// meantime.
    pub unsafe fn from_raw(ut: *mut UText) -> Result<Self> {
        // SAFETY: forwarded.
        unsafe { Self::from_raw_with_close(ut, utext_close) }
    }

    /// Takes ownership of an open text that `close` releases, for example
    /// ICU's `utext_close` for texts ICU opened.
    ///
    /// # Errors
    ///
    /// See [`from_raw`](Self::from_raw).
    ///
    /// # Safety
    ///
    /// See [`from_raw`](Self::from_raw); `close` must accept `ut`.
    pub unsafe fn from_raw_with_close(ut: *mut UText, close: CloseFn) -> Result<Self> {
        // SAFETY: forwarded.
        let mut text = unsafe { Self::view(ut) }?;
        text.close = Some(close);
        Ok(text)
    }

    /// Borrows an open text without closing it on drop.
    pub(crate) unsafe fn view(ut: *mut UText) -> Result<Self> {
        let ut = NonNull::new(ut).ok_or(ProviderError::InvalidBinding("null UText"))?;
        // SAFETY: the caller guarantees `ut` is valid.
        let text = unsafe { ut.as_ref() };
        if !text.is_open() {
            return Err(ProviderError::InvalidBinding("UText is not open"));
        }
        // SAFETY: an open text points at its callback table.
        let funcs = unsafe { text.p_funcs.as_ref() }
            .copied()
            .ok_or(ProviderError::InvalidBinding("UText has no callback table"))?;
        if funcs.native_length.is_none() || funcs.extract.is_none() {
            return Err(ProviderError::InvalidBinding("UText callback table is incomplete"));
        }
        Ok(Self {
            ut,
            funcs,
            close: None,
        })
    }

    /// The wrapped text.
    #[must_use]
    pub const fn as_ptr(&self) -> *mut UText {
        self.ut.as_ptr()
    }

    /// Releases ownership without closing the text.
    #[must_use]
    pub fn into_raw(self) -> *mut UText {
        ManuallyDrop::new(self).ut.as_ptr()
    }

    /// Whether the text reports `UTEXT_PROVIDER_WRITABLE`.
    #[must_use]
    pub fn is_writable(&self) -> bool {
        // SAFETY: valid for the life of `self`.
        unsafe { self.ut.as_ref() }.has_property(UTEXT_PROVIDER_WRITABLE) && self.funcs.replace.is_some()
    }

    fn check(&self, range: &Range<usize>) -> Result<usize> {
        let len = self.len_utf16();
        if range.start > range.end || range.end > len {
            return Err(ProviderError::OutOfRange {
                start: range.start,
                end: range.end,
                len,
            });
        }
        Ok(len)
    }
}

impl TextResource for ForeignText {
    fn len_utf16(&self) -> usize {
        self.funcs.native_length.map_or(0, |native_length| {
            // SAFETY: valid open text with its own callback.
            let len = unsafe { native_length(self.ut.as_ptr()) };
            usize::try_from(len).unwrap_or(0)
        })
    }

    fn read_units(&self, start: usize, dest: &mut [u16]) -> Result<()> {
        let range = start..start.saturating_add(dest.len());
        let len = self.check(&range)?;
        let Some(extract) = self.funcs.extract else {
            return Err(ProviderError::InvalidBinding("UText callback table is incomplete"));
        };

        let mut piece_start = start;
        for piece in dest.chunks_mut(MAX_EXTRACT) {
            let piece_limit = piece_start + piece.len();
            let mut status = U_ZERO_ERROR;
            // SAFETY: `piece` is writable for its length, which fits `i32`.
            let written = unsafe {
                extract(
                    self.ut.as_ptr(),
                    to_i64(piece_start),
                    to_i64(piece_limit),
                    piece.as_mut_ptr(),
                    i32::try_from(piece.len()).unwrap_or(i32::MAX),
                    &raw mut status,
                )
            };
            check_status(status, &range, len)?;
            if usize::try_from(written) != Ok(piece.len()) {
                return Err(ProviderError::OutOfRange {
                    start: range.start,
                    end: range.end,
                    len,
                });
            }
            piece_start = piece_limit;
        }
        Ok(())
    }
}

impl MutableTextResource for ForeignText {
    fn replace_units(&mut self, range: Range<usize>, units: &[u16]) -> Result<()> {
        let len = self.check(&range)?;
        let Some(replace) = self.funcs.replace else {
            return Err(ProviderError::NotWritable);
        };
        let length = i32::try_from(units.len())
            .map_err(|_| ProviderError::ResourceExhausted { units: units.len() })?;
        let mut status = U_ZERO_ERROR;
        // SAFETY: `units` is readable for `length` units.
        unsafe {
            replace(
                self.ut.as_ptr(),
                to_i64(range.start),
                to_i64(range.end),
                units.as_ptr(),
                length,
                &raw mut status,
            );
        }
        check_status(status, &range, len)
    }
}

impl Drop for ForeignText {
    fn drop(&mut self) {
        if let Some(close) = self.close {
            // SAFETY: owned since construction.
            unsafe { close(self.ut.as_ptr()) };
        }
    }
}

impl fmt::Debug for ForeignText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForeignText")
            .field("ut", &self.ut)
            .field("owned", &self.close.is_some())
            .finish_non_exhaustive()
    }
}
