use alloc::{boxed::Box, rc::Rc, sync::Arc};
use core::{
    cell::RefCell,
    marker::PhantomData,
    mem::{self, size_of},
    ops::Range,
    ptr::{self, NonNull},
};

use textbridge::{
    MutableTextResource, Ownership, ProviderError, Result, TextProvider, TextResource,
    bind_borrowing, bind_immutable, bind_mutable, composed_sequence_range,
};

use crate::{
    callbacks::{PROVIDER_FUNCS, ProviderBox, provider_of, to_i64},
    foreign::ForeignText,
    status::error_code,
    sys::{
        U_INDEX_OUTOFBOUNDS_ERROR, UErrorCode, UTEXT_HEAP_ALLOCATED, UTEXT_MAGIC, UTEXT_OPEN,
        UTEXT_PROVIDER_OWNS_TEXT, UTEXT_PROVIDER_WRITABLE, UText,
    },
};

const fn provider_properties(ownership: Ownership) -> i32 {
    match ownership {
        Ownership::Owning => 1 << UTEXT_PROVIDER_OWNS_TEXT,
        Ownership::Borrowing => 0,
        Ownership::MutableOwning => (1 << UTEXT_PROVIDER_WRITABLE) | (1 << UTEXT_PROVIDER_OWNS_TEXT),
    }
}

/// Installs `provider` behind the callback table of a `UText`.
///
/// With a null `dest` the `UText` is heap allocated and must be released
/// with [`utext_close`]. Otherwise `dest` must have been initialised with
/// [`UText::INITIALIZER`]; a text that is still open is closed first.
///
/// # Errors
///
/// [`ProviderError::InvalidBinding`] when `dest` does not carry
/// [`UTEXT_MAGIC`] or is smaller than [`UText`].
///
/// # Safety
///
/// `dest` is null or valid for reads and writes, and nothing else accesses
/// it during the call.
pub unsafe fn open_provider(dest: *mut UText, provider: ProviderBox) -> Result<*mut UText> {
    let ut = if dest.is_null() {
        // ICU's own `utext_close` releases heap texts with `free`.
        // SAFETY: plain C allocation; `malloc` alignment covers `UText`.
        let fresh = unsafe { libc::malloc(size_of::<UText>()) }.cast::<UText>();
        if fresh.is_null() {
            return Err(ProviderError::ResourceExhausted { units: size_of::<UText>() });
        }
        // SAFETY: `fresh` is valid for writes of one `UText`.
        unsafe {
            fresh.write(UText {
                flags: UTEXT_HEAP_ALLOCATED,
                ..UText::INITIALIZER
            });
        }
        fresh
    } else {
        // SAFETY: the caller guarantees `dest` is valid.
        let existing = unsafe { &*dest };
        if existing.magic != UTEXT_MAGIC
            || !usize::try_from(existing.size_of_struct).is_ok_and(|size| size >= size_of::<UText>())
        {
            return Err(ProviderError::InvalidBinding("UText was not initialised"));
        }
        if existing.is_open() {
            // SAFETY: an open text with a valid callback table.
            unsafe { close_callbacks(dest) };
        }
        dest
    };

    let ownership = provider.ownership();
    let native_length = provider.native_length();
    // SAFETY: `ut` is valid and exclusively ours for the rest of the call.
    let text = unsafe { &mut *ut };
    text.flags = (text.flags & UTEXT_HEAP_ALLOCATED) | UTEXT_OPEN;
    text.provider_properties = provider_properties(ownership);
    text.chunk_contents = ptr::null();
    text.chunk_native_start = 0;
    text.chunk_native_limit = 0;
    text.chunk_offset = 0;
    text.chunk_length = 0;
    text.native_indexing_limit = 0;
    text.context = ptr::null();
    text.q = ptr::null();
    text.r = ptr::null();
    text.a = 0;
    text.b = 0;
    text.c = 0;
    text.p_funcs = &raw const PROVIDER_FUNCS;
    text.p = Box::into_raw(Box::new(provider)).cast_const().cast();

    tracing::debug!(?ownership, native_length, heap = dest.is_null(), "opened UText");
    Ok(ut)
}

/// Runs the close callback of an open text, whoever installed it.
unsafe fn close_callbacks(ut: *mut UText) {
    // SAFETY: `ut` is valid; the table pointer is copied out before the call.
    let funcs = unsafe { (*ut).p_funcs };
    // SAFETY: an open text points at a live callback table.
    if let Some(close) = unsafe { funcs.as_ref() }.and_then(|funcs| funcs.close) {
        // SAFETY: ICU close contract.
        unsafe { close(ut) };
    }
}

/// `utext_close`: runs the close callback and marks the text closed.
///
/// Returns null when the `UText` itself was heap allocated and has been
/// freed, `ut` otherwise. Closed or uninitialised texts are left alone.
///
/// # Safety
///
/// `ut` is null or valid; a heap-allocated text must have been allocated
/// with `malloc`, as [`open_provider`] and ICU do.
pub unsafe extern "C" fn utext_close(ut: *mut UText) -> *mut UText {
    // SAFETY: the caller guarantees `ut` is null or valid.
    let Some(text) = (unsafe { ut.as_ref() }) else {
        return ut;
    };
    if !text.is_open() {
        return ut;
    }
    // SAFETY: open text.
    unsafe { close_callbacks(ut) };

    // SAFETY: still valid; the callback does not free the structure.
    let text = unsafe { &mut *ut };
    text.flags &= !UTEXT_OPEN;
    if text.flags & UTEXT_HEAP_ALLOCATED != 0 {
        text.magic = 0;
        // SAFETY: heap texts come from `malloc`, in `open_provider` or ICU.
        unsafe { libc::free(ut.cast()) };
        return ptr::null_mut();
    }
    ut
}

/// Opens `dest` (or a heap text) over a shared immutable resource.
///
/// # Errors
///
/// See [`open_provider`].
///
/// # Safety
///
/// See [`open_provider`].
pub unsafe fn utext_init_immutable<R: TextResource + ?Sized + 'static>(
    dest: *mut UText,
    resource: Arc<R>,
) -> Result<*mut UText> {
    // SAFETY: forwarded.
    unsafe { open_provider(dest, Box::new(bind_immutable(resource))) }
}

/// Opens `dest` (or a heap text) over a shared mutable resource. The text
/// reports `UTEXT_PROVIDER_WRITABLE`.
///
/// # Errors
///
/// [`ProviderError::ResourceBusy`] when `resource` is mutably borrowed, and
/// see [`open_provider`].
///
/// # Safety
///
/// See [`open_provider`].
pub unsafe fn utext_init_mutable<R: MutableTextResource + 'static>(
    dest: *mut UText,
    resource: Rc<RefCell<R>>,
) -> Result<*mut UText> {
    let provider = bind_mutable(resource)?;
    // SAFETY: forwarded.
    unsafe { open_provider(dest, Box::new(provider)) }
}

/// An open `UText` over borrowed text and a caller chunk buffer, closed on
/// drop.
///
/// [`as_ptr`](Self::as_ptr) can be handed to any engine that takes a
/// `UText *`. Clones made through the callback table borrow the same text
/// and must be closed before this guard is dropped.
#[derive(Debug)]
pub struct BorrowedUText<'a> {
    ut: NonNull<UText>,
    _borrow: PhantomData<&'a mut UText>,
}

impl BorrowedUText<'_> {
    /// The open text.
    #[must_use]
    pub const fn as_ptr(&self) -> *mut UText {
        self.ut.as_ptr()
    }
}

impl Drop for BorrowedUText<'_> {
    fn drop(&mut self) {
        // SAFETY: the guard holds the only borrow of an open stack text.
        unsafe { utext_close(self.ut.as_ptr()) };
    }
}

/// Opens `ut` over `resource` without allocating: chunks are staged in
/// `buffer` or served straight from contiguous storage.
///
/// # Errors
///
/// [`ProviderError::InvalidBinding`] for a buffer shorter than a surrogate
/// pair, a heap-allocated `ut`, or one not carrying [`UTEXT_MAGIC`].
pub fn utext_init_borrowing<'a, R: TextResource + ?Sized>(
    ut: &'a mut UText,
    resource: &'a R,
    buffer: &'a mut [u16],
) -> Result<BorrowedUText<'a>> {
    if ut.flags & UTEXT_HEAP_ALLOCATED != 0 {
        return Err(ProviderError::InvalidBinding("borrowing UText must not be heap allocated"));
    }
    let provider: Box<dyn TextProvider<'a> + 'a> = Box::new(bind_borrowing(resource, buffer)?);
    // SAFETY: the guard closes the text, dropping the provider, before `'a`
    // ends. Reaching the text after a leaked guard takes further unsafe code.
    let provider = unsafe { mem::transmute::<Box<dyn TextProvider<'a> + 'a>, ProviderBox>(provider) };
    // SAFETY: `ut` is an exclusive reference.
    let opened = unsafe { open_provider(ut, provider) }?;
    Ok(BorrowedUText {
        ut: NonNull::new(opened).ok_or(ProviderError::InvalidBinding("UText was not opened"))?,
        _borrow: PhantomData,
    })
}

/// The composed character sequence containing `native_index` in any open
/// UTF-16 `UText`.
///
/// # Errors
///
/// `U_INDEX_OUTOFBOUNDS_ERROR` for a negative index or one at or past the
/// end of the text; the status of any other provider error.
///
/// # Safety
///
/// `ut` is null or a valid `UText` not accessed elsewhere during the call.
pub unsafe fn utext_composed_sequence_range(
    ut: *mut UText,
    native_index: i64,
) -> Result<Range<i64>, UErrorCode> {
    let index = usize::try_from(native_index).map_err(|_| U_INDEX_OUTOFBOUNDS_ERROR)?;
    // SAFETY: the caller guarantees `ut` is null or valid.
    let range = match unsafe { ut.as_ref() }.and_then(|text| unsafe { provider_of(text) }) {
        Some(provider) => provider.composed_range(index),
        None => {
            // SAFETY: forwarded.
            let text = unsafe { ForeignText::view(ut) }.map_err(|err| error_code(&err))?;
            composed_sequence_range(&text, index)
        }
    }
    .map_err(|err| error_code(&err))?;
    Ok(to_i64(range.start)..to_i64(range.end))
}
