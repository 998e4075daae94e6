//! The `extern "C"` callback table installed in every `UText` opened by this
//! crate.
//!
//! `UText::p` owns a `Box<ProviderBox>`; every callback checks that
//! `p_funcs` is [`PROVIDER_FUNCS`] before touching it. Callbacks never
//! unwind: provider errors become status codes and a callback with a
//! failing incoming status returns without doing anything.

use alloc::boxed::Box;
use core::{mem::size_of, ops::Range, ptr, slice};

use textbridge::{ProviderError, TempBuffer, TextProvider};

use crate::{
    open::open_provider,
    status::error_code,
    sys::{
        FALSE, U_BUFFER_OVERFLOW_ERROR, U_ILLEGAL_ARGUMENT_ERROR, U_INDEX_OUTOFBOUNDS_ERROR,
        U_NO_WRITE_PERMISSION, U_STRING_NOT_TERMINATED_WARNING, UBool, UErrorCode, UText,
        UTextFuncs, failure,
    },
};

/// A provider with its lifetime erased; see [`utext_init_borrowing`](crate::utext_init_borrowing).
pub(crate) type ProviderBox = Box<dyn TextProvider<'static>>;

#[expect(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
const TABLE_SIZE: i32 = size_of::<UTextFuncs>() as i32;

pub(crate) static PROVIDER_FUNCS: UTextFuncs = UTextFuncs {
    table_size: TABLE_SIZE,
    reserved1: 0,
    reserved2: 0,
    reserved3: 0,
    clone: Some(clone_text),
    native_length: Some(native_length),
    access: Some(access),
    extract: Some(extract),
    replace: Some(replace),
    copy: Some(copy),
    map_offset_to_native: Some(map_offset_to_native),
    map_native_index_to_utf16: Some(map_native_index_to_utf16),
    close: Some(close),
    spare1: None,
    spare2: None,
    spare3: None,
};

/// Whether `ut` dispatches through [`PROVIDER_FUNCS`].
pub(crate) fn is_provider_text(ut: &UText) -> bool {
    ptr::eq(ut.p_funcs, &raw const PROVIDER_FUNCS)
}

/// The provider installed in `ut`.
///
/// # Safety
///
/// While the returned reference is live no other reference to the provider
/// may exist; callbacks hold it only for their own duration.
pub(crate) unsafe fn provider_of<'u>(ut: &UText) -> Option<&'u mut ProviderBox> {
    if !ut.is_open() || !is_provider_text(ut) {
        return None;
    }
    // SAFETY: `open_provider` stored a leaked `Box<ProviderBox>` in `p`.
    unsafe { ut.p.cast_mut().cast::<ProviderBox>().as_mut() }
}

/// Copies the provider's current chunk into the `UText` fields engines read
/// directly.
pub(crate) fn sync_chunk(ut: &mut UText, provider: &dyn TextProvider<'static>) {
    let chunk = provider.chunk();
    let published = window(
        chunk.units.len(),
        chunk.offset,
        usize::try_from(i32::MAX).unwrap_or(usize::MAX),
    );
    let units = &chunk.units[published.clone()];
    ut.chunk_contents = units.as_ptr();
    ut.chunk_length = to_i32(units.len());
    ut.chunk_native_start = to_i64(chunk.native_start + published.start);
    ut.chunk_native_limit = to_i64(chunk.native_start + published.end);
    ut.chunk_offset = to_i32(chunk.offset - published.start);
    // Native indices are UTF-16 offsets, so the whole chunk maps linearly.
    ut.native_indexing_limit = ut.chunk_length;
}

/// The part of a `len`-unit chunk that fits the `i32` chunk fields: all of
/// it, or `max` units around `offset`.
fn window(len: usize, offset: usize, max: usize) -> Range<usize> {
    let start = offset.saturating_sub(max / 2).min(len.saturating_sub(max));
    start..len.min(start + max)
}

pub(crate) fn to_i64(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn to_i32(value: usize) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

/// Clamps a signed index into `[0, len]`, the way `access` expects.
fn pin(index: i64, len: usize) -> usize {
    usize::try_from(index).map_or(0, |index| index.min(len))
}

fn to_index(index: i64) -> Result<usize, UErrorCode> {
    usize::try_from(index).map_err(|_| U_INDEX_OUTOFBOUNDS_ERROR)
}

fn to_range(start: i64, limit: i64) -> Result<Range<usize>, UErrorCode> {
    Ok(to_index(start)?..to_index(limit)?)
}

/// The incoming status, unless it is missing or already failing.
unsafe fn begin<'s>(status: *mut UErrorCode) -> Option<&'s mut UErrorCode> {
    // SAFETY: callers pass ICU's status out-parameter.
    let status = unsafe { status.as_mut() }?;
    (!failure(*status)).then_some(status)
}

fn fail(status: &mut UErrorCode, err: &ProviderError) {
    tracing::debug!(%err, "UText callback failed");
    *status = error_code(err);
}

/// Moves the provider to `index` and mirrors its chunk into `ut`.
fn restage(ut: &mut UText, provider: &mut ProviderBox, index: usize, status: &mut UErrorCode) {
    let index = index.min(provider.native_length());
    match provider.access(index, true) {
        Ok(_) => sync_chunk(ut, &**provider),
        Err(err) => fail(status, &err),
    }
}

/// `UTextClone`.
///
/// A clone of a borrowing text borrows the same resource and must be closed
/// before the original's borrow ends.
unsafe extern "C" fn clone_text(
    dest: *mut UText,
    src: *const UText,
    deep: UBool,
    status: *mut UErrorCode,
) -> *mut UText {
    // SAFETY: ICU callback contract.
    let Some(status) = (unsafe { begin(status) }) else {
        return dest;
    };
    // SAFETY: `src` is an open text of ours or null.
    let Some(source) = (unsafe { src.as_ref() }) else {
        *status = U_ILLEGAL_ARGUMENT_ERROR;
        return dest;
    };
    // SAFETY: the provider is only read for the duration of the clone.
    let Some(provider) = (unsafe { provider_of(source) }) else {
        *status = U_ILLEGAL_ARGUMENT_ERROR;
        return dest;
    };
    let position = usize::try_from(source.native_index()).unwrap_or(0);
    let copy = match provider.clone_provider(deep != FALSE) {
        Ok(copy) => copy,
        Err(err) => {
            fail(status, &err);
            return dest;
        }
    };

    // SAFETY: `dest` is null or a caller-initialised text.
    match unsafe { open_provider(dest, copy) } {
        Ok(cloned) => {
            // SAFETY: `open_provider` returned an open text of ours.
            let ut = unsafe { &mut *cloned };
            // SAFETY: freshly installed and not shared.
            if let Some(provider) = unsafe { provider_of(ut) } {
                restage(ut, provider, position, status);
            }
            cloned
        }
        Err(err) => {
            fail(status, &err);
            dest
        }
    }
}

/// `UTextNativeLength`.
unsafe extern "C" fn native_length(ut: *mut UText) -> i64 {
    // SAFETY: `ut` is an open text of ours or null.
    let Some(ut) = (unsafe { ut.as_ref() }) else {
        return 0;
    };
    // SAFETY: read-only use for the duration of the call.
    unsafe { provider_of(ut) }.map_or(0, |provider| to_i64(provider.native_length()))
}

/// `UTextAccess`.
unsafe extern "C" fn access(ut: *mut UText, native_index: i64, forward: UBool) -> UBool {
    // SAFETY: `ut` is an open text of ours or null.
    let Some(ut) = (unsafe { ut.as_mut() }) else {
        return FALSE;
    };
    // SAFETY: the provider lives in its own allocation, disjoint from `ut`.
    let Some(provider) = (unsafe { provider_of(ut) }) else {
        return FALSE;
    };
    let index = pin(native_index, provider.native_length());
    match provider.access(index, forward != FALSE) {
        Ok(found) => {
            sync_chunk(ut, &**provider);
            UBool::from(found)
        }
        Err(err) => {
            tracing::warn!(%err, index, "chunk access failed");
            FALSE
        }
    }
}

/// `UTextExtract`: NUL-terminates when room remains.
unsafe extern "C" fn extract(
    ut: *mut UText,
    native_start: i64,
    native_limit: i64,
    dest: *mut u16,
    dest_capacity: i32,
    status: *mut UErrorCode,
) -> i32 {
    // SAFETY: ICU callback contract.
    let Some(status) = (unsafe { begin(status) }) else {
        return 0;
    };
    let Ok(capacity) = usize::try_from(dest_capacity) else {
        *status = U_ILLEGAL_ARGUMENT_ERROR;
        return 0;
    };
    if dest.is_null() && capacity > 0 {
        *status = U_ILLEGAL_ARGUMENT_ERROR;
        return 0;
    }
    // SAFETY: `ut` is an open text of ours or null.
    let Some(provider) = (unsafe { ut.as_ref() }).and_then(|ut| unsafe { provider_of(ut) }) else {
        *status = U_ILLEGAL_ARGUMENT_ERROR;
        return 0;
    };
    let range = match to_range(native_start, native_limit) {
        Ok(range) => range,
        Err(code) => {
            *status = code;
            return 0;
        }
    };

    let dest: &mut [u16] = if capacity == 0 {
        &mut []
    } else {
        // SAFETY: the caller provides `capacity` writable units at `dest`.
        unsafe { slice::from_raw_parts_mut(dest, capacity) }
    };
    match provider.extract(range, dest) {
        Ok(length) => {
            if length < dest.len() {
                dest[length] = 0;
            } else if length == dest.len() {
                *status = U_STRING_NOT_TERMINATED_WARNING;
            } else {
                *status = U_BUFFER_OVERFLOW_ERROR;
            }
            to_i32(length)
        }
        Err(err) => {
            fail(status, &err);
            0
        }
    }
}

/// The replacement text; `length == -1` means NUL-terminated.
unsafe fn replacement_units<'s>(src: *const u16, length: i32) -> Option<&'s [u16]> {
    if length == 0 {
        return Some(&[]);
    }
    if src.is_null() {
        return None;
    }
    let len = if length == -1 {
        let mut len = 0;
        // SAFETY: the caller guarantees a terminator.
        while unsafe { *src.add(len) } != 0 {
            len += 1;
        }
        len
    } else {
        usize::try_from(length).ok()?
    };
    // SAFETY: `len` readable units at `src`.
    Some(unsafe { slice::from_raw_parts(src, len) })
}

/// `UTextReplace`: returns the change in length and leaves the position
/// after the inserted text.
unsafe extern "C" fn replace(
    ut: *mut UText,
    native_start: i64,
    native_limit: i64,
    replacement: *const u16,
    replacement_length: i32,
    status: *mut UErrorCode,
) -> i32 {
    // SAFETY: ICU callback contract.
    let Some(status) = (unsafe { begin(status) }) else {
        return 0;
    };
    // Stage the replacement before touching the provider: it may point into
    // the current chunk.
    // SAFETY: the caller passes `replacement_length` readable units.
    let Some(units) = (unsafe { replacement_units(replacement, replacement_length) }) else {
        *status = U_ILLEGAL_ARGUMENT_ERROR;
        return 0;
    };
    let staged = match TempBuffer::copy_of(units) {
        Ok(staged) => staged,
        Err(err) => {
            fail(status, &err);
            return 0;
        }
    };

    // SAFETY: `ut` is an open text of ours or null.
    let Some(ut) = (unsafe { ut.as_mut() }) else {
        *status = U_ILLEGAL_ARGUMENT_ERROR;
        return 0;
    };
    // SAFETY: disjoint from `ut`; no other reference is live.
    let Some(provider) = (unsafe { provider_of(ut) }) else {
        *status = U_ILLEGAL_ARGUMENT_ERROR;
        return 0;
    };
    if !provider.is_writable() {
        *status = U_NO_WRITE_PERMISSION;
        return 0;
    }
    let range = match to_range(native_start, native_limit) {
        Ok(range) => range,
        Err(code) => {
            *status = code;
            return 0;
        }
    };

    match provider.replace(range.clone(), &staged) {
        Ok(delta) => {
            restage(ut, provider, range.start + staged.len(), status);
            i32::try_from(delta).unwrap_or(if delta < 0 { i32::MIN } else { i32::MAX })
        }
        Err(err) => {
            fail(status, &err);
            0
        }
    }
}

/// `UTextCopy`: leaves the position after the copied text.
unsafe extern "C" fn copy(
    ut: *mut UText,
    native_start: i64,
    native_limit: i64,
    native_dest: i64,
    move_text: UBool,
    status: *mut UErrorCode,
) {
    // SAFETY: ICU callback contract.
    let Some(status) = (unsafe { begin(status) }) else {
        return;
    };
    // SAFETY: `ut` is an open text of ours or null.
    let Some(ut) = (unsafe { ut.as_mut() }) else {
        *status = U_ILLEGAL_ARGUMENT_ERROR;
        return;
    };
    // SAFETY: disjoint from `ut`; no other reference is live.
    let Some(provider) = (unsafe { provider_of(ut) }) else {
        *status = U_ILLEGAL_ARGUMENT_ERROR;
        return;
    };
    if !provider.is_writable() {
        *status = U_NO_WRITE_PERMISSION;
        return;
    }
    let args = to_range(native_start, native_limit)
        .and_then(|range| Ok((range, to_index(native_dest)?)));
    let (range, dest) = match args {
        Ok(args) => args,
        Err(code) => {
            *status = code;
            return;
        }
    };

    let moving = move_text != FALSE;
    match provider.copy(range.clone(), dest, moving) {
        Ok(()) => {
            let position = if moving && dest > range.start {
                dest
            } else {
                dest + range.len()
            };
            restage(ut, provider, position, status);
        }
        Err(err) => fail(status, &err),
    }
}

/// `UTextMapOffsetToNative`.
unsafe extern "C" fn map_offset_to_native(ut: *const UText) -> i64 {
    // SAFETY: `ut` is an open text of ours or null.
    let Some(ut) = (unsafe { ut.as_ref() }) else {
        return 0;
    };
    let offset = usize::try_from(ut.chunk_offset).unwrap_or(0);
    // SAFETY: read-only use for the duration of the call.
    unsafe { provider_of(ut) }.map_or(0, |provider| {
        to_i64(provider.map_offset_to_native(offset + window_shift(ut, &**provider)))
    })
}

/// `UTextMapNativeIndexToUTF16`.
unsafe extern "C" fn map_native_index_to_utf16(ut: *const UText, native_index: i64) -> i32 {
    // SAFETY: `ut` is an open text of ours or null.
    let Some(ut) = (unsafe { ut.as_ref() }) else {
        return 0;
    };
    // SAFETY: read-only use for the duration of the call.
    unsafe { provider_of(ut) }.map_or(0, |provider| {
        let index = pin(native_index, provider.native_length());
        let offset = provider.map_native_index_to_utf16(index);
        to_i32(offset.saturating_sub(window_shift(ut, &**provider)))
    })
}

/// How far the published chunk starts past the provider's own chunk.
fn window_shift(ut: &UText, provider: &dyn TextProvider<'static>) -> usize {
    usize::try_from(ut.chunk_native_start)
        .unwrap_or(0)
        .saturating_sub(provider.chunk().native_start)
}

/// `UTextClose`: drops the provider. The `UText` itself is released by
/// [`utext_close`](crate::utext_close).
unsafe extern "C" fn close(ut: *mut UText) {
    // SAFETY: `ut` is a text of ours or null.
    let Some(ut) = (unsafe { ut.as_mut() }) else {
        return;
    };
    if !is_provider_text(ut) || ut.p.is_null() {
        return;
    }
    // SAFETY: `p` was leaked from a `Box<ProviderBox>` by `open_provider`
    // and is cleared below, so it is reclaimed once.
    let mut provider = unsafe { Box::from_raw(ut.p.cast_mut().cast::<ProviderBox>()) };
    ut.p = ptr::null();
    ut.chunk_contents = ptr::null();
    ut.chunk_length = 0;
    ut.chunk_offset = 0;
    ut.native_indexing_limit = 0;
    provider.close();
}
