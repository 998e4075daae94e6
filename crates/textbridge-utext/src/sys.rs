//! `repr(C)` mirror of the ICU `UText` structures (`unicode/utext.h`).
//!
//! Field order, widths and constant values match ICU 4.x onwards. Nothing in
//! this module links against ICU.

use core::{mem::size_of, ptr};

/// ICU boolean: `0` is false, anything else true.
pub type UBool = i8;

/// ICU `UBool` true.
pub const TRUE: UBool = 1;
/// ICU `UBool` false.
pub const FALSE: UBool = 0;

/// ICU status code. Positive values are failures, negative values warnings.
pub type UErrorCode = i32;

/// No error.
pub const U_ZERO_ERROR: UErrorCode = 0;
/// An argument was null or otherwise unusable.
pub const U_ILLEGAL_ARGUMENT_ERROR: UErrorCode = 1;
/// A heap allocation failed.
pub const U_MEMORY_ALLOCATION_ERROR: UErrorCode = 7;
/// An index or range lies outside the text.
pub const U_INDEX_OUTOFBOUNDS_ERROR: UErrorCode = 8;
/// The destination buffer was too small; the return value is the length
/// that would have been needed.
pub const U_BUFFER_OVERFLOW_ERROR: UErrorCode = 15;
/// The operation is not supported by this text.
pub const U_UNSUPPORTED_ERROR: UErrorCode = 16;
/// The object is not in a state that allows the operation.
pub const U_INVALID_STATE_ERROR: UErrorCode = 27;
/// A modification was attempted on read-only text.
pub const U_NO_WRITE_PERMISSION: UErrorCode = 30;
/// The output exactly filled the buffer, leaving no room for a terminator.
pub const U_STRING_NOT_TERMINATED_WARNING: UErrorCode = -124;

/// `U_FAILURE(code)`.
#[must_use]
pub const fn failure(code: UErrorCode) -> bool {
    code > U_ZERO_ERROR
}

/// Value of [`UText::magic`] for initialised structures.
pub const UTEXT_MAGIC: u32 = 0x345a_d82c;

/// [`UText::flags`]: the structure itself was heap allocated by `open`.
pub const UTEXT_HEAP_ALLOCATED: i32 = 1;
/// [`UText::flags`]: the extra storage was heap allocated.
pub const UTEXT_EXTRA_HEAP_ALLOCATED: i32 = 2;
/// [`UText::flags`]: the structure is open and must be closed.
pub const UTEXT_OPEN: i32 = 4;

/// Provider property bit: `nativeLength` is expensive to compute.
pub const UTEXT_PROVIDER_LENGTH_IS_EXPENSIVE: i32 = 1;
/// Provider property bit: chunk contents stay valid until the text is closed.
pub const UTEXT_PROVIDER_STABLE_CHUNKS: i32 = 2;
/// Provider property bit: the text can be modified.
pub const UTEXT_PROVIDER_WRITABLE: i32 = 3;
/// Provider property bit: the text carries metadata.
pub const UTEXT_PROVIDER_HAS_META_DATA: i32 = 4;
/// Provider property bit: the text is owned by the `UText` and released on
/// close.
pub const UTEXT_PROVIDER_OWNS_TEXT: i32 = 5;

/// `UTextClone`.
pub type UTextClone =
    unsafe extern "C" fn(dest: *mut UText, src: *const UText, deep: UBool, status: *mut UErrorCode) -> *mut UText;
/// `UTextNativeLength`.
pub type UTextNativeLength = unsafe extern "C" fn(ut: *mut UText) -> i64;
/// `UTextAccess`.
pub type UTextAccess = unsafe extern "C" fn(ut: *mut UText, native_index: i64, forward: UBool) -> UBool;
/// `UTextExtract`.
pub type UTextExtract = unsafe extern "C" fn(
    ut: *mut UText,
    native_start: i64,
    native_limit: i64,
    dest: *mut u16,
    dest_capacity: i32,
    status: *mut UErrorCode,
) -> i32;
/// `UTextReplace`.
pub type UTextReplace = unsafe extern "C" fn(
    ut: *mut UText,
    native_start: i64,
    native_limit: i64,
    replacement: *const u16,
    replacement_length: i32,
    status: *mut UErrorCode,
) -> i32;
/// `UTextCopy`.
pub type UTextCopy = unsafe extern "C" fn(
    ut: *mut UText,
    native_start: i64,
    native_limit: i64,
    native_dest: i64,
    move_text: UBool,
    status: *mut UErrorCode,
);
/// `UTextMapOffsetToNative`.
pub type UTextMapOffsetToNative = unsafe extern "C" fn(ut: *const UText) -> i64;
/// `UTextMapNativeIndexToUTF16`.
pub type UTextMapNativeIndexToUTF16 = unsafe extern "C" fn(ut: *const UText, native_index: i64) -> i32;
/// `UTextClose`.
pub type UTextClose = unsafe extern "C" fn(ut: *mut UText);

/// The callback table a `UText` dispatches through.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct UTextFuncs {
    /// `size_of::<UTextFuncs>()`.
    pub table_size: i32,
    /// Reserved; zero.
    pub reserved1: i32,
    /// Reserved; zero.
    pub reserved2: i32,
    /// Reserved; zero.
    pub reserved3: i32,
    /// Shallow or deep clone.
    pub clone: Option<UTextClone>,
    /// Length in native units.
    pub native_length: Option<UTextNativeLength>,
    /// Chunk access.
    pub access: Option<UTextAccess>,
    /// Copy a range into caller storage.
    pub extract: Option<UTextExtract>,
    /// Replace a range.
    pub replace: Option<UTextReplace>,
    /// Copy or move a range.
    pub copy: Option<UTextCopy>,
    /// Chunk offset to native index.
    pub map_offset_to_native: Option<UTextMapOffsetToNative>,
    /// Native index to chunk offset.
    pub map_native_index_to_utf16: Option<UTextMapNativeIndexToUTF16>,
    /// Release provider state.
    pub close: Option<UTextClose>,
    /// Reserved; null.
    pub spare1: Option<UTextClose>,
    /// Reserved; null.
    pub spare2: Option<UTextClose>,
    /// Reserved; null.
    pub spare3: Option<UTextClose>,
}

/// ICU's text abstraction: a chunk of UTF-16 plus the callbacks that move it.
#[repr(C)]
#[derive(Debug)]
pub struct UText {
    /// [`UTEXT_MAGIC`] once initialised.
    pub magic: u32,
    /// `UTEXT_HEAP_ALLOCATED | UTEXT_EXTRA_HEAP_ALLOCATED | UTEXT_OPEN`.
    pub flags: i32,
    /// Provider property bits, as `1 << UTEXT_PROVIDER_*`.
    pub provider_properties: i32,
    /// `size_of::<UText>()`.
    pub size_of_struct: i32,
    /// Native index one past the end of the chunk.
    pub chunk_native_limit: i64,
    /// Size of the extra storage at [`p_extra`](Self::p_extra).
    pub extra_size: i32,
    /// Chunk offsets below this value equal `native - chunk_native_start`.
    pub native_indexing_limit: i32,
    /// Native index of the first chunk unit.
    pub chunk_native_start: i64,
    /// Current position within the chunk.
    pub chunk_offset: i32,
    /// Number of units in the chunk.
    pub chunk_length: i32,
    /// The chunk's code units.
    pub chunk_contents: *const u16,
    /// Callback table.
    pub p_funcs: *const UTextFuncs,
    /// Extra storage requested at open.
    pub p_extra: *mut core::ffi::c_void,
    /// Provider-defined: the text object.
    pub context: *const core::ffi::c_void,
    /// Provider-defined.
    pub p: *const core::ffi::c_void,
    /// Provider-defined.
    pub q: *const core::ffi::c_void,
    /// Provider-defined.
    pub r: *const core::ffi::c_void,
    /// Reserved for the framework.
    pub priv_p: *mut core::ffi::c_void,
    /// Provider-defined.
    pub a: i64,
    /// Provider-defined.
    pub b: i32,
    /// Provider-defined.
    pub c: i32,
    /// Reserved for the framework.
    pub priv_a: i64,
    /// Reserved for the framework.
    pub priv_b: i32,
    /// Reserved for the framework.
    pub priv_c: i32,
}

#[expect(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
const UTEXT_SIZE: i32 = size_of::<UText>() as i32;

impl UText {
    /// `UTEXT_INITIALIZER`: a closed, stack-allocatable structure ready to
    /// be passed to one of the `utext_init_*` functions.
    pub const INITIALIZER: Self = Self {
        magic: UTEXT_MAGIC,
        flags: 0,
        provider_properties: 0,
        size_of_struct: UTEXT_SIZE,
        chunk_native_limit: 0,
        extra_size: 0,
        native_indexing_limit: 0,
        chunk_native_start: 0,
        chunk_offset: 0,
        chunk_length: 0,
        chunk_contents: ptr::null(),
        p_funcs: ptr::null(),
        p_extra: ptr::null_mut(),
        context: ptr::null(),
        p: ptr::null(),
        q: ptr::null(),
        r: ptr::null(),
        priv_p: ptr::null_mut(),
        a: 0,
        b: 0,
        c: 0,
        priv_a: 0,
        priv_b: 0,
        priv_c: 0,
    };

    /// `true` while the structure is open.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.magic == UTEXT_MAGIC && self.flags & UTEXT_OPEN != 0
    }

    /// Whether provider property bit `property` is set.
    #[must_use]
    pub const fn has_property(&self, property: i32) -> bool {
        self.provider_properties & (1 << property) != 0
    }

    /// Native index of the current position.
    #[must_use]
    pub fn native_index(&self) -> i64 {
        self.chunk_native_start + i64::from(self.chunk_offset)
    }
}

impl Default for UText {
    fn default() -> Self {
        Self::INITIALIZER
    }
}

#[cfg(test)]
mod tests {
    use core::mem::{align_of, offset_of};

    use super::*;

    #[test]
    fn layout_matches_utext_h() {
        assert_eq!(offset_of!(UText, magic), 0);
        assert_eq!(offset_of!(UText, chunk_native_limit), 16);
        assert_eq!(offset_of!(UText, extra_size), 24);
        assert_eq!(offset_of!(UText, native_indexing_limit), 28);
        assert_eq!(offset_of!(UText, chunk_native_start), 32);
        assert_eq!(offset_of!(UText, chunk_offset), 40);
        assert_eq!(offset_of!(UText, chunk_length), 44);
        assert_eq!(offset_of!(UText, chunk_contents), 48);
        assert_eq!(align_of::<UText>(), 8);
        #[cfg(target_pointer_width = "64")]
        {
            assert_eq!(offset_of!(UText, p_funcs), 56);
            assert_eq!(offset_of!(UText, a), 112);
            assert_eq!(size_of::<UText>(), 144);
            assert_eq!(offset_of!(UTextFuncs, clone), 16);
            assert_eq!(size_of::<UTextFuncs>(), 112);
        }
    }

    #[test]
    fn status_classification() {
        assert!(failure(U_INDEX_OUTOFBOUNDS_ERROR));
        assert!(!failure(U_ZERO_ERROR));
        assert!(!failure(U_STRING_NOT_TERMINATED_WARNING));
    }

    #[test]
    fn initializer_is_closed() {
        let ut = UText::INITIALIZER;
        assert!(!ut.is_open());
        assert_eq!(ut.size_of_struct, UTEXT_SIZE);
        assert_eq!(ut.native_index(), 0);
    }
}
