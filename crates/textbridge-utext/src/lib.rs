//! ICU `UText` adapter for [`textbridge`] providers.
//!
//! [`open_provider`] installs a [`TextProvider`](textbridge::TextProvider)
//! behind a static `UTextFuncs` table so that ICU break iterators, regular
//! expressions and collators can walk the text chunk by chunk. The layout
//! in [`sys`] is bit-compatible with `unicode/utext.h`; nothing here links
//! against ICU.
//!
//! Status handling follows ICU: a callback entered with a failing status
//! does nothing, provider errors become `UErrorCode`s through
//! [`error_code`], and `access` pins out-of-range indices instead of
//! failing.
//!
//! ```rust
//! use std::{ptr, sync::Arc};
//!
//! use textbridge::TextResource;
//! use textbridge_utext::{ForeignText, utext_init_immutable};
//!
//! let text: Arc<[u16]> = "na\u{308}ive".encode_utf16().collect();
//! // SAFETY: a null destination allocates a `UText` the wrapper closes.
//! let ut = unsafe { utext_init_immutable(ptr::null_mut(), text) }.unwrap();
//! let foreign = unsafe { ForeignText::from_raw(ut) }.unwrap();
//! assert_eq!(foreign.len_utf16(), 6);
//! assert_eq!(foreign.to_string_lossy().unwrap(), "na\u{308}ive");
//! ```

#![no_std]
extern crate alloc;

#[cfg(test)]
extern crate std;

mod callbacks;
mod foreign;
mod open;
mod status;
pub mod sys;

pub use foreign::{CloseFn, ForeignText};
pub use open::{
    BorrowedUText, open_provider, utext_close, utext_composed_sequence_range,
    utext_init_borrowing, utext_init_immutable, utext_init_mutable,
};
pub use status::error_code;
pub use sys::{UErrorCode, UText, UTextFuncs};
