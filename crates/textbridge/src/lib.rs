//! Binds UTF-16 string resources to a chunked text-iteration protocol.
//!
//! A *provider* wraps a string resource and answers the questions a Unicode
//! text engine asks while it walks the text: how long is it, which contiguous
//! run of code units surrounds a native index, how do chunk offsets map back
//! to native indices, and (for writable text) how to replace a range in
//! place.
//!
//! Three providers cover the ownership modes a caller can choose from:
//!
//! - [`bind_immutable`] keeps a shared [`Arc`](alloc::sync::Arc) to an
//!   immutable resource.
//! - [`bind_borrowing`] borrows the resource and stages chunks in a buffer
//!   supplied by the caller, so short-lived iteration never allocates.
//! - [`bind_mutable`] shares a `Rc<RefCell<_>>` with the caller and supports
//!   [`TextProvider::replace`].
//!
//! Chunk windows never split a composed character sequence (a surrogate pair
//! or a base character followed by combining marks); the same boundary query
//! is available on its own as [`composed_sequence_range`].
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use textbridge::{TextProvider, bind_immutable, composed_sequence_range};
//!
//! let text: Arc<[u16]> = "e\u{301}t\u{e9}".encode_utf16().collect();
//! assert_eq!(composed_sequence_range(&*text, 1).unwrap(), 0..2);
//!
//! let mut provider = bind_immutable(text);
//! assert!(provider.access(0, true).unwrap());
//! assert_eq!(provider.chunk().units.len(), 4);
//! ```

#![no_std]
extern crate alloc;

#[cfg(test)]
extern crate std;

mod chunk;
mod compose;
mod error;
mod options;
mod provider;
mod provider_text;
mod resource;
mod temp_buffer;

#[cfg(test)]
mod tests;

pub use chunk::ChunkView;
pub use compose::{composed_sequence_range, is_high_surrogate, is_low_surrogate};
pub use error::{ProviderError, Result};
pub use options::{MIN_CHUNK_UNITS, ProviderOptions};
pub use provider::{
    MutableProvider, Ownership, ReadOnlyProvider, TextProvider, bind_borrowing, bind_immutable,
    bind_immutable_with_options, bind_mutable, bind_mutable_with_options,
};
pub use provider_text::ProviderText;
pub use resource::{MutableTextResource, TextResource};
pub use temp_buffer::{INLINE_BYTES, INLINE_UNITS, TempBuffer};
