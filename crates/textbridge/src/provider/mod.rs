//! The provider interface and its three bindings.
//!
//! Overview
//! - [`TextProvider`] is the capability set an external text engine drives:
//!   length, chunk access, extraction, index mapping, replacement, cloning
//!   and closing. It is object safe so bindings can be boxed behind a
//!   foreign callback table.
//! - [`ReadOnlyProvider`] covers both read-only modes. In
//!   [`Ownership::Owning`] mode it holds an `Arc` to the resource and stages
//!   chunks in its own buffer; in [`Ownership::Borrowing`] mode it borrows
//!   the resource and stages chunks in a slice supplied by the caller.
//! - [`MutableProvider`] shares a `Rc<RefCell<_>>` with the caller and is the
//!   only provider whose [`TextProvider::is_writable`] returns `true`.
//!
//! Mutation outside the provider
//! - Providers cache the text length and the staged chunk. Editing the
//!   resource by any other path than [`TextProvider::replace`] while a
//!   provider is bound leaves both stale. This is not detected; reads past
//!   the real end of the text fail with [`ProviderError::OutOfRange`]
//!   instead of returning data.

mod mutable;
mod read_only;

use alloc::boxed::Box;
use core::ops::Range;

pub use mutable::{MutableProvider, bind_mutable, bind_mutable_with_options};
pub use read_only::{ReadOnlyProvider, bind_borrowing, bind_immutable, bind_immutable_with_options};

use crate::{
    chunk::ChunkView,
    error::{ProviderError, Result, check_range},
    resource::TextResource,
};

/// How a provider holds its resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Ownership {
    /// Shared, reference-counted, immutable resource.
    Owning,
    /// Borrowed resource the caller keeps alive and unmodified; chunks are
    /// staged in caller storage.
    Borrowing,
    /// Shared mutable resource; the provider is writable.
    MutableOwning,
}

impl Ownership {
    /// Only [`Ownership::MutableOwning`] providers accept mutations.
    #[must_use]
    pub const fn is_writable(self) -> bool {
        matches!(self, Self::MutableOwning)
    }
}

/// Callback surface of a bound string resource.
///
/// Native indices and chunk offsets are both measured in UTF-16 code units,
/// so the mapping operations are offsets relative to the staged chunk.
pub trait TextProvider<'a> {
    /// Ownership mode fixed at construction.
    fn ownership(&self) -> Ownership;

    /// Whether [`replace`](Self::replace) and [`copy`](Self::copy) may
    /// succeed. Never changes over the provider's life.
    fn is_writable(&self) -> bool {
        self.ownership().is_writable()
    }

    /// Cached length of the text in code units; `0` once closed.
    fn native_length(&self) -> usize;

    /// Stages a chunk around `native_index` and moves the current position
    /// to it.
    ///
    /// Forward access needs a chunk with `start <= index < limit`, backward
    /// access one with `start < index <= limit`. Returns `false` without an
    /// error when there is no text in the requested direction (`index ==
    /// len` forward, `index == 0` backward, or a closed provider).
    ///
    /// # Errors
    ///
    /// [`ProviderError::OutOfRange`] when `native_index > native_length()`,
    /// [`ProviderError::ResourceExhausted`] when the chunk buffer cannot
    /// grow, and errors from reading the resource.
    fn access(&mut self, native_index: usize, forward: bool) -> Result<bool>;

    /// The chunk staged by the last successful [`access`](Self::access).
    fn chunk(&self) -> ChunkView<'_>;

    /// Copies `range` into `dest`, truncated to `dest.len()`, and returns
    /// the length of `range` so callers can size a second attempt.
    ///
    /// # Errors
    ///
    /// [`ProviderError::OutOfRange`] for a reversed range or one ending past
    /// the text; [`ProviderError::InvalidBinding`] once closed.
    fn extract(&self, range: Range<usize>, dest: &mut [u16]) -> Result<usize>;

    /// Replaces `range` with `units` and returns the change in length.
    ///
    /// # Errors
    ///
    /// [`ProviderError::NotWritable`] unless the provider is writable, then
    /// [`ProviderError::OutOfRange`] for an invalid range.
    fn replace(&mut self, range: Range<usize>, units: &[u16]) -> Result<isize> {
        let _ = (range, units);
        Err(ProviderError::NotWritable)
    }

    /// Copies `range` to `dest_index`, removing the original when
    /// `move_text` is set.
    ///
    /// # Errors
    ///
    /// [`ProviderError::NotWritable`] unless the provider is writable, then
    /// [`ProviderError::OutOfRange`] for an invalid range or a destination
    /// strictly inside `range`.
    fn copy(&mut self, range: Range<usize>, dest_index: usize, move_text: bool) -> Result<()> {
        let _ = (range, dest_index, move_text);
        Err(ProviderError::NotWritable)
    }

    /// Native index of the position `chunk_offset` units into the current
    /// chunk.
    fn map_offset_to_native(&self, chunk_offset: usize) -> usize {
        self.chunk().native_start + chunk_offset
    }

    /// Offset into the current chunk of `native_index`.
    fn map_native_index_to_utf16(&self, native_index: usize) -> usize {
        native_index.saturating_sub(self.chunk().native_start)
    }

    /// Range of the composed character sequence containing `index`; see
    /// [`composed_sequence_range`](crate::composed_sequence_range).
    ///
    /// # Errors
    ///
    /// [`ProviderError::OutOfRange`] when `index >= native_length()`;
    /// [`ProviderError::InvalidBinding`] once closed.
    fn composed_range(&self, index: usize) -> Result<Range<usize>>;

    /// A new provider over the same resource with its own chunk buffer.
    ///
    /// For writable providers a `deep` clone copies the text into a new
    /// resource instead of sharing it.
    ///
    /// # Errors
    ///
    /// [`ProviderError::InvalidBinding`] once closed, and allocation or
    /// read errors for deep clones.
    fn clone_provider(&self, deep: bool) -> Result<Box<dyn TextProvider<'a> + 'a>>;

    /// Releases the resource reference and any heap buffer. Idempotent.
    fn close(&mut self);

    /// `true` after [`close`](Self::close).
    fn is_closed(&self) -> bool;
}

impl<'a, P: TextProvider<'a> + ?Sized> TextProvider<'a> for Box<P> {
    fn ownership(&self) -> Ownership {
        (**self).ownership()
    }

    fn is_writable(&self) -> bool {
        (**self).is_writable()
    }

    fn native_length(&self) -> usize {
        (**self).native_length()
    }

    fn access(&mut self, native_index: usize, forward: bool) -> Result<bool> {
        (**self).access(native_index, forward)
    }

    fn chunk(&self) -> ChunkView<'_> {
        (**self).chunk()
    }

    fn extract(&self, range: Range<usize>, dest: &mut [u16]) -> Result<usize> {
        (**self).extract(range, dest)
    }

    fn replace(&mut self, range: Range<usize>, units: &[u16]) -> Result<isize> {
        (**self).replace(range, units)
    }

    fn copy(&mut self, range: Range<usize>, dest_index: usize, move_text: bool) -> Result<()> {
        (**self).copy(range, dest_index, move_text)
    }

    fn map_offset_to_native(&self, chunk_offset: usize) -> usize {
        (**self).map_offset_to_native(chunk_offset)
    }

    fn map_native_index_to_utf16(&self, native_index: usize) -> usize {
        (**self).map_native_index_to_utf16(native_index)
    }

    fn composed_range(&self, index: usize) -> Result<Range<usize>> {
        (**self).composed_range(index)
    }

    fn clone_provider(&self, deep: bool) -> Result<Box<dyn TextProvider<'a> + 'a>> {
        (**self).clone_provider(deep)
    }

    fn close(&mut self) {
        (**self).close();
    }

    fn is_closed(&self) -> bool {
        (**self).is_closed()
    }
}

const CLOSED: ProviderError = ProviderError::InvalidBinding("provider is closed");

/// Shared body of [`TextProvider::extract`].
fn extract_from<R: TextResource + ?Sized>(
    text: &R,
    len: usize,
    range: Range<usize>,
    dest: &mut [u16],
) -> Result<usize> {
    check_range(&range, len)?;
    let copied = range.len().min(dest.len());
    text.read_units(range.start, &mut dest[..copied])?;
    Ok(range.len())
}
