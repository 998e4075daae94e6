//! Chunk staging shared by every provider.
//!
//! Overview
//! - A chunk is a contiguous run of code units `[native_start, native_limit)`
//!   plus the offset of the current position inside it.
//! - Owning read-only providers over resources with contiguous storage
//!   serve the whole text as one *direct* chunk: nothing is copied, the view
//!   borrows the resource. Borrowing providers always stage into the
//!   caller's slice.
//! - Otherwise the units are copied into the chunk buffer. Short texts are
//!   staged whole; long texts go through a window of
//!   [`ProviderOptions::chunk_units`] units whose edges are moved onto
//!   composed-sequence boundaries (narrowed when possible, widened when the
//!   sequence around the requested index is longer than the window).
//! - A borrowing provider stages into the caller's slice and can neither
//!   grow nor free it. When a single composed sequence is longer than that
//!   slice the window falls back to code-point edges, so a surrogate pair is
//!   still never split.
//!
//! Access protocol
//! - `forward`: the staged chunk must satisfy `start <= index < limit`.
//!   `index == len` is the end-of-text sentinel: a chunk touching the end is
//!   staged, the offset points past its last unit and `false` is returned.
//! - backward: the chunk must satisfy `start < index <= limit`. `index == 0`
//!   is the start-of-text sentinel and returns `false` with the offset at 0.
//! - A request the current chunk already satisfies only moves the offset.

use core::ops::Range;

use crate::{
    compose::{code_point_start, composed_sequence_range, splits_pair},
    error::{ProviderError, Result},
    options::ProviderOptions,
    resource::TextResource,
    temp_buffer::{UnitVec, reserve_exact},
};

/// The chunk a provider currently has staged.
///
/// `units` stays valid until the provider is next accessed mutably.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkView<'c> {
    /// The staged code units.
    pub units: &'c [u16],
    /// Native index of `units[0]`.
    pub native_start: usize,
    /// Position of the current index inside `units`.
    pub offset: usize,
}

impl ChunkView<'_> {
    /// Native index one past the last staged unit.
    #[must_use]
    pub fn native_limit(&self) -> usize {
        self.native_start + self.units.len()
    }

    /// The native range covered by the chunk.
    #[must_use]
    pub fn native_range(&self) -> Range<usize> {
        self.native_start..self.native_limit()
    }

    /// Native index of the current position.
    #[must_use]
    pub fn native_index(&self) -> usize {
        self.native_start + self.offset
    }

    /// `true` when no units are staged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

#[derive(Debug)]
enum Storage<'a> {
    Owned(UnitVec),
    Caller(&'a mut [u16]),
}

#[derive(Debug)]
pub(crate) struct ChunkBuffer<'a> {
    storage: Storage<'a>,
    native_start: usize,
    len: usize,
    offset: usize,
    direct: bool,
}

impl<'a> ChunkBuffer<'a> {
    pub(crate) fn owned() -> Self {
        Self::with_storage(Storage::Owned(UnitVec::new()))
    }

    pub(crate) fn caller(buffer: &'a mut [u16]) -> Self {
        Self::with_storage(Storage::Caller(buffer))
    }

    fn with_storage(storage: Storage<'a>) -> Self {
        Self {
            storage,
            native_start: 0,
            len: 0,
            offset: 0,
            direct: false,
        }
    }

    pub(crate) fn is_caller_owned(&self) -> bool {
        matches!(self.storage, Storage::Caller(_))
    }

    fn capacity_limit(&self) -> Option<usize> {
        match &self.storage {
            Storage::Owned(_) => None,
            Storage::Caller(buf) => Some(buf.len()),
        }
    }

    pub(crate) fn native_start(&self) -> usize {
        self.native_start
    }

    pub(crate) fn native_limit(&self) -> usize {
        self.native_start + self.len
    }

    fn is_staged(&self) -> bool {
        self.len > 0
    }

    /// View of the staged chunk. `direct` is the resource's contiguous
    /// storage and is only consulted for direct chunks.
    pub(crate) fn view<'s>(&'s self, direct: Option<&'s [u16]>) -> ChunkView<'s> {
        let range = self.native_start..self.native_limit();
        let units = if self.direct {
            direct.and_then(|units| units.get(range)).unwrap_or(&[])
        } else {
            match &self.storage {
                Storage::Owned(units) => &units[..self.len],
                Storage::Caller(buf) => &buf[..self.len],
            }
        };
        ChunkView {
            units,
            native_start: self.native_start,
            offset: self.offset,
        }
    }

    pub(crate) fn invalidate(&mut self) {
        self.native_start = 0;
        self.len = 0;
        self.offset = 0;
        self.direct = false;
    }

    /// Drops the staged chunk and frees any heap storage. Caller storage is
    /// left untouched.
    pub(crate) fn release(&mut self) {
        self.invalidate();
        if let Storage::Owned(units) = &mut self.storage {
            *units = UnitVec::new();
        }
    }

    /// Moves the chunk onto `index`, staging a new window when needed.
    /// Returns `false` for the start/end-of-text sentinels.
    pub(crate) fn access<R: TextResource + ?Sized>(
        &mut self,
        text: &R,
        len: usize,
        index: usize,
        forward: bool,
        options: &ProviderOptions,
        allow_direct: bool,
    ) -> Result<bool> {
        if index > len {
            return Err(ProviderError::index(index, len));
        }

        if allow_direct && text.as_contiguous().is_some() {
            self.direct = true;
            self.native_start = 0;
            self.len = len;
            self.offset = index;
            return Ok(if forward { index < len } else { index > 0 });
        }

        if len == 0 {
            self.invalidate();
            return Ok(false);
        }

        if forward {
            if index == len {
                if !(self.is_staged() && self.native_limit() == len) {
                    self.stage_window(text, len, len, false, options)?;
                }
                self.offset = self.len;
                return Ok(false);
            }
            if !(self.is_staged() && self.native_start <= index && index < self.native_limit()) {
                self.stage_window(text, len, index, true, options)?;
            }
        } else {
            if index == 0 {
                if !(self.is_staged() && self.native_start == 0) {
                    self.stage_window(text, len, 0, true, options)?;
                }
                self.offset = 0;
                return Ok(false);
            }
            if !(self.is_staged() && self.native_start < index && index <= self.native_limit()) {
                self.stage_window(text, len, index, false, options)?;
            }
        }

        self.offset = index - self.native_start;
        Ok(true)
    }

    fn stage_window<R: TextResource + ?Sized>(
        &mut self,
        text: &R,
        len: usize,
        index: usize,
        forward: bool,
        options: &ProviderOptions,
    ) -> Result<()> {
        let range = plan_window(text, len, index, forward, options, self.capacity_limit())?;
        self.stage(text, range)
    }

    fn stage<R: TextResource + ?Sized>(&mut self, text: &R, range: Range<usize>) -> Result<()> {
        self.invalidate();
        let count = range.len();
        let dest = match &mut self.storage {
            Storage::Owned(units) => {
                units.clear();
                reserve_exact(units, count)?;
                units.resize(count, 0);
                &mut units[..]
            }
            Storage::Caller(buf) => buf
                .get_mut(..count)
                .ok_or(ProviderError::InvalidBinding("chunk exceeds caller buffer"))?,
        };
        text.read_units(range.start, dest)?;

        tracing::trace!(start = range.start, limit = range.end, "staged chunk");
        self.native_start = range.start;
        self.len = count;
        Ok(())
    }

    /// Panics when the chunk is not a subrange of `[0, len]`.
    #[cfg(any(test, feature = "fuzzing"))]
    pub(crate) fn assert_invariants(&self, len: usize) {
        assert!(
            self.native_limit() <= len,
            "chunk {}..{} exceeds text length {len}",
            self.native_start,
            self.native_limit()
        );
        assert!(self.offset <= self.len, "chunk offset past chunk end");
        if let Some(cap) = self.capacity_limit() {
            assert!(self.len <= cap, "chunk exceeds caller buffer");
        }
    }
}

/// Chooses the native range to stage for an access at `index`.
///
/// Forward windows satisfy `start <= index < limit`, backward windows
/// `start < index <= limit`. `cap` is the largest chunk the storage can hold.
pub(crate) fn plan_window<R: TextResource + ?Sized>(
    text: &R,
    len: usize,
    index: usize,
    forward: bool,
    options: &ProviderOptions,
    cap: Option<usize>,
) -> Result<Range<usize>> {
    let window = cap.map_or(options.window(), |cap| options.window().min(cap));
    let whole = cap
        .map_or(options.whole_text_limit, |cap| options.whole_text_limit.min(cap))
        .max(window);
    if len <= whole {
        return Ok(0..len);
    }

    if forward {
        let seq = composed_sequence_range(text, index)?;
        if let Some(cap) = cap.filter(|&cap| seq.len() > cap) {
            let start = code_point_start(text, index)?;
            let mut limit = (start + cap).min(len);
            if splits_pair(text, limit, len)? && limit - 1 > index {
                limit -= 1;
            }
            return Ok(start..limit);
        }

        let start = seq.start;
        let mut limit = (start + window).min(len).max(seq.end);
        if limit < len {
            let next = composed_sequence_range(text, limit)?;
            if next.start < limit {
                limit = next.start;
            }
        }
        Ok(start..limit)
    } else {
        let seq = composed_sequence_range(text, index - 1)?;
        if let Some(cap) = cap.filter(|&cap| seq.len() > cap) {
            let mut limit = index;
            if splits_pair(text, index, len)? {
                limit += 1;
            }
            let mut start = limit.saturating_sub(cap);
            if splits_pair(text, start, len)? && start + 1 < index {
                start += 1;
            }
            return Ok(start..limit);
        }

        let limit = seq.end;
        let mut start = limit.saturating_sub(window).min(seq.start);
        if start > 0 {
            let prev = composed_sequence_range(text, start)?;
            if prev.start < start {
                start = prev.end;
            }
        }
        Ok(start..limit)
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use super::*;

    fn utf16(s: &str) -> Vec<u16> {
        s.encode_utf16().collect()
    }

    fn windowed(chunk_units: usize) -> ProviderOptions {
        ProviderOptions {
            chunk_units,
            whole_text_limit: 0,
            ..Default::default()
        }
    }

    #[test]
    fn short_text_is_staged_whole() {
        let text = utf16("hello");
        let range = plan_window(&text, 5, 2, true, &ProviderOptions::default(), None).unwrap();
        assert_eq!(range, 0..5);
    }

    #[test]
    fn forward_window_is_narrowed_to_a_boundary() {
        // "ab" + e + U+0301 + "cd": a window of 3 from 0 would end inside "é".
        let text = utf16("abe\u{301}cd");
        let range = plan_window(&text, text.len(), 0, true, &windowed(3), None).unwrap();
        assert_eq!(range, 0..2);
    }

    #[test]
    fn forward_window_is_widened_for_long_sequences() {
        let text = utf16("xa\u{301}\u{302}\u{303}\u{304}y");
        let range = plan_window(&text, text.len(), 2, true, &windowed(2), None).unwrap();
        assert_eq!(range, 1..6);
    }

    #[test]
    fn backward_window_ends_after_the_sequence() {
        // Backward access at 4 needs unit 3 (U+0301), whose sequence is 2..4.
        let text = utf16("xye\u{301}zw");
        let range = plan_window(&text, text.len(), 4, false, &windowed(3), None).unwrap();
        assert_eq!(range, 1..4);
    }

    #[test]
    fn backward_window_start_is_moved_forward() {
        // Window of 2 ending at 4 would start at 2, inside "e\u{301}" at 1..3.
        let text = utf16("xe\u{301}ab");
        let range = plan_window(&text, text.len(), 4, false, &windowed(2), None).unwrap();
        assert_eq!(range, 3..4);
    }

    #[test]
    fn capped_window_keeps_surrogate_pairs() {
        // A pair followed by marks is longer than the 2-unit cap.
        let text = utf16("a\u{1D400}\u{301}\u{302}b");
        let range = plan_window(&text, text.len(), 1, true, &windowed(8), Some(2)).unwrap();
        assert_eq!(range, 1..3);

        let range = plan_window(&text, text.len(), 3, false, &windowed(8), Some(2)).unwrap();
        assert_eq!(range, 1..3);
    }

    #[test]
    fn access_reuses_the_staged_chunk() {
        let text: Vec<u16> = (0..20u16).map(|i| 0x61 + i).collect();
        let options = windowed(8);
        let mut chunk = ChunkBuffer::owned();

        assert!(chunk.access(&text, 20, 3, true, &options, false).unwrap());
        assert_eq!(chunk.view(None).native_range(), 3..11);

        assert!(chunk.access(&text, 20, 10, true, &options, false).unwrap());
        assert_eq!(chunk.view(None).native_range(), 3..11);
        assert_eq!(chunk.view(None).offset, 7);

        assert!(chunk.access(&text, 20, 11, false, &options, false).unwrap());
        assert_eq!(chunk.view(None).native_range(), 3..11);
        assert_eq!(chunk.view(None).offset, 8);

        assert!(chunk.access(&text, 20, 11, true, &options, false).unwrap());
        assert_eq!(chunk.view(None).native_range(), 11..19);
        chunk.assert_invariants(20);
    }

    #[test]
    fn sentinels_at_text_edges() {
        let text: Vec<u16> = (0..20u16).map(|i| 0x61 + i).collect();
        let options = windowed(8);
        let mut chunk = ChunkBuffer::owned();

        assert!(!chunk.access(&text, 20, 20, true, &options, false).unwrap());
        let view = chunk.view(None);
        assert_eq!(view.native_range(), 12..20);
        assert_eq!(view.native_index(), 20);

        assert!(!chunk.access(&text, 20, 0, false, &options, false).unwrap());
        let view = chunk.view(None);
        assert_eq!(view.native_range(), 0..8);
        assert_eq!(view.native_index(), 0);

        assert_eq!(
            chunk.access(&text, 20, 21, true, &options, false),
            Err(ProviderError::OutOfRange {
                start: 21,
                end: 22,
                len: 20
            })
        );
    }

    #[test]
    fn caller_storage_bounds_the_chunk() {
        let text: Vec<u16> = (0..20u16).map(|i| 0x61 + i).collect();
        let mut buf = [0u16; 4];
        let mut chunk = ChunkBuffer::caller(&mut buf);
        assert!(chunk.access(&text, 20, 5, true, &ProviderOptions::default(), false).unwrap());
        let view = chunk.view(None);
        assert_eq!(view.native_range(), 5..9);
        assert_eq!(view.units, &text[5..9]);
    }

    #[test]
    fn direct_chunk_borrows_the_resource() {
        let text = utf16("direct");
        let mut chunk = ChunkBuffer::owned();
        assert!(chunk.access(&text, 6, 2, true, &ProviderOptions::default(), true).unwrap());
        let view = chunk.view(Some(text.as_slice()));
        assert_eq!(view.units.as_ptr(), text.as_ptr());
        assert_eq!(view.offset, 2);
    }
}
