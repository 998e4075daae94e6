use alloc::{boxed::Box, sync::Arc};
use core::{fmt, ops::Range};

use super::{CLOSED, Ownership, TextProvider, extract_from};
use crate::{
    chunk::{ChunkBuffer, ChunkView},
    compose::composed_sequence_range,
    error::{ProviderError, Result},
    options::{MIN_CHUNK_UNITS, ProviderOptions},
    resource::TextResource,
};

enum Source<'a, R: ?Sized> {
    Shared(Arc<R>),
    Borrowed(&'a R),
    Closed,
}

/// Read-only provider in either [`Ownership::Owning`] or
/// [`Ownership::Borrowing`] mode.
///
/// Both modes reject [`replace`](TextProvider::replace) and
/// [`copy`](TextProvider::copy) with [`ProviderError::NotWritable`].
pub struct ReadOnlyProvider<'a, R: ?Sized> {
    source: Source<'a, R>,
    ownership: Ownership,
    chunk: ChunkBuffer<'a>,
    native_length: usize,
    options: ProviderOptions,
}

/// Binds an immutable resource, taking a new shared reference to it.
///
/// The text is not copied. Contiguous resources are served as one
/// zero-copy chunk; others are staged through the provider's own buffer.
pub fn bind_immutable<'a, R: TextResource + ?Sized + 'a>(
    resource: Arc<R>,
) -> ReadOnlyProvider<'a, R> {
    bind_immutable_with_options(resource, ProviderOptions::default())
}

/// [`bind_immutable`] with explicit chunking options.
pub fn bind_immutable_with_options<'a, R: TextResource + ?Sized + 'a>(
    resource: Arc<R>,
    options: ProviderOptions,
) -> ReadOnlyProvider<'a, R> {
    let native_length = resource.len_utf16();
    tracing::debug!(native_length, ownership = ?Ownership::Owning, "bound text resource");
    ReadOnlyProvider {
        source: Source::Shared(resource),
        ownership: Ownership::Owning,
        chunk: ChunkBuffer::owned(),
        native_length,
        options,
    }
}

/// Binds a borrowed resource, staging chunks in `buffer`.
///
/// Intended for short, stack-scoped iteration: neither the provider nor its
/// chunk storage touches the heap. The caller must not modify the resource
/// while the provider is alive (the borrow checker enforces this for
/// ordinary Rust references; interior mutability is the caller's
/// responsibility). `buffer` is never freed or resized by the provider.
///
/// # Errors
///
/// [`ProviderError::InvalidBinding`] when `buffer` is shorter than
/// [`MIN_CHUNK_UNITS`].
pub fn bind_borrowing<'a, R: TextResource + ?Sized>(
    resource: &'a R,
    buffer: &'a mut [u16],
) -> Result<ReadOnlyProvider<'a, R>> {
    if buffer.len() < MIN_CHUNK_UNITS {
        return Err(ProviderError::InvalidBinding(
            "borrowing buffer must hold a surrogate pair",
        ));
    }
    let native_length = resource.len_utf16();
    tracing::debug!(
        native_length,
        buffer_units = buffer.len(),
        ownership = ?Ownership::Borrowing,
        "bound text resource"
    );
    Ok(ReadOnlyProvider {
        source: Source::Borrowed(resource),
        ownership: Ownership::Borrowing,
        chunk: ChunkBuffer::caller(buffer),
        native_length,
        options: ProviderOptions::default(),
    })
}

impl<'a, R: TextResource + ?Sized> ReadOnlyProvider<'a, R> {
    /// The bound resource, or `None` once closed.
    #[must_use]
    pub fn resource(&self) -> Option<&R> {
        match &self.source {
            Source::Shared(shared) => Some(&**shared),
            Source::Borrowed(borrowed) => Some(*borrowed),
            Source::Closed => None,
        }
    }

    fn text(&self) -> Result<&R> {
        self.resource().ok_or(CLOSED)
    }

    #[cfg(any(test, feature = "fuzzing"))]
    fn verify(&self) {
        if self.options.check_invariants {
            self.chunk.assert_invariants(self.native_length);
        }
    }

    #[cfg(not(any(test, feature = "fuzzing")))]
    fn verify(&self) {}
}

impl<'a, R: TextResource + ?Sized + 'a> TextProvider<'a> for ReadOnlyProvider<'a, R> {
    fn ownership(&self) -> Ownership {
        self.ownership
    }

    fn native_length(&self) -> usize {
        self.native_length
    }

    fn access(&mut self, native_index: usize, forward: bool) -> Result<bool> {
        let text: &R = match &self.source {
            Source::Shared(shared) => &**shared,
            Source::Borrowed(borrowed) => *borrowed,
            Source::Closed => return Ok(false),
        };
        let more = self.chunk.access(
            text,
            self.native_length,
            native_index,
            forward,
            &self.options,
            self.ownership == Ownership::Owning,
        )?;
        self.verify();
        Ok(more)
    }

    fn chunk(&self) -> ChunkView<'_> {
        self.chunk
            .view(self.resource().and_then(TextResource::as_contiguous))
    }

    fn extract(&self, range: Range<usize>, dest: &mut [u16]) -> Result<usize> {
        extract_from(self.text()?, self.native_length, range, dest)
    }

    fn composed_range(&self, index: usize) -> Result<Range<usize>> {
        composed_sequence_range(self.text()?, index)
    }

    fn clone_provider(&self, deep: bool) -> Result<Box<dyn TextProvider<'a> + 'a>> {
        // Immutable text: a deep clone shares the resource as well.
        let source = match &self.source {
            Source::Shared(shared) => Source::Shared(Arc::clone(shared)),
            Source::Borrowed(borrowed) => Source::Borrowed(*borrowed),
            Source::Closed => return Err(CLOSED),
        };
        tracing::debug!(ownership = ?self.ownership, deep, "cloned provider");
        Ok(Box::new(ReadOnlyProvider {
            source,
            ownership: self.ownership,
            chunk: ChunkBuffer::owned(),
            native_length: self.native_length,
            options: self.options,
        }))
    }

    fn close(&mut self) {
        if matches!(self.source, Source::Closed) {
            return;
        }
        self.source = Source::Closed;
        self.chunk.release();
        self.native_length = 0;
        tracing::debug!(ownership = ?self.ownership, "closed provider");
    }

    fn is_closed(&self) -> bool {
        matches!(self.source, Source::Closed)
    }
}

impl<R: ?Sized> fmt::Debug for ReadOnlyProvider<'_, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadOnlyProvider")
            .field("ownership", &self.ownership)
            .field("native_length", &self.native_length)
            .field(
                "chunk",
                &(self.chunk.native_start()..self.chunk.native_limit()),
            )
            .field("caller_buffer", &self.chunk.is_caller_owned())
            .field("closed", &matches!(self.source, Source::Closed))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use alloc::{format, vec, vec::Vec};

    use super::*;

    fn utf16(s: &str) -> Vec<u16> {
        s.encode_utf16().collect()
    }

    /// Resource without contiguous storage, to force staging.
    struct Scattered(Vec<u16>);

    impl TextResource for Scattered {
        fn len_utf16(&self) -> usize {
            self.0.len()
        }

        fn read_units(&self, start: usize, dest: &mut [u16]) -> Result<()> {
            self.0.read_units(start, dest)
        }
    }

    #[test]
    fn owning_provider_serves_a_direct_chunk() {
        let text: Arc<[u16]> = utf16("hello").into();
        let mut provider = bind_immutable(Arc::clone(&text));
        assert_eq!(provider.ownership(), Ownership::Owning);
        assert!(!provider.is_writable());
        assert_eq!(provider.native_length(), 5);

        assert!(provider.access(1, true).unwrap());
        let chunk = provider.chunk();
        assert_eq!(chunk.units.as_ptr(), text.as_ptr());
        assert_eq!(chunk.native_index(), 1);
        assert_eq!(provider.map_offset_to_native(3), 3);
        assert_eq!(provider.map_native_index_to_utf16(4), 4);
    }

    #[test]
    fn staged_chunks_map_relative_to_their_start() {
        let text = Arc::new(Scattered((0..40u16).map(|i| 0x41 + i).collect()));
        let mut provider = bind_immutable_with_options(
            text,
            ProviderOptions {
                chunk_units: 10,
                whole_text_limit: 0,
                check_invariants: true,
            },
        );

        assert!(provider.access(25, true).unwrap());
        let chunk = provider.chunk();
        assert_eq!(chunk.native_range(), 25..35);
        assert_eq!(chunk.offset, 0);
        assert_eq!(provider.map_offset_to_native(4), 29);
        assert_eq!(provider.map_native_index_to_utf16(29), 4);
    }

    #[test]
    fn mutation_is_rejected() {
        let text = utf16("read only");
        let mut provider = bind_immutable(Arc::new(text.clone()));
        assert_eq!(provider.replace(0..4, &utf16("RE")), Err(ProviderError::NotWritable));
        assert_eq!(provider.copy(0..4, 9, false), Err(ProviderError::NotWritable));

        let mut buf = [0u16; 8];
        let mut borrowed = bind_borrowing(&text, &mut buf).unwrap();
        assert_eq!(borrowed.replace(0..0, &[0x41]), Err(ProviderError::NotWritable));
        assert_eq!(borrowed.resource().unwrap(), &text);
    }

    #[test]
    fn extract_truncates_and_reports_full_length() {
        let provider = bind_immutable(Arc::new(utf16("abcdef")));
        let mut dest = [0u16; 3];
        assert_eq!(provider.extract(1..6, &mut dest), Ok(5));
        assert_eq!(&dest, &utf16("bcd")[..]);
        assert_eq!(
            provider.extract(4..7, &mut dest),
            Err(ProviderError::OutOfRange {
                start: 4,
                end: 7,
                len: 6
            })
        );
    }

    #[test]
    fn borrowing_buffer_must_hold_a_pair() {
        let text = utf16("x");
        let mut buf = [0u16; 1];
        assert!(matches!(
            bind_borrowing(&text, &mut buf),
            Err(ProviderError::InvalidBinding(_))
        ));
    }

    #[test]
    fn borrowing_provider_stages_into_caller_buffer() {
        let text = Scattered(utf16("abcdefghij"));
        let mut buf = vec![0u16; 4];
        {
            let mut provider = bind_borrowing(&text, &mut buf).unwrap();
            assert!(provider.access(6, true).unwrap());
            assert_eq!(provider.chunk().native_range(), 6..10);
            provider.close();
            assert!(provider.is_closed());
        }
        assert_eq!(buf, utf16("ghij"));
    }

    #[test]
    fn borrowing_contiguous_text_still_stages_into_caller_buffer() {
        let text = utf16("0123456789");
        let mut buf = [0u16; 4];
        {
            let mut provider = bind_borrowing(&text, &mut buf).unwrap();
            assert!(provider.access(0, true).unwrap());
            let chunk = provider.chunk();
            assert!(chunk.units.len() <= 4);
            assert_eq!(chunk.native_range(), 0..4);
            assert_ne!(chunk.units.as_ptr(), text.as_ptr());
        }
        assert_eq!(buf, utf16("0123")[..]);
    }

    #[test]
    fn clone_of_borrowing_provider_gets_its_own_buffer() {
        let text = Scattered(utf16("abcdefghij"));
        let mut buf = [0u16; 2];
        let provider = bind_borrowing(&text, &mut buf).unwrap();
        let mut clone = provider.clone_provider(false).unwrap();
        assert_eq!(clone.ownership(), Ownership::Borrowing);
        assert!(clone.access(0, true).unwrap());
        assert_eq!(clone.chunk().units.len(), 10);
    }

    #[test]
    fn closed_provider_reports_invalid_binding() {
        let mut provider = bind_immutable(Arc::new(utf16("abc")));
        let clone = provider.clone_provider(true).unwrap();
        provider.close();
        provider.close();

        assert_eq!(provider.native_length(), 0);
        assert_eq!(provider.access(0, true), Ok(false));
        assert!(provider.chunk().is_empty());
        assert_eq!(provider.extract(0..0, &mut []), Err(CLOSED));
        assert_eq!(provider.composed_range(0), Err(CLOSED));
        assert!(provider.clone_provider(false).is_err());

        assert_eq!(clone.native_length(), 3);
        assert!(format!("{provider:?}").contains("closed: true"));
    }
}
