use alloc::{boxed::Box, rc::Rc, sync::Arc, vec, vec::Vec};
use core::cell::{Cell, RefCell};

use super::{Scattered, utf16};
use crate::{
    Ownership, ProviderError, ProviderOptions, ReadOnlyProvider, Result, TextProvider,
    TextResource, bind_borrowing, bind_immutable, bind_immutable_with_options, bind_mutable,
    composed_sequence_range,
};

/// Counts `read_units` calls so tests can tell staging from reuse.
struct Counting {
    units: Vec<u16>,
    reads: Cell<usize>,
}

impl TextResource for Counting {
    fn len_utf16(&self) -> usize {
        self.units.len()
    }

    fn read_units(&self, start: usize, dest: &mut [u16]) -> Result<()> {
        self.reads.set(self.reads.get() + 1);
        self.units.read_units(start, dest)
    }
}

#[test]
fn surrogate_pair_then_letter() {
    let text = utf16("\u{1F600}a");
    assert_eq!(text.len(), 3);
    assert_eq!(composed_sequence_range(&text, 0), Ok(0..2));
    assert_eq!(composed_sequence_range(&text, 1), Ok(0..2));
    assert_eq!(composed_sequence_range(&text, 2), Ok(2..3));

    let provider = bind_immutable(Arc::new(text));
    assert_eq!(provider.composed_range(1), Ok(0..2));
    assert_eq!(provider.composed_range(2), Ok(2..3));
}

#[test]
fn hello_replace_el_with_ey() {
    let text = Rc::new(RefCell::new(utf16("hello")));
    let mut provider = bind_mutable(Rc::clone(&text)).unwrap();
    assert_eq!(provider.native_length(), 5);

    assert_eq!(provider.replace(1..3, &utf16("EY")), Ok(0));
    assert_eq!(*text.borrow(), utf16("hEYlo"));
    assert_eq!(provider.native_length(), 5);
}

#[test]
fn composed_range_at_length_is_out_of_range() {
    let text = utf16("abc");
    assert_eq!(
        composed_sequence_range(&text, 3),
        Err(ProviderError::OutOfRange {
            start: 3,
            end: 4,
            len: 3
        })
    );
}

#[test]
fn read_only_modes_reject_every_mutation() {
    let text = utf16("immutable");
    let mut owning = bind_immutable(Arc::new(text.clone()));
    let mut buffer = [0u16; 4];
    let mut borrowing = bind_borrowing(&text, &mut buffer).unwrap();

    for provider in [
        &mut owning as &mut dyn TextProvider<'_>,
        &mut borrowing as &mut dyn TextProvider<'_>,
    ] {
        assert!(!provider.is_writable());
        assert_eq!(provider.replace(0..2, &[]), Err(ProviderError::NotWritable));
        assert_eq!(provider.copy(0..2, 5, true), Err(ProviderError::NotWritable));
        assert_eq!(provider.native_length(), 9);
    }
    assert_eq!(owning.ownership(), Ownership::Owning);
    assert_eq!(borrowing.ownership(), Ownership::Borrowing);
    assert_eq!(text, utf16("immutable"));
}

#[test]
fn access_inside_the_chunk_does_not_restage() {
    let text = Arc::new(Counting {
        units: (0..64u16).map(|i| 0x41 + i % 26).collect(),
        reads: Cell::new(0),
    });
    let mut provider = bind_immutable_with_options(
        Arc::clone(&text),
        ProviderOptions {
            chunk_units: 16,
            whole_text_limit: 0,
            check_invariants: true,
        },
    );

    assert!(provider.access(10, true).unwrap());
    assert_eq!(provider.chunk().native_range(), 10..26);
    let staged = text.reads.get();
    assert!(staged > 0);

    for index in [11, 20, 25, 10] {
        assert!(provider.access(index, true).unwrap());
        assert_eq!(provider.chunk().native_index(), index);
    }
    assert!(provider.access(26, false).unwrap());
    assert_eq!(text.reads.get(), staged);

    assert!(provider.access(26, true).unwrap());
    assert!(text.reads.get() > staged);
}

#[test]
fn borrowing_buffer_receives_the_chunk() {
    let text = Scattered(utf16("0123456789"));
    let mut buffer = vec![0u16; 3];
    {
        let mut provider = bind_borrowing(&text, &mut buffer).unwrap();
        assert!(provider.access(4, true).unwrap());
        assert_eq!(provider.chunk().native_range(), 4..7);
    }
    assert_eq!(buffer, utf16("456"));
}

#[test]
fn end_of_text_sentinels() {
    let mut provider = bind_immutable(Arc::new(utf16("edge")));
    assert!(!provider.access(4, true).unwrap());
    assert_eq!(provider.chunk().native_index(), 4);
    assert!(provider.access(4, false).unwrap());
    assert!(!provider.access(0, false).unwrap());
    assert!(provider.access(0, true).unwrap());
    assert!(matches!(
        provider.access(5, true),
        Err(ProviderError::OutOfRange { start: 5, .. })
    ));
}

#[test]
fn empty_text_has_no_chunks() {
    let mut provider = bind_immutable(Arc::new(Scattered(Vec::new())));
    assert!(!provider.access(0, true).unwrap());
    assert!(!provider.access(0, false).unwrap());
    assert!(provider.chunk().is_empty());
    assert_eq!(provider.extract(0..0, &mut []), Ok(0));
}

#[test]
fn owning_providers_are_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ReadOnlyProvider<'static, Vec<u16>>>();
    assert_send_sync::<ReadOnlyProvider<'static, [u16]>>();
}

#[test]
fn boxed_providers_forward_every_operation() {
    let text = Rc::new(RefCell::new(utf16("boxed")));
    let mut boxed: Box<dyn TextProvider<'static>> =
        Box::new(bind_mutable(Rc::clone(&text)).unwrap());

    assert!(boxed.is_writable());
    assert_eq!(boxed.replace(0..1, &utf16("B")), Ok(0));
    boxed.copy(0..1, 5, false).unwrap();
    assert_eq!(*text.borrow(), utf16("BoxedB"));
    assert!(boxed.access(3, true).unwrap());
    assert_eq!(boxed.map_offset_to_native(2), 2);
    assert_eq!(boxed.map_native_index_to_utf16(4), 4);

    let clone = boxed.clone_provider(false).unwrap();
    boxed.close();
    assert!(boxed.is_closed());
    assert!(!clone.is_closed());
    assert_eq!(clone.native_length(), 6);
}
