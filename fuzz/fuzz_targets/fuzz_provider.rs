#![no_main]
use std::{cell::RefCell, rc::Rc};

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use textbridge::{
    ProviderOptions, TextProvider, bind_borrowing, bind_mutable_with_options,
    composed_sequence_range,
};

#[derive(Debug, Arbitrary)]
enum Op {
    Access { index: u16, forward: bool },
    Extract { start: u16, end: u16, capacity: u8 },
    Replace { start: u16, end: u16, units: Vec<u16> },
    Copy { start: u16, end: u16, dest: u16, move_text: bool },
    Composed { index: u16 },
}

#[derive(Debug, Arbitrary)]
struct Input {
    text: Vec<u16>,
    chunk_units: u8,
    whole_text_limit: u8,
    borrow_capacity: u8,
    ops: Vec<Op>,
}

/// Maps a raw fuzzer index onto `[0, len + 1]`, so indices one past the
/// end and beyond it are both reachable.
fn index(raw: u16, len: usize) -> usize {
    usize::from(raw) % (len + 2)
}

fn span(start: u16, end: u16, len: usize) -> std::ops::Range<usize> {
    index(start, len)..index(end, len)
}

fn valid(range: &std::ops::Range<usize>, len: usize) -> bool {
    range.start <= range.end && range.end <= len
}

fn run(input: Input) {
    let options = ProviderOptions {
        chunk_units: usize::from(input.chunk_units),
        whole_text_limit: usize::from(input.whole_text_limit),
        check_invariants: true,
    };
    let shared = Rc::new(RefCell::new(input.text.clone()));
    let mut provider = bind_mutable_with_options(Rc::clone(&shared), options).unwrap();
    let mut model = input.text;

    for op in input.ops {
        let len = model.len();
        match op {
            Op::Access { index: raw, forward } => {
                let at = index(raw, len);
                match provider.access(at, forward) {
                    Ok(found) => {
                        assert_eq!(found, if forward { at < len } else { at > 0 });
                        if found {
                            let chunk = provider.chunk();
                            assert_eq!(chunk.native_index(), at);
                            assert_eq!(chunk.units, &model[chunk.native_range()]);
                        }
                    }
                    Err(_) => assert!(at > len),
                }
            }
            Op::Extract { start, end, capacity } => {
                let range = span(start, end, len);
                let mut dest = vec![0u16; usize::from(capacity)];
                match provider.extract(range.clone(), &mut dest) {
                    Ok(full) => {
                        assert_eq!(full, range.len());
                        let copied = full.min(dest.len());
                        assert_eq!(&dest[..copied], &model[range.start..range.start + copied]);
                    }
                    Err(_) => assert!(!valid(&range, len)),
                }
            }
            Op::Replace { start, end, units } => {
                let range = span(start, end, len);
                match provider.replace(range.clone(), &units) {
                    Ok(delta) => {
                        model.splice(range, units);
                        let grown = isize::try_from(model.len()).unwrap() - isize::try_from(len).unwrap();
                        assert_eq!(grown, delta);
                    }
                    Err(_) => assert!(!valid(&range, len)),
                }
            }
            Op::Copy { start, end, dest, move_text } => {
                let range = span(start, end, len);
                let dest = index(dest, len);
                let ok = valid(&range, len)
                    && dest <= len
                    && !(range.start < dest && dest < range.end);
                match provider.copy(range.clone(), dest, move_text) {
                    Ok(()) => {
                        assert!(ok);
                        let segment = model[range.clone()].to_vec();
                        if !move_text {
                            model.splice(dest..dest, segment);
                        } else if dest <= range.start {
                            model.drain(range);
                            model.splice(dest..dest, segment);
                        } else {
                            model.splice(dest..dest, segment);
                            model.drain(range);
                        }
                    }
                    Err(_) => assert!(!ok),
                }
            }
            Op::Composed { index: raw } => {
                let at = index(raw, len);
                match provider.composed_range(at) {
                    Ok(found) => {
                        assert!(found.start <= at && at < found.end && found.end <= len);
                        assert_eq!(composed_sequence_range(&model, at).unwrap(), found);
                    }
                    Err(_) => assert!(at >= len),
                }
            }
        }
        assert_eq!(provider.native_length(), model.len());
        assert_eq!(*shared.borrow(), model);
    }

    // A borrowing walk over the final text sees the same units.
    let mut buffer = vec![0u16; usize::from(input.borrow_capacity).max(2)];
    let mut reader = bind_borrowing(&model, &mut buffer).unwrap();
    let mut seen = Vec::new();
    let mut at = 0;
    while reader.access(at, true).unwrap() {
        let chunk = reader.chunk();
        seen.extend_from_slice(&chunk.units[chunk.offset..]);
        at = chunk.native_limit();
    }
    assert_eq!(seen, model);
}

fuzz_target!(|input: Input| run(input));
