mod property_locator;
mod scenarios;

use alloc::{boxed::Box, vec::Vec};

use quickcheck::{Arbitrary, Gen};

use crate::{Result, TextResource};

/// Pieces random texts are assembled from: ASCII, combining marks, surrogate
/// pairs, lone surrogates and a Devanagari spacing mark.
const PALETTE: &[&[u16]] = &[
    &[0x0061],
    &[0x0062],
    &[0x0020],
    &[0x0301],
    &[0x0323],
    &[0xD83D, 0xDE00],
    &[0xD835, 0xDC00],
    &[0xD800],
    &[0xDC00],
    &[0x0915],
    &[0x093F],
];

pub(crate) fn utf16(s: &str) -> Vec<u16> {
    s.encode_utf16().collect()
}

/// Expands palette selectors into code units.
pub(crate) fn from_palette(selectors: &[u8]) -> Vec<u16> {
    selectors
        .iter()
        .flat_map(|&b| PALETTE[usize::from(b) % PALETTE.len()].iter().copied())
        .collect()
}

/// Random text that exercises sequence boundaries.
#[derive(Clone, Debug)]
pub(crate) struct Sample(pub Vec<u16>);

impl Arbitrary for Sample {
    fn arbitrary(g: &mut Gen) -> Self {
        Self(from_palette(&Vec::<u8>::arbitrary(g)))
    }

    fn shrink(&self) -> Box<dyn Iterator<Item = Self>> {
        Box::new(self.0.shrink().map(Sample))
    }
}

/// A resource without contiguous storage, so providers have to stage copies.
#[derive(Debug)]
pub(crate) struct Scattered(pub Vec<u16>);

impl TextResource for Scattered {
    fn len_utf16(&self) -> usize {
        self.0.len()
    }

    fn read_units(&self, start: usize, dest: &mut [u16]) -> Result<()> {
        self.0.read_units(start, dest)
    }
}

pub(crate) fn quickcheck_tests() -> u64 {
    #[cfg(not(miri))]
    let tests = if is_ci::cached() { 10_000 } else { 1_000 };
    #[cfg(miri)]
    let tests = 10;
    tests
}
