use quickcheck::{QuickCheck, TestResult};

use super::{Sample, quickcheck_tests};
use crate::{ProviderError, composed_sequence_range, is_high_surrogate, is_low_surrogate};

/// Property: every index lies inside its sequence, the sequence stays within
/// the text, and a unit that neither pairs nor takes marks is one unit wide.
#[test]
fn locator_bounds_quickcheck() {
    #[allow(clippy::needless_pass_by_value)]
    fn prop(sample: Sample) -> TestResult {
        let text = sample.0;
        let len = text.len();
        for index in 0..len {
            let Ok(range) = composed_sequence_range(&text, index) else {
                return TestResult::failed();
            };
            if !(range.start <= index && index < range.end && range.end <= len) {
                return TestResult::failed();
            }
            if range.start > 0 && is_high_surrogate(text[range.start - 1]) && is_low_surrogate(text[range.start]) {
                return TestResult::failed();
            }
            if range.end < len && is_high_surrogate(text[range.end - 1]) && is_low_surrogate(text[range.end]) {
                return TestResult::failed();
            }
        }
        TestResult::from_bool(matches!(
            composed_sequence_range(&text, len),
            Err(ProviderError::OutOfRange { .. })
        ))
    }

    QuickCheck::new()
        .tests(quickcheck_tests())
        .quickcheck(prop as fn(Sample) -> TestResult);
}

/// Property: querying any index of a sequence returns the same sequence.
#[test]
fn locator_idempotence_quickcheck() {
    #[allow(clippy::needless_pass_by_value)]
    fn prop(sample: Sample) -> TestResult {
        let text = sample.0;
        let mut index = 0;
        while index < text.len() {
            let Ok(range) = composed_sequence_range(&text, index) else {
                return TestResult::failed();
            };
            if range.start != index {
                return TestResult::failed();
            }
            for j in range.clone() {
                if composed_sequence_range(&text, j) != Ok(range.clone()) {
                    return TestResult::failed();
                }
            }
            index = range.end;
        }
        TestResult::passed()
    }

    QuickCheck::new()
        .tests(quickcheck_tests())
        .quickcheck(prop as fn(Sample) -> TestResult);
}

#[test]
fn isolated_units_are_one_wide() {
    // Neither 'a' nor a lone surrogate pairs with or takes marks from 'b'.
    for text in [[0x61u16, 0x62], [0xD800, 0x62], [0xDC00, 0x62]] {
        assert_eq!(composed_sequence_range(&text[..], 0), Ok(0..1));
        assert_eq!(composed_sequence_range(&text[..], 1), Ok(1..2));
    }
}
