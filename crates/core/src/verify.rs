//! Verification of routine output.
//!
//! A verdict compares the routine's buffer against the non-decreasing
//! ordering of the original row, after both have been truncated to the
//! active width and read under the active sign mode. The routine's return
//! value is checked as well; whether that check can fail a case is decided
//! by the [`AuxiliaryPolicy`].

use crate::element::{normalize, ElemWidth, SignMode};
use crate::frame::CallFrame;
use serde::{Deserialize, Serialize};
use sortlab_config::AuxiliaryPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Family {
    Swap,
    Sort,
}

impl Family {
    /// Name of the routine exercised by this family.
    pub fn routine_name(self) -> &'static str {
        match self {
            Family::Swap => "asmSwap",
            Family::Sort => "asmSort",
        }
    }
}

/// Position of a case within its family's enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseId {
    /// Running counter across every (row, sign, width) of the family.
    pub number: u32,
    /// Row of the corpus table.
    pub table_index: usize,
}

/// Check on the routine's return value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AuxCheck {
    /// `1` when the pair needed exchanging, `0` otherwise. A pair holding a
    /// zero may also report `-1`, the end-of-list status of zero-terminated
    /// lab arrays.
    SwapStatus {
        reported: i32,
        expected: i32,
        #[serde(default)]
        zero_element: bool,
    },
    /// Reported swap count against the range any exchange-based sort can hit.
    SwapCount { reported: i32, min: u32, max: u32 },
}

impl AuxCheck {
    pub fn holds(&self) -> bool {
        match *self {
            AuxCheck::SwapStatus {
                reported,
                expected,
                zero_element,
            } => reported == expected || (zero_element && reported == -1),
            AuxCheck::SwapCount { reported, min, max } => {
                reported >= 0 && (min..=max).contains(&(reported as u32))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub family: Family,
    pub case: CaseId,
    pub sign: SignMode,
    pub width: ElemWidth,
    /// Canonical table values, before truncation.
    pub inputs: Vec<i64>,
    pub expected: Vec<i64>,
    pub actual: Vec<i64>,
    pub aux: AuxCheck,
    pub values_match: bool,
    pub passed: bool,
}

/// The row as the routine should leave it.
pub fn expected_order(row: &[i64], width: ElemWidth, sign: SignMode) -> Vec<i64> {
    let mut out: Vec<i64> = row.iter().map(|&v| normalize(v, width, sign)).collect();
    out.sort_unstable();
    out
}

/// Inclusive range of plausible swap counts for sorting `row`.
///
/// Each exchange fixes at most two misplaced slots, which gives the lower
/// bound. An exchange of an out-of-order pair removes at least one
/// inversion, so no such sort needs more swaps than there are inversions.
pub fn swap_count_bounds(row: &[i64], width: ElemWidth, sign: SignMode) -> (u32, u32) {
    let values: Vec<i64> = row.iter().map(|&v| normalize(v, width, sign)).collect();
    let sorted = expected_order(row, width, sign);

    let misplaced = values.iter().zip(&sorted).filter(|(a, b)| a != b).count() as u32;

    let mut inversions = 0u32;
    for i in 0..values.len() {
        for j in i + 1..values.len() {
            if values[i] > values[j] {
                inversions += 1;
            }
        }
    }

    (misplaced.div_ceil(2), inversions)
}

fn decide(values_match: bool, aux: &AuxCheck, policy: AuxiliaryPolicy) -> bool {
    match policy {
        AuxiliaryPolicy::Informational => values_match,
        AuxiliaryPolicy::Enforced => values_match && aux.holds(),
    }
}

pub fn verify_swap(
    case: CaseId,
    original: &[i64; 2],
    frame: &CallFrame,
    status: i32,
    policy: AuxiliaryPolicy,
) -> Verdict {
    let (width, sign) = (frame.width(), frame.sign());
    let expected = expected_order(original, width, sign);
    let actual = frame.values();

    let (a, b) = (
        normalize(original[0], width, sign),
        normalize(original[1], width, sign),
    );
    let aux = AuxCheck::SwapStatus {
        reported: status,
        expected: i32::from(a > b),
        zero_element: a == 0 || b == 0,
    };

    let values_match = actual == expected;
    let passed = decide(values_match, &aux, policy);

    Verdict {
        family: Family::Swap,
        case,
        sign,
        width,
        inputs: original.to_vec(),
        expected,
        actual,
        aux,
        values_match,
        passed,
    }
}

pub fn verify_sort(
    case: CaseId,
    original: &[i64],
    frame: &CallFrame,
    swaps: i32,
    policy: AuxiliaryPolicy,
) -> Verdict {
    let (width, sign) = (frame.width(), frame.sign());
    let expected = expected_order(original, width, sign);
    let actual = frame.values();

    let (min, max) = swap_count_bounds(original, width, sign);
    let aux = AuxCheck::SwapCount {
        reported: swaps,
        min,
        max,
    };

    let values_match = actual == expected;
    let passed = decide(values_match, &aux, policy);

    Verdict {
        family: Family::Sort,
        case,
        sign,
        width,
        inputs: original.to_vec(),
        expected,
        actual,
        aux,
        values_match,
        passed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: CaseId = CaseId {
        number: 0,
        table_index: 0,
    };

    fn frame_of(values: &[i64], width: ElemWidth, sign: SignMode) -> CallFrame {
        CallFrame::from_values(values, width, sign)
    }

    #[test]
    fn test_swap_already_ordered_half_unsigned() {
        let original = [0x0203, 0x0302];
        let frame = frame_of(&original, ElemWidth::Half, SignMode::Unsigned);
        let v = verify_swap(ID, &original, &frame, 0, AuxiliaryPolicy::Enforced);
        assert!(v.passed);
        assert_eq!(v.expected, vec![0x0203, 0x0302]);
    }

    #[test]
    fn test_swap_byte_width_reorders_low_bytes() {
        // Low bytes are 0x03 and 0x02, so at width 1 the pair must swap.
        let original = [0x0203, 0x0302];
        let expected = expected_order(&original, ElemWidth::Byte, SignMode::Unsigned);
        assert_eq!(expected, vec![2, 3]);

        let untouched = frame_of(&original, ElemWidth::Byte, SignMode::Unsigned);
        let v = verify_swap(ID, &original, &untouched, 0, AuxiliaryPolicy::Informational);
        assert!(!v.passed);
        assert_eq!(
            v.aux,
            AuxCheck::SwapStatus {
                reported: 0,
                expected: 1,
                zero_element: false,
            }
        );
    }

    #[test]
    fn test_swap_signed_word_negative_first() {
        let original = [0x8000_0001, 0x0000_0001];
        let frame = frame_of(&original, ElemWidth::Word, SignMode::Signed);
        let v = verify_swap(ID, &original, &frame, 0, AuxiliaryPolicy::Enforced);
        assert!(v.passed);
        assert_eq!(v.actual, vec![-0x7FFF_FFFF, 1]);

        // Unsigned, the same pair is out of order.
        let frame = frame_of(&original, ElemWidth::Word, SignMode::Unsigned);
        let v = verify_swap(ID, &original, &frame, 0, AuxiliaryPolicy::Informational);
        assert!(!v.passed);
    }

    #[test]
    fn test_swap_equal_values_expect_zero_status() {
        let original = [0, 0];
        let frame = frame_of(&original, ElemWidth::Word, SignMode::Signed);
        let v = verify_swap(ID, &original, &frame, 0, AuxiliaryPolicy::Enforced);
        assert!(v.passed);

        let v = verify_swap(ID, &original, &frame, 1, AuxiliaryPolicy::Enforced);
        assert!(!v.passed);
        assert!(v.values_match);
    }

    #[test]
    fn test_sort_scenario_byte_unsigned() {
        let original = [9, 8, 7, 6, 0, 1, 2, 3, 4, 5, 6];
        let sorted = [0, 1, 2, 3, 4, 5, 6, 6, 7, 8, 9];
        let frame = frame_of(&sorted, ElemWidth::Byte, SignMode::Unsigned);
        let v = verify_sort(ID, &original, &frame, 20, AuxiliaryPolicy::Informational);
        assert!(v.passed);
        assert_eq!(v.expected, sorted.to_vec());
    }

    #[test]
    fn test_sort_all_zero_passes_with_any_count() {
        let original = [0i64; 11];
        let frame = frame_of(&original, ElemWidth::Half, SignMode::Signed);
        for swaps in [0, 3, 999, -1] {
            let v = verify_sort(ID, &original, &frame, swaps, AuxiliaryPolicy::Informational);
            assert!(v.passed);
        }
        assert_eq!(swap_count_bounds(&original, ElemWidth::Half, SignMode::Signed), (0, 0));
    }

    #[test]
    fn test_swap_end_of_list_status_on_zero_element() {
        let original = [0, 7];
        let frame = frame_of(&original, ElemWidth::Word, SignMode::Signed);
        let v = verify_swap(ID, &original, &frame, -1, AuxiliaryPolicy::Enforced);
        assert!(v.passed);
        let v = verify_swap(ID, &original, &frame, 0, AuxiliaryPolicy::Enforced);
        assert!(v.passed);

        // The low byte of 0x100 is zero, so at width 1 this pair ends the list.
        let original = [0x100, 0x5];
        let frame = frame_of(&original, ElemWidth::Byte, SignMode::Unsigned);
        let v = verify_swap(ID, &original, &frame, -1, AuxiliaryPolicy::Enforced);
        assert!(v.passed);

        // Without a zero, -1 is not a valid status.
        let original = [3, 7];
        let frame = frame_of(&original, ElemWidth::Word, SignMode::Signed);
        let v = verify_swap(ID, &original, &frame, -1, AuxiliaryPolicy::Enforced);
        assert!(v.values_match);
        assert!(!v.passed);
    }

    #[test]
    fn test_sort_row_equal_after_truncation_passes_any_permutation() {
        let original = [0x300, 0x100, 0x200, 0x1_0000_0000];
        let permuted = [0x100, 0x300, 0x1_0000_0000, 0x200];
        for sign in SignMode::ALL {
            assert_eq!(swap_count_bounds(&original, ElemWidth::Byte, sign), (0, 0));

            let frame = frame_of(&permuted, ElemWidth::Byte, sign);
            let v = verify_sort(ID, &original, &frame, 7, AuxiliaryPolicy::Informational);
            assert!(v.passed);
            assert_eq!(v.expected, vec![0; 4]);
            assert_eq!(v.actual, vec![0; 4]);
        }
    }

    #[test]
    fn test_sort_one_element_out_of_place_fails() {
        let original = [3, 1, 2];
        let frame = frame_of(&[1, 3, 2], ElemWidth::Word, SignMode::Unsigned);
        let v = verify_sort(ID, &original, &frame, 1, AuxiliaryPolicy::Informational);
        assert!(!v.passed);
        assert_eq!(v.expected, vec![1, 2, 3]);
        assert_eq!(v.actual, vec![1, 3, 2]);
    }

    #[test]
    fn test_swap_count_bounds() {
        // One cycle of three: two exchanges at minimum, two inversions.
        assert_eq!(
            swap_count_bounds(&[3, 1, 2], ElemWidth::Word, SignMode::Unsigned),
            (2, 2)
        );
        // Reversed four: all slots misplaced, six inversions.
        assert_eq!(
            swap_count_bounds(&[4, 3, 2, 1], ElemWidth::Word, SignMode::Unsigned),
            (2, 6)
        );
        // -1 is the largest unsigned byte but the smallest signed one.
        assert_eq!(
            swap_count_bounds(&[-1, 0], ElemWidth::Byte, SignMode::Unsigned),
            (1, 1)
        );
        assert_eq!(
            swap_count_bounds(&[-1, 0], ElemWidth::Byte, SignMode::Signed),
            (0, 0)
        );
    }

    #[test]
    fn test_enforced_policy_rejects_implausible_count() {
        let original = [2, 1];
        let frame = frame_of(&[1, 2], ElemWidth::Word, SignMode::Signed);
        let lenient = verify_sort(ID, &original, &frame, 5, AuxiliaryPolicy::Informational);
        let strict = verify_sort(ID, &original, &frame, 5, AuxiliaryPolicy::Enforced);
        assert!(lenient.passed);
        assert!(!strict.passed);
        assert!(strict.values_match);
        assert!(verify_sort(ID, &original, &frame, 1, AuxiliaryPolicy::Enforced).passed);
    }
}
