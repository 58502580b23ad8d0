//! Text sent over the serial link.
//!
//! Every message is plain ASCII terminated with `\r\n`, matching the layout
//! lab graders already parse by eye.

use crate::element::{truncate, ElemWidth, SignMode};
use crate::score::{FamilyScore, FinalScore};
use crate::verify::{AuxCheck, Verdict};
use sortlab_config::AuxiliaryPolicy;

pub const IDLE_BANNER: &str = "========= Going into idle mode; display will not scroll!\r\n";

fn join(values: &[i64]) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn join_hex(values: &[i64]) -> String {
    values
        .iter()
        .map(|&v| format!("{:#010X}", v as u32))
        .collect::<Vec<_>>()
        .join(", ")
}

fn verdict_word(passed: bool) -> &'static str {
    if passed {
        "PASS"
    } else {
        "FAIL"
    }
}

/// Per-case result block.
pub fn case_report(v: &Verdict, policy: AuxiliaryPolicy) -> String {
    let aux_line = match v.aux {
        AuxCheck::SwapStatus {
            reported,
            expected,
            zero_element,
        } => {
            let alt = if zero_element { " or -1" } else { "" };
            format!("swap result:       {} (expected {}{})", reported, expected, alt)
        }
        AuxCheck::SwapCount { reported, min, max } => {
            format!("swaps reported:    {} (plausible {}..={})", reported, min, max)
        }
    };
    let aux_note = match (v.aux.holds(), policy) {
        (true, _) => "",
        (false, AuxiliaryPolicy::Informational) => " [informational]",
        (false, AuxiliaryPolicy::Enforced) => " [MISMATCH]",
    };

    format!(
        "========= {} Test Case {} (table row {})\r\n\
         sign: {}  elemSize: {}\r\n\
         inputs:            {}\r\n\
         expected outputs:  {}\r\n\
         outputs from asm:  {}\r\n\
         {}{}\r\n\
         RESULT: {}\r\n\
         \r\n",
        v.family.routine_name(),
        v.case.number,
        v.case.table_index,
        v.sign.flag(),
        v.width,
        join_hex(&v.inputs),
        join(&v.expected),
        join(&v.actual),
        aux_line,
        aux_note,
        verdict_word(v.passed),
    )
}

/// Dump printed ahead of swap verification when verbose debugging is on.
pub fn swap_debug_block(
    sign: SignMode,
    width: ElemWidth,
    width_index: usize,
    original: &[i64; 2],
    actual: &[i64],
) -> String {
    // 32-bit signed, as the firmware's %ld on int32_t.
    let raw: Vec<String> = actual
        .iter()
        .map(|&v| (truncate(v, width) as i32).to_string())
        .collect();
    format!(
        "========= Debug:\r\n\
         sign:      {}\r\n\
         elemIndex: {}\r\n\
         elemSize:  {}\r\n\
         unsorted inputs:         {}, {}\r\n\
         sorted outputs from asm: {}\r\n\
         \r\n",
        sign.flag(),
        width_index,
        width,
        original[0] as i32,
        original[1] as i32,
        raw.join(", "),
    )
}

pub fn family_summary(score: &FamilyScore) -> String {
    format!(
        "========= {} Tests Summary\r\n\
         tests passed: {} \r\n\
         tests failed: {} \r\n\
         total tests:  {} \r\n\
         \r\n",
        score.family.routine_name(),
        score.passed,
        score.failed,
        score.total,
    )
}

pub fn final_report(student: &str, f: &FinalScore) -> String {
    format!(
        "========= {}: asmSort.s ALL TESTS COMPLETE!\r\n\
         swap tests passed: {} \r\n\
         swap tests failed: {} \r\n\
         swap total tests:  {} \r\n\
         swap score: {}/{} points \r\n\r\n\
         sort tests passed: {} \r\n\
         sort tests failed: {} \r\n\
         sort total tests:  {} \r\n\
         sort score: {}/{} points \r\n\r\n\
         FINAL SCORE: {}\r\n\r\n",
        student,
        f.swap.passed,
        f.swap.failed,
        f.swap.total,
        f.swap_points,
        f.swap_points_max,
        f.sort.passed,
        f.sort.failed,
        f.sort.total,
        f.sort_points,
        f.sort_points_max,
        f.points(),
    )
}

/// Carriage return only, so the terminal overwrites the line in place.
pub fn idle_line(counter: u64) -> String {
    format!("========= Idle Cycle Counter: {:6}\r", counter)
}
