use crate::frame::CallFrame;
use crate::{HarnessResult, RoutineUnderTest};
use sortlab_config::MAX_SORT_ARRAY_SIZE;
use std::ffi::c_void;

/// Status a routine reports when it could not touch the buffer.
pub const STATUS_FAULT: i32 = -1;

/// C ABI of the lab routines: `(buffer, sign, elemSize) -> i32`.
pub type RawRoutine = unsafe extern "C" fn(*mut c_void, i32, i32) -> i32;

const SCRATCH_LEN: usize = MAX_SORT_ARRAY_SIZE * 4;

/// Adapter for routines linked in through the C ABI, such as the student's
/// assembly.
///
/// The raw routines are never given the frame itself. Each call copies the
/// frame into a zero-padded scratch buffer sized for the largest possible
/// row at the widest element, and copies the frame's bytes back afterwards.
/// A routine that runs past the row's end therefore only scribbles on
/// scratch.
#[derive(Debug, Clone, Copy)]
pub struct FfiRoutine {
    swap: RawRoutine,
    sort: RawRoutine,
}

impl FfiRoutine {
    /// # Safety
    ///
    /// Both functions must be sound to call with a pointer to
    /// `MAX_SORT_ARRAY_SIZE * 4` writable bytes, must not access memory
    /// outside that buffer, and must not keep the pointer after returning.
    pub unsafe fn new(swap: RawRoutine, sort: RawRoutine) -> Self {
        Self { swap, sort }
    }

    fn call(f: RawRoutine, frame: &mut CallFrame) -> i32 {
        let mut scratch = [0u8; SCRATCH_LEN];
        let n = frame.as_bytes().len().min(SCRATCH_LEN);
        scratch[..n].copy_from_slice(&frame.as_bytes()[..n]);

        let sign = frame.sign().flag();
        let size = frame.width().bytes() as i32;
        // SAFETY: `new` requires `f` to stay inside a buffer of SCRATCH_LEN
        // bytes, which `scratch` is, and to drop the pointer on return.
        let status = unsafe { f(scratch.as_mut_ptr().cast(), sign, size) };

        frame.as_bytes_mut()[..n].copy_from_slice(&scratch[..n]);
        status
    }
}

impl RoutineUnderTest for FfiRoutine {
    fn swap(&mut self, frame: &mut CallFrame) -> i32 {
        Self::call(self.swap, frame)
    }

    fn sort(&mut self, frame: &mut CallFrame) -> i32 {
        Self::call(self.sort, frame)
    }
}

fn fault(res: HarnessResult<i32>) -> i32 {
    res.unwrap_or_else(|e| {
        tracing::warn!("Routine fault: {}", e);
        STATUS_FAULT
    })
}

type Compare = fn(&CallFrame, usize, usize) -> HarnessResult<bool>;

fn swap_pair(frame: &mut CallFrame, gt: Compare) -> HarnessResult<i32> {
    if gt(frame, 0, 1)? {
        frame.exchange(0, 1)?;
        Ok(1)
    } else {
        Ok(0)
    }
}

fn bubble_sort(frame: &mut CallFrame, gt: Compare) -> HarnessResult<i32> {
    let mut swaps = 0;
    for end in (1..frame.len()).rev() {
        let mut exchanged = false;
        for i in 0..end {
            if gt(frame, i, i + 1)? {
                frame.exchange(i, i + 1)?;
                swaps += 1;
                exchanged = true;
            }
        }
        if !exchanged {
            break;
        }
    }
    Ok(swaps)
}

/// Known-good implementation of both routines.
///
/// Swap returns `1` when it exchanged the pair and `0` otherwise. Sort is a
/// bubble sort and returns the number of exchanges it made.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReferenceRoutine;

impl ReferenceRoutine {
    fn greater(frame: &CallFrame, a: usize, b: usize) -> HarnessResult<bool> {
        Ok(frame.value(a)? > frame.value(b)?)
    }
}

impl RoutineUnderTest for ReferenceRoutine {
    fn swap(&mut self, frame: &mut CallFrame) -> i32 {
        fault(swap_pair(frame, Self::greater))
    }

    fn sort(&mut self, frame: &mut CallFrame) -> i32 {
        fault(bubble_sort(frame, Self::greater))
    }
}

/// Leaves the buffer alone and reports no work.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityRoutine;

impl RoutineUnderTest for IdentityRoutine {
    fn swap(&mut self, _frame: &mut CallFrame) -> i32 {
        0
    }

    fn sort(&mut self, _frame: &mut CallFrame) -> i32 {
        0
    }
}

/// Compares raw bit patterns whatever the sign flag says, the usual way a
/// first attempt goes wrong on negative inputs.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsignedOnlyRoutine;

impl UnsignedOnlyRoutine {
    fn greater(frame: &CallFrame, a: usize, b: usize) -> HarnessResult<bool> {
        Ok(frame.raw(a)? > frame.raw(b)?)
    }
}

impl RoutineUnderTest for UnsignedOnlyRoutine {
    fn swap(&mut self, frame: &mut CallFrame) -> i32 {
        fault(swap_pair(frame, Self::greater))
    }

    fn sort(&mut self, frame: &mut CallFrame) -> i32 {
        fault(bubble_sort(frame, Self::greater))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{ElemWidth, SignMode};

    #[test]
    fn test_reference_swap_status() {
        let mut frame = CallFrame::from_values(&[2, 1], ElemWidth::Word, SignMode::Signed);
        assert_eq!(ReferenceRoutine.swap(&mut frame), 1);
        assert_eq!(frame.values(), vec![1, 2]);
        assert_eq!(ReferenceRoutine.swap(&mut frame), 0);
    }

    #[test]
    fn test_reference_swap_on_short_frame_faults() {
        let mut frame = CallFrame::from_values(&[2], ElemWidth::Word, SignMode::Signed);
        assert_eq!(ReferenceRoutine.swap(&mut frame), STATUS_FAULT);
        assert_eq!(frame.values(), vec![2]);
    }

    #[test]
    fn test_reference_sort_counts_inversions() {
        let mut frame = CallFrame::from_values(&[4, 3, 2, 1], ElemWidth::Half, SignMode::Signed);
        assert_eq!(ReferenceRoutine.sort(&mut frame), 6);
        assert_eq!(frame.values(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_unsigned_only_misorders_negatives() {
        let mut frame = CallFrame::from_values(&[-1, 1], ElemWidth::Byte, SignMode::Signed);
        assert_eq!(UnsignedOnlyRoutine.swap(&mut frame), 1);
        assert_eq!(frame.values(), vec![1, -1]);
    }

    unsafe extern "C" fn byte_swap(buf: *mut c_void, _sign: i32, size: i32) -> i32 {
        assert_eq!(size, 1);
        let bytes = std::slice::from_raw_parts_mut(buf.cast::<u8>(), 2);
        if bytes[0] > bytes[1] {
            bytes.swap(0, 1);
            1
        } else {
            0
        }
    }

    unsafe extern "C" fn fill_all(buf: *mut c_void, _sign: i32, _size: i32) -> i32 {
        let bytes = std::slice::from_raw_parts_mut(buf.cast::<u8>(), SCRATCH_LEN);
        bytes.fill(0x5A);
        SCRATCH_LEN as i32
    }

    #[test]
    fn test_ffi_swap() {
        let mut routine = unsafe { FfiRoutine::new(byte_swap, fill_all) };
        let mut frame = CallFrame::from_values(&[9, 3], ElemWidth::Byte, SignMode::Unsigned);
        assert_eq!(routine.swap(&mut frame), 1);
        assert_eq!(frame.values(), vec![3, 9]);
    }

    #[test]
    fn test_ffi_writes_stay_in_scratch() {
        let mut routine = unsafe { FfiRoutine::new(byte_swap, fill_all) };
        let mut frame = CallFrame::from_values(&[1, 2, 3], ElemWidth::Half, SignMode::Unsigned);
        assert_eq!(routine.sort(&mut frame), SCRATCH_LEN as i32);
        assert_eq!(frame.len(), 3);
        assert_eq!(frame.values(), vec![0x5A5A; 3]);
    }
}
