pub mod driver;
pub mod element;
pub mod frame;
pub mod metrics;
pub mod peripherals;
pub mod report;
pub mod routines;
pub mod score;
pub mod signal;
pub mod snapshot;
pub mod verify;

use std::time::Duration;


pub use driver::{Harness, RunReport};
pub use element::{ElemWidth, SignMode};
pub use frame::CallFrame;
pub use verify::{Family, Verdict};

#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    #[error("Wait on '{0}' was cancelled")]
    WaitCancelled(&'static str),
    #[error("Wait on '{0}' timed out after {1:?}")]
    WaitTimedOut(&'static str, Duration),
    #[error("Serial transmitter is closed")]
    SerialClosed,
    #[error("Unsupported element width {0}; expected 1, 2 or 4")]
    InvalidWidth(u32),
    #[error("Element {index} is outside a frame of {len} elements")]
    FrameOutOfBounds { index: usize, len: usize },
    #[error("Row of {0} elements exceeds the sort array size")]
    RowTooLong(usize),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type HarnessResult<T> = Result<T, HarnessError>;

/// Trait for observing harness events in a modular way.
pub trait HarnessObserver: std::fmt::Debug + Send + Sync {
    fn on_run_start(&self) {}
    fn on_run_stop(&self) {}
    fn on_case_start(&self, _family: Family, _case_number: u32) {}
    fn on_case_end(&self, _verdict: &Verdict) {}
    /// Fired when the case counter hits the configured break number.
    fn on_break(&self, _family: Family, _case_number: u32) {}
}

/// The routines under test.
///
/// Implementations mutate the frame in place and return the routine's
/// status: for `swap`, whether it exchanged the pair; for `sort`, how many
/// exchanges it made. The frame is only borrowed for the call.
pub trait RoutineUnderTest {
    fn swap(&mut self, frame: &mut CallFrame) -> i32;
    fn sort(&mut self, frame: &mut CallFrame) -> i32;
}

impl<R: RoutineUnderTest + ?Sized> RoutineUnderTest for Box<R> {
    fn swap(&mut self, frame: &mut CallFrame) -> i32 {
        (**self).swap(frame)
    }

    fn sort(&mut self, frame: &mut CallFrame) -> i32 {
        (**self).sort(frame)
    }
}
