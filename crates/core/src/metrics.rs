use crate::verify::{Family, Verdict};
use crate::HarnessObserver;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Instant;

#[derive(Debug)]
pub struct HarnessMetrics {
    case_count: AtomicU64,
    pass_count: AtomicU64,
    fail_count: AtomicU64,
    break_count: AtomicU64,
    start_time: Mutex<Instant>,
}

impl Default for HarnessMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl HarnessMetrics {
    pub fn new() -> Self {
        Self {
            case_count: AtomicU64::new(0),
            pass_count: AtomicU64::new(0),
            fail_count: AtomicU64::new(0),
            break_count: AtomicU64::new(0),
            start_time: Mutex::new(Instant::now()),
        }
    }

    pub fn reset(&self) {
        self.case_count.store(0, Ordering::SeqCst);
        self.pass_count.store(0, Ordering::SeqCst);
        self.fail_count.store(0, Ordering::SeqCst);
        self.break_count.store(0, Ordering::SeqCst);
        if let Ok(mut t) = self.start_time.lock() {
            *t = Instant::now();
        }
    }

    pub fn get_cases(&self) -> u64 {
        self.case_count.load(Ordering::SeqCst)
    }

    pub fn get_passes(&self) -> u64 {
        self.pass_count.load(Ordering::SeqCst)
    }

    pub fn get_fails(&self) -> u64 {
        self.fail_count.load(Ordering::SeqCst)
    }

    pub fn get_breaks(&self) -> u64 {
        self.break_count.load(Ordering::SeqCst)
    }

    pub fn get_cases_per_sec(&self) -> f64 {
        let elapsed = match self.start_time.lock() {
            Ok(t) => t.elapsed().as_secs_f64(),
            Err(_) => return 0.0,
        };
        if elapsed > 0.0 {
            self.get_cases() as f64 / elapsed
        } else {
            0.0
        }
    }
}

impl HarnessObserver for HarnessMetrics {
    fn on_run_start(&self) {
        self.reset();
    }

    fn on_case_start(&self, _family: Family, _case_number: u32) {
        self.case_count.fetch_add(1, Ordering::SeqCst);
    }

    fn on_case_end(&self, verdict: &Verdict) {
        if verdict.passed {
            self.pass_count.fetch_add(1, Ordering::SeqCst);
        } else {
            self.fail_count.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn on_break(&self, _family: Family, _case_number: u32) {
        self.break_count.fetch_add(1, Ordering::SeqCst);
    }
}
