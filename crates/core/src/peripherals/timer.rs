use crate::signal::{CancelToken, Event};
use crate::HarnessResult;
use crossbeam_channel::{bounded, select, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Periodic compare-match timer.
///
/// While running, a background thread raises the `expired` event once per
/// period. The event is level-triggered, so ticks that nobody consumed
/// collapse into one. A zero period makes the timer free-running: waits on it
/// return at once.
#[derive(Debug)]
pub struct RtcTimer {
    period: Duration,
    expired: Event,
    worker: Option<(Sender<()>, JoinHandle<()>)>,
}

impl Default for RtcTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl RtcTimer {
    pub fn new() -> Self {
        Self {
            period: Duration::ZERO,
            expired: Event::new("rtc-expired"),
            worker: None,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Takes effect on the next `start` or `reset`.
    pub fn set_period(&mut self, period: Duration) {
        self.period = period;
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    pub fn is_free_running(&self) -> bool {
        self.period.is_zero()
    }

    pub fn expired(&self) -> &Event {
        &self.expired
    }

    pub fn start(&mut self) -> HarnessResult<()> {
        self.stop();
        if self.is_free_running() {
            return Ok(());
        }

        let (stop_tx, stop_rx) = bounded::<()>(0);
        let expired = self.expired.clone();
        let period = self.period;
        let handle = thread::Builder::new()
            .name("rtc-timer".to_string())
            .spawn(move || loop {
                select! {
                    recv(stop_rx) -> _ => break,
                    default(period) => expired.set(),
                }
            })?;

        tracing::debug!("RTC timer started, period {:?}", period);
        self.worker = Some((stop_tx, handle));
        Ok(())
    }

    /// Restarts the count from zero. A stopped timer stays stopped.
    pub fn reset(&mut self) -> HarnessResult<()> {
        if self.is_running() {
            self.start()?;
        }
        Ok(())
    }

    pub fn stop(&mut self) {
        if let Some((stop_tx, handle)) = self.worker.take() {
            drop(stop_tx);
            if handle.join().is_err() {
                tracing::warn!("RTC timer thread panicked");
            }
        }
    }

    /// Waits for the next expiry and consumes it.
    pub fn wait_expired(&self, cancel: &CancelToken, timeout: Option<Duration>) -> HarnessResult<()> {
        if self.is_free_running() {
            return Ok(());
        }
        self.expired.wait(cancel, timeout)
    }
}

impl Drop for RtcTimer {
    fn drop(&mut self) {
        self.stop();
    }
}
