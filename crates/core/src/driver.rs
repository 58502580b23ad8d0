use crate::element::{ElemWidth, SignMode};
use crate::frame::CallFrame;
use crate::peripherals::timer::RtcTimer;
use crate::peripherals::uart::SerialPort;
use crate::report;
use crate::score::{FamilyScore, FinalScore};
use crate::signal::CancelToken;
use crate::verify::{verify_sort, verify_swap, CaseId, Family, Verdict};
use crate::{HarnessError, HarnessObserver, HarnessResult, RoutineUnderTest};
use serde::{Deserialize, Serialize};
use sortlab_config::{HarnessConfig, TestCorpus, MAX_SORT_ARRAY_SIZE};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub swap: FamilyScore,
    pub sort: FamilyScore,
    pub final_score: FinalScore,
    pub verdicts: Vec<Verdict>,
}

impl RunReport {
    pub fn all_passed(&self) -> bool {
        self.final_score.failed() == 0
    }
}

/// Drives the routine under test through every (row, sign, width)
/// combination of both families, paced by the timer and reporting over the
/// serial port.
pub struct Harness<R: RoutineUnderTest> {
    pub routine: R,
    pub corpus: TestCorpus,
    pub config: HarnessConfig,
    pub timer: RtcTimer,
    pub serial: SerialPort,
    pub observers: Vec<Arc<dyn HarnessObserver>>,
    cancel: CancelToken,
}

impl<R: RoutineUnderTest> Harness<R> {
    pub fn new(
        routine: R,
        corpus: TestCorpus,
        config: HarnessConfig,
        sink: Box<dyn Write + Send>,
        tx_buffer_len: usize,
    ) -> HarnessResult<Self> {
        if let Some(row) = corpus
            .sort_cases
            .iter()
            .find(|row| row.len() > MAX_SORT_ARRAY_SIZE)
        {
            return Err(HarnessError::RowTooLong(row.len()));
        }

        let cancel = CancelToken::new();
        let timeout = config.pacing.wait_timeout_ms.map(Duration::from_millis);
        let serial = SerialPort::new(sink, tx_buffer_len, cancel.clone(), timeout)?;

        Ok(Self {
            routine,
            corpus,
            config,
            timer: RtcTimer::new(),
            serial,
            observers: Vec::new(),
            cancel,
        })
    }

    /// Handle that aborts any wait the harness is blocked in.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    fn timeout(&self) -> Option<Duration> {
        self.config.pacing.wait_timeout_ms.map(Duration::from_millis)
    }

    /// Runs both families, prints their summaries and the final score.
    pub fn run(&mut self) -> HarnessResult<RunReport> {
        for observer in &self.observers {
            observer.on_run_start();
        }

        self.timer
            .set_period(Duration::from_millis(self.config.pacing.case_period_ms));
        self.timer.start()?;

        let mut verdicts = Vec::new();

        let swap = self.run_family(Family::Swap, &mut verdicts)?;
        self.serial.print_and_wait(&report::family_summary(&swap))?;

        let sort = self.run_family(Family::Sort, &mut verdicts)?;
        self.serial.print_and_wait(&report::family_summary(&sort))?;

        let final_score = FinalScore::new(
            swap,
            sort,
            self.config.scoring.swap_points_max,
            self.config.scoring.sort_points_max,
        );
        self.serial
            .print_and_wait(&report::final_report(&self.config.student_name, &final_score))?;

        info!(
            "All tests complete: {}/{} passed, score {}",
            final_score.passed(),
            final_score.total(),
            final_score.points()
        );

        for observer in &self.observers {
            observer.on_run_stop();
        }

        Ok(RunReport {
            swap,
            sort,
            final_score,
            verdicts,
        })
    }

    /// Enumerates one family. Misbehaving routines only ever produce failed
    /// verdicts; the only errors are from waits and the serial port.
    pub fn run_family(
        &mut self,
        family: Family,
        verdicts: &mut Vec<Verdict>,
    ) -> HarnessResult<FamilyScore> {
        let rows: Vec<Vec<i64>> = match family {
            Family::Swap => self.corpus.swap_cases.iter().map(|p| p.to_vec()).collect(),
            Family::Sort => self.corpus.sort_cases.clone(),
        };
        let policy = self.config.scoring.auxiliary_policy;
        let timeout = self.timeout();
        let mut score = FamilyScore::new(family);
        let mut number = 0u32;

        info!(
            "Testing {} with {} rows",
            family.routine_name(),
            rows.len()
        );

        for (table_index, row) in rows.iter().enumerate() {
            for sign in SignMode::ALL {
                for (width_index, width) in ElemWidth::ALL.into_iter().enumerate() {
                    self.timer.expired().clear();

                    for observer in &self.observers {
                        observer.on_case_start(family, number);
                    }
                    if self.config.debug.break_on_case == Some(number) {
                        info!("Break on {} case {}", family.routine_name(), number);
                        for observer in &self.observers {
                            observer.on_break(family, number);
                        }
                    }

                    let id = CaseId {
                        number,
                        table_index,
                    };
                    let mut frame = CallFrame::from_values(row, width, sign);

                    let verdict = match family {
                        Family::Swap => {
                            let pair = [row[0], row[1]];
                            let status = self.routine.swap(&mut frame);
                            if self.config.debug.verbose {
                                let block = report::swap_debug_block(
                                    sign,
                                    width,
                                    width_index,
                                    &pair,
                                    &frame.values(),
                                );
                                self.serial.print_and_wait(&block)?;
                            }
                            verify_swap(id, &pair, &frame, status, policy)
                        }
                        Family::Sort => {
                            let swaps = self.routine.sort(&mut frame);
                            verify_sort(id, row, &frame, swaps, policy)
                        }
                    };

                    debug!(
                        "{} case {} (row {}, sign {}, size {}): {}",
                        family.routine_name(),
                        number,
                        table_index,
                        sign.flag(),
                        width,
                        if verdict.passed { "pass" } else { "fail" }
                    );

                    self.serial
                        .print_and_wait(&report::case_report(&verdict, policy))?;
                    score.record(&verdict);

                    for observer in &self.observers {
                        observer.on_case_end(&verdict);
                    }
                    verdicts.push(verdict);
                    number += 1;

                    self.timer.wait_expired(&self.cancel, timeout)?;
                }
            }
        }

        Ok(score)
    }

    /// Reporting loop once testing is over. Prints the idle banner, then one
    /// counter line per idle period. Stops after `max_cycles` lines when
    /// given, otherwise only when cancelled.
    pub fn idle(&mut self, max_cycles: Option<u64>) -> HarnessResult<u64> {
        self.serial.print_and_wait(report::IDLE_BANNER)?;

        self.timer
            .set_period(Duration::from_millis(self.config.pacing.idle_period_ms));
        self.timer.start()?;
        self.timer.expired().clear();

        let timeout = self.timeout();
        let mut counter = 0u64;
        while max_cycles.map_or(true, |max| counter < max) {
            self.serial.print_and_wait(&report::idle_line(counter))?;
            self.timer.wait_expired(&self.cancel, timeout)?;
            counter += 1;
        }

        self.timer.stop();
        Ok(counter)
    }
}
