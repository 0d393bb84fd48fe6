// Copyright (c) 2025 Felix Kahle.
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the
// "Software"), to deal in the Software without restriction, including
// without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to
// permit persons to whom the Software is furnished to do so, subject to
// the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE
// LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION
// OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION
// WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

//! # Watchdog
//!
//! Runs a solver on its own thread and refuses to wait for it forever. The
//! solver gets a private criterion that fires at the caller's deadline and
//! is interrupted as soon as the caller stops. If no answer arrives within
//! the grace period after either event, the call fails with
//! `SolverFault::SolverHung` and the runaway thread is abandoned.

use log::{error, warn};
use packing_model::instance::StationPackingInstance;
use packing_search::fault::SolverFault;
use packing_search::solver::{SolveResult, Solver};
use packing_search::termination::criterion::TerminationCriterion;
use packing_search::termination::interrupt::InterruptibleCriterion;
use packing_search::termination::walltime::WalltimeCriterion;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

pub struct WatchdogDecorator {
    inner: Arc<dyn Solver>,
    grace_period: Duration,
    poll_interval: Duration,
}

impl std::fmt::Debug for WatchdogDecorator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchdogDecorator")
            .field("inner", &self.inner)
            .field("grace_period", &self.grace_period)
            .finish()
    }
}

impl WatchdogDecorator {
    pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(2);
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(5);

    #[inline]
    pub fn new(inner: Arc<dyn Solver>) -> Self {
        Self {
            inner,
            grace_period: Self::DEFAULT_GRACE_PERIOD,
            poll_interval: Self::DEFAULT_POLL_INTERVAL,
        }
    }

    #[inline]
    pub fn with_grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = grace_period;
        self
    }

    #[inline]
    pub fn grace_period(&self) -> Duration {
        self.grace_period
    }
}

impl Solver for WatchdogDecorator {
    fn name(&self) -> &str {
        "WatchdogDecorator"
    }

    fn solve(
        &self,
        instance: &StationPackingInstance,
        criterion: &dyn TerminationCriterion,
        seed: u64,
    ) -> SolveResult {
        let start = Instant::now();
        let remaining = criterion.remaining_time();
        let private = Arc::new(InterruptibleCriterion::new(WalltimeCriterion::new(remaining)));
        let (sender, receiver) = mpsc::channel();

        let spawned = {
            let inner = Arc::clone(&self.inner);
            let instance = instance.clone();
            let private = Arc::clone(&private);
            thread::Builder::new()
                .name("packing-watchdog".to_string())
                .spawn(move || {
                    let outcome = catch_unwind(AssertUnwindSafe(|| {
                        inner.solve(&instance, &*private, seed)
                    }));
                    let _ = sender.send(outcome);
                })
        };
        if let Err(err) = spawned {
            warn!("could not spawn watchdog thread, solving inline: {}", err);
            return self.inner.solve(instance, criterion, seed);
        }

        // `None` means the deadline is too far away to represent.
        let mut hang_deadline = remaining
            .checked_add(self.grace_period)
            .and_then(|limit| start.checked_add(limit));
        let mut interrupted = false;

        loop {
            match receiver.recv_timeout(self.poll_interval) {
                Ok(Ok(result)) => return result,
                Ok(Err(payload)) => {
                    let message = SolverFault::panic_message(payload.as_ref());
                    error!("{} panicked: {}", self.inner.name(), message);
                    return Err(SolverFault::BranchPanicked {
                        branch: self.inner.name().to_string(),
                        message,
                    });
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(SolverFault::BranchPanicked {
                        branch: self.inner.name().to_string(),
                        message: "solver thread exited without a result".to_string(),
                    });
                }
            }

            let now = Instant::now();
            if !interrupted && criterion.has_to_stop() {
                interrupted = true;
                // A caller deadline has normally already fired privately too.
                if criterion.was_interrupted() || !private.has_to_stop() {
                    private.interrupt();
                }
                let tightened = now.checked_add(self.grace_period);
                hang_deadline = match (hang_deadline, tightened) {
                    (Some(current), Some(tightened)) => Some(current.min(tightened)),
                    (current, tightened) => current.or(tightened),
                };
            }

            if hang_deadline.map_or(false, |deadline| now > deadline) {
                private.interrupt();
                error!(
                    "{} did not return within {:?} of its deadline, abandoning it",
                    self.inner.name(),
                    self.grace_period
                );
                return Err(SolverFault::SolverHung {
                    elapsed: start.elapsed(),
                });
            }
        }
    }
}
