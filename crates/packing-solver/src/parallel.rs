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

//! # Parallel Composite
//!
//! Races several independently configured solvers on the same instance.
//! The first conclusive (SAT or UNSAT) answer wins; the others are
//! interrupted through a private `InterruptibleCriterion` derived from the
//! caller's remaining time, and the caller's own stop signals are forwarded
//! into it.
//!
//! Two waiting policies exist:
//!
//! - `WaitPolicy::NoWait` returns the winner (or the caller's stop) at once
//!   and leaves the losers to unwind on their own threads. Every call
//!   spawns fresh branch threads, so a loser that ignores the stop never
//!   delays a later call on the same composite.
//! - `WaitPolicy::WaitForAll` blocks until every branch has returned, which
//!   matters when branches share a non-reentrant resource. Branches that do
//!   not return within the grace period after the stop make the call fail
//!   with `SolverFault::SolverHung`.
//!
//! A branch fault or panic aborts the whole call.

use log::{debug, error};
use packing_model::instance::StationPackingInstance;
use packing_search::fault::SolverFault;
use packing_search::result::{combine_portfolio_results, SolverResult};
use packing_search::solver::{SolveResult, Solver};
use packing_search::termination::criterion::TerminationCriterion;
use packing_search::termination::interrupt::InterruptibleCriterion;
use packing_search::termination::walltime::WalltimeCriterion;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Whether a race returns with the winner or waits for every branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WaitPolicy {
    #[default]
    NoWait,
    WaitForAll,
}

type BranchOutcome = (usize, std::thread::Result<SolveResult>);

/// Races several solvers on the same instance and keeps the first
/// conclusive answer.
///
/// Built with `ParallelCompositeBuilder`.
pub struct ParallelComposite {
    branches: Vec<Arc<dyn Solver>>,
    policy: WaitPolicy,
    grace_period: Duration,
    poll_interval: Duration,
}

impl std::fmt::Debug for ParallelComposite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParallelComposite")
            .field("branches", &self.branches)
            .field("policy", &self.policy)
            .field("grace_period", &self.grace_period)
            .finish()
    }
}

impl ParallelComposite {
    pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(2);
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(5);

    #[inline]
    pub fn num_branches(&self) -> usize {
        self.branches.len()
    }

    #[inline]
    pub fn policy(&self) -> WaitPolicy {
        self.policy
    }

    #[inline]
    pub fn grace_period(&self) -> Duration {
        self.grace_period
    }

    fn spawn_branches(
        &self,
        instance: &StationPackingInstance,
        shared: &Arc<InterruptibleCriterion<WalltimeCriterion>>,
        seed: u64,
    ) -> (mpsc::Receiver<BranchOutcome>, usize) {
        let (sender, receiver) = mpsc::channel::<BranchOutcome>();
        let instance = Arc::new(instance.clone());
        let mut launched = 0;

        for (index, branch) in self.branches.iter().enumerate() {
            let branch = Arc::clone(branch);
            let instance = Arc::clone(&instance);
            let criterion = Arc::clone(shared);
            let sender = sender.clone();
            let spawned = std::thread::Builder::new()
                .name(format!("packing-branch-{}", index))
                .spawn(move || {
                    let outcome = catch_unwind(AssertUnwindSafe(|| {
                        branch.solve(&instance, &*criterion, seed)
                    }));
                    // The receiver is gone once the caller stopped waiting.
                    let _ = sender.send((index, outcome));
                });
            match spawned {
                Ok(_) => launched += 1,
                Err(e) => error!(
                    "failed to spawn a thread for branch {}: {}",
                    self.branches[index].name(),
                    e
                ),
            }
        }
        (receiver, launched)
    }
}

impl Solver for ParallelComposite {
    fn name(&self) -> &str {
        "ParallelComposite"
    }

    fn solve(
        &self,
        instance: &StationPackingInstance,
        criterion: &dyn TerminationCriterion,
        seed: u64,
    ) -> SolveResult {
        let start = Instant::now();
        if criterion.has_to_stop() {
            return Ok(SolverResult::stopped(criterion, start.elapsed()));
        }

        let shared = Arc::new(InterruptibleCriterion::new(WalltimeCriterion::new(
            criterion.remaining_time(),
        )));
        let (receiver, mut pending) = self.spawn_branches(instance, &shared, seed);
        let mut results: Vec<SolverResult> = Vec::with_capacity(pending);
        let mut stopped_at: Option<Instant> = None;

        while pending > 0 {
            match receiver.recv_timeout(self.poll_interval) {
                Ok((index, Ok(Ok(result)))) => {
                    pending -= 1;
                    debug!(
                        "branch {} returned {}",
                        self.branches[index].name(),
                        result
                    );
                    if result.is_conclusive() && stopped_at.is_none() {
                        shared.interrupt();
                        stopped_at = Some(Instant::now());
                        if self.policy == WaitPolicy::NoWait {
                            return Ok(result.with_runtime(start.elapsed()));
                        }
                    }
                    results.push(result);
                }
                Ok((index, Ok(Err(fault)))) => {
                    shared.interrupt();
                    error!(
                        "branch {} failed: {}",
                        self.branches[index].name(),
                        fault
                    );
                    return Err(fault);
                }
                Ok((index, Err(payload))) => {
                    shared.interrupt();
                    let branch = self.branches[index].name().to_string();
                    let message = SolverFault::panic_message(payload.as_ref());
                    error!("branch {} panicked: {}", branch, message);
                    return Err(SolverFault::BranchPanicked { branch, message });
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }

            if stopped_at.is_none() && criterion.has_to_stop() {
                if criterion.was_interrupted() || !shared.has_to_stop() {
                    shared.interrupt();
                }
                stopped_at = Some(Instant::now());
                if self.policy == WaitPolicy::NoWait {
                    debug!("caller stopped the race with {} branches running", pending);
                    return Ok(SolverResult::stopped(criterion, start.elapsed()));
                }
            }

            if let Some(since) = stopped_at {
                if pending > 0 && since.elapsed() > self.grace_period {
                    error!(
                        "{} branches ignored the interrupt for {:?}",
                        pending, self.grace_period
                    );
                    return Err(SolverFault::SolverHung {
                        elapsed: start.elapsed(),
                    });
                }
            }
        }

        Ok(combine_portfolio_results(&results)?.with_runtime(start.elapsed()))
    }
}

/// Collects the branches and timing knobs of a `ParallelComposite`.
pub struct ParallelCompositeBuilder {
    branches: Vec<Arc<dyn Solver>>,
    policy: WaitPolicy,
    grace_period: Duration,
    poll_interval: Duration,
}

impl Default for ParallelCompositeBuilder {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl ParallelCompositeBuilder {
    #[inline]
    pub fn new() -> Self {
        Self {
            branches: Vec::new(),
            policy: WaitPolicy::default(),
            grace_period: ParallelComposite::DEFAULT_GRACE_PERIOD,
            poll_interval: ParallelComposite::DEFAULT_POLL_INTERVAL,
        }
    }

    #[inline]
    pub fn add_branch<S>(mut self, branch: S) -> Self
    where
        S: Solver + 'static,
    {
        self.branches.push(Arc::new(branch));
        self
    }

    #[inline]
    pub fn add_branch_shared(mut self, branch: Arc<dyn Solver>) -> Self {
        self.branches.push(branch);
        self
    }

    #[inline]
    pub fn with_policy(mut self, policy: WaitPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[inline]
    pub fn with_grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = grace_period;
        self
    }

    #[inline]
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Builds the composite.
    ///
    /// # Panics
    ///
    /// Panics if no branch was added.
    pub fn build(self) -> ParallelComposite {
        assert!(
            !self.branches.is_empty(),
            "called `ParallelCompositeBuilder::build` with no branches"
        );
        ParallelComposite {
            branches: self.branches,
            policy: self.policy,
            grace_period: self.grace_period,
            poll_interval: self.poll_interval,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{
        co_channel, dpll_solver, instance, BlockingSolver, FixedSolver, HangingSolver,
        PanickingSolver,
    };
    use packing_model::index::{Channel, Station};
    use packing_search::result::{SatResult, SolvedBy};
    use packing_search::termination::never::NeverEndingCriterion;
    use std::thread;

    fn scenario() -> StationPackingInstance {
        instance(&[(1, &[14, 15]), (2, &[14, 15])])
    }

    #[test]
    fn test_conclusive_branch_beats_blocked_branch() {
        let composite = ParallelCompositeBuilder::new()
            .add_branch(BlockingSolver)
            .add_branch(dpll_solver(co_channel(&[(1, 2, 14)])))
            .build();

        let result = composite
            .solve(&scenario(), &NeverEndingCriterion, 0)
            .unwrap();
        assert_eq!(result.result(), SatResult::Sat);
    }

    #[test]
    fn test_wait_for_all_collects_interrupted_losers() {
        let composite = ParallelCompositeBuilder::new()
            .add_branch(BlockingSolver)
            .add_branch(FixedSolver::new(SolverResult::unsat(
                Duration::ZERO,
                SolvedBy::SatEngine,
            )))
            .with_policy(WaitPolicy::WaitForAll)
            .build();

        let result = composite
            .solve(&scenario(), &NeverEndingCriterion, 0)
            .unwrap();
        assert_eq!(result.result(), SatResult::Unsat);
    }

    #[test]
    fn test_caller_interrupt_reaches_blocked_branches() {
        let composite = ParallelCompositeBuilder::new()
            .add_branch(BlockingSolver)
            .add_branch(BlockingSolver)
            .with_policy(WaitPolicy::WaitForAll)
            .build();
        let criterion = Arc::new(InterruptibleCriterion::new(NeverEndingCriterion));

        let interrupter = {
            let criterion = Arc::clone(&criterion);
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(50));
                criterion.interrupt();
            })
        };
        let start = Instant::now();
        let result = composite.solve(&scenario(), &*criterion, 0).unwrap();
        interrupter.join().unwrap();

        assert_eq!(result.result(), SatResult::Interrupted);
        assert!(start.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn test_branch_ignoring_interrupt_is_reported_hung() {
        let composite = ParallelCompositeBuilder::new()
            .add_branch(HangingSolver(Duration::from_secs(2)))
            .with_policy(WaitPolicy::WaitForAll)
            .with_grace_period(Duration::from_millis(50))
            .build();
        let criterion = InterruptibleCriterion::new(NeverEndingCriterion);
        criterion.interrupt();
        // An already stopped caller is answered without starting branches.
        let result = composite.solve(&scenario(), &criterion, 0).unwrap();
        assert_eq!(result.result(), SatResult::Interrupted);

        let criterion = Arc::new(InterruptibleCriterion::new(NeverEndingCriterion));
        let interrupter = {
            let criterion = Arc::clone(&criterion);
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(20));
                criterion.interrupt();
            })
        };
        match composite.solve(&scenario(), &*criterion, 0) {
            Err(SolverFault::SolverHung { .. }) => {}
            other => panic!("expected SolverHung, got {:?}", other),
        }
        interrupter.join().unwrap();
    }

    #[test]
    fn test_panicking_branch_is_fatal() {
        let composite = ParallelCompositeBuilder::new()
            .add_branch(PanickingSolver)
            .build();

        match composite.solve(&scenario(), &NeverEndingCriterion, 0) {
            Err(SolverFault::BranchPanicked { branch, message }) => {
                assert_eq!(branch, "PanickingSolver");
                assert_eq!(message, "stub solver exploded");
            }
            other => panic!("expected BranchPanicked, got {:?}", other),
        }
    }

    #[test]
    fn test_contradicting_branches_are_fatal() {
        let sat = FixedSolver::new(SolverResult::sat(
            [(Station::new(1), Channel::new(14))].into_iter().collect(),
            Duration::ZERO,
            SolvedBy::SatEngine,
        ));
        let unsat = FixedSolver::new(SolverResult::unsat(Duration::ZERO, SolvedBy::SatEngine));
        let composite = ParallelCompositeBuilder::new()
            .add_branch(sat)
            .add_branch(unsat)
            .with_policy(WaitPolicy::WaitForAll)
            .build();

        match composite.solve(&scenario(), &NeverEndingCriterion, 0) {
            Err(SolverFault::ConflictingResults { .. }) => {}
            other => panic!("expected ConflictingResults, got {:?}", other),
        }
    }

    #[test]
    fn test_hung_loser_does_not_delay_next_race() {
        let composite = ParallelCompositeBuilder::new()
            .add_branch(HangingSolver(Duration::from_secs(1)))
            .add_branch(FixedSolver::new(SolverResult::unsat(
                Duration::ZERO,
                SolvedBy::SatEngine,
            )))
            .build();

        let first = composite
            .solve(&scenario(), &NeverEndingCriterion, 0)
            .unwrap();
        assert_eq!(first.result(), SatResult::Unsat);

        let start = Instant::now();
        let second = composite
            .solve(&scenario(), &NeverEndingCriterion, 0)
            .unwrap();
        assert_eq!(second.result(), SatResult::Unsat);
        assert!(start.elapsed() < Duration::from_millis(300));
    }
}
