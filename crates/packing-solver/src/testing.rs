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

//! Instances and stub solvers shared by the unit tests of this crate.

use packing_model::constraint::{ConstraintManager, ConstraintSet};
use packing_model::index::{Channel, Station};
use packing_model::instance::{InstanceBuilder, StationPackingInstance};
use packing_sat::base::SatBasedSolver;
use packing_sat::dpll::DpllEngine;
use packing_sat::pool::EnginePool;
use packing_search::result::SolverResult;
use packing_search::solver::{SolveResult, Solver};
use packing_search::termination::criterion::TerminationCriterion;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

pub fn instance(domains: &[(u32, &[u32])]) -> StationPackingInstance {
    instance_with_previous(domains, &[])
}

pub fn instance_with_previous(
    domains: &[(u32, &[u32])],
    previous: &[(u32, u32)],
) -> StationPackingInstance {
    let mut builder = InstanceBuilder::new();
    for &(station, channels) in domains {
        builder.add_station(
            Station::new(station),
            channels.iter().copied().map(Channel::new),
        );
    }
    for &(station, channel) in previous {
        builder.with_previous_channel(Station::new(station), Channel::new(channel));
    }
    builder.build().unwrap()
}

/// Co-channel constraints given as `(first, second, channel)`.
pub fn co_channel(pairs: &[(u32, u32, u32)]) -> Arc<dyn ConstraintManager> {
    let mut set = ConstraintSet::new();
    for &(first, second, channel) in pairs {
        set.add_co_channel(Station::new(first), Station::new(second), Channel::new(channel));
    }
    Arc::new(set)
}

pub fn dpll_solver(constraints: Arc<dyn ConstraintManager>) -> SatBasedSolver<DpllEngine> {
    SatBasedSolver::new(
        Arc::new(EnginePool::new(vec![DpllEngine::new()])),
        constraints,
    )
}

/// Returns a fixed result and counts its calls.
pub struct FixedSolver {
    result: SolverResult,
    calls: AtomicUsize,
}

impl FixedSolver {
    pub fn new(result: SolverResult) -> Self {
        Self {
            result,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Solver for FixedSolver {
    fn name(&self) -> &str {
        "FixedSolver"
    }

    fn solve(
        &self,
        _instance: &StationPackingInstance,
        _criterion: &dyn TerminationCriterion,
        _seed: u64,
    ) -> SolveResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.result.clone())
    }
}

/// Delegates to `inner` and records every instance it sees.
pub struct RecordingSolver<S> {
    inner: S,
    seen: Mutex<Vec<StationPackingInstance>>,
}

impl<S> RecordingSolver<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn seen(&self) -> Vec<StationPackingInstance> {
        self.seen.lock().unwrap().clone()
    }
}

impl<S> Solver for RecordingSolver<S>
where
    S: Solver,
{
    fn name(&self) -> &str {
        "RecordingSolver"
    }

    fn solve(
        &self,
        instance: &StationPackingInstance,
        criterion: &dyn TerminationCriterion,
        seed: u64,
    ) -> SolveResult {
        self.seen.lock().unwrap().push(instance.clone());
        self.inner.solve(instance, criterion, seed)
    }
}

/// Blocks until its criterion fires, then reports why it stopped.
pub struct BlockingSolver;

impl Solver for BlockingSolver {
    fn name(&self) -> &str {
        "BlockingSolver"
    }

    fn solve(
        &self,
        _instance: &StationPackingInstance,
        criterion: &dyn TerminationCriterion,
        _seed: u64,
    ) -> SolveResult {
        let start = Instant::now();
        while !criterion.wait_for_stop(Duration::from_millis(10)) {}
        Ok(SolverResult::stopped(criterion, start.elapsed()))
    }
}

/// Ignores its criterion and sleeps for a fixed time.
pub struct HangingSolver(pub Duration);

impl Solver for HangingSolver {
    fn name(&self) -> &str {
        "HangingSolver"
    }

    fn solve(
        &self,
        _instance: &StationPackingInstance,
        _criterion: &dyn TerminationCriterion,
        _seed: u64,
    ) -> SolveResult {
        std::thread::sleep(self.0);
        Ok(SolverResult::timeout(self.0))
    }
}

/// Panics on every call.
pub struct PanickingSolver;

impl Solver for PanickingSolver {
    fn name(&self) -> &str {
        "PanickingSolver"
    }

    fn solve(
        &self,
        _instance: &StationPackingInstance,
        _criterion: &dyn TerminationCriterion,
        _seed: u64,
    ) -> SolveResult {
        panic!("stub solver exploded")
    }
}
