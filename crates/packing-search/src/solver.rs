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

//! # Solver Capability
//!
//! Every stage of the pipeline implements `Solver`. A stage either answers
//! immediately, rewrites the instance or criterion and delegates to the stage
//! it owns, or both. Stages are stateless with respect to problem content:
//! everything they keep is injected configuration and collaborators, so one
//! assembled pipeline serves any number of unrelated queries, each through
//! its own `solve` call.
//!
//! ## Contract
//!
//! - `solve` is synchronous for the caller; it may use worker threads
//!   internally.
//! - Expected terminal outcomes are returned as `Ok(SolverResult)`.
//! - `Err(SolverFault)` is reserved for fatal internal-consistency faults.
//! - A SAT result carries a witness over exactly the stations of the
//!   instance passed in.
//! - Implementations poll `criterion` at every suspension point and return
//!   promptly once it fires.

use crate::fault::SolverFault;
use crate::result::SolverResult;
use crate::termination::criterion::TerminationCriterion;
use packing_model::instance::StationPackingInstance;
use std::sync::Arc;

pub type SolveResult = Result<SolverResult, SolverFault>;

pub trait Solver: Send + Sync {
    /// Returns the name of the solver, used in logs and stage listings.
    fn name(&self) -> &str;

    /// Decides the feasibility of `instance`.
    fn solve(
        &self,
        instance: &StationPackingInstance,
        criterion: &dyn TerminationCriterion,
        seed: u64,
    ) -> SolveResult;
}

impl std::fmt::Debug for dyn Solver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Solver({})", self.name())
    }
}

impl<S> Solver for Arc<S>
where
    S: Solver + ?Sized,
{
    fn name(&self) -> &str {
        (**self).name()
    }

    fn solve(
        &self,
        instance: &StationPackingInstance,
        criterion: &dyn TerminationCriterion,
        seed: u64,
    ) -> SolveResult {
        (**self).solve(instance, criterion, seed)
    }
}

impl<S> Solver for Box<S>
where
    S: Solver + ?Sized,
{
    fn name(&self) -> &str {
        (**self).name()
    }

    fn solve(
        &self,
        instance: &StationPackingInstance,
        criterion: &dyn TerminationCriterion,
        seed: u64,
    ) -> SolveResult {
        (**self).solve(instance, criterion, seed)
    }
}

/// A solver that gives up immediately with TIMEOUT. Used as the terminal
/// stage of pipelines that must only consult caches or previous answers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VoidSolver;

impl Solver for VoidSolver {
    fn name(&self) -> &str {
        "VoidSolver"
    }

    fn solve(
        &self,
        _instance: &StationPackingInstance,
        _criterion: &dyn TerminationCriterion,
        _seed: u64,
    ) -> SolveResult {
        Ok(SolverResult::timeout(std::time::Duration::ZERO))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::SatResult;
    use crate::termination::never::NeverEndingCriterion;
    use packing_model::index::{Channel, Station};
    use packing_model::instance::InstanceBuilder;

    #[test]
    fn test_void_solver_times_out() {
        let mut builder = InstanceBuilder::new();
        builder.add_station(Station::new(1), [Channel::new(14)]);
        let instance = builder.build().unwrap();

        let result = VoidSolver.solve(&instance, &NeverEndingCriterion, 0).unwrap();
        assert_eq!(result.result(), SatResult::Timeout);
    }

    #[test]
    fn test_shared_solver_delegates() {
        let solver: Arc<dyn Solver> = Arc::new(VoidSolver);
        assert_eq!(solver.name(), "VoidSolver");
        assert_eq!(format!("{:?}", solver.as_ref()), "Solver(VoidSolver)");
    }
}
