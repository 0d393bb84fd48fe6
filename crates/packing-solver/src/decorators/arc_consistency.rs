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

//! AC-3 pruning ahead of the inner solver.

use log::debug;
use packing_model::constraint::ConstraintManager;
use packing_model::instance::StationPackingInstance;
use packing_presolve::arc_consistency::{Ac3Enforcer, Ac3Outcome};
use packing_search::result::{SolvedBy, SolverResult};
use packing_search::solver::{SolveResult, Solver};
use packing_search::termination::criterion::TerminationCriterion;
use std::sync::Arc;
use std::time::Instant;

/// Enforces arc consistency once, then delegates the pruned instance.
///
/// A wiped-out domain proves the instance UNSAT without delegating. A SAT
/// witness of the pruned instance is a witness of the original one, since
/// pruning only shrinks domains.
pub struct ArcConsistencyDecorator<S> {
    inner: S,
    enforcer: Ac3Enforcer,
    constraints: Arc<dyn ConstraintManager>,
}

impl<S> ArcConsistencyDecorator<S> {
    #[inline]
    pub fn new(inner: S, constraints: Arc<dyn ConstraintManager>) -> Self {
        Self {
            inner,
            enforcer: Ac3Enforcer::new(),
            constraints,
        }
    }
}

impl<S> Solver for ArcConsistencyDecorator<S>
where
    S: Solver,
{
    fn name(&self) -> &str {
        "ArcConsistencyDecorator"
    }

    fn solve(
        &self,
        instance: &StationPackingInstance,
        criterion: &dyn TerminationCriterion,
        seed: u64,
    ) -> SolveResult {
        let start = Instant::now();
        match self.enforcer.enforce(instance, self.constraints.as_ref()) {
            Ac3Outcome::WipedOut { station } => {
                debug!("arc consistency proved {} UNSAT at {}", instance, station);
                Ok(SolverResult::unsat(start.elapsed(), SolvedBy::ArcConsistency))
            }
            Ac3Outcome::Consistent { removed: 0, .. } => {
                self.inner.solve(instance, criterion, seed)
            }
            Ac3Outcome::Consistent { domains, removed } => {
                debug!("arc consistency removed {} channels from {}", removed, instance);
                let reduced = instance.with_domains(domains)?;
                let overhead = start.elapsed();
                Ok(self
                    .inner
                    .solve(&reduced, criterion, seed)?
                    .with_added_runtime(overhead))
            }
        }
    }
}
