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

//! # Connected-Component Decomposition
//!
//! Splits an instance along the groups of its `ComponentGrouper`, solves the
//! groups one after the other (smallest first, so a small UNSAT group ends
//! the query early), and merges the answers with
//! `merge_component_results`.
//!
//! The merged result is SAT only if every group was visited and found SAT.
//! When the criterion fires before all groups were visited, the unvisited
//! remainder counts as stopped, so a partial evaluation can never claim SAT.
//!
//! In exhaustive mode every group is solved even after one fails, which lets
//! an inner cache-population stage record an answer for each of them.

use log::{debug, trace};
use packing_model::constraint::ConstraintManager;
use packing_model::instance::StationPackingInstance;
use packing_presolve::components::ComponentGrouper;
use packing_search::result::{merge_component_results, SolverResult};
use packing_search::solver::{SolveResult, Solver};
use packing_search::termination::criterion::TerminationCriterion;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

pub struct ComponentDecorator<S> {
    inner: S,
    grouper: Arc<dyn ComponentGrouper>,
    constraints: Arc<dyn ConstraintManager>,
    exhaustive: bool,
}

impl<S> ComponentDecorator<S> {
    #[inline]
    pub fn new(
        inner: S,
        grouper: Arc<dyn ComponentGrouper>,
        constraints: Arc<dyn ConstraintManager>,
    ) -> Self {
        Self {
            inner,
            grouper,
            constraints,
            exhaustive: false,
        }
    }

    /// Keep solving components after the first non-SAT one.
    #[inline]
    pub fn exhaustive(mut self, exhaustive: bool) -> Self {
        self.exhaustive = exhaustive;
        self
    }

    #[inline]
    pub fn is_exhaustive(&self) -> bool {
        self.exhaustive
    }
}

impl<S> Solver for ComponentDecorator<S>
where
    S: Solver,
{
    fn name(&self) -> &str {
        "ComponentDecorator"
    }

    fn solve(
        &self,
        instance: &StationPackingInstance,
        criterion: &dyn TerminationCriterion,
        seed: u64,
    ) -> SolveResult {
        let start = Instant::now();
        let mut components = self.grouper.group(instance, self.constraints.as_ref());
        if components.len() <= 1 {
            return self.inner.solve(instance, criterion, seed);
        }
        components.sort_by_key(BTreeSet::len);
        debug!(
            "split {} into {} components (largest {} stations)",
            instance,
            components.len(),
            components.last().map_or(0, BTreeSet::len)
        );

        let mut results = Vec::with_capacity(components.len());
        for (index, component) in components.iter().enumerate() {
            if criterion.has_to_stop() {
                debug!(
                    "criterion fired with {} of {} components left",
                    components.len() - index,
                    components.len()
                );
                results.push(SolverResult::stopped(criterion, start.elapsed()));
                break;
            }

            let sub_instance = instance.restricted_to(component);
            let result = self.inner.solve(&sub_instance, criterion, seed)?;
            trace!("component {} ({} stations): {}", index, component.len(), result);

            let failed = !result.is_sat();
            results.push(result);
            if failed && !self.exhaustive {
                break;
            }
        }

        Ok(merge_component_results(&results))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{co_channel, dpll_solver, instance, FixedSolver, RecordingSolver};
    use packing_model::validation::validate_assignment;
    use packing_presolve::components::ConnectedComponentGrouper;
    use packing_search::result::{SatResult, SolvedBy};
    use packing_search::termination::interrupt::InterruptibleCriterion;
    use packing_search::termination::never::NeverEndingCriterion;
    use std::time::Duration;

    fn grouper() -> Arc<dyn ComponentGrouper> {
        Arc::new(ConnectedComponentGrouper)
    }

    #[test]
    fn test_components_are_solved_smallest_first_and_merged() {
        let constraints = co_channel(&[(1, 2, 14), (2, 3, 15)]);
        let inner = RecordingSolver::new(dpll_solver(constraints.clone()));
        let solver = ComponentDecorator::new(inner, grouper(), constraints.clone());

        let instance = instance(&[
            (1, &[14, 15]),
            (2, &[14, 15]),
            (3, &[14, 15]),
            (4, &[14]),
        ]);
        let result = solver.solve(&instance, &NeverEndingCriterion, 0).unwrap();

        assert_eq!(result.result(), SatResult::Sat);
        assert!(validate_assignment(&instance, result.assignment(), constraints.as_ref()).is_ok());
        let sizes: Vec<_> = solver.inner.seen().iter().map(|i| i.num_stations()).collect();
        assert_eq!(sizes, vec![1, 3]);
    }

    #[test]
    fn test_first_failure_stops_unless_exhaustive() {
        let constraints = co_channel(&[(1, 2, 14), (3, 4, 14)]);
        let inner = RecordingSolver::new(FixedSolver::new(SolverResult::unsat(
            Duration::ZERO,
            SolvedBy::SatEngine,
        )));
        let instance = instance(&[(1, &[14]), (2, &[14]), (3, &[14]), (4, &[14])]);

        let lazy = ComponentDecorator::new(inner, grouper(), constraints.clone());
        assert!(lazy.solve(&instance, &NeverEndingCriterion, 0).unwrap().is_unsat());
        assert_eq!(lazy.inner.seen().len(), 1);

        let inner = RecordingSolver::new(FixedSolver::new(SolverResult::unsat(
            Duration::ZERO,
            SolvedBy::SatEngine,
        )));
        let exhaustive = ComponentDecorator::new(inner, grouper(), constraints).exhaustive(true);
        assert!(exhaustive
            .solve(&instance, &NeverEndingCriterion, 0)
            .unwrap()
            .is_unsat());
        assert_eq!(exhaustive.inner.seen().len(), 2);
    }

    #[test]
    fn test_stopped_criterion_never_claims_sat() {
        let constraints = co_channel(&[(1, 2, 14)]);
        let inner = FixedSolver::new(SolverResult::sat(
            Default::default(),
            Duration::ZERO,
            SolvedBy::SatEngine,
        ));
        let solver = ComponentDecorator::new(inner, grouper(), constraints);
        let criterion = InterruptibleCriterion::new(NeverEndingCriterion);
        criterion.interrupt();

        let result = solver
            .solve(
                &instance(&[(1, &[14, 15]), (2, &[14, 15]), (3, &[14])]),
                &criterion,
                0,
            )
            .unwrap();
        assert_eq!(result.result(), SatResult::Interrupted);
        assert_eq!(solver.inner.calls(), 0);
    }

    #[test]
    fn test_single_component_is_delegated_unchanged() {
        let constraints = co_channel(&[(1, 2, 14)]);
        let inner = RecordingSolver::new(FixedSolver::new(SolverResult::timeout(Duration::ZERO)));
        let solver = ComponentDecorator::new(inner, grouper(), constraints);
        let instance = instance(&[(1, &[14, 15]), (2, &[14, 15])]);

        solver.solve(&instance, &NeverEndingCriterion, 0).unwrap();
        assert_eq!(solver.inner.seen(), vec![instance]);
    }
}
