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

//! Short-circuit on a previous assignment that already solves the instance.
//!
//! Repeated queries often differ only slightly from an earlier one. When the
//! previous assignment places every station of the instance on a channel of
//! its domain and violates no constraint, it is returned as is. A previous
//! channel outside the current domain is only a stale hint and disables the
//! shortcut.

use log::debug;
use packing_model::assignment::Assignment;
use packing_model::constraint::ConstraintManager;
use packing_model::instance::StationPackingInstance;
use packing_search::result::{SolvedBy, SolverResult};
use packing_search::solver::{SolveResult, Solver};
use packing_search::termination::criterion::TerminationCriterion;
use std::sync::Arc;
use std::time::Instant;

pub struct PreviousAssignmentDecorator<S> {
    inner: S,
    constraints: Arc<dyn ConstraintManager>,
}

impl<S> PreviousAssignmentDecorator<S> {
    #[inline]
    pub fn new(inner: S, constraints: Arc<dyn ConstraintManager>) -> Self {
        Self { inner, constraints }
    }

    /// The previous assignment of `instance` if it is a complete packing.
    fn complete_previous(&self, instance: &StationPackingInstance) -> Option<Assignment> {
        let previous = instance.previous_assignment();
        if previous.len() != instance.num_stations() {
            return None;
        }
        let in_domains = previous.iter().all(|(&station, channel)| {
            instance
                .domain(station)
                .is_some_and(|domain| domain.contains(channel))
        });
        if !in_domains {
            return None;
        }
        let assignment = Assignment::from_station_map(previous);
        self.constraints
            .is_satisfying(&assignment)
            .then_some(assignment)
    }
}

impl<S> Solver for PreviousAssignmentDecorator<S>
where
    S: Solver,
{
    fn name(&self) -> &str {
        "PreviousAssignmentDecorator"
    }

    fn solve(
        &self,
        instance: &StationPackingInstance,
        criterion: &dyn TerminationCriterion,
        seed: u64,
    ) -> SolveResult {
        let start = Instant::now();
        if !instance.is_empty() {
            if let Some(assignment) = self.complete_previous(instance) {
                debug!("previous assignment solves {}", instance);
                return Ok(SolverResult::sat(
                    assignment,
                    start.elapsed(),
                    SolvedBy::PreviousAssignment,
                ));
            }
        }
        self.inner.solve(instance, criterion, seed)
    }
}
