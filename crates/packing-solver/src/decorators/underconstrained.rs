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

//! # Underconstrained-Station Removal
//!
//! Removes the stations the finder proves underconstrained, solves the rest,
//! and greedily places the removed stations back into a SAT witness.
//!
//! With recursion enabled the removal repeats on the reduced instance. Each
//! level only re-examines the surviving neighbours of the stations removed
//! one level up, since no other station's neighbourhood changed. Levels are
//! unwound in reverse, so every removed station is reinserted into exactly
//! the instance it was proven underconstrained in.
//!
//! Reinsertion scans the station's domain for a channel free of conflicts
//! with the already assigned stations. Failing to find one means the finder
//! broke its guarantee and is reported as `SolverFault::ReinsertionFailed`.
//! Non-SAT results pass through untouched.

use log::{debug, error, trace};
use packing_model::assignment::Assignment;
use packing_model::constraint::ConstraintManager;
use packing_model::graph::InterferenceGraph;
use packing_model::index::Station;
use packing_model::instance::StationPackingInstance;
use packing_presolve::underconstrained::UnderconstrainedStationFinder;
use packing_search::fault::SolverFault;
use packing_search::solver::{SolveResult, Solver};
use packing_search::termination::criterion::TerminationCriterion;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

pub struct UnderconstrainedDecorator<S> {
    inner: S,
    finder: Arc<dyn UnderconstrainedStationFinder>,
    constraints: Arc<dyn ConstraintManager>,
    recursive: bool,
    max_depth: usize,
}

impl<S> UnderconstrainedDecorator<S> {
    /// Deepest removal level before the query is aborted. Every level removes
    /// at least one station, so only corrupt finders get anywhere near it.
    pub const DEFAULT_MAX_DEPTH: usize = 1_024;

    #[inline]
    pub fn new(
        inner: S,
        finder: Arc<dyn UnderconstrainedStationFinder>,
        constraints: Arc<dyn ConstraintManager>,
    ) -> Self {
        Self {
            inner,
            finder,
            constraints,
            recursive: false,
            max_depth: Self::DEFAULT_MAX_DEPTH,
        }
    }

    #[inline]
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    #[inline]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    #[inline]
    pub fn is_recursive(&self) -> bool {
        self.recursive
    }
}

impl<S> UnderconstrainedDecorator<S>
where
    S: Solver,
{
    fn solve_level(
        &self,
        instance: &StationPackingInstance,
        candidates: Option<&BTreeSet<Station>>,
        criterion: &dyn TerminationCriterion,
        seed: u64,
        depth: usize,
    ) -> SolveResult {
        if depth > self.max_depth {
            error!("underconstrained removal exceeded {} levels", self.max_depth);
            return Err(SolverFault::RecursionLimitExceeded {
                stage: "underconstrained removal",
                limit: self.max_depth,
            });
        }

        let graph = InterferenceGraph::build(instance, self.constraints.as_ref());
        let removed = self.finder.find(
            instance,
            &graph,
            self.constraints.as_ref(),
            candidates,
            criterion,
        );
        if removed.is_empty() {
            return self.inner.solve(instance, criterion, seed);
        }
        debug!(
            "level {}: removing {} of {} stations as underconstrained",
            depth,
            removed.len(),
            instance.num_stations()
        );

        let reduced = instance.without(&removed);
        let result = if self.recursive && !reduced.is_empty() {
            let next: BTreeSet<Station> = graph
                .neighbourhood(&removed)
                .into_iter()
                .filter(|station| reduced.contains_station(*station))
                .collect();
            if next.is_empty() {
                self.inner.solve(&reduced, criterion, seed)?
            } else {
                self.solve_level(&reduced, Some(&next), criterion, seed, depth + 1)?
            }
        } else {
            self.inner.solve(&reduced, criterion, seed)?
        };

        if !result.is_sat() {
            return Ok(result);
        }

        let start = Instant::now();
        let mut assignment = result.assignment().clone();
        self.reinsert(instance, &removed, &mut assignment)?;
        Ok(result
            .with_assignment(assignment)
            .with_added_runtime(start.elapsed()))
    }

    fn reinsert(
        &self,
        instance: &StationPackingInstance,
        removed: &BTreeSet<Station>,
        assignment: &mut Assignment,
    ) -> Result<(), SolverFault> {
        for &station in removed {
            let channel = instance.domain(station).and_then(|domain| {
                domain.iter().copied().find(|&channel| {
                    self.constraints
                        .interfering(station, channel)
                        .iter()
                        .all(|&(other, other_channel)| {
                            assignment.channel_of(other) != Some(other_channel)
                        })
                })
            });
            match channel {
                Some(channel) => {
                    trace!("reinserted {} on {}", station, channel);
                    assignment.assign(station, channel);
                }
                None => {
                    error!(
                        "no free channel to reinsert underconstrained {} into {}",
                        station, instance
                    );
                    return Err(SolverFault::ReinsertionFailed { station });
                }
            }
        }
        Ok(())
    }
}

impl<S> Solver for UnderconstrainedDecorator<S>
where
    S: Solver,
{
    fn name(&self) -> &str {
        "UnderconstrainedDecorator"
    }

    fn solve(
        &self,
        instance: &StationPackingInstance,
        criterion: &dyn TerminationCriterion,
        seed: u64,
    ) -> SolveResult {
        if instance.is_empty() {
            return self.inner.solve(instance, criterion, seed);
        }
        self.solve_level(instance, None, criterion, seed, 0)
    }
}
