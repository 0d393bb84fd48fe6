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

//! # Neighbourhood Presolving
//!
//! Repeated queries usually add a few stations to an instance that was
//! packed before. The presolver starts from the stations without a usable
//! previous channel and grows that set through the interference graph with a
//! `StationAddingStrategy`. On every subset it tries two certificates:
//!
//! - **SAT**: repack only the subset, with every other station pinned to its
//!   previous channel. A packing of the subset then extends to the whole
//!   instance.
//! - **UNSAT**: the subset alone, with full domains, has no packing. Then
//!   neither has the whole instance.
//!
//! Attempts on one subset follow a `DeepeningSchedule`; a timed-out attempt
//! is retried with the next cutoff, while inconclusive certificates move on
//! to the next subset. The presolver gives up, and delegates, once the subset
//! would be the whole instance or its budget is spent.

use log::{debug, trace};
use packing_model::assignment::Assignment;
use packing_model::constraint::ConstraintManager;
use packing_model::graph::InterferenceGraph;
use packing_model::index::{Channel, Station};
use packing_model::instance::StationPackingInstance;
use packing_presolve::deepening::DeepeningSchedule;
use packing_presolve::neighbourhood::StationAddingStrategy;
use packing_search::fault::SolverFault;
use packing_search::result::{SolvedBy, SolverResult};
use packing_search::solver::{SolveResult, Solver};
use packing_search::termination::composite::DisjunctiveCriterion;
use packing_search::termination::criterion::TerminationCriterion;
use packing_search::termination::walltime::WalltimeCriterion;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub struct NeighbourhoodPresolver<S> {
    inner: S,
    certifier: Arc<dyn Solver>,
    strategy: Arc<dyn StationAddingStrategy>,
    schedule: DeepeningSchedule,
    budget: Duration,
    constraints: Arc<dyn ConstraintManager>,
}

impl<S> NeighbourhoodPresolver<S> {
    pub const DEFAULT_BUDGET: Duration = Duration::from_secs(5);

    /// Creates a presolver in front of `inner` that certifies sub-instances
    /// with `certifier`.
    pub fn new(
        inner: S,
        certifier: Arc<dyn Solver>,
        strategy: Arc<dyn StationAddingStrategy>,
        constraints: Arc<dyn ConstraintManager>,
    ) -> Self {
        Self {
            inner,
            certifier,
            strategy,
            schedule: DeepeningSchedule::default(),
            budget: Self::DEFAULT_BUDGET,
            constraints,
        }
    }

    #[inline]
    pub fn with_schedule(mut self, schedule: DeepeningSchedule) -> Self {
        self.schedule = schedule;
        self
    }

    #[inline]
    pub fn with_budget(mut self, budget: Duration) -> Self {
        self.budget = budget;
        self
    }

    /// The sub-instance over `subset` whose domains exclude every channel
    /// that conflicts with a pinned station outside `subset`. `None` if the
    /// pinned stations conflict among themselves or pinning empties a domain.
    fn pinned_sub_instance(
        &self,
        instance: &StationPackingInstance,
        subset: &BTreeSet<Station>,
        pinned: &BTreeMap<Station, Channel>,
    ) -> Result<Option<StationPackingInstance>, SolverFault> {
        if !self
            .constraints
            .is_satisfying(&Assignment::from_station_map(pinned))
        {
            return Ok(None);
        }

        let mut domains = BTreeMap::new();
        for &station in subset {
            let Some(domain) = instance.domain(station) else {
                continue;
            };
            let free: BTreeSet<Channel> = domain
                .iter()
                .copied()
                .filter(|&channel| {
                    self.constraints
                        .interfering(station, channel)
                        .iter()
                        .all(|(other, other_channel)| pinned.get(other) != Some(other_channel))
                })
                .collect();
            if free.is_empty() {
                trace!("pinning leaves {} without a channel", station);
                return Ok(None);
            }
            domains.insert(station, free);
        }
        Ok(Some(instance.restricted_to(subset).with_domains(domains)?))
    }

    fn presolve(
        &self,
        instance: &StationPackingInstance,
        missing: &BTreeSet<Station>,
        previous: &BTreeMap<Station, Channel>,
        criterion: &dyn TerminationCriterion,
        seed: u64,
    ) -> Result<Option<SolverResult>, SolverFault> {
        let start = Instant::now();
        let graph = InterferenceGraph::build(instance, self.constraints.as_ref());

        for subset in self.strategy.subsets(&graph, missing, seed) {
            if subset.len() >= instance.num_stations() {
                debug!("neighbourhood of {} grew to the whole instance", instance);
                break;
            }

            let pinned: BTreeMap<Station, Channel> = previous
                .iter()
                .filter(|(station, _)| !subset.contains(*station))
                .map(|(&station, &channel)| (station, channel))
                .collect();
            let sat_candidate = self.pinned_sub_instance(instance, &subset, &pinned)?;
            let unsat_candidate = instance.restricted_to(&subset);

            for cutoff in self.schedule.cutoffs() {
                if criterion.has_to_stop() {
                    return Ok(None);
                }
                let limit = WalltimeCriterion::new(cutoff.min(criterion.remaining_time()));
                let mut attempt = DisjunctiveCriterion::with_capacity(2);
                attempt.add_criterion(criterion);
                attempt.add_criterion(&limit);
                trace!("certifying {} stations with cutoff {:?}", subset.len(), cutoff);

                let mut settled = true;
                if let Some(sub_instance) = &sat_candidate {
                    let result = self.certifier.solve(sub_instance, &attempt, seed)?;
                    if result.is_sat() {
                        let mut assignment = result.into_assignment();
                        for (&station, &channel) in &pinned {
                            assignment.assign(station, channel);
                        }
                        debug!("presolver certified SAT with {} repacked stations", subset.len());
                        return Ok(Some(SolverResult::sat(
                            assignment,
                            start.elapsed(),
                            SolvedBy::Presolver,
                        )));
                    }
                    settled &= result.is_conclusive();
                }

                let result = self.certifier.solve(&unsat_candidate, &attempt, seed)?;
                if result.is_unsat() {
                    debug!("presolver certified UNSAT on {} stations", subset.len());
                    return Ok(Some(SolverResult::unsat(
                        start.elapsed(),
                        SolvedBy::Presolver,
                    )));
                }
                settled &= result.is_conclusive();

                if settled {
                    break;
                }
            }
        }
        Ok(None)
    }
}

impl<S> Solver for NeighbourhoodPresolver<S>
where
    S: Solver,
{
    fn name(&self) -> &str {
        "NeighbourhoodPresolver"
    }

    fn solve(
        &self,
        instance: &StationPackingInstance,
        criterion: &dyn TerminationCriterion,
        seed: u64,
    ) -> SolveResult {
        let start = Instant::now();
        let previous: BTreeMap<Station, Channel> = instance
            .previous_assignment()
            .iter()
            .filter(|(&station, &channel)| {
                instance
                    .domain(station)
                    .is_some_and(|domain| domain.contains(&channel))
            })
            .map(|(&station, &channel)| (station, channel))
            .collect();
        let missing: BTreeSet<Station> = instance
            .stations()
            .filter(|station| !previous.contains_key(station))
            .collect();

        if previous.is_empty() || missing.is_empty() {
            return self.inner.solve(instance, criterion, seed);
        }

        let budget = WalltimeCriterion::new(self.budget);
        let mut presolve_criterion = DisjunctiveCriterion::with_capacity(2);
        presolve_criterion.add_criterion(criterion);
        presolve_criterion.add_criterion(&budget);

        if let Some(result) =
            self.presolve(instance, &missing, &previous, &presolve_criterion, seed)?
        {
            return Ok(result);
        }

        let overhead = start.elapsed();
        Ok(self
            .inner
            .solve(instance, criterion, seed)?
            .with_added_runtime(overhead))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{co_channel, dpll_solver, instance, instance_with_previous, FixedSolver};
    use packing_model::validation::validate_assignment;
    use packing_presolve::neighbourhood::NeighbourLayerStrategy;
    use packing_search::result::SatResult;
    use packing_search::termination::never::NeverEndingCriterion;

    fn presolver(constraints: Arc<dyn ConstraintManager>) -> NeighbourhoodPresolver<FixedSolver> {
        NeighbourhoodPresolver::new(
            FixedSolver::new(SolverResult::timeout(Duration::ZERO)),
            Arc::new(dpll_solver(constraints.clone())),
            Arc::new(NeighbourLayerStrategy::default()),
            constraints,
        )
        .with_schedule(DeepeningSchedule::new(Duration::from_millis(200), 2.0, 2))
    }

    #[test]
    fn test_new_station_is_packed_around_previous_assignment() {
        let constraints = co_channel(&[(1, 3, 14)]);
        let solver = presolver(constraints.clone());
        let instance = instance_with_previous(
            &[(1, &[14, 15]), (2, &[15, 16]), (3, &[14])],
            &[(1, 14), (2, 15)],
        );

        let result = solver.solve(&instance, &NeverEndingCriterion, 0).unwrap();
        assert_eq!(result.result(), SatResult::Sat);
        assert_eq!(result.solved_by(), SolvedBy::Presolver);
        assert!(validate_assignment(&instance, result.assignment(), constraints.as_ref()).is_ok());
        assert_eq!(result.assignment().channel_of(Station::new(2)), Some(Channel::new(15)));
        assert_eq!(solver.inner.calls(), 0);
    }

    #[test]
    fn test_unsat_neighbourhood_proves_instance_unsat() {
        let constraints = co_channel(&[(1, 2, 14)]);
        let solver = presolver(constraints);
        let instance = instance_with_previous(&[(1, &[14]), (2, &[14]), (3, &[15])], &[(3, 15)]);

        let result = solver.solve(&instance, &NeverEndingCriterion, 0).unwrap();
        assert_eq!(result.result(), SatResult::Unsat);
        assert_eq!(result.solved_by(), SolvedBy::Presolver);
        assert_eq!(solver.inner.calls(), 0);
    }

    #[test]
    fn test_without_previous_assignment_delegates() {
        let constraints = co_channel(&[(1, 2, 14)]);
        let solver = presolver(constraints);
        let result = solver
            .solve(&instance(&[(1, &[14, 15]), (2, &[14])]), &NeverEndingCriterion, 0)
            .unwrap();
        assert_eq!(result.result(), SatResult::Timeout);
        assert_eq!(solver.inner.calls(), 1);
    }
}
