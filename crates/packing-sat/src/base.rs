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

//! # SAT-Based Base Solver
//!
//! The innermost `Solver` of every pipeline: encode the instance, lease an
//! engine from the pool, run it under the query's criterion, and decode the
//! model. Everything else in the pipeline exists to keep the formulas handed
//! to this stage small.
//!
//! Engine failures are fatal (`SolverFault::EngineCrashed`); a fired
//! criterion yields TIMEOUT or INTERRUPTED depending on why it fired.

use crate::encoder;
use crate::engine::{EngineError, EngineOutcome, SatEngine};
use crate::pool::EnginePool;
use log::{debug, error};
use packing_model::constraint::ConstraintManager;
use packing_model::instance::StationPackingInstance;
use packing_search::fault::SolverFault;
use packing_search::result::{SolvedBy, SolverResult};
use packing_search::solver::{SolveResult, Solver};
use packing_search::termination::criterion::TerminationCriterion;
use std::sync::Arc;
use std::time::Instant;

impl From<EngineError> for SolverFault {
    fn from(err: EngineError) -> Self {
        SolverFault::EngineCrashed(err.to_string())
    }
}

pub struct SatBasedSolver<E> {
    pool: Arc<EnginePool<E>>,
    constraints: Arc<dyn ConstraintManager>,
}

impl<E> std::fmt::Debug for SatBasedSolver<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SatBasedSolver")
            .field("pool", &self.pool)
            .finish()
    }
}

impl<E> SatBasedSolver<E>
where
    E: SatEngine,
{
    #[inline]
    pub fn new(pool: Arc<EnginePool<E>>, constraints: Arc<dyn ConstraintManager>) -> Self {
        Self { pool, constraints }
    }

    #[inline]
    pub fn pool(&self) -> &EnginePool<E> {
        &self.pool
    }
}

impl<E> Solver for SatBasedSolver<E>
where
    E: SatEngine,
{
    fn name(&self) -> &str {
        "SatBasedSolver"
    }

    fn solve(
        &self,
        instance: &StationPackingInstance,
        criterion: &dyn TerminationCriterion,
        seed: u64,
    ) -> SolveResult {
        let start = Instant::now();

        if instance.is_empty() {
            return Ok(SolverResult::sat(
                Default::default(),
                start.elapsed(),
                SolvedBy::EmptyInstance,
            ));
        }
        if criterion.has_to_stop() {
            return Ok(SolverResult::stopped(criterion, start.elapsed()));
        }

        let (cnf, variables) = encoder::encode(instance, self.constraints.as_ref());
        debug!(
            "encoded {} stations into {} variables and {} clauses",
            instance.num_stations(),
            cnf.num_vars(),
            cnf.num_clauses()
        );

        let Some(mut engine) = self.pool.checkout(criterion) else {
            return Ok(SolverResult::stopped(criterion, start.elapsed()));
        };

        let outcome = engine.solve(&cnf, criterion, seed).map_err(|err| {
            error!("SAT engine failed on `{}`: {}", instance.name(), err);
            SolverFault::from(err)
        })?;
        drop(engine);

        let result = match outcome {
            EngineOutcome::Satisfiable(model) => SolverResult::sat(
                variables.decode(&model),
                start.elapsed(),
                SolvedBy::SatEngine,
            ),
            EngineOutcome::Unsatisfiable => {
                SolverResult::unsat(start.elapsed(), SolvedBy::SatEngine)
            }
            EngineOutcome::Stopped => SolverResult::stopped(criterion, start.elapsed()),
        };
        debug!("SAT engine finished: {}", result);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cnf::Cnf;
    use crate::dpll::DpllEngine;
    use packing_model::constraint::ConstraintSet;
    use packing_model::index::{Channel, Station};
    use packing_model::instance::InstanceBuilder;
    use packing_model::validation::validate_assignment;
    use packing_search::result::SatResult;
    use packing_search::termination::interrupt::InterruptibleCriterion;
    use packing_search::termination::never::NeverEndingCriterion;
    use packing_search::termination::walltime::WalltimeCriterion;
    use std::time::Duration;

    fn s(id: u32) -> Station {
        Station::new(id)
    }

    fn c(id: u32) -> Channel {
        Channel::new(id)
    }

    struct CrashingEngine;

    impl SatEngine for CrashingEngine {
        fn name(&self) -> &str {
            "CrashingEngine"
        }

        fn solve(
            &mut self,
            _cnf: &Cnf,
            _criterion: &dyn TerminationCriterion,
            _seed: u64,
        ) -> Result<EngineOutcome, EngineError> {
            Err(EngineError::Crashed {
                engine: "CrashingEngine".to_string(),
                message: "segfault in native code".to_string(),
            })
        }
    }

    fn dpll_solver(constraints: ConstraintSet) -> SatBasedSolver<DpllEngine> {
        SatBasedSolver::new(
            Arc::new(EnginePool::with_factory(1, DpllEngine::new)),
            Arc::new(constraints),
        )
    }

    #[test]
    fn test_sat_witness_verifies() {
        let mut builder = InstanceBuilder::new();
        for id in 1..=3 {
            builder.add_station(s(id), [c(14), c(15)]);
        }
        let instance = builder.build().unwrap();
        let mut constraints = ConstraintSet::new();
        constraints.add_co_channel(s(1), s(2), c(14));
        constraints.add_co_channel(s(1), s(2), c(15));
        constraints.add_co_channel(s(2), s(3), c(15));

        let solver = dpll_solver(constraints.clone());
        let result = solver.solve(&instance, &NeverEndingCriterion, 1).unwrap();
        assert_eq!(result.result(), SatResult::Sat);
        assert_eq!(result.solved_by(), SolvedBy::SatEngine);
        assert_eq!(
            validate_assignment(&instance, result.assignment(), &constraints),
            Ok(())
        );
        assert_eq!(solver.pool().idle_count(), 1);
    }

    #[test]
    fn test_two_stations_one_channel_is_unsat() {
        let mut builder = InstanceBuilder::new();
        builder
            .add_station(s(1), [c(14)])
            .add_station(s(2), [c(14)]);
        let instance = builder.build().unwrap();
        let mut constraints = ConstraintSet::new();
        constraints.add_co_channel(s(1), s(2), c(14));

        let result = dpll_solver(constraints)
            .solve(&instance, &NeverEndingCriterion, 0)
            .unwrap();
        assert_eq!(result.result(), SatResult::Unsat);
    }

    #[test]
    fn test_empty_instance_is_sat() {
        let instance = InstanceBuilder::new().build().unwrap();
        let result = dpll_solver(ConstraintSet::new())
            .solve(&instance, &NeverEndingCriterion, 0)
            .unwrap();
        assert!(result.is_sat());
        assert_eq!(result.solved_by(), SolvedBy::EmptyInstance);
    }

    #[test]
    fn test_fired_criterion_reports_timeout_or_interrupt() {
        let mut builder = InstanceBuilder::new();
        builder.add_station(s(1), [c(14)]);
        let instance = builder.build().unwrap();
        let solver = dpll_solver(ConstraintSet::new());

        let expired = WalltimeCriterion::new(Duration::ZERO);
        let result = solver.solve(&instance, &expired, 0).unwrap();
        assert_eq!(result.result(), SatResult::Timeout);

        let interrupted = InterruptibleCriterion::new(NeverEndingCriterion);
        interrupted.interrupt();
        let result = solver.solve(&instance, &interrupted, 0).unwrap();
        assert_eq!(result.result(), SatResult::Interrupted);
    }

    #[test]
    fn test_engine_crash_is_fatal() {
        let mut builder = InstanceBuilder::new();
        builder.add_station(s(1), [c(14)]);
        let instance = builder.build().unwrap();
        let solver = SatBasedSolver::new(
            Arc::new(EnginePool::new(vec![CrashingEngine])),
            Arc::new(ConstraintSet::new()),
        );

        match solver.solve(&instance, &NeverEndingCriterion, 0) {
            Err(SolverFault::EngineCrashed(message)) => {
                assert!(message.contains("segfault"), "unexpected message: {message}")
            }
            other => panic!("expected EngineCrashed, got {:?}", other),
        }
        assert_eq!(solver.pool().idle_count(), 1);
    }
}
