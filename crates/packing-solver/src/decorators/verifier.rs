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

//! Mandatory verification of SAT witnesses.
//!
//! Every SAT result passing through this stage is checked against the
//! instance it claims to solve: each station assigned exactly once, on a
//! channel of its domain, with no violated constraint. A failed check is a
//! fatal `SolverFault::VerificationFailed`, never a downgraded verdict.

use log::{error, trace};
use packing_model::constraint::ConstraintManager;
use packing_model::instance::StationPackingInstance;
use packing_model::validation::validate_assignment;
use packing_search::fault::SolverFault;
use packing_search::result::SolverResult;
use packing_search::solver::{SolveResult, Solver};
use packing_search::termination::criterion::TerminationCriterion;
use std::sync::Arc;

/// Checks `result` against `instance` if it is SAT.
///
/// # Errors
///
/// Returns `SolverFault::VerificationFailed` if the witness is not a valid
/// packing of `instance`.
pub fn verify_result(
    instance: &StationPackingInstance,
    result: &SolverResult,
    constraints: &dyn ConstraintManager,
) -> Result<(), SolverFault> {
    if !result.is_sat() {
        return Ok(());
    }
    validate_assignment(instance, result.assignment(), constraints).map_err(|source| {
        error!(
            "witness from {} failed verification on {}: {}",
            result.solved_by(),
            instance,
            source
        );
        SolverFault::VerificationFailed {
            instance: instance.name().to_string(),
            source,
        }
    })
}

pub struct VerifierDecorator<S> {
    inner: S,
    constraints: Arc<dyn ConstraintManager>,
}

impl<S> VerifierDecorator<S> {
    #[inline]
    pub fn new(inner: S, constraints: Arc<dyn ConstraintManager>) -> Self {
        Self { inner, constraints }
    }
}

impl<S> Solver for VerifierDecorator<S>
where
    S: Solver,
{
    fn name(&self) -> &str {
        "VerifierDecorator"
    }

    fn solve(
        &self,
        instance: &StationPackingInstance,
        criterion: &dyn TerminationCriterion,
        seed: u64,
    ) -> SolveResult {
        let result = self.inner.solve(instance, criterion, seed)?;
        verify_result(instance, &result, self.constraints.as_ref())?;
        if result.is_sat() {
            trace!("verified witness for {}", instance);
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{instance, FixedSolver};
    use packing_model::constraint::ConstraintSet;
    use packing_model::error::ValidationError;
    use packing_model::index::{Channel, Station};
    use packing_search::result::{SatResult, SolvedBy};
    use packing_search::termination::never::NeverEndingCriterion;
    use std::time::Duration;

    fn constraints() -> Arc<dyn ConstraintManager> {
        let mut set = ConstraintSet::new();
        set.add_co_channel(Station::new(1), Station::new(2), Channel::new(14));
        Arc::new(set)
    }

    #[test]
    fn test_valid_witness_passes() {
        let witness = [(Station::new(1), Channel::new(14)), (Station::new(2), Channel::new(15))]
            .into_iter()
            .collect();
        let inner = FixedSolver::new(SolverResult::sat(witness, Duration::ZERO, SolvedBy::SatEngine));
        let solver = VerifierDecorator::new(inner, constraints());

        let result = solver
            .solve(&instance(&[(1, &[14, 15]), (2, &[14, 15])]), &NeverEndingCriterion, 0)
            .unwrap();
        assert_eq!(result.result(), SatResult::Sat);
    }

    #[test]
    fn test_corrupted_witness_is_fatal() {
        let witness = [(Station::new(1), Channel::new(14)), (Station::new(2), Channel::new(14))]
            .into_iter()
            .collect();
        let inner = FixedSolver::new(SolverResult::sat(witness, Duration::ZERO, SolvedBy::SupersetCache));
        let solver = VerifierDecorator::new(inner, constraints());

        match solver.solve(&instance(&[(1, &[14, 15]), (2, &[14, 15])]), &NeverEndingCriterion, 0) {
            Err(SolverFault::VerificationFailed {
                source: ValidationError::ConstraintViolated { .. },
                ..
            }) => {}
            other => panic!("expected VerificationFailed, got {:?}", other),
        }
    }

    #[test]
    fn test_unsat_passes_through_unchecked() {
        let inner = FixedSolver::new(SolverResult::unsat(Duration::ZERO, SolvedBy::SatEngine));
        let solver = VerifierDecorator::new(inner, constraints());
        let result = solver
            .solve(&instance(&[(1, &[14])]), &NeverEndingCriterion, 0)
            .unwrap();
        assert!(result.is_unsat());
    }
}
