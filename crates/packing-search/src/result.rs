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

//! # Solver Results
//!
//! The immutable outcome of one `solve` call and the two rules for combining
//! several of them.
//!
//! ## Highlights
//!
//! - `SatResult` is the verdict. SAT and UNSAT are conclusive; TIMEOUT,
//!   INTERRUPTED, and CRASHED are not.
//! - `SolverResult` pairs the verdict with a witness `Assignment`, the
//!   runtime, and a diagnostic `SolvedBy`. The witness is non-empty only for
//!   SAT; constructors drop it for every other verdict.
//! - `merge_component_results` combines results of independent
//!   sub-instances of one instance: SAT only if every part is SAT, otherwise
//!   the most severe failure by UNSAT > INTERRUPTED > CRASHED > TIMEOUT.
//! - `combine_portfolio_results` combines results of competing solvers on the
//!   same instance: the best verdict by SAT > UNSAT > INTERRUPTED > CRASHED >
//!   TIMEOUT. A SAT next to an UNSAT is a fault.

use crate::fault::SolverFault;
use crate::termination::criterion::TerminationCriterion;
use packing_model::assignment::Assignment;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SatResult {
    /// A witness assignment exists and was produced.
    Sat,
    /// No assignment exists.
    Unsat,
    /// The deadline passed before a verdict was reached.
    Timeout,
    /// The query was interrupted before a verdict was reached.
    Interrupted,
    /// The solver failed in a way that yields no verdict.
    Crashed,
}

impl SatResult {
    /// Returns `true` for SAT and UNSAT.
    #[inline]
    pub fn is_conclusive(&self) -> bool {
        matches!(self, SatResult::Sat | SatResult::Unsat)
    }

    /// Severity when merging components of one instance; higher wins.
    #[inline]
    fn component_severity(&self) -> u8 {
        match self {
            SatResult::Sat => 0,
            SatResult::Timeout => 1,
            SatResult::Crashed => 2,
            SatResult::Interrupted => 3,
            SatResult::Unsat => 4,
        }
    }

    /// Preference when combining competing solvers on one instance; higher wins.
    #[inline]
    fn portfolio_preference(&self) -> u8 {
        match self {
            SatResult::Timeout => 0,
            SatResult::Crashed => 1,
            SatResult::Interrupted => 2,
            SatResult::Unsat => 3,
            SatResult::Sat => 4,
        }
    }
}

impl std::fmt::Display for SatResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SatResult::Sat => write!(f, "SAT"),
            SatResult::Unsat => write!(f, "UNSAT"),
            SatResult::Timeout => write!(f, "TIMEOUT"),
            SatResult::Interrupted => write!(f, "INTERRUPTED"),
            SatResult::Crashed => write!(f, "CRASHED"),
        }
    }
}

/// Which stage produced a result. Diagnostic only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SolvedBy {
    #[default]
    Unknown,
    SatEngine,
    EmptyInstance,
    PreviousAssignment,
    SupersetCache,
    SubsetCache,
    ArcConsistency,
    Presolver,
    /// Several stages contributed, e.g. different components were answered
    /// by different stages.
    Mixed,
}

impl std::fmt::Display for SolvedBy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SolvedBy::Unknown => "unknown",
            SolvedBy::SatEngine => "sat-engine",
            SolvedBy::EmptyInstance => "empty-instance",
            SolvedBy::PreviousAssignment => "previous-assignment",
            SolvedBy::SupersetCache => "superset-cache",
            SolvedBy::SubsetCache => "subset-cache",
            SolvedBy::ArcConsistency => "arc-consistency",
            SolvedBy::Presolver => "presolver",
            SolvedBy::Mixed => "mixed",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolverResult {
    result: SatResult,
    assignment: Assignment,
    runtime: Duration,
    solved_by: SolvedBy,
}

impl SolverResult {
    /// Creates a result. The assignment is discarded unless `result` is SAT.
    pub fn new(
        result: SatResult,
        assignment: Assignment,
        runtime: Duration,
        solved_by: SolvedBy,
    ) -> Self {
        let assignment = if result == SatResult::Sat {
            assignment
        } else {
            Assignment::new()
        };
        Self {
            result,
            assignment,
            runtime,
            solved_by,
        }
    }

    #[inline]
    pub fn sat(assignment: Assignment, runtime: Duration, solved_by: SolvedBy) -> Self {
        Self::new(SatResult::Sat, assignment, runtime, solved_by)
    }

    #[inline]
    pub fn unsat(runtime: Duration, solved_by: SolvedBy) -> Self {
        Self::new(SatResult::Unsat, Assignment::new(), runtime, solved_by)
    }

    #[inline]
    pub fn timeout(runtime: Duration) -> Self {
        Self::new(SatResult::Timeout, Assignment::new(), runtime, SolvedBy::Unknown)
    }

    #[inline]
    pub fn interrupted(runtime: Duration) -> Self {
        Self::new(
            SatResult::Interrupted,
            Assignment::new(),
            runtime,
            SolvedBy::Unknown,
        )
    }

    #[inline]
    pub fn crashed(runtime: Duration) -> Self {
        Self::new(SatResult::Crashed, Assignment::new(), runtime, SolvedBy::Unknown)
    }

    /// The result of a solver that gave up because `criterion` fired:
    /// INTERRUPTED if it was interrupted, TIMEOUT otherwise.
    pub fn stopped(criterion: &dyn TerminationCriterion, runtime: Duration) -> Self {
        if criterion.was_interrupted() {
            Self::interrupted(runtime)
        } else {
            Self::timeout(runtime)
        }
    }

    #[inline]
    pub fn result(&self) -> SatResult {
        self.result
    }

    #[inline]
    pub fn assignment(&self) -> &Assignment {
        &self.assignment
    }

    #[inline]
    pub fn into_assignment(self) -> Assignment {
        self.assignment
    }

    #[inline]
    pub fn runtime(&self) -> Duration {
        self.runtime
    }

    #[inline]
    pub fn solved_by(&self) -> SolvedBy {
        self.solved_by
    }

    #[inline]
    pub fn is_sat(&self) -> bool {
        self.result == SatResult::Sat
    }

    #[inline]
    pub fn is_unsat(&self) -> bool {
        self.result == SatResult::Unsat
    }

    #[inline]
    pub fn is_conclusive(&self) -> bool {
        self.result.is_conclusive()
    }

    #[inline]
    pub fn with_runtime(mut self, runtime: Duration) -> Self {
        self.runtime = runtime;
        self
    }

    #[inline]
    pub fn with_added_runtime(mut self, extra: Duration) -> Self {
        self.runtime = self.runtime.saturating_add(extra);
        self
    }

    #[inline]
    pub fn with_solved_by(mut self, solved_by: SolvedBy) -> Self {
        self.solved_by = solved_by;
        self
    }

    #[inline]
    pub fn with_assignment(mut self, assignment: Assignment) -> Self {
        if self.result == SatResult::Sat {
            self.assignment = assignment;
        }
        self
    }
}

impl std::fmt::Display for SolverResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} in {:.3}s (solved by {}",
            self.result,
            self.runtime.as_secs_f64(),
            self.solved_by
        )?;
        if self.result == SatResult::Sat {
            write!(f, ", {} stations assigned", self.assignment.len())?;
        }
        write!(f, ")")
    }
}

fn merged_solved_by<'a, I>(results: I) -> SolvedBy
where
    I: IntoIterator<Item = &'a SolverResult>,
{
    let mut iter = results.into_iter().map(SolverResult::solved_by);
    match iter.next() {
        None => SolvedBy::Unknown,
        Some(first) if iter.all(|other| other == first) => first,
        Some(_) => SolvedBy::Mixed,
    }
}

/// Merges the results of the independent parts of one instance.
///
/// The merge is SAT only if every part is SAT, in which case the witnesses
/// are unioned. Otherwise the verdict is the most severe among the parts by
/// UNSAT > INTERRUPTED > CRASHED > TIMEOUT. Runtimes add up, since the parts
/// were solved one after the other. Merging nothing yields SAT with an empty
/// witness.
pub fn merge_component_results(results: &[SolverResult]) -> SolverResult {
    let runtime = results
        .iter()
        .fold(Duration::ZERO, |acc, r| acc.saturating_add(r.runtime));

    let worst = results
        .iter()
        .filter(|r| r.result != SatResult::Sat)
        .max_by_key(|r| r.result.component_severity());

    match worst {
        Some(worst) => {
            let same_verdict = results.iter().filter(|r| r.result == worst.result);
            SolverResult::new(
                worst.result,
                Assignment::new(),
                runtime,
                merged_solved_by(same_verdict),
            )
        }
        None => {
            let mut assignment = Assignment::new();
            for r in results {
                assignment.merge(&r.assignment);
            }
            SolverResult::sat(assignment, runtime, merged_solved_by(results))
        }
    }
}

/// Combines the results of competing solvers run on the same instance.
///
/// The best verdict wins by SAT > UNSAT > INTERRUPTED > CRASHED > TIMEOUT and
/// its first holder is returned with the longest runtime among all results,
/// since the solvers ran side by side. Combining nothing yields a zero-time
/// TIMEOUT.
///
/// # Errors
///
/// Returns `SolverFault::ConflictingResults` if one solver reports SAT and
/// another UNSAT.
pub fn combine_portfolio_results(results: &[SolverResult]) -> Result<SolverResult, SolverFault> {
    let has_sat = results.iter().any(SolverResult::is_sat);
    let has_unsat = results.iter().any(SolverResult::is_unsat);
    if has_sat && has_unsat {
        return Err(SolverFault::ConflictingResults {
            first: SatResult::Sat,
            second: SatResult::Unsat,
        });
    }

    let runtime = results
        .iter()
        .map(SolverResult::runtime)
        .max()
        .unwrap_or(Duration::ZERO);

    // `max_by_key` keeps the last maximum; reverse to favour the first holder.
    let best = results
        .iter()
        .rev()
        .max_by_key(|r| r.result.portfolio_preference());

    Ok(match best {
        Some(best) => best.clone().with_runtime(runtime),
        None => SolverResult::timeout(Duration::ZERO),
    })
}
