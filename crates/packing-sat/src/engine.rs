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

//! # SAT Engine Capability
//!
//! What the pipeline requires of a SAT backend: accept a clause set, return
//! a verdict and (if satisfiable) a model, and stop mid-call once the
//! termination criterion fires. Backend handles are assumed non-reentrant,
//! hence `&mut self`; sharing them across branches goes through
//! `pool::EnginePool`.

use crate::cnf::Cnf;
use packing_search::termination::criterion::TerminationCriterion;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineOutcome {
    /// A model, indexed by `var - 1`.
    Satisfiable(Vec<bool>),
    Unsatisfiable,
    /// The criterion fired before a verdict was reached.
    Stopped,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("engine `{engine}` crashed: {message}")]
    Crashed { engine: String, message: String },

    #[error("engine `{engine}` returned a model that does not satisfy the formula")]
    InvalidModel { engine: String },
}

pub trait SatEngine: Send {
    /// Returns the name of the engine.
    fn name(&self) -> &str;

    /// Decides `cnf`, polling `criterion` while searching.
    ///
    /// # Errors
    ///
    /// Returns `EngineError` when the backend fails; a fired criterion is not
    /// an error.
    fn solve(
        &mut self,
        cnf: &Cnf,
        criterion: &dyn TerminationCriterion,
        seed: u64,
    ) -> Result<EngineOutcome, EngineError>;
}

impl std::fmt::Debug for dyn SatEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SatEngine({})", self.name())
    }
}

impl<E> SatEngine for Box<E>
where
    E: SatEngine + ?Sized,
{
    fn name(&self) -> &str {
        (**self).name()
    }

    fn solve(
        &mut self,
        cnf: &Cnf,
        criterion: &dyn TerminationCriterion,
        seed: u64,
    ) -> Result<EngineOutcome, EngineError> {
        (**self).solve(cnf, criterion, seed)
    }
}
