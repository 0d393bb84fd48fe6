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

//! Fatal faults of the solving pipeline.
//!
//! A `SolverFault` aborts the query. Faults are never converted into UNSAT or
//! TIMEOUT, since either would be a wrong answer presented as a legitimate
//! one.

use crate::result::SatResult;
use packing_model::error::{InstanceError, ValidationError};
use packing_model::index::Station;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SolverFault {
    #[error("assignment for `{instance}` failed verification: {source}")]
    VerificationFailed {
        instance: String,
        #[source]
        source: ValidationError,
    },

    #[error("could not reinsert underconstrained {station}: every domain channel conflicts with an assigned neighbour")]
    ReinsertionFailed { station: Station },

    #[error("SAT engine crashed: {0}")]
    EngineCrashed(String),

    #[error("solver hung: no result after {elapsed:?}, exceeding the deadline plus grace period")]
    SolverHung { elapsed: std::time::Duration },

    #[error("branch `{branch}` panicked: {message}")]
    BranchPanicked { branch: String, message: String },

    #[error("recursion depth limit {limit} exceeded in {stage}")]
    RecursionLimitExceeded { stage: &'static str, limit: usize },

    #[error("conflicting conclusive results: {first} and {second}")]
    ConflictingResults { first: SatResult, second: SatResult },

    #[error(transparent)]
    InvalidInstance(#[from] InstanceError),
}

impl SolverFault {
    /// Extracts a readable message from a panic payload.
    pub fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
        if let Some(message) = payload.downcast_ref::<&str>() {
            (*message).to_string()
        } else if let Some(message) = payload.downcast_ref::<String>() {
            message.clone()
        } else {
            "non-string panic payload".to_string()
        }
    }
}
