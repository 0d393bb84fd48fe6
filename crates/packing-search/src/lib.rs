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

//! # Packing Search
//!
//! The abstractions every stage of the station packing pipeline is written
//! against. Decorators, composites, and the SAT-backed base solver all
//! implement the same `Solver` capability and exchange the same
//! `SolverResult`, which is what makes them freely stackable.
//!
//! ## Modules
//!
//! - `solver`: The `Solver` capability and the trivial `VoidSolver`.
//! - `result`: `SatResult`, `SolvedBy`, `SolverResult`, and the two merge
//!   rules (component merge and portfolio combine).
//! - `fault`: `SolverFault`, the fatal internal-consistency errors.
//! - `termination`: Deadline and interruption criteria shared by reference
//!   through one query (`WalltimeCriterion`, `InterruptibleCriterion`,
//!   `DisjunctiveCriterion`, `NeverEndingCriterion`).
//!
//! ## Error Taxonomy
//!
//! Expected terminal outcomes (SAT, UNSAT, TIMEOUT, INTERRUPTED, CRASHED) are
//! values in `SolverResult`. Only faults that would otherwise produce a wrong
//! conclusive answer are returned as `Err(SolverFault)`.

pub mod fault;
pub mod result;
pub mod solver;
pub mod termination;
