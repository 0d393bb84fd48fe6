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

//! # Packing Solver
//!
//! Orchestration of station packing queries. The stages here wrap the pure
//! algorithms of `packing-presolve`, the containment cache of
//! `packing-cache`, and the SAT-backed base solver of `packing-sat` into
//! composable `Solver`s.
//!
//! ## Modules
//!
//! - `decorators`: Pipeline stages that answer, rewrite, or post-process a
//!   query around an inner solver.
//! - `parallel`: `ParallelComposite`, racing several solvers on one query.
//! - `watchdog`: Supervision of solvers that may not honour interrupts.
//! - `pipeline`: `PipelineBuilder` and the `StageDescriptor` list it builds
//!   from.
//! - `facade`: The `SolveRequest`/`SolveResponse` boundary.

pub mod decorators;
pub mod facade;
pub mod parallel;
pub mod pipeline;
pub mod watchdog;

#[cfg(test)]
mod testing;
