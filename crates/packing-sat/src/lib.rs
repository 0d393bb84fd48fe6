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

//! # Packing SAT
//!
//! The bottom of the pipeline: reducing a station packing instance to CNF and
//! handing it to a SAT engine.
//!
//! ## Modules
//!
//! - `cnf`: DIMACS-style literals and clause sets.
//! - `encoder`: The direct encoding of an instance (one variable per
//!   station/channel placement) and the decoding of models back into
//!   assignments.
//! - `engine`: The `SatEngine` capability every backend implements, and its
//!   error type.
//! - `dpll`: A self-contained DPLL backend with watched literals, used as the
//!   reference engine and in tests.
//! - `pool`: `EnginePool`, a checkout/checkin arena for non-reentrant engine
//!   handles.
//! - `base`: `SatBasedSolver`, the `Solver` adapter that ties the above
//!   together.

pub mod base;
pub mod cnf;
pub mod dpll;
pub mod encoder;
pub mod engine;
pub mod pool;
