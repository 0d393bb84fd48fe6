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

//! # Packing Presolve
//!
//! Pure, solver-independent algorithms over station packing instances. None
//! of these touch a SAT engine; the decorators in the orchestration crate
//! wrap them into pipeline stages.
//!
//! ## Modules
//!
//! - `components`: Splitting an instance into independent sub-problems along
//!   the connected components of its interference graph.
//! - `underconstrained`: Finding stations that always have a free channel
//!   whatever their neighbours do.
//! - `arc_consistency`: AC-3 domain pruning with early UNSAT on wipe-out.
//! - `neighbourhood`: Growing a station subset through the interference
//!   graph, layer by layer or by random sampling.
//! - `deepening`: Iteratively deepening cutoff schedules.

pub mod arc_consistency;
pub mod components;
pub mod deepening;
pub mod neighbourhood;
pub mod underconstrained;
