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

//! # Termination Criteria
//!
//! The deadline and interruption abstraction of one query. A criterion is
//! created fresh for every top-level query and shared by reference through
//! the whole pipeline and every parallel branch of that query; it is never
//! reused across queries.
//!
//! - `criterion`: The `TerminationCriterion` trait.
//! - `walltime`: A wall-clock deadline.
//! - `interrupt`: An interruptible wrapper around another criterion.
//! - `composite`: The OR-combination of several criteria.
//! - `never`: A criterion that never fires.

pub mod composite;
pub mod criterion;
pub mod interrupt;
pub mod never;
pub mod walltime;
