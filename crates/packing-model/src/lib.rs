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

//! # Packing Model
//!
//! **The core domain model for station packing feasibility queries.**
//!
//! A station packing query asks whether every station can be placed on a
//! channel from its own domain such that no pair of interfering
//! (station, channel) placements is used simultaneously. This crate defines the
//! data exchanged between the caller and the solving pipeline.
//!
//! ## Architecture
//!
//! * **`index`**: Strongly-typed identifiers (`Station`, `Channel`) so the two
//!   integer spaces cannot be confused.
//! * **`instance`**: The immutable `StationPackingInstance` and its
//!   `InstanceBuilder`. Decorators narrow an instance by building new ones
//!   (`restricted_to`, `without`, `with_domains`), never by mutation.
//! * **`assignment`**: `Assignment`, a channel to station-set mapping that
//!   carries witnesses out of the pipeline.
//! * **`constraint`**: The `ConstraintManager` capability and `ConstraintSet`,
//!   an in-memory implementation over forbidden placement pairs.
//! * **`graph`**: The `InterferenceGraph` over the stations of one instance.
//! * **`validation`**: Independent verification of an assignment against an
//!   instance and a constraint manager.
//! * **`error`**: `InstanceError` and `ValidationError`.
//!
//! ## Design Philosophy
//!
//! 1.  **Type Safety**: a `Channel` can never be used where a `Station` is expected.
//! 2.  **Determinism**: ordered maps and sets everywhere a result is iterated,
//!     so decomposition order and witnesses are reproducible.
//! 3.  **Fail-Fast**: builders validate eagerly; a constructed instance always
//!     satisfies its invariants.

pub mod assignment;
pub mod constraint;
pub mod error;
pub mod graph;
pub mod index;
pub mod instance;
pub mod validation;
