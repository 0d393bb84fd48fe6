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

//! # Packing Cache
//!
//! A query-level result cache that exploits the monotonicity of station
//! packing feasibility:
//!
//! - if an instance is SAT, every instance it contains is SAT (restrict the
//!   witness);
//! - if an instance is UNSAT, every instance containing it is UNSAT.
//!
//! Entries live inside a `CacheCoordinate`, the (domain data, interference
//! data) universe they were computed in, and are never compared across
//! coordinates. The cache is append-only: per-coordinate data never changes
//! during the lifetime of a process, so nothing ever needs invalidating.
//!
//! ## Modules
//!
//! - `fingerprint`: SHA-256 fingerprints of instances and coordinates.
//! - `cache`: The `ContainmentCache` capability and its entry types.
//! - `memory`: `InMemoryContainmentCache`, a bitset-indexed implementation.
//! - `retry`: `RetryPolicy`, the bounded retry budget for cache calls.
//! - `error`: `CacheError`, the recoverable cache faults.

pub mod cache;
pub mod error;
pub mod fingerprint;
pub mod memory;
pub mod retry;
