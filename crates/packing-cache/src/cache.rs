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

//! The containment cache capability.
//!
//! Implementations may be local or network-backed. Every call can fail with
//! a `CacheError`, which callers treat as "no answer" rather than as a
//! failed query.

use crate::error::Result;
use crate::fingerprint::{CacheCoordinate, Fingerprint};
use packing_model::assignment::Assignment;
use packing_model::instance::StationPackingInstance;
use packing_search::result::SolverResult;

/// A cached SAT instance containing the query, with its witness restricted
/// to the query's stations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SatHit {
    pub fingerprint: Fingerprint,
    pub assignment: Assignment,
}

/// A cached UNSAT instance contained in the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnsatHit {
    pub fingerprint: Fingerprint,
}

pub trait ContainmentCache: Send + Sync {
    /// Returns the name of the cache.
    fn name(&self) -> &str;

    /// Stores a conclusive result. Inconclusive results are ignored.
    /// Returns `true` if a new entry was written and `false` if the result
    /// was inconclusive or an entry with the same fingerprint exists.
    fn put_result(
        &self,
        coordinate: &CacheCoordinate,
        instance: &StationPackingInstance,
        result: &SolverResult,
    ) -> Result<bool>;

    /// Looks for a cached SAT instance whose stations contain the query's and
    /// whose witness places every query station inside the query's domain.
    fn superset_sat(
        &self,
        coordinate: &CacheCoordinate,
        instance: &StationPackingInstance,
    ) -> Result<Option<SatHit>>;

    /// Looks for a cached UNSAT instance whose stations and domains are
    /// contained in the query's.
    fn subset_unsat(
        &self,
        coordinate: &CacheCoordinate,
        instance: &StationPackingInstance,
    ) -> Result<Option<UnsatHit>>;
}

impl std::fmt::Debug for dyn ContainmentCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ContainmentCache({})", self.name())
    }
}

impl<C> ContainmentCache for std::sync::Arc<C>
where
    C: ContainmentCache + ?Sized,
{
    fn name(&self) -> &str {
        (**self).name()
    }

    fn put_result(
        &self,
        coordinate: &CacheCoordinate,
        instance: &StationPackingInstance,
        result: &SolverResult,
    ) -> Result<bool> {
        (**self).put_result(coordinate, instance, result)
    }

    fn superset_sat(
        &self,
        coordinate: &CacheCoordinate,
        instance: &StationPackingInstance,
    ) -> Result<Option<SatHit>> {
        (**self).superset_sat(coordinate, instance)
    }

    fn subset_unsat(
        &self,
        coordinate: &CacheCoordinate,
        instance: &StationPackingInstance,
    ) -> Result<Option<UnsatHit>> {
        (**self).subset_unsat(coordinate, instance)
    }
}
