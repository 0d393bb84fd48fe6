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

//! # Containment Cache Decorators
//!
//! Three stages share one `ContainmentCache` client:
//!
//! - `SupersetCacheDecorator` answers SAT when a cached SAT instance contains
//!   the query, using the restricted cached witness.
//! - `SubsetCacheDecorator` answers UNSAT when a cached UNSAT instance is
//!   contained in the query.
//! - `CachePopulatorDecorator` stores the conclusive results of its inner
//!   solver, SAT results only after their witness verified.
//!
//! Cache faults are recoverable: each call runs under a `RetryPolicy`, and
//! once that is exhausted the stage logs a warning and carries on as if the
//! cache had no answer.

use crate::decorators::verifier::verify_result;
use log::{debug, warn};
use packing_cache::cache::ContainmentCache;
use packing_cache::fingerprint::CacheCoordinate;
use packing_cache::retry::RetryPolicy;
use packing_model::constraint::ConstraintManager;
use packing_model::instance::StationPackingInstance;
use packing_search::result::{SolvedBy, SolverResult};
use packing_search::solver::{SolveResult, Solver};
use packing_search::termination::criterion::TerminationCriterion;
use std::sync::Arc;
use std::time::Instant;

/// The cache client, data universe, and retry budget of a cache stage.
#[derive(Debug, Clone)]
pub struct CacheBinding {
    pub cache: Arc<dyn ContainmentCache>,
    pub coordinate: CacheCoordinate,
    pub retry: RetryPolicy,
}

impl CacheBinding {
    #[inline]
    pub fn new(cache: Arc<dyn ContainmentCache>, coordinate: CacheCoordinate) -> Self {
        Self {
            cache,
            coordinate,
            retry: RetryPolicy::default(),
        }
    }

    #[inline]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

pub struct SupersetCacheDecorator<S> {
    inner: S,
    binding: CacheBinding,
}

impl<S> SupersetCacheDecorator<S> {
    #[inline]
    pub fn new(inner: S, binding: CacheBinding) -> Self {
        Self { inner, binding }
    }
}

impl<S> Solver for SupersetCacheDecorator<S>
where
    S: Solver,
{
    fn name(&self) -> &str {
        "SupersetCacheDecorator"
    }

    fn solve(
        &self,
        instance: &StationPackingInstance,
        criterion: &dyn TerminationCriterion,
        seed: u64,
    ) -> SolveResult {
        let start = Instant::now();
        let CacheBinding {
            cache,
            coordinate,
            retry,
        } = &self.binding;

        match retry.run("superset lookup", || cache.superset_sat(coordinate, instance)) {
            Ok(Some(hit)) => {
                debug!("superset cache hit {} for {}", hit.fingerprint, instance);
                return Ok(SolverResult::sat(
                    hit.assignment,
                    start.elapsed(),
                    SolvedBy::SupersetCache,
                ));
            }
            Ok(None) => debug!("superset cache miss for {}", instance),
            Err(err) => warn!("continuing without superset cache: {}", err),
        }

        Ok(self
            .inner
            .solve(instance, criterion, seed)?
            .with_added_runtime(start.elapsed()))
    }
}

pub struct SubsetCacheDecorator<S> {
    inner: S,
    binding: CacheBinding,
}

impl<S> SubsetCacheDecorator<S> {
    #[inline]
    pub fn new(inner: S, binding: CacheBinding) -> Self {
        Self { inner, binding }
    }
}

impl<S> Solver for SubsetCacheDecorator<S>
where
    S: Solver,
{
    fn name(&self) -> &str {
        "SubsetCacheDecorator"
    }

    fn solve(
        &self,
        instance: &StationPackingInstance,
        criterion: &dyn TerminationCriterion,
        seed: u64,
    ) -> SolveResult {
        let start = Instant::now();
        let CacheBinding {
            cache,
            coordinate,
            retry,
        } = &self.binding;

        match retry.run("subset lookup", || cache.subset_unsat(coordinate, instance)) {
            Ok(Some(hit)) => {
                debug!("subset cache hit {} for {}", hit.fingerprint, instance);
                return Ok(SolverResult::unsat(start.elapsed(), SolvedBy::SubsetCache));
            }
            Ok(None) => debug!("subset cache miss for {}", instance),
            Err(err) => warn!("continuing without subset cache: {}", err),
        }

        Ok(self
            .inner
            .solve(instance, criterion, seed)?
            .with_added_runtime(start.elapsed()))
    }
}

pub struct CachePopulatorDecorator<S> {
    inner: S,
    binding: CacheBinding,
    constraints: Arc<dyn ConstraintManager>,
}

impl<S> CachePopulatorDecorator<S> {
    #[inline]
    pub fn new(inner: S, binding: CacheBinding, constraints: Arc<dyn ConstraintManager>) -> Self {
        Self {
            inner,
            binding,
            constraints,
        }
    }
}

impl<S> Solver for CachePopulatorDecorator<S>
where
    S: Solver,
{
    fn name(&self) -> &str {
        "CachePopulatorDecorator"
    }

    fn solve(
        &self,
        instance: &StationPackingInstance,
        criterion: &dyn TerminationCriterion,
        seed: u64,
    ) -> SolveResult {
        let result = self.inner.solve(instance, criterion, seed)?;
        let from_cache = matches!(
            result.solved_by(),
            SolvedBy::SupersetCache | SolvedBy::SubsetCache
        );
        if !result.is_conclusive() || from_cache || instance.is_empty() {
            return Ok(result);
        }

        verify_result(instance, &result, self.constraints.as_ref())?;

        let CacheBinding {
            cache,
            coordinate,
            retry,
        } = &self.binding;
        match retry.run("store", || cache.put_result(coordinate, instance, &result)) {
            Ok(true) => debug!("stored {} for {}", result.result(), instance),
            Ok(false) => {}
            Err(err) => warn!("could not store result in cache: {}", err),
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{co_channel, dpll_solver, instance, FixedSolver};
    use packing_cache::cache::{SatHit, UnsatHit};
    use packing_cache::error::{CacheError, Result as CacheResult};
    use packing_cache::memory::InMemoryContainmentCache;
    use packing_model::assignment::Assignment;
    use packing_model::index::{Channel, Station};
    use packing_search::fault::SolverFault;
    use packing_search::result::SatResult;
    use packing_search::termination::never::NeverEndingCriterion;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// A cache whose every call fails.
    #[derive(Default)]
    struct UnreachableCache {
        calls: AtomicUsize,
    }

    impl UnreachableCache {
        fn fail<T>(&self) -> CacheResult<T> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(CacheError::Unavailable("connection refused".to_string()))
        }
    }

    impl ContainmentCache for UnreachableCache {
        fn name(&self) -> &str {
            "UnreachableCache"
        }

        fn put_result(
            &self,
            _coordinate: &CacheCoordinate,
            _instance: &StationPackingInstance,
            _result: &SolverResult,
        ) -> CacheResult<bool> {
            self.fail()
        }

        fn superset_sat(
            &self,
            _coordinate: &CacheCoordinate,
            _instance: &StationPackingInstance,
        ) -> CacheResult<Option<SatHit>> {
            self.fail()
        }

        fn subset_unsat(
            &self,
            _coordinate: &CacheCoordinate,
            _instance: &StationPackingInstance,
        ) -> CacheResult<Option<UnsatHit>> {
            self.fail()
        }
    }

    fn coordinate() -> CacheCoordinate {
        CacheCoordinate::from_data(b"domains", b"interference")
    }

    #[test]
    fn test_populated_sat_answers_contained_query() {
        let constraints = co_channel(&[(1, 2, 14)]);
        let cache: Arc<dyn ContainmentCache> = Arc::new(InMemoryContainmentCache::new());
        let binding = CacheBinding::new(cache.clone(), coordinate());

        let populator =
            CachePopulatorDecorator::new(dpll_solver(constraints.clone()), binding.clone(), constraints);
        let big = instance(&[(1, &[14, 15]), (2, &[14, 15]), (3, &[14])]);
        assert!(populator.solve(&big, &NeverEndingCriterion, 0).unwrap().is_sat());

        let inner = FixedSolver::new(SolverResult::timeout(Duration::ZERO));
        let superset = SupersetCacheDecorator::new(inner, binding);
        let small = instance(&[(1, &[14, 15]), (3, &[14])]);
        let result = superset.solve(&small, &NeverEndingCriterion, 0).unwrap();
        assert_eq!(result.result(), SatResult::Sat);
        assert_eq!(result.solved_by(), SolvedBy::SupersetCache);
        assert_eq!(superset.inner.calls(), 0);
    }

    #[test]
    fn test_populated_unsat_answers_containing_query() {
        let constraints = co_channel(&[(1, 2, 14)]);
        let cache: Arc<dyn ContainmentCache> = Arc::new(InMemoryContainmentCache::new());
        let binding = CacheBinding::new(cache, coordinate());

        let populator =
            CachePopulatorDecorator::new(dpll_solver(constraints.clone()), binding.clone(), constraints);
        let core = instance(&[(1, &[14]), (2, &[14])]);
        assert!(populator.solve(&core, &NeverEndingCriterion, 0).unwrap().is_unsat());

        let inner = FixedSolver::new(SolverResult::timeout(Duration::ZERO));
        let subset = SubsetCacheDecorator::new(inner, binding);
        let bigger = instance(&[(1, &[14]), (2, &[14]), (3, &[14, 15])]);
        let result = subset.solve(&bigger, &NeverEndingCriterion, 0).unwrap();
        assert_eq!(result.result(), SatResult::Unsat);
        assert_eq!(result.solved_by(), SolvedBy::SubsetCache);
    }

    #[test]
    fn test_unreachable_cache_falls_through_after_retries() {
        let cache = Arc::new(UnreachableCache::default());
        let binding = CacheBinding::new(cache.clone(), coordinate())
            .with_retry(RetryPolicy::new(2, Duration::ZERO));
        let inner = FixedSolver::new(SolverResult::timeout(Duration::ZERO));
        let solver = SupersetCacheDecorator::new(inner, binding);

        let result = solver
            .solve(&instance(&[(1, &[14])]), &NeverEndingCriterion, 0)
            .unwrap();
        assert_eq!(result.result(), SatResult::Timeout);
        assert_eq!(solver.inner.calls(), 1);
        assert_eq!(cache.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_populator_rejects_corrupted_witness() {
        let constraints = co_channel(&[(1, 2, 14)]);
        let cache = Arc::new(InMemoryContainmentCache::new());
        let binding = CacheBinding::new(cache.clone(), coordinate());
        let corrupt: Assignment = [(Station::new(1), Channel::new(14)), (Station::new(2), Channel::new(14))]
            .into_iter()
            .collect();
        let inner = FixedSolver::new(SolverResult::sat(corrupt, Duration::ZERO, SolvedBy::SatEngine));
        let populator = CachePopulatorDecorator::new(inner, binding, constraints);

        match populator.solve(&instance(&[(1, &[14]), (2, &[14])]), &NeverEndingCriterion, 0) {
            Err(SolverFault::VerificationFailed { .. }) => {}
            other => panic!("expected VerificationFailed, got {:?}", other),
        }
        assert_eq!(cache.entry_counts(&coordinate()).unwrap(), (0, 0));
    }
}
