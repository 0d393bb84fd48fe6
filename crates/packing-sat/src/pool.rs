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

//! # Engine Pool
//!
//! A checkout/checkin arena for non-reentrant SAT engine handles. Every
//! branch or thread that needs an engine checks one out, uses it exclusively
//! through an `EngineLease`, and returns it by dropping the lease. No handle
//! is ever shared mutably between threads.
//!
//! ## Highlights
//!
//! - `EnginePool::new(engines)` serves a fixed set of handles.
//! - `EnginePool::with_factory(capacity, factory)` creates handles lazily,
//!   up to `capacity`.
//! - `checkout` blocks while every handle is leased, but keeps polling the
//!   caller's termination criterion and gives up with `None` once it fires.
//!
//! ## Usage
//!
//! ```rust
//! use packing_sat::dpll::DpllEngine;
//! use packing_sat::pool::EnginePool;
//! use packing_search::termination::never::NeverEndingCriterion;
//!
//! let pool = EnginePool::with_factory(2, DpllEngine::new);
//! {
//!     let _a = pool.checkout(&NeverEndingCriterion).unwrap();
//!     let _b = pool.checkout(&NeverEndingCriterion).unwrap();
//!     assert_eq!(pool.idle_count(), 0);
//! }
//! assert_eq!(pool.idle_count(), 2);
//! ```

use packing_search::termination::criterion::TerminationCriterion;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

type EngineFactory<E> = Box<dyn Fn() -> E + Send + Sync>;

struct PoolState<E> {
    idle: Vec<E>,
    created: usize,
}

pub struct EnginePool<E> {
    state: Mutex<PoolState<E>>,
    available: Condvar,
    factory: Option<EngineFactory<E>>,
    capacity: usize,
}

impl<E> std::fmt::Debug for EnginePool<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnginePool")
            .field("capacity", &self.capacity)
            .field("idle", &self.idle_count())
            .finish()
    }
}

impl<E> EnginePool<E> {
    /// How long a blocked `checkout` sleeps between criterion polls.
    const CHECKOUT_POLL_INTERVAL: Duration = Duration::from_millis(10);

    /// Creates a pool over a fixed set of engines.
    ///
    /// # Panics
    ///
    /// Panics if `engines` is empty.
    pub fn new(engines: Vec<E>) -> Self {
        assert!(
            !engines.is_empty(),
            "called `EnginePool::new` with no engines"
        );
        let capacity = engines.len();
        Self {
            state: Mutex::new(PoolState {
                idle: engines,
                created: capacity,
            }),
            available: Condvar::new(),
            factory: None,
            capacity,
        }
    }

    /// Creates a pool that builds engines on demand, at most `capacity` of
    /// them.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn with_factory<F>(capacity: usize, factory: F) -> Self
    where
        F: Fn() -> E + Send + Sync + 'static,
    {
        assert!(
            capacity > 0,
            "called `EnginePool::with_factory` with zero capacity"
        );
        Self {
            state: Mutex::new(PoolState {
                idle: Vec::with_capacity(capacity),
                created: 0,
            }),
            available: Condvar::new(),
            factory: Some(Box::new(factory)),
            capacity,
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn idle_count(&self) -> usize {
        self.lock_state().idle.len()
    }

    #[inline]
    fn lock_state(&self) -> MutexGuard<'_, PoolState<E>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Checks out an engine, waiting while all are leased. Returns `None` if
    /// `criterion` fires before one becomes available.
    pub fn checkout(&self, criterion: &dyn TerminationCriterion) -> Option<EngineLease<'_, E>> {
        let mut state = self.lock_state();
        loop {
            if let Some(engine) = state.idle.pop() {
                return Some(EngineLease {
                    pool: self,
                    engine: Some(engine),
                });
            }

            if let Some(factory) = &self.factory {
                if state.created < self.capacity {
                    state.created += 1;
                    drop(state);
                    return Some(EngineLease {
                        pool: self,
                        engine: Some(factory()),
                    });
                }
            }

            if criterion.has_to_stop() {
                return None;
            }

            let wait = criterion
                .remaining_time()
                .min(Self::CHECKOUT_POLL_INTERVAL)
                .max(Duration::from_micros(100));
            state = match self.available.wait_timeout(state, wait) {
                Ok((state, _)) => state,
                Err(poisoned) => poisoned.into_inner().0,
            };
        }
    }

    fn checkin(&self, engine: E) {
        self.lock_state().idle.push(engine);
        self.available.notify_one();
    }
}

/// Exclusive access to one pooled engine. Returns the engine on drop.
pub struct EngineLease<'a, E> {
    pool: &'a EnginePool<E>,
    engine: Option<E>,
}

impl<'a, E> std::ops::Deref for EngineLease<'a, E> {
    type Target = E;

    fn deref(&self) -> &E {
        // Only `drop` takes the engine out.
        match &self.engine {
            Some(engine) => engine,
            None => unreachable!("engine lease accessed after checkin"),
        }
    }
}

impl<'a, E> std::ops::DerefMut for EngineLease<'a, E> {
    fn deref_mut(&mut self) -> &mut E {
        match &mut self.engine {
            Some(engine) => engine,
            None => unreachable!("engine lease accessed after checkin"),
        }
    }
}

impl<'a, E> Drop for EngineLease<'a, E> {
    fn drop(&mut self) {
        if let Some(engine) = self.engine.take() {
            self.pool.checkin(engine);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use packing_search::termination::interrupt::InterruptibleCriterion;
    use packing_search::termination::never::NeverEndingCriterion;
    use packing_search::termination::walltime::WalltimeCriterion;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Instant;

    #[test]
    fn test_fixed_pool_hands_out_and_returns() {
        let pool = EnginePool::new(vec![1u32, 2u32]);
        assert_eq!(pool.capacity(), 2);
        {
            let mut lease = pool.checkout(&NeverEndingCriterion).unwrap();
            *lease += 10;
            assert_eq!(pool.idle_count(), 1);
        }
        assert_eq!(pool.idle_count(), 2);
        let values: Vec<u32> = {
            let a = pool.checkout(&NeverEndingCriterion).unwrap();
            let b = pool.checkout(&NeverEndingCriterion).unwrap();
            let mut v = vec![*a, *b];
            v.sort();
            v
        };
        assert_eq!(values, vec![1, 12]);
    }

    #[test]
    fn test_factory_is_lazy_and_bounded() {
        let created = Arc::new(AtomicUsize::new(0));
        let pool = {
            let created = Arc::clone(&created);
            EnginePool::with_factory(2, move || created.fetch_add(1, Ordering::SeqCst))
        };
        assert_eq!(created.load(Ordering::SeqCst), 0);

        let a = pool.checkout(&NeverEndingCriterion).unwrap();
        let b = pool.checkout(&NeverEndingCriterion).unwrap();
        assert_eq!(created.load(Ordering::SeqCst), 2);

        let expired = WalltimeCriterion::new(Duration::from_millis(20));
        assert!(pool.checkout(&expired).is_none());
        assert_eq!(created.load(Ordering::SeqCst), 2);
        drop(a);
        drop(b);
    }

    #[test]
    fn test_blocked_checkout_wakes_on_checkin() {
        let pool = Arc::new(EnginePool::new(vec![()]));
        let lease = pool.checkout(&NeverEndingCriterion).unwrap();

        let waiter = {
            let pool = Arc::clone(&pool);
            std::thread::spawn(move || pool.checkout(&NeverEndingCriterion).is_some())
        };
        std::thread::sleep(Duration::from_millis(20));
        drop(lease);
        assert!(waiter.join().unwrap());
    }

    #[test]
    fn test_blocked_checkout_gives_up_on_interrupt() {
        let pool = Arc::new(EnginePool::new(vec![()]));
        let _lease = pool.checkout(&NeverEndingCriterion).unwrap();
        let criterion = Arc::new(InterruptibleCriterion::new(NeverEndingCriterion));

        let waiter = {
            let pool = Arc::clone(&pool);
            let criterion = Arc::clone(&criterion);
            std::thread::spawn(move || {
                let start = Instant::now();
                let got = pool.checkout(criterion.as_ref()).is_some();
                (got, start.elapsed())
            })
        };
        std::thread::sleep(Duration::from_millis(20));
        criterion.interrupt();
        let (got, waited) = waiter.join().unwrap();
        assert!(!got);
        assert!(waited < Duration::from_secs(5));
    }

    #[test]
    #[should_panic(expected = "no engines")]
    fn test_empty_fixed_pool_panics() {
        let _ = EnginePool::<u32>::new(Vec::new());
    }
}
