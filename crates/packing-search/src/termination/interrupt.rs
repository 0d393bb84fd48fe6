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

//! # Interruptible Criterion
//!
//! Wraps another criterion and adds an explicit interrupt. The flag is an
//! atomic so that `has_to_stop()` stays a single load on the hot path; a
//! condition variable next to it lets blocked waiters wake up the moment
//! `interrupt()` is called instead of at their next poll.
//!
//! ## Usage
//!
//! ```rust
//! use packing_search::termination::criterion::TerminationCriterion;
//! use packing_search::termination::interrupt::InterruptibleCriterion;
//! use packing_search::termination::walltime::WalltimeCriterion;
//! use std::time::Duration;
//!
//! let criterion = InterruptibleCriterion::new(WalltimeCriterion::new(Duration::from_secs(60)));
//! assert!(!criterion.has_to_stop());
//! assert!(criterion.interrupt());
//! assert!(!criterion.interrupt()); // only the first call interrupts
//! assert!(criterion.has_to_stop());
//! assert!(criterion.was_interrupted());
//! ```

use crate::termination::criterion::TerminationCriterion;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct InterruptibleCriterion<C> {
    inner: C,
    interrupted: AtomicBool,
    lock: Mutex<()>,
    signal: Condvar,
}

impl<C> InterruptibleCriterion<C>
where
    C: TerminationCriterion,
{
    /// Longest single condition-variable wait, so the inner criterion's
    /// deadline is still noticed while nobody interrupts.
    const MAX_WAIT_SLICE: Duration = Duration::from_millis(10);

    #[inline]
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            interrupted: AtomicBool::new(false),
            lock: Mutex::new(()),
            signal: Condvar::new(),
        }
    }

    /// Interrupts the criterion and wakes every waiter. Returns `true` only
    /// for the call that actually performed the interrupt.
    pub fn interrupt(&self) -> bool {
        let first = self
            .interrupted
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if first {
            // Taking the lock orders the store before any waiter's re-check.
            let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
            self.signal.notify_all();
        }
        first
    }

    #[inline]
    pub fn is_interrupted(&self) -> bool {
        self.interrupted.load(Ordering::Acquire)
    }

    #[inline]
    pub fn inner(&self) -> &C {
        &self.inner
    }
}

impl<C> TerminationCriterion for InterruptibleCriterion<C>
where
    C: TerminationCriterion,
{
    fn name(&self) -> &str {
        "InterruptibleCriterion"
    }

    #[inline]
    fn has_to_stop(&self) -> bool {
        self.is_interrupted() || self.inner.has_to_stop()
    }

    #[inline]
    fn remaining_time(&self) -> Duration {
        if self.is_interrupted() {
            Duration::ZERO
        } else {
            self.inner.remaining_time()
        }
    }

    #[inline]
    fn was_interrupted(&self) -> bool {
        self.is_interrupted() || self.inner.was_interrupted()
    }

    fn wait_for_stop(&self, timeout: Duration) -> bool {
        let start = Instant::now();
        let mut guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        loop {
            if self.has_to_stop() {
                return true;
            }
            let elapsed = start.elapsed();
            if elapsed >= timeout {
                return false;
            }
            let slice = (timeout - elapsed)
                .min(self.inner.remaining_time())
                .min(Self::MAX_WAIT_SLICE)
                .max(Duration::from_micros(100));
            guard = match self.signal.wait_timeout(guard, slice) {
                Ok((guard, _)) => guard,
                Err(poisoned) => poisoned.into_inner().0,
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::termination::never::NeverEndingCriterion;
    use crate::termination::walltime::WalltimeCriterion;
    use std::sync::Arc;

    #[test]
    fn test_interrupt_sets_flag_once() {
        let criterion = InterruptibleCriterion::new(NeverEndingCriterion);
        assert!(!criterion.has_to_stop());
        assert!(!criterion.was_interrupted());

        assert!(criterion.interrupt());
        assert!(!criterion.interrupt());
        assert!(criterion.has_to_stop());
        assert!(criterion.was_interrupted());
        assert_eq!(criterion.remaining_time(), Duration::ZERO);
    }

    #[test]
    fn test_inner_deadline_is_not_an_interrupt() {
        let criterion = InterruptibleCriterion::new(WalltimeCriterion::new(Duration::ZERO));
        assert!(criterion.has_to_stop());
        assert!(!criterion.was_interrupted());
    }

    #[test]
    fn test_interrupt_wakes_blocked_waiter() {
        let criterion = Arc::new(InterruptibleCriterion::new(NeverEndingCriterion));
        let waiter = {
            let criterion = Arc::clone(&criterion);
            std::thread::spawn(move || {
                let start = Instant::now();
                let stopped = criterion.wait_for_stop(Duration::from_secs(30));
                (stopped, start.elapsed())
            })
        };

        std::thread::sleep(Duration::from_millis(20));
        criterion.interrupt();

        let (stopped, waited) = waiter.join().unwrap();
        assert!(stopped);
        assert!(waited < Duration::from_secs(5), "waited {:?}", waited);
    }

    #[test]
    fn test_wait_for_stop_times_out_without_interrupt() {
        let criterion = InterruptibleCriterion::new(NeverEndingCriterion);
        assert!(!criterion.wait_for_stop(Duration::from_millis(15)));
    }

    #[test]
    fn test_concurrent_interrupts_have_one_winner() {
        let criterion = Arc::new(InterruptibleCriterion::new(NeverEndingCriterion));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let criterion = Arc::clone(&criterion);
                std::thread::spawn(move || criterion.interrupt())
            })
            .collect();
        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|&won| won)
            .count();
        assert_eq!(winners, 1);
    }
}
