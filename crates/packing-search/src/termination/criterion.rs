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

//! # Termination Criterion Trait
//!
//! The only object of a query that is mutated across threads. All methods
//! take `&self` and implementations keep their state in atomics or behind
//! locks, so `interrupt()` on one thread is safe against concurrent
//! `has_to_stop()`/`remaining_time()` reads on others.

use std::sync::Arc;
use std::time::Duration;

/// Polling granularity of the default `wait_for_stop`.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(5);

pub trait TerminationCriterion: Send + Sync {
    /// Returns the name of the criterion.
    fn name(&self) -> &str;

    /// Returns `true` once work under this criterion must stop.
    fn has_to_stop(&self) -> bool;

    /// Returns the time left before the criterion fires on its own.
    fn remaining_time(&self) -> Duration;

    /// Returns `true` if the criterion fired because of an explicit
    /// interrupt rather than a deadline.
    fn was_interrupted(&self) -> bool {
        false
    }

    /// Blocks for at most `timeout` or until the criterion fires, whichever
    /// comes first, and returns `has_to_stop()`.
    ///
    /// The default implementation polls. Interruptible criteria override it
    /// to wake up as soon as they are interrupted.
    fn wait_for_stop(&self, timeout: Duration) -> bool {
        let start = std::time::Instant::now();
        loop {
            if self.has_to_stop() {
                return true;
            }
            let elapsed = start.elapsed();
            if elapsed >= timeout {
                return false;
            }
            let slice = (timeout - elapsed)
                .min(self.remaining_time())
                .min(DEFAULT_POLL_INTERVAL);
            std::thread::sleep(slice.max(Duration::from_micros(100)));
        }
    }
}

impl std::fmt::Debug for dyn TerminationCriterion + '_ {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerminationCriterion")
            .field("name", &self.name())
            .field("has_to_stop", &self.has_to_stop())
            .field("remaining_time", &self.remaining_time())
            .finish()
    }
}

impl<C> TerminationCriterion for &C
where
    C: TerminationCriterion + ?Sized,
{
    fn name(&self) -> &str {
        (**self).name()
    }

    fn has_to_stop(&self) -> bool {
        (**self).has_to_stop()
    }

    fn remaining_time(&self) -> Duration {
        (**self).remaining_time()
    }

    fn was_interrupted(&self) -> bool {
        (**self).was_interrupted()
    }

    fn wait_for_stop(&self, timeout: Duration) -> bool {
        (**self).wait_for_stop(timeout)
    }
}

impl<C> TerminationCriterion for Arc<C>
where
    C: TerminationCriterion + ?Sized,
{
    fn name(&self) -> &str {
        (**self).name()
    }

    fn has_to_stop(&self) -> bool {
        (**self).has_to_stop()
    }

    fn remaining_time(&self) -> Duration {
        (**self).remaining_time()
    }

    fn was_interrupted(&self) -> bool {
        (**self).was_interrupted()
    }

    fn wait_for_stop(&self, timeout: Duration) -> bool {
        (**self).wait_for_stop(timeout)
    }
}
