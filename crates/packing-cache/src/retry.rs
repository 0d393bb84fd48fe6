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

//! Bounded retries for cache calls.
//!
//! The retry budget is counted in attempts, not in solving time, so a slow
//! cache never eats into the deadline of the query it serves.

use crate::error::{CacheError, Result};
use log::warn;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    attempts: u32,
    backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_ATTEMPTS, Self::DEFAULT_BACKOFF)
    }
}

impl RetryPolicy {
    pub const DEFAULT_ATTEMPTS: u32 = 3;
    pub const DEFAULT_BACKOFF: Duration = Duration::from_millis(10);

    /// # Panics
    ///
    /// Panics if `attempts` is zero.
    pub fn new(attempts: u32, backoff: Duration) -> Self {
        assert!(attempts > 0, "called `RetryPolicy::new` with zero attempts");
        Self { attempts, backoff }
    }

    /// A policy that tries exactly once.
    #[inline]
    pub fn once() -> Self {
        Self::new(1, Duration::ZERO)
    }

    #[inline]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    #[inline]
    pub fn backoff(&self) -> Duration {
        self.backoff
    }

    /// Runs `call` until it succeeds or the attempts are used up. The error
    /// of the last attempt is returned; `TimedOut` errors are reported with
    /// the total number of attempts.
    pub fn run<T, F>(&self, operation: &str, mut call: F) -> Result<T>
    where
        F: FnMut() -> Result<T>,
    {
        let mut attempt = 1;
        loop {
            match call() {
                Ok(value) => return Ok(value),
                Err(error) if attempt >= self.attempts => {
                    warn!(
                        "cache {} failed after {} attempts: {}",
                        operation, attempt, error
                    );
                    return Err(match error {
                        CacheError::TimedOut { .. } => CacheError::TimedOut { attempts: attempt },
                        other => other,
                    });
                }
                Err(error) => {
                    warn!(
                        "cache {} attempt {}/{} failed: {}",
                        operation, attempt, self.attempts, error
                    );
                    attempt += 1;
                    if !self.backoff.is_zero() {
                        std::thread::sleep(self.backoff);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_succeeds_after_transient_failures() {
        let calls = Cell::new(0);
        let policy = RetryPolicy::new(3, Duration::ZERO);
        let value = policy.run("lookup", || {
            calls.set(calls.get() + 1);
            if calls.get() < 3 {
                Err(CacheError::Unavailable("down".to_string()))
            } else {
                Ok(7)
            }
        });
        assert_eq!(value, Ok(7));
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn test_gives_up_after_budget() {
        let calls = Cell::new(0);
        let policy = RetryPolicy::new(2, Duration::ZERO);
        let value: Result<()> = policy.run("lookup", || {
            calls.set(calls.get() + 1);
            Err(CacheError::TimedOut { attempts: 1 })
        });
        assert_eq!(value, Err(CacheError::TimedOut { attempts: 2 }));
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_once_does_not_retry() {
        let calls = Cell::new(0);
        let value: Result<()> = RetryPolicy::once().run("store", || {
            calls.set(calls.get() + 1);
            Err(CacheError::CorruptResponse("garbage".to_string()))
        });
        assert!(matches!(value, Err(CacheError::CorruptResponse(_))));
        assert_eq!(calls.get(), 1);
    }
}
