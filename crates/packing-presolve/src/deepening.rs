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

//! # Iterative Deepening
//!
//! Cutoff schedules for repeated attempts on the same sub-instance. Attempt
//! `i` gets `base · scale^i`, so cheap attempts come first and a timeout
//! buys a longer one.

use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeepeningSchedule {
    base: Duration,
    scale: f64,
    max_attempts: usize,
}

impl Default for DeepeningSchedule {
    fn default() -> Self {
        Self::new(
            Self::DEFAULT_BASE_CUTOFF,
            Self::DEFAULT_SCALE,
            Self::DEFAULT_MAX_ATTEMPTS,
        )
    }
}

impl DeepeningSchedule {
    pub const DEFAULT_BASE_CUTOFF: Duration = Duration::from_millis(100);
    pub const DEFAULT_SCALE: f64 = 2.0;
    pub const DEFAULT_MAX_ATTEMPTS: usize = 4;

    /// Creates a new schedule.
    ///
    /// # Panics
    ///
    /// Panics if `scale` is below one or not finite, or if `max_attempts`
    /// is zero.
    pub fn new(base: Duration, scale: f64, max_attempts: usize) -> Self {
        assert!(
            scale.is_finite() && scale >= 1.0,
            "called `DeepeningSchedule::new` with scale {} (must be finite and >= 1)",
            scale
        );
        assert!(
            max_attempts > 0,
            "called `DeepeningSchedule::new` with zero attempts"
        );
        Self {
            base,
            scale,
            max_attempts,
        }
    }

    /// A schedule with a single attempt at `cutoff`.
    #[inline]
    pub fn single(cutoff: Duration) -> Self {
        Self::new(cutoff, 1.0, 1)
    }

    #[inline]
    pub fn base(&self) -> Duration {
        self.base
    }

    #[inline]
    pub fn scale(&self) -> f64 {
        self.scale
    }

    #[inline]
    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// The cutoff of attempt `attempt` (zero based). Saturates at
    /// `Duration::MAX`.
    pub fn cutoff(&self, attempt: usize) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let factor = self.scale.powi(exponent);
        Duration::try_from_secs_f64(self.base.as_secs_f64() * factor).unwrap_or(Duration::MAX)
    }

    /// The cutoffs of all attempts, in order.
    pub fn cutoffs(&self) -> impl Iterator<Item = Duration> + '_ {
        (0..self.max_attempts).map(move |attempt| self.cutoff(attempt))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cutoffs_grow_geometrically() {
        let schedule = DeepeningSchedule::new(Duration::from_millis(100), 2.0, 4);
        let cutoffs: Vec<_> = schedule.cutoffs().collect();
        assert_eq!(
            cutoffs,
            vec![
                Duration::from_millis(100),
                Duration::from_millis(200),
                Duration::from_millis(400),
                Duration::from_millis(800),
            ]
        );
    }

    #[test]
    fn test_single_schedule_has_one_cutoff() {
        let schedule = DeepeningSchedule::single(Duration::from_secs(1));
        assert_eq!(schedule.cutoffs().collect::<Vec<_>>(), vec![Duration::from_secs(1)]);
    }

    #[test]
    fn test_huge_attempt_saturates() {
        let schedule = DeepeningSchedule::new(Duration::from_secs(1), 10.0, 1);
        assert_eq!(schedule.cutoff(1_000), Duration::MAX);
    }

    #[test]
    #[should_panic(expected = "must be finite and >= 1")]
    fn test_shrinking_scale_panics() {
        let _ = DeepeningSchedule::new(Duration::from_secs(1), 0.5, 3);
    }
}
