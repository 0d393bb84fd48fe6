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

//! # Walltime Criterion
//!
//! Fires once a fixed wall-clock deadline has passed. The deadline is fixed
//! at construction, so every stage sharing the criterion draws from the same
//! budget: time spent in an outer stage is time an inner stage no longer has.

use crate::termination::criterion::TerminationCriterion;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalltimeCriterion {
    start_time: Instant,
    deadline: Option<Instant>,
}

impl WalltimeCriterion {
    /// Creates a criterion that fires `time_limit` from now. A limit too
    /// large to represent never fires.
    #[inline]
    pub fn new(time_limit: Duration) -> Self {
        let start_time = Instant::now();
        Self {
            start_time,
            deadline: start_time.checked_add(time_limit),
        }
    }

    /// Creates a criterion that fires at `deadline`.
    #[inline]
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            start_time: Instant::now(),
            deadline: Some(deadline),
        }
    }

    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    #[inline]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }
}

impl TerminationCriterion for WalltimeCriterion {
    fn name(&self) -> &str {
        "WalltimeCriterion"
    }

    #[inline]
    fn has_to_stop(&self) -> bool {
        self.deadline
            .is_some_and(|deadline| Instant::now() >= deadline)
    }

    #[inline]
    fn remaining_time(&self) -> Duration {
        match self.deadline {
            Some(deadline) => deadline.saturating_duration_since(Instant::now()),
            None => Duration::MAX,
        }
    }
}
