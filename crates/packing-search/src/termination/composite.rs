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

//! # Disjunctive Criterion
//!
//! Combines several criteria with OR semantics: it fires as soon as any part
//! fires, and its remaining time is the smallest remaining time of its parts.
//! Stages use it to tighten a caller's criterion with a local budget, e.g. a
//! presolver that may spend at most a few seconds of the overall deadline.

use crate::termination::criterion::TerminationCriterion;
use std::time::Duration;

pub struct DisjunctiveCriterion<'a> {
    criteria: Vec<Box<dyn TerminationCriterion + 'a>>,
}

impl<'a> std::fmt::Debug for DisjunctiveCriterion<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let criteria_str = self
            .criteria
            .iter()
            .map(|c| c.name())
            .collect::<Vec<&str>>()
            .join(", ");

        f.debug_struct("DisjunctiveCriterion")
            .field("criteria", &criteria_str)
            .finish()
    }
}

impl<'a> std::fmt::Display for DisjunctiveCriterion<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let criteria_str = self
            .criteria
            .iter()
            .map(|c| c.name())
            .collect::<Vec<&str>>()
            .join(" OR ");

        write!(f, "DisjunctiveCriterion({})", criteria_str)
    }
}

impl<'a> Default for DisjunctiveCriterion<'a> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> DisjunctiveCriterion<'a> {
    /// Creates an empty criterion. An empty disjunction never fires.
    #[inline]
    pub fn new() -> DisjunctiveCriterion<'a> {
        DisjunctiveCriterion {
            criteria: Vec::new(),
        }
    }

    #[inline]
    pub fn with_capacity(capacity: usize) -> DisjunctiveCriterion<'a> {
        DisjunctiveCriterion {
            criteria: Vec::with_capacity(capacity),
        }
    }

    #[inline]
    pub fn from_vec(criteria: Vec<Box<dyn TerminationCriterion + 'a>>) -> DisjunctiveCriterion<'a> {
        DisjunctiveCriterion { criteria }
    }

    #[inline]
    pub fn add_criterion<C>(&mut self, criterion: C)
    where
        C: TerminationCriterion + 'a,
    {
        self.criteria.push(Box::new(criterion));
    }

    #[inline]
    pub fn add_criterion_boxed(&mut self, criterion: Box<dyn TerminationCriterion + 'a>) {
        self.criteria.push(criterion);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.criteria.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }
}

impl<'a> TerminationCriterion for DisjunctiveCriterion<'a> {
    fn name(&self) -> &str {
        "DisjunctiveCriterion"
    }

    fn has_to_stop(&self) -> bool {
        self.criteria.iter().any(|c| c.has_to_stop())
    }

    fn remaining_time(&self) -> Duration {
        self.criteria
            .iter()
            .map(|c| c.remaining_time())
            .min()
            .unwrap_or(Duration::MAX)
    }

    fn was_interrupted(&self) -> bool {
        self.criteria.iter().any(|c| c.was_interrupted())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::termination::interrupt::InterruptibleCriterion;
    use crate::termination::never::NeverEndingCriterion;
    use crate::termination::walltime::WalltimeCriterion;

    #[test]
    fn test_empty_never_fires() {
        let criterion = DisjunctiveCriterion::new();
        assert!(criterion.is_empty());
        assert!(!criterion.has_to_stop());
        assert_eq!(criterion.remaining_time(), Duration::MAX);
    }

    #[test]
    fn test_fires_when_any_part_fires() {
        let mut criterion = DisjunctiveCriterion::with_capacity(2);
        criterion.add_criterion(NeverEndingCriterion);
        criterion.add_criterion(WalltimeCriterion::new(Duration::ZERO));
        assert_eq!(criterion.len(), 2);
        assert!(criterion.has_to_stop());
        assert!(!criterion.was_interrupted());
    }

    #[test]
    fn test_remaining_time_is_minimum() {
        let mut criterion = DisjunctiveCriterion::new();
        criterion.add_criterion(WalltimeCriterion::new(Duration::from_secs(60)));
        criterion.add_criterion(WalltimeCriterion::new(Duration::from_secs(5)));
        let remaining = criterion.remaining_time();
        assert!(remaining <= Duration::from_secs(5));
        assert!(remaining > Duration::from_secs(4));
    }

    #[test]
    fn test_borrowed_interrupt_propagates() {
        let outer = InterruptibleCriterion::new(NeverEndingCriterion);
        let mut criterion = DisjunctiveCriterion::new();
        criterion.add_criterion(&outer);
        criterion.add_criterion(WalltimeCriterion::new(Duration::from_secs(60)));

        assert!(!criterion.has_to_stop());
        outer.interrupt();
        assert!(criterion.has_to_stop());
        assert!(criterion.was_interrupted());
    }

    #[test]
    fn test_display_lists_parts() {
        let mut criterion = DisjunctiveCriterion::new();
        criterion.add_criterion(NeverEndingCriterion);
        criterion.add_criterion(WalltimeCriterion::new(Duration::from_secs(1)));
        assert_eq!(
            format!("{}", criterion),
            "DisjunctiveCriterion(NeverEndingCriterion OR WalltimeCriterion)"
        );
    }
}
