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

//! # Interference Constraints
//!
//! Station packing constraints are pairwise exclusions between placements: a
//! constraint `((s, c), (t, d))` forbids station `s` on channel `c` while
//! station `t` sits on channel `d`. The common regulatory kinds reduce to this
//! form: a co-channel constraint between `s` and `t` on `c` is
//! `((s, c), (t, c))`, an adjacent-channel constraint with offset `k` is
//! `((s, c), (t, c + k))`.
//!
//! ## Highlights
//!
//! - `ConstraintManager` is the capability the pipeline needs: the placements
//!   interfering with a given placement, and whether a complete assignment is
//!   constraint-satisfying. Deployments backed by external interference data
//!   implement it themselves.
//! - `ConstraintSet` is the in-memory implementation. Exclusions are stored
//!   symmetrically so lookups from either side are a single hash probe.

use crate::assignment::Assignment;
use crate::index::{Channel, Station};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::collections::BTreeMap;

/// A single placement of a station on a channel.
pub type Placement = (Station, Channel);

/// Answers interference queries for one station/interference data universe.
pub trait ConstraintManager: Send + Sync {
    /// Returns the placements that may not be used while `station` is on
    /// `channel`. A placement may be listed more than once.
    fn interfering(&self, station: Station, channel: Channel) -> &[Placement];

    /// Returns `true` if the two placements may be used together.
    fn is_compatible(&self, first: Placement, second: Placement) -> bool {
        !self.interfering(first.0, first.1).contains(&second)
    }

    /// Returns `true` if no two placements of `assignment` interfere.
    fn is_satisfying(&self, assignment: &Assignment) -> bool {
        let placed: BTreeMap<Station, Channel> = assignment.to_station_map();
        assignment.iter().all(|(station, channel)| {
            self.interfering(station, channel)
                .iter()
                .all(|(other, other_channel)| placed.get(other) != Some(other_channel))
        })
    }
}

impl std::fmt::Debug for dyn ConstraintManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ConstraintManager")
    }
}

/// An in-memory set of pairwise placement exclusions.
///
/// # Examples
///
/// ```rust
/// use packing_model::constraint::{ConstraintManager, ConstraintSet};
/// use packing_model::index::{Channel, Station};
///
/// let mut constraints = ConstraintSet::new();
/// constraints.add_co_channel(Station::new(1), Station::new(2), Channel::new(14));
///
/// assert!(!constraints.is_compatible(
///     (Station::new(1), Channel::new(14)),
///     (Station::new(2), Channel::new(14)),
/// ));
/// assert!(constraints.is_compatible(
///     (Station::new(1), Channel::new(14)),
///     (Station::new(2), Channel::new(15)),
/// ));
/// ```
#[derive(Clone, Debug, Default)]
pub struct ConstraintSet {
    forbidden: FxHashMap<Placement, SmallVec<Placement, 4>>,
    num_pairs: usize,
}

impl ConstraintSet {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Forbids using `first` and `second` together. Returns `false` if the
    /// exclusion already existed.
    ///
    /// # Panics
    ///
    /// Panics if both placements belong to the same station.
    pub fn add_forbidden_pair(&mut self, first: Placement, second: Placement) -> bool {
        assert_ne!(
            first.0, second.0,
            "called `ConstraintSet::add_forbidden_pair` with two placements of {}",
            first.0
        );

        let entry = self.forbidden.entry(first).or_default();
        if entry.contains(&second) {
            return false;
        }
        entry.push(second);
        self.forbidden.entry(second).or_default().push(first);
        self.num_pairs += 1;
        true
    }

    /// Forbids `first` and `second` from sharing `channel`.
    #[inline]
    pub fn add_co_channel(&mut self, first: Station, second: Station, channel: Channel) -> bool {
        self.add_forbidden_pair((first, channel), (second, channel))
    }

    /// Forbids `first` on `channel` together with `second` on
    /// `channel + offset`. Returns `false` without adding anything if the
    /// offset channel does not exist.
    pub fn add_adjacent(
        &mut self,
        first: Station,
        second: Station,
        channel: Channel,
        offset: i64,
    ) -> bool {
        match channel.checked_offset(offset) {
            Some(other_channel) => self.add_forbidden_pair((first, channel), (second, other_channel)),
            None => false,
        }
    }

    /// The number of distinct exclusions.
    #[inline]
    pub fn len(&self) -> usize {
        self.num_pairs
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.num_pairs == 0
    }

    /// Returns every exclusion once, as `(smaller, larger)` placement pairs in
    /// ascending order.
    pub fn pairs(&self) -> Vec<(Placement, Placement)> {
        let mut pairs: Vec<(Placement, Placement)> = self
            .forbidden
            .iter()
            .flat_map(|(&first, others)| {
                others
                    .iter()
                    .filter(move |&&second| first < second)
                    .map(move |&second| (first, second))
            })
            .collect();
        pairs.sort_unstable();
        pairs
    }
}

impl ConstraintManager for ConstraintSet {
    #[inline]
    fn interfering(&self, station: Station, channel: Channel) -> &[Placement] {
        self.forbidden
            .get(&(station, channel))
            .map(|others| others.as_slice())
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(id: u32) -> Station {
        Station::new(id)
    }

    fn c(id: u32) -> Channel {
        Channel::new(id)
    }

    #[test]
    fn test_exclusions_are_symmetric() {
        let mut constraints = ConstraintSet::new();
        assert!(constraints.add_co_channel(s(1), s(2), c(14)));

        assert_eq!(constraints.interfering(s(1), c(14)), &[(s(2), c(14))]);
        assert_eq!(constraints.interfering(s(2), c(14)), &[(s(1), c(14))]);
        assert!(constraints.interfering(s(1), c(15)).is_empty());
    }

    #[test]
    fn test_duplicate_exclusions_are_ignored() {
        let mut constraints = ConstraintSet::new();
        assert!(constraints.add_co_channel(s(1), s(2), c(14)));
        assert!(!constraints.add_co_channel(s(2), s(1), c(14)));
        assert_eq!(constraints.len(), 1);
        assert_eq!(constraints.interfering(s(1), c(14)).len(), 1);
    }

    #[test]
    fn test_adjacent_channel_offsets() {
        let mut constraints = ConstraintSet::new();
        assert!(constraints.add_adjacent(s(1), s(2), c(14), 1));
        assert!(!constraints.add_adjacent(s(1), s(2), c(0), -1));

        assert!(!constraints.is_compatible((s(1), c(14)), (s(2), c(15))));
        assert!(!constraints.is_compatible((s(2), c(15)), (s(1), c(14))));
        assert!(constraints.is_compatible((s(1), c(15)), (s(2), c(14))));
    }

    #[test]
    #[should_panic(expected = "two placements of")]
    fn test_self_exclusion_panics() {
        let mut constraints = ConstraintSet::new();
        constraints.add_forbidden_pair((s(1), c(14)), (s(1), c(15)));
    }

    #[test]
    fn test_is_satisfying() {
        let mut constraints = ConstraintSet::new();
        constraints.add_co_channel(s(1), s(2), c(14));

        let bad: Assignment = [(s(1), c(14)), (s(2), c(14))].into_iter().collect();
        let good: Assignment = [(s(1), c(14)), (s(2), c(15))].into_iter().collect();
        assert!(!constraints.is_satisfying(&bad));
        assert!(constraints.is_satisfying(&good));
    }

    #[test]
    fn test_pairs_are_canonical_and_sorted() {
        let mut constraints = ConstraintSet::new();
        constraints.add_co_channel(s(3), s(2), c(15));
        constraints.add_co_channel(s(1), s(2), c(14));

        let pairs = constraints.pairs();
        assert_eq!(
            pairs,
            vec![
                ((s(1), c(14)), (s(2), c(14))),
                ((s(2), c(15)), (s(3), c(15))),
            ]
        );
    }
}
