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

//! # Underconstrained Stations
//!
//! A station is underconstrained if it always has a free domain channel,
//! whatever channels its neighbours take. Such stations can be removed
//! before solving and placed greedily afterwards.
//!
//! `HeuristicUnderconstrainedFinder` applies two sound tests, so every
//! station it reports is truly underconstrained (the converse does not
//! hold):
//!
//! 1. **Free channel**: some domain channel interferes with no placement of
//!    any neighbour in the instance.
//! 2. **Channel spread** (optional, more expensive): each neighbour can block
//!    at most `max over its channels` of the station's channels; if the sum
//!    of those maxima is below the domain size, a channel always survives.

use log::{debug, trace};
use packing_model::constraint::ConstraintManager;
use packing_model::graph::InterferenceGraph;
use packing_model::index::{Channel, Station};
use packing_model::instance::StationPackingInstance;
use packing_search::termination::criterion::TerminationCriterion;
use std::collections::BTreeSet;

pub trait UnderconstrainedStationFinder: Send + Sync {
    /// Returns the name of the finder.
    fn name(&self) -> &str;

    /// Returns the underconstrained stations among `candidates` (or among all
    /// stations when `candidates` is `None`). Stops early and returns a
    /// partial set once `criterion` fires; a partial set is still sound.
    fn find(
        &self,
        instance: &StationPackingInstance,
        graph: &InterferenceGraph,
        constraints: &dyn ConstraintManager,
        candidates: Option<&BTreeSet<Station>>,
        criterion: &dyn TerminationCriterion,
    ) -> BTreeSet<Station>;
}

impl std::fmt::Debug for dyn UnderconstrainedStationFinder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "UnderconstrainedStationFinder({})", self.name())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeuristicUnderconstrainedFinder {
    expensive_analysis: bool,
}

impl HeuristicUnderconstrainedFinder {
    #[inline]
    pub fn new(expensive_analysis: bool) -> Self {
        Self { expensive_analysis }
    }

    #[inline]
    pub fn expensive_analysis(&self) -> bool {
        self.expensive_analysis
    }

    /// The channels of `station` that `neighbour` blocks while on `neighbour_channel`.
    fn blocked_count(
        constraints: &dyn ConstraintManager,
        station: Station,
        domain: &BTreeSet<Channel>,
        neighbour: Station,
        neighbour_channel: Channel,
    ) -> usize {
        domain
            .iter()
            .filter(|&&channel| {
                !constraints.is_compatible((station, channel), (neighbour, neighbour_channel))
            })
            .count()
    }

    fn has_free_channel(
        instance: &StationPackingInstance,
        constraints: &dyn ConstraintManager,
        station: Station,
        domain: &BTreeSet<Channel>,
    ) -> bool {
        domain.iter().any(|&channel| {
            constraints
                .interfering(station, channel)
                .iter()
                .all(|&(other, other_channel)| {
                    other == station
                        || !instance
                            .domain(other)
                            .is_some_and(|d| d.contains(&other_channel))
                })
        })
    }

    fn spread_is_too_small(
        instance: &StationPackingInstance,
        graph: &InterferenceGraph,
        constraints: &dyn ConstraintManager,
        station: Station,
        domain: &BTreeSet<Channel>,
    ) -> bool {
        if graph.degree(station) >= domain.len() {
            // Every neighbour blocks at least one channel, so the sum of maxima
            // can only be below the domain size with fewer neighbours than channels.
            return false;
        }

        let mut spread = 0usize;
        for neighbour in graph.neighbours(station) {
            let Some(neighbour_domain) = instance.domain(neighbour) else {
                continue;
            };
            spread += neighbour_domain
                .iter()
                .map(|&nc| Self::blocked_count(constraints, station, domain, neighbour, nc))
                .max()
                .unwrap_or(0);
            if spread >= domain.len() {
                return false;
            }
        }
        trace!(
            "{} has {} channels but its neighbours can block at most {}",
            station,
            domain.len(),
            spread
        );
        true
    }
}

impl UnderconstrainedStationFinder for HeuristicUnderconstrainedFinder {
    fn name(&self) -> &str {
        "HeuristicUnderconstrainedFinder"
    }

    fn find(
        &self,
        instance: &StationPackingInstance,
        graph: &InterferenceGraph,
        constraints: &dyn ConstraintManager,
        candidates: Option<&BTreeSet<Station>>,
        criterion: &dyn TerminationCriterion,
    ) -> BTreeSet<Station> {
        let mut found = BTreeSet::new();
        let stations: Vec<Station> = match candidates {
            Some(candidates) => candidates
                .iter()
                .copied()
                .filter(|&station| instance.contains_station(station))
                .collect(),
            None => instance.stations().collect(),
        };

        for station in stations {
            if criterion.has_to_stop() {
                debug!("underconstrained search stopped early with {} stations", found.len());
                break;
            }
            let Some(domain) = instance.domain(station) else {
                continue;
            };

            if Self::has_free_channel(instance, constraints, station, domain) {
                trace!("{} has a channel no neighbour can block", station);
                found.insert(station);
                continue;
            }

            if self.expensive_analysis
                && Self::spread_is_too_small(instance, graph, constraints, station, domain)
            {
                found.insert(station);
            }
        }

        found
    }
}
