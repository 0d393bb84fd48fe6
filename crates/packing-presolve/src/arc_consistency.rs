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

//! # Arc Consistency (AC-3)
//!
//! Prunes channels that cannot be part of any solution because some
//! interfering neighbour would be left without a compatible channel. The
//! classic AC-3 worklist runs over both directions of every interference
//! edge:
//!
//! 1. pop an arc `(s, t)`;
//! 2. drop every channel `c` of `s` for which no channel of `t` is
//!    compatible with `(s, c)`;
//! 3. if `s` lost channels, re-enqueue `(u, s)` for every other neighbour
//!    `u` of `s`;
//! 4. if `s` lost every channel, stop: the instance is UNSAT.
//!
//! Pruning never changes the verdict of an instance. It only proves UNSAT
//! early or hands a smaller instance to the next stage.

use log::{debug, trace};
use packing_model::constraint::ConstraintManager;
use packing_model::graph::InterferenceGraph;
use packing_model::index::{Channel, Station};
use packing_model::instance::StationPackingInstance;
use std::collections::{BTreeMap, BTreeSet, VecDeque};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ac3Outcome {
    /// The domains are arc consistent. `removed` channels were pruned.
    Consistent {
        domains: BTreeMap<Station, BTreeSet<Channel>>,
        removed: usize,
    },
    /// `station` has no channel left; the instance is UNSAT.
    WipedOut { station: Station },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Ac3Enforcer;

impl Ac3Enforcer {
    #[inline]
    pub fn new() -> Self {
        Self
    }

    /// Enforces arc consistency on the domains of `instance`.
    pub fn enforce(
        &self,
        instance: &StationPackingInstance,
        constraints: &dyn ConstraintManager,
    ) -> Ac3Outcome {
        let graph = InterferenceGraph::build(instance, constraints);
        let mut domains = instance.domains().clone();
        let mut removed = 0usize;

        let mut queue: VecDeque<(Station, Station)> = VecDeque::new();
        let mut queued: BTreeSet<(Station, Station)> = BTreeSet::new();
        for station in graph.stations() {
            for neighbour in graph.neighbours(station) {
                queue.push_back((station, neighbour));
                queued.insert((station, neighbour));
            }
        }

        while let Some((station, neighbour)) = queue.pop_front() {
            queued.remove(&(station, neighbour));

            let pruned = Self::revise(&mut domains, constraints, station, neighbour);
            if pruned == 0 {
                continue;
            }
            removed += pruned;

            if domains.get(&station).map_or(true, BTreeSet::is_empty) {
                debug!("AC-3 wiped out the domain of {}", station);
                return Ac3Outcome::WipedOut { station };
            }

            for other in graph.neighbours(station) {
                if other != neighbour && queued.insert((other, station)) {
                    queue.push_back((other, station));
                }
            }
        }

        debug!("AC-3 removed {} channels", removed);
        Ac3Outcome::Consistent { domains, removed }
    }

    /// Removes the channels of `station` without support in `neighbour`'s
    /// domain and returns how many were removed.
    fn revise(
        domains: &mut BTreeMap<Station, BTreeSet<Channel>>,
        constraints: &dyn ConstraintManager,
        station: Station,
        neighbour: Station,
    ) -> usize {
        let Some(neighbour_domain) = domains.get(&neighbour) else {
            return 0;
        };
        let Some(domain) = domains.get(&station) else {
            return 0;
        };

        let unsupported: Vec<Channel> = domain
            .iter()
            .copied()
            .filter(|&channel| {
                !neighbour_domain.iter().any(|&other_channel| {
                    constraints.is_compatible((station, channel), (neighbour, other_channel))
                })
            })
            .collect();

        if let Some(domain) = domains.get_mut(&station) {
            for channel in &unsupported {
                trace!("AC-3 removes {} from {}", channel, station);
                domain.remove(channel);
            }
        }
        unsupported.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use packing_model::constraint::ConstraintSet;
    use packing_model::instance::InstanceBuilder;

    fn s(id: u32) -> Station {
        Station::new(id)
    }

    fn c(id: u32) -> Channel {
        Channel::new(id)
    }

    #[test]
    fn test_wipeout_on_two_stations_one_channel() {
        let mut builder = InstanceBuilder::new();
        builder
            .add_station(s(1), [c(14)])
            .add_station(s(2), [c(14)]);
        let instance = builder.build().unwrap();
        let mut constraints = ConstraintSet::new();
        constraints.add_co_channel(s(1), s(2), c(14));

        match Ac3Enforcer::new().enforce(&instance, &constraints) {
            Ac3Outcome::WipedOut { station } => assert!(station == s(1) || station == s(2)),
            other => panic!("expected WipedOut, got {:?}", other),
        }
    }

    #[test]
    fn test_prunes_channel_blocked_by_singleton_neighbour() {
        let mut builder = InstanceBuilder::new();
        builder
            .add_station(s(1), [c(14), c(15)])
            .add_station(s(2), [c(14)]);
        let instance = builder.build().unwrap();
        let mut constraints = ConstraintSet::new();
        constraints.add_co_channel(s(1), s(2), c(14));

        match Ac3Enforcer::new().enforce(&instance, &constraints) {
            Ac3Outcome::Consistent { domains, removed } => {
                assert_eq!(removed, 1);
                assert_eq!(domains[&s(1)], [c(15)].into_iter().collect());
                assert_eq!(domains[&s(2)], [c(14)].into_iter().collect());
            }
            other => panic!("expected Consistent, got {:?}", other),
        }
    }

    #[test]
    fn test_pruning_propagates_along_a_chain() {
        // 3 is fixed to 14, which forces 2 onto 15, which forces 1 onto 16.
        let mut builder = InstanceBuilder::new();
        builder
            .add_station(s(1), [c(15), c(16)])
            .add_station(s(2), [c(14), c(15)])
            .add_station(s(3), [c(14)]);
        let instance = builder.build().unwrap();
        let mut constraints = ConstraintSet::new();
        constraints.add_co_channel(s(2), s(3), c(14));
        constraints.add_co_channel(s(1), s(2), c(15));

        match Ac3Enforcer::new().enforce(&instance, &constraints) {
            Ac3Outcome::Consistent { domains, removed } => {
                assert_eq!(removed, 2);
                assert_eq!(domains[&s(1)], [c(16)].into_iter().collect());
                assert_eq!(domains[&s(2)], [c(15)].into_iter().collect());
            }
            other => panic!("expected Consistent, got {:?}", other),
        }
    }

    /// Lists every exclusion twice, as external managers may.
    struct RepeatingManager {
        inner: ConstraintSet,
        repeated: BTreeMap<(Station, Channel), Vec<(Station, Channel)>>,
    }

    impl RepeatingManager {
        fn new(inner: ConstraintSet, placements: &[(Station, Channel)]) -> Self {
            let repeated = placements
                .iter()
                .map(|&(station, channel)| {
                    let listed = inner.interfering(station, channel);
                    let doubled = listed.iter().chain(listed.iter()).copied().collect();
                    ((station, channel), doubled)
                })
                .collect();
            Self { inner, repeated }
        }
    }

    impl ConstraintManager for RepeatingManager {
        fn interfering(&self, station: Station, channel: Channel) -> &[(Station, Channel)] {
            match self.repeated.get(&(station, channel)) {
                Some(listed) => listed,
                None => self.inner.interfering(station, channel),
            }
        }
    }

    #[test]
    fn test_repeated_exclusions_keep_supported_channels() {
        let mut builder = InstanceBuilder::new();
        builder
            .add_station(s(1), [c(14)])
            .add_station(s(2), [c(14), c(15)]);
        let instance = builder.build().unwrap();
        let mut set = ConstraintSet::new();
        set.add_co_channel(s(1), s(2), c(14));
        let constraints = RepeatingManager::new(set, &[(s(1), c(14)), (s(2), c(14))]);
        assert_eq!(constraints.interfering(s(1), c(14)).len(), 2);

        match Ac3Enforcer::new().enforce(&instance, &constraints) {
            Ac3Outcome::Consistent { domains, removed } => {
                assert_eq!(removed, 1);
                assert_eq!(domains[&s(1)], [c(14)].into_iter().collect());
                assert_eq!(domains[&s(2)], [c(15)].into_iter().collect());
            }
            other => panic!("expected Consistent, got {:?}", other),
        }
    }

    #[test]
    fn test_unconstrained_instance_is_untouched() {
        let mut builder = InstanceBuilder::new();
        builder
            .add_station(s(1), [c(14), c(15)])
            .add_station(s(2), [c(14), c(15)]);
        let instance = builder.build().unwrap();
        let mut constraints = ConstraintSet::new();
        constraints.add_co_channel(s(1), s(2), c(14));

        match Ac3Enforcer::new().enforce(&instance, &constraints) {
            Ac3Outcome::Consistent { domains, removed } => {
                assert_eq!(removed, 0);
                assert_eq!(&domains, instance.domains());
            }
            other => panic!("expected Consistent, got {:?}", other),
        }
    }
}
