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

//! # Interference Graph
//!
//! The graph over the stations of one instance with an edge between two
//! stations iff some constraint relates them at some pair of channels drawn
//! from their current domains. Narrowed domains can therefore remove edges,
//! which is what lets arc consistency and underconstrained removal split
//! instances further.
//!
//! Adjacency is kept in ordered sets so that connected components, BFS
//! layers, and everything derived from them are deterministic for a given
//! instance.

use crate::constraint::ConstraintManager;
use crate::index::Station;
use crate::instance::StationPackingInstance;
use std::collections::{BTreeMap, BTreeSet, VecDeque};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InterferenceGraph {
    adjacency: BTreeMap<Station, BTreeSet<Station>>,
    num_edges: usize,
}

impl InterferenceGraph {
    /// Builds the interference graph of `instance` under `constraints`.
    pub fn build(instance: &StationPackingInstance, constraints: &dyn ConstraintManager) -> Self {
        let mut adjacency: BTreeMap<Station, BTreeSet<Station>> = instance
            .stations()
            .map(|station| (station, BTreeSet::new()))
            .collect();
        let mut num_edges = 0;

        for (&station, domain) in instance.domains() {
            for &channel in domain {
                for &(other, other_channel) in constraints.interfering(station, channel) {
                    if other == station {
                        continue;
                    }
                    let related = instance
                        .domain(other)
                        .is_some_and(|other_domain| other_domain.contains(&other_channel));
                    if !related {
                        continue;
                    }
                    let inserted = adjacency.entry(station).or_default().insert(other);
                    adjacency.entry(other).or_default().insert(station);
                    if inserted {
                        num_edges += 1;
                    }
                }
            }
        }

        Self {
            adjacency,
            num_edges,
        }
    }

    #[inline]
    pub fn num_stations(&self) -> usize {
        self.adjacency.len()
    }

    #[inline]
    pub fn num_edges(&self) -> usize {
        self.num_edges
    }

    #[inline]
    pub fn stations(&self) -> impl Iterator<Item = Station> + '_ {
        self.adjacency.keys().copied()
    }

    /// Returns the neighbours of `station`, or an empty iterator for a
    /// station outside the graph.
    pub fn neighbours(&self, station: Station) -> impl Iterator<Item = Station> + '_ {
        self.adjacency
            .get(&station)
            .into_iter()
            .flat_map(|neighbours| neighbours.iter().copied())
    }

    #[inline]
    pub fn degree(&self, station: Station) -> usize {
        self.adjacency.get(&station).map_or(0, BTreeSet::len)
    }

    /// Returns the stations adjacent to `stations` that are not themselves in
    /// `stations`.
    pub fn neighbourhood(&self, stations: &BTreeSet<Station>) -> BTreeSet<Station> {
        stations
            .iter()
            .flat_map(|&station| self.neighbours(station))
            .filter(|neighbour| !stations.contains(neighbour))
            .collect()
    }

    /// Computes the connected components. Components are listed in the order
    /// of their smallest station.
    pub fn connected_components(&self) -> Vec<BTreeSet<Station>> {
        let mut visited = BTreeSet::new();
        let mut components = Vec::new();
        let mut queue = VecDeque::new();

        for &root in self.adjacency.keys() {
            if !visited.insert(root) {
                continue;
            }
            let mut component = BTreeSet::new();
            queue.push_back(root);
            while let Some(station) = queue.pop_front() {
                component.insert(station);
                for neighbour in self.neighbours(station) {
                    if visited.insert(neighbour) {
                        queue.push_back(neighbour);
                    }
                }
            }
            components.push(component);
        }

        components
    }
}
