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

//! # Station-Adding Strategies
//!
//! Grow a seed set of stations through the interference graph. Each strategy
//! yields a sequence of nested station subsets, every one a strict superset of
//! the previous, ending when the connected neighbourhood of the seed is
//! exhausted. The neighbourhood presolver solves the sub-instance over each
//! yielded subset in turn.

use log::trace;
use packing_model::graph::InterferenceGraph;
use packing_model::index::Station;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::BTreeSet;

/// A lazily evaluated sequence of growing station subsets.
pub type StationSubsets<'a> = Box<dyn Iterator<Item = BTreeSet<Station>> + 'a>;

pub trait StationAddingStrategy: Send + Sync {
    /// Returns the name of the strategy.
    fn name(&self) -> &str;

    /// Returns the subsets to try, starting from `seed_stations`.
    ///
    /// # Panics
    ///
    /// Panics if `seed_stations` is empty.
    fn subsets<'a>(
        &self,
        graph: &'a InterferenceGraph,
        seed_stations: &BTreeSet<Station>,
        seed: u64,
    ) -> StationSubsets<'a>;
}

impl std::fmt::Debug for dyn StationAddingStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "StationAddingStrategy({})", self.name())
    }
}

/// Adds one full breadth-first layer per round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NeighbourLayerStrategy {
    max_layers: usize,
}

impl Default for NeighbourLayerStrategy {
    fn default() -> Self {
        Self {
            max_layers: usize::MAX,
        }
    }
}

impl NeighbourLayerStrategy {
    /// Creates a strategy that yields at most `max_layers` subsets.
    ///
    /// # Panics
    ///
    /// Panics if `max_layers` is zero.
    #[inline]
    pub fn new(max_layers: usize) -> Self {
        assert!(
            max_layers > 0,
            "called `NeighbourLayerStrategy::new` with zero layers"
        );
        Self { max_layers }
    }

    #[inline]
    pub fn max_layers(&self) -> usize {
        self.max_layers
    }
}

impl StationAddingStrategy for NeighbourLayerStrategy {
    fn name(&self) -> &str {
        "NeighbourLayerStrategy"
    }

    fn subsets<'a>(
        &self,
        graph: &'a InterferenceGraph,
        seed_stations: &BTreeSet<Station>,
        _seed: u64,
    ) -> StationSubsets<'a> {
        assert!(
            !seed_stations.is_empty(),
            "called `NeighbourLayerStrategy::subsets` with no seed stations"
        );
        Box::new(LayerIter {
            graph,
            current: seed_stations.clone(),
            layer: 0,
            max_layers: self.max_layers,
        })
    }
}

struct LayerIter<'a> {
    graph: &'a InterferenceGraph,
    current: BTreeSet<Station>,
    layer: usize,
    max_layers: usize,
}

impl Iterator for LayerIter<'_> {
    type Item = BTreeSet<Station>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.layer >= self.max_layers {
            return None;
        }
        let added = self.graph.neighbourhood(&self.current);
        // The first layer is yielded even when empty, since an isolated seed
        // still deserves one attempt.
        if added.is_empty() && self.layer > 0 {
            return None;
        }
        self.layer += 1;
        trace!("layer {} adds {} stations", self.layer, added.len());
        self.current.extend(added);
        Some(self.current.clone())
    }
}

/// Adds up to `batch_size` uniformly sampled frontier stations per round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RandomNeighboursStrategy {
    batch_size: usize,
}

impl RandomNeighboursStrategy {
    /// # Panics
    ///
    /// Panics if `batch_size` is zero.
    #[inline]
    pub fn new(batch_size: usize) -> Self {
        assert!(
            batch_size > 0,
            "called `RandomNeighboursStrategy::new` with a zero batch size"
        );
        Self { batch_size }
    }

    #[inline]
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }
}

impl StationAddingStrategy for RandomNeighboursStrategy {
    fn name(&self) -> &str {
        "RandomNeighboursStrategy"
    }

    fn subsets<'a>(
        &self,
        graph: &'a InterferenceGraph,
        seed_stations: &BTreeSet<Station>,
        seed: u64,
    ) -> StationSubsets<'a> {
        assert!(
            !seed_stations.is_empty(),
            "called `RandomNeighboursStrategy::subsets` with no seed stations"
        );
        Box::new(RandomIter {
            graph,
            current: seed_stations.clone(),
            leftovers: Vec::new(),
            batch_size: self.batch_size,
            rng: StdRng::seed_from_u64(seed),
        })
    }
}

struct RandomIter<'a> {
    graph: &'a InterferenceGraph,
    current: BTreeSet<Station>,
    /// Frontier stations of an earlier layer that have not been drawn yet.
    leftovers: Vec<Station>,
    batch_size: usize,
    rng: StdRng,
}

impl Iterator for RandomIter<'_> {
    type Item = BTreeSet<Station>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut remaining = self.batch_size;
        while remaining > 0 {
            if self.leftovers.is_empty() {
                self.leftovers = self.graph.neighbourhood(&self.current).into_iter().collect();
                if self.leftovers.is_empty() {
                    break;
                }
                self.leftovers.shuffle(&mut self.rng);
            }
            let take = remaining.min(self.leftovers.len());
            let split = self.leftovers.len() - take;
            self.current.extend(self.leftovers.drain(split..));
            remaining -= take;
        }

        if remaining == self.batch_size {
            return None;
        }
        trace!(
            "random round adds {} stations",
            self.batch_size - remaining
        );
        Some(self.current.clone())
    }
}
