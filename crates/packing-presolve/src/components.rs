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

//! # Component Grouping
//!
//! Interference is local, so most instances fall apart into independent
//! sub-problems. A `ComponentGrouper` partitions the stations of an instance
//! into groups that share no constraint at any pair of domain channels.

use packing_model::constraint::ConstraintManager;
use packing_model::graph::InterferenceGraph;
use packing_model::index::Station;
use packing_model::instance::StationPackingInstance;
use std::collections::BTreeSet;

pub trait ComponentGrouper: Send + Sync {
    /// Returns the name of the grouper.
    fn name(&self) -> &str;

    /// Partitions the stations of `instance` into independent groups.
    fn group(
        &self,
        instance: &StationPackingInstance,
        constraints: &dyn ConstraintManager,
    ) -> Vec<BTreeSet<Station>>;
}

impl std::fmt::Debug for dyn ComponentGrouper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ComponentGrouper({})", self.name())
    }
}

/// Groups stations by the connected components of the interference graph,
/// smallest component first. Components of equal size keep the order of
/// their smallest station, so the grouping is deterministic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectedComponentGrouper;

impl ComponentGrouper for ConnectedComponentGrouper {
    fn name(&self) -> &str {
        "ConnectedComponentGrouper"
    }

    fn group(
        &self,
        instance: &StationPackingInstance,
        constraints: &dyn ConstraintManager,
    ) -> Vec<BTreeSet<Station>> {
        let graph = InterferenceGraph::build(instance, constraints);
        let mut components = graph.connected_components();
        components.sort_by_key(BTreeSet::len);
        components
    }
}
