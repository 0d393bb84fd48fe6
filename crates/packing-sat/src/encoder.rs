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

//! # Direct Encoding
//!
//! Reduces a station packing instance to CNF with one boolean variable per
//! placement `(station, channel)` with `channel` in the station's domain:
//!
//! - at least one channel per station: `x(s,c1) ∨ x(s,c2) ∨ ...`;
//! - at most one channel per station: `¬x(s,c) ∨ ¬x(s,c')` for every pair;
//! - every interfering pair of placements inside the instance:
//!   `¬x(s,c) ∨ ¬x(t,d)`.
//!
//! The `VariableMap` returned next to the formula is the variable-meaning
//! table a backend needs to report a model and the pipeline needs to decode
//! it back into an `Assignment`.

use crate::cnf::{Cnf, Literal};
use packing_model::assignment::Assignment;
use packing_model::constraint::{ConstraintManager, Placement};
use packing_model::instance::StationPackingInstance;
use rustc_hash::FxHashMap;

/// Maps CNF variables back to placements.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VariableMap {
    // Variable `v` denotes `placements[v - 1]`.
    placements: Vec<Placement>,
}

impl VariableMap {
    #[inline]
    pub fn placement(&self, var: u32) -> Option<Placement> {
        (var as usize)
            .checked_sub(1)
            .and_then(|index| self.placements.get(index))
            .copied()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.placements.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }

    /// Decodes a model (indexed by `var - 1`) into the assignment of every
    /// placement set to true.
    pub fn decode(&self, model: &[bool]) -> Assignment {
        self.placements
            .iter()
            .zip(model)
            .filter(|(_, &value)| value)
            .map(|(&placement, _)| placement)
            .collect()
    }
}

/// Encodes `instance` under `constraints`.
pub fn encode(
    instance: &StationPackingInstance,
    constraints: &dyn ConstraintManager,
) -> (Cnf, VariableMap) {
    let mut cnf = Cnf::new();
    let mut placements = Vec::new();
    let mut vars: FxHashMap<Placement, u32> = FxHashMap::default();

    for (&station, domain) in instance.domains() {
        let station_vars: Vec<u32> = domain
            .iter()
            .map(|&channel| {
                let var = cnf.new_var();
                placements.push((station, channel));
                vars.insert((station, channel), var);
                var
            })
            .collect();

        cnf.add_clause(station_vars.iter().map(|&var| Literal::positive(var)));
        for (i, &first) in station_vars.iter().enumerate() {
            for &second in &station_vars[i + 1..] {
                cnf.add_clause([Literal::negative(first), Literal::negative(second)]);
            }
        }
    }

    for (index, &placement) in placements.iter().enumerate() {
        let var = index as u32 + 1;
        for other in constraints.interfering(placement.0, placement.1) {
            // Each symmetric pair is emitted once, from its smaller side.
            if *other <= placement {
                continue;
            }
            if let Some(&other_var) = vars.get(other) {
                cnf.add_clause([Literal::negative(var), Literal::negative(other_var)]);
            }
        }
    }

    (cnf, VariableMap { placements })
}

#[cfg(test)]
mod tests {
    use super::*;
    use packing_model::constraint::ConstraintSet;
    use packing_model::index::{Channel, Station};
    use packing_model::instance::InstanceBuilder;

    fn s(id: u32) -> Station {
        Station::new(id)
    }

    fn c(id: u32) -> Channel {
        Channel::new(id)
    }

    #[test]
    fn test_clause_counts() {
        let mut builder = InstanceBuilder::new();
        builder
            .add_station(s(1), [c(14), c(15), c(16)])
            .add_station(s(2), [c(14), c(15)]);
        let instance = builder.build().unwrap();

        let mut constraints = ConstraintSet::new();
        constraints.add_co_channel(s(1), s(2), c(14));
        constraints.add_co_channel(s(1), s(2), c(16)); // 16 is not in D(2)
        constraints.add_co_channel(s(1), s(3), c(15)); // 3 is absent

        let (cnf, map) = encode(&instance, &constraints);
        assert_eq!(cnf.num_vars(), 5);
        assert_eq!(map.len(), 5);
        // 2 ALO + 3 AMO for station 1 + 1 AMO for station 2 + 1 interference
        assert_eq!(cnf.num_clauses(), 7);
    }

    #[test]
    fn test_decode_returns_true_placements() {
        let mut builder = InstanceBuilder::new();
        builder
            .add_station(s(1), [c(14), c(15)])
            .add_station(s(2), [c(14)]);
        let instance = builder.build().unwrap();
        let (_, map) = encode(&instance, &ConstraintSet::new());

        assert_eq!(map.placement(1), Some((s(1), c(14))));
        assert_eq!(map.placement(0), None);

        let assignment = map.decode(&[false, true, true]);
        assert_eq!(assignment.channel_of(s(1)), Some(c(15)));
        assert_eq!(assignment.channel_of(s(2)), Some(c(14)));
    }
}
