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

//! # In-Memory Containment Cache
//!
//! Each coordinate owns a station universe that maps every station ever
//! stored under it to a bit index. Entries keep their station set as a
//! `FixedBitSet` over that universe, so the containment test on the station
//! sets is a word-wise subset check. Domain and witness checks only run on
//! the entries that survive it.
//!
//! Bit indices are handed out in first-seen order and never change, so older
//! entries stay valid as the universe grows. Entries are append-only and
//! deduplicated by fingerprint.

use crate::cache::{ContainmentCache, SatHit, UnsatHit};
use crate::error::{CacheError, Result};
use crate::fingerprint::{CacheCoordinate, Fingerprint};
use fixedbitset::FixedBitSet;
use log::{debug, trace};
use packing_model::assignment::Assignment;
use packing_model::index::{Channel, Station};
use packing_model::instance::StationPackingInstance;
use packing_search::result::{SatResult, SolverResult};
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::RwLock;

#[derive(Debug)]
struct SatEntry {
    fingerprint: Fingerprint,
    stations: FixedBitSet,
    witness: BTreeMap<Station, Channel>,
}

#[derive(Debug)]
struct UnsatEntry {
    fingerprint: Fingerprint,
    stations: FixedBitSet,
    domains: BTreeMap<Station, BTreeSet<Channel>>,
}

#[derive(Debug, Default)]
struct Universe {
    bit_of: FxHashMap<Station, usize>,
    fingerprints: FxHashSet<Fingerprint>,
    sat: Vec<SatEntry>,
    unsat: Vec<UnsatEntry>,
}

impl Universe {
    /// Bit set of the stations of `instance`, registering unknown stations.
    fn register(&mut self, instance: &StationPackingInstance) -> FixedBitSet {
        for station in instance.stations() {
            let next = self.bit_of.len();
            self.bit_of.entry(station).or_insert(next);
        }
        let mut bits = FixedBitSet::with_capacity(self.bit_of.len());
        for station in instance.stations() {
            if let Some(&bit) = self.bit_of.get(&station) {
                bits.insert(bit);
            }
        }
        bits
    }

    /// Bit set of the known stations of `instance` and whether every station
    /// was known.
    fn lookup_bits(&self, instance: &StationPackingInstance) -> (FixedBitSet, bool) {
        let mut bits = FixedBitSet::with_capacity(self.bit_of.len());
        let mut complete = true;
        for station in instance.stations() {
            match self.bit_of.get(&station) {
                Some(&bit) => bits.insert(bit),
                None => complete = false,
            }
        }
        (bits, complete)
    }
}

/// A process-local `ContainmentCache`.
#[derive(Debug, Default)]
pub struct InMemoryContainmentCache {
    universes: RwLock<FxHashMap<CacheCoordinate, Universe>>,
}

fn poisoned<T>(_: T) -> CacheError {
    CacheError::Unavailable("cache lock poisoned".to_string())
}

impl InMemoryContainmentCache {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of (SAT, UNSAT) entries stored under `coordinate`.
    pub fn entry_counts(&self, coordinate: &CacheCoordinate) -> Result<(usize, usize)> {
        let universes = self.universes.read().map_err(poisoned)?;
        Ok(universes
            .get(coordinate)
            .map_or((0, 0), |universe| (universe.sat.len(), universe.unsat.len())))
    }
}

impl ContainmentCache for InMemoryContainmentCache {
    fn name(&self) -> &str {
        "InMemoryContainmentCache"
    }

    fn put_result(
        &self,
        coordinate: &CacheCoordinate,
        instance: &StationPackingInstance,
        result: &SolverResult,
    ) -> Result<bool> {
        if !result.is_conclusive() {
            return Ok(false);
        }

        let fingerprint = Fingerprint::of_instance(instance);
        let mut universes = self.universes.write().map_err(poisoned)?;
        let universe = universes.entry(*coordinate).or_default();
        if !universe.fingerprints.insert(fingerprint) {
            trace!("cache already holds {}", fingerprint);
            return Ok(false);
        }

        let stations = universe.register(instance);
        match result.result() {
            SatResult::Sat => universe.sat.push(SatEntry {
                fingerprint,
                stations,
                witness: result.assignment().to_station_map(),
            }),
            _ => universe.unsat.push(UnsatEntry {
                fingerprint,
                stations,
                domains: instance.domains().clone(),
            }),
        }
        debug!(
            "cached {} for {} ({} stations) under {}",
            result.result(),
            fingerprint,
            instance.num_stations(),
            coordinate
        );
        Ok(true)
    }

    fn superset_sat(
        &self,
        coordinate: &CacheCoordinate,
        instance: &StationPackingInstance,
    ) -> Result<Option<SatHit>> {
        let universes = self.universes.read().map_err(poisoned)?;
        let Some(universe) = universes.get(coordinate) else {
            return Ok(None);
        };
        let (query, complete) = universe.lookup_bits(instance);
        if !complete {
            // Some station was never cached, so no entry can contain the query.
            return Ok(None);
        }

        for entry in &universe.sat {
            if !query.is_subset(&entry.stations) {
                continue;
            }
            let witness: Option<Assignment> = instance
                .domains()
                .iter()
                .map(|(&station, domain)| {
                    entry
                        .witness
                        .get(&station)
                        .filter(|&&channel| domain.contains(&channel))
                        .map(|&channel| (station, channel))
                })
                .collect();
            if let Some(assignment) = witness {
                return Ok(Some(SatHit {
                    fingerprint: entry.fingerprint,
                    assignment,
                }));
            }
        }
        Ok(None)
    }

    fn subset_unsat(
        &self,
        coordinate: &CacheCoordinate,
        instance: &StationPackingInstance,
    ) -> Result<Option<UnsatHit>> {
        let universes = self.universes.read().map_err(poisoned)?;
        let Some(universe) = universes.get(coordinate) else {
            return Ok(None);
        };
        let (query, _) = universe.lookup_bits(instance);

        let hit = universe.unsat.iter().find(|entry| {
            entry.stations.is_subset(&query)
                && entry.domains.iter().all(|(&station, domain)| {
                    instance
                        .domain(station)
                        .is_some_and(|query_domain| domain.is_subset(query_domain))
                })
        });
        Ok(hit.map(|entry| UnsatHit {
            fingerprint: entry.fingerprint,
        }))
    }
}
