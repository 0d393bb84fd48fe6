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

//! # Station Packing Instance
//!
//! The immutable problem statement of one feasibility query: per-station
//! channel domains, an optional partial previous assignment, and descriptive
//! metadata that carries no semantics.
//!
//! Instances are built once per top-level query through `InstanceBuilder` and
//! then only ever narrowed into new instances. Every constructed instance
//! satisfies two invariants:
//!
//! - every domain is non-empty;
//! - every station of the previous assignment has a domain.
//!
//! The previous channel of a station is a hint and may lie outside the
//! station's current domain.

use crate::error::{InstanceError, Result};
use crate::index::{Channel, Station};
use std::collections::{BTreeMap, BTreeSet};

/// The size of the raw search space of an instance, `prod |D(s)|`.
///
/// Realistic instances have thousands of stations with dozens of channels
/// each, so the product is stored in logarithmic space ($\log_{10}$).
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, PartialOrd)]
pub struct SearchSpace {
    log_val: f64,
}

impl SearchSpace {
    /// Computes the search space for the given domain sizes.
    pub fn from_domain_sizes<I>(sizes: I) -> Self
    where
        I: IntoIterator<Item = usize>,
    {
        let log_val = sizes
            .into_iter()
            .filter(|&size| size > 0)
            .map(|size| (size as f64).log10())
            .sum();
        Self { log_val }
    }

    /// Returns the exponent (order of magnitude).
    #[inline]
    pub fn exponent(&self) -> u64 {
        self.log_val.floor() as u64
    }

    /// Returns the mantissa (coefficient).
    #[inline]
    pub fn mantissa(&self) -> f64 {
        let fractional_part = self.log_val - self.log_val.floor();
        10.0_f64.powf(fractional_part)
    }

    /// Returns the raw log10 value.
    #[inline]
    pub fn raw(&self) -> f64 {
        self.log_val
    }
}

impl std::fmt::Display for SearchSpace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2} × 10^{}", self.mantissa(), self.exponent())
    }
}

impl std::fmt::Debug for SearchSpace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SearchSpace(log10={:.4})", self.log_val)
    }
}

/// Descriptive data attached to an instance. Never consulted by solvers.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InstanceMetadata {
    pub name: String,
    pub info: BTreeMap<String, String>,
}

/// An immutable station packing query.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StationPackingInstance {
    domains: BTreeMap<Station, BTreeSet<Channel>>,
    previous_assignment: BTreeMap<Station, Channel>,
    metadata: InstanceMetadata,
}

impl StationPackingInstance {
    /// Creates a validated instance.
    ///
    /// # Errors
    ///
    /// Returns `InstanceError::EmptyDomain` if a station has no channels and
    /// `InstanceError::PreviousAssignmentOutsideDomain` if the previous
    /// assignment mentions a station without a domain.
    pub fn new(
        domains: BTreeMap<Station, BTreeSet<Channel>>,
        previous_assignment: BTreeMap<Station, Channel>,
        metadata: InstanceMetadata,
    ) -> Result<Self> {
        if let Some((&station, _)) = domains.iter().find(|(_, domain)| domain.is_empty()) {
            return Err(InstanceError::EmptyDomain(station));
        }
        if let Some((&station, &channel)) = previous_assignment
            .iter()
            .find(|(station, _)| !domains.contains_key(station))
        {
            return Err(InstanceError::PreviousAssignmentOutsideDomain { station, channel });
        }

        Ok(Self {
            domains,
            previous_assignment,
            metadata,
        })
    }

    /// Creates an instance from parts that are known to satisfy the invariants,
    /// e.g. a narrowing of an existing instance.
    fn from_valid_parts(
        domains: BTreeMap<Station, BTreeSet<Channel>>,
        previous_assignment: BTreeMap<Station, Channel>,
        metadata: InstanceMetadata,
    ) -> Self {
        debug_assert!(domains.values().all(|domain| !domain.is_empty()));
        debug_assert!(previous_assignment
            .keys()
            .all(|station| domains.contains_key(station)));
        Self {
            domains,
            previous_assignment,
            metadata,
        }
    }

    #[inline]
    pub fn domains(&self) -> &BTreeMap<Station, BTreeSet<Channel>> {
        &self.domains
    }

    #[inline]
    pub fn domain(&self, station: Station) -> Option<&BTreeSet<Channel>> {
        self.domains.get(&station)
    }

    #[inline]
    pub fn contains_station(&self, station: Station) -> bool {
        self.domains.contains_key(&station)
    }

    /// Iterates over the stations in ascending order.
    #[inline]
    pub fn stations(&self) -> impl Iterator<Item = Station> + '_ {
        self.domains.keys().copied()
    }

    pub fn station_set(&self) -> BTreeSet<Station> {
        self.domains.keys().copied().collect()
    }

    #[inline]
    pub fn num_stations(&self) -> usize {
        self.domains.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }

    /// Returns the union of all domains.
    pub fn channels(&self) -> BTreeSet<Channel> {
        self.domains.values().flatten().copied().collect()
    }

    #[inline]
    pub fn previous_assignment(&self) -> &BTreeMap<Station, Channel> {
        &self.previous_assignment
    }

    #[inline]
    pub fn previous_channel(&self, station: Station) -> Option<Channel> {
        self.previous_assignment.get(&station).copied()
    }

    #[inline]
    pub fn metadata(&self) -> &InstanceMetadata {
        &self.metadata
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn search_space(&self) -> SearchSpace {
        SearchSpace::from_domain_sizes(self.domains.values().map(BTreeSet::len))
    }

    /// Returns `true` if every station of `self` is a station of `other` and
    /// every domain of `self` is a subset of the matching domain of `other`.
    pub fn is_contained_in(&self, other: &StationPackingInstance) -> bool {
        self.domains.iter().all(|(station, domain)| {
            other
                .domains
                .get(station)
                .is_some_and(|other_domain| domain.is_subset(other_domain))
        })
    }

    /// Returns the sub-instance over the given stations. Stations that are not
    /// part of `self` are ignored.
    pub fn restricted_to(&self, stations: &BTreeSet<Station>) -> StationPackingInstance {
        let domains = self
            .domains
            .iter()
            .filter(|(station, _)| stations.contains(station))
            .map(|(&station, domain)| (station, domain.clone()))
            .collect();
        let previous_assignment = self
            .previous_assignment
            .iter()
            .filter(|(station, _)| stations.contains(station))
            .map(|(&station, &channel)| (station, channel))
            .collect();
        Self::from_valid_parts(domains, previous_assignment, self.metadata.clone())
    }

    /// Returns the instance without the given stations.
    pub fn without(&self, stations: &BTreeSet<Station>) -> StationPackingInstance {
        let keep: BTreeSet<Station> = self
            .domains
            .keys()
            .filter(|station| !stations.contains(station))
            .copied()
            .collect();
        self.restricted_to(&keep)
    }

    /// Returns the instance with its domains replaced by `domains`.
    ///
    /// The previous assignment is kept for stations that remain.
    ///
    /// # Errors
    ///
    /// Returns `InstanceError::EmptyDomain` if any replacement domain is empty.
    pub fn with_domains(
        &self,
        domains: BTreeMap<Station, BTreeSet<Channel>>,
    ) -> Result<StationPackingInstance> {
        let previous_assignment = self
            .previous_assignment
            .iter()
            .filter(|(station, _)| domains.contains_key(station))
            .map(|(&station, &channel)| (station, channel))
            .collect();
        Self::new(domains, previous_assignment, self.metadata.clone())
    }
}

impl std::fmt::Display for StationPackingInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = if self.metadata.name.is_empty() {
            "<unnamed>"
        } else {
            self.metadata.name.as_str()
        };
        write!(
            f,
            "{}: {} stations, {} channels, {} previously assigned",
            name,
            self.domains.len(),
            self.channels().len(),
            self.previous_assignment.len()
        )
    }
}

/// A builder for `StationPackingInstance`.
///
/// # Examples
///
/// ```rust
/// use packing_model::index::{Channel, Station};
/// use packing_model::instance::InstanceBuilder;
///
/// let mut builder = InstanceBuilder::new();
/// builder
///     .with_name("two stations")
///     .add_station(Station::new(1), [Channel::new(14), Channel::new(15)])
///     .add_station(Station::new(2), [Channel::new(14)])
///     .with_previous_channel(Station::new(1), Channel::new(15));
/// let instance = builder.build().unwrap();
/// assert_eq!(instance.num_stations(), 2);
/// ```
#[derive(Clone, Debug, Default)]
pub struct InstanceBuilder {
    domains: BTreeMap<Station, BTreeSet<Channel>>,
    previous_assignment: BTreeMap<Station, Channel>,
    metadata: InstanceMetadata,
}

impl InstanceBuilder {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a station with the given domain, merging with any channels already
    /// added for it.
    pub fn add_station<I>(&mut self, station: Station, channels: I) -> &mut Self
    where
        I: IntoIterator<Item = Channel>,
    {
        self.domains.entry(station).or_default().extend(channels);
        self
    }

    #[inline]
    pub fn with_previous_channel(&mut self, station: Station, channel: Channel) -> &mut Self {
        self.previous_assignment.insert(station, channel);
        self
    }

    pub fn with_previous_assignment<I>(&mut self, assignment: I) -> &mut Self
    where
        I: IntoIterator<Item = (Station, Channel)>,
    {
        self.previous_assignment.extend(assignment);
        self
    }

    #[inline]
    pub fn with_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.metadata.name = name.into();
        self
    }

    #[inline]
    pub fn with_info(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.metadata.info.insert(key.into(), value.into());
        self
    }

    /// Builds the instance.
    ///
    /// # Errors
    ///
    /// See `StationPackingInstance::new`.
    pub fn build(&self) -> Result<StationPackingInstance> {
        StationPackingInstance::new(
            self.domains.clone(),
            self.previous_assignment.clone(),
            self.metadata.clone(),
        )
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

    fn four_station_instance() -> StationPackingInstance {
        let mut builder = InstanceBuilder::new();
        for id in 1..=4 {
            builder.add_station(s(id), [c(14), c(15), c(16)]);
        }
        builder
            .with_previous_channel(s(1), c(14))
            .with_previous_channel(s(3), c(16))
            .with_name("four");
        builder.build().unwrap()
    }

    #[test]
    fn test_build_rejects_empty_domain() {
        let mut builder = InstanceBuilder::new();
        builder.add_station(s(1), [c(14)]).add_station(s(2), []);
        match builder.build() {
            Err(InstanceError::EmptyDomain(station)) => assert_eq!(station, s(2)),
            other => panic!("expected EmptyDomain, got {:?}", other),
        }
    }

    #[test]
    fn test_build_rejects_previous_assignment_without_domain() {
        let mut builder = InstanceBuilder::new();
        builder
            .add_station(s(1), [c(14)])
            .with_previous_channel(s(9), c(14));
        match builder.build() {
            Err(InstanceError::PreviousAssignmentOutsideDomain { station, .. }) => {
                assert_eq!(station, s(9))
            }
            other => panic!("expected PreviousAssignmentOutsideDomain, got {:?}", other),
        }
    }

    #[test]
    fn test_previous_channel_outside_domain_is_allowed() {
        let mut builder = InstanceBuilder::new();
        builder
            .add_station(s(1), [c(14)])
            .with_previous_channel(s(1), c(30));
        let instance = builder.build().unwrap();
        assert_eq!(instance.previous_channel(s(1)), Some(c(30)));
    }

    #[test]
    fn test_restricted_to_keeps_previous_assignment_of_kept_stations() {
        let instance = four_station_instance();
        let sub = instance.restricted_to(&[s(1), s(2)].into_iter().collect());

        assert_eq!(sub.num_stations(), 2);
        assert_eq!(sub.previous_channel(s(1)), Some(c(14)));
        assert_eq!(sub.previous_channel(s(3)), None);
        assert_eq!(sub.name(), "four");
        assert!(sub.is_contained_in(&instance));
        assert!(!instance.is_contained_in(&sub));
    }

    #[test]
    fn test_without_removes_stations() {
        let instance = four_station_instance();
        let rest = instance.without(&[s(1), s(4)].into_iter().collect());
        let stations: Vec<Station> = rest.stations().collect();
        assert_eq!(stations, vec![s(2), s(3)]);
    }

    #[test]
    fn test_without_empty_set_is_identity() {
        let instance = four_station_instance();
        assert_eq!(instance.without(&BTreeSet::new()), instance);
    }

    #[test]
    fn test_with_domains_shrinks_and_validates() {
        let instance = four_station_instance();
        let mut domains = instance.domains().clone();
        domains.insert(s(2), [c(15)].into_iter().collect());
        let narrowed = instance.with_domains(domains.clone()).unwrap();
        assert_eq!(narrowed.domain(s(2)).unwrap().len(), 1);
        assert!(narrowed.is_contained_in(&instance));

        domains.insert(s(3), BTreeSet::new());
        assert_eq!(
            instance.with_domains(domains),
            Err(InstanceError::EmptyDomain(s(3)))
        );
    }

    #[test]
    fn test_search_space_is_log_of_domain_product() {
        let instance = four_station_instance();
        let space = instance.search_space();
        // 3^4 = 81
        assert!((space.raw() - 81f64.log10()).abs() < 1e-9);
        assert_eq!(space.exponent(), 1);
        assert_eq!(format!("{}", space), "8.10 × 10^1");
    }

    #[test]
    fn test_display_summarizes_instance() {
        let instance = four_station_instance();
        assert_eq!(
            format!("{}", instance),
            "four: 4 stations, 3 channels, 2 previously assigned"
        );
    }
}
