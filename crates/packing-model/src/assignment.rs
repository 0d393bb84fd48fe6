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

//! # Assignment
//!
//! A channel to station-set mapping, the shape in which witnesses travel back
//! out of the pipeline. Component and removal decorators union assignments of
//! disjoint station sets; the facade flattens them into a station to channel
//! map at the boundary.
//!
//! An `Assignment` does not by itself guarantee that each station appears
//! once. That is checked by `validation::validate_assignment`, which is why
//! `iter` yields every (station, channel) pair rather than a deduplicated view.

use crate::index::{Channel, Station};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Assignment {
    by_channel: BTreeMap<Channel, BTreeSet<Station>>,
}

impl Assignment {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an assignment from a station to channel map.
    pub fn from_station_map(map: &BTreeMap<Station, Channel>) -> Self {
        map.iter().map(|(&station, &channel)| (station, channel)).collect()
    }

    /// Places `station` on `channel`. Returns `false` if that exact placement
    /// already existed.
    #[inline]
    pub fn assign(&mut self, station: Station, channel: Channel) -> bool {
        self.by_channel.entry(channel).or_default().insert(station)
    }

    /// Removes every placement of `station`.
    pub fn unassign(&mut self, station: Station) {
        self.by_channel.retain(|_, stations| {
            stations.remove(&station);
            !stations.is_empty()
        });
    }

    /// Returns the channel of `station`, if it is placed.
    pub fn channel_of(&self, station: Station) -> Option<Channel> {
        self.by_channel
            .iter()
            .find(|(_, stations)| stations.contains(&station))
            .map(|(&channel, _)| channel)
    }

    #[inline]
    pub fn stations_on(&self, channel: Channel) -> Option<&BTreeSet<Station>> {
        self.by_channel.get(&channel)
    }

    /// Iterates over channels and the stations placed on them.
    #[inline]
    pub fn channels(&self) -> impl Iterator<Item = (Channel, &BTreeSet<Station>)> + '_ {
        self.by_channel.iter().map(|(&channel, stations)| (channel, stations))
    }

    /// Iterates over every (station, channel) placement, ordered by channel.
    pub fn iter(&self) -> impl Iterator<Item = (Station, Channel)> + '_ {
        self.by_channel
            .iter()
            .flat_map(|(&channel, stations)| stations.iter().map(move |&station| (station, channel)))
    }

    /// The number of placements. Equals the number of stations for a valid
    /// assignment.
    pub fn len(&self) -> usize {
        self.by_channel.values().map(BTreeSet::len).sum()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.by_channel.is_empty()
    }

    /// Flattens the assignment into a station to channel map. If a station
    /// is placed more than once, the highest channel wins.
    pub fn to_station_map(&self) -> BTreeMap<Station, Channel> {
        self.iter().collect()
    }

    /// Adds every placement of `other`.
    pub fn merge(&mut self, other: &Assignment) {
        for (channel, stations) in &other.by_channel {
            self.by_channel
                .entry(*channel)
                .or_default()
                .extend(stations.iter().copied());
        }
    }

    /// Returns the placements of the given stations only.
    pub fn restricted_to(&self, stations: &BTreeSet<Station>) -> Assignment {
        self.iter()
            .filter(|(station, _)| stations.contains(station))
            .collect()
    }
}

impl FromIterator<(Station, Channel)> for Assignment {
    fn from_iter<I: IntoIterator<Item = (Station, Channel)>>(iter: I) -> Self {
        let mut assignment = Assignment::new();
        for (station, channel) in iter {
            assignment.assign(station, channel);
        }
        assignment
    }
}

impl std::fmt::Display for Assignment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{")?;
        for (i, (channel, stations)) in self.by_channel.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: [", channel.get())?;
            for (j, station) in stations.iter().enumerate() {
                if j > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", station.get())?;
            }
            write!(f, "]")?;
        }
        write!(f, "}}")
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
    fn test_assign_groups_by_channel() {
        let mut assignment = Assignment::new();
        assert!(assignment.assign(s(1), c(14)));
        assert!(assignment.assign(s(2), c(14)));
        assert!(assignment.assign(s(3), c(15)));
        assert!(!assignment.assign(s(1), c(14)));

        assert_eq!(assignment.len(), 3);
        assert_eq!(assignment.stations_on(c(14)).unwrap().len(), 2);
        assert_eq!(assignment.channel_of(s(3)), Some(c(15)));
        assert_eq!(assignment.channel_of(s(4)), None);
    }

    #[test]
    fn test_unassign_drops_empty_channels() {
        let mut assignment: Assignment = [(s(1), c(14)), (s(2), c(15))].into_iter().collect();
        assignment.unassign(s(2));
        assert_eq!(assignment.stations_on(c(15)), None);
        assert_eq!(assignment.len(), 1);
    }

    #[test]
    fn test_merge_unions_disjoint_assignments() {
        let mut left: Assignment = [(s(1), c(14)), (s(2), c(15))].into_iter().collect();
        let right: Assignment = [(s(3), c(14)), (s(4), c(16))].into_iter().collect();
        left.merge(&right);

        let map = left.to_station_map();
        assert_eq!(map.len(), 4);
        assert_eq!(map[&s(3)], c(14));
        assert_eq!(left.stations_on(c(14)).unwrap().len(), 2);
    }

    #[test]
    fn test_restricted_to_keeps_only_given_stations() {
        let assignment: Assignment = [(s(1), c(14)), (s(2), c(15)), (s(3), c(16))]
            .into_iter()
            .collect();
        let restricted = assignment.restricted_to(&[s(1), s(3)].into_iter().collect());
        assert_eq!(restricted.len(), 2);
        assert_eq!(restricted.channel_of(s(2)), None);
    }

    #[test]
    fn test_iter_reports_duplicates() {
        let mut assignment = Assignment::new();
        assignment.assign(s(1), c(14));
        assignment.assign(s(1), c(15));
        assert_eq!(assignment.iter().count(), 2);
        assert_eq!(assignment.to_station_map().len(), 1);
    }

    #[test]
    fn test_display() {
        let assignment: Assignment = [(s(2), c(15)), (s(1), c(14)), (s(3), c(14))]
            .into_iter()
            .collect();
        assert_eq!(format!("{}", assignment), "{14: [1, 3], 15: [2]}");
    }
}
