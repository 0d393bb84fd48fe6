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

//! Independent verification of an assignment against an instance.
//!
//! The checks mirror the definition of a station packing witness: every
//! station of the instance is placed exactly once, only stations of the
//! instance are placed, every placement uses a channel from the station's
//! domain, and no two placements interfere. The first violation found is
//! reported.

use crate::assignment::Assignment;
use crate::constraint::ConstraintManager;
use crate::error::ValidationError;
use crate::index::{Channel, Station};
use crate::instance::StationPackingInstance;
use std::collections::BTreeMap;

/// Verifies that `assignment` is a witness for `instance` under `constraints`.
///
/// # Errors
///
/// Returns the first `ValidationError` encountered.
pub fn validate_assignment(
    instance: &StationPackingInstance,
    assignment: &Assignment,
    constraints: &dyn ConstraintManager,
) -> Result<(), ValidationError> {
    let mut placed: BTreeMap<Station, Channel> = BTreeMap::new();

    for (station, channel) in assignment.iter() {
        let Some(domain) = instance.domain(station) else {
            return Err(ValidationError::UnknownStation(station));
        };
        if let Some(first) = placed.insert(station, channel) {
            return Err(ValidationError::DuplicateStation {
                station,
                first,
                second: channel,
            });
        }
        if !domain.contains(&channel) {
            return Err(ValidationError::ChannelOutsideDomain { station, channel });
        }
    }

    if let Some(missing) = instance.stations().find(|station| !placed.contains_key(station)) {
        return Err(ValidationError::MissingStation(missing));
    }

    for (&station, &channel) in &placed {
        for &(other, other_channel) in constraints.interfering(station, channel) {
            if placed.get(&other) == Some(&other_channel) {
                return Err(ValidationError::ConstraintViolated {
                    first_station: station,
                    first_channel: channel,
                    second_station: other,
                    second_channel: other_channel,
                });
            }
        }
    }

    Ok(())
}
