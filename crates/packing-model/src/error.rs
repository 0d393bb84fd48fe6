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

//! Error types for instance construction and assignment validation.

use crate::index::{Channel, Station};
use thiserror::Error;

/// Errors raised while constructing a `StationPackingInstance`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InstanceError {
    #[error("{0} has an empty channel domain")]
    EmptyDomain(Station),

    #[error("previous assignment places {station} on {channel}, but {station} has no domain")]
    PreviousAssignmentOutsideDomain { station: Station, channel: Channel },
}

/// Errors raised when an assignment fails independent verification.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is not assigned a channel")]
    MissingStation(Station),

    #[error("{station} is assigned twice ({first} and {second})")]
    DuplicateStation {
        station: Station,
        first: Channel,
        second: Channel,
    },

    #[error("{0} is assigned but is not part of the instance")]
    UnknownStation(Station),

    #[error("{station} is assigned {channel}, which is outside its domain")]
    ChannelOutsideDomain { station: Station, channel: Channel },

    #[error("{first_station} on {first_channel} interferes with {second_station} on {second_channel}")]
    ConstraintViolated {
        first_station: Station,
        first_channel: Channel,
        second_station: Station,
        second_channel: Channel,
    },
}

pub type Result<T, E = InstanceError> = std::result::Result<T, E>;
