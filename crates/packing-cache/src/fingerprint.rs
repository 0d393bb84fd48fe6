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

//! Deterministic SHA-256 fingerprints.
//!
//! Every digest starts with a domain tag (`SPK:<domain>:v1`) so that
//! fingerprints of different kinds of data can never collide, and every
//! variable-length section is prefixed with its length.

use packing_model::instance::StationPackingInstance;
use sha2::{Digest, Sha256};

/// A 256-bit digest identifying cached data.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    #[inline]
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    #[inline]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Hashes `data` under the domain tag `domain`.
    pub fn hash_with_domain(domain: &[u8], data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(b"SPK:");
        hasher.update(domain);
        hasher.update(b":v1");
        hasher.update((data.len() as u64).to_le_bytes());
        hasher.update(data);
        Self(hasher.finalize().into())
    }

    /// Fingerprints the station set and domains of `instance`. The previous
    /// assignment and metadata do not influence feasibility and are ignored.
    pub fn of_instance(instance: &StationPackingInstance) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(b"SPK:instance:v1");
        hasher.update((instance.num_stations() as u64).to_le_bytes());
        for (station, domain) in instance.domains() {
            hasher.update(station.get().to_le_bytes());
            hasher.update((domain.len() as u64).to_le_bytes());
            for channel in domain {
                hasher.update(channel.get().to_le_bytes());
            }
        }
        Self(hasher.finalize().into())
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for byte in &self.0[..4] {
            write!(f, "{:02x}", byte)?;
        }
        write!(f, "…")
    }
}

impl std::fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Fingerprint({})", self)
    }
}

/// Identifies the data universe a cache entry was computed in.
///
/// Two entries are only ever compared when their coordinates are equal.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct CacheCoordinate {
    domain_hash: Fingerprint,
    interference_hash: Fingerprint,
}

impl CacheCoordinate {
    #[inline]
    pub const fn new(domain_hash: Fingerprint, interference_hash: Fingerprint) -> Self {
        Self {
            domain_hash,
            interference_hash,
        }
    }

    /// Builds a coordinate from the raw bytes (or names) of the domain and
    /// interference data sets.
    pub fn from_data(domain_data: &[u8], interference_data: &[u8]) -> Self {
        Self::new(
            Fingerprint::hash_with_domain(b"domains", domain_data),
            Fingerprint::hash_with_domain(b"interference", interference_data),
        )
    }

    #[inline]
    pub const fn domain_hash(&self) -> Fingerprint {
        self.domain_hash
    }

    #[inline]
    pub const fn interference_hash(&self) -> Fingerprint {
        self.interference_hash
    }
}

impl std::fmt::Display for CacheCoordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.domain_hash, self.interference_hash)
    }
}
