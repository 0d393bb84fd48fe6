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

//! # Strongly Typed Identifiers (Zero-Cost)
//!
//! Phantom-typed wrappers around `u32` to prevent mixing identifiers from
//! different domains (e.g., stations vs. channels). `TypedId<T>` carries a
//! tag type `T: TypedIdTag` that encodes intent at the type level, while
//! compiling down to a transparent `u32`.
//!
//! ## Motivation
//!
//! A station packing query juggles two integer spaces at once: station
//! identifiers and channel numbers. Both are small integers and both appear in
//! the same maps and constraint tuples. Raw integers invite accidental swaps;
//! phantom-tagged identifiers turn those swaps into compile errors.
//!
//! ## Highlights
//!
//! - `TypedIdTag` defines a human-readable `NAME` used for `Display`/`Debug`.
//! - `TypedId<T>` offers `new`, `get`, and `checked_offset` for channel
//!   adjacency arithmetic that must not wrap.
//! - Identifiers are totally ordered so they can key `BTreeMap`s and be
//!   iterated deterministically.
//! - Zero-cost: `#[repr(transparent)]` over `u32`.
//!
//! ## Usage
//!
//! ```rust
//! use packing_core::utils::id::{TypedId, TypedIdTag};
//!
//! #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
//! struct StationTag;
//! impl TypedIdTag for StationTag { const NAME: &'static str = "Station"; }
//!
//! type Station = TypedId<StationTag>;
//! let s = Station::new(3);
//! assert_eq!(s.get(), 3);
//! assert_eq!(format!("{}", s), "Station(3)");
//! ```

/// A trait to tag typed identifiers with a name for debugging and display purposes.
///
/// # Examples
///
/// ```rust
/// # use packing_core::utils::id::TypedIdTag;
///
/// #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
/// struct MyTag;
///
/// impl TypedIdTag for MyTag {
///     const NAME: &'static str = "MyId";
/// }
/// ```
pub trait TypedIdTag: Clone {
    const NAME: &'static str;
}

/// A strongly typed identifier associated with a specific tag type `T`.
///
/// The identifier wraps a `u32` and uses a phantom type parameter `T`
/// to keep identifiers of different kinds apart.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypedId<T> {
    id: u32,
    _marker: std::marker::PhantomData<T>,
}

impl<T> TypedId<T> {
    /// Creates a new `TypedId` with the given raw identifier.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use packing_core::utils::id::{TypedId, TypedIdTag};
    ///
    /// #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
    /// struct MyTag;
    ///
    /// impl TypedIdTag for MyTag {
    ///    const NAME: &'static str = "MyId";
    /// }
    ///
    /// let id = TypedId::<MyTag>::new(5);
    /// assert_eq!(id.get(), 5);
    /// ```
    #[inline(always)]
    pub const fn new(id: u32) -> Self {
        Self {
            id,
            _marker: std::marker::PhantomData,
        }
    }

    /// Returns the underlying raw identifier.
    #[inline(always)]
    pub const fn get(&self) -> u32 {
        self.id
    }

    /// Returns the identifier shifted by `delta`, or `None` if the result
    /// would leave the `u32` range.
    ///
    /// Used for channel adjacency (`c + 1`, `c - 2`, ...), where wrapping
    /// would silently relate unrelated channels.
    #[inline]
    pub const fn checked_offset(&self, delta: i64) -> Option<Self> {
        let shifted = self.id as i64 + delta;
        if shifted < 0 || shifted > u32::MAX as i64 {
            return None;
        }
        Some(Self::new(shifted as u32))
    }
}

impl<T> std::fmt::Debug for TypedId<T>
where
    T: TypedIdTag,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", T::NAME, self.id)
    }
}

impl<T> std::fmt::Display for TypedId<T>
where
    T: TypedIdTag,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", T::NAME, self.id)
    }
}

impl<T> From<u32> for TypedId<T> {
    fn from(id: u32) -> Self {
        Self::new(id)
    }
}

impl<T> From<TypedId<T>> for u32 {
    fn from(typed_id: TypedId<T>) -> Self {
        typed_id.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
    struct TestTag;

    impl TypedIdTag for TestTag {
        const NAME: &'static str = "TestId";
    }

    type TestId = TypedId<TestTag>;

    #[test]
    fn test_new_and_get() {
        let id = TestId::new(10);
        assert_eq!(id.get(), 10);
    }

    #[test]
    fn test_conversions() {
        let id: TestId = 42.into();
        assert_eq!(id.get(), 42);

        let raw: u32 = id.into();
        assert_eq!(raw, 42);
    }

    #[test]
    fn test_debug_and_display() {
        let id = TestId::new(7);
        assert_eq!(format!("{}", id), "TestId(7)");
        assert_eq!(format!("{:?}", id), "TestId(7)");
    }

    #[test]
    fn test_ordering_follows_raw_value() {
        let mut ids = vec![TestId::new(9), TestId::new(1), TestId::new(4)];
        ids.sort();
        let raw: Vec<u32> = ids.into_iter().map(u32::from).collect();
        assert_eq!(raw, vec![1, 4, 9]);
    }

    #[test]
    fn test_checked_offset_in_range() {
        let id = TestId::new(14);
        assert_eq!(id.checked_offset(1), Some(TestId::new(15)));
        assert_eq!(id.checked_offset(-2), Some(TestId::new(12)));
        assert_eq!(id.checked_offset(0), Some(id));
    }

    #[test]
    fn test_checked_offset_rejects_wraparound() {
        assert_eq!(TestId::new(0).checked_offset(-1), None);
        assert_eq!(TestId::new(u32::MAX).checked_offset(1), None);
    }
}
