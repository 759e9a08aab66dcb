//! Pluggable hashing and equality for stored values.

use core::fmt;
use core::hash::{BuildHasher, Hash};
use hashbrown::DefaultHashBuilder;

/// The hash function and equivalence relation a multiset is built with.
///
/// Implementations must be consistent: `equal(a, b)` implies
/// `hash(a) == hash(b)`. Each value is hashed once, on insertion; the
/// stored hash is reused when the bucket table is rebuilt.
pub trait HashEq<T: ?Sized> {
    fn hash(&self, value: &T) -> u64;
    fn equal(&self, a: &T, b: &T) -> bool;
}

/// `Hash + Eq` on the element type, hashed through a `BuildHasher`.
#[derive(Clone, Debug, Default)]
pub struct StdHashEq<S = DefaultHashBuilder> {
    build: S,
}

impl<S> StdHashEq<S> {
    pub fn new(build: S) -> Self {
        Self { build }
    }

    pub fn hasher(&self) -> &S {
        &self.build
    }
}

impl<T, S> HashEq<T> for StdHashEq<S>
where
    T: ?Sized + Hash + Eq,
    S: BuildHasher,
{
    #[inline]
    fn hash(&self, value: &T) -> u64 {
        self.build.hash_one(value)
    }

    #[inline]
    fn equal(&self, a: &T, b: &T) -> bool {
        a == b
    }
}

/// A hash/equality pair made from two closures.
///
/// ```
/// use unordered_multiset::{FnHashEq, UnorderedMultiset};
///
/// // Case-insensitive strings.
/// let folding = FnHashEq::new(
///     |s: &String| s.to_ascii_lowercase().bytes().fold(0u64, |h, b| h.wrapping_mul(31) ^ b as u64),
///     |a: &String, b: &String| a.eq_ignore_ascii_case(b),
/// );
/// let mut words = UnorderedMultiset::with_hash_eq(folding);
/// words.insert("Apple".to_string());
/// words.insert("APPLE".to_string());
/// assert_eq!(words.count(&"apple".to_string()), 2);
/// ```
#[derive(Clone)]
pub struct FnHashEq<H, Q> {
    hash: H,
    equal: Q,
}

impl<H, Q> FnHashEq<H, Q> {
    pub fn new(hash: H, equal: Q) -> Self {
        Self { hash, equal }
    }
}

impl<H, Q> fmt::Debug for FnHashEq<H, Q> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnHashEq").finish_non_exhaustive()
    }
}

impl<T, H, Q> HashEq<T> for FnHashEq<H, Q>
where
    T: ?Sized,
    H: Fn(&T) -> u64,
    Q: Fn(&T, &T) -> bool,
{
    #[inline]
    fn hash(&self, value: &T) -> u64 {
        (self.hash)(value)
    }

    #[inline]
    fn equal(&self, a: &T, b: &T) -> bool {
        (self.equal)(a, b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::RandomState;

    #[test]
    fn std_hash_eq_is_deterministic_per_builder() {
        let he = StdHashEq::new(RandomState::new());
        assert_eq!(HashEq::<str>::hash(&he, "abc"), HashEq::<str>::hash(&he, "abc"));
        assert!(HashEq::<str>::equal(&he, "abc", "abc"));
        assert!(!HashEq::<str>::equal(&he, "abc", "abd"));
    }

    #[test]
    fn closures_are_used_verbatim() {
        let he = FnHashEq::new(|v: &u32| u64::from(*v % 3), |a: &u32, b: &u32| a % 3 == b % 3);
        assert_eq!(he.hash(&7), 1);
        assert!(he.equal(&1, &4));
        assert!(!he.equal(&1, &5));
        assert_eq!(format!("{:?}", he), "FnHashEq { .. }");
    }
}
