//! LoadPolicy: per-instance sizing and growth ratios for the bucket table.

use crate::error::MultisetError;

/// Tunable ratios governing how many buckets the table keeps.
///
/// - `ratio` scales an anticipated element count into a reservation when the
///   table grows or is bulk loaded.
/// - `max_ratio` is the largest `len / bucket_count` allowed before the next
///   insertion batch grows the table.
/// - `min_buckets` is the size the table starts at and returns to on `clear`.
///
/// Bucket counts are always powers of two, so every computed requirement is
/// rounded up to the next one.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LoadPolicy {
    ratio: f64,
    max_ratio: f64,
    min_buckets: usize,
}

impl LoadPolicy {
    pub const DEFAULT_RATIO: f64 = 1.0;
    pub const DEFAULT_MAX_RATIO: f64 = 2.0;
    pub const DEFAULT_MIN_BUCKETS: usize = 8;

    /// Build a policy, rejecting ratios that are not finite and positive.
    pub fn new(ratio: f64, max_ratio: f64) -> Result<Self, MultisetError> {
        let policy = Self {
            ratio,
            max_ratio,
            min_buckets: Self::DEFAULT_MIN_BUCKETS,
        };
        policy.validate()?;
        Ok(policy)
    }

    /// Replace the minimum bucket count. Zero is raised to one.
    pub fn with_min_buckets(mut self, min_buckets: usize) -> Self {
        self.min_buckets = min_buckets.max(1);
        self
    }

    pub fn ratio(&self) -> f64 {
        self.ratio
    }

    pub fn max_ratio(&self) -> f64 {
        self.max_ratio
    }

    pub fn min_buckets(&self) -> usize {
        self.min_buckets
    }

    /// Check the invariants `new` enforces. Policies obtained through
    /// deserialization skip `new`, so the multiset validates again on use.
    pub fn validate(&self) -> Result<(), MultisetError> {
        if !(self.ratio.is_finite() && self.ratio > 0.0) {
            return Err(MultisetError::InvalidPolicy("ratio must be finite and positive"));
        }
        if !(self.max_ratio.is_finite() && self.max_ratio > 0.0) {
            return Err(MultisetError::InvalidPolicy(
                "max_ratio must be finite and positive",
            ));
        }
        if self.min_buckets == 0 {
            return Err(MultisetError::InvalidPolicy("min_buckets must be at least one"));
        }
        Ok(())
    }

    /// `ceil(count * ratio)`; float-to-int casts saturate.
    pub(crate) fn scaled(&self, count: usize) -> usize {
        (count as f64 * self.ratio).ceil() as usize
    }

    /// Bucket count needed to hold `expected` elements under `max_ratio`.
    pub(crate) fn buckets_for(&self, expected: usize) -> usize {
        let needed = (expected as f64 / self.max_ratio).ceil() as usize;
        round_to_pow2(needed.max(self.min_buckets))
    }

    /// Whether `total` elements would overload `bucket_count` buckets.
    pub(crate) fn exceeds(&self, total: usize, bucket_count: usize) -> bool {
        total as f64 > bucket_count as f64 * self.max_ratio
    }

    /// Element count to reserve for when `total` elements overload
    /// `bucket_count` buckets. Never below `total`, so a ratio under one
    /// still brings the load back under `max_ratio`.
    pub(crate) fn growth_target(&self, total: usize, bucket_count: usize) -> Option<usize> {
        self.exceeds(total, bucket_count)
            .then(|| self.scaled(total).max(total))
    }
}

impl Default for LoadPolicy {
    fn default() -> Self {
        Self {
            ratio: Self::DEFAULT_RATIO,
            max_ratio: Self::DEFAULT_MAX_RATIO,
            min_buckets: Self::DEFAULT_MIN_BUCKETS,
        }
    }
}

fn round_to_pow2(n: usize) -> usize {
    n.checked_next_power_of_two()
        .unwrap_or(1 << (usize::BITS - 1))
}
