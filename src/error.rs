//! Error type shared by the storage layers and the public multiset.

use thiserror::Error;

/// Failure of a multiset operation. Operations that fail leave the
/// container exactly as it was.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
#[non_exhaustive]
pub enum MultisetError {
    /// The position belongs to another container, refers to an erased
    /// element, or is the end position where an element was required.
    #[error("position does not refer to a live element of this multiset")]
    InvalidPosition,
    /// The bucket array could not be grown to the requested length.
    #[error("failed to allocate a bucket array of {requested} buckets")]
    AllocationFailure { requested: usize },
    /// A load policy was rejected.
    #[error("invalid load policy: {0}")]
    InvalidPolicy(&'static str),
}
