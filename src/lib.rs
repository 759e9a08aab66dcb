//! unordered-multiset: a hashed multiset with stable positions, in which
//! equal elements are always adjacent in iteration order.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: average O(1) find/insert/erase over a linked element order that
//!   survives insertion, removal and rehashing, with duplicates grouped.
//! - Layers:
//!   - SlotSequence<T>: doubly linked storage over a `slotmap` arena. Keys
//!     are stable and generational; the end position is `None`.
//!   - BucketTable: one header per bucket (first slot, count). A bucket's
//!     slots form one contiguous run of the sequence, so a header is enough
//!     to visit its whole group.
//!   - UnorderedMultiset<T, E>: public API. Hashes through `E: HashEq<T>`,
//!     decides where a new slot goes, and keeps the table's bookkeeping in
//!     step with every sequence edit.
//!
//! Constraints
//! - Single-threaded: the multiset is `!Sync`; wrap it in a lock to share.
//! - Duplicates are inserted right after the last element equal to them, so
//!   equal elements iterate in insertion order.
//! - Each bucket is a contiguous run of the sequence; within it, equal
//!   elements form a single run.
//! - `len == live slots == sum of bucket counts` after every operation.
//!
//! Growth policy
//! - A `LoadPolicy` per instance carries `ratio` and `max_ratio`. Before each
//!   insertion batch, if `len + incoming > bucket_count * max_ratio`, the
//!   table reserves for `max(len + incoming, (len + incoming) * ratio)`
//!   elements, so the load stays within `max_ratio` for any ratio. Bucket
//!   counts are powers of two and automatic growth never shrinks the table.
//! - Bulk loads (`from_array`, `assign`, `insert_range`, ...) reserve once
//!   for the whole batch.
//!
//! Hasher and rehashing invariants
//! - Each slot stores the `u64` hash computed when it was inserted; rehashing
//!   reuses it and never calls `HashEq`. A rehash may relink a slot next to
//!   its new group but never moves or copies a value, so positions stay
//!   valid.
//!
//! Reentrancy policy
//! - The only user code an operation calls is `HashEq`. Debug builds panic if
//!   that code reenters the same multiset; release builds do not check.
//!
//! Errors
//! - Operations either fully apply or leave the multiset untouched. Failures
//!   are reported as [`MultisetError`]; `find` never fails and reports a miss
//!   as the end position.
//!
//! ```
//! use unordered_multiset::UnorderedMultiset;
//!
//! let mut bag = UnorderedMultiset::new();
//! for v in [3, 1, 3, 2, 3] {
//!     bag.insert(v);
//! }
//! assert_eq!(bag.len(), 5);
//! assert_eq!(bag.count(&3), 3);
//!
//! let (first, past) = bag.equal_range(&3);
//! assert_eq!(bag.range(first, past).unwrap().count(), 3);
//! ```

mod bucket_table;
mod error;
pub mod hash_eq;
mod multiset;
mod multiset_proptest;
mod policy;
mod reentrancy;
mod sequence;
#[cfg(feature = "serde")]
mod serde_impls;

// Public surface
pub use error::MultisetError;
pub use hash_eq::{FnHashEq, HashEq, StdHashEq};
pub use multiset::{IntoIter, Iter, Position, Range, TableStats, UnorderedMultiset};
pub use policy::LoadPolicy;
