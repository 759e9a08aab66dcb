//! UnorderedMultiset: hashed multiset with stable positions and grouped
//! duplicates, built from a `SlotSequence` and a `BucketTable`.

use crate::bucket_table::BucketTable;
use crate::error::MultisetError;
use crate::hash_eq::{HashEq, StdHashEq};
use crate::policy::LoadPolicy;
use crate::reentrancy::OpTracker;
use crate::sequence::{SlotKey, SlotSequence};
use core::fmt;
use core::iter::FusedIterator;
use core::sync::atomic::{AtomicU64, Ordering};
use tracing::{trace, warn};

static NEXT_OWNER: AtomicU64 = AtomicU64::new(1);

fn next_owner() -> u64 {
    NEXT_OWNER.fetch_add(1, Ordering::Relaxed)
}

/// A position in a multiset: either one stored element or the end.
///
/// Positions stay valid while their element is stored, across insertions,
/// removals of other elements, and rehashes. A position is tied to the
/// container that produced it; handing it to another container fails with
/// [`MultisetError::InvalidPosition`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Position {
    owner: u64,
    slot: Option<SlotKey>,
}

impl Position {
    pub fn is_end(&self) -> bool {
        self.slot.is_none()
    }
}

/// Snapshot of the bucket table's shape.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct TableStats {
    pub len: usize,
    pub bucket_count: usize,
    pub occupied_buckets: usize,
    pub longest_group: usize,
    pub rehashes: u64,
}

/// Where an insertion lands inside a bucket's group.
struct GroupScan {
    last_match: Option<SlotKey>,
    last: Option<SlotKey>,
}

/// The sequence and the table, kept apart from the operation tracker so an
/// operation can hold its guard while editing both.
#[derive(Clone)]
struct Storage<T> {
    seq: SlotSequence<T>,
    table: BucketTable,
}

impl<T> Storage<T> {
    /// Walk bucket `idx`'s group, noting the run equal to `value` and the
    /// group's last slot.
    fn scan_group<E: HashEq<T>>(&self, hash_eq: &E, idx: usize, hash: u64, value: &T) -> GroupScan {
        let mut scan = GroupScan {
            last_match: None,
            last: None,
        };
        let mut cursor = self.table.head(idx);
        for _ in 0..self.table.bucket_len(idx) {
            let Some(k) = cursor else { break };
            let Some(node) = self.seq.node(k) else { break };
            if node.hash == hash && hash_eq.equal(&node.value, value) {
                scan.last_match = Some(k);
            } else if scan.last_match.is_some() {
                // The run of equals ended; nothing after it matters.
                return scan;
            }
            scan.last = Some(k);
            cursor = self.seq.next(k);
        }
        scan
    }

    fn find_slot<E: HashEq<T>>(&self, hash_eq: &E, value: &T) -> Option<SlotKey> {
        let hash = hash_eq.hash(value);
        let idx = self.table.index_of(hash);
        let mut cursor = self.table.head(idx);
        for _ in 0..self.table.bucket_len(idx) {
            let k = cursor?;
            let node = self.seq.node(k)?;
            if node.hash == hash && hash_eq.equal(&node.value, value) {
                return Some(k);
            }
            cursor = self.seq.next(k);
        }
        None
    }

    /// Length of the run of elements equal to `value` starting at `first`,
    /// and the slot after it.
    fn run_len<E: HashEq<T>>(
        &self,
        hash_eq: &E,
        first: Option<SlotKey>,
        value: &T,
    ) -> (usize, Option<SlotKey>) {
        let mut n = 0;
        let mut cursor = first;
        while let Some(k) = cursor {
            match self.seq.node(k) {
                Some(node) if hash_eq.equal(&node.value, value) => {
                    n += 1;
                    cursor = self.seq.next(k);
                }
                _ => break,
            }
        }
        (n, cursor)
    }

    /// Grow the bucket table if `incoming` more elements would overload it.
    fn grow_for(&mut self, incoming: usize) -> Result<(), MultisetError> {
        match self.table.growth_target(incoming) {
            Some(target) => self.table.reserve(target, &mut self.seq).map(|_| ()),
            None => Ok(()),
        }
    }

    /// Link a new slot for `value` after its equals (or at the end of its
    /// bucket's group) and record it in the table.
    fn insert<E: HashEq<T>>(&mut self, hash_eq: &E, value: T) -> SlotKey {
        let hash = hash_eq.hash(&value);
        let idx = self.table.index_of(hash);
        let scan = self.scan_group(hash_eq, idx, hash, &value);
        let pos = match scan.last_match.or(scan.last) {
            Some(k) => self.seq.next(k),
            None => None,
        };
        let k = self.seq.insert_before(pos, value, hash);
        self.table.on_insert(idx, k);
        k
    }

    fn erase_slot(&mut self, k: SlotKey) -> Result<(T, Option<SlotKey>), MultisetError> {
        let hash = self.seq.node(k).ok_or(MultisetError::InvalidPosition)?.hash;
        let idx = self.table.index_of(hash);
        let successor = self.seq.next(k);
        let (value, next) = self.seq.erase(Some(k))?;
        self.table.on_erase(idx, k, successor);
        Ok((value, next))
    }
}

/// A multiset with average O(1) `find`, `insert` and `erase`.
///
/// Elements that compare equal are always adjacent in iteration order, in
/// the order they were inserted. Iteration order is otherwise unspecified
/// and may change when the bucket table grows.
pub struct UnorderedMultiset<T, E = StdHashEq> {
    hash_eq: E,
    store: Storage<T>,
    owner: u64,
    ops: OpTracker,
}

impl<T> UnorderedMultiset<T> {
    pub fn new() -> Self {
        Self::with_hash_eq(StdHashEq::default())
    }

    pub fn with_policy(policy: LoadPolicy) -> Result<Self, MultisetError> {
        Self::with_hash_eq_and_policy(StdHashEq::default(), policy)
    }

    /// An empty multiset that holds `capacity` elements before its first growth.
    pub fn with_capacity(capacity: usize) -> Self {
        let mut set = Self::new();
        let store = &mut set.store;
        if let Err(e) = store.table.reserve(capacity, &mut store.seq) {
            warn!(error = %e, capacity, "bucket table reservation failed");
        }
        set
    }
}

impl<T> Default for UnorderedMultiset<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E> UnorderedMultiset<T, E> {
    pub fn with_hash_eq(hash_eq: E) -> Self {
        Self::from_parts(hash_eq, LoadPolicy::default())
    }

    pub fn with_hash_eq_and_policy(hash_eq: E, policy: LoadPolicy) -> Result<Self, MultisetError> {
        policy.validate()?;
        Ok(Self::from_parts(hash_eq, policy))
    }

    fn from_parts(hash_eq: E, policy: LoadPolicy) -> Self {
        Self {
            hash_eq,
            store: Storage {
                seq: SlotSequence::new(),
                table: BucketTable::new(policy),
            },
            owner: next_owner(),
            ops: OpTracker::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.store.seq.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.seq.len() == 0
    }

    pub fn hash_eq(&self) -> &E {
        &self.hash_eq
    }

    pub fn policy(&self) -> &LoadPolicy {
        self.store.table.policy()
    }

    pub fn bucket_count(&self) -> usize {
        self.store.table.bucket_count()
    }

    /// Number of elements in bucket `n`; zero for out-of-range indices.
    pub fn bucket_len(&self, n: usize) -> usize {
        self.store.table.bucket_len(n)
    }

    pub fn load_factor(&self) -> f64 {
        self.len() as f64 / self.bucket_count() as f64
    }

    pub fn max_load_factor(&self) -> f64 {
        self.policy().max_ratio()
    }

    pub fn stats(&self) -> TableStats {
        TableStats {
            len: self.store.table.len(),
            bucket_count: self.store.table.bucket_count(),
            occupied_buckets: self.store.table.occupied(),
            longest_group: self.store.table.longest_group(),
            rehashes: self.store.table.rehashes(),
        }
    }

    fn at(&self, slot: Option<SlotKey>) -> Position {
        Position {
            owner: self.owner,
            slot,
        }
    }

    pub fn begin(&self) -> Position {
        self.at(self.store.seq.begin())
    }

    pub fn end(&self) -> Position {
        self.at(None)
    }

    /// Resolve a position of this container to its slot (`None` for end).
    fn resolve(&self, pos: Position) -> Result<Option<SlotKey>, MultisetError> {
        if pos.owner != self.owner {
            return Err(MultisetError::InvalidPosition);
        }
        match pos.slot {
            Some(k) if !self.store.seq.contains(k) => Err(MultisetError::InvalidPosition),
            slot => Ok(slot),
        }
    }

    fn resolve_live(&self, pos: Position) -> Result<SlotKey, MultisetError> {
        self.resolve(pos)?.ok_or(MultisetError::InvalidPosition)
    }

    /// The element at `pos`, or `None` for the end or a stale position.
    pub fn get(&self, pos: Position) -> Option<&T> {
        let k = self.resolve_live(pos).ok()?;
        self.store.seq.node(k).map(|n| &n.value)
    }

    /// The position after `pos`. Stepping past the end is an error.
    pub fn next(&self, pos: Position) -> Result<Position, MultisetError> {
        let k = self.resolve_live(pos)?;
        Ok(self.at(self.store.seq.next(k)))
    }

    /// The position before `pos`; the last element for the end position.
    pub fn prev(&self, pos: Position) -> Result<Position, MultisetError> {
        let prev = match self.resolve(pos)? {
            Some(k) => self.store.seq.prev(k),
            None => self.store.seq.back(),
        };
        prev.map(|k| self.at(Some(k)))
            .ok_or(MultisetError::InvalidPosition)
    }

    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            seq: &self.store.seq,
            front: self.store.seq.begin(),
            back: self.store.seq.back(),
            remaining: self.store.seq.len(),
        }
    }

    /// Elements from `first` up to, not including, `last`. If `last` does not
    /// follow `first`, the range runs to the end.
    pub fn range(&self, first: Position, last: Position) -> Result<Range<'_, T>, MultisetError> {
        let cursor = self.resolve(first)?;
        let stop = self.resolve(last)?;
        Ok(Range {
            seq: &self.store.seq,
            cursor,
            stop,
        })
    }

    /// Remove every element, keeping the policy. The bucket table returns to
    /// its minimum size.
    pub fn clear(&mut self) {
        let _g = self.ops.enter("clear");
        let dropped = self.store.seq.len();
        self.store.seq.clear();
        self.store.table.clear();
        trace!(dropped, "cleared multiset");
    }

    /// Clone every element into a `Vec`, in iteration order.
    pub fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.iter().cloned().collect()
    }
}

impl<T, E> UnorderedMultiset<T, E>
where
    E: HashEq<T>,
{
    /// Bulk-load a slice, reserving for `items.len() * ratio` up front.
    pub fn from_array(items: &[T]) -> Self
    where
        T: Clone,
        E: Default,
    {
        let mut set = Self::with_hash_eq(E::default());
        set.bulk_load(items.iter().cloned());
        set
    }

    /// Bulk-load a slice under an explicit hash/equality and policy.
    pub fn from_array_with(items: &[T], hash_eq: E, policy: LoadPolicy) -> Result<Self, MultisetError>
    where
        T: Clone,
    {
        let mut set = Self::with_hash_eq_and_policy(hash_eq, policy)?;
        set.bulk_load(items.iter().cloned());
        Ok(set)
    }

    pub fn from_vec(items: Vec<T>) -> Self
    where
        E: Default,
    {
        let mut set = Self::with_hash_eq(E::default());
        set.bulk_load(items);
        set
    }

    /// Copy the full contents of any container that yields `&T` with a known
    /// length, another multiset included.
    pub fn copy_from<'a, I>(source: I) -> Self
    where
        T: Clone + 'a,
        E: Default,
        I: IntoIterator<Item = &'a T>,
        I::IntoIter: ExactSizeIterator,
    {
        let mut set = Self::with_hash_eq(E::default());
        set.bulk_load(source.into_iter().cloned());
        set
    }

    /// Copy the elements of `source` between two of its positions.
    pub fn from_range<E2>(
        source: &UnorderedMultiset<T, E2>,
        first: Position,
        last: Position,
    ) -> Result<Self, MultisetError>
    where
        T: Clone,
        E: Default,
    {
        let count = source.range(first, last)?.count();
        let mut set = Self::with_hash_eq(E::default());
        set.reserve(set.policy().scaled(count));
        for v in source.range(first, last)? {
            set.insert(v.clone());
        }
        Ok(set)
    }

    /// Reserve for the exact length of `items` scaled by the policy ratio,
    /// then insert one by one.
    fn bulk_load<I>(&mut self, items: I)
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: ExactSizeIterator,
    {
        let items = items.into_iter();
        self.reserve(self.policy().scaled(items.len()));
        for v in items {
            self.insert(v);
        }
    }

    /// Position of the first element equal to `value`, or the end.
    pub fn find(&self, value: &T) -> Position {
        let _g = self.ops.enter("find");
        self.at(self.store.find_slot(&self.hash_eq, value))
    }

    pub fn contains(&self, value: &T) -> bool {
        let _g = self.ops.enter("contains");
        self.store.find_slot(&self.hash_eq, value).is_some()
    }

    /// Number of elements equal to `value`.
    pub fn count(&self, value: &T) -> usize {
        let _g = self.ops.enter("count");
        match self.store.find_slot(&self.hash_eq, value) {
            Some(k) => self.store.run_len(&self.hash_eq, Some(k), value).0,
            None => 0,
        }
    }

    /// The run of elements equal to `value` as `(first, past_last)`; both are
    /// the end position when there is none.
    pub fn equal_range(&self, value: &T) -> (Position, Position) {
        let _g = self.ops.enter("equal_range");
        match self.store.find_slot(&self.hash_eq, value) {
            Some(k) => {
                let (_, past) = self.store.run_len(&self.hash_eq, Some(k), value);
                (self.at(Some(k)), self.at(past))
            }
            None => (self.end(), self.end()),
        }
    }

    /// Bucket that `value` hashes to under the current bucket count.
    pub fn bucket(&self, value: &T) -> usize {
        let _g = self.ops.enter("bucket");
        self.store.table.index_of(self.hash_eq.hash(value))
    }

    /// Insert `value`, growing the bucket table first if needed.
    ///
    /// Duplicates go right after the last element equal to them, so equal
    /// elements iterate in insertion order.
    ///
    /// If the bucket array cannot be grown the element is still inserted into
    /// the current table; lookups stay correct but slower. Use
    /// [`try_insert`](Self::try_insert) to observe that failure instead.
    pub fn insert(&mut self, value: T) -> Position {
        let _g = self.ops.enter("insert");
        if let Err(e) = self.store.grow_for(1) {
            warn!(error = %e, len = self.len(), "bucket table growth failed; inserting without growing");
        }
        let k = self.store.insert(&self.hash_eq, value);
        self.at(Some(k))
    }

    /// Insert `value`, failing without any change if the bucket table must
    /// grow and cannot.
    pub fn try_insert(&mut self, value: T) -> Result<Position, MultisetError> {
        let _g = self.ops.enter("try_insert");
        self.store.grow_for(1)?;
        let k = self.store.insert(&self.hash_eq, value);
        Ok(self.at(Some(k)))
    }

    /// Insert a batch whose length is known, growing at most once.
    pub fn insert_range<I>(&mut self, items: I)
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: ExactSizeIterator,
    {
        let items = items.into_iter();
        {
            let _g = self.ops.enter("insert_range");
            if let Err(e) = self.store.grow_for(items.len()) {
                warn!(error = %e, incoming = items.len(), "bucket table growth failed before batch insert");
            }
        }
        for v in items {
            self.insert(v);
        }
    }

    /// Replace the contents with `items`, sized for their exact count.
    pub fn assign<I>(&mut self, items: I)
    where
        I: IntoIterator<Item = T>,
    {
        let items: Vec<T> = items.into_iter().collect();
        self.clear();
        self.bulk_load(items);
    }

    /// Remove the element at `pos` and return the position that followed it.
    pub fn erase(&mut self, pos: Position) -> Result<Position, MultisetError> {
        let _g = self.ops.enter("erase");
        let k = self.resolve_live(pos)?;
        let (_value, next) = self.store.erase_slot(k)?;
        Ok(self.at(next))
    }

    /// Remove the elements in `[first, last)` and return the position that
    /// follows the removed run.
    ///
    /// Both positions are checked before anything is removed. When `last` is
    /// reachable from `first` the result is `last`. Otherwise everything from
    /// `first` to the end is removed and the end position is returned; `last`
    /// itself is left in place.
    pub fn erase_range(&mut self, first: Position, last: Position) -> Result<Position, MultisetError> {
        let _g = self.ops.enter("erase_range");
        let mut cursor = self.resolve(first)?;
        let stop = self.resolve(last)?;
        while cursor != stop {
            let Some(k) = cursor else { break };
            cursor = self.store.erase_slot(k)?.1;
        }
        Ok(self.at(cursor))
    }

    /// Remove every element equal to `value`; returns how many were removed.
    pub fn erase_value(&mut self, value: &T) -> usize {
        let _g = self.ops.enter("erase_value");
        let mut cursor = self.store.find_slot(&self.hash_eq, value);
        let mut removed = 0;
        while let Some(k) = cursor {
            let equal = self
                .store
                .seq
                .node(k)
                .is_some_and(|n| self.hash_eq.equal(&n.value, value));
            if !equal {
                break;
            }
            match self.store.erase_slot(k) {
                Ok((_, next)) => cursor = next,
                Err(_) => break,
            }
            removed += 1;
        }
        removed
    }

    /// Make room for `additional` more elements without further growth.
    pub fn try_reserve(&mut self, additional: usize) -> Result<(), MultisetError> {
        let _g = self.ops.enter("reserve");
        let expected = self.len().saturating_add(additional);
        self.store.table.reserve(expected, &mut self.store.seq).map(|_| ())
    }

    /// Like [`try_reserve`](Self::try_reserve), logging instead of failing.
    pub fn reserve(&mut self, additional: usize) {
        if let Err(e) = self.try_reserve(additional) {
            warn!(error = %e, additional, "bucket table reservation failed");
        }
    }

    /// Rebuild the table with at least `buckets` buckets, and never fewer
    /// than the current length needs. Unlike `reserve`, this may shrink.
    pub fn rehash(&mut self, buckets: usize) -> Result<(), MultisetError> {
        let _g = self.ops.enter("rehash");
        let target = self
            .policy()
            .buckets_for(self.len())
            .max(buckets.checked_next_power_of_two().unwrap_or(buckets));
        if target == self.store.table.bucket_count() {
            return Ok(());
        }
        self.store.table.rehash(target, &mut self.store.seq)
    }

    /// Shrink the bucket table to the smallest size the policy allows for
    /// the current length.
    pub fn shrink_to_fit(&mut self) -> Result<(), MultisetError> {
        self.rehash(0)
    }

    /// Switch to a new load policy, growing at once if the current length
    /// already overloads it. If that growth fails the old policy stays.
    pub fn set_policy(&mut self, policy: LoadPolicy) -> Result<(), MultisetError> {
        policy.validate()?;
        let _g = self.ops.enter("set_policy");
        self.store.table.set_policy(policy, &mut self.store.seq)
    }
}

impl<T, E> Clone for UnorderedMultiset<T, E>
where
    T: Clone,
    E: Clone,
{
    /// The clone has the same layout but its own identity: positions of the
    /// original are rejected by it.
    fn clone(&self) -> Self {
        Self {
            hash_eq: self.hash_eq.clone(),
            store: self.store.clone(),
            owner: next_owner(),
            ops: OpTracker::new(),
        }
    }
}

impl<T: fmt::Debug, E> fmt::Debug for UnorderedMultiset<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// Multiset equality: same length and the same multiplicity of every
/// distinct value, whatever the layout.
impl<T, E> PartialEq for UnorderedMultiset<T, E>
where
    E: HashEq<T>,
{
    fn eq(&self, other: &Self) -> bool {
        if self.len() != other.len() {
            return false;
        }
        let mut cursor = self.store.seq.begin();
        while let Some(k) = cursor {
            let Some(node) = self.store.seq.node(k) else { return false };
            let (here, past) = self.store.run_len(&self.hash_eq, Some(k), &node.value);
            if other.count(&node.value) != here {
                return false;
            }
            cursor = past;
        }
        true
    }
}

impl<T, E> Eq for UnorderedMultiset<T, E> where E: HashEq<T> {}

impl<T, E> FromIterator<T> for UnorderedMultiset<T, E>
where
    E: HashEq<T> + Default,
{
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_vec(iter.into_iter().collect())
    }
}

impl<T, E> Extend<T> for UnorderedMultiset<T, E>
where
    E: HashEq<T>,
{
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        let (lower, _) = iter.size_hint();
        {
            let _g = self.ops.enter("extend");
            if let Err(e) = self.store.grow_for(lower) {
                warn!(error = %e, incoming = lower, "bucket table growth failed before extend");
            }
        }
        for v in iter {
            self.insert(v);
        }
    }
}

impl<'a, T, E> Extend<&'a T> for UnorderedMultiset<T, E>
where
    T: Copy + 'a,
    E: HashEq<T>,
{
    fn extend<I: IntoIterator<Item = &'a T>>(&mut self, iter: I) {
        self.extend(iter.into_iter().copied());
    }
}

impl<'a, T, E> IntoIterator for &'a UnorderedMultiset<T, E> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T, E> IntoIterator for UnorderedMultiset<T, E> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter { seq: self.store.seq }
    }
}

/// Borrowing iterator in storage order; equal elements are adjacent.
pub struct Iter<'a, T> {
    seq: &'a SlotSequence<T>,
    front: Option<SlotKey>,
    back: Option<SlotKey>,
    remaining: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let k = self.front?;
        let node = self.seq.node(k)?;
        self.front = self.seq.next(k);
        self.remaining -= 1;
        Some(&node.value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> DoubleEndedIterator for Iter<'_, T> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let k = self.back?;
        let node = self.seq.node(k)?;
        self.back = self.seq.prev(k);
        self.remaining -= 1;
        Some(&node.value)
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}
impl<T> FusedIterator for Iter<'_, T> {}

impl<T> Clone for Iter<'_, T> {
    fn clone(&self) -> Self {
        Self { ..*self }
    }
}

/// Borrowing iterator over `[first, last)`.
pub struct Range<'a, T> {
    seq: &'a SlotSequence<T>,
    cursor: Option<SlotKey>,
    stop: Option<SlotKey>,
}

impl<'a, T> Iterator for Range<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor == self.stop {
            return None;
        }
        let k = self.cursor?;
        let node = self.seq.node(k)?;
        self.cursor = self.seq.next(k);
        Some(&node.value)
    }
}

impl<T> FusedIterator for Range<'_, T> {}

/// Owning iterator in storage order.
pub struct IntoIter<T> {
    seq: SlotSequence<T>,
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.seq.pop_front()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.seq.len(), Some(self.seq.len()))
    }
}

impl<T> DoubleEndedIterator for IntoIter<T> {
    fn next_back(&mut self) -> Option<T> {
        self.seq.pop_back()
    }
}

impl<T> ExactSizeIterator for IntoIter<T> {}
impl<T> FusedIterator for IntoIter<T> {}

#[cfg(test)]
impl<T, E> UnorderedMultiset<T, E>
where
    E: HashEq<T>,
{
    /// Assert every structural invariant the table and sequence share.
    pub(crate) fn check_invariants(&self) {
        assert_eq!(self.store.table.len(), self.store.seq.len(), "table len vs slots");
        assert_eq!(
            self.store.table.bucket_lens().sum::<usize>(),
            self.store.seq.len(),
            "bucket counts vs slots"
        );
        assert!(self.store.table.bucket_count() >= 1);

        // Walk the sequence both ways; links must agree.
        let mut forward = Vec::new();
        let mut cur = self.store.seq.begin();
        while let Some(k) = cur {
            forward.push(k);
            cur = self.store.seq.next(k);
        }
        let mut backward = Vec::new();
        let mut cur = self.store.seq.back();
        while let Some(k) = cur {
            backward.push(k);
            cur = self.store.seq.prev(k);
        }
        backward.reverse();
        assert_eq!(forward, backward, "prev/next links disagree");
        assert_eq!(forward.len(), self.store.seq.len());

        // Each bucket's group is contiguous, starts at its head, and holds
        // exactly the slots that index to it.
        for idx in 0..self.store.table.bucket_count() {
            let n = self.store.table.bucket_len(idx);
            let head = self.store.table.head(idx);
            assert_eq!(n == 0, head.is_none(), "bucket {idx} head/len mismatch");
            let mut cur = head;
            for _ in 0..n {
                let k = cur.expect("group shorter than its count");
                let node = self.store.seq.node(k).expect("bucket points at dead slot");
                assert_eq!(self.store.table.index_of(node.hash), idx, "slot in wrong group");
                cur = self.store.seq.next(k);
            }
            let expected = forward
                .iter()
                .filter(|k| self.store.table.index_of(self.store.seq.node(**k).unwrap().hash) == idx)
                .count();
            assert_eq!(expected, n, "bucket {idx} count");
        }

        // Equal values form a single run.
        for (i, a) in forward.iter().enumerate() {
            let va = &self.store.seq.node(*a).unwrap().value;
            let mut left_run = true;
            for b in &forward[i + 1..] {
                let eq = self.hash_eq.equal(va, &self.store.seq.node(*b).unwrap().value);
                if !eq {
                    left_run = false;
                } else {
                    assert!(left_run, "equal values are not contiguous");
                }
            }
        }
    }
}
