//! BucketTable: hash-indexed group headers over a `SlotSequence`.
//!
//! Each bucket records the first slot of its group and how many slots the
//! group holds. A group is always a contiguous run of the sequence, so the
//! header plus the count is enough to visit every member without touching
//! other buckets.
//!
//! Rebuilding the table never calls user code: slots carry the hash they were
//! inserted with and the new index is derived from it.

use crate::error::MultisetError;
use crate::policy::LoadPolicy;
use crate::sequence::{SlotKey, SlotSequence};
use tracing::debug;

#[derive(Clone, Copy, Debug, Default)]
struct Bucket {
    head: Option<SlotKey>,
    len: usize,
}

#[derive(Clone, Debug)]
pub(crate) struct BucketTable {
    buckets: Vec<Bucket>,
    len: usize,
    policy: LoadPolicy,
    rehashes: u64,
}

impl BucketTable {
    pub(crate) fn new(policy: LoadPolicy) -> Self {
        Self {
            buckets: vec![Bucket::default(); policy.buckets_for(0)],
            len: 0,
            policy,
            rehashes: 0,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    pub(crate) fn policy(&self) -> &LoadPolicy {
        &self.policy
    }

    /// Switch to `policy`, first growing if the current length overloads it.
    /// On failure the table keeps its old policy and buckets.
    pub(crate) fn set_policy<T>(
        &mut self,
        policy: LoadPolicy,
        seq: &mut SlotSequence<T>,
    ) -> Result<(), MultisetError> {
        if let Some(expected) = policy.growth_target(self.len, self.buckets.len()) {
            let target = policy.buckets_for(expected);
            if target > self.buckets.len() {
                self.rehash(target, seq)?;
            }
        }
        self.policy = policy;
        Ok(())
    }

    /// Number of bucket array rebuilds since creation.
    pub(crate) fn rehashes(&self) -> u64 {
        self.rehashes
    }

    #[inline]
    pub(crate) fn index_of(&self, hash: u64) -> usize {
        (hash % self.buckets.len() as u64) as usize
    }

    pub(crate) fn head(&self, idx: usize) -> Option<SlotKey> {
        self.buckets.get(idx).and_then(|b| b.head)
    }

    pub(crate) fn bucket_len(&self, idx: usize) -> usize {
        self.buckets.get(idx).map_or(0, |b| b.len)
    }

    pub(crate) fn occupied(&self) -> usize {
        self.buckets.iter().filter(|b| b.len > 0).count()
    }

    pub(crate) fn longest_group(&self) -> usize {
        self.buckets.iter().map(|b| b.len).max().unwrap_or(0)
    }

    /// Growth check for a batch of `incoming` insertions. Returns the element
    /// count to reserve for, if the batch would overload the table.
    pub(crate) fn growth_target(&self, incoming: usize) -> Option<usize> {
        self.policy
            .growth_target(self.len.saturating_add(incoming), self.buckets.len())
    }

    /// Make room for `expected` elements. Never shrinks; returns whether the
    /// table was rebuilt.
    pub(crate) fn reserve<T>(
        &mut self,
        expected: usize,
        seq: &mut SlotSequence<T>,
    ) -> Result<bool, MultisetError> {
        let target = self.policy.buckets_for(expected);
        if target <= self.buckets.len() {
            return Ok(false);
        }
        self.rehash(target, seq)?;
        Ok(true)
    }

    /// Rebuild the table with exactly `count` buckets.
    ///
    /// Slots are visited in iteration order and appended to their new group.
    /// A slot already adjacent to the last member of its group stays where it
    /// is; otherwise it is relinked right after that member. Visited slots
    /// always precede unvisited ones, so every slot is seen once, and runs of
    /// equal values (which share a hash) stay contiguous.
    pub(crate) fn rehash<T>(
        &mut self,
        count: usize,
        seq: &mut SlotSequence<T>,
    ) -> Result<(), MultisetError> {
        let count = count.max(1);
        let mut fresh: Vec<Bucket> = Vec::new();
        let mut tails: Vec<Option<SlotKey>> = Vec::new();
        fresh
            .try_reserve_exact(count)
            .and_then(|()| tails.try_reserve_exact(count))
            .map_err(|_| MultisetError::AllocationFailure { requested: count })?;
        fresh.resize(count, Bucket::default());
        tails.resize(count, None);

        let mut cursor = seq.begin();
        while let Some(k) = cursor {
            let next = seq.next(k);
            let hash = match seq.node(k) {
                Some(n) => n.hash,
                None => break,
            };
            let idx = (hash % count as u64) as usize;
            match tails[idx] {
                None => fresh[idx].head = Some(k),
                Some(tail) => {
                    let after_tail = seq.next(tail);
                    if after_tail != Some(k) {
                        seq.move_before(k, after_tail);
                    }
                }
            }
            fresh[idx].len += 1;
            tails[idx] = Some(k);
            cursor = next;
        }

        let old = self.buckets.len();
        self.buckets = fresh;
        self.rehashes += 1;
        debug!(from = old, to = count, elements = self.len, "rehashed bucket table");
        Ok(())
    }

    /// Record a slot that the caller already linked into bucket `idx`'s
    /// group, after its head.
    pub(crate) fn on_insert(&mut self, idx: usize, slot: SlotKey) {
        let bucket = &mut self.buckets[idx];
        if bucket.head.is_none() {
            bucket.head = Some(slot);
        }
        bucket.len += 1;
        self.len += 1;
    }

    /// Record the removal of `slot` from bucket `idx`. `successor` is the slot
    /// that followed it before unlinking.
    pub(crate) fn on_erase(&mut self, idx: usize, slot: SlotKey, successor: Option<SlotKey>) {
        let bucket = &mut self.buckets[idx];
        debug_assert!(bucket.len > 0, "erase from an empty bucket");
        bucket.len -= 1;
        if bucket.len == 0 {
            bucket.head = None;
        } else if bucket.head == Some(slot) {
            bucket.head = successor;
        }
        self.len -= 1;
    }

    /// Forget every group and return to the policy's minimum size.
    pub(crate) fn clear(&mut self) {
        self.buckets = vec![Bucket::default(); self.policy.buckets_for(0)];
        self.len = 0;
    }

    #[cfg(test)]
    pub(crate) fn bucket_lens(&self) -> impl Iterator<Item = usize> + '_ {
        self.buckets.iter().map(|b| b.len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    fn push(table: &mut BucketTable, seq: &mut SlotSequence<u64>, value: u64) -> SlotKey {
        // Identity hash; append to the group's end or the sequence's end.
        let idx = table.index_of(value);
        let mut pos = None;
        if let Some(mut k) = table.head(idx) {
            for _ in 1..table.bucket_len(idx) {
                k = seq.next(k).unwrap();
            }
            pos = seq.next(k);
        }
        let k = seq.insert_before(pos, value, value);
        table.on_insert(idx, k);
        k
    }

    fn group(table: &BucketTable, seq: &SlotSequence<u64>, idx: usize) -> Vec<u64> {
        let mut out = Vec::new();
        let mut cur = table.head(idx);
        for _ in 0..table.bucket_len(idx) {
            let k = cur.unwrap();
            out.push(seq.node(k).unwrap().value);
            cur = seq.next(k);
        }
        out
    }

    fn order(seq: &SlotSequence<u64>) -> Vec<u64> {
        let mut out = Vec::new();
        let mut cur = seq.begin();
        while let Some(k) = cur {
            out.push(seq.node(k).unwrap().value);
            cur = seq.next(k);
        }
        out
    }

    fn policy() -> LoadPolicy {
        LoadPolicy::new(1.0, 1.0).unwrap().with_min_buckets(2)
    }

    #[test]
    fn groups_follow_hash_modulo() {
        let mut t = BucketTable::new(policy());
        let mut s = SlotSequence::new();
        for v in [1, 2, 3, 4] {
            push(&mut t, &mut s, v);
        }
        assert_eq!(t.bucket_count(), 2);
        assert_eq!(group(&t, &s, 0), vec![2, 4]);
        assert_eq!(group(&t, &s, 1), vec![1, 3]);
        assert_eq!(t.len(), 4);
        assert_eq!(t.bucket_lens().sum::<usize>(), 4);
    }

    #[test]
    fn rehash_regroups_and_keeps_keys() {
        let mut t = BucketTable::new(policy());
        let mut s = SlotSequence::new();
        let keys: Vec<_> = [0, 1, 2, 3, 4, 5, 6, 7]
            .into_iter()
            .map(|v| (v, push(&mut t, &mut s, v)))
            .collect();
        assert_eq!(order(&s), vec![0, 2, 4, 6, 1, 3, 5, 7]);

        t.rehash(4, &mut s).unwrap();
        assert_eq!(t.bucket_count(), 4);
        assert_eq!(t.rehashes(), 1);
        for idx in 0..4 {
            let g = group(&t, &s, idx);
            assert_eq!(g.len(), 2);
            assert!(g.iter().all(|v| *v as usize % 4 == idx));
        }
        for (v, k) in keys {
            assert_eq!(s.node(k).unwrap().value, v);
        }
    }

    #[test]
    fn rehash_leaves_adjacent_slots_in_place() {
        let mut t = BucketTable::new(policy());
        let mut s = SlotSequence::new();
        for v in [4, 8, 1, 5] {
            push(&mut t, &mut s, v);
        }
        let before = order(&s);
        t.rehash(4, &mut s).unwrap();
        assert_eq!(order(&s), before);
    }

    #[test]
    fn reserve_never_shrinks() {
        let mut t = BucketTable::new(policy());
        let mut s: SlotSequence<u64> = SlotSequence::new();
        assert!(t.reserve(16, &mut s).unwrap());
        assert_eq!(t.bucket_count(), 16);
        assert!(!t.reserve(3, &mut s).unwrap());
        assert_eq!(t.bucket_count(), 16);
        assert_eq!(t.rehashes(), 1);
    }

    #[test]
    fn growth_target_uses_post_insert_total() {
        let mut t = BucketTable::new(LoadPolicy::new(2.0, 1.0).unwrap());
        let mut s = SlotSequence::new();
        assert_eq!(t.growth_target(8), None);
        assert_eq!(t.growth_target(9), Some(18));
        for v in 0..8 {
            push(&mut t, &mut s, v);
        }
        assert_eq!(t.growth_target(1), Some(18));
    }

    #[test]
    fn erase_advances_head_and_clears_empty_buckets() {
        let mut t = BucketTable::new(policy());
        let mut s = SlotSequence::new();
        let a = push(&mut t, &mut s, 2);
        let b = push(&mut t, &mut s, 4);
        let successor = s.next(a);
        s.erase(Some(a)).unwrap();
        t.on_erase(0, a, successor);
        assert_eq!(t.head(0), Some(b));
        assert_eq!(t.bucket_len(0), 1);

        s.erase(Some(b)).unwrap();
        t.on_erase(0, b, None);
        assert_eq!(t.head(0), None);
        assert_eq!(t.len(), 0);
    }

    #[test]
    fn clear_returns_to_minimum() {
        let mut t = BucketTable::new(policy());
        let mut s: SlotSequence<u64> = SlotSequence::new();
        t.reserve(64, &mut s).unwrap();
        t.clear();
        assert_eq!(t.bucket_count(), 2);
        assert_eq!(t.len(), 0);
        assert_eq!(t.occupied(), 0);
        assert_eq!(t.longest_group(), 0);
    }

    #[test]
    fn set_policy_keeps_old_state_when_growth_fails() {
        let mut t = BucketTable::new(policy());
        let mut s = SlotSequence::new();
        push(&mut t, &mut s, 1);
        let starved = LoadPolicy::new(1.0, 1e-300).unwrap();
        assert!(matches!(
            t.set_policy(starved, &mut s),
            Err(MultisetError::AllocationFailure { .. })
        ));
        assert_eq!(*t.policy(), policy());
        assert_eq!(t.bucket_count(), 2);
        assert_eq!(t.rehashes(), 0);

        let roomy = LoadPolicy::new(1.0, 0.25).unwrap().with_min_buckets(2);
        t.set_policy(roomy, &mut s).unwrap();
        assert_eq!(*t.policy(), roomy);
        assert_eq!(t.bucket_count(), 4);
    }

    #[traced_test]
    #[test]
    fn rehash_is_logged() {
        let mut t = BucketTable::new(policy());
        let mut s: SlotSequence<u64> = SlotSequence::new();
        t.rehash(8, &mut s).unwrap();
        assert!(logs_contain("rehashed bucket table"));
    }
}
