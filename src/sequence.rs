//! SlotSequence: doubly linked element storage over a generational arena.
//!
//! Slots are addressed by `SlotKey`s that stay valid until the slot itself is
//! erased; linking or unlinking other slots never moves a value. The end
//! position is `None`, distinct from every key.

use crate::error::MultisetError;
use slotmap::{new_key_type, SlotMap};

new_key_type! {
    /// Stable identity of one stored element.
    pub(crate) struct SlotKey;
}

#[derive(Clone, Debug)]
pub(crate) struct Node<T> {
    pub(crate) value: T,
    pub(crate) hash: u64,
    prev: Option<SlotKey>,
    next: Option<SlotKey>,
}

#[derive(Clone, Debug)]
pub(crate) struct SlotSequence<T> {
    slots: SlotMap<SlotKey, Node<T>>,
    head: Option<SlotKey>,
    tail: Option<SlotKey>,
}

impl<T> SlotSequence<T> {
    pub(crate) fn new() -> Self {
        Self {
            slots: SlotMap::with_key(),
            head: None,
            tail: None,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn begin(&self) -> Option<SlotKey> {
        self.head
    }

    /// Last slot; the slot before the end position.
    pub(crate) fn back(&self) -> Option<SlotKey> {
        self.tail
    }

    pub(crate) fn contains(&self, k: SlotKey) -> bool {
        self.slots.contains_key(k)
    }

    pub(crate) fn node(&self, k: SlotKey) -> Option<&Node<T>> {
        self.slots.get(k)
    }

    pub(crate) fn next(&self, k: SlotKey) -> Option<SlotKey> {
        self.slots.get(k).and_then(|n| n.next)
    }

    pub(crate) fn prev(&self, k: SlotKey) -> Option<SlotKey> {
        self.slots.get(k).and_then(|n| n.prev)
    }

    /// Create a slot holding `value` and link it before `pos` (at the tail
    /// when `pos` is the end).
    pub(crate) fn insert_before(&mut self, pos: Option<SlotKey>, value: T, hash: u64) -> SlotKey {
        debug_assert!(pos.map_or(true, |p| self.slots.contains_key(p)));
        let k = self.slots.insert(Node {
            value,
            hash,
            prev: None,
            next: None,
        });
        self.link_before(k, pos);
        k
    }

    /// Unlink and destroy the slot at `pos`, returning its value and the
    /// slot that followed it.
    pub(crate) fn erase(
        &mut self,
        pos: Option<SlotKey>,
    ) -> Result<(T, Option<SlotKey>), MultisetError> {
        let k = pos.ok_or(MultisetError::InvalidPosition)?;
        if !self.slots.contains_key(k) {
            return Err(MultisetError::InvalidPosition);
        }
        self.unlink(k);
        let node = self.slots.remove(k).ok_or(MultisetError::InvalidPosition)?;
        Ok((node.value, node.next))
    }

    /// Relink an existing slot so it sits right before `pos`.
    pub(crate) fn move_before(&mut self, k: SlotKey, pos: Option<SlotKey>) {
        if pos == Some(k) || self.next(k) == pos {
            return;
        }
        self.unlink(k);
        self.link_before(k, pos);
    }

    pub(crate) fn pop_front(&mut self) -> Option<T> {
        let k = self.head?;
        self.erase(Some(k)).ok().map(|(v, _)| v)
    }

    pub(crate) fn pop_back(&mut self) -> Option<T> {
        let k = self.tail?;
        self.erase(Some(k)).ok().map(|(v, _)| v)
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.head = None;
        self.tail = None;
    }

    fn link_before(&mut self, k: SlotKey, pos: Option<SlotKey>) {
        let prev = match pos {
            Some(p) => self.slots[p].prev,
            None => self.tail,
        };
        {
            let node = &mut self.slots[k];
            node.prev = prev;
            node.next = pos;
        }
        match prev {
            Some(p) => self.slots[p].next = Some(k),
            None => self.head = Some(k),
        }
        match pos {
            Some(n) => self.slots[n].prev = Some(k),
            None => self.tail = Some(k),
        }
    }

    fn unlink(&mut self, k: SlotKey) {
        let (prev, next) = match self.slots.get(k) {
            Some(n) => (n.prev, n.next),
            None => return,
        };
        match prev {
            Some(p) => self.slots[p].next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.slots[n].prev = prev,
            None => self.tail = prev,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(seq: &SlotSequence<u32>) -> Vec<u32> {
        let mut out = Vec::new();
        let mut cur = seq.begin();
        while let Some(k) = cur {
            out.push(seq.node(k).unwrap().value);
            cur = seq.next(k);
        }
        out
    }

    fn values_rev(seq: &SlotSequence<u32>) -> Vec<u32> {
        let mut out = Vec::new();
        let mut cur = seq.back();
        while let Some(k) = cur {
            out.push(seq.node(k).unwrap().value);
            cur = seq.prev(k);
        }
        out
    }

    #[test]
    fn insert_before_end_appends() {
        let mut s = SlotSequence::new();
        s.insert_before(None, 1, 0);
        s.insert_before(None, 2, 0);
        s.insert_before(None, 3, 0);
        assert_eq!(values(&s), vec![1, 2, 3]);
        assert_eq!(values_rev(&s), vec![3, 2, 1]);
        assert_eq!(s.len(), 3);
    }

    #[test]
    fn insert_before_position_splices() {
        let mut s = SlotSequence::new();
        let a = s.insert_before(None, 1, 0);
        let c = s.insert_before(None, 3, 0);
        s.insert_before(Some(c), 2, 0);
        s.insert_before(Some(a), 0, 0);
        assert_eq!(values(&s), vec![0, 1, 2, 3]);
        assert_eq!(values_rev(&s), vec![3, 2, 1, 0]);
    }

    #[test]
    fn erase_returns_successor_and_keeps_other_keys() {
        let mut s = SlotSequence::new();
        let a = s.insert_before(None, 1, 0);
        let b = s.insert_before(None, 2, 0);
        let c = s.insert_before(None, 3, 0);
        let (v, next) = s.erase(Some(b)).unwrap();
        assert_eq!(v, 2);
        assert_eq!(next, Some(c));
        assert_eq!(s.node(a).unwrap().value, 1);
        assert_eq!(s.node(c).unwrap().value, 3);
        assert!(!s.contains(b));
        assert_eq!(values(&s), vec![1, 3]);

        let (_, next) = s.erase(Some(c)).unwrap();
        assert_eq!(next, None);
        assert_eq!(s.back(), Some(a));
    }

    #[test]
    fn erase_end_or_stale_is_invalid() {
        let mut s = SlotSequence::new();
        let a = s.insert_before(None, 1, 0);
        assert_eq!(s.erase(None).unwrap_err(), MultisetError::InvalidPosition);
        s.erase(Some(a)).unwrap();
        assert_eq!(s.erase(Some(a)).unwrap_err(), MultisetError::InvalidPosition);
        assert_eq!(s.len(), 0);
        assert_eq!(s.begin(), None);
        assert_eq!(s.back(), None);
    }

    #[test]
    fn move_before_relinks_without_changing_identity() {
        let mut s = SlotSequence::new();
        let a = s.insert_before(None, 1, 0);
        let b = s.insert_before(None, 2, 0);
        let c = s.insert_before(None, 3, 0);
        s.move_before(c, Some(a));
        assert_eq!(values(&s), vec![3, 1, 2]);
        s.move_before(c, None);
        assert_eq!(values(&s), vec![1, 2, 3]);
        // Already in place: no-op.
        s.move_before(a, Some(b));
        assert_eq!(values(&s), vec![1, 2, 3]);
        assert_eq!(values_rev(&s), vec![3, 2, 1]);
        assert_eq!(s.node(c).unwrap().value, 3);
    }

    #[test]
    fn pops_drain_from_both_ends() {
        let mut s = SlotSequence::new();
        for v in 0..4 {
            s.insert_before(None, v, 0);
        }
        assert_eq!(s.pop_front(), Some(0));
        assert_eq!(s.pop_back(), Some(3));
        assert_eq!(values(&s), vec![1, 2]);
        s.clear();
        assert_eq!(s.pop_front(), None);
        assert_eq!(s.len(), 0);
    }
}
