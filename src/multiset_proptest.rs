#![cfg(test)]

// Property tests for UnorderedMultiset kept inside the crate so they can
// check the bucket table's internal invariants after every step.

use crate::hash_eq::{FnHashEq, HashEq};
use crate::multiset::{Position, UnorderedMultiset};
use crate::policy::LoadPolicy;
use crate::MultisetError;
use hashbrown::HashMap;
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;

#[derive(Clone, Debug)]
enum Op {
    Insert(u8),
    InsertRange(Vec<u8>),
    EraseHeld(usize),
    EraseValue(u8),
    Find(u8),
    Assign(Vec<u8>),
    Clear,
    Rehash(usize),
    Reserve(usize),
}

fn arb_ops() -> impl Strategy<Value = Vec<Op>> {
    // A small value domain so duplicates and collisions are common.
    let value = 0u8..16;
    let op = prop_oneof![
        6 => value.clone().prop_map(Op::Insert),
        2 => proptest::collection::vec(value.clone(), 0..12).prop_map(Op::InsertRange),
        3 => any::<usize>().prop_map(Op::EraseHeld),
        2 => value.clone().prop_map(Op::EraseValue),
        2 => value.clone().prop_map(Op::Find),
        1 => proptest::collection::vec(value, 0..20).prop_map(Op::Assign),
        1 => Just(Op::Clear),
        1 => (0usize..64).prop_map(Op::Rehash),
        1 => (0usize..64).prop_map(Op::Reserve),
    ];
    proptest::collection::vec(op, 1..80)
}

// State-machine equivalence against a count map.
// Invariants exercised after every operation:
// - len == live slots == sum of bucket counts; every bucket group is
//   contiguous and equal values form one run (check_invariants).
// - count(v) matches the model for every value in the domain.
// - Held positions keep resolving to their values across inserts, erases
//   of other elements and rehashes; erased positions never resolve.
fn run<E: HashEq<u8>>(mut sut: UnorderedMultiset<u8, E>, ops: Vec<Op>) -> Result<(), TestCaseError> {
    let mut model: HashMap<u8, usize> = HashMap::new();
    let mut held: Vec<(u8, Position)> = Vec::new();
    let mut stale: Vec<Position> = Vec::new();

    for op in ops {
        match op {
            Op::Insert(v) => {
                let pos = sut.insert(v);
                prop_assert_eq!(sut.get(pos), Some(&v));
                *model.entry(v).or_default() += 1;
                held.push((v, pos));
            }
            Op::InsertRange(vs) => {
                for v in &vs {
                    *model.entry(*v).or_default() += 1;
                }
                sut.insert_range(vs);
            }
            Op::EraseHeld(i) => {
                if held.is_empty() {
                    prop_assert_eq!(sut.erase(sut.end()), Err(MultisetError::InvalidPosition));
                } else {
                    let (v, pos) = held.swap_remove(i % held.len());
                    let after = sut.next(pos).expect("held position is live");
                    let ret = sut.erase(pos).expect("held position erases");
                    prop_assert_eq!(ret, after);
                    let n = model.get_mut(&v).expect("model has held value");
                    *n -= 1;
                    stale.push(pos);
                }
            }
            Op::EraseValue(v) => {
                let removed = sut.erase_value(&v);
                prop_assert_eq!(removed, model.remove(&v).unwrap_or(0));
                let (gone, kept): (Vec<_>, Vec<_>) = held.into_iter().partition(|(hv, _)| *hv == v);
                stale.extend(gone.into_iter().map(|(_, p)| p));
                held = kept;
            }
            Op::Find(v) => {
                let pos = sut.find(&v);
                let expected = model.get(&v).copied().unwrap_or(0);
                prop_assert_eq!(pos.is_end(), expected == 0);
                if !pos.is_end() {
                    // Grouping: the run starting at find() is exactly count(v) long.
                    let run: Vec<u8> = sut.range(pos, sut.end()).unwrap().take(expected + 1).copied().collect();
                    prop_assert!(run[..expected].iter().all(|x| *x == v));
                    prop_assert!(run.len() == expected || run[expected] != v);
                }
            }
            Op::Assign(vs) => {
                model.clear();
                for v in &vs {
                    *model.entry(*v).or_default() += 1;
                }
                stale.extend(held.drain(..).map(|(_, p)| p));
                sut.assign(vs);
            }
            Op::Clear => {
                sut.clear();
                model.clear();
                stale.extend(held.drain(..).map(|(_, p)| p));
            }
            Op::Rehash(n) => {
                sut.rehash(n).expect("small rehash allocates");
            }
            Op::Reserve(n) => {
                let before = sut.bucket_count();
                sut.reserve(n);
                prop_assert!(sut.bucket_count() >= before);
            }
        }

        sut.check_invariants();
        model.retain(|_, n| *n > 0);
        prop_assert_eq!(sut.len(), model.values().sum::<usize>());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
        for v in 0u8..16 {
            prop_assert_eq!(sut.count(&v), model.get(&v).copied().unwrap_or(0));
        }
        for (v, pos) in &held {
            prop_assert_eq!(sut.get(*pos), Some(v));
        }
        for pos in &stale {
            prop_assert!(sut.get(*pos).is_none());
        }
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine(ops in arb_ops()) {
        run(UnorderedMultiset::new(), ops)?;
    }
}

// Same state machine under a tight policy, so almost every insertion batch
// rehashes, and under a hash that folds the domain onto three values so
// groups mix distinct values.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_tight_policy(ops in arb_ops()) {
        let policy = LoadPolicy::new(1.0, 1.0).unwrap().with_min_buckets(1);
        run(UnorderedMultiset::with_policy(policy).unwrap(), ops)?;
    }

    #[test]
    fn prop_state_machine_with_collisions(ops in arb_ops()) {
        let hash_eq = FnHashEq::new(|v: &u8| u64::from(*v % 3), |a: &u8, b: &u8| a == b);
        let policy = LoadPolicy::new(2.0, 0.5).unwrap().with_min_buckets(1);
        run(UnorderedMultiset::with_hash_eq_and_policy(hash_eq, policy).unwrap(), ops)?;
    }
}
