// UnorderedMultiset property tests through the public API.
//
// Property 1: grouping.
//  - For any insertion sequence, each distinct value appears as exactly
//    one run in iteration order, and the run starts at find(v).
//
// Property 2: round trip.
//  - Rebuilding from the exported sequence gives the same length and the
//    same multiplicity for every value.
//
// Property 3: rehash transparency.
//  - Positions handed out before automatic growth keep reading the same
//    values afterwards, and find() keeps hitting every inserted value.
use hashbrown::HashMap;
use proptest::prelude::*;
use unordered_multiset::{LoadPolicy, UnorderedMultiset};

fn counts(values: &[u16]) -> HashMap<u16, usize> {
    let mut m = HashMap::new();
    for v in values {
        *m.entry(*v).or_default() += 1;
    }
    m
}

proptest! {
    #[test]
    fn prop_each_value_is_one_run(values in proptest::collection::vec(0u16..40, 0..300)) {
        let mut m = UnorderedMultiset::new();
        for v in &values {
            m.insert(*v);
        }
        let order = m.to_vec();
        prop_assert_eq!(order.len(), values.len());

        let mut seen_runs: HashMap<u16, usize> = HashMap::new();
        for (i, v) in order.iter().enumerate() {
            if i == 0 || order[i - 1] != *v {
                *seen_runs.entry(*v).or_default() += 1;
            }
        }
        prop_assert!(seen_runs.values().all(|n| *n == 1));

        for (v, n) in counts(&values) {
            let first = m.find(&v);
            let run: Vec<u16> = m.range(first, m.end()).unwrap().take(n).copied().collect();
            prop_assert_eq!(run, vec![v; n]);
            prop_assert_eq!(m.count(&v), n);
        }
    }

    #[test]
    fn prop_round_trip(values in proptest::collection::vec(any::<u16>(), 0..200)) {
        let m: UnorderedMultiset<u16> = values.iter().copied().collect();
        let rebuilt: UnorderedMultiset<u16> = UnorderedMultiset::from_vec(m.to_vec());
        prop_assert_eq!(rebuilt.len(), m.len());
        for (v, n) in counts(&values) {
            prop_assert_eq!(rebuilt.count(&v), n);
        }
        prop_assert!(rebuilt == m);
    }

    #[test]
    fn prop_rehash_transparency(
        early in proptest::collection::vec(0u16..64, 1..16),
        late in proptest::collection::vec(0u16..64, 64..400),
    ) {
        let policy = LoadPolicy::new(1.5, 1.0).unwrap().with_min_buckets(2);
        let mut m = UnorderedMultiset::with_policy(policy).unwrap();
        let held: Vec<_> = early.iter().map(|v| (*v, m.insert(*v))).collect();
        let before = m.stats().rehashes;
        for v in &late {
            m.insert(*v);
        }
        prop_assert!(m.stats().rehashes > before);
        for (v, pos) in &held {
            prop_assert_eq!(m.get(*pos), Some(v));
        }
        for v in early.iter().chain(late.iter()) {
            prop_assert!(!m.find(v).is_end());
        }
        let total: usize = (0..m.bucket_count()).map(|n| m.bucket_len(n)).sum();
        prop_assert_eq!(total, m.len());
    }
}
