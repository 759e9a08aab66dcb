#![cfg(feature = "serde")]

// JSON export: a flat list in iteration order, duplicates grouped.
use unordered_multiset::{LoadPolicy, UnorderedMultiset};

#[test]
fn exports_flat_list_in_iteration_order() {
    let mut m = UnorderedMultiset::new();
    for v in [3, 1, 3, 2, 3] {
        m.insert(v);
    }
    let json = serde_json::to_string(&m).unwrap();
    let list: Vec<i32> = serde_json::from_str(&json).unwrap();
    assert_eq!(list, m.to_vec());
    assert_eq!(list.iter().filter(|v| **v == 3).count(), 3);
}

#[test]
fn empty_exports_as_empty_list() {
    let m: UnorderedMultiset<String> = UnorderedMultiset::new();
    assert_eq!(serde_json::to_string(&m).unwrap(), "[]");
}

#[test]
fn imports_any_sequence() {
    let m: UnorderedMultiset<String> = serde_json::from_str(r#"["b","a","b","c","b"]"#).unwrap();
    assert_eq!(m.len(), 5);
    assert_eq!(m.count(&"b".to_string()), 3);
    assert!(serde_json::from_str::<UnorderedMultiset<String>>("{}").is_err());
}

#[test]
fn policy_round_trips() {
    let p = LoadPolicy::new(2.0, 0.75).unwrap().with_min_buckets(16);
    let json = serde_json::to_string(&p).unwrap();
    let back: LoadPolicy = serde_json::from_str(&json).unwrap();
    assert_eq!(back, p);
    assert!(back.validate().is_ok());

    let bad: LoadPolicy = serde_json::from_str(r#"{"ratio":-1.0,"max_ratio":1.0,"min_buckets":8}"#).unwrap();
    assert!(UnorderedMultiset::<u8>::with_policy(bad).is_err());
}
