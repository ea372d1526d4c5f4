//! Property-Based Tests for the local tier and key derivation
//!
//! Uses proptest to check eviction order, capacity bounds and key determinism
//! against simple models.

use proptest::prelude::*;
use std::time::Duration;

use crate::cache::LocalStore;
use crate::keyspace::{CacheKeyspace, KeyArg, MAX_ENCODED_ARGS_LEN};

// == Test Configuration ==
const TTL: Duration = Duration::from_secs(300);

// == Strategies ==
/// Small key alphabet so sequences revisit keys and exercise overwrites.
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-f]{1,2}".prop_map(|s| s)
}

fn value_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..64)
}

#[derive(Debug, Clone)]
enum StoreOp {
    Set(String),
    Delete(String),
}

fn store_op_strategy() -> impl Strategy<Value = StoreOp> {
    prop_oneof![
        3 => key_strategy().prop_map(StoreOp::Set),
        1 => key_strategy().prop_map(StoreOp::Delete),
    ]
}

fn arg_names_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::hash_set("[a-z]{1,8}", 1..6).prop_map(|set| set.into_iter().collect())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // The store never holds more than its bound, and its eviction order
    // matches a plain insertion-ordered list where overwrites move to the back.
    #[test]
    fn prop_fifo_matches_model(
        capacity in 1usize..8,
        ops in prop::collection::vec(store_op_strategy(), 1..80)
    ) {
        let mut store = LocalStore::new(capacity);
        let mut model: Vec<String> = Vec::new();

        for op in ops {
            match op {
                StoreOp::Set(key) => {
                    let expected_eviction = if model.contains(&key) {
                        model.retain(|k| k != &key);
                        None
                    } else if model.len() >= capacity {
                        Some(model.remove(0))
                    } else {
                        None
                    };
                    model.push(key.clone());

                    let evicted = store.set(key, vec![1], TTL).unwrap();
                    prop_assert_eq!(evicted, expected_eviction);
                }
                StoreOp::Delete(key) => {
                    let was_present = model.contains(&key);
                    model.retain(|k| k != &key);
                    prop_assert_eq!(store.delete(&key), was_present);
                }
            }

            prop_assert!(store.len() <= capacity, "Store exceeded its bound");
            prop_assert_eq!(store.len(), model.len());
            prop_assert_eq!(store.oldest_key(), model.first().map(String::as_str));
        }

        for key in &model {
            prop_assert!(store.contains(key), "Model key {} missing from store", key);
        }
    }

    // A full store evicts exactly the earliest insertion when a new key arrives.
    #[test]
    fn prop_full_store_evicts_earliest(keys in prop::collection::hash_set("[a-z]{1,10}", 2..20)) {
        let keys: Vec<String> = keys.into_iter().collect();
        let (last, first_keys) = keys.split_last().unwrap();
        let mut store = LocalStore::new(first_keys.len());

        for key in first_keys {
            prop_assert_eq!(store.set(key.clone(), vec![0], TTL).unwrap(), None);
        }

        let evicted = store.set(last.clone(), vec![0], TTL).unwrap();
        prop_assert_eq!(evicted.as_ref(), Some(&first_keys[0]));
        prop_assert!(!store.contains(&first_keys[0]));
        prop_assert!(store.contains(last));
        prop_assert_eq!(store.stats().evictions, 1);
    }

    // Any byte payload stored before expiry comes back unchanged.
    #[test]
    fn prop_store_round_trip(key in key_strategy(), value in value_strategy()) {
        let mut store = LocalStore::new(16);
        store.set(key.clone(), value.clone(), TTL).unwrap();
        prop_assert_eq!(store.get(&key), Some(value));
    }

    // Prefix removal leaves exactly the keys outside the prefix.
    #[test]
    fn prop_remove_prefix_is_exact(keys in prop::collection::hash_set("[ab]{1,4}", 1..16)) {
        let mut store = LocalStore::new(32);
        for key in &keys {
            store.set(key.clone(), vec![0], TTL).unwrap();
        }

        let expected_removed = keys.iter().filter(|k| k.starts_with('a')).count();
        prop_assert_eq!(store.remove_prefix("a"), expected_removed);

        for key in &keys {
            prop_assert_eq!(store.contains(key), !key.starts_with('a'));
        }
    }

    // Argument order never changes the derived key.
    #[test]
    fn prop_key_is_order_independent(
        (names, shuffled) in arg_names_strategy()
            .prop_flat_map(|names| (Just(names.clone()), Just(names).prop_shuffle()))
    ) {
        let args = |names: &[String]| -> Vec<(String, i64)> {
            names.iter().map(|n| (n.clone(), n.len() as i64)).collect()
        };
        let build = |pairs: &[(String, i64)]| {
            let args: Vec<(&str, KeyArg)> = pairs
                .iter()
                .map(|(n, v)| (n.as_str(), KeyArg::from(*v)))
                .collect();
            CacheKeyspace::build("directions", &args)
        };

        prop_assert_eq!(build(&args(&names)), build(&args(&shuffled)));
    }

    // Distinct argument sets yield distinct keys while the encoding is short.
    #[test]
    fn prop_distinct_args_distinct_keys(a in "[a-z]{1,20}", b in "[a-z]{1,20}") {
        prop_assume!(a != b);
        let ka = CacheKeyspace::build("geocode", &[("q", KeyArg::from(a.as_str()))]);
        let kb = CacheKeyspace::build("geocode", &[("q", KeyArg::from(b.as_str()))]);
        prop_assert_ne!(ka, kb);
    }

    // Keys stay bounded no matter how large the arguments are.
    #[test]
    fn prop_key_length_is_bounded(q in ".{0,600}") {
        let key = CacheKeyspace::build("geocode", &[("q", KeyArg::from(q.as_str()))]);
        prop_assert!(key.starts_with("geocode:"));
        prop_assert!(key.len() <= "geocode:".len() + MAX_ENCODED_ARGS_LEN);
    }

    // Rounding is idempotent and moves a coordinate by at most half a unit
    // in the last kept decimal.
    #[test]
    fn prop_coordinate_rounding(value in -180.0f64..180.0) {
        let rounded = CacheKeyspace::round_coord(value);
        prop_assert_eq!(CacheKeyspace::round_coord(rounded), rounded);
        prop_assert!((rounded - value).abs() <= 0.0005 + 1e-9);
    }
}

