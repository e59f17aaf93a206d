use super::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc as StdArc;

#[derive(Debug, Serialize, Deserialize, Default, PartialEq, Clone)]
struct Counter {
    n: u64,
}

#[test]
fn absent_key_yields_zero_and_false() {
    let bag = SharedBag::new();
    let (value, present) = bag.get(Key::PORTFOLIO);
    assert!(!present);
    assert_eq!(value, Value::Null);
    assert!(bag.get_as::<Counter>(Key::PORTFOLIO).is_none());
}

#[test]
fn set_then_get_roundtrips() {
    let bag = SharedBag::new();
    bag.set(Key::PORTFOLIO, &Counter { n: 7 });
    let got: Counter = bag.get_as(Key::PORTFOLIO).unwrap();
    assert_eq!(got, Counter { n: 7 });
    assert!(bag.has(Key::PORTFOLIO));
}

#[test]
fn update_starts_from_empty_container_when_absent() {
    let bag = SharedBag::new();
    bag.update_typed::<Counter>(Key::custom("hits"), |c| c.n += 1);
    let got: Counter = bag.get_as(Key::custom("hits")).unwrap();
    assert_eq!(got.n, 1);
}

#[test]
fn update_sees_value_it_will_replace() {
    let bag = SharedBag::new();
    bag.set(Key::custom("n"), &Counter { n: 10 });
    bag.update_typed::<Counter>(Key::custom("n"), |c| c.n += 5);
    let got: Counter = bag.get_as(Key::custom("n")).unwrap();
    assert_eq!(got.n, 15);
}

#[test]
fn get_as_type_mismatch_is_false_not_panic() {
    let bag = SharedBag::new();
    bag.set(Key::custom("s"), &"not a counter".to_string());
    assert!(bag.get_as::<Counter>(Key::custom("s")).is_none());
}

#[test]
#[should_panic(expected = "required key")]
fn must_get_aborts_on_absent_key() {
    let bag = SharedBag::new();
    bag.must_get(Key::custom("missing"));
}

#[test]
fn snapshot_is_decoupled_from_later_mutations() {
    let bag = SharedBag::new();
    bag.set(Key::custom("k"), &Counter { n: 1 });
    let snap = bag.snapshot();
    bag.set(Key::custom("k"), &Counter { n: 2 });

    let (snap_val, _) = snap.get(Key::custom("k"));
    let snap_counter: Counter = serde_json::from_value(snap_val).unwrap();
    assert_eq!(snap_counter.n, 1);

    let live: Counter = bag.get_as(Key::custom("k")).unwrap();
    assert_eq!(live.n, 2);
}

#[test]
fn marshal_json_contains_all_keys() {
    let bag = SharedBag::new();
    bag.set(Key::PORTFOLIO, &Counter { n: 1 });
    bag.set(Key::PROFILE, &Counter { n: 2 });
    let json = bag.marshal_json();
    let obj = json.as_object().unwrap();
    assert!(obj.contains_key("portfolio"));
    assert!(obj.contains_key("profile"));
}

#[tokio::test]
async fn concurrent_updates_are_linearizable() {
    let bag = StdArc::new(SharedBag::new());
    let mut handles = Vec::new();
    const WRITERS: u64 = 50;
    const INCREMENTS: u64 = 20;

    for _ in 0..WRITERS {
        let bag = StdArc::clone(&bag);
        handles.push(tokio::spawn(async move {
            for _ in 0..INCREMENTS {
                bag.update_typed::<Counter>(Key::custom("shared"), |c| c.n += 1);
            }
        }));
    }

    for h in handles {
        h.await.unwrap();
    }

    let total: Counter = bag.get_as(Key::custom("shared")).unwrap();
    assert_eq!(total.n, WRITERS * INCREMENTS);
}

proptest::proptest! {
    #[test]
    fn update_total_matches_sum_of_applied_deltas(deltas in proptest::collection::vec(1u64..100, 1..50)) {
        let bag = SharedBag::new();
        let expected: u64 = deltas.iter().sum();
        for d in &deltas {
            let d = *d;
            bag.update_typed::<Counter>(Key::custom("sum"), move |c| c.n += d);
        }
        let got: Counter = bag.get_as(Key::custom("sum")).unwrap();
        prop_assert_eq!(got.n, expected);
    }
}
