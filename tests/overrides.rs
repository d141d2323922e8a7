//! `#[fixture(...)]` overrides: unique values, allow-lists and non-default values.
#![cfg(feature = "derive")]

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::thread;

use fixtura::overrides::{coerce, is_zero};
use fixtura::prelude::*;
use fixtura::{OverrideKind, TypeKey};
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize, Reflect)]
pub enum Tier {
    #[default]
    Free,
    Premium,
}

#[derive(Debug, Default, Serialize, Deserialize, Entity)]
pub struct Ticket {
    #[fixture(unique)]
    pub id: u32,
    #[fixture(unique)]
    pub code: String,
    #[fixture(one_of("1", "2", 3))]
    pub rank: i32,
    #[fixture(one_of("premium"))]
    pub tier: Tier,
    #[fixture(one_of("low", "high"))]
    pub priority: String,
    #[fixture(non_default)]
    pub score: u8,
    #[fixture(non_default)]
    pub urgent: bool,
}

#[derive(Debug, Default, Serialize, Deserialize, Entity)]
pub struct Coin {
    #[fixture(unique)]
    pub heads: bool,
}

#[derive(Debug, Default, Serialize, Deserialize, Entity)]
pub struct Wallet {
    pub owner: String,
    pub coin: Option<Coin>,
}

#[derive(Debug, Default, Serialize, Deserialize, Entity)]
pub struct Broken {
    #[fixture(one_of())]
    pub empty: String,
    #[fixture(one_of("not a number"))]
    pub count: i32,
    pub label: String,
}

/// Overrides declared on the struct instead of the fields.
#[derive(Debug, Default, Serialize, Deserialize, Entity)]
#[fixture(unique(serial), non_default(weight), one_of(color = ["red", "blue"]))]
pub struct Parcel {
    pub serial: u64,
    pub weight: u16,
    pub color: String,
}

/// A later declaration replaces an earlier one.
#[derive(Debug, Default, Serialize, Deserialize, Entity)]
#[fixture(one_of(state = ["draft"]))]
pub struct Document {
    #[fixture(one_of("published"))]
    pub state: String,
}

#[derive(Debug, Default, Serialize, Deserialize, Entity)]
pub struct Bag {
    #[fixture(non_default)]
    pub items: Vec<String>,
    #[fixture(non_default)]
    pub counts: Option<HashMap<String, u8>>,
    pub spare: Vec<String>,
}

fn engine() -> Arc<Engine> {
    Engine::builder(EngineConfig::default().with_seed(17).with_unique_attempts(200))
        .without_inventory()
        .build()
        .unwrap()
}

#[test]
fn unique_values_never_repeat() {
    let engine = engine();
    let tickets: Vec<Ticket> = engine.build_random_many(100).unwrap();

    let ids: HashSet<u32> = tickets.iter().map(|t| t.id).collect();
    assert_eq!(ids.len(), 100);
    assert!(tickets.iter().all(|t| t.id > 0));
    let codes: HashSet<&str> = tickets.iter().map(|t| t.code.as_str()).collect();
    assert_eq!(codes.len(), 100);

    assert_eq!(engine.unique().produced(TypeKey::of::<Ticket>(), "id"), 100);
    assert_eq!(engine.unique().produced(TypeKey::of::<Ticket>(), "rank"), 0);
}

#[test]
fn unique_history_is_per_engine_and_clearable() {
    let engine = engine();
    let _: Ticket = engine.build_random().unwrap();
    let other = self::engine();
    assert_eq!(other.unique().produced(TypeKey::of::<Ticket>(), "code"), 0);

    engine.unique().clear();
    assert_eq!(engine.unique().produced(TypeKey::of::<Ticket>(), "code"), 0);
}

#[test]
fn exhausted_unique_domain_fails_the_build() {
    let engine = Engine::builder(EngineConfig::default().with_unique_attempts(50))
        .without_inventory()
        .build()
        .unwrap();
    let coins: Vec<Coin> = engine.build_random_many(2).unwrap();
    assert_ne!(coins[0].heads, coins[1].heads);

    let err = engine.build_random::<Coin>().unwrap_err();
    match &err {
        BuildError::UniqueExhausted {
            entity,
            property,
            attempts,
            ..
        } => {
            assert!(entity.ends_with("Coin"));
            assert_eq!(*property, "heads");
            assert_eq!(*attempts, 50);
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert!(err.is_fatal());
    assert!(err.to_string().contains("cannot get another different value"));
}

#[test]
fn exhaustion_inside_a_nested_entity_propagates() {
    let engine = Engine::builder(EngineConfig::default().with_unique_attempts(50))
        .without_inventory()
        .build()
        .unwrap();
    let _: Vec<Wallet> = engine.build_random_many(2).unwrap();
    let err = engine.build_random::<Wallet>().unwrap_err();
    assert!(matches!(err, BuildError::UniqueExhausted { property: "heads", .. }));
}

#[test]
fn allow_lists_are_coerced_to_the_property_type() {
    let engine = engine();
    let mut ranks = HashSet::new();
    for _ in 0..100 {
        let ticket: Ticket = engine.build_random().unwrap();
        assert!([1, 2, 3].contains(&ticket.rank));
        ranks.insert(ticket.rank);
        assert_eq!(ticket.tier, Tier::Premium);
        assert!(ticket.priority == "low" || ticket.priority == "high");
    }
    assert_eq!(ranks.len(), 3);
}

#[test]
fn non_default_avoids_zero_values() {
    let engine = engine();
    for _ in 0..100 {
        let ticket: Ticket = engine.build_random().unwrap();
        assert_ne!(ticket.score, 0);
        assert!(ticket.urgent);
    }
}

#[test]
fn unusable_allow_lists_leave_the_property_unset() {
    let engine = engine();
    let broken: Broken = engine.build_random().unwrap();
    assert!(broken.empty.is_empty());
    assert_eq!(broken.count, 0);
    // The rest of the pass still runs.
    assert!(!broken.label.is_empty());
}

#[test]
fn struct_level_declarations() {
    let engine = engine();
    let parcels: Vec<Parcel> = engine.build_random_many(50).unwrap();
    let serials: HashSet<u64> = parcels.iter().map(|p| p.serial).collect();
    assert_eq!(serials.len(), 50);
    assert!(parcels.iter().all(|p| p.weight != 0));
    assert!(parcels.iter().all(|p| p.color == "red" || p.color == "blue"));
}

#[test]
fn last_declaration_wins() {
    let engine = engine();
    let document: Document = engine.build_random().unwrap();
    assert_eq!(document.state, "published");
    let resolved = engine.resolved::<Document>();
    assert_eq!(
        resolved.property("state").unwrap().override_kind,
        Some(OverrideKind::OneOf(vec![json!("published")]))
    );
}

#[test]
fn overrides_only_apply_to_randomization() {
    let engine = engine();
    let ticket: Ticket = engine.build_default().unwrap();
    assert_eq!(ticket.id, 0);
    assert_eq!(ticket.tier, Tier::Free);
    assert_eq!(engine.unique().produced(TypeKey::of::<Ticket>(), "id"), 0);
}

#[test]
fn coercion_table() {
    assert_eq!(coerce(&json!("premium"), &Tier::type_info()), Some(json!("Premium")));
    assert_eq!(coerce(&json!("gold"), &Tier::type_info()), None);
    assert_eq!(coerce(&json!(3.0), &i64::type_info()), Some(json!(3)));
    assert_eq!(coerce(&json!(3.5), &i64::type_info()), None);
    assert_eq!(coerce(&json!("-4"), &u32::type_info()), None);
    assert_eq!(coerce(&json!("TRUE"), &bool::type_info()), Some(json!(true)));
    assert_eq!(coerce(&json!(0), &bool::type_info()), Some(json!(false)));
    assert_eq!(coerce(&json!("2.5"), &f64::type_info()), Some(json!(2.5)));
    assert_eq!(coerce(&json!(7), &char::type_info()), Some(json!("7")));
    assert_eq!(coerce(&json!("ab"), &char::type_info()), None);
    assert_eq!(coerce(&json!(true), &String::type_info()), Some(json!("true")));
    assert_eq!(coerce(&json!(null), &<Option<u8>>::type_info()), Some(json!(null)));
    assert_eq!(coerce(&json!("9"), &<Option<u8>>::type_info()), Some(json!(9)));
}

#[test]
fn zero_values() {
    assert!(is_zero(&json!(0)));
    assert!(is_zero(&json!(0.0)));
    assert!(is_zero(&json!(false)));
    assert!(is_zero(&json!("")));
    assert!(is_zero(&json!([])));
    assert!(is_zero(&json!(null)));
    assert!(!is_zero(&json!(-1)));
    assert!(!is_zero(&json!("x")));
}

#[test]
fn non_default_collections_are_filled() {
    let engine = Engine::builder(EngineConfig::default().with_collection_bounds(0, 2))
        .without_inventory()
        .build()
        .unwrap();
    for _ in 0..50 {
        let bag: Bag = engine.build_random().unwrap();
        assert!((1..=2).contains(&bag.items.len()), "{:?}", bag.items);
        assert!(!bag.counts.unwrap().is_empty());
        // Collections without the override keep their constructed value.
        assert!(bag.spare.is_empty());
    }
}

#[test]
fn unique_values_hold_across_threads() {
    let engine = engine();
    let ids: Vec<u32> = thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let engine = Arc::clone(&engine);
                scope.spawn(move || {
                    (0..50)
                        .map(|_| engine.build_random::<Ticket>().unwrap().id)
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect()
    });
    let distinct: HashSet<u32> = ids.iter().copied().collect();
    assert_eq!(ids.len(), 400);
    assert_eq!(distinct.len(), 400);
    assert_eq!(engine.unique().produced(TypeKey::of::<Ticket>(), "id"), 400);
}
