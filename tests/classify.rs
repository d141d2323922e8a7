//! Property classification and the strategy chain.
#![cfg(feature = "derive")]

use std::collections::HashMap;
use std::sync::Arc;

use fixtura::classify::{ClassifyCx, Domain, SetterRule, SetterStrategy};
use fixtura::primitives::StringHint;
use fixtura::reflect::{CollectionShape, Primitive};
use fixtura::prelude::*;
use fixtura::TypeInfo;
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize, Reflect)]
pub enum Level {
    #[default]
    Beginner,
    Expert,
}

#[derive(Debug, Default, Serialize, Deserialize, Entity)]
pub struct Friend {
    pub name: String,
}

#[derive(Debug, Default, Serialize, Deserialize, Entity)]
pub struct Profile {
    pub enabled: bool,
    pub active: bool,
    pub email: String,
    pub home_page_url: String,
    pub phone: String,
    pub nickname: Option<String>,
    pub avatar: Vec<u8>,
    pub tags: Vec<String>,
    pub scores: HashMap<String, i32>,
    pub pair: [u16; 2],
    pub level: Level,
    pub friend: Option<Box<Friend>>,
    #[fixture(skip)]
    pub cache: String,
}

fn engine() -> Arc<Engine> {
    Engine::builder(EngineConfig::default().with_seed(11))
        .without_inventory()
        .build()
        .unwrap()
}

fn strategy<'a>(
    resolved: &'a fixtura::descriptor::ResolvedEntity<Profile>,
    name: &str,
) -> &'a SetterStrategy {
    &resolved.property(name).unwrap().strategy
}

#[test]
fn standard_chain_order() {
    let engine = engine();
    assert_eq!(
        engine.classifier().rule_names(),
        ["not-writable", "primitive", "enum", "collection", "nullable", "complex"]
    );
}

#[test]
fn properties_are_classified() {
    let engine = engine();
    let resolved = engine.resolved::<Profile>();

    assert!(matches!(
        strategy(&resolved, "enabled"),
        SetterStrategy::Fixed(v) if *v == json!(true)
    ));
    assert!(matches!(
        strategy(&resolved, "active"),
        SetterStrategy::Primitive { primitive: Primitive::Bool, .. }
    ));
    assert!(matches!(
        strategy(&resolved, "email"),
        SetterStrategy::Primitive { hint: StringHint::Email, domain: Domain::Default, .. }
    ));
    assert!(matches!(
        strategy(&resolved, "home_page_url"),
        SetterStrategy::Primitive { hint: StringHint::Url, .. }
    ));
    assert!(matches!(
        strategy(&resolved, "phone"),
        SetterStrategy::Primitive { hint: StringHint::Digits, .. }
    ));
    assert!(matches!(
        strategy(&resolved, "avatar"),
        SetterStrategy::Primitive { primitive: Primitive::Bytes, .. }
    ));
    assert!(matches!(strategy(&resolved, "level"), SetterStrategy::Enum(_)));
    assert!(matches!(
        strategy(&resolved, "tags"),
        SetterStrategy::Collection { shape: CollectionShape::List, .. }
    ));
    assert!(matches!(
        strategy(&resolved, "scores"),
        SetterStrategy::Collection { shape: CollectionShape::Map, key: Some(_), .. }
    ));
    assert!(matches!(
        strategy(&resolved, "pair"),
        SetterStrategy::Collection { shape: CollectionShape::Array(2), .. }
    ));
    assert!(matches!(strategy(&resolved, "cache"), SetterStrategy::Skip));

    match strategy(&resolved, "nickname") {
        SetterStrategy::Nullable(inner) => assert!(matches!(
            **inner,
            SetterStrategy::Primitive { primitive: Primitive::String, .. }
        )),
        other => panic!("unexpected strategy {other:?}"),
    }
    match strategy(&resolved, "friend") {
        SetterStrategy::Nullable(inner) => match &**inner {
            SetterStrategy::Complex { builder } => {
                assert_eq!(builder.module_path(), fixtura::synthesize::DYNAMIC_MODULE);
            }
            other => panic!("unexpected strategy {other:?}"),
        },
        other => panic!("unexpected strategy {other:?}"),
    }
}

#[test]
fn resolution_is_cached() {
    let engine = engine();
    assert!(!engine.descriptors().contains::<Profile>());
    let first = engine.resolved::<Profile>();
    let second = engine.resolved::<Profile>();
    assert!(Arc::ptr_eq(&first, &second));
    assert!(engine.descriptors().contains::<Profile>());
}

#[test]
fn concurrent_resolution_shares_one_entry() {
    let engine = engine();
    let resolved: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| scope.spawn(|| engine.resolved::<Profile>()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    assert!(resolved.iter().all(|r| Arc::ptr_eq(r, &resolved[0])));
    assert_eq!(engine.descriptors().len(), 1);
}

#[test]
fn random_profile_respects_strategies() {
    let engine = engine();
    for _ in 0..20 {
        let profile: Profile = engine.build_random().unwrap();
        assert!(profile.enabled);
        assert!(profile.email.contains('@'));
        assert!(profile.home_page_url.starts_with("http://www."));
        assert!(profile.phone.chars().all(|c| c.is_ascii_digit()));
        assert_eq!(profile.phone.len(), 10);
        assert!(profile.nickname.is_some());
        assert!((8..=18).contains(&profile.avatar.len()));
        assert!(profile.cache.is_empty());
        assert_eq!(profile.friend.as_ref().map(|f| f.name.is_empty()), Some(false));
        // Collections keep their constructed value.
        assert!(profile.tags.is_empty());
        assert!(profile.scores.is_empty());
    }
}

#[test]
fn filled_collections_follow_bounds() {
    let engine = Engine::builder(EngineConfig::default().with_collection_bounds(2, 4))
        .without_inventory()
        .build()
        .unwrap();
    for _ in 0..20 {
        let profile = engine
            .dynamic::<Profile>()
            .with_random_props()
            .with_filled_collections()
            .build()
            .unwrap();
        assert!((2..=4).contains(&profile.tags.len()));
        assert!((1..=4).contains(&profile.scores.len()));
        assert!(profile.scores.values().all(|v| (0..=10).contains(v)));
    }
}

#[test]
fn filled_collections_alone_touch_only_collections() {
    let engine = engine();
    let profile = engine.dynamic::<Profile>().with_filled_collections().build().unwrap();
    assert!(!profile.tags.is_empty());
    assert!(profile.email.is_empty());
    assert!(!profile.enabled);
    assert!(profile.friend.is_none());
}

struct NicknameRule;

impl SetterRule for NicknameRule {
    fn name(&self) -> &'static str {
        "nickname"
    }

    fn resolve(&self, cx: &ClassifyCx<'_>, _ty: Option<&TypeInfo>) -> Option<SetterStrategy> {
        (cx.writable && cx.property == "nickname").then(|| SetterStrategy::Fixed(json!("nick")))
    }
}

#[test]
fn custom_rules_run_first() {
    let engine = Engine::builder(EngineConfig::default())
        .without_inventory()
        .rule(NicknameRule)
        .build()
        .unwrap();
    assert_eq!(engine.classifier().rule_names()[0], "nickname");
    let profile: Profile = engine.build_random().unwrap();
    assert_eq!(profile.nickname.as_deref(), Some("nick"));
}

#[test]
fn strategy_for_free_standing_types() {
    let engine = engine();
    let info = <Option<Vec<Level>>>::type_info();
    let strategy = engine.strategy_for("levels", &info);
    assert!(strategy.is_collection());
    assert!(matches!(
        engine.strategy_for("id", &u32::type_info()).widened(),
        SetterStrategy::Primitive { domain: Domain::Wide, .. }
    ));
}
