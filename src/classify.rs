//! Property classification.
//!
//! A [`Classifier`] is an ordered chain of [`SetterRule`]s. Each rule either
//! claims a property and returns its [`SetterStrategy`], or passes. The first
//! rule that claims a property wins, so `Option<Vec<T>>` is unwrapped by the
//! nullable rule before the collection rule sees the inner list.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use rand::Rng;
use serde_json::{Map, Value};
use tracing::warn;

use crate::context::BuildContext;
use crate::engine::Engine;
use crate::error::{BuildError, SynthesisError};
use crate::primitives::{self, StringHint};
use crate::reflect::{CollectionShape, Primitive, TypeInfo, TypeKind};
use crate::synthesize::ErasedBuilder;

/// Finds or synthesizes the builder of a complex type.
pub trait BuilderResolver {
    fn resolve_builder(&self, info: &TypeInfo) -> Result<Arc<dyn ErasedBuilder>, SynthesisError>;
}

/// Value domain of a primitive strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Domain {
    /// Small readable ranges (integers `0..=10`).
    #[default]
    Default,
    /// Integers spread over `1..=i32::MAX`, used for unique properties.
    Wide,
}

/// How one property receives its random value.
#[derive(Debug, Clone)]
pub enum SetterStrategy {
    /// Leave the property untouched.
    Skip,
    /// Always the same value.
    Fixed(Value),
    Primitive {
        primitive: Primitive,
        hint: StringHint,
        domain: Domain,
    },
    Enum(TypeInfo),
    Collection {
        shape: CollectionShape,
        element: Box<SetterStrategy>,
        key: Option<Box<SetterStrategy>>,
    },
    /// `Option<T>`: the inner strategy, assigned as `Some`.
    Nullable(Box<SetterStrategy>),
    /// Nested entity built through `builder`.
    Complex { builder: Arc<dyn ErasedBuilder> },
}

impl SetterStrategy {
    pub fn is_skip(&self) -> bool {
        matches!(self, SetterStrategy::Skip)
    }

    /// Whether the strategy fills a collection, directly or inside an `Option`.
    pub fn is_collection(&self) -> bool {
        match self {
            SetterStrategy::Collection { .. } => true,
            SetterStrategy::Nullable(inner) => inner.is_collection(),
            _ => false,
        }
    }

    /// The same strategy drawing integers from the wide domain.
    pub fn widened(&self) -> SetterStrategy {
        match self {
            SetterStrategy::Primitive {
                primitive, hint, ..
            } => SetterStrategy::Primitive {
                primitive: *primitive,
                hint: *hint,
                domain: Domain::Wide,
            },
            SetterStrategy::Nullable(inner) => SetterStrategy::Nullable(Box::new(inner.widened())),
            other => other.clone(),
        }
    }

    /// Produce a value for `property`.
    ///
    /// `Ok(None)` means the property is left as constructed: collections when
    /// filling was not requested, nested entities beyond the depth ceiling.
    pub fn generate(
        &self,
        engine: &Arc<Engine>,
        ctx: &BuildContext,
        property: &str,
    ) -> Result<Option<Value>, BuildError> {
        match self {
            SetterStrategy::Skip => Ok(None),
            SetterStrategy::Fixed(value) => Ok(Some(value.clone())),
            SetterStrategy::Primitive {
                primitive,
                hint,
                domain,
            } => {
                let value = engine.with_rng(|rng| match domain {
                    Domain::Default => primitives::value_for(rng, *primitive, *hint),
                    Domain::Wide => primitives::wide_value_for(rng, *primitive, *hint),
                })?;
                Ok(Some(value))
            }
            SetterStrategy::Enum(info) => {
                let member = engine.with_rng(|rng| primitives::enum_member(rng, info))?;
                Ok(Some(Value::String(member.to_string())))
            }
            SetterStrategy::Collection {
                shape,
                element,
                key,
            } => {
                if !ctx.fill_collections {
                    return Ok(None);
                }
                fill_collection(engine, ctx, property, *shape, element, key.as_deref())
            }
            SetterStrategy::Nullable(inner) => inner.generate(engine, ctx, property),
            SetterStrategy::Complex { builder } => {
                if !engine.should_descend(ctx, builder.entity()) {
                    return Ok(None);
                }
                builder.random_value(engine, ctx).map(Some)
            }
        }
    }
}

fn fill_collection(
    engine: &Arc<Engine>,
    ctx: &BuildContext,
    property: &str,
    shape: CollectionShape,
    element: &SetterStrategy,
    key: Option<&SetterStrategy>,
) -> Result<Option<Value>, BuildError> {
    let count = match shape {
        CollectionShape::Array(len) => len,
        _ => {
            let config = engine.config();
            let (lo, hi) = (config.collection_min, config.collection_max);
            engine.with_rng(|rng| rng.gen_range(lo..=hi.max(lo)))
        }
    };

    match shape {
        CollectionShape::List | CollectionShape::Array(_) => {
            let mut items = Vec::with_capacity(count);
            for _ in 0..count {
                match element.generate(engine, ctx, property)? {
                    Some(item) => items.push(item),
                    None => return Ok(None),
                }
            }
            Ok(Some(Value::Array(items)))
        }
        CollectionShape::Set => {
            let mut seen = HashSet::new();
            let mut items = Vec::with_capacity(count);
            for _ in 0..count.saturating_mul(10) {
                if items.len() == count {
                    break;
                }
                let Some(item) = element.generate(engine, ctx, property)? else {
                    return Ok(None);
                };
                if seen.insert(item.to_string()) {
                    items.push(item);
                }
            }
            Ok(Some(Value::Array(items)))
        }
        CollectionShape::Map => {
            let Some(key) = key else {
                return Ok(None);
            };
            let mut map = Map::new();
            for _ in 0..count.saturating_mul(10) {
                if map.len() == count {
                    break;
                }
                let (Some(k), Some(v)) = (
                    key.generate(engine, ctx, property)?,
                    element.generate(engine, ctx, property)?,
                ) else {
                    return Ok(None);
                };
                let k = match k {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                map.entry(k).or_insert(v);
            }
            Ok(Some(Value::Object(map)))
        }
    }
}

/// Inputs available to a rule while classifying one property.
pub struct ClassifyCx<'a> {
    pub property: &'a str,
    pub writable: bool,
    /// The full chain, for rules that classify inner types.
    pub classifier: &'a Classifier,
    pub builders: &'a dyn BuilderResolver,
}

impl ClassifyCx<'_> {
    /// Classify an inner type (element, key or unwrapped option) of the
    /// current property.
    pub fn classify_inner(&self, info: &TypeInfo) -> SetterStrategy {
        self.classifier
            .classify(self.property, true, Some(info), self.builders)
    }
}

/// One link of the classification chain.
pub trait SetterRule: Send + Sync {
    fn name(&self) -> &'static str;

    /// Claim the property with a strategy, or return `None` to pass.
    fn resolve(&self, cx: &ClassifyCx<'_>, ty: Option<&TypeInfo>) -> Option<SetterStrategy>;
}

pub struct NotWritableRule;

impl SetterRule for NotWritableRule {
    fn name(&self) -> &'static str {
        "not-writable"
    }

    fn resolve(&self, cx: &ClassifyCx<'_>, ty: Option<&TypeInfo>) -> Option<SetterStrategy> {
        (!cx.writable || ty.is_none()).then_some(SetterStrategy::Skip)
    }
}

/// Scalars, with name-based string shapes and the `enabled` quirk.
pub struct PrimitiveRule;

impl SetterRule for PrimitiveRule {
    fn name(&self) -> &'static str {
        "primitive"
    }

    fn resolve(&self, cx: &ClassifyCx<'_>, ty: Option<&TypeInfo>) -> Option<SetterStrategy> {
        let primitive = match &ty?.kind {
            TypeKind::Primitive(p) => *p,
            TypeKind::Collection(c)
                if c.shape == CollectionShape::List
                    && matches!(c.element.kind, TypeKind::Primitive(Primitive::U8)) =>
            {
                Primitive::Bytes
            }
            _ => return None,
        };
        if primitive == Primitive::Bool && primitives::is_always_true(cx.property) {
            return Some(SetterStrategy::Fixed(Value::Bool(true)));
        }
        let hint = if primitive == Primitive::String {
            StringHint::from_property(cx.property)
        } else {
            StringHint::Plain
        };
        Some(SetterStrategy::Primitive {
            primitive,
            hint,
            domain: Domain::Default,
        })
    }
}

pub struct EnumRule;

impl SetterRule for EnumRule {
    fn name(&self) -> &'static str {
        "enum"
    }

    fn resolve(&self, _cx: &ClassifyCx<'_>, ty: Option<&TypeInfo>) -> Option<SetterStrategy> {
        let ty = ty?;
        ty.is_enum().then(|| SetterStrategy::Enum(ty.clone()))
    }
}

pub struct CollectionRule;

impl SetterRule for CollectionRule {
    fn name(&self) -> &'static str {
        "collection"
    }

    fn resolve(&self, cx: &ClassifyCx<'_>, ty: Option<&TypeInfo>) -> Option<SetterStrategy> {
        let TypeKind::Collection(info) = &ty?.kind else {
            return None;
        };
        let element = cx.classify_inner(&info.element);
        if element.is_skip() {
            return Some(SetterStrategy::Skip);
        }
        let key = match &info.key {
            Some(key) => {
                let key = cx.classify_inner(key);
                if key.is_skip() {
                    return Some(SetterStrategy::Skip);
                }
                Some(Box::new(key))
            }
            None => None,
        };
        Some(SetterStrategy::Collection {
            shape: info.shape,
            element: Box::new(element),
            key,
        })
    }
}

pub struct NullableRule;

impl SetterRule for NullableRule {
    fn name(&self) -> &'static str {
        "nullable"
    }

    fn resolve(&self, cx: &ClassifyCx<'_>, ty: Option<&TypeInfo>) -> Option<SetterStrategy> {
        let TypeKind::Nullable(inner) = &ty?.kind else {
            return None;
        };
        let strategy = match cx.classify_inner(inner) {
            SetterStrategy::Skip => SetterStrategy::Skip,
            inner => SetterStrategy::Nullable(Box::new(inner)),
        };
        Some(strategy)
    }
}

/// Nested entities. A type without a usable builder degrades to `Skip`.
pub struct ComplexRule;

impl SetterRule for ComplexRule {
    fn name(&self) -> &'static str {
        "complex"
    }

    fn resolve(&self, cx: &ClassifyCx<'_>, ty: Option<&TypeInfo>) -> Option<SetterStrategy> {
        let ty = ty?;
        if !ty.is_complex() {
            return None;
        }
        match cx.builders.resolve_builder(ty) {
            Ok(builder) => Some(SetterStrategy::Complex { builder }),
            Err(error) => {
                warn!(
                    property = cx.property,
                    entity = ty.name(),
                    %error,
                    "no builder available, property left unset"
                );
                Some(SetterStrategy::Skip)
            }
        }
    }
}

/// Ordered, first-match-wins chain of rules.
pub struct Classifier {
    rules: Vec<Box<dyn SetterRule>>,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::standard()
    }
}

impl Classifier {
    /// Not-writable, primitive, enum, collection, nullable, complex.
    pub fn standard() -> Self {
        Self {
            rules: vec![
                Box::new(NotWritableRule),
                Box::new(PrimitiveRule),
                Box::new(EnumRule),
                Box::new(CollectionRule),
                Box::new(NullableRule),
                Box::new(ComplexRule),
            ],
        }
    }

    /// Insert `rule` ahead of every rule already in the chain.
    pub fn prepend(&mut self, rule: Box<dyn SetterRule>) {
        self.rules.insert(0, rule);
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    pub fn classify(
        &self,
        property: &str,
        writable: bool,
        ty: Option<&TypeInfo>,
        builders: &dyn BuilderResolver,
    ) -> SetterStrategy {
        let cx = ClassifyCx {
            property,
            writable,
            classifier: self,
            builders,
        };
        self.rules
            .iter()
            .find_map(|rule| rule.resolve(&cx, ty))
            .unwrap_or(SetterStrategy::Skip)
    }
}

impl fmt::Debug for Classifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Classifier")
            .field("rules", &self.rule_names())
            .finish()
    }
}
