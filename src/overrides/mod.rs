//! Attribute-directed overrides of the random strategy.
//!
//! Declared with `#[fixture(...)]`:
//!
//! ```
//! use fixtura::Entity;
//!
//! #[derive(Debug, Default, serde::Serialize, serde::Deserialize, Entity)]
//! #[fixture(non_default(score))]
//! pub struct Ticket {
//!     #[fixture(unique)]
//!     pub id: u32,
//!     #[fixture(one_of("low", "high"))]
//!     pub priority: String,
//!     pub score: i32,
//! }
//!
//! let ticket: Ticket = fixtura::build_random().unwrap();
//! assert!(ticket.priority == "low" || ticket.priority == "high");
//! assert_ne!(ticket.score, 0);
//! ```

mod coerce;
mod unique;

use std::sync::Arc;

use rand::Rng;
use serde_json::Value;
use tracing::warn;

pub use coerce::{coerce, is_zero};
pub use unique::{UniqueRegistry, UniqueValues};

use crate::classify::SetterStrategy;
use crate::context::BuildContext;
use crate::descriptor::OverrideKind;
use crate::engine::Engine;
use crate::error::{BuildError, GenerateError};
use crate::reflect::{TypeInfo, TypeKey};

/// One property as the override generators see it.
#[derive(Debug, Clone, Copy)]
pub struct OverrideTarget<'a> {
    pub entity: TypeKey,
    pub property: &'static str,
    pub strategy: &'a SetterStrategy,
    pub type_info: Option<&'a TypeInfo>,
}

/// Produce the value of an overridden property.
pub fn generate(
    engine: &Arc<Engine>,
    ctx: &BuildContext,
    target: OverrideTarget<'_>,
    kind: &OverrideKind,
) -> Result<Option<Value>, BuildError> {
    match kind {
        OverrideKind::NonDefault => non_default(engine, ctx, target),
        OverrideKind::Unique => engine.unique().next_value(engine, ctx, target),
        OverrideKind::OneOf(allowed) => one_of(engine, target, allowed),
    }
}

fn non_default(
    engine: &Arc<Engine>,
    ctx: &BuildContext,
    target: OverrideTarget<'_>,
) -> Result<Option<Value>, BuildError> {
    let attempts = engine.config().unique_attempts;
    // An unfilled collection is always empty, so collections are filled here.
    let ctx = if target.strategy.is_collection() {
        ctx.clone().with_filled_collections(true)
    } else {
        ctx.clone()
    };
    for _ in 0..attempts {
        match target.strategy.generate(engine, &ctx, target.property)? {
            Some(value) if is_zero(&value) => continue,
            other => return Ok(other),
        }
    }
    warn!(
        entity = target.entity.name(),
        property = target.property,
        attempts,
        "no non-default value generated, property left unset"
    );
    Ok(None)
}

fn one_of(
    engine: &Arc<Engine>,
    target: OverrideTarget<'_>,
    allowed: &[Value],
) -> Result<Option<Value>, BuildError> {
    if allowed.is_empty() {
        return Err(GenerateError::EmptyAllowList {
            property: target.property.to_string(),
        }
        .into());
    }
    let picked = &allowed[engine.with_rng(|rng| rng.gen_range(0..allowed.len()))];
    let Some(ty) = target.type_info else {
        return Ok(Some(picked.clone()));
    };
    match coerce(picked, ty) {
        Some(value) => Ok(Some(value)),
        None => Err(GenerateError::Coercion {
            value: picked.clone(),
            type_name: ty.name(),
        }
        .into()),
    }
}
