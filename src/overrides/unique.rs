use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tracing::debug;

use super::OverrideTarget;
use crate::context::BuildContext;
use crate::engine::Engine;
use crate::error::BuildError;
use crate::reflect::TypeKey;

/// Every value already handed out for one property.
#[derive(Debug, Default)]
pub struct UniqueValues {
    seen: HashSet<String>,
}

impl UniqueValues {
    /// Record `value`; false when it was produced before.
    pub fn insert(&mut self, value: &Value) -> bool {
        self.seen.insert(value.to_string())
    }

    pub fn contains(&self, value: &Value) -> bool {
        self.seen.contains(&value.to_string())
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

type PropertyKey = (TypeKey, &'static str);

/// Produced values per (entity type, property), for the engine lifetime.
#[derive(Debug, Default)]
pub struct UniqueRegistry {
    values: Mutex<HashMap<PropertyKey, Arc<Mutex<UniqueValues>>>>,
}

impl UniqueRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn values_for(&self, entity: TypeKey, property: &'static str) -> Arc<Mutex<UniqueValues>> {
        let mut values = self.values.lock();
        Arc::clone(values.entry((entity, property)).or_insert_with(|| {
            debug!(entity = entity.name(), property, "tracking unique values");
            Arc::default()
        }))
    }

    /// A value of `target` never produced before.
    ///
    /// Candidates come from the widened strategy and are generated outside
    /// the lock; the check and the insert happen together under it.
    pub(crate) fn next_value(
        &self,
        engine: &Arc<Engine>,
        ctx: &BuildContext,
        target: OverrideTarget<'_>,
    ) -> Result<Option<Value>, BuildError> {
        let strategy = target.strategy.widened();
        let seen = self.values_for(target.entity, target.property);
        let attempts = engine.config().unique_attempts;

        let mut last = Value::Null;
        for _ in 0..attempts {
            let Some(candidate) = strategy.generate(engine, ctx, target.property)? else {
                return Ok(None);
            };
            if seen.lock().insert(&candidate) {
                return Ok(Some(candidate));
            }
            last = candidate;
        }
        Err(BuildError::UniqueExhausted {
            entity: target.entity.name(),
            property: target.property,
            attempts,
            value: last,
        })
    }

    /// How many distinct values were handed out for `entity.property`.
    pub fn produced(&self, entity: TypeKey, property: &str) -> usize {
        self.values
            .lock()
            .iter()
            .find(|((e, p), _)| *e == entity && *p == property)
            .map_or(0, |(_, values)| values.lock().len())
    }

    /// Forget every value produced so far.
    pub fn clear(&self) {
        self.values.lock().clear();
    }
}
