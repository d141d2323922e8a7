//! Type-erased builders and on-demand synthesis of dynamic builders.
//!
//! Entities without a hand-written builder are built through
//! [`Synthesized<T>`](crate::builder::Synthesized), a generic builder that
//! relies only on the entity's descriptor. [`Synthesizer`] instantiates its
//! erased handle lazily, at most once per entity type.

use std::any::{type_name, Any};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tracing::debug;

use crate::builder::{Builder, EntityBuilder, Synthesized};
use crate::context::BuildContext;
use crate::descriptor::Entity;
use crate::engine::Engine;
use crate::error::{BuildError, SynthesisCause, SynthesisError};
use crate::reflect::{TypeInfo, TypeKey, TypeKind};

/// Module path reported by synthesized builders.
pub const DYNAMIC_MODULE: &str = "fixtura::dynamic";

/// A builder whose entity type is only known at runtime.
pub trait ErasedBuilder: Send + Sync {
    /// Entity type produced by this builder.
    fn entity(&self) -> TypeKey;

    fn builder_name(&self) -> &'static str;

    /// Module the builder was declared in ([`DYNAMIC_MODULE`] for synthesized ones).
    fn module_path(&self) -> &'static str;

    /// Build a boxed entity at the position described by `ctx`.
    ///
    /// With `randomize`, the nested randomization pass runs subject to the
    /// depth ceiling.
    fn build_boxed(
        &self,
        engine: &Arc<Engine>,
        ctx: &BuildContext,
        randomize: bool,
    ) -> Result<Box<dyn Any>, BuildError>;

    /// Build a randomized entity and return it as a value ready for a setter.
    fn random_value(&self, engine: &Arc<Engine>, ctx: &BuildContext) -> Result<Value, BuildError>;
}

impl fmt::Debug for dyn ErasedBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErasedBuilder")
            .field("builder", &self.builder_name())
            .field("module", &self.module_path())
            .field("entity", &self.entity())
            .finish()
    }
}

/// Erased handle over a concrete [`EntityBuilder`].
pub struct BuilderHandle<B> {
    module_path: &'static str,
    name: &'static str,
    _builder: PhantomData<fn() -> B>,
}

impl<B: EntityBuilder> BuilderHandle<B> {
    pub fn new(module_path: &'static str, name: &'static str) -> Self {
        Self {
            module_path,
            name,
            _builder: PhantomData,
        }
    }

    fn nested(&self, engine: &Arc<Engine>, ctx: &BuildContext, randomize: bool) -> Builder<B> {
        let builder = Builder::<B>::create_in(engine).with_context(ctx.clone());
        if randomize {
            builder.generic_with_random_props()
        } else {
            builder
        }
    }
}

impl<B: EntityBuilder> ErasedBuilder for BuilderHandle<B> {
    fn entity(&self) -> TypeKey {
        TypeKey::of::<B::Entity>()
    }

    fn builder_name(&self) -> &'static str {
        self.name
    }

    fn module_path(&self) -> &'static str {
        self.module_path
    }

    fn build_boxed(
        &self,
        engine: &Arc<Engine>,
        ctx: &BuildContext,
        randomize: bool,
    ) -> Result<Box<dyn Any>, BuildError> {
        let entity = self.nested(engine, ctx, randomize).build()?;
        Ok(Box::new(entity))
    }

    fn random_value(&self, engine: &Arc<Engine>, ctx: &BuildContext) -> Result<Value, BuildError> {
        let entity = self.nested(engine, ctx, true).build()?;
        serde_json::to_value(&entity).map_err(|e| BuildError::Assign {
            target: type_name::<B::Entity>().to_string(),
            message: e.to_string(),
        })
    }
}

/// Synthesis template stored in the `TypeInfo` of derived entities.
pub fn template<T: Entity>() -> Arc<dyn ErasedBuilder> {
    Arc::new(BuilderHandle::<Synthesized<T>>::new(
        DYNAMIC_MODULE,
        type_name::<Synthesized<T>>(),
    ))
}

/// Per-engine cache of dynamic builders.
#[derive(Default)]
pub struct Synthesizer {
    builders: Mutex<HashMap<TypeKey, Arc<dyn ErasedBuilder>>>,
    created: AtomicUsize,
}

impl Synthesizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the dynamic builder of `info`, creating it on first request.
    ///
    /// Creation happens under the cache lock, so concurrent callers for the
    /// same type observe a single synthesis. Failures are not cached.
    pub fn get_or_create(&self, info: &TypeInfo) -> Result<Arc<dyn ErasedBuilder>, SynthesisError> {
        let fail = |cause| SynthesisError {
            type_name: info.name(),
            cause,
        };
        let TypeKind::Complex(complex) = &info.kind else {
            return Err(fail(SynthesisCause::NotComplex));
        };

        let mut builders = self.builders.lock();
        if let Some(existing) = builders.get(&info.key) {
            return Ok(Arc::clone(existing));
        }
        if !complex.accessible {
            return Err(fail(SynthesisCause::Inaccessible));
        }
        let make = complex
            .synthesize
            .ok_or_else(|| fail(SynthesisCause::NoTemplate))?;

        let builder = make();
        self.created.fetch_add(1, Ordering::Relaxed);
        debug!(entity = info.name(), "synthesized dynamic builder");
        builders.insert(info.key, Arc::clone(&builder));
        Ok(builder)
    }

    /// Number of cached dynamic builders.
    pub fn len(&self) -> usize {
        self.builders.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// How many times a builder was actually synthesized.
    pub fn synthesized_count(&self) -> usize {
        self.created.load(Ordering::Relaxed)
    }
}

impl fmt::Debug for Synthesizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Synthesizer")
            .field("cached", &self.len())
            .finish()
    }
}
