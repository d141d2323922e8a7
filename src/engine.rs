//! The engine: shared caches, configuration and the RNG.
//!
//! An [`Engine`] owns every cache the builders need (resolved descriptors,
//! located and synthesized builders, unique-value history). Caches fill
//! lazily and live as long as the engine. Most code uses the lazily created
//! [`Engine::global`]; tests that need isolation or a fixed seed make their
//! own.

use std::any::{type_name, Any};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use once_cell::sync::OnceCell;
use parking_lot::{Mutex, RwLock};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::builder::{Builder, DynamicBuilder, PassScope};
use crate::classify::{BuilderResolver, Classifier, SetterRule, SetterStrategy};
use crate::config::{CyclePolicy, EngineConfig};
use crate::context::BuildContext;
use crate::descriptor::{DescriptorCache, Entity, ResolvedEntity};
use crate::error::{BuildError, ConfigError, GenerateError, SynthesisError};
use crate::locator::{BuilderLocator, BuilderSource, InventorySource};
use crate::overrides::{self, OverrideTarget, UniqueRegistry};
use crate::primitives;
use crate::reflect::{Reflect, TypeInfo, TypeKey};
use crate::synthesize::{ErasedBuilder, Synthesizer};

static GLOBAL: OnceCell<Arc<Engine>> = OnceCell::new();

type DefaultMod<T> = Arc<dyn Fn(&mut T) + Send + Sync>;

/// Mutations applied to every entity of a type before the builder's own.
#[derive(Default)]
struct DefaultMods {
    by_type: RwLock<HashMap<TypeKey, Box<dyn Any + Send + Sync>>>,
}

impl DefaultMods {
    fn push<T: 'static>(&self, mutate: DefaultMod<T>) {
        let mut by_type = self.by_type.write();
        let entry = by_type
            .entry(TypeKey::of::<T>())
            .or_insert_with(|| Box::new(Vec::<DefaultMod<T>>::new()));
        if let Some(list) = entry.downcast_mut::<Vec<DefaultMod<T>>>() {
            list.push(mutate);
        }
    }

    // Cloned out so a mutation may itself register defaults.
    fn get<T: 'static>(&self) -> Vec<DefaultMod<T>> {
        self.by_type
            .read()
            .get(&TypeKey::of::<T>())
            .and_then(|entry| entry.downcast_ref::<Vec<DefaultMod<T>>>())
            .cloned()
            .unwrap_or_default()
    }
}

pub struct Engine {
    config: EngineConfig,
    max_depth: AtomicUsize,
    rng: Mutex<StdRng>,
    classifier: Classifier,
    locator: BuilderLocator,
    synthesizer: Synthesizer,
    descriptors: DescriptorCache,
    defaults: DefaultMods,
    unique: UniqueRegistry,
}

/// Assembles an [`Engine`] with extra builder sources or classification rules.
pub struct EngineBuilder {
    config: EngineConfig,
    sources: Vec<Box<dyn BuilderSource>>,
    rules: Vec<Box<dyn SetterRule>>,
    inventory: bool,
}

impl EngineBuilder {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            sources: Vec::new(),
            rules: Vec::new(),
            inventory: true,
        }
    }

    /// Search `source` for hand-written builders, after the inventory.
    pub fn source(mut self, source: impl BuilderSource + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    /// Try `rule` before the standard chain. Rules added later run first.
    pub fn rule(mut self, rule: impl SetterRule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    /// Ignore builders registered with `#[fixtura::custom_builder]`.
    pub fn without_inventory(mut self) -> Self {
        self.inventory = false;
        self
    }

    pub fn build(self) -> Result<Arc<Engine>, ConfigError> {
        self.config.validate()?;
        Ok(self.assemble())
    }

    fn assemble(self) -> Arc<Engine> {
        let mut sources: Vec<Box<dyn BuilderSource>> = Vec::new();
        if self.inventory {
            sources.push(Box::new(InventorySource));
        }
        sources.extend(self.sources);

        let mut classifier = Classifier::standard();
        for rule in self.rules {
            classifier.prepend(rule);
        }

        let rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        debug!(
            max_depth = self.config.max_depth,
            seeded = self.config.seed.is_some(),
            "engine created"
        );
        Arc::new(Engine {
            max_depth: AtomicUsize::new(self.config.max_depth),
            rng: Mutex::new(rng),
            classifier,
            locator: BuilderLocator::new(sources),
            synthesizer: Synthesizer::new(),
            descriptors: DescriptorCache::new(),
            defaults: DefaultMods::default(),
            unique: UniqueRegistry::new(),
            config: self.config,
        })
    }
}

impl Engine {
    pub fn new(config: EngineConfig) -> Result<Arc<Self>, ConfigError> {
        EngineBuilder::new(config).build()
    }

    pub fn builder(config: EngineConfig) -> EngineBuilder {
        EngineBuilder::new(config)
    }

    /// The process-wide engine, created on first use from `FIXTURA_*`
    /// environment variables (see [`EngineConfig::from_env`]).
    pub fn global() -> &'static Arc<Engine> {
        GLOBAL.get_or_init(|| {
            let config = EngineConfig::from_env().unwrap_or_else(|error| {
                warn!(%error, "invalid environment configuration, using defaults");
                EngineConfig::default()
            });
            match Engine::new(config) {
                Ok(engine) => engine,
                Err(error) => {
                    warn!(%error, "invalid engine configuration, using defaults");
                    EngineBuilder::new(EngineConfig::default()).assemble()
                }
            }
        })
    }

    /// Install the global engine. Fails once the global engine exists.
    pub fn install_global(config: EngineConfig) -> Result<&'static Arc<Engine>, ConfigError> {
        let engine = Engine::new(config)?;
        GLOBAL
            .set(engine)
            .map_err(|_| ConfigError::AlreadyInitialized)?;
        GLOBAL.get().ok_or(ConfigError::AlreadyInitialized)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth.load(Ordering::Relaxed)
    }

    /// Change the depth ceiling; applies to builds started afterwards.
    pub fn set_max_depth(&self, max_depth: usize) {
        self.max_depth.store(max_depth, Ordering::Relaxed);
    }

    pub fn with_rng<R>(&self, f: impl FnOnce(&mut StdRng) -> R) -> R {
        f(&mut self.rng.lock())
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn locator(&self) -> &BuilderLocator {
        &self.locator
    }

    pub fn synthesizer(&self) -> &Synthesizer {
        &self.synthesizer
    }

    pub fn descriptors(&self) -> &DescriptorCache {
        &self.descriptors
    }

    pub fn unique(&self) -> &UniqueRegistry {
        &self.unique
    }

    /// Register a mutation run on every `T` this engine builds, before the
    /// builder's queued mutations.
    pub fn register_default<T, F>(&self, mutate: F)
    where
        T: Entity,
        F: Fn(&mut T) + Send + Sync + 'static,
    {
        self.defaults.push::<T>(Arc::new(mutate));
    }

    pub(crate) fn apply_defaults<T: Entity>(&self, entity: &mut T) {
        for mutate in self.defaults.get::<T>() {
            mutate(entity);
        }
    }

    /// Whether a nested entity of type `key` at `ctx` is still randomized.
    ///
    /// Nothing past `max_depth` is. Under [`CyclePolicy::DepthOnly`] the type
    /// must also occur at most `max_depth` times on the path, so it stops
    /// once it occurs more often. A regular build enters one type per level,
    /// so the level check fires first; the path check only matters for a
    /// builder placed with [`Builder::with_context`].
    pub fn should_descend(&self, ctx: &BuildContext, key: TypeKey) -> bool {
        let max_depth = self.max_depth();
        if ctx.level > max_depth {
            return false;
        }
        match self.config.cycle_policy {
            CyclePolicy::DepthOnly => ctx.occurrences(key) <= max_depth,
            CyclePolicy::StopOnRevisit => !ctx.contains(key),
        }
    }

    /// Hand-written builder of `info` if one exists, else its dynamic builder.
    pub fn builder_for(&self, info: &TypeInfo) -> Result<Arc<dyn ErasedBuilder>, SynthesisError> {
        if let Some(found) = self.locator.find_existing_builder(info) {
            return Ok(found);
        }
        self.synthesizer.get_or_create(info)
    }

    pub fn find_existing_builder(&self, info: &TypeInfo) -> Option<Arc<dyn ErasedBuilder>> {
        self.locator.find_existing_builder(info)
    }

    /// Resolved property strategies of `T`, computed once.
    pub fn resolved<T: Entity>(&self) -> Arc<ResolvedEntity<T>> {
        self.descriptors
            .get_or_resolve(|| ResolvedEntity::resolve(&self.classifier, self))
    }

    /// Classify a free-standing type as if it were a writable property.
    pub fn strategy_for(&self, property: &str, info: &TypeInfo) -> SetterStrategy {
        self.classifier.classify(property, true, Some(info), self)
    }

    /// Fill the properties of `entity` in `scope`.
    ///
    /// A property whose generation or assignment fails is logged and left
    /// unset. Only unique-value exhaustion aborts the pass.
    pub fn randomize<T: Entity>(
        self: &Arc<Self>,
        entity: &mut T,
        ctx: &BuildContext,
        scope: PassScope,
    ) -> Result<(), BuildError> {
        let resolved = self.resolved::<T>();
        let child = ctx.child();
        let entity_key = TypeKey::of::<T>();

        for property in &resolved.properties {
            if scope == PassScope::CollectionsOnly && !property.strategy.is_collection() {
                continue;
            }
            let Some(setter) = property.setter else {
                continue;
            };

            let produced = match &property.override_kind {
                Some(kind) => {
                    let target = OverrideTarget {
                        entity: entity_key,
                        property: property.name,
                        strategy: &property.strategy,
                        type_info: property.type_info.as_ref(),
                    };
                    overrides::generate(self, &child, target, kind)
                }
                None => property.strategy.generate(self, &child, property.name),
            };

            match produced {
                Ok(Some(value)) => {
                    if let Err(error) = setter(entity, value) {
                        warn!(
                            entity = entity_key.name(),
                            property = property.name,
                            %error,
                            "generated value could not be assigned"
                        );
                    }
                }
                Ok(None) => trace!(
                    entity = entity_key.name(),
                    property = property.name,
                    "property left unset"
                ),
                Err(error) if error.is_fatal() => return Err(error),
                Err(error) => warn!(
                    entity = entity_key.name(),
                    property = property.name,
                    %error,
                    "property randomization failed"
                ),
            }
        }
        Ok(())
    }

    /// A `T` with no randomization.
    pub fn build_default<T: Entity>(self: &Arc<Self>) -> Result<T, BuildError> {
        match self.find_existing_builder(&T::type_info()) {
            Some(builder) => downcast(builder.build_boxed(self, &BuildContext::root(), false)?),
            None => DynamicBuilder::<T>::create_in(self).build(),
        }
    }

    /// A `T` with every writable property randomized.
    pub fn build_random<T: Entity>(self: &Arc<Self>) -> Result<T, BuildError> {
        match self.find_existing_builder(&T::type_info()) {
            Some(builder) => downcast(builder.build_boxed(self, &BuildContext::root(), true)?),
            None => DynamicBuilder::<T>::create_in(self).with_random_props().build(),
        }
    }

    pub fn build_random_many<T: Entity>(self: &Arc<Self>, count: usize) -> Result<Vec<T>, BuildError> {
        (0..count).map(|_| self.build_random()).collect()
    }

    /// A dynamic builder for `T` on this engine.
    pub fn dynamic<T: Entity>(self: &Arc<Self>) -> DynamicBuilder<T> {
        Builder::create_in(self)
    }

    /// A random value of the type described by `info`.
    ///
    /// Collections are filled. Complex types require a builder: when none can
    /// be found or synthesized the error is returned.
    pub fn random_value(self: &Arc<Self>, info: &TypeInfo) -> Result<Value, BuildError> {
        let ctx = BuildContext::root().with_filled_collections(true);
        if info.is_complex() {
            let builder = self.builder_for(info)?;
            return builder.random_value(self, &ctx);
        }
        self.strategy_for("", info)
            .generate(self, &ctx, "")?
            .ok_or(BuildError::NoValue {
                type_name: info.name(),
            })
    }

    pub fn get_random<T: Reflect + DeserializeOwned>(self: &Arc<Self>) -> Result<T, BuildError> {
        let value = self.random_value(&T::type_info())?;
        serde_json::from_value(value).map_err(|e| BuildError::Assign {
            target: type_name::<T>().to_string(),
            message: e.to_string(),
        })
    }

    /// A random member name of the enum described by `info`.
    pub fn random_enum(&self, info: &TypeInfo) -> Result<&'static str, GenerateError> {
        self.with_rng(|rng| primitives::enum_member(rng, info))
    }
}

impl BuilderResolver for Engine {
    fn resolve_builder(&self, info: &TypeInfo) -> Result<Arc<dyn ErasedBuilder>, SynthesisError> {
        self.builder_for(info)
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("max_depth", &self.max_depth())
            .field("classifier", &self.classifier)
            .field("locator", &self.locator)
            .field("synthesizer", &self.synthesizer)
            .finish()
    }
}

fn downcast<T: 'static>(boxed: Box<dyn Any>) -> Result<T, BuildError> {
    boxed
        .downcast::<T>()
        .map(|entity| *entity)
        .map_err(|_| BuildError::TypeMismatch {
            expected: type_name::<T>(),
        })
}
