//! Discovery of hand-written builders.
//!
//! `#[fixtura::custom_builder]` submits a [`BuilderRegistration`] to a
//! link-time registry read by [`InventorySource`]. Engines can add further
//! [`BuilderSource`]s, e.g. a [`StaticSource`] assembled in a test.

use std::any::type_name;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::builder::EntityBuilder;
use crate::error::LocateError;
use crate::reflect::{crate_of, TypeInfo, TypeKey};
use crate::synthesize::{BuilderHandle, ErasedBuilder};

/// A hand-written builder and the module that declares it.
#[derive(Clone, Copy)]
pub struct BuilderRegistration {
    pub module_path: &'static str,
    pub builder_name: &'static str,
    entity: fn() -> TypeKey,
    make: fn(&'static str, &'static str) -> Arc<dyn ErasedBuilder>,
}

impl BuilderRegistration {
    pub const fn of<B: EntityBuilder>(module_path: &'static str, builder_name: &'static str) -> Self {
        Self {
            module_path,
            builder_name,
            entity: entity_key::<B>,
            make: make_handle::<B>,
        }
    }

    /// Entity type the builder produces.
    pub fn entity(&self) -> TypeKey {
        (self.entity)()
    }

    pub fn instantiate(&self) -> Arc<dyn ErasedBuilder> {
        (self.make)(self.module_path, self.builder_name)
    }
}

impl fmt::Debug for BuilderRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuilderRegistration")
            .field("module_path", &self.module_path)
            .field("builder_name", &self.builder_name)
            .field("entity", &self.entity())
            .finish()
    }
}

fn entity_key<B: EntityBuilder>() -> TypeKey {
    TypeKey::of::<B::Entity>()
}

fn make_handle<B: EntityBuilder>(
    module_path: &'static str,
    builder_name: &'static str,
) -> Arc<dyn ErasedBuilder> {
    Arc::new(BuilderHandle::<B>::new(module_path, builder_name))
}

inventory::collect!(BuilderRegistration);

/// Something that can enumerate builder registrations.
pub trait BuilderSource: Send + Sync {
    fn name(&self) -> &str;

    fn registrations(&self) -> Result<Vec<BuilderRegistration>, LocateError>;
}

/// Builders registered through `#[fixtura::custom_builder]` anywhere in the
/// final binary.
#[derive(Debug, Default, Clone, Copy)]
pub struct InventorySource;

impl BuilderSource for InventorySource {
    fn name(&self) -> &str {
        "inventory"
    }

    fn registrations(&self) -> Result<Vec<BuilderRegistration>, LocateError> {
        Ok(inventory::iter::<BuilderRegistration>
            .into_iter()
            .copied()
            .collect())
    }
}

/// A fixed list of registrations.
#[derive(Debug, Clone)]
pub struct StaticSource {
    name: String,
    registrations: Vec<BuilderRegistration>,
}

impl StaticSource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            registrations: Vec::new(),
        }
    }

    /// Register `B` as if it were declared in `module_path`.
    pub fn with<B: EntityBuilder>(mut self, module_path: &'static str) -> Self {
        self.registrations
            .push(BuilderRegistration::of::<B>(module_path, type_name::<B>()));
        self
    }

    pub fn register(mut self, registration: BuilderRegistration) -> Self {
        self.registrations.push(registration);
        self
    }
}

impl BuilderSource for StaticSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn registrations(&self) -> Result<Vec<BuilderRegistration>, LocateError> {
        Ok(self.registrations.clone())
    }
}

/// Number of leading `::` segments two module paths share, ignoring their
/// crate segments.
///
/// ```
/// use fixtura::locator::namespace_proximity;
///
/// assert_eq!(namespace_proximity("app::shop::catalog", "fixtures::shop::catalog::builders"), 2);
/// assert_eq!(namespace_proximity("app::shop::catalog", "other::billing"), 0);
/// ```
pub fn namespace_proximity(target: &str, candidate: &str) -> usize {
    target
        .split("::")
        .skip(1)
        .zip(candidate.split("::").skip(1))
        .take_while(|(a, b)| a == b)
        .count()
}

/// Finds the hand-written builder of an entity type.
pub struct BuilderLocator {
    sources: Vec<Box<dyn BuilderSource>>,
    cache: RwLock<HashMap<TypeKey, Option<Arc<dyn ErasedBuilder>>>>,
}

impl BuilderLocator {
    pub fn new(sources: Vec<Box<dyn BuilderSource>>) -> Self {
        Self {
            sources,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// The builder for `info`, or `None` when no source declares one.
    ///
    /// Builders from the entity's own crate take precedence. Among the
    /// remaining candidates the one whose module path is closest to the
    /// entity's wins, the first registered on a tie. Results, including
    /// absence, are cached.
    pub fn find_existing_builder(&self, info: &TypeInfo) -> Option<Arc<dyn ErasedBuilder>> {
        if let Some(hit) = self.cache.read().get(&info.key) {
            return hit.clone();
        }
        let found = self.search(info);
        self.cache
            .write()
            .entry(info.key)
            .or_insert(found)
            .clone()
    }

    fn search(&self, info: &TypeInfo) -> Option<Arc<dyn ErasedBuilder>> {
        let mut candidates = Vec::new();
        for source in &self.sources {
            match source.registrations() {
                Ok(registrations) => candidates.extend(
                    registrations
                        .into_iter()
                        .filter(|r| r.entity() == info.key),
                ),
                Err(error) => warn!(source = source.name(), %error, "skipping builder source"),
            }
        }

        let target_crate = info.crate_name();
        let (local, foreign): (Vec<_>, Vec<_>) = candidates
            .into_iter()
            .partition(|r| crate_of(r.module_path) == target_crate);
        let pool = if local.is_empty() { foreign } else { local };

        let chosen = closest(info.module_path, &pool)?;
        debug!(
            entity = info.name(),
            builder = chosen.builder_name,
            module = chosen.module_path,
            "located builder"
        );
        Some(chosen.instantiate())
    }

    /// Number of entity types with a cached lookup result.
    pub fn cached(&self) -> usize {
        self.cache.read().len()
    }
}

fn closest<'a>(
    target: &str,
    candidates: &'a [BuilderRegistration],
) -> Option<&'a BuilderRegistration> {
    let mut best: Option<(&BuilderRegistration, usize)> = None;
    for candidate in candidates {
        let score = namespace_proximity(target, candidate.module_path);
        if best.map_or(true, |(_, top)| score > top) {
            best = Some((candidate, score));
        }
    }
    best.map(|(r, _)| r)
}

impl fmt::Debug for BuilderLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sources: Vec<&str> = self.sources.iter().map(|s| s.name()).collect();
        f.debug_struct("BuilderLocator")
            .field("sources", &sources)
            .field("cached", &self.cached())
            .finish()
    }
}
