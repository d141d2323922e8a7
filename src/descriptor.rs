//! Per-type property tables.
//!
//! An [`EntityDescriptor`] lists the properties of an entity as declared by
//! `#[derive(Entity)]` (or by hand). The engine resolves each property into a
//! [`SetterStrategy`] once and keeps the result for its lifetime.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::classify::{BuilderResolver, Classifier, SetterStrategy};
use crate::reflect::{Reflect, TypeInfo, TypeKey};

/// Stores a generated value into one field.
pub type Setter<T> = fn(&mut T, Value) -> Result<(), serde_json::Error>;

/// Attribute-directed replacement for a property's random strategy.
#[derive(Debug, Clone, PartialEq)]
pub enum OverrideKind {
    /// Never the zero value of the type.
    NonDefault,
    /// Distinct across every instance built by the engine.
    Unique,
    /// Drawn from a fixed allow-list, coerced to the property type.
    OneOf(Vec<Value>),
}

pub struct PropertyDescriptor<T> {
    pub name: &'static str,
    type_info: Option<fn() -> TypeInfo>,
    setter: Option<Setter<T>>,
}

impl<T> PropertyDescriptor<T> {
    pub fn writable(name: &'static str, type_info: fn() -> TypeInfo, setter: Setter<T>) -> Self {
        Self {
            name,
            type_info: Some(type_info),
            setter: Some(setter),
        }
    }

    /// A property that is never assigned.
    pub fn read_only(name: &'static str) -> Self {
        Self {
            name,
            type_info: None,
            setter: None,
        }
    }

    pub fn is_writable(&self) -> bool {
        self.setter.is_some()
    }

    pub fn type_info(&self) -> Option<TypeInfo> {
        self.type_info.map(|f| f())
    }

    pub fn setter(&self) -> Option<Setter<T>> {
        self.setter
    }
}

impl<T> fmt::Debug for PropertyDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyDescriptor")
            .field("name", &self.name)
            .field("writable", &self.is_writable())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropertyOverride {
    pub property: &'static str,
    pub kind: OverrideKind,
}

#[derive(Debug)]
pub struct EntityDescriptor<T> {
    properties: Vec<PropertyDescriptor<T>>,
    overrides: Vec<PropertyOverride>,
}

impl<T> Default for EntityDescriptor<T> {
    fn default() -> Self {
        Self {
            properties: Vec::new(),
            overrides: Vec::new(),
        }
    }
}

impl<T> EntityDescriptor<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn property(mut self, property: PropertyDescriptor<T>) -> Self {
        self.properties.push(property);
        self
    }

    pub fn with_override(mut self, property: &'static str, kind: OverrideKind) -> Self {
        self.overrides.push(PropertyOverride { property, kind });
        self
    }

    pub fn properties(&self) -> &[PropertyDescriptor<T>] {
        &self.properties
    }

    pub fn overrides(&self) -> &[PropertyOverride] {
        &self.overrides
    }

    /// The override declared for `property`; later declarations win.
    pub fn override_for(&self, property: &str) -> Option<&OverrideKind> {
        self.overrides
            .iter()
            .rev()
            .find(|o| o.property == property)
            .map(|o| &o.kind)
    }
}

/// A type the generic builder can construct and randomize.
///
/// Usually derived:
///
/// ```
/// use fixtura::Entity;
///
/// #[derive(Debug, Default, serde::Serialize, serde::Deserialize, Entity)]
/// pub struct Person {
///     pub name: String,
///     pub age: i32,
/// }
///
/// let person: Person = fixtura::build_random().unwrap();
/// assert!((0..=10).contains(&person.age));
/// ```
pub trait Entity: Reflect + Serialize + Sized {
    /// Parameterless constructor, `None` when the type has none.
    fn construct() -> Option<Self>;

    fn descriptor() -> EntityDescriptor<Self>;
}

/// A property after classification.
pub struct ResolvedProperty<T> {
    pub name: &'static str,
    pub strategy: SetterStrategy,
    pub setter: Option<Setter<T>>,
    pub type_info: Option<TypeInfo>,
    pub override_kind: Option<OverrideKind>,
}

impl<T> fmt::Debug for ResolvedProperty<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedProperty")
            .field("name", &self.name)
            .field("strategy", &self.strategy)
            .field("override", &self.override_kind)
            .finish()
    }
}

/// Every property of `T` with its resolved strategy, in declaration order.
#[derive(Debug)]
pub struct ResolvedEntity<T> {
    pub properties: Vec<ResolvedProperty<T>>,
}

impl<T: Entity> ResolvedEntity<T> {
    pub fn resolve(classifier: &Classifier, builders: &dyn BuilderResolver) -> Self {
        let descriptor = T::descriptor();
        let properties = descriptor
            .properties()
            .iter()
            .map(|property| {
                let type_info = property.type_info();
                let strategy = classifier.classify(
                    property.name,
                    property.is_writable(),
                    type_info.as_ref(),
                    builders,
                );
                ResolvedProperty {
                    name: property.name,
                    strategy,
                    setter: property.setter(),
                    type_info,
                    override_kind: descriptor.override_for(property.name).cloned(),
                }
            })
            .collect();
        Self { properties }
    }

    pub fn property(&self, name: &str) -> Option<&ResolvedProperty<T>> {
        self.properties.iter().find(|p| p.name == name)
    }
}

/// Resolved descriptors keyed by entity type. Entries are never invalidated.
#[derive(Default)]
pub struct DescriptorCache {
    entries: RwLock<HashMap<TypeKey, Arc<dyn Any + Send + Sync>>>,
}

impl DescriptorCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached descriptor of `T`, resolving it on a miss.
    ///
    /// Resolution runs without holding the lock, because classifying a
    /// property may call user rules that resolve other entities. Two callers
    /// racing on the same miss may both classify `T`; the first stored entry
    /// wins and both get it.
    pub fn get_or_resolve<T, F>(&self, resolve: F) -> Arc<ResolvedEntity<T>>
    where
        T: Entity,
        F: FnOnce() -> ResolvedEntity<T>,
    {
        let key = TypeKey::of::<T>();
        if let Some(hit) = Self::downcast::<T>(self.entries.read().get(&key)) {
            return hit;
        }

        let resolved: Arc<dyn Any + Send + Sync> = Arc::new(resolve());
        let mut entries = self.entries.write();
        let stored = entries.entry(key).or_insert_with(|| {
            debug!(entity = key.name(), "resolved entity descriptor");
            resolved
        });
        match Self::downcast::<T>(Some(stored)) {
            Some(entity) => entity,
            // Keys are type ids, so a stored entry always has the right type.
            None => Arc::new(ResolvedEntity { properties: Vec::new() }),
        }
    }

    pub fn contains<T: 'static>(&self) -> bool {
        self.entries.read().contains_key(&TypeKey::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn downcast<T: Entity>(
        entry: Option<&Arc<dyn Any + Send + Sync>>,
    ) -> Option<Arc<ResolvedEntity<T>>> {
        entry
            .cloned()
            .and_then(|e| e.downcast::<ResolvedEntity<T>>().ok())
    }
}
