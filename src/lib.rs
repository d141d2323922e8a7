//! # fixtura: random test fixtures for Rust
//!
//! `fixtura` builds instances of your types filled with random data, so a test
//! only spells out the values it actually cares about.
//!
//! ## Quick Start
//!
//! ```rust
//! use fixtura::prelude::*;
//!
//! #[derive(Debug, Default, serde::Serialize, serde::Deserialize, Entity)]
//! pub struct Person {
//!     pub name: String,
//!     pub age: i32,
//!     pub email: String,
//!     pub tags: Vec<String>,
//! }
//!
//! let person: Person = fixtura::build_random().unwrap();
//! assert!((8..=18).contains(&person.name.len()));
//! assert!((0..=10).contains(&person.age));
//! assert!(person.email.contains('@'));
//!
//! // Overrides are just more queued mutations.
//! let named = DynamicBuilder::<Person>::create()
//!     .with_random_props()
//!     .with_filled_collections()
//!     .with_prop(|p| p.name = "Alex".into())
//!     .build()
//!     .unwrap();
//! assert_eq!(named.name, "Alex");
//! assert!((1..=3).contains(&named.tags.len()));
//! ```
//!
//! Nested entities are built recursively, through a hand-written builder when
//! one is registered with [`custom_builder`] and through a synthesized one
//! otherwise. The recursion stops at [`Engine::max_depth`] (10 by default).

pub mod builder;
pub mod classify;
pub mod config;
pub mod context;
pub mod descriptor;
pub mod engine;
pub mod error;
pub mod locator;
pub mod overrides;
pub mod primitives;
pub mod reflect;
pub mod synthesize;

// Used by the derive macros.
#[doc(hidden)]
pub use inventory;
#[doc(hidden)]
pub use serde_json;

#[cfg(feature = "derive")]
pub use fixtura_derive::{custom_builder, Entity, Reflect};

pub use builder::{Builder, DynamicBuilder, EntityBuilder, PassScope, RandomPass, Synthesized};
pub use self::config::{CyclePolicy, EngineConfig};
pub use context::BuildContext;
pub use descriptor::{Entity, EntityDescriptor, OverrideKind, PropertyDescriptor};
pub use engine::{Engine, EngineBuilder};
pub use error::{BuildError, ConfigError, GenerateError, LocateError, SynthesisError};
pub use reflect::{Reflect, TypeInfo, TypeKey};

use serde::de::DeserializeOwned;

/// Configure the global engine before its first use.
///
/// ```
/// fixtura::configure(fixtura::EngineConfig::default().with_max_depth(3)).unwrap();
/// assert_eq!(fixtura::Engine::global().max_depth(), 3);
/// assert!(fixtura::configure(fixtura::EngineConfig::default()).is_err());
/// ```
pub fn configure(config: EngineConfig) -> Result<(), ConfigError> {
    Engine::install_global(config).map(|_| ())
}

/// Change the depth ceiling of the global engine.
pub fn set_max_depth(max_depth: usize) {
    Engine::global().set_max_depth(max_depth);
}

/// A `T` as constructed, with only default mutations applied.
pub fn build_default<T: Entity>() -> Result<T, BuildError> {
    Engine::global().build_default()
}

/// A `T` with every writable property randomized.
pub fn build_random<T: Entity>() -> Result<T, BuildError> {
    Engine::global().build_random()
}

pub fn build_random_many<T: Entity>(count: usize) -> Result<Vec<T>, BuildError> {
    Engine::global().build_random_many(count)
}

/// A random value of any supported type: scalars, enums, collections
/// (always filled) and entities.
///
/// ```
/// let n: u8 = fixtura::get_random().unwrap();
/// assert!(n <= 10);
/// let words: Vec<String> = fixtura::get_random().unwrap();
/// assert!(!words.is_empty());
/// ```
pub fn get_random<T: Reflect + DeserializeOwned>() -> Result<T, BuildError> {
    Engine::global().get_random()
}

/// [`get_random`] for a type only known at runtime.
pub fn get_random_value(info: &TypeInfo) -> Result<serde_json::Value, BuildError> {
    Engine::global().random_value(info)
}

pub mod prelude {
    pub use crate::builder::{Builder, DynamicBuilder, EntityBuilder};
    pub use crate::config::{CyclePolicy, EngineConfig};
    pub use crate::descriptor::Entity;
    pub use crate::engine::Engine;
    pub use crate::error::BuildError;
    pub use crate::reflect::Reflect;
    #[cfg(feature = "derive")]
    pub use fixtura_derive::{custom_builder, Entity, Reflect};
}
