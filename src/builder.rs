//! The generic builder.
//!
//! A [`Builder`] holds an ordered queue of mutations. [`Builder::build`]
//! constructs a fresh entity, applies the engine's default mutations for the
//! type, then the queued ones in insertion order, and hands the entity back.
//! Randomization is just another queued mutation, so explicit overrides can
//! come before or after it.
//!
//! ```
//! use fixtura::{DynamicBuilder, Entity};
//!
//! #[derive(Debug, Default, serde::Serialize, serde::Deserialize, Entity)]
//! pub struct Person {
//!     pub name: String,
//!     pub age: i32,
//!     pub tags: Vec<String>,
//! }
//!
//! let person = DynamicBuilder::<Person>::create()
//!     .with_random_props()
//!     .with_prop(|p| p.age = 42)
//!     .build()
//!     .unwrap();
//! assert_eq!(person.age, 42);
//! assert!(person.tags.is_empty());
//! ```

use std::any::type_name;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use tracing::trace;

use crate::context::BuildContext;
use crate::descriptor::Entity;
use crate::engine::Engine;
use crate::error::BuildError;
use crate::reflect::TypeKey;

/// Which properties a randomization pass touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassScope {
    All,
    CollectionsOnly,
}

/// A randomization pass as seen by [`EntityBuilder::set_random_props`].
pub struct RandomPass<'a> {
    engine: &'a Arc<Engine>,
    ctx: &'a BuildContext,
    scope: PassScope,
}

impl<'a> RandomPass<'a> {
    pub fn new(engine: &'a Arc<Engine>, ctx: &'a BuildContext, scope: PassScope) -> Self {
        Self { engine, ctx, scope }
    }

    /// Run the generic pass on `entity`.
    pub fn apply<T: Entity>(&self, entity: &mut T) -> Result<(), BuildError> {
        self.engine.randomize(entity, self.ctx, self.scope)
    }

    pub fn engine(&self) -> &Arc<Engine> {
        self.engine
    }

    /// Context of the entity being randomized.
    pub fn context(&self) -> &BuildContext {
        self.ctx
    }

    pub fn scope(&self) -> PassScope {
        self.scope
    }
}

/// Builder definition for one entity type.
///
/// Hand-written builders implement this trait and are marked with
/// `#[fixtura::custom_builder]`, which makes the engine pick them up for
/// nested properties and the typed entry points:
///
/// ```
/// use fixtura::{Builder, Entity, EntityBuilder};
///
/// #[derive(Debug, Default, serde::Serialize, serde::Deserialize, Entity)]
/// pub struct Account {
///     #[fixture(skip)]
///     pub role: String,
///     pub login: String,
/// }
///
/// #[derive(Default)]
/// pub struct AccountBuilder;
///
/// #[fixtura::custom_builder]
/// impl EntityBuilder for AccountBuilder {
///     type Entity = Account;
///
///     fn customize(builder: Builder<Self>) -> Builder<Self> {
///         builder.with_prop(|a| a.role = "admin".into())
///     }
/// }
///
/// let account: Account = fixtura::build_random().unwrap();
/// assert_eq!(account.role, "admin");
/// ```
pub trait EntityBuilder: Default + Send + Sync + 'static {
    type Entity: Entity;

    /// Create the instance the queued mutations run against.
    fn construct_entity(&self) -> Result<Self::Entity, BuildError> {
        Self::Entity::construct().ok_or(BuildError::Construction {
            builder: type_name::<Self>(),
            entity: type_name::<Self::Entity>(),
        })
    }

    /// Adjust every freshly created builder, e.g. queue fixed properties.
    fn customize(builder: Builder<Self>) -> Builder<Self> {
        builder
    }

    /// The randomization pass queued by [`Builder::with_random_props`].
    fn set_random_props(
        &self,
        entity: &mut Self::Entity,
        pass: &RandomPass<'_>,
    ) -> Result<(), BuildError> {
        pass.apply(entity)
    }
}

enum Mutation<T> {
    Prop(Box<dyn FnOnce(&mut T) + Send>),
    Randomize(PassScope),
}

/// Single-use builder: `build` consumes it.
pub struct Builder<B: EntityBuilder> {
    hooks: B,
    engine: Arc<Engine>,
    ctx: BuildContext,
    mods: Vec<Mutation<B::Entity>>,
}

impl<B: EntityBuilder> Builder<B> {
    /// New builder on the global engine.
    pub fn create() -> Self {
        Self::create_in(Engine::global())
    }

    pub fn create_in(engine: &Arc<Engine>) -> Self {
        let builder = Self {
            hooks: B::default(),
            engine: Arc::clone(engine),
            ctx: BuildContext::root(),
            mods: Vec::new(),
        };
        B::customize(builder)
    }

    pub fn with_prop<F>(mut self, mutate: F) -> Self
    where
        F: FnOnce(&mut B::Entity) + Send + 'static,
    {
        self.mods.push(Mutation::Prop(Box::new(mutate)));
        self
    }

    /// Queue a randomization pass over every writable property.
    pub fn with_random_props(mut self) -> Self {
        self.mods.push(Mutation::Randomize(PassScope::All));
        self
    }

    /// Queue a pass that fills collection properties, and let every pass of
    /// this build (including nested entities) fill collections too.
    pub fn with_filled_collections(mut self) -> Self {
        self.ctx.fill_collections = true;
        self.mods.push(Mutation::Randomize(PassScope::CollectionsOnly));
        self
    }

    /// Place the builder at nesting `level`.
    pub fn with_build_level(mut self, level: usize) -> Self {
        self.ctx.level = level;
        self
    }

    /// Place the builder at an arbitrary position of an ongoing build.
    pub fn with_context(mut self, ctx: BuildContext) -> Self {
        self.ctx = ctx;
        self
    }

    /// Queue randomization as a nested builder would: nothing is queued when
    /// the current position is past the depth ceiling or the entity type
    /// already recurs too often on the path.
    pub fn generic_with_random_props(self) -> Self {
        let key = TypeKey::of::<B::Entity>();
        if self.engine.should_descend(&self.ctx, key) {
            self.with_random_props()
        } else {
            trace!(
                entity = key.name(),
                level = self.ctx.level,
                "depth ceiling reached, randomization skipped"
            );
            self
        }
    }

    pub fn context(&self) -> &BuildContext {
        &self.ctx
    }

    pub fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }

    pub fn build(self) -> Result<B::Entity, BuildError> {
        let Builder {
            hooks,
            engine,
            mut ctx,
            mods,
        } = self;
        ctx.enter(TypeKey::of::<B::Entity>());

        let mut entity = hooks.construct_entity()?;
        engine.apply_defaults(&mut entity);
        for mutation in mods {
            match mutation {
                Mutation::Prop(mutate) => mutate(&mut entity),
                Mutation::Randomize(scope) => {
                    let pass = RandomPass::new(&engine, &ctx, scope);
                    hooks.set_random_props(&mut entity, &pass)?;
                }
            }
        }
        Ok(entity)
    }

    /// `create().build()`.
    pub fn build_default() -> Result<B::Entity, BuildError> {
        Self::create().build()
    }

    /// `create().with_random_props().build()`.
    pub fn build_random() -> Result<B::Entity, BuildError> {
        Self::create().with_random_props().build()
    }
}

impl<B: EntityBuilder> fmt::Debug for Builder<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builder")
            .field("builder", &type_name::<B>())
            .field("ctx", &self.ctx)
            .field("queued", &self.mods.len())
            .finish()
    }
}

/// The builder used for entities without a hand-written one.
pub struct Synthesized<T>(PhantomData<fn() -> T>);

impl<T> Default for Synthesized<T> {
    fn default() -> Self {
        Self(PhantomData)
    }
}

impl<T: Entity> EntityBuilder for Synthesized<T> {
    type Entity = T;
}

pub type DynamicBuilder<T> = Builder<Synthesized<T>>;
