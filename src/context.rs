use crate::reflect::TypeKey;

/// Position of a randomization call inside the object graph being built.
///
/// `level` counts nested complex hops from the top-level build, `path` lists
/// the entity types currently under construction, outermost first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildContext {
    pub level: usize,
    pub path: Vec<TypeKey>,
    /// Collection properties are only generated when this is set.
    pub fill_collections: bool,
}

impl BuildContext {
    /// Context of a top-level build.
    pub fn root() -> Self {
        Self::default()
    }

    pub fn at_level(level: usize) -> Self {
        Self {
            level,
            ..Self::default()
        }
    }

    /// Context handed to the properties of the entity at `self`.
    pub fn child(&self) -> Self {
        Self {
            level: self.level + 1,
            path: self.path.clone(),
            fill_collections: self.fill_collections,
        }
    }

    pub fn with_filled_collections(mut self, fill: bool) -> Self {
        self.fill_collections = fill;
        self
    }

    /// Record that an entity of type `key` is being built.
    pub fn enter(&mut self, key: TypeKey) {
        self.path.push(key);
    }

    pub fn occurrences(&self, key: TypeKey) -> usize {
        self.path.iter().filter(|k| **k == key).count()
    }

    pub fn contains(&self, key: TypeKey) -> bool {
        self.path.contains(&key)
    }
}
