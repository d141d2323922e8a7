//! Engine configuration.
//!
//! ```
//! use fixtura::config::{CyclePolicy, EngineConfig};
//!
//! let config = EngineConfig::from_toml_str(r#"
//! max_depth = 4
//! cycle_policy = "stop_on_revisit"
//! "#).unwrap();
//! assert_eq!(config.max_depth, 4);
//! assert_eq!(config.cycle_policy, CyclePolicy::StopOnRevisit);
//! assert_eq!(config.unique_attempts, 1000);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default ceiling for nested randomization.
pub const DEFAULT_MAX_DEPTH: usize = 10;

/// Default attempt budget of unique-value generators.
pub const DEFAULT_UNIQUE_ATTEMPTS: usize = 1000;

/// How nested randomization guards against cyclic object graphs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CyclePolicy {
    /// Only the depth ceiling bounds the traversal. A type that refers to
    /// itself is expanded until `max_depth` is reached.
    #[default]
    DepthOnly,
    /// Additionally, an entity type already being built higher up the chain
    /// is not expanded again (A -> B -> A stops at B).
    StopOnRevisit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum nesting level that is still randomized.
    pub max_depth: usize,
    /// Minimum number of items put into a filled collection.
    pub collection_min: usize,
    /// Maximum number of items put into a filled collection.
    pub collection_max: usize,
    pub unique_attempts: usize,
    pub cycle_policy: CyclePolicy,
    /// Seed for a reproducible engine; entropy when absent.
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            collection_min: 1,
            collection_max: 3,
            unique_attempts: DEFAULT_UNIQUE_ATTEMPTS,
            cycle_policy: CyclePolicy::DepthOnly,
            seed: None,
        }
    }
}

impl EngineConfig {
    /// Prefix of the environment variables read by [`from_env`](Self::from_env),
    /// e.g. `FIXTURA_MAX_DEPTH`.
    pub const ENV_PREFIX: &'static str = "FIXTURA";

    /// Defaults overridden by `FIXTURA_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let source = ::config::Config::builder()
            .add_source(::config::Environment::with_prefix(Self::ENV_PREFIX).try_parsing(true))
            .build()?;
        Self::from_config(&source)
    }

    /// Parse a TOML document; missing keys keep their defaults.
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        let source = ::config::Config::builder()
            .add_source(::config::File::from_str(toml, ::config::FileFormat::Toml))
            .build()?;
        Self::from_config(&source)
    }

    /// Deserialize from an already assembled `config::Config`.
    pub fn from_config(source: &::config::Config) -> Result<Self, ConfigError> {
        let parsed: EngineConfig = source.clone().try_deserialize()?;
        parsed.validate()?;
        Ok(parsed)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.collection_min > self.collection_max {
            return Err(ConfigError::Invalid(format!(
                "collection_min ({}) is greater than collection_max ({})",
                self.collection_min, self.collection_max
            )));
        }
        if self.unique_attempts == 0 {
            return Err(ConfigError::Invalid(
                "unique_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_collection_bounds(mut self, min: usize, max: usize) -> Self {
        self.collection_min = min;
        self.collection_max = max;
        self
    }

    pub fn with_unique_attempts(mut self, attempts: usize) -> Self {
        self.unique_attempts = attempts;
        self
    }

    pub fn with_cycle_policy(mut self, policy: CyclePolicy) -> Self {
        self.cycle_policy = policy;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}
