use serde_json::Value;
use thiserror::Error;

/// Failure of a primitive value generator.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GenerateError {
    /// Enum generation was requested for a type that is not a unit-variant enum.
    #[error("`{type_name}` is not an enum")]
    NotAnEnum { type_name: &'static str },

    /// The enum declares no variants to pick from.
    #[error("enum `{type_name}` declares no variants")]
    NoVariants { type_name: &'static str },

    /// Inclusive range with `min > max` or a non-finite bound.
    #[error("invalid range: min {min}, max {max}")]
    InvalidRange { min: String, max: String },

    /// An allow-list override without any values.
    #[error("allow-list for property `{property}` is empty")]
    EmptyAllowList { property: String },

    /// An allow-listed value that cannot be converted to the property type.
    #[error("value {value} cannot be coerced to `{type_name}`")]
    Coercion { value: Value, type_name: &'static str },

    /// A generated value could not be read back as the requested type.
    #[error("generated value is not a valid `{type_name}`: {message}")]
    Deserialize {
        type_name: &'static str,
        message: String,
    },
}

/// Why a dynamic builder could not be synthesized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SynthesisCause {
    #[error("the type is not public")]
    Inaccessible,
    #[error("the type provides no builder template")]
    NoTemplate,
    #[error("the type is not a complex entity")]
    NotComplex,
}

/// A dynamic builder could not be created for `type_name`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "unable to create dynamic builder for `{type_name}`: {cause}; \
     make the type `pub` or supply a hand-written builder with #[fixtura::custom_builder]"
)]
pub struct SynthesisError {
    pub type_name: &'static str,
    pub cause: SynthesisCause,
}

/// A builder source could not enumerate its registrations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("builder source `{module}` failed to enumerate builders: {message}")]
pub struct LocateError {
    pub module: String,
    pub message: String,
}

/// Errors surfaced by builders and the engine entry points.
#[derive(Debug, Clone, Error)]
pub enum BuildError {
    /// The entity has no parameterless constructor and the builder supplied none.
    #[error(
        "builder `{builder}` cannot create an instance of `{entity}`: \
         the type has no parameterless constructor; override `construct_entity`"
    )]
    Construction {
        builder: &'static str,
        entity: &'static str,
    },

    #[error(transparent)]
    Synthesis(#[from] SynthesisError),

    /// A unique-value generator ran out of attempts.
    #[error(
        "cannot get another different value for `{entity}.{property}` \
         after {attempts} attempts (last value: {value})"
    )]
    UniqueExhausted {
        entity: &'static str,
        property: &'static str,
        attempts: usize,
        value: Value,
    },

    #[error(transparent)]
    Generate(#[from] GenerateError),

    /// A generated value could not be stored.
    #[error("cannot assign `{target}`: {message}")]
    Assign { target: String, message: String },

    /// Nothing could be generated for the requested type.
    #[error("no value could be generated for `{type_name}`")]
    NoValue { type_name: &'static str },

    /// A type-erased builder produced an entity of an unexpected type.
    #[error("builder produced a value that is not a `{expected}`")]
    TypeMismatch { expected: &'static str },
}

impl BuildError {
    /// Whether the error aborts a randomization pass instead of skipping the property.
    pub fn is_fatal(&self) -> bool {
        matches!(self, BuildError::UniqueExhausted { .. })
    }
}

/// Configuration loading and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Load(#[from] ::config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),

    /// The global engine was already initialized.
    #[error("the global engine is already initialized")]
    AlreadyInitialized,
}
