//! # Definition Error Types
//!
//! All errors that can occur while loading and registering definitions.
//! These only ever happen during startup.

use thiserror::Error;

/// Errors that can occur while building registries.
#[derive(Error, Debug)]
pub enum DefinitionError {
    /// Two definitions in one collection share an id string.
    #[error("duplicate definition '{id}' in {registry}")]
    DuplicateId {
        /// Collection name.
        registry: &'static str,
        /// The repeated id string.
        id: String,
    },

    /// A collection has no members, so nothing can be referenced.
    #[error("registry {0} is empty")]
    EmptyRegistry(&'static str),

    /// A collection is too large to be indexed on the wire.
    #[error("registry {registry} has {len} definitions, limit is {max}")]
    TooManyDefinitions {
        /// Collection name.
        registry: &'static str,
        /// Number of definitions supplied.
        len: usize,
        /// Largest supported collection.
        max: usize,
    },

    /// Definition file is not valid TOML or does not match the schema.
    #[error("invalid definition file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Definition file could not be read.
    #[error("failed to read definition file: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for definition loading.
pub type DefinitionResult<T> = Result<T, DefinitionError>;
