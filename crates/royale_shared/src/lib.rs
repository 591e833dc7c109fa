//! # ROYALE Shared
//!
//! Types used by both the match server and every client.
//!
//! ## CRITICAL RULE
//!
//! Anything in this crate that is referenced by index on the wire must be
//! constructed in the same order on both ends:
//! - registries assign dense indices in definition order
//! - constants are baked into both binaries
//!
//! Changing either one is a protocol break.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod constants;
pub mod definitions;
pub mod error;
pub mod math;
pub mod registry;

pub use constants::{MAX_POSITION, OBJECT_ID_BITS};
pub use definitions::{
    BuildingDefinition, DecalDefinition, Definitions, EmoteDefinition, ExplosionDefinition,
    ItemType, LootDefinition, ObstacleDefinition, ObstacleRole, RotationMode,
};
pub use error::{DefinitionError, DefinitionResult};
pub use math::Vec2;
pub use registry::{bits_for, Definition, DefinitionIndex, Registry};
