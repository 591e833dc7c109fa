//! # Protocol Constants
//!
//! **CRITICAL:** These values are baked into the client binary.
//! Changes require a client rebuild and break older clients.

// =============================================================================
// WORLD
// =============================================================================

/// Largest coordinate on either map axis. Positions are quantized over
/// `[0, MAX_POSITION]`.
pub const MAX_POSITION: f32 = 1924.0;

/// Bits per position axis.
pub const POSITION_BITS: u8 = 16;

/// Bits for a full rotation over `[-PI, PI]`.
pub const ROTATION_BITS: u8 = 16;

/// Smallest object scale that can be sent.
pub const MIN_OBJECT_SCALE: f32 = 0.15;

/// Largest object scale that can be sent.
pub const MAX_OBJECT_SCALE: f32 = 3.0;

/// Bits for an object scale.
pub const SCALE_BITS: u8 = 8;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Bits for a live object id.
///
/// Ids only address objects that currently exist, so the width is bounded by
/// the live-object count, not by total objects ever created.
pub const OBJECT_ID_BITS: u8 = 16;

// =============================================================================
// PLAYERS
// =============================================================================

/// Maximum player name length in bytes.
pub const PLAYER_NAME_MAX_LENGTH: usize = 16;

/// Number of weapon slots in a player's loadout.
pub const WEAPON_SLOTS: usize = 4;

/// Number of emote wheel slots.
pub const EMOTE_SLOTS: usize = 4;

/// Default maximum health before the server sends real bounds.
pub const DEFAULT_MAX_HEALTH: f32 = 100.0;

/// Default maximum adrenaline before the server sends real bounds.
pub const DEFAULT_MAX_ADRENALINE: f32 = 100.0;

/// Largest stack size for a single inventory item or loot pile.
pub const MAX_ITEM_COUNT: u16 = (1 << 9) - 1;
