//! Player table entry.

use royale_shared::{DefinitionIndex, Definitions, LootDefinition, Vec2};

use super::{CategoryCodec, ObjectCategory};
use crate::error::{DecodeError, DecodeResult, EncodeResult};
use crate::protocol::stream::{BitReader, BitWriter};
use crate::protocol::variant::VariantStream;

const ANIMATION_BITS: u8 = 3;
const ARMOR_LEVEL_BITS: u8 = 2;

/// One-shot animation a player is playing this tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(u8)]
pub enum Animation {
    /// Idle.
    #[default]
    None = 0,
    /// Melee swing.
    Melee = 1,
    /// Pulling a grenade pin.
    ThrowableCook = 2,
    /// Throwing a grenade.
    ThrowableThrow = 3,
    /// Firing a gun.
    GunFire = 4,
    /// Dry fire.
    GunClick = 5,
    /// Reviving a teammate.
    Revive = 6,
}

impl Animation {
    /// Converts a wire tag.
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::None),
            1 => Some(Self::Melee),
            2 => Some(Self::ThrowableCook),
            3 => Some(Self::ThrowableThrow),
            4 => Some(Self::GunFire),
            5 => Some(Self::GunClick),
            6 => Some(Self::Revive),
            _ => None,
        }
    }
}

/// Player fields that change every tick.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PlayerPartial {
    /// Map position.
    pub position: Vec2,
    /// Facing angle in radians.
    pub rotation: f32,
    /// Current animation.
    pub animation: Animation,
}

/// Player fields sent when the player enters view or changes equipment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlayerExtra {
    /// Player is dead.
    pub dead: bool,
    /// Player has spawn protection.
    pub invulnerable: bool,
    /// Item in hand.
    pub active_item: DefinitionIndex<LootDefinition>,
    /// Equipped skin.
    pub skin: DefinitionIndex<LootDefinition>,
    /// Helmet level, 0-3.
    pub helmet_level: u8,
    /// Vest level, 0-3.
    pub vest_level: u8,
    /// Backpack level, 0-3.
    pub backpack_level: u8,
}

/// Codec for [`ObjectCategory::Player`].
pub struct PlayerCodec;

impl CategoryCodec for PlayerCodec {
    const CATEGORY: ObjectCategory = ObjectCategory::Player;
    type Partial = PlayerPartial;
    type Extra = PlayerExtra;

    fn write_partial(writer: &mut BitWriter, _: &Definitions, partial: &PlayerPartial) -> EncodeResult<()> {
        writer.write_position(partial.position)?;
        writer.write_rotation(partial.rotation)?;
        writer.write_bits(partial.animation as u32, ANIMATION_BITS)
    }

    fn read_partial(reader: &mut BitReader<'_>, _: &Definitions) -> DecodeResult<PlayerPartial> {
        let position = reader.read_position()?;
        let rotation = reader.read_rotation()?;
        let tag = reader.read_bits(ANIMATION_BITS)?;
        let animation = Animation::from_u8(tag as u8).ok_or(DecodeError::InvalidTag {
            kind: "animation",
            value: tag,
        })?;

        Ok(PlayerPartial {
            position,
            rotation,
            animation,
        })
    }

    fn write_extra(writer: &mut BitWriter, definitions: &Definitions, extra: &PlayerExtra) -> EncodeResult<()> {
        writer.write_bool(extra.dead)?;
        writer.write_bool(extra.invulnerable)?;
        definitions.loots.write_to_stream(writer, extra.active_item)?;
        definitions.loots.write_to_stream(writer, extra.skin)?;
        writer.write_bits(u32::from(extra.helmet_level), ARMOR_LEVEL_BITS)?;
        writer.write_bits(u32::from(extra.vest_level), ARMOR_LEVEL_BITS)?;
        writer.write_bits(u32::from(extra.backpack_level), ARMOR_LEVEL_BITS)
    }

    fn read_extra(reader: &mut BitReader<'_>, definitions: &Definitions) -> DecodeResult<PlayerExtra> {
        Ok(PlayerExtra {
            dead: reader.read_bool()?,
            invulnerable: reader.read_bool()?,
            active_item: definitions.loots.read_from_stream(reader)?,
            skin: definitions.loots.read_from_stream(reader)?,
            helmet_level: reader.read_bits(ARMOR_LEVEL_BITS)? as u8,
            vest_level: reader.read_bits(ARMOR_LEVEL_BITS)? as u8,
            backpack_level: reader.read_bits(ARMOR_LEVEL_BITS)? as u8,
        })
    }
}
