//! Loot and death marker table entries.

use royale_shared::constants::MAX_ITEM_COUNT;
use royale_shared::{DefinitionIndex, Definitions, LootDefinition, Vec2};

use super::{CategoryCodec, ObjectCategory, ObjectId};
use crate::error::{DecodeResult, EncodeResult};
use crate::protocol::stream::{BitReader, BitWriter};
use crate::protocol::variant::{resolve, VariantStream};

/// Bits for a stack count (up to [`MAX_ITEM_COUNT`]).
pub const ITEM_COUNT_BITS: u8 = 9;

// =============================================================================
// LOOT
// =============================================================================

/// Loot fields that change every tick.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LootPartial {
    /// Map position; loot slides when dropped.
    pub position: Vec2,
}

/// Loot creation fields.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LootExtra {
    /// Item kind.
    pub definition: DefinitionIndex<LootDefinition>,
    /// Stack size. Only sent for stackable items, otherwise always 1.
    pub count: u16,
    /// Just dropped this tick.
    pub is_new: bool,
}

/// Codec for [`ObjectCategory::Loot`].
pub struct LootCodec;

impl CategoryCodec for LootCodec {
    const CATEGORY: ObjectCategory = ObjectCategory::Loot;
    type Partial = LootPartial;
    type Extra = LootExtra;

    fn write_partial(writer: &mut BitWriter, _: &Definitions, partial: &LootPartial) -> EncodeResult<()> {
        writer.write_position(partial.position)
    }

    fn read_partial(reader: &mut BitReader<'_>, _: &Definitions) -> DecodeResult<LootPartial> {
        Ok(LootPartial {
            position: reader.read_position()?,
        })
    }

    fn write_extra(writer: &mut BitWriter, definitions: &Definitions, extra: &LootExtra) -> EncodeResult<()> {
        let definition = resolve(&definitions.loots, extra.definition)?;
        definitions.loots.write_to_stream(writer, extra.definition)?;
        if definition.item_type.is_stackable() {
            writer.write_bits(u32::from(extra.count.min(MAX_ITEM_COUNT)), ITEM_COUNT_BITS)?;
        }
        writer.write_bool(extra.is_new)
    }

    fn read_extra(reader: &mut BitReader<'_>, definitions: &Definitions) -> DecodeResult<LootExtra> {
        let (index, definition) = definitions.loots.read_definition(reader)?;
        let count = if definition.item_type.is_stackable() {
            reader.read_bits(ITEM_COUNT_BITS)? as u16
        } else {
            1
        };

        Ok(LootExtra {
            definition: index,
            count,
            is_new: reader.read_bool()?,
        })
    }
}

// =============================================================================
// DEATH MARKER
// =============================================================================

/// Death markers never change after creation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DeathMarkerPartial;

/// Death marker creation fields.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DeathMarkerExtra {
    /// Map position.
    pub position: Vec2,
    /// Player who died here.
    pub player_id: ObjectId,
    /// Death happened this tick.
    pub is_new: bool,
}

/// Codec for [`ObjectCategory::DeathMarker`].
pub struct DeathMarkerCodec;

impl CategoryCodec for DeathMarkerCodec {
    const CATEGORY: ObjectCategory = ObjectCategory::DeathMarker;
    type Partial = DeathMarkerPartial;
    type Extra = DeathMarkerExtra;

    fn write_partial(_: &mut BitWriter, _: &Definitions, _: &DeathMarkerPartial) -> EncodeResult<()> {
        Ok(())
    }

    fn read_partial(_: &mut BitReader<'_>, _: &Definitions) -> DecodeResult<DeathMarkerPartial> {
        Ok(DeathMarkerPartial)
    }

    fn write_extra(writer: &mut BitWriter, _: &Definitions, extra: &DeathMarkerExtra) -> EncodeResult<()> {
        writer.write_position(extra.position)?;
        writer.write_object_id(extra.player_id)?;
        writer.write_bool(extra.is_new)
    }

    fn read_extra(reader: &mut BitReader<'_>, _: &Definitions) -> DecodeResult<DeathMarkerExtra> {
        Ok(DeathMarkerExtra {
            position: reader.read_position()?,
            player_id: reader.read_object_id()?,
            is_new: reader.read_bool()?,
        })
    }
}
