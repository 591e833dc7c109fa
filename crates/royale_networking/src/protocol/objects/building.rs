//! Building and decal table entries.

use royale_shared::{BuildingDefinition, DecalDefinition, DefinitionIndex, Definitions, Vec2};

use super::{read_mode_rotation, write_mode_rotation, CategoryCodec, ObjectCategory};
use crate::error::{DecodeResult, EncodeResult};
use crate::protocol::stream::{BitReader, BitWriter};
use crate::protocol::variant::{resolve, VariantStream};

const ORIENTATION_BITS: u8 = 2;

/// Building fields that change every tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BuildingPartial {
    /// Ceiling destroyed.
    pub dead: bool,
}

/// Building creation fields.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BuildingExtra {
    /// Building kind.
    pub definition: DefinitionIndex<BuildingDefinition>,
    /// Map position.
    pub position: Vec2,
    /// Right-angle orientation, 0-3.
    pub orientation: u8,
}

/// Codec for [`ObjectCategory::Building`].
pub struct BuildingCodec;

impl CategoryCodec for BuildingCodec {
    const CATEGORY: ObjectCategory = ObjectCategory::Building;
    type Partial = BuildingPartial;
    type Extra = BuildingExtra;

    fn write_partial(writer: &mut BitWriter, _: &Definitions, partial: &BuildingPartial) -> EncodeResult<()> {
        writer.write_bool(partial.dead)
    }

    fn read_partial(reader: &mut BitReader<'_>, _: &Definitions) -> DecodeResult<BuildingPartial> {
        Ok(BuildingPartial {
            dead: reader.read_bool()?,
        })
    }

    fn write_extra(writer: &mut BitWriter, definitions: &Definitions, extra: &BuildingExtra) -> EncodeResult<()> {
        definitions.buildings.write_to_stream(writer, extra.definition)?;
        writer.write_position(extra.position)?;
        writer.write_bits(u32::from(extra.orientation), ORIENTATION_BITS)
    }

    fn read_extra(reader: &mut BitReader<'_>, definitions: &Definitions) -> DecodeResult<BuildingExtra> {
        Ok(BuildingExtra {
            definition: definitions.buildings.read_from_stream(reader)?,
            position: reader.read_position()?,
            orientation: reader.read_bits(ORIENTATION_BITS)? as u8,
        })
    }
}

/// Decals never change after creation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DecalPartial;

/// Decal creation fields.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DecalExtra {
    /// Decal kind.
    pub definition: DefinitionIndex<DecalDefinition>,
    /// Map position.
    pub position: Vec2,
    /// Rotation in radians, sent per the definition's rotation mode.
    pub rotation: f32,
}

/// Codec for [`ObjectCategory::Decal`].
pub struct DecalCodec;

impl CategoryCodec for DecalCodec {
    const CATEGORY: ObjectCategory = ObjectCategory::Decal;
    type Partial = DecalPartial;
    type Extra = DecalExtra;

    fn write_partial(_: &mut BitWriter, _: &Definitions, _: &DecalPartial) -> EncodeResult<()> {
        Ok(())
    }

    fn read_partial(_: &mut BitReader<'_>, _: &Definitions) -> DecodeResult<DecalPartial> {
        Ok(DecalPartial)
    }

    fn write_extra(writer: &mut BitWriter, definitions: &Definitions, extra: &DecalExtra) -> EncodeResult<()> {
        let definition = resolve(&definitions.decals, extra.definition)?;
        definitions.decals.write_to_stream(writer, extra.definition)?;
        writer.write_position(extra.position)?;
        write_mode_rotation(writer, definition.rotation_mode, extra.rotation)
    }

    fn read_extra(reader: &mut BitReader<'_>, definitions: &Definitions) -> DecodeResult<DecalExtra> {
        let (index, definition) = definitions.decals.read_definition(reader)?;
        Ok(DecalExtra {
            definition: index,
            position: reader.read_position()?,
            rotation: read_mode_rotation(reader, definition.rotation_mode)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::definitions;

    #[test]
    fn test_building_round_trip() {
        let definitions = definitions();
        let extra = BuildingExtra {
            definition: definitions.buildings.index_of("shed").unwrap(),
            position: Vec2::ZERO,
            orientation: 2,
        };

        let mut writer = BitWriter::with_capacity(16);
        BuildingCodec::write_partial(&mut writer, &definitions, &BuildingPartial { dead: true }).unwrap();
        BuildingCodec::write_extra(&mut writer, &definitions, &extra).unwrap();

        let mut reader = BitReader::new(writer.as_slice());
        assert!(BuildingCodec::read_partial(&mut reader, &definitions).unwrap().dead);
        assert_eq!(BuildingCodec::read_extra(&mut reader, &definitions).unwrap(), extra);
    }

    #[test]
    fn test_unrotated_decal_skips_rotation() {
        let definitions = definitions();
        let extra = DecalExtra {
            definition: definitions.decals.index_of("floor_tile").unwrap(),
            position: Vec2::ZERO,
            rotation: 0.0,
        };

        let mut writer = BitWriter::with_capacity(16);
        DecalCodec::write_extra(&mut writer, &definitions, &extra).unwrap();
        assert_eq!(writer.bit_len(), usize::from(definitions.decals.bits()) + 32);

        let mut reader = BitReader::new(writer.as_slice());
        assert_eq!(DecalCodec::read_extra(&mut reader, &definitions).unwrap(), extra);
    }
}
