//! Obstacle table entry.
//!
//! The creation layout depends on the definition: rotation follows its
//! rotation mode, variation is sent only for definitions with variations, and
//! doors and activatables append their role state.

use royale_shared::{bits_for, DefinitionIndex, Definitions, ObstacleDefinition, ObstacleRole, Vec2};

use super::{read_mode_rotation, write_mode_rotation, CategoryCodec, ObjectCategory};
use crate::error::{DecodeError, DecodeResult, EncodeResult};
use crate::protocol::stream::{BitReader, BitWriter};
use crate::protocol::variant::{resolve, VariantStream};

const DOOR_OFFSET_BITS: u8 = 2;

/// Obstacle fields that change every tick.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ObstaclePartial {
    /// Current scale; shrinks as the obstacle takes damage.
    pub scale: f32,
    /// Obstacle is destroyed.
    pub dead: bool,
}

/// Role-specific creation state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ObstacleRoleState {
    /// No role state.
    #[default]
    None,
    /// Door open offset, 0-3.
    Door {
        /// Open offset.
        offset: u8,
    },
    /// Button or lever state.
    Activatable {
        /// Has been activated.
        activated: bool,
    },
}

/// Obstacle creation fields.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ObstacleExtra {
    /// Obstacle kind.
    pub definition: DefinitionIndex<ObstacleDefinition>,
    /// Map position.
    pub position: Vec2,
    /// Rotation in radians; discrete modes snap to right angles.
    pub rotation: f32,
    /// Art variation; ignored when the definition has none.
    pub variation: u8,
    /// Role state; must match the definition's role.
    pub role: ObstacleRoleState,
}

/// Codec for [`ObjectCategory::Obstacle`].
pub struct ObstacleCodec;

impl CategoryCodec for ObstacleCodec {
    const CATEGORY: ObjectCategory = ObjectCategory::Obstacle;
    type Partial = ObstaclePartial;
    type Extra = ObstacleExtra;

    fn write_partial(writer: &mut BitWriter, _: &Definitions, partial: &ObstaclePartial) -> EncodeResult<()> {
        writer.write_scale(partial.scale)?;
        writer.write_bool(partial.dead)
    }

    fn read_partial(reader: &mut BitReader<'_>, _: &Definitions) -> DecodeResult<ObstaclePartial> {
        Ok(ObstaclePartial {
            scale: reader.read_scale()?,
            dead: reader.read_bool()?,
        })
    }

    fn write_extra(writer: &mut BitWriter, definitions: &Definitions, extra: &ObstacleExtra) -> EncodeResult<()> {
        let definition = resolve(&definitions.obstacles, extra.definition)?;
        definitions.obstacles.write_to_stream(writer, extra.definition)?;
        writer.write_position(extra.position)?;
        write_mode_rotation(writer, definition.rotation_mode, extra.rotation)?;

        if let Some(variations) = definition.variations {
            debug_assert!(
                extra.variation < variations,
                "variation {} out of range for {} variations",
                extra.variation,
                variations
            );
            let variation = extra.variation.min(variations.saturating_sub(1));
            writer.write_bits(u32::from(variation), bits_for(usize::from(variations)))?;
        }

        match definition.role {
            ObstacleRole::Door => {
                debug_assert!(
                    matches!(extra.role, ObstacleRoleState::Door { .. }),
                    "door obstacle with role state {:?}",
                    extra.role
                );
                let offset = match extra.role {
                    ObstacleRoleState::Door { offset } => offset,
                    _ => 0,
                };
                writer.write_bits(u32::from(offset), DOOR_OFFSET_BITS)
            }
            ObstacleRole::Activatable => {
                debug_assert!(
                    matches!(extra.role, ObstacleRoleState::Activatable { .. }),
                    "activatable obstacle with role state {:?}",
                    extra.role
                );
                let activated = matches!(extra.role, ObstacleRoleState::Activatable { activated: true });
                writer.write_bool(activated)
            }
            ObstacleRole::Normal | ObstacleRole::Window => Ok(()),
        }
    }

    fn read_extra(reader: &mut BitReader<'_>, definitions: &Definitions) -> DecodeResult<ObstacleExtra> {
        let (index, definition) = definitions.obstacles.read_definition(reader)?;
        let position = reader.read_position()?;
        let rotation = read_mode_rotation(reader, definition.rotation_mode)?;

        let variation = match definition.variations {
            Some(variations) => {
                let variation = reader.read_bits(bits_for(usize::from(variations)))?;
                if variation >= u32::from(variations) {
                    return Err(DecodeError::ConstraintViolation {
                        what: "obstacle variation",
                        detail: format!("{variation}, definition has {variations}"),
                    });
                }
                variation as u8
            }
            None => 0,
        };

        let role = match definition.role {
            ObstacleRole::Door => ObstacleRoleState::Door {
                offset: reader.read_bits(DOOR_OFFSET_BITS)? as u8,
            },
            ObstacleRole::Activatable => ObstacleRoleState::Activatable {
                activated: reader.read_bool()?,
            },
            ObstacleRole::Normal | ObstacleRole::Window => ObstacleRoleState::None,
        };

        Ok(ObstacleExtra {
            definition: index,
            position,
            rotation,
            variation,
            role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::definitions;
    use std::f32::consts::FRAC_PI_2;

    fn extra_bits(extra: &ObstacleExtra) -> usize {
        let definitions = definitions();
        let mut writer = BitWriter::with_capacity(32);
        ObstacleCodec::write_extra(&mut writer, &definitions, extra).unwrap();
        writer.bit_len()
    }

    fn round_trip(extra: &ObstacleExtra) -> ObstacleExtra {
        let definitions = definitions();
        let mut writer = BitWriter::with_capacity(32);
        ObstacleCodec::write_extra(&mut writer, &definitions, extra).unwrap();
        let mut reader = BitReader::new(writer.as_slice());
        ObstacleCodec::read_extra(&mut reader, &definitions).unwrap()
    }

    #[test]
    fn test_layout_follows_definition() {
        let definitions = definitions();
        let position = Vec2::new(10.0, 20.0);
        let id_bits = usize::from(definitions.obstacles.bits());

        // full rotation, 3 variations
        let tree = ObstacleExtra {
            definition: definitions.obstacles.index_of("oak_tree").unwrap(),
            position,
            rotation: 0.5,
            variation: 2,
            role: ObstacleRoleState::None,
        };
        assert_eq!(extra_bits(&tree), id_bits + 32 + 16 + 2);

        // limited rotation, door offset
        let door = ObstacleExtra {
            definition: definitions.obstacles.index_of("house_door").unwrap(),
            position,
            rotation: FRAC_PI_2,
            variation: 0,
            role: ObstacleRoleState::Door { offset: 3 },
        };
        assert_eq!(extra_bits(&door), id_bits + 32 + 2 + 2);

        // fixed rotation, no extras
        let barrel = ObstacleExtra {
            definition: definitions.obstacles.index_of("barrel").unwrap(),
            position,
            rotation: 0.0,
            variation: 0,
            role: ObstacleRoleState::None,
        };
        assert_eq!(extra_bits(&barrel), id_bits + 32);
    }

    #[test]
    fn test_role_state_round_trip() {
        let definitions = definitions();

        let door = ObstacleExtra {
            definition: definitions.obstacles.index_of("house_door").unwrap(),
            position: Vec2::ZERO,
            rotation: FRAC_PI_2,
            variation: 0,
            role: ObstacleRoleState::Door { offset: 3 },
        };
        assert_eq!(round_trip(&door), door);

        let button = ObstacleExtra {
            definition: definitions.obstacles.index_of("button").unwrap(),
            position: Vec2::ZERO,
            rotation: 0.0,
            variation: 0,
            role: ObstacleRoleState::Activatable { activated: true },
        };
        assert_eq!(round_trip(&button), button);
    }

    #[test]
    fn test_variation_ignored_without_variations() {
        let definitions = definitions();
        let rock = ObstacleExtra {
            definition: definitions.obstacles.index_of("barrel").unwrap(),
            position: Vec2::ZERO,
            rotation: 0.0,
            variation: 5,
            role: ObstacleRoleState::None,
        };
        assert_eq!(round_trip(&rock).variation, 0);
    }

    #[test]
    fn test_variation_past_definition_rejected() {
        let definitions = definitions();
        let tree = definitions.obstacles.index_of("oak_tree").unwrap();

        let mut writer = BitWriter::with_capacity(16);
        definitions.obstacles.write_to_stream(&mut writer, tree).unwrap();
        writer.write_position(Vec2::ZERO).unwrap();
        writer.write_rotation(0.0).unwrap();
        writer.write_bits(3, 2).unwrap();

        let mut reader = BitReader::new(writer.as_slice());
        assert_eq!(
            ObstacleCodec::read_extra(&mut reader, &definitions),
            Err(DecodeError::ConstraintViolation {
                what: "obstacle variation",
                detail: "3, definition has 3".to_owned(),
            })
        );
    }

    #[test]
    fn test_partial_round_trip() {
        let definitions = definitions();
        let mut writer = BitWriter::with_capacity(4);
        ObstacleCodec::write_partial(&mut writer, &definitions, &ObstaclePartial { scale: 3.0, dead: true }).unwrap();
        assert_eq!(writer.bit_len(), 9);

        let mut reader = BitReader::new(writer.as_slice());
        let decoded = ObstacleCodec::read_partial(&mut reader, &definitions).unwrap();
        assert!(decoded.dead);
        assert!((decoded.scale - 3.0).abs() < 1e-5);
    }
}
