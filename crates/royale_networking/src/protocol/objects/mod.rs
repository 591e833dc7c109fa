//! # Object Serialization Table
//!
//! One entry per world-object category. Each entry supplies two codecs:
//!
//! - **partial**: fields that can change after creation (sent every tick the
//!   object is visible and changed)
//! - **extra**: creation-only fields (sent once when the object enters a
//!   viewer's interest set)
//!
//! ```text
//! full  = ┌──────── partial ────────┬──────── extra ────────┐
//! wire  : │ position rotation anim  │ dead skin helmet ...  │
//!         └─────────────────────────┴───────────────────────┘
//! ```
//!
//! The full codec is never written per category: [`write_full`] and
//! [`read_full`] always run partial then extra, so the full encoding starts
//! with exactly the partial encoding for every category.

mod building;
mod loot;
mod obstacle;
mod player;

pub use building::{BuildingCodec, BuildingExtra, BuildingPartial, DecalCodec, DecalExtra, DecalPartial};
pub use loot::{DeathMarkerCodec, DeathMarkerExtra, DeathMarkerPartial, LootCodec, LootExtra, LootPartial};
pub use obstacle::{ObstacleCodec, ObstacleExtra, ObstaclePartial, ObstacleRoleState};
pub use player::{Animation, PlayerCodec, PlayerExtra, PlayerPartial};

use std::f32::consts::FRAC_PI_2;

use royale_shared::{bits_for, Definitions, RotationMode};

use super::stream::{BitReader, BitWriter};
use crate::error::{DecodeError, DecodeResult, EncodeResult};

/// Identifier of a live world object.
///
/// Ids are scoped to objects that currently exist and are unrelated to
/// registry indices.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub u16);

/// Closed set of world-object categories.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ObjectCategory {
    /// Player character.
    Player = 0,
    /// Tree, rock, crate, door, ...
    Obstacle = 1,
    /// Marker left where a player died.
    DeathMarker = 2,
    /// Item lying on the ground.
    Loot = 3,
    /// Building shell.
    Building = 4,
    /// Ground decal.
    Decal = 5,
}

impl ObjectCategory {
    /// Every category, in tag order.
    pub const ALL: [Self; 6] = [
        Self::Player,
        Self::Obstacle,
        Self::DeathMarker,
        Self::Loot,
        Self::Building,
        Self::Decal,
    ];

    /// Bits used for the category tag.
    pub const BITS: u8 = bits_for(Self::ALL.len());

    /// Converts a wire tag.
    #[inline]
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Player),
            1 => Some(Self::Obstacle),
            2 => Some(Self::DeathMarker),
            3 => Some(Self::Loot),
            4 => Some(Self::Building),
            5 => Some(Self::Decal),
            _ => None,
        }
    }

    /// Writes the category tag.
    ///
    /// # Errors
    ///
    /// Fails if the buffer is full.
    #[inline]
    pub fn write(self, writer: &mut BitWriter) -> EncodeResult<()> {
        writer.write_bits(self as u32, Self::BITS)
    }

    /// Reads a category tag.
    ///
    /// # Errors
    ///
    /// [`DecodeError::InvalidTag`] for an unknown tag.
    pub fn read(reader: &mut BitReader<'_>) -> DecodeResult<Self> {
        let value = reader.read_bits(Self::BITS)?;
        Self::from_u8(value as u8).ok_or(DecodeError::InvalidTag {
            kind: "object category",
            value,
        })
    }
}

/// Serialization table entry for one category.
pub trait CategoryCodec {
    /// Category served by this entry.
    const CATEGORY: ObjectCategory;

    /// Fields that may change every tick.
    type Partial;

    /// Creation-only fields.
    type Extra;

    /// Writes the partial fields.
    ///
    /// # Errors
    ///
    /// Fails on buffer overflow or a foreign registry index.
    fn write_partial(writer: &mut BitWriter, definitions: &Definitions, partial: &Self::Partial) -> EncodeResult<()>;

    /// Reads the partial fields.
    ///
    /// # Errors
    ///
    /// Fails on truncated or invalid input.
    fn read_partial(reader: &mut BitReader<'_>, definitions: &Definitions) -> DecodeResult<Self::Partial>;

    /// Writes the creation-only fields.
    ///
    /// # Errors
    ///
    /// Fails on buffer overflow or a foreign registry index.
    fn write_extra(writer: &mut BitWriter, definitions: &Definitions, extra: &Self::Extra) -> EncodeResult<()>;

    /// Reads the creation-only fields.
    ///
    /// # Errors
    ///
    /// Fails on truncated or invalid input.
    fn read_extra(reader: &mut BitReader<'_>, definitions: &Definitions) -> DecodeResult<Self::Extra>;
}

/// Full object data: the partial fields plus the creation-only fields.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Full<P, E> {
    /// Fields shared with partial updates.
    pub partial: P,
    /// Creation-only fields.
    pub extra: E,
}

/// Writes full object data. Always partial first.
///
/// # Errors
///
/// Fails on buffer overflow or a foreign registry index.
pub fn write_full<C: CategoryCodec>(
    writer: &mut BitWriter,
    definitions: &Definitions,
    full: &Full<C::Partial, C::Extra>,
) -> EncodeResult<()> {
    C::write_partial(writer, definitions, &full.partial)?;
    C::write_extra(writer, definitions, &full.extra)
}

/// Reads full object data. Always partial first.
///
/// # Errors
///
/// Fails on truncated or invalid input.
pub fn read_full<C: CategoryCodec>(
    reader: &mut BitReader<'_>,
    definitions: &Definitions,
) -> DecodeResult<Full<C::Partial, C::Extra>> {
    let partial = C::read_partial(reader, definitions)?;
    let extra = C::read_extra(reader, definitions)?;
    Ok(Full { partial, extra })
}

/// Writes a rotation in the layout selected by a definition.
///
/// Discrete modes snap to the nearest right angle.
pub(crate) fn write_mode_rotation(writer: &mut BitWriter, mode: RotationMode, rotation: f32) -> EncodeResult<()> {
    match mode.orientations() {
        None => writer.write_rotation(rotation),
        Some(1) => Ok(()),
        Some(count) => {
            let orientation = (rotation / FRAC_PI_2).round() as i32;
            let orientation = orientation.rem_euclid(i32::from(count)) as u32;
            writer.write_bits(orientation, bits_for(usize::from(count)))
        }
    }
}

/// Reads a rotation in the layout selected by a definition.
pub(crate) fn read_mode_rotation(reader: &mut BitReader<'_>, mode: RotationMode) -> DecodeResult<f32> {
    match mode.orientations() {
        None => reader.read_rotation(),
        Some(1) => Ok(0.0),
        Some(count) => {
            let orientation = reader.read_bits(bits_for(usize::from(count)))?;
            Ok(orientation as f32 * FRAC_PI_2)
        }
    }
}

macro_rules! category_table {
    ($( $(#[$doc:meta])* $variant:ident => $codec:ident($partial:ident, $extra:ident) ),* $(,)?) => {
        /// Partial data of one object, tagged by category.
        #[derive(Clone, Debug, PartialEq)]
        pub enum PartialObject {
            $( $(#[$doc])* $variant($partial), )*
        }

        /// Full data of one object, tagged by category.
        #[derive(Clone, Debug, PartialEq)]
        pub enum FullObject {
            $( $(#[$doc])* $variant(Full<$partial, $extra>), )*
        }

        impl PartialObject {
            /// Category of this object.
            #[must_use]
            pub const fn category(&self) -> ObjectCategory {
                match self {
                    $( Self::$variant(_) => ObjectCategory::$variant, )*
                }
            }

            /// Writes the partial fields (without id or category).
            ///
            /// # Errors
            ///
            /// Fails on buffer overflow or a foreign registry index.
            pub fn write(&self, writer: &mut BitWriter, definitions: &Definitions) -> EncodeResult<()> {
                match self {
                    $( Self::$variant(data) => <$codec as CategoryCodec>::write_partial(writer, definitions, data), )*
                }
            }

            /// Reads the partial fields of a `category` object.
            ///
            /// # Errors
            ///
            /// Fails on truncated or invalid input.
            pub fn read(category: ObjectCategory, reader: &mut BitReader<'_>, definitions: &Definitions) -> DecodeResult<Self> {
                match category {
                    $( ObjectCategory::$variant => <$codec as CategoryCodec>::read_partial(reader, definitions).map(Self::$variant), )*
                }
            }
        }

        impl FullObject {
            /// Category of this object.
            #[must_use]
            pub const fn category(&self) -> ObjectCategory {
                match self {
                    $( Self::$variant(_) => ObjectCategory::$variant, )*
                }
            }

            /// The partial half of this object's data.
            #[must_use]
            pub fn to_partial(&self) -> PartialObject {
                match self {
                    $( Self::$variant(full) => PartialObject::$variant(full.partial), )*
                }
            }

            /// Writes the full fields (without id or category).
            ///
            /// # Errors
            ///
            /// Fails on buffer overflow or a foreign registry index.
            pub fn write(&self, writer: &mut BitWriter, definitions: &Definitions) -> EncodeResult<()> {
                match self {
                    $( Self::$variant(full) => write_full::<$codec>(writer, definitions, full), )*
                }
            }

            /// Reads the full fields of a `category` object.
            ///
            /// # Errors
            ///
            /// Fails on truncated or invalid input.
            pub fn read(category: ObjectCategory, reader: &mut BitReader<'_>, definitions: &Definitions) -> DecodeResult<Self> {
                match category {
                    $( ObjectCategory::$variant => read_full::<$codec>(reader, definitions).map(Self::$variant), )*
                }
            }
        }
    };
}

category_table! {
    /// Player character.
    Player => PlayerCodec(PlayerPartial, PlayerExtra),
    /// Obstacle.
    Obstacle => ObstacleCodec(ObstaclePartial, ObstacleExtra),
    /// Death marker.
    DeathMarker => DeathMarkerCodec(DeathMarkerPartial, DeathMarkerExtra),
    /// Ground loot.
    Loot => LootCodec(LootPartial, LootExtra),
    /// Building.
    Building => BuildingCodec(BuildingPartial, BuildingExtra),
    /// Decal.
    Decal => DecalCodec(DecalPartial, DecalExtra),
}

/// Partial update of one object as it appears in an update message.
#[derive(Clone, Debug, PartialEq)]
pub struct ObjectPartialUpdate {
    /// Object id.
    pub id: ObjectId,
    /// Category-tagged partial data.
    pub data: PartialObject,
}

impl ObjectPartialUpdate {
    /// Writes id, category, then partial data.
    ///
    /// # Errors
    ///
    /// Fails on buffer overflow or a foreign registry index.
    pub fn write(&self, writer: &mut BitWriter, definitions: &Definitions) -> EncodeResult<()> {
        writer.write_object_id(self.id)?;
        self.data.category().write(writer)?;
        self.data.write(writer, definitions)
    }

    /// Reads id, category, then partial data.
    ///
    /// # Errors
    ///
    /// Fails on truncated or invalid input.
    pub fn read(reader: &mut BitReader<'_>, definitions: &Definitions) -> DecodeResult<Self> {
        let id = reader.read_object_id()?;
        let category = ObjectCategory::read(reader)?;
        let data = PartialObject::read(category, reader, definitions)?;
        Ok(Self { id, data })
    }
}

/// Full update of one object as it appears in an update message.
#[derive(Clone, Debug, PartialEq)]
pub struct ObjectFullUpdate {
    /// Object id.
    pub id: ObjectId,
    /// Category-tagged full data.
    pub data: FullObject,
}

impl ObjectFullUpdate {
    /// Writes id, category, then full data.
    ///
    /// # Errors
    ///
    /// Fails on buffer overflow or a foreign registry index.
    pub fn write(&self, writer: &mut BitWriter, definitions: &Definitions) -> EncodeResult<()> {
        writer.write_object_id(self.id)?;
        self.data.category().write(writer)?;
        self.data.write(writer, definitions)
    }

    /// Reads id, category, then full data.
    ///
    /// # Errors
    ///
    /// Fails on truncated or invalid input.
    pub fn read(reader: &mut BitReader<'_>, definitions: &Definitions) -> DecodeResult<Self> {
        let id = reader.read_object_id()?;
        let category = ObjectCategory::read(reader)?;
        let data = FullObject::read(category, reader, definitions)?;
        Ok(Self { id, data })
    }
}
