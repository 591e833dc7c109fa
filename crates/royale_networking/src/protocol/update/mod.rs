//! # Update Message
//!
//! The per-tick, per-viewer delta. A 16-bit flags word says which sections
//! follow; sections are then written in one fixed order:
//!
//! ```text
//! ┌─────────┬─────────────┬─────────┬──────┬─────────┬─────────┬───
//! │ flags16 │ player data │ deleted │ full │ partial │ bullets │ ...
//! └─────────┴─────────────┴─────────┴──────┴─────────┴─────────┴───
//!    bit 0 ──────┘  bit 1 ──────┘ bit 2 ─┘  ...
//! ```
//!
//! [`UpdateSection::ALL`] is the single source of that order. Writer and
//! reader both walk it in one loop, so they cannot drift apart.
//!
//! A section is present iff its data is: `Some` for optional blocks,
//! non-empty for lists.

mod player_data;

pub use player_data::{
    HealthBounds, Inventory, PlayerData, PlayerIdentity, PlayerStateCache, WeaponLoadout, WeaponSlot,
    ADRENALINE_BITS, HEALTH_BITS,
};

use royale_shared::constants::PLAYER_NAME_MAX_LENGTH;
use royale_shared::{
    DefinitionIndex, Definitions, EmoteDefinition, ExplosionDefinition, LootDefinition, Vec2,
};

use super::objects::{ObjectFullUpdate, ObjectId, ObjectPartialUpdate};
use super::stream::{BitReader, BitWriter};
use super::variant::VariantStream;
use crate::error::{DecodeError, DecodeResult, EncodeResult};

/// Largest gas circle radius.
pub const MAX_GAS_RADIUS: f32 = 2048.0;

const OBJECT_COUNT_BITS: u8 = 16;
const BULLET_COUNT_BITS: u8 = 8;
const EXPLOSION_COUNT_BITS: u8 = 8;
const EMOTE_COUNT_BITS: u8 = 7;
const PLAYER_COUNT_BITS: u8 = 8;
const REFLECTION_BITS: u8 = 2;
const GAS_MODE_BITS: u8 = 2;
const GAS_COUNTDOWN_BITS: u8 = 7;
const GAS_RADIUS_BITS: u8 = 16;
const GAS_PERCENTAGE_BITS: u8 = 16;
const ALIVE_COUNT_BITS: u8 = 7;

// =============================================================================
// SECTION PAYLOADS
// =============================================================================

/// A bullet fired this tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bullet {
    /// Weapon that fired it.
    pub source: DefinitionIndex<LootDefinition>,
    /// Player who fired it.
    pub shooter: ObjectId,
    /// Muzzle position.
    pub position: Vec2,
    /// Direction in radians.
    pub rotation: f32,
    /// Ricochets so far, 0-3.
    pub reflection_count: u8,
}

/// An explosion this tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Explosion {
    /// Explosion kind.
    pub definition: DefinitionIndex<ExplosionDefinition>,
    /// Centre.
    pub position: Vec2,
}

/// An emote played this tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Emote {
    /// Emote kind.
    pub definition: DefinitionIndex<EmoteDefinition>,
    /// Player showing it.
    pub player: ObjectId,
}

/// Phase of the gas cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(u8)]
pub enum GasMode {
    /// Not started.
    #[default]
    Inactive = 0,
    /// Counting down to the next advance.
    Waiting = 1,
    /// Shrinking.
    Advancing = 2,
}

impl GasMode {
    /// Converts a wire tag.
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Inactive),
            1 => Some(Self::Waiting),
            2 => Some(Self::Advancing),
            _ => None,
        }
    }
}

/// Gas circle geometry and timer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GasState {
    /// Phase.
    pub mode: GasMode,
    /// Seconds left in this phase.
    pub countdown: u8,
    /// Current circle centre.
    pub old_position: Vec2,
    /// Target circle centre.
    pub new_position: Vec2,
    /// Current radius.
    pub old_radius: f32,
    /// Target radius.
    pub new_radius: f32,
}

/// A player that joined, for the scoreboard.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewPlayer {
    /// Player object id.
    pub id: ObjectId,
    /// Display name.
    pub name: String,
}

// =============================================================================
// MESSAGE
// =============================================================================

/// One tick of state for one viewer.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UpdateMessage {
    /// Own player state.
    pub player_data: Option<PlayerData>,
    /// Objects that left view or were destroyed.
    pub deleted_objects: Vec<ObjectId>,
    /// Objects entering view, or with creation fields changed.
    pub full_objects: Vec<ObjectFullUpdate>,
    /// Known objects whose partial fields changed.
    pub partial_objects: Vec<ObjectPartialUpdate>,
    /// Bullets fired.
    pub bullets: Vec<Bullet>,
    /// Explosions.
    pub explosions: Vec<Explosion>,
    /// Emotes.
    pub emotes: Vec<Emote>,
    /// Gas geometry.
    pub gas: Option<GasState>,
    /// Progress of the current gas advance, 0-1.
    pub gas_percentage: Option<f32>,
    /// Players still alive.
    pub alive_count: Option<u8>,
    /// Players that joined.
    pub new_players: Vec<NewPlayer>,
    /// Players that left.
    pub deleted_players: Vec<ObjectId>,
}

/// Optional sections of an [`UpdateMessage`], in wire order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum UpdateSection {
    /// [`UpdateMessage::player_data`].
    PlayerData = 0,
    /// [`UpdateMessage::deleted_objects`].
    DeletedObjects = 1,
    /// [`UpdateMessage::full_objects`].
    FullObjects = 2,
    /// [`UpdateMessage::partial_objects`].
    PartialObjects = 3,
    /// [`UpdateMessage::bullets`].
    Bullets = 4,
    /// [`UpdateMessage::explosions`].
    Explosions = 5,
    /// [`UpdateMessage::emotes`].
    Emotes = 6,
    /// [`UpdateMessage::gas`].
    Gas = 7,
    /// [`UpdateMessage::gas_percentage`].
    GasPercentage = 8,
    /// [`UpdateMessage::alive_count`].
    AliveCount = 9,
    /// [`UpdateMessage::new_players`].
    NewPlayers = 10,
    /// [`UpdateMessage::deleted_players`].
    DeletedPlayers = 11,
}

impl UpdateSection {
    /// Every section in canonical wire order.
    pub const ALL: [Self; 12] = [
        Self::PlayerData,
        Self::DeletedObjects,
        Self::FullObjects,
        Self::PartialObjects,
        Self::Bullets,
        Self::Explosions,
        Self::Emotes,
        Self::Gas,
        Self::GasPercentage,
        Self::AliveCount,
        Self::NewPlayers,
        Self::DeletedPlayers,
    ];

    /// Flag bit of this section.
    #[inline]
    #[must_use]
    pub const fn bit(self) -> u16 {
        1 << self as u16
    }

    /// True if `message` carries data for this section.
    #[must_use]
    pub fn is_present(self, message: &UpdateMessage) -> bool {
        match self {
            Self::PlayerData => message.player_data.is_some(),
            Self::DeletedObjects => !message.deleted_objects.is_empty(),
            Self::FullObjects => !message.full_objects.is_empty(),
            Self::PartialObjects => !message.partial_objects.is_empty(),
            Self::Bullets => !message.bullets.is_empty(),
            Self::Explosions => !message.explosions.is_empty(),
            Self::Emotes => !message.emotes.is_empty(),
            Self::Gas => message.gas.is_some(),
            Self::GasPercentage => message.gas_percentage.is_some(),
            Self::AliveCount => message.alive_count.is_some(),
            Self::NewPlayers => !message.new_players.is_empty(),
            Self::DeletedPlayers => !message.deleted_players.is_empty(),
        }
    }

    fn write(
        self,
        message: &UpdateMessage,
        writer: &mut BitWriter,
        definitions: &Definitions,
        cache: &PlayerStateCache,
    ) -> EncodeResult<()> {
        match self {
            Self::PlayerData => match &message.player_data {
                Some(data) => data.write(writer, definitions, cache),
                None => Ok(()),
            },
            Self::DeletedObjects => {
                writer.write_array("deleted objects", &message.deleted_objects, OBJECT_COUNT_BITS, |w, &id| {
                    w.write_object_id(id)
                })
            }
            Self::FullObjects => {
                writer.write_array("full objects", &message.full_objects, OBJECT_COUNT_BITS, |w, object| {
                    object.write(w, definitions)
                })
            }
            Self::PartialObjects => {
                writer.write_array("partial objects", &message.partial_objects, OBJECT_COUNT_BITS, |w, object| {
                    object.write(w, definitions)
                })
            }
            Self::Bullets => writer.write_array("bullets", &message.bullets, BULLET_COUNT_BITS, |w, bullet| {
                definitions.loots.write_to_stream(w, bullet.source)?;
                w.write_object_id(bullet.shooter)?;
                w.write_position(bullet.position)?;
                w.write_rotation(bullet.rotation)?;
                w.write_bits(u32::from(bullet.reflection_count), REFLECTION_BITS)
            }),
            Self::Explosions => {
                writer.write_array("explosions", &message.explosions, EXPLOSION_COUNT_BITS, |w, explosion| {
                    definitions.explosions.write_to_stream(w, explosion.definition)?;
                    w.write_position(explosion.position)
                })
            }
            Self::Emotes => writer.write_array("emotes", &message.emotes, EMOTE_COUNT_BITS, |w, emote| {
                definitions.emotes.write_to_stream(w, emote.definition)?;
                w.write_object_id(emote.player)
            }),
            Self::Gas => match &message.gas {
                Some(gas) => write_gas(writer, gas),
                None => Ok(()),
            },
            Self::GasPercentage => match message.gas_percentage {
                Some(percentage) => writer.write_float(percentage, 0.0, 1.0, GAS_PERCENTAGE_BITS),
                None => Ok(()),
            },
            Self::AliveCount => match message.alive_count {
                Some(count) => writer.write_bits(u32::from(count), ALIVE_COUNT_BITS),
                None => Ok(()),
            },
            Self::NewPlayers => {
                writer.write_array("new players", &message.new_players, PLAYER_COUNT_BITS, |w, player| {
                    w.write_object_id(player.id)?;
                    w.write_string(&player.name, PLAYER_NAME_MAX_LENGTH)
                })
            }
            Self::DeletedPlayers => {
                writer.write_array("deleted players", &message.deleted_players, PLAYER_COUNT_BITS, |w, &id| {
                    w.write_object_id(id)
                })
            }
        }
    }

    fn read(
        self,
        message: &mut UpdateMessage,
        reader: &mut BitReader<'_>,
        definitions: &Definitions,
        cache: &PlayerStateCache,
    ) -> DecodeResult<()> {
        match self {
            Self::PlayerData => {
                message.player_data = Some(PlayerData::read(reader, definitions, cache)?);
            }
            Self::DeletedObjects => {
                message.deleted_objects = reader.read_array(OBJECT_COUNT_BITS, BitReader::read_object_id)?;
            }
            Self::FullObjects => {
                message.full_objects =
                    reader.read_array(OBJECT_COUNT_BITS, |r| ObjectFullUpdate::read(r, definitions))?;
            }
            Self::PartialObjects => {
                message.partial_objects =
                    reader.read_array(OBJECT_COUNT_BITS, |r| ObjectPartialUpdate::read(r, definitions))?;
            }
            Self::Bullets => {
                message.bullets = reader.read_array(BULLET_COUNT_BITS, |r| {
                    Ok(Bullet {
                        source: definitions.loots.read_from_stream(r)?,
                        shooter: r.read_object_id()?,
                        position: r.read_position()?,
                        rotation: r.read_rotation()?,
                        reflection_count: r.read_bits(REFLECTION_BITS)? as u8,
                    })
                })?;
            }
            Self::Explosions => {
                message.explosions = reader.read_array(EXPLOSION_COUNT_BITS, |r| {
                    Ok(Explosion {
                        definition: definitions.explosions.read_from_stream(r)?,
                        position: r.read_position()?,
                    })
                })?;
            }
            Self::Emotes => {
                message.emotes = reader.read_array(EMOTE_COUNT_BITS, |r| {
                    Ok(Emote {
                        definition: definitions.emotes.read_from_stream(r)?,
                        player: r.read_object_id()?,
                    })
                })?;
            }
            Self::Gas => message.gas = Some(read_gas(reader)?),
            Self::GasPercentage => {
                message.gas_percentage = Some(reader.read_float(0.0, 1.0, GAS_PERCENTAGE_BITS)?);
            }
            Self::AliveCount => message.alive_count = Some(reader.read_bits(ALIVE_COUNT_BITS)? as u8),
            Self::NewPlayers => {
                message.new_players = reader.read_array(PLAYER_COUNT_BITS, |r| {
                    Ok(NewPlayer {
                        id: r.read_object_id()?,
                        name: r.read_string(PLAYER_NAME_MAX_LENGTH)?,
                    })
                })?;
            }
            Self::DeletedPlayers => {
                message.deleted_players = reader.read_array(PLAYER_COUNT_BITS, BitReader::read_object_id)?;
            }
        }
        Ok(())
    }
}

fn write_gas(writer: &mut BitWriter, gas: &GasState) -> EncodeResult<()> {
    writer.write_bits(gas.mode as u32, GAS_MODE_BITS)?;
    writer.write_bits(u32::from(gas.countdown), GAS_COUNTDOWN_BITS)?;
    writer.write_position(gas.old_position)?;
    writer.write_position(gas.new_position)?;
    writer.write_float(gas.old_radius, 0.0, MAX_GAS_RADIUS, GAS_RADIUS_BITS)?;
    writer.write_float(gas.new_radius, 0.0, MAX_GAS_RADIUS, GAS_RADIUS_BITS)
}

fn read_gas(reader: &mut BitReader<'_>) -> DecodeResult<GasState> {
    let tag = reader.read_bits(GAS_MODE_BITS)?;
    let mode = GasMode::from_u8(tag as u8).ok_or(DecodeError::InvalidTag {
        kind: "gas mode",
        value: tag,
    })?;

    Ok(GasState {
        mode,
        countdown: reader.read_bits(GAS_COUNTDOWN_BITS)? as u8,
        old_position: reader.read_position()?,
        new_position: reader.read_position()?,
        old_radius: reader.read_float(0.0, MAX_GAS_RADIUS, GAS_RADIUS_BITS)?,
        new_radius: reader.read_float(0.0, MAX_GAS_RADIUS, GAS_RADIUS_BITS)?,
    })
}

// =============================================================================
// FLAGS
// =============================================================================

/// The flags word: one bit per present [`UpdateSection`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UpdateFlags(u16);

impl UpdateFlags {
    /// Width of the flags word.
    pub const BITS: u8 = 16;

    /// Every known section bit.
    pub const KNOWN: u16 = (1 << UpdateSection::ALL.len()) - 1;

    /// No sections.
    pub const EMPTY: Self = Self(0);

    /// Flags for the sections `message` carries.
    #[must_use]
    pub fn of(message: &UpdateMessage) -> Self {
        UpdateSection::ALL
            .into_iter()
            .filter(|section| section.is_present(message))
            .fold(Self::EMPTY, |flags, section| flags.with(section))
    }

    /// Parses a flags word.
    ///
    /// # Errors
    ///
    /// [`DecodeError::ConstraintViolation`] if any bit past the known
    /// sections is set.
    pub fn from_bits(bits: u16) -> DecodeResult<Self> {
        if bits & !Self::KNOWN != 0 {
            return Err(DecodeError::ConstraintViolation {
                what: "update flags",
                detail: format!("unknown section bits {:#06x}", bits & !Self::KNOWN),
            });
        }
        Ok(Self(bits))
    }

    /// Raw word.
    #[inline]
    #[must_use]
    pub const fn bits(self) -> u16 {
        self.0
    }

    /// Adds a section.
    #[inline]
    #[must_use]
    pub const fn with(self, section: UpdateSection) -> Self {
        Self(self.0 | section.bit())
    }

    /// True if the section is flagged.
    #[inline]
    #[must_use]
    pub const fn contains(self, section: UpdateSection) -> bool {
        self.0 & section.bit() != 0
    }
}

impl UpdateMessage {
    /// Flags for this message.
    #[must_use]
    pub fn flags(&self) -> UpdateFlags {
        UpdateFlags::of(self)
    }

    /// Writes the flags word, then every present section in order.
    ///
    /// `cache` holds the bounds the receiver last saw; it is not updated here.
    ///
    /// # Errors
    ///
    /// Fails on buffer overflow, an over-long list or a foreign registry
    /// index.
    pub fn write(&self, writer: &mut BitWriter, definitions: &Definitions, cache: &PlayerStateCache) -> EncodeResult<()> {
        let flags = self.flags();
        writer.write_bits(u32::from(flags.bits()), UpdateFlags::BITS)?;

        for section in UpdateSection::ALL {
            if flags.contains(section) {
                section.write(self, writer, definitions, cache)?;
            }
        }
        Ok(())
    }

    /// Reads the flags word, then every flagged section in order.
    ///
    /// # Errors
    ///
    /// Fails on truncated or invalid input.
    pub fn read(reader: &mut BitReader<'_>, definitions: &Definitions, cache: &PlayerStateCache) -> DecodeResult<Self> {
        let flags = UpdateFlags::from_bits(reader.read_bits(UpdateFlags::BITS)? as u16)?;

        let mut message = Self::default();
        for section in UpdateSection::ALL {
            if flags.contains(section) {
                section.read(&mut message, reader, definitions, cache)?;
            }
        }
        Ok(message)
    }
}
