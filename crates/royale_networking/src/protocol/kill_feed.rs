//! # Kill Feed
//!
//! A tagged union. The 2-bit tag alone decides which fields follow:
//!
//! ```text
//! Kill               victim [killer? id kills] [cause? bool ref] streak
//! KillLeaderAssigned id kills
//! KillLeaderUpdated  kills
//! KillLeaderDead     killer
//! ```

use royale_shared::{DefinitionIndex, Definitions, ExplosionDefinition, LootDefinition};

use super::objects::ObjectId;
use super::stream::{BitReader, BitWriter};
use super::variant::VariantStream;
use crate::error::{DecodeError, DecodeResult, EncodeResult};

const MESSAGE_TAG_BITS: u8 = 2;
const KILLS_BITS: u8 = 7;

/// What a kill was made with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KillCause {
    /// A weapon or throwable.
    Item(DefinitionIndex<LootDefinition>),
    /// An explosion (barrel, grenade blast).
    Explosion(DefinitionIndex<ExplosionDefinition>),
}

impl KillCause {
    fn write(self, writer: &mut BitWriter, definitions: &Definitions) -> EncodeResult<()> {
        match self {
            Self::Item(index) => {
                writer.write_bool(false)?;
                definitions.loots.write_to_stream(writer, index)
            }
            Self::Explosion(index) => {
                writer.write_bool(true)?;
                definitions.explosions.write_to_stream(writer, index)
            }
        }
    }

    fn read(reader: &mut BitReader<'_>, definitions: &Definitions) -> DecodeResult<Self> {
        if reader.read_bool()? {
            definitions.explosions.read_from_stream(reader).map(Self::Explosion)
        } else {
            definitions.loots.read_from_stream(reader).map(Self::Item)
        }
    }
}

/// Killer id and their kill count after this kill.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Killer {
    /// Killer's player id.
    pub id: ObjectId,
    /// Killer's total kills.
    pub kills: u8,
}

/// A kill-feed entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KillFeedMessage {
    /// A player died.
    Kill {
        /// Player who died.
        victim: ObjectId,
        /// Absent for gas and suicide deaths.
        killer: Option<Killer>,
        /// Absent when nothing was used.
        cause: Option<KillCause>,
        /// Killer's current streak.
        kill_streak: u8,
    },
    /// A new kill leader.
    KillLeaderAssigned {
        /// Leader's player id.
        id: ObjectId,
        /// Leader's kills.
        kills: u8,
    },
    /// The kill leader's count went up.
    KillLeaderUpdated {
        /// Leader's kills.
        kills: u8,
    },
    /// The kill leader died.
    KillLeaderDead {
        /// Who killed them.
        killer: ObjectId,
    },
}

impl KillFeedMessage {
    const fn tag(&self) -> u32 {
        match self {
            Self::Kill { .. } => 0,
            Self::KillLeaderAssigned { .. } => 1,
            Self::KillLeaderUpdated { .. } => 2,
            Self::KillLeaderDead { .. } => 3,
        }
    }

    /// Writes the tag and its fields.
    ///
    /// # Errors
    ///
    /// Fails on buffer overflow or a foreign registry index.
    pub fn write(&self, writer: &mut BitWriter, definitions: &Definitions) -> EncodeResult<()> {
        writer.write_bits(self.tag(), MESSAGE_TAG_BITS)?;

        match *self {
            Self::Kill {
                victim,
                killer,
                cause,
                kill_streak,
            } => {
                writer.write_object_id(victim)?;
                writer.write_option(killer.as_ref(), |w, killer| {
                    w.write_object_id(killer.id)?;
                    w.write_bits(u32::from(killer.kills), KILLS_BITS)
                })?;
                writer.write_option(cause.as_ref(), |w, &cause| cause.write(w, definitions))?;
                writer.write_bits(u32::from(kill_streak), KILLS_BITS)
            }
            Self::KillLeaderAssigned { id, kills } => {
                writer.write_object_id(id)?;
                writer.write_bits(u32::from(kills), KILLS_BITS)
            }
            Self::KillLeaderUpdated { kills } => writer.write_bits(u32::from(kills), KILLS_BITS),
            Self::KillLeaderDead { killer } => writer.write_object_id(killer),
        }
    }

    /// Reads a tag and only the fields that tag carries.
    ///
    /// # Errors
    ///
    /// Fails on truncated or invalid input.
    pub fn read(reader: &mut BitReader<'_>, definitions: &Definitions) -> DecodeResult<Self> {
        let tag = reader.read_bits(MESSAGE_TAG_BITS)?;
        let message = match tag {
            0 => Self::Kill {
                victim: reader.read_object_id()?,
                killer: reader.read_option(|r| {
                    Ok(Killer {
                        id: r.read_object_id()?,
                        kills: r.read_bits(KILLS_BITS)? as u8,
                    })
                })?,
                cause: reader.read_option(|r| KillCause::read(r, definitions))?,
                kill_streak: reader.read_bits(KILLS_BITS)? as u8,
            },
            1 => Self::KillLeaderAssigned {
                id: reader.read_object_id()?,
                kills: reader.read_bits(KILLS_BITS)? as u8,
            },
            2 => Self::KillLeaderUpdated {
                kills: reader.read_bits(KILLS_BITS)? as u8,
            },
            3 => Self::KillLeaderDead {
                killer: reader.read_object_id()?,
            },
            value => {
                return Err(DecodeError::InvalidTag {
                    kind: "kill feed message",
                    value,
                })
            }
        };
        Ok(message)
    }
}
