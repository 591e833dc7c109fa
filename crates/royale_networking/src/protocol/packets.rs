//! # Packet Definitions
//!
//! Every message starts with a 4-bit [`PacketType`] tag; the tag alone picks
//! the body layout.
//!
//! ```text
//! ┌──────┬────────────────────────────────────────┐
//! │ tag4 │ body (layout chosen by tag)            │
//! └──────┴────────────────────────────────────────┘
//! ```
//!
//! [`PacketEncoder`] and [`PacketDecoder`] own the per-connection state: the
//! shared definitions and the own-player cache that update messages need
//! across ticks.

use std::sync::Arc;

use royale_shared::constants::{EMOTE_SLOTS, PLAYER_NAME_MAX_LENGTH, WEAPON_SLOTS};
use royale_shared::{bits_for, DefinitionIndex, Definitions, EmoteDefinition, LootDefinition};

use super::kill_feed::KillFeedMessage;
use super::objects::ObjectId;
use super::stream::{BitReader, BitWriter};
use super::update::{PlayerStateCache, UpdateMessage};
use super::variant::VariantStream;
use crate::config::ProtocolConfig;
use crate::error::{DecodeError, DecodeResult, EncodeResult};

const PACKET_TAG_BITS: u8 = 4;
const ACTION_COUNT_BITS: u8 = 3;
const ACTION_TAG_BITS: u8 = 3;
const SLOT_BITS: u8 = bits_for(WEAPON_SLOTS);
const SPECTATE_TAG_BITS: u8 = 3;
const RANK_BITS: u8 = 7;
const GAME_OVER_KILLS_BITS: u8 = 8;
const DAMAGE_BITS: u8 = 16;
const TIME_ALIVE_BITS: u8 = 16;

/// Types of packets in the protocol.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum PacketType {
    /// Client -> Server: join request.
    Join = 0,
    /// Server -> Client: join accepted.
    Joined = 1,
    /// Client -> Server: input for this tick.
    Input = 2,
    /// Server -> Client: per-tick world delta.
    Update = 3,
    /// Server -> Client: kill feed entry.
    KillFeed = 4,
    /// Server -> Client: match result.
    GameOver = 5,
    /// Server -> Client: item picked up.
    Pickup = 6,
    /// Client -> Server: spectator control.
    Spectate = 7,
    /// Bidirectional: keep-alive.
    Ping = 8,
}

impl PacketType {
    /// Converts a wire tag.
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Join),
            1 => Some(Self::Joined),
            2 => Some(Self::Input),
            3 => Some(Self::Update),
            4 => Some(Self::KillFeed),
            5 => Some(Self::GameOver),
            6 => Some(Self::Pickup),
            7 => Some(Self::Spectate),
            8 => Some(Self::Ping),
            _ => None,
        }
    }
}

// =============================================================================
// PACKET BODIES
// =============================================================================

/// Emote wheel; empty slots are `None`.
pub type EmoteSlots = [Option<DefinitionIndex<EmoteDefinition>>; EMOTE_SLOTS];

fn write_emote_slots(writer: &mut BitWriter, definitions: &Definitions, emotes: &EmoteSlots) -> EncodeResult<()> {
    for slot in emotes {
        writer.write_option(slot.as_ref(), |w, &emote| definitions.emotes.write_to_stream(w, emote))?;
    }
    Ok(())
}

fn read_emote_slots(reader: &mut BitReader<'_>, definitions: &Definitions) -> DecodeResult<EmoteSlots> {
    let mut emotes = [None; EMOTE_SLOTS];
    for slot in &mut emotes {
        *slot = reader.read_option(|r| definitions.emotes.read_from_stream(r))?;
    }
    Ok(emotes)
}

/// Join request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JoinPacket {
    /// Display name; truncated on the wire.
    pub name: String,
    /// Client runs on a touch device.
    pub is_mobile: bool,
    /// Chosen skin.
    pub skin: DefinitionIndex<LootDefinition>,
    /// Emote wheel.
    pub emotes: EmoteSlots,
}

/// Join accepted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct JoinedPacket {
    /// Object id of the joining player.
    pub player_id: ObjectId,
    /// Emote wheel as accepted by the server.
    pub emotes: EmoteSlots,
}

/// One discrete action from the input packet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputAction {
    /// Use a consumable.
    UseItem(DefinitionIndex<LootDefinition>),
    /// Switch to a weapon slot.
    EquipItem {
        /// Slot index.
        slot: u8,
    },
    /// Drop the weapon in a slot.
    DropWeapon {
        /// Slot index.
        slot: u8,
    },
    /// Swap the two gun slots.
    SwapGunSlots,
    /// Open a door, press a button, pick up loot.
    Interact,
    /// Reload the active gun.
    Reload,
    /// Cancel the current action.
    Cancel,
    /// Show an emote.
    Emote(DefinitionIndex<EmoteDefinition>),
}

impl InputAction {
    const fn tag(self) -> u32 {
        match self {
            Self::UseItem(_) => 0,
            Self::EquipItem { .. } => 1,
            Self::DropWeapon { .. } => 2,
            Self::SwapGunSlots => 3,
            Self::Interact => 4,
            Self::Reload => 5,
            Self::Cancel => 6,
            Self::Emote(_) => 7,
        }
    }

    fn write(self, writer: &mut BitWriter, definitions: &Definitions) -> EncodeResult<()> {
        writer.write_bits(self.tag(), ACTION_TAG_BITS)?;
        match self {
            Self::UseItem(item) => definitions.loots.write_to_stream(writer, item),
            Self::EquipItem { slot } | Self::DropWeapon { slot } => writer.write_bits(u32::from(slot), SLOT_BITS),
            Self::Emote(emote) => definitions.emotes.write_to_stream(writer, emote),
            Self::SwapGunSlots | Self::Interact | Self::Reload | Self::Cancel => Ok(()),
        }
    }

    fn read(reader: &mut BitReader<'_>, definitions: &Definitions) -> DecodeResult<Self> {
        // Every 3-bit tag is assigned
        let action = match reader.read_bits(ACTION_TAG_BITS)? {
            0 => Self::UseItem(definitions.loots.read_from_stream(reader)?),
            1 => Self::EquipItem {
                slot: reader.read_bits(SLOT_BITS)? as u8,
            },
            2 => Self::DropWeapon {
                slot: reader.read_bits(SLOT_BITS)? as u8,
            },
            3 => Self::SwapGunSlots,
            4 => Self::Interact,
            5 => Self::Reload,
            6 => Self::Cancel,
            _ => Self::Emote(definitions.emotes.read_from_stream(reader)?),
        };
        Ok(action)
    }
}

/// Client input for one tick.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InputPacket {
    /// Moving up.
    pub up: bool,
    /// Moving down.
    pub down: bool,
    /// Moving left.
    pub left: bool,
    /// Moving right.
    pub right: bool,
    /// Attack held.
    pub attacking: bool,
    /// New facing angle, if the player turned.
    pub rotation: Option<f32>,
    /// Discrete actions, at most 7.
    pub actions: Vec<InputAction>,
}

/// Match result for one player.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GameOverPacket {
    /// Player won.
    pub won: bool,
    /// Player the result is for.
    pub player_id: ObjectId,
    /// Final placement.
    pub rank: u8,
    /// Kills.
    pub kills: u8,
    /// Damage dealt.
    pub damage_done: u16,
    /// Damage received.
    pub damage_taken: u16,
    /// Seconds survived.
    pub time_alive: u16,
}

/// Spectator control.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpectateAction {
    /// Start spectating after death.
    BeginSpectating,
    /// Previous living player.
    SpectatePrevious,
    /// Next living player.
    SpectateNext,
    /// A specific player.
    SpectateSpecific(ObjectId),
    /// The current kill leader.
    SpectateKillLeader,
    /// Report the spectated player.
    Report,
}

impl SpectateAction {
    const fn tag(self) -> u32 {
        match self {
            Self::BeginSpectating => 0,
            Self::SpectatePrevious => 1,
            Self::SpectateNext => 2,
            Self::SpectateSpecific(_) => 3,
            Self::SpectateKillLeader => 4,
            Self::Report => 5,
        }
    }
}

// =============================================================================
// PACKET
// =============================================================================

/// Any protocol message.
#[derive(Clone, Debug, PartialEq)]
pub enum Packet {
    /// Join request.
    Join(JoinPacket),
    /// Join accepted.
    Joined(JoinedPacket),
    /// Client input.
    Input(InputPacket),
    /// World delta.
    Update(Box<UpdateMessage>),
    /// Kill feed entry.
    KillFeed(KillFeedMessage),
    /// Match result.
    GameOver(GameOverPacket),
    /// Item picked up.
    Pickup(DefinitionIndex<LootDefinition>),
    /// Spectator control.
    Spectate(SpectateAction),
    /// Keep-alive.
    Ping,
}

impl Packet {
    /// Type tag of this packet.
    #[must_use]
    pub const fn packet_type(&self) -> PacketType {
        match self {
            Self::Join(_) => PacketType::Join,
            Self::Joined(_) => PacketType::Joined,
            Self::Input(_) => PacketType::Input,
            Self::Update(_) => PacketType::Update,
            Self::KillFeed(_) => PacketType::KillFeed,
            Self::GameOver(_) => PacketType::GameOver,
            Self::Pickup(_) => PacketType::Pickup,
            Self::Spectate(_) => PacketType::Spectate,
            Self::Ping => PacketType::Ping,
        }
    }

    /// Writes the tag and body.
    ///
    /// # Errors
    ///
    /// Fails on buffer overflow, an over-long list or a foreign registry
    /// index.
    pub fn write(&self, writer: &mut BitWriter, definitions: &Definitions, cache: &PlayerStateCache) -> EncodeResult<()> {
        writer.write_bits(self.packet_type() as u32, PACKET_TAG_BITS)?;

        match self {
            Self::Join(join) => {
                writer.write_string(&join.name, PLAYER_NAME_MAX_LENGTH)?;
                writer.write_bool(join.is_mobile)?;
                definitions.loots.write_to_stream(writer, join.skin)?;
                write_emote_slots(writer, definitions, &join.emotes)
            }
            Self::Joined(joined) => {
                writer.write_object_id(joined.player_id)?;
                write_emote_slots(writer, definitions, &joined.emotes)
            }
            Self::Input(input) => {
                for flag in [input.up, input.down, input.left, input.right, input.attacking] {
                    writer.write_bool(flag)?;
                }
                writer.write_option(input.rotation.as_ref(), |w, &rotation| w.write_rotation(rotation))?;
                writer.write_array("input actions", &input.actions, ACTION_COUNT_BITS, |w, &action| {
                    action.write(w, definitions)
                })
            }
            Self::Update(update) => update.write(writer, definitions, cache),
            Self::KillFeed(message) => message.write(writer, definitions),
            Self::GameOver(result) => {
                writer.write_bool(result.won)?;
                writer.write_object_id(result.player_id)?;
                writer.write_bits(u32::from(result.rank), RANK_BITS)?;
                writer.write_bits(u32::from(result.kills), GAME_OVER_KILLS_BITS)?;
                writer.write_bits(u32::from(result.damage_done), DAMAGE_BITS)?;
                writer.write_bits(u32::from(result.damage_taken), DAMAGE_BITS)?;
                writer.write_bits(u32::from(result.time_alive), TIME_ALIVE_BITS)
            }
            Self::Pickup(item) => definitions.loots.write_to_stream(writer, *item),
            Self::Spectate(action) => {
                writer.write_bits(action.tag(), SPECTATE_TAG_BITS)?;
                match action {
                    SpectateAction::SpectateSpecific(id) => writer.write_object_id(*id),
                    _ => Ok(()),
                }
            }
            Self::Ping => Ok(()),
        }
    }

    /// Reads a tag and its body.
    ///
    /// # Errors
    ///
    /// Fails on truncated or invalid input.
    pub fn read(reader: &mut BitReader<'_>, definitions: &Definitions, cache: &PlayerStateCache) -> DecodeResult<Self> {
        let tag = reader.read_bits(PACKET_TAG_BITS)?;
        let packet_type = PacketType::from_u8(tag as u8).ok_or(DecodeError::InvalidTag {
            kind: "packet type",
            value: tag,
        })?;

        let packet = match packet_type {
            PacketType::Join => Self::Join(JoinPacket {
                name: reader.read_string(PLAYER_NAME_MAX_LENGTH)?,
                is_mobile: reader.read_bool()?,
                skin: definitions.loots.read_from_stream(reader)?,
                emotes: read_emote_slots(reader, definitions)?,
            }),
            PacketType::Joined => Self::Joined(JoinedPacket {
                player_id: reader.read_object_id()?,
                emotes: read_emote_slots(reader, definitions)?,
            }),
            PacketType::Input => Self::Input(InputPacket {
                up: reader.read_bool()?,
                down: reader.read_bool()?,
                left: reader.read_bool()?,
                right: reader.read_bool()?,
                attacking: reader.read_bool()?,
                rotation: reader.read_option(BitReader::read_rotation)?,
                actions: reader.read_array(ACTION_COUNT_BITS, |r| InputAction::read(r, definitions))?,
            }),
            PacketType::Update => Self::Update(Box::new(UpdateMessage::read(reader, definitions, cache)?)),
            PacketType::KillFeed => Self::KillFeed(KillFeedMessage::read(reader, definitions)?),
            PacketType::GameOver => Self::GameOver(GameOverPacket {
                won: reader.read_bool()?,
                player_id: reader.read_object_id()?,
                rank: reader.read_bits(RANK_BITS)? as u8,
                kills: reader.read_bits(GAME_OVER_KILLS_BITS)? as u8,
                damage_done: reader.read_bits(DAMAGE_BITS)? as u16,
                damage_taken: reader.read_bits(DAMAGE_BITS)? as u16,
                time_alive: reader.read_bits(TIME_ALIVE_BITS)? as u16,
            }),
            PacketType::Pickup => Self::Pickup(definitions.loots.read_from_stream(reader)?),
            PacketType::Spectate => Self::Spectate(match reader.read_bits(SPECTATE_TAG_BITS)? {
                0 => SpectateAction::BeginSpectating,
                1 => SpectateAction::SpectatePrevious,
                2 => SpectateAction::SpectateNext,
                3 => SpectateAction::SpectateSpecific(reader.read_object_id()?),
                4 => SpectateAction::SpectateKillLeader,
                5 => SpectateAction::Report,
                value => {
                    return Err(DecodeError::InvalidTag {
                        kind: "spectate action",
                        value,
                    })
                }
            }),
            PacketType::Ping => Self::Ping,
        };
        Ok(packet)
    }
}

// =============================================================================
// ENCODER / DECODER
// =============================================================================

/// Encodes packets for one connection.
///
/// Holds the own-player cache so health and adrenaline are quantized over the
/// bounds the receiver last saw.
pub struct PacketEncoder {
    definitions: Arc<Definitions>,
    writer: BitWriter,
    cache: PlayerStateCache,
}

impl PacketEncoder {
    /// Creates an encoder with the default packet size limit.
    #[must_use]
    pub fn new(definitions: Arc<Definitions>) -> Self {
        Self::with_config(definitions, &ProtocolConfig::default())
    }

    /// Creates an encoder with the configured packet size limit.
    #[must_use]
    pub fn with_config(definitions: Arc<Definitions>, config: &ProtocolConfig) -> Self {
        Self {
            definitions,
            writer: BitWriter::with_capacity(config.max_packet_size),
            cache: PlayerStateCache::new(),
        }
    }

    /// Own-player state the receiver is known to hold.
    #[inline]
    #[must_use]
    pub const fn cache(&self) -> &PlayerStateCache {
        &self.cache
    }

    /// Encodes `packet` into a fresh buffer owned by the caller.
    ///
    /// # Errors
    ///
    /// Fails if the packet does not fit the size limit or breaks a schema
    /// limit. The cache is only updated on success.
    pub fn encode(&mut self, packet: &Packet) -> EncodeResult<Vec<u8>> {
        self.writer.reset();
        packet.write(&mut self.writer, &self.definitions, &self.cache)?;

        if let Packet::Update(update) = packet {
            if let Some(data) = &update.player_data {
                self.cache.apply(data);
            }
        }

        tracing::trace!(
            packet_type = ?packet.packet_type(),
            bits = self.writer.bit_len(),
            "packet encoded"
        );
        Ok(self.writer.as_slice().to_vec())
    }
}

/// Decodes packets for one connection.
pub struct PacketDecoder {
    definitions: Arc<Definitions>,
    cache: PlayerStateCache,
}

impl PacketDecoder {
    /// Creates a decoder with an empty own-player cache.
    #[must_use]
    pub fn new(definitions: Arc<Definitions>) -> Self {
        Self {
            definitions,
            cache: PlayerStateCache::new(),
        }
    }

    /// Last known own-player state.
    #[inline]
    #[must_use]
    pub const fn cache(&self) -> &PlayerStateCache {
        &self.cache
    }

    /// Decodes one whole message.
    ///
    /// # Errors
    ///
    /// Fails on truncated or invalid input, or if a whole byte or more is
    /// left over. A failed decode leaves the cache untouched.
    pub fn decode(&mut self, bytes: &[u8]) -> DecodeResult<Packet> {
        let mut reader = BitReader::new(bytes);
        let packet = Packet::read(&mut reader, &self.definitions, &self.cache)?;

        if reader.remaining_bits() >= 8 {
            return Err(DecodeError::ConstraintViolation {
                what: "message length",
                detail: format!("{} trailing bits", reader.remaining_bits()),
            });
        }

        if let Packet::Update(update) = &packet {
            if let Some(data) = &update.player_data {
                self.cache.apply(data);
            }
        }
        Ok(packet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::update::PlayerData;
    use crate::test_fixtures::definitions;

    fn pair() -> (PacketEncoder, PacketDecoder) {
        let definitions = Arc::new(definitions());
        (PacketEncoder::new(Arc::clone(&definitions)), PacketDecoder::new(definitions))
    }

    fn round_trip(packet: &Packet) -> Packet {
        let (mut encoder, mut decoder) = pair();
        let bytes = encoder.encode(packet).unwrap();
        decoder.decode(&bytes).unwrap()
    }

    #[test]
    fn test_ping_is_one_byte() {
        let (mut encoder, mut decoder) = pair();
        let bytes = encoder.encode(&Packet::Ping).unwrap();
        assert_eq!(bytes, vec![PacketType::Ping as u8]);
        assert_eq!(decoder.decode(&bytes).unwrap(), Packet::Ping);
    }

    #[test]
    fn test_join_round_trip() {
        let definitions = definitions();
        let packet = Packet::Join(JoinPacket {
            name: "survivor".to_owned(),
            is_mobile: true,
            skin: definitions.loots.index_of("hazel_jumpsuit").unwrap(),
            emotes: [
                definitions.emotes.index_of("happy_face"),
                None,
                definitions.emotes.index_of("sad_face"),
                None,
            ],
        });
        assert_eq!(round_trip(&packet), packet);
    }

    #[test]
    fn test_input_round_trip() {
        let definitions = definitions();
        let packet = Packet::Input(InputPacket {
            up: true,
            right: true,
            attacking: true,
            rotation: Some(0.0),
            actions: vec![
                InputAction::UseItem(definitions.loots.index_of("gauze").unwrap()),
                InputAction::EquipItem { slot: 2 },
                InputAction::Reload,
                InputAction::Emote(definitions.emotes.index_of("thumbs_up").unwrap()),
            ],
            ..InputPacket::default()
        });

        let Packet::Input(decoded) = round_trip(&packet) else {
            panic!("expected input");
        };
        let Packet::Input(original) = packet else { unreachable!() };
        assert_eq!(decoded.actions, original.actions);
        assert!(decoded.up && decoded.right && decoded.attacking);
        assert!(!decoded.down && !decoded.left);
        assert!(decoded.rotation.unwrap().abs() < 1e-3);
    }

    #[test]
    fn test_game_over_and_spectate_round_trip() {
        let over = Packet::GameOver(GameOverPacket {
            won: true,
            player_id: ObjectId(3),
            rank: 1,
            kills: 12,
            damage_done: 1450,
            damage_taken: 99,
            time_alive: 612,
        });
        assert_eq!(round_trip(&over), over);

        let spectate = Packet::Spectate(SpectateAction::SpectateSpecific(ObjectId(17)));
        assert_eq!(round_trip(&spectate), spectate);
    }

    #[test]
    fn test_unknown_packet_tag_rejected() {
        let (_, mut decoder) = pair();
        assert_eq!(
            decoder.decode(&[0x0F]),
            Err(DecodeError::InvalidTag {
                kind: "packet type",
                value: 15
            })
        );
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let (mut encoder, mut decoder) = pair();
        let mut bytes = encoder.encode(&Packet::Ping).unwrap();
        bytes.push(0);
        assert!(matches!(
            decoder.decode(&bytes),
            Err(DecodeError::ConstraintViolation { what: "message length", .. })
        ));
    }

    #[test]
    fn test_caches_track_bounds_across_updates() {
        use crate::protocol::update::HealthBounds;

        let (mut encoder, mut decoder) = pair();
        let bounds = HealthBounds {
            max_health: 200.0,
            ..HealthBounds::default()
        };

        let first = Packet::Update(Box::new(UpdateMessage {
            player_data: Some(PlayerData {
                bounds: Some(bounds),
                health: Some(200.0),
                ..PlayerData::default()
            }),
            ..UpdateMessage::default()
        }));
        decoder.decode(&encoder.encode(&first).unwrap()).unwrap();
        assert_eq!(decoder.cache().bounds, bounds);
        assert_eq!(encoder.cache(), decoder.cache());

        // Second tick: health only, quantized over the cached bounds
        let second = Packet::Update(Box::new(UpdateMessage {
            player_data: Some(PlayerData {
                health: Some(200.0),
                ..PlayerData::default()
            }),
            ..UpdateMessage::default()
        }));
        decoder.decode(&encoder.encode(&second).unwrap()).unwrap();
        assert_eq!(decoder.cache().health, 200.0);
    }

    #[test]
    fn test_failed_decode_keeps_cache() {
        let (mut encoder, mut decoder) = pair();
        let packet = Packet::Update(Box::new(UpdateMessage {
            player_data: Some(PlayerData {
                zoom: Some(64),
                ..PlayerData::default()
            }),
            alive_count: Some(10),
            ..UpdateMessage::default()
        }));
        let bytes = encoder.encode(&packet).unwrap();

        assert!(decoder.decode(&bytes[..bytes.len() - 1]).is_err());
        assert_eq!(decoder.cache().zoom, 0);

        decoder.decode(&bytes).unwrap();
        assert_eq!(decoder.cache().zoom, 64);
    }

    #[test]
    fn test_bad_bounds_do_not_poison_cache() {
        use crate::protocol::update::HealthBounds;

        let (mut encoder, mut decoder) = pair();
        let poisoned = Packet::Update(Box::new(UpdateMessage {
            player_data: Some(PlayerData {
                bounds: Some(HealthBounds {
                    max_health: f32::NAN,
                    min_adrenaline: 80.0,
                    max_adrenaline: 20.0,
                }),
                ..PlayerData::default()
            }),
            ..UpdateMessage::default()
        }));
        let bytes = encoder.encode(&poisoned).unwrap();
        assert!(matches!(
            decoder.decode(&bytes),
            Err(DecodeError::ConstraintViolation { what: "health bounds", .. })
        ));
        assert_eq!(decoder.cache(), &PlayerStateCache::new());

        let (mut honest, _) = pair();
        let packet = Packet::Update(Box::new(UpdateMessage {
            player_data: Some(PlayerData {
                health: Some(50.0),
                adrenaline: Some(10.0),
                ..PlayerData::default()
            }),
            ..UpdateMessage::default()
        }));
        let bytes = honest.encode(&packet).unwrap();
        decoder.decode(&bytes).unwrap();
        assert!((decoder.cache().health - 50.0).abs() <= 100.0 / 4095.0);
        assert!((decoder.cache().adrenaline - 10.0).abs() <= 100.0 / 1023.0);
    }
}
