//! # ROYALE Networking - The State-Sync Protocol
//!
//! Bit-packed, per-viewer world deltas for a battle-royale match.
//!
//! ## Architecture
//!
//! - **Protocol**: bit stream, registry references, per-category object
//!   codecs, dirty-flag gated update messages, kill feed and auxiliary packets
//! - **Framing**: length prefix per message so one bad message is skippable
//! - **Interest**: per-viewer full / partial / deleted bookkeeping
//! - **Connection**: inbound decode loop over `crossbeam` channels
//!
//! ## Authority Model
//!
//! ```text
//! CLIENT                           SERVER
//!   |                                 |
//!   |--- Join / Input / Spectate ---->|
//!   |                                 | <- Server simulates
//!   |<-- Update / KillFeed / ... -----|
//!   |                                 |
//! ```
//!
//! The client never determines outcomes; it only renders what updates say.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use royale_networking::{Packet, PacketDecoder, PacketEncoder};
//! use royale_shared::Definitions;
//!
//! let definitions = Arc::new(Definitions::from_file("data/definitions.toml")?);
//! let mut encoder = PacketEncoder::new(Arc::clone(&definitions));
//! let mut decoder = PacketDecoder::new(definitions);
//!
//! let bytes = encoder.encode(&Packet::Ping)?;
//! assert_eq!(decoder.decode(&bytes)?, Packet::Ping);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod config;
pub mod connection;
pub mod error;
pub mod interest;
pub mod protocol;

#[cfg(test)]
pub(crate) mod test_fixtures;

pub use config::ProtocolConfig;
pub use connection::{packet_channel, Connection, ConnectionStats};
pub use error::{ConfigError, DecodeError, DecodeResult, EncodeError, EncodeResult, FrameError};
pub use interest::{InterestPlan, InterestState, InterestTracker};
pub use protocol::{
    encode_frame, BitReader, BitWriter, FrameDecoder, KillFeedMessage, ObjectCategory, ObjectId, Packet,
    PacketDecoder, PacketEncoder, PacketType, UpdateMessage,
};

/// Default write buffer size per packet, in bytes.
///
/// Large enough for the opening update of a match, when every visible object
/// is sent in full.
pub const DEFAULT_MAX_PACKET_SIZE: usize = 1 << 15;
