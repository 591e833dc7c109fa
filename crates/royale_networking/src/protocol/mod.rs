//! # Network Protocol
//!
//! Bit-packed messages between the match server and its clients.
//!
//! ## Layers
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ framing      u32 length prefix per message                   │
//! ├──────────────────────────────────────────────────────────────┤
//! │ packets      4-bit type tag + body                           │
//! │   update     flags word + sections in canonical order        │
//! │   kill_feed  2-bit tag + tag-specific fields                 │
//! ├──────────────────────────────────────────────────────────────┤
//! │ objects      per-category partial / extra codecs             │
//! │ variant      registry references as dense indices            │
//! │ stream       bits, fixed floats, positions, strings          │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Philosophy
//!
//! - Every bit counts; nothing self-describes
//! - Writer and reader share one table or one loop per layout
//! - Bad input is an error value, never garbage or a panic

mod framing;
mod kill_feed;
pub mod objects;
mod packets;
pub mod stream;
pub mod update;
mod variant;

pub use framing::{encode_frame, FrameDecoder, FRAME_HEADER_SIZE};
pub use kill_feed::{KillCause, KillFeedMessage, Killer};
pub use objects::{
    CategoryCodec, Full, FullObject, ObjectCategory, ObjectFullUpdate, ObjectId, ObjectPartialUpdate,
    PartialObject,
};
pub use packets::{
    EmoteSlots, GameOverPacket, InputAction, InputPacket, JoinPacket, JoinedPacket, Packet, PacketDecoder,
    PacketEncoder, PacketType, SpectateAction,
};
pub use stream::{BitReader, BitWriter};
pub use update::{PlayerData, PlayerStateCache, UpdateFlags, UpdateMessage, UpdateSection};
pub use variant::{resolve, VariantStream};
