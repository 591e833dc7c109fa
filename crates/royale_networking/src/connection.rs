//! # Inbound Connection
//!
//! Turns transport chunks into packets. A message that fails to decode is
//! logged, counted and dropped; the frame boundary puts the next message back
//! on track.
//!
//! ```text
//! ┌───────────┐  Vec<u8>  ┌──────────────────────────────┐  Packet  ┌──────┐
//! │ transport │ ────────▶ │ FrameDecoder ▶ PacketDecoder │ ───────▶ │ game │
//! └───────────┘           └──────────────────────────────┘          └──────┘
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender};
use royale_shared::Definitions;

use crate::config::ProtocolConfig;
use crate::protocol::{FrameDecoder, Packet, PacketDecoder, PlayerStateCache};

/// Counters for one connection. Readable from other threads while
/// [`Connection::run`] is going.
#[derive(Debug, Default)]
pub struct ConnectionStats {
    /// Frames received.
    pub frames: AtomicU64,
    /// Packets decoded and delivered.
    pub decoded: AtomicU64,
    /// Messages dropped on a decode error.
    pub dropped: AtomicU64,
    /// Frames skipped for exceeding the size limit.
    pub oversized: AtomicU64,
}

/// Bounded channel for decoded packets, sized by the config.
#[must_use]
pub fn packet_channel(config: &ProtocolConfig) -> (Sender<Packet>, Receiver<Packet>) {
    crossbeam_channel::bounded(config.inbound_channel_capacity)
}

/// Inbound side of one connection.
pub struct Connection {
    frames: FrameDecoder,
    decoder: PacketDecoder,
    stats: Arc<ConnectionStats>,
}

impl Connection {
    /// Creates a connection with the given limits.
    #[must_use]
    pub fn new(definitions: Arc<Definitions>, config: &ProtocolConfig) -> Self {
        Self {
            frames: FrameDecoder::new(config.max_frame_size),
            decoder: PacketDecoder::new(definitions),
            stats: Arc::new(ConnectionStats::default()),
        }
    }

    /// Shared handle to the counters.
    #[must_use]
    pub fn stats(&self) -> Arc<ConnectionStats> {
        Arc::clone(&self.stats)
    }

    /// Own-player state as last decoded.
    #[must_use]
    pub const fn player_cache(&self) -> &PlayerStateCache {
        self.decoder.cache()
    }

    /// Feeds a transport chunk and returns every packet it completed.
    ///
    /// Bad messages never surface here; see [`ConnectionStats::dropped`].
    pub fn receive(&mut self, chunk: &[u8]) -> Vec<Packet> {
        self.frames.push(chunk);

        let mut packets = Vec::new();
        loop {
            match self.frames.next_frame() {
                Ok(Some(frame)) => {
                    self.stats.frames.fetch_add(1, Ordering::Relaxed);
                    match self.decoder.decode(&frame) {
                        Ok(packet) => {
                            self.stats.decoded.fetch_add(1, Ordering::Relaxed);
                            packets.push(packet);
                        }
                        Err(error) => {
                            self.stats.dropped.fetch_add(1, Ordering::Relaxed);
                            tracing::warn!(%error, len = frame.len(), "dropping undecodable message");
                        }
                    }
                }
                Ok(None) => break,
                Err(error) => {
                    self.stats.oversized.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!(%error, "skipping oversized frame");
                }
            }
        }
        packets
    }

    /// Drains `inbound` until it disconnects, forwarding decoded packets.
    ///
    /// Returns early if the `outbound` receiver is dropped.
    pub fn run(mut self, inbound: &Receiver<Vec<u8>>, outbound: &Sender<Packet>) {
        tracing::info!("connection loop started");

        'outer: for chunk in inbound {
            for packet in self.receive(&chunk) {
                if outbound.send(packet).is_err() {
                    tracing::debug!("packet consumer gone");
                    break 'outer;
                }
            }
        }

        tracing::info!(
            frames = self.stats.frames.load(Ordering::Relaxed),
            decoded = self.stats.decoded.load(Ordering::Relaxed),
            dropped = self.stats.dropped.load(Ordering::Relaxed),
            oversized = self.stats.oversized.load(Ordering::Relaxed),
            "connection loop stopped"
        );
    }
}
