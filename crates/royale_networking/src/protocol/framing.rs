//! # Message Framing
//!
//! Packets carry no length of their own, so a byte-stream transport wraps
//! each one in a frame:
//!
//! ```text
//! ┌──────────────┬─────────────────────────┐
//! │ len: u32 LE  │ packet bytes (len)      │
//! └──────────────┴─────────────────────────┘
//! ```
//!
//! The frame boundary lets the receiver skip a message that fails to decode
//! and carry on with the next one.

use crate::error::FrameError;

/// Size of the length prefix.
pub const FRAME_HEADER_SIZE: usize = 4;

/// Wraps a packet in a frame.
#[must_use]
pub fn encode_frame(packet: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(FRAME_HEADER_SIZE + packet.len());
    frame.extend_from_slice(&(packet.len() as u32).to_le_bytes());
    frame.extend_from_slice(packet);
    frame
}

/// Reassembles frames from arbitrarily split transport chunks.
pub struct FrameDecoder {
    buffer: Vec<u8>,
    max_frame_size: usize,
    /// Bytes of an oversized frame still to discard.
    skipping: usize,
}

impl FrameDecoder {
    /// Creates a decoder that rejects frames longer than `max_frame_size`.
    #[must_use]
    pub fn new(max_frame_size: usize) -> Self {
        Self {
            buffer: Vec::new(),
            max_frame_size,
            skipping: 0,
        }
    }

    /// Appends received bytes.
    pub fn push(&mut self, chunk: &[u8]) {
        let skipped = self.skipping.min(chunk.len());
        self.skipping -= skipped;
        self.buffer.extend_from_slice(&chunk[skipped..]);
    }

    /// Bytes buffered but not yet returned.
    #[inline]
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Returns the next complete frame, `Ok(None)` if more bytes are needed.
    ///
    /// # Errors
    ///
    /// [`FrameError::Oversized`] if the next frame is over the limit. Its body
    /// is discarded as it arrives, so the following call resumes at the next
    /// frame.
    pub fn next_frame(&mut self) -> Result<Option<Vec<u8>>, FrameError> {
        if self.skipping > 0 || self.buffer.len() < FRAME_HEADER_SIZE {
            return Ok(None);
        }

        let mut header = [0u8; FRAME_HEADER_SIZE];
        header.copy_from_slice(&self.buffer[..FRAME_HEADER_SIZE]);
        let len = u32::from_le_bytes(header) as usize;

        if len > self.max_frame_size {
            let available = self.buffer.len() - FRAME_HEADER_SIZE;
            let dropped = len.min(available);
            self.buffer.drain(..FRAME_HEADER_SIZE + dropped);
            self.skipping = len - dropped;
            return Err(FrameError::Oversized {
                len,
                max: self.max_frame_size,
            });
        }

        if self.buffer.len() < FRAME_HEADER_SIZE + len {
            return Ok(None);
        }

        let frame = self.buffer[FRAME_HEADER_SIZE..FRAME_HEADER_SIZE + len].to_vec();
        self.buffer.drain(..FRAME_HEADER_SIZE + len);
        Ok(Some(frame))
    }
}
