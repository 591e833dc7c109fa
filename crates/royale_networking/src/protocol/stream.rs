//! # Bit Stream
//!
//! Sub-byte read/write cursor that every packet is built on.
//!
//! ## Bit Order
//!
//! ```text
//! write_bits(0b101, 3); write_bool(true); write_bits(0b11, 2);
//!
//! byte 0:  bit7 bit6 bit5 bit4 bit3 bit2 bit1 bit0
//!            0    0    1    1    1    1    0    1
//!                      └─2─┘    │    └──3──┘
//!                               └ bool
//! ```
//!
//! Values are written least-significant bit first, and each byte is filled
//! from bit 0 upwards. Unused trailing bits of the last byte are zero.
//!
//! ## Symmetry
//!
//! The stream carries no lengths or types. Every `write_*` has exactly one
//! `read_*` that consumes the same number of bits; a reader must call them in
//! the order the writer did.

use royale_shared::constants::{
    MAX_OBJECT_SCALE, MAX_POSITION, MIN_OBJECT_SCALE, OBJECT_ID_BITS, POSITION_BITS,
    ROTATION_BITS, SCALE_BITS,
};
use royale_shared::{bits_for, Vec2};

use super::objects::ObjectId;
use crate::error::{DecodeError, DecodeResult, EncodeError, EncodeResult};
use crate::DEFAULT_MAX_PACKET_SIZE;

/// Largest value representable in `bits` bits.
#[inline]
#[must_use]
pub const fn max_value(bits: u8) -> u32 {
    if bits >= 32 {
        u32::MAX
    } else {
        (1u32 << bits) - 1
    }
}

/// Maps `value` in `[min, max]` onto `0..=2^bits - 1`, clamping out-of-range
/// input. A zero-width range maps everything to 0.
#[must_use]
pub fn quantize(value: f32, min: f32, max: f32, bits: u8) -> u32 {
    let range = f64::from(max) - f64::from(min);
    if range <= 0.0 || range.is_nan() {
        return 0;
    }

    let steps = f64::from(max_value(bits));
    let normalized = ((f64::from(value) - f64::from(min)) / range).clamp(0.0, 1.0);
    // NaN input saturates to 0
    (normalized * steps).floor() as u32
}

/// Inverse of [`quantize`].
#[must_use]
pub fn dequantize(quantized: u32, min: f32, max: f32, bits: u8) -> f32 {
    let range = f64::from(max) - f64::from(min);
    if range <= 0.0 {
        return min;
    }

    let steps = f64::from(max_value(bits));
    (f64::from(min) + f64::from(quantized) / steps * range) as f32
}

/// Bits used for the length prefix of a string of at most `max_bytes` bytes.
#[inline]
#[must_use]
pub const fn string_length_bits(max_bytes: usize) -> u8 {
    bits_for(max_bytes + 1)
}

// =============================================================================
// WRITER
// =============================================================================

/// Bit writer over a fixed-capacity buffer.
///
/// One writer is normally reused across many packets via [`BitWriter::reset`],
/// so the buffer is allocated once.
pub struct BitWriter {
    buffer: Vec<u8>,
    bit_position: usize,
}

impl BitWriter {
    /// Creates a writer with the default packet capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_PACKET_SIZE)
    }

    /// Creates a writer that holds at most `bytes` bytes.
    #[must_use]
    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            buffer: vec![0u8; bytes],
            bit_position: 0,
        }
    }

    /// Clears written data for reuse.
    pub fn reset(&mut self) {
        let used = self.byte_len();
        self.buffer[..used].fill(0);
        self.bit_position = 0;
    }

    /// Number of bits written.
    #[inline]
    #[must_use]
    pub const fn bit_len(&self) -> usize {
        self.bit_position
    }

    /// Number of bytes written (rounded up).
    #[inline]
    #[must_use]
    pub const fn byte_len(&self) -> usize {
        (self.bit_position + 7) / 8
    }

    /// Bits still available.
    #[inline]
    #[must_use]
    pub fn remaining_bits(&self) -> usize {
        self.buffer.len() * 8 - self.bit_position
    }

    /// Returns the written data.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.buffer[..self.byte_len()]
    }

    /// Consumes the writer, returning the written bytes.
    #[must_use]
    pub fn into_bytes(mut self) -> Vec<u8> {
        let len = self.byte_len();
        self.buffer.truncate(len);
        self.buffer
    }

    fn reserve(&self, bits: usize) -> EncodeResult<()> {
        let available = self.remaining_bits();
        if bits > available {
            return Err(EncodeError::BufferOverflow {
                requested: bits,
                available,
            });
        }
        Ok(())
    }

    /// Writes the low `bits` bits of `value` (1-32).
    ///
    /// # Errors
    ///
    /// Fails if the buffer is full.
    pub fn write_bits(&mut self, value: u32, bits: u8) -> EncodeResult<()> {
        debug_assert!((1..=32).contains(&bits), "bit count out of range: {bits}");
        debug_assert!(
            value <= max_value(bits),
            "value {value} does not fit in {bits} bits"
        );
        self.reserve(usize::from(bits))?;

        let value = value.min(max_value(bits));
        for i in 0..bits {
            if (value >> i) & 1 == 1 {
                self.buffer[self.bit_position / 8] |= 1 << (self.bit_position % 8);
            }
            self.bit_position += 1;
        }

        Ok(())
    }

    /// Writes a boolean (1 bit).
    ///
    /// # Errors
    ///
    /// Fails if the buffer is full.
    #[inline]
    pub fn write_bool(&mut self, value: bool) -> EncodeResult<()> {
        self.write_bits(u32::from(value), 1)
    }

    /// Writes a two's complement integer in `bits` bits (2-32).
    ///
    /// # Errors
    ///
    /// Fails if the buffer is full.
    pub fn write_signed_bits(&mut self, value: i32, bits: u8) -> EncodeResult<()> {
        debug_assert!((2..=32).contains(&bits), "bit count out of range: {bits}");
        let max = (max_value(bits) >> 1) as i32;
        let min = -max - 1;
        debug_assert!(
            (min..=max).contains(&value),
            "value {value} does not fit in {bits} signed bits"
        );

        let clamped = value.clamp(min, max) as u32;
        self.write_bits(clamped & max_value(bits), bits)
    }

    /// Writes a raw 32-bit float.
    ///
    /// # Errors
    ///
    /// Fails if the buffer is full.
    #[inline]
    pub fn write_f32(&mut self, value: f32) -> EncodeResult<()> {
        self.write_bits(value.to_bits(), 32)
    }

    /// Writes a float quantized over `[min, max]` in `bits` bits.
    ///
    /// Out-of-range values are clamped. Precision is
    /// `(max - min) / (2^bits - 1)`.
    ///
    /// # Errors
    ///
    /// Fails if the buffer is full.
    #[inline]
    pub fn write_float(&mut self, value: f32, min: f32, max: f32, bits: u8) -> EncodeResult<()> {
        self.write_bits(quantize(value, min, max, bits), bits)
    }

    /// Writes a map position.
    ///
    /// # Errors
    ///
    /// Fails if the buffer is full.
    pub fn write_position(&mut self, position: Vec2) -> EncodeResult<()> {
        self.write_float(position.x, 0.0, MAX_POSITION, POSITION_BITS)?;
        self.write_float(position.y, 0.0, MAX_POSITION, POSITION_BITS)
    }

    /// Writes an angle in radians over `[-PI, PI]`.
    ///
    /// # Errors
    ///
    /// Fails if the buffer is full.
    #[inline]
    pub fn write_rotation(&mut self, rotation: f32) -> EncodeResult<()> {
        use std::f32::consts::PI;
        self.write_float(rotation, -PI, PI, ROTATION_BITS)
    }

    /// Writes an object scale.
    ///
    /// # Errors
    ///
    /// Fails if the buffer is full.
    #[inline]
    pub fn write_scale(&mut self, scale: f32) -> EncodeResult<()> {
        self.write_float(scale, MIN_OBJECT_SCALE, MAX_OBJECT_SCALE, SCALE_BITS)
    }

    /// Writes a live object id.
    ///
    /// # Errors
    ///
    /// Fails if the buffer is full.
    #[inline]
    pub fn write_object_id(&mut self, id: ObjectId) -> EncodeResult<()> {
        self.write_bits(u32::from(id.0), OBJECT_ID_BITS)
    }

    /// Writes a UTF-8 string of at most `max_bytes` bytes.
    ///
    /// Longer strings are truncated at the last char boundary that fits.
    ///
    /// # Errors
    ///
    /// Fails if the buffer is full.
    pub fn write_string(&mut self, value: &str, max_bytes: usize) -> EncodeResult<()> {
        let mut len = value.len().min(max_bytes);
        while !value.is_char_boundary(len) {
            len -= 1;
        }

        self.write_bits(len as u32, string_length_bits(max_bytes))?;
        for &byte in &value.as_bytes()[..len] {
            self.write_bits(u32::from(byte), 8)?;
        }
        Ok(())
    }

    /// Writes a presence bit, then the value if present.
    ///
    /// # Errors
    ///
    /// Propagates any error from the presence bit or the value.
    pub fn write_option<T>(
        &mut self,
        value: Option<&T>,
        write_value: impl FnOnce(&mut Self, &T) -> EncodeResult<()>,
    ) -> EncodeResult<()> {
        self.write_bool(value.is_some())?;
        match value {
            Some(value) => write_value(self, value),
            None => Ok(()),
        }
    }

    /// Writes a count-prefixed list.
    ///
    /// # Errors
    ///
    /// Fails if the list is longer than `count_bits` can express, or if the
    /// buffer is full.
    pub fn write_array<T>(
        &mut self,
        list: &'static str,
        items: &[T],
        count_bits: u8,
        mut write_item: impl FnMut(&mut Self, &T) -> EncodeResult<()>,
    ) -> EncodeResult<()> {
        let max = max_value(count_bits) as usize;
        if items.len() > max {
            return Err(EncodeError::ListTooLong {
                list,
                len: items.len(),
                max,
            });
        }

        self.write_bits(items.len() as u32, count_bits)?;
        for item in items {
            write_item(self, item)?;
        }
        Ok(())
    }
}

impl Default for BitWriter {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// READER
// =============================================================================

/// Bit reader over a received message.
pub struct BitReader<'a> {
    buffer: &'a [u8],
    bit_position: usize,
}

impl<'a> BitReader<'a> {
    /// Creates a reader at the start of `buffer`.
    #[must_use]
    pub const fn new(buffer: &'a [u8]) -> Self {
        Self {
            buffer,
            bit_position: 0,
        }
    }

    /// Bits consumed so far.
    #[inline]
    #[must_use]
    pub const fn bit_position(&self) -> usize {
        self.bit_position
    }

    /// Bits left, including zero padding in the last byte.
    #[inline]
    #[must_use]
    pub const fn remaining_bits(&self) -> usize {
        self.buffer.len() * 8 - self.bit_position
    }

    /// Reads `bits` bits (1-32).
    ///
    /// # Errors
    ///
    /// [`DecodeError::TruncatedStream`] if fewer bits remain.
    pub fn read_bits(&mut self, bits: u8) -> DecodeResult<u32> {
        debug_assert!((1..=32).contains(&bits), "bit count out of range: {bits}");
        let available = self.remaining_bits();
        if usize::from(bits) > available {
            return Err(DecodeError::TruncatedStream {
                requested: usize::from(bits),
                available,
            });
        }

        let mut value = 0u32;
        for i in 0..bits {
            let bit = (self.buffer[self.bit_position / 8] >> (self.bit_position % 8)) & 1;
            value |= u32::from(bit) << i;
            self.bit_position += 1;
        }

        Ok(value)
    }

    /// Reads a boolean (1 bit).
    ///
    /// # Errors
    ///
    /// [`DecodeError::TruncatedStream`] if the stream is exhausted.
    #[inline]
    pub fn read_bool(&mut self) -> DecodeResult<bool> {
        Ok(self.read_bits(1)? == 1)
    }

    /// Reads a two's complement integer of `bits` bits (2-32).
    ///
    /// # Errors
    ///
    /// [`DecodeError::TruncatedStream`] if fewer bits remain.
    pub fn read_signed_bits(&mut self, bits: u8) -> DecodeResult<i32> {
        let raw = self.read_bits(bits)?;
        let shift = 32 - u32::from(bits);
        // Sign-extend from the top written bit
        Ok(((raw << shift) as i32) >> shift)
    }

    /// Reads a raw 32-bit float.
    ///
    /// # Errors
    ///
    /// [`DecodeError::TruncatedStream`] if fewer bits remain.
    #[inline]
    pub fn read_f32(&mut self) -> DecodeResult<f32> {
        self.read_bits(32).map(f32::from_bits)
    }

    /// Reads a float quantized over `[min, max]` in `bits` bits.
    ///
    /// # Errors
    ///
    /// [`DecodeError::ConstraintViolation`] if the range itself is invalid
    /// (non-finite or `min > max`), [`DecodeError::TruncatedStream`] if fewer
    /// bits remain.
    pub fn read_float(&mut self, min: f32, max: f32, bits: u8) -> DecodeResult<f32> {
        if !min.is_finite() || !max.is_finite() || min > max {
            return Err(DecodeError::ConstraintViolation {
                what: "fixed float range",
                detail: format!("[{min}, {max}] is not a valid range"),
            });
        }
        let quantized = self.read_bits(bits)?;
        Ok(dequantize(quantized, min, max, bits))
    }

    /// Reads a map position.
    ///
    /// # Errors
    ///
    /// [`DecodeError::TruncatedStream`] if fewer bits remain.
    pub fn read_position(&mut self) -> DecodeResult<Vec2> {
        let x = self.read_float(0.0, MAX_POSITION, POSITION_BITS)?;
        let y = self.read_float(0.0, MAX_POSITION, POSITION_BITS)?;
        Ok(Vec2::new(x, y))
    }

    /// Reads an angle in radians.
    ///
    /// # Errors
    ///
    /// [`DecodeError::TruncatedStream`] if fewer bits remain.
    #[inline]
    pub fn read_rotation(&mut self) -> DecodeResult<f32> {
        use std::f32::consts::PI;
        self.read_float(-PI, PI, ROTATION_BITS)
    }

    /// Reads an object scale.
    ///
    /// # Errors
    ///
    /// [`DecodeError::TruncatedStream`] if fewer bits remain.
    #[inline]
    pub fn read_scale(&mut self) -> DecodeResult<f32> {
        self.read_float(MIN_OBJECT_SCALE, MAX_OBJECT_SCALE, SCALE_BITS)
    }

    /// Reads a live object id.
    ///
    /// # Errors
    ///
    /// [`DecodeError::TruncatedStream`] if fewer bits remain.
    #[inline]
    pub fn read_object_id(&mut self) -> DecodeResult<ObjectId> {
        Ok(ObjectId(self.read_bits(OBJECT_ID_BITS)? as u16))
    }

    /// Reads a string of at most `max_bytes` bytes.
    ///
    /// # Errors
    ///
    /// [`DecodeError::ConstraintViolation`] if the length prefix exceeds
    /// `max_bytes`, [`DecodeError::InvalidString`] on bad UTF-8,
    /// [`DecodeError::TruncatedStream`] if fewer bits remain.
    pub fn read_string(&mut self, max_bytes: usize) -> DecodeResult<String> {
        let len = self.read_bits(string_length_bits(max_bytes))? as usize;
        if len > max_bytes {
            return Err(DecodeError::ConstraintViolation {
                what: "string length",
                detail: format!("{len} bytes, limit is {max_bytes}"),
            });
        }

        let mut bytes = Vec::with_capacity(len);
        for _ in 0..len {
            bytes.push(self.read_bits(8)? as u8);
        }
        String::from_utf8(bytes).map_err(|_| DecodeError::InvalidString)
    }

    /// Reads a presence bit, then the value if present.
    ///
    /// # Errors
    ///
    /// Propagates any error from the presence bit or the value.
    pub fn read_option<T>(
        &mut self,
        read_value: impl FnOnce(&mut Self) -> DecodeResult<T>,
    ) -> DecodeResult<Option<T>> {
        if self.read_bool()? {
            read_value(self).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Reads a count-prefixed list.
    ///
    /// # Errors
    ///
    /// Propagates any error from the count or the items.
    pub fn read_array<T>(
        &mut self,
        count_bits: u8,
        mut read_item: impl FnMut(&mut Self) -> DecodeResult<T>,
    ) -> DecodeResult<Vec<T>> {
        let count = self.read_bits(count_bits)? as usize;
        // Every item is at least one bit, so a larger count is already truncated
        let mut items = Vec::with_capacity(count.min(self.remaining_bits()));
        for _ in 0..count {
            items.push(read_item(self)?);
        }
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_layout() {
        let mut writer = BitWriter::with_capacity(4);

        writer.write_bits(0b101, 3).unwrap();
        writer.write_bool(true).unwrap();
        writer.write_bits(0b11, 2).unwrap();

        assert_eq!(writer.bit_len(), 6);
        assert_eq!(writer.as_slice(), &[0b0011_1101]);
    }

    #[test]
    fn test_bits_round_trip_without_drift() {
        let mut writer = BitWriter::with_capacity(64);
        let widths = [1u8, 3, 7, 8, 13, 16, 31, 32];
        for &bits in &widths {
            writer.write_bits(max_value(bits), bits).unwrap();
            writer.write_bits(0, bits).unwrap();
        }

        let mut reader = BitReader::new(writer.as_slice());
        for &bits in &widths {
            let before = reader.bit_position();
            assert_eq!(reader.read_bits(bits).unwrap(), max_value(bits));
            assert_eq!(reader.read_bits(bits).unwrap(), 0);
            assert_eq!(reader.bit_position() - before, 2 * usize::from(bits));
        }
    }

    #[test]
    fn test_signed_bits_round_trip() {
        let mut writer = BitWriter::with_capacity(16);
        for value in [-128, -1, 0, 1, 127] {
            writer.write_signed_bits(value, 8).unwrap();
        }
        writer.write_signed_bits(i32::MIN, 32).unwrap();

        let mut reader = BitReader::new(writer.as_slice());
        for value in [-128, -1, 0, 1, 127] {
            assert_eq!(reader.read_signed_bits(8).unwrap(), value);
        }
        assert_eq!(reader.read_signed_bits(32).unwrap(), i32::MIN);
    }

    #[test]
    fn test_fixed_float_quantization() {
        assert_eq!(quantize(37.5, 0.0, 100.0, 8), 95);

        let decoded = dequantize(95, 0.0, 100.0, 8);
        assert!((decoded - 37.254_9).abs() < 1e-3);
        assert!((37.5 - decoded).abs() <= 100.0 / 255.0);
    }

    #[test]
    fn test_fixed_float_clamps() {
        assert_eq!(quantize(-5.0, 0.0, 100.0, 8), 0);
        assert_eq!(quantize(500.0, 0.0, 100.0, 8), 255);
        assert_eq!(quantize(f32::NAN, 0.0, 100.0, 8), 0);
        assert_eq!(quantize(50.0, 10.0, 10.0, 8), 0);
        assert_eq!(dequantize(0, 10.0, 10.0, 8), 10.0);
    }

    #[test]
    fn test_float_round_trip() {
        let mut writer = BitWriter::with_capacity(16);
        writer.write_float(42.5, -100.0, 100.0, 16).unwrap();
        assert_eq!(writer.byte_len(), 2);

        let mut reader = BitReader::new(writer.as_slice());
        let value = reader.read_float(-100.0, 100.0, 16).unwrap();
        assert!((value - 42.5).abs() <= 200.0 / 65535.0);
    }

    #[test]
    fn test_read_float_rejects_inverted_range() {
        let mut reader = BitReader::new(&[0xFF, 0xFF]);
        let result = reader.read_float(10.0, 0.0, 8);
        assert!(matches!(result, Err(DecodeError::ConstraintViolation { .. })));
        assert_eq!(reader.bit_position(), 0);
    }

    #[test]
    fn test_position_and_rotation_round_trip() {
        let mut writer = BitWriter::with_capacity(16);
        writer.write_position(Vec2::new(812.25, 1500.0)).unwrap();
        writer.write_rotation(-1.25).unwrap();
        writer.write_object_id(ObjectId(4321)).unwrap();
        writer.write_scale(1.0).unwrap();

        let mut reader = BitReader::new(writer.as_slice());
        let position = reader.read_position().unwrap();
        let step = MAX_POSITION / 65535.0;
        assert!((position.x - 812.25).abs() <= step);
        assert!((position.y - 1500.0).abs() <= step);
        assert!((reader.read_rotation().unwrap() + 1.25).abs() < 1e-3);
        assert_eq!(reader.read_object_id().unwrap(), ObjectId(4321));
        assert!((reader.read_scale().unwrap() - 1.0).abs() < 0.02);
    }

    #[test]
    fn test_truncated_stream() {
        let mut writer = BitWriter::with_capacity(4);
        writer.write_bits(0xAB, 8).unwrap();

        let mut reader = BitReader::new(writer.as_slice());
        assert_eq!(reader.read_bits(4).unwrap(), 0xB);
        assert_eq!(
            reader.read_bits(5),
            Err(DecodeError::TruncatedStream {
                requested: 5,
                available: 4
            })
        );
    }

    #[test]
    fn test_writer_overflow() {
        let mut writer = BitWriter::with_capacity(1);
        writer.write_bits(0, 6).unwrap();
        assert_eq!(
            writer.write_bits(0, 3),
            Err(EncodeError::BufferOverflow {
                requested: 3,
                available: 2
            })
        );
        // A failed write leaves the cursor untouched
        assert_eq!(writer.bit_len(), 6);
    }

    #[test]
    fn test_string_round_trip_and_truncation() {
        let mut writer = BitWriter::with_capacity(64);
        writer.write_string("player", 16).unwrap();
        writer.write_string("héhéhéhéhé", 5).unwrap();

        let mut reader = BitReader::new(writer.as_slice());
        assert_eq!(reader.read_string(16).unwrap(), "player");
        // Byte 5 would split the second 'é'
        assert_eq!(reader.read_string(5).unwrap(), "héh");
    }

    #[test]
    fn test_string_rejects_bad_utf8() {
        let mut writer = BitWriter::with_capacity(8);
        writer.write_bits(2, string_length_bits(16)).unwrap();
        writer.write_bits(0xFF, 8).unwrap();
        writer.write_bits(0xFE, 8).unwrap();

        let mut reader = BitReader::new(writer.as_slice());
        assert_eq!(reader.read_string(16), Err(DecodeError::InvalidString));
    }

    #[test]
    fn test_array_round_trip() {
        let mut writer = BitWriter::with_capacity(16);
        writer
            .write_array("ids", &[3u16, 7], 4, |w, &id| w.write_bits(u32::from(id), 8))
            .unwrap();

        let mut reader = BitReader::new(writer.as_slice());
        let ids = reader.read_array(4, |r| r.read_bits(8)).unwrap();
        assert_eq!(ids, vec![3, 7]);
    }

    #[test]
    fn test_array_too_long() {
        let mut writer = BitWriter::with_capacity(16);
        let result = writer.write_array("ids", &[0u8; 4], 2, |w, _| w.write_bool(false));
        assert_eq!(
            result,
            Err(EncodeError::ListTooLong {
                list: "ids",
                len: 4,
                max: 3
            })
        );
    }

    #[test]
    fn test_reset_clears_buffer() {
        let mut writer = BitWriter::with_capacity(2);
        writer.write_bits(0xFF, 8).unwrap();
        writer.reset();
        writer.write_bits(0, 4).unwrap();
        assert_eq!(writer.as_slice(), &[0]);
    }
}
