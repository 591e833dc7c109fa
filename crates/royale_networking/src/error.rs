//! # Protocol Error Types
//!
//! Decode errors come from untrusted input and are recoverable: the message is
//! dropped and the connection keeps going. Encode errors mean the caller broke
//! the schema contract (list too long, index from a foreign registry, buffer
//! too small for the configured packet size).

use thiserror::Error;

/// Errors raised while reading a message.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    /// Fewer bits remain than the next read needs.
    #[error("truncated stream: needed {requested} bits, {available} available")]
    TruncatedStream {
        /// Bits requested.
        requested: usize,
        /// Bits left in the buffer.
        available: usize,
    },

    /// A registry reference is outside the registry.
    #[error("invalid {registry} index {index}, registry has {len} entries")]
    InvalidVariantIndex {
        /// Registry name.
        registry: &'static str,
        /// Index read.
        index: u32,
        /// Registry size.
        len: usize,
    },

    /// An enumerated tag is outside its known set.
    #[error("invalid {kind} tag {value}")]
    InvalidTag {
        /// Which enumeration.
        kind: &'static str,
        /// Tag value read.
        value: u32,
    },

    /// A decoded value breaks a declared constraint.
    #[error("constraint violated for {what}: {detail}")]
    ConstraintViolation {
        /// Field or section.
        what: &'static str,
        /// What went wrong.
        detail: String,
    },

    /// A string field is not valid UTF-8.
    #[error("string field is not valid UTF-8")]
    InvalidString,
}

/// Result type for decoding.
pub type DecodeResult<T> = Result<T, DecodeError>;

/// Errors raised while writing a message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// The write buffer is full.
    #[error("buffer overflow: needed {requested} bits, {available} available")]
    BufferOverflow {
        /// Bits requested.
        requested: usize,
        /// Bits left in the buffer.
        available: usize,
    },

    /// A list has more entries than its count prefix can express.
    #[error("{list} has {len} entries, limit is {max}")]
    ListTooLong {
        /// List name.
        list: &'static str,
        /// Entries supplied.
        len: usize,
        /// Largest count the prefix holds.
        max: usize,
    },

    /// A definition index does not belong to the registry it was written with.
    #[error("index {index} is not part of registry {registry}")]
    ForeignVariant {
        /// Registry name.
        registry: &'static str,
        /// Offending index.
        index: u16,
    },
}

/// Result type for encoding.
pub type EncodeResult<T> = Result<T, EncodeError>;

/// Errors raised by the length-delimited framing layer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// A frame is longer than the configured limit.
    #[error("frame of {len} bytes exceeds limit of {max}")]
    Oversized {
        /// Declared frame length.
        len: usize,
        /// Configured limit.
        max: usize,
    },
}

/// Errors raised while loading protocol configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file is not valid TOML or does not match the schema.
    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config file could not be read.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// Values parse but are inconsistent.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
