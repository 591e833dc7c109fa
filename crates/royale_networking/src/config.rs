//! Protocol configuration.
//!
//! ```toml
//! max_packet_size = 32768
//! max_frame_size = 65536
//! inbound_channel_capacity = 256
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::DEFAULT_MAX_PACKET_SIZE;

/// Limits for one connection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolConfig {
    /// Largest encoded packet, in bytes.
    pub max_packet_size: usize,
    /// Largest accepted frame, in bytes.
    pub max_frame_size: usize,
    /// Capacity of the decoded packet channel.
    pub inbound_channel_capacity: usize,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            max_packet_size: DEFAULT_MAX_PACKET_SIZE,
            max_frame_size: DEFAULT_MAX_PACKET_SIZE * 2,
            inbound_channel_capacity: 256,
        }
    }
}

impl ProtocolConfig {
    /// Parses and validates a TOML config. Missing keys take defaults.
    ///
    /// # Errors
    ///
    /// Fails on malformed TOML or inconsistent limits.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML config file.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read, or as
    /// [`ProtocolConfig::from_toml_str`].
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    /// Checks that the limits are usable together.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] describing the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_packet_size == 0 {
            return Err(ConfigError::Invalid("max_packet_size must be positive".into()));
        }
        if self.max_frame_size < self.max_packet_size {
            return Err(ConfigError::Invalid(format!(
                "max_frame_size ({}) is smaller than max_packet_size ({})",
                self.max_frame_size, self.max_packet_size
            )));
        }
        if self.inbound_channel_capacity == 0 {
            return Err(ConfigError::Invalid("inbound_channel_capacity must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(ProtocolConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = ProtocolConfig::from_toml_str("max_packet_size = 1200\n").unwrap();
        assert_eq!(config.max_packet_size, 1200);
        assert_eq!(config.max_frame_size, ProtocolConfig::default().max_frame_size);
    }

    #[test]
    fn test_frame_smaller_than_packet_rejected() {
        let result = ProtocolConfig::from_toml_str("max_packet_size = 2048\nmax_frame_size = 1024\n");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_zero_packet_size_rejected() {
        let result = ProtocolConfig::from_toml_str("max_packet_size = 0\n");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_malformed_toml_rejected() {
        let result = ProtocolConfig::from_toml_str("max_packet_size = \"big\"\n");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }
}
