//! Bridge configuration
//!
//! Persisted as postcard binary when the `serde` feature is enabled.

use teleinfo_protocol::{FramingPolicy, ParserConfig};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Maximum serialized config size (binary)
pub const MAX_CONFIG_SIZE: usize = 16;

/// How numeric field values are parsed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum NumberPolicy {
    /// Malformed or out-of-range decimal text is stored as zero
    #[default]
    Permissive,
    /// Malformed decimal text is rejected and the field left unchanged
    Strict,
}

/// When payloads are pushed to the broadcast sink
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum BroadcastPolicy {
    /// Once per complete frame (ETX)
    #[default]
    PerFrame,
    /// After every accepted dataset; may publish a half-updated snapshot
    PerDataset,
}

/// Configuration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Serialization failed (buffer too small)
    Serialize,
    /// Deserialization failed
    Deserialize,
}

/// Complete bridge configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BridgeConfig {
    /// Parser reaction to noise between datasets
    pub framing: FramingPolicy,
    /// Numeric field parsing
    pub numbers: NumberPolicy,
    /// Broadcast cadence
    pub broadcast: BroadcastPolicy,
}

impl BridgeConfig {
    /// Parser configuration derived from this config
    pub fn parser(&self) -> ParserConfig {
        ParserConfig {
            framing: self.framing,
        }
    }
}

#[cfg(feature = "serde")]
impl BridgeConfig {
    /// Serialize to postcard binary, returning the used part of `buffer`
    pub fn to_slice<'b>(&self, buffer: &'b mut [u8]) -> Result<&'b mut [u8], ConfigError> {
        postcard::to_slice(self, buffer).map_err(|_| ConfigError::Serialize)
    }

    /// Deserialize from postcard binary
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ConfigError> {
        postcard::from_bytes(bytes).map_err(|_| ConfigError::Deserialize)
    }
}
