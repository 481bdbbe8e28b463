//! Board-agnostic core logic for the TIC broadcast beacon
//!
//! This crate turns decoded TIC datasets into broadcast payloads:
//!
//! - Historical-mode snapshot and label interpreter
//! - Fixed-layout payload encoder (advertisement and scan response)
//! - Broadcast sink trait implemented by the radio layer
//! - Link statistics and configuration types
//! - [`Bridge`], which drives parser, interpreter and encoder together

#![no_std]
#![deny(unsafe_code)]

pub mod bridge;
pub mod broadcast;
pub mod config;
pub mod historic;
pub mod stats;
pub mod traits;

pub use bridge::Bridge;
pub use broadcast::{
    decode_primary, decode_secondary, encode_primary, encode_secondary, DecodeError, EncodeError,
    Payloads, PrimaryReading, SecondaryReading, MODE_HISTORIC, PRIMARY_PAYLOAD_LEN,
    SECONDARY_PAYLOAD_LEN,
};
pub use config::{BridgeConfig, BroadcastPolicy, ConfigError, NumberPolicy};
pub use historic::{HistoricLabel, InterpretError, Snapshot, METER_ID_LEN};
pub use stats::LinkStats;
pub use traits::BroadcastSink;

pub use teleinfo_protocol::FramingPolicy;
