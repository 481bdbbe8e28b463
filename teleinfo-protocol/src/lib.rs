//! TIC Historical Mode Protocol
//!
//! This crate decodes the serial telemetry stream ("teleinformation client")
//! emitted by French utility meters running in historical mode. It turns raw
//! bytes into labeled datasets, verifying each dataset's checksum.
//!
//! # Protocol Overview
//!
//! Every byte is a 7-bit character. A frame wraps any number of datasets:
//! ```text
//! ┌─────┬────┬───────┬────┬──────┬────┬──────────┬────┬─────┬─────┐
//! │ STX │ LF │ LABEL │ SP │ DATA │ SP │ CHECKSUM │ CR │ ... │ ETX │
//! │ 1B  │ 1B │ ≤8B   │ 1B │ ≤12B │ 1B │ 1B       │ 1B │     │ 1B  │
//! └─────┴────┴───────┴────┴──────┴────┴──────────┴────┴─────┴─────┘
//! ```
//!
//! The checksum is `((sum(LABEL) + SP + sum(DATA)) & 0x3F) + 0x20`.
//!
//! Decoding never allocates: label and data live in fixed-capacity buffers
//! inside the parser and are lent to the [`EventSink`] for the duration of a
//! single callback.

#![no_std]
#![deny(unsafe_code)]

pub mod events;
pub mod frame;

pub use events::{DatasetEvent, EventSink};
pub use frame::{
    checksum, BufferTooSmall, Dataset, FrameError, FrameParser, FramingPolicy, ParserConfig,
    ParserState, MAX_DATA_LEN, MAX_DATASET_SIZE, MAX_LABEL_LEN,
};
