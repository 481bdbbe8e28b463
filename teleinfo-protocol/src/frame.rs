//! Frame decoding for the TIC historical-mode protocol.
//!
//! Wire format (7-bit characters):
//! - STX (0x02): start of frame
//! - LF (0x0A): start of dataset
//! - LABEL (1-8 chars), SP, DATA (0-12 chars), SP
//! - CHECKSUM (1 char): `((sum(LABEL) + SP + sum(DATA)) & 0x3F) + 0x20`
//! - CR (0x0D): end of dataset
//! - ETX (0x03): end of frame
//!
//! Note the checksum covers the separator after the label but not the one
//! after the data.

use heapless::Vec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::events::{DatasetEvent, EventSink};

/// Start of text, opens a frame
pub const STX: u8 = 0x02;
/// End of text, closes a frame
pub const ETX: u8 = 0x03;
/// Line feed, opens a dataset
pub const LF: u8 = 0x0A;
/// Carriage return, closes a dataset
pub const CR: u8 = 0x0D;
/// Field separator in historical mode
pub const SP: u8 = 0x20;
/// Field separator used by standard mode, not accepted here
pub const HT: u8 = 0x09;

/// Maximum label length in characters
pub const MAX_LABEL_LEN: usize = 8;

/// Maximum data length in characters
pub const MAX_DATA_LEN: usize = 12;

/// Maximum encoded dataset size (LF + LABEL + SP + DATA + SP + CHECKSUM + CR)
pub const MAX_DATASET_SIZE: usize = 1 + MAX_LABEL_LEN + 1 + MAX_DATA_LEN + 1 + 1 + 1;

/// Recoverable decoding errors
///
/// Every variant leaves the parser back in [`ParserState::AwaitingFrame`].
/// Checksum mismatches are not errors here: they are reported as
/// [`DatasetEvent::ChecksumError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Byte not allowed in the current state
    Framing {
        /// Offending byte (7-bit masked)
        byte: u8,
    },
    /// Label longer than [`MAX_LABEL_LEN`]
    LabelOverflow,
    /// Data longer than [`MAX_DATA_LEN`]
    DataOverflow,
}

/// Destination buffer too small to encode a dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BufferTooSmall;

/// Reaction to an unexpected byte between datasets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FramingPolicy {
    /// Stay in `AwaitingDataset` and drop the byte
    #[default]
    Ignore,
    /// Report a framing error and wait for the next STX
    Reset,
}

/// Parser configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ParserConfig {
    /// What to do with noise between CR and the next LF
    pub framing: FramingPolicy,
}

/// Computes the checksum character for a label/data pair
pub fn checksum(label: &[u8], data: &[u8]) -> u8 {
    let sum = label
        .iter()
        .chain(core::iter::once(&SP))
        .chain(data)
        .fold(0u8, |acc, &byte| acc.wrapping_add(byte & 0x7F));
    finalize(sum)
}

fn finalize(sum: u8) -> u8 {
    (sum & 0x3F) + 0x20
}

/// A decoded dataset, borrowed from the parser or built for encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Dataset<'a> {
    /// Field label, e.g. `PAPP`
    pub label: &'a str,
    /// Field value, e.g. `02000`
    pub data: &'a str,
}

impl<'a> Dataset<'a> {
    /// Create a dataset, checking the protocol length limits
    pub fn new(label: &'a str, data: &'a str) -> Result<Self, FrameError> {
        if label.len() > MAX_LABEL_LEN {
            return Err(FrameError::LabelOverflow);
        }
        if data.len() > MAX_DATA_LEN {
            return Err(FrameError::DataOverflow);
        }
        Ok(Self { label, data })
    }

    /// Checksum character for this dataset
    pub fn checksum(&self) -> u8 {
        checksum(self.label.as_bytes(), self.data.as_bytes())
    }

    /// Size of this dataset on the wire
    pub fn encoded_len(&self) -> usize {
        self.label.len() + self.data.len() + 5
    }

    /// Encode this dataset (LF through CR) into a byte buffer
    ///
    /// Returns the number of bytes written. Used to simulate a meter.
    pub fn encode(&self, buffer: &mut [u8]) -> Result<usize, BufferTooSmall> {
        let len = self.encoded_len();
        if buffer.len() < len {
            return Err(BufferTooSmall);
        }

        let label = self.label.as_bytes();
        let data = self.data.as_bytes();
        let data_start = 1 + label.len() + 1;
        let data_end = data_start + data.len();

        buffer[0] = LF;
        buffer[1..1 + label.len()].copy_from_slice(label);
        buffer[1 + label.len()] = SP;
        buffer[data_start..data_end].copy_from_slice(data);
        buffer[data_end] = SP;
        buffer[data_end + 1] = self.checksum();
        buffer[data_end + 2] = CR;

        Ok(len)
    }

    /// Encode this dataset into a heapless Vec
    pub fn encode_to_vec(&self) -> Result<Vec<u8, MAX_DATASET_SIZE>, BufferTooSmall> {
        let mut buffer = [0u8; MAX_DATASET_SIZE];
        let len = self.encode(&mut buffer)?;
        let mut vec = Vec::new();
        vec.extend_from_slice(&buffer[..len]).map_err(|_| BufferTooSmall)?;
        Ok(vec)
    }
}

/// Parser states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParserState {
    /// Waiting for STX
    AwaitingFrame,
    /// Inside a frame, waiting for LF or ETX
    AwaitingDataset,
    /// Accumulating label characters
    ParsingLabel,
    /// Accumulating data characters
    ParsingData,
    /// Next byte is the checksum
    ParsingChecksum,
    /// Checksum matched, waiting for CR
    AwaitingEnd,
}

/// Byte-at-a-time state machine for TIC frames
///
/// One parser per serial line. It is not synchronized: a single producer
/// must drive it, and events come out in the order bytes go in, regardless
/// of how the stream is split across calls.
#[derive(Debug, Clone)]
pub struct FrameParser {
    config: ParserConfig,
    state: ParserState,
    sum: u8,
    checksum: u8,
    label: Vec<u8, MAX_LABEL_LEN>,
    data: Vec<u8, MAX_DATA_LEN>,
}

impl Default for FrameParser {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameParser {
    /// Create a parser with the default configuration
    pub fn new() -> Self {
        Self::with_config(ParserConfig::default())
    }

    /// Create a parser with the given configuration
    pub fn with_config(config: ParserConfig) -> Self {
        Self {
            config,
            state: ParserState::AwaitingFrame,
            sum: 0,
            checksum: 0,
            label: Vec::new(),
            data: Vec::new(),
        }
    }

    /// Current state
    pub fn state(&self) -> ParserState {
        self.state
    }

    /// Active configuration
    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Drop any partial dataset and wait for the next STX
    pub fn reset(&mut self) {
        self.state = ParserState::AwaitingFrame;
        self.clear_dataset();
    }

    fn clear_dataset(&mut self) {
        self.sum = 0;
        self.checksum = 0;
        self.label.clear();
        self.data.clear();
    }

    fn fail(&mut self, error: FrameError) -> Result<(), FrameError> {
        #[cfg(feature = "defmt")]
        defmt::warn!("TIC dataset dropped: {:?}", error);
        self.reset();
        Err(error)
    }

    /// Feed a single byte to the parser
    ///
    /// Events are delivered to `sink` before this returns. An `Err` means the
    /// partial dataset was discarded and the parser reset; it is always safe
    /// to keep feeding.
    pub fn feed<S: EventSink + ?Sized>(
        &mut self,
        byte: u8,
        sink: &mut S,
    ) -> Result<(), FrameError> {
        let byte = byte & 0x7F;

        match self.state {
            ParserState::AwaitingFrame => {
                if byte == STX {
                    self.state = ParserState::AwaitingDataset;
                }
                // Silently ignore everything until STX
                Ok(())
            }
            ParserState::AwaitingDataset => match byte {
                LF => {
                    self.clear_dataset();
                    self.state = ParserState::ParsingLabel;
                    Ok(())
                }
                ETX => {
                    self.state = ParserState::AwaitingFrame;
                    sink.on_event(DatasetEvent::EndOfTransmission);
                    Ok(())
                }
                // ETX was lost; the new frame starts here
                STX => Ok(()),
                _ => match self.config.framing {
                    FramingPolicy::Ignore => Ok(()),
                    FramingPolicy::Reset => self.fail(FrameError::Framing { byte }),
                },
            },
            ParserState::ParsingLabel => {
                if byte == SP {
                    self.sum = self.sum.wrapping_add(byte);
                    self.state = ParserState::ParsingData;
                    return Ok(());
                }
                if self.label.push(byte).is_err() {
                    return self.fail(FrameError::LabelOverflow);
                }
                self.sum = self.sum.wrapping_add(byte);
                Ok(())
            }
            ParserState::ParsingData => {
                if byte == SP {
                    self.checksum = finalize(self.sum);
                    self.state = ParserState::ParsingChecksum;
                    return Ok(());
                }
                if self.data.push(byte).is_err() {
                    return self.fail(FrameError::DataOverflow);
                }
                self.sum = self.sum.wrapping_add(byte);
                Ok(())
            }
            ParserState::ParsingChecksum => {
                if byte != self.checksum {
                    #[cfg(feature = "defmt")]
                    defmt::warn!(
                        "TIC checksum mismatch: expected {=u8:#x}, received {=u8:#x}",
                        self.checksum,
                        byte
                    );
                    let expected = self.checksum;
                    self.state = ParserState::AwaitingFrame;
                    // 7-bit bytes are always valid UTF-8
                    let label = core::str::from_utf8(&self.label).unwrap_or_default();
                    sink.on_event(DatasetEvent::ChecksumError {
                        label,
                        expected,
                        received: byte,
                    });
                    self.clear_dataset();
                    return Ok(());
                }
                self.state = ParserState::AwaitingEnd;
                Ok(())
            }
            ParserState::AwaitingEnd => {
                if byte != CR {
                    return self.fail(FrameError::Framing { byte });
                }
                self.state = ParserState::AwaitingDataset;
                let label = core::str::from_utf8(&self.label).unwrap_or_default();
                let data = core::str::from_utf8(&self.data).unwrap_or_default();
                sink.on_event(DatasetEvent::Dataset(Dataset { label, data }));
                Ok(())
            }
        }
    }

    /// Feed a chunk of bytes to the parser
    ///
    /// Unlike [`feed`](Self::feed), errors do not stop intake: they are
    /// handed to [`EventSink::on_error`] and the remaining bytes are still
    /// consumed.
    pub fn feed_bytes<S: EventSink + ?Sized>(&mut self, bytes: &[u8], sink: &mut S) {
        for &byte in bytes {
            if let Err(e) = self.feed(byte, sink) {
                sink.on_error(e);
            }
        }
    }
}
