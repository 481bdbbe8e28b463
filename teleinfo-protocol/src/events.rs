//! Events raised by the frame parser
//!
//! Delivery is synchronous: the parser calls into the sink from inside
//! [`FrameParser::feed`](crate::FrameParser::feed), in stream order, and the
//! borrowed label/data buffers are reused as soon as the call returns.

use crate::frame::{Dataset, FrameError};

/// Outcome of a completed dataset or frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DatasetEvent<'a> {
    /// A dataset passed its checksum and was terminated by CR
    Dataset(Dataset<'a>),
    /// ETX received; the current frame is complete
    EndOfTransmission,
    /// A dataset was dropped because its checksum byte did not match
    ChecksumError {
        /// Label of the rejected dataset
        label: &'a str,
        /// Checksum computed over label and data
        expected: u8,
        /// Checksum byte found on the wire (7-bit masked)
        received: u8,
    },
}

impl DatasetEvent<'_> {
    /// Returns true for a checksum-valid dataset
    pub fn is_dataset(&self) -> bool {
        matches!(self, DatasetEvent::Dataset(_))
    }

    /// Returns true for an end-of-frame marker
    pub fn is_end_of_transmission(&self) -> bool {
        matches!(self, DatasetEvent::EndOfTransmission)
    }
}

/// Receiver for parser output
///
/// `on_error` is called for recoverable framing conditions when bytes are
/// fed through [`FrameParser::feed_bytes`](crate::FrameParser::feed_bytes).
/// The parser has already reset itself by the time it is called.
pub trait EventSink {
    /// Handle a dataset, end-of-frame or checksum event
    fn on_event(&mut self, event: DatasetEvent<'_>);

    /// Handle a recoverable framing error
    fn on_error(&mut self, error: FrameError) {
        let _ = error;
    }
}

impl<T: EventSink + ?Sized> EventSink for &mut T {
    fn on_event(&mut self, event: DatasetEvent<'_>) {
        (**self).on_event(event)
    }

    fn on_error(&mut self, error: FrameError) {
        (**self).on_error(error)
    }
}
