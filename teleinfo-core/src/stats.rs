//! Link statistics
//!
//! Counters for everything observable on the serial link and the broadcast
//! side. All counters wrap on overflow.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Running counters kept by the bridge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LinkStats {
    /// Bytes received from the meter
    pub bytes: u32,
    /// Checksum-valid datasets
    pub datasets: u32,
    /// Completed frames (ETX)
    pub frames: u32,
    /// Datasets dropped on checksum mismatch
    pub checksum_errors: u32,
    /// Unexpected bytes that reset the parser
    pub framing_errors: u32,
    /// Labels or data exceeding their length limit
    pub overflows: u32,
    /// Datasets with a label the interpreter does not know
    pub unknown_labels: u32,
    /// Fixed-value labels with an unsupported value
    pub unsupported_values: u32,
    /// Numeric fields rejected in strict mode
    pub invalid_numbers: u32,
    /// Successful publishes
    pub broadcasts: u32,
    /// Publishes the sink refused
    pub broadcast_errors: u32,
}

impl LinkStats {
    /// Create zeroed statistics
    pub fn new() -> Self {
        Self::default()
    }

    /// Total of all receive-side error counters
    pub fn rx_errors(&self) -> u32 {
        self.checksum_errors
            .wrapping_add(self.framing_errors)
            .wrapping_add(self.overflows)
    }

    /// Reset all counters to zero
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

pub(crate) fn bump(counter: &mut u32) {
    *counter = counter.wrapping_add(1);
}
