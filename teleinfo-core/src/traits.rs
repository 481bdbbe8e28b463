//! Broadcast transmitter trait
//!
//! Implemented by the radio layer. The core never configures the radio; it
//! only hands over finished payloads.

use crate::broadcast::{PRIMARY_PAYLOAD_LEN, SECONDARY_PAYLOAD_LEN};

/// Trait for publishing payloads as a wireless broadcast
///
/// `primary` goes in the advertisement, `secondary` in the scan response.
/// Both are complete snapshots of the same instant; implementations should
/// swap them in together.
pub trait BroadcastSink {
    /// Error type for publish operations
    type Error;

    /// Replace the currently advertised payloads
    fn publish(
        &mut self,
        primary: &[u8; PRIMARY_PAYLOAD_LEN],
        secondary: &[u8; SECONDARY_PAYLOAD_LEN],
    ) -> Result<(), Self::Error>;
}

impl<T: BroadcastSink + ?Sized> BroadcastSink for &mut T {
    type Error = T::Error;

    fn publish(
        &mut self,
        primary: &[u8; PRIMARY_PAYLOAD_LEN],
        secondary: &[u8; SECONDARY_PAYLOAD_LEN],
    ) -> Result<(), Self::Error> {
        (**self).publish(primary, secondary)
    }
}
