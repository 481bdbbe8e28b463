//! Broadcast payload encoding
//!
//! Two fixed layouts, both little-endian and prefixed by a mode byte:
//!
//! Primary (advertisement), 11 bytes:
//! ```text
//! ┌──────┬──────────┬──────────┬────────────┬───────────┐
//! │ MODE │ BASE Wh  │ IINST A  │ PTEC       │ PAPP VA   │
//! │ 1B   │ 4B       │ 2B       │ 2B         │ 2B        │
//! └──────┴──────────┴──────────┴────────────┴───────────┘
//! ```
//!
//! Secondary (scan response), 17 bytes:
//! ```text
//! ┌──────┬──────────────┬──────────┬──────────┐
//! │ MODE │ ADCO         │ ISOUSC A │ IMAX A   │
//! │ 1B   │ 12B          │ 2B       │ 2B       │
//! └──────┴──────────────┴──────────┴──────────┘
//! ```
//!
//! Listeners decode these independently, so the layout must not change.

use crate::historic::{Snapshot, METER_ID_LEN};

/// Mode discriminator for historical-mode payloads
pub const MODE_HISTORIC: u8 = 0;

/// Primary payload size in bytes
pub const PRIMARY_PAYLOAD_LEN: usize = 11;

/// Secondary payload size in bytes
pub const SECONDARY_PAYLOAD_LEN: usize = 17;

/// Errors that can occur during encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EncodeError {
    /// Destination buffer smaller than the payload
    InvalidArgument {
        /// Bytes the payload needs
        required: usize,
        /// Bytes the caller supplied
        available: usize,
    },
}

/// Errors that can occur while decoding a received payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodeError {
    /// Payload shorter than its layout
    TooShort,
    /// Mode byte is not one this crate knows
    UnknownMode(u8),
}

/// First `N` bytes of `buffer` as a payload slot
fn payload_slot<const N: usize>(buffer: &mut [u8]) -> Result<&mut [u8; N], EncodeError> {
    let available = buffer.len();
    buffer
        .get_mut(..N)
        .and_then(|slot| slot.try_into().ok())
        .ok_or(EncodeError::InvalidArgument {
            required: N,
            available,
        })
}

fn write_primary(snapshot: &Snapshot, payload: &mut [u8; PRIMARY_PAYLOAD_LEN]) {
    payload[0] = MODE_HISTORIC;
    payload[1..5].copy_from_slice(&snapshot.base_wh.to_le_bytes());
    payload[5..7].copy_from_slice(&snapshot.instantaneous_current_a.to_le_bytes());
    payload[7..9].copy_from_slice(&snapshot.tariff_period.to_le_bytes());
    payload[9..11].copy_from_slice(&snapshot.apparent_power_va.to_le_bytes());
}

fn write_secondary(snapshot: &Snapshot, payload: &mut [u8; SECONDARY_PAYLOAD_LEN]) {
    payload[0] = MODE_HISTORIC;
    payload[1..1 + METER_ID_LEN].copy_from_slice(&snapshot.meter_id);
    payload[13..15].copy_from_slice(&snapshot.subscribed_current_a.to_le_bytes());
    payload[15..17].copy_from_slice(&snapshot.max_current_a.to_le_bytes());
}

/// Encode the primary payload into `buffer`
///
/// Returns the number of bytes written. Nothing is written on error.
pub fn encode_primary(snapshot: &Snapshot, buffer: &mut [u8]) -> Result<usize, EncodeError> {
    write_primary(snapshot, payload_slot(buffer)?);
    Ok(PRIMARY_PAYLOAD_LEN)
}

/// Encode the secondary payload into `buffer`
///
/// Returns the number of bytes written. Nothing is written on error.
pub fn encode_secondary(snapshot: &Snapshot, buffer: &mut [u8]) -> Result<usize, EncodeError> {
    write_secondary(snapshot, payload_slot(buffer)?);
    Ok(SECONDARY_PAYLOAD_LEN)
}

/// Both payloads for one broadcast
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Payloads {
    /// Advertisement data
    pub primary: [u8; PRIMARY_PAYLOAD_LEN],
    /// Scan response data
    pub secondary: [u8; SECONDARY_PAYLOAD_LEN],
}

impl Payloads {
    /// Encode both payloads from a snapshot
    pub fn encode(snapshot: &Snapshot) -> Self {
        let mut primary = [0u8; PRIMARY_PAYLOAD_LEN];
        let mut secondary = [0u8; SECONDARY_PAYLOAD_LEN];
        write_primary(snapshot, &mut primary);
        write_secondary(snapshot, &mut secondary);
        Self { primary, secondary }
    }
}

/// Fields carried by the primary payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PrimaryReading {
    /// BASE index in Wh
    pub base_wh: u32,
    /// IINST in A
    pub instantaneous_current_a: u16,
    /// PTEC code, 1 for all-hours tariff
    pub tariff_period: u16,
    /// PAPP in VA
    pub apparent_power_va: u16,
}

/// Fields carried by the secondary payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SecondaryReading {
    /// ADCO meter address, ASCII
    pub meter_id: [u8; METER_ID_LEN],
    /// ISOUSC in A
    pub subscribed_current_a: u16,
    /// IMAX in A
    pub max_current_a: u16,
}

fn le16(bytes: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([bytes[at], bytes[at + 1]])
}

fn check_header(bytes: &[u8], len: usize) -> Result<(), DecodeError> {
    if bytes.len() < len {
        return Err(DecodeError::TooShort);
    }
    if bytes[0] != MODE_HISTORIC {
        return Err(DecodeError::UnknownMode(bytes[0]));
    }
    Ok(())
}

/// Decode a primary payload, as a listener would
pub fn decode_primary(bytes: &[u8]) -> Result<PrimaryReading, DecodeError> {
    check_header(bytes, PRIMARY_PAYLOAD_LEN)?;
    Ok(PrimaryReading {
        base_wh: u32::from_le_bytes([bytes[1], bytes[2], bytes[3], bytes[4]]),
        instantaneous_current_a: le16(bytes, 5),
        tariff_period: le16(bytes, 7),
        apparent_power_va: le16(bytes, 9),
    })
}

/// Decode a secondary payload, as a listener would
pub fn decode_secondary(bytes: &[u8]) -> Result<SecondaryReading, DecodeError> {
    check_header(bytes, SECONDARY_PAYLOAD_LEN)?;
    let mut meter_id = [0u8; METER_ID_LEN];
    meter_id.copy_from_slice(&bytes[1..1 + METER_ID_LEN]);
    Ok(SecondaryReading {
        meter_id,
        subscribed_current_a: le16(bytes, 13),
        max_current_a: le16(bytes, 15),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Snapshot {
        Snapshot {
            meter_id: *b"123456789012",
            subscribed_current_a: 30,
            base_wh: 1_234_567,
            tariff_period: 1,
            instantaneous_current_a: 5,
            max_current_a: 45,
            apparent_power_va: 2000,
        }
    }

    #[test]
    fn test_primary_layout() {
        let mut buffer = [0xFFu8; PRIMARY_PAYLOAD_LEN];
        let len = encode_primary(&sample(), &mut buffer).unwrap();

        assert_eq!(len, PRIMARY_PAYLOAD_LEN);
        assert_eq!(
            buffer,
            [
                0x00, // mode
                0x87, 0xD6, 0x12, 0x00, // base 1234567
                0x05, 0x00, // iinst
                0x01, 0x00, // ptec
                0xD0, 0x07, // papp 2000
            ]
        );
    }

    #[test]
    fn test_secondary_layout() {
        let mut buffer = [0xFFu8; SECONDARY_PAYLOAD_LEN];
        let len = encode_secondary(&sample(), &mut buffer).unwrap();

        assert_eq!(len, SECONDARY_PAYLOAD_LEN);
        assert_eq!(buffer[0], MODE_HISTORIC);
        assert_eq!(&buffer[1..13], b"123456789012");
        assert_eq!(&buffer[13..15], &[30, 0]);
        assert_eq!(&buffer[15..17], &[45, 0]);
    }

    #[test]
    fn test_larger_buffer_only_prefix_written() {
        let mut buffer = [0xEEu8; 32];
        let len = encode_primary(&sample(), &mut buffer).unwrap();
        assert_eq!(len, PRIMARY_PAYLOAD_LEN);
        assert!(buffer[PRIMARY_PAYLOAD_LEN..].iter().all(|&b| b == 0xEE));
    }

    #[test]
    fn test_undersized_buffer_untouched() {
        let mut buffer = [0xEEu8; PRIMARY_PAYLOAD_LEN - 1];
        assert_eq!(
            encode_primary(&sample(), &mut buffer),
            Err(EncodeError::InvalidArgument {
                required: PRIMARY_PAYLOAD_LEN,
                available: PRIMARY_PAYLOAD_LEN - 1,
            })
        );
        assert!(buffer.iter().all(|&b| b == 0xEE));

        let mut buffer = [0xEEu8; SECONDARY_PAYLOAD_LEN - 1];
        assert!(encode_secondary(&sample(), &mut buffer).is_err());
        assert!(buffer.iter().all(|&b| b == 0xEE));

        assert!(encode_primary(&sample(), &mut []).is_err());
    }

    #[test]
    fn test_payloads_match_individual_encoders() {
        let payloads = Payloads::encode(&sample());

        let mut primary = [0u8; PRIMARY_PAYLOAD_LEN];
        encode_primary(&sample(), &mut primary).unwrap();
        assert_eq!(payloads.primary, primary);

        let mut secondary = [0u8; SECONDARY_PAYLOAD_LEN];
        encode_secondary(&sample(), &mut secondary).unwrap();
        assert_eq!(payloads.secondary, secondary);

        // Zeroed snapshot still carries the mode byte and nothing else
        let empty = Payloads::encode(&Snapshot::new());
        assert_eq!(empty.primary, [MODE_HISTORIC; PRIMARY_PAYLOAD_LEN]);
        assert_eq!(empty.secondary, [MODE_HISTORIC; SECONDARY_PAYLOAD_LEN]);
    }

    #[test]
    fn test_listener_decode() {
        let payloads = Payloads::encode(&sample());

        let primary = decode_primary(&payloads.primary).unwrap();
        assert_eq!(primary.base_wh, 1_234_567);
        assert_eq!(primary.instantaneous_current_a, 5);
        assert_eq!(primary.tariff_period, 1);
        assert_eq!(primary.apparent_power_va, 2000);

        let secondary = decode_secondary(&payloads.secondary).unwrap();
        assert_eq!(&secondary.meter_id, b"123456789012");
        assert_eq!(secondary.subscribed_current_a, 30);
        assert_eq!(secondary.max_current_a, 45);
    }

    #[test]
    fn test_decode_errors() {
        assert_eq!(decode_primary(&[0u8; 4]), Err(DecodeError::TooShort));

        let mut payloads = Payloads::encode(&sample());
        payloads.secondary[0] = 1;
        assert_eq!(
            decode_secondary(&payloads.secondary),
            Err(DecodeError::UnknownMode(1))
        );
    }
}
