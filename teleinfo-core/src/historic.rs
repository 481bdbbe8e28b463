//! Historical-mode snapshot and label interpretation
//!
//! Each accepted dataset updates exactly one snapshot field, or checks one of
//! the fixed-value labels the beacon expects from a single-rate meter.

use core::str::FromStr;

use teleinfo_protocol::Dataset;

use crate::config::NumberPolicy;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Meter identifier (ADCO) length in characters
pub const METER_ID_LEN: usize = 12;

/// Tariff option this beacon supports
pub const EXPECTED_OPTARIF: &str = "BASE";
/// Half-hour indicator expected with the base option
pub const EXPECTED_HHPHC: &str = "A";
/// Operating state word of a healthy meter
pub const EXPECTED_MOTDETAT: &str = "000000";

/// Interpretation errors
///
/// None of these are fatal to stream processing; the snapshot is left
/// untouched in every case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InterpretError {
    /// Label is not part of historical mode as supported here
    UnknownLabel,
    /// Fixed-value label does not match the supported configuration
    UnsupportedValue(HistoricLabel),
    /// Numeric text rejected under [`NumberPolicy::Strict`]
    InvalidNumber(HistoricLabel),
}

/// Labels recognized in historical mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HistoricLabel {
    /// Meter address (12 chars)
    Adco,
    /// Tariff option
    Optarif,
    /// Subscribed current (A)
    Isousc,
    /// Base index (Wh)
    Base,
    /// Current tariff period
    Ptec,
    /// Instantaneous current (A)
    Iinst,
    /// Maximum current (A)
    Imax,
    /// Apparent power (VA)
    Papp,
    /// Half-hour indicator
    Hhphc,
    /// Operating state word
    Motdetat,
}

impl HistoricLabel {
    /// Wire spelling of this label
    pub fn as_str(self) -> &'static str {
        match self {
            HistoricLabel::Adco => "ADCO",
            HistoricLabel::Optarif => "OPTARIF",
            HistoricLabel::Isousc => "ISOUSC",
            HistoricLabel::Base => "BASE",
            HistoricLabel::Ptec => "PTEC",
            HistoricLabel::Iinst => "IINST",
            HistoricLabel::Imax => "IMAX",
            HistoricLabel::Papp => "PAPP",
            HistoricLabel::Hhphc => "HHPHC",
            HistoricLabel::Motdetat => "MOTDETAT",
        }
    }

    /// The single accepted literal for validation-only labels
    pub fn expected_value(self) -> Option<&'static str> {
        match self {
            HistoricLabel::Optarif => Some(EXPECTED_OPTARIF),
            HistoricLabel::Hhphc => Some(EXPECTED_HHPHC),
            HistoricLabel::Motdetat => Some(EXPECTED_MOTDETAT),
            _ => None,
        }
    }
}

impl FromStr for HistoricLabel {
    type Err = InterpretError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADCO" => Ok(HistoricLabel::Adco),
            "OPTARIF" => Ok(HistoricLabel::Optarif),
            "ISOUSC" => Ok(HistoricLabel::Isousc),
            "BASE" => Ok(HistoricLabel::Base),
            "PTEC" => Ok(HistoricLabel::Ptec),
            "IINST" => Ok(HistoricLabel::Iinst),
            "IMAX" => Ok(HistoricLabel::Imax),
            "PAPP" => Ok(HistoricLabel::Papp),
            "HHPHC" => Ok(HistoricLabel::Hhphc),
            "MOTDETAT" => Ok(HistoricLabel::Motdetat),
            _ => Err(InterpretError::UnknownLabel),
        }
    }
}

/// Latest known measurements from a historical-mode meter
///
/// Created once at startup and updated field by field as datasets arrive.
/// Fields keep their last value until the same label is seen again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Snapshot {
    /// Meter identifier, raw ASCII (ADCO)
    pub meter_id: [u8; METER_ID_LEN],
    /// Subscribed current limit in A (ISOUSC)
    pub subscribed_current_a: u16,
    /// Cumulative base energy in Wh (BASE)
    pub base_wh: u32,
    /// Tariff period code (PTEC)
    pub tariff_period: u16,
    /// Instantaneous current in A (IINST)
    pub instantaneous_current_a: u16,
    /// Maximum current in A (IMAX)
    pub max_current_a: u16,
    /// Apparent power in VA (PAPP)
    pub apparent_power_va: u16,
}

impl Snapshot {
    /// Create an empty snapshot
    pub fn new() -> Self {
        Self::default()
    }

    /// True once an ADCO dataset has been accepted
    pub fn has_meter_id(&self) -> bool {
        self.meter_id != [0; METER_ID_LEN]
    }

    /// Meter identifier as text, if one has been received
    pub fn meter_id_str(&self) -> Option<&str> {
        if !self.has_meter_id() {
            return None;
        }
        core::str::from_utf8(&self.meter_id).ok()
    }

    /// Apply a dataset using permissive number parsing
    pub fn apply(&mut self, dataset: &Dataset<'_>) -> Result<HistoricLabel, InterpretError> {
        self.apply_with(dataset, NumberPolicy::Permissive)
    }

    /// Apply a dataset to the snapshot
    ///
    /// Returns the label that was updated or validated. On error nothing is
    /// modified.
    pub fn apply_with(
        &mut self,
        dataset: &Dataset<'_>,
        numbers: NumberPolicy,
    ) -> Result<HistoricLabel, InterpretError> {
        let label: HistoricLabel = dataset.label.parse()?;
        let data = dataset.data;

        match label {
            HistoricLabel::Adco => {
                let id: [u8; METER_ID_LEN] = data
                    .as_bytes()
                    .try_into()
                    .map_err(|_| InterpretError::UnsupportedValue(label))?;
                self.meter_id = id;
            }
            HistoricLabel::Isousc => {
                self.subscribed_current_a = parse_decimal(label, data, numbers)?
            }
            HistoricLabel::Base => self.base_wh = parse_decimal(label, data, numbers)?,
            HistoricLabel::Ptec => self.tariff_period = parse_decimal(label, data, numbers)?,
            HistoricLabel::Iinst => {
                self.instantaneous_current_a = parse_decimal(label, data, numbers)?
            }
            HistoricLabel::Imax => self.max_current_a = parse_decimal(label, data, numbers)?,
            HistoricLabel::Papp => {
                self.apparent_power_va = parse_decimal(label, data, numbers)?
            }
            HistoricLabel::Optarif | HistoricLabel::Hhphc | HistoricLabel::Motdetat => {
                if label.expected_value() != Some(data) {
                    return Err(InterpretError::UnsupportedValue(label));
                }
            }
        }

        Ok(label)
    }
}

/// Parse unsigned decimal text into the destination width
fn parse_decimal<T>(
    label: HistoricLabel,
    data: &str,
    numbers: NumberPolicy,
) -> Result<T, InterpretError>
where
    T: FromStr + Default,
{
    // FromStr accepts a leading '+', which never appears on the wire
    let parsed = if data.bytes().all(|b| b.is_ascii_digit()) {
        data.parse::<T>().ok()
    } else {
        None
    };

    match (parsed, numbers) {
        (Some(value), _) => Ok(value),
        (None, NumberPolicy::Permissive) => Ok(T::default()),
        (None, NumberPolicy::Strict) => Err(InterpretError::InvalidNumber(label)),
    }
}
