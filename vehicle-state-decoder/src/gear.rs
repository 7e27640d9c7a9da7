//! Gear shifter decoding
//!
//! Raw GEAR_SHIFTER codes are first mapped to a label through the variant's
//! value table, then the label is parsed into a [`GearShifter`].

use crate::signals::variant::VehicleVariant;
use crate::types::GearShifter;
use std::collections::HashMap;

/// Raw gear code → label lookup for one variant
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GearTable {
    labels: HashMap<i64, String>,
}

impl GearTable {
    /// Build a table from (code, label) pairs
    pub fn from_codes<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = (i64, S)>,
        S: Into<String>,
    {
        Self {
            labels: codes.into_iter().map(|(code, label)| (code, label.into())).collect(),
        }
    }

    /// Built-in table from the vehicle registry
    pub fn for_variant(variant: VehicleVariant) -> Self {
        Self::from_codes(variant.params().gear_codes.iter().copied())
    }

    /// Label for a raw code, if the table knows it
    pub fn label(&self, code: i64) -> Option<&str> {
        self.labels.get(&code).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Decode a raw signal value; never fails
    pub fn decode(&self, raw: f64) -> GearShifter {
        if !raw.is_finite() {
            return GearShifter::Unknown;
        }
        self.label(raw as i64)
            .map(parse_gear_label)
            .unwrap_or(GearShifter::Unknown)
    }
}

/// Parse a value-table label into a gear position
pub fn parse_gear_label(label: &str) -> GearShifter {
    match label.trim().to_ascii_lowercase().as_str() {
        "p" | "park" => GearShifter::Park,
        "r" | "reverse" => GearShifter::Reverse,
        "n" | "neutral" => GearShifter::Neutral,
        "d" | "drive" => GearShifter::Drive,
        "l" | "low" => GearShifter::Low,
        _ => GearShifter::Unknown,
    }
}
