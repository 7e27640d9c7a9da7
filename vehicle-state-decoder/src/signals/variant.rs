//! Vehicle variant registry
//!
//! Static per-variant constants: calibration factor, steering torque
//! threshold, gear code labels, wired signal capabilities and the CAN
//! fingerprint used to recognise the variant on the bus.

use crate::types::StateError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Supported vehicle variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum VehicleVariant {
    BydTang,
    BydQin,
}

/// Signal groups a variant has wired up
///
/// Signals behind a missing capability are left out of the catalog and the
/// matching snapshot fields are reported as unavailable instead of zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SignalCapabilities {
    /// Door-open switches and brake switch on DOORS_STATUS
    pub door_brake_group: bool,
    /// EPS status code on STEER_STATUS
    pub steer_status: bool,
    /// Motor torque and driver torque sensor
    pub steer_torque: bool,
    /// User brake pressure on VSA_STATUS
    pub user_brake: bool,
    /// Dedicated cruise button and setting signals on SCM_BUTTONS
    pub cruise_buttons: bool,
}

/// Per-variant calibration and wiring constants
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VariantParams {
    /// Wheel and transmission speed calibration factor
    pub speed_factor: f64,
    /// Driver torque above which the wheel counts as held
    pub steer_threshold: f64,
    /// Name of the DBC describing the powertrain bus
    pub dbc: &'static str,
    pub capabilities: SignalCapabilities,
    /// Raw GEAR_SHIFTER code to label
    pub gear_codes: &'static [(i64, &'static str)],
}

const BYD_CAPABILITIES: SignalCapabilities = SignalCapabilities {
    door_brake_group: true,
    // Not wired yet on either BYD harness
    steer_status: false,
    steer_torque: false,
    user_brake: false,
    cruise_buttons: false,
};

const BYD_GEAR_CODES: &[(i64, &str)] = &[(1, "P"), (2, "R"), (3, "N"), (4, "D"), (5, "L")];

const BYD_PARAMS: VariantParams = VariantParams {
    speed_factor: 1.025,
    steer_threshold: 1200.0,
    dbc: "byd_qin_2014",
    capabilities: BYD_CAPABILITIES,
    gear_codes: BYD_GEAR_CODES,
};

const BYD_TANG_FINGERPRINT: &[(u32, u8)] = &[
    (85, 8), (140, 8), (269, 8), (270, 8), (287, 5), (289, 8), (290, 8), (291, 8),
    (301, 8), (307, 8), (315, 8), (464, 8), (496, 8), (522, 8), (523, 8), (527, 8),
    (530, 8), (536, 8), (537, 8), (544, 8), (546, 8), (547, 8), (576, 8), (577, 8),
    (578, 8), (588, 8), (593, 8), (596, 8), (636, 8), (660, 8), (665, 8), (694, 8),
    (784, 8), (788, 8), (790, 8), (792, 8), (800, 8), (801, 8), (802, 8), (813, 8),
    (814, 8), (815, 8), (833, 8), (834, 8), (836, 8), (854, 8), (860, 8), (916, 8),
    (926, 8), (944, 8), (948, 8), (973, 8), (985, 8), (1037, 8), (1040, 8), (1058, 8),
    (1074, 8), (1104, 8), (1141, 8), (1152, 8), (1172, 8), (1178, 8), (1181, 8),
    (1193, 8), (1219, 8), (1224, 8), (1246, 8), (1269, 8), (1881, 8), (2016, 8),
    (2024, 8),
];

const BYD_QIN_FINGERPRINT: &[(u32, u8)] = &[
    (269, 8), (270, 8), (287, 5), (289, 8), (290, 8), (291, 8), (301, 8), (523, 8),
    (530, 8), (536, 8), (537, 8), (546, 8), (547, 8), (548, 8), (549, 8), (577, 8),
    (578, 8), (588, 8), (665, 8), (800, 8), (801, 8), (802, 8), (833, 8), (834, 8),
    (860, 8), (916, 8), (1040, 8), (1224, 8),
];

impl VehicleVariant {
    /// Every supported variant
    pub const ALL: [VehicleVariant; 2] = [VehicleVariant::BydTang, VehicleVariant::BydQin];

    /// Display name of the variant
    pub fn name(&self) -> &'static str {
        match self {
            VehicleVariant::BydTang => "BYD TANG 2018 DM",
            VehicleVariant::BydQin => "BYD QIN 2014",
        }
    }

    /// Short configuration key
    pub fn key(&self) -> &'static str {
        match self {
            VehicleVariant::BydTang => "byd_tang",
            VehicleVariant::BydQin => "byd_qin",
        }
    }

    /// Calibration and wiring constants for this variant
    pub fn params(&self) -> VariantParams {
        match self {
            VehicleVariant::BydTang | VehicleVariant::BydQin => BYD_PARAMS,
        }
    }

    /// CAN fingerprint: (CAN ID, payload length) pairs seen on the bus
    pub fn fingerprint(&self) -> &'static [(u32, u8)] {
        match self {
            VehicleVariant::BydTang => BYD_TANG_FINGERPRINT,
            VehicleVariant::BydQin => BYD_QIN_FINGERPRINT,
        }
    }

    /// Check whether every observed frame fits this variant's fingerprint
    pub fn matches_fingerprint(&self, observed: &HashMap<u32, u8>) -> bool {
        let fingerprint = self.fingerprint();
        observed.iter().all(|(can_id, len)| {
            fingerprint
                .iter()
                .any(|(fp_id, fp_len)| fp_id == can_id && fp_len == len)
        })
    }
}

/// Identify the variant from observed CAN IDs and payload lengths
///
/// Returns `None` when no variant or more than one variant fits.
pub fn identify_variant(observed: &HashMap<u32, u8>) -> Option<VehicleVariant> {
    let mut candidates = VehicleVariant::ALL
        .iter()
        .copied()
        .filter(|variant| variant.matches_fingerprint(observed));

    let first = candidates.next()?;
    if candidates.next().is_some() {
        log::debug!("Fingerprint still ambiguous after {} frames", observed.len());
        return None;
    }

    log::info!("Fingerprinted vehicle as {}", first);
    Some(first)
}

impl fmt::Display for VehicleVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for VehicleVariant {
    type Err = StateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        VehicleVariant::ALL
            .iter()
            .copied()
            .find(|v| v.name().eq_ignore_ascii_case(wanted) || v.key().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| StateError::UnknownVariant(wanted.to_string()))
    }
}

impl TryFrom<String> for VehicleVariant {
    type Error = StateError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<VehicleVariant> for String {
    fn from(variant: VehicleVariant) -> Self {
        variant.key().to_string()
    }
}
