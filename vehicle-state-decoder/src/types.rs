//! Core types for the vehicle state decoder library
//!
//! This module defines the snapshot the decoder emits once per control cycle
//! and the error type used by configuration-time operations. The per-cycle
//! update itself never fails: missing inputs fall back to catalog defaults.

use crate::cruise::CruiseButton;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Timestamp type used throughout the decoder
pub type Timestamp = DateTime<Utc>;

/// Result type for decoder operations
pub type Result<T> = std::result::Result<T, StateError>;

/// Errors that can occur while configuring a decoder
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("Unknown vehicle variant: {0}")]
    UnknownVariant(String),

    #[error("Failed to parse DBC file: {0}")]
    DbcParseError(String),

    #[error("Value table not found: {message}.{signal}")]
    ValueTableNotFound { message: String, signal: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Canonical gear shifter position
///
/// Closed set: every raw gear code maps to exactly one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GearShifter {
    Park,
    Reverse,
    Neutral,
    Drive,
    Low,
    Unknown,
}

impl fmt::Display for GearShifter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GearShifter::Park => write!(f, "P"),
            GearShifter::Reverse => write!(f, "R"),
            GearShifter::Neutral => write!(f, "N"),
            GearShifter::Drive => write!(f, "D"),
            GearShifter::Low => write!(f, "L"),
            GearShifter::Unknown => write!(f, "?"),
        }
    }
}

/// Calibrated wheel speeds in m/s
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct WheelSpeeds {
    pub fl: f64,
    pub fr: f64,
    pub rl: f64,
    pub rr: f64,
}

impl WheelSpeeds {
    /// Mean of the four wheels
    pub fn mean(&self) -> f64 {
        (self.fl + self.fr + self.rl + self.rr) / 4.0
    }
}

/// Graduated steering fault flags derived from one status code
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SteerFaults {
    /// Hard fault indicator
    pub error: bool,
    /// Downstream actuation must not proceed
    pub not_allowed: bool,
    /// Driver-facing advisory
    pub warning: bool,
}

/// Normalized vehicle state for one control cycle
///
/// Built fresh by [`crate::StateDecoder::update`]; never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VehicleState {
    /// Calibrated per-wheel speeds (m/s, never negative)
    pub wheel_speeds: WheelSpeeds,
    /// Blended wheel/transmission speed before filtering (m/s)
    pub v_ego_raw: f64,
    /// Filtered speed (m/s, never negative)
    pub v_ego: f64,
    /// Filtered acceleration (m/s²)
    pub a_ego: f64,
    /// Steering wheel angle (deg)
    pub steering_angle: f64,
    /// Steering wheel rate (deg/s)
    pub steering_rate: f64,
    pub steer_error: bool,
    pub steer_warning: bool,
    /// Gates downstream actuation; not a driver-facing signal
    pub steer_not_allowed: bool,
    pub door_open: bool,
    pub seatbelt_unlatched: bool,
    pub left_blinker: bool,
    pub right_blinker: bool,
    /// Brake switch active
    pub brake_pressed: bool,
    pub gear_shifter: GearShifter,
    /// Gas pedal position as a fraction of full travel
    pub gas: f64,
    /// Raw cruise button value for this cycle
    pub cruise_buttons: f64,
    /// Lane-keep toggle after this cycle's edge evaluation
    pub lane_keep_enabled: bool,
    /// Steering torque sensor reading, if the variant wires it
    pub steering_torque: Option<f64>,
    /// Driver torque above the variant threshold, if torque is wired
    pub steering_pressed: Option<bool>,
    /// EPS motor torque, if torque is wired
    pub steering_torque_eps: Option<f64>,
    /// User brake pressure, if the variant wires it
    pub user_brake: Option<f64>,
}

impl VehicleState {
    /// Steering fault flags as a group
    pub fn steer_faults(&self) -> SteerFaults {
        SteerFaults {
            error: self.steer_error,
            not_allowed: self.steer_not_allowed,
            warning: self.steer_warning,
        }
    }

    /// Decoded cruise button for this cycle
    pub fn cruise_button(&self) -> CruiseButton {
        CruiseButton::from_raw(self.cruise_buttons)
    }
}
