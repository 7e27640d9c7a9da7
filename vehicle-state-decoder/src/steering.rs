//! Steering fault classification
//!
//! Maps the EPS status code to a category and derives the three graduated
//! fault flags from it. Each flag is raised when the category falls outside
//! that flag's tolerated set; unrecognized codes fail every check.

use crate::types::SteerFaults;
use std::fmt;

/// EPS steering status category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SteerStatus {
    Normal,
    NoTorqueAlert1,
    LowSpeedLockout,
    /// Bump or driver nudge; the two are indistinguishable
    NoTorqueAlert2,
    Fault1,
    TemporaryFault,
    Unrecognized(i64),
}

impl SteerStatus {
    /// Map a raw STEER_STATUS code
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => SteerStatus::Normal,
            2 => SteerStatus::NoTorqueAlert1,
            3 => SteerStatus::LowSpeedLockout,
            4 => SteerStatus::NoTorqueAlert2,
            5 => SteerStatus::Fault1,
            6 => SteerStatus::TemporaryFault,
            other => SteerStatus::Unrecognized(other),
        }
    }

    /// Map a raw signal value as read from the parsed table
    ///
    /// Only exact integer values can name a category; fractional and
    /// non-finite values are unrecognized.
    pub fn from_raw(raw: f64) -> Self {
        if raw.is_finite() && raw.fract() == 0.0 {
            Self::from_code(raw as i64)
        } else {
            SteerStatus::Unrecognized(i64::MIN)
        }
    }

    /// Hard fault tolerated set
    fn error_tolerated(self) -> bool {
        match self {
            SteerStatus::Normal
            | SteerStatus::NoTorqueAlert1
            | SteerStatus::NoTorqueAlert2
            | SteerStatus::LowSpeedLockout
            | SteerStatus::TemporaryFault => true,
            SteerStatus::Fault1 | SteerStatus::Unrecognized(_) => false,
        }
    }

    /// Actuation tolerated set
    fn actuation_tolerated(self) -> bool {
        match self {
            SteerStatus::Normal | SteerStatus::NoTorqueAlert2 => true,
            SteerStatus::NoTorqueAlert1
            | SteerStatus::LowSpeedLockout
            | SteerStatus::Fault1
            | SteerStatus::TemporaryFault
            | SteerStatus::Unrecognized(_) => false,
        }
    }

    /// Driver advisory tolerated set; a low speed lockout is not worth a warning
    fn warning_tolerated(self) -> bool {
        match self {
            SteerStatus::Normal | SteerStatus::LowSpeedLockout | SteerStatus::NoTorqueAlert2 => {
                true
            }
            SteerStatus::NoTorqueAlert1
            | SteerStatus::Fault1
            | SteerStatus::TemporaryFault
            | SteerStatus::Unrecognized(_) => false,
        }
    }

    /// Derive the fault flags; pure function of the status
    pub fn classify(self) -> SteerFaults {
        SteerFaults {
            error: !self.error_tolerated(),
            not_allowed: !self.actuation_tolerated(),
            warning: !self.warning_tolerated(),
        }
    }
}

impl fmt::Display for SteerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SteerStatus::Normal => write!(f, "NORMAL"),
            SteerStatus::NoTorqueAlert1 => write!(f, "NO_TORQUE_ALERT_1"),
            SteerStatus::LowSpeedLockout => write!(f, "LOW_SPEED_LOCKOUT"),
            SteerStatus::NoTorqueAlert2 => write!(f, "NO_TORQUE_ALERT_2"),
            SteerStatus::Fault1 => write!(f, "FAULT_1"),
            SteerStatus::TemporaryFault => write!(f, "TMP_FAULT"),
            SteerStatus::Unrecognized(code) => write!(f, "UNRECOGNIZED({})", code),
        }
    }
}
