//! Signal catalog
//!
//! Declares which signals the bus decoder must resolve for a variant, the
//! value each signal takes before its message is first seen, and how often
//! each message is expected to arrive.

use crate::signals::variant::{SignalCapabilities, VehicleVariant};

/// A signal the bus decoder must resolve every cycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalSpec {
    /// Signal name within its message
    pub signal: &'static str,
    /// Message carrying the signal
    pub message: &'static str,
    /// Value reported until the message is first observed
    pub default: f64,
}

/// Required arrival rate for one message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreshnessCheck {
    pub message: &'static str,
    /// Expected message rate in Hz
    pub rate_hz: u32,
}

impl FreshnessCheck {
    /// Maximum gap between two arrivals, in control cycles
    pub fn max_period_cycles(&self, control_hz: u32) -> u32 {
        if self.rate_hz == 0 {
            return u32::MAX;
        }
        control_hz.div_ceil(self.rate_hz)
    }
}

/// Static per-variant signal declaration
#[derive(Debug, Clone, PartialEq)]
pub struct SignalCatalog {
    variant: VehicleVariant,
    signals: Vec<SignalSpec>,
    checks: Vec<FreshnessCheck>,
}

const fn spec(signal: &'static str, message: &'static str, default: f64) -> SignalSpec {
    SignalSpec {
        signal,
        message,
        default,
    }
}

const fn check(message: &'static str, rate_hz: u32) -> FreshnessCheck {
    FreshnessCheck { message, rate_hz }
}

const BASE_SIGNALS: &[SignalSpec] = &[
    spec("XMISSION_SPEED", "ENGINE_DATA", 0.0),
    spec("WHEEL_SPEED_FL", "WHEEL_SPEEDS", 0.0),
    spec("WHEEL_SPEED_FR", "WHEEL_SPEEDS", 0.0),
    spec("WHEEL_SPEED_RL", "WHEEL_SPEEDS", 0.0),
    spec("WHEEL_SPEED_RR", "WHEEL_SPEEDS", 0.0),
    spec("STEER_ANGLE", "STEERING_SENSORS", 0.0),
    spec("STEER_ANGLE_RATE", "STEERING_SENSORS", 0.0),
    spec("LEFT_BLINKER", "LIGHT2", 0.0),
    spec("RIGHT_BLINKER", "LIGHT2", 0.0),
    spec("SEATBELT_DRIVER_LATCHED", "DOORS_STATUS", 0.0),
    spec("SET_ME", "CRUISE", 0.0),
    spec("GEAR_SHIFTER", "GEARBOX", 0.0),
    spec("GAS_P1", "GAS_POSITION", 0.0),
];

const BASE_CHECKS: &[FreshnessCheck] = &[
    check("ENGINE_DATA", 100),
    check("WHEEL_SPEEDS", 50),
    check("STEERING_SENSORS", 100),
    check("DOORS_STATUS", 10),
    check("CRUISE", 10),
];

// Doors read as open and the brake as pressed until DOORS_STATUS arrives
const DOOR_BRAKE_SIGNALS: &[SignalSpec] = &[
    spec("DOOR_OPEN_FL", "DOORS_STATUS", 1.0),
    spec("DOOR_OPEN_FR", "DOORS_STATUS", 1.0),
    spec("DOOR_OPEN_RL", "DOORS_STATUS", 1.0),
    spec("DOOR_OPEN_RR", "DOORS_STATUS", 1.0),
    spec("BRAKE_PRESSED", "DOORS_STATUS", 1.0),
];

const DOOR_BRAKE_CHECKS: &[FreshnessCheck] = &[check("DOORS_STATUS", 3)];

// Fault code until the EPS reports
const STEER_STATUS_SIGNALS: &[SignalSpec] = &[spec("STEER_STATUS", "STEER_STATUS", 5.0)];

const STEER_STATUS_CHECKS: &[FreshnessCheck] = &[check("STEER_STATUS", 100)];

const STEER_TORQUE_SIGNALS: &[SignalSpec] = &[
    spec("MOTOR_TORQUE", "STEER_MOTOR_TORQUE", 0.0),
    spec("STEER_TORQUE_SENSOR", "STEER_STATUS", 0.0),
];

const USER_BRAKE_SIGNALS: &[SignalSpec] = &[spec("USER_BRAKE", "VSA_STATUS", 0.0)];

const USER_BRAKE_CHECKS: &[FreshnessCheck] = &[check("VSA_STATUS", 50)];

const CRUISE_BUTTON_SIGNALS: &[SignalSpec] = &[
    spec("CRUISE_BUTTONS", "SCM_BUTTONS", 0.0),
    spec("CRUISE_SETTING", "SCM_BUTTONS", 0.0),
];

const CRUISE_BUTTON_CHECKS: &[FreshnessCheck] = &[check("SCM_BUTTONS", 25)];

impl SignalCatalog {
    /// Build the catalog for a vehicle variant
    ///
    /// Deterministic: the same variant always yields the same ordered lists.
    pub fn for_variant(variant: VehicleVariant) -> Self {
        Self::with_capabilities(variant, variant.params().capabilities)
    }

    /// Build a catalog for a variant with an explicit capability set
    pub fn with_capabilities(variant: VehicleVariant, caps: SignalCapabilities) -> Self {
        let mut catalog = Self {
            variant,
            signals: Vec::new(),
            checks: Vec::new(),
        };

        catalog.extend(BASE_SIGNALS, BASE_CHECKS);

        if caps.door_brake_group {
            catalog.extend(DOOR_BRAKE_SIGNALS, DOOR_BRAKE_CHECKS);
        }
        if caps.steer_status {
            catalog.extend(STEER_STATUS_SIGNALS, STEER_STATUS_CHECKS);
        }
        if caps.steer_torque {
            // STEER_STATUS and STEER_MOTOR_TORQUE share the EPS rate
            catalog.extend(
                STEER_TORQUE_SIGNALS,
                &[check("STEER_STATUS", 100), check("STEER_MOTOR_TORQUE", 100)],
            );
        }
        if caps.user_brake {
            catalog.extend(USER_BRAKE_SIGNALS, USER_BRAKE_CHECKS);
        }
        if caps.cruise_buttons {
            catalog.extend(CRUISE_BUTTON_SIGNALS, CRUISE_BUTTON_CHECKS);
        }

        catalog
    }

    /// Append a signal group; a check for an already declared message
    /// replaces its rate in place
    fn extend(&mut self, signals: &[SignalSpec], checks: &[FreshnessCheck]) {
        for signal in signals {
            if !self.contains(signal.message, signal.signal) {
                self.signals.push(*signal);
            }
        }

        for new_check in checks {
            match self.checks.iter_mut().find(|c| c.message == new_check.message) {
                Some(existing) => existing.rate_hz = new_check.rate_hz,
                None => self.checks.push(*new_check),
            }
        }
    }

    pub fn variant(&self) -> VehicleVariant {
        self.variant
    }

    /// Required signals, in declaration order
    pub fn signals(&self) -> &[SignalSpec] {
        &self.signals
    }

    /// Freshness checks, one per message
    pub fn checks(&self) -> &[FreshnessCheck] {
        &self.checks
    }

    /// Check whether a signal is declared
    pub fn contains(&self, message: &str, signal: &str) -> bool {
        self.signals
            .iter()
            .any(|s| s.message == message && s.signal == signal)
    }

    /// Catalog default for a signal
    pub fn default_value(&self, message: &str, signal: &str) -> Option<f64> {
        self.signals
            .iter()
            .find(|s| s.message == message && s.signal == signal)
            .map(|s| s.default)
    }

    /// Distinct message names, in declaration order
    pub fn messages(&self) -> Vec<&'static str> {
        let mut messages: Vec<&'static str> = Vec::new();
        for s in &self.signals {
            if !messages.contains(&s.message) {
                messages.push(s.message);
            }
        }
        messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_baseline_and_door_group() {
        let catalog = SignalCatalog::for_variant(VehicleVariant::BydTang);

        assert_eq!(catalog.signals().len(), BASE_SIGNALS.len() + DOOR_BRAKE_SIGNALS.len());
        assert_eq!(catalog.signals()[0].signal, "XMISSION_SPEED");
        assert_eq!(catalog.default_value("DOORS_STATUS", "DOOR_OPEN_FL"), Some(1.0));
        assert_eq!(catalog.default_value("DOORS_STATUS", "BRAKE_PRESSED"), Some(1.0));
        assert_eq!(catalog.default_value("GEARBOX", "GEAR_SHIFTER"), Some(0.0));
        assert!(!catalog.contains("STEER_STATUS", "STEER_STATUS"));
    }

    #[test]
    fn test_one_check_per_message() {
        let catalog = SignalCatalog::for_variant(VehicleVariant::BydQin);
        let checks = catalog.checks();

        assert_eq!(checks.len(), 5);
        let doors: Vec<_> = checks.iter().filter(|c| c.message == "DOORS_STATUS").collect();
        assert_eq!(doors.len(), 1);
        assert_eq!(doors[0].rate_hz, 3);
        // Position of the first declaration is kept
        assert_eq!(checks[3].message, "DOORS_STATUS");
    }

    #[test]
    fn test_deterministic() {
        let a = SignalCatalog::for_variant(VehicleVariant::BydTang);
        let b = SignalCatalog::for_variant(VehicleVariant::BydTang);
        assert_eq!(a, b);
    }

    #[test]
    fn test_capability_groups() {
        let caps = SignalCapabilities {
            door_brake_group: false,
            steer_status: true,
            steer_torque: true,
            user_brake: true,
            cruise_buttons: true,
        };
        let catalog = SignalCatalog::with_capabilities(VehicleVariant::BydTang, caps);

        assert!(!catalog.contains("DOORS_STATUS", "DOOR_OPEN_FL"));
        assert_eq!(catalog.default_value("STEER_STATUS", "STEER_STATUS"), Some(5.0));
        assert!(catalog.contains("STEER_STATUS", "STEER_TORQUE_SENSOR"));
        assert!(catalog.contains("VSA_STATUS", "USER_BRAKE"));
        assert!(catalog.contains("SCM_BUTTONS", "CRUISE_SETTING"));

        let steer_checks = catalog
            .checks()
            .iter()
            .filter(|c| c.message == "STEER_STATUS")
            .count();
        assert_eq!(steer_checks, 1);
        assert!(catalog.messages().contains(&"STEER_MOTOR_TORQUE"));
    }

    #[test]
    fn test_max_period_cycles() {
        assert_eq!(check("CRUISE", 10).max_period_cycles(100), 10);
        assert_eq!(check("DOORS_STATUS", 3).max_period_cycles(100), 34);
        assert_eq!(check("ENGINE_DATA", 100).max_period_cycles(100), 1);
        assert_eq!(check("NEVER", 0).max_period_cycles(100), u32::MAX);
    }
}
