//! Cruise control helpers

use serde::Serialize;

/// Steering wheel cruise button codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CruiseButton {
    None,
    Main,
    Cancel,
    DecelSet,
    ResAccel,
}

impl CruiseButton {
    pub fn from_raw(raw: f64) -> Self {
        match raw as i64 {
            1 => CruiseButton::Main,
            2 => CruiseButton::Cancel,
            3 => CruiseButton::DecelSet,
            4 => CruiseButton::ResAccel,
            _ => CruiseButton::None,
        }
    }
}

/// Speed offset (m/s) that keeps the controlled speed about 0.3 m/s under
/// the set speed; never positive
pub fn cruise_offset(offset: f64, speed: f64) -> f64 {
    const K0: f64 = -0.3;
    const K1: f64 = -0.01879;
    const K2: f64 = 0.01013;
    (K0 + K1 * speed + K2 * speed * offset).min(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_button_codes() {
        assert_eq!(CruiseButton::from_raw(4.0), CruiseButton::ResAccel);
        assert_eq!(CruiseButton::from_raw(3.0), CruiseButton::DecelSet);
        assert_eq!(CruiseButton::from_raw(2.0), CruiseButton::Cancel);
        assert_eq!(CruiseButton::from_raw(1.0), CruiseButton::Main);
        assert_eq!(CruiseButton::from_raw(0.0), CruiseButton::None);
        assert_eq!(CruiseButton::from_raw(7.0), CruiseButton::None);
    }

    #[test]
    fn test_cruise_offset_fit_points() {
        assert!((cruise_offset(0.0, 0.0) + 0.3).abs() < 1e-9);
        assert!((cruise_offset(-2.5, 34.0) + 1.8).abs() < 0.01);
    }

    #[test]
    fn test_cruise_offset_never_positive() {
        assert_eq!(cruise_offset(100.0, 40.0), 0.0);
    }
}
