//! Lane-keep toggle
//!
//! The LKAS button on the steering wheel oscillates for the duration of a
//! press, so the toggle is edge triggered: it flips only when the previous
//! cycle's cruise setting was armed and the current sentinel reads
//! deactivated.

/// Cruise setting value while the button is armed
pub const ARMED: f64 = 1.0;
/// Sentinel value once the press is released
pub const DEACTIVATED: f64 = 0.0;

/// Edge-triggered lane-keep enable state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaneKeepToggle {
    enabled: bool,
}

impl LaneKeepToggle {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Evaluate one cycle; returns true if the state flipped
    ///
    /// At most one flip per call.
    pub fn evaluate(&mut self, prev_setting: f64, sentinel: f64) -> bool {
        if prev_setting == ARMED && sentinel == DEACTIVATED {
            self.enabled = !self.enabled;
            true
        } else {
            false
        }
    }
}

impl Default for LaneKeepToggle {
    /// Lane keeping starts engaged
    fn default() -> Self {
        Self::new(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flips_on_falling_edge() {
        let mut toggle = LaneKeepToggle::default();
        assert!(toggle.is_enabled());

        assert!(toggle.evaluate(1.0, 0.0));
        assert!(!toggle.is_enabled());

        assert!(toggle.evaluate(1.0, 0.0));
        assert!(toggle.is_enabled());
    }

    #[test]
    fn test_holds_otherwise() {
        for (prev, current) in [(1.0, 1.0), (0.0, 0.0), (0.0, 1.0), (2.0, 0.0)] {
            let mut toggle = LaneKeepToggle::new(false);
            assert!(!toggle.evaluate(prev, current));
            assert!(!toggle.is_enabled());
        }
    }
}
