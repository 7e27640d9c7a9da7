//! Decoder configuration types
//!
//! Tunables for the state decoder. Per-vehicle constants (calibration,
//! gear tables, signal lists) live in the vehicle registry, not here.

use serde::{Deserialize, Serialize};

/// Configuration for the state decoder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecoderConfig {
    /// Control loop rate in Hz (one update per cycle)
    #[serde(default = "default_control_hz")]
    pub control_hz: u32,

    /// Speed filter parameters
    #[serde(default)]
    pub speed_filter: SpeedFilterConfig,
}

fn default_control_hz() -> u32 {
    100
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            control_hz: default_control_hz(),
            speed_filter: SpeedFilterConfig::default(),
        }
    }
}

/// Parameters for the fixed-gain speed/acceleration Kalman filter
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeedFilterConfig {
    /// Filter time step in seconds
    #[serde(default = "default_dt")]
    pub dt: f64,

    /// Steady-state gain applied to the speed state
    #[serde(default = "default_speed_gain")]
    pub speed_gain: f64,

    /// Steady-state gain applied to the acceleration state
    #[serde(default = "default_accel_gain")]
    pub accel_gain: f64,

    /// Innovation (m/s) above which the filter snaps to the measurement
    #[serde(default = "default_reset_threshold")]
    pub reset_threshold: f64,
}

fn default_dt() -> f64 {
    0.01
}

fn default_speed_gain() -> f64 {
    0.122_876_73
}

fn default_accel_gain() -> f64 {
    0.296_663_09
}

fn default_reset_threshold() -> f64 {
    2.0
}

impl Default for SpeedFilterConfig {
    fn default() -> Self {
        Self {
            dt: default_dt(),
            speed_gain: default_speed_gain(),
            accel_gain: default_accel_gain(),
            reset_threshold: default_reset_threshold(),
        }
    }
}

impl DecoderConfig {
    /// Create a new decoder configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set the control loop rate
    ///
    /// The speed filter step follows the new rate.
    pub fn with_control_hz(mut self, control_hz: u32) -> Self {
        self.control_hz = control_hz;
        self.speed_filter.dt = 1.0 / f64::from(control_hz.max(1));
        self
    }

    /// Builder method: replace the speed filter parameters
    pub fn with_speed_filter(mut self, speed_filter: SpeedFilterConfig) -> Self {
        self.speed_filter = speed_filter;
        self
    }

    /// Builder method: set the speed filter reset threshold
    pub fn with_reset_threshold(mut self, threshold: f64) -> Self {
        self.speed_filter.reset_threshold = threshold;
        self
    }

    /// Whether the speed filter steps once per control cycle
    pub fn filter_step_matches_rate(&self) -> bool {
        let cycle = 1.0 / f64::from(self.control_hz.max(1));
        (self.speed_filter.dt - cycle).abs() < 1e-9
    }
}
