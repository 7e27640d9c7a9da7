//! Speed fusion and filtering
//!
//! Wheel speeds are noisy near standstill (they report spurious motion while
//! stopped) but accurate at speed; the transmission speed is the opposite.
//! The raw vehicle speed blends the two by a weight that ramps from pure
//! transmission at 1 m/s to pure wheel speed at 6 m/s.

use crate::config::SpeedFilterConfig;

/// km/h to m/s
pub const KPH_TO_MS: f64 = 1.0 / 3.6;

/// Wheel speed (m/s) at or below which only the transmission speed is used
pub const BLEND_LOW_MS: f64 = 1.0;
/// Wheel speed (m/s) at or above which only the wheel speed is used
pub const BLEND_HIGH_MS: f64 = 6.0;

/// Convert a raw km/h speed signal to calibrated m/s, clamped at zero
pub fn calibrate_speed(raw_kph: f64, speed_factor: f64) -> f64 {
    (raw_kph * KPH_TO_MS * speed_factor).max(0.0)
}

/// Weight given to the wheel speed estimate
pub fn blend_weight(v_wheel: f64) -> f64 {
    interp(v_wheel, [BLEND_LOW_MS, BLEND_HIGH_MS], [0.0, 1.0])
}

/// Blend wheel and transmission speeds (both m/s)
pub fn blend_speed(v_wheel: f64, v_transmission: f64) -> f64 {
    let weight = blend_weight(v_wheel);
    (1.0 - weight) * v_transmission + weight * v_wheel
}

/// Piecewise-linear interpolation over two breakpoints, clamped at the ends
fn interp(x: f64, bp: [f64; 2], v: [f64; 2]) -> f64 {
    if x <= bp[0] {
        v[0]
    } else if x >= bp[1] {
        v[1]
    } else {
        v[0] + (x - bp[0]) * (v[1] - v[0]) / (bp[1] - bp[0])
    }
}

/// Temporal smoothing of the raw speed into (speed, acceleration)
pub trait SpeedFilter {
    /// Feed one raw speed sample; returns filtered speed and acceleration
    fn update(&mut self, v_raw: f64) -> (f64, f64);

    /// Snap the filter state to a known speed
    fn reset(&mut self, v: f64);
}

/// Fixed-gain two-state Kalman filter over [speed, acceleration]
///
/// Constant-acceleration model with a precomputed steady-state gain, so each
/// step is a handful of multiply-adds.
#[derive(Debug, Clone)]
pub struct KalmanSpeedFilter {
    config: SpeedFilterConfig,
    speed: f64,
    accel: f64,
}

impl KalmanSpeedFilter {
    pub fn new(config: SpeedFilterConfig) -> Self {
        Self {
            config,
            speed: 0.0,
            accel: 0.0,
        }
    }

    /// Current state as (speed, acceleration)
    pub fn state(&self) -> (f64, f64) {
        (self.speed, self.accel)
    }
}

impl Default for KalmanSpeedFilter {
    fn default() -> Self {
        Self::new(SpeedFilterConfig::default())
    }
}

impl SpeedFilter for KalmanSpeedFilter {
    fn update(&mut self, v_raw: f64) -> (f64, f64) {
        if (v_raw - self.speed).abs() > self.config.reset_threshold {
            log::trace!("Speed filter reset: {:.3} -> {:.3} m/s", self.speed, v_raw);
            self.reset(v_raw);
        }

        let SpeedFilterConfig {
            dt,
            speed_gain: k0,
            accel_gain: k1,
            ..
        } = self.config;

        // x' = (A - K*C) x + K z
        let speed = (1.0 - k0) * self.speed + dt * self.accel + k0 * v_raw;
        let accel = -k1 * self.speed + self.accel + k1 * v_raw;

        self.speed = speed;
        self.accel = accel;
        (speed, accel)
    }

    fn reset(&mut self, v: f64) {
        self.speed = v;
        self.accel = 0.0;
    }
}
