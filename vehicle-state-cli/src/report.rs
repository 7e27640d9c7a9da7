//! Replay summaries and text output

use std::fmt::Write;
use std::path::PathBuf;
use vehicle_state_decoder::{VehicleState, VehicleVariant};

/// Per-file replay summary
#[derive(Debug, Clone)]
pub struct ReplaySummary {
    pub file: PathBuf,
    pub variant: VehicleVariant,
    pub cycles: usize,
    pub lane_keep_flips: usize,
    pub peak_speed: f64,
    pub steer_error_cycles: usize,
    pub steer_warning_cycles: usize,
    /// Cycles decoded while at least one checked message was stale
    pub stale_cycles: usize,
    pub final_lane_keep: bool,
}

impl ReplaySummary {
    pub fn new(file: PathBuf, variant: VehicleVariant, lane_keep: bool) -> Self {
        Self {
            file,
            variant,
            cycles: 0,
            lane_keep_flips: 0,
            peak_speed: 0.0,
            steer_error_cycles: 0,
            steer_warning_cycles: 0,
            stale_cycles: 0,
            final_lane_keep: lane_keep,
        }
    }

    /// Account for one decoded cycle
    pub fn record(&mut self, state: &VehicleState, stale: bool) {
        self.cycles += 1;
        if state.lane_keep_enabled != self.final_lane_keep {
            self.lane_keep_flips += 1;
            self.final_lane_keep = state.lane_keep_enabled;
        }
        self.peak_speed = self.peak_speed.max(state.v_ego);
        if state.steer_error {
            self.steer_error_cycles += 1;
        }
        if state.steer_warning {
            self.steer_warning_cycles += 1;
        }
        if stale {
            self.stale_cycles += 1;
        }
    }

    /// Render as a small ASCII block
    pub fn render_txt(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Replay: {:?}", self.file);
        let _ = writeln!(out, "  Vehicle:          {}", self.variant);
        let _ = writeln!(out, "  Cycles:           {}", self.cycles);
        let _ = writeln!(out, "  Peak speed:       {:.2} m/s", self.peak_speed);
        let _ = writeln!(out, "  Lane keep flips:  {}", self.lane_keep_flips);
        let _ = writeln!(
            out,
            "  Lane keep at end: {}",
            if self.final_lane_keep { "on" } else { "off" }
        );
        let _ = writeln!(out, "  Steer error:      {} cycles", self.steer_error_cycles);
        let _ = writeln!(out, "  Steer warning:    {} cycles", self.steer_warning_cycles);
        let _ = writeln!(out, "  Stale inputs:     {} cycles", self.stale_cycles);
        out
    }
}

/// One compact text line per decoded cycle
pub fn format_state_line(cycle: usize, state: &VehicleState) -> String {
    let flag = |on: bool, c: char| if on { c } else { '-' };
    format!(
        "{:>6} v={:6.2} a={:+6.2} raw={:6.2} steer={:+7.1} gear={} gas={:.2} \
         [{}{}{}{}{}{}{}] btn={:?} lkas={}",
        cycle,
        state.v_ego,
        state.a_ego,
        state.v_ego_raw,
        state.steering_angle,
        state.gear_shifter,
        state.gas,
        flag(state.door_open, 'D'),
        flag(state.seatbelt_unlatched, 'S'),
        flag(state.brake_pressed, 'B'),
        flag(state.left_blinker, '<'),
        flag(state.right_blinker, '>'),
        flag(state.steer_error, 'E'),
        flag(state.steer_warning, 'W'),
        state.cruise_button(),
        if state.lane_keep_enabled { "on" } else { "off" },
    )
}
