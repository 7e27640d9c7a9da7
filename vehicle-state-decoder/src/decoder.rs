//! Main state decoder API
//!
//! [`StateDecoder`] turns one cycle of parsed signals into a
//! [`VehicleState`]. Everything that must survive from one cycle to the next,
//! speed filter state included, lives in a [`DecoderSession`], which the
//! control loop owns and lends to each update. The decoder itself only holds
//! static per-variant data and is never mutated by an update.

use crate::config::DecoderConfig;
use crate::gear::GearTable;
use crate::signals::{ParsedSignals, SignalCapabilities, SignalCatalog, VariantParams, VehicleVariant};
use crate::speed::{blend_speed, calibrate_speed, KalmanSpeedFilter, SpeedFilter};
use crate::steering::SteerStatus;
use crate::toggle::LaneKeepToggle;
use crate::types::{Result, VehicleState, WheelSpeeds};
use std::path::Path;
use std::sync::Arc;

/// Per-connection state carried between cycles
///
/// Created once per vehicle connection and never shared between vehicles.
#[derive(Debug, Clone)]
pub struct DecoderSession<F: SpeedFilter = KalmanSpeedFilter> {
    prev_cruise_buttons: f64,
    prev_cruise_setting: f64,
    lane_keep: LaneKeepToggle,
    speed_filter: F,
    gear_table: Arc<GearTable>,
    cycles: u64,
}

impl<F: SpeedFilter> DecoderSession<F> {
    /// Start a session; lane keeping starts engaged
    pub fn new(speed_filter: F, gear_table: Arc<GearTable>) -> Self {
        Self {
            prev_cruise_buttons: 0.0,
            prev_cruise_setting: 0.0,
            lane_keep: LaneKeepToggle::default(),
            speed_filter,
            gear_table,
            cycles: 0,
        }
    }

    pub fn speed_filter(&self) -> &F {
        &self.speed_filter
    }

    /// Cruise button value seen on the previous cycle
    pub fn prev_cruise_buttons(&self) -> f64 {
        self.prev_cruise_buttons
    }

    /// Cruise setting value seen on the previous cycle
    pub fn prev_cruise_setting(&self) -> f64 {
        self.prev_cruise_setting
    }

    pub fn lane_keep_enabled(&self) -> bool {
        self.lane_keep.is_enabled()
    }

    pub fn gear_table(&self) -> &GearTable {
        &self.gear_table
    }

    /// Number of updates applied so far
    pub fn cycles(&self) -> u64 {
        self.cycles
    }
}

/// Per-vehicle state decoder
///
/// `speed_filter` is the initial filter every new session starts from; it is
/// cloned, never updated.
#[derive(Debug, Clone)]
pub struct StateDecoder<F: SpeedFilter + Clone = KalmanSpeedFilter> {
    variant: VehicleVariant,
    params: VariantParams,
    catalog: SignalCatalog,
    config: DecoderConfig,
    gear_table: Arc<GearTable>,
    speed_filter: F,
}

impl StateDecoder<KalmanSpeedFilter> {
    /// Create a decoder with default configuration
    ///
    /// # Example
    /// ```
    /// use vehicle_state_decoder::{StateDecoder, VehicleVariant};
    ///
    /// let decoder = StateDecoder::new(VehicleVariant::BydQin);
    /// let mut session = decoder.new_session();
    /// let signals = decoder.parsed_signals();
    ///
    /// let state = decoder.update(&mut session, &signals);
    /// assert_eq!(state.v_ego, 0.0);
    /// ```
    pub fn new(variant: VehicleVariant) -> Self {
        Self::with_config(variant, DecoderConfig::default())
    }

    /// Create a decoder using the reference Kalman speed filter
    pub fn with_config(variant: VehicleVariant, config: DecoderConfig) -> Self {
        let filter = KalmanSpeedFilter::new(config.speed_filter);
        Self::with_filter(variant, config, filter)
    }
}

impl<F: SpeedFilter + Clone> StateDecoder<F> {
    /// Create a decoder with a caller-supplied initial speed filter
    pub fn with_filter(variant: VehicleVariant, config: DecoderConfig, speed_filter: F) -> Self {
        let params = variant.params();
        log::debug!(
            "Creating state decoder for {} (speed factor {}, {} Hz)",
            variant,
            params.speed_factor,
            config.control_hz
        );
        if !config.filter_step_matches_rate() {
            log::warn!(
                "Speed filter step {} s does not match the {} Hz control rate; a_ego will be misscaled",
                config.speed_filter.dt,
                config.control_hz
            );
        }

        Self {
            variant,
            params,
            catalog: SignalCatalog::for_variant(variant),
            config,
            gear_table: Arc::new(GearTable::for_variant(variant)),
            speed_filter,
        }
    }

    /// Builder method: override the variant's wired signal groups
    pub fn with_capabilities(mut self, capabilities: SignalCapabilities) -> Self {
        self.params.capabilities = capabilities;
        self.catalog = SignalCatalog::with_capabilities(self.variant, capabilities);
        self
    }

    /// Builder method: replace the gear code table
    pub fn with_gear_table(mut self, gear_table: GearTable) -> Self {
        self.gear_table = Arc::new(gear_table);
        self
    }

    /// Replace the gear code table with the one in a DBC file
    ///
    /// Only affects sessions created afterwards.
    pub fn load_gear_table(&mut self, dbc_path: &Path) -> Result<()> {
        let table = crate::signals::dbc::load_gear_table(dbc_path)?;
        self.gear_table = Arc::new(table);
        Ok(())
    }

    pub fn variant(&self) -> VehicleVariant {
        self.variant
    }

    pub fn params(&self) -> &VariantParams {
        &self.params
    }

    pub fn catalog(&self) -> &SignalCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Start a new session for a vehicle connection, with a clean speed filter
    pub fn new_session(&self) -> DecoderSession<F> {
        log::debug!("Starting decoder session for {}", self.variant);
        DecoderSession::new(self.speed_filter.clone(), Arc::clone(&self.gear_table))
    }

    /// Signal table seeded with this decoder's catalog defaults
    pub fn parsed_signals(&self) -> ParsedSignals {
        ParsedSignals::from_catalog(&self.catalog)
    }

    /// Decode one control cycle
    ///
    /// Must be called exactly once per cycle, after the bus decoder has
    /// resolved that cycle's signals. Never fails and never blocks.
    pub fn update(&self, session: &mut DecoderSession<F>, cp: &ParsedSignals) -> VehicleState {
        let caps = self.params.capabilities;
        let speed_factor = self.params.speed_factor;

        // Speed fusion
        let wheel_speeds = WheelSpeeds {
            fl: calibrate_speed(cp.value("WHEEL_SPEEDS", "WHEEL_SPEED_FL"), speed_factor),
            fr: calibrate_speed(cp.value("WHEEL_SPEEDS", "WHEEL_SPEED_FR"), speed_factor),
            rl: calibrate_speed(cp.value("WHEEL_SPEEDS", "WHEEL_SPEED_RL"), speed_factor),
            rr: calibrate_speed(cp.value("WHEEL_SPEEDS", "WHEEL_SPEED_RR"), speed_factor),
        };
        let v_wheel = wheel_speeds.mean();
        let v_transmission = calibrate_speed(cp.value("ENGINE_DATA", "XMISSION_SPEED"), speed_factor);
        let v_ego_raw = blend_speed(v_wheel, v_transmission);
        let (v_ego, a_ego) = session.speed_filter.update(v_ego_raw);

        // Steering faults
        let steer_status = if caps.steer_status {
            let raw = cp.value("STEER_STATUS", "STEER_STATUS");
            let status = SteerStatus::from_raw(raw);
            if let SteerStatus::Unrecognized(_) = status {
                log::warn!("Unrecognized steer status {}, treating as fault", raw);
            }
            status
        } else {
            SteerStatus::Normal
        };
        let faults = steer_status.classify();

        // Lane-keep toggle: previous setting against the current sentinel
        let cruise_setting = cp.value("CRUISE", "SET_ME");
        if session.lane_keep.evaluate(session.prev_cruise_setting, cruise_setting) {
            log::debug!(
                "Lane keep toggled {} at cycle {}",
                if session.lane_keep.is_enabled() { "on" } else { "off" },
                session.cycles
            );
        }
        let cruise_buttons = if caps.cruise_buttons {
            cp.value("SCM_BUTTONS", "CRUISE_BUTTONS")
        } else {
            cruise_setting
        };
        session.prev_cruise_setting = cruise_setting;
        session.prev_cruise_buttons = cruise_buttons;
        session.cycles += 1;

        // Capability-gated inputs
        let steering_torque = caps
            .steer_torque
            .then(|| cp.value("STEER_STATUS", "STEER_TORQUE_SENSOR"));
        let steering_pressed = steering_torque.map(|t| t.abs() > self.params.steer_threshold);
        let steering_torque_eps = caps
            .steer_torque
            .then(|| cp.value("STEER_MOTOR_TORQUE", "MOTOR_TORQUE"));
        let user_brake = caps.user_brake.then(|| cp.value("VSA_STATUS", "USER_BRAKE"));

        let door_open = ["DOOR_OPEN_FL", "DOOR_OPEN_FR", "DOOR_OPEN_RL", "DOOR_OPEN_RR"]
            .iter()
            .any(|door| cp.value("DOORS_STATUS", door) != 0.0);

        let state = VehicleState {
            wheel_speeds,
            v_ego_raw,
            v_ego: v_ego.max(0.0),
            a_ego,
            steering_angle: cp.value("STEERING_SENSORS", "STEER_ANGLE"),
            steering_rate: cp.value("STEERING_SENSORS", "STEER_ANGLE_RATE"),
            steer_error: faults.error,
            steer_warning: faults.warning,
            steer_not_allowed: faults.not_allowed,
            door_open,
            seatbelt_unlatched: cp.value("DOORS_STATUS", "SEATBELT_DRIVER_LATCHED") == 0.0,
            left_blinker: cp.value("LIGHT2", "LEFT_BLINKER") != 0.0,
            right_blinker: cp.value("LIGHT2", "RIGHT_BLINKER") != 0.0,
            brake_pressed: cp.value("DOORS_STATUS", "BRAKE_PRESSED") != 0.0,
            gear_shifter: session.gear_table.decode(cp.value("GEARBOX", "GEAR_SHIFTER")),
            gas: cp.value("GAS_POSITION", "GAS_P1") / 256.0,
            cruise_buttons,
            lane_keep_enabled: session.lane_keep.is_enabled(),
            steering_torque,
            steering_pressed,
            steering_torque_eps,
            user_brake,
        };

        log::trace!(
            "cycle {}: v_raw={:.3} v={:.3} a={:.3} gear={}",
            session.cycles,
            state.v_ego_raw,
            state.v_ego,
            state.a_ego,
            state.gear_shifter
        );

        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GearShifter;

    fn setup() -> (StateDecoder, DecoderSession, ParsedSignals) {
        let decoder = StateDecoder::new(VehicleVariant::BydTang);
        let session = decoder.new_session();
        let signals = decoder.parsed_signals();
        (decoder, session, signals)
    }

    fn set_wheels(cp: &mut ParsedSignals, kph: f64) {
        for wheel in ["WHEEL_SPEED_FL", "WHEEL_SPEED_FR", "WHEEL_SPEED_RL", "WHEEL_SPEED_RR"] {
            cp.set("WHEEL_SPEEDS", wheel, kph);
        }
    }

    #[test]
    fn test_defaults_before_any_message() {
        let (decoder, mut session, cp) = setup();
        let state = decoder.update(&mut session, &cp);

        // Door and brake defaults are conservative
        assert!(state.door_open);
        assert!(state.brake_pressed);
        assert!(state.seatbelt_unlatched);
        assert_eq!(state.gear_shifter, GearShifter::Unknown);
        assert_eq!(state.v_ego_raw, 0.0);
        assert!(state.lane_keep_enabled);
        assert_eq!(state.steering_torque, None);
        assert_eq!(state.steering_pressed, None);
        assert_eq!(state.steering_torque_eps, None);
        assert_eq!(state.user_brake, None);
        assert_eq!(session.cycles(), 1);
    }

    #[test]
    fn test_nominal_steer_status_without_capability() {
        let (decoder, mut session, mut cp) = setup();
        // Ignored: the variant does not wire STEER_STATUS
        cp.set("STEER_STATUS", "STEER_STATUS", 5.0);
        let state = decoder.update(&mut session, &cp);

        assert!(!state.steer_error);
        assert!(!state.steer_warning);
        assert!(!state.steer_not_allowed);
    }

    #[test]
    fn test_steer_status_with_capability() {
        let caps = SignalCapabilities {
            door_brake_group: true,
            steer_status: true,
            ..SignalCapabilities::default()
        };
        let decoder = StateDecoder::new(VehicleVariant::BydTang).with_capabilities(caps);
        let mut session = decoder.new_session();
        let mut cp = decoder.parsed_signals();

        // Catalog default is a fault until the EPS reports
        let state = decoder.update(&mut session, &cp);
        assert!(state.steer_error);

        cp.set("STEER_STATUS", "STEER_STATUS", 3.0);
        let state = decoder.update(&mut session, &cp);
        assert_eq!(
            (state.steer_error, state.steer_not_allowed, state.steer_warning),
            (false, true, false)
        );

        cp.set("STEER_STATUS", "STEER_STATUS", 11.0);
        let state = decoder.update(&mut session, &cp);
        assert_eq!(
            (state.steer_error, state.steer_not_allowed, state.steer_warning),
            (true, true, true)
        );

        // Fractional codes never truncate into a tolerated category
        for raw in [0.7, 4.5] {
            cp.set("STEER_STATUS", "STEER_STATUS", raw);
            let state = decoder.update(&mut session, &cp);
            assert_eq!(
                (state.steer_error, state.steer_not_allowed, state.steer_warning),
                (true, true, true)
            );
        }
    }

    #[test]
    fn test_speed_blend_low_speed_uses_transmission() {
        let (decoder, mut session, mut cp) = setup();
        // ~0.57 m/s on the wheels, below the blend floor
        set_wheels(&mut cp, 2.0);
        cp.set("ENGINE_DATA", "XMISSION_SPEED", 1.8);

        let state = decoder.update(&mut session, &cp);
        let expected = 1.8 / 3.6 * 1.025;
        assert!((state.v_ego_raw - expected).abs() < 1e-9);
        assert!((state.wheel_speeds.fl - 2.0 / 3.6 * 1.025).abs() < 1e-9);
    }

    #[test]
    fn test_speed_blend_high_speed_uses_wheels() {
        let (decoder, mut session, mut cp) = setup();
        set_wheels(&mut cp, 72.0);
        cp.set("ENGINE_DATA", "XMISSION_SPEED", 70.0);

        let state = decoder.update(&mut session, &cp);
        let expected = 72.0 / 3.6 * 1.025;
        assert!((state.v_ego_raw - expected).abs() < 1e-9);
        assert!(state.v_ego >= 0.0);
    }

    #[test]
    fn test_boolean_extraction() {
        let (decoder, mut session, mut cp) = setup();
        for door in ["DOOR_OPEN_FL", "DOOR_OPEN_FR", "DOOR_OPEN_RL", "DOOR_OPEN_RR"] {
            cp.set("DOORS_STATUS", door, 0.0);
        }
        cp.set("DOORS_STATUS", "BRAKE_PRESSED", 0.0);
        cp.set("DOORS_STATUS", "SEATBELT_DRIVER_LATCHED", 1.0);
        cp.set("LIGHT2", "LEFT_BLINKER", 1.0);

        let state = decoder.update(&mut session, &cp);
        assert!(!state.door_open);
        assert!(!state.brake_pressed);
        assert!(!state.seatbelt_unlatched);
        assert!(state.left_blinker);
        assert!(!state.right_blinker);

        cp.set("DOORS_STATUS", "DOOR_OPEN_RL", 1.0);
        let state = decoder.update(&mut session, &cp);
        assert!(state.door_open);
    }

    #[test]
    fn test_gas_and_gear() {
        let (decoder, mut session, mut cp) = setup();
        cp.set("GAS_POSITION", "GAS_P1", 128.0);
        cp.set("GEARBOX", "GEAR_SHIFTER", 4.0);

        let state = decoder.update(&mut session, &cp);
        assert_eq!(state.gas, 0.5);
        assert_eq!(state.gear_shifter, GearShifter::Drive);
    }

    #[test]
    fn test_session_caches_previous_values() {
        let (decoder, mut session, mut cp) = setup();
        cp.set("CRUISE", "SET_ME", 1.0);
        let state = decoder.update(&mut session, &cp);

        assert_eq!(state.cruise_buttons, 1.0);
        assert_eq!(session.prev_cruise_setting(), 1.0);
        assert_eq!(session.prev_cruise_buttons(), 1.0);
        assert!(session.lane_keep_enabled());
    }

    #[test]
    fn test_toggle_flips_on_release() {
        let (decoder, mut session, mut cp) = setup();
        cp.set("CRUISE", "SET_ME", 1.0);
        decoder.update(&mut session, &cp);

        cp.set("CRUISE", "SET_ME", 0.0);
        let state = decoder.update(&mut session, &cp);
        assert!(!state.lane_keep_enabled);

        // Holding at zero does not flip again
        let state = decoder.update(&mut session, &cp);
        assert!(!state.lane_keep_enabled);
    }

    #[test]
    fn test_capability_gated_fields() {
        let caps = SignalCapabilities {
            door_brake_group: true,
            steer_torque: true,
            user_brake: true,
            cruise_buttons: true,
            ..SignalCapabilities::default()
        };
        let decoder = StateDecoder::new(VehicleVariant::BydQin).with_capabilities(caps);
        let mut session = decoder.new_session();
        let mut cp = decoder.parsed_signals();

        cp.set("STEER_STATUS", "STEER_TORQUE_SENSOR", -1500.0);
        cp.set("STEER_MOTOR_TORQUE", "MOTOR_TORQUE", 42.0);
        cp.set("VSA_STATUS", "USER_BRAKE", 12.5);
        cp.set("SCM_BUTTONS", "CRUISE_BUTTONS", 3.0);
        cp.set("CRUISE", "SET_ME", 1.0);

        let state = decoder.update(&mut session, &cp);
        assert_eq!(state.steering_torque, Some(-1500.0));
        assert_eq!(state.steering_pressed, Some(true));
        assert_eq!(state.steering_torque_eps, Some(42.0));
        assert_eq!(state.user_brake, Some(12.5));
        assert_eq!(state.cruise_buttons, 3.0);
        assert_eq!(session.prev_cruise_setting(), 1.0);
        assert_eq!(session.prev_cruise_buttons(), 3.0);
    }

    #[test]
    fn test_new_session_starts_with_clean_filter() {
        let (decoder, mut first, mut cp) = setup();
        set_wheels(&mut cp, 5.0);
        cp.set("ENGINE_DATA", "XMISSION_SPEED", 5.0);
        for _ in 0..300 {
            decoder.update(&mut first, &cp);
        }
        assert!(first.speed_filter().state().0 > 1.0);

        // A second connection at standstill sees none of the first one's history
        let mut second = decoder.new_session();
        assert_eq!(second.speed_filter().state(), (0.0, 0.0));
        let standstill = decoder.parsed_signals();
        let state = decoder.update(&mut second, &standstill);
        assert_eq!(state.v_ego_raw, 0.0);
        assert_eq!(state.v_ego, 0.0);
        assert_eq!(state.a_ego, 0.0);

        // And the first session keeps its own state
        assert!(first.speed_filter().state().0 > 1.0);
    }

    #[test]
    fn test_custom_gear_table_shared_with_session() {
        let decoder = StateDecoder::new(VehicleVariant::BydTang)
            .with_gear_table(GearTable::from_codes([(7, "R")]));
        let session = decoder.new_session();

        assert_eq!(session.gear_table().decode(7.0), GearShifter::Reverse);
        assert_eq!(session.gear_table().decode(1.0), GearShifter::Unknown);
    }
}
