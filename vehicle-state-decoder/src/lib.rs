//! Vehicle State Decoder Library
//!
//! Turns the named signal values resolved by a CAN bus decoder into a
//! normalized vehicle state snapshot, once per control cycle.
//!
//! # Architecture
//!
//! The decoder owns the decision logic between bus and control stack:
//! - Fuses wheel and transmission speeds into one speed estimate
//! - Classifies the EPS status code into graduated steering fault flags
//! - Tracks the lane-keep toggle across cycles via edge detection
//! - Extracts door, seatbelt, blinker, brake, gear and gas state
//!
//! Static per-variant declarations (signal catalog, calibration factor,
//! gear labels, wired capabilities, fingerprints) live in [`signals`].
//!
//! The library does NOT:
//! - Decode CAN frames (it consumes a [`ParsedSignals`] table)
//! - Enforce message freshness (it only declares the required rates)
//! - Send any actuation commands
//! - Persist anything across process restarts
//!
//! # Example Usage
//!
//! ```
//! use vehicle_state_decoder::{StateDecoder, VehicleVariant};
//! use chrono::Utc;
//!
//! let decoder = StateDecoder::new(VehicleVariant::BydTang);
//! let mut session = decoder.new_session();
//! let mut signals = decoder.parsed_signals();
//!
//! // One control cycle
//! signals.update_message(
//!     "WHEEL_SPEEDS",
//!     [
//!         ("WHEEL_SPEED_FL", 36.0),
//!         ("WHEEL_SPEED_FR", 36.0),
//!         ("WHEEL_SPEED_RL", 36.0),
//!         ("WHEEL_SPEED_RR", 36.0),
//!     ],
//!     Utc::now(),
//! );
//! let state = decoder.update(&mut session, &signals);
//! assert!(state.v_ego_raw > 10.0);
//! ```

// Public modules
pub mod config;
pub mod cruise;
pub mod decoder;
pub mod gear;
pub mod signals;
pub mod speed;
pub mod steering;
pub mod toggle;
pub mod types;

// Re-export main types for convenience
pub use config::{DecoderConfig, SpeedFilterConfig};
pub use cruise::{cruise_offset, CruiseButton};
pub use decoder::{DecoderSession, StateDecoder};
pub use gear::GearTable;
pub use signals::{
    identify_variant, FreshnessCheck, ParsedSignals, SignalCapabilities, SignalCatalog,
    SignalSpec, VariantParams, VehicleVariant,
};
pub use speed::{KalmanSpeedFilter, SpeedFilter};
pub use steering::SteerStatus;
pub use types::{GearShifter, Result, StateError, SteerFaults, Timestamp, VehicleState, WheelSpeeds};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_basics() {
        // Smoke test: every variant builds a decoder with a populated catalog
        for variant in VehicleVariant::ALL {
            let decoder = StateDecoder::new(variant);
            assert!(!decoder.catalog().signals().is_empty());
            assert!(!decoder.catalog().checks().is_empty());
        }
        assert!(!VERSION.is_empty());
    }
}
