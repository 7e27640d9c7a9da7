//! Signal catalog, vehicle registry and parsed signal table
//!
//! Static per-variant declarations plus the per-cycle table the bus
//! decoder fills in.

pub mod catalog;
pub mod dbc;
pub mod parsed;
pub mod variant;

// Re-export key types for convenience
pub use catalog::{FreshnessCheck, SignalCatalog, SignalSpec};
pub use parsed::ParsedSignals;
pub use variant::{identify_variant, SignalCapabilities, VariantParams, VehicleVariant};
