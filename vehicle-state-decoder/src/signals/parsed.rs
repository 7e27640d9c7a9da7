//! Parsed signal table
//!
//! The bus decoder's per-cycle output: message name → signal name → value,
//! plus the time each message was last observed. Seeded from a catalog so
//! that never-seen messages report their declared defaults.

use crate::signals::catalog::{FreshnessCheck, SignalCatalog};
use crate::types::Timestamp;
use chrono::Duration;
use std::collections::HashMap;

/// Periods a message may miss before it counts as stale
const STALE_PERIODS: i64 = 10;

/// Microseconds per control cycle
fn cycle_us(control_hz: u32) -> i64 {
    1_000_000 / i64::from(control_hz)
}

#[derive(Debug, Clone, Default)]
struct MessageValues {
    signals: HashMap<String, f64>,
    last_update: Option<Timestamp>,
}

/// Named signal values for the current cycle
#[derive(Debug, Clone, Default)]
pub struct ParsedSignals {
    messages: HashMap<String, MessageValues>,
}

impl ParsedSignals {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a table holding every catalog signal at its default
    pub fn from_catalog(catalog: &SignalCatalog) -> Self {
        let mut parsed = Self::new();
        for spec in catalog.signals() {
            parsed
                .messages
                .entry(spec.message.to_string())
                .or_default()
                .signals
                .insert(spec.signal.to_string(), spec.default);
        }
        parsed
    }

    /// Record a fresh observation of a message
    pub fn update_message<I, S>(&mut self, message: &str, values: I, timestamp: Timestamp)
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let entry = self.messages.entry(message.to_string()).or_default();
        for (signal, value) in values {
            entry.signals.insert(signal.into(), value);
        }
        entry.last_update = Some(timestamp);
    }

    /// Set a single signal without touching the message timestamp
    pub fn set(&mut self, message: &str, signal: &str, value: f64) {
        self.messages
            .entry(message.to_string())
            .or_default()
            .signals
            .insert(signal.to_string(), value);
    }

    /// Look up a signal value
    pub fn get(&self, message: &str, signal: &str) -> Option<f64> {
        self.messages
            .get(message)
            .and_then(|m| m.signals.get(signal))
            .copied()
    }

    /// Signal value, or 0 when the signal is not in the table
    pub fn value(&self, message: &str, signal: &str) -> f64 {
        self.get(message, signal).unwrap_or_else(|| {
            log::trace!("Signal {}.{} not in table, reading 0", message, signal);
            0.0
        })
    }

    /// When a message was last observed
    pub fn last_update(&self, message: &str) -> Option<Timestamp> {
        self.messages.get(message).and_then(|m| m.last_update)
    }

    /// Messages never observed or silent for more than ten expected periods
    ///
    /// A message's period is its declared
    /// [`max_period_cycles`](FreshnessCheck::max_period_cycles) at the given
    /// control rate. Staleness policy is up to the caller; the state decoder
    /// does not consult this.
    pub fn stale_messages<'a>(
        &self,
        checks: &'a [FreshnessCheck],
        control_hz: u32,
        now: Timestamp,
    ) -> Vec<&'a str> {
        let control_hz = control_hz.max(1);
        checks
            .iter()
            .filter(|check| match self.last_update(check.message) {
                None => true,
                Some(seen) => match check.max_period_cycles(control_hz) {
                    u32::MAX => false,
                    cycles => {
                        let budget_us = cycle_us(control_hz) * i64::from(cycles) * STALE_PERIODS;
                        now - seen > Duration::microseconds(budget_us)
                    }
                },
            })
            .map(|check| check.message)
            .collect()
    }
}
