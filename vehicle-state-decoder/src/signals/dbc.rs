//! DBC value tables
//!
//! Reads `VAL_` value descriptions from a Vector DBC file. Used to source a
//! variant's gear code labels from the same DBC the bus decoder runs on.

use crate::gear::GearTable;
use crate::types::{Result, StateError};
use std::collections::HashMap;
use std::path::Path;

/// Message and signal carrying the gear shifter code
pub const GEAR_MESSAGE: &str = "GEARBOX";
pub const GEAR_SIGNAL: &str = "GEAR_SHIFTER";

/// Parse a DBC file and return the value table of one signal
pub fn load_value_table(path: &Path, message: &str, signal: &str) -> Result<HashMap<i64, String>> {
    log::info!("Loading value table {}.{} from {:?}", message, signal, path);

    let dbc = read_dbc(path)?;

    let dbc_msg = dbc
        .messages()
        .iter()
        .find(|m| m.message_name() == message)
        .ok_or_else(|| value_table_not_found(message, signal))?;

    let message_id = can_dbc::MessageId(dbc_msg.message_id().0);
    let descriptions = dbc
        .value_descriptions_for_signal(message_id, signal)
        .ok_or_else(|| value_table_not_found(message, signal))?;

    let table: HashMap<i64, String> = descriptions
        .iter()
        .map(|desc| (*desc.a() as i64, desc.b().to_string()))
        .collect();

    log::info!("Loaded {} entries for {}.{}", table.len(), message, signal);
    Ok(table)
}

/// Load the gear code table from a DBC file
pub fn load_gear_table(path: &Path) -> Result<GearTable> {
    let table = load_value_table(path, GEAR_MESSAGE, GEAR_SIGNAL)?;
    Ok(GearTable::from_codes(table))
}

fn read_dbc(path: &Path) -> Result<can_dbc::DBC> {
    let bytes = std::fs::read(path)?;

    // DBCs are frequently Windows-1252; fall back to Latin-1 byte mapping
    let content = match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => {
            log::warn!("DBC file is not UTF-8, trying Latin-1 encoding");
            e.into_bytes().iter().map(|&b| b as char).collect()
        }
    };

    can_dbc::DBC::from_slice(content.as_bytes()).map_err(|e| {
        StateError::DbcParseError(format!("Failed to parse DBC file {:?}: {:?}", path, e))
    })
}

fn value_table_not_found(message: &str, signal: &str) -> StateError {
    StateError::ValueTableNotFound {
        message: message.to_string(),
        signal: signal.to_string(),
    }
}
