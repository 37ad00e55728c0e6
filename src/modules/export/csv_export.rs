//! CSV Export
//!
//! Writes raw contract storage to CSV files.

use std::path::Path;

use crate::domain::contract::StateEntry;

/// Write key/value pairs to CSV file, hex and lossy text side by side
pub fn write_state(path: &Path, entries: &[StateEntry]) -> Result<usize, Box<dyn std::error::Error>> {
    let mut wtr = csv::Writer::from_path(path)?;

    // Write header
    wtr.write_record(["key_hex", "key_text", "value_hex", "value_text"])?;

    // Write data rows
    for entry in entries {
        wtr.write_record([
            entry.key_hex(),
            entry.key_text(),
            entry.value_hex(),
            entry.value_text(),
        ])?;
    }

    wtr.flush()?;
    Ok(entries.len())
}
