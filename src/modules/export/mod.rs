//! Export Module
//!
//! Writes what the inspector currently shows for a contract to disk.
//!
//! - `export csv` writes the raw storage entries
//! - `export json` writes metadata, message shapes and storage together
//! - Files are saved under the data dir, in `exports/`

mod csv_export;
mod json_export;

pub use csv_export::write_state;
pub use json_export::{exportable_state, write_snapshot, ContractSnapshot, ExportableEntry};

use crate::app::App;
use crate::core::{Action, ExportFormat, NotifyLevel};
use chrono::Local;
use std::fs;
use std::path::PathBuf;

/// Get the export directory path, creating it if needed
fn get_export_dir() -> std::io::Result<PathBuf> {
    let export_dir = crate::config::data_dir()
        .map(|dir| dir.join("exports"))
        .unwrap_or_else(|| PathBuf::from(".contract-spy").join("exports"));
    fs::create_dir_all(&export_dir)?;
    Ok(export_dir)
}

/// Generate a timestamped filename
fn generate_filename(prefix: &str, extension: &str) -> String {
    let timestamp = Local::now().format("%Y-%m-%d-%H%M%S");
    format!("{}-{}.{}", prefix, timestamp, extension)
}

/// Export the loaded contract in the requested format
pub fn export_contract(app: &App, format: ExportFormat) -> Action {
    let Some(contract) = app.contract.as_ref() else {
        return Action::Notify(
            "No contract loaded; run `contract <address>` first".to_string(),
            NotifyLevel::Warn,
        );
    };

    let export_dir = match get_export_dir() {
        Ok(dir) => dir,
        Err(e) => {
            return Action::Notify(
                format!("Failed to create export directory: {}", e),
                NotifyLevel::Error,
            )
        }
    };

    let prefix = format!("{}-{}", app.network().chain_id, contract.label_slug());
    match format {
        ExportFormat::Csv => {
            if app.state_entries.is_empty() {
                return Action::Notify("No state entries to export".to_string(), NotifyLevel::Warn);
            }
            let filename = generate_filename(&prefix, "csv");
            let path = export_dir.join(&filename);
            match write_state(&path, &app.state_entries) {
                Ok(count) => Action::Notify(
                    format!("Exported {} entries to {}", count, path.display()),
                    NotifyLevel::Success,
                ),
                Err(e) => Action::Notify(format!("Export failed: {}", e), NotifyLevel::Error),
            }
        }
        ExportFormat::Json => {
            let filename = generate_filename(&prefix, "json");
            let path = export_dir.join(&filename);
            let snapshot = ContractSnapshot {
                chain_id: &app.network().chain_id,
                contract,
                query: app.query_shape.as_ref(),
                execute: app.execute_shape.as_ref(),
                state: exportable_state(&app.state_entries),
            };
            match write_snapshot(&path, &snapshot) {
                Ok(count) => Action::Notify(
                    format!("Exported contract and {} entries to {}", count, path.display()),
                    NotifyLevel::Success,
                ),
                Err(e) => Action::Notify(format!("Export failed: {}", e), NotifyLevel::Error),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_filename() {
        let name = generate_filename("uni-6-counter", "csv");
        assert!(name.starts_with("uni-6-counter-"));
        assert!(name.ends_with(".csv"));
    }
}
