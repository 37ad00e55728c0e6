//! JSON Export
//!
//! Writes a contract snapshot (metadata, message shapes, raw state) to JSON files.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde::Serialize;
use serde_json::Value;

use crate::domain::contract::{Contract, StateEntry};
use crate::domain::shape::MessageShape;

#[derive(Serialize)]
pub struct ContractSnapshot<'a> {
    pub chain_id: &'a str,
    pub contract: &'a Contract,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<&'a MessageShape>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execute: Option<&'a MessageShape>,
    pub state: Vec<ExportableEntry>,
}

/// Storage entry with every rendering the inspector shows
#[derive(Serialize)]
pub struct ExportableEntry {
    key_hex: String,
    key_text: String,
    value_hex: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    value_json: Option<Value>,
}

impl From<&StateEntry> for ExportableEntry {
    fn from(entry: &StateEntry) -> Self {
        Self {
            key_hex: entry.key_hex(),
            key_text: entry.key_text(),
            value_hex: entry.value_hex(),
            value_json: entry.value_json(),
        }
    }
}

pub fn exportable_state(entries: &[StateEntry]) -> Vec<ExportableEntry> {
    entries.iter().map(ExportableEntry::from).collect()
}

/// Write a contract snapshot to JSON file
pub fn write_snapshot(
    path: &Path,
    snapshot: &ContractSnapshot<'_>,
) -> Result<usize, Box<dyn std::error::Error>> {
    let json = serde_json::to_string_pretty(snapshot)?;

    let mut file = File::create(path)?;
    file.write_all(json.as_bytes())?;

    Ok(snapshot.state.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.json");
        let contract = Contract {
            address: "juno1contract".to_string(),
            code_id: 12,
            creator: "juno1creator".to_string(),
            admin: None,
            label: "counter".to_string(),
            ibc_port_id: None,
        };
        let query = MessageShape::Variants(vec!["get_count".to_string()]);
        let entries = vec![StateEntry::new(b"state".to_vec(), br#"{"count":3}"#.to_vec())];
        let snapshot = ContractSnapshot {
            chain_id: "uni-5",
            contract: &contract,
            query: Some(&query),
            execute: None,
            state: exportable_state(&entries),
        };

        assert_eq!(write_snapshot(&path, &snapshot).unwrap(), 1);

        let written: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["contract"]["code_id"], 12);
        assert_eq!(written["query"]["kind"], "variants");
        assert_eq!(written["query"]["detail"][0], "get_count");
        assert!(written.get("execute").is_none());
        assert_eq!(written["state"][0]["value_json"]["count"], 3);
    }
}
