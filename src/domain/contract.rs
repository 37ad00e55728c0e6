//! Read-only contract data fetched from the chain

use std::str::FromStr;

use cosmrs::AccountId;
use serde::Serialize;

use crate::domain::error::{SpyError, SpyResult};

/// Contract metadata as reported by the wasm module
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Contract {
    pub address: String,
    pub code_id: u64,
    pub creator: String,
    pub admin: Option<String>,
    pub label: String,
    pub ibc_port_id: Option<String>,
}

impl Contract {
    /// Label reduced to a file-name friendly token, falling back to the code id
    pub fn label_slug(&self) -> String {
        let slug: String = self
            .label
            .trim()
            .chars()
            .map(|ch| if ch.is_ascii_alphanumeric() { ch.to_ascii_lowercase() } else { '-' })
            .collect();
        let slug = slug.trim_matches('-').to_string();
        if slug.is_empty() {
            format!("code-{}", self.code_id)
        } else {
            slug
        }
    }
}

/// One raw key/value pair of contract storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateEntry {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
}

impl StateEntry {
    pub fn new(key: Vec<u8>, value: Vec<u8>) -> Self {
        Self { key, value }
    }

    /// Key rendered as text; cw-storage keys carry a two byte length prefix per namespace
    pub fn key_text(&self) -> String {
        printable(&self.key)
    }

    pub fn value_text(&self) -> String {
        printable(&self.value)
    }

    pub fn key_hex(&self) -> String {
        hex::encode(&self.key)
    }

    pub fn value_hex(&self) -> String {
        hex::encode(&self.value)
    }

    /// Value parsed as JSON when the contract stores serde-json (the common case)
    pub fn value_json(&self) -> Option<serde_json::Value> {
        serde_json::from_slice(&self.value).ok()
    }
}

/// Replace control bytes so raw storage can be shown in a terminal cell
fn printable(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .chars()
        .map(|ch| if ch.is_control() { '.' } else { ch })
        .collect()
}

/// Contracts instantiated from one code id, in chain order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeListing {
    pub code_id: u64,
    pub contracts: Vec<String>,
}

impl CodeListing {
    pub fn new(code_id: u64, contracts: Vec<String>) -> Self {
        Self {
            code_id,
            contracts,
        }
    }

    /// One-based numbering as shown in the list panel
    pub fn numbered(&self) -> impl Iterator<Item = (usize, &str)> {
        self.contracts
            .iter()
            .enumerate()
            .map(|(idx, address)| (idx + 1, address.as_str()))
    }
}

/// Check a bech32 account address, optionally against an expected prefix
pub fn validate_address(address: &str, expected_prefix: Option<&str>) -> SpyResult<AccountId> {
    let trimmed = address.trim();
    let account = AccountId::from_str(trimmed).map_err(|err| SpyError::InvalidAddress {
        address: trimmed.to_string(),
        reason: err.to_string(),
    })?;
    if let Some(prefix) = expected_prefix {
        if account.prefix() != prefix {
            return Err(SpyError::InvalidAddress {
                address: trimmed.to_string(),
                reason: format!("expected prefix {prefix}, found {}", account.prefix()),
            });
        }
    }
    Ok(account)
}

pub fn short_address(value: &str) -> String {
    let value = value.trim();
    if value.chars().count() <= 16 {
        return value.to_string();
    }
    let start: String = value.chars().take(10).collect();
    let end: String = value
        .chars()
        .rev()
        .take(6)
        .collect::<String>()
        .chars()
        .rev()
        .collect();
    format!("{}…{}", start, end)
}
