//! Wire types for the Cosmos SDK / CosmWasm REST (LCD) routes

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::contract::Contract;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    pub denom: String,
    pub amount: String,
}

impl Coin {
    pub fn new(amount: impl Into<String>, denom: impl Into<String>) -> Self {
        Self {
            amount: amount.into(),
            denom: denom.into(),
        }
    }
}

/// On-chain account numbers needed to sign
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Account {
    pub account_number: u64,
    pub sequence: u64,
}

/// Result of a broadcast transaction once it is included in a block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxOutcome {
    pub transaction_hash: String,
    pub height: u64,
    pub gas_used: u64,
    pub events: Vec<TxEvent>,
}

impl TxOutcome {
    /// First value of `attr` on an event of type `kind`
    pub fn attribute(&self, kind: &str, attr: &str) -> Option<&str> {
        self.events
            .iter()
            .filter(|event| event.kind == kind)
            .flat_map(|event| event.attributes.iter())
            .find(|attribute| attribute.key == attr)
            .map(|attribute| attribute.value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TxEvent {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub attributes: Vec<TxAttribute>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TxAttribute {
    pub key: String,
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstantiateResponse {
    pub contract_address: String,
    pub transaction_hash: String,
}

/// Latest code id and total count, as far as the node reports them
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CodeSummary {
    pub latest_code_id: Option<u64>,
    pub total: Option<u64>,
}

// === Responses ===

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorResponse {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct PageResponse {
    #[serde(default)]
    pub next_key: Option<String>,
    #[serde(default)]
    pub total: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NodeInfoResponse {
    pub default_node_info: DefaultNodeInfo,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DefaultNodeInfo {
    pub network: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ContractInfoResponse {
    pub address: String,
    pub contract_info: ContractInfoJson,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ContractInfoJson {
    pub code_id: String,
    #[serde(default)]
    pub creator: String,
    #[serde(default)]
    pub admin: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub ibc_port_id: String,
}

impl ContractInfoResponse {
    pub fn into_contract(self) -> Result<Contract, std::num::ParseIntError> {
        let info = self.contract_info;
        Ok(Contract {
            address: self.address,
            code_id: info.code_id.parse()?,
            creator: info.creator,
            admin: non_empty(info.admin),
            label: info.label,
            ibc_port_id: non_empty(info.ibc_port_id),
        })
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct CodesResponse {
    #[serde(default)]
    pub code_infos: Vec<CodeInfoJson>,
    #[serde(default)]
    pub pagination: Option<PageResponse>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CodeInfoJson {
    pub code_id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ContractsByCodeResponse {
    #[serde(default)]
    pub contracts: Vec<String>,
    #[serde(default)]
    pub pagination: Option<PageResponse>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SmartQueryResponse {
    pub data: Value,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AllStateResponse {
    #[serde(default)]
    pub models: Vec<ModelJson>,
    #[serde(default)]
    pub pagination: Option<PageResponse>,
}

/// Raw storage model: hex key, base64 value
#[derive(Debug, Deserialize)]
pub(crate) struct ModelJson {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BalanceResponse {
    #[serde(default)]
    pub balance: Option<Coin>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AccountResponse {
    pub account: Value,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SimulateResponse {
    pub gas_info: GasInfo,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GasInfo {
    #[serde(default)]
    pub gas_used: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BroadcastResponse {
    pub tx_response: TxResponseJson,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GetTxResponse {
    pub tx_response: TxResponseJson,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TxResponseJson {
    pub txhash: String,
    #[serde(default)]
    pub code: u32,
    #[serde(default)]
    pub raw_log: String,
    #[serde(default)]
    pub height: String,
    #[serde(default)]
    pub gas_used: String,
    #[serde(default)]
    pub events: Vec<TxEvent>,
}

impl TxResponseJson {
    pub fn into_outcome(self) -> TxOutcome {
        TxOutcome {
            transaction_hash: self.txhash,
            height: self.height.parse().unwrap_or(0),
            gas_used: self.gas_used.parse().unwrap_or(0),
            events: self.events,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct TxRequest<'a> {
    pub tx_bytes: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<&'a str>,
}

/// Pull account number and sequence out of any account type the auth module returns
///
/// Base accounts carry the fields at the top level; vesting and module accounts
/// nest them under `base_account` (possibly inside `base_vesting_account`).
pub(crate) fn account_fields(account: &Value) -> Option<Account> {
    fn number(value: &Value) -> Option<u64> {
        match value {
            Value::String(s) => s.parse().ok(),
            Value::Number(n) => n.as_u64(),
            _ => None,
        }
    }

    if let Some(account_number) = account.get("account_number").and_then(number) {
        let sequence = account.get("sequence").and_then(number).unwrap_or(0);
        return Some(Account {
            account_number,
            sequence,
        });
    }
    for nested in ["base_account", "base_vesting_account"] {
        if let Some(found) = account.get(nested).and_then(account_fields) {
            return Some(found);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_account_fields_base_account() {
        let account = json!({
            "@type": "/cosmos.auth.v1beta1.BaseAccount",
            "address": "juno1abc",
            "account_number": "1234",
            "sequence": "7"
        });
        assert_eq!(
            account_fields(&account),
            Some(Account {
                account_number: 1234,
                sequence: 7
            })
        );
    }

    #[test]
    fn test_account_fields_vesting_account() {
        let account = json!({
            "@type": "/cosmos.vesting.v1beta1.ContinuousVestingAccount",
            "base_vesting_account": {
                "base_account": { "account_number": "99", "sequence": "0" }
            }
        });
        assert_eq!(
            account_fields(&account).map(|a| a.account_number),
            Some(99)
        );
        assert_eq!(account_fields(&json!({ "address": "x" })), None);
    }

    #[test]
    fn test_contract_info_conversion() {
        let response: ContractInfoResponse = serde_json::from_value(json!({
            "address": "juno1contract",
            "contract_info": {
                "code_id": "42",
                "creator": "juno1creator",
                "admin": "",
                "label": "counter",
                "created": null,
                "ibc_port_id": "",
                "extension": null
            }
        }))
        .unwrap();
        let contract = response.into_contract().unwrap();
        assert_eq!(contract.code_id, 42);
        assert_eq!(contract.admin, None);
        assert_eq!(contract.ibc_port_id, None);
        assert_eq!(contract.label, "counter");
    }

    #[test]
    fn test_tx_outcome_attribute() {
        let response: TxResponseJson = serde_json::from_value(json!({
            "txhash": "ABCD",
            "code": 0,
            "height": "100",
            "gas_used": "12345",
            "events": [
                { "type": "message", "attributes": [{ "key": "action", "value": "instantiate" }] },
                { "type": "instantiate", "attributes": [
                    { "key": "_contract_address", "value": "juno1new" },
                    { "key": "code_id", "value": "5" }
                ]}
            ]
        }))
        .unwrap();
        let outcome = response.into_outcome();
        assert_eq!(outcome.height, 100);
        assert_eq!(outcome.attribute("instantiate", "_contract_address"), Some("juno1new"));
        assert_eq!(outcome.attribute("wasm", "_contract_address"), None);
    }
}
