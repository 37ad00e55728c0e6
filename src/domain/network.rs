//! Chain descriptors the user can pick from

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Display information for a base denom
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappedCoin {
    pub denom: String,
    pub fractional_digits: u32,
}

pub type CoinMap = BTreeMap<String, MappedCoin>;

/// Gas limits per transaction kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeOptions {
    pub upload: u64,
    pub init: u64,
    pub exec: u64,
}

impl Default for FeeOptions {
    fn default() -> Self {
        Self {
            upload: 1_500_000,
            init: 500_000,
            exec: 200_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkListItem {
    pub chain_id: String,
    pub chain_name: String,
    pub address_prefix: String,
    pub rpc_url: String,
    /// LCD endpoint used for queries and broadcasts
    pub rest_url: Option<String>,
    pub fee_token: String,
    pub staking_token: String,
    pub coin_map: CoinMap,
    pub gas_price: f64,
    pub fees: FeeOptions,
}

impl NetworkListItem {
    /// Endpoint the chain client talks to
    pub fn endpoint(&self) -> &str {
        self.rest_url.as_deref().unwrap_or(&self.rpc_url)
    }

    pub fn label(&self) -> String {
        format!("{} ({})", self.chain_name, self.chain_id)
    }
}

fn coin_map(base: &str, display: &str) -> CoinMap {
    let mut map = CoinMap::new();
    map.insert(
        base.to_string(),
        MappedCoin {
            denom: display.to_string(),
            fractional_digits: 6,
        },
    );
    map
}

#[allow(clippy::too_many_arguments)]
fn network(
    chain_id: &str,
    chain_name: &str,
    address_prefix: &str,
    rpc_url: &str,
    rest_url: &str,
    token: &str,
    display: &str,
) -> NetworkListItem {
    NetworkListItem {
        chain_id: chain_id.to_string(),
        chain_name: chain_name.to_string(),
        address_prefix: address_prefix.to_string(),
        rpc_url: rpc_url.to_string(),
        rest_url: Some(rest_url.to_string()),
        fee_token: token.to_string(),
        staking_token: token.to_string(),
        coin_map: coin_map(token, display),
        gas_price: 0.025,
        fees: FeeOptions::default(),
    }
}

/// Built-in chains, in display order
pub fn builtin_networks() -> Vec<NetworkListItem> {
    vec![
        network(
            "stargaze-1",
            "Stargaze",
            "stars",
            "https://rpc.stargaze-apis.com/",
            "https://rest.stargaze-apis.com",
            "ustars",
            "STARS",
        ),
        network(
            "elgafar-1",
            "elgafar-1",
            "stars",
            "https://rpc.elgafar-1.stargaze-apis.com/",
            "https://rest.elgafar-1.stargaze-apis.com",
            "ustars",
            "STARS",
        ),
        network(
            "juno-1",
            "Juno",
            "juno",
            "https://rpc.juno-1.deuslabs.fi",
            "https://rest.cosmos.directory/juno",
            "ujuno",
            "JUNO",
        ),
        network(
            "uni-5",
            "Uni",
            "juno",
            "https://rpc.uni.juno.deuslabs.fi",
            "https://api.uni.juno.deuslabs.fi",
            "ujunox",
            "JUNOX",
        ),
        network(
            "osmosis",
            "Osmosis",
            "osmo",
            "https://rpc-test.osmosis.zone/",
            "https://lcd-test.osmosis.zone",
            "uosmo",
            "OSMO",
        ),
    ]
}

/// Index of the network the wallet starts on
pub const DEFAULT_WALLET_NETWORK: usize = 3;

/// Ordered network table with config overrides applied
#[derive(Debug, Clone)]
pub struct NetworkList {
    items: Vec<NetworkListItem>,
}

impl Default for NetworkList {
    fn default() -> Self {
        Self {
            items: builtin_networks(),
        }
    }
}

impl NetworkList {
    /// An empty table falls back to the built-in chains
    pub fn new(items: Vec<NetworkListItem>) -> Self {
        if items.is_empty() {
            return Self::default();
        }
        Self { items }
    }

    /// Replace entries with a matching chain id, append the rest
    pub fn merge(&mut self, overrides: impl IntoIterator<Item = NetworkListItem>) {
        for item in overrides {
            if let Some(existing) = self
                .items
                .iter_mut()
                .find(|candidate| candidate.chain_id.eq_ignore_ascii_case(&item.chain_id))
            {
                *existing = item;
            } else {
                self.items.push(item);
            }
        }
    }

    pub fn items(&self) -> &[NetworkListItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&NetworkListItem> {
        self.items.get(index)
    }

    pub fn find(&self, chain_id: &str) -> Option<&NetworkListItem> {
        self.items
            .iter()
            .find(|item| item.chain_id.eq_ignore_ascii_case(chain_id.trim()))
    }

    pub fn position(&self, chain_id: &str) -> Option<usize> {
        self.items
            .iter()
            .position(|item| item.chain_id.eq_ignore_ascii_case(chain_id.trim()))
    }

    /// Network the wallet store starts with
    pub fn default_wallet(&self) -> NetworkListItem {
        self.items
            .get(DEFAULT_WALLET_NETWORK)
            .or_else(|| self.items.first())
            .cloned()
            .unwrap_or_else(|| builtin_networks().swap_remove(DEFAULT_WALLET_NETWORK))
    }

    /// The read-only store starts on the same chain as the wallet
    pub fn default_public(&self) -> NetworkListItem {
        self.default_wallet()
    }
}

/// Render a base-denom amount in display units, e.g. `1500000` ujuno -> `1.5 JUNO`
pub fn format_amount(amount: &str, coin: &MappedCoin) -> String {
    let digits = coin.fractional_digits as usize;
    let amount = amount.trim_start_matches('0');
    let amount = if amount.is_empty() { "0" } else { amount };
    if digits == 0 {
        return format!("{} {}", amount, coin.denom);
    }
    let padded = format!("{:0>width$}", amount, width = digits + 1);
    let (whole, frac) = padded.split_at(padded.len() - digits);
    let frac = frac.trim_end_matches('0');
    if frac.is_empty() {
        format!("{} {}", whole, coin.denom)
    } else {
        format!("{}.{} {}", whole, frac, coin.denom)
    }
}

/// Fallback display for denoms missing from the coin map: strip the micro prefix
pub fn display_denom(denom: &str) -> String {
    match denom.strip_prefix('u') {
        Some(rest) if !rest.is_empty() => rest.to_uppercase(),
        _ => denom.to_string(),
    }
}
