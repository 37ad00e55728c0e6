pub mod log;

use std::fs;
use std::path::PathBuf;

use serde::Deserialize;

use crate::domain::network::{CoinMap, FeeOptions, NetworkList, NetworkListItem};

pub use self::log::{Level, LogConfig};

/// `[[networks]]` entry; fields left out inherit from the built-in chain with the same id
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NetworkSpec {
    pub chain_id: String,
    pub chain_name: Option<String>,
    pub address_prefix: Option<String>,
    pub rpc_url: Option<String>,
    pub rest_url: Option<String>,
    pub fee_token: Option<String>,
    pub staking_token: Option<String>,
    pub gas_price: Option<f64>,
    #[serde(default)]
    pub coin_map: Option<CoinMap>,
    #[serde(default)]
    pub fees: Option<FeeOptions>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WalletConfig {
    /// File holding a hex secp256k1 key
    pub key_file: Option<String>,
    /// Name shown instead of the address
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Chain id selected at startup
    pub network: Option<String>,

    #[serde(default)]
    pub networks: Vec<NetworkSpec>,

    #[serde(default)]
    pub wallet: WalletConfig,

    #[serde(default)]
    pub log: LogConfig,
}

impl NetworkSpec {
    /// Overlay this entry on `base`; a new chain needs prefix, endpoint and fee token
    pub fn resolve(&self, base: Option<&NetworkListItem>) -> Option<NetworkListItem> {
        let mut item = match base {
            Some(base) => base.clone(),
            None => {
                let fee_token = self.fee_token.clone()?;
                let rest_url = self.rest_url.clone()?;
                NetworkListItem {
                    chain_id: self.chain_id.clone(),
                    chain_name: self.chain_id.clone(),
                    address_prefix: self.address_prefix.clone()?,
                    rpc_url: self.rpc_url.clone().unwrap_or_else(|| rest_url.clone()),
                    rest_url: Some(rest_url),
                    staking_token: fee_token.clone(),
                    fee_token,
                    coin_map: CoinMap::new(),
                    gas_price: 0.025,
                    fees: FeeOptions::default(),
                }
            }
        };

        if let Some(name) = &self.chain_name {
            item.chain_name = name.clone();
        }
        if let Some(prefix) = &self.address_prefix {
            item.address_prefix = prefix.clone();
        }
        if let Some(rpc) = &self.rpc_url {
            item.rpc_url = rpc.clone();
        }
        if let Some(rest) = &self.rest_url {
            item.rest_url = Some(rest.clone());
        }
        if let Some(token) = &self.fee_token {
            item.fee_token = token.clone();
        }
        if let Some(token) = &self.staking_token {
            item.staking_token = token.clone();
        }
        if let Some(price) = self.gas_price {
            item.gas_price = price;
        }
        if let Some(coin_map) = &self.coin_map {
            item.coin_map = coin_map.clone();
        }
        if let Some(fees) = self.fees {
            item.fees = fees;
        }
        Some(item)
    }
}

impl Config {
    /// Built-in chains with `[[networks]]` applied
    pub fn network_list(&self) -> NetworkList {
        let mut list = NetworkList::default();
        let resolved: Vec<NetworkListItem> = self
            .networks
            .iter()
            .filter_map(|spec| spec.resolve(list.find(&spec.chain_id)))
            .collect();
        list.merge(resolved);
        list
    }

    pub fn key_file(&self) -> Option<PathBuf> {
        self.wallet
            .key_file
            .as_deref()
            .filter(|path| !path.trim().is_empty())
            .map(expand_home)
    }

    pub fn log_path(&self) -> Option<PathBuf> {
        match self.log.file.as_deref() {
            Some(path) if !path.trim().is_empty() => Some(expand_home(path)),
            _ => data_dir().map(|dir| dir.join("contract-spy.log")),
        }
    }
}

pub fn load() -> Config {
    let Some(path) = config_path() else {
        return Config::default();
    };
    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(_) => return Config::default(),
    };
    toml::from_str::<Config>(&content).unwrap_or_default()
}

pub fn config_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os("CONTRACT_SPY_CONFIG").map(PathBuf::from) {
        return Some(path);
    }
    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from) {
        return Some(xdg.join("contract-spy").join("config.toml"));
    }
    if let Some(home) = std::env::var_os("HOME").map(PathBuf::from) {
        return Some(home.join(".config").join("contract-spy").join("config.toml"));
    }

    directories::ProjectDirs::from("io", "contract-spy", "contract-spy")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

pub fn data_dir() -> Option<PathBuf> {
    if let Some(xdg) = std::env::var_os("XDG_DATA_HOME").map(PathBuf::from) {
        return Some(xdg.join("contract-spy"));
    }
    if let Some(home) = std::env::var_os("HOME").map(PathBuf::from) {
        return Some(home.join(".local").join("share").join("contract-spy"));
    }
    directories::ProjectDirs::from("io", "contract-spy", "contract-spy")
        .map(|dirs| dirs.data_dir().to_path_buf())
}

pub fn session_db_path() -> Option<PathBuf> {
    data_dir().map(|dir| dir.join("session.sqlite3"))
}

fn expand_home(path: &str) -> PathBuf {
    let path = path.trim();
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(rest);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config: Config = toml::from_str(
            r#"
            network = "juno-1"

            [[networks]]
            chain_id = "juno-1"
            rest_url = "http://localhost:1317"

            [[networks]]
            chain_id = "localwasm"
            address_prefix = "wasm"
            rest_url = "http://127.0.0.1:1317"
            fee_token = "ustake"

            [[networks]]
            chain_id = "incomplete"

            [wallet]
            key_file = "/tmp/dev.key"
            name = "dev"

            [log]
            level = "debug"
            "#,
        )
        .unwrap();

        assert_eq!(config.network.as_deref(), Some("juno-1"));
        let list = config.network_list();
        assert_eq!(list.len(), 6);
        assert_eq!(list.find("juno-1").unwrap().endpoint(), "http://localhost:1317");
        assert_eq!(list.find("juno-1").unwrap().fee_token, "ujuno");

        let local = list.find("localwasm").unwrap();
        assert_eq!(local.address_prefix, "wasm");
        assert_eq!(local.rpc_url, "http://127.0.0.1:1317");
        assert!(list.find("incomplete").is_none());

        assert_eq!(config.key_file(), Some(PathBuf::from("/tmp/dev.key")));
        assert_eq!(config.log.level, Level::Debug);
    }

    #[test]
    fn test_empty_config_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert!(config.network.is_none());
        assert_eq!(config.network_list().len(), 5);
        assert!(config.key_file().is_none());
    }
}
