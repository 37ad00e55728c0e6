use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::debug;

use crate::domain::error::{SpyError, SpyResult};
use crate::domain::network::NetworkListItem;
use crate::infrastructure::cosmos::signer::{LocalSigner, OfflineSigner};

/// Environment variable holding a hex secp256k1 key
pub const KEY_ENV: &str = "CONTRACT_SPY_KEY";

/// Source of signers, the terminal stand-in for a browser wallet extension
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Register the chain with the wallet
    async fn suggest_chain(&self, network: &NetworkListItem) -> SpyResult<()>;

    /// Ask the wallet to unlock `chain_id`
    async fn enable(&self, chain_id: &str) -> SpyResult<()>;

    async fn signer(&self, network: &NetworkListItem) -> SpyResult<Arc<dyn OfflineSigner>>;

    /// Human name of the active key
    async fn key_name(&self, chain_id: &str) -> SpyResult<String>;
}

/// Wallet backed by a local key file or the `CONTRACT_SPY_KEY` variable
///
/// The key is read again on every `signer` call, so replacing the key file and
/// sending a keystore-change event picks up the new account.
#[derive(Debug, Default)]
pub struct KeyringWallet {
    key_file: Option<PathBuf>,
    name: Option<String>,
    known_chains: Mutex<BTreeSet<String>>,
    enabled_chains: Mutex<BTreeSet<String>>,
}

impl KeyringWallet {
    pub fn new(key_file: Option<PathBuf>, name: Option<String>) -> Self {
        Self {
            key_file,
            name,
            ..Self::default()
        }
    }

    fn load_key(&self) -> SpyResult<String> {
        if let Ok(key) = std::env::var(KEY_ENV) {
            if !key.trim().is_empty() {
                return Ok(key);
            }
        }
        let Some(path) = &self.key_file else {
            return Err(SpyError::WalletUnavailable(format!(
                "set {} or configure [wallet] key_file",
                KEY_ENV
            )));
        };
        let content = fs::read_to_string(path).map_err(|err| {
            SpyError::WalletUnavailable(format!("read {}: {}", path.display(), err))
        })?;
        let key = content.trim();
        if key.is_empty() {
            return Err(SpyError::WalletUnavailable(format!(
                "{} is empty",
                path.display()
            )));
        }
        Ok(key.to_string())
    }
}

fn lock(set: &Mutex<BTreeSet<String>>) -> std::sync::MutexGuard<'_, BTreeSet<String>> {
    set.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl WalletProvider for KeyringWallet {
    async fn suggest_chain(&self, network: &NetworkListItem) -> SpyResult<()> {
        debug!(chain_id = %network.chain_id, "chain suggested to keyring");
        lock(&self.known_chains).insert(network.chain_id.clone());
        Ok(())
    }

    async fn enable(&self, chain_id: &str) -> SpyResult<()> {
        if !lock(&self.known_chains).contains(chain_id) {
            return Err(SpyError::UnknownNetwork(chain_id.to_string()));
        }
        // Fail early if there is no key at all
        self.load_key()?;
        lock(&self.enabled_chains).insert(chain_id.to_string());
        Ok(())
    }

    async fn signer(&self, network: &NetworkListItem) -> SpyResult<Arc<dyn OfflineSigner>> {
        if !lock(&self.enabled_chains).contains(&network.chain_id) {
            return Err(SpyError::WalletUnavailable(format!(
                "{} is not enabled",
                network.chain_id
            )));
        }
        let key = self.load_key()?;
        let signer = LocalSigner::from_hex(&key, &network.address_prefix)?;
        Ok(Arc::new(signer))
    }

    async fn key_name(&self, _chain_id: &str) -> SpyResult<String> {
        if let Some(name) = self.name.as_ref().filter(|name| !name.trim().is_empty()) {
            return Ok(name.clone());
        }
        Ok(self
            .key_file
            .as_ref()
            .and_then(|path| path.file_stem())
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::network::NetworkList;

    const KEY: &str = "0202020202020202020202020202020202020202020202020202020202020202";

    fn uni() -> NetworkListItem {
        NetworkList::default().default_wallet()
    }

    #[tokio::test]
    async fn test_signer_requires_enable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alice.key");
        fs::write(&path, KEY).unwrap();
        let wallet = KeyringWallet::new(Some(path), None);
        let network = uni();

        assert!(wallet.signer(&network).await.is_err());
        assert!(matches!(
            wallet.enable(&network.chain_id).await,
            Err(SpyError::UnknownNetwork(_))
        ));

        wallet.suggest_chain(&network).await.unwrap();
        wallet.enable(&network.chain_id).await.unwrap();
        let signer = wallet.signer(&network).await.unwrap();
        assert!(signer.accounts()[0].address.starts_with("juno1"));
        assert_eq!(wallet.key_name(&network.chain_id).await.unwrap(), "alice");
    }

    #[tokio::test]
    async fn test_missing_key_file_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let wallet = KeyringWallet::new(Some(dir.path().join("missing.key")), Some("bob".into()));
        let network = uni();
        wallet.suggest_chain(&network).await.unwrap();

        // Only meaningful when the environment does not provide a key
        if std::env::var(KEY_ENV).is_err() {
            let err = wallet.enable(&network.chain_id).await.unwrap_err();
            assert!(err.to_string().starts_with("Wallet key is not available"));
        }
        assert_eq!(wallet.key_name(&network.chain_id).await.unwrap(), "bob");
    }
}
