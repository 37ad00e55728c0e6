//! Wallet connection state machine
//!
//! Holds at most one signer and one client. Changing the signer rebuilds the
//! client (query client without a signer, signing client with one), and a new
//! client with a signer present syncs the account: address, account number,
//! key name and balances.

use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::core::action::Notice;
use crate::domain::contract::short_address;
use crate::domain::error::{SpyError, SpyResult};
use crate::domain::network::NetworkListItem;
use crate::infrastructure::cosmos::{
    ClientFactory, ClientHandle, Coin, OfflineSigner, WalletProvider,
};
use crate::store::session::{SessionStore, WALLET_ADDRESS_KEY};

/// Why a connect was requested
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectMode {
    /// User asked to connect (or startup found a persisted wallet)
    Manual,
    /// The wallet switched keys
    WalletChange,
    /// The terminal regained focus; reconnect silently
    Focus,
}

/// Copy of the observable wallet state, cheap to hand to the UI
#[derive(Debug, Clone, PartialEq)]
pub struct WalletSnapshot {
    pub address: String,
    pub account_number: u64,
    pub balances: Vec<Coin>,
    pub network: NetworkListItem,
    pub name: String,
    pub initialized: bool,
    pub initializing: bool,
    pub has_signer: bool,
    pub client_kind: Option<&'static str>,
}

impl WalletSnapshot {
    /// Key name, else the shortened address
    pub fn display_name(&self) -> String {
        if self.name.trim().is_empty() {
            short_address(&self.address)
        } else {
            self.name.clone()
        }
    }
}

pub struct WalletStore {
    factory: Arc<dyn ClientFactory>,
    provider: Arc<dyn WalletProvider>,
    session: SessionStore,

    account_number: u64,
    address: String,
    balances: Vec<Coin>,
    client: Option<ClientHandle>,
    config: NetworkListItem,
    initialized: bool,
    initializing: bool,
    name: String,
    signer: Option<Arc<dyn OfflineSigner>>,

    /// Whether a wallet address was persisted when `startup` ran
    restored: bool,
    notices: Vec<Notice>,
}

impl WalletStore {
    pub fn new(
        config: NetworkListItem,
        factory: Arc<dyn ClientFactory>,
        provider: Arc<dyn WalletProvider>,
        session: SessionStore,
    ) -> Self {
        Self {
            factory,
            provider,
            session,
            account_number: 0,
            address: String::new(),
            balances: Vec::new(),
            client: None,
            config,
            initialized: false,
            initializing: true,
            name: String::new(),
            signer: None,
            restored: false,
            notices: Vec::new(),
        }
    }

    // === Accessors ===

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn account_number(&self) -> u64 {
        self.account_number
    }

    pub fn balances(&self) -> &[Coin] {
        &self.balances
    }

    pub fn config(&self) -> &NetworkListItem {
        &self.config
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn initialized(&self) -> bool {
        self.initialized
    }

    pub fn initializing(&self) -> bool {
        self.initializing
    }

    pub fn client(&self) -> Option<&ClientHandle> {
        self.client.as_ref()
    }

    pub fn get_client(&self) -> SpyResult<ClientHandle> {
        self.client.clone().ok_or(SpyError::NotConnected)
    }

    pub fn get_signer(&self) -> SpyResult<Arc<dyn OfflineSigner>> {
        self.signer.clone().ok_or(SpyError::NoSigner)
    }

    pub fn snapshot(&self) -> WalletSnapshot {
        WalletSnapshot {
            address: self.address.clone(),
            account_number: self.account_number,
            balances: self.balances.clone(),
            network: self.config.clone(),
            name: self.name.clone(),
            initialized: self.initialized,
            initializing: self.initializing,
            has_signer: self.signer.is_some(),
            client_kind: self.client.as_ref().map(ClientHandle::kind),
        }
    }

    /// Drain notices raised since the last call
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    // === Lifecycle ===

    /// Reset every wallet field; the selected network is kept
    pub fn clear(&mut self) {
        self.account_number = 0;
        self.address.clear();
        self.balances.clear();
        self.client = None;
        self.initialized = false;
        self.initializing = true;
        self.name.clear();
        self.signer = None;
    }

    /// Decide between auto-connect and read-only mode based on the persisted address
    pub async fn startup(&mut self) {
        let persisted = match self.session.get(WALLET_ADDRESS_KEY) {
            Ok(value) => value.filter(|address| !address.trim().is_empty()),
            Err(err) => {
                warn!(error = %err, "failed to read session");
                None
            }
        };
        self.restored = persisted.is_some();
        if let Some(address) = persisted {
            info!(%address, "restoring wallet session");
            self.connect(ConnectMode::Manual).await;
        } else {
            self.initializing = false;
            self.set_query_client().await;
        }
    }

    pub async fn connect(&mut self, mode: ConnectMode) {
        self.try_connect(mode).await;
    }

    /// Returns whether a signer was acquired and a client built for it
    async fn try_connect(&mut self, mode: ConnectMode) -> bool {
        if mode != ConnectMode::Focus {
            self.initializing = true;
        }
        match self.load_signer().await {
            Ok(signer) => {
                let rebuilt = self.init(Some(signer)).await;
                if mode != ConnectMode::Manual {
                    self.initializing = false;
                }
                rebuilt
            }
            Err(err) => {
                warn!(error = %err, ?mode, "wallet connect failed");
                self.notices.push(Notice::error(err.to_string()));
                self.initializing = false;
                false
            }
        }
    }

    pub async fn disconnect(&mut self) {
        if let Err(err) = self.session.clear() {
            warn!(error = %err, "failed to clear session");
        }
        self.clear();
        self.initializing = false;
        self.restored = false;
        // Signer is gone; fall back to a read-only client
        self.on_signer_changed().await;
        info!(chain_id = %self.config.chain_id, "wallet disconnected");
    }

    /// Focus regained: reconnect only if a session was restored at startup
    pub async fn focus(&mut self) {
        if self.restored {
            self.connect(ConnectMode::Focus).await;
        }
    }

    pub async fn keystore_changed(&mut self) {
        self.connect(ConnectMode::WalletChange).await;
    }

    /// Returns whether a client matching the signer was built
    pub async fn init(&mut self, signer: Option<Arc<dyn OfflineSigner>>) -> bool {
        self.signer = signer;
        self.on_signer_changed().await
    }

    pub async fn update_signer(&mut self, signer: Arc<dyn OfflineSigner>) -> bool {
        self.init(Some(signer)).await
    }

    pub async fn set_config(&mut self, config: NetworkListItem) {
        let switched = config.chain_id != self.config.chain_id
            || config.endpoint() != self.config.endpoint();
        self.config = config;
        if !self.try_connect(ConnectMode::Manual).await && switched {
            // Signer or client may still point at the previous chain
            self.clear();
            self.initializing = false;
            self.on_signer_changed().await;
        }
    }

    pub async fn set_query_client(&mut self) {
        match self.factory.connect(&self.config).await {
            Ok(client) => {
                self.client = Some(ClientHandle::Query(client));
            }
            Err(err) => {
                warn!(error = %err, endpoint = %self.config.endpoint(), "query client failed");
                self.notices.push(Notice::error(err.to_string()));
                self.initializing = false;
            }
        }
    }

    /// Rebuild the balance list, one entry per coin-map denom the chain reports
    pub async fn refresh_balance(&mut self, address: Option<&str>) -> SpyResult<()> {
        let Some(client) = &self.client else {
            return Ok(());
        };
        let address = address.unwrap_or(&self.address).to_string();
        if address.is_empty() {
            return Ok(());
        }
        let querier = client.querier();
        let lookups = self
            .config
            .coin_map
            .keys()
            .map(|denom| querier.get_balance(&address, denom));
        let mut balances = Vec::new();
        for result in join_all(lookups).await {
            if let Some(coin) = result? {
                balances.push(coin);
            }
        }
        self.balances = balances;
        Ok(())
    }

    // === Derived state ===

    async fn load_signer(&self) -> SpyResult<Arc<dyn OfflineSigner>> {
        self.provider.suggest_chain(&self.config).await?;
        self.provider.enable(&self.config.chain_id).await?;
        self.provider.signer(&self.config).await
    }

    /// Signer changed: recreate the client to match
    async fn on_signer_changed(&mut self) -> bool {
        let created = match &self.signer {
            None => self.factory.connect(&self.config).await.map(ClientHandle::Query),
            Some(signer) => self
                .factory
                .connect_with_signer(&self.config, signer.clone())
                .await
                .map(ClientHandle::Signing),
        };
        match created {
            Ok(client) => {
                debug!(kind = client.kind(), "client recreated");
                self.client = Some(client);
                self.on_client_changed().await;
                true
            }
            Err(err) => {
                warn!(error = %err, endpoint = %self.config.endpoint(), "client creation failed");
                self.initializing = false;
                false
            }
        }
    }

    /// Client changed: with a signer present, sync the account
    async fn on_client_changed(&mut self) {
        if self.signer.is_none() || self.client.is_none() {
            return;
        }
        if let Err(err) = self.sync_account().await {
            warn!(error = %err, "account sync failed");
            self.notices.push(Notice::error(err.to_string()));
            self.initializing = false;
        }
    }

    async fn sync_account(&mut self) -> SpyResult<()> {
        let signer = self.get_signer()?;
        let client = self.get_client()?;
        let address = signer
            .accounts()
            .into_iter()
            .next()
            .map(|account| account.address)
            .ok_or(SpyError::NoSigner)?;

        let account = client.querier().get_account(&address).await?;
        let name = self.provider.key_name(&self.config.chain_id).await?;
        self.refresh_balance(Some(&address)).await?;
        self.session.set(WALLET_ADDRESS_KEY, &address)?;

        self.account_number = account.map(|account| account.account_number).unwrap_or(0);
        self.address = address;
        self.initialized = true;
        self.initializing = false;
        self.name = name;
        info!(address = %self.address, chain_id = %self.config.chain_id, "wallet connected");
        Ok(())
    }
}
