//! Read-only client store, usable without any wallet

use std::sync::Arc;

use tracing::{info, warn};

use crate::core::action::Notice;
use crate::domain::error::{SpyError, SpyResult};
use crate::domain::network::NetworkListItem;
use crate::domain::wallet::ConnectMode;
use crate::infrastructure::cosmos::{ClientFactory, QueryClient};
use crate::store::session::SessionStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicSnapshot {
    pub chain_id: String,
    pub name: String,
    pub network: String,
    pub initialized: bool,
    pub initializing: bool,
    pub connected: bool,
}

pub struct PublicStore {
    factory: Arc<dyn ClientFactory>,
    session: SessionStore,

    client: Option<Arc<dyn QueryClient>>,
    config: NetworkListItem,
    initialized: bool,
    initializing: bool,
    name: String,
    /// Endpoint the query client connects to
    network: String,

    notices: Vec<Notice>,
}

impl PublicStore {
    pub fn new(config: NetworkListItem, factory: Arc<dyn ClientFactory>, session: SessionStore) -> Self {
        let network = config.endpoint().to_string();
        Self {
            factory,
            session,
            client: None,
            config,
            initialized: false,
            initializing: true,
            name: String::new(),
            network,
            notices: Vec::new(),
        }
    }

    pub fn config(&self) -> &NetworkListItem {
        &self.config
    }

    pub fn network(&self) -> &str {
        &self.network
    }

    pub fn initialized(&self) -> bool {
        self.initialized
    }

    pub fn initializing(&self) -> bool {
        self.initializing
    }

    pub fn client(&self) -> Option<Arc<dyn QueryClient>> {
        self.client.clone()
    }

    pub fn get_client(&self) -> SpyResult<Arc<dyn QueryClient>> {
        self.client.clone().ok_or(SpyError::NotConnected)
    }

    pub fn snapshot(&self) -> PublicSnapshot {
        PublicSnapshot {
            chain_id: self.config.chain_id.clone(),
            name: self.name.clone(),
            network: self.network.clone(),
            initialized: self.initialized,
            initializing: self.initializing,
            connected: self.client.is_some(),
        }
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Drop the client and flags; network selection is kept
    pub fn clear(&mut self) {
        self.client = None;
        self.initialized = false;
        self.initializing = true;
        self.name.clear();
    }

    pub async fn connect(&mut self, mode: ConnectMode) {
        if mode != ConnectMode::Focus {
            self.initializing = true;
        }
        let mut target = self.config.clone();
        target.rest_url = Some(self.network.clone());
        match self.factory.connect(&target).await {
            Ok(client) => {
                self.init(Some(client));
                self.initialized = true;
                self.initializing = false;
                self.name = self.config.chain_name.clone();
                info!(endpoint = %self.network, "public client connected");
            }
            Err(err) => {
                warn!(error = %err, endpoint = %self.network, "public client failed");
                self.notices.push(Notice::error(err.to_string()));
                self.init(None);
                self.initialized = false;
                self.initializing = false;
            }
        }
    }

    pub fn disconnect(&mut self) {
        if let Err(err) = self.session.clear() {
            warn!(error = %err, "failed to clear session");
        }
        self.clear();
        self.initializing = false;
    }

    pub fn init(&mut self, client: Option<Arc<dyn QueryClient>>) {
        self.client = client;
    }

    pub fn set_network(&mut self, network: impl Into<String>) {
        self.network = network.into();
    }

    /// Follow a network switch: new descriptor and its endpoint
    pub fn set_config(&mut self, config: NetworkListItem) {
        self.network = config.endpoint().to_string();
        self.config = config;
    }
}
