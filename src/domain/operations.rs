//! Contract call helpers bound to the current client
//!
//! Both flavours remember a "current" contract address in the session store so
//! the next start opens on the same contract.

use std::sync::Arc;

use serde_json::Value;
use tracing::warn;

use crate::domain::error::{SpyError, SpyResult};
use crate::domain::shape::{classify, probe_message, MessageShape};
use crate::infrastructure::cosmos::{
    ClientHandle, Coin, InstantiateResponse, QueryClient, SigningClient, TxOutcome,
};
use crate::store::session::{SessionStore, CONTRACT_ADDRESS_KEY};

fn load_contract_address(session: &SessionStore) -> String {
    match session.get(CONTRACT_ADDRESS_KEY) {
        Ok(value) => value.unwrap_or_default(),
        Err(err) => {
            warn!(error = %err, "failed to read contract address");
            String::new()
        }
    }
}

fn persist_contract_address(session: &SessionStore, address: &str) {
    let result = if address.is_empty() {
        session.remove(CONTRACT_ADDRESS_KEY)
    } else {
        session.set(CONTRACT_ADDRESS_KEY, address)
    };
    if let Err(err) = result {
        warn!(error = %err, "failed to persist contract address");
    }
}

// === Public ===

/// Handle returned by [`PublicOperation::instance`]; carries nothing yet
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublicInstance;

#[derive(Clone)]
pub struct PublicOperation {
    client: Arc<dyn QueryClient>,
}

impl PublicOperation {
    pub fn new(client: Arc<dyn QueryClient>) -> Self {
        Self { client }
    }

    pub fn instance(&self) -> PublicInstance {
        PublicInstance
    }

    pub fn get_client(&self) -> Arc<dyn QueryClient> {
        self.client.clone()
    }

    pub async fn query(&self, address: &str, msg: &Value) -> SpyResult<Value> {
        self.client.query_contract_smart(address, msg).await
    }
}

/// Query-only operations plus the remembered contract address
pub struct PublicOperations {
    session: SessionStore,
    operation: Option<PublicOperation>,
    contract_address: String,
}

impl PublicOperations {
    pub fn new(session: SessionStore) -> Self {
        let contract_address = load_contract_address(&session);
        Self {
            session,
            operation: None,
            contract_address,
        }
    }

    /// Rebind after the backing client changed
    pub fn bind(&mut self, client: Option<Arc<dyn QueryClient>>) {
        self.operation = client.map(PublicOperation::new);
    }

    pub fn is_bound(&self) -> bool {
        self.operation.is_some()
    }

    fn operation(&self) -> SpyResult<&PublicOperation> {
        self.operation.as_ref().ok_or(SpyError::NotConnected)
    }

    pub fn instance(&self) -> Option<PublicInstance> {
        self.operation.as_ref().map(PublicOperation::instance)
    }

    pub fn get_client(&self) -> SpyResult<Arc<dyn QueryClient>> {
        Ok(self.operation()?.get_client())
    }

    pub async fn query(&self, address: &str, msg: &Value) -> SpyResult<Value> {
        self.operation()?.query(address, msg).await
    }

    /// Send the sentinel query and read back the accepted query variants
    pub async fn probe_query(&self, address: &str) -> MessageShape {
        match self.operation() {
            Ok(operation) => classify(operation.query(address, &probe_message()).await),
            Err(err) => MessageShape::Unavailable(err.to_string()),
        }
    }

    pub fn update_contract_address(&mut self, address: &str) {
        self.contract_address = address.trim().to_string();
        persist_contract_address(&self.session, &self.contract_address);
    }

    pub fn get_contract_address(&self) -> Option<&str> {
        Some(self.contract_address.as_str()).filter(|address| !address.is_empty())
    }
}

// === Signed ===

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedInstance {
    pub contract_address: String,
}

#[derive(Clone)]
pub struct SignedOperation {
    client: Arc<dyn SigningClient>,
    sender: String,
}

impl SignedOperation {
    pub fn new(client: Arc<dyn SigningClient>, sender: impl Into<String>) -> Self {
        Self {
            client,
            sender: sender.into(),
        }
    }

    pub fn use_contract(&self, contract_address: &str) -> SignedInstance {
        SignedInstance {
            contract_address: contract_address.to_string(),
        }
    }

    pub async fn instantiate(
        &self,
        sender: &str,
        code_id: u64,
        msg: &Value,
        label: &str,
        admin: Option<&str>,
        funds: &[Coin],
    ) -> SpyResult<InstantiateResponse> {
        self.client
            .instantiate(sender, code_id, msg, label, admin, funds)
            .await
    }

    pub async fn query(&self, address: &str, msg: &Value) -> SpyResult<Value> {
        self.client.querier().query_contract_smart(address, msg).await
    }

    pub async fn execute(&self, sender: &str, contract: &str, msg: &Value) -> SpyResult<TxOutcome> {
        self.client.execute(sender, contract, msg, &[]).await
    }
}

/// Operations that need the wallet's signing client
pub struct SignedOperations {
    session: SessionStore,
    operation: Option<SignedOperation>,
    contract_address: String,
}

impl SignedOperations {
    pub fn new(session: SessionStore) -> Self {
        let contract_address = load_contract_address(&session);
        Self {
            session,
            operation: None,
            contract_address,
        }
    }

    /// Rebind to the wallet's current client; query clients leave it unbound
    pub fn bind(&mut self, client: Option<&ClientHandle>, sender: &str) {
        self.operation = client
            .and_then(ClientHandle::signing)
            .filter(|_| !sender.is_empty())
            .map(|client| SignedOperation::new(client, sender));
    }

    pub fn is_bound(&self) -> bool {
        self.operation.is_some()
    }

    fn operation(&self) -> SpyResult<&SignedOperation> {
        self.operation.as_ref().ok_or(SpyError::ContractNotInitialized)
    }

    pub fn sender(&self) -> Option<&str> {
        self.operation.as_ref().map(|operation| operation.sender.as_str())
    }

    pub async fn instantiate(
        &self,
        code_id: u64,
        msg: &Value,
        label: &str,
        admin: Option<&str>,
    ) -> SpyResult<InstantiateResponse> {
        let operation = self.operation()?;
        operation
            .instantiate(&operation.sender, code_id, msg, label, admin, &[])
            .await
    }

    pub async fn query(&self, address: &str, msg: &Value) -> SpyResult<Value> {
        self.operation()?.query(address, msg).await
    }

    pub async fn execute(&self, contract: &str, msg: &Value) -> SpyResult<TxOutcome> {
        let operation = self.operation()?;
        operation.execute(&operation.sender, contract, msg).await
    }

    /// Simulate the sentinel execute message; nothing is broadcast
    pub async fn probe_execute(&self, address: &str) -> MessageShape {
        match self.operation() {
            Ok(operation) => classify(
                operation
                    .client
                    .simulate_execute(&operation.sender, address, &probe_message())
                    .await,
            ),
            Err(_) => MessageShape::Unavailable(SpyError::NoSigner.to_string()),
        }
    }

    /// Instance for the remembered contract, falling back to `custom_address`
    pub fn use_contract(&self, custom_address: &str) -> Option<SignedInstance> {
        let address = if self.contract_address.is_empty() {
            custom_address
        } else {
            &self.contract_address
        };
        self.operation
            .as_ref()
            .map(|operation| operation.use_contract(address))
    }

    pub fn update_contract_address(&mut self, address: &str) {
        self.contract_address = address.trim().to_string();
        persist_contract_address(&self.session, &self.contract_address);
    }

    pub fn get_contract_address(&self) -> Option<&str> {
        Some(self.contract_address.as_str()).filter(|address| !address.is_empty())
    }
}
