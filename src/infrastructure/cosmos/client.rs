//! Chain client seams
//!
//! The stores only ever talk to these traits; the REST implementation lives in
//! `rest.rs` and tests provide in-memory ones.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::contract::{Contract, StateEntry};
use crate::domain::error::SpyResult;
use crate::domain::network::NetworkListItem;
use crate::infrastructure::cosmos::signer::OfflineSigner;
use crate::infrastructure::cosmos::types::{
    Account, CodeSummary, Coin, InstantiateResponse, TxOutcome,
};

/// Read-only access to chain state, no signer required
#[async_trait]
pub trait QueryClient: Send + Sync {
    /// Endpoint this client talks to
    fn endpoint(&self) -> &str;

    async fn chain_id(&self) -> SpyResult<String>;

    async fn get_contract(&self, address: &str) -> SpyResult<Contract>;

    async fn get_codes(&self) -> SpyResult<CodeSummary>;

    async fn get_contracts(&self, code_id: u64) -> SpyResult<Vec<String>>;

    async fn query_contract_smart(&self, address: &str, msg: &Value) -> SpyResult<Value>;

    async fn get_all_contract_state(&self, address: &str) -> SpyResult<Vec<StateEntry>>;

    /// `None` when the node reports no balance entry for `denom`
    async fn get_balance(&self, address: &str, denom: &str) -> SpyResult<Option<Coin>>;

    /// `None` when the account has never received funds
    async fn get_account(&self, address: &str) -> SpyResult<Option<Account>>;
}

/// Query client plus transaction signing and broadcast
#[async_trait]
pub trait SigningClient: Send + Sync {
    fn querier(&self) -> Arc<dyn QueryClient>;

    async fn execute(
        &self,
        sender: &str,
        contract: &str,
        msg: &Value,
        funds: &[Coin],
    ) -> SpyResult<TxOutcome>;

    async fn instantiate(
        &self,
        sender: &str,
        code_id: u64,
        msg: &Value,
        label: &str,
        admin: Option<&str>,
        funds: &[Coin],
    ) -> SpyResult<InstantiateResponse>;

    /// Dry-run an execute message and return the gas it would use
    async fn simulate_execute(&self, sender: &str, contract: &str, msg: &Value)
        -> SpyResult<u64>;
}

/// Creates clients for a network
#[async_trait]
pub trait ClientFactory: Send + Sync {
    async fn connect(&self, network: &NetworkListItem) -> SpyResult<Arc<dyn QueryClient>>;

    async fn connect_with_signer(
        &self,
        network: &NetworkListItem,
        signer: Arc<dyn OfflineSigner>,
    ) -> SpyResult<Arc<dyn SigningClient>>;
}

/// The one client a store holds at a time
#[derive(Clone)]
pub enum ClientHandle {
    Query(Arc<dyn QueryClient>),
    Signing(Arc<dyn SigningClient>),
}

impl ClientHandle {
    pub fn querier(&self) -> Arc<dyn QueryClient> {
        match self {
            ClientHandle::Query(client) => client.clone(),
            ClientHandle::Signing(client) => client.querier(),
        }
    }

    pub fn signing(&self) -> Option<Arc<dyn SigningClient>> {
        match self {
            ClientHandle::Signing(client) => Some(client.clone()),
            ClientHandle::Query(_) => None,
        }
    }

    pub fn is_signing(&self) -> bool {
        matches!(self, ClientHandle::Signing(_))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ClientHandle::Query(_) => "query",
            ClientHandle::Signing(_) => "signing",
        }
    }
}

impl fmt::Debug for ClientHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientHandle")
            .field("kind", &self.kind())
            .field("endpoint", &self.querier().endpoint())
            .finish()
    }
}
