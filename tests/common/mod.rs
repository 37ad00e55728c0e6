//! In-memory chain, wallet and client factory shared by the integration tests

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use cosmrs::AccountId;
use serde_json::{json, Value};

use contract_spy::domain::contract::{Contract, StateEntry};
use contract_spy::domain::error::{SpyError, SpyResult};
use contract_spy::domain::network::{NetworkList, NetworkListItem};
use contract_spy::domain::shape::PROBE_VARIANT;
use contract_spy::infrastructure::cosmos::{
    Account, ClientFactory, CodeSummary, Coin, InstantiateResponse, LocalSigner, OfflineSigner,
    QueryClient, SigningClient, TxOutcome, WalletProvider,
};

pub const TEST_KEY: &str = "0101010101010101010101010101010101010101010101010101010101010101";

pub fn uni() -> NetworkListItem {
    NetworkList::default().default_wallet()
}

pub fn juno() -> NetworkListItem {
    NetworkList::default()
        .find("juno-1")
        .cloned()
        .expect("juno-1 is built in")
}

/// Valid bech32 contract address for `prefix`
pub fn contract_address(prefix: &str, seed: u8) -> String {
    AccountId::new(prefix, &[seed; 32])
        .expect("valid account id")
        .to_string()
}

pub fn signer_address(prefix: &str) -> String {
    LocalSigner::from_hex(TEST_KEY, prefix)
        .expect("valid test key")
        .address()
        .to_string()
}

/// Shared chain state and call counters
#[derive(Default)]
pub struct MockChain {
    pub contracts: Mutex<BTreeMap<String, Contract>>,
    pub state: Mutex<BTreeMap<String, Vec<StateEntry>>>,
    pub codes: Mutex<BTreeMap<u64, Vec<String>>>,
    pub executed: Mutex<Vec<Value>>,
    pub balance_calls: AtomicUsize,
}

impl MockChain {
    /// One counter contract instantiated from code 1
    pub fn with_counter(prefix: &str) -> Arc<Self> {
        let chain = Self::default();
        let address = contract_address(prefix, 7);
        chain.contracts.lock().unwrap().insert(
            address.clone(),
            Contract {
                address: address.clone(),
                code_id: 1,
                creator: signer_address(prefix),
                admin: None,
                label: "counter".to_string(),
                ibc_port_id: None,
            },
        );
        chain.state.lock().unwrap().insert(
            address.clone(),
            vec![StateEntry::new(
                b"state".to_vec(),
                br#"{"count":7,"owner":"me"}"#.to_vec(),
            )],
        );
        chain
            .codes
            .lock()
            .unwrap()
            .insert(1, vec![address, contract_address(prefix, 8)]);
        Arc::new(chain)
    }
}

pub struct MockQueryClient {
    pub endpoint: String,
    pub chain_id: String,
    pub chain: Arc<MockChain>,
}

#[async_trait]
impl QueryClient for MockQueryClient {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn chain_id(&self) -> SpyResult<String> {
        Ok(self.chain_id.clone())
    }

    async fn get_contract(&self, address: &str) -> SpyResult<Contract> {
        self.chain
            .contracts
            .lock()
            .unwrap()
            .get(address)
            .cloned()
            .ok_or_else(|| SpyError::chain(404, format!("contract {address}: not found")))
    }

    async fn get_codes(&self) -> SpyResult<CodeSummary> {
        let codes = self.chain.codes.lock().unwrap();
        Ok(CodeSummary {
            latest_code_id: codes.keys().next_back().copied(),
            total: Some(codes.len() as u64),
        })
    }

    async fn get_contracts(&self, code_id: u64) -> SpyResult<Vec<String>> {
        Ok(self
            .chain
            .codes
            .lock()
            .unwrap()
            .get(&code_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn query_contract_smart(&self, address: &str, msg: &Value) -> SpyResult<Value> {
        self.get_contract(address).await?;
        if msg.get(PROBE_VARIANT).is_some() {
            return Err(SpyError::chain(
                500,
                format!(
                    "Error parsing into type counter::msg::QueryMsg: unknown variant `{PROBE_VARIANT}`, \
                     expected `get_count`: query wasm contract failed"
                ),
            ));
        }
        if msg.get("get_count").is_some() {
            return Ok(json!({ "count": 7 }));
        }
        Err(SpyError::chain(500, "unknown variant, expected `get_count`"))
    }

    async fn get_all_contract_state(&self, address: &str) -> SpyResult<Vec<StateEntry>> {
        Ok(self
            .chain
            .state
            .lock()
            .unwrap()
            .get(address)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_balance(&self, _address: &str, denom: &str) -> SpyResult<Option<Coin>> {
        self.chain.balance_calls.fetch_add(1, Ordering::SeqCst);
        Ok(Some(Coin::new("1500000", denom)))
    }

    async fn get_account(&self, _address: &str) -> SpyResult<Option<Account>> {
        Ok(Some(Account {
            account_number: 42,
            sequence: 3,
        }))
    }
}

pub struct MockSigningClient {
    pub query: Arc<MockQueryClient>,
}

#[async_trait]
impl SigningClient for MockSigningClient {
    fn querier(&self) -> Arc<dyn QueryClient> {
        self.query.clone()
    }

    async fn execute(
        &self,
        _sender: &str,
        contract: &str,
        msg: &Value,
        _funds: &[Coin],
    ) -> SpyResult<TxOutcome> {
        self.query.get_contract(contract).await?;
        self.query.chain.executed.lock().unwrap().push(msg.clone());
        Ok(TxOutcome {
            transaction_hash: "ABCDEF".to_string(),
            height: 100,
            gas_used: 120_000,
            events: Vec::new(),
        })
    }

    async fn instantiate(
        &self,
        sender: &str,
        code_id: u64,
        _msg: &Value,
        label: &str,
        admin: Option<&str>,
        _funds: &[Coin],
    ) -> SpyResult<InstantiateResponse> {
        let prefix = sender.split('1').next().unwrap_or("juno").to_string();
        let address = contract_address(&prefix, 9);
        self.query.chain.contracts.lock().unwrap().insert(
            address.clone(),
            Contract {
                address: address.clone(),
                code_id,
                creator: sender.to_string(),
                admin: admin.map(str::to_string),
                label: label.to_string(),
                ibc_port_id: None,
            },
        );
        Ok(InstantiateResponse {
            contract_address: address,
            transaction_hash: "FEDCBA".to_string(),
        })
    }

    async fn simulate_execute(
        &self,
        _sender: &str,
        contract: &str,
        msg: &Value,
    ) -> SpyResult<u64> {
        self.query.get_contract(contract).await?;
        if msg.get(PROBE_VARIANT).is_some() {
            return Err(SpyError::chain(
                400,
                format!(
                    "failed to execute message; message index: 0: Error parsing into type \
                     counter::msg::ExecuteMsg: unknown variant `{PROBE_VARIANT}`, expected \
                     `increment` or `reset`: execute wasm contract failed"
                ),
            ));
        }
        Ok(90_000)
    }
}

/// Factory handing out mock clients; can be told to fail
pub struct MockFactory {
    pub chain: Arc<MockChain>,
    pub fail: AtomicBool,
    pub query_connects: AtomicUsize,
    pub signing_connects: AtomicUsize,
}

impl MockFactory {
    pub fn new(chain: Arc<MockChain>) -> Arc<Self> {
        Arc::new(Self {
            chain,
            fail: AtomicBool::new(false),
            query_connects: AtomicUsize::new(0),
            signing_connects: AtomicUsize::new(0),
        })
    }

    fn client(&self, network: &NetworkListItem) -> SpyResult<Arc<MockQueryClient>> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(SpyError::chain(503, "endpoint unreachable"));
        }
        Ok(Arc::new(MockQueryClient {
            endpoint: network.endpoint().to_string(),
            chain_id: network.chain_id.clone(),
            chain: self.chain.clone(),
        }))
    }
}

#[async_trait]
impl ClientFactory for MockFactory {
    async fn connect(&self, network: &NetworkListItem) -> SpyResult<Arc<dyn QueryClient>> {
        let client = self.client(network)?;
        self.query_connects.fetch_add(1, Ordering::SeqCst);
        Ok(client)
    }

    async fn connect_with_signer(
        &self,
        network: &NetworkListItem,
        _signer: Arc<dyn OfflineSigner>,
    ) -> SpyResult<Arc<dyn SigningClient>> {
        let query = self.client(network)?;
        self.signing_connects.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(MockSigningClient { query }))
    }
}

/// Wallet provider whose key can be switched off
pub struct MockWallet {
    pub available: AtomicBool,
    pub signer_calls: AtomicUsize,
    pub suggested: Mutex<Vec<String>>,
}

impl MockWallet {
    pub fn new(available: bool) -> Arc<Self> {
        Arc::new(Self {
            available: AtomicBool::new(available),
            signer_calls: AtomicUsize::new(0),
            suggested: Mutex::new(Vec::new()),
        })
    }

    pub fn signer_calls(&self) -> usize {
        self.signer_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WalletProvider for MockWallet {
    async fn suggest_chain(&self, network: &NetworkListItem) -> SpyResult<()> {
        self.suggested.lock().unwrap().push(network.chain_id.clone());
        Ok(())
    }

    async fn enable(&self, _chain_id: &str) -> SpyResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(SpyError::WalletUnavailable("no key configured".to_string()))
        }
    }

    async fn signer(&self, network: &NetworkListItem) -> SpyResult<Arc<dyn OfflineSigner>> {
        self.signer_calls.fetch_add(1, Ordering::SeqCst);
        let signer = LocalSigner::from_hex(TEST_KEY, &network.address_prefix)?;
        Ok(Arc::new(signer))
    }

    async fn key_name(&self, _chain_id: &str) -> SpyResult<String> {
        Ok("dev".to_string())
    }
}
