//! Runtime bridge - connects sync TUI thread with async Tokio runtime
//!
//! The terminal loop never blocks on the chain: it sends [`RuntimeCommand`]s
//! to a worker thread that owns the Tokio runtime and the stores, and drains
//! [`RuntimeEvent`]s on every tick.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;

use serde_json::Value;
use tokio::runtime::Runtime;

use crate::core::action::Notice;
use crate::domain::contract::{CodeListing, Contract, StateEntry};
use crate::domain::network::{NetworkList, NetworkListItem};
use crate::domain::public::PublicSnapshot;
use crate::domain::shape::MessageShape;
use crate::domain::wallet::WalletSnapshot;
use crate::infrastructure::cosmos::{ClientFactory, CodeSummary, WalletProvider};
use crate::infrastructure::runtime::worker::run_async_worker;
use crate::store::session::SessionStore;

/// Commands sent from the TUI to the async worker
#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeCommand {
    /// Restore the wallet session or fall back to read-only mode
    Startup,
    /// Connect the wallet (also used by the reconnect action)
    Connect,
    /// Drop the wallet and persisted session
    Disconnect,
    /// The wallet switched keys
    KeystoreChange,
    /// The terminal regained focus
    Focus,
    /// Switch both stores to another chain
    SelectNetwork { chain_id: String },
    /// Fetch metadata, raw state and message shapes for a contract
    LookupContract { address: String },
    /// Remember a contract as the current one
    UseContract { address: String },
    ListContracts { code_id: u64 },
    FetchCodes,
    FetchState { address: String },
    Probe { address: String },
    Query { address: String, msg: Value },
    Execute { contract: String, msg: Value },
    Instantiate {
        code_id: u64,
        label: String,
        msg: Value,
    },
    RefreshBalance,
    /// Shutdown the worker
    Shutdown,
}

impl RuntimeCommand {
    /// Commands that (re)acquire the wallet signer
    pub fn is_connect(&self) -> bool {
        matches!(
            self,
            RuntimeCommand::Connect | RuntimeCommand::KeystoreChange | RuntimeCommand::Focus
        )
    }
}

/// Result of a broadcast transaction, ready for display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxSummary {
    pub action: String,
    pub transaction_hash: String,
    pub contract_address: Option<String>,
    pub gas_used: Option<u64>,
}

/// Events sent from the async worker to the TUI
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    Wallet(WalletSnapshot),
    Public(PublicSnapshot),
    /// Remembered contract address changed (or was loaded at startup)
    ContractAddress { address: Option<String> },
    ContractLoaded { contract: Contract },
    ContractsListed { listing: CodeListing },
    CodesReady { summary: CodeSummary },
    StateReady {
        address: String,
        entries: Vec<StateEntry>,
    },
    ShapesReady {
        address: String,
        query: MessageShape,
        execute: MessageShape,
    },
    QueryResult { address: String, response: Value },
    TxResult { summary: TxSummary },
    Notice(Notice),
    /// Error occurred
    Error { message: String },
}

/// Everything the worker needs to build its stores
#[derive(Clone)]
pub struct RuntimeConfig {
    pub networks: NetworkList,
    pub network: NetworkListItem,
    pub factory: Arc<dyn ClientFactory>,
    pub provider: Arc<dyn WalletProvider>,
    pub session: SessionStore,
}

/// Bridge between sync TUI thread and async Tokio runtime
pub struct RuntimeBridge {
    cmd_tx: Sender<RuntimeCommand>,
    evt_rx: Receiver<RuntimeEvent>,
}

impl RuntimeBridge {
    pub fn new(config: RuntimeConfig) -> anyhow::Result<Self> {
        let (cmd_tx, cmd_rx) = mpsc::channel::<RuntimeCommand>();
        let (evt_tx, evt_rx) = mpsc::channel::<RuntimeEvent>();

        // Spawn the worker thread with its own Tokio runtime
        thread::Builder::new()
            .name("contract-spy-worker".to_string())
            .spawn(move || {
                let rt = match Runtime::new() {
                    Ok(rt) => rt,
                    Err(err) => {
                        let _ = evt_tx.send(RuntimeEvent::Error {
                            message: format!("Failed to create Tokio runtime: {}", err),
                        });
                        return;
                    }
                };
                rt.block_on(async {
                    if let Err(err) = run_async_worker(config, cmd_rx, evt_tx.clone()).await {
                        let _ = evt_tx.send(RuntimeEvent::Error {
                            message: format!("Worker exited: {:#}", err),
                        });
                    }
                });
            })?;

        Ok(Self { cmd_tx, evt_rx })
    }

    /// Send a command to the async worker
    pub fn send(&self, cmd: RuntimeCommand) -> anyhow::Result<()> {
        self.cmd_tx
            .send(cmd)
            .map_err(|_| anyhow::anyhow!("Worker channel closed"))
    }

    /// Poll for events (non-blocking)
    pub fn poll_events(&self) -> Vec<RuntimeEvent> {
        let mut events = Vec::new();
        while let Ok(evt) = self.evt_rx.try_recv() {
            events.push(evt);
        }
        events
    }
}

impl Drop for RuntimeBridge {
    fn drop(&mut self) {
        let _ = self.cmd_tx.send(RuntimeCommand::Shutdown);
    }
}
