//! Async worker - owns the stores and runs chain operations one at a time

use std::sync::mpsc::{Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::{debug, info};

use crate::core::action::Notice;
use crate::domain::contract::{validate_address, CodeListing};
use crate::domain::error::{SpyError, SpyResult};
use crate::domain::network::NetworkList;
use crate::domain::operations::{PublicOperations, SignedOperations};
use crate::domain::public::{PublicSnapshot, PublicStore};
use crate::domain::wallet::{ConnectMode, WalletSnapshot, WalletStore};
use crate::infrastructure::cosmos::QueryClient;
use crate::infrastructure::runtime::bridge::{
    RuntimeCommand, RuntimeConfig, RuntimeEvent, TxSummary,
};

const IDLE_SLEEP: Duration = Duration::from_millis(10);

/// Run the async worker loop
pub async fn run_async_worker(
    config: RuntimeConfig,
    cmd_rx: Receiver<RuntimeCommand>,
    evt_tx: Sender<RuntimeEvent>,
) -> Result<()> {
    let mut worker = Worker::new(config, evt_tx);

    loop {
        let mut batch = Vec::new();
        let mut closed = false;
        loop {
            match cmd_rx.try_recv() {
                Ok(cmd) => batch.push(cmd),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    closed = true;
                    break;
                }
            }
        }

        for cmd in coalesce_connects(batch) {
            if cmd == RuntimeCommand::Shutdown {
                info!("worker shutting down");
                return Ok(());
            }
            worker.handle(cmd).await;
        }

        if closed {
            return Ok(());
        }
        tokio::time::sleep(IDLE_SLEEP).await;
    }
}

/// Keep only the last signer-acquiring command of a burst; everything else keeps its order.
/// A focus reconnect is conditional, so it never replaces an explicit connect in the same burst.
pub fn coalesce_connects(batch: Vec<RuntimeCommand>) -> Vec<RuntimeCommand> {
    let explicit = batch
        .iter()
        .any(|cmd| cmd.is_connect() && *cmd != RuntimeCommand::Focus);
    let last_connect = batch
        .iter()
        .rposition(|cmd| cmd.is_connect() && !(explicit && *cmd == RuntimeCommand::Focus));
    batch
        .into_iter()
        .enumerate()
        .filter(|(idx, cmd)| !cmd.is_connect() || Some(*idx) == last_connect)
        .map(|(_, cmd)| cmd)
        .collect()
}

struct Worker {
    networks: NetworkList,
    wallet: WalletStore,
    public: PublicStore,
    public_ops: PublicOperations,
    signed_ops: SignedOperations,
    evt_tx: Sender<RuntimeEvent>,
    last_wallet: Option<WalletSnapshot>,
    last_public: Option<PublicSnapshot>,
}

impl Worker {
    fn new(config: RuntimeConfig, evt_tx: Sender<RuntimeEvent>) -> Self {
        let wallet = WalletStore::new(
            config.network.clone(),
            config.factory.clone(),
            config.provider.clone(),
            config.session.clone(),
        );
        let public = PublicStore::new(config.network, config.factory, config.session.clone());
        Self {
            networks: config.networks,
            wallet,
            public,
            public_ops: PublicOperations::new(config.session.clone()),
            signed_ops: SignedOperations::new(config.session),
            evt_tx,
            last_wallet: None,
            last_public: None,
        }
    }

    fn emit(&self, event: RuntimeEvent) {
        let _ = self.evt_tx.send(event);
    }

    fn error(&self, context: &str, err: SpyError) {
        self.emit(RuntimeEvent::Error {
            message: format!("{}: {}", context, err),
        });
    }

    /// Rebind operations, forward notices and changed snapshots
    fn flush(&mut self) {
        let querier = self.querier().ok();
        self.public_ops.bind(querier);
        self.signed_ops
            .bind(self.wallet.client(), self.wallet.address());

        for notice in self
            .wallet
            .take_notices()
            .into_iter()
            .chain(self.public.take_notices())
        {
            self.emit(RuntimeEvent::Notice(notice));
        }

        let wallet = self.wallet.snapshot();
        if self.last_wallet.as_ref() != Some(&wallet) {
            self.last_wallet = Some(wallet.clone());
            self.emit(RuntimeEvent::Wallet(wallet));
        }
        let public = self.public.snapshot();
        if self.last_public.as_ref() != Some(&public) {
            self.last_public = Some(public.clone());
            self.emit(RuntimeEvent::Public(public));
        }
    }

    /// Read-only client: the public store's, else the wallet's
    fn querier(&self) -> SpyResult<Arc<dyn QueryClient>> {
        self.public
            .client()
            .or_else(|| self.wallet.client().map(|client| client.querier()))
            .ok_or(SpyError::NotConnected)
    }

    fn prefix(&self) -> String {
        self.public.config().address_prefix.clone()
    }

    async fn handle(&mut self, cmd: RuntimeCommand) {
        debug!(?cmd, "handling command");
        match cmd {
            RuntimeCommand::Startup => {
                self.flush();
                self.wallet.startup().await;
                self.flush();
                self.public.connect(ConnectMode::Manual).await;
                self.emit(RuntimeEvent::ContractAddress {
                    address: self.public_ops.get_contract_address().map(str::to_string),
                });
            }

            RuntimeCommand::Connect => {
                self.wallet_pending();
                self.wallet.connect(ConnectMode::Manual).await;
            }
            RuntimeCommand::KeystoreChange => {
                self.wallet_pending();
                self.wallet.keystore_changed().await;
            }
            RuntimeCommand::Focus => self.wallet.focus().await,
            RuntimeCommand::Disconnect => {
                self.wallet.disconnect().await;
                self.public_ops.update_contract_address("");
                self.signed_ops.update_contract_address("");
                self.emit(RuntimeEvent::ContractAddress { address: None });
                self.emit(RuntimeEvent::Notice(Notice::info("Wallet disconnected")));
            }

            RuntimeCommand::SelectNetwork { chain_id } => {
                let Some(network) = self.networks.find(&chain_id).cloned() else {
                    self.error("Network switch failed", SpyError::UnknownNetwork(chain_id));
                    return;
                };
                self.public.set_config(network.clone());
                self.public.connect(ConnectMode::Manual).await;
                self.wallet_pending();
                self.wallet.set_config(network.clone()).await;
                self.emit(RuntimeEvent::Notice(Notice::info(format!(
                    "Switched to {}",
                    network.label()
                ))));
            }

            RuntimeCommand::UseContract { address } => {
                match validate_address(&address, Some(&self.prefix())) {
                    Ok(account) => {
                        let address = account.to_string();
                        self.public_ops.update_contract_address(&address);
                        self.signed_ops.update_contract_address(&address);
                        self.emit(RuntimeEvent::ContractAddress {
                            address: Some(address),
                        });
                    }
                    Err(err) => self.error("Invalid contract", err),
                }
            }

            RuntimeCommand::LookupContract { address } => self.lookup_contract(&address).await,

            RuntimeCommand::ListContracts { code_id } => {
                let result = match self.querier() {
                    Ok(client) => client.get_contracts(code_id).await,
                    Err(err) => Err(err),
                };
                match result {
                    Ok(contracts) => self.emit(RuntimeEvent::ContractsListed {
                        listing: CodeListing::new(code_id, contracts),
                    }),
                    Err(err) => self.error(&format!("Listing code {} failed", code_id), err),
                }
            }

            RuntimeCommand::FetchCodes => {
                let result = match self.querier() {
                    Ok(client) => client.get_codes().await,
                    Err(err) => Err(err),
                };
                match result {
                    Ok(summary) => self.emit(RuntimeEvent::CodesReady { summary }),
                    Err(err) => self.error("Code lookup failed", err),
                }
            }

            RuntimeCommand::FetchState { address } => self.fetch_state(&address).await,

            RuntimeCommand::Probe { address } => self.probe(&address).await,

            RuntimeCommand::Query { address, msg } => {
                let result = if self.public_ops.is_bound() {
                    self.public_ops.query(&address, &msg).await
                } else {
                    self.signed_ops.query(&address, &msg).await
                };
                match result {
                    Ok(response) => self.emit(RuntimeEvent::QueryResult { address, response }),
                    Err(err) => self.error("Query failed", err),
                }
            }

            RuntimeCommand::Execute { contract, msg } => {
                match self.signed_ops.execute(&contract, &msg).await {
                    Ok(outcome) => {
                        self.emit(RuntimeEvent::TxResult {
                            summary: TxSummary {
                                action: "execute".to_string(),
                                transaction_hash: outcome.transaction_hash,
                                contract_address: Some(contract),
                                gas_used: Some(outcome.gas_used),
                            },
                        });
                        self.refresh_balance().await;
                    }
                    Err(err) => self.error("Execute failed", err),
                }
            }

            RuntimeCommand::Instantiate {
                code_id,
                label,
                msg,
            } => match self.signed_ops.instantiate(code_id, &msg, &label, None).await {
                Ok(response) => {
                    self.public_ops
                        .update_contract_address(&response.contract_address);
                    self.signed_ops
                        .update_contract_address(&response.contract_address);
                    self.emit(RuntimeEvent::ContractAddress {
                        address: Some(response.contract_address.clone()),
                    });
                    self.emit(RuntimeEvent::TxResult {
                        summary: TxSummary {
                            action: format!("instantiate code {}", code_id),
                            transaction_hash: response.transaction_hash,
                            contract_address: Some(response.contract_address),
                            gas_used: None,
                        },
                    });
                    self.refresh_balance().await;
                }
                Err(err) => self.error("Instantiate failed", err),
            },

            RuntimeCommand::RefreshBalance => self.refresh_balance().await,

            RuntimeCommand::Shutdown => {}
        }
        self.flush();
    }

    /// Publish the `initializing` flag before a slow connect
    fn wallet_pending(&mut self) {
        let mut snapshot = self.wallet.snapshot();
        snapshot.initializing = true;
        self.emit(RuntimeEvent::Wallet(snapshot));
        self.last_wallet = None;
    }

    async fn refresh_balance(&mut self) {
        if let Err(err) = self.wallet.refresh_balance(None).await {
            self.error("Balance refresh failed", err);
        }
    }

    async fn lookup_contract(&mut self, address: &str) {
        let address = match validate_address(address, Some(&self.prefix())) {
            Ok(account) => account.to_string(),
            Err(err) => {
                self.error("Invalid contract", err);
                return;
            }
        };
        let result = match self.querier() {
            Ok(client) => client.get_contract(&address).await,
            Err(err) => Err(err),
        };
        match result {
            Ok(contract) => {
                info!(address = %contract.address, code_id = contract.code_id, "contract loaded");
                self.emit(RuntimeEvent::ContractLoaded { contract });
                self.fetch_state(&address).await;
                self.probe(&address).await;
            }
            Err(err) => self.error("Contract lookup failed", err),
        }
    }

    async fn fetch_state(&mut self, address: &str) {
        let result = match self.querier() {
            Ok(client) => client.get_all_contract_state(address).await,
            Err(err) => Err(err),
        };
        match result {
            Ok(entries) => self.emit(RuntimeEvent::StateReady {
                address: address.to_string(),
                entries,
            }),
            Err(err) => self.error("State fetch failed", err),
        }
    }

    async fn probe(&mut self, address: &str) {
        self.flush();
        let query = self.public_ops.probe_query(address).await;
        let execute = self.signed_ops.probe_execute(address).await;
        self.emit(RuntimeEvent::ShapesReady {
            address: address.to_string(),
            query,
            execute,
        });
    }
}
