//! Chain client over the Cosmos SDK / CosmWasm REST (LCD) routes

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use base64::Engine as _;
use cosmrs::cosmwasm::{MsgExecuteContract, MsgInstantiateContract};
use cosmrs::proto::cosmos::tx::v1beta1::TxRaw;
use cosmrs::tx::{self, Fee, MessageExt, Msg, SignDoc, SignerInfo};
use cosmrs::Any;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::domain::contract::{validate_address, Contract, StateEntry};
use crate::domain::error::{SpyError, SpyResult};
use crate::domain::network::NetworkListItem;
use crate::infrastructure::cosmos::client::{ClientFactory, QueryClient, SigningClient};
use crate::infrastructure::cosmos::signer::{AccountData, OfflineSigner};
use crate::infrastructure::cosmos::types::{
    account_fields, Account, AccountResponse, AllStateResponse, BalanceResponse,
    BroadcastResponse, CodeSummary, CodesResponse, Coin, ContractInfoResponse,
    ContractsByCodeResponse, ErrorResponse, GetTxResponse, InstantiateResponse,
    NodeInfoResponse, PageResponse, SimulateResponse, SmartQueryResponse, TxOutcome, TxRequest,
};

/// Per-request timeout; a dead endpoint must not wedge the worker
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(15);
/// Multiplier applied to simulated gas
pub const GAS_ADJUSTMENT: f64 = 1.3;

const PAGE_LIMIT: &str = "100";
const TX_POLL_INTERVAL: Duration = Duration::from_secs(1);
const TX_POLL_ATTEMPTS: usize = 30;

pub fn http_client() -> SpyResult<reqwest::Client> {
    Ok(reqwest::Client::builder().timeout(HTTP_TIMEOUT).build()?)
}

/// Unauthenticated LCD client
#[derive(Debug, Clone)]
pub struct RestClient {
    http: reqwest::Client,
    base: String,
}

impl RestClient {
    pub fn new(http: reqwest::Client, endpoint: &str) -> Self {
        Self {
            http,
            base: endpoint.trim().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> SpyResult<T> {
        debug!(endpoint = %self.base, path, "GET");
        let response = self.http.get(self.url(path)).query(query).send().await?;
        read_response(response).await
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> SpyResult<T> {
        debug!(endpoint = %self.base, path, "POST");
        let response = self.http.post(self.url(path)).json(body).send().await?;
        read_response(response).await
    }

    /// Follow `pagination.next_key` until the node runs out of pages
    async fn get_paged<T, F>(&self, path: &str, mut on_page: F) -> SpyResult<()>
    where
        T: DeserializeOwned,
        F: FnMut(T) -> SpyResult<Option<PageResponse>>,
    {
        let mut next_key: Option<String> = None;
        loop {
            let mut query = vec![("pagination.limit", PAGE_LIMIT.to_string())];
            if let Some(key) = &next_key {
                query.push(("pagination.key", key.clone()));
            }
            let page: T = self.get_json(path, &query).await?;
            next_key = on_page(page)?
                .and_then(|pagination| pagination.next_key)
                .filter(|key| !key.is_empty());
            if next_key.is_none() {
                return Ok(());
            }
        }
    }
}

async fn read_response<T: DeserializeOwned>(response: reqwest::Response) -> SpyResult<T> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        let message = serde_json::from_str::<ErrorResponse>(&body)
            .ok()
            .filter(|err| !err.message.is_empty())
            .map(|err| err.message)
            .unwrap_or_else(|| {
                let trimmed = body.trim();
                if trimmed.is_empty() {
                    status.to_string()
                } else {
                    trimmed.to_string()
                }
            });
        return Err(SpyError::chain(status.as_u16(), message));
    }
    serde_json::from_str(&body).map_err(SpyError::decode)
}

fn is_not_found(err: &SpyError) -> bool {
    match err {
        SpyError::Chain { status, message } => *status == 404 || message.contains("not found"),
        _ => false,
    }
}

#[async_trait]
impl QueryClient for RestClient {
    fn endpoint(&self) -> &str {
        &self.base
    }

    async fn chain_id(&self) -> SpyResult<String> {
        let info: NodeInfoResponse = self
            .get_json("/cosmos/base/tendermint/v1beta1/node_info", &[])
            .await?;
        Ok(info.default_node_info.network)
    }

    async fn get_contract(&self, address: &str) -> SpyResult<Contract> {
        let response: ContractInfoResponse = self
            .get_json(&format!("/cosmwasm/wasm/v1/contract/{}", address.trim()), &[])
            .await?;
        response.into_contract().map_err(SpyError::decode)
    }

    async fn get_codes(&self) -> SpyResult<CodeSummary> {
        let query = [
            ("pagination.limit", "1".to_string()),
            ("pagination.reverse", "true".to_string()),
            ("pagination.count_total", "true".to_string()),
        ];
        let response: CodesResponse = self.get_json("/cosmwasm/wasm/v1/code", &query).await?;
        let latest_code_id = response
            .code_infos
            .first()
            .map(|info| info.code_id.parse::<u64>())
            .transpose()
            .map_err(SpyError::decode)?;
        let total = response
            .pagination
            .and_then(|page| page.total)
            .and_then(|total| total.parse::<u64>().ok())
            .filter(|total| *total > 0);
        Ok(CodeSummary {
            latest_code_id,
            total,
        })
    }

    async fn get_contracts(&self, code_id: u64) -> SpyResult<Vec<String>> {
        let mut contracts = Vec::new();
        self.get_paged(
            &format!("/cosmwasm/wasm/v1/code/{}/contracts", code_id),
            |page: ContractsByCodeResponse| {
                contracts.extend(page.contracts);
                Ok(page.pagination)
            },
        )
        .await?;
        Ok(contracts)
    }

    async fn query_contract_smart(&self, address: &str, msg: &Value) -> SpyResult<Value> {
        let encoded = URL_SAFE.encode(serde_json::to_vec(msg)?);
        let response: SmartQueryResponse = self
            .get_json(
                &format!("/cosmwasm/wasm/v1/contract/{}/smart/{}", address.trim(), encoded),
                &[],
            )
            .await?;
        Ok(response.data)
    }

    async fn get_all_contract_state(&self, address: &str) -> SpyResult<Vec<StateEntry>> {
        let mut entries = Vec::new();
        self.get_paged(
            &format!("/cosmwasm/wasm/v1/contract/{}/state", address.trim()),
            |page: AllStateResponse| {
                for model in page.models {
                    let key = hex::decode(&model.key).map_err(SpyError::decode)?;
                    let value = STANDARD.decode(&model.value).map_err(SpyError::decode)?;
                    entries.push(StateEntry::new(key, value));
                }
                Ok(page.pagination)
            },
        )
        .await?;
        Ok(entries)
    }

    async fn get_balance(&self, address: &str, denom: &str) -> SpyResult<Option<Coin>> {
        let response: BalanceResponse = self
            .get_json(
                &format!("/cosmos/bank/v1beta1/balances/{}/by_denom", address.trim()),
                &[("denom", denom.to_string())],
            )
            .await?;
        Ok(response.balance)
    }

    async fn get_account(&self, address: &str) -> SpyResult<Option<Account>> {
        let result: SpyResult<AccountResponse> = self
            .get_json(&format!("/cosmos/auth/v1beta1/accounts/{}", address.trim()), &[])
            .await;
        match result {
            Ok(response) => Ok(account_fields(&response.account)),
            Err(err) if is_not_found(&err) => Ok(None),
            Err(err) => Err(err),
        }
    }
}

/// LCD client that signs with an [`OfflineSigner`] and broadcasts
pub struct SigningRestClient {
    query: Arc<RestClient>,
    network: NetworkListItem,
    signer: Arc<dyn OfflineSigner>,
}

impl SigningRestClient {
    pub fn new(query: Arc<RestClient>, network: NetworkListItem, signer: Arc<dyn OfflineSigner>) -> Self {
        Self {
            query,
            network,
            signer,
        }
    }

    fn signer_account(&self, sender: &str) -> SpyResult<AccountData> {
        self.signer
            .accounts()
            .into_iter()
            .find(|account| account.address == sender.trim())
            .ok_or(SpyError::NoSigner)
    }

    fn fee(&self, gas_limit: u64) -> SpyResult<Fee> {
        let amount = (gas_limit as f64 * self.network.gas_price).ceil() as u128;
        let coin = cosmrs::Coin::new(amount, &self.network.fee_token).map_err(SpyError::signing)?;
        Ok(Fee::from_amount_and_gas(coin, gas_limit))
    }

    async fn sign_doc(&self, sender: &AccountData, msgs: Vec<Any>, gas_limit: u64) -> SpyResult<SignDoc> {
        let account = self
            .query
            .get_account(&sender.address)
            .await?
            .ok_or_else(|| {
                SpyError::chain(404, format!("account {} not found on chain", sender.address))
            })?;

        let body = tx::Body::new(msgs, String::new(), 0u32);
        let signer_info = SignerInfo::single_direct(Some(sender.public_key), account.sequence);
        let auth_info = signer_info.auth_info(self.fee(gas_limit)?);
        let chain_id = self.network.chain_id.parse().map_err(SpyError::signing)?;
        SignDoc::new(&body, &auth_info, &chain_id, account.account_number).map_err(SpyError::signing)
    }

    async fn simulate(&self, sender: &AccountData, msgs: Vec<Any>) -> SpyResult<u64> {
        let sign_doc = self.sign_doc(sender, msgs, 0).await?;
        let raw = TxRaw {
            body_bytes: sign_doc.body_bytes,
            auth_info_bytes: sign_doc.auth_info_bytes,
            signatures: vec![vec![]],
        };
        let tx_bytes = raw.to_bytes().map_err(SpyError::signing)?;
        let response: SimulateResponse = self
            .query
            .post_json(
                "/cosmos/tx/v1beta1/simulate",
                &TxRequest {
                    tx_bytes: STANDARD.encode(tx_bytes),
                    mode: None,
                },
            )
            .await?;
        response.gas_info.gas_used.parse().map_err(SpyError::decode)
    }

    async fn sign_and_broadcast(&self, sender: &AccountData, msgs: Vec<Any>) -> SpyResult<TxOutcome> {
        let simulated = self.simulate(sender, msgs.clone()).await?;
        let gas_limit = (simulated as f64 * GAS_ADJUSTMENT).ceil() as u64;
        let sign_doc = self.sign_doc(sender, msgs, gas_limit).await?;
        let tx_bytes = self.signer.sign_direct(sign_doc)?;

        let response: BroadcastResponse = self
            .query
            .post_json(
                "/cosmos/tx/v1beta1/txs",
                &TxRequest {
                    tx_bytes: STANDARD.encode(tx_bytes),
                    mode: Some("BROADCAST_MODE_SYNC"),
                },
            )
            .await?;
        let tx = response.tx_response;
        if tx.code != 0 {
            return Err(SpyError::chain(
                200,
                format!("transaction failed with code {}: {}", tx.code, tx.raw_log),
            ));
        }
        debug!(hash = %tx.txhash, gas_limit, "transaction accepted into mempool");
        self.wait_for_tx(&tx.txhash).await
    }

    async fn wait_for_tx(&self, hash: &str) -> SpyResult<TxOutcome> {
        let path = format!("/cosmos/tx/v1beta1/txs/{}", hash);
        for _ in 0..TX_POLL_ATTEMPTS {
            tokio::time::sleep(TX_POLL_INTERVAL).await;
            match self.query.get_json::<GetTxResponse>(&path, &[]).await {
                Ok(found) => {
                    let tx = found.tx_response;
                    if tx.code != 0 {
                        return Err(SpyError::chain(
                            200,
                            format!("transaction failed with code {}: {}", tx.code, tx.raw_log),
                        ));
                    }
                    return Ok(tx.into_outcome());
                }
                Err(err) if is_not_found(&err) => continue,
                Err(err) => return Err(err),
            }
        }
        Err(SpyError::chain(
            408,
            format!("transaction {} was not included in a block in time", hash),
        ))
    }

    fn execute_msg(&self, sender: &str, contract: &str, msg: &Value, funds: &[Coin]) -> SpyResult<Any> {
        MsgExecuteContract {
            sender: validate_address(sender, Some(&self.network.address_prefix))?,
            contract: validate_address(contract, Some(&self.network.address_prefix))?,
            msg: serde_json::to_vec(msg)?,
            funds: to_chain_coins(funds)?,
        }
        .to_any()
        .map_err(SpyError::signing)
    }
}

fn to_chain_coins(funds: &[Coin]) -> SpyResult<Vec<cosmrs::Coin>> {
    funds
        .iter()
        .map(|coin| {
            let amount: u128 = coin.amount.trim().parse().map_err(SpyError::decode)?;
            cosmrs::Coin::new(amount, &coin.denom).map_err(SpyError::signing)
        })
        .collect()
}

#[async_trait]
impl SigningClient for SigningRestClient {
    fn querier(&self) -> Arc<dyn QueryClient> {
        self.query.clone()
    }

    async fn execute(
        &self,
        sender: &str,
        contract: &str,
        msg: &Value,
        funds: &[Coin],
    ) -> SpyResult<TxOutcome> {
        let account = self.signer_account(sender)?;
        let any = self.execute_msg(sender, contract, msg, funds)?;
        self.sign_and_broadcast(&account, vec![any]).await
    }

    async fn instantiate(
        &self,
        sender: &str,
        code_id: u64,
        msg: &Value,
        label: &str,
        admin: Option<&str>,
        funds: &[Coin],
    ) -> SpyResult<InstantiateResponse> {
        let account = self.signer_account(sender)?;
        let prefix = Some(self.network.address_prefix.as_str());
        let admin = admin.map(|admin| validate_address(admin, prefix)).transpose()?;
        let any = MsgInstantiateContract {
            sender: validate_address(sender, prefix)?,
            admin,
            code_id,
            label: Some(label.to_string()),
            msg: serde_json::to_vec(msg)?,
            funds: to_chain_coins(funds)?,
        }
        .to_any()
        .map_err(SpyError::signing)?;

        let outcome = self.sign_and_broadcast(&account, vec![any]).await?;
        let contract_address = outcome
            .attribute("instantiate", "_contract_address")
            .map(str::to_string)
            .ok_or_else(|| SpyError::decode("instantiate events carry no contract address"))?;
        Ok(InstantiateResponse {
            contract_address,
            transaction_hash: outcome.transaction_hash,
        })
    }

    async fn simulate_execute(&self, sender: &str, contract: &str, msg: &Value) -> SpyResult<u64> {
        let account = self.signer_account(sender)?;
        let any = self.execute_msg(sender, contract, msg, &[])?;
        self.simulate(&account, vec![any]).await
    }
}

/// Builds REST clients sharing one HTTP connection pool
#[derive(Debug, Clone)]
pub struct RestClientFactory {
    http: reqwest::Client,
}

impl RestClientFactory {
    pub fn new() -> SpyResult<Self> {
        Ok(Self {
            http: http_client()?,
        })
    }

    async fn query_client(&self, network: &NetworkListItem) -> SpyResult<Arc<RestClient>> {
        let client = RestClient::new(self.http.clone(), network.endpoint());
        let reported = client.chain_id().await?;
        if reported != network.chain_id {
            warn!(
                expected = %network.chain_id,
                reported = %reported,
                endpoint = %client.endpoint(),
                "endpoint reports a different chain id"
            );
        }
        Ok(Arc::new(client))
    }
}

#[async_trait]
impl ClientFactory for RestClientFactory {
    async fn connect(&self, network: &NetworkListItem) -> SpyResult<Arc<dyn QueryClient>> {
        let client = self.query_client(network).await?;
        Ok(client)
    }

    async fn connect_with_signer(
        &self,
        network: &NetworkListItem,
        signer: Arc<dyn OfflineSigner>,
    ) -> SpyResult<Arc<dyn SigningClient>> {
        let query = self.query_client(network).await?;
        Ok(Arc::new(SigningRestClient::new(query, network.clone(), signer)))
    }
}
