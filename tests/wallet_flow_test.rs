//! Wallet connection lifecycle against in-memory clients

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use contract_spy::domain::wallet::{ConnectMode, WalletStore};
use contract_spy::infrastructure::cosmos::signer::LocalSigner;
use contract_spy::store::session::{SessionStore, WALLET_ADDRESS_KEY};

use common::{juno, signer_address, uni, MockChain, MockFactory, MockWallet};

fn wallet_store(
    available: bool,
) -> (WalletStore, Arc<MockFactory>, Arc<MockWallet>, SessionStore) {
    let chain = MockChain::with_counter("juno");
    let factory = MockFactory::new(chain);
    let wallet = MockWallet::new(available);
    let session = SessionStore::in_memory().unwrap();
    let store = WalletStore::new(uni(), factory.clone(), wallet.clone(), session.clone());
    (store, factory, wallet, session)
}

#[tokio::test]
async fn test_new_store_is_initializing() {
    let (store, _, _, _) = wallet_store(true);
    assert!(store.initializing());
    assert!(!store.initialized());
    assert!(store.client().is_none());
    assert_eq!(store.config().chain_id, "uni-5");
}

#[tokio::test]
async fn test_connect_persists_wallet_address() {
    let (mut store, _, wallet, session) = wallet_store(true);
    store.connect(ConnectMode::Manual).await;

    let expected = signer_address("juno");
    assert_eq!(store.address(), expected);
    assert!(store.initialized());
    assert!(!store.initializing());
    assert_eq!(store.account_number(), 42);
    assert_eq!(store.name(), "dev");
    assert!(store.client().map(|client| client.is_signing()).unwrap_or(false));
    assert_eq!(
        session.get(WALLET_ADDRESS_KEY).unwrap().as_deref(),
        Some(expected.as_str())
    );
    assert_eq!(wallet.suggested.lock().unwrap().as_slice(), ["uni-5".to_string()]);

    let snapshot = store.snapshot();
    assert!(snapshot.has_signer);
    assert_eq!(snapshot.client_kind, Some("signing"));
    assert_eq!(snapshot.display_name(), "dev");
}

#[tokio::test]
async fn test_balances_follow_coin_map() {
    let (mut store, _, _, _) = wallet_store(true);
    store.connect(ConnectMode::Manual).await;

    let denoms: Vec<&str> = store.balances().iter().map(|coin| coin.denom.as_str()).collect();
    let universe = uni();
    let expected: Vec<&str> = universe.coin_map.keys().map(String::as_str).collect();
    assert_eq!(denoms, expected);
    assert!(store.balances().iter().all(|coin| coin.amount == "1500000"));
}

#[tokio::test]
async fn test_failed_connect_leaves_store_uninitialized() {
    let (mut store, factory, wallet, session) = wallet_store(false);
    store.connect(ConnectMode::Manual).await;

    assert!(!store.initialized());
    assert!(!store.initializing());
    assert!(store.address().is_empty());
    assert!(store.balances().is_empty());
    assert_eq!(wallet.signer_calls(), 0);
    assert_eq!(factory.chain.balance_calls.load(Ordering::SeqCst), 0);
    assert!(session.get(WALLET_ADDRESS_KEY).unwrap().is_none());

    let notices = store.take_notices();
    assert_eq!(notices.len(), 1);
    assert!(notices[0].message.contains("Wallet key is not available"));
    assert!(store.take_notices().is_empty());
}

#[tokio::test]
async fn test_disconnect_clears_state_and_session() {
    let (mut store, _, _, session) = wallet_store(true);
    store.connect(ConnectMode::Manual).await;
    session.set("contract_address", "juno1whatever").unwrap();

    store.disconnect().await;

    assert!(store.address().is_empty());
    assert!(!store.initialized());
    assert!(!store.initializing());
    assert!(store.balances().is_empty());
    assert_eq!(store.account_number(), 0);
    assert!(session.keys().unwrap().is_empty());
    // A read-only client stays behind
    let client = store.client().expect("query client after disconnect");
    assert!(!client.is_signing());
    assert_eq!(store.config().chain_id, "uni-5");
}

#[tokio::test]
async fn test_startup_without_session_is_read_only() {
    let (mut store, factory, wallet, _) = wallet_store(true);
    store.startup().await;

    assert_eq!(wallet.signer_calls(), 0);
    assert!(!store.initialized());
    assert!(!store.initializing());
    assert_eq!(store.client().map(|client| client.kind()), Some("query"));
    assert_eq!(factory.query_connects.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_startup_with_session_reconnects() {
    let (mut store, factory, wallet, session) = wallet_store(true);
    session
        .set(WALLET_ADDRESS_KEY, &signer_address("juno"))
        .unwrap();

    store.startup().await;

    assert_eq!(wallet.signer_calls(), 1);
    assert!(store.initialized());
    assert!(!store.initializing());
    assert_eq!(factory.signing_connects.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_focus_reconnects_only_restored_sessions() {
    let (mut store, _, wallet, _) = wallet_store(true);
    store.startup().await;
    store.focus().await;
    assert_eq!(wallet.signer_calls(), 0);

    let (mut store, _, wallet, session) = wallet_store(true);
    session
        .set(WALLET_ADDRESS_KEY, &signer_address("juno"))
        .unwrap();
    store.startup().await;
    store.focus().await;
    assert_eq!(wallet.signer_calls(), 2);
    assert!(store.initialized());
    assert!(!store.initializing());

    // Disconnect ends the restored session
    store.disconnect().await;
    store.focus().await;
    assert_eq!(wallet.signer_calls(), 2);
}

#[tokio::test]
async fn test_focus_failure_does_not_mark_initializing() {
    let (mut store, _, wallet, session) = wallet_store(true);
    session
        .set(WALLET_ADDRESS_KEY, &signer_address("juno"))
        .unwrap();
    store.startup().await;

    wallet.available.store(false, Ordering::SeqCst);
    store.focus().await;

    assert!(!store.initializing());
    // The previous signer is kept when the wallet cannot be reached
    assert!(store.initialized());
    assert_eq!(store.take_notices().len(), 1);
}

#[tokio::test]
async fn test_keystore_change_reloads_signer() {
    let (mut store, _, wallet, _) = wallet_store(true);
    store.connect(ConnectMode::Manual).await;
    store.keystore_changed().await;

    assert_eq!(wallet.signer_calls(), 2);
    assert!(store.initialized());
    assert!(!store.initializing());
}

#[tokio::test]
async fn test_set_config_switches_chain() {
    let (mut store, _, _, session) = wallet_store(true);
    store.connect(ConnectMode::Manual).await;

    store.set_config(juno()).await;

    assert_eq!(store.config().chain_id, "juno-1");
    assert!(store.initialized());
    assert!(store.address().starts_with("juno1"));
    assert_eq!(
        session.get(WALLET_ADDRESS_KEY).unwrap().as_deref(),
        Some(store.address())
    );
}

#[tokio::test]
async fn test_set_config_without_wallet_falls_back_to_query_client() {
    let (mut store, _, wallet, _) = wallet_store(true);
    store.connect(ConnectMode::Manual).await;

    wallet.available.store(false, Ordering::SeqCst);
    store.set_config(juno()).await;

    assert!(!store.initialized());
    assert!(!store.initializing());
    assert!(store.address().is_empty());
    let client = store.client().expect("query client");
    assert_eq!(client.kind(), "query");
    assert!(client.querier().endpoint().contains("juno"));
}

#[tokio::test]
async fn test_client_failure_stops_initializing() {
    let (mut store, factory, _, _) = wallet_store(true);
    factory.fail.store(true, Ordering::SeqCst);

    store.connect(ConnectMode::Manual).await;

    assert!(!store.initializing());
    assert!(!store.initialized());
    assert!(store.client().is_none());
}

#[tokio::test]
async fn test_set_config_client_failure_drops_previous_chain() {
    let (mut store, factory, _, _) = wallet_store(true);
    store.connect(ConnectMode::Manual).await;
    assert!(store.initialized());

    factory.fail.store(true, Ordering::SeqCst);
    store.set_config(juno()).await;

    assert_eq!(store.config().chain_id, "juno-1");
    assert!(!store.initialized());
    assert!(!store.initializing());
    assert!(store.address().is_empty());
    assert!(store.get_signer().is_err());
    // Nothing may still sign through the uni-5 client
    assert!(store
        .client()
        .map_or(true, |client| client.querier().endpoint() == juno().endpoint()));
}

#[tokio::test]
async fn test_update_signer_resyncs_account() {
    let (mut store, factory, _, session) = wallet_store(true);
    store.connect(ConnectMode::Manual).await;
    let first = store.address().to_string();
    let signing_before = factory.signing_connects.load(Ordering::SeqCst);
    let balances_before = factory.chain.balance_calls.load(Ordering::SeqCst);

    let other = LocalSigner::from_hex(&"02".repeat(32), "juno").unwrap();
    let expected = other.address().to_string();
    assert!(store.update_signer(Arc::new(other)).await);

    assert_ne!(store.address(), first);
    assert_eq!(store.address(), expected);
    assert!(store.initialized());
    assert_eq!(
        factory.signing_connects.load(Ordering::SeqCst),
        signing_before + 1
    );
    assert!(factory.chain.balance_calls.load(Ordering::SeqCst) > balances_before);
    assert_eq!(
        session.get(WALLET_ADDRESS_KEY).unwrap().as_deref(),
        Some(expected.as_str())
    );
}
