//! Cosmos chain access: client traits, the REST implementation and signers

pub mod client;
pub mod keyring;
pub mod rest;
pub mod signer;
pub mod types;

pub use client::{ClientFactory, ClientHandle, QueryClient, SigningClient};
pub use keyring::{KeyringWallet, WalletProvider};
pub use rest::RestClientFactory;
pub use signer::{AccountData, LocalSigner, OfflineSigner};
pub use types::{Account, CodeSummary, Coin, InstantiateResponse, TxOutcome};
