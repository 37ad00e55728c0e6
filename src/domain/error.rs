//! Domain error type shared by the stores, the chain client and the session store

use thiserror::Error;

pub type SpyResult<T> = Result<T, SpyError>;

#[derive(Debug, Error)]
pub enum SpyError {
    /// No client has been created yet (or it was cleared by a disconnect)
    #[error("Client is not connected")]
    NotConnected,

    /// An operation needs a signer but the wallet is not connected
    #[error("Wallet is not connected")]
    NoSigner,

    /// The wallet provider cannot hand out a signer at all
    #[error("Wallet key is not available: {0}")]
    WalletUnavailable(String),

    #[error("Contract is not initialized.")]
    ContractNotInitialized,

    #[error("Invalid address {address}: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("Unknown network {0}")]
    UnknownNetwork(String),

    /// Non-success response from a chain endpoint
    #[error("{message}")]
    Chain { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Signing error: {0}")]
    Signing(String),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SpyError {
    pub fn chain(status: u16, message: impl Into<String>) -> Self {
        SpyError::Chain {
            status,
            message: message.into(),
        }
    }

    pub fn signing(err: impl std::fmt::Display) -> Self {
        SpyError::Signing(err.to_string())
    }

    pub fn decode(err: impl std::fmt::Display) -> Self {
        SpyError::Decode(err.to_string())
    }

    /// Message text reported by the chain, if this error came from a contract call
    pub fn chain_message(&self) -> Option<&str> {
        match self {
            SpyError::Chain { message, .. } => Some(message.as_str()),
            _ => None,
        }
    }
}
