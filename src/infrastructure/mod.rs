//! Infrastructure layer - External service integrations
//!
//! This layer contains:
//! - Cosmos REST client, signers and the keyring wallet provider
//! - Tokio runtime bridge for async operations

pub mod cosmos;
pub mod runtime;
