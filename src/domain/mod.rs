//! Domain layer - chain-agnostic state and rules
//!
//! This layer contains:
//! - Network descriptors and amount formatting
//! - Contract metadata, raw state and message-shape inference
//! - The wallet and public client stores plus the contract operations built on them

pub mod contract;
pub mod error;
pub mod network;
pub mod operations;
pub mod public;
pub mod shape;
pub mod wallet;

pub use error::{SpyError, SpyResult};
