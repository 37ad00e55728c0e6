//! Runtime infrastructure - Tokio runtime bridge for async operations

mod bridge;
mod worker;

pub use bridge::{RuntimeBridge, RuntimeCommand, RuntimeConfig, RuntimeEvent, TxSummary};
pub use worker::{coalesce_connects, run_async_worker};
