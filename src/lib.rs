//! Terminal inspector for CosmWasm contracts: wallet lifecycle, chain selection,
//! contract metadata, raw state and inferred message shapes.

pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod infrastructure;
pub mod modules;
pub mod store;
pub mod ui;
