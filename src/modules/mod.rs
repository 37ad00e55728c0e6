//! Feature modules driven from the command line
//!
//! - export: write the inspected contract to CSV or JSON

pub mod export;
