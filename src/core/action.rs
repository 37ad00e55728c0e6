//! Actions and notices passed from stores and commands back to the app

use crate::infrastructure::runtime::RuntimeCommand;

/// What the app should do after a command line is submitted
#[derive(Debug, Clone)]
pub enum Action {
    /// No action needed
    None,

    /// Hand a request to the chain worker
    Dispatch(RuntimeCommand),

    /// Export the inspected contract
    Export(ExportFormat),

    /// Copy text to the clipboard
    Copy(String),

    /// Show notification in status bar
    Notify(String, NotifyLevel),

    /// Request quit
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

/// Notification levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyLevel {
    Info,
    Success,
    Warn,
    Error,
}

/// User-facing message raised by a store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NotifyLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NotifyLevel::Info,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NotifyLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotifyLevel::Error,
            message: message.into(),
        }
    }
}
