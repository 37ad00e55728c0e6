pub mod action;
pub mod command;

pub use action::{Action, ExportFormat, Notice, NotifyLevel};
pub use command::{parse_command, Command, HELP_LINES};
