use std::time::{Duration, Instant};

use serde_json::Value;

use crate::core::{parse_command, Action, Command, ExportFormat, Notice, NotifyLevel};
use crate::domain::contract::{CodeListing, Contract, StateEntry};
use crate::domain::network::{NetworkList, NetworkListItem};
use crate::domain::public::PublicSnapshot;
use crate::domain::shape::MessageShape;
use crate::domain::wallet::WalletSnapshot;
use crate::infrastructure::cosmos::CodeSummary;
use crate::infrastructure::runtime::{RuntimeCommand, RuntimeEvent, TxSummary};

/// Tabs of the inspector panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InspectorTab {
    Info,
    State,
    Shapes,
    Result,
}

impl InspectorTab {
    pub const ALL: [InspectorTab; 4] = [
        InspectorTab::Info,
        InspectorTab::State,
        InspectorTab::Shapes,
        InspectorTab::Result,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            InspectorTab::Info => "Info",
            InspectorTab::State => "State",
            InspectorTab::Shapes => "Shapes",
            InspectorTab::Result => "Result",
        }
    }

    pub fn shortcut(&self) -> char {
        match self {
            InspectorTab::Info => '1',
            InspectorTab::State => '2',
            InspectorTab::Shapes => '3',
            InspectorTab::Result => '4',
        }
    }

    fn index(&self) -> usize {
        Self::ALL.iter().position(|tab| tab == self).unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Networks,
    Contracts,
    Inspector,
    Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Success,
    Warn,
    Error,
}

impl From<NotifyLevel> for StatusLevel {
    fn from(level: NotifyLevel) -> Self {
        match level {
            NotifyLevel::Info => StatusLevel::Info,
            NotifyLevel::Success => StatusLevel::Success,
            NotifyLevel::Warn => StatusLevel::Warn,
            NotifyLevel::Error => StatusLevel::Error,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CommandBar {
    pub input: String,
    pub last: Option<String>,
}

#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub text: String,
    pub level: StatusLevel,
    pub since: Instant,
}

/// Last query response or broadcast, shown in the Result tab
#[derive(Debug, Clone)]
pub enum CallResult {
    Query { address: String, response: Value },
    Tx(TxSummary),
}

pub struct App {
    pub networks: NetworkList,
    /// Network the stores are connected to
    pub active_network: usize,
    /// Highlighted row of the network list
    pub selected_network: usize,
    pub wallet: Option<WalletSnapshot>,
    pub public: Option<PublicSnapshot>,
    /// Remembered contract, persisted by the worker
    pub contract_address: Option<String>,
    pub contract: Option<Contract>,
    pub state_entries: Vec<StateEntry>,
    pub query_shape: Option<MessageShape>,
    pub execute_shape: Option<MessageShape>,
    pub listing: Option<CodeListing>,
    pub codes: Option<CodeSummary>,
    pub result: Option<CallResult>,
    pub selected_contract: usize,
    pub selected_state: usize,
    pub focus: Focus,
    pub tab: InspectorTab,
    pub input_mode: InputMode,
    pub command: CommandBar,
    pub status: Option<StatusMessage>,
    pub help_open: bool,
    pub should_quit: bool,
    pending_commands: Vec<RuntimeCommand>,
    pending_copy: Option<String>,
}

impl App {
    pub fn new(networks: NetworkList, active_network: usize) -> Self {
        let active_network = active_network.min(networks.len().saturating_sub(1));
        Self {
            networks,
            active_network,
            selected_network: active_network,
            wallet: None,
            public: None,
            contract_address: None,
            contract: None,
            state_entries: Vec::new(),
            query_shape: None,
            execute_shape: None,
            listing: None,
            codes: None,
            result: None,
            selected_contract: 0,
            selected_state: 0,
            focus: Focus::Networks,
            tab: InspectorTab::Info,
            input_mode: InputMode::Normal,
            command: CommandBar::default(),
            status: None,
            help_open: false,
            should_quit: false,
            pending_commands: Vec::new(),
            pending_copy: None,
        }
    }

    pub fn network(&self) -> &NetworkListItem {
        // NetworkList is never empty, and active_network is clamped on every write
        &self.networks.items()[self.active_network]
    }

    pub fn wallet_connected(&self) -> bool {
        self.wallet
            .as_ref()
            .map(|wallet| wallet.initialized && !wallet.address.is_empty())
            .unwrap_or(false)
    }

    pub fn wallet_initializing(&self) -> bool {
        self.wallet
            .as_ref()
            .map(|wallet| wallet.initializing)
            .unwrap_or(true)
    }

    /// Contract the inspector commands act on: the loaded one, else the remembered one
    pub fn current_contract(&self) -> Option<&str> {
        self.contract
            .as_ref()
            .map(|contract| contract.address.as_str())
            .or(self.contract_address.as_deref())
    }

    pub fn selected_listed_contract(&self) -> Option<&str> {
        self.listing
            .as_ref()
            .and_then(|listing| listing.contracts.get(self.selected_contract))
            .map(String::as_str)
    }

    pub fn set_status(&mut self, text: impl Into<String>, level: StatusLevel) {
        self.status = Some(StatusMessage {
            text: text.into(),
            level,
            since: Instant::now(),
        });
    }

    pub fn status_text(&self) -> Option<(&str, StatusLevel)> {
        self.status
            .as_ref()
            .map(|status| (status.text.as_str(), status.level))
    }

    pub fn on_tick(&mut self) {
        if let Some(status) = self.status.as_ref() {
            if status.since.elapsed() > Duration::from_secs(3) {
                self.status = None;
            }
        }
    }

    pub fn enter_command(&mut self) {
        self.input_mode = InputMode::Command;
        self.focus = Focus::Command;
        self.command.input.clear();
    }

    pub fn exit_command(&mut self) {
        self.input_mode = InputMode::Normal;
        self.focus = Focus::Inspector;
        self.command.input.clear();
    }

    /// Recall the last submitted command into the input line
    pub fn recall_command(&mut self) {
        if let Some(last) = self.command.last.clone() {
            self.command.input = last;
        }
    }

    pub fn apply_command(&mut self) {
        let input = self.command.input.trim().to_string();
        if input.is_empty() {
            self.exit_command();
            return;
        }

        let cmd = parse_command(&input);
        let action = self.execute_command(&cmd);
        self.command.last = Some(input);
        self.exit_command();
        self.apply_action(action);
    }

    /// Execute a parsed command
    pub fn execute_command(&mut self, cmd: &Command) -> Action {
        match cmd {
            Command::Contract(address) => {
                self.tab = InspectorTab::Info;
                Action::Dispatch(RuntimeCommand::LookupContract {
                    address: address.clone(),
                })
            }
            Command::Code(code_id) => Action::Dispatch(RuntimeCommand::ListContracts {
                code_id: *code_id,
            }),
            Command::Codes => Action::Dispatch(RuntimeCommand::FetchCodes),
            Command::State => match self.current_contract() {
                Some(address) => {
                    let address = address.to_string();
                    self.tab = InspectorTab::State;
                    Action::Dispatch(RuntimeCommand::FetchState { address })
                }
                None => no_contract(),
            },
            Command::Probe => match self.current_contract() {
                Some(address) => {
                    let address = address.to_string();
                    self.tab = InspectorTab::Shapes;
                    Action::Dispatch(RuntimeCommand::Probe { address })
                }
                None => no_contract(),
            },
            Command::Use(address) => Action::Dispatch(RuntimeCommand::UseContract {
                address: address.clone(),
            }),
            Command::Query(msg) => match self.current_contract() {
                Some(address) => Action::Dispatch(RuntimeCommand::Query {
                    address: address.to_string(),
                    msg: msg.clone(),
                }),
                None => no_contract(),
            },
            Command::Exec(msg) => {
                if !self.wallet_connected() {
                    return Action::Notify(
                        "Connect a wallet before executing".to_string(),
                        NotifyLevel::Warn,
                    );
                }
                match self.current_contract() {
                    Some(contract) => Action::Dispatch(RuntimeCommand::Execute {
                        contract: contract.to_string(),
                        msg: msg.clone(),
                    }),
                    None => no_contract(),
                }
            }
            Command::Instantiate {
                code_id,
                label,
                msg,
            } => {
                if !self.wallet_connected() {
                    return Action::Notify(
                        "Connect a wallet before instantiating".to_string(),
                        NotifyLevel::Warn,
                    );
                }
                Action::Dispatch(RuntimeCommand::Instantiate {
                    code_id: *code_id,
                    label: label.clone(),
                    msg: msg.clone(),
                })
            }
            Command::Network(chain_id) => match self.networks.position(chain_id) {
                Some(index) => {
                    self.selected_network = index;
                    Action::Dispatch(RuntimeCommand::SelectNetwork {
                        chain_id: chain_id.clone(),
                    })
                }
                None => Action::Notify(format!("Unknown network: {}", chain_id), NotifyLevel::Error),
            },
            Command::Connect | Command::Reconnect => Action::Dispatch(RuntimeCommand::Connect),
            Command::Disconnect => Action::Dispatch(RuntimeCommand::Disconnect),
            Command::Balance => {
                if self.wallet_connected() {
                    Action::Dispatch(RuntimeCommand::RefreshBalance)
                } else {
                    Action::Notify("Wallet is not connected".to_string(), NotifyLevel::Warn)
                }
            }
            Command::Copy => match self.wallet.as_ref().filter(|w| !w.address.is_empty()) {
                Some(wallet) => Action::Copy(wallet.address.clone()),
                None => Action::Notify("No wallet address to copy".to_string(), NotifyLevel::Warn),
            },
            Command::Export(format) => Action::Export(*format),
            Command::Help => {
                self.help_open = true;
                Action::None
            }
            Command::Quit => Action::Quit,
            Command::Invalid(usage) => Action::Notify(usage.clone(), NotifyLevel::Warn),
            Command::Unknown(s) => Action::Notify(format!("Unknown command: {}", s), NotifyLevel::Warn),
        }
    }

    /// Apply an action returned by a command or module
    pub fn apply_action(&mut self, action: Action) {
        match action {
            Action::None => {}
            Action::Dispatch(cmd) => self.request(cmd),
            Action::Export(format) => {
                let action = self.export(format);
                self.apply_action(action);
            }
            Action::Copy(text) => self.pending_copy = Some(text),
            Action::Notify(msg, level) => self.set_status(msg, level.into()),
            Action::Quit => self.should_quit = true,
        }
    }

    fn export(&self, format: ExportFormat) -> Action {
        crate::modules::export::export_contract(self, format)
    }

    /// Queue a command for the worker
    pub fn request(&mut self, cmd: RuntimeCommand) {
        if cmd == RuntimeCommand::Connect || matches!(cmd, RuntimeCommand::SelectNetwork { .. }) {
            if let Some(wallet) = self.wallet.as_mut() {
                wallet.initializing = true;
            }
        }
        self.pending_commands.push(cmd);
    }

    pub fn take_commands(&mut self) -> Vec<RuntimeCommand> {
        std::mem::take(&mut self.pending_commands)
    }

    pub fn take_copy_request(&mut self) -> Option<String> {
        self.pending_copy.take()
    }

    /// Fold a worker event into the view state
    pub fn apply_event(&mut self, event: RuntimeEvent) {
        match event {
            RuntimeEvent::Wallet(snapshot) => self.wallet = Some(snapshot),
            RuntimeEvent::Public(snapshot) => {
                self.follow_network(&snapshot.chain_id);
                self.public = Some(snapshot);
            }
            RuntimeEvent::ContractAddress { address } => self.contract_address = address,
            RuntimeEvent::ContractLoaded { contract } => {
                if self.contract.as_ref().map(|c| c.address.as_str()) != Some(contract.address.as_str()) {
                    self.state_entries.clear();
                    self.selected_state = 0;
                    self.query_shape = None;
                    self.execute_shape = None;
                }
                self.set_status(
                    format!("Loaded {} (code {})", contract.label, contract.code_id),
                    StatusLevel::Info,
                );
                self.contract = Some(contract);
                self.tab = InspectorTab::Info;
            }
            RuntimeEvent::ContractsListed { listing } => {
                let text = format!(
                    "{} contracts instantiated from code {}",
                    listing.contracts.len(),
                    listing.code_id
                );
                self.set_status(text, StatusLevel::Info);
                self.listing = Some(listing);
                self.selected_contract = 0;
                self.focus = Focus::Contracts;
            }
            RuntimeEvent::CodesReady { summary } => {
                let text = match (summary.latest_code_id, summary.total) {
                    (Some(latest), Some(total)) => {
                        format!("Latest code id {} ({} codes stored)", latest, total)
                    }
                    (Some(latest), None) => format!("Latest code id {}", latest),
                    _ => "No codes stored on this chain".to_string(),
                };
                self.set_status(text, StatusLevel::Info);
                self.codes = Some(summary);
            }
            RuntimeEvent::StateReady { address, entries } => {
                if self.current_contract() == Some(address.as_str()) {
                    self.state_entries = entries;
                    self.selected_state = 0;
                }
            }
            RuntimeEvent::ShapesReady {
                address,
                query,
                execute,
            } => {
                if self.current_contract() == Some(address.as_str()) {
                    self.query_shape = Some(query);
                    self.execute_shape = Some(execute);
                }
            }
            RuntimeEvent::QueryResult { address, response } => {
                self.result = Some(CallResult::Query { address, response });
                self.tab = InspectorTab::Result;
            }
            RuntimeEvent::TxResult { summary } => {
                self.set_status(
                    format!("{} included in {}", summary.action, summary.transaction_hash),
                    StatusLevel::Success,
                );
                self.result = Some(CallResult::Tx(summary));
                self.tab = InspectorTab::Result;
            }
            RuntimeEvent::Notice(Notice { level, message }) => self.set_status(message, level.into()),
            RuntimeEvent::Error { message } => self.set_status(message, StatusLevel::Error),
        }
    }

    /// Track the chain the worker reports; contract views of another chain are dropped
    fn follow_network(&mut self, chain_id: &str) {
        let Some(index) = self.networks.position(chain_id) else {
            return;
        };
        if index == self.active_network {
            return;
        }
        self.active_network = index;
        self.selected_network = index;
        self.contract = None;
        self.state_entries.clear();
        self.query_shape = None;
        self.execute_shape = None;
        self.listing = None;
        self.codes = None;
        self.result = None;
        self.selected_contract = 0;
        self.selected_state = 0;
    }

    pub fn cycle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Networks => Focus::Contracts,
            Focus::Contracts => Focus::Inspector,
            Focus::Inspector | Focus::Command => Focus::Networks,
        };
    }

    pub fn cycle_tab(&mut self, forward: bool) {
        let len = InspectorTab::ALL.len();
        let idx = self.tab.index();
        let next = if forward {
            (idx + 1) % len
        } else {
            (idx + len - 1) % len
        };
        self.tab = InspectorTab::ALL[next];
    }

    pub fn set_tab(&mut self, tab: InspectorTab) {
        self.tab = tab;
        self.focus = Focus::Inspector;
    }

    pub fn move_selection_up(&mut self) {
        match self.focus {
            Focus::Networks => self.selected_network = self.selected_network.saturating_sub(1),
            Focus::Contracts => self.selected_contract = self.selected_contract.saturating_sub(1),
            Focus::Inspector if self.tab == InspectorTab::State => {
                self.selected_state = self.selected_state.saturating_sub(1)
            }
            _ => {}
        }
    }

    pub fn move_selection_down(&mut self) {
        match self.focus {
            Focus::Networks => {
                if self.selected_network + 1 < self.networks.len() {
                    self.selected_network += 1;
                }
            }
            Focus::Contracts => {
                let len = self.listing.as_ref().map(|l| l.contracts.len()).unwrap_or(0);
                if self.selected_contract + 1 < len {
                    self.selected_contract += 1;
                }
            }
            Focus::Inspector if self.tab == InspectorTab::State => {
                if self.selected_state + 1 < self.state_entries.len() {
                    self.selected_state += 1;
                }
            }
            _ => {}
        }
    }

    /// Enter on the focused list: switch network or open the highlighted contract
    pub fn activate_selection(&mut self) {
        match self.focus {
            Focus::Networks => {
                if self.selected_network == self.active_network {
                    self.set_status("Already on this network", StatusLevel::Info);
                    return;
                }
                if let Some(network) = self.networks.get(self.selected_network) {
                    let chain_id = network.chain_id.clone();
                    self.request(RuntimeCommand::SelectNetwork { chain_id });
                }
            }
            Focus::Contracts => {
                if let Some(address) = self.selected_listed_contract().map(str::to_string) {
                    self.tab = InspectorTab::Info;
                    self.focus = Focus::Inspector;
                    self.request(RuntimeCommand::LookupContract { address });
                }
            }
            _ => {}
        }
    }

    /// Reload metadata, state and shapes of the current contract
    pub fn refresh_contract(&mut self) {
        match self.current_contract().map(str::to_string) {
            Some(address) => self.request(RuntimeCommand::LookupContract { address }),
            None => self.set_status("No contract selected", StatusLevel::Warn),
        }
    }
}

fn no_contract() -> Action {
    Action::Notify(
        "No contract selected; use `contract <address>` or `use <address>`".to_string(),
        NotifyLevel::Warn,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn app() -> App {
        let networks = NetworkList::default();
        App::new(networks, 3)
    }

    fn contract(address: &str) -> Contract {
        Contract {
            address: address.to_string(),
            code_id: 9,
            creator: "juno1creator".to_string(),
            admin: None,
            label: "counter".to_string(),
            ibc_port_id: None,
        }
    }

    fn submit(app: &mut App, line: &str) {
        app.enter_command();
        app.command.input = line.to_string();
        app.apply_command();
    }

    #[test]
    fn test_contract_command_dispatches_lookup() {
        let mut app = app();
        submit(&mut app, "contract juno1abc");
        assert_eq!(
            app.take_commands(),
            vec![RuntimeCommand::LookupContract {
                address: "juno1abc".to_string()
            }]
        );
        assert_eq!(app.command.last.as_deref(), Some("contract juno1abc"));
        assert_eq!(app.input_mode, InputMode::Normal);
    }

    #[test]
    fn test_query_needs_a_contract() {
        let mut app = app();
        submit(&mut app, r#"query {"get_count":{}}"#);
        assert!(app.take_commands().is_empty());
        assert_eq!(app.status_text().map(|(_, level)| level), Some(StatusLevel::Warn));

        app.apply_event(RuntimeEvent::ContractAddress {
            address: Some("juno1remembered".to_string()),
        });
        submit(&mut app, r#"query {"get_count":{}}"#);
        assert_eq!(
            app.take_commands(),
            vec![RuntimeCommand::Query {
                address: "juno1remembered".to_string(),
                msg: json!({"get_count": {}}),
            }]
        );
    }

    #[test]
    fn test_exec_requires_wallet() {
        let mut app = app();
        app.apply_event(RuntimeEvent::ContractLoaded {
            contract: contract("juno1c"),
        });
        submit(&mut app, r#"exec {"increment":{}}"#);
        assert!(app.take_commands().is_empty());
        assert_eq!(
            app.status_text().map(|(text, _)| text),
            Some("Connect a wallet before executing")
        );
    }

    #[test]
    fn test_state_and_shapes_follow_current_contract() {
        let mut app = app();
        app.apply_event(RuntimeEvent::ContractLoaded {
            contract: contract("juno1c"),
        });
        app.apply_event(RuntimeEvent::StateReady {
            address: "juno1other".to_string(),
            entries: vec![StateEntry::new(b"k".to_vec(), b"v".to_vec())],
        });
        assert!(app.state_entries.is_empty());

        app.apply_event(RuntimeEvent::StateReady {
            address: "juno1c".to_string(),
            entries: vec![StateEntry::new(b"k".to_vec(), b"v".to_vec())],
        });
        app.apply_event(RuntimeEvent::ShapesReady {
            address: "juno1c".to_string(),
            query: MessageShape::Variants(vec!["get_count".to_string()]),
            execute: MessageShape::Unavailable("no signer".to_string()),
        });
        assert_eq!(app.state_entries.len(), 1);
        assert_eq!(app.query_shape.as_ref().map(|s| s.variants().len()), Some(1));

        // Loading another contract drops the old views
        app.apply_event(RuntimeEvent::ContractLoaded {
            contract: contract("juno1d"),
        });
        assert!(app.state_entries.is_empty());
        assert!(app.query_shape.is_none());
    }

    #[test]
    fn test_network_switch_clears_contract_views() {
        let mut app = app();
        app.apply_event(RuntimeEvent::ContractLoaded {
            contract: contract("juno1c"),
        });
        submit(&mut app, "network juno-1");
        assert_eq!(
            app.take_commands(),
            vec![RuntimeCommand::SelectNetwork {
                chain_id: "juno-1".to_string()
            }]
        );

        app.apply_event(RuntimeEvent::Public(PublicSnapshot {
            chain_id: "juno-1".to_string(),
            name: "Juno".to_string(),
            network: "https://lcd".to_string(),
            initialized: true,
            initializing: false,
            connected: true,
        }));
        assert_eq!(app.network().chain_id, "juno-1");
        assert!(app.contract.is_none());

        submit(&mut app, "network nowhere-1");
        assert!(app.take_commands().is_empty());
        assert_eq!(app.status_text().map(|(_, level)| level), Some(StatusLevel::Error));
    }

    #[test]
    fn test_cycle_tab_wraps() {
        let mut app = app();
        app.cycle_tab(false);
        assert_eq!(app.tab, InspectorTab::Result);
        app.cycle_tab(true);
        assert_eq!(app.tab, InspectorTab::Info);
    }

    #[test]
    fn test_listing_enter_opens_contract() {
        let mut app = app();
        app.apply_event(RuntimeEvent::ContractsListed {
            listing: CodeListing::new(3, vec!["juno1a".into(), "juno1b".into()]),
        });
        assert_eq!(app.focus, Focus::Contracts);
        app.move_selection_down();
        app.move_selection_down();
        app.activate_selection();
        assert_eq!(
            app.take_commands(),
            vec![RuntimeCommand::LookupContract {
                address: "juno1b".to_string()
            }]
        );
    }

    #[test]
    fn test_status_expires() {
        let mut app = app();
        app.set_status("hello", StatusLevel::Info);
        app.on_tick();
        assert!(app.status.is_some());
        if let Some(status) = app.status.as_mut() {
            status.since = Instant::now() - Duration::from_secs(4);
        }
        app.on_tick();
        assert!(app.status.is_none());
    }
}
