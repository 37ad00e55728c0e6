use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::Parser;
use crossterm::event::{
    self, DisableFocusChange, DisableMouseCapture, EnableFocusChange, EnableMouseCapture, Event,
    KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing::{info, warn};

use contract_spy::app::{App, Focus, InputMode, InspectorTab, StatusLevel};
use contract_spy::config;
use contract_spy::domain::network::{NetworkList, NetworkListItem};
use contract_spy::infrastructure::cosmos::{KeyringWallet, RestClientFactory};
use contract_spy::infrastructure::runtime::{RuntimeBridge, RuntimeCommand, RuntimeConfig};
use contract_spy::store::SessionStore;
use contract_spy::ui;

#[derive(Debug, Parser)]
#[command(
    name = "contract-spy",
    version,
    about = "Contract Spy: inspect CosmWasm contracts from the terminal"
)]
struct Args {
    /// Chain id to start on (e.g. uni-5, juno-1)
    #[arg(long)]
    network: Option<String>,

    /// LCD endpoint overriding the selected network's (e.g. http://localhost:1317)
    #[arg(long)]
    rest: Option<String>,

    /// Contract to load at startup
    #[arg(long)]
    contract: Option<String>,

    /// File holding the hex secp256k1 wallet key
    #[arg(long)]
    key_file: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = config::load();

    if let Some(path) = config.log_path() {
        if let Err(err) = config::log::init(config.log.level, &path) {
            eprintln!("logging disabled: {err:#}");
        }
    }

    let networks = networks_from_args_and_config(&args, &config)?;
    let network = select_network(&args, &config, &networks)?;
    let active = networks.position(&network.chain_id).unwrap_or(0);
    info!(chain_id = %network.chain_id, endpoint = %network.endpoint(), "starting");

    let session = open_session()?;
    let factory = Arc::new(RestClientFactory::new().context("build HTTP client")?);
    let provider = Arc::new(KeyringWallet::new(
        args.key_file.clone().or_else(|| config.key_file()),
        config.wallet.name.clone(),
    ));

    let runtime = RuntimeBridge::new(RuntimeConfig {
        networks: networks.clone(),
        network,
        factory,
        provider,
        session,
    })?;

    let mut app = App::new(networks, active);
    app.set_status("Connecting…", StatusLevel::Info);
    app.request(RuntimeCommand::Startup);
    if let Some(address) = args.contract.clone() {
        app.request(RuntimeCommand::UseContract {
            address: address.clone(),
        });
        app.request(RuntimeCommand::LookupContract { address });
        app.focus = Focus::Inspector;
    }

    let mut stdout = io::stdout();
    enable_raw_mode()?;
    execute!(
        stdout,
        EnterAlternateScreen,
        EnableMouseCapture,
        EnableFocusChange
    )?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app, runtime);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture,
        DisableFocusChange
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("{err:?}");
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    mut app: App,
    runtime: RuntimeBridge,
) -> Result<()> {
    let tick_rate = Duration::from_millis(200);
    let mut last_tick = Instant::now();

    loop {
        pump_background(&mut app, &runtime);
        terminal.draw(|f| ui::draw(f, &app))?;
        if app.should_quit {
            let _ = runtime.send(RuntimeCommand::Shutdown);
            return Ok(());
        }

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) => handle_key(&mut app, key),
                Event::Mouse(mouse) => handle_mouse(&mut app, mouse),
                Event::FocusGained => app.request(RuntimeCommand::Focus),
                _ => {}
            }
        }

        if last_tick.elapsed() >= tick_rate {
            app.on_tick();
            last_tick = Instant::now();
        }

        pump_background(&mut app, &runtime);
    }
}

fn pump_background(app: &mut App, runtime: &RuntimeBridge) {
    for event in runtime.poll_events() {
        app.apply_event(event);
    }

    for cmd in app.take_commands() {
        if let Err(err) = runtime.send(cmd) {
            app.set_status(format!("{err}"), StatusLevel::Error);
        }
    }

    if let Some(text) = app.take_copy_request() {
        copy_to_clipboard(app, text);
    }
}

/// Config networks with `--rest` applied to the chosen chain
fn networks_from_args_and_config(args: &Args, config: &config::Config) -> Result<NetworkList> {
    let mut networks = config.network_list();
    if let Some(rest) = args.rest.as_deref() {
        let mut network = select_network(args, config, &networks)?;
        network.rest_url = Some(normalize_http_endpoint(rest));
        networks.merge([network]);
    }
    Ok(networks)
}

fn select_network(
    args: &Args,
    config: &config::Config,
    networks: &NetworkList,
) -> Result<NetworkListItem> {
    let requested = args.network.as_deref().or(config.network.as_deref());
    match requested {
        Some(chain_id) => match networks.find(chain_id) {
            Some(network) => Ok(network.clone()),
            None => {
                let known: Vec<&str> = networks
                    .items()
                    .iter()
                    .map(|item| item.chain_id.as_str())
                    .collect();
                bail!("unknown network {chain_id}; known: {}", known.join(", "))
            }
        },
        None => Ok(networks.default_wallet()),
    }
}

fn normalize_http_endpoint(endpoint: &str) -> String {
    let trimmed = endpoint.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("http://{trimmed}")
    }
}

/// Session database under the data dir; falls back to memory when it cannot be opened
fn open_session() -> Result<SessionStore> {
    let opened = match config::session_db_path() {
        Some(path) => SessionStore::open(&path)
            .with_context(|| format!("open session db {}", path.display())),
        None => Err(anyhow::anyhow!("no data directory")),
    };
    match opened {
        Ok(store) => Ok(store),
        Err(err) => {
            warn!(error = %format!("{err:#}"), "session will not survive restarts");
            SessionStore::in_memory().context("open in-memory session")
        }
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    if key.kind != KeyEventKind::Press {
        return;
    }

    if app.help_open {
        if matches!(key.code, KeyCode::Char('?') | KeyCode::Esc | KeyCode::Char('q')) {
            app.help_open = false;
        }
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Command => handle_command_mode(app, key),
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match (key.code, key.modifiers) {
        (KeyCode::Char('c'), mods) if mods.contains(KeyModifiers::CONTROL) => {
            app.should_quit = true
        }
        (KeyCode::Char('q'), _) => app.should_quit = true,
        (KeyCode::Char('?'), _) => app.help_open = true,
        (KeyCode::Char(':') | KeyCode::Char('/'), _) => app.enter_command(),
        (KeyCode::Tab, _) => app.cycle_focus(),
        (KeyCode::Enter, _) => app.activate_selection(),
        (KeyCode::Esc, _) => app.focus = Focus::Networks,
        (KeyCode::Up | KeyCode::Char('k'), _) => app.move_selection_up(),
        (KeyCode::Down | KeyCode::Char('j'), _) => app.move_selection_down(),
        (KeyCode::Char('['), _) => app.cycle_tab(false),
        (KeyCode::Char(']'), _) => app.cycle_tab(true),
        (KeyCode::Char('1'), _) => app.set_tab(InspectorTab::Info),
        (KeyCode::Char('2'), _) => app.set_tab(InspectorTab::State),
        (KeyCode::Char('3'), _) => app.set_tab(InspectorTab::Shapes),
        (KeyCode::Char('4'), _) => app.set_tab(InspectorTab::Result),
        (KeyCode::Char('r'), _) => app.refresh_contract(),
        (KeyCode::Char('c'), _) | (KeyCode::Char('R'), _) => app.request(RuntimeCommand::Connect),
        (KeyCode::Char('x'), _) => app.request(RuntimeCommand::Disconnect),
        (KeyCode::Char('K'), _) => app.request(RuntimeCommand::KeystoreChange),
        (KeyCode::Char('b'), _) => {
            if app.wallet_connected() {
                app.request(RuntimeCommand::RefreshBalance);
            } else {
                app.set_status("Wallet is not connected", StatusLevel::Warn);
            }
        }
        (KeyCode::Char('y'), _) => {
            let address = app
                .wallet
                .as_ref()
                .map(|wallet| wallet.address.clone())
                .filter(|address| !address.is_empty());
            match address {
                Some(address) => copy_to_clipboard(app, address),
                None => app.set_status("Nothing to copy", StatusLevel::Warn),
            }
        }
        _ => {}
    }
}

fn handle_command_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.exit_command(),
        KeyCode::Enter => app.apply_command(),
        KeyCode::Up => app.recall_command(),
        KeyCode::Backspace => {
            app.command.input.pop();
        }
        KeyCode::Char(ch) => {
            if key.modifiers.contains(KeyModifiers::CONTROL) {
                return;
            }
            app.command.input.push(ch);
        }
        _ => {}
    }
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    if app.help_open || app.input_mode == InputMode::Command {
        return;
    }
    let Ok((width, height)) = crossterm::terminal::size() else {
        return;
    };
    let areas = ui::layout::areas(ratatui::layout::Rect::new(0, 0, width, height));
    let (col, row) = (mouse.column, mouse.row);

    let target = if ui::layout::contains(areas.networks, col, row) {
        Some(Focus::Networks)
    } else if ui::layout::contains(areas.contracts, col, row) {
        Some(Focus::Contracts)
    } else if ui::layout::contains(areas.inspector, col, row) {
        Some(Focus::Inspector)
    } else {
        None
    };
    let Some(target) = target else {
        return;
    };

    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => app.focus = target,
        MouseEventKind::ScrollUp => {
            app.focus = target;
            app.move_selection_up();
        }
        MouseEventKind::ScrollDown => {
            app.focus = target;
            app.move_selection_down();
        }
        _ => {}
    }
}

fn copy_to_clipboard(app: &mut App, text: String) {
    use arboard::Clipboard;

    match Clipboard::new() {
        Ok(mut clipboard) => {
            if clipboard.set_text(&text).is_ok() {
                app.set_status(format!("Copied: {}", text), StatusLevel::Info);
            } else {
                app.set_status("Failed to copy to clipboard", StatusLevel::Error);
            }
        }
        Err(_) => {
            app.set_status("Clipboard not available", StatusLevel::Error);
        }
    }
}
