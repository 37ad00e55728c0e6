use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Tabs, Wrap};
use ratatui::Frame;

pub mod layout;

use crate::app::{App, CallResult, Focus, InputMode, InspectorTab, StatusLevel};
use crate::core::HELP_LINES;
use crate::domain::contract::short_address;
use crate::domain::network::{display_denom, format_amount};
use crate::domain::shape::{MessageShape, ProbeKind};

pub fn draw(f: &mut Frame, app: &App) {
    let areas = layout::areas(f.size());

    draw_header(f, areas.header, app);
    draw_networks(f, areas.networks, app);
    draw_wallet(f, areas.wallet, app);
    draw_contracts(f, areas.contracts, app);
    draw_inspector(f, areas.inspector, app);
    draw_status_line(f, areas.status_line, app);
    draw_command_line(f, areas.command_line, app);

    if app.help_open {
        draw_help_popup(f, areas.size);
    }
}

fn label_style() -> Style {
    Style::default().fg(Color::DarkGray)
}

fn key_style() -> Style {
    Style::default().fg(Color::LightCyan)
}

fn border_style(app: &App, focus: Focus) -> Style {
    if app.focus == focus {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    }
}

fn highlight_style(app: &App, focus: Focus) -> Style {
    if app.focus == focus {
        Style::default()
            .fg(Color::Black)
            .bg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().add_modifier(Modifier::BOLD)
    }
}

fn draw_header(f: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    let network = app.network();
    let (public_text, public_color) = match app.public.as_ref() {
        Some(public) if public.initializing => ("connecting", Color::LightYellow),
        Some(public) if public.connected => ("online", Color::LightGreen),
        Some(_) => ("offline", Color::LightRed),
        None => ("connecting", Color::LightYellow),
    };
    let title = Line::from(vec![
        Span::styled(
            "Contract Spy",
            Style::default()
                .fg(Color::LightCyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled("Network", label_style()),
        Span::raw(format!(" {} ", network.label())),
        Span::styled(public_text, Style::default().fg(public_color)),
        Span::raw("  "),
        Span::styled("LCD", label_style()),
        Span::raw(format!(" {}", network.endpoint())),
    ]);
    let left = Paragraph::new(title)
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Left);

    let wallet_line = match app.wallet.as_ref() {
        _ if app.wallet_initializing() => Line::from(vec![
            Span::styled("Wallet ", label_style()),
            Span::styled("initializing…", Style::default().fg(Color::LightYellow)),
        ]),
        Some(wallet) if wallet.initialized => Line::from(vec![
            Span::styled("Wallet ", label_style()),
            Span::styled(wallet.display_name(), Style::default().fg(Color::LightGreen)),
            Span::raw("  "),
            Span::styled("Client ", label_style()),
            Span::raw(wallet.client_kind.unwrap_or("--")),
        ]),
        _ => Line::from(vec![
            Span::styled("Wallet ", label_style()),
            Span::raw("not connected"),
        ]),
    };
    let right = Paragraph::new(wallet_line)
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Left);

    f.render_widget(left, chunks[0]);
    f.render_widget(right, chunks[1]);
}

fn draw_networks(f: &mut Frame, area: Rect, app: &App) {
    let items: Vec<ListItem> = app
        .networks
        .items()
        .iter()
        .enumerate()
        .map(|(idx, network)| {
            let active = idx == app.active_network;
            let mut spans = vec![
                Span::raw(network.chain_name.clone()),
                Span::styled(format!(" {}", network.chain_id), label_style()),
            ];
            if active {
                spans.push(Span::raw(" *"));
            }
            let style = if active {
                Style::default()
                    .fg(Color::LightCyan)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            ListItem::new(Line::from(spans)).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Networks")
                .border_style(border_style(app, Focus::Networks)),
        )
        .highlight_style(highlight_style(app, Focus::Networks))
        .highlight_symbol(">> ");

    let mut state = ListState::default();
    state.select(Some(app.selected_network));
    f.render_stateful_widget(list, area, &mut state);
}

fn draw_wallet(f: &mut Frame, area: Rect, app: &App) {
    let lines = wallet_lines(app);
    let paragraph = Paragraph::new(Text::from(lines))
        .block(Block::default().borders(Borders::ALL).title("Wallet"))
        .wrap(Wrap { trim: true });
    f.render_widget(paragraph, area);
}

fn wallet_lines(app: &App) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    let wallet = app.wallet.as_ref().filter(|wallet| wallet.initialized);

    match wallet {
        _ if app.wallet_initializing() => {
            lines.push(Line::from(Span::styled(
                "Connecting…",
                Style::default().fg(Color::LightYellow),
            )));
        }
        Some(wallet) => {
            lines.push(Line::from(vec![
                Span::styled("Name ", label_style()),
                Span::raw(wallet.display_name()),
            ]));
            lines.push(Line::from(vec![
                Span::styled("Addr ", label_style()),
                Span::raw(short_address(&wallet.address)),
            ]));
            lines.push(Line::from(vec![
                Span::styled("Acct ", label_style()),
                Span::raw(wallet.account_number.to_string()),
            ]));
            if wallet.balances.is_empty() {
                lines.push(Line::from(Span::styled("No balances", label_style())));
            }
            for coin in &wallet.balances {
                let amount = match wallet.network.coin_map.get(&coin.denom) {
                    Some(mapped) => format_amount(&coin.amount, mapped),
                    None => format!("{} {}", coin.amount, display_denom(&coin.denom)),
                };
                lines.push(Line::from(format!("  {}", amount)));
            }
            lines.push(Line::from(""));
            lines.push(Line::from(vec![
                Span::styled("R", key_style()),
                Span::raw(" Reconnect  "),
                Span::styled("x", key_style()),
                Span::raw(" Disconnect  "),
                Span::styled("y", key_style()),
                Span::raw(" Copy"),
            ]));
        }
        None => {
            lines.push(Line::from("Wallet is not connected"));
            lines.push(Line::from(""));
            lines.push(Line::from(vec![
                Span::styled("c", key_style()),
                Span::raw(" Connect  "),
                Span::styled("K", key_style()),
                Span::raw(" Reload key"),
            ]));
        }
    }
    lines
}

fn draw_contracts(f: &mut Frame, area: Rect, app: &App) {
    let title = match app.listing.as_ref() {
        Some(listing) => format!("Contracts of code {} ({})", listing.code_id, listing.contracts.len()),
        None => "Contracts".to_string(),
    };

    let items: Vec<ListItem> = match app.listing.as_ref() {
        Some(listing) if !listing.contracts.is_empty() => listing
            .numbered()
            .map(|(number, address)| {
                let current = app.current_contract() == Some(address);
                let style = if current {
                    Style::default().fg(Color::LightCyan)
                } else {
                    Style::default().fg(Color::White)
                };
                ListItem::new(Line::from(vec![
                    Span::styled(format!("{:>3} ", number), label_style()),
                    Span::raw(address.to_string()),
                ]))
                .style(style)
            })
            .collect(),
        Some(_) => vec![ListItem::new("No contracts for this code id")],
        None => vec![ListItem::new(Line::from(vec![
            Span::styled(":code <id>", key_style()),
            Span::raw(" to list contracts"),
        ]))],
    };

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .border_style(border_style(app, Focus::Contracts)),
        )
        .highlight_style(highlight_style(app, Focus::Contracts))
        .highlight_symbol(">> ");

    let mut state = ListState::default();
    if app.selected_listed_contract().is_some() {
        state.select(Some(app.selected_contract));
    }
    f.render_stateful_widget(list, area, &mut state);
}

fn draw_inspector(f: &mut Frame, area: Rect, app: &App) {
    let title = match app.current_contract() {
        Some(address) => format!("Inspector: {}", short_address(address)),
        None => "Inspector".to_string(),
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(border_style(app, Focus::Inspector));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(0)])
        .split(inner);

    let titles: Vec<Line> = InspectorTab::ALL
        .iter()
        .map(|tab| {
            Line::from(vec![
                Span::styled(format!("{}:", tab.shortcut()), label_style()),
                Span::raw(tab.title()),
            ])
        })
        .collect();
    let selected = InspectorTab::ALL
        .iter()
        .position(|tab| *tab == app.tab)
        .unwrap_or(0);
    let tabs = Tabs::new(titles)
        .select(selected)
        .style(Style::default().fg(Color::White))
        .highlight_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .divider(" │ ");
    f.render_widget(tabs, chunks[0]);

    match app.tab {
        InspectorTab::State => draw_state(f, chunks[1], app),
        tab => {
            let mut lines = match tab {
                InspectorTab::Info => info_lines(app),
                InspectorTab::Shapes => shape_lines(app),
                _ => result_lines(app),
            };
            if lines.is_empty() {
                lines.push(Line::from("No data"));
            }
            let paragraph = Paragraph::new(Text::from(lines)).wrap(Wrap { trim: false });
            f.render_widget(paragraph, chunks[1]);
        }
    }
}

fn field(label: &str, value: impl Into<String>) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{:<9}", label), label_style()),
        Span::raw(value.into()),
    ])
}

fn info_lines(app: &App) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    match app.contract.as_ref() {
        Some(contract) => {
            lines.push(field("Address", contract.address.clone()));
            lines.push(field("Label", contract.label.clone()));
            lines.push(field("Code id", contract.code_id.to_string()));
            lines.push(field("Creator", contract.creator.clone()));
            lines.push(field(
                "Admin",
                contract.admin.clone().unwrap_or_else(|| "none".to_string()),
            ));
            if let Some(port) = contract.ibc_port_id.as_ref() {
                lines.push(field("IBC port", port.clone()));
            }
            lines.push(field("Entries", app.state_entries.len().to_string()));
        }
        None => {
            lines.push(Line::from("No contract loaded"));
            lines.push(Line::from(vec![
                Span::raw("Run "),
                Span::styled(":contract <address>", key_style()),
                Span::raw(" or pick one from a code listing"),
            ]));
            if let Some(address) = app.contract_address.as_ref() {
                lines.push(Line::from(""));
                lines.push(field("Current", address.clone()));
            }
        }
    }
    if let Some(codes) = app.codes.as_ref() {
        lines.push(Line::from(""));
        let latest = codes
            .latest_code_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "--".to_string());
        lines.push(field("Latest", format!("code {}", latest)));
        if let Some(total) = codes.total {
            lines.push(field("Codes", total.to_string()));
        }
    }
    lines
}

fn draw_state(f: &mut Frame, area: Rect, app: &App) {
    if app.state_entries.is_empty() {
        let text = if app.contract.is_some() {
            "Contract storage is empty"
        } else {
            "No state loaded"
        };
        f.render_widget(Paragraph::new(text), area);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(7)])
        .split(area);

    let items: Vec<ListItem> = app
        .state_entries
        .iter()
        .map(|entry| {
            ListItem::new(Line::from(vec![
                Span::styled(truncate_str(&entry.key_text(), 24), key_style()),
                Span::raw("  "),
                Span::raw(truncate_str(&entry.value_text(), 64)),
            ]))
        })
        .collect();
    let list = List::new(items)
        .highlight_style(highlight_style(app, Focus::Inspector))
        .highlight_symbol("> ");
    let mut state = ListState::default();
    state.select(Some(app.selected_state.min(app.state_entries.len() - 1)));
    f.render_stateful_widget(list, chunks[0], &mut state);

    let mut detail = Vec::new();
    if let Some(entry) = app.state_entries.get(app.selected_state) {
        detail.push(field("Key hex", entry.key_hex()));
        match entry.value_json() {
            Some(value) => {
                let compact = serde_json::to_string(&value).unwrap_or_default();
                detail.push(field("JSON", compact));
            }
            None => detail.push(field("Value hex", entry.value_hex())),
        }
    }
    let paragraph = Paragraph::new(Text::from(detail))
        .block(Block::default().borders(Borders::TOP).title("Entry"))
        .wrap(Wrap { trim: false });
    f.render_widget(paragraph, chunks[1]);
}

fn shape_lines(app: &App) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for (kind, shape) in [
        (ProbeKind::Query, app.query_shape.as_ref()),
        (ProbeKind::Execute, app.execute_shape.as_ref()),
    ] {
        lines.push(Line::from(Span::styled(
            kind.title(),
            Style::default().add_modifier(Modifier::BOLD),
        )));
        match shape {
            Some(MessageShape::Variants(variants)) if !variants.is_empty() => {
                for variant in variants {
                    lines.push(Line::from(format!("  {{\"{}\": {{…}}}}", variant)));
                }
            }
            Some(shape) => lines.push(Line::from(format!("  {}", shape.summary()))),
            None => lines.push(Line::from(Span::styled("  not probed", label_style()))),
        }
        lines.push(Line::from(""));
    }
    lines
}

fn result_lines(app: &App) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    match app.result.as_ref() {
        Some(CallResult::Query { address, response }) => {
            lines.push(field("Query", short_address(address)));
            lines.push(Line::from(""));
            let pretty = serde_json::to_string_pretty(response).unwrap_or_default();
            lines.extend(pretty.lines().map(|line| Line::from(line.to_string())));
        }
        Some(CallResult::Tx(summary)) => {
            lines.push(field("Action", summary.action.clone()));
            lines.push(field("Tx hash", summary.transaction_hash.clone()));
            if let Some(address) = summary.contract_address.as_ref() {
                lines.push(field("Contract", address.clone()));
            }
            if let Some(gas) = summary.gas_used {
                lines.push(field("Gas used", gas.to_string()));
            }
        }
        None => {
            lines.push(Line::from(vec![
                Span::styled(":query <json>", key_style()),
                Span::raw(" or "),
                Span::styled(":exec <json>", key_style()),
                Span::raw(" to call the contract"),
            ]));
        }
    }
    lines
}

fn draw_status_line(f: &mut Frame, area: Rect, app: &App) {
    let contract = app
        .current_contract()
        .map(short_address)
        .unwrap_or_else(|| "--".to_string());
    let mut spans = vec![
        Span::styled("Chain ", label_style()),
        Span::raw(format!("{}  ", app.network().chain_id)),
        Span::styled("Contract ", label_style()),
        Span::raw(format!("{}  ", contract)),
        Span::styled("Tab ", label_style()),
        Span::raw(app.tab.title()),
    ];
    if let Some(last) = app.command.last.as_ref() {
        spans.push(Span::raw("  "));
        spans.push(Span::styled("Last ", label_style()));
        spans.push(Span::raw(truncate_str(last, 40)));
    }

    let paragraph = Paragraph::new(Line::from(spans))
        .style(Style::default().fg(Color::White))
        .alignment(Alignment::Left);
    f.render_widget(paragraph, area);
}

/// Get command hint for autocompletion
fn command_hint(input: &str) -> Option<&'static str> {
    let input = input.trim().to_lowercase();
    let word = input.split_whitespace().next()?;
    HELP_LINES
        .iter()
        .find(|(usage, _)| usage.starts_with(word))
        .map(|(usage, _)| *usage)
}

fn draw_command_line(f: &mut Frame, area: Rect, app: &App) {
    let content = match app.input_mode {
        InputMode::Command => {
            let hint = command_hint(&app.command.input).unwrap_or("contract | code | query | exec | help");
            Line::from(vec![
                Span::styled(": ", Style::default().fg(Color::Yellow)),
                Span::raw(app.command.input.clone()),
                Span::styled(format!("  {}", hint), label_style()),
            ])
        }
        InputMode::Normal => {
            if let Some((text, level)) = app.status_text() {
                let color = match level {
                    StatusLevel::Info => Color::LightCyan,
                    StatusLevel::Success => Color::LightGreen,
                    StatusLevel::Warn => Color::LightYellow,
                    StatusLevel::Error => Color::LightRed,
                };
                Line::from(vec![
                    Span::styled("msg: ", label_style()),
                    Span::styled(text.to_string(), Style::default().fg(color)),
                ])
            } else {
                action_hints()
            }
        }
    };

    let paragraph = Paragraph::new(content).style(Style::default().fg(Color::White));
    f.render_widget(paragraph, area);
}

fn action_hints() -> Line<'static> {
    let hints = [
        (":", "Command"),
        ("Tab", "Focus"),
        ("Enter", "Open"),
        ("1-4", "Tabs"),
        ("r", "Reload"),
        ("c", "Connect"),
        ("?", "Help"),
        ("q", "Quit"),
    ];
    let mut spans = Vec::new();
    for (key, label) in hints {
        spans.push(Span::styled(key, key_style()));
        spans.push(Span::raw(format!(" {}  ", label)));
    }
    Line::from(spans)
}

fn draw_help_popup(f: &mut Frame, area: Rect) {
    let popup_area = centered_rect(72, 70, area);
    f.render_widget(Clear, popup_area);

    let mut lines = vec![
        Line::from("Keys"),
        Line::from("  Tab        Cycle focus"),
        Line::from("  j / k      Move selection"),
        Line::from("  [ / ] 1-4  Inspector tabs"),
        Line::from("  Enter      Switch network / open contract"),
        Line::from("  : or /     Command line (Up recalls last)"),
        Line::from("  r          Reload current contract"),
        Line::from("  c / R / x  Connect / reconnect / disconnect"),
        Line::from("  K          Reload wallet key"),
        Line::from("  y          Copy wallet address"),
        Line::from("  ?          Toggle help"),
        Line::from("  q          Quit"),
        Line::from(""),
        Line::from("Commands"),
    ];
    for (usage, description) in HELP_LINES {
        lines.push(Line::from(vec![
            Span::styled(format!("  {:<32}", usage), key_style()),
            Span::raw(*description),
        ]));
    }

    let paragraph = Paragraph::new(Text::from(lines))
        .block(Block::default().title("Help").borders(Borders::ALL))
        .alignment(Alignment::Left)
        .wrap(Wrap { trim: false });

    f.render_widget(paragraph, popup_area);
}

fn truncate_str(value: &str, max: usize) -> String {
    if value.chars().count() <= max {
        return value.to_string();
    }
    value.chars().take(max).collect::<String>() + "…"
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
