//! Command parser for the : command system

use serde_json::Value;

use crate::core::action::ExportFormat;

/// Parsed command from user input
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    // Inspection
    Contract(String),
    Code(u64),
    Codes,
    State,
    Probe,
    Use(String),

    // Contract calls
    Query(Value),
    Exec(Value),
    Instantiate {
        code_id: u64,
        label: String,
        msg: Value,
    },

    // Wallet and network
    Network(String),
    Connect,
    Reconnect,
    Disconnect,
    Balance,
    Copy,

    Export(ExportFormat),
    Help,
    Quit,

    /// Known command with bad arguments; carries the usage line
    Invalid(String),

    // Unknown command
    Unknown(String),
}

/// Parse a command string (without the leading :)
pub fn parse_command(input: &str) -> Command {
    let input = input.trim();
    let mut parts = input.splitn(2, ' ');
    let cmd = parts.next().unwrap_or("");
    let args = parts
        .next()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    match cmd.to_lowercase().as_str() {
        // Inspection
        "contract" | "c" => match args {
            Some(addr) => Command::Contract(addr),
            None => Command::Invalid("usage: contract <address>".to_string()),
        },
        "code" => match args.as_deref().map(str::parse::<u64>) {
            Some(Ok(code_id)) => Command::Code(code_id),
            _ => Command::Invalid("usage: code <code-id>".to_string()),
        },
        "codes" => Command::Codes,
        "state" | "st" => Command::State,
        "probe" | "shapes" => Command::Probe,
        "use" => match args {
            Some(addr) => Command::Use(addr),
            None => Command::Invalid("usage: use <address>".to_string()),
        },

        // Contract calls
        "query" | "q" => match parse_json(args.as_deref()) {
            Ok(msg) => Command::Query(msg),
            Err(reason) => Command::Invalid(format!("usage: query <json> ({reason})")),
        },
        "exec" | "execute" | "x" => match parse_json(args.as_deref()) {
            Ok(msg) => Command::Exec(msg),
            Err(reason) => Command::Invalid(format!("usage: exec <json> ({reason})")),
        },
        "instantiate" | "init" => parse_instantiate(args.as_deref()),

        // Wallet and network
        "network" | "net" => match args {
            Some(chain_id) => Command::Network(chain_id),
            None => Command::Invalid("usage: network <chain-id>".to_string()),
        },
        "connect" | "conn" => Command::Connect,
        "reconnect" => Command::Reconnect,
        "disconnect" => Command::Disconnect,
        "balance" | "bal" => Command::Balance,
        "copy" | "yank" => Command::Copy,

        "export" => match args.as_deref().map(str::to_lowercase).as_deref() {
            Some("csv") => Command::Export(ExportFormat::Csv),
            Some("json") => Command::Export(ExportFormat::Json),
            _ => Command::Invalid("usage: export csv|json".to_string()),
        },
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,

        _ => Command::Unknown(input.to_string()),
    }
}

fn parse_json(args: Option<&str>) -> Result<Value, String> {
    let raw = args.ok_or_else(|| "missing message".to_string())?;
    let value: Value = serde_json::from_str(raw).map_err(|err| err.to_string())?;
    if value.is_object() {
        Ok(value)
    } else {
        Err("message must be a JSON object".to_string())
    }
}

fn parse_instantiate(args: Option<&str>) -> Command {
    const USAGE: &str = "usage: instantiate <code-id> <label> <json>";

    let Some(args) = args else {
        return Command::Invalid(USAGE.to_string());
    };
    let mut parts = args.splitn(3, char::is_whitespace);
    let code_id = parts.next().and_then(|s| s.parse::<u64>().ok());
    let label = parts.next().map(str::trim).filter(|s| !s.is_empty());
    let msg = parse_json(parts.next().map(str::trim));

    match (code_id, label, msg) {
        (Some(code_id), Some(label), Ok(msg)) => Command::Instantiate {
            code_id,
            label: label.to_string(),
            msg,
        },
        (_, _, Err(reason)) if code_id.is_some() && label.is_some() => {
            Command::Invalid(format!("{USAGE} ({reason})"))
        }
        _ => Command::Invalid(USAGE.to_string()),
    }
}

/// One line per command for the help overlay
pub const HELP_LINES: &[(&str, &str)] = &[
    ("contract <addr>", "Load contract info, state and message shapes"),
    ("code <id>", "List contracts instantiated from a code id"),
    ("codes", "Show the latest code id on chain"),
    ("state", "Reload raw state of the current contract"),
    ("probe", "Re-infer query/execute message shapes"),
    ("use <addr>", "Remember a contract as the current one"),
    ("query <json>", "Smart query the current contract"),
    ("exec <json>", "Execute a message with the connected wallet"),
    ("instantiate <id> <label> <json>", "Instantiate a code id"),
    ("network <chain-id>", "Switch network"),
    ("connect / reconnect", "Connect the wallet"),
    ("disconnect", "Drop the wallet and saved session"),
    ("balance", "Refresh wallet balances"),
    ("copy", "Copy the wallet address"),
    ("export csv|json", "Export the current contract"),
    ("quit", "Exit"),
];

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_inspection_commands() {
        assert_eq!(
            parse_command("contract juno1abc"),
            Command::Contract("juno1abc".to_string())
        );
        assert_eq!(parse_command("code 42"), Command::Code(42));
        assert_eq!(parse_command("CODES"), Command::Codes);
        assert_eq!(parse_command("state"), Command::State);
        assert_eq!(parse_command("use stars1xyz"), Command::Use("stars1xyz".to_string()));
        assert!(matches!(parse_command("code abc"), Command::Invalid(_)));
        assert!(matches!(parse_command("contract"), Command::Invalid(_)));
    }

    #[test]
    fn test_parse_message_commands() {
        assert_eq!(
            parse_command(r#"query {"get_count":{}}"#),
            Command::Query(json!({"get_count": {}}))
        );
        assert_eq!(
            parse_command(r#"exec {"increment":{}}"#),
            Command::Exec(json!({"increment": {}}))
        );
        assert!(matches!(parse_command("query [1,2]"), Command::Invalid(_)));
        assert!(matches!(parse_command("exec {oops"), Command::Invalid(_)));
    }

    #[test]
    fn test_parse_instantiate() {
        assert_eq!(
            parse_command(r#"instantiate 7 counter {"count": 1}"#),
            Command::Instantiate {
                code_id: 7,
                label: "counter".to_string(),
                msg: json!({"count": 1}),
            }
        );
        match parse_command("instantiate 7 counter nope") {
            Command::Invalid(usage) => assert!(usage.starts_with("usage: instantiate")),
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(parse_command("instantiate x y {}"), Command::Invalid(_)));
    }

    #[test]
    fn test_parse_wallet_and_export() {
        assert_eq!(parse_command("connect"), Command::Connect);
        assert_eq!(parse_command("reconnect"), Command::Reconnect);
        assert_eq!(parse_command("disconnect"), Command::Disconnect);
        assert_eq!(parse_command("network uni-5"), Command::Network("uni-5".to_string()));
        assert_eq!(parse_command("export CSV"), Command::Export(ExportFormat::Csv));
        assert_eq!(parse_command("export json"), Command::Export(ExportFormat::Json));
        assert!(matches!(parse_command("export xml"), Command::Invalid(_)));
    }

    #[test]
    fn test_parse_unknown() {
        assert_eq!(parse_command("foo bar"), Command::Unknown("foo bar".to_string()));
    }
}
