//! Message shape inference
//!
//! CosmWasm contracts deserialize their entry-point messages with serde, so a
//! message carrying an unknown top-level key is rejected with the list of keys
//! the contract would have accepted. We send a sentinel message and read that
//! list back. The grammar recognised here is serde's `unknown variant` /
//! `unknown field` diagnostic:
//!
//! ```text
//! unknown variant `x`, expected one of `a`, `b`, `c`
//! unknown variant `x`, expected `a` or `b`
//! unknown variant `x`, expected `a`
//! unknown variant `x`, there are no variants
//! ```
//!
//! Anything else is kept verbatim as [`MessageShape::Unrecognized`].

use serde::Serialize;
use serde_json::json;

use crate::domain::error::SpyError;

/// Top-level key of the sentinel message; never a real entry point
pub const PROBE_VARIANT: &str = "contract_spy_probe";

/// Which entry point a probe targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ProbeKind {
    Query,
    Execute,
}

impl ProbeKind {
    pub fn title(&self) -> &'static str {
        match self {
            ProbeKind::Query => "Query",
            ProbeKind::Execute => "Execute",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum MessageShape {
    /// Message keys the contract accepts
    Variants(Vec<String>),
    /// The contract answered the sentinel without complaint
    Accepted,
    /// The contract rejected the sentinel with a diagnostic we cannot read
    Unrecognized(String),
    /// The probe could not be sent (no signer, endpoint down, ...)
    Unavailable(String),
}

impl MessageShape {
    pub fn variants(&self) -> &[String] {
        match self {
            MessageShape::Variants(variants) => variants,
            _ => &[],
        }
    }

    pub fn summary(&self) -> String {
        match self {
            MessageShape::Variants(variants) if variants.is_empty() => "(none)".to_string(),
            MessageShape::Variants(variants) => variants.join(", "),
            MessageShape::Accepted => "accepts any message".to_string(),
            MessageShape::Unrecognized(raw) => format!("unrecognized: {raw}"),
            MessageShape::Unavailable(reason) => format!("unavailable: {reason}"),
        }
    }
}

/// Sentinel message sent to both entry points
pub fn probe_message() -> serde_json::Value {
    json!({ PROBE_VARIANT: {} })
}

/// Turn the outcome of a probe call into a shape
pub fn classify<T>(outcome: Result<T, SpyError>) -> MessageShape {
    match outcome {
        Ok(_) => MessageShape::Accepted,
        Err(err) => match err.chain_message() {
            Some(message) => match parse_expected_keys(message) {
                Some(keys) => MessageShape::Variants(keys),
                None => MessageShape::Unrecognized(message.trim().to_string()),
            },
            None => MessageShape::Unavailable(err.to_string()),
        },
    }
}

/// Extract the accepted keys from a serde `unknown variant`/`unknown field` diagnostic
pub fn parse_expected_keys(message: &str) -> Option<Vec<String>> {
    let start = message
        .find("unknown variant")
        .or_else(|| message.find("unknown field"))?;
    let rest = &message[start..];

    // Skip the offending name itself
    let mut cursor = Cursor::new(rest);
    cursor.skip_until('`')?;
    cursor.read_ticked()?;
    cursor.skip_separators();

    if cursor.eat("there are no variants") || cursor.eat("there are no fields") {
        return Some(Vec::new());
    }
    if !cursor.eat("expected") {
        return None;
    }
    cursor.skip_whitespace();
    if cursor.eat("nothing") {
        return Some(Vec::new());
    }
    cursor.eat("one of");

    let mut keys = Vec::new();
    loop {
        cursor.skip_whitespace();
        let Some(key) = cursor.read_ticked() else {
            break;
        };
        keys.push(key.to_string());
        cursor.skip_whitespace();
        if cursor.eat(",") {
            continue;
        }
        if cursor.eat("or ") {
            continue;
        }
        break;
    }

    if keys.is_empty() {
        None
    } else {
        Some(keys)
    }
}

struct Cursor<'a> {
    rest: &'a str,
}

impl<'a> Cursor<'a> {
    fn new(input: &'a str) -> Self {
        Self { rest: input }
    }

    fn skip_until(&mut self, ch: char) -> Option<()> {
        let idx = self.rest.find(ch)?;
        self.rest = &self.rest[idx..];
        Some(())
    }

    fn skip_whitespace(&mut self) {
        self.rest = self.rest.trim_start();
    }

    fn skip_separators(&mut self) {
        self.rest = self.rest.trim_start_matches(|c: char| c == ',' || c.is_whitespace());
    }

    fn eat(&mut self, token: &str) -> bool {
        match self.rest.strip_prefix(token) {
            Some(rest) => {
                self.rest = rest;
                true
            }
            None => false,
        }
    }

    /// Read a backtick-delimited name
    fn read_ticked(&mut self) -> Option<&'a str> {
        let body = self.rest.strip_prefix('`')?;
        let end = body.find('`')?;
        let name = &body[..end];
        self.rest = &body[end + 1..];
        Some(name)
    }
}
