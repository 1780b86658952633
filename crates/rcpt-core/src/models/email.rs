//! Inbound email payloads handed over by the mail receiver.

use mail_parser::{Addr, MessageParser};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// An inbound email as delivered by the receiving webhook.
///
/// Only `subject`, `text`/`html` and `from` feed the extractors; `to` is
/// carried for the caller's routing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InboundEmail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub text: String,
    pub html: String,
}

impl InboundEmail {
    /// Create an email from a plain-text body.
    pub fn new(from: impl Into<String>, subject: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            subject: subject.into(),
            text: text.into(),
            ..Self::default()
        }
    }

    /// Wrap pasted link text as a body with no sender and no subject.
    pub fn from_pasted_link(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Read a saved `.eml` message.
    ///
    /// MIME structure and transfer encodings are decoded; the first
    /// text/plain part goes to `text` and the first text/html part to
    /// `html`. A single untyped part that looks like markup is treated as
    /// html. Input that is not a message at all yields an empty email.
    pub fn from_raw(raw: &str) -> Self {
        let Some(message) = MessageParser::default().parse(raw.as_bytes()) else {
            debug!(bytes = raw.len(), "not a MIME message");
            return Self::default();
        };

        let from = message
            .from()
            .and_then(|addr| addr.first())
            .map(format_addr)
            .unwrap_or_default();
        let to = message
            .to()
            .map(|addr| addr.iter().map(format_addr).collect::<Vec<_>>().join(", "))
            .unwrap_or_default();

        // mail-parser converts between text and html when a message lacks
        // one of them; only keep parts that really are of each kind
        let text = message
            .text_part(0)
            .filter(|part| !part.is_text_html())
            .and_then(|part| part.text_contents())
            .map(normalize_newlines)
            .unwrap_or_default();
        let html = message
            .html_part(0)
            .filter(|part| part.is_text_html())
            .and_then(|part| part.text_contents())
            .map(normalize_newlines)
            .unwrap_or_default();

        let mut email = Self {
            from,
            to,
            subject: message.subject().unwrap_or_default().trim().to_string(),
            text,
            html,
        };
        if email.html.is_empty() && looks_like_html(&email.text) {
            email.html = std::mem::take(&mut email.text);
        }

        email
    }

    /// Sender address without the display name, lowercased.
    pub fn sender_address(&self) -> String {
        sender_address(&self.from)
    }
}

/// Extract `a@b.c` from `Name <a@b.c>`; bare addresses are returned trimmed.
pub fn sender_address(from: &str) -> String {
    if let (Some(start), Some(end)) = (from.find('<'), from.find('>')) {
        if start + 1 < end {
            return from[start + 1..end].trim().to_lowercase();
        }
    }
    from.trim().to_lowercase()
}

fn format_addr(addr: &Addr<'_>) -> String {
    match (addr.name(), addr.address()) {
        (Some(name), Some(address)) => format!("{name} <{address}>"),
        (None, Some(address)) => address.to_string(),
        (Some(name), None) => name.to_string(),
        (None, None) => String::new(),
    }
}

fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n")
}

fn looks_like_html(body: &str) -> bool {
    let lower = body.to_lowercase();
    ["<html", "<body", "<div", "<p>", "<table", "<br"]
        .iter()
        .any(|tag| lower.contains(tag))
}
