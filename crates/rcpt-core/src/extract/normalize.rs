//! Input normalization: one plain-text string per message.

use crate::extract::rules::patterns::{HTML_TAG, WHITESPACE};
use crate::models::email::InboundEmail;

/// Entities decoded after tag removal, in order.
const ENTITIES: &[(&str, &str)] = &[
    ("&nbsp;", " "),
    ("&amp;", "&"),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
];

/// Strip markup from an HTML body.
///
/// Every tag span becomes a single space, the five common entities are
/// decoded, whitespace runs collapse to one space and the result is trimmed.
/// Unclosed tags are left as text.
pub fn strip_html(html: &str) -> String {
    let mut text = HTML_TAG.replace_all(html, " ").into_owned();

    for (entity, replacement) in ENTITIES {
        if text.contains(entity) {
            text = text.replace(entity, replacement);
        }
    }

    WHITESPACE.replace_all(&text, " ").trim().to_string()
}

/// The text extractors run on: the plain body when it has content,
/// otherwise the stripped HTML body.
pub fn body_text(email: &InboundEmail) -> String {
    if email.text.trim().is_empty() {
        strip_html(&email.html)
    } else {
        email.text.clone()
    }
}

/// Collapse whitespace, trim and cut to at most `max_chars` characters.
pub fn clean_text(text: &str, max_chars: usize) -> String {
    let collapsed = WHITESPACE.replace_all(text, " ");
    let trimmed = collapsed.trim();

    match trimmed.char_indices().nth(max_chars) {
        Some((cut, _)) => trimmed[..cut].trim_end().to_string(),
        None => trimmed.to_string(),
    }
}
