//! Merchant name extraction.

use tracing::debug;

use super::patterns::{SENDER_DOMAIN, STORE_BODY, STORE_HEADLINE, STORE_SUBJECT};
use super::{group, ExtractionMatch, FieldExtractor};
use crate::extract::normalize::clean_text;

/// How many non-empty body lines are searched for a headline.
pub const HEADLINE_SCAN_LINES: usize = 10;

/// Store name extractor.
///
/// Sources are tried in order: subject line, labelled body lines
/// (`Merchant:`, `Store:`, `Sold by:`), headline lines such as `Receipt from X`
/// at the top of the body, then the sender's domain label. Not finding a store is `None`; the
/// caller decides on the placeholder.
pub struct StoreExtractor<'a> {
    subject: &'a str,
    sender: &'a str,
    stopwords: &'a [String],
    max_len: usize,
}

impl<'a> StoreExtractor<'a> {
    pub fn new(stopwords: &'a [String], max_len: usize) -> Self {
        Self {
            subject: "",
            sender: "",
            stopwords,
            max_len,
        }
    }

    pub fn with_subject(mut self, subject: &'a str) -> Self {
        self.subject = subject;
        self
    }

    pub fn with_sender(mut self, sender: &'a str) -> Self {
        self.sender = sender;
        self
    }

    fn clean(&self, raw: &str) -> Option<String> {
        let cleaned = clean_text(raw, self.max_len);
        (!cleaned.is_empty()).then_some(cleaned)
    }

    /// Labelled values that are really another header, e.g. `Subject: ...`.
    fn is_collision(&self, candidate: &str) -> bool {
        candidate.contains(':')
            || self
                .stopwords
                .iter()
                .any(|word| word.eq_ignore_ascii_case(candidate))
    }

    fn from_subject(&self) -> Option<ExtractionMatch<String>> {
        STORE_SUBJECT.first_match(self.subject, |caps| self.clean(group(caps, 1)?))
    }

    fn from_labels(&self, body: &str) -> Option<ExtractionMatch<String>> {
        STORE_BODY.first_match(body, |caps| {
            let candidate = self.clean(group(caps, 1)?)?;
            (!self.is_collision(&candidate)).then_some(candidate)
        })
    }

    fn from_headlines(&self, body: &str) -> Option<ExtractionMatch<String>> {
        let mut offset = 0;
        let mut scanned = 0;

        for line in body.split_inclusive('\n') {
            let start = offset;
            offset += line.len();

            let trimmed = line.trim_end();
            if trimmed.trim().is_empty() {
                continue;
            }
            if scanned == HEADLINE_SCAN_LINES {
                break;
            }
            scanned += 1;

            let found = STORE_HEADLINE.first_match(trimmed, |caps| {
                let candidate = self.clean(group(caps, 1)?)?;
                (!self.is_collision(&candidate)).then_some(candidate)
            });
            if let Some(mut hit) = found {
                hit.position = hit.position.map(|(s, e)| (start + s, start + e));
                return Some(hit);
            }
        }

        None
    }

    fn from_sender(&self) -> Option<ExtractionMatch<String>> {
        let caps = SENDER_DOMAIN.captures(self.sender)?;
        let value = self.clean(group(&caps, 1)?)?;
        let whole = caps.get_match();
        Some(
            ExtractionMatch::new(value, 0, whole.as_str())
                .with_position(whole.start(), whole.end()),
        )
    }
}

impl FieldExtractor for StoreExtractor<'_> {
    type Output = String;

    fn extract(&self, body: &str) -> Option<ExtractionMatch<String>> {
        let (hit, origin) = if let Some(hit) = self.from_subject() {
            (hit, "subject")
        } else if let Some(hit) = self.from_labels(body) {
            (hit, "label")
        } else if let Some(hit) = self.from_headlines(body) {
            (hit, "headline")
        } else {
            (self.from_sender()?, "sender")
        };

        debug!(store = %hit.value, origin, "store matched");
        Some(hit)
    }
}
