//! Parser for text extracted from PDF receipts.
//!
//! PDF text keeps the printed layout of US till receipts: the merchant
//! heads the page above a `RECEIPT` banner, line items follow a
//! `ITEM DESCRIPTION ... PRICE` header and dates are printed month first.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::debug;

use super::normalize::clean_text;
use super::rules::amounts::parse_dollar_amount;
use super::rules::patterns::{
    PDF_DOLLAR, PDF_PURCHASE_DATE, PDF_TOTAL, PDF_US_DATE, PDF_WARRANTY_EXPIRES,
};
use super::rules::{add_months, group};
use super::scoring::pdf_score;
use super::ReceiptParser;
use crate::models::config::ExtractionConfig;
use crate::models::receipt::{ParsedReceipt, ReceiptSource, UNKNOWN_ITEM, UNKNOWN_STORE};

const STORE_LABELS: &[&str] = &["merchant:", "vendor:", "from:"];
const AMOUNT_KEYWORDS: &[&str] = &["total", "amount", "price"];
const ITEM_LABELS: &[&str] = &["item:", "product:", "description:", "purchased:"];

/// Words taken after an item label before giving up on the description.
const MAX_ITEM_WORDS: usize = 11;

/// Longest item text accepted from the line-item table.
const MAX_ITEM_CHARS: usize = 200;

/// Parses receipts out of PDF page text.
pub struct PdfReceiptParser<'a> {
    config: &'a ExtractionConfig,
}

impl<'a> PdfReceiptParser<'a> {
    pub fn new(config: &'a ExtractionConfig) -> Self {
        Self { config }
    }

    fn store(&self, text: &str) -> Option<String> {
        // ASCII case mapping keeps byte offsets aligned with `text`
        if let Some(idx) = text.to_ascii_uppercase().find("RECEIPT") {
            let head = &text[..idx];
            let head = head.split('(').next().unwrap_or(head);
            let head = head.split(',').next().unwrap_or(head);

            if let Some(word) = head.split_whitespace().find(|w| w.parse::<i64>().is_err()) {
                return Some(clean_text(word, self.config.max_field_len));
            }
        }

        let lower = text.to_ascii_lowercase();
        STORE_LABELS.iter().find_map(|label| {
            let idx = lower.find(label)?;
            text[idx + label.len()..]
                .split_whitespace()
                .next()
                .map(|word| clean_text(word, self.config.max_field_len))
        })
    }

    fn amount(&self, text: &str) -> Option<Decimal> {
        let total = PDF_TOTAL
            .captures(text)
            .and_then(|caps| parse_dollar_amount(group(&caps, 1)?))
            .filter(|amount| *amount > Decimal::ZERO);
        if total.is_some() {
            return total;
        }

        let lower = text.to_ascii_lowercase();
        AMOUNT_KEYWORDS.iter().find_map(|keyword| {
            let idx = lower.find(keyword)?;
            let caps = PDF_DOLLAR.captures(&text[idx..])?;
            parse_dollar_amount(group(&caps, 1)?)
        })
    }

    fn item(&self, text: &str) -> Option<String> {
        if let Some(idx) = text.find("PRICE") {
            let after = &text[idx + "PRICE".len()..];
            if let Some(dollar) = after.find('$') {
                let item = after[..dollar].replace("ITEM DESCRIPTION", "");
                let item = clean_text(&item, MAX_ITEM_CHARS + 1);
                let len = item.chars().count();
                if len > 0 && len < MAX_ITEM_CHARS {
                    return Some(item);
                }
            }
        }

        let lower = text.to_ascii_lowercase();
        ITEM_LABELS.iter().find_map(|label| {
            let idx = lower.find(label)?;
            let words: Vec<&str> = text[idx + label.len()..]
                .split_whitespace()
                .take_while(|word| !word.contains('$'))
                .take(MAX_ITEM_WORDS)
                .collect();
            (!words.is_empty()).then(|| clean_text(&words.join(" "), self.config.max_field_len))
        })
    }

    fn purchase_date(&self, text: &str) -> Option<NaiveDate> {
        if let Some(date) = PDF_PURCHASE_DATE.captures(text).and_then(|caps| us_date(&caps)) {
            return Some(date);
        }

        let idx = text.find("Date:")?;
        let caps = PDF_US_DATE.captures(&text[idx + "Date:".len()..])?;
        us_date(&caps)
    }

    fn warranty_expiry(&self, text: &str) -> Option<NaiveDate> {
        PDF_WARRANTY_EXPIRES.captures(text).and_then(|caps| us_date(&caps))
    }
}

/// Build a date from month, day and year capture groups.
fn us_date(caps: &regex::Captures<'_>) -> Option<NaiveDate> {
    let month = group(caps, 1)?.parse().ok()?;
    let day = group(caps, 2)?.parse().ok()?;
    let year = group(caps, 3)?.parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

impl ReceiptParser for PdfReceiptParser<'_> {
    type Input = str;

    fn assemble(&self, text: &str, today: NaiveDate) -> ParsedReceipt {
        let config = self.config;

        let store = self.store(text);
        let item = self.item(text);
        let amount = self.amount(text).unwrap_or(Decimal::ZERO);
        let purchase_date = self.purchase_date(text).unwrap_or(today);
        let warranty_expiry = self
            .warranty_expiry(text)
            .or_else(|| add_months(purchase_date, config.default_warranty_months))
            .unwrap_or(purchase_date);

        let confidence = pdf_score(store.is_some(), item.is_some(), &config.scoring);
        debug!(
            store_found = store.is_some(),
            item_found = item.is_some(),
            %amount,
            "pdf fields found"
        );

        ParsedReceipt {
            store: store.unwrap_or_else(|| UNKNOWN_STORE.to_string()),
            item: item.unwrap_or_else(|| UNKNOWN_ITEM.to_string()),
            amount,
            currency: config.default_currency,
            purchase_date,
            warranty_expiry,
            confidence,
            source: ReceiptSource::Pdf,
        }
    }

    fn min_confidence(&self) -> f32 {
        self.config.min_confidence
    }
}
