//! Parser for fetched e-Arşiv invoice pages.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::debug;

use super::normalize::{clean_text, strip_html};
use super::rules::dates::INVOICE_DATE_LAYOUTS;
use super::rules::patterns::{INVOICE_AMOUNT, INVOICE_DATE, INVOICE_STORE};
use super::rules::{
    add_months, normalize_amount, AmountExtractor, FieldExtractor, PurchaseDateExtractor,
    StoreExtractor,
};
use super::scoring::invoice_score;
use super::ReceiptParser;
use crate::models::config::ExtractionConfig;
use crate::models::receipt::{ParsedReceipt, ReceiptSource, INVOICE_ITEM, UNKNOWN_STORE};

/// A fetched invoice page and the sender of the message that linked to it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvoicePage {
    pub html: String,
    pub sender: String,
}

impl InvoicePage {
    pub fn new(html: impl Into<String>, sender: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            sender: sender.into(),
        }
    }
}

/// Parses Turkish e-Arşiv invoice pages.
///
/// The resolved link is itself evidence, so scoring starts from a baseline
/// and only store and amount add to it.
pub struct InvoicePageParser<'a> {
    config: &'a ExtractionConfig,
}

impl<'a> InvoicePageParser<'a> {
    pub fn new(config: &'a ExtractionConfig) -> Self {
        Self { config }
    }

    fn store(&self, page: &InvoicePage, text: &str) -> Option<String> {
        for pattern in INVOICE_STORE.patterns() {
            for source in [page.html.as_str(), text] {
                let Some(caps) = pattern.captures(source) else {
                    continue;
                };
                let candidate = clean_text(&strip_html(&caps[1]), self.config.max_field_len);
                if !candidate.is_empty() {
                    return Some(candidate);
                }
            }
        }

        StoreExtractor::new(&self.config.store_stopwords, self.config.max_field_len)
            .with_sender(&page.sender)
            .extract(text)
            .map(|m| m.value)
    }

    /// The last labelled amount in the document is taken as the grand total.
    fn labelled_amount(&self, page: &InvoicePage, text: &str) -> Option<Decimal> {
        for pattern in INVOICE_AMOUNT.patterns() {
            for source in [text, page.html.as_str()] {
                let last = pattern
                    .captures_iter(source)
                    .filter_map(|caps| normalize_amount(&caps[1]))
                    .filter(|amount| *amount > Decimal::ZERO)
                    .last();
                if last.is_some() {
                    return last;
                }
            }
        }
        None
    }
}

impl ReceiptParser for InvoicePageParser<'_> {
    type Input = InvoicePage;

    fn assemble(&self, page: &InvoicePage, today: NaiveDate) -> ParsedReceipt {
        let config = self.config;
        let text = strip_html(&page.html);

        let store = self.store(page, &text);

        let (amount, currency) = match self.labelled_amount(page, &text) {
            Some(amount) => (amount, config.invoice_currency),
            None => AmountExtractor::new(&config.currency_markers, config.invoice_currency)
                .extract(&text)
                .map_or((Decimal::ZERO, config.invoice_currency), |m| {
                    (m.value.amount, m.value.currency)
                }),
        };

        let purchase_date = PurchaseDateExtractor::new()
            .with_cascade(&INVOICE_DATE)
            .with_layouts(INVOICE_DATE_LAYOUTS)
            .extract(&text)
            .or_else(|| PurchaseDateExtractor::new().extract(&text))
            .map_or(today, |m| m.value);
        let warranty_expiry =
            add_months(purchase_date, config.default_warranty_months).unwrap_or(purchase_date);

        let store_found = store.is_some();
        let amount_found = amount > Decimal::ZERO;
        debug!(store_found, amount_found, "invoice page fields found");

        ParsedReceipt {
            store: store.unwrap_or_else(|| UNKNOWN_STORE.to_string()),
            item: INVOICE_ITEM.to_string(),
            amount,
            currency,
            purchase_date,
            warranty_expiry,
            confidence: invoice_score(store_found, amount_found, &config.scoring),
            source: ReceiptSource::EfinansLink,
        }
    }

    fn min_confidence(&self) -> f32 {
        self.config.min_confidence
    }
}
