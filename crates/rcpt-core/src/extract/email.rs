//! Generic email-body receipt parser.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::debug;

use super::normalize::body_text;
use super::rules::{
    add_months, AmountExtractor, FieldExtractor, ItemExtractor, PurchaseDateExtractor,
    StoreExtractor, WarrantyExtractor,
};
use super::scoring::{email_score, FieldsFound};
use super::ReceiptParser;
use crate::models::config::ExtractionConfig;
use crate::models::email::InboundEmail;
use crate::models::receipt::{ParsedReceipt, ReceiptSource, DEFAULT_ITEM, UNKNOWN_STORE};

/// Parses receipts out of an email's subject, body and sender.
pub struct EmailReceiptParser<'a> {
    config: &'a ExtractionConfig,
}

impl<'a> EmailReceiptParser<'a> {
    pub fn new(config: &'a ExtractionConfig) -> Self {
        Self { config }
    }
}

impl ReceiptParser for EmailReceiptParser<'_> {
    type Input = InboundEmail;

    fn assemble(&self, email: &InboundEmail, today: NaiveDate) -> ParsedReceipt {
        let config = self.config;
        let body = body_text(email);
        let sender = email.sender_address();

        let store = StoreExtractor::new(&config.store_stopwords, config.max_field_len)
            .with_subject(&email.subject)
            .with_sender(&sender)
            .extract(&body);
        let item = ItemExtractor::new(config.max_field_len).extract(&body);
        let money = AmountExtractor::new(&config.currency_markers, config.default_currency)
            .extract(&body)
            .map(|m| m.value)
            .filter(|money| money.amount > Decimal::ZERO);
        let purchase_date = PurchaseDateExtractor::new().extract(&body);
        let warranty_expiry = WarrantyExtractor::new(today).extract(&body);

        let found = FieldsFound {
            store: store.is_some(),
            item: item.is_some(),
            amount: money.is_some(),
            purchase_date: purchase_date.is_some(),
            warranty_expiry: warranty_expiry.is_some(),
        };
        debug!(fields = found.count(), "email fields found");

        let purchase_date = purchase_date.map_or(today, |m| m.value);
        let warranty_expiry = warranty_expiry
            .map(|m| m.value)
            .or_else(|| add_months(purchase_date, config.default_warranty_months))
            .unwrap_or(purchase_date);

        ParsedReceipt {
            store: store.map_or_else(|| UNKNOWN_STORE.to_string(), |m| m.value),
            item: item.map_or_else(|| DEFAULT_ITEM.to_string(), |m| m.value),
            amount: money.map_or(Decimal::ZERO, |m| m.amount),
            currency: money.map_or(config.default_currency, |m| m.currency),
            purchase_date,
            warranty_expiry,
            confidence: email_score(&found, &config.scoring),
            source: ReceiptSource::EmailBody,
        }
    }

    fn min_confidence(&self) -> f32 {
        self.config.min_confidence
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExtractionError;
    use crate::extract::today;
    use crate::models::receipt::Currency;
    use pretty_assertions::assert_eq;
    use std::str::FromStr;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn parse(email: &InboundEmail) -> crate::extract::Result<ParsedReceipt> {
        let config = ExtractionConfig::default();
        EmailReceiptParser::new(&config).parse_at(email, date(2024, 6, 1))
    }

    #[test]
    fn test_end_to_end_plain_text() {
        let email = InboundEmail::from_pasted_link(
            "Receipt from Acme Corp\nTotal: $42.50\nDate: 01/15/2024",
        );
        let receipt = parse(&email).unwrap();

        assert_eq!(receipt.store, "Acme Corp");
        assert_eq!(receipt.amount, dec("42.50"));
        assert_eq!(receipt.currency, Currency::Usd);
        assert_eq!(receipt.purchase_date, date(2024, 1, 15));
        assert_eq!(receipt.warranty_expiry, date(2025, 1, 15));
        assert_eq!(receipt.item, DEFAULT_ITEM);
        assert!(receipt.confidence >= 0.6);
        assert_eq!(receipt.source, ReceiptSource::EmailBody);
    }

    #[test]
    fn test_all_fields() {
        let email = InboundEmail::new(
            "Shop <orders@gadgets.com>",
            "Your order from Gadget World",
            "Item: Noise cancelling headphones\nAmount: €199,99\nPurchase date: 2024-03-10\nWarranty: 2 years",
        );
        let receipt = parse(&email).unwrap();

        assert_eq!(receipt.store, "Gadget World");
        assert_eq!(receipt.item, "Noise cancelling headphones");
        assert_eq!(receipt.amount, dec("199.99"));
        assert_eq!(receipt.currency, Currency::Eur);
        assert_eq!(receipt.purchase_date, date(2024, 3, 10));
        // durations count from the extraction day
        assert_eq!(receipt.warranty_expiry, date(2026, 6, 1));
        assert_eq!(receipt.confidence, 1.0);
    }

    #[test]
    fn test_empty_input_is_rejected() {
        let err = parse(&InboundEmail::default()).unwrap_err();
        assert_eq!(
            err,
            ExtractionError::ParseFailed {
                confidence: 0.0,
                threshold: 0.3
            }
        );

        let config = ExtractionConfig::default();
        let receipt = EmailReceiptParser::new(&config)
            .assemble(&InboundEmail::from_pasted_link("lorem ipsum dolor"), date(2024, 6, 1));
        assert_eq!(receipt.confidence, 0.0);
        assert_eq!(receipt.store, UNKNOWN_STORE);
    }

    #[test]
    fn test_single_field_is_rejected() {
        let err = parse(&InboundEmail::from_pasted_link("Total: $12.00")).unwrap_err();
        assert!(err.is_parse_failed());
    }

    #[test]
    fn test_order_prose_is_rejected() {
        for body in [
            "Thanks for your recent order\nTotal: $5.00",
            "We got your payment. Your order ships soon\nPaid $5",
        ] {
            let err = parse(&InboundEmail::from_pasted_link(body)).unwrap_err();
            assert_eq!(
                err,
                ExtractionError::ParseFailed {
                    confidence: 0.2,
                    threshold: 0.3
                }
            );
        }
    }

    #[test]
    fn test_date_defaults() {
        let email = InboundEmail::from_pasted_link("Receipt from Acme\nTotal: $5");
        let receipt = parse(&email).unwrap();

        assert_eq!(receipt.purchase_date, date(2024, 6, 1));
        assert_eq!(receipt.warranty_expiry, date(2025, 6, 1));
        assert_eq!(receipt.confidence, 0.4);
    }

    #[test]
    fn test_date_defaults_use_current_day() {
        let config = ExtractionConfig::default();
        let email = InboundEmail::from_pasted_link("Receipt from Acme\nTotal: $5");

        let before = today();
        let receipt = EmailReceiptParser::new(&config).parse(&email).unwrap();
        let after = today();

        assert!(receipt.purchase_date >= before && receipt.purchase_date <= after);
        assert_eq!(
            receipt.warranty_expiry,
            add_months(receipt.purchase_date, 12).unwrap()
        );
    }

    #[test]
    fn test_html_only_body() {
        let mut email = InboundEmail::new("billing@acme.com", "", "");
        email.html = "<b>Total</b>: $10&nbsp;USD".to_string();
        let receipt = parse(&email).unwrap();

        assert_eq!(receipt.amount, dec("10"));
        assert_eq!(receipt.currency, Currency::Usd);
        assert_eq!(receipt.store, "acme");
    }

    #[test]
    fn test_subject_header_is_not_a_store() {
        let email = InboundEmail::new(
            "",
            "",
            "Store:\nSubject: Your receipt\nTotal: $15.00\nDate: 2024-02-02",
        );
        let receipt = parse(&email).unwrap();

        assert_ne!(receipt.store.to_lowercase(), "subject");
        assert_eq!(receipt.store, UNKNOWN_STORE);
    }

    #[test]
    fn test_zero_amount_not_counted() {
        let email = InboundEmail::from_pasted_link("Receipt from Acme\nTotal: $0.00\nTL 25");
        let err = parse(&email).unwrap_err();
        assert!(err.is_parse_failed());
    }

    #[test]
    fn test_currency_follows_message() {
        let email = InboundEmail::from_pasted_link("Receipt from Café Lisboa\nTotal: 1.234,56 EUR");
        let receipt = parse(&email).unwrap();

        assert_eq!(receipt.amount, dec("1234.56"));
        assert_eq!(receipt.currency, Currency::Eur);
        assert_eq!(receipt.formatted_amount(), "€1234.56");
    }
}
