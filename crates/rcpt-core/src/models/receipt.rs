//! Parsed receipt data model and warranty status.

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Store name used when no merchant could be identified.
pub const UNKNOWN_STORE: &str = "Unknown Store";

/// Item used by the PDF path when no description could be identified.
pub const UNKNOWN_ITEM: &str = "Unknown Item";

/// Item used by the email path when no description could be identified.
pub const DEFAULT_ITEM: &str = "Product/Service";

/// Item used for receipts built from invoice-hosting pages.
pub const INVOICE_ITEM: &str = "Receipt";

/// Days before expiry at which a warranty counts as expiring.
pub const EXPIRING_WINDOW_DAYS: i64 = 30;

/// A receipt extracted from unstructured text.
///
/// Built fresh for every extraction and handed to the caller; it has no
/// identity of its own until a [`crate::store::ReceiptStore`] persists it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedReceipt {
    /// Merchant name, or [`UNKNOWN_STORE`].
    pub store: String,

    /// Product or service description.
    pub item: String,

    /// Total amount; zero when no amount was found.
    pub amount: Decimal,

    /// Currency of the amount.
    pub currency: Currency,

    /// Purchase date (extraction day when not found).
    pub purchase_date: NaiveDate,

    /// Warranty expiry (purchase date plus the default warranty when not found).
    pub warranty_expiry: NaiveDate,

    /// Extraction confidence (0.0 - 1.0).
    pub confidence: f32,

    /// Input channel that produced this receipt.
    pub source: ReceiptSource,
}

impl ParsedReceipt {
    /// Warranty status as of `today`.
    pub fn status(&self, today: NaiveDate) -> WarrantyStatus {
        WarrantyStatus::classify(self.warranty_expiry, today)
    }

    /// Amount formatted with its currency.
    pub fn formatted_amount(&self) -> String {
        self.currency.format_amount(self.amount)
    }
}

/// Supported receipt currencies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// US dollar.
    #[default]
    Usd,
    /// Euro.
    Eur,
    /// Pound sterling.
    Gbp,
    /// Turkish lira.
    Try,
}

impl Currency {
    /// ISO 4217 code.
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
            Currency::Try => "TRY",
        }
    }

    /// Parse an ISO code (case-insensitive).
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_uppercase().as_str() {
            "USD" => Some(Currency::Usd),
            "EUR" => Some(Currency::Eur),
            "GBP" => Some(Currency::Gbp),
            "TRY" | "TL" => Some(Currency::Try),
            _ => None,
        }
    }

    /// Format an amount the way receipts are shown to users.
    pub fn format_amount(&self, amount: Decimal) -> String {
        let amount = amount.round_dp(2);
        match self {
            Currency::Usd => format!("${:.2}", amount),
            Currency::Eur => format!("€{:.2}", amount),
            Currency::Gbp => format!("£{:.2}", amount),
            Currency::Try => format!("{:.2} TRY", amount),
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Input channel a receipt was extracted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReceiptSource {
    /// Plain email body (or pasted text).
    EmailBody,
    /// Invoice page fetched from an efinans e-Arşiv link.
    EfinansLink,
    /// Text extracted from a PDF receipt.
    Pdf,
}

impl ReceiptSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReceiptSource::EmailBody => "email_body",
            ReceiptSource::EfinansLink => "efinans_link",
            ReceiptSource::Pdf => "pdf",
        }
    }
}

impl fmt::Display for ReceiptSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Warranty window classification, derived from the expiry date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarrantyStatus {
    /// More than 30 days remaining.
    Active,
    /// 30 days or fewer remaining.
    Expiring,
    /// Expiry date is in the past.
    Expired,
}

impl WarrantyStatus {
    /// Classify a warranty by its expiry date.
    pub fn classify(expiry: NaiveDate, today: NaiveDate) -> Self {
        let remaining = days_until_expiry(expiry, today);
        if remaining < 0 {
            WarrantyStatus::Expired
        } else if remaining <= EXPIRING_WINDOW_DAYS {
            WarrantyStatus::Expiring
        } else {
            WarrantyStatus::Active
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WarrantyStatus::Active => "active",
            WarrantyStatus::Expiring => "expiring",
            WarrantyStatus::Expired => "expired",
        }
    }
}

impl fmt::Display for WarrantyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whole days from `today` until `expiry` (negative once expired).
pub fn days_until_expiry(expiry: NaiveDate, today: NaiveDate) -> i64 {
    (expiry - today).num_days()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_warranty_status_boundaries() {
        let today = date(2024, 6, 1);

        assert_eq!(WarrantyStatus::classify(date(2024, 5, 31), today), WarrantyStatus::Expired);
        assert_eq!(WarrantyStatus::classify(today, today), WarrantyStatus::Expiring);
        assert_eq!(WarrantyStatus::classify(date(2024, 7, 1), today), WarrantyStatus::Expiring);
        assert_eq!(WarrantyStatus::classify(date(2024, 7, 2), today), WarrantyStatus::Active);
    }

    #[test]
    fn test_currency_codes() {
        assert_eq!(Currency::from_code("eur"), Some(Currency::Eur));
        assert_eq!(Currency::from_code("TL"), Some(Currency::Try));
        assert_eq!(Currency::from_code("JPY"), None);
        assert_eq!(Currency::Gbp.to_string(), "GBP");
    }

    #[test]
    fn test_format_amount() {
        let amount = Decimal::from_str("42.5").unwrap();
        assert_eq!(Currency::Usd.format_amount(amount), "$42.50");
        assert_eq!(Currency::Try.format_amount(amount), "42.50 TRY");
    }

    #[test]
    fn test_serde_names() {
        let receipt = ParsedReceipt {
            store: "Acme".to_string(),
            item: DEFAULT_ITEM.to_string(),
            amount: Decimal::from_str("10.00").unwrap(),
            currency: Currency::Eur,
            purchase_date: date(2024, 1, 15),
            warranty_expiry: date(2025, 1, 15),
            confidence: 0.6,
            source: ReceiptSource::EfinansLink,
        };

        let json = serde_json::to_value(&receipt).unwrap();
        assert_eq!(json["currency"], "EUR");
        assert_eq!(json["source"], "efinans_link");
        assert_eq!(json["purchase_date"], "2024-01-15");
    }
}
