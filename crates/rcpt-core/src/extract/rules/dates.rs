//! Purchase date and warranty extraction.

use chrono::{Months, NaiveDate};
use tracing::debug;

use super::patterns::{FOUR_DIGIT_RUN, PURCHASE_DATE, WARRANTY_DURATION, WARRANTY_EXPIRES};
use super::{group, Cascade, ExtractionMatch, FieldExtractor};

/// Layouts tried on dates found in email bodies, in order.
///
/// Month-first wins over day-first for ambiguous numeric dates.
pub const EMAIL_DATE_LAYOUTS: &[&str] = &[
    "%Y-%m-%d",
    "%m/%d/%Y",
    "%m-%d-%Y",
    "%d/%m/%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%B %d %Y",
    "%b %d %Y",
];

/// Layouts tried on an explicit warranty expiry date.
pub const WARRANTY_DATE_LAYOUTS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%m-%d-%Y"];

/// Layouts tried on invoice pages, which print day-first dates.
pub const INVOICE_DATE_LAYOUTS: &[&str] = &[
    "%Y-%m-%d",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%m/%d/%Y",
];

/// Parse a date against an ordered list of layouts; the first that fits wins.
///
/// A four-digit year is required, so `01/15/24` is not a date here.
pub fn parse_date(raw: &str, layouts: &[&str]) -> Option<NaiveDate> {
    let raw = raw.trim();
    if !FOUR_DIGIT_RUN.is_match(raw) {
        return None;
    }

    layouts
        .iter()
        .find_map(|layout| NaiveDate::parse_from_str(raw, layout).ok())
}

/// Calendar-month addition; day-of-month is clamped (Feb 29 + 12 months is Feb 28).
pub fn add_months(date: NaiveDate, months: u32) -> Option<NaiveDate> {
    date.checked_add_months(Months::new(months))
}

/// Purchase date extractor.
pub struct PurchaseDateExtractor<'a> {
    cascade: &'a Cascade,
    layouts: &'a [&'a str],
}

impl<'a> PurchaseDateExtractor<'a> {
    pub fn new() -> Self {
        Self {
            cascade: &PURCHASE_DATE,
            layouts: EMAIL_DATE_LAYOUTS,
        }
    }

    pub fn with_cascade(mut self, cascade: &'a Cascade) -> Self {
        self.cascade = cascade;
        self
    }

    pub fn with_layouts(mut self, layouts: &'a [&'a str]) -> Self {
        self.layouts = layouts;
        self
    }
}

impl Default for PurchaseDateExtractor<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for PurchaseDateExtractor<'_> {
    type Output = NaiveDate;

    fn extract(&self, text: &str) -> Option<ExtractionMatch<NaiveDate>> {
        let hit = self
            .cascade
            .first_match(text, |caps| parse_date(group(caps, 1)?, self.layouts))?;
        debug!(date = %hit.value, pattern = hit.pattern, "purchase date matched");
        Some(hit)
    }
}

/// Warranty expiry extractor.
///
/// A stated duration ("warranty: 2 years") counts from `today`, not from the
/// purchase date. An explicit "warranty expires" date is taken as is.
pub struct WarrantyExtractor {
    today: NaiveDate,
}

impl WarrantyExtractor {
    pub fn new(today: NaiveDate) -> Self {
        Self { today }
    }

    fn from_duration(&self, count: &str, unit: &str) -> Option<NaiveDate> {
        let count: u32 = count.parse().ok()?;
        let unit = unit.to_lowercase();
        let months = if unit.starts_with('y') {
            count.checked_mul(12)?
        } else {
            count
        };
        add_months(self.today, months)
    }
}

impl FieldExtractor for WarrantyExtractor {
    type Output = NaiveDate;

    fn extract(&self, text: &str) -> Option<ExtractionMatch<NaiveDate>> {
        let hit = WARRANTY_DURATION
            .first_match(text, |caps| self.from_duration(group(caps, 1)?, group(caps, 2)?))
            .or_else(|| {
                WARRANTY_EXPIRES.first_match(text, |caps| {
                    parse_date(group(caps, 1)?, WARRANTY_DATE_LAYOUTS)
                })
            })?;
        debug!(expiry = %hit.value, "warranty matched");
        Some(hit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::rules::patterns::INVOICE_DATE;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn purchase(text: &str) -> Option<NaiveDate> {
        PurchaseDateExtractor::new().extract(text).map(|m| m.value)
    }

    #[test]
    fn test_parse_date_layouts() {
        assert_eq!(parse_date("2024-01-15", EMAIL_DATE_LAYOUTS), Some(date(2024, 1, 15)));
        assert_eq!(parse_date("01/15/2024", EMAIL_DATE_LAYOUTS), Some(date(2024, 1, 15)));
        assert_eq!(parse_date("1/5/2024", EMAIL_DATE_LAYOUTS), Some(date(2024, 1, 5)));
        assert_eq!(parse_date("3-7-2024", EMAIL_DATE_LAYOUTS), Some(date(2024, 3, 7)));
        assert_eq!(parse_date("January 2, 2024", EMAIL_DATE_LAYOUTS), Some(date(2024, 1, 2)));
        assert_eq!(parse_date("Mar 14, 2024", EMAIL_DATE_LAYOUTS), Some(date(2024, 3, 14)));
    }

    #[test]
    fn test_parse_date_ambiguity() {
        // month-first is tried before day-first
        assert_eq!(parse_date("03/04/2024", EMAIL_DATE_LAYOUTS), Some(date(2024, 3, 4)));
        // only day-first fits
        assert_eq!(parse_date("25/12/2024", EMAIL_DATE_LAYOUTS), Some(date(2024, 12, 25)));
    }

    #[test]
    fn test_parse_date_rejects() {
        assert_eq!(parse_date("01/15/24", EMAIL_DATE_LAYOUTS), None);
        assert_eq!(parse_date("13/13/2024", EMAIL_DATE_LAYOUTS), None);
        assert_eq!(parse_date("Smarch 3, 2024", EMAIL_DATE_LAYOUTS), None);
        assert_eq!(parse_date("", EMAIL_DATE_LAYOUTS), None);
    }

    #[test]
    fn test_purchase_date_cascade() {
        assert_eq!(purchase("Date: 01/15/2024"), Some(date(2024, 1, 15)));
        assert_eq!(purchase("Order date: 2/3/2024"), Some(date(2024, 2, 3)));
        assert_eq!(purchase("Shipped 2024-05-06"), Some(date(2024, 5, 6)));
        assert_eq!(purchase("Ordered on March 3, 2024."), Some(date(2024, 3, 3)));
        assert_eq!(purchase("Thanks!"), None);
    }

    #[test]
    fn test_unparseable_capture_falls_through() {
        // the labelled date is bad, the ISO date later on is used
        assert_eq!(purchase("Date: 99/99/2024\nPlaced 2024-02-01"), Some(date(2024, 2, 1)));
    }

    #[test]
    fn test_invoice_layouts() {
        let extractor = PurchaseDateExtractor::new()
            .with_cascade(&INVOICE_DATE)
            .with_layouts(INVOICE_DATE_LAYOUTS);
        let hit = extractor.extract("Fatura Tarihi: 15.01.2024").unwrap();
        assert_eq!(hit.value, date(2024, 1, 15));

        let hit = extractor.extract("Düzenleme Tarihi: 05/02/2024").unwrap();
        assert_eq!(hit.value, date(2024, 2, 5));
    }

    #[test]
    fn test_add_months() {
        assert_eq!(add_months(date(2024, 2, 29), 12), Some(date(2025, 2, 28)));
        assert_eq!(add_months(date(2024, 1, 31), 1), Some(date(2024, 2, 29)));
    }

    #[test]
    fn test_warranty_duration() {
        let today = date(2024, 6, 1);
        let extractor = WarrantyExtractor::new(today);

        assert_eq!(extractor.extract("Warranty: 2 years").unwrap().value, date(2026, 6, 1));
        assert_eq!(extractor.extract("guarantee 6 months").unwrap().value, date(2024, 12, 1));
        assert_eq!(extractor.extract("warranty: 1 yr").unwrap().value, date(2025, 6, 1));
    }

    #[test]
    fn test_warranty_expiry_date() {
        let extractor = WarrantyExtractor::new(date(2024, 6, 1));

        let hit = extractor.extract("Warranty expires: 01/15/2026").unwrap();
        assert_eq!(hit.value, date(2026, 1, 15));

        let hit = extractor.extract("warranty expire 2027-03-01").unwrap();
        assert_eq!(hit.value, date(2027, 3, 1));
    }

    #[test]
    fn test_warranty_not_found() {
        let extractor = WarrantyExtractor::new(date(2024, 6, 1));
        assert!(extractor.extract("no warranty info").is_none());
        assert!(extractor.extract("warranty: 99999999999 years").is_none());
        assert!(extractor.extract("warranty expires: 01/15/26").is_none());
    }
}
