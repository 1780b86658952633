//! Amount and currency extraction.

use rust_decimal::Decimal;
use std::str::FromStr;
use tracing::debug;

use super::patterns::AMOUNT;
use super::{group, Cascade, ExtractionMatch, FieldExtractor};
use crate::models::config::CurrencyMarker;
use crate::models::receipt::Currency;

/// An amount together with the currency inferred for its message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Money {
    pub amount: Decimal,
    pub currency: Currency,
}

/// Amount field extractor.
///
/// The amount comes from the first cascade pattern whose capture parses;
/// the currency is a property of the whole text, not of the matched amount.
pub struct AmountExtractor<'a> {
    cascade: &'a Cascade,
    markers: &'a [CurrencyMarker],
    default_currency: Currency,
}

impl<'a> AmountExtractor<'a> {
    pub fn new(markers: &'a [CurrencyMarker], default_currency: Currency) -> Self {
        Self {
            cascade: &AMOUNT,
            markers,
            default_currency,
        }
    }

    /// Use a different pattern cascade.
    pub fn with_cascade(mut self, cascade: &'a Cascade) -> Self {
        self.cascade = cascade;
        self
    }
}

impl FieldExtractor for AmountExtractor<'_> {
    type Output = Money;

    fn extract(&self, text: &str) -> Option<ExtractionMatch<Money>> {
        let hit = self
            .cascade
            .first_match(text, |caps| group(caps, 1).and_then(normalize_amount))?;

        let currency = detect_currency(text, self.markers, self.default_currency);
        debug!(amount = %hit.value, %currency, pattern = hit.pattern, "amount matched");

        Some(hit.map(|amount| Money { amount, currency }))
    }
}

/// Normalize a captured amount such as `1,234.56`, `1.234,56` or `1234,56`.
///
/// Spaces and non-breaking spaces are dropped. When both `,` and `.` occur,
/// the one appearing last is the decimal separator. A single separator of
/// one kind is decimal; repeated separators of one kind group thousands.
/// Returns `None` for anything that is not a non-negative number.
pub fn normalize_amount(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\u{00a0}')
        .collect();

    if cleaned.is_empty() || !cleaned.chars().all(|c| c.is_ascii_digit() || c == ',' || c == '.') {
        return None;
    }

    let commas = cleaned.matches(',').count();
    let dots = cleaned.matches('.').count();

    let normalized = match (commas, dots) {
        (0, 0) => cleaned,
        (_, 0) if commas == 1 => cleaned.replace(',', "."),
        (_, 0) => cleaned.replace(',', ""),
        (0, 1) => cleaned,
        (0, _) => cleaned.replace('.', ""),
        _ => {
            let last_comma = cleaned.rfind(',');
            let last_dot = cleaned.rfind('.');
            if last_comma > last_dot {
                cleaned.replace('.', "").replace(',', ".")
            } else {
                cleaned.replace(',', "")
            }
        }
    };

    // "1.234,5.6" style leftovers fail to parse here
    let amount = Decimal::from_str(&normalized).ok()?;
    (amount >= Decimal::ZERO).then_some(amount)
}

/// Infer the currency of a message from the first marker present.
pub fn detect_currency(text: &str, markers: &[CurrencyMarker], default: Currency) -> Currency {
    let upper = text.to_uppercase();

    markers
        .iter()
        .find(|m| {
            if m.case_insensitive {
                contains_token(&upper, &m.marker.to_uppercase())
            } else {
                contains_token(text, &m.marker)
            }
        })
        .map(|m| m.currency)
        .unwrap_or(default)
}

/// Substring search that refuses to match inside a longer word, so `TRY`
/// is not found in `COUNTRY` and `EUR` not in `EUROPE`.
fn contains_token(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }

    let starts_word = needle.chars().next().is_some_and(char::is_alphabetic);
    let ends_word = needle.chars().next_back().is_some_and(char::is_alphabetic);

    haystack.match_indices(needle).any(|(start, m)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + m.len()..].chars().next();
        let clear_before = !starts_word || !before.is_some_and(char::is_alphabetic);
        let clear_after = !ends_word || !after.is_some_and(char::is_alphabetic);
        clear_before && clear_after
    })
}

/// Parse a dollar figure as printed on PDF receipts (`1,299.00`).
pub fn parse_dollar_amount(raw: &str) -> Option<Decimal> {
    let cleaned = raw.replace(',', "");
    let amount = Decimal::from_str(cleaned.trim_end_matches('.')).ok()?;
    (amount >= Decimal::ZERO).then_some(amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config::ExtractionConfig;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn extract(text: &str) -> Option<Money> {
        let config = ExtractionConfig::default();
        AmountExtractor::new(&config.currency_markers, config.default_currency)
            .extract(text)
            .map(|m| m.value)
    }

    #[test]
    fn test_normalize_amount() {
        assert_eq!(normalize_amount("1,234.56"), Some(dec("1234.56")));
        assert_eq!(normalize_amount("1.234,56"), Some(dec("1234.56")));
        assert_eq!(normalize_amount("1234,56"), Some(dec("1234.56")));
        assert_eq!(normalize_amount("1,234,567"), Some(dec("1234567")));
        assert_eq!(normalize_amount("1.234.567"), Some(dec("1234567")));
        assert_eq!(normalize_amount("1 234,56"), Some(dec("1234.56")));
        assert_eq!(normalize_amount("1\u{00a0}234.56"), Some(dec("1234.56")));
        assert_eq!(normalize_amount("42"), Some(dec("42")));
    }

    #[test]
    fn test_normalize_amount_rejects_garbage() {
        assert_eq!(normalize_amount(""), None);
        assert_eq!(normalize_amount("abc"), None);
        assert_eq!(normalize_amount("1.234,5.6"), None);
        assert_eq!(normalize_amount("-5"), None);
    }

    #[test]
    fn test_currency_normalization() {
        let usd = extract("Total: 1,234.56").unwrap();
        assert_eq!(usd.amount, dec("1234.56"));
        assert_eq!(usd.currency, Currency::Usd);

        let eur = extract("Total: 1.234,56\nPaid in € by card").unwrap();
        assert_eq!(eur.amount, dec("1234.56"));
        assert_eq!(eur.currency, Currency::Eur);

        let comma = extract("Amount: 1234,56").unwrap();
        assert_eq!(comma.amount, dec("1234.56"));
    }

    #[test]
    fn test_currency_priority() {
        let markers = ExtractionConfig::default().currency_markers;
        assert_eq!(detect_currency("£5 or 6 EUR", &markers, Currency::Usd), Currency::Eur);
        assert_eq!(detect_currency("Toplam 120 tl", &markers, Currency::Usd), Currency::Try);
        assert_eq!(detect_currency("paid 5 ₺", &markers, Currency::Usd), Currency::Try);
        assert_eq!(detect_currency("plain", &markers, Currency::Gbp), Currency::Gbp);
    }

    #[test]
    fn test_currency_markers_need_word_edges() {
        let markers = ExtractionConfig::default().currency_markers;
        assert_eq!(detect_currency("Country: US, Total $5", &markers, Currency::Usd), Currency::Usd);
        assert_eq!(detect_currency("Shipped to EUROPE", &markers, Currency::Usd), Currency::Usd);
        assert_eq!(detect_currency("Total 5EUR", &markers, Currency::Usd), Currency::Eur);
    }

    #[test]
    fn test_cascade_order() {
        // "total" beats a bare dollar figure earlier in the text
        let money = extract("Shipping $4.99\nTotal: $42.50").unwrap();
        assert_eq!(money.amount, dec("42.50"));

        let money = extract("Charged USD 19.99 today").unwrap();
        assert_eq!(money.amount, dec("19.99"));

        let money = extract("Ödeme 250,00 TL").unwrap();
        assert_eq!(money.amount, dec("250.00"));
        assert_eq!(money.currency, Currency::Try);
    }

    #[test]
    fn test_zero_amount_is_returned() {
        let money = extract("Total: 0.00").unwrap();
        assert_eq!(money.amount, Decimal::ZERO);
    }

    #[test]
    fn test_no_amount() {
        assert!(extract("Thanks for your order").is_none());
        assert!(extract("").is_none());
    }

    #[test]
    fn test_parse_dollar_amount() {
        assert_eq!(parse_dollar_amount("1,299.00"), Some(dec("1299.00")));
        assert_eq!(parse_dollar_amount("15."), Some(dec("15")));
        assert_eq!(parse_dollar_amount(","), None);
    }
}
