//! Regex patterns and extraction cascades for receipt text.
//!
//! Cascade order is significant: the first pattern that yields an accepted
//! value wins, so reordering changes results on ambiguous input.

use lazy_static::lazy_static;
use regex::Regex;

use super::Cascade;

lazy_static! {
    // Store name from subject-like lines
    pub static ref STORE_SUBJECT: Cascade = Cascade::compile("store_subject", &[
        r"(?i)receipt from (.+?)(?:\s*-|\s*$)",
        r"(?i)order from (.+?)(?:\s*-|\s*$)",
        r"(?i)purchase at (.+?)(?:\s*-|\s*$)",
        r"(?i)thank you for shopping at (.+?)(?:\s|$)",
        r"(?i)your (.+?) order",
    ]).unwrap();

    // Subject-style lines at the top of a body. The loose "your X order"
    // form is left out; in prose it matches ordinary sentences.
    pub static ref STORE_HEADLINE: Cascade = Cascade::compile("store_headline", &[
        r"(?i)receipt from (.+?)(?:\s*-|\s*$)",
        r"(?i)order from (.+?)(?:\s*-|\s*$)",
        r"(?i)purchase at (.+?)(?:\s*-|\s*$)",
        r"(?i)thank you for shopping at (.+?)(?:\s|$)",
    ]).unwrap();

    // Store name from labelled body lines
    pub static ref STORE_BODY: Cascade = Cascade::compile("store_body", &[
        r"(?i)merchant:\s*(.+?)(?:\n|$)",
        r"(?i)store:\s*(.+?)(?:\n|$)",
        r"(?i)sold by:\s*(.+?)(?:\n|$)",
    ]).unwrap();

    pub static ref SENDER_DOMAIN: Regex = Regex::new(r"@([\w-]+)\.").unwrap();

    // Item / description
    pub static ref ITEM: Cascade = Cascade::compile("item", &[
        r"(?i)item:\s*(.+?)(?:\n|$)",
        r"(?i)product:\s*(.+?)(?:\n|$)",
        r"(?i)description:\s*(.+?)(?:\n|$)",
        r"(?i)order details:\s*(.+?)(?:\n|$)",
    ]).unwrap();

    // Amounts: digit runs joined by single '.' or ',' separators
    pub static ref AMOUNT: Cascade = Cascade::compile("amount", &[
        r"(?i)total[:\s]*\$?\s*([0-9]+(?:[.,][0-9]+)*)",
        r"(?i)amount[:\s]*\$?\s*([0-9]+(?:[.,][0-9]+)*)",
        r"(?i)paid[:\s]*\$?\s*([0-9]+(?:[.,][0-9]+)*)",
        r"(?i)price[:\s]*\$?\s*([0-9]+(?:[.,][0-9]+)*)",
        r"\$\s*([0-9]+(?:[.,][0-9]+)*)",
        r"(?i)USD\s*([0-9]+(?:[.,][0-9]+)*)",
        r"€\s*([0-9]+(?:[.,][0-9]+)*)",
        r"£\s*([0-9]+(?:[.,][0-9]+)*)",
        r"₺\s*([0-9]+(?:[.,][0-9]+)*)",
        r"(?i)TL\s*([0-9]+(?:[.,][0-9]+)*)",
        r"(?i)TRY\s*([0-9]+(?:[.,][0-9]+)*)",
        r"(?i)([0-9]+(?:[.,][0-9]+)*)\s*(?:€|£|₺|EUR\b|GBP\b|TL\b|TRY\b)",
    ]).unwrap();

    // Purchase dates
    pub static ref PURCHASE_DATE: Cascade = Cascade::compile("purchase_date", &[
        r"(?i)purchase date[:\s]*([0-9]{1,2}[/-][0-9]{1,2}[/-][0-9]{2,4})",
        r"(?i)order date[:\s]*([0-9]{1,2}[/-][0-9]{1,2}[/-][0-9]{2,4})",
        r"(?i)date[:\s]*([0-9]{1,2}[/-][0-9]{1,2}[/-][0-9]{2,4})",
        r"([0-9]{4}-[0-9]{2}-[0-9]{2})",
        r"([A-Za-z]+ [0-9]{1,2},? [0-9]{4})",
    ]).unwrap();

    // Warranty length ("warranty: 2 years")
    pub static ref WARRANTY_DURATION: Cascade = Cascade::compile("warranty_duration", &[
        r"(?i)warranty[:\s]+([0-9]+)\s*(year|yr|month|mo)s?\b",
        r"(?i)guarantee[:\s]+([0-9]+)\s*(year|yr|month|mo)s?\b",
    ]).unwrap();

    // Explicit warranty expiry ("warranty expires: 01/15/2026")
    pub static ref WARRANTY_EXPIRES: Cascade = Cascade::compile("warranty_expires", &[
        r"(?i)warranty expires?[:\s]*([0-9]{4}-[0-9]{2}-[0-9]{2}|[0-9]{1,2}[/-][0-9]{1,2}[/-][0-9]{2,4})",
    ]).unwrap();

    // Links in message text or markup
    pub static ref URL: Regex = Regex::new(r#"https?://[^\s"'<>]+"#).unwrap();

    // e-Arşiv invoice pages (Turkish labels)
    pub static ref INVOICE_STORE: Cascade = Cascade::compile("invoice_store", &[
        r"(?i)(?:Ünvan|Unvan|Şirket|Firma)[:\s]+(.{3,80}?)\s{0,5}(?:\n|$)",
        r"(?i)<title>\s*(.+?)\s*-\s*e-?Arşiv",
    ]).unwrap();

    pub static ref INVOICE_AMOUNT: Cascade = Cascade::compile("invoice_amount", &[
        r"(?i)(?:Ödenecek\s*Tutar|Odenecek\s*Tutar)[:\s]*([0-9]+(?:[.,][0-9]+)*)\s*(?:TL|TRY|₺)?",
        r"(?i)(?:Genel\s*Toplam|Vergiler\s*Dahil\s*Toplam|Toplam)[:\s]*([0-9]+(?:[.,][0-9]+)*)\s*(?:TL|TRY|₺)?",
        r"([0-9]+(?:[.,][0-9]+)*)\s*(?:TL|TRY|₺)",
    ]).unwrap();

    pub static ref INVOICE_DATE: Cascade = Cascade::compile("invoice_date", &[
        r"(?i)(?:Fatura\s*Tarihi|Düzenleme\s*Tarihi|Duzenleme\s*Tarihi)[:\s]*([0-9]{1,2}[./-][0-9]{1,2}[./-][0-9]{2,4})",
        r"([0-9]{4}-[0-9]{2}-[0-9]{2})",
    ]).unwrap();

    // PDF receipts (US layout)
    pub static ref PDF_TOTAL: Regex = Regex::new(
        r"TOTAL:\s*\$([0-9,]+\.?[0-9]{0,2})"
    ).unwrap();

    pub static ref PDF_DOLLAR: Regex = Regex::new(
        r"\$([0-9,]+\.?[0-9]{0,2})"
    ).unwrap();

    pub static ref PDF_PURCHASE_DATE: Regex = Regex::new(
        r"Purchase Date:\s*([0-9]{1,2})/([0-9]{1,2})/([0-9]{4})"
    ).unwrap();

    pub static ref PDF_WARRANTY_EXPIRES: Regex = Regex::new(
        r"Warranty Expires:\s*([0-9]{1,2})/([0-9]{1,2})/([0-9]{4})"
    ).unwrap();

    pub static ref PDF_US_DATE: Regex = Regex::new(
        r"([0-9]{1,2})/([0-9]{1,2})/([0-9]{4})"
    ).unwrap();

    // Markup stripping
    pub static ref HTML_TAG: Regex = Regex::new(r"<[^>]*>").unwrap();

    pub static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();

    pub static ref FOUR_DIGIT_RUN: Regex = Regex::new(r"(?:^|[^0-9])[0-9]{4}(?:[^0-9]|$)").unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cascade_sizes() {
        assert_eq!(STORE_SUBJECT.len(), 5);
        assert_eq!(STORE_HEADLINE.len(), 4);
        assert_eq!(STORE_BODY.len(), 3);
        assert_eq!(ITEM.len(), 4);
        assert_eq!(PURCHASE_DATE.len(), 5);
        assert_eq!(INVOICE_AMOUNT.len(), 3);
    }

    #[test]
    fn test_amount_capture_keeps_separators() {
        let caps = AMOUNT.patterns()[0].captures("Total: 1.234,56 €").unwrap();
        assert_eq!(&caps[1], "1.234,56");

        let caps = AMOUNT.patterns()[0].captures("Total: $42.50.").unwrap();
        assert_eq!(&caps[1], "42.50");
    }

    #[test]
    fn test_url_stops_at_markup() {
        let m = URL.find(r#"<a href="https://x.efinans.com.tr/earsiv/abc">link</a>"#).unwrap();
        assert_eq!(m.as_str(), "https://x.efinans.com.tr/earsiv/abc");
    }

    #[test]
    fn test_warranty_unit_needs_word_boundary() {
        assert!(WARRANTY_DURATION.patterns()[0].is_match("Warranty: 2 years"));
        assert!(WARRANTY_DURATION.patterns()[0].is_match("warranty 6 months included"));
        assert!(!WARRANTY_DURATION.patterns()[0].is_match("warranty 3 monkeys"));
    }
}
