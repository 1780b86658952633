//! Confidence scoring.
//!
//! Scores depend only on which fields were found, never on the values, so
//! placeholders and defaults applied afterwards cannot raise them.

use crate::models::config::ScoringConfig;

/// Which fields an extraction actually recognised.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldsFound {
    pub store: bool,
    pub item: bool,
    /// A positive amount; a parsed zero does not count.
    pub amount: bool,
    pub purchase_date: bool,
    pub warranty_expiry: bool,
}

impl FieldsFound {
    pub fn count(&self) -> usize {
        [
            self.store,
            self.item,
            self.amount,
            self.purchase_date,
            self.warranty_expiry,
        ]
        .iter()
        .filter(|found| **found)
        .count()
    }
}

/// Email body: a fixed weight per field found.
pub fn email_score(found: &FieldsFound, weights: &ScoringConfig) -> f32 {
    finish(found.count() as f32 * weights.email_field_weight)
}

/// Invoice page: a baseline for the resolved link, plus store and amount.
pub fn invoice_score(store: bool, amount: bool, weights: &ScoringConfig) -> f32 {
    let mut score = weights.invoice_baseline;
    if store {
        score += weights.invoice_field_weight;
    }
    if amount {
        score += weights.invoice_field_weight;
    }
    finish(score)
}

/// PDF text: a high baseline, replaced by the penalty when store or item is
/// missing.
pub fn pdf_score(store: bool, item: bool, weights: &ScoringConfig) -> f32 {
    if store && item {
        finish(weights.pdf_baseline)
    } else {
        finish(weights.pdf_penalty)
    }
}

/// Whether a score clears the acceptance threshold.
pub fn passes(confidence: f32, threshold: f32) -> bool {
    confidence >= threshold
}

// Round to two places so 3 * 0.2 compares equal to 0.6
fn finish(score: f32) -> f32 {
    ((score * 100.0).round() / 100.0).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn found(n: usize) -> FieldsFound {
        FieldsFound {
            store: n > 0,
            item: n > 1,
            amount: n > 2,
            purchase_date: n > 3,
            warranty_expiry: n > 4,
        }
    }

    #[test]
    fn test_email_score() {
        let weights = ScoringConfig::default();
        assert_eq!(email_score(&found(0), &weights), 0.0);
        assert_eq!(email_score(&found(1), &weights), 0.2);
        assert_eq!(email_score(&found(3), &weights), 0.6);
        assert_eq!(email_score(&found(5), &weights), 1.0);
    }

    #[test]
    fn test_email_score_is_monotonic() {
        let weights = ScoringConfig::default();
        for n in 0..5 {
            assert!(email_score(&found(n), &weights) < email_score(&found(n + 1), &weights));
        }
    }

    #[test]
    fn test_invoice_score() {
        let weights = ScoringConfig::default();
        assert_eq!(invoice_score(false, false, &weights), 0.4);
        assert_eq!(invoice_score(true, false, &weights), 0.7);
        assert_eq!(invoice_score(true, true, &weights), 1.0);
    }

    #[test]
    fn test_pdf_score() {
        let weights = ScoringConfig::default();
        assert_eq!(pdf_score(true, true, &weights), 0.8);
        assert_eq!(pdf_score(false, true, &weights), 0.3);
        assert_eq!(pdf_score(true, false, &weights), 0.3);
    }

    #[test]
    fn test_threshold() {
        assert!(!passes(email_score(&found(1), &ScoringConfig::default()), 0.3));
        assert!(passes(email_score(&found(2), &ScoringConfig::default()), 0.3));
        assert!(passes(0.3, 0.3));
    }

    #[test]
    fn test_clamped() {
        let weights = ScoringConfig {
            email_field_weight: 0.5,
            ..ScoringConfig::default()
        };
        assert_eq!(email_score(&found(5), &weights), 1.0);
    }
}
