//! Receipt field extraction module.

mod email;
mod invoice_page;
pub mod normalize;
mod pdf;
pub mod rules;
pub mod scoring;

pub use email::EmailReceiptParser;
pub use invoice_page::{InvoicePage, InvoicePageParser};
pub use pdf::PdfReceiptParser;

use chrono::{NaiveDate, Utc};
use tracing::{info, warn};

use crate::error::ExtractionError;
use crate::models::receipt::ParsedReceipt;

/// Result type for extraction operations.
pub type Result<T> = std::result::Result<T, ExtractionError>;

/// Trait for receipt parsers, one per input channel.
///
/// Parsers are pure: no I/O, no shared state, and "now" is passed in.
pub trait ReceiptParser {
    /// What the parser reads.
    type Input: ?Sized;

    /// Build a receipt from the input, defaults applied, without the
    /// confidence gate.
    fn assemble(&self, input: &Self::Input, today: NaiveDate) -> ParsedReceipt;

    /// Results scoring below this are rejected.
    fn min_confidence(&self) -> f32;

    /// Build a receipt and apply the confidence gate.
    fn parse_at(&self, input: &Self::Input, today: NaiveDate) -> Result<ParsedReceipt> {
        let receipt = self.assemble(input, today);
        check_confidence(&receipt, self.min_confidence())?;
        Ok(receipt)
    }

    /// [`ReceiptParser::parse_at`] with today's UTC date.
    fn parse(&self, input: &Self::Input) -> Result<ParsedReceipt> {
        self.parse_at(input, today())
    }
}

/// Reject a receipt whose confidence is below `threshold`.
pub fn check_confidence(receipt: &ParsedReceipt, threshold: f32) -> Result<()> {
    if !scoring::passes(receipt.confidence, threshold) {
        warn!(
            source = %receipt.source,
            confidence = receipt.confidence,
            threshold,
            "low confidence, rejecting receipt"
        );
        return Err(ExtractionError::ParseFailed {
            confidence: receipt.confidence,
            threshold,
        });
    }

    info!(
        source = %receipt.source,
        confidence = receipt.confidence,
        store = %receipt.store,
        amount = %receipt.amount,
        "parsed receipt"
    );
    Ok(())
}

/// The current UTC calendar date.
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}
