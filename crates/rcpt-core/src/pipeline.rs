//! End-to-end receipt extraction.
//!
//! [`ReceiptPipeline`] routes each input channel to its parser. For email
//! it first tries any invoice links through the injected [`PageFetcher`],
//! then falls back to the generic cascades over the body. Only the link
//! step does I/O; everything else is pure.

use chrono::NaiveDate;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::error::ExtractionError;
use crate::extract::normalize::body_text;
use crate::extract::{self, EmailReceiptParser, PdfReceiptParser, ReceiptParser};
use crate::links::{LinkResolver, NoFetch, PageFetcher};
use crate::models::config::RcptConfig;
use crate::models::email::InboundEmail;
use crate::models::receipt::ParsedReceipt;
use crate::pdf::PdfExtractor;

#[cfg(feature = "http")]
use crate::links::HttpFetcher;

/// Receipt extraction pipeline over one configuration and page fetcher.
///
/// Holds no mutable state; one pipeline can serve concurrent calls.
pub struct ReceiptPipeline<F = NoFetch> {
    config: RcptConfig,
    fetcher: F,
    today: Option<NaiveDate>,
}

impl ReceiptPipeline<NoFetch> {
    /// A pipeline that never follows invoice links.
    pub fn offline(config: RcptConfig) -> Self {
        Self::new(config, NoFetch)
    }
}

#[cfg(feature = "http")]
impl ReceiptPipeline<HttpFetcher> {
    /// A pipeline that fetches invoice pages over HTTPS.
    pub fn with_http(config: RcptConfig) -> crate::Result<Self> {
        let fetcher = HttpFetcher::new(&config.links)?;
        Ok(Self::new(config, fetcher))
    }
}

impl<F: PageFetcher> ReceiptPipeline<F> {
    pub fn new(config: RcptConfig, fetcher: F) -> Self {
        Self {
            config,
            fetcher,
            today: None,
        }
    }

    /// Pin "today" instead of reading the clock.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn config(&self) -> &RcptConfig {
        &self.config
    }

    /// The date defaults are computed against.
    pub fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(extract::today)
    }

    /// Extract a receipt from an email, following invoice links first.
    ///
    /// Link failures are absorbed; only a low-confidence result is an error.
    pub async fn parse_email(&self, email: &InboundEmail) -> extract::Result<ParsedReceipt> {
        let today = self.today();
        let body = body_text(email);

        if let Some(receipt) = self.resolver().resolve(email, &body, today).await {
            return Ok(receipt);
        }

        self.parse_email_at(email, today)
    }

    /// [`ReceiptPipeline::parse_email`] with link resolution cut off at
    /// `deadline`. An elapsed deadline falls back to the body.
    pub async fn parse_email_until(
        &self,
        email: &InboundEmail,
        deadline: Instant,
    ) -> extract::Result<ParsedReceipt> {
        let today = self.today();
        let body = body_text(email);

        match tokio::time::timeout_at(deadline, self.resolver().resolve(email, &body, today)).await
        {
            Ok(Some(receipt)) => return Ok(receipt),
            Ok(None) => {}
            Err(_) => debug!("deadline elapsed during link resolution"),
        }

        self.parse_email_at(email, today)
    }

    /// Extract a receipt from pasted text, usually a bare invoice link.
    pub async fn parse_link_text(&self, text: &str) -> extract::Result<ParsedReceipt> {
        self.parse_email(&InboundEmail::from_pasted_link(text)).await
    }

    /// Extract a receipt from an email body without following links.
    pub fn parse_email_offline(&self, email: &InboundEmail) -> extract::Result<ParsedReceipt> {
        self.parse_email_at(email, self.today())
    }

    /// Extract a receipt from text already pulled out of a PDF.
    pub fn parse_pdf_text(&self, text: &str) -> extract::Result<ParsedReceipt> {
        if text.trim().chars().count() < self.config.pdf.min_text_length.max(1) {
            return Err(ExtractionError::EmptyInput);
        }

        PdfReceiptParser::new(&self.config.extraction).parse_at(text, self.today())
    }

    /// Extract a receipt from PDF file contents.
    pub fn parse_pdf_bytes(&self, data: &[u8]) -> crate::Result<ParsedReceipt> {
        let extractor = PdfExtractor::from_bytes(data)?;
        let text = extractor.extract_text_limited(self.config.pdf.max_pages)?;
        info!(chars = text.len(), "extracted PDF text");

        Ok(self.parse_pdf_text(&text)?)
    }

    fn parse_email_at(
        &self,
        email: &InboundEmail,
        today: NaiveDate,
    ) -> extract::Result<ParsedReceipt> {
        EmailReceiptParser::new(&self.config.extraction).parse_at(email, today)
    }

    fn resolver(&self) -> LinkResolver<'_, F> {
        LinkResolver::new(&self.config, &self.fetcher)
    }
}
