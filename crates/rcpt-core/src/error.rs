//! Error types for the rcpt-core library.

use thiserror::Error;

/// Main error type for the rcpt library.
#[derive(Error, Debug)]
pub enum RcptError {
    /// Receipt extraction error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Invoice page fetch error.
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// Receipt store error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors related to receipt field extraction.
///
/// Malformed amounts and dates never show up here: a capture that fails to
/// parse is treated as a field that was not found.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractionError {
    /// Too few fields were recognised to trust the result.
    #[error("unable to extract sufficient receipt data (confidence: {confidence:.2}, required: {threshold:.2})")]
    ParseFailed { confidence: f32, threshold: f32 },

    /// There was no text to extract from.
    #[error("no text to extract receipt data from")]
    EmptyInput,
}

impl ExtractionError {
    /// Whether this is a low-confidence rejection.
    pub fn is_parse_failed(&self) -> bool {
        matches!(self, ExtractionError::ParseFailed { .. })
    }
}

/// Errors from fetching an invoice-hosting page.
///
/// These are absorbed by the link resolver and only surface in logs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The link is not an http(s) URL with a host.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// The page body exceeded the configured size limit.
    #[error("page larger than {0} bytes")]
    TooLarge(usize),

    /// The server answered with a non-2xx status.
    #[error("HTTP {0}")]
    Status(u16),

    /// Connection, DNS or body read failure.
    #[error("request failed: {0}")]
    Transport(String),

    /// The request or the caller's deadline elapsed.
    #[error("request timed out")]
    Timeout,

    /// No fetcher is configured.
    #[error("link fetching is disabled")]
    Disabled,
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// Invalid page number requested.
    #[error("invalid page number: {0}")]
    InvalidPage(u32),
}

/// Errors from the receipt store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The backing file could not be read or written.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A record could not be serialized or deserialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A stored line is not a valid record.
    #[error("corrupt record on line {line}: {reason}")]
    Corrupt { line: usize, reason: String },
}

/// Result type for the rcpt library.
pub type Result<T> = std::result::Result<T, RcptError>;
