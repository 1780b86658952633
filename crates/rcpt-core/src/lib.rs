//! Core library for receipt extraction.
//!
//! This crate provides:
//! - Heuristic field extraction from email bodies (store, item, amount,
//!   purchase date, warranty expiry) with confidence scoring
//! - e-Arşiv invoice link resolution through an injected page fetcher
//! - PDF receipt text extraction and parsing
//! - Warranty status tracking and a JSON-lines receipt log

pub mod error;
pub mod extract;
pub mod links;
pub mod models;
pub mod pdf;
pub mod pipeline;
pub mod store;

pub use error::{ExtractionError, FetchError, PdfError, RcptError, Result, StoreError};
pub use extract::{EmailReceiptParser, InvoicePageParser, PdfReceiptParser, ReceiptParser};
pub use links::{detect_invoice_links, LinkResolver, NoFetch, PageFetcher};
pub use models::config::RcptConfig;
pub use models::email::InboundEmail;
pub use models::receipt::{Currency, ParsedReceipt, ReceiptSource, WarrantyStatus};
pub use pdf::{PdfExtractor, PdfProcessor};
pub use pipeline::ReceiptPipeline;
pub use store::{JsonLinesStore, NewReceipt, ReceiptStore, StoredReceipt};

#[cfg(feature = "http")]
pub use links::HttpFetcher;
