//! CLI subcommands and the helpers they share.

pub mod batch;
pub mod config;
pub mod link;
pub mod list;
pub mod process;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail};
use chrono::NaiveDate;
use tracing::debug;

use rcpt_core::extract::today;
use rcpt_core::models::config::RcptConfig;
use rcpt_core::models::email::InboundEmail;
use rcpt_core::models::receipt::ParsedReceipt;
use rcpt_core::store::{JsonLinesStore, NewReceipt, ReceiptStore, StoredReceipt};
use rcpt_core::{ExtractionError, HttpFetcher, NoFetch, RcptError, ReceiptPipeline};

/// Extensions `process` and `batch` accept.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["json", "eml", "pdf", "txt", "html", "htm"];

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Text => "txt",
        }
    }
}

pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("rcpt")
        .join("config.json")
}

/// Load the config named on the command line, else the default file if it
/// exists, else built-in defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<RcptConfig> {
    match config_path {
        Some(path) => RcptConfig::load(Path::new(path))
            .map_err(|e| anyhow!("Failed to load config {}: {}", path, e)),
        None => {
            let path = default_config_path();
            if path.exists() {
                debug!("Using config file {}", path.display());
                Ok(RcptConfig::load(&path)?)
            } else {
                Ok(RcptConfig::default())
            }
        }
    }
}

/// A file read for extraction.
pub enum Input {
    Email { email: InboundEmail, original: String },
    Pdf(Vec<u8>),
}

/// Read an input file, choosing the reader by extension.
pub fn read_input(path: &Path) -> anyhow::Result<Input> {
    if !path.exists() {
        bail!("Input file not found: {}", path.display());
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    let input = match extension.as_str() {
        "pdf" => Input::Pdf(fs::read(path)?),
        "json" => {
            let raw = fs::read_to_string(path)?;
            let email: InboundEmail = serde_json::from_str(&raw)
                .map_err(|e| anyhow!("Invalid email payload {}: {}", path.display(), e))?;
            Input::Email { email, original: raw }
        }
        "eml" => {
            let raw = fs::read_to_string(path)?;
            Input::Email {
                email: InboundEmail::from_raw(&raw),
                original: raw,
            }
        }
        "html" | "htm" => {
            let raw = fs::read_to_string(path)?;
            let email = InboundEmail {
                html: raw.clone(),
                ..InboundEmail::default()
            };
            Input::Email { email, original: raw }
        }
        "txt" => {
            let raw = fs::read_to_string(path)?;
            Input::Email {
                email: InboundEmail::from_pasted_link(raw.as_str()),
                original: raw,
            }
        }
        _ => bail!("Unsupported file format: {}", extension),
    };

    Ok(input)
}

/// A pipeline with or without invoice-link fetching.
pub enum Extractor {
    Offline(ReceiptPipeline<NoFetch>),
    Online(ReceiptPipeline<HttpFetcher>),
}

impl Extractor {
    pub fn new(config: RcptConfig, offline: bool) -> anyhow::Result<Self> {
        if offline || !config.links.enabled {
            return Ok(Extractor::Offline(ReceiptPipeline::offline(config)));
        }
        Ok(Extractor::Online(ReceiptPipeline::with_http(config)?))
    }

    pub fn config(&self) -> &RcptConfig {
        match self {
            Extractor::Offline(pipeline) => pipeline.config(),
            Extractor::Online(pipeline) => pipeline.config(),
        }
    }

    pub async fn email(&self, email: &InboundEmail) -> anyhow::Result<ParsedReceipt> {
        let result = match self {
            Extractor::Offline(pipeline) => pipeline.parse_email(email).await,
            Extractor::Online(pipeline) => pipeline.parse_email(email).await,
        };
        result.map_err(rejection)
    }

    pub async fn link(&self, text: &str) -> anyhow::Result<ParsedReceipt> {
        let result = match self {
            Extractor::Offline(pipeline) => pipeline.parse_link_text(text).await,
            Extractor::Online(pipeline) => pipeline.parse_link_text(text).await,
        };
        result.map_err(rejection)
    }

    pub fn pdf(&self, data: &[u8]) -> anyhow::Result<ParsedReceipt> {
        let result = match self {
            Extractor::Offline(pipeline) => pipeline.parse_pdf_bytes(data),
            Extractor::Online(pipeline) => pipeline.parse_pdf_bytes(data),
        };
        result.map_err(|e| match e {
            RcptError::Extraction(e) => rejection(e),
            other => other.into(),
        })
    }

    /// Extract from a file read with [`read_input`]; returns the receipt and
    /// the raw text kept alongside it when saved.
    pub async fn input(&self, input: Input, path: &Path) -> anyhow::Result<(ParsedReceipt, String)> {
        match input {
            Input::Email { email, original } => Ok((self.email(&email).await?, original)),
            Input::Pdf(data) => Ok((self.pdf(&data)?, path.display().to_string())),
        }
    }
}

fn rejection(err: ExtractionError) -> anyhow::Error {
    match err {
        ExtractionError::ParseFailed { confidence, threshold } => anyhow!(
            "Couldn't read your receipt (confidence {:.0}%, required {:.0}%)",
            confidence * 100.0,
            threshold * 100.0
        ),
        ExtractionError::EmptyInput => anyhow!("Couldn't read your receipt: no text found"),
    }
}

/// Append an accepted receipt to the configured receipt log.
pub fn save_receipt(
    config: &RcptConfig,
    receipt: &ParsedReceipt,
    original: &str,
) -> anyhow::Result<StoredReceipt> {
    let mut store = JsonLinesStore::new(&config.store.path);
    let row = NewReceipt::from_parsed(receipt, original, today())?;
    Ok(store.insert(row)?)
}

pub fn format_receipt(
    receipt: &ParsedReceipt,
    format: OutputFormat,
    today: NaiveDate,
) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(receipt)?),
        OutputFormat::Csv => format_csv(receipt, today),
        OutputFormat::Text => Ok(format_text(receipt, today)),
    }
}

fn format_csv(receipt: &ParsedReceipt, today: NaiveDate) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "store",
        "item",
        "amount",
        "currency",
        "purchase_date",
        "warranty_expiry",
        "status",
        "confidence",
        "source",
    ])?;

    wtr.write_record([
        receipt.store.as_str(),
        receipt.item.as_str(),
        &receipt.amount.to_string(),
        receipt.currency.code(),
        &receipt.purchase_date.to_string(),
        &receipt.warranty_expiry.to_string(),
        receipt.status(today).as_str(),
        &format!("{:.2}", receipt.confidence),
        receipt.source.as_str(),
    ])?;

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(receipt: &ParsedReceipt, today: NaiveDate) -> String {
    let mut output = String::new();

    output.push_str(&format!("Store: {}\n", receipt.store));
    output.push_str(&format!("Item: {}\n", receipt.item));
    output.push_str(&format!("Amount: {}\n", receipt.formatted_amount()));
    output.push_str(&format!("Purchased: {}\n", receipt.purchase_date));
    output.push_str(&format!(
        "Warranty: until {} ({})\n",
        receipt.warranty_expiry,
        receipt.status(today)
    ));

    output
}
