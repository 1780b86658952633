//! Configuration structures for the extraction pipeline.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::receipt::Currency;
use crate::error::RcptError;

/// Main configuration for the rcpt pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RcptConfig {
    /// Field extraction configuration.
    pub extraction: ExtractionConfig,

    /// Invoice link resolution configuration.
    pub links: LinkConfig,

    /// PDF processing configuration.
    pub pdf: PdfConfig,

    /// Receipt log configuration.
    pub store: StoreConfig,
}

/// Receipt field extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Results scoring below this are rejected.
    pub min_confidence: f32,

    /// Warranty length applied when none is stated.
    pub default_warranty_months: u32,

    /// Currency used when the message carries no currency marker.
    pub default_currency: Currency,

    /// Currency used for invoice-hosting pages.
    pub invoice_currency: Currency,

    /// Maximum length (in characters) of extracted store/item text.
    pub max_field_len: usize,

    /// Body label values that are header collisions, not store names.
    pub store_stopwords: Vec<String>,

    /// Currency markers in priority order.
    pub currency_markers: Vec<CurrencyMarker>,

    /// Confidence weights.
    pub scoring: ScoringConfig,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.3,
            default_warranty_months: 12,
            default_currency: Currency::Usd,
            invoice_currency: Currency::Try,
            max_field_len: 100,
            store_stopwords: vec!["to".to_string(), "from".to_string(), "subject".to_string()],
            currency_markers: default_currency_markers(),
            scoring: ScoringConfig::default(),
        }
    }
}

/// A text marker that identifies the currency of a whole message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyMarker {
    pub currency: Currency,
    pub marker: String,
    /// Compare against the uppercased message instead of the raw one.
    #[serde(default)]
    pub case_insensitive: bool,
}

impl CurrencyMarker {
    pub fn new(currency: Currency, marker: &str, case_insensitive: bool) -> Self {
        Self {
            currency,
            marker: marker.to_string(),
            case_insensitive,
        }
    }
}

fn default_currency_markers() -> Vec<CurrencyMarker> {
    vec![
        CurrencyMarker::new(Currency::Eur, "€", false),
        CurrencyMarker::new(Currency::Eur, "EUR", false),
        CurrencyMarker::new(Currency::Gbp, "£", false),
        CurrencyMarker::new(Currency::Gbp, "GBP", false),
        CurrencyMarker::new(Currency::Try, "₺", false),
        CurrencyMarker::new(Currency::Try, " TL", true),
        CurrencyMarker::new(Currency::Try, "TRY", true),
    ]
}

/// Confidence weights per input channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Added per field found in an email body.
    pub email_field_weight: f32,

    /// Starting confidence for a resolved invoice link.
    pub invoice_baseline: f32,

    /// Added for store and amount found on an invoice page.
    pub invoice_field_weight: f32,

    /// Starting confidence for PDF text.
    pub pdf_baseline: f32,

    /// PDF confidence when store or item is missing.
    pub pdf_penalty: f32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            email_field_weight: 0.2,
            invoice_baseline: 0.4,
            invoice_field_weight: 0.3,
            pdf_baseline: 0.8,
            pdf_penalty: 0.3,
        }
    }
}

/// Invoice-hosting link configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    /// Follow invoice-hosting links found in messages.
    pub enabled: bool,

    /// Domains of known invoice-hosting services; subdomains match too.
    pub invoice_hosts: Vec<String>,

    /// Path substring identifying an invoice page.
    pub invoice_path_marker: String,

    /// Hard timeout for the page fetch.
    pub timeout_secs: u64,

    /// User agent sent with the fetch.
    pub user_agent: String,

    /// Largest invoice page read, in bytes.
    pub max_page_bytes: usize,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            invoice_hosts: vec!["efinans.com.tr".to_string()],
            invoice_path_marker: "/earsiv/".to_string(),
            timeout_secs: 10,
            user_agent: "Mozilla/5.0 (compatible; rcpt receipt parser)".to_string(),
            max_page_bytes: 2 * 1024 * 1024,
        }
    }
}

/// PDF processing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// Maximum pages to read (0 = unlimited).
    pub max_pages: usize,

    /// Minimum text length to consider a PDF readable.
    pub min_text_length: usize,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            max_pages: 0,
            min_text_length: 1,
        }
    }
}

/// Receipt log configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// JSON-lines file receipts are appended to.
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("receipts.jsonl"),
        }
    }
}

impl RcptConfig {
    /// Load a configuration file and reject out-of-range values.
    pub fn load(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| RcptError::Config(format!("{}: {}", path.display(), e)))?;

        let issues = config.validate();
        if !issues.is_empty() {
            return Err(RcptError::Config(format!(
                "{}:\n  - {}",
                path.display(),
                issues.join("\n  - ")
            )));
        }

        Ok(config)
    }

    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }

    /// Check value ranges; returns a description of each problem found.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if !(0.0..=1.0).contains(&self.extraction.min_confidence) {
            issues.push(format!(
                "extraction.min_confidence must be within 0..1, got {}",
                self.extraction.min_confidence
            ));
        }
        if self.extraction.max_field_len == 0 {
            issues.push("extraction.max_field_len must be positive".to_string());
        }
        if self.links.enabled && self.links.invoice_hosts.is_empty() {
            issues.push("links.invoice_hosts is empty while links are enabled".to_string());
        }
        if self.links.timeout_secs == 0 {
            issues.push("links.timeout_secs must be positive".to_string());
        }
        if self.links.max_page_bytes == 0 {
            issues.push("links.max_page_bytes must be positive".to_string());
        }

        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RcptConfig::default();
        assert_eq!(config.extraction.min_confidence, 0.3);
        assert_eq!(config.extraction.default_warranty_months, 12);
        assert_eq!(config.links.timeout_secs, 10);
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: RcptConfig =
            serde_json::from_str(r#"{"extraction":{"min_confidence":0.5},"links":{"enabled":false}}"#)
                .unwrap();

        assert_eq!(config.extraction.min_confidence, 0.5);
        assert_eq!(config.extraction.currency_markers.len(), 7);
        assert!(!config.links.enabled);
        assert_eq!(config.links.invoice_path_marker, "/earsiv/");
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = RcptConfig::default();
        config.extraction.default_currency = Currency::Gbp;
        config.save(&path).unwrap();

        let loaded = RcptConfig::from_file(&path).unwrap();
        assert_eq!(loaded.extraction.default_currency, Currency::Gbp);
    }

    #[test]
    fn test_validate_reports_bad_values() {
        let mut config = RcptConfig::default();
        config.extraction.min_confidence = 1.5;
        config.links.timeout_secs = 0;

        assert_eq!(config.validate().len(), 2);
    }

    #[test]
    fn test_load_rejects_invalid_files() {
        let dir = tempfile::tempdir().unwrap();

        let bad_value = dir.path().join("range.json");
        std::fs::write(&bad_value, r#"{"links":{"max_page_bytes":0}}"#).unwrap();
        let err = RcptConfig::load(&bad_value).unwrap_err();
        assert!(matches!(&err, RcptError::Config(msg) if msg.contains("links.max_page_bytes")));

        let bad_json = dir.path().join("broken.json");
        std::fs::write(&bad_json, "{ nope").unwrap();
        assert!(matches!(RcptConfig::load(&bad_json), Err(RcptError::Config(_))));

        let missing = dir.path().join("missing.json");
        assert!(matches!(RcptConfig::load(&missing), Err(RcptError::Io(_))));

        let good = dir.path().join("good.json");
        RcptConfig::default().save(&good).unwrap();
        assert!(RcptConfig::load(&good).is_ok());
    }
}
