//! Receipt persistence.
//!
//! Only a [`ParsedReceipt`] can be turned into a [`NewReceipt`], and parsed
//! receipts only exist once they have passed the confidence gate, so a
//! rejected extraction has no way into a store.

use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::StoreError;
use crate::models::receipt::{Currency, ParsedReceipt, ReceiptSource, WarrantyStatus};

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// A receipt row ready to be persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewReceipt {
    pub store: String,
    pub item: String,
    pub purchase_date: NaiveDate,
    pub warranty_expiry: NaiveDate,
    pub amount: Decimal,
    pub currency: Currency,
    /// Warranty status at the time the row was written.
    pub status: WarrantyStatus,
    pub source: ReceiptSource,
    pub confidence: f32,
    /// Raw input the receipt was extracted from.
    pub original: String,
    /// Snapshot of the extraction result.
    pub parsed_data: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl NewReceipt {
    /// Build a row from an accepted extraction.
    pub fn from_parsed(parsed: &ParsedReceipt, original: &str, today: NaiveDate) -> Result<Self> {
        Ok(Self {
            store: parsed.store.clone(),
            item: parsed.item.clone(),
            purchase_date: parsed.purchase_date,
            warranty_expiry: parsed.warranty_expiry,
            amount: parsed.amount,
            currency: parsed.currency,
            status: parsed.status(today),
            source: parsed.source,
            confidence: parsed.confidence,
            original: original.to_string(),
            parsed_data: serde_json::to_value(parsed)?,
            created_at: Utc::now(),
        })
    }
}

/// A persisted receipt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredReceipt {
    pub id: usize,
    #[serde(flatten)]
    pub receipt: NewReceipt,
}

impl StoredReceipt {
    /// Warranty status recomputed for `today`; the stored status goes stale.
    pub fn current_status(&self, today: NaiveDate) -> WarrantyStatus {
        WarrantyStatus::classify(self.receipt.warranty_expiry, today)
    }
}

/// Storage for accepted receipts.
pub trait ReceiptStore {
    /// Persist a receipt and return it with its assigned id.
    fn insert(&mut self, receipt: NewReceipt) -> Result<StoredReceipt>;

    /// All stored receipts in insertion order.
    fn list(&self) -> Result<Vec<StoredReceipt>>;
}

/// Append-only JSON-lines receipt log.
///
/// One receipt per line; a receipt's id is its 1-based line number.
#[derive(Debug, Clone)]
pub struct JsonLinesStore {
    path: PathBuf,
}

impl JsonLinesStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn line_count(&self) -> Result<usize> {
        match fs::File::open(&self.path) {
            Ok(file) => Ok(BufReader::new(file).lines().count()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(0),
            Err(e) => Err(e.into()),
        }
    }
}

impl ReceiptStore for JsonLinesStore {
    fn insert(&mut self, receipt: NewReceipt) -> Result<StoredReceipt> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let id = self.line_count()? + 1;
        let line = serde_json::to_string(&receipt)?;

        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        writeln!(file, "{}", line)?;

        info!(id, store = %receipt.store, path = %self.path.display(), "saved receipt");
        Ok(StoredReceipt { id, receipt })
    }

    fn list(&self) -> Result<Vec<StoredReceipt>> {
        let file = match fs::File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no receipt log yet");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let mut receipts = Vec::new();
        for (idx, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            let receipt = serde_json::from_str(&line).map_err(|e| StoreError::Corrupt {
                line: idx + 1,
                reason: e.to_string(),
            })?;
            receipts.push(StoredReceipt { id: idx + 1, receipt });
        }

        Ok(receipts)
    }
}
