//! Item / description extraction.

use tracing::debug;

use super::patterns::ITEM;
use super::{group, ExtractionMatch, FieldExtractor};
use crate::extract::normalize::clean_text;

/// Item field extractor (`Item:`, `Product:`, `Description:`, `Order details:`).
pub struct ItemExtractor {
    max_len: usize,
}

impl ItemExtractor {
    pub fn new(max_len: usize) -> Self {
        Self { max_len }
    }
}

impl FieldExtractor for ItemExtractor {
    type Output = String;

    fn extract(&self, text: &str) -> Option<ExtractionMatch<String>> {
        let hit = ITEM.first_match(text, |caps| {
            let cleaned = clean_text(group(caps, 1)?, self.max_len);
            (!cleaned.is_empty()).then_some(cleaned)
        })?;
        debug!(item = %hit.value, pattern = hit.pattern, "item matched");
        Some(hit)
    }
}
