//! Rule-based field extractors for receipt text.

pub mod amounts;
pub mod dates;
pub mod item;
pub mod patterns;
pub mod store;

pub use amounts::{detect_currency, normalize_amount, AmountExtractor};
pub use dates::{add_months, parse_date, PurchaseDateExtractor, WarrantyExtractor};
pub use item::ItemExtractor;
pub use store::StoreExtractor;

use regex::{Captures, Regex};
use tracing::trace;

/// Trait for field extractors.
pub trait FieldExtractor {
    /// The type of value this extractor produces.
    type Output;

    /// Extract the field from text; `None` means "not found".
    fn extract(&self, text: &str) -> Option<ExtractionMatch<Self::Output>>;
}

/// A value found by a cascade, with where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionMatch<T> {
    /// Extracted value.
    pub value: T,
    /// Index of the cascade pattern that produced the value.
    pub pattern: usize,
    /// Byte range of the match in the searched text.
    pub position: Option<(usize, usize)>,
    /// Source text that was matched.
    pub source: String,
}

impl<T> ExtractionMatch<T> {
    pub fn new(value: T, pattern: usize, source: impl Into<String>) -> Self {
        Self {
            value,
            pattern,
            position: None,
            source: source.into(),
        }
    }

    pub fn with_position(mut self, start: usize, end: usize) -> Self {
        self.position = Some((start, end));
        self
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ExtractionMatch<U> {
        ExtractionMatch {
            value: f(self.value),
            pattern: self.pattern,
            position: self.position,
            source: self.source,
        }
    }
}

/// An ordered list of patterns tried until one yields an accepted value.
#[derive(Debug, Clone)]
pub struct Cascade {
    name: &'static str,
    patterns: Vec<Regex>,
}

impl Cascade {
    /// Compile a cascade from pattern sources, keeping their order.
    pub fn compile(name: &'static str, patterns: &[&str]) -> Result<Self, regex::Error> {
        let patterns = patterns
            .iter()
            .map(|p| Regex::new(p))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { name, patterns })
    }

    /// Build a cascade from already compiled patterns.
    pub fn from_regexes(name: &'static str, patterns: Vec<Regex>) -> Self {
        Self { name, patterns }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn patterns(&self) -> &[Regex] {
        &self.patterns
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Try each pattern's first match in order; a rejected candidate moves
    /// on to the next pattern.
    pub fn first_match<T>(
        &self,
        text: &str,
        mut accept: impl FnMut(&Captures<'_>) -> Option<T>,
    ) -> Option<ExtractionMatch<T>> {
        for (index, pattern) in self.patterns.iter().enumerate() {
            let Some(caps) = pattern.captures(text) else {
                continue;
            };
            match accept(&caps) {
                Some(value) => return Some(hit(value, index, &caps)),
                None => trace!(cascade = self.name, pattern = index, "candidate rejected"),
            }
        }
        None
    }

    /// Like [`Cascade::first_match`], but within a pattern the last
    /// accepted match in the text wins.
    pub fn last_match<T>(
        &self,
        text: &str,
        mut accept: impl FnMut(&Captures<'_>) -> Option<T>,
    ) -> Option<ExtractionMatch<T>> {
        for (index, pattern) in self.patterns.iter().enumerate() {
            let mut last = None;
            for caps in pattern.captures_iter(text) {
                if let Some(value) = accept(&caps) {
                    last = Some(hit(value, index, &caps));
                }
            }
            if last.is_some() {
                return last;
            }
        }
        None
    }

    /// Group 1 of the first pattern that matches.
    pub fn first_capture(&self, text: &str) -> Option<ExtractionMatch<String>> {
        self.first_match(text, |caps| group(caps, 1).map(str::to_string))
    }
}

/// Text of a capture group, if it participated in the match.
pub fn group<'t>(caps: &Captures<'t>, index: usize) -> Option<&'t str> {
    caps.get(index).map(|m| m.as_str())
}

fn hit<T>(value: T, index: usize, caps: &Captures<'_>) -> ExtractionMatch<T> {
    let whole = caps.get_match();
    ExtractionMatch::new(value, index, whole.as_str()).with_position(whole.start(), whole.end())
}
