use crate::config::DEFAULT_EXCLUSION_KEYWORDS;
use crate::reader::SourceEvent;

/// Drops events whose summary or description mentions an exclusion term.
///
/// Matching is a case-insensitive substring test with no word boundaries, so
/// "loa" also matches "download".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordFilter {
    terms: Vec<String>,
}

impl Default for KeywordFilter {
    fn default() -> Self {
        Self::new(DEFAULT_EXCLUSION_KEYWORDS)
    }
}

impl KeywordFilter {
    pub fn new<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut normalized: Vec<String> = terms
            .into_iter()
            .map(|term| term.as_ref().trim().to_lowercase())
            .filter(|term| !term.is_empty())
            .collect();
        normalized.sort();
        normalized.dedup();
        Self { terms: normalized }
    }

    /// A filter that keeps every event.
    pub fn disabled() -> Self {
        Self { terms: Vec::new() }
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn is_disabled(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn should_exclude(&self, event: &SourceEvent) -> bool {
        self.matching_term(event).is_some()
    }

    pub fn matching_term(&self, event: &SourceEvent) -> Option<&str> {
        if self.terms.is_empty() {
            return None;
        }
        let summary = event.summary.to_lowercase();
        let description = event.description.to_lowercase();
        self.terms
            .iter()
            .find(|term| summary.contains(term.as_str()) || description.contains(term.as_str()))
            .map(String::as_str)
    }
}
