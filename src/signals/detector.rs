//! Pattern-based signal detection over a single document.
//!
//! The detector walks the registry category by category. Within a category the
//! first rule that matches wins and the rest are skipped, so a document yields
//! at most one candidate per category.

use crate::db::DbDocument;

use super::patterns::{registry, PatternRule, SignalCategory};

/// One category hit inside a search text.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub category: SignalCategory,
    pub rule: &'static PatternRule,
    pub matched_text: String,
    /// Character offset of the match within the search text.
    pub match_offset: usize,
    /// Byte range of the match, for slicing the search text.
    pub byte_start: usize,
    pub byte_end: usize,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.category == other.category
            && self.rule.index == other.rule.index
            && self.matched_text == other.matched_text
            && self.match_offset == other.match_offset
    }
}

/// Concatenate title, excerpt and body with single spaces.
///
/// Missing fields contribute an empty string, so the separators are always present.
pub fn search_text(doc: &DbDocument) -> String {
    format!(
        "{} {} {}",
        doc.title.as_deref().unwrap_or(""),
        doc.excerpt.as_deref().unwrap_or(""),
        doc.body.as_deref().unwrap_or(""),
    )
}

/// Run every category's rules against `text`.
pub fn detect(text: &str) -> Vec<Candidate> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let mut candidates = Vec::new();
    for (category, rules) in registry().groups() {
        for rule in rules {
            if let Some(m) = rule.regex().find(text) {
                candidates.push(Candidate {
                    category,
                    rule,
                    matched_text: m.as_str().to_string(),
                    match_offset: text[..m.start()].chars().count(),
                    byte_start: m.start(),
                    byte_end: m.end(),
                });
                break;
            }
        }
    }
    candidates
}

/// Detect over a document's combined text.
pub fn detect_document(doc: &DbDocument) -> Vec<Candidate> {
    detect(&search_text(doc))
}
