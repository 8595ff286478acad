//! Turn a document into ready-to-persist momentum signals.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::db::DbDocument;

use super::detector::{detect, search_text};
use super::patterns::SignalCategory;
use super::scoring::{classify_strength, confidence_for_source, source_excerpt, StrengthLevel};

/// A scored signal that has not been written to the store yet.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSignal {
    pub document_id: String,
    pub category: SignalCategory,
    pub strength: StrengthLevel,
    pub confidence: f64,
    pub headline: Option<String>,
    pub detail: Option<String>,
    pub source_excerpt: String,
    pub matched_text: String,
    /// Position of the winning rule within its category.
    pub rule_index: usize,
    pub detected_at: DateTime<Utc>,
}

/// Detect and score every category in `doc`.
///
/// Strength is classified once for the document and shared by all signals.
pub fn extract_signals(doc: &DbDocument, detected_at: DateTime<Utc>) -> Vec<NewSignal> {
    let text = search_text(doc);
    let candidates = detect(&text);
    if candidates.is_empty() {
        return Vec::new();
    }

    let strength = classify_strength(&text);
    candidates
        .iter()
        .map(|c| NewSignal {
            document_id: doc.id.clone(),
            category: c.category,
            strength,
            confidence: confidence_for_source(c.rule.source),
            headline: doc.title.clone(),
            detail: doc.excerpt.clone(),
            source_excerpt: source_excerpt(&text, c),
            matched_text: c.matched_text.clone(),
            rule_index: c.rule.index,
            detected_at,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(title: &str, excerpt: &str, body: &str) -> DbDocument {
        DbDocument {
            id: "art-42".to_string(),
            title: Some(title.to_string()),
            excerpt: Some(excerpt.to_string()),
            body: Some(body.to_string()),
            published_at: Some("2026-03-01T09:00:00.000Z".to_string()),
            created_at: "2026-03-01T09:00:00.000Z".to_string(),
            status: "published".to_string(),
        }
    }

    #[test]
    fn test_signals_copy_document_fields() {
        let d = doc(
            "Acme Capital hires new Managing Partner from Bridgepoint",
            "Senior appointment",
            "",
        );
        let now = Utc::now();
        let signals = extract_signals(&d, now);
        let hiring = signals
            .iter()
            .find(|s| s.category == SignalCategory::Hiring)
            .expect("hiring signal");
        assert_eq!(hiring.document_id, "art-42");
        assert_eq!(hiring.headline.as_deref(), Some(d.title.as_deref().unwrap()));
        assert_eq!(hiring.detail.as_deref(), Some("Senior appointment"));
        assert_eq!(hiring.detected_at, now);
        assert_eq!(hiring.rule_index, 0);
        assert_eq!(hiring.confidence, 0.9);
    }

    #[test]
    fn test_strength_shared_across_document() {
        let d = doc(
            "Northgate acquires rival in landmark deal",
            "The firm also opens new office in Riyadh",
            "It partners with a local bank.",
        );
        let signals = extract_signals(&d, Utc::now());
        assert!(signals.len() >= 3);
        assert!(signals.iter().all(|s| s.strength == StrengthLevel::High));
    }

    #[test]
    fn test_fund_close_scenario() {
        let d = doc("Fund closes at $1.2 billion, above target", "", "");
        let signals = extract_signals(&d, Utc::now());
        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].category, SignalCategory::FundClose);
        assert_eq!(signals[0].matched_text, "closes");
        assert_eq!(signals[0].strength, StrengthLevel::High);
        assert_eq!(signals[0].confidence, 0.9);
    }

    #[test]
    fn test_empty_document_yields_nothing() {
        let d = DbDocument {
            title: None,
            excerpt: None,
            body: None,
            ..doc("", "", "")
        };
        assert!(extract_signals(&d, Utc::now()).is_empty());
    }

    #[test]
    fn test_at_most_one_signal_per_category() {
        let d = doc(
            "Firm acquires peer and sells unit",
            "Also invests in a startup",
            "Then backs a buyout and completes a merger",
        );
        let signals = extract_signals(&d, Utc::now());
        let mut cats: Vec<SignalCategory> = signals.iter().map(|s| s.category).collect();
        let before = cats.len();
        cats.dedup();
        assert_eq!(before, cats.len());
    }
}
