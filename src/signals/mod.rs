//! Momentum signal extraction (detect → score → persist → query).
//!
//! Documents are matched against a fixed, ordered rule registry. Each hit is
//! scored for strength (indicator words across the document) and confidence
//! (rule specificity), then appended to the signal store. Scans are
//! incremental: a document with any recorded signal is never scanned again.

pub mod detector;
pub mod extract;
pub mod patterns;
pub mod query;
pub mod scan;
pub mod scoring;
