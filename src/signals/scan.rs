//! Scan orchestration: unscanned documents → detection → scoring → append.
//!
//! A scan is a bounded, on-demand batch. Dedup is at document granularity: a
//! document drops out of the candidate list once any signal references it, so
//! a document that matched nothing stays eligible and is re-examined on every
//! pass, and documents scanned under an older rule set are never revisited.

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::db::{DbDocument, DbError, MomentumDb};
use crate::error::SignalError;

use super::extract::{extract_signals, NewSignal};
use super::patterns::registry;

/// Store operations the orchestrator needs.
pub trait SignalStore {
    fn list_unscanned_documents(&self, limit: usize) -> Result<Vec<DbDocument>, DbError>;
    fn is_scanned(&self, document_id: &str) -> Result<bool, DbError>;
    fn append(&self, signal: &NewSignal) -> Result<String, DbError>;
}

impl SignalStore for MomentumDb {
    fn list_unscanned_documents(&self, limit: usize) -> Result<Vec<DbDocument>, DbError> {
        MomentumDb::list_unscanned_documents(self, limit)
    }

    fn is_scanned(&self, document_id: &str) -> Result<bool, DbError> {
        self.is_document_scanned(document_id)
    }

    fn append(&self, signal: &NewSignal) -> Result<String, DbError> {
        self.insert_signal(signal)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanState {
    Idle,
    Scanning,
}

/// Totals for one scan pass.
///
/// `scanned` and `inserted` are the headline numbers. `candidates - inserted`
/// is split between `failed` (store errors) and `duplicates` (already recorded).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanReport {
    pub scanned: usize,
    pub inserted: usize,
    pub candidates: usize,
    pub failed: usize,
    pub duplicates: usize,
    /// Documents whose signals were all skipped because another pass recorded them first.
    pub skipped_documents: usize,
    /// Documents with at least one failed append.
    pub failed_documents: Vec<String>,
}

pub struct ScanOrchestrator<'a, S: SignalStore> {
    store: &'a S,
    scanning: AtomicBool,
}

/// Resets the orchestrator to `Idle` when the pass ends, including on early return.
struct ScanGuard<'g>(&'g AtomicBool);

impl Drop for ScanGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<'a, S: SignalStore> ScanOrchestrator<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            scanning: AtomicBool::new(false),
        }
    }

    pub fn state(&self) -> ScanState {
        if self.scanning.load(Ordering::Acquire) {
            ScanState::Scanning
        } else {
            ScanState::Idle
        }
    }

    /// Scan up to `max_documents` unscanned documents, stamping signals with now.
    pub fn run_scan(&self, max_documents: usize) -> Result<ScanReport, SignalError> {
        self.run_scan_at(max_documents, Utc::now())
    }

    /// Scan with an explicit detection timestamp shared by every signal in the pass.
    pub fn run_scan_at(
        &self,
        max_documents: usize,
        detected_at: DateTime<Utc>,
    ) -> Result<ScanReport, SignalError> {
        if self
            .scanning
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(SignalError::ScanInProgress);
        }
        let _guard = ScanGuard(&self.scanning);

        log::info!(
            "Signal scan starting (max {} documents, {} rules)",
            max_documents,
            registry().rule_count()
        );
        let documents = self.store.list_unscanned_documents(max_documents)?;

        let mut report = ScanReport::default();
        for doc in &documents {
            report.scanned += 1;
            self.scan_document(doc, detected_at, &mut report);
        }

        log::info!(
            "Signal scan finished: {} scanned, {} candidates, {} inserted, {} failed, {} duplicates",
            report.scanned,
            report.candidates,
            report.inserted,
            report.failed,
            report.duplicates
        );
        Ok(report)
    }

    fn scan_document(&self, doc: &DbDocument, detected_at: DateTime<Utc>, report: &mut ScanReport) {
        let signals = extract_signals(doc, detected_at);
        report.candidates += signals.len();
        log::debug!("Document {}: {} candidate signal(s)", doc.id, signals.len());
        if signals.is_empty() {
            return;
        }

        // Another pass may have claimed this document since it was listed
        match self.store.is_scanned(&doc.id) {
            Ok(true) => {
                log::debug!("Document {} already has signals, skipping", doc.id);
                report.skipped_documents += 1;
                report.duplicates += signals.len();
                return;
            }
            Ok(false) => {}
            Err(e) => {
                log::warn!("Dedup check failed for document {}: {}", doc.id, e);
                report.failed += signals.len();
                report.failed_documents.push(doc.id.clone());
                return;
            }
        }

        let mut doc_failed = false;
        for signal in &signals {
            match self.store.append(signal) {
                Ok(id) => {
                    report.inserted += 1;
                    log::debug!("Recorded {} signal {} for document {}", signal.category, id, doc.id);
                }
                Err(DbError::Duplicate { .. }) => {
                    report.duplicates += 1;
                }
                Err(e) => {
                    log::warn!(
                        "Failed to persist {} signal for document {}: {}",
                        signal.category,
                        doc.id,
                        e
                    );
                    report.failed += 1;
                    doc_failed = true;
                }
            }
        }
        if doc_failed {
            report.failed_documents.push(doc.id.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::documents::NewDocument;
    use crate::db::test_utils::test_db;
    use crate::signals::patterns::SignalCategory;
    use chrono::{Duration, TimeZone};
    use std::cell::RefCell;

    fn new_doc(id: &str, title: &str, days_ago: i64) -> NewDocument {
        NewDocument {
            id: id.to_string(),
            title: Some(title.to_string()),
            excerpt: None,
            body: None,
            published_at: Some(Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap() - Duration::days(days_ago)),
            created_at: None,
            status: None,
        }
    }

    fn seeded_db(docs: &[NewDocument]) -> MomentumDb {
        let db = test_db();
        db.import_documents(docs).expect("import");
        db
    }

    #[test]
    fn test_scan_inserts_and_reports() {
        let db = seeded_db(&[
            new_doc("a", "Fund closes at $1.2 billion, above target", 1),
            new_doc("b", "Harbor launches new fund for secondaries", 2),
            new_doc("c", "Quarterly commentary on interest rates", 3),
        ]);
        let report = ScanOrchestrator::new(&db).run_scan(50).expect("scan");
        assert_eq!(report.scanned, 3);
        // a: fund_close; b: spinout + fund_launch; c: nothing
        assert_eq!(report.candidates, 3);
        assert_eq!(report.inserted, 3);
        assert_eq!(report.failed, 0);
        assert!(db.is_document_scanned("a").unwrap());
        assert!(!db.is_document_scanned("c").unwrap());
    }

    #[test]
    fn test_second_scan_skips_scanned_documents() {
        let db = seeded_db(&[
            new_doc("a", "Firm acquires rival", 1),
            new_doc("empty", "", 2),
        ]);
        let orchestrator = ScanOrchestrator::new(&db);
        let first = orchestrator.run_scan(50).expect("first");
        assert_eq!(first.scanned, 2);
        assert_eq!(first.inserted, 1);

        // The zero-candidate document stays eligible forever
        let second = orchestrator.run_scan(50).expect("second");
        assert_eq!(second.scanned, 1);
        assert_eq!(second.inserted, 0);
        let remaining = db.list_unscanned_documents(50).unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, "empty");
    }

    #[test]
    fn test_batch_bound_respects_recency() {
        let db = seeded_db(&[
            new_doc("older", "Firm acquires rival", 5),
            new_doc("newer", "Firm partners with bank", 1),
        ]);
        let report = ScanOrchestrator::new(&db).run_scan(1).expect("scan");
        assert_eq!(report.scanned, 1);
        assert!(db.is_document_scanned("newer").unwrap());
        assert!(!db.is_document_scanned("older").unwrap());
    }

    #[test]
    fn test_signals_share_scan_timestamp() {
        let db = seeded_db(&[new_doc("a", "Harbor launches new fund", 1)]);
        let at = Utc.with_ymd_and_hms(2026, 6, 2, 8, 0, 0).unwrap();
        ScanOrchestrator::new(&db).run_scan_at(10, at).expect("scan");
        let signals = db.query_signals(None, &(at - Duration::days(1)), None).unwrap();
        assert_eq!(signals.len(), 2);
        assert!(signals.iter().all(|s| s.detected_at == "2026-06-02T08:00:00.000Z"));
    }

    #[test]
    fn test_state_returns_to_idle() {
        let db = seeded_db(&[]);
        let orchestrator = ScanOrchestrator::new(&db);
        assert_eq!(orchestrator.state(), ScanState::Idle);
        orchestrator.run_scan(5).expect("scan");
        assert_eq!(orchestrator.state(), ScanState::Idle);
    }

    // -----------------------------------------------------------------------
    // Store fakes
    // -----------------------------------------------------------------------

    fn doc(id: &str, title: &str) -> DbDocument {
        DbDocument {
            id: id.to_string(),
            title: Some(title.to_string()),
            excerpt: None,
            body: None,
            published_at: None,
            created_at: "2026-01-01T00:00:00.000Z".to_string(),
            status: "published".to_string(),
        }
    }

    /// In-memory store whose appends fail for one category.
    struct FlakyStore {
        docs: Vec<DbDocument>,
        fail_category: SignalCategory,
        appended: RefCell<Vec<NewSignal>>,
    }

    impl SignalStore for FlakyStore {
        fn list_unscanned_documents(&self, limit: usize) -> Result<Vec<DbDocument>, DbError> {
            Ok(self.docs.iter().take(limit).cloned().collect())
        }

        fn is_scanned(&self, document_id: &str) -> Result<bool, DbError> {
            Ok(self.appended.borrow().iter().any(|s| s.document_id == document_id))
        }

        fn append(&self, signal: &NewSignal) -> Result<String, DbError> {
            if signal.category == self.fail_category {
                return Err(DbError::Sqlite(rusqlite::Error::InvalidQuery));
            }
            self.appended.borrow_mut().push(signal.clone());
            Ok(format!("sig-{}", self.appended.borrow().len()))
        }
    }

    #[test]
    fn test_append_failure_does_not_abort_scan() {
        let store = FlakyStore {
            docs: vec![
                doc("a", "Harbor launches new fund"),
                doc("b", "Firm acquires rival"),
            ],
            fail_category: SignalCategory::Spinout,
            appended: RefCell::new(Vec::new()),
        };
        let report = ScanOrchestrator::new(&store).run_scan(10).expect("scan");
        assert_eq!(report.scanned, 2);
        assert_eq!(report.candidates, 3);
        assert_eq!(report.inserted, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.failed_documents, vec!["a".to_string()]);
        let cats: Vec<SignalCategory> = store.appended.borrow().iter().map(|s| s.category).collect();
        assert_eq!(cats, vec![SignalCategory::FundLaunch, SignalCategory::Deal]);
    }

    struct DownStore;

    impl SignalStore for DownStore {
        fn list_unscanned_documents(&self, _limit: usize) -> Result<Vec<DbDocument>, DbError> {
            Err(DbError::Sqlite(rusqlite::Error::InvalidQuery))
        }
        fn is_scanned(&self, _document_id: &str) -> Result<bool, DbError> {
            unreachable!("listing failed")
        }
        fn append(&self, _signal: &NewSignal) -> Result<String, DbError> {
            unreachable!("listing failed")
        }
    }

    #[test]
    fn test_document_store_outage_fails_scan() {
        let orchestrator = ScanOrchestrator::new(&DownStore);
        let err = orchestrator.run_scan(10).unwrap_err();
        assert!(matches!(err, SignalError::Db(_)));
        assert_eq!(orchestrator.state(), ScanState::Idle);
    }

    #[test]
    fn test_concurrent_scan_rejected() {
        let db = seeded_db(&[new_doc("a", "Firm acquires rival", 1)]);
        let orchestrator = ScanOrchestrator::new(&db);
        orchestrator.scanning.store(true, Ordering::Release);
        assert_eq!(orchestrator.state(), ScanState::Scanning);
        let err = orchestrator.run_scan(10).unwrap_err();
        assert!(matches!(err, SignalError::ScanInProgress));
        // The rejected call must not reset the running pass
        assert_eq!(orchestrator.state(), ScanState::Scanning);
        assert!(!db.is_document_scanned("a").unwrap());
    }

    #[test]
    fn test_scan_skips_documents_claimed_elsewhere() {
        let store = FlakyStore {
            docs: vec![doc("a", "Firm acquires rival"), doc("a", "Firm acquires rival")],
            fail_category: SignalCategory::Award,
            appended: RefCell::new(Vec::new()),
        };
        let report = ScanOrchestrator::new(&store).run_scan(10).expect("scan");
        assert_eq!(report.inserted, 1);
        assert_eq!(report.skipped_documents, 1);
        assert_eq!(report.duplicates, 1);
    }
}
