//! Signal store: append-only persistence for detected momentum signals.
//!
//! Rows are never updated or deleted. A document counts as scanned as soon as
//! any row references it, regardless of category.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{params, OptionalExtension};
use uuid::Uuid;

use crate::signals::extract::NewSignal;
use crate::signals::patterns::SignalCategory;
use crate::signals::scoring::StrengthLevel;

use super::{db_timestamp, DbError, DbSignal, MomentumDb};

impl ToSql for SignalCategory {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for SignalCategory {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let s = value.as_str()?;
        s.parse()
            .map_err(|_| FromSqlError::Other(format!("unknown signal category: {s}").into()))
    }
}

impl ToSql for StrengthLevel {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for StrengthLevel {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value.as_str()?.parse().map_err(|e: String| FromSqlError::Other(e.into()))
    }
}

const SIGNAL_COLUMNS: &str = "id, document_id, category, strength, confidence, headline, detail, source_excerpt, detected_at";

impl MomentumDb {
    fn map_signal_row(row: &rusqlite::Row) -> rusqlite::Result<DbSignal> {
        Ok(DbSignal {
            id: row.get(0)?,
            document_id: row.get(1)?,
            category: row.get(2)?,
            strength: row.get(3)?,
            confidence: row.get(4)?,
            headline: row.get(5)?,
            detail: row.get(6)?,
            source_excerpt: row.get(7)?,
            detected_at: row.get(8)?,
        })
    }

    /// True if any signal row references `document_id`.
    pub fn is_document_scanned(&self, document_id: &str) -> Result<bool, DbError> {
        let exists = self
            .conn_ref()
            .prepare("SELECT 1 FROM momentum_signals WHERE document_id = ?1 LIMIT 1")?
            .exists(params![document_id])?;
        Ok(exists)
    }

    /// Append one signal. Returns the generated signal ID.
    ///
    /// A second row for the same `(document_id, category)` is rejected with
    /// `DbError::Duplicate`; nothing is overwritten.
    pub fn insert_signal(&self, signal: &NewSignal) -> Result<String, DbError> {
        let id = format!("sig-{}", Uuid::new_v4());
        let result = self.conn_ref().execute(
            "INSERT INTO momentum_signals
                (id, document_id, category, strength, confidence, headline, detail, source_excerpt, detected_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                id,
                signal.document_id,
                signal.category,
                signal.strength,
                signal.confidence,
                signal.headline,
                signal.detail,
                signal.source_excerpt,
                db_timestamp(&signal.detected_at),
            ],
        );
        match result {
            Ok(_) => Ok(id),
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
            {
                Err(DbError::Duplicate {
                    document_id: signal.document_id.clone(),
                    category: signal.category,
                })
            }
            Err(e) => Err(DbError::Sqlite(e)),
        }
    }

    /// Fetch a single signal by id.
    pub fn get_signal(&self, id: &str) -> Result<Option<DbSignal>, DbError> {
        let sql = format!("SELECT {SIGNAL_COLUMNS} FROM momentum_signals WHERE id = ?1");
        let signal = self
            .conn_ref()
            .query_row(&sql, params![id], Self::map_signal_row)
            .optional()?;
        Ok(signal)
    }

    /// Signals detected at or after `since`, optionally for one category,
    /// most recent first. `limit` of `None` returns every row.
    pub fn query_signals(
        &self,
        category: Option<SignalCategory>,
        since: &DateTime<Utc>,
        limit: Option<usize>,
    ) -> Result<Vec<DbSignal>, DbError> {
        let sql = format!(
            "SELECT {SIGNAL_COLUMNS} FROM momentum_signals
             WHERE detected_at >= ?1
               AND (?2 IS NULL OR category = ?2)
             ORDER BY detected_at DESC, rowid DESC
             LIMIT ?3"
        );
        let mut stmt = self.conn_ref().prepare(&sql)?;
        let limit = limit.map(|l| l as i64).unwrap_or(-1);
        let rows = stmt.query_map(
            params![db_timestamp(since), category, limit],
            Self::map_signal_row,
        )?;
        let signals = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(signals)
    }

    /// Per-category counts of signals detected at or after `since`.
    /// Categories with no signals are absent from the map.
    pub fn count_signals_by_category(
        &self,
        since: &DateTime<Utc>,
    ) -> Result<BTreeMap<SignalCategory, i64>, DbError> {
        let mut stmt = self.conn_ref().prepare(
            "SELECT category, COUNT(*) FROM momentum_signals
             WHERE detected_at >= ?1
             GROUP BY category",
        )?;
        let rows = stmt.query_map(params![db_timestamp(since)], |row| {
            Ok((row.get::<_, SignalCategory>(0)?, row.get::<_, i64>(1)?))
        })?;

        let mut counts = BTreeMap::new();
        for row in rows {
            let (category, count) = row?;
            counts.insert(category, count);
        }
        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_utils::test_db;
    use chrono::Duration;

    fn signal(document_id: &str, category: SignalCategory, detected_at: DateTime<Utc>) -> NewSignal {
        NewSignal {
            document_id: document_id.to_string(),
            category,
            strength: StrengthLevel::Medium,
            confidence: 0.75,
            headline: Some("Headline".to_string()),
            detail: None,
            source_excerpt: "excerpt".to_string(),
            matched_text: "match".to_string(),
            rule_index: 0,
            detected_at,
        }
    }

    #[test]
    fn test_insert_and_get_signal() {
        let db = test_db();
        let now = Utc::now();
        let id = db
            .insert_signal(&signal("d1", SignalCategory::Deal, now))
            .expect("insert");
        assert!(id.starts_with("sig-"));

        let stored = db.get_signal(&id).expect("query").expect("present");
        assert_eq!(stored.document_id.as_deref(), Some("d1"));
        assert_eq!(stored.category, SignalCategory::Deal);
        assert_eq!(stored.strength, StrengthLevel::Medium);
        assert_eq!(stored.confidence, 0.75);
        assert_eq!(stored.detail, None);
        assert_eq!(stored.detected_at, db_timestamp(&now));
    }

    #[test]
    fn test_is_scanned_is_monotonic() {
        let db = test_db();
        assert!(!db.is_document_scanned("d1").unwrap());
        db.insert_signal(&signal("d1", SignalCategory::Award, Utc::now()))
            .expect("insert");
        assert!(db.is_document_scanned("d1").unwrap());
        // Another document's signal does not change it
        db.insert_signal(&signal("d2", SignalCategory::Award, Utc::now()))
            .expect("insert");
        assert!(db.is_document_scanned("d1").unwrap());
    }

    #[test]
    fn test_duplicate_category_rejected() {
        let db = test_db();
        db.insert_signal(&signal("d1", SignalCategory::Hiring, Utc::now()))
            .expect("first");
        let err = db
            .insert_signal(&signal("d1", SignalCategory::Hiring, Utc::now()))
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Duplicate { ref document_id, category: SignalCategory::Hiring } if document_id == "d1"
        ));
        // A different category for the same document is fine
        db.insert_signal(&signal("d1", SignalCategory::Deal, Utc::now()))
            .expect("other category");
    }

    #[test]
    fn test_append_then_query_returns_once() {
        let db = test_db();
        let now = Utc::now();
        let id = db
            .insert_signal(&signal("d1", SignalCategory::Partnership, now))
            .expect("insert");
        let since = now - Duration::days(30);

        let found = db
            .query_signals(Some(SignalCategory::Partnership), &since, None)
            .expect("query");
        assert_eq!(found.iter().filter(|s| s.id == id).count(), 1);

        let other = db
            .query_signals(Some(SignalCategory::Deal), &since, None)
            .expect("query");
        assert!(other.is_empty());
    }

    #[test]
    fn test_query_window_and_order() {
        let db = test_db();
        let now = Utc::now();
        db.insert_signal(&signal("old", SignalCategory::Deal, now - Duration::days(40)))
            .unwrap();
        db.insert_signal(&signal("mid", SignalCategory::Deal, now - Duration::days(10)))
            .unwrap();
        db.insert_signal(&signal("new", SignalCategory::Hiring, now - Duration::days(1)))
            .unwrap();

        let since = now - Duration::days(30);
        let docs: Vec<Option<String>> = db
            .query_signals(None, &since, None)
            .unwrap()
            .into_iter()
            .map(|s| s.document_id)
            .collect();
        assert_eq!(docs, vec![Some("new".to_string()), Some("mid".to_string())]);

        let limited = db.query_signals(None, &since, Some(1)).unwrap();
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0].document_id.as_deref(), Some("new"));
    }

    #[test]
    fn test_same_timestamp_orders_by_insertion() {
        let db = test_db();
        let now = Utc::now();
        let first = db.insert_signal(&signal("d1", SignalCategory::Deal, now)).unwrap();
        let second = db.insert_signal(&signal("d1", SignalCategory::Award, now)).unwrap();
        let found = db
            .query_signals(None, &(now - Duration::days(1)), None)
            .unwrap();
        assert_eq!(found[0].id, second);
        assert_eq!(found[1].id, first);
    }

    #[test]
    fn test_counts_by_category() {
        let db = test_db();
        let now = Utc::now();
        db.insert_signal(&signal("a", SignalCategory::Deal, now)).unwrap();
        db.insert_signal(&signal("b", SignalCategory::Deal, now)).unwrap();
        db.insert_signal(&signal("c", SignalCategory::Hiring, now)).unwrap();
        db.insert_signal(&signal("d", SignalCategory::Award, now - Duration::days(45)))
            .unwrap();

        let counts = db
            .count_signals_by_category(&(now - Duration::days(30)))
            .expect("counts");
        assert_eq!(counts.get(&SignalCategory::Deal), Some(&2));
        assert_eq!(counts.get(&SignalCategory::Hiring), Some(&1));
        assert_eq!(counts.get(&SignalCategory::Award), None);
    }

    #[test]
    fn test_unknown_category_in_row_is_an_error() {
        let db = test_db();
        // Bypass the CHECK constraint by disabling it for this connection
        db.conn_ref()
            .execute_batch("PRAGMA ignore_check_constraints = ON;")
            .unwrap();
        db.conn_ref()
            .execute(
                "INSERT INTO momentum_signals (id, document_id, category, strength, confidence, source_excerpt, detected_at)
                 VALUES ('sig-x', 'd1', 'ipo', 'high', 0.9, 'x', '2026-01-01T00:00:00.000Z')",
                [],
            )
            .unwrap();
        assert!(db.get_signal("sig-x").is_err());
    }
}
