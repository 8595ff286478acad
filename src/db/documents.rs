//! Document store: the articles the scanner reads from.

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};
use serde::Deserialize;

use super::{db_timestamp, DbDocument, DbError, MomentumDb};

/// Only documents in this status are offered to the scanner.
pub const PUBLISHED_STATUS: &str = "published";

/// An incoming document, as read from an import file.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDocument {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default, alias = "content")]
    pub body: Option<String>,
    #[serde(default, alias = "published_at")]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default, alias = "created_at")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: Option<String>,
}

impl MomentumDb {
    fn map_document_row(row: &rusqlite::Row) -> rusqlite::Result<DbDocument> {
        Ok(DbDocument {
            id: row.get(0)?,
            title: row.get(1)?,
            excerpt: row.get(2)?,
            body: row.get(3)?,
            published_at: row.get(4)?,
            created_at: row.get(5)?,
            status: row.get(6)?,
        })
    }

    /// Insert a document, replacing the text fields of an existing row with the same id.
    pub fn upsert_document(&self, doc: &NewDocument) -> Result<(), DbError> {
        let created_at = db_timestamp(&doc.created_at.unwrap_or_else(Utc::now));
        self.conn_ref().execute(
            "INSERT INTO documents (id, title, excerpt, body, published_at, created_at, status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                excerpt = excluded.excerpt,
                body = excluded.body,
                published_at = excluded.published_at,
                status = excluded.status",
            params![
                doc.id,
                doc.title,
                doc.excerpt,
                doc.body,
                doc.published_at.as_ref().map(db_timestamp),
                created_at,
                doc.status.as_deref().unwrap_or(PUBLISHED_STATUS),
            ],
        )?;
        Ok(())
    }

    /// Upsert a batch of documents atomically. Returns the number written.
    pub fn import_documents(&self, docs: &[NewDocument]) -> Result<usize, DbError> {
        self.with_transaction(|db| {
            for doc in docs {
                db.upsert_document(doc)?;
            }
            Ok(docs.len())
        })
    }

    /// Fetch a single document by id.
    pub fn get_document(&self, id: &str) -> Result<Option<DbDocument>, DbError> {
        let doc = self
            .conn_ref()
            .query_row(
                "SELECT id, title, excerpt, body, published_at, created_at, status
                 FROM documents WHERE id = ?1",
                params![id],
                Self::map_document_row,
            )
            .optional()?;
        Ok(doc)
    }

    /// Published documents with no recorded signal, most recently published first.
    pub fn list_unscanned_documents(&self, limit: usize) -> Result<Vec<DbDocument>, DbError> {
        let mut stmt = self.conn_ref().prepare(
            "SELECT d.id, d.title, d.excerpt, d.body, d.published_at, d.created_at, d.status
             FROM documents d
             WHERE d.status = ?1
               AND NOT EXISTS (
                   SELECT 1 FROM momentum_signals s WHERE s.document_id = d.id
               )
             ORDER BY COALESCE(d.published_at, d.created_at) DESC, d.id ASC
             LIMIT ?2",
        )?;
        let rows = stmt.query_map(
            params![PUBLISHED_STATUS, limit as i64],
            Self::map_document_row,
        )?;
        let docs = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(docs)
    }
}
