//! Shared type definitions for the database layer.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::signals::patterns::SignalCategory;
use crate::signals::scoring::StrengthLevel;

/// Errors specific to database operations.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Home directory not found")]
    HomeDirNotFound,

    #[error("Failed to create database directory: {0}")]
    CreateDir(std::io::Error),

    #[error("Schema migration failed: {0}")]
    Migration(String),

    #[error("Signal already recorded for document {document_id} ({category})")]
    Duplicate {
        document_id: String,
        category: SignalCategory,
    },
}

/// A row from the `documents` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DbDocument {
    pub id: String,
    pub title: Option<String>,
    pub excerpt: Option<String>,
    pub body: Option<String>,
    pub published_at: Option<String>,
    pub created_at: String,
    pub status: String,
}

/// A row from the `momentum_signals` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DbSignal {
    pub id: String,
    pub document_id: Option<String>,
    pub category: SignalCategory,
    pub strength: StrengthLevel,
    pub confidence: f64,
    pub headline: Option<String>,
    pub detail: Option<String>,
    pub source_excerpt: String,
    pub detected_at: String,
}
