//! Read-only query surface over recorded signals.
//!
//! Inputs are validated before any storage access; everything else is
//! delegated to the signal store.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::db::{DbSignal, MomentumDb};
use crate::error::SignalError;

use super::patterns::SignalCategory;

pub const DEFAULT_WINDOW_DAYS: i64 = 30;
pub const DEFAULT_QUERY_LIMIT: usize = 50;

/// Parameters accepted by the query surface, as strings from the caller.
#[derive(Debug, Clone, Default)]
pub struct SignalQuery {
    pub category: Option<String>,
    pub window_days: Option<i64>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalQueryResult {
    pub signals: Vec<DbSignal>,
    pub counts: BTreeMap<SignalCategory, i64>,
    pub total: usize,
    pub window_days: i64,
}

/// Parse an optional category label. Absent or blank means "all categories".
pub fn parse_category(raw: Option<&str>) -> Result<Option<SignalCategory>, SignalError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s
            .parse()
            .map(Some)
            .map_err(|_| SignalError::InvalidCategory(s.to_string())),
    }
}

/// Validate a window in days, applying the default when absent.
pub fn validate_window(days: Option<i64>) -> Result<i64, SignalError> {
    match days {
        None => Ok(DEFAULT_WINDOW_DAYS),
        Some(d) if d > 0 => Ok(d),
        Some(d) => Err(SignalError::InvalidWindow(d)),
    }
}

/// Start of a trailing window of `days` ending at `now`.
pub fn window_start(now: DateTime<Utc>, days: i64) -> DateTime<Utc> {
    now - Duration::days(days)
}

pub struct QueryService<'a> {
    db: &'a MomentumDb,
}

impl<'a> QueryService<'a> {
    pub fn new(db: &'a MomentumDb) -> Self {
        Self { db }
    }

    /// Signals in the trailing window, optionally for one category, most recent first.
    pub fn signals(&self, query: &SignalQuery) -> Result<Vec<DbSignal>, SignalError> {
        let category = parse_category(query.category.as_deref())?;
        let days = validate_window(query.window_days)?;
        let limit = query.limit.unwrap_or(DEFAULT_QUERY_LIMIT);
        let since = window_start(Utc::now(), days);
        Ok(self.db.query_signals(category, &since, Some(limit))?)
    }

    /// A single recorded signal by id.
    pub fn signal(&self, id: &str) -> Result<DbSignal, SignalError> {
        self.db
            .get_signal(id)?
            .ok_or_else(|| SignalError::NotFound(format!("signal {}", id)))
    }

    /// Per-category counts over the trailing window.
    pub fn counts(&self, window_days: Option<i64>) -> Result<BTreeMap<SignalCategory, i64>, SignalError> {
        let days = validate_window(window_days)?;
        let since = window_start(Utc::now(), days);
        Ok(self.db.count_signals_by_category(&since)?)
    }

    /// Signals plus counts over the same window, in one response.
    pub fn signals_with_counts(&self, query: &SignalQuery) -> Result<SignalQueryResult, SignalError> {
        let signals = self.signals(query)?;
        let window_days = validate_window(query.window_days)?;
        let counts = self.counts(Some(window_days))?;
        Ok(SignalQueryResult {
            total: signals.len(),
            signals,
            counts,
            window_days,
        })
    }
}
