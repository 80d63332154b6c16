//! Core data models used throughout Permit Lookup.
//!
//! These types represent the records, search hits, and audit rows that flow
//! through the two source adapters and the merge step.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A row from either source, as field-name → value.
///
/// `serde_json::Map` rather than a typed struct because the two sources carry
/// different column sets and unmapped keys pass through unchanged.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// One merged search result: a canonical record tagged with its origin.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    /// `"PostgreSQL"` or `"Google Sheets - <sheet name>"`.
    pub source: String,
    pub data: Record,
}

/// Outcome of one source adapter scan.
///
/// A fault never propagates to the caller: the adapter reports it here so
/// the search can still surface the other source's hits.
#[derive(Debug, Default)]
pub struct SourceScan {
    pub hits: Vec<SearchHit>,
    /// Set when the source degraded to an empty (or partial) result.
    pub fault: Option<String>,
}

impl SourceScan {
    pub fn ok(hits: Vec<SearchHit>) -> Self {
        Self { hits, fault: None }
    }

    pub fn degraded(fault: impl Into<String>) -> Self {
        Self {
            hits: Vec::new(),
            fault: Some(fault.into()),
        }
    }
}

/// One persisted row of the `historial_busquedas` audit table.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct AuditEntry {
    pub id: i32,
    pub timestamp: Option<DateTime<Utc>>,
    pub email: Option<String>,
    pub query: String,
    pub results_count: Option<i32>,
    pub first_result_source: Option<String>,
    pub first_result_name: Option<String>,
}

/// Counters reported by the admin stats endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct Stats {
    pub query_count: i64,
    pub record_count: i64,
}
