//! Fan-out and result merging.
//!
//! One search request runs the relational query, then the spreadsheet scan,
//! sequentially, and concatenates the tagged hits in that fixed order.
//! Either source degrading to empty is logged by its adapter and does not
//! fail the request.

use sqlx::PgPool;

use crate::cache::SheetCache;
use crate::config::Config;
use crate::models::{SearchHit, SourceScan};
use crate::sheets::SheetSource;
use crate::{source_db, source_sheets};

/// A digits-only query searches document numbers; anything else searches
/// names term by term.
pub fn is_numeric_query(query: &str) -> bool {
    !query.is_empty() && query.chars().all(|c| c.is_ascii_digit())
}

/// Runs one search across both sources. `query` must be non-empty after
/// trimming — the boundary layer rejects empty queries before this point.
///
/// Ordering is relational first, then sheets in configured order; within a
/// source, match order. No ranking.
pub async fn run_search(
    pool: &PgPool,
    sheets: Option<&dyn SheetSource>,
    cache: &SheetCache,
    config: &Config,
    query: &str,
) -> Vec<SearchHit> {
    let query = query.trim();

    let db_scan = source_db::search_orders(pool, query, config.search.db_limit).await;
    let sheet_scan = source_sheets::search_sheets(sheets, cache, &config.sheets, query).await;

    tracing::info!(
        query = %query,
        total = db_scan.hits.len() + sheet_scan.hits.len(),
        db_fault = db_scan.fault.is_some(),
        sheets_fault = sheet_scan.fault.is_some(),
        "search completed"
    );

    merge_scans(db_scan, sheet_scan)
}

/// Concatenates the two scans in the fixed order: relational hits first,
/// then sheet hits. A degraded scan contributes whatever it salvaged.
fn merge_scans(db_scan: SourceScan, sheet_scan: SourceScan) -> Vec<SearchHit> {
    let mut hits = db_scan.hits;
    hits.extend(sheet_scan.hits);
    hits
}
