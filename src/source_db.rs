//! Relational search adapter.
//!
//! Queries the `orders` table by document number or by name terms. The
//! document condition is always present: `nro_documento ILIKE '%query%'`.
//! A non-numeric query additionally builds a name condition — every
//! whitespace term must appear, accent- and case-insensitively, in the
//! first-name or last-name column — OR'd with the document condition so a
//! numeric-looking name segment still searches documents.
//!
//! Execution errors degrade to an empty scan with a logged fault; the
//! caller never observes a raised error from this adapter, so a dead
//! database still surfaces spreadsheet-only results.

use sqlx::postgres::PgRow;
use sqlx::{Column, PgPool, Row, TypeInfo};

use crate::models::{Record, SearchHit, SourceScan};
use crate::normalize::{fold, standardize_record};
use crate::search::is_numeric_query;

pub const SOURCE_NAME: &str = "PostgreSQL";

/// Searches the order table. `query` must already be trimmed and non-empty.
pub async fn search_orders(pool: &PgPool, query: &str, limit: i64) -> SourceScan {
    match run_query(pool, query, limit).await {
        Ok(hits) => SourceScan::ok(hits),
        Err(e) => {
            tracing::warn!(error = %e, "relational search degraded to empty");
            SourceScan::degraded(e.to_string())
        }
    }
}

async fn run_query(pool: &PgPool, query: &str, limit: i64) -> anyhow::Result<Vec<SearchHit>> {
    let (sql, binds) = build_query(query, limit);

    let mut q = sqlx::query(&sql);
    for bind in &binds {
        q = q.bind(bind.as_str());
    }
    let rows = q.fetch_all(pool).await?;

    Ok(rows
        .iter()
        .map(|row| SearchHit {
            source: SOURCE_NAME.to_string(),
            data: standardize_record(row_to_record(row)),
        })
        .collect())
}

/// Builds the parameterized SQL and its bind values.
fn build_query(query: &str, limit: i64) -> (String, Vec<String>) {
    let mut binds = vec![format!("%{}%", query)];

    let mut sql = String::from("SELECT * FROM orders WHERE nro_documento ILIKE $1");

    if !is_numeric_query(query) {
        let mut term_conditions = Vec::new();
        for term in query.split_whitespace() {
            let idx = binds.len() + 1;
            term_conditions.push(format!(
                "(unaccent(LOWER(customer_first_name)) LIKE ${idx} \
                 OR unaccent(LOWER(customer_last_name)) LIKE ${idx})"
            ));
            binds.push(format!("%{}%", fold(term)));
        }
        sql.push_str(&format!(" OR ({})", term_conditions.join(" AND ")));
    }

    sql.push_str(&format!(" LIMIT {}", limit));
    (sql, binds)
}

/// Converts a dynamically-typed row into a field-name → JSON value record.
///
/// Column types outside the handled set decode as text when possible and
/// fall back to null, so an unexpected schema never fails the scan.
fn row_to_record(row: &PgRow) -> Record {
    let mut record = Record::new();
    for (idx, column) in row.columns().iter().enumerate() {
        let value = match column.type_info().name() {
            "INT2" | "INT4" | "INT8" => row
                .try_get::<Option<i64>, _>(idx)
                .ok()
                .flatten()
                .map(serde_json::Value::from)
                .unwrap_or(serde_json::Value::Null),
            "FLOAT4" | "FLOAT8" => row
                .try_get::<Option<f64>, _>(idx)
                .ok()
                .flatten()
                .map(serde_json::Value::from)
                .unwrap_or(serde_json::Value::Null),
            "BOOL" => row
                .try_get::<Option<bool>, _>(idx)
                .ok()
                .flatten()
                .map(serde_json::Value::from)
                .unwrap_or(serde_json::Value::Null),
            "DATE" => row
                .try_get::<Option<chrono::NaiveDate>, _>(idx)
                .ok()
                .flatten()
                .map(|d| serde_json::Value::from(d.to_string()))
                .unwrap_or(serde_json::Value::Null),
            "TIMESTAMP" => row
                .try_get::<Option<chrono::NaiveDateTime>, _>(idx)
                .ok()
                .flatten()
                .map(|t| serde_json::Value::from(t.to_string()))
                .unwrap_or(serde_json::Value::Null),
            // NUMERIC does not decode as String; render it as its exact
            // decimal text so money-like columns survive the conversion.
            "NUMERIC" => row
                .try_get::<Option<sqlx::types::BigDecimal>, _>(idx)
                .ok()
                .flatten()
                .map(|n| serde_json::Value::from(n.to_string()))
                .unwrap_or(serde_json::Value::Null),
            "TIMESTAMPTZ" => row
                .try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(idx)
                .ok()
                .flatten()
                .map(|t| serde_json::Value::from(t.to_rfc3339()))
                .unwrap_or(serde_json::Value::Null),
            _ => row
                .try_get::<Option<String>, _>(idx)
                .ok()
                .flatten()
                .map(serde_json::Value::from)
                .unwrap_or(serde_json::Value::Null),
        };
        record.insert(column.name().to_string(), value);
    }
    record
}
