//! Search history persistence and reporting.
//!
//! Every search writes one row to `historial_busquedas` — including
//! zero-result searches, which are the interesting ones for the operators.
//! An audit write failure is logged and swallowed: logging never fails the
//! caller's search. The reporting queries back the admin endpoints and the
//! `stats` / `history` CLI commands.

use anyhow::Result;
use sqlx::PgPool;

use crate::models::{AuditEntry, SearchHit, Stats};
use crate::normalize::field_str;

/// Records one search request and its outcome summary. Returns `false`
/// (never an error) when the insert fails.
pub async fn log_search(pool: &PgPool, query: &str, email: &str, results: &[SearchHit]) -> bool {
    let (first_source, first_name) = first_result_summary(results);

    let insert = sqlx::query(
        r#"
        INSERT INTO historial_busquedas
            (email, query, results_count, first_result_source, first_result_name)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(email)
    .bind(query)
    .bind(results.len() as i32)
    .bind(first_source)
    .bind(first_name)
    .execute(pool)
    .await;

    match insert {
        Ok(_) => true,
        Err(e) => {
            tracing::error!(error = %e, "failed to write audit entry");
            false
        }
    }
}

/// Source and `"nombre apellido"` display name of the first hit, if any.
/// Fields read the canonical keys, which both adapters emit.
fn first_result_summary(results: &[SearchHit]) -> (Option<String>, Option<String>) {
    let Some(first) = results.first() else {
        return (None, None);
    };
    let name = format!(
        "{} {}",
        field_str(&first.data, "nombre"),
        field_str(&first.data, "apellido")
    )
    .trim()
    .to_string();
    (Some(first.source.clone()), Some(name))
}

/// The most recent audit entries, newest first.
pub async fn get_history(pool: &PgPool, limit: i64) -> Result<Vec<AuditEntry>> {
    let entries = sqlx::query_as::<_, AuditEntry>(
        "SELECT id, timestamp, email, query, results_count, first_result_source, first_result_name \
         FROM historial_busquedas ORDER BY timestamp DESC LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(entries)
}

/// Total searches logged and total rows in the order table.
pub async fn get_stats(pool: &PgPool) -> Result<Stats> {
    let query_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM historial_busquedas")
        .fetch_one(pool)
        .await?;

    let record_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
        .fetch_one(pool)
        .await?;

    Ok(Stats {
        query_count,
        record_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Record;
    use serde_json::json;

    // The insert itself needs a live database; the summary shaping is the
    // part worth pinning down here.
    fn hit(source: &str, nombre: Option<&str>, apellido: Option<&str>) -> SearchHit {
        let mut data = Record::new();
        if let Some(n) = nombre {
            data.insert("nombre".into(), json!(n));
        }
        if let Some(a) = apellido {
            data.insert("apellido".into(), json!(a));
        }
        SearchHit {
            source: source.into(),
            data,
        }
    }

    #[test]
    fn test_first_result_summary() {
        let hits = vec![
            hit("Google Sheets - permisos", Some("María"), Some("López")),
            hit("PostgreSQL", Some("Otro"), Some("Nombre")),
        ];
        let (source, name) = first_result_summary(&hits);
        assert_eq!(source.as_deref(), Some("Google Sheets - permisos"));
        assert_eq!(name.as_deref(), Some("María López"));
    }

    #[test]
    fn test_summary_with_missing_apellido() {
        let hits = vec![hit("PostgreSQL", Some("María"), None)];
        let (_, name) = first_result_summary(&hits);
        assert_eq!(name.as_deref(), Some("María"));
    }

    #[test]
    fn test_summary_of_empty_results() {
        assert_eq!(first_result_summary(&[]), (None, None));
    }
}
