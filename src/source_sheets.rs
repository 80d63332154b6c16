//! Spreadsheet search adapter.
//!
//! Walks the configured sheet names in order, pulling each sheet's rows
//! through the [`SheetCache`], standardizing them, and applying the same
//! term-matching rule as the relational adapter — evaluated in-process.
//!
//! Sheet-origin matches carry a fixed `estado_permiso = "Permiso Pago"`:
//! rows in these sheets are paid permits by definition, whatever their
//! original status column says.
//!
//! A missing sheet or a failed fetch skips that sheet only; the adapter
//! never aborts the whole scan, and an unavailable source degrades to an
//! empty scan with a logged fault.

use serde_json::Value;

use crate::cache::SheetCache;
use crate::config::SheetsConfig;
use crate::models::{Record, SearchHit, SourceScan};
use crate::normalize::{field_str, fold, standardize_record};
use crate::search::is_numeric_query;
use crate::sheets::SheetSource;

pub const PAID_PERMIT_STATUS: &str = "Permiso Pago";

/// Searches every configured sheet. `query` must already be trimmed and
/// non-empty; folding happens here.
pub async fn search_sheets(
    source: Option<&dyn SheetSource>,
    cache: &SheetCache,
    config: &SheetsConfig,
    query: &str,
) -> SourceScan {
    let Some(source) = source else {
        return SourceScan::degraded("sheets source unavailable");
    };

    let folded_query = fold(query);
    let mut hits = Vec::new();
    let mut fault = None;

    for sheet_name in &config.sheet_names {
        let key = SheetCache::key(&config.spreadsheet_id, sheet_name);
        let rows = cache
            .get_or_fetch(&key, || source.fetch_rows(sheet_name))
            .await;

        let rows = match rows {
            Ok(rows) => rows,
            Err(e) => {
                tracing::warn!(sheet = %sheet_name, error = %e, "skipping sheet");
                fault.get_or_insert_with(|| e.to_string());
                continue;
            }
        };

        for raw in rows.iter() {
            let record = standardize_record(raw.clone());
            if matches_record(&record, &folded_query) {
                hits.push(tag_hit(record, sheet_name));
            }
        }
    }

    SourceScan { hits, fault }
}

/// The in-process counterpart of the relational matching rule: a digits-only
/// query is a document substring match; anything else splits into terms that
/// must all appear in the folded "nombre apellido" concatenation.
fn matches_record(record: &Record, folded_query: &str) -> bool {
    if is_numeric_query(folded_query) {
        let dni = field_str(record, "dni");
        return dni.contains(folded_query);
    }

    let full_name = format!(
        "{} {}",
        fold(&field_str(record, "nombre")),
        fold(&field_str(record, "apellido"))
    );
    folded_query
        .split_whitespace()
        .all(|term| full_name.contains(term))
}

fn tag_hit(mut record: Record, sheet_name: &str) -> SearchHit {
    record.insert(
        "estado_permiso".to_string(),
        Value::String(PAID_PERMIT_STATUS.to_string()),
    );
    SearchHit {
        source: format!("Google Sheets - {}", sheet_name),
        data: record,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SheetsConfig;
    use anyhow::Result;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct FakeSource {
        sheets: HashMap<String, Vec<Record>>,
        fetches: AtomicUsize,
    }

    impl FakeSource {
        fn new(sheets: Vec<(&str, Vec<Record>)>) -> Self {
            Self {
                sheets: sheets
                    .into_iter()
                    .map(|(name, rows)| (name.to_string(), rows))
                    .collect(),
                fetches: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl SheetSource for FakeSource {
        async fn spreadsheet_title(&self) -> Result<String> {
            Ok("Padrón de permisos".to_string())
        }

        async fn fetch_rows(&self, sheet_name: &str) -> Result<Vec<Record>> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            self.sheets
                .get(sheet_name)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("Sheet '{}' not found", sheet_name))
        }
    }

    fn person(nombre: &str, apellido: &str, dni: &str, estado: &str) -> Record {
        let mut r = Record::new();
        r.insert("nombre".into(), json!(nombre));
        r.insert("apellido".into(), json!(apellido));
        r.insert("dni".into(), json!(dni));
        r.insert("estado".into(), json!(estado));
        r
    }

    fn config(sheet_names: &[&str]) -> SheetsConfig {
        SheetsConfig {
            spreadsheet_id: "test-sheet".into(),
            sheet_names: sheet_names.iter().map(|s| s.to_string()).collect(),
            ..SheetsConfig::default()
        }
    }

    fn cache() -> SheetCache {
        SheetCache::new(10, Duration::from_secs(600))
    }

    #[tokio::test]
    async fn test_accent_insensitive_multi_term_match() {
        let source = FakeSource::new(vec![(
            "permisos",
            vec![person("María", "López Pérez", "20111222", "Vencido")],
        )]);
        let cfg = config(&["permisos"]);

        let scan = search_sheets(Some(&source), &cache(), &cfg, "Maria Lopez").await;
        assert_eq!(scan.hits.len(), 1);
        assert!(scan.fault.is_none());
        assert_eq!(scan.hits[0].source, "Google Sheets - permisos");
    }

    #[tokio::test]
    async fn test_paid_permit_override() {
        let source = FakeSource::new(vec![(
            "permisos",
            vec![person("Ana", "Suárez", "30222111", "Vencido")],
        )]);
        let cfg = config(&["permisos"]);

        let scan = search_sheets(Some(&source), &cache(), &cfg, "ana").await;
        assert_eq!(
            scan.hits[0].data.get("estado_permiso"),
            Some(&json!("Permiso Pago"))
        );
    }

    #[tokio::test]
    async fn test_numeric_query_matches_dni_substring_only() {
        let source = FakeSource::new(vec![(
            "permisos",
            vec![
                person("Carlos", "Gómez", "A12345678Z", "Vigente"),
                person("12345678", "Falso", "99999999", "Vigente"),
            ],
        )]);
        let cfg = config(&["permisos"]);

        let scan = search_sheets(Some(&source), &cache(), &cfg, "12345678").await;
        // Substring of the document field matches; a numeric query does not
        // consult the name fields.
        assert_eq!(scan.hits.len(), 1);
        assert_eq!(scan.hits[0].data.get("dni"), Some(&json!("A12345678Z")));
    }

    #[tokio::test]
    async fn test_partial_term_does_not_match() {
        let source = FakeSource::new(vec![(
            "permisos",
            vec![person("María", "López", "123", "Vigente")],
        )]);
        let cfg = config(&["permisos"]);

        let scan = search_sheets(Some(&source), &cache(), &cfg, "maria gonzalez").await;
        assert!(scan.hits.is_empty());
    }

    #[tokio::test]
    async fn test_missing_sheet_skipped_others_scanned() {
        let source = FakeSource::new(vec![(
            "malvinas",
            vec![person("Jorge", "Paz", "18000111", "Vigente")],
        )]);
        let cfg = config(&["permisos", "malvinas"]);

        let scan = search_sheets(Some(&source), &cache(), &cfg, "jorge").await;
        assert_eq!(scan.hits.len(), 1);
        assert!(scan.fault.is_some());
    }

    #[tokio::test]
    async fn test_unavailable_source_degrades() {
        let cfg = config(&["permisos"]);
        let scan = search_sheets(None, &cache(), &cfg, "jorge").await;
        assert!(scan.hits.is_empty());
        assert!(scan.fault.is_some());
    }

    #[tokio::test]
    async fn test_cache_prevents_second_fetch() {
        let source = FakeSource::new(vec![(
            "permisos",
            vec![person("María", "López", "20111222", "Vigente")],
        )]);
        let cfg = config(&["permisos"]);
        let cache = cache();

        search_sheets(Some(&source), &cache, &cfg, "maria").await;
        search_sheets(Some(&source), &cache, &cfg, "lopez").await;
        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_sheet_order_preserved() {
        let source = FakeSource::new(vec![
            ("permisos", vec![person("Luz", "Vega", "111", "Vigente")]),
            ("malvinas", vec![person("Luz", "Mar", "222", "Vigente")]),
        ]);
        let cfg = config(&["permisos", "malvinas"]);

        let scan = search_sheets(Some(&source), &cache(), &cfg, "luz").await;
        assert_eq!(scan.hits[0].source, "Google Sheets - permisos");
        assert_eq!(scan.hits[1].source, "Google Sheets - malvinas");
    }
}
