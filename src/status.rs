//! Connectivity probes for the two sources.

use serde::Serialize;

use crate::config::Config;
use crate::db;
use crate::sheets::SheetSource;

#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub database_connection: &'static str,
    pub google_sheets_connection: &'static str,
    pub spreadsheet_title: Option<String>,
}

/// Probes both sources. Never fails — unreachable sources report as such.
pub async fn check(config: &Config, sheets: Option<&dyn SheetSource>) -> StatusReport {
    let database_connection = match db::connect(config).await {
        Ok(pool) => {
            let ok = sqlx::query_scalar::<_, i32>("SELECT 1")
                .fetch_one(&pool)
                .await
                .is_ok();
            pool.close().await;
            if ok {
                "ok"
            } else {
                "failed"
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "database probe failed");
            "failed"
        }
    };

    let spreadsheet_title = match sheets {
        Some(source) => match source.spreadsheet_title().await {
            Ok(title) => Some(title),
            Err(e) => {
                tracing::warn!(error = %e, "sheets probe failed");
                None
            }
        },
        None => None,
    };

    let google_sheets_connection = if spreadsheet_title.is_some() {
        "ok"
    } else {
        "failed"
    };

    StatusReport {
        database_connection,
        google_sheets_connection,
        spreadsheet_title,
    }
}

/// `permitd status`: print the probe results.
pub async fn run_status(config: &Config, sheets: Option<&dyn SheetSource>) {
    let report = check(config, sheets).await;

    println!("{:<16} {}", "SOURCE", "STATUS");
    println!("{:<16} {}", "postgresql", report.database_connection);
    println!("{:<16} {}", "google-sheets", report.google_sheets_connection);
    if let Some(title) = &report.spreadsheet_title {
        println!("{:<16} {}", "spreadsheet", title);
    }
}
