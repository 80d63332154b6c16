//! Google Sheets client.
//!
//! Talks to the Sheets v4 REST API with a plain `reqwest` client: one call
//! for the spreadsheet title (used by the status probe) and one per sheet
//! for the full value range. The first row of a range is the header row;
//! remaining rows become field-name → value records.
//!
//! Authentication is a bearer token read from the environment variable named
//! by `sheets.token_env`. Obtaining and refreshing that token is an external
//! concern — when the variable is unset, [`open_source`] yields no client
//! and the spreadsheet adapter degrades to an empty result set.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use crate::config::SheetsConfig;
use crate::models::Record;

const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// A spreadsheet backend: the seam between the search adapter and the
/// Sheets API, so tests can substitute an in-memory source.
#[async_trait]
pub trait SheetSource: Send + Sync {
    /// Human-readable spreadsheet title, for connectivity probes.
    async fn spreadsheet_title(&self) -> Result<String>;

    /// All rows of one named sheet as raw records. Fails when the sheet
    /// does not exist or the API call fails.
    async fn fetch_rows(&self, sheet_name: &str) -> Result<Vec<Record>>;
}

/// Opens the configured spreadsheet, or `None` when no spreadsheet id is
/// configured or no token is available. The caller treats `None` as a
/// degraded (sheets-less) deployment, not an error.
pub fn open_source(config: &SheetsConfig) -> Option<Arc<dyn SheetSource>> {
    if config.spreadsheet_id.is_empty() {
        tracing::warn!("no spreadsheet id configured; sheets source disabled");
        return None;
    }

    let token = match std::env::var(&config.token_env) {
        Ok(token) if !token.is_empty() => token,
        _ => {
            tracing::warn!(
                env = %config.token_env,
                "sheets token not set; sheets source disabled"
            );
            return None;
        }
    };

    match GoogleSheetsClient::new(config.spreadsheet_id.clone(), token) {
        Ok(client) => Some(Arc::new(client)),
        Err(e) => {
            tracing::warn!(error = %e, "failed to build sheets client; sheets source disabled");
            None
        }
    }
}

pub struct GoogleSheetsClient {
    http: reqwest::Client,
    spreadsheet_id: String,
    token: String,
}

impl GoogleSheetsClient {
    pub fn new(spreadsheet_id: String, token: String) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            http,
            spreadsheet_id,
            token,
        })
    }
}

#[derive(Deserialize)]
struct SpreadsheetMeta {
    properties: SpreadsheetProperties,
}

#[derive(Deserialize)]
struct SpreadsheetProperties {
    title: String,
}

#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

#[async_trait]
impl SheetSource for GoogleSheetsClient {
    async fn spreadsheet_title(&self) -> Result<String> {
        let url = format!(
            "{}/{}?fields=properties.title",
            SHEETS_API_BASE, self.spreadsheet_id
        );
        let resp = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await
            .context("Spreadsheet metadata request failed")?;

        if !resp.status().is_success() {
            bail!("Spreadsheet metadata request returned {}", resp.status());
        }

        let meta: SpreadsheetMeta = resp.json().await?;
        Ok(meta.properties.title)
    }

    async fn fetch_rows(&self, sheet_name: &str) -> Result<Vec<Record>> {
        let url = format!(
            "{}/{}/values/{}?majorDimension=ROWS",
            SHEETS_API_BASE,
            self.spreadsheet_id,
            urlencoding::encode(sheet_name)
        );
        let resp = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await
            .with_context(|| format!("Value fetch failed for sheet '{}'", sheet_name))?;

        if resp.status() == reqwest::StatusCode::BAD_REQUEST
            || resp.status() == reqwest::StatusCode::NOT_FOUND
        {
            // The API answers 400 for an unknown range name.
            bail!("Sheet '{}' not found in spreadsheet", sheet_name);
        }
        if !resp.status().is_success() {
            bail!(
                "Value fetch for sheet '{}' returned {}",
                sheet_name,
                resp.status()
            );
        }

        let range: ValueRange = resp.json().await?;
        Ok(rows_to_records(range.values))
    }
}

/// Zips the header row with each data row into records. Cells beyond the
/// header width are dropped; short rows leave trailing fields absent, which
/// matches how the Sheets API trims empty tails.
fn rows_to_records(values: Vec<Vec<serde_json::Value>>) -> Vec<Record> {
    let mut iter = values.into_iter();
    let headers: Vec<String> = match iter.next() {
        Some(row) => row
            .into_iter()
            .map(|cell| match cell {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            })
            .collect(),
        None => return Vec::new(),
    };

    iter.map(|row| {
        let mut record = Record::new();
        for (header, cell) in headers.iter().zip(row) {
            if header.trim().is_empty() {
                continue;
            }
            record.insert(header.clone(), cell);
        }
        record
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rows_to_records_zips_headers() {
        let values = vec![
            vec![json!("Nombre"), json!("Apellido"), json!("DNI")],
            vec![json!("María"), json!("López"), json!("12345678")],
            vec![json!("Juan"), json!("Pérez")],
        ];

        let records = rows_to_records(values);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("DNI"), Some(&json!("12345678")));
        // Short row: trailing field absent, not null.
        assert!(!records[1].contains_key("DNI"));
    }

    #[test]
    fn test_rows_to_records_empty_sheet() {
        assert!(rows_to_records(Vec::new()).is_empty());
        // Header-only sheet has no data rows.
        assert!(rows_to_records(vec![vec![json!("Nombre")]]).is_empty());
    }

    #[test]
    fn test_rows_to_records_skips_blank_headers() {
        let values = vec![
            vec![json!("Nombre"), json!("")],
            vec![json!("Ana"), json!("ignored")],
        ];
        let records = rows_to_records(values);
        assert_eq!(records[0].len(), 1);
    }
}
