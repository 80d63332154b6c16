use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub db: DbConfig,
    #[serde(default)]
    pub sheets: SheetsConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct DbConfig {
    /// Postgres connection string. The `DATABASE_URL` environment variable
    /// takes precedence when set.
    pub url: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SheetsConfig {
    #[serde(default)]
    pub spreadsheet_id: String,
    #[serde(default = "default_sheet_names")]
    pub sheet_names: Vec<String>,
    /// Name of the environment variable holding the OAuth bearer token.
    /// Credential acquisition itself is an external concern.
    #[serde(default = "default_token_env")]
    pub token_env: String,
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
}

impl Default for SheetsConfig {
    fn default() -> Self {
        Self {
            spreadsheet_id: String::new(),
            sheet_names: default_sheet_names(),
            token_env: default_token_env(),
            cache_ttl_secs: default_cache_ttl_secs(),
            cache_capacity: default_cache_capacity(),
        }
    }
}

fn default_sheet_names() -> Vec<String> {
    vec![
        "permisos".to_string(),
        "discapacidad".to_string(),
        "permiso-de-pesca-jubilados-65-2025-12-26".to_string(),
        "malvinas".to_string(),
    ]
}

fn default_token_env() -> String {
    "GOOGLE_SHEETS_TOKEN".to_string()
}

fn default_cache_ttl_secs() -> u64 {
    600
}

fn default_cache_capacity() -> usize {
    10
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    /// Row cap for the relational source. Sheet sources are bounded by the
    /// sheets themselves.
    #[serde(default = "default_db_limit")]
    pub db_limit: i64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            db_limit: default_db_limit(),
        }
    }
}

fn default_db_limit() -> i64 {
    50
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Key expected in the `X-API-Key` header for the admin endpoints.
    #[serde(default)]
    pub admin_api_key: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            admin_api_key: String::new(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:7700".to_string()
}

impl Config {
    /// A minimal configuration for tests and commands that don't need a
    /// config file on disk.
    pub fn minimal() -> Self {
        Self {
            db: DbConfig::default(),
            sheets: SheetsConfig::default(),
            search: SearchConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.search.db_limit < 1 {
        anyhow::bail!("search.db_limit must be >= 1");
    }

    if config.sheets.cache_capacity < 1 {
        anyhow::bail!("sheets.cache_capacity must be >= 1");
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_applied() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[sheets]
spreadsheet_id = "abc123"
"#
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.search.db_limit, 50);
        assert_eq!(config.sheets.cache_ttl_secs, 600);
        assert_eq!(config.sheets.cache_capacity, 10);
        assert_eq!(config.sheets.sheet_names.len(), 4);
        assert_eq!(config.server.bind, "127.0.0.1:7700");
    }

    #[test]
    fn test_rejects_zero_limit() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[sheets]
spreadsheet_id = "abc123"

[search]
db_limit = 0
"#
        )
        .unwrap();

        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let config = load_config(file.path()).unwrap();
        // No spreadsheet configured: the sheets adapter degrades at runtime
        // instead of failing config validation.
        assert!(config.sheets.spreadsheet_id.is_empty());
        assert!(config.db.url.is_none());
    }
}
