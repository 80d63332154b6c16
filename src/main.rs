//! # Permit Lookup CLI (`permitd`)
//!
//! The `permitd` binary runs the HTTP API and provides operator commands
//! for migrations, one-shot searches, and audit reporting.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `permitd init` | Create/upgrade the audit table schema |
//! | `permitd serve` | Start the HTTP API |
//! | `permitd search "<query>"` | Search both sources from the terminal |
//! | `permitd status` | Probe source connectivity |
//! | `permitd stats` | Show audit counters |
//! | `permitd history` | Show recent audit entries |

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use permit_lookup::cache::SheetCache;
use permit_lookup::{audit, config, db, migrate, search, server, sheets, status};

/// Permit Lookup — person search over a PostgreSQL order table and a set of
/// Google Sheets worksheets, with per-query audit logging.
#[derive(Parser)]
#[command(
    name = "permitd",
    about = "Permit Lookup — person search over PostgreSQL and Google Sheets",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/lookup.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize or upgrade the audit table schema.
    ///
    /// Runs the `historial_busquedas` migrations and creates the `unaccent`
    /// extension. Idempotent — running it multiple times is safe.
    Init,

    /// Start the HTTP API server.
    Serve,

    /// Search both sources and print the merged hits as JSON.
    ///
    /// The query is audit-logged exactly like a request through the HTTP
    /// API.
    Search {
        /// Name terms or a document number.
        query: String,

        /// Requester email recorded in the audit entry.
        #[arg(long, default_value = "cli@localhost")]
        email: String,
    },

    /// Probe connectivity to both sources.
    Status,

    /// Show audit counters (searches logged, order rows).
    Stats,

    /// Show recent audit entries, newest first.
    History {
        /// Maximum number of entries to print.
        #[arg(long, default_value_t = 100)]
        limit: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let cfg = if cli.config.exists() {
        config::load_config(&cli.config)?
    } else {
        tracing::warn!(path = %cli.config.display(), "config file not found; using defaults");
        config::Config::minimal()
    };

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Audit schema initialized.");
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
        Commands::Search { query, email } => {
            let query = query.trim().to_string();
            if query.is_empty() {
                anyhow::bail!("query must not be empty");
            }

            let pool = db::connect(&cfg).await?;
            let source = sheets::open_source(&cfg.sheets);
            let cache = SheetCache::new(
                cfg.sheets.cache_capacity,
                Duration::from_secs(cfg.sheets.cache_ttl_secs),
            );

            let hits =
                search::run_search(&pool, source.as_deref(), &cache, &cfg, &query).await;
            audit::log_search(&pool, &query, &email, &hits).await;

            println!("{}", serde_json::to_string_pretty(&hits)?);
            pool.close().await;
        }
        Commands::Status => {
            let source = sheets::open_source(&cfg.sheets);
            status::run_status(&cfg, source.as_deref()).await;
        }
        Commands::Stats => {
            let pool = db::connect(&cfg).await?;
            let stats = audit::get_stats(&pool).await?;
            println!("Searches logged:  {}", stats.query_count);
            println!("Order rows:       {}", stats.record_count);
            pool.close().await;
        }
        Commands::History { limit } => {
            let pool = db::connect(&cfg).await?;
            let entries = audit::get_history(&pool, limit.clamp(1, 1000)).await?;
            for entry in entries {
                let when = entry
                    .timestamp
                    .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                    .unwrap_or_default();
                println!(
                    "{}  {:<24}  \"{}\"  {} results  {}",
                    when,
                    entry.email.as_deref().unwrap_or("-"),
                    entry.query,
                    entry.results_count.unwrap_or(0),
                    entry.first_result_source.as_deref().unwrap_or("-"),
                );
            }
            pool.close().await;
        }
    }

    Ok(())
}
