//! Audit table schema migrations.
//!
//! Run once at deployment via `permitd init`, keeping DDL off the search
//! path. The auxiliary columns are applied as independent statements so one
//! failing column does not block the others; old deployments that created
//! the table without them are upgraded in place.

use anyhow::Result;
use sqlx::PgPool;

use crate::config::Config;
use crate::db;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    apply(&pool).await?;
    pool.close().await;
    Ok(())
}

pub async fn apply(pool: &PgPool) -> Result<()> {
    // unaccent backs the name matching in the relational search. Creating
    // extensions needs elevated privileges on some hosts; the search itself
    // degrades if the function is missing, so this failure is non-fatal.
    if let Err(e) = sqlx::query("CREATE EXTENSION IF NOT EXISTS unaccent")
        .execute(pool)
        .await
    {
        tracing::warn!(error = %e, "could not create unaccent extension");
    }

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS historial_busquedas (
            id SERIAL PRIMARY KEY,
            timestamp TIMESTAMPTZ DEFAULT CURRENT_TIMESTAMP,
            email TEXT,
            query TEXT NOT NULL,
            results_count INTEGER,
            first_result_source TEXT,
            first_result_name TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Pre-existing tables from before these columns were introduced are
    // altered column by column; a failure skips only that column.
    let columns_to_add = [
        ("email", "TEXT"),
        ("results_count", "INTEGER"),
        ("first_result_source", "TEXT"),
        ("first_result_name", "TEXT"),
    ];

    for (name, col_type) in columns_to_add {
        let ddl = format!(
            "ALTER TABLE historial_busquedas ADD COLUMN IF NOT EXISTS {} {}",
            name, col_type
        );
        if let Err(e) = sqlx::query(&ddl).execute(pool).await {
            tracing::warn!(column = name, error = %e, "could not add audit column");
        }
    }

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_historial_timestamp \
         ON historial_busquedas(timestamp DESC)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
