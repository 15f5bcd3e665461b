use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    create_schema(&pool).await?;
    pool.close().await;
    Ok(())
}

/// Create all tables and indexes. Safe to run repeatedly.
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    // One row per kept filer, keyed by padded CIK
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS company_facts (
            cik TEXT PRIMARY KEY,
            entity_name TEXT NOT NULL,
            concept_count INTEGER NOT NULL,
            fact_count INTEGER NOT NULL,
            body TEXT NOT NULL,
            loaded_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_company_facts_entity_name ON company_facts(entity_name)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
