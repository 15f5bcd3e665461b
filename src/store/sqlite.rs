//! SQLite-backed [`Store`] implementation.
//!
//! Each document is stored as its serialized JSON in `company_facts.body`,
//! alongside a few columns for listing without parsing.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::models::NormalizedDocument;

use super::Store;

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl Store for SqliteStore {
    async fn put(&self, doc: &NormalizedDocument) -> Result<()> {
        let body = doc.to_json()?;
        let now = chrono::Utc::now().timestamp();

        sqlx::query(
            r#"
            INSERT INTO company_facts (cik, entity_name, concept_count, fact_count, body, loaded_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(cik) DO UPDATE SET
                entity_name = excluded.entity_name,
                concept_count = excluded.concept_count,
                fact_count = excluded.fact_count,
                body = excluded.body,
                loaded_at = excluded.loaded_at
            "#,
        )
        .bind(&doc.cik)
        .bind(&doc.entity_name)
        .bind(doc.concepts.len() as i64)
        .bind(doc.fact_count() as i64)
        .bind(&body)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(&self, cik: &str) -> Result<Option<NormalizedDocument>> {
        let body: Option<String> =
            sqlx::query_scalar("SELECT body FROM company_facts WHERE cik = ?")
                .bind(cik)
                .fetch_optional(&self.pool)
                .await?;

        body.map(|b| {
            NormalizedDocument::from_json(&b)
                .with_context(|| format!("stored document for {} is not valid JSON", cik))
        })
        .transpose()
    }

    async fn count(&self) -> Result<i64> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM company_facts")
            .fetch_one(&self.pool)
            .await?;
        Ok(n)
    }
}
