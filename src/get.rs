//! Document retrieval by CIK.

use anyhow::{bail, Result};

use crate::config::Config;
use crate::db;
use crate::models::{pad_cik, NormalizedDocument};
use crate::store::{SqliteStore, Store};

/// Look up a document. The CIK may be given with or without padding.
pub async fn get_document(store: &dyn Store, cik: &str) -> Result<Option<NormalizedDocument>> {
    let cik = cik.trim();
    if cik.is_empty() || !cik.bytes().all(|b| b.is_ascii_digit()) {
        bail!("invalid cik: '{}'", cik);
    }
    store.get(&pad_cik(cik)).await
}

/// CLI entry point: prints the stored document as pretty JSON.
pub async fn run_get(config: &Config, cik: &str) -> Result<()> {
    let pool = db::connect(config).await?;
    let store = SqliteStore::new(pool);

    let doc = get_document(&store, cik).await?;
    store.pool().close().await;

    match doc {
        Some(doc) => {
            println!("{}", serde_json::to_string_pretty(&doc)?);
            Ok(())
        }
        None => bail!("document not found: {}", pad_cik(cik.trim())),
    }
}
