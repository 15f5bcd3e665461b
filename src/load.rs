//! Load transformed documents from disk into a [`Store`].

use anyhow::Result;
use std::path::Path;

use crate::batch::list_source_files;
use crate::config::Config;
use crate::db;
use crate::models::NormalizedDocument;
use crate::store::{SqliteStore, Store};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub loaded: u64,
    pub errored: u64,
}

/// Put every `*.json` document in `dir` into `store`.
///
/// Unreadable or unparsable files are logged and counted, not fatal.
pub async fn load_dir(store: &dyn Store, dir: &Path) -> Result<LoadReport> {
    let files = list_source_files(dir, None)?;
    let mut report = LoadReport::default();

    for path in &files {
        let outcome = match std::fs::read_to_string(path) {
            Ok(text) => match NormalizedDocument::from_json(&text) {
                Ok(doc) => store.put(&doc).await,
                Err(e) => Err(e.into()),
            },
            Err(e) => Err(e.into()),
        };
        match outcome {
            Ok(()) => report.loaded += 1,
            Err(e) => {
                tracing::error!(file = %path.display(), "failed to load document: {:#}", e);
                report.errored += 1;
            }
        }
    }

    Ok(report)
}

/// CLI entry point for `cfx load`.
pub async fn run_load(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    let store = SqliteStore::new(pool);

    let report = load_dir(&store, &config.paths.modified_facts).await?;
    let total = store.count().await?;

    println!("load {}", config.paths.modified_facts.display());
    println!("  loaded documents: {}", report.loaded);
    println!("  errors: {}", report.errored);
    println!("  total in database: {}", total);
    println!("ok");

    store.pool().close().await;
    Ok(())
}
