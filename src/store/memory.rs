//! In-memory [`Store`] implementation for testing.

use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::models::NormalizedDocument;

use super::Store;

/// Documents held in a `HashMap` behind a `RwLock`.
pub struct InMemoryStore {
    docs: RwLock<HashMap<String, NormalizedDocument>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            docs: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn put(&self, doc: &NormalizedDocument) -> Result<()> {
        let mut docs = self.docs.write().map_err(|_| anyhow!("store lock poisoned"))?;
        docs.insert(doc.cik.clone(), doc.clone());
        Ok(())
    }

    async fn get(&self, cik: &str) -> Result<Option<NormalizedDocument>> {
        let docs = self.docs.read().map_err(|_| anyhow!("store lock poisoned"))?;
        Ok(docs.get(cik).cloned())
    }

    async fn count(&self) -> Result<i64> {
        let docs = self.docs.read().map_err(|_| anyhow!("store lock poisoned"))?;
        Ok(docs.len() as i64)
    }
}
