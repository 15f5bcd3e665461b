//! Storage abstraction for transformed documents.
//!
//! The [`Store`] trait is keyed by padded CIK. Implementations must be
//! `Send + Sync` to work with async runtimes.

pub mod memory;
pub mod sqlite;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::NormalizedDocument;

pub use memory::InMemoryStore;
pub use sqlite::SqliteStore;

/// Abstract storage backend for normalized documents.
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`put`](Store::put) | Insert or replace a document by CIK |
/// | [`get`](Store::get) | Read a document back by CIK |
/// | [`count`](Store::count) | Number of stored documents |
#[async_trait]
pub trait Store: Send + Sync {
    /// Insert a document, replacing any previous one with the same CIK.
    async fn put(&self, doc: &NormalizedDocument) -> Result<()>;

    /// Retrieve a document by its padded CIK.
    async fn get(&self, cik: &str) -> Result<Option<NormalizedDocument>>;

    async fn count(&self) -> Result<i64>;
}
