//! Backing Record Store
//!
//! The catalog store never touches storage directly. It talks to a `RecordBackend`
//! keyed on `(document_id, version)` that offers a point lookup, an ordered range
//! query with a limit, and single-record writes.
//!
//! `MemoryBackend` is the in-process implementation: one `BTreeMap` of versions per
//! document, sharded by `DashMap` so different documents never contend.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;

use super::types::{CatalogRecord, ScanOrder};
use crate::error::{Error, Result};

#[async_trait]
pub trait RecordBackend: Send + Sync {
    /// Point lookup of one version.
    async fn get(&self, document_id: &str, version: u32) -> Result<Option<CatalogRecord>>;

    /// All versions of a document in the given order, truncated to `limit`.
    async fn query(
        &self,
        document_id: &str,
        order: ScanOrder,
        limit: Option<usize>,
    ) -> Result<Vec<CatalogRecord>>;

    /// Writes a record, replacing any record with the same key.
    async fn put(&self, record: CatalogRecord) -> Result<()>;

    /// Writes a record only if its key is unused.
    ///
    /// Fails with `TransientStore` when another writer already created that version.
    async fn put_if_absent(&self, record: CatalogRecord) -> Result<()>;
}

/// Produces globally unique document ids for newly created documents.
pub trait DocumentIdGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// `document.<uuid v4>`
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidDocumentIds;

impl DocumentIdGenerator for UuidDocumentIds {
    fn generate(&self) -> String {
        format!("document.{}", uuid::Uuid::new_v4())
    }
}

#[derive(Default)]
pub struct MemoryBackend {
    /// Structure: `Document ID -> Version -> Record`.
    documents: DashMap<String, BTreeMap<u32, CatalogRecord>>,
}

impl MemoryBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    pub fn record_count(&self) -> usize {
        self.documents.iter().map(|entry| entry.value().len()).sum()
    }
}

#[async_trait]
impl RecordBackend for MemoryBackend {
    async fn get(&self, document_id: &str, version: u32) -> Result<Option<CatalogRecord>> {
        Ok(self
            .documents
            .get(document_id)
            .and_then(|versions| versions.get(&version).cloned()))
    }

    async fn query(
        &self,
        document_id: &str,
        order: ScanOrder,
        limit: Option<usize>,
    ) -> Result<Vec<CatalogRecord>> {
        let Some(versions) = self.documents.get(document_id) else {
            return Ok(Vec::new());
        };
        let limit = limit.unwrap_or(usize::MAX);

        let records: Vec<CatalogRecord> = match order {
            ScanOrder::Ascending => versions.values().take(limit).cloned().collect(),
            ScanOrder::Descending => versions.values().rev().take(limit).cloned().collect(),
        };
        Ok(records)
    }

    async fn put(&self, record: CatalogRecord) -> Result<()> {
        self.documents
            .entry(record.document_id.clone())
            .or_default()
            .insert(record.version, record);
        Ok(())
    }

    async fn put_if_absent(&self, record: CatalogRecord) -> Result<()> {
        let mut versions = self.documents.entry(record.document_id.clone()).or_default();
        if versions.contains_key(&record.version) {
            return Err(Error::TransientStore(format!(
                "version {} of document {} was written concurrently",
                record.version, record.document_id
            )));
        }
        versions.insert(record.version, record);
        Ok(())
    }
}
