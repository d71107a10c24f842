//! Versioned Catalog Store
//!
//! Keeps every document as an append-only chain of versions and resolves the
//! "current" one. Every operation is built on a single primitive: the latest
//! version of a document, read as a descending range query with limit 1.
//!
//! ## Lifecycle of a document
//! - **Create**: version 1, active.
//! - **Update**: the latest version is deactivated, then version `latest + 1` is
//!   written, active, with the new field values.
//! - **Soft delete**: the latest version is deactivated. Nothing is ever removed.
//!
//! ## Concurrency
//! Deactivate-then-append is two writes, not a transaction. The new version is
//! written with `put_if_absent`, so two concurrent updates of the same document
//! cannot both claim the same version number: the loser fails with
//! `TransientStore` and nothing it wrote is visible except the (idempotent)
//! deactivation of the version both of them read.

use std::sync::Arc;

use super::backend::{DocumentIdGenerator, RecordBackend};
use super::types::{CatalogInput, CatalogRecord, ScanOrder};
use crate::error::{Error, Result};

pub struct VersionedCatalogStore {
    backend: Arc<dyn RecordBackend>,
    ids: Arc<dyn DocumentIdGenerator>,
}

impl VersionedCatalogStore {
    pub fn new(backend: Arc<dyn RecordBackend>, ids: Arc<dyn DocumentIdGenerator>) -> Self {
        Self { backend, ids }
    }

    /// Returns the active version of a document.
    ///
    /// Fails with `NotFound` if the document was never created or its latest
    /// version has been deactivated.
    pub async fn get_active(&self, document_id: &str) -> Result<CatalogRecord> {
        match self.latest_version(document_id).await? {
            Some(record) if record.active => Ok(record),
            _ => Err(Error::document_not_found(document_id)),
        }
    }

    /// Creates a new document (no id in the input) or appends a new version to an
    /// existing one.
    ///
    /// Updating an id with no version chain fails with `NotFound` and writes nothing.
    pub async fn upsert(&self, input: CatalogInput) -> Result<CatalogRecord> {
        match input.document_id.clone() {
            None => self.create(input).await,
            Some(document_id) => self.update(document_id, input).await,
        }
    }

    /// Deactivates the active latest version.
    ///
    /// Fails with `NotFound` if there is no version or the latest one is already inactive.
    pub async fn soft_delete(&self, document_id: &str) -> Result<CatalogRecord> {
        match self.latest_version(document_id).await? {
            Some(record) if record.active => self.deactivate(record).await,
            _ => Err(Error::document_not_found(document_id)),
        }
    }

    /// Deactivates the latest version whether or not it is still active.
    pub async fn force_deactivate(&self, document_id: &str) -> Result<CatalogRecord> {
        let latest = self
            .latest_version(document_id)
            .await?
            .ok_or_else(|| Error::document_not_found(document_id))?;
        self.deactivate(latest).await
    }

    /// Succeeds if the document ever existed, active or not.
    pub async fn ensure_exists(&self, document_id: &str) -> Result<()> {
        self.latest_version(document_id)
            .await?
            .map(|_| ())
            .ok_or_else(|| Error::document_not_found(document_id))
    }

    /// Full version chain, oldest first.
    pub async fn versions(&self, document_id: &str) -> Result<Vec<CatalogRecord>> {
        let versions = self
            .backend
            .query(document_id, ScanOrder::Ascending, None)
            .await?;
        if versions.is_empty() {
            return Err(Error::document_not_found(document_id));
        }
        Ok(versions)
    }

    async fn create(&self, input: CatalogInput) -> Result<CatalogRecord> {
        let record = input.into_record(self.ids.generate(), 1);
        self.backend.put_if_absent(record.clone()).await?;

        tracing::info!("Created document {} (version 1)", record.document_id);
        Ok(record)
    }

    async fn update(&self, document_id: String, input: CatalogInput) -> Result<CatalogRecord> {
        let latest = self
            .latest_version(&document_id)
            .await?
            .ok_or_else(|| Error::document_not_found(&document_id))?;

        let next_version = latest.version.checked_add(1).ok_or_else(|| {
            Error::Logic(format!(
                "document {} has no version left after {}",
                document_id, latest.version
            ))
        })?;

        self.deactivate(latest).await?;

        let record = input.into_record(document_id, next_version);
        self.backend.put_if_absent(record.clone()).await?;

        tracing::info!(
            "Published version {} of document {}",
            record.version,
            record.document_id
        );
        Ok(record)
    }

    async fn deactivate(&self, mut record: CatalogRecord) -> Result<CatalogRecord> {
        record.active = false;
        self.backend.put(record.clone()).await?;

        tracing::debug!(
            "Deactivated version {} of document {}",
            record.version,
            record.document_id
        );
        Ok(record)
    }

    /// Highest version of a document regardless of its active flag.
    async fn latest_version(&self, document_id: &str) -> Result<Option<CatalogRecord>> {
        let latest = self
            .backend
            .query(document_id, ScanOrder::Descending, Some(1))
            .await?
            .into_iter()
            .next();

        if let Some(record) = &latest
            && record.version == 0
        {
            return Err(Error::Logic(format!(
                "document {} has a version 0 in its chain",
                document_id
            )));
        }

        Ok(latest)
    }
}
