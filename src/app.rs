//! Composition root.
//!
//! Builds exactly one of each pipeline component and hands them to each other
//! explicitly; nothing is global.

use std::sync::Arc;

use crate::catalog::{
    DocumentIdGenerator, MemoryBackend, RecordBackend, UuidDocumentIds, VersionedCatalogStore,
};
use crate::config::Config;
use crate::publishing::{
    CatalogFormatter, Formatter, PublishWorker, Scheduler, SubmissionQueue, SubmissionService,
};
use crate::status::StatusTracker;

pub struct Publisher {
    pub catalog: Arc<VersionedCatalogStore>,
    pub status: Arc<StatusTracker>,
    pub queue: Arc<SubmissionQueue>,
    pub worker: Arc<PublishWorker>,
    pub scheduler: Scheduler,
    pub intake: SubmissionService,
}

impl Publisher {
    /// In-memory catalog, uuid document ids, default formatter.
    pub fn new(config: &Config) -> Self {
        Self::with_backend(
            config,
            MemoryBackend::new(),
            Arc::new(UuidDocumentIds),
            Arc::new(CatalogFormatter),
        )
    }

    pub fn with_backend(
        config: &Config,
        backend: Arc<dyn RecordBackend>,
        ids: Arc<dyn DocumentIdGenerator>,
        formatter: Arc<dyn Formatter>,
    ) -> Self {
        let catalog = Arc::new(VersionedCatalogStore::new(backend, ids));
        let status = Arc::new(StatusTracker::new());
        let queue = Arc::new(SubmissionQueue::new());

        let worker = PublishWorker::new(queue.clone(), status.clone(), catalog.clone(), formatter);
        let scheduler = Scheduler::new(worker.clone(), config.scheduler.tick_interval());
        let intake = SubmissionService::new(
            queue.clone(),
            status.clone(),
            catalog.clone(),
            config.intake.verify_document_exists,
        );

        Self {
            catalog,
            status,
            queue,
            worker,
            scheduler,
            intake,
        }
    }
}
