//! Submission Intake
//!
//! Entry point for publish requests. A request is acknowledged with a publishing
//! record id as soon as it is queued; the outcome shows up later in its status history.

use std::sync::Arc;

use super::queue::SubmissionQueue;
use super::types::{PublishJob, PublishRequest};
use crate::catalog::VersionedCatalogStore;
use crate::error::Result;
use crate::status::{PublishingRecordId, PublishingStatus, StatusEntry, StatusTracker};

pub struct SubmissionService {
    queue: Arc<SubmissionQueue>,
    status: Arc<StatusTracker>,
    catalog: Arc<VersionedCatalogStore>,
    verify_document_exists: bool,
}

impl SubmissionService {
    pub fn new(
        queue: Arc<SubmissionQueue>,
        status: Arc<StatusTracker>,
        catalog: Arc<VersionedCatalogStore>,
        verify_document_exists: bool,
    ) -> Self {
        Self {
            queue,
            status,
            catalog,
            verify_document_exists,
        }
    }

    /// Queues a publish request and returns its publishing record id.
    ///
    /// With `verify_document_exists`, an update of an unknown document is rejected
    /// here with `NotFound` and leaves no trace in the status tracker.
    pub async fn submit(&self, request: PublishRequest) -> Result<PublishingRecordId> {
        if self.verify_document_exists
            && let Some(document_id) = &request.document_id
        {
            self.catalog.ensure_exists(document_id).await?;
        }

        let publishing_record_id = PublishingRecordId::new();

        // QUEUED goes in before the job becomes visible to the worker.
        self.status.append(
            &publishing_record_id,
            PublishingStatus::Queued,
            None,
            request.document_id.clone(),
        )?;
        self.queue
            .enqueue(PublishJob::from_request(publishing_record_id.clone(), request));

        tracing::info!("Accepted publish request {}", publishing_record_id);
        Ok(publishing_record_id)
    }

    pub fn status(&self, publishing_record_id: &PublishingRecordId) -> Result<Vec<StatusEntry>> {
        self.status.history(publishing_record_id)
    }
}
