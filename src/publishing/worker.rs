//! Publish Worker
//!
//! Drives one queued job at a time through the status state machine:
//!
//! ```text
//! QUEUED -> IN_PROGRESS -> format -> upsert -> SUCCESSFUL
//!                             |         |
//!                             +----+----+
//!                                  v
//!                               FAILED
//! ```
//!
//! Every dequeued job gets exactly one terminal status. Business failures
//! (unknown document, invalid input, unavailable store, a formatter that panics)
//! become FAILED and the call still succeeds. Two things escape as `Err`: a status
//! write that fails, and a `Logic` error, which is recorded as FAILED first and
//! then returned so the tick fails loudly.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use super::formatter::Formatter;
use super::queue::SubmissionQueue;
use super::types::PublishJob;
use crate::catalog::{CatalogInput, CatalogRecord, VersionedCatalogStore};
use crate::error::{Error, Result};
use crate::status::{PublishingStatus, StatusEntry, StatusTracker};

pub struct PublishWorker {
    queue: Arc<SubmissionQueue>,
    status: Arc<StatusTracker>,
    catalog: Arc<VersionedCatalogStore>,
    formatter: Arc<dyn Formatter>,
}

impl PublishWorker {
    pub fn new(
        queue: Arc<SubmissionQueue>,
        status: Arc<StatusTracker>,
        catalog: Arc<VersionedCatalogStore>,
        formatter: Arc<dyn Formatter>,
    ) -> Arc<Self> {
        Arc::new(Self {
            queue,
            status,
            catalog,
            formatter,
        })
    }

    /// Processes at most one job.
    ///
    /// Returns `Ok(None)` if the queue was empty, otherwise the terminal status
    /// entry written for the job.
    pub async fn process_next(&self) -> Result<Option<StatusEntry>> {
        let Some(job) = self.queue.try_dequeue() else {
            tracing::trace!("No publish jobs pending");
            return Ok(None);
        };

        tracing::info!(
            "Processing publish job {} (document: {})",
            job.publishing_record_id,
            job.document_id.as_deref().unwrap_or("<new>")
        );

        self.status.append(
            &job.publishing_record_id,
            PublishingStatus::InProgress,
            None,
            job.document_id.clone(),
        )?;

        match self.publish(&job).await {
            Ok(record) => {
                let entry = self.status.append(
                    &job.publishing_record_id,
                    PublishingStatus::Successful,
                    None,
                    Some(record.document_id.clone()),
                )?;
                tracing::info!(
                    "Publish job {} succeeded: document {} version {}",
                    job.publishing_record_id,
                    record.document_id,
                    record.version
                );
                Ok(Some(entry))
            }
            Err(err) => {
                let entry = self.fail(&job, &err)?;
                if err.is_fatal() {
                    return Err(err);
                }
                Ok(Some(entry))
            }
        }
    }

    async fn publish(&self, job: &PublishJob) -> Result<CatalogRecord> {
        let input = self.format(job)?;
        self.catalog.upsert(input).await
    }

    /// Runs the formatter, turning a panic into a validation failure for this job.
    fn format(&self, job: &PublishJob) -> Result<CatalogInput> {
        panic::catch_unwind(AssertUnwindSafe(|| self.formatter.format(job))).unwrap_or_else(
            |payload| {
                Err(Error::Validation(format!(
                    "formatter panicked: {}",
                    panic_reason(payload.as_ref())
                )))
            },
        )
    }

    fn fail(&self, job: &PublishJob, err: &Error) -> Result<StatusEntry> {
        let message = match (err, &job.document_id) {
            (Error::NotFound { .. }, Some(document_id)) => {
                format!("document to update does not exist: {}", document_id)
            }
            _ => format!("publishing failed: {}", err),
        };

        if err.is_fatal() {
            tracing::error!(
                "Publish job {} hit a broken invariant: {}",
                job.publishing_record_id,
                err
            );
        } else {
            tracing::warn!("Publish job {} failed: {}", job.publishing_record_id, message);
        }

        self.status.append(
            &job.publishing_record_id,
            PublishingStatus::Failed,
            Some(message),
            job.document_id.clone(),
        )
    }
}

fn panic_reason(payload: &(dyn Any + Send)) -> String {
    if let Some(reason) = payload.downcast_ref::<&str>() {
        reason.to_string()
    } else if let Some(reason) = payload.downcast_ref::<String>() {
        reason.clone()
    } else {
        "unknown panic".to_string()
    }
}
