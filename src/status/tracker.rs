//! Status Tracker
//!
//! Append-only status history per publishing record. Entries for one record are
//! pushed under that record's shard lock, so their order is exactly the append order.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;

use super::types::*;
use crate::error::{Error, Result};

pub struct StatusTracker {
    /// Structure: `Publishing Record ID -> ordered history`.
    histories: DashMap<PublishingRecordId, Vec<StatusEntry>>,
    next_sequence: AtomicU64,
}

impl StatusTracker {
    pub fn new() -> Self {
        Self {
            histories: DashMap::new(),
            next_sequence: AtomicU64::new(1),
        }
    }

    /// Records a new status for a publishing record.
    ///
    /// The only rejected input is an empty record id; callers treat that as fatal.
    pub fn append(
        &self,
        publishing_record_id: &PublishingRecordId,
        status: PublishingStatus,
        message: Option<String>,
        document_id: Option<String>,
    ) -> Result<StatusEntry> {
        if publishing_record_id.as_str().trim().is_empty() {
            return Err(Error::Validation(
                "publishing record id must not be empty".to_string(),
            ));
        }

        let mut history = self
            .histories
            .entry(publishing_record_id.clone())
            .or_default();

        let entry = StatusEntry {
            publishing_record_id: publishing_record_id.clone(),
            status,
            message,
            document_id,
            sequence: self.next_sequence.fetch_add(1, Ordering::SeqCst),
            recorded_at: now_ms(),
        };
        history.push(entry.clone());

        tracing::debug!(
            "Publishing record {} is now {:?}",
            publishing_record_id,
            status
        );
        Ok(entry)
    }

    /// Full history of a publishing record in append order.
    pub fn history(&self, publishing_record_id: &PublishingRecordId) -> Result<Vec<StatusEntry>> {
        self.histories
            .get(publishing_record_id)
            .map(|history| history.value().clone())
            .ok_or_else(|| Error::publishing_record_not_found(publishing_record_id.as_str()))
    }

    pub fn latest(&self, publishing_record_id: &PublishingRecordId) -> Option<StatusEntry> {
        self.histories
            .get(publishing_record_id)
            .and_then(|history| history.last().cloned())
    }

    pub fn record_count(&self) -> usize {
        self.histories.len()
    }
}

impl Default for StatusTracker {
    fn default() -> Self {
        Self::new()
    }
}
