use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of one submitted publish request, distinct from the document it targets.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct PublishingRecordId(pub String);

impl PublishingRecordId {
    /// Generates a new `publishingrecord.<uuid v4>` id.
    pub fn new() -> Self {
        Self(format!("publishingrecord.{}", uuid::Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for PublishingRecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PublishingRecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle of a publishing record.
///
/// `Queued -> InProgress -> (Successful | Failed)`. The last two are terminal and
/// mutually exclusive.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PublishingStatus {
    Queued,
    InProgress,
    Successful,
    Failed,
}

impl PublishingStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PublishingStatus::Successful | PublishingStatus::Failed)
    }
}

/// One step of a publishing record's audit trail.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusEntry {
    pub publishing_record_id: PublishingRecordId,
    pub status: PublishingStatus,
    pub message: Option<String>,
    pub document_id: Option<String>,
    /// Tracker-wide append order.
    pub sequence: u64,
    /// Unix time in milliseconds.
    pub recorded_at: u64,
}

pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
