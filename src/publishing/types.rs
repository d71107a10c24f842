use serde::{Deserialize, Serialize};

use crate::status::PublishingRecordId;

/// A publish request as it arrives at the intake.
///
/// `document_id == None` publishes a new document, otherwise a new version of an
/// existing one. `genre` is free text here and validated by the formatter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PublishRequest {
    #[serde(default)]
    pub document_id: Option<String>,
    pub author: String,
    pub title: String,
    #[serde(default)]
    pub body: String,
    pub genre: String,
}

/// A queued unit of work. Immutable once enqueued and consumed exactly once.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PublishJob {
    pub publishing_record_id: PublishingRecordId,
    pub document_id: Option<String>,
    pub author: String,
    pub title: String,
    pub body: String,
    pub genre: String,
}

impl PublishJob {
    pub fn from_request(publishing_record_id: PublishingRecordId, request: PublishRequest) -> Self {
        Self {
            publishing_record_id,
            document_id: request.document_id,
            author: request.author,
            title: request.title,
            body: request.body,
            genre: request.genre,
        }
    }
}
