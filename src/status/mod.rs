//! Publishing Status Module
//!
//! Tracks the lifecycle of every submitted publish request as an ordered,
//! append-only list of `StatusEntry` values. The intake writes `Queued`; the
//! worker writes `InProgress` and exactly one terminal status.

pub mod tracker;
pub mod types;

pub use tracker::StatusTracker;
pub use types::{PublishingRecordId, PublishingStatus, StatusEntry};
