//! Publishing Pipeline Module
//!
//! Accepts publish requests, queues them, and publishes them into the catalog in
//! the background.
//!
//! ## Flow
//! 1. **Intake**: `SubmissionService::submit` writes `QUEUED` and enqueues a `PublishJob`.
//! 2. **Scheduling**: `Scheduler` ticks on a fixed period, one tick at a time.
//! 3. **Processing**: each tick calls `PublishWorker::process_next`, which takes at most
//!    one job, marks it `IN_PROGRESS`, formats it, upserts it into the catalog and
//!    writes `SUCCESSFUL` or `FAILED`.
//!
//! ## Submodules
//! - **`types`**: `PublishRequest` and `PublishJob`.
//! - **`queue`**: the concurrent FIFO between intake and worker.
//! - **`formatter`**: job-to-catalog field mapping and validation.
//! - **`intake`**: `SubmissionService`.
//! - **`worker`**: `PublishWorker` and the per-job state machine.
//! - **`scheduler`**: periodic driver with idempotent start/stop.

pub mod formatter;
pub mod intake;
pub mod queue;
pub mod scheduler;
pub mod types;
pub mod worker;

pub use formatter::{CatalogFormatter, Formatter};
pub use intake::SubmissionService;
pub use queue::SubmissionQueue;
pub use scheduler::Scheduler;
pub use types::{PublishJob, PublishRequest};
pub use worker::PublishWorker;

#[cfg(test)]
mod tests;
