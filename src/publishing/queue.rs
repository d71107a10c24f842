//! Submission Queue
//!
//! Decouples request intake from processing. Backed by an unbounded
//! `crossbeam_channel`, which gives:
//! - **Non-blocking enqueue** from any number of producers.
//! - **FIFO** delivery in send order.
//! - **Atomic per-item dequeue**: a job is handed to exactly one consumer even if
//!   several call `try_dequeue` at once.
//!
//! Contents live in process memory only and are lost on restart.

use crossbeam_channel::{Receiver, Sender, TryRecvError};

use super::types::PublishJob;

pub struct SubmissionQueue {
    sender: Sender<PublishJob>,
    receiver: Receiver<PublishJob>,
}

impl SubmissionQueue {
    pub fn new() -> Self {
        let (sender, receiver) = crossbeam_channel::unbounded();
        Self { sender, receiver }
    }

    pub fn enqueue(&self, job: PublishJob) {
        let publishing_record_id = job.publishing_record_id.clone();

        // The queue owns a receiver for as long as it lives, so the channel cannot be
        // disconnected here.
        if let Err(err) = self.sender.send(job) {
            tracing::error!(
                "Dropped publish job {}: queue disconnected",
                err.0.publishing_record_id
            );
            return;
        }

        tracing::trace!("Queued publish job {}", publishing_record_id);
    }

    /// Next job in FIFO order, or `None` when nothing is pending.
    pub fn try_dequeue(&self) -> Option<PublishJob> {
        match self.receiver.try_recv() {
            Ok(job) => Some(job),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}

impl Default for SubmissionQueue {
    fn default() -> Self {
        Self::new()
    }
}
