//! The process-wide processing state: the job queue and the two busy flags.
//!
//! Only the sequencer task owns this value, so the flags themselves are the
//! lock. `dequeue_if_idle` tests and sets `is_processing` in one step, which
//! is what keeps two admission triggers from both acting on the queue head.

use crate::models::intake::QueueSnapshot;
use crate::models::job::Job;
use crate::services::queue::JobQueue;

#[derive(Debug, Default)]
pub struct ProcessingState {
    queue: JobQueue,
    is_processing: bool,
    is_notifying: bool,
}

impl ProcessingState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, job: Job) {
        self.queue.enqueue(job);
    }

    /// Pop the head job if nothing is processing or notifying, marking the
    /// state as processing.
    pub fn dequeue_if_idle(&mut self) -> Option<Job> {
        if self.is_processing || self.is_notifying {
            return None;
        }
        let job = self.queue.dequeue()?;
        self.is_processing = true;
        Some(job)
    }

    pub fn finish_processing(&mut self) {
        self.is_processing = false;
    }

    /// Claim the notification slot. Returns false if it is already taken.
    pub fn begin_notification(&mut self) -> bool {
        if self.is_notifying {
            return false;
        }
        self.is_notifying = true;
        true
    }

    pub fn end_notification(&mut self) {
        self.is_notifying = false;
    }

    pub fn is_processing(&self) -> bool {
        self.is_processing
    }

    pub fn is_notifying(&self) -> bool {
        self.is_notifying
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn snapshot(&self) -> QueueSnapshot {
        QueueSnapshot {
            is_processing: self.is_processing,
            is_notifying: self.is_notifying,
            queue_length: self.queue.len(),
            pending: self.queue.pending_files(),
        }
    }
}
