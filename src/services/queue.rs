use std::collections::VecDeque;

use crate::models::job::Job;

/// In-memory FIFO of jobs waiting for the sequencer.
///
/// No priority and no deduplication: every submitted document is its own job.
#[derive(Debug, Default)]
pub struct JobQueue {
    jobs: VecDeque<Job>,
}

impl JobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a job to the tail.
    pub fn enqueue(&mut self, job: Job) {
        tracing::debug!(job_id = %job.id, file = %job.document.file_name, "Job queued");
        self.jobs.push_back(job);
        metrics::gauge!("intake_queue_depth").set(self.jobs.len() as f64);
    }

    /// Remove and return the head job.
    pub fn dequeue(&mut self) -> Option<Job> {
        let job = self.jobs.pop_front();
        metrics::gauge!("intake_queue_depth").set(self.jobs.len() as f64);
        job
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// File names of the queued jobs, head first.
    pub fn pending_files(&self) -> Vec<String> {
        self.jobs
            .iter()
            .map(|job| job.document.file_name.clone())
            .collect()
    }
}
