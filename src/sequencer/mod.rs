//! Single-consumer coordinator for document jobs and outbound notifications.
//!
//! All triggers (intake, job completion, notification settle, grace expiry)
//! arrive as messages on one channel and are handled by one task, which owns
//! the [`ProcessingState`]. At most one job is processing and at most one
//! notification is in flight. After a notification settles the slot stays
//! taken for a grace period, and a new job is admitted only once both the
//! job slot and the notification slot are free.

pub mod state;

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use uuid::Uuid;

use crate::models::intake::QueueSnapshot;
use crate::models::job::{Job, JobOutcome};
use state::ProcessingState;

const EVENT_CAPACITY: usize = 256;

/// Executes one job. Implementations must not return until the job reached
/// a terminal outcome.
#[async_trait]
pub trait JobRunner: Send + Sync {
    async fn run(&self, job: Job, gate: NotifyGate) -> JobOutcome;
}

#[derive(Debug, Clone, Copy)]
pub struct SequencerConfig {
    /// How long the notification slot stays taken after a notification settles.
    pub notify_grace: Duration,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            notify_grace: Duration::from_secs(1),
        }
    }
}

/// Observable transitions, published for logging and tests.
#[derive(Debug, Clone, PartialEq)]
pub enum SequencerEvent {
    JobStarted {
        job_id: Uuid,
        file: String,
        at: Instant,
    },
    JobFinished {
        job_id: Uuid,
        file: String,
        outcome: JobOutcome,
        at: Instant,
    },
    NotificationStarted {
        at: Instant,
    },
    NotificationSettled {
        at: Instant,
    },
    NotificationReleased {
        at: Instant,
    },
}

enum Command {
    Submit {
        jobs: Vec<Job>,
        reply: oneshot::Sender<QueueSnapshot>,
    },
    Snapshot {
        reply: oneshot::Sender<QueueSnapshot>,
    },
    JobFinished {
        job_id: Uuid,
        file: String,
        outcome: JobOutcome,
    },
    AcquireNotify {
        reply: oneshot::Sender<NotifyPermit>,
    },
    NotifySettled,
}

#[derive(Debug, thiserror::Error)]
pub enum SequencerError {
    #[error("Sequencer is not running")]
    Closed,
}

/// Grants the notification slot to a running job.
#[derive(Clone)]
pub struct NotifyGate {
    tx: mpsc::UnboundedSender<Command>,
}

impl NotifyGate {
    /// Wait for the notification slot. The slot is held until the returned
    /// permit is dropped, then for the grace period.
    pub async fn acquire(&self) -> Result<NotifyPermit, SequencerError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::AcquireNotify { reply })
            .map_err(|_| SequencerError::Closed)?;
        rx.await.map_err(|_| SequencerError::Closed)
    }
}

/// Holds the notification slot. Dropping it marks the notification settled.
pub struct NotifyPermit {
    tx: mpsc::UnboundedSender<Command>,
}

impl Drop for NotifyPermit {
    fn drop(&mut self) {
        let _ = self.tx.send(Command::NotifySettled);
    }
}

/// Cloneable handle used by the HTTP layer.
#[derive(Clone)]
pub struct SequencerHandle {
    tx: mpsc::UnboundedSender<Command>,
    events: broadcast::Sender<SequencerEvent>,
}

impl SequencerHandle {
    /// Append jobs to the queue, in order, and trigger admission.
    pub async fn submit(&self, jobs: Vec<Job>) -> Result<QueueSnapshot, SequencerError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::Submit { jobs, reply })
            .map_err(|_| SequencerError::Closed)?;
        rx.await.map_err(|_| SequencerError::Closed)
    }

    pub async fn snapshot(&self) -> Result<QueueSnapshot, SequencerError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::Snapshot { reply })
            .map_err(|_| SequencerError::Closed)?;
        rx.await.map_err(|_| SequencerError::Closed)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SequencerEvent> {
        self.events.subscribe()
    }
}

pub struct Sequencer {
    state: ProcessingState,
    rx: mpsc::UnboundedReceiver<Command>,
    tx: mpsc::WeakUnboundedSender<Command>,
    events: broadcast::Sender<SequencerEvent>,
    runner: Arc<dyn JobRunner>,
    config: SequencerConfig,
    grace_deadline: Option<Instant>,
    notify_waiters: VecDeque<oneshot::Sender<NotifyPermit>>,
}

impl Sequencer {
    /// Start the sequencer task. It stops once every handle, gate and permit
    /// has been dropped.
    pub fn spawn(
        runner: Arc<dyn JobRunner>,
        config: SequencerConfig,
    ) -> (SequencerHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        let sequencer = Sequencer {
            state: ProcessingState::new(),
            rx,
            tx: tx.downgrade(),
            events: events.clone(),
            runner,
            config,
            grace_deadline: None,
            notify_waiters: VecDeque::new(),
        };

        let task = tokio::spawn(sequencer.run());
        (SequencerHandle { tx, events }, task)
    }

    async fn run(mut self) {
        tracing::info!(
            notify_grace_ms = self.config.notify_grace.as_millis() as u64,
            "Sequencer started"
        );

        loop {
            let deadline = self.grace_deadline;
            tokio::select! {
                cmd = self.rx.recv() => match cmd {
                    Some(cmd) => self.handle(cmd),
                    None => break,
                },
                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    self.grace_elapsed();
                }
            }
        }

        tracing::info!(
            dropped_jobs = self.state.queue_len(),
            "Sequencer stopped"
        );
    }

    fn handle(&mut self, cmd: Command) {
        match cmd {
            Command::Submit { jobs, reply } => {
                let count = jobs.len();
                for job in jobs {
                    self.state.enqueue(job);
                }
                metrics::counter!("intake_documents_total").increment(count as u64);
                tracing::info!(count, queue_length = self.state.queue_len(), "Documents queued");

                self.admit();
                let _ = reply.send(self.state.snapshot());
            }
            Command::Snapshot { reply } => {
                let _ = reply.send(self.state.snapshot());
            }
            Command::JobFinished {
                job_id,
                file,
                outcome,
            } => {
                self.state.finish_processing();
                match &outcome {
                    JobOutcome::Completed(report) => {
                        metrics::counter!("intake_jobs_completed").increment(1);
                        tracing::info!(
                            job_id = %job_id,
                            file = %file,
                            category = %report.category,
                            rows = report.rows_persisted,
                            notifications = report.notifications_sent,
                            "Job completed"
                        );
                    }
                    JobOutcome::Failed { error } => {
                        metrics::counter!("intake_jobs_failed").increment(1);
                        tracing::error!(job_id = %job_id, file = %file, error = %error, "Job failed");
                    }
                }
                self.emit(SequencerEvent::JobFinished {
                    job_id,
                    file,
                    outcome,
                    at: Instant::now(),
                });
                self.admit();
            }
            Command::AcquireNotify { reply } => {
                if self.state.begin_notification() {
                    self.grant(reply);
                } else {
                    tracing::debug!("Notification slot busy, waiting");
                    self.notify_waiters.push_back(reply);
                }
            }
            Command::NotifySettled => {
                let now = Instant::now();
                self.grace_deadline = Some(now + self.config.notify_grace);
                self.emit(SequencerEvent::NotificationSettled { at: now });
            }
        }
    }

    fn grant(&mut self, reply: oneshot::Sender<NotifyPermit>) {
        let Some(tx) = self.tx.upgrade() else {
            self.state.end_notification();
            return;
        };
        self.emit(SequencerEvent::NotificationStarted { at: Instant::now() });
        // A refused permit is dropped here, which settles it like any other.
        let _ = reply.send(NotifyPermit { tx });
    }

    fn grace_elapsed(&mut self) {
        self.grace_deadline = None;
        self.state.end_notification();
        self.emit(SequencerEvent::NotificationReleased { at: Instant::now() });
        tracing::debug!("Notification slot released");

        while let Some(reply) = self.notify_waiters.pop_front() {
            if reply.is_closed() {
                continue;
            }
            self.state.begin_notification();
            self.grant(reply);
            return;
        }

        self.admit();
    }

    fn admit(&mut self) {
        tracing::debug!(
            is_processing = self.state.is_processing(),
            is_notifying = self.state.is_notifying(),
            queue_length = self.state.queue_len(),
            "Admission check"
        );

        let Some(job) = self.state.dequeue_if_idle() else {
            return;
        };

        let Some(tx) = self.tx.upgrade() else {
            tracing::warn!(job_id = %job.id, "Sequencer shutting down, job dropped");
            self.state.finish_processing();
            return;
        };

        let job_id = job.id;
        let file = job.document.file_name.clone();
        let waited_ms = (chrono::Utc::now() - job.submitted_at).num_milliseconds();
        tracing::info!(job_id = %job_id, file = %file, waited_ms, "Processing document");
        self.emit(SequencerEvent::JobStarted {
            job_id,
            file: file.clone(),
            at: Instant::now(),
        });

        let runner = self.runner.clone();
        let gate = NotifyGate { tx: tx.clone() };
        tokio::spawn(async move {
            let started = std::time::Instant::now();
            // Run in a nested task so a panic still reports a terminal outcome.
            let outcome = match tokio::spawn(async move { runner.run(job, gate).await }).await {
                Ok(outcome) => outcome,
                Err(e) => JobOutcome::Failed {
                    error: format!("job task aborted: {e}"),
                },
            };
            metrics::histogram!("intake_job_processing_seconds").record(started.elapsed().as_secs_f64());
            let _ = tx.send(Command::JobFinished {
                job_id,
                file,
                outcome,
            });
        });
    }

    fn emit(&self, event: SequencerEvent) {
        let _ = self.events.send(event);
    }
}
