//! In-memory stand-ins for the external services
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::broadcast;
use tokio::time::Instant;

use document_intake::models::applicant::ApplicantRecord;
use document_intake::models::extraction::{
    AnalysisPage, AnalysisStatus, Block, DocumentLocation, FeatureType,
};
use document_intake::models::job::JobOutcome;
use document_intake::models::notification::{DocumentBatch, ExpenditureHeaders};
use document_intake::models::statement::{ExpenditureRow, ExtractedRow, NewExtractedRow};
use document_intake::sequencer::{Sequencer, SequencerConfig, SequencerEvent, SequencerHandle};
use document_intake::services::extraction::{ExtractionError, ExtractionService, PollPolicy};
use document_intake::services::notify::{NotificationSink, NotifyError};
use document_intake::services::persistence::{PersistenceError, PersistenceService};
use document_intake::services::pipeline::{JobProcessor, Services};
use document_intake::services::storage::{DocumentStore, StorageError};

pub const TEST_BUCKET: &str = "intake-test";

/// Object store that keeps uploads in memory.
#[derive(Default)]
pub struct MemoryDocumentStore {
    uploads: Mutex<Vec<(String, String)>>,
}

impl MemoryDocumentStore {
    /// (key, content type) of every upload, in order.
    pub fn uploads(&self) -> Vec<(String, String)> {
        self.uploads.lock().unwrap().clone()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn upload(
        &self,
        key: &str,
        _data: &[u8],
        content_type: &str,
    ) -> Result<DocumentLocation, StorageError> {
        self.uploads
            .lock()
            .unwrap()
            .push((key.to_string(), content_type.to_string()));
        Ok(DocumentLocation {
            bucket: TEST_BUCKET.to_string(),
            key: key.to_string(),
        })
    }
}

#[derive(Clone)]
enum Script {
    Succeed(Vec<Block>),
    Fail(String),
}

/// Extraction service answering from per-file scripts. Every analysis
/// reports one in-progress poll before its terminal page.
#[derive(Default)]
pub struct FakeExtraction {
    scripts: Mutex<HashMap<String, Script>>,
    jobs: Mutex<HashMap<String, (Script, bool)>>,
    started: Mutex<Vec<(String, Vec<FeatureType>)>>,
}

impl FakeExtraction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(self, file_name: &str, blocks: Vec<Block>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(file_name.to_string(), Script::Succeed(blocks));
        self
    }

    pub fn failing(self, file_name: &str, message: &str) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(file_name.to_string(), Script::Fail(message.to_string()));
        self
    }

    /// (object key, features) of every started analysis.
    pub fn started(&self) -> Vec<(String, Vec<FeatureType>)> {
        self.started.lock().unwrap().clone()
    }
}

#[async_trait]
impl ExtractionService for FakeExtraction {
    async fn start_analysis(
        &self,
        location: &DocumentLocation,
        features: &[FeatureType],
    ) -> Result<String, ExtractionError> {
        let file_name = location.key.rsplit('/').next().unwrap_or_default();
        let script = self
            .scripts
            .lock()
            .unwrap()
            .get(file_name)
            .cloned()
            .unwrap_or(Script::Succeed(Vec::new()));

        let mut started = self.started.lock().unwrap();
        started.push((location.key.clone(), features.to_vec()));
        let job_id = format!("analysis-{}", started.len());
        self.jobs
            .lock()
            .unwrap()
            .insert(job_id.clone(), (script, false));
        Ok(job_id)
    }

    async fn get_analysis(
        &self,
        job_id: &str,
        _next_token: Option<&str>,
    ) -> Result<AnalysisPage, ExtractionError> {
        let mut jobs = self.jobs.lock().unwrap();
        let (script, polled) = jobs.get_mut(job_id).expect("unknown analysis job");

        if !*polled {
            *polled = true;
            return Ok(page(AnalysisStatus::InProgress, Vec::new(), None));
        }

        Ok(match script {
            Script::Succeed(blocks) => page(AnalysisStatus::Succeeded, blocks.clone(), None),
            Script::Fail(message) => page(AnalysisStatus::Failed, Vec::new(), Some(message.clone())),
        })
    }
}

fn page(job_status: AnalysisStatus, blocks: Vec<Block>, status_message: Option<String>) -> AnalysisPage {
    AnalysisPage {
        job_status,
        blocks,
        next_token: None,
        status_message,
    }
}

#[derive(Default)]
struct Tables {
    applicants: Vec<(i32, ApplicantRecord)>,
    rows: Vec<ExtractedRow>,
}

/// Mirrors the `select_unprocessed_rows` filter: unprocessed, dated,
/// described, with a debit or credit that starts with a digit.
fn is_expenditure_candidate(row: &ExtractedRow) -> bool {
    let starts_with_digit = |value: Option<&str>| {
        value
            .and_then(|v| v.chars().next())
            .is_some_and(|c| c.is_ascii_digit())
    };
    !row.processed
        && row.text.is_some()
        && row.description.as_deref().is_some_and(|d| !d.is_empty())
        && (starts_with_digit(row.debit.as_deref()) || starts_with_digit(row.credit.as_deref()))
}

/// Persistence with the same claim semantics as the PostgreSQL store.
#[derive(Default)]
pub struct MemoryPersistence {
    tables: Mutex<Tables>,
    fail_saves: bool,
}

impl MemoryPersistence {
    pub fn failing_saves() -> Self {
        Self {
            fail_saves: true,
            ..Self::default()
        }
    }

    pub fn rows(&self) -> Vec<ExtractedRow> {
        self.tables.lock().unwrap().rows.clone()
    }

    pub fn applicant_count(&self) -> usize {
        self.tables.lock().unwrap().applicants.len()
    }
}

#[async_trait]
impl PersistenceService for MemoryPersistence {
    async fn save_statement(
        &self,
        applicant: &ApplicantRecord,
        rows: &[NewExtractedRow],
    ) -> Result<Vec<i64>, PersistenceError> {
        if self.fail_saves {
            return Err(PersistenceError::InvalidApplicant("save rejected".to_string()));
        }

        let mut tables = self.tables.lock().unwrap();
        let existing = tables
            .applicants
            .iter()
            .find(|(_, a)| a.applicant_id == applicant.applicant_id)
            .map(|(id, _)| *id);
        let applicant_db_id = match existing {
            Some(id) => id,
            None => {
                let id = tables.applicants.len() as i32 + 1;
                tables.applicants.push((id, applicant.clone()));
                id
            }
        };

        let mut ids = Vec::new();
        for row in rows {
            let id = tables.rows.len() as i64 + 1;
            tables.rows.push(ExtractedRow {
                id,
                applicant_id: applicant_db_id,
                text: row.text.clone(),
                description: row.description.clone(),
                debit: row.debit.clone(),
                credit: row.credit.clone(),
                balance: row.balance.clone(),
                processed: false,
                created_at: Utc::now(),
            });
            ids.push(id);
        }
        Ok(ids)
    }

    async fn find_applicant(&self, applicant_id: i64) -> Result<Option<i32>, PersistenceError> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .applicants
            .iter()
            .find(|(_, a)| a.applicant_id == applicant_id)
            .map(|(id, _)| *id))
    }

    async fn select_unprocessed_rows(
        &self,
        applicant_db_id: i32,
    ) -> Result<Vec<ExtractedRow>, PersistenceError> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .rows
            .iter()
            .filter(|r| r.applicant_id == applicant_db_id && is_expenditure_candidate(r))
            .cloned()
            .collect())
    }

    async fn mark_rows_processed(&self, ids: &[i64]) -> Result<Vec<i64>, PersistenceError> {
        let mut tables = self.tables.lock().unwrap();
        let mut claimed = Vec::new();
        for row in tables.rows.iter_mut() {
            if ids.contains(&row.id) && !row.processed {
                row.processed = true;
                claimed.push(row.id);
            }
        }
        Ok(claimed)
    }

    async fn ping(&self) -> Result<(), PersistenceError> {
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub enum Delivery {
    Document {
        batch: DocumentBatch,
        at: Instant,
    },
    Expenditure {
        rows: Vec<ExpenditureRow>,
        headers: ExpenditureHeaders,
        at: Instant,
    },
}

/// Notification sink that records deliveries and how many overlapped.
#[derive(Default)]
pub struct RecordingSink {
    deliveries: Mutex<Vec<Delivery>>,
    latency: Duration,
    fail_expenditure: bool,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl RecordingSink {
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency,
            ..Self::default()
        }
    }

    pub fn rejecting_expenditure() -> Self {
        Self {
            fail_expenditure: true,
            ..Self::default()
        }
    }

    pub fn deliveries(&self) -> Vec<Delivery> {
        self.deliveries.lock().unwrap().clone()
    }

    pub fn expenditure_rows(&self) -> Vec<ExpenditureRow> {
        self.deliveries()
            .into_iter()
            .filter_map(|d| match d {
                Delivery::Expenditure { rows, .. } => Some(rows),
                Delivery::Document { .. } => None,
            })
            .flatten()
            .collect()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn deliver(&self, delivery: Delivery) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.deliveries.lock().unwrap().push(delivery);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn send_document_result(&self, batch: &DocumentBatch) -> Result<(), NotifyError> {
        self.deliver(Delivery::Document {
            batch: batch.clone(),
            at: Instant::now(),
        })
        .await;
        Ok(())
    }

    async fn send_expenditure(
        &self,
        rows: &[ExpenditureRow],
        headers: &ExpenditureHeaders,
    ) -> Result<(), NotifyError> {
        if self.fail_expenditure {
            return Err(NotifyError::Rejected {
                endpoint: "expenditure",
                status: 500,
                body: "unavailable".to_string(),
            });
        }
        self.deliver(Delivery::Expenditure {
            rows: rows.to_vec(),
            headers: headers.clone(),
            at: Instant::now(),
        })
        .await;
        Ok(())
    }
}

/// Fakes wired into a running sequencer.
pub struct Harness {
    pub storage: Arc<MemoryDocumentStore>,
    pub extraction: Arc<FakeExtraction>,
    pub persistence: Arc<MemoryPersistence>,
    pub sink: Arc<RecordingSink>,
    pub handle: SequencerHandle,
    pub events: broadcast::Receiver<SequencerEvent>,
}

pub const TEST_GRACE: Duration = Duration::from_secs(1);

pub fn test_poll_policy() -> PollPolicy {
    PollPolicy {
        initial: Duration::from_millis(50),
        max: Duration::from_millis(200),
        multiplier: 2.0,
    }
}

impl Harness {
    pub fn start(
        extraction: FakeExtraction,
        persistence: MemoryPersistence,
        sink: RecordingSink,
    ) -> Self {
        let storage = Arc::new(MemoryDocumentStore::default());
        let extraction = Arc::new(extraction);
        let persistence = Arc::new(persistence);
        let sink = Arc::new(sink);

        let services = Services {
            storage: storage.clone(),
            extraction: extraction.clone(),
            persistence: persistence.clone(),
            notifier: sink.clone(),
        };
        let processor = JobProcessor::new(services, test_poll_policy());
        let (handle, _task) = Sequencer::spawn(
            Arc::new(processor),
            SequencerConfig {
                notify_grace: TEST_GRACE,
            },
        );
        let events = handle.subscribe();

        Self {
            storage,
            extraction,
            persistence,
            sink,
            handle,
            events,
        }
    }

    /// Wait for `count` jobs to finish, returning (file, outcome) in
    /// completion order.
    pub async fn wait_finished(&mut self, count: usize) -> Vec<(String, JobOutcome)> {
        let mut finished = Vec::new();
        while finished.len() < count {
            match self.events.recv().await.expect("sequencer event stream closed") {
                SequencerEvent::JobFinished { file, outcome, .. } => finished.push((file, outcome)),
                _ => continue,
            }
        }
        finished
    }

    /// Collect events until `count` jobs have finished.
    pub async fn events_until_finished(&mut self, count: usize) -> Vec<SequencerEvent> {
        let mut events = Vec::new();
        let mut finished = 0;
        while finished < count {
            let event = self.events.recv().await.expect("sequencer event stream closed");
            if matches!(event, SequencerEvent::JobFinished { .. }) {
                finished += 1;
            }
            events.push(event);
        }
        events
    }
}
