//! Processing of a single job: upload, extraction, persistence and
//! notification, with the notification slot taken through the sequencer.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use crate::models::extraction::{DocumentLocation, FeatureType};
use crate::models::job::{Document, Job, JobOutcome, JobReport};
use crate::models::notification::{DocumentBatch, DocumentResult, ExpenditureHeaders};
use crate::models::statement::ExpenditureRow;
use crate::sequencer::{JobRunner, NotifyGate, SequencerError};
use crate::services::classifier::{self, DocumentCategory};
use crate::services::extraction::{ExtractionError, ExtractionService, Extractor, PollPolicy};
use crate::services::notify::{NotificationSink, NotifyError};
use crate::services::persistence::{PersistenceError, PersistenceService};
use crate::services::statement;
use crate::services::storage::{DocumentStore, StorageError};

/// Extensions the extraction service accepts without conversion.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["pdf", "png", "jpeg", "jpg", "tiff", "tif"];

const PROCESSED_MESSAGE: &str = "File processed successfully.";

/// External collaborators of the pipeline.
#[derive(Clone)]
pub struct Services {
    pub storage: Arc<dyn DocumentStore>,
    pub extraction: Arc<dyn ExtractionService>,
    pub persistence: Arc<dyn PersistenceService>,
    pub notifier: Arc<dyn NotificationSink>,
}

#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("Upload failed: {0}")]
    Storage(#[from] StorageError),

    #[error("Extraction failed: {0}")]
    ExtractionFailed(#[from] ExtractionError),

    #[error("Persistence failed: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("Notification failed: {0}")]
    Notify(#[from] NotifyError),

    #[error(transparent)]
    Sequencer(#[from] SequencerError),
}

pub struct JobProcessor {
    services: Services,
    extractor: Extractor,
}

impl JobProcessor {
    pub fn new(services: Services, poll: PollPolicy) -> Self {
        let extractor = Extractor::new(services.extraction.clone(), poll);
        Self {
            services,
            extractor,
        }
    }

    /// Run one job to its terminal result.
    pub async fn process(&self, job: &Job, gate: &NotifyGate) -> Result<JobReport, ProcessError> {
        let document = &job.document;
        ensure_supported(document)?;

        let category = classifier::classify(&document.file_name);
        tracing::info!(job_id = %job.id, file = %document.file_name, category = %category, "Document classified");

        let key = format!("uploads/{}/{}", job.id, base_name(&document.file_name));
        let location = self
            .services
            .storage
            .upload(&key, &document.bytes, content_type(document))
            .await?;

        match category {
            DocumentCategory::BankStatement => self.process_statement(job, &location, gate).await,
            _ => self.process_generic(job, category, &location, gate).await,
        }
    }

    async fn process_statement(
        &self,
        job: &Job,
        location: &DocumentLocation,
        gate: &NotifyGate,
    ) -> Result<JobReport, ProcessError> {
        let extracted = self
            .extractor
            .analyze(location, &[FeatureType::Tables])
            .await?;

        let rows = statement::rows_from_tables(&extracted.table_results);
        if rows.is_empty() {
            tracing::warn!(job_id = %job.id, file = %job.document.file_name, "No statement rows extracted");
        }

        let inserted = match job.applicants.first() {
            Some((key, applicant)) => {
                match self.services.persistence.save_statement(applicant, &rows).await {
                    Ok(ids) => ids,
                    Err(e) => {
                        tracing::error!(
                            job_id = %job.id,
                            applicant = key,
                            error = %e,
                            "Saving statement rows failed, transaction rolled back"
                        );
                        Vec::new()
                    }
                }
            }
            None => {
                tracing::warn!(job_id = %job.id, "No applicant attached, statement rows not saved");
                Vec::new()
            }
        };

        let (sent, failed) = self.forward_expenditure(job, &extracted.job_id, gate).await;

        Ok(JobReport {
            category: DocumentCategory::BankStatement,
            rows_persisted: inserted.len(),
            notifications_sent: sent,
            notifications_failed: failed,
        })
    }

    /// For every applicant of the job, claim its unprocessed numeric rows
    /// and forward them to the expenditure feed. Returns (sent, failed).
    async fn forward_expenditure(
        &self,
        job: &Job,
        extraction_job_id: &str,
        gate: &NotifyGate,
    ) -> (usize, usize) {
        let persistence = &self.services.persistence;
        let headers = ExpenditureHeaders::from_context(&job.applicants, extraction_job_id);
        let mut sent = 0;
        let mut failed = 0;

        for (name, applicant) in job.applicants.iter() {
            let applicant_db_id = match persistence.find_applicant(applicant.applicant_id).await {
                Ok(Some(id)) => id,
                Ok(None) => {
                    tracing::warn!(applicant = name, applicant_id = applicant.applicant_id, "Applicant not stored");
                    continue;
                }
                Err(e) => {
                    tracing::error!(applicant = name, error = %e, "Applicant lookup failed");
                    continue;
                }
            };

            let candidates = match persistence.select_unprocessed_rows(applicant_db_id).await {
                Ok(rows) => rows,
                Err(e) => {
                    tracing::error!(applicant = name, error = %e, "Selecting unprocessed rows failed");
                    continue;
                }
            };
            if candidates.is_empty() {
                tracing::info!(applicant = name, "No new rows to forward");
                continue;
            }

            let ids: Vec<i64> = candidates.iter().map(|r| r.id).collect();
            let claimed = match persistence.mark_rows_processed(&ids).await {
                Ok(claimed) => claimed,
                Err(e) => {
                    tracing::error!(applicant = name, error = %e, "Marking rows processed failed");
                    continue;
                }
            };

            let rows: Vec<ExpenditureRow> = candidates
                .iter()
                .filter(|r| claimed.contains(&r.id))
                .map(ExpenditureRow::from)
                .collect();
            if rows.is_empty() {
                continue;
            }

            let permit = match gate.acquire().await {
                Ok(permit) => permit,
                Err(e) => {
                    tracing::error!(applicant = name, error = %e, "Notification slot unavailable");
                    failed += 1;
                    continue;
                }
            };
            let result = self.services.notifier.send_expenditure(&rows, &headers).await;
            drop(permit);

            match result {
                Ok(()) => {
                    tracing::info!(applicant = name, rows = rows.len(), "Expenditure batch forwarded");
                    sent += 1;
                }
                Err(e) => {
                    // The rows stay marked processed; they are not resent.
                    tracing::error!(
                        applicant = name,
                        row_ids = ?claimed,
                        error = %e,
                        "Expenditure batch lost"
                    );
                    failed += 1;
                }
            }
        }

        (sent, failed)
    }

    async fn process_generic(
        &self,
        job: &Job,
        category: DocumentCategory,
        location: &DocumentLocation,
        gate: &NotifyGate,
    ) -> Result<JobReport, ProcessError> {
        let extracted = self
            .extractor
            .analyze(location, &[FeatureType::Tables, FeatureType::Forms])
            .await?;

        let batch = DocumentBatch {
            applicants: job.applicants.clone(),
            extract_data: vec![DocumentResult {
                file: job.document.file_name.clone(),
                classified: category,
                message: PROCESSED_MESSAGE.to_string(),
                extracted_data: extracted,
            }],
        };

        let _permit = gate.acquire().await?;
        self.services.notifier.send_document_result(&batch).await?;

        Ok(JobReport {
            category,
            rows_persisted: 0,
            notifications_sent: 1,
            notifications_failed: 0,
        })
    }
}

#[async_trait]
impl JobRunner for JobProcessor {
    async fn run(&self, job: Job, gate: NotifyGate) -> JobOutcome {
        match self.process(&job, &gate).await {
            Ok(report) => JobOutcome::Completed(report),
            Err(e) => JobOutcome::Failed {
                error: e.to_string(),
            },
        }
    }
}

fn ensure_supported(document: &Document) -> Result<(), ProcessError> {
    match document.extension() {
        Some(ext) if SUPPORTED_EXTENSIONS.contains(&ext.as_str()) => Ok(()),
        _ => Err(ProcessError::UnsupportedFileType(document.file_name.clone())),
    }
}

fn base_name(file_name: &str) -> &str {
    Path::new(file_name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(file_name)
}

/// MIME type for the upload: sniffed for raster images, PDF otherwise.
fn content_type(document: &Document) -> &'static str {
    image::guess_format(&document.bytes)
        .map(|format| format.to_mime_type())
        .unwrap_or("application/pdf")
}
