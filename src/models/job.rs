use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::applicant::ApplicantContext;
use crate::services::classifier::DocumentCategory;

/// An uploaded document held in memory until it is processed.
#[derive(Debug, Clone)]
pub struct Document {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl Document {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    /// Lower-cased file extension, if any.
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
    }
}

/// One queued unit of work: a document plus the applicants it belongs to.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: Uuid,
    pub document: Document,
    pub applicants: ApplicantContext,
    pub submitted_at: DateTime<Utc>,
}

impl Job {
    pub fn new(document: Document, applicants: ApplicantContext) -> Self {
        Self {
            id: Uuid::new_v4(),
            document,
            applicants,
            submitted_at: Utc::now(),
        }
    }
}

/// Summary of a job that ran to completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobReport {
    pub category: DocumentCategory,
    pub rows_persisted: usize,
    pub notifications_sent: usize,
    pub notifications_failed: usize,
}

/// Terminal outcome of a dequeued job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobOutcome {
    Completed(JobReport),
    Failed { error: String },
}

impl JobOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, JobOutcome::Completed(_))
    }
}
