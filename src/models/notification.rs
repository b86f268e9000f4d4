use serde::{Deserialize, Serialize};

use crate::models::applicant::ApplicantContext;
use crate::models::extraction::ExtractionResult;
use crate::services::classifier::DocumentCategory;

/// Result entry for one processed (non-statement) document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentResult {
    pub file: String,
    pub classified: DocumentCategory,
    pub message: String,
    #[serde(rename = "extractedData")]
    pub extracted_data: ExtractionResult,
}

/// Body of the generic document-result webhook.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentBatch {
    pub applicants: ApplicantContext,
    pub extract_data: Vec<DocumentResult>,
}

/// Identifiers carried as headers on an expenditure batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpenditureHeaders {
    pub applicant_ids: Vec<i64>,
    pub record_ids: Vec<String>,
    pub extraction_job_id: String,
}

impl ExpenditureHeaders {
    pub fn from_context(ctx: &ApplicantContext, extraction_job_id: &str) -> Self {
        Self {
            applicant_ids: ctx.iter().map(|(_, r)| r.applicant_id).collect(),
            record_ids: ctx.iter().map(|(_, r)| r.record_id.clone()).collect(),
            extraction_job_id: extraction_job_id.to_string(),
        }
    }

    /// `applicant_id` header value: the bare id, or a JSON array for several.
    pub fn applicant_id_value(&self) -> String {
        match self.applicant_ids.as_slice() {
            [single] => single.to_string(),
            many => serde_json::Value::from(many.to_vec()).to_string(),
        }
    }

    /// `record_id` header value: the bare id, or a JSON array for several.
    pub fn record_id_value(&self) -> String {
        match self.record_ids.as_slice() {
            [single] => single.clone(),
            many => serde_json::Value::from(many.to_vec()).to_string(),
        }
    }
}
