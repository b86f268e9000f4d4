use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;

use crate::app_state::AppState;
use crate::models::applicant::{ApplicantContext, ApplicantRecord};
use crate::models::intake::{QueueStatus, UploadResponse};
use crate::models::job::{Document, Job};

const QUEUED_MESSAGE: &str = "All files have been queued for processing.";

/// Parsed multipart intake request.
#[derive(Debug, Default)]
struct IntakeForm {
    documents: Vec<Document>,
    applicant: Option<ApplicantRecord>,
    applicants: Option<ApplicantContext>,
}

impl IntakeForm {
    /// A single `applicant` wins over an `applicants` mapping.
    fn into_parts(self) -> (Vec<Document>, ApplicantContext) {
        let context = match (self.applicant, self.applicants) {
            (Some(record), _) => ApplicantContext::single(record),
            (None, Some(context)) => context,
            (None, None) => ApplicantContext::new(),
        };
        (self.documents, context)
    }
}

/// POST /upload: queue documents for sequential processing.
pub async fn upload_documents(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, StatusCode> {
    let mut form = IntakeForm::default();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        tracing::warn!(error = %e, "Malformed multipart request");
        e.status()
    })? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("files") => {
                let file_name = field.file_name().unwrap_or("document").to_string();
                let data = field.bytes().await.map_err(|e| e.status())?;
                form.documents.push(Document::new(file_name, data.to_vec()));
            }
            Some("applicant") => {
                let data = field.bytes().await.map_err(|e| e.status())?;
                let record = serde_json::from_slice(&data).map_err(|e| {
                    tracing::warn!(error = %e, "Invalid applicant JSON");
                    StatusCode::BAD_REQUEST
                })?;
                form.applicant = Some(record);
            }
            Some("applicants") => {
                let data = field.bytes().await.map_err(|e| e.status())?;
                let context = serde_json::from_slice(&data).map_err(|e| {
                    tracing::warn!(error = %e, "Invalid applicants JSON");
                    StatusCode::BAD_REQUEST
                })?;
                form.applicants = Some(context);
            }
            _ => {}
        }
    }

    let (documents, applicants) = form.into_parts();

    if documents.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }
    if documents.len() > state.limits.max_files {
        tracing::warn!(
            files = documents.len(),
            max = state.limits.max_files,
            "Too many files in one request"
        );
        return Err(StatusCode::PAYLOAD_TOO_LARGE);
    }
    if let Err((key, report)) = applicants.validate_records() {
        tracing::warn!(applicant = %key, errors = %report, "Applicant record rejected");
        return Err(StatusCode::UNPROCESSABLE_ENTITY);
    }

    tracing::info!(
        files = documents.len(),
        applicants = applicants.len(),
        "Received files for processing"
    );

    let total_files = documents.len();
    let jobs: Vec<Job> = documents
        .into_iter()
        .map(|doc| Job::new(doc, applicants.clone()))
        .collect();

    let snapshot = state.sequencer.submit(jobs).await.map_err(|e| {
        tracing::error!(error = %e, "Sequencer unavailable");
        StatusCode::SERVICE_UNAVAILABLE
    })?;

    Ok(Json(UploadResponse {
        message: QUEUED_MESSAGE.to_string(),
        queue_status: QueueStatus {
            total_files,
            processing: snapshot.is_processing,
            remaining_in_queue: snapshot.queue_length,
        },
    }))
}
