use async_trait::async_trait;
use reqwest::Client;

use crate::models::notification::{DocumentBatch, ExpenditureHeaders};
use crate::models::statement::ExpenditureRow;

/// Downstream workflow webhooks.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Forward the result of a generic (non-statement) document.
    async fn send_document_result(&self, batch: &DocumentBatch) -> Result<(), NotifyError>;

    /// Forward newly claimed statement rows to the expenditure feed.
    async fn send_expenditure(
        &self,
        rows: &[ExpenditureRow],
        headers: &ExpenditureHeaders,
    ) -> Result<(), NotifyError>;
}

/// Webhook client posting JSON payloads.
pub struct WebhookClient {
    http: Client,
    document_url: String,
    expenditure_url: String,
}

impl WebhookClient {
    pub fn new(document_url: impl Into<String>, expenditure_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            document_url: document_url.into(),
            expenditure_url: expenditure_url.into(),
        }
    }

    async fn check(endpoint: &'static str, response: reqwest::Response) -> Result<(), NotifyError> {
        let status = response.status();
        if status.is_success() {
            metrics::counter!("intake_notifications_total", "endpoint" => endpoint, "outcome" => "ok")
                .increment(1);
            return Ok(());
        }

        metrics::counter!("intake_notifications_total", "endpoint" => endpoint, "outcome" => "error")
            .increment(1);
        let body = response.text().await.unwrap_or_default();
        Err(NotifyError::Rejected {
            endpoint,
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl NotificationSink for WebhookClient {
    async fn send_document_result(&self, batch: &DocumentBatch) -> Result<(), NotifyError> {
        tracing::info!(documents = batch.extract_data.len(), "Sending document result");
        let response = self.http.post(&self.document_url).json(batch).send().await?;
        Self::check("document", response).await
    }

    async fn send_expenditure(
        &self,
        rows: &[ExpenditureRow],
        headers: &ExpenditureHeaders,
    ) -> Result<(), NotifyError> {
        tracing::info!(rows = rows.len(), "Sending expenditure batch");
        let response = self
            .http
            .post(&self.expenditure_url)
            .header("applicant_id", headers.applicant_id_value())
            .header("record_id", headers.record_id_value())
            .header("extracted_bank_id", &headers.extraction_job_id)
            .json(rows)
            .send()
            .await?;
        Self::check("expenditure", response).await
    }
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{endpoint} webhook returned {status}: {body}")]
    Rejected {
        endpoint: &'static str,
        status: u16,
        body: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::applicant::{ApplicantContext, ApplicantRecord};
    use crate::models::notification::DocumentResult;
    use crate::models::extraction::ExtractionResult;
    use crate::services::classifier::DocumentCategory;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn context() -> ApplicantContext {
        ApplicantContext::single(ApplicantRecord {
            applicant_id: 42,
            record_id: "recA".to_string(),
            first_name: "Jane".to_string(),
            last_name: "Citizen".to_string(),
        })
    }

    #[tokio::test]
    async fn test_expenditure_headers_and_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/expenditure"))
            .and(header("applicant_id", "42"))
            .and(header("record_id", "recA"))
            .and(header("extracted_bank_id", "job-9"))
            .and(body_json(serde_json::json!([
                {"id": 5, "text": "01/03", "description": "Groceries", "debit": "125.50", "credit": null}
            ])))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client = WebhookClient::new(
            format!("{}/document", server.uri()),
            format!("{}/expenditure", server.uri()),
        );
        let rows = vec![ExpenditureRow {
            id: 5,
            text: Some("01/03".to_string()),
            description: Some("Groceries".to_string()),
            debit: Some("125.50".to_string()),
            credit: None,
        }];
        let headers = ExpenditureHeaders::from_context(&context(), "job-9");

        client.send_expenditure(&rows, &headers).await.unwrap();
    }

    #[tokio::test]
    async fn test_document_result_payload_shape() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/document"))
            .and(body_json(serde_json::json!({
                "applicants": {
                    "Applicant1": {"Applicant_ID": 42, "recordId": "recA", "First Name": "Jane", "Last Name": "Citizen"}
                },
                "extract_data": [{
                    "file": "payslip.pdf",
                    "classified": "payslip",
                    "message": "File processed successfully.",
                    "extractedData": {"formResults": {"Employer": "Acme"}, "tableResults": []}
                }]
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client = WebhookClient::new(
            format!("{}/document", server.uri()),
            format!("{}/expenditure", server.uri()),
        );
        let mut extracted = ExtractionResult::default();
        extracted
            .form_results
            .insert("Employer".to_string(), "Acme".to_string());
        let batch = DocumentBatch {
            applicants: context(),
            extract_data: vec![DocumentResult {
                file: "payslip.pdf".to_string(),
                classified: DocumentCategory::Payslip,
                message: "File processed successfully.".to_string(),
                extracted_data: extracted,
            }],
        };

        client.send_document_result(&batch).await.unwrap();
    }

    #[tokio::test]
    async fn test_rejected_webhook_is_an_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .mount(&server)
            .await;

        let client = WebhookClient::new(server.uri(), server.uri());
        let headers = ExpenditureHeaders::from_context(&context(), "job-9");
        let err = client.send_expenditure(&[], &headers).await.unwrap_err();

        assert!(matches!(err, NotifyError::Rejected { status: 429, endpoint: "expenditure", .. }));
    }
}
