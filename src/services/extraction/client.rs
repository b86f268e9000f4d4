use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{ExtractionError, ExtractionService};
use crate::models::extraction::{AnalysisPage, DocumentLocation, FeatureType};

const CONTENT_TYPE: &str = "application/x-amz-json-1.1";
const START_TARGET: &str = "Textract.StartDocumentAnalysis";
const GET_TARGET: &str = "Textract.GetDocumentAnalysis";

/// Client for a Textract-compatible document analysis gateway.
pub struct AnalysisClient {
    http: Client,
    endpoint: String,
    api_token: String,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct StartRequest<'a> {
    document_location: RequestLocation<'a>,
    feature_types: &'a [FeatureType],
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct RequestLocation<'a> {
    s3_object: S3Object<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct S3Object<'a> {
    bucket: &'a str,
    name: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct StartResponse {
    job_id: String,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct GetRequest<'a> {
    job_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    next_token: Option<&'a str>,
}

impl AnalysisClient {
    pub fn new(endpoint: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            endpoint: endpoint.into(),
            api_token: api_token.into(),
        }
    }

    async fn call<B: Serialize + ?Sized>(
        &self,
        target: &str,
        body: &B,
    ) -> Result<reqwest::Response, ExtractionError> {
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_token)
            .header("X-Amz-Target", target)
            .header(reqwest::header::CONTENT_TYPE, CONTENT_TYPE)
            .body(serde_json::to_vec(body)?)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ExtractionError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl ExtractionService for AnalysisClient {
    async fn start_analysis(
        &self,
        location: &DocumentLocation,
        features: &[FeatureType],
    ) -> Result<String, ExtractionError> {
        let request = StartRequest {
            document_location: RequestLocation {
                s3_object: S3Object {
                    bucket: &location.bucket,
                    name: &location.key,
                },
            },
            feature_types: features,
        };

        let response: StartResponse = self.call(START_TARGET, &request).await?.json().await?;
        Ok(response.job_id)
    }

    async fn get_analysis(
        &self,
        job_id: &str,
        next_token: Option<&str>,
    ) -> Result<AnalysisPage, ExtractionError> {
        let request = GetRequest { job_id, next_token };
        let page = self.call(GET_TARGET, &request).await?.json().await?;
        Ok(page)
    }
}
