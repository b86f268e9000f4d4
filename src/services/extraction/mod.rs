//! Asynchronous document analysis: start a job, poll it to a terminal
//! status, collect every page of blocks, and shape them.

pub mod blocks;
pub mod client;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;

use crate::models::extraction::{
    AnalysisPage, AnalysisStatus, Block, DocumentLocation, ExtractionResult, FeatureType,
};

/// The external analysis service.
#[async_trait]
pub trait ExtractionService: Send + Sync {
    /// Start an analysis job and return its id.
    async fn start_analysis(
        &self,
        location: &DocumentLocation,
        features: &[FeatureType],
    ) -> Result<String, ExtractionError>;

    /// Fetch the status of a job, and one page of its blocks once finished.
    async fn get_analysis(
        &self,
        job_id: &str,
        next_token: Option<&str>,
    ) -> Result<AnalysisPage, ExtractionError>;
}

/// Poll interval policy: start at `initial`, multiply after every
/// in-progress answer, never exceed `max`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollPolicy {
    pub initial: Duration,
    pub max: Duration,
    pub multiplier: f64,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            initial: Duration::from_secs(2),
            max: Duration::from_secs(10),
            multiplier: 2.0,
        }
    }
}

impl PollPolicy {
    pub fn next_delay(&self, current: Duration) -> Duration {
        let factor = if self.multiplier.is_finite() && self.multiplier >= 1.0 {
            self.multiplier
        } else {
            1.0
        };
        current.mul_f64(factor).min(self.max)
    }
}

/// Runs analyses to completion against an [`ExtractionService`].
#[derive(Clone)]
pub struct Extractor {
    service: Arc<dyn ExtractionService>,
    policy: PollPolicy,
}

impl Extractor {
    pub fn new(service: Arc<dyn ExtractionService>, policy: PollPolicy) -> Self {
        Self { service, policy }
    }

    /// Start an analysis and wait for its shaped result.
    ///
    /// Polls until the service reports a terminal status; there is no overall
    /// timeout.
    pub async fn analyze(
        &self,
        location: &DocumentLocation,
        features: &[FeatureType],
    ) -> Result<ExtractionResult, ExtractionError> {
        let job_id = self.service.start_analysis(location, features).await?;
        tracing::info!(extraction_job_id = %job_id, key = %location.key, "Analysis started");

        let first_page = self.wait_for_completion(&job_id).await?;
        let blocks = self.collect_blocks(&job_id, first_page).await?;

        tracing::info!(
            extraction_job_id = %job_id,
            blocks = blocks.len(),
            "Analysis blocks collected"
        );

        Ok(ExtractionResult {
            job_id,
            form_results: blocks::key_value_pairs(&blocks),
            table_results: blocks::tables(&blocks),
        })
    }

    async fn wait_for_completion(&self, job_id: &str) -> Result<AnalysisPage, ExtractionError> {
        let mut delay = self.policy.initial;
        let mut attempts: u32 = 0;

        loop {
            sleep(delay).await;
            attempts += 1;

            let page = self.service.get_analysis(job_id, None).await?;
            match page.job_status {
                AnalysisStatus::InProgress => {
                    tracing::debug!(extraction_job_id = job_id, attempts, "Analysis still running");
                    delay = self.policy.next_delay(delay);
                }
                AnalysisStatus::Succeeded | AnalysisStatus::PartialSuccess => return Ok(page),
                AnalysisStatus::Failed => {
                    return Err(ExtractionError::JobFailed {
                        job_id: job_id.to_string(),
                        message: page.status_message.unwrap_or_default(),
                    })
                }
            }
        }
    }

    async fn collect_blocks(
        &self,
        job_id: &str,
        first_page: AnalysisPage,
    ) -> Result<Vec<Block>, ExtractionError> {
        let mut blocks = first_page.blocks;
        let mut next_token = first_page.next_token;

        while let Some(token) = next_token.take() {
            let page = self.service.get_analysis(job_id, Some(&token)).await?;
            blocks.extend(page.blocks);
            next_token = page.next_token;
        }

        Ok(blocks)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to encode request: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Extraction service returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Analysis job {job_id} failed: {message}")]
    JobFailed { job_id: String, message: String },
}
