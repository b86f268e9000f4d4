use std::time::Duration;

use serde::Deserialize;

use crate::sequencer::SequencerConfig;
use crate::services::extraction::PollPolicy;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server bind address (e.g., "0.0.0.0:3012")
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// PostgreSQL connection string
    pub database_url: String,

    /// Connection attempts before start-up gives up
    #[serde(default = "default_db_connect_retries")]
    pub db_connect_retries: u32,

    #[serde(default = "default_db_retry_delay_ms")]
    pub db_retry_delay_ms: u64,

    /// Bucket that receives uploaded documents
    pub s3_bucket: String,

    #[serde(default = "default_s3_region")]
    pub s3_region: String,

    /// Custom S3-compatible endpoint. Empty means AWS.
    #[serde(default)]
    pub s3_endpoint: String,

    pub s3_access_key: String,

    pub s3_secret_key: String,

    /// Base URL of the document analysis gateway
    pub extraction_endpoint: String,

    pub extraction_api_token: String,

    #[serde(default = "default_poll_initial_ms")]
    pub poll_initial_ms: u64,

    #[serde(default = "default_poll_max_ms")]
    pub poll_max_ms: u64,

    #[serde(default = "default_poll_multiplier")]
    pub poll_multiplier: f64,

    /// Receives generic document results
    pub document_webhook_url: String,

    /// Receives expenditure rows of bank statements
    pub expenditure_webhook_url: String,

    /// Grace period after a notification settles
    #[serde(default = "default_notify_grace_ms")]
    pub notify_grace_ms: u64,

    #[serde(default = "default_max_upload_files")]
    pub max_upload_files: usize,

    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_bind_addr() -> String {
    "0.0.0.0:3012".to_string()
}

fn default_db_connect_retries() -> u32 {
    30
}

fn default_db_retry_delay_ms() -> u64 {
    5000
}

fn default_s3_region() -> String {
    "ap-southeast-2".to_string()
}

fn default_poll_initial_ms() -> u64 {
    2000
}

fn default_poll_max_ms() -> u64 {
    10_000
}

fn default_poll_multiplier() -> f64 {
    2.0
}

fn default_notify_grace_ms() -> u64 {
    1000
}

fn default_max_upload_files() -> usize {
    10
}

fn default_max_upload_bytes() -> usize {
    50 * 1024 * 1024
}

impl AppConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    pub fn db_retry_delay(&self) -> Duration {
        Duration::from_millis(self.db_retry_delay_ms)
    }

    pub fn poll_policy(&self) -> PollPolicy {
        // A zero initial delay would never grow past zero
        let initial_ms = self.poll_initial_ms.max(1);
        PollPolicy {
            initial: Duration::from_millis(initial_ms),
            max: Duration::from_millis(self.poll_max_ms.max(initial_ms)),
            multiplier: self.poll_multiplier,
        }
    }

    pub fn sequencer_config(&self) -> SequencerConfig {
        SequencerConfig {
            notify_grace: Duration::from_millis(self.notify_grace_ms),
        }
    }
}
