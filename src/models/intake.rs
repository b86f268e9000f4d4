use serde::{Deserialize, Serialize};

/// Queue counters returned when documents are accepted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueStatus {
    pub total_files: usize,
    pub processing: bool,
    pub remaining_in_queue: usize,
}

/// Response after submitting documents for processing.
#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub message: String,
    pub queue_status: QueueStatus,
}

/// Point-in-time view of the processing state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueSnapshot {
    pub is_processing: bool,
    pub is_notifying: bool,
    pub queue_length: usize,
    pub pending: Vec<String>,
}
