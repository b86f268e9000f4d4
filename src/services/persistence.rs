use async_trait::async_trait;

use crate::models::applicant::ApplicantRecord;
use crate::models::statement::{ExtractedRow, NewExtractedRow};

/// Relational store for applicants and extracted statement rows.
#[async_trait]
pub trait PersistenceService: Send + Sync {
    /// Upsert the applicant and insert its rows in one transaction,
    /// returning the ids of the inserted rows.
    async fn save_statement(
        &self,
        applicant: &ApplicantRecord,
        rows: &[NewExtractedRow],
    ) -> Result<Vec<i64>, PersistenceError>;

    /// Internal id of the applicant with the given external id.
    async fn find_applicant(&self, applicant_id: i64) -> Result<Option<i32>, PersistenceError>;

    /// Unprocessed rows of an applicant that qualify for the expenditure feed.
    async fn select_unprocessed_rows(
        &self,
        applicant_db_id: i32,
    ) -> Result<Vec<ExtractedRow>, PersistenceError>;

    /// Flag rows as processed in one update. Returns the ids that were
    /// flipped by this call; rows already processed are not returned.
    async fn mark_rows_processed(&self, ids: &[i64]) -> Result<Vec<i64>, PersistenceError>;

    /// Connectivity check.
    async fn ping(&self) -> Result<(), PersistenceError>;
}

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid applicant data: {0}")]
    InvalidApplicant(String),
}
