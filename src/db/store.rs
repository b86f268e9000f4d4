use async_trait::async_trait;
use sqlx::PgPool;

use crate::db::queries;
use crate::models::applicant::ApplicantRecord;
use crate::models::statement::{ExtractedRow, NewExtractedRow};
use crate::services::persistence::{PersistenceError, PersistenceService};

/// PostgreSQL-backed [`PersistenceService`].
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl PersistenceService for PgStore {
    async fn save_statement(
        &self,
        applicant: &ApplicantRecord,
        rows: &[NewExtractedRow],
    ) -> Result<Vec<i64>, PersistenceError> {
        if applicant.record_id.is_empty() {
            return Err(PersistenceError::InvalidApplicant(format!(
                "applicant {} has no record id",
                applicant.applicant_id
            )));
        }

        // Dropping the transaction without commit rolls it back.
        let mut tx = self.pool.begin().await?;

        let applicant_db_id = queries::upsert_applicant(
            &mut tx,
            applicant.applicant_id,
            &applicant.record_id,
            &applicant.full_name(),
        )
        .await?;

        let mut ids = Vec::with_capacity(rows.len());
        for row in rows {
            ids.push(queries::insert_extracted_row(&mut tx, applicant_db_id, row).await?);
        }

        tx.commit().await?;

        tracing::info!(
            applicant_id = applicant.applicant_id,
            applicant_db_id,
            rows = ids.len(),
            "Statement rows saved"
        );
        Ok(ids)
    }

    async fn find_applicant(&self, applicant_id: i64) -> Result<Option<i32>, PersistenceError> {
        Ok(queries::find_applicant(&self.pool, applicant_id)
            .await?
            .map(|a| a.id))
    }

    async fn select_unprocessed_rows(
        &self,
        applicant_db_id: i32,
    ) -> Result<Vec<ExtractedRow>, PersistenceError> {
        Ok(queries::select_unprocessed_rows(&self.pool, applicant_db_id).await?)
    }

    async fn mark_rows_processed(&self, ids: &[i64]) -> Result<Vec<i64>, PersistenceError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(queries::mark_rows_processed(&self.pool, ids).await?)
    }

    async fn ping(&self) -> Result<(), PersistenceError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
