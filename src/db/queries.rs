use sqlx::{PgConnection, PgPool, Row};

use crate::models::applicant::StoredApplicant;
use crate::models::statement::{ExtractedRow, NewExtractedRow};

/// Look up an applicant by external applicant id
pub async fn find_applicant(
    pool: &PgPool,
    applicant_id: i64,
) -> Result<Option<StoredApplicant>, sqlx::Error> {
    sqlx::query_as::<_, StoredApplicant>(
        r#"
        SELECT id, applicant_id, record_id, full_name
        FROM applicants
        WHERE applicant_id = $1
        ORDER BY id ASC
        LIMIT 1
        "#,
    )
    .bind(applicant_id)
    .fetch_optional(pool)
    .await
}

/// Return the internal id of an applicant, inserting it when it is new
pub async fn upsert_applicant(
    conn: &mut PgConnection,
    applicant_id: i64,
    record_id: &str,
    full_name: &str,
) -> Result<i32, sqlx::Error> {
    let existing = sqlx::query("SELECT id FROM applicants WHERE applicant_id = $1 ORDER BY id ASC LIMIT 1")
        .bind(applicant_id)
        .fetch_optional(&mut *conn)
        .await?;

    if let Some(row) = existing {
        return row.try_get("id");
    }

    let row = sqlx::query(
        r#"
        INSERT INTO applicants (applicant_id, record_id, full_name)
        VALUES ($1, $2, $3)
        RETURNING id
        "#,
    )
    .bind(applicant_id)
    .bind(record_id)
    .bind(full_name)
    .fetch_one(&mut *conn)
    .await?;

    row.try_get("id")
}

/// Insert one extracted row, returning its id
pub async fn insert_extracted_row(
    conn: &mut PgConnection,
    applicant_db_id: i32,
    row: &NewExtractedRow,
) -> Result<i64, sqlx::Error> {
    let inserted = sqlx::query(
        r#"
        INSERT INTO extracted_data (applicant_id, text, description, debit, credit, balance, processed)
        VALUES ($1, $2, $3, $4, $5, $6, false)
        RETURNING id
        "#,
    )
    .bind(applicant_db_id)
    .bind(&row.text)
    .bind(&row.description)
    .bind(&row.debit)
    .bind(&row.credit)
    .bind(&row.balance)
    .fetch_one(&mut *conn)
    .await?;

    inserted.try_get("id")
}

/// Unprocessed rows with a numeric-looking debit or credit and a description
pub async fn select_unprocessed_rows(
    pool: &PgPool,
    applicant_db_id: i32,
) -> Result<Vec<ExtractedRow>, sqlx::Error> {
    sqlx::query_as::<_, ExtractedRow>(
        r#"
        SELECT id, applicant_id, text, description, debit, credit, balance, processed, created_at
        FROM extracted_data
        WHERE applicant_id = $1
          AND processed = false
          AND (debit ~ '^[0-9]' OR credit ~ '^[0-9]')
          AND description IS NOT NULL
          AND text IS NOT NULL
          AND description <> ''
        ORDER BY id ASC
        "#,
    )
    .bind(applicant_db_id)
    .fetch_all(pool)
    .await
}

/// Flip `processed` on the given rows; only rows that were still
/// unprocessed are returned
pub async fn mark_rows_processed(pool: &PgPool, ids: &[i64]) -> Result<Vec<i64>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        UPDATE extracted_data
        SET processed = true
        WHERE id = ANY($1) AND processed = false
        RETURNING id
        "#,
    )
    .bind(ids)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(|r| r.try_get("id")).collect()
}
