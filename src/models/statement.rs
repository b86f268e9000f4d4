use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A bank-statement row shaped from table cells, ready to insert.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewExtractedRow {
    pub text: Option<String>,
    pub description: Option<String>,
    pub debit: Option<String>,
    pub credit: Option<String>,
    pub balance: Option<String>,
}

/// A persisted statement row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ExtractedRow {
    pub id: i64,
    pub applicant_id: i32,
    pub text: Option<String>,
    pub description: Option<String>,
    pub debit: Option<String>,
    pub credit: Option<String>,
    pub balance: Option<String>,
    pub processed: bool,
    pub created_at: DateTime<Utc>,
}

/// Row body sent to the expenditure feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenditureRow {
    pub id: i64,
    pub text: Option<String>,
    pub description: Option<String>,
    pub debit: Option<String>,
    pub credit: Option<String>,
}

impl From<&ExtractedRow> for ExpenditureRow {
    fn from(row: &ExtractedRow) -> Self {
        Self {
            id: row.id,
            text: row.text.clone(),
            description: row.description.clone(),
            debit: row.debit.clone(),
            credit: row.credit.clone(),
        }
    }
}
