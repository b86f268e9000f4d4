//! Filename-based document classification.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Document categories recognised from upload file names.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DocumentCategory {
    BankStatement,
    DriversLicense,
    NationalId,
    UtilityBill,
    ApplicationForm,
    Payslip,
    Insurance,
    #[serde(rename = "unknown_document")]
    #[strum(serialize = "unknown_document")]
    Unknown,
}

/// Keyword table. Categories are tried in declaration order; the first
/// category with any keyword contained in the normalized name wins.
const CATEGORY_KEYWORDS: &[(DocumentCategory, &[&str])] = &[
    (
        DocumentCategory::BankStatement,
        &[
            "bank",
            "statement",
            "transaction",
            "account",
            "banking",
            "deposit",
            "withdrawal",
            "balance",
            "credit",
            "debit",
            "interest",
            "overdraft",
            "transfer",
            "statement period",
            "monthly statement",
            "checking",
            "savings",
            "financial summary",
            "ledger",
            "iban",
            "swift",
            "sort code",
        ],
    ),
    (
        DocumentCategory::DriversLicense,
        &["license", "driver", "driving", "licence"],
    ),
    (
        DocumentCategory::NationalId,
        &[
            "passport",
            "national",
            "id",
            "identification",
            "citizen",
            "citizenship",
            "residency",
        ],
    ),
    (
        DocumentCategory::UtilityBill,
        &["bill", "utility", "electric", "water", "gas", "electricity", "utilities"],
    ),
    (
        DocumentCategory::ApplicationForm,
        &["application", "form", "forms"],
    ),
    (
        DocumentCategory::Payslip,
        &["payslip", "salary", "wage", "payment", "payroll", "pay"],
    ),
    (
        DocumentCategory::Insurance,
        &["insurance", "policy", "coverage", "premium"],
    ),
];

/// Classify a document by its file name.
pub fn classify(file_name: &str) -> DocumentCategory {
    let normalized = normalize(file_name);

    for (category, keywords) in CATEGORY_KEYWORDS {
        if let Some(keyword) = keywords.iter().find(|kw| normalized.contains(*kw)) {
            tracing::debug!(file = file_name, keyword = *keyword, category = %category, "Matched document keyword");
            return *category;
        }
    }

    tracing::debug!(file = file_name, "No document keyword matched");
    DocumentCategory::Unknown
}

/// Strip the extension, lowercase, and collapse runs of non-alphanumerics
/// into single spaces.
fn normalize(file_name: &str) -> String {
    // The extension is the last dot-suffix with no path separator in it
    let stem = match file_name.rfind('.') {
        Some(idx) if idx + 1 < file_name.len() && !file_name[idx + 1..].contains('/') => {
            &file_name[..idx]
        }
        _ => file_name,
    };

    let mut out = String::with_capacity(stem.len());
    let mut pending_sep = false;
    for c in stem.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push(' ');
            }
            pending_sep = false;
            out.push(c);
        } else {
            pending_sep = true;
        }
    }
    out
}
