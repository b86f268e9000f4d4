use std::fmt;

use garde::Validate;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Key used when an intake request carries a single `applicant` record.
pub const SINGLE_APPLICANT_KEY: &str = "Applicant1";

/// Applicant record as submitted by the intake form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ApplicantRecord {
    #[serde(rename = "Applicant_ID")]
    #[garde(range(min = 1))]
    pub applicant_id: i64,

    #[serde(rename = "recordId")]
    #[garde(length(min = 1, max = 200))]
    pub record_id: String,

    #[serde(rename = "First Name")]
    #[garde(length(min = 1, max = 200))]
    pub first_name: String,

    #[serde(rename = "Last Name")]
    #[garde(length(min = 1, max = 200))]
    pub last_name: String,
}

impl ApplicantRecord {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Applicants keyed by the name the intake form gave them.
///
/// Serialized as a JSON object. Key order is the submission order, so the
/// "first applicant" of a context is well defined.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApplicantContext {
    entries: Vec<(String, ApplicantRecord)>,
}

impl ApplicantContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context holding one applicant under [`SINGLE_APPLICANT_KEY`].
    pub fn single(record: ApplicantRecord) -> Self {
        let mut ctx = Self::new();
        ctx.insert(SINGLE_APPLICANT_KEY, record);
        ctx
    }

    /// Insert or replace the record stored under `key`.
    pub fn insert(&mut self, key: impl Into<String>, record: ApplicantRecord) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = record,
            None => self.entries.push((key, record)),
        }
    }

    pub fn first(&self) -> Option<(&str, &ApplicantRecord)> {
        self.entries.first().map(|(k, r)| (k.as_str(), r))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ApplicantRecord)> {
        self.entries.iter().map(|(k, r)| (k.as_str(), r))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Validate every record, reporting the key of the first bad one.
    pub fn validate_records(&self) -> Result<(), (String, garde::Report)> {
        for (key, record) in &self.entries {
            record.validate().map_err(|report| (key.clone(), report))?;
        }
        Ok(())
    }
}

impl Serialize for ApplicantContext {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, record) in &self.entries {
            map.serialize_entry(key, record)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ApplicantContext {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ContextVisitor;

        impl<'de> Visitor<'de> for ContextVisitor {
            type Value = ApplicantContext;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of applicant keys to applicant records")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut ctx = ApplicantContext::new();
                while let Some((key, record)) = access.next_entry::<String, ApplicantRecord>()? {
                    ctx.insert(key, record);
                }
                Ok(ctx)
            }
        }

        deserializer.deserialize_map(ContextVisitor)
    }
}

/// Applicant row as stored by the persistence service.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct StoredApplicant {
    pub id: i32,
    pub applicant_id: i64,
    pub record_id: String,
    pub full_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: i64, rec: &str) -> ApplicantRecord {
        ApplicantRecord {
            applicant_id: id,
            record_id: rec.to_string(),
            first_name: "Jane".to_string(),
            last_name: "Citizen".to_string(),
        }
    }

    #[test]
    fn test_context_keeps_submission_order() {
        let json = r#"{
            "Zed": {"Applicant_ID": 2, "recordId": "rec2", "First Name": "Zed", "Last Name": "Z"},
            "Amy": {"Applicant_ID": 1, "recordId": "rec1", "First Name": "Amy", "Last Name": "A"}
        }"#;
        let ctx: ApplicantContext = serde_json::from_str(json).unwrap();
        let keys: Vec<&str> = ctx.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["Zed", "Amy"]);
        assert_eq!(ctx.first().unwrap().1.applicant_id, 2);

        let back = serde_json::to_string(&ctx).unwrap();
        assert!(back.find("Zed").unwrap() < back.find("Amy").unwrap());
    }

    #[test]
    fn test_single_applicant_key() {
        let ctx = ApplicantContext::single(record(7, "rec7"));
        assert_eq!(ctx.len(), 1);
        assert_eq!(ctx.first().unwrap().0, SINGLE_APPLICANT_KEY);
    }

    #[test]
    fn test_full_name() {
        assert_eq!(record(1, "r").full_name(), "Jane Citizen");
    }

    #[test]
    fn test_validation_rejects_empty_record_id() {
        let mut ctx = ApplicantContext::new();
        ctx.insert("ok", record(1, "rec1"));
        ctx.insert("bad", record(2, ""));
        let (key, _) = ctx.validate_records().unwrap_err();
        assert_eq!(key, "bad");
    }
}
