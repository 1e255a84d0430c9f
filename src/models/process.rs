//! Process model
//!
//! The root entity of the tracker: one administrative request, identified by
//! its protocol number. A process owns its document checklist and its
//! deadline instances.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::checklist::ChecklistItem;
use super::deadline::DeadlineItem;
use super::status::DEFAULT_STATUS_CODE;

/// Process entity as stored
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Process {
    pub id: i64,
    /// Unique external identifier
    pub protocol_number: String,
    pub type_id: i64,
    pub applicant_name: String,
    pub applicant_registration: Option<String>,
    pub created_date: NaiveDate,
    pub status_id: i64,
    /// Decision text recorded by the reviewer
    pub opinion: Option<String>,
    pub financial_effective_date: Option<NaiveDate>,
    pub closed_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

/// A validated process ready to be inserted
#[derive(Debug, Clone)]
pub struct NewProcess {
    pub protocol_number: String,
    pub type_id: i64,
    pub applicant_name: String,
    pub applicant_registration: Option<String>,
    pub created_date: NaiveDate,
    pub status_id: i64,
    pub notes: Option<String>,
}

/// Input for creating a process
///
/// Dates are ISO `YYYY-MM-DD` strings and are validated by the service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProcessInput {
    pub protocol_number: String,
    pub type_code: String,
    pub applicant_name: String,
    #[serde(default)]
    pub applicant_registration: Option<String>,
    /// Defaults to today
    #[serde(default)]
    pub created_date: Option<String>,
    #[serde(default = "default_status_code")]
    pub status_code: String,
    #[serde(default)]
    pub notes: Option<String>,
}

fn default_status_code() -> String {
    DEFAULT_STATUS_CODE.to_string()
}

impl CreateProcessInput {
    pub fn new(
        protocol_number: impl Into<String>,
        type_code: impl Into<String>,
        applicant_name: impl Into<String>,
    ) -> Self {
        Self {
            protocol_number: protocol_number.into(),
            type_code: type_code.into(),
            applicant_name: applicant_name.into(),
            applicant_registration: None,
            created_date: None,
            status_code: default_status_code(),
            notes: None,
        }
    }

    pub fn created_on(mut self, date: impl Into<String>) -> Self {
        self.created_date = Some(date.into());
        self
    }
}

/// Partial update of a process. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProcessInput {
    #[serde(default)]
    pub status_code: Option<String>,
    #[serde(default)]
    pub opinion: Option<String>,
    #[serde(default)]
    pub financial_effective_date: Option<String>,
    #[serde(default)]
    pub closed_date: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Validated form of `UpdateProcessInput`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessChanges {
    pub status_id: Option<i64>,
    pub opinion: Option<String>,
    pub financial_effective_date: Option<NaiveDate>,
    pub closed_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

impl ProcessChanges {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Optional list filters, by catalog code
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessFilter {
    #[serde(default)]
    pub type_code: Option<String>,
    #[serde(default)]
    pub status_code: Option<String>,
}

/// Process row as returned by listings and creation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProcessSummary {
    pub id: i64,
    pub protocol_number: String,
    pub type_code: String,
    pub applicant_name: String,
    pub created_date: NaiveDate,
    pub status_code: String,
    pub financial_effective_date: Option<NaiveDate>,
}

/// Type reference embedded in a process detail
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TypeRef {
    pub code: String,
    pub name: String,
}

/// Status reference embedded in a process detail
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusRef {
    pub code: String,
    pub label: String,
}

/// Process header joined with its type and status
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProcessRecord {
    pub id: i64,
    pub protocol_number: String,
    #[serde(rename = "type")]
    pub process_type: TypeRef,
    pub applicant_name: String,
    pub applicant_registration: Option<String>,
    pub created_date: NaiveDate,
    pub status: StatusRef,
    pub opinion: Option<String>,
    pub financial_effective_date: Option<NaiveDate>,
    pub closed_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

/// Full process view: header, checklist and deadlines
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProcessDetail {
    #[serde(flatten)]
    pub process: ProcessRecord,
    pub documents: Vec<ChecklistItem>,
    pub deadlines: Vec<DeadlineItem>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_input_defaults_status() {
        let input: CreateProcessInput = serde_json::from_str(
            r#"{"protocol_number": "PGR-2025-001", "type_code": "PROM_CAP", "applicant_name": "Ana"}"#,
        )
        .unwrap();

        assert_eq!(input.status_code, "RECEIVED");
        assert!(input.created_date.is_none());
        assert!(input.applicant_registration.is_none());
    }

    #[test]
    fn test_create_input_builder() {
        let input = CreateProcessInput::new("PGR-1", "PROG_MER", "Bruno").created_on("2025-12-01");
        assert_eq!(input.created_date.as_deref(), Some("2025-12-01"));
        assert_eq!(input.status_code, DEFAULT_STATUS_CODE);
    }

    #[test]
    fn test_process_changes_is_empty() {
        assert!(ProcessChanges::default().is_empty());

        let changes = ProcessChanges {
            notes: Some("follow up".to_string()),
            ..Default::default()
        };
        assert!(!changes.is_empty());
    }

    #[test]
    fn test_process_detail_serializes_type_key() {
        let detail = ProcessDetail {
            process: ProcessRecord {
                id: 1,
                protocol_number: "PGR-1".to_string(),
                process_type: TypeRef {
                    code: "PROM_CAP".to_string(),
                    name: "Promotion".to_string(),
                },
                applicant_name: "Ana".to_string(),
                applicant_registration: None,
                created_date: NaiveDate::from_ymd_opt(2025, 12, 1).unwrap(),
                status: StatusRef {
                    code: "RECEIVED".to_string(),
                    label: "Received".to_string(),
                },
                opinion: None,
                financial_effective_date: None,
                closed_date: None,
                notes: None,
            },
            documents: vec![],
            deadlines: vec![],
        };

        let json = serde_json::to_value(&detail).unwrap();
        assert_eq!(json["type"]["code"], "PROM_CAP");
        assert_eq!(json["status"]["label"], "Received");
        assert_eq!(json["created_date"], "2025-12-01");
        assert!(json["documents"].as_array().unwrap().is_empty());
    }
}
