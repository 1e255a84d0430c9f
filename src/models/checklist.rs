//! Checklist models
//!
//! A process checklist has one entry per document of the type's template.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Checklist entry as stored
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProcessDocument {
    pub id: i64,
    pub process_id: i64,
    pub document_id: i64,
    /// Copied from the template when the checklist was built
    pub required: bool,
    pub provided: bool,
    pub provided_date: Option<NaiveDate>,
    pub observations: Option<String>,
}

/// Checklist entry to insert for a new process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewChecklistEntry {
    pub document_id: i64,
    pub required: bool,
}

/// Checklist entry joined with its document, as shown in process details
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChecklistItem {
    pub code: String,
    pub name: String,
    pub required: bool,
    pub provided: bool,
    pub provided_date: Option<NaiveDate>,
    pub observations: Option<String>,
}

/// Body of a "provide document" request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProvideDocumentInput {
    /// ISO date; defaults to today
    #[serde(default)]
    pub provided_date: Option<String>,
    #[serde(default)]
    pub observations: Option<String>,
}

/// Result of providing a document
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProvideOutcome {
    /// Every required entry of the checklist is now provided
    pub all_provided: bool,
    /// Deadline instances created by this call
    pub deadlines_created: usize,
}
