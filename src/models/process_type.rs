//! Process type model
//!
//! A process type (promotion by training, merit progression, ...) owns a
//! document template and may scope legal deadline rules to itself.

use serde::{Deserialize, Serialize};

/// Process type entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProcessType {
    /// Unique identifier
    pub id: i64,
    /// Unique short code, e.g. `PROM_CAP`
    pub code: String,
    /// Display name
    pub name: String,
    /// Optional description
    pub description: Option<String>,
}

/// Input for creating a process type
#[derive(Debug, Clone, Deserialize)]
pub struct CreateProcessTypeInput {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl CreateProcessTypeInput {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            description: None,
        }
    }
}

/// One line of a process type's document template
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RequiredDocument {
    pub id: i64,
    pub type_id: i64,
    pub document_id: i64,
    /// Whether the document counts toward checklist completion
    pub required: bool,
    /// Position of the document in the checklist
    pub doc_order: i32,
}
