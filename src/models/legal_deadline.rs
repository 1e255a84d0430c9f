//! Legal deadline rule model
//!
//! A rule says "within `days_limit` days of `start_event`, something must
//! happen". Rules with no `type_id` apply to every process type.

use serde::{Deserialize, Serialize};

/// Event that starts the clock of a legal deadline rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StartEvent {
    /// The process was registered; reference date is `created_date`
    #[serde(alias = "created_date")]
    Created,
    /// Every required checklist document was provided
    #[serde(alias = "document_complete")]
    ChecklistComplete,
}

impl StartEvent {
    /// Convert to database string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            StartEvent::Created => "created",
            StartEvent::ChecklistComplete => "checklist_complete",
        }
    }

    /// Parse from database string representation.
    ///
    /// `created_date` and `document_complete` are accepted as legacy spellings.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "created" | "created_date" => Some(StartEvent::Created),
            "checklist_complete" | "document_complete" => Some(StartEvent::ChecklistComplete),
            _ => None,
        }
    }
}

impl std::fmt::Display for StartEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Legal deadline rule
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LegalDeadline {
    pub id: i64,
    /// Owning process type; `None` means the rule applies to all types
    pub type_id: Option<i64>,
    pub name: String,
    /// Number of days (calendar or business) after the reference date
    pub days_limit: u32,
    pub start_event: StartEvent,
    /// Count only Monday to Friday
    pub business_days: bool,
    pub description: Option<String>,
}

impl LegalDeadline {
    /// Whether this rule applies to processes of the given type
    pub fn applies_to_type(&self, type_id: i64) -> bool {
        self.type_id.map_or(true, |scoped| scoped == type_id)
    }
}

/// Input for creating a legal deadline rule
#[derive(Debug, Clone, Deserialize)]
pub struct CreateLegalDeadlineInput {
    pub type_id: Option<i64>,
    pub name: String,
    pub days_limit: u32,
    pub start_event: StartEvent,
    #[serde(default)]
    pub business_days: bool,
    #[serde(default)]
    pub description: Option<String>,
}
