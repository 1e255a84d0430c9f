//! Data models
//!
//! Data structures used throughout the process tracker:
//! - Catalog entities (ProcessType, Status, Document, RequiredDocument, LegalDeadline)
//! - Process, checklist and deadline records
//! - API request/response types

mod checklist;
mod deadline;
mod document;
mod legal_deadline;
mod process;
mod process_type;
mod status;

pub use checklist::{
    ChecklistItem, NewChecklistEntry, ProcessDocument, ProvideDocumentInput, ProvideOutcome,
};
pub use deadline::{
    DeadlineItem, NewProcessDeadline, OpenDeadline, OverdueDeadline, ProcessDeadline,
    StatisticsSummary, UpcomingDeadline,
};
pub use document::Document;
pub use legal_deadline::{CreateLegalDeadlineInput, LegalDeadline, StartEvent};
pub use process::{
    CreateProcessInput, NewProcess, Process, ProcessChanges, ProcessDetail, ProcessFilter,
    ProcessRecord, ProcessSummary, StatusRef, TypeRef, UpdateProcessInput,
};
pub use process_type::{CreateProcessTypeInput, ProcessType, RequiredDocument};
pub use status::{Status, DEFAULT_STATUS_CODE};
