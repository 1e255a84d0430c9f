//! Database repositories
//!
//! Repository pattern implementations for database access.
//! Each repository handles the queries for one entity (or one aggregate,
//! in the case of processes).

pub mod deadline;
pub mod document;
pub mod legal_deadline;
pub mod process;
pub mod process_type;
pub mod status;

pub use deadline::{DeadlineRepository, SqlxDeadlineRepository};
pub use document::{DocumentRepository, SqlxDocumentRepository};
pub use legal_deadline::{LegalDeadlineRepository, SqlxLegalDeadlineRepository};
pub use process::{ProcessRepository, SqlxProcessRepository};
pub use process_type::{ProcessTypeRepository, SqlxProcessTypeRepository};
pub use status::{SqlxStatusRepository, StatusRepository};
