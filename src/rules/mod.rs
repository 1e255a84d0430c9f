//! Deadline rules
//!
//! Pure logic with no storage access:
//! - `due_date`: calendar and business-day arithmetic
//! - `engine`: rule selection and insert-if-absent deadline planning
//! - `checklist`: checklist construction and completion evaluation
//!
//! The process service feeds these functions with rows read inside a
//! transaction and writes back whatever they return.

pub mod checklist;
pub mod due_date;
pub mod engine;

pub use checklist::{build_checklist, evaluate_completion, Completion};
pub use due_date::compute_due_date;
pub use engine::{plan_deadlines, select_applicable_rules};
