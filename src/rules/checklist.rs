//! Checklist construction and completion

use chrono::NaiveDate;

use crate::models::{NewChecklistEntry, ProcessDocument, RequiredDocument};

/// Expand a document template into checklist entries.
///
/// One entry per template line in `doc_order` (ties broken by template id),
/// copying the `required` flag. A document listed twice yields one entry.
pub fn build_checklist(templates: &[RequiredDocument]) -> Vec<NewChecklistEntry> {
    let mut ordered: Vec<&RequiredDocument> = templates.iter().collect();
    ordered.sort_by_key(|t| (t.doc_order, t.id));

    let mut entries: Vec<NewChecklistEntry> = Vec::with_capacity(ordered.len());
    for template in ordered {
        if entries.iter().any(|e| e.document_id == template.document_id) {
            continue;
        }
        entries.push(NewChecklistEntry {
            document_id: template.document_id,
            required: template.required,
        });
    }
    entries
}

/// Completion state of a checklist
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    /// Every required entry is provided (vacuously true with no required entries)
    pub all_provided: bool,
    /// Latest `provided_date` among required entries, once complete
    pub reference_date: Option<NaiveDate>,
}

/// Evaluate whether a checklist is complete.
///
/// Optional entries never block completion and never move the reference date.
pub fn evaluate_completion(entries: &[ProcessDocument]) -> Completion {
    let mut required = entries.iter().filter(|e| e.required).peekable();
    let has_required = required.peek().is_some();

    let mut latest: Option<NaiveDate> = None;
    for entry in required {
        if !entry.provided {
            return Completion {
                all_provided: false,
                reference_date: None,
            };
        }
        latest = latest.max(entry.provided_date);
    }

    Completion {
        all_provided: true,
        reference_date: if has_required { latest } else { None },
    }
}
