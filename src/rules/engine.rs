//! Deadline rule engine
//!
//! Decides which legal rules apply to a process at a given trigger and which
//! deadline instances are still missing.

use std::collections::HashSet;

use chrono::NaiveDate;

use super::due_date::compute_due_date;
use crate::models::{LegalDeadline, NewProcessDeadline, StartEvent};

/// Select the rules that fire for a process of `type_id` on `trigger`.
///
/// A rule applies when it is global or scoped to `type_id`, and its start
/// event equals `trigger`. Output is ordered by rule id with one entry per
/// rule.
pub fn select_applicable_rules(
    rules: &[LegalDeadline],
    type_id: i64,
    trigger: StartEvent,
) -> Vec<LegalDeadline> {
    let mut selected: Vec<LegalDeadline> = rules
        .iter()
        .filter(|rule| rule.start_event == trigger && rule.applies_to_type(type_id))
        .cloned()
        .collect();

    selected.sort_by_key(|rule| rule.id);
    selected.dedup_by_key(|rule| rule.id);
    selected
}

/// Plan deadline instances for `rules`, skipping rules that already have one.
///
/// Each planned instance gets its due date from `reference`. Running the plan
/// again with the ids it produced yields nothing.
pub fn plan_deadlines(
    existing_rule_ids: &HashSet<i64>,
    rules: &[LegalDeadline],
    reference: NaiveDate,
) -> Vec<NewProcessDeadline> {
    let mut seen = existing_rule_ids.clone();

    rules
        .iter()
        .filter(|rule| seen.insert(rule.id))
        .map(|rule| NewProcessDeadline {
            legal_deadline_id: rule.id,
            due_date: compute_due_date(reference, rule.days_limit, rule.business_days),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn rule(id: i64, type_id: Option<i64>, days: u32, event: StartEvent, business: bool) -> LegalDeadline {
        LegalDeadline {
            id,
            type_id,
            name: format!("Rule {}", id),
            days_limit: days,
            start_event: event,
            business_days: business,
            description: None,
        }
    }

    fn catalog() -> Vec<LegalDeadline> {
        vec![
            rule(5, None, 30, StartEvent::ChecklistComplete, false),
            rule(3, Some(1), 30, StartEvent::Created, false),
            rule(1, None, 30, StartEvent::Created, false),
            rule(2, Some(2), 45, StartEvent::Created, false),
            rule(4, None, 15, StartEvent::Created, true),
        ]
    }

    #[test]
    fn test_select_created_rules_for_type() {
        let selected = select_applicable_rules(&catalog(), 1, StartEvent::Created);
        let ids: Vec<i64> = selected.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 3, 4]);
    }

    #[test]
    fn test_select_excludes_other_type_scope() {
        let selected = select_applicable_rules(&catalog(), 2, StartEvent::Created);
        let ids: Vec<i64> = selected.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2, 4]);
    }

    #[test]
    fn test_select_checklist_complete_rules() {
        let selected = select_applicable_rules(&catalog(), 1, StartEvent::ChecklistComplete);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].id, 5);
    }

    #[test]
    fn test_select_unknown_type_gets_global_rules_only() {
        let selected = select_applicable_rules(&catalog(), 99, StartEvent::Created);
        assert!(selected.iter().all(|r| r.type_id.is_none()));
        assert_eq!(selected.len(), 2);
    }

    #[test]
    fn test_select_removes_duplicate_rows() {
        let mut rules = catalog();
        rules.push(rule(1, None, 30, StartEvent::Created, false));
        let selected = select_applicable_rules(&rules, 1, StartEvent::Created);
        assert_eq!(selected.iter().filter(|r| r.id == 1).count(), 1);
    }

    #[test]
    fn test_plan_computes_due_dates() {
        let rules = select_applicable_rules(&catalog(), 1, StartEvent::Created);
        let plan = plan_deadlines(&HashSet::new(), &rules, date(2025, 12, 12));

        assert_eq!(
            plan,
            vec![
                NewProcessDeadline { legal_deadline_id: 1, due_date: date(2026, 1, 11) },
                NewProcessDeadline { legal_deadline_id: 3, due_date: date(2026, 1, 11) },
                NewProcessDeadline { legal_deadline_id: 4, due_date: date(2026, 1, 2) },
            ]
        );
    }

    #[test]
    fn test_plan_skips_existing_rules() {
        let rules = select_applicable_rules(&catalog(), 1, StartEvent::Created);
        let existing: HashSet<i64> = [1, 4].into_iter().collect();
        let plan = plan_deadlines(&existing, &rules, date(2025, 12, 1));

        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].legal_deadline_id, 3);
    }

    #[test]
    fn test_plan_is_idempotent() {
        let rules = select_applicable_rules(&catalog(), 1, StartEvent::Created);
        let first = plan_deadlines(&HashSet::new(), &rules, date(2025, 12, 1));
        let existing: HashSet<i64> = first.iter().map(|d| d.legal_deadline_id).collect();

        assert!(plan_deadlines(&existing, &rules, date(2025, 12, 1)).is_empty());
    }

    #[test]
    fn test_plan_empty_rules() {
        assert!(plan_deadlines(&HashSet::new(), &[], date(2025, 12, 1)).is_empty());
    }
}
