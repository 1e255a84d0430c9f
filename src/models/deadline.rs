//! Deadline instance models
//!
//! A deadline instance binds one legal rule to one process with a concrete
//! due date. The due date is fixed when the instance is created.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Deadline instance as stored
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProcessDeadline {
    pub id: i64,
    pub process_id: i64,
    pub legal_deadline_id: i64,
    pub due_date: NaiveDate,
    pub notified: bool,
    pub closed: bool,
    pub notes: Option<String>,
}

/// Deadline instance to insert
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProcessDeadline {
    pub legal_deadline_id: i64,
    pub due_date: NaiveDate,
}

/// Deadline joined with its rule, as shown in process details
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeadlineItem {
    pub id: i64,
    pub name: String,
    pub due_date: NaiveDate,
    pub days_limit: u32,
    pub business_days: bool,
    pub notified: bool,
    pub closed: bool,
    pub notes: Option<String>,
}

/// Open deadline joined with its process and rule
#[derive(Debug, Clone, PartialEq)]
pub struct OpenDeadline {
    pub id: i64,
    pub protocol_number: String,
    pub type_name: String,
    pub deadline_name: String,
    pub due_date: NaiveDate,
    pub notified: bool,
}

/// Entry of the overdue report
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OverdueDeadline {
    pub id: i64,
    pub protocol_number: String,
    pub type_name: String,
    pub deadline_name: String,
    pub due_date: NaiveDate,
    pub days_overdue: i64,
    pub notified: bool,
}

impl OverdueDeadline {
    pub fn from_open(open: OpenDeadline, today: NaiveDate) -> Self {
        Self {
            days_overdue: (today - open.due_date).num_days(),
            id: open.id,
            protocol_number: open.protocol_number,
            type_name: open.type_name,
            deadline_name: open.deadline_name,
            due_date: open.due_date,
            notified: open.notified,
        }
    }
}

/// Entry of the upcoming report
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UpcomingDeadline {
    pub id: i64,
    pub protocol_number: String,
    pub type_name: String,
    pub deadline_name: String,
    pub due_date: NaiveDate,
    pub days_remaining: i64,
    pub notified: bool,
}

impl UpcomingDeadline {
    pub fn from_open(open: OpenDeadline, today: NaiveDate) -> Self {
        Self {
            days_remaining: (open.due_date - today).num_days(),
            id: open.id,
            protocol_number: open.protocol_number,
            type_name: open.type_name,
            deadline_name: open.deadline_name,
            due_date: open.due_date,
            notified: open.notified,
        }
    }
}

/// Aggregate counters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatisticsSummary {
    pub total_processes: i64,
    /// Process count per status code; every status is present
    pub by_status: BTreeMap<String, i64>,
    pub overdue_deadlines: i64,
    pub generated_at: NaiveDate,
}
