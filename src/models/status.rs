//! Process status model

use serde::{Deserialize, Serialize};

/// Status a process can be in. Referential only; there is no transition table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Status {
    pub id: i64,
    /// Unique code, e.g. `RECEIVED`
    pub code: String,
    /// Human readable label
    pub label: String,
}

/// Code assigned to new processes when the caller does not name one
pub const DEFAULT_STATUS_CODE: &str = "RECEIVED";
