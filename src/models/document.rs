//! Document catalog model

use serde::{Deserialize, Serialize};

/// A kind of document an applicant may have to submit
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    pub id: i64,
    /// Unique code, e.g. `CPF`
    pub code: String,
    pub name: String,
    pub description: Option<String>,
}
