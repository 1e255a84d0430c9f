//! Catalog service
//!
//! Read access to process types, statuses and documents, and installation of
//! the default catalog on a fresh database.

use crate::db::repositories::{
    DocumentRepository, LegalDeadlineRepository, ProcessTypeRepository, StatusRepository,
};
use crate::models::{
    CreateLegalDeadlineInput, CreateProcessTypeInput, Document, ProcessType, StartEvent, Status,
};
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::sync::Arc;

/// Rows written by `seed_defaults`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub process_types: usize,
    pub statuses: usize,
    pub documents: usize,
    pub legal_deadlines: usize,
}

impl SeedReport {
    pub fn total(&self) -> usize {
        self.process_types + self.statuses + self.documents + self.legal_deadlines
    }
}

const DEFAULT_STATUSES: &[(&str, &str)] = &[
    ("RECEIVED", "Received"),
    ("IN_REVIEW", "In review"),
    ("PENDING_DOCS", "Pending documents"),
    ("COMPLETE", "Complete"),
    ("GRANTED", "Granted"),
    ("DENIED", "Denied"),
    ("CANCELLED", "Cancelled"),
];

const DEFAULT_DOCUMENTS: &[(&str, &str, &str)] = &[
    ("RG", "Identity card (RG)", "Copy of the identity card"),
    ("CPF", "Taxpayer registry (CPF)", "Copy of the CPF card"),
    ("CERT_COURSE", "Course certificate", "Professional training certificate"),
    ("DIPLOMA", "Diploma", "Undergraduate or graduate diploma"),
    ("SUPERVISOR_DECL", "Supervisor declaration", "Declaration from the immediate supervisor"),
    ("PERF_REVIEW", "Performance review", "Performance review for the last period"),
    ("SERVICE_RECORD", "Service record", "Copy of the employee service record"),
];

/// Process types with their document templates, in checklist order
const DEFAULT_TYPES: &[(&str, &str, &str, &[&str])] = &[
    (
        "PROM_CAP",
        "Promotion by professional training",
        "Promotion based on degrees and training courses",
        &["RG", "CPF", "CERT_COURSE", "SUPERVISOR_DECL"],
    ),
    (
        "PROG_MER",
        "Progression by professional merit",
        "Progression based on performance review",
        &["RG", "CPF", "PERF_REVIEW", "SERVICE_RECORD"],
    ),
];

struct DefaultRule {
    type_code: Option<&'static str>,
    name: &'static str,
    days_limit: u32,
    start_event: StartEvent,
    business_days: bool,
    description: &'static str,
}

const DEFAULT_RULES: &[DefaultRule] = &[
    DefaultRule {
        type_code: None,
        name: "Initial instruction",
        days_limit: 30,
        start_event: StartEvent::Created,
        business_days: false,
        description: "Standard period to prepare the process",
    },
    DefaultRule {
        type_code: Some("PROG_MER"),
        name: "Merit technical analysis",
        days_limit: 45,
        start_event: StartEvent::Created,
        business_days: false,
        description: "Period for the technical analysis",
    },
    DefaultRule {
        type_code: Some("PROM_CAP"),
        name: "Training analysis",
        days_limit: 30,
        start_event: StartEvent::Created,
        business_days: false,
        description: "Period to analyse certificates",
    },
    DefaultRule {
        type_code: None,
        name: "Document complement",
        days_limit: 15,
        start_event: StartEvent::Created,
        business_days: true,
        description: "Period to submit missing documents",
    },
    DefaultRule {
        type_code: None,
        name: "Final decision",
        days_limit: 30,
        start_event: StartEvent::ChecklistComplete,
        business_days: false,
        description: "Period to decide once the documentation is complete",
    },
];

/// Catalog service
pub struct CatalogService {
    types: Arc<dyn ProcessTypeRepository>,
    statuses: Arc<dyn StatusRepository>,
    documents: Arc<dyn DocumentRepository>,
    rules: Arc<dyn LegalDeadlineRepository>,
}

impl CatalogService {
    pub fn new(
        types: Arc<dyn ProcessTypeRepository>,
        statuses: Arc<dyn StatusRepository>,
        documents: Arc<dyn DocumentRepository>,
        rules: Arc<dyn LegalDeadlineRepository>,
    ) -> Self {
        Self {
            types,
            statuses,
            documents,
            rules,
        }
    }

    pub async fn list_process_types(&self) -> Result<Vec<ProcessType>> {
        self.types.list().await
    }

    pub async fn list_statuses(&self) -> Result<Vec<Status>> {
        self.statuses.list().await
    }

    pub async fn list_documents(&self) -> Result<Vec<Document>> {
        self.documents.list().await
    }

    /// Install the default catalog.
    ///
    /// Statuses, documents and types are created when their code is missing;
    /// a type's template is written only when the type itself is created.
    /// Rules are installed only into an empty rule table. Running this twice
    /// writes nothing the second time.
    pub async fn seed_defaults(&self) -> Result<SeedReport> {
        let mut report = SeedReport::default();

        for (code, label) in DEFAULT_STATUSES {
            if self.statuses.get_by_code(code).await?.is_none() {
                self.statuses
                    .create(code, label)
                    .await
                    .with_context(|| format!("Failed to seed status {}", code))?;
                report.statuses += 1;
            }
        }

        let mut document_ids: HashMap<&str, i64> = HashMap::new();
        for (code, name, description) in DEFAULT_DOCUMENTS {
            let document = match self.documents.get_by_code(code).await? {
                Some(existing) => existing,
                None => {
                    report.documents += 1;
                    self.documents
                        .create(code, name, Some(description))
                        .await
                        .with_context(|| format!("Failed to seed document {}", code))?
                }
            };
            document_ids.insert(*code, document.id);
        }

        let mut type_ids: HashMap<&str, i64> = HashMap::new();
        for (code, name, description, template) in DEFAULT_TYPES {
            if let Some(existing) = self.types.get_by_code(code).await? {
                type_ids.insert(*code, existing.id);
                continue;
            }

            let input = CreateProcessTypeInput {
                code: code.to_string(),
                name: name.to_string(),
                description: Some(description.to_string()),
            };
            let process_type = self
                .types
                .create(&input)
                .await
                .with_context(|| format!("Failed to seed process type {}", code))?;
            report.process_types += 1;

            for (position, document_code) in template.iter().enumerate() {
                let document_id = document_ids
                    .get(document_code)
                    .copied()
                    .with_context(|| format!("Template references unknown document {}", document_code))?;
                self.types
                    .add_required_document(process_type.id, document_id, true, position as i32 + 1)
                    .await?;
            }
            type_ids.insert(*code, process_type.id);
        }

        if self.rules.list().await?.is_empty() {
            for rule in DEFAULT_RULES {
                let type_id = match rule.type_code {
                    Some(code) => Some(
                        type_ids
                            .get(code)
                            .copied()
                            .with_context(|| format!("Rule references unknown type {}", code))?,
                    ),
                    None => None,
                };
                self.rules
                    .create(&CreateLegalDeadlineInput {
                        type_id,
                        name: rule.name.to_string(),
                        days_limit: rule.days_limit,
                        start_event: rule.start_event,
                        business_days: rule.business_days,
                        description: Some(rule.description.to_string()),
                    })
                    .await
                    .with_context(|| format!("Failed to seed rule {}", rule.name))?;
                report.legal_deadlines += 1;
            }
        }

        if report.total() > 0 {
            tracing::info!("Default catalog installed: {:?}", report);
        }
        Ok(report)
    }
}
