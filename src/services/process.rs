//! Process service
//!
//! Business logic for the process lifecycle:
//! - Registering a process and materializing its checklist and deadlines
//! - Detail, listing and partial updates
//! - Document submission and checklist completion

use crate::db::is_unique_violation;
use crate::db::repositories::{
    DocumentRepository, LegalDeadlineRepository, ProcessRepository, ProcessTypeRepository,
    StatusRepository,
};
use crate::models::{
    CreateProcessInput, NewProcess, ProcessChanges, ProcessDetail, ProcessFilter, ProcessSummary,
    ProvideDocumentInput, ProvideOutcome, StartEvent, UpdateProcessInput,
};
use crate::rules::{build_checklist, plan_deadlines, select_applicable_rules};
use anyhow::Context;
use chrono::NaiveDate;
use std::collections::HashSet;
use std::sync::Arc;

use super::{parse_date, today};

/// Error types for process service operations
#[derive(Debug, thiserror::Error)]
pub enum ProcessServiceError {
    /// Input refers to unknown catalog entries or is malformed
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Protocol number already registered
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Process, document or checklist entry not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Process service
pub struct ProcessService {
    types: Arc<dyn ProcessTypeRepository>,
    statuses: Arc<dyn StatusRepository>,
    documents: Arc<dyn DocumentRepository>,
    rules: Arc<dyn LegalDeadlineRepository>,
    processes: Arc<dyn ProcessRepository>,
}

impl ProcessService {
    pub fn new(
        types: Arc<dyn ProcessTypeRepository>,
        statuses: Arc<dyn StatusRepository>,
        documents: Arc<dyn DocumentRepository>,
        rules: Arc<dyn LegalDeadlineRepository>,
        processes: Arc<dyn ProcessRepository>,
    ) -> Self {
        Self {
            types,
            statuses,
            documents,
            rules,
            processes,
        }
    }

    /// Register a new process.
    ///
    /// The process row, one checklist entry per template document and one
    /// deadline per applicable `created` rule are written in one transaction.
    ///
    /// # Errors
    /// - `ValidationError` for blank protocol or applicant, unknown type or
    ///   status code, or a malformed `created_date`
    /// - `Conflict` if the protocol number is already registered
    pub async fn create_process(
        &self,
        input: CreateProcessInput,
    ) -> Result<ProcessSummary, ProcessServiceError> {
        let protocol_number = input.protocol_number.trim();
        if protocol_number.is_empty() {
            return Err(ProcessServiceError::ValidationError(
                "Protocol number cannot be empty".to_string(),
            ));
        }
        let applicant_name = input.applicant_name.trim();
        if applicant_name.is_empty() {
            return Err(ProcessServiceError::ValidationError(
                "Applicant name cannot be empty".to_string(),
            ));
        }

        let process_type = self
            .types
            .get_by_code(&input.type_code)
            .await
            .context("Failed to load process type")?
            .ok_or_else(|| {
                ProcessServiceError::ValidationError(format!(
                    "Unknown process type: {}",
                    input.type_code
                ))
            })?;

        let status = self
            .statuses
            .get_by_code(&input.status_code)
            .await
            .context("Failed to load status")?
            .ok_or_else(|| {
                ProcessServiceError::ValidationError(format!("Unknown status: {}", input.status_code))
            })?;

        let created_date = match input.created_date.as_deref() {
            Some(raw) => parse_date("created_date", raw).map_err(ProcessServiceError::ValidationError)?,
            None => today(),
        };

        if self
            .processes
            .exists_by_protocol(protocol_number)
            .await
            .context("Failed to check protocol number")?
        {
            return Err(ProcessServiceError::Conflict(format!(
                "Protocol already exists: {}",
                protocol_number
            )));
        }

        let templates = self
            .types
            .list_required_documents(process_type.id)
            .await
            .context("Failed to load document template")?;
        let checklist = build_checklist(&templates);

        let candidates = self
            .rules
            .list_for_type(process_type.id)
            .await
            .context("Failed to load legal deadlines")?;
        let applicable = select_applicable_rules(&candidates, process_type.id, StartEvent::Created);
        let deadlines = plan_deadlines(&HashSet::new(), &applicable, created_date);

        let new_process = NewProcess {
            protocol_number: protocol_number.to_string(),
            type_id: process_type.id,
            applicant_name: applicant_name.to_string(),
            applicant_registration: input.applicant_registration.clone(),
            created_date,
            status_id: status.id,
            notes: input.notes.clone(),
        };

        let id = self
            .processes
            .create(&new_process, &checklist, &deadlines)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    ProcessServiceError::Conflict(format!(
                        "Protocol already exists: {}",
                        protocol_number
                    ))
                } else {
                    ProcessServiceError::InternalError(e)
                }
            })?;

        tracing::info!(
            "Process {} created: {} checklist entries, {} deadlines",
            protocol_number,
            checklist.len(),
            deadlines.len()
        );

        Ok(ProcessSummary {
            id,
            protocol_number: new_process.protocol_number,
            type_code: process_type.code,
            applicant_name: new_process.applicant_name,
            created_date,
            status_code: status.code,
            financial_effective_date: None,
        })
    }

    /// Get a process with its checklist and deadlines
    pub async fn get_process_detail(
        &self,
        protocol_number: &str,
    ) -> Result<ProcessDetail, ProcessServiceError> {
        let process = self
            .processes
            .get_record(protocol_number)
            .await
            .context("Failed to load process")?
            .ok_or_else(|| process_not_found(protocol_number))?;

        let documents = self
            .processes
            .checklist(process.id)
            .await
            .context("Failed to load checklist")?;
        let deadlines = self
            .processes
            .deadlines(process.id)
            .await
            .context("Failed to load deadlines")?;

        Ok(ProcessDetail {
            process,
            documents,
            deadlines,
        })
    }

    /// List processes, newest first, optionally filtered by type and status code.
    ///
    /// Blank filter values are treated as absent.
    pub async fn list_processes(
        &self,
        filter: &ProcessFilter,
    ) -> Result<Vec<ProcessSummary>, ProcessServiceError> {
        let filter = ProcessFilter {
            type_code: non_blank(filter.type_code.as_deref()),
            status_code: non_blank(filter.status_code.as_deref()),
        };
        Ok(self
            .processes
            .list(&filter)
            .await
            .context("Failed to list processes")?)
    }

    /// Apply a partial update and return the refreshed detail.
    ///
    /// Deadlines are never recomputed by an update.
    pub async fn update_process(
        &self,
        protocol_number: &str,
        input: UpdateProcessInput,
    ) -> Result<ProcessDetail, ProcessServiceError> {
        let process = self
            .processes
            .get_by_protocol(protocol_number)
            .await
            .context("Failed to load process")?
            .ok_or_else(|| process_not_found(protocol_number))?;

        let status_id = match input.status_code.as_deref() {
            Some(code) => Some(
                self.statuses
                    .get_by_code(code)
                    .await
                    .context("Failed to load status")?
                    .ok_or_else(|| {
                        ProcessServiceError::ValidationError(format!("Unknown status: {}", code))
                    })?
                    .id,
            ),
            None => None,
        };

        let changes = ProcessChanges {
            status_id,
            opinion: input.opinion,
            financial_effective_date: parse_optional_date(
                "financial_effective_date",
                input.financial_effective_date.as_deref(),
            )?,
            closed_date: parse_optional_date("closed_date", input.closed_date.as_deref())?,
            notes: input.notes,
        };

        if !changes.is_empty() {
            self.processes
                .update(process.id, &changes)
                .await
                .context("Failed to update process")?;
            tracing::info!("Process {} updated", protocol_number);
        }

        self.get_process_detail(protocol_number).await
    }

    /// Mark a checklist document as provided.
    ///
    /// When this completes the checklist, deadlines for the type's
    /// `checklist_complete` rules are created unless they already exist.
    ///
    /// # Errors
    /// - `NotFound` for an unknown process or document code, or a document
    ///   that is not on the process checklist
    /// - `ValidationError` for a malformed `provided_date`
    pub async fn provide_document(
        &self,
        protocol_number: &str,
        document_code: &str,
        input: ProvideDocumentInput,
    ) -> Result<ProvideOutcome, ProcessServiceError> {
        let process = self
            .processes
            .get_by_protocol(protocol_number)
            .await
            .context("Failed to load process")?
            .ok_or_else(|| process_not_found(protocol_number))?;

        let document = self
            .documents
            .get_by_code(document_code)
            .await
            .context("Failed to load document")?
            .ok_or_else(|| {
                ProcessServiceError::NotFound(format!("Document not found: {}", document_code))
            })?;

        let provided_date = match input.provided_date.as_deref() {
            Some(raw) => parse_date("provided_date", raw).map_err(ProcessServiceError::ValidationError)?,
            None => today(),
        };

        let candidates = self
            .rules
            .list_for_type(process.type_id)
            .await
            .context("Failed to load legal deadlines")?;
        let completion_rules =
            select_applicable_rules(&candidates, process.type_id, StartEvent::ChecklistComplete);

        let outcome = self
            .processes
            .provide_document(
                process.id,
                document.id,
                provided_date,
                input.observations.as_deref(),
                &completion_rules,
            )
            .await
            .context("Failed to record provided document")?
            .ok_or_else(|| {
                ProcessServiceError::NotFound(format!(
                    "Document {} is not on the checklist of process {}",
                    document_code, protocol_number
                ))
            })?;

        tracing::debug!(
            "Document {} provided for process {} on {}",
            document_code,
            protocol_number,
            provided_date
        );
        if outcome.deadlines_created > 0 {
            tracing::info!(
                "Checklist of process {} complete, {} deadline(s) created",
                protocol_number,
                outcome.deadlines_created
            );
        }

        Ok(outcome)
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn process_not_found(protocol_number: &str) -> ProcessServiceError {
    ProcessServiceError::NotFound(format!("Process not found: {}", protocol_number))
}

fn parse_optional_date(
    field: &str,
    raw: Option<&str>,
) -> Result<Option<NaiveDate>, ProcessServiceError> {
    raw.map(|value| parse_date(field, value))
        .transpose()
        .map_err(ProcessServiceError::ValidationError)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::{seeded_services, TestServices};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    async fn create_prom_cap(services: &TestServices, protocol: &str) -> ProcessSummary {
        services
            .process
            .create_process(CreateProcessInput::new(protocol, "PROM_CAP", "Ana Souza").created_on("2025-12-01"))
            .await
            .expect("Failed to create process")
    }

    async fn provide(services: &TestServices, protocol: &str, code: &str, on: &str) -> ProvideOutcome {
        services
            .process
            .provide_document(
                protocol,
                code,
                ProvideDocumentInput {
                    provided_date: Some(on.to_string()),
                    observations: None,
                },
            )
            .await
            .expect("Failed to provide document")
    }

    #[tokio::test]
    async fn test_create_materializes_template_and_created_rules() {
        let services = seeded_services().await;
        let summary = create_prom_cap(&services, "PGR-2025-0001").await;

        assert_eq!(summary.type_code, "PROM_CAP");
        assert_eq!(summary.status_code, "RECEIVED");
        assert_eq!(summary.created_date, date(2025, 12, 1));

        let detail = services.process.get_process_detail("PGR-2025-0001").await.unwrap();
        let codes: Vec<&str> = detail.documents.iter().map(|d| d.code.as_str()).collect();
        assert_eq!(codes, vec!["RG", "CPF", "CERT_COURSE", "SUPERVISOR_DECL"]);
        assert!(detail.documents.iter().all(|d| d.required && !d.provided));

        let mut deadlines: Vec<(&str, NaiveDate)> = detail
            .deadlines
            .iter()
            .map(|d| (d.name.as_str(), d.due_date))
            .collect();
        deadlines.sort();
        assert_eq!(
            deadlines,
            vec![
                ("Document complement", date(2025, 12, 22)),
                ("Initial instruction", date(2025, 12, 31)),
                ("Training analysis", date(2025, 12, 31)),
            ]
        );
    }

    #[tokio::test]
    async fn test_create_defaults_to_today() {
        let services = seeded_services().await;
        let summary = services
            .process
            .create_process(CreateProcessInput::new("PGR-TODAY", "PROG_MER", "Bruno"))
            .await
            .unwrap();
        assert_eq!(summary.created_date, today());
    }

    #[tokio::test]
    async fn test_create_validation_errors() {
        let services = seeded_services().await;

        let cases = vec![
            CreateProcessInput::new("PGR-1", "UNKNOWN", "Ana"),
            CreateProcessInput {
                status_code: "NOPE".to_string(),
                ..CreateProcessInput::new("PGR-1", "PROM_CAP", "Ana")
            },
            CreateProcessInput::new("PGR-1", "PROM_CAP", "Ana").created_on("2025-13-01"),
            CreateProcessInput::new("   ", "PROM_CAP", "Ana"),
            CreateProcessInput::new("PGR-1", "PROM_CAP", ""),
        ];

        for input in cases {
            let result = services.process.create_process(input).await;
            assert!(matches!(result, Err(ProcessServiceError::ValidationError(_))));
        }
        assert!(services.process.list_processes(&ProcessFilter::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_protocol_conflict_keeps_original() {
        let services = seeded_services().await;
        create_prom_cap(&services, "PGR-1").await;

        let result = services
            .process
            .create_process(CreateProcessInput::new("PGR-1", "PROG_MER", "Someone Else").created_on("2025-12-05"))
            .await;
        assert!(matches!(result, Err(ProcessServiceError::Conflict(_))));

        let detail = services.process.get_process_detail("PGR-1").await.unwrap();
        assert_eq!(detail.process.applicant_name, "Ana Souza");
        assert_eq!(detail.process.process_type.code, "PROM_CAP");
        assert_eq!(detail.deadlines.len(), 3);
    }

    #[tokio::test]
    async fn test_detail_not_found() {
        let services = seeded_services().await;
        let result = services.process.get_process_detail("PGR-404").await;
        assert!(matches!(result, Err(ProcessServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_filters_by_codes() {
        let services = seeded_services().await;
        create_prom_cap(&services, "PGR-1").await;
        services
            .process
            .create_process(CreateProcessInput::new("PGR-2", "PROG_MER", "Bruno").created_on("2025-12-03"))
            .await
            .unwrap();

        let all = services.process.list_processes(&ProcessFilter::default()).await.unwrap();
        assert_eq!(all[0].protocol_number, "PGR-2");
        assert_eq!(all[1].protocol_number, "PGR-1");

        let filter = ProcessFilter {
            type_code: Some("PROM_CAP".to_string()),
            status_code: None,
        };
        let prom = services.process.list_processes(&filter).await.unwrap();
        assert_eq!(prom.len(), 1);
        assert_eq!(prom[0].protocol_number, "PGR-1");
    }

    #[tokio::test]
    async fn test_last_required_document_completes_checklist() {
        let services = seeded_services().await;
        create_prom_cap(&services, "PGR-1").await;

        for code in ["RG", "CPF", "CERT_COURSE"] {
            let outcome = provide(&services, "PGR-1", code, "2025-12-05").await;
            assert!(!outcome.all_provided);
            assert_eq!(outcome.deadlines_created, 0);
        }

        let outcome = provide(&services, "PGR-1", "SUPERVISOR_DECL", "2025-12-10").await;
        assert!(outcome.all_provided);
        assert_eq!(outcome.deadlines_created, 1);

        let detail = services.process.get_process_detail("PGR-1").await.unwrap();
        let decision = detail
            .deadlines
            .iter()
            .find(|d| d.name == "Final decision")
            .expect("completion deadline");
        assert_eq!(decision.due_date, date(2026, 1, 9));
    }

    #[tokio::test]
    async fn test_providing_again_never_duplicates_deadlines() {
        let services = seeded_services().await;
        create_prom_cap(&services, "PGR-1").await;
        for code in ["RG", "CPF", "CERT_COURSE", "SUPERVISOR_DECL"] {
            provide(&services, "PGR-1", code, "2025-12-05").await;
        }

        let again = provide(&services, "PGR-1", "RG", "2025-12-20").await;
        assert!(again.all_provided);
        assert_eq!(again.deadlines_created, 0);

        let detail = services.process.get_process_detail("PGR-1").await.unwrap();
        let rule_names: HashSet<&str> = detail.deadlines.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(rule_names.len(), detail.deadlines.len());
        assert_eq!(detail.deadlines.len(), 4);
    }

    #[tokio::test]
    async fn test_provide_not_found_cases() {
        let services = seeded_services().await;
        create_prom_cap(&services, "PGR-1").await;

        let missing_process = services
            .process
            .provide_document("PGR-404", "RG", ProvideDocumentInput::default())
            .await;
        assert!(matches!(missing_process, Err(ProcessServiceError::NotFound(_))));

        let unknown_document = services
            .process
            .provide_document("PGR-1", "PASSPORT", ProvideDocumentInput::default())
            .await;
        assert!(matches!(unknown_document, Err(ProcessServiceError::NotFound(_))));

        // PERF_REVIEW belongs to the merit progression template only
        let not_on_checklist = services
            .process
            .provide_document("PGR-1", "PERF_REVIEW", ProvideDocumentInput::default())
            .await;
        assert!(matches!(not_on_checklist, Err(ProcessServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_provide_rejects_malformed_date() {
        let services = seeded_services().await;
        create_prom_cap(&services, "PGR-1").await;

        let result = services
            .process
            .provide_document(
                "PGR-1",
                "RG",
                ProvideDocumentInput {
                    provided_date: Some("05/12/2025".to_string()),
                    observations: None,
                },
            )
            .await;
        assert!(matches!(result, Err(ProcessServiceError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_update_process_partial() {
        let services = seeded_services().await;
        create_prom_cap(&services, "PGR-1").await;

        let detail = services
            .process
            .update_process(
                "PGR-1",
                UpdateProcessInput {
                    status_code: Some("GRANTED".to_string()),
                    opinion: Some("Meets all requirements".to_string()),
                    financial_effective_date: Some("2026-01-01".to_string()),
                    ..Default::default()
                },
            )
            .await
            .expect("Failed to update process");

        assert_eq!(detail.process.status.code, "GRANTED");
        assert_eq!(detail.process.opinion.as_deref(), Some("Meets all requirements"));
        assert_eq!(detail.process.financial_effective_date, Some(date(2026, 1, 1)));
        assert!(detail.process.closed_date.is_none());
        // Deadlines untouched
        assert_eq!(detail.deadlines.len(), 3);
    }

    #[tokio::test]
    async fn test_update_process_errors() {
        let services = seeded_services().await;
        create_prom_cap(&services, "PGR-1").await;

        let unknown_status = services
            .process
            .update_process(
                "PGR-1",
                UpdateProcessInput {
                    status_code: Some("ARCHIVED".to_string()),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(unknown_status, Err(ProcessServiceError::ValidationError(_))));

        let bad_date = services
            .process
            .update_process(
                "PGR-1",
                UpdateProcessInput {
                    closed_date: Some("tomorrow".to_string()),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(bad_date, Err(ProcessServiceError::ValidationError(_))));

        let missing = services
            .process
            .update_process("PGR-404", UpdateProcessInput::default())
            .await;
        assert!(matches!(missing, Err(ProcessServiceError::NotFound(_))));
    }
}
