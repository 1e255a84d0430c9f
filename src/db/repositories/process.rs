//! Process repository
//!
//! Processes together with the rows they own (checklist entries and deadline
//! instances). Every state-changing method runs in a single transaction.

use std::collections::HashSet;

use crate::db::{Backend, DynDatabasePool};
use crate::models::{
    ChecklistItem, DeadlineItem, LegalDeadline, NewChecklistEntry, NewProcess,
    NewProcessDeadline, Process, ProcessChanges, ProcessDocument, ProcessFilter, ProcessRecord,
    ProcessSummary, ProvideOutcome, StatusRef, TypeRef,
};
use crate::rules::{evaluate_completion, plan_deadlines};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{MySqlConnection, MySqlPool, Row, SqliteConnection, SqlitePool};
use std::sync::Arc;

/// Process repository trait
#[async_trait]
pub trait ProcessRepository: Send + Sync {
    /// Insert a process with its checklist and deadlines atomically.
    ///
    /// Returns the new process id. On any failure nothing is written.
    async fn create(
        &self,
        process: &NewProcess,
        checklist: &[NewChecklistEntry],
        deadlines: &[NewProcessDeadline],
    ) -> Result<i64>;

    /// Check whether a protocol number is taken
    async fn exists_by_protocol(&self, protocol_number: &str) -> Result<bool>;

    /// Get the stored process row by protocol number
    async fn get_by_protocol(&self, protocol_number: &str) -> Result<Option<Process>>;

    /// Get the process joined with its type and status
    async fn get_record(&self, protocol_number: &str) -> Result<Option<ProcessRecord>>;

    /// List processes, newest `created_date` first
    async fn list(&self, filter: &ProcessFilter) -> Result<Vec<ProcessSummary>>;

    /// Apply a partial update
    async fn update(&self, id: i64, changes: &ProcessChanges) -> Result<()>;

    /// Checklist of a process in template order
    async fn checklist(&self, process_id: i64) -> Result<Vec<ChecklistItem>>;

    /// Deadlines of a process ordered by due date
    async fn deadlines(&self, process_id: i64) -> Result<Vec<DeadlineItem>>;

    /// Mark a checklist entry as provided and materialize completion deadlines.
    ///
    /// `completion_rules` are the `checklist_complete` rules applicable to the
    /// process type. Returns `None` when the process has no checklist entry
    /// for `document_id`.
    async fn provide_document(
        &self,
        process_id: i64,
        document_id: i64,
        provided_date: NaiveDate,
        observations: Option<&str>,
        completion_rules: &[LegalDeadline],
    ) -> Result<Option<ProvideOutcome>>;

    /// Total number of processes
    async fn count_all(&self) -> Result<i64>;

    /// Process count per status code, including statuses with no process
    async fn count_by_status(&self) -> Result<Vec<(String, i64)>>;
}

/// SQLx-based process repository
pub struct SqlxProcessRepository {
    pool: DynDatabasePool,
}

impl SqlxProcessRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ProcessRepository> {
        Arc::new(Self::new(pool))
    }
}

const INSERT_PROCESS: &str = r#"
    INSERT INTO processes
        (protocol_number, type_id, applicant_name, applicant_registration, created_date, status_id, notes)
    VALUES (?, ?, ?, ?, ?, ?, ?)
"#;

const INSERT_CHECKLIST_ENTRY: &str = r#"
    INSERT INTO process_documents (process_id, document_id, required, provided)
    VALUES (?, ?, ?, FALSE)
"#;

const INSERT_DEADLINE: &str = r#"
    INSERT INTO process_deadlines (process_id, legal_deadline_id, due_date, notified, closed)
    VALUES (?, ?, ?, FALSE, FALSE)
"#;

const INSERT_DEADLINE_IF_ABSENT_SQLITE: &str = r#"
    INSERT OR IGNORE INTO process_deadlines (process_id, legal_deadline_id, due_date, notified, closed)
    VALUES (?, ?, ?, FALSE, FALSE)
"#;

const INSERT_DEADLINE_IF_ABSENT_MYSQL: &str = r#"
    INSERT IGNORE INTO process_deadlines (process_id, legal_deadline_id, due_date, notified, closed)
    VALUES (?, ?, ?, FALSE, FALSE)
"#;

const SELECT_PROCESS: &str = r#"
    SELECT id, protocol_number, type_id, applicant_name, applicant_registration, created_date,
           status_id, opinion, financial_effective_date, closed_date, notes
    FROM processes
    WHERE protocol_number = ?
"#;

const SELECT_RECORD: &str = r#"
    SELECT p.id, p.protocol_number, t.code AS type_code, t.name AS type_name,
           p.applicant_name, p.applicant_registration, p.created_date,
           s.code AS status_code, s.label AS status_label,
           p.opinion, p.financial_effective_date, p.closed_date, p.notes
    FROM processes p
    JOIN process_types t ON t.id = p.type_id
    JOIN statuses s ON s.id = p.status_id
    WHERE p.protocol_number = ?
"#;

const SELECT_SUMMARIES: &str = r#"
    SELECT p.id, p.protocol_number, t.code AS type_code, p.applicant_name, p.created_date,
           s.code AS status_code, p.financial_effective_date
    FROM processes p
    JOIN process_types t ON t.id = p.type_id
    JOIN statuses s ON s.id = p.status_id
    WHERE (? IS NULL OR t.code = ?)
      AND (? IS NULL OR s.code = ?)
    ORDER BY p.created_date DESC, p.id DESC
"#;

const UPDATE_PROCESS: &str = r#"
    UPDATE processes SET
        status_id = COALESCE(?, status_id),
        opinion = COALESCE(?, opinion),
        financial_effective_date = COALESCE(?, financial_effective_date),
        closed_date = COALESCE(?, closed_date),
        notes = COALESCE(?, notes)
    WHERE id = ?
"#;

const SELECT_CHECKLIST: &str = r#"
    SELECT d.code, d.name, pd.required, pd.provided, pd.provided_date, pd.observations
    FROM process_documents pd
    JOIN documents d ON d.id = pd.document_id
    WHERE pd.process_id = ?
    ORDER BY pd.id
"#;

const SELECT_DEADLINES: &str = r#"
    SELECT pdl.id, ld.name, pdl.due_date, ld.days_limit, ld.business_days,
           pdl.notified, pdl.closed, pdl.notes
    FROM process_deadlines pdl
    JOIN legal_deadlines ld ON ld.id = pdl.legal_deadline_id
    WHERE pdl.process_id = ?
    ORDER BY pdl.due_date, pdl.id
"#;

const SELECT_ENTRY_ID: &str =
    "SELECT id FROM process_documents WHERE process_id = ? AND document_id = ?";

const MARK_PROVIDED: &str = r#"
    UPDATE process_documents
    SET provided = TRUE, provided_date = ?, observations = ?
    WHERE id = ?
"#;

const SELECT_ENTRIES: &str = r#"
    SELECT id, process_id, document_id, required, provided, provided_date, observations
    FROM process_documents
    WHERE process_id = ?
"#;

const SELECT_EXISTING_RULE_IDS: &str =
    "SELECT legal_deadline_id FROM process_deadlines WHERE process_id = ?";

const COUNT_ALL: &str = "SELECT COUNT(*) AS count FROM processes";

const COUNT_BY_STATUS: &str = r#"
    SELECT s.code, COUNT(p.id) AS count
    FROM statuses s
    LEFT JOIN processes p ON p.status_id = s.id
    GROUP BY s.id, s.code
    ORDER BY s.code
"#;

#[async_trait]
impl ProcessRepository for SqlxProcessRepository {
    async fn create(
        &self,
        process: &NewProcess,
        checklist: &[NewChecklistEntry],
        deadlines: &[NewProcessDeadline],
    ) -> Result<i64> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => create_process_sqlite(pool, process, checklist, deadlines).await,
            Backend::Mysql(pool) => create_process_mysql(pool, process, checklist, deadlines).await,
        }
    }

    async fn exists_by_protocol(&self, protocol_number: &str) -> Result<bool> {
        Ok(self.get_by_protocol(protocol_number).await?.is_some())
    }

    async fn get_by_protocol(&self, protocol_number: &str) -> Result<Option<Process>> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => {
                let row = sqlx::query(SELECT_PROCESS)
                    .bind(protocol_number)
                    .fetch_optional(pool)
                    .await
                    .context("Failed to get process by protocol")?;
                Ok(row.as_ref().map(row_to_process_sqlite))
            }
            Backend::Mysql(pool) => {
                let row = sqlx::query(SELECT_PROCESS)
                    .bind(protocol_number)
                    .fetch_optional(pool)
                    .await
                    .context("Failed to get process by protocol")?;
                Ok(row.as_ref().map(row_to_process_mysql))
            }
        }
    }

    async fn get_record(&self, protocol_number: &str) -> Result<Option<ProcessRecord>> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => {
                let row = sqlx::query(SELECT_RECORD)
                    .bind(protocol_number)
                    .fetch_optional(pool)
                    .await
                    .context("Failed to get process record")?;
                Ok(row.as_ref().map(row_to_record_sqlite))
            }
            Backend::Mysql(pool) => {
                let row = sqlx::query(SELECT_RECORD)
                    .bind(protocol_number)
                    .fetch_optional(pool)
                    .await
                    .context("Failed to get process record")?;
                Ok(row.as_ref().map(row_to_record_mysql))
            }
        }
    }

    async fn list(&self, filter: &ProcessFilter) -> Result<Vec<ProcessSummary>> {
        let type_code = filter.type_code.as_deref();
        let status_code = filter.status_code.as_deref();

        match self.pool.backend() {
            Backend::Sqlite(pool) => {
                let rows = sqlx::query(SELECT_SUMMARIES)
                    .bind(type_code)
                    .bind(type_code)
                    .bind(status_code)
                    .bind(status_code)
                    .fetch_all(pool)
                    .await
                    .context("Failed to list processes")?;
                Ok(rows.iter().map(row_to_summary_sqlite).collect())
            }
            Backend::Mysql(pool) => {
                let rows = sqlx::query(SELECT_SUMMARIES)
                    .bind(type_code)
                    .bind(type_code)
                    .bind(status_code)
                    .bind(status_code)
                    .fetch_all(pool)
                    .await
                    .context("Failed to list processes")?;
                Ok(rows.iter().map(row_to_summary_mysql).collect())
            }
        }
    }

    async fn update(&self, id: i64, changes: &ProcessChanges) -> Result<()> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => {
                sqlx::query(UPDATE_PROCESS)
                    .bind(changes.status_id)
                    .bind(&changes.opinion)
                    .bind(changes.financial_effective_date)
                    .bind(changes.closed_date)
                    .bind(&changes.notes)
                    .bind(id)
                    .execute(pool)
                    .await
                    .context("Failed to update process")?;
            }
            Backend::Mysql(pool) => {
                sqlx::query(UPDATE_PROCESS)
                    .bind(changes.status_id)
                    .bind(&changes.opinion)
                    .bind(changes.financial_effective_date)
                    .bind(changes.closed_date)
                    .bind(&changes.notes)
                    .bind(id)
                    .execute(pool)
                    .await
                    .context("Failed to update process")?;
            }
        }
        Ok(())
    }

    async fn checklist(&self, process_id: i64) -> Result<Vec<ChecklistItem>> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => {
                let rows = sqlx::query(SELECT_CHECKLIST)
                    .bind(process_id)
                    .fetch_all(pool)
                    .await
                    .context("Failed to load checklist")?;
                Ok(rows
                    .iter()
                    .map(|row| ChecklistItem {
                        code: row.get("code"),
                        name: row.get("name"),
                        required: row.get("required"),
                        provided: row.get("provided"),
                        provided_date: row.get("provided_date"),
                        observations: row.get("observations"),
                    })
                    .collect())
            }
            Backend::Mysql(pool) => {
                let rows = sqlx::query(SELECT_CHECKLIST)
                    .bind(process_id)
                    .fetch_all(pool)
                    .await
                    .context("Failed to load checklist")?;
                Ok(rows
                    .iter()
                    .map(|row| ChecklistItem {
                        code: row.get("code"),
                        name: row.get("name"),
                        required: row.get("required"),
                        provided: row.get("provided"),
                        provided_date: row.get("provided_date"),
                        observations: row.get("observations"),
                    })
                    .collect())
            }
        }
    }

    async fn deadlines(&self, process_id: i64) -> Result<Vec<DeadlineItem>> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => {
                let rows = sqlx::query(SELECT_DEADLINES)
                    .bind(process_id)
                    .fetch_all(pool)
                    .await
                    .context("Failed to load process deadlines")?;
                rows.iter()
                    .map(|row| {
                        let days_limit: i64 = row.get("days_limit");
                        Ok(DeadlineItem {
                            id: row.get("id"),
                            name: row.get("name"),
                            due_date: row.get("due_date"),
                            days_limit: u32::try_from(days_limit)
                                .context("days_limit out of range")?,
                            business_days: row.get("business_days"),
                            notified: row.get("notified"),
                            closed: row.get("closed"),
                            notes: row.get("notes"),
                        })
                    })
                    .collect()
            }
            Backend::Mysql(pool) => {
                let rows = sqlx::query(SELECT_DEADLINES)
                    .bind(process_id)
                    .fetch_all(pool)
                    .await
                    .context("Failed to load process deadlines")?;
                rows.iter()
                    .map(|row| {
                        let days_limit: i32 = row.get("days_limit");
                        Ok(DeadlineItem {
                            id: row.get("id"),
                            name: row.get("name"),
                            due_date: row.get("due_date"),
                            days_limit: u32::try_from(days_limit)
                                .context("days_limit out of range")?,
                            business_days: row.get("business_days"),
                            notified: row.get("notified"),
                            closed: row.get("closed"),
                            notes: row.get("notes"),
                        })
                    })
                    .collect()
            }
        }
    }

    async fn provide_document(
        &self,
        process_id: i64,
        document_id: i64,
        provided_date: NaiveDate,
        observations: Option<&str>,
        completion_rules: &[LegalDeadline],
    ) -> Result<Option<ProvideOutcome>> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => {
                let mut tx = pool.begin().await.context("Failed to begin transaction")?;
                let outcome = provide_document_sqlite(
                    &mut tx,
                    process_id,
                    document_id,
                    provided_date,
                    observations,
                    completion_rules,
                )
                .await?;
                if outcome.is_some() {
                    tx.commit().await.context("Failed to commit document update")?;
                }
                Ok(outcome)
            }
            Backend::Mysql(pool) => {
                let mut tx = pool.begin().await.context("Failed to begin transaction")?;
                let outcome = provide_document_mysql(
                    &mut tx,
                    process_id,
                    document_id,
                    provided_date,
                    observations,
                    completion_rules,
                )
                .await?;
                if outcome.is_some() {
                    tx.commit().await.context("Failed to commit document update")?;
                }
                Ok(outcome)
            }
        }
    }

    async fn count_all(&self) -> Result<i64> {
        let count: i64 = match self.pool.backend() {
            Backend::Sqlite(pool) => sqlx::query(COUNT_ALL)
                .fetch_one(pool)
                .await
                .context("Failed to count processes")?
                .get("count"),
            Backend::Mysql(pool) => sqlx::query(COUNT_ALL)
                .fetch_one(pool)
                .await
                .context("Failed to count processes")?
                .get("count"),
        };
        Ok(count)
    }

    async fn count_by_status(&self) -> Result<Vec<(String, i64)>> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => {
                let rows = sqlx::query(COUNT_BY_STATUS)
                    .fetch_all(pool)
                    .await
                    .context("Failed to count processes by status")?;
                Ok(rows.iter().map(|row| (row.get("code"), row.get("count"))).collect())
            }
            Backend::Mysql(pool) => {
                let rows = sqlx::query(COUNT_BY_STATUS)
                    .fetch_all(pool)
                    .await
                    .context("Failed to count processes by status")?;
                Ok(rows.iter().map(|row| (row.get("code"), row.get("count"))).collect())
            }
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_process_sqlite(
    pool: &SqlitePool,
    process: &NewProcess,
    checklist: &[NewChecklistEntry],
    deadlines: &[NewProcessDeadline],
) -> Result<i64> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let id = sqlx::query(INSERT_PROCESS)
        .bind(&process.protocol_number)
        .bind(process.type_id)
        .bind(&process.applicant_name)
        .bind(&process.applicant_registration)
        .bind(process.created_date)
        .bind(process.status_id)
        .bind(&process.notes)
        .execute(&mut *tx)
        .await
        .context("Failed to insert process")?
        .last_insert_rowid();

    for entry in checklist {
        sqlx::query(INSERT_CHECKLIST_ENTRY)
            .bind(id)
            .bind(entry.document_id)
            .bind(entry.required)
            .execute(&mut *tx)
            .await
            .context("Failed to insert checklist entry")?;
    }

    for deadline in deadlines {
        sqlx::query(INSERT_DEADLINE)
            .bind(id)
            .bind(deadline.legal_deadline_id)
            .bind(deadline.due_date)
            .execute(&mut *tx)
            .await
            .context("Failed to insert process deadline")?;
    }

    tx.commit().await.context("Failed to commit process creation")?;
    Ok(id)
}

async fn provide_document_sqlite(
    conn: &mut SqliteConnection,
    process_id: i64,
    document_id: i64,
    provided_date: NaiveDate,
    observations: Option<&str>,
    completion_rules: &[LegalDeadline],
) -> Result<Option<ProvideOutcome>> {
    let entry = sqlx::query(SELECT_ENTRY_ID)
        .bind(process_id)
        .bind(document_id)
        .fetch_optional(&mut *conn)
        .await
        .context("Failed to find checklist entry")?;
    let Some(entry) = entry else {
        return Ok(None);
    };
    let entry_id: i64 = entry.get("id");

    sqlx::query(MARK_PROVIDED)
        .bind(provided_date)
        .bind(observations)
        .bind(entry_id)
        .execute(&mut *conn)
        .await
        .context("Failed to mark document provided")?;

    let entries: Vec<ProcessDocument> = sqlx::query(SELECT_ENTRIES)
        .bind(process_id)
        .fetch_all(&mut *conn)
        .await
        .context("Failed to load checklist entries")?
        .iter()
        .map(|row| ProcessDocument {
            id: row.get("id"),
            process_id: row.get("process_id"),
            document_id: row.get("document_id"),
            required: row.get("required"),
            provided: row.get("provided"),
            provided_date: row.get("provided_date"),
            observations: row.get("observations"),
        })
        .collect();

    let completion = evaluate_completion(&entries);
    if !completion.all_provided {
        return Ok(Some(ProvideOutcome {
            all_provided: false,
            deadlines_created: 0,
        }));
    }

    let existing: HashSet<i64> = sqlx::query(SELECT_EXISTING_RULE_IDS)
        .bind(process_id)
        .fetch_all(&mut *conn)
        .await
        .context("Failed to load existing deadlines")?
        .iter()
        .map(|row| row.get("legal_deadline_id"))
        .collect();

    let reference = completion.reference_date.unwrap_or(provided_date);
    let mut created = 0;
    for deadline in plan_deadlines(&existing, completion_rules, reference) {
        created += sqlx::query(INSERT_DEADLINE_IF_ABSENT_SQLITE)
            .bind(process_id)
            .bind(deadline.legal_deadline_id)
            .bind(deadline.due_date)
            .execute(&mut *conn)
            .await
            .context("Failed to insert completion deadline")?
            .rows_affected() as usize;
    }

    Ok(Some(ProvideOutcome {
        all_provided: true,
        deadlines_created: created,
    }))
}

fn row_to_process_sqlite(row: &sqlx::sqlite::SqliteRow) -> Process {
    Process {
        id: row.get("id"),
        protocol_number: row.get("protocol_number"),
        type_id: row.get("type_id"),
        applicant_name: row.get("applicant_name"),
        applicant_registration: row.get("applicant_registration"),
        created_date: row.get("created_date"),
        status_id: row.get("status_id"),
        opinion: row.get("opinion"),
        financial_effective_date: row.get("financial_effective_date"),
        closed_date: row.get("closed_date"),
        notes: row.get("notes"),
    }
}

fn row_to_record_sqlite(row: &sqlx::sqlite::SqliteRow) -> ProcessRecord {
    ProcessRecord {
        id: row.get("id"),
        protocol_number: row.get("protocol_number"),
        process_type: TypeRef {
            code: row.get("type_code"),
            name: row.get("type_name"),
        },
        applicant_name: row.get("applicant_name"),
        applicant_registration: row.get("applicant_registration"),
        created_date: row.get("created_date"),
        status: StatusRef {
            code: row.get("status_code"),
            label: row.get("status_label"),
        },
        opinion: row.get("opinion"),
        financial_effective_date: row.get("financial_effective_date"),
        closed_date: row.get("closed_date"),
        notes: row.get("notes"),
    }
}

fn row_to_summary_sqlite(row: &sqlx::sqlite::SqliteRow) -> ProcessSummary {
    ProcessSummary {
        id: row.get("id"),
        protocol_number: row.get("protocol_number"),
        type_code: row.get("type_code"),
        applicant_name: row.get("applicant_name"),
        created_date: row.get("created_date"),
        status_code: row.get("status_code"),
        financial_effective_date: row.get("financial_effective_date"),
    }
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_process_mysql(
    pool: &MySqlPool,
    process: &NewProcess,
    checklist: &[NewChecklistEntry],
    deadlines: &[NewProcessDeadline],
) -> Result<i64> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let id = sqlx::query(INSERT_PROCESS)
        .bind(&process.protocol_number)
        .bind(process.type_id)
        .bind(&process.applicant_name)
        .bind(&process.applicant_registration)
        .bind(process.created_date)
        .bind(process.status_id)
        .bind(&process.notes)
        .execute(&mut *tx)
        .await
        .context("Failed to insert process")?
        .last_insert_id() as i64;

    for entry in checklist {
        sqlx::query(INSERT_CHECKLIST_ENTRY)
            .bind(id)
            .bind(entry.document_id)
            .bind(entry.required)
            .execute(&mut *tx)
            .await
            .context("Failed to insert checklist entry")?;
    }

    for deadline in deadlines {
        sqlx::query(INSERT_DEADLINE)
            .bind(id)
            .bind(deadline.legal_deadline_id)
            .bind(deadline.due_date)
            .execute(&mut *tx)
            .await
            .context("Failed to insert process deadline")?;
    }

    tx.commit().await.context("Failed to commit process creation")?;
    Ok(id)
}

async fn provide_document_mysql(
    conn: &mut MySqlConnection,
    process_id: i64,
    document_id: i64,
    provided_date: NaiveDate,
    observations: Option<&str>,
    completion_rules: &[LegalDeadline],
) -> Result<Option<ProvideOutcome>> {
    let entry = sqlx::query(SELECT_ENTRY_ID)
        .bind(process_id)
        .bind(document_id)
        .fetch_optional(&mut *conn)
        .await
        .context("Failed to find checklist entry")?;
    let Some(entry) = entry else {
        return Ok(None);
    };
    let entry_id: i64 = entry.get("id");

    sqlx::query(MARK_PROVIDED)
        .bind(provided_date)
        .bind(observations)
        .bind(entry_id)
        .execute(&mut *conn)
        .await
        .context("Failed to mark document provided")?;

    let entries: Vec<ProcessDocument> = sqlx::query(SELECT_ENTRIES)
        .bind(process_id)
        .fetch_all(&mut *conn)
        .await
        .context("Failed to load checklist entries")?
        .iter()
        .map(|row| ProcessDocument {
            id: row.get("id"),
            process_id: row.get("process_id"),
            document_id: row.get("document_id"),
            required: row.get("required"),
            provided: row.get("provided"),
            provided_date: row.get("provided_date"),
            observations: row.get("observations"),
        })
        .collect();

    let completion = evaluate_completion(&entries);
    if !completion.all_provided {
        return Ok(Some(ProvideOutcome {
            all_provided: false,
            deadlines_created: 0,
        }));
    }

    let existing: HashSet<i64> = sqlx::query(SELECT_EXISTING_RULE_IDS)
        .bind(process_id)
        .fetch_all(&mut *conn)
        .await
        .context("Failed to load existing deadlines")?
        .iter()
        .map(|row| row.get("legal_deadline_id"))
        .collect();

    let reference = completion.reference_date.unwrap_or(provided_date);
    let mut created = 0;
    for deadline in plan_deadlines(&existing, completion_rules, reference) {
        created += sqlx::query(INSERT_DEADLINE_IF_ABSENT_MYSQL)
            .bind(process_id)
            .bind(deadline.legal_deadline_id)
            .bind(deadline.due_date)
            .execute(&mut *conn)
            .await
            .context("Failed to insert completion deadline")?
            .rows_affected() as usize;
    }

    Ok(Some(ProvideOutcome {
        all_provided: true,
        deadlines_created: created,
    }))
}

fn row_to_process_mysql(row: &sqlx::mysql::MySqlRow) -> Process {
    Process {
        id: row.get("id"),
        protocol_number: row.get("protocol_number"),
        type_id: row.get("type_id"),
        applicant_name: row.get("applicant_name"),
        applicant_registration: row.get("applicant_registration"),
        created_date: row.get("created_date"),
        status_id: row.get("status_id"),
        opinion: row.get("opinion"),
        financial_effective_date: row.get("financial_effective_date"),
        closed_date: row.get("closed_date"),
        notes: row.get("notes"),
    }
}

fn row_to_record_mysql(row: &sqlx::mysql::MySqlRow) -> ProcessRecord {
    ProcessRecord {
        id: row.get("id"),
        protocol_number: row.get("protocol_number"),
        process_type: TypeRef {
            code: row.get("type_code"),
            name: row.get("type_name"),
        },
        applicant_name: row.get("applicant_name"),
        applicant_registration: row.get("applicant_registration"),
        created_date: row.get("created_date"),
        status: StatusRef {
            code: row.get("status_code"),
            label: row.get("status_label"),
        },
        opinion: row.get("opinion"),
        financial_effective_date: row.get("financial_effective_date"),
        closed_date: row.get("closed_date"),
        notes: row.get("notes"),
    }
}

fn row_to_summary_mysql(row: &sqlx::mysql::MySqlRow) -> ProcessSummary {
    ProcessSummary {
        id: row.get("id"),
        protocol_number: row.get("protocol_number"),
        type_code: row.get("type_code"),
        applicant_name: row.get("applicant_name"),
        created_date: row.get("created_date"),
        status_code: row.get("status_code"),
        financial_effective_date: row.get("financial_effective_date"),
    }
}
