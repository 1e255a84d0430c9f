//! Services layer - Business logic
//!
//! Services sit between the HTTP/CLI surfaces and the repositories:
//! - Validating input and resolving catalog codes
//! - Running the checklist and deadline rules
//! - Translating storage failures into service errors

pub mod catalog;
pub mod deadline;
pub mod process;
pub mod statistics;

pub use catalog::{CatalogService, SeedReport};
pub use deadline::{DeadlineService, DeadlineServiceError, DEFAULT_UPCOMING_DAYS, MAX_UPCOMING_DAYS};
pub use process::{ProcessService, ProcessServiceError};
pub use statistics::StatisticsService;

use chrono::NaiveDate;
use std::sync::Arc;

use crate::db::repositories::{
    SqlxDeadlineRepository, SqlxDocumentRepository, SqlxLegalDeadlineRepository,
    SqlxProcessRepository, SqlxProcessTypeRepository, SqlxStatusRepository,
};
use crate::db::DynDatabasePool;

/// Date format accepted on every input surface
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Current local calendar date
pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// Parse a `YYYY-MM-DD` date, naming the offending field on failure
pub fn parse_date(field: &str, raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map_err(|_| format!("{} must be a date in YYYY-MM-DD format, got '{}'", field, raw))
}

/// All services wired to one pool
#[derive(Clone)]
pub struct Services {
    pub process: Arc<ProcessService>,
    pub deadline: Arc<DeadlineService>,
    pub statistics: Arc<StatisticsService>,
    pub catalog: Arc<CatalogService>,
}

impl Services {
    pub fn new(pool: DynDatabasePool) -> Self {
        let types = SqlxProcessTypeRepository::boxed(pool.clone());
        let statuses = SqlxStatusRepository::boxed(pool.clone());
        let documents = SqlxDocumentRepository::boxed(pool.clone());
        let rules = SqlxLegalDeadlineRepository::boxed(pool.clone());
        let processes = SqlxProcessRepository::boxed(pool.clone());
        let deadlines = SqlxDeadlineRepository::boxed(pool);

        Self {
            process: Arc::new(ProcessService::new(
                types.clone(),
                statuses.clone(),
                documents.clone(),
                rules.clone(),
                processes.clone(),
            )),
            deadline: Arc::new(DeadlineService::new(deadlines.clone())),
            statistics: Arc::new(StatisticsService::new(processes, deadlines)),
            catalog: Arc::new(CatalogService::new(types, statuses, documents, rules)),
        }
    }
}
