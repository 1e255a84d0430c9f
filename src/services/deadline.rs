//! Deadline service
//!
//! Overdue and upcoming reports plus the manual flags on deadline instances.

use crate::db::repositories::DeadlineRepository;
use crate::models::{OverdueDeadline, ProcessDeadline, UpcomingDeadline};
use anyhow::Context;
use chrono::{Days, NaiveDate};
use std::sync::Arc;

use super::today;

/// Default look-ahead for the upcoming report
pub const DEFAULT_UPCOMING_DAYS: u32 = 7;

/// Largest accepted look-ahead for the upcoming report
pub const MAX_UPCOMING_DAYS: u32 = 90;

/// Error types for deadline service operations
#[derive(Debug, thiserror::Error)]
pub enum DeadlineServiceError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Deadline not found: {0}")]
    NotFound(i64),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Deadline service
pub struct DeadlineService {
    repo: Arc<dyn DeadlineRepository>,
}

impl DeadlineService {
    pub fn new(repo: Arc<dyn DeadlineRepository>) -> Self {
        Self { repo }
    }

    /// Open deadlines past due today
    pub async fn list_overdue(&self) -> Result<Vec<OverdueDeadline>, DeadlineServiceError> {
        self.list_overdue_as_of(today()).await
    }

    /// Open deadlines with `due_date < today`, oldest first
    pub async fn list_overdue_as_of(
        &self,
        today: NaiveDate,
    ) -> Result<Vec<OverdueDeadline>, DeadlineServiceError> {
        let open = self
            .repo
            .list_overdue(today)
            .await
            .context("Failed to list overdue deadlines")?;

        Ok(open
            .into_iter()
            .map(|deadline| OverdueDeadline::from_open(deadline, today))
            .collect())
    }

    /// Open deadlines due within `days_ahead` days from today
    pub async fn list_upcoming(
        &self,
        days_ahead: u32,
    ) -> Result<Vec<UpcomingDeadline>, DeadlineServiceError> {
        self.list_upcoming_as_of(today(), days_ahead).await
    }

    /// Open deadlines with `today <= due_date <= today + days_ahead`
    ///
    /// # Errors
    /// - `ValidationError` unless `1 <= days_ahead <= 90`
    pub async fn list_upcoming_as_of(
        &self,
        today: NaiveDate,
        days_ahead: u32,
    ) -> Result<Vec<UpcomingDeadline>, DeadlineServiceError> {
        if !(1..=MAX_UPCOMING_DAYS).contains(&days_ahead) {
            return Err(DeadlineServiceError::ValidationError(format!(
                "days must be between 1 and {}, got {}",
                MAX_UPCOMING_DAYS, days_ahead
            )));
        }

        let end = today
            .checked_add_days(Days::new(u64::from(days_ahead)))
            .unwrap_or(NaiveDate::MAX);
        let open = self
            .repo
            .list_due_between(today, end)
            .await
            .context("Failed to list upcoming deadlines")?;

        Ok(open
            .into_iter()
            .map(|deadline| UpcomingDeadline::from_open(deadline, today))
            .collect())
    }

    /// Close a deadline. `notes`, when given, replace the stored notes.
    pub async fn close_deadline(
        &self,
        id: i64,
        notes: Option<&str>,
    ) -> Result<ProcessDeadline, DeadlineServiceError> {
        self.require(id).await?;
        self.repo.close(id, notes).await.context("Failed to close deadline")?;
        tracing::info!("Deadline {} closed", id);
        self.require(id).await
    }

    /// Flag a single deadline as notified
    pub async fn mark_notified(&self, id: i64) -> Result<ProcessDeadline, DeadlineServiceError> {
        self.require(id).await?;
        self.repo
            .mark_notified(id)
            .await
            .context("Failed to mark deadline notified")?;
        self.require(id).await
    }

    /// Flag every overdue, open, un-notified deadline as notified
    pub async fn notify_overdue(&self) -> Result<u64, DeadlineServiceError> {
        self.notify_overdue_as_of(today()).await
    }

    pub async fn notify_overdue_as_of(&self, today: NaiveDate) -> Result<u64, DeadlineServiceError> {
        let marked = self
            .repo
            .mark_overdue_notified(today)
            .await
            .context("Failed to mark overdue deadlines notified")?;
        if marked > 0 {
            tracing::info!("{} overdue deadline(s) marked as notified", marked);
        }
        Ok(marked)
    }

    async fn require(&self, id: i64) -> Result<ProcessDeadline, DeadlineServiceError> {
        self.repo
            .get_by_id(id)
            .await
            .context("Failed to load deadline")?
            .ok_or(DeadlineServiceError::NotFound(id))
    }
}
