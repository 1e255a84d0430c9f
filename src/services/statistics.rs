//! Statistics service

use crate::db::repositories::{DeadlineRepository, ProcessRepository};
use crate::models::StatisticsSummary;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::sync::Arc;

use super::today;

/// Aggregate counters over processes and deadlines
pub struct StatisticsService {
    processes: Arc<dyn ProcessRepository>,
    deadlines: Arc<dyn DeadlineRepository>,
}

impl StatisticsService {
    pub fn new(processes: Arc<dyn ProcessRepository>, deadlines: Arc<dyn DeadlineRepository>) -> Self {
        Self {
            processes,
            deadlines,
        }
    }

    /// Summary as of today
    pub async fn summary(&self) -> Result<StatisticsSummary> {
        self.summary_as_of(today()).await
    }

    /// Totals, per-status counts (every status listed, zeros included) and
    /// the number of open deadlines past due on `today`
    pub async fn summary_as_of(&self, today: NaiveDate) -> Result<StatisticsSummary> {
        let total_processes = self
            .processes
            .count_all()
            .await
            .context("Failed to count processes")?;
        let by_status = self
            .processes
            .count_by_status()
            .await
            .context("Failed to count processes by status")?
            .into_iter()
            .collect();
        let overdue_deadlines = self
            .deadlines
            .count_overdue(today)
            .await
            .context("Failed to count overdue deadlines")?;

        Ok(StatisticsSummary {
            total_processes,
            by_status,
            overdue_deadlines,
            generated_at: today,
        })
    }
}
