//! C8 (§4.8): a daily job that deletes journeys whose `update_time` has
//! aged out of the retention window, in batches bounded by the database's
//! bind-parameter limit. Referential integrity (`ON DELETE CASCADE` in the
//! `database` crate's migrations) removes events and vehicle sequences.

use std::{sync::Arc, time::Instant};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use model::ids::Journey;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};
use utility::id::Id;

pub const DEFAULT_CRON: &str = "0 0 5 * * *";
pub const DEFAULT_RETENTION_DAYS: i64 = 90;
pub const DEFAULT_BATCH_LIMIT: usize = 30_000;

/// Narrow repository seam so this crate never depends on `database`
/// directly, the same decoupling `collector` uses for its own repository
/// traits.
#[async_trait]
pub trait HousekeepingRepository: Send + Sync {
    async fn find_stale_journey_ids(&self, older_than: DateTime<Utc>, limit: usize) -> Result<Vec<Id<Journey>>, String>;
    async fn delete_journeys(&self, ids: &[Id<Journey>]) -> Result<u64, String>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RunReport {
    pub deleted: u64,
    pub batches: u32,
}

#[derive(Debug)]
pub enum HousekeepingError {
    Repository(String),
    Schedule(JobSchedulerError),
}

impl std::fmt::Display for HousekeepingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HousekeepingError::Repository(err) => write!(f, "housekeeping repository error: {err}"),
            HousekeepingError::Schedule(err) => write!(f, "housekeeping schedule error: {err}"),
        }
    }
}

impl std::error::Error for HousekeepingError {}

/// Runs one retention pass: repeatedly fetches up to `batch_limit` stale
/// journey ids and deletes them, until a fetch returns fewer than the
/// batch limit (§4.8 "deletes them in batches").
pub async fn run_once(repository: &dyn HousekeepingRepository, retention_days: i64, batch_limit: usize) -> Result<RunReport, HousekeepingError> {
    let cutoff = Utc::now() - chrono::Duration::days(retention_days);
    let start = Instant::now();
    let mut report = RunReport::default();

    loop {
        let ids = repository.find_stale_journey_ids(cutoff, batch_limit).await.map_err(HousekeepingError::Repository)?;
        if ids.is_empty() {
            break;
        }
        let batch_size = ids.len();
        let deleted = repository.delete_journeys(&ids).await.map_err(HousekeepingError::Repository)?;
        report.deleted += deleted;
        report.batches += 1;

        tracing::info!(deleted, batch = report.batches, "housekeeping batch complete");

        if batch_size < batch_limit {
            break;
        }
    }

    tracing::info!(total_deleted = report.deleted, batches = report.batches, elapsed_ms = start.elapsed().as_millis() as u64, "housekeeping run complete");

    Ok(report)
}

/// Starts the daily cron job on `scheduler`. The scheduler itself is owned
/// and started by the composition root (`crates/app`).
pub async fn schedule(
    scheduler: &JobScheduler,
    cron_expression: &str,
    repository: Arc<dyn HousekeepingRepository>,
    retention_days: i64,
    batch_limit: usize,
) -> Result<(), HousekeepingError> {
    let job = Job::new_async(cron_expression, move |_uuid, _lock| {
        let repository = repository.clone();
        Box::pin(async move {
            if let Err(err) = run_once(repository.as_ref(), retention_days, batch_limit).await {
                tracing::error!(error = %err, "housekeeping run failed");
            }
        })
    })
    .map_err(HousekeepingError::Schedule)?;

    scheduler.add(job).await.map_err(HousekeepingError::Schedule)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct FakeRepository {
        remaining: Mutex<Vec<Id<Journey>>>,
    }

    #[async_trait]
    impl HousekeepingRepository for FakeRepository {
        async fn find_stale_journey_ids(&self, _older_than: DateTime<Utc>, limit: usize) -> Result<Vec<Id<Journey>>, String> {
            let mut remaining = self.remaining.lock().unwrap();
            let take = limit.min(remaining.len());
            Ok(remaining.drain(0..take).collect())
        }

        async fn delete_journeys(&self, ids: &[Id<Journey>]) -> Result<u64, String> {
            Ok(ids.len() as u64)
        }
    }

    fn journey_id(n: u32) -> Id<Journey> {
        Id::from_name(uuid::Uuid::nil(), &format!("journey-{n}"))
    }

    #[tokio::test]
    async fn deletes_in_batches_bounded_by_the_limit() {
        let repository = FakeRepository { remaining: Mutex::new((0..25).map(journey_id).collect()) };
        let report = run_once(&repository, DEFAULT_RETENTION_DAYS, 10).await.unwrap();
        assert_eq!(report.deleted, 25);
        assert_eq!(report.batches, 3);
    }

    #[tokio::test]
    async fn empty_backlog_runs_zero_batches() {
        let repository = FakeRepository { remaining: Mutex::new(Vec::new()) };
        let report = run_once(&repository, DEFAULT_RETENTION_DAYS, 10).await.unwrap();
        assert_eq!(report.deleted, 0);
        assert_eq!(report.batches, 0);
    }
}
