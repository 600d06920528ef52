//! Periodic eviction of old jobs and their files.

use super::cleanup::remove_job_files;
use crate::ports::repository::JobRepository;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval_at, Instant};
use tracing::{debug, info, warn};

/// Default age after which a job is evicted.
pub const JOB_RETENTION: Duration = Duration::from_secs(3600);

/// Default time between sweeps.
pub const CLEANUP_INTERVAL: Duration = Duration::from_secs(1800);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub evicted: usize,
    pub files_removed: usize,
}

pub struct Janitor {
    store: Arc<dyn JobRepository>,
    download_dir: PathBuf,
    retention: chrono::Duration,
    interval: Duration,
}

impl Janitor {
    pub fn new(
        store: Arc<dyn JobRepository>,
        download_dir: impl Into<PathBuf>,
        retention: Duration,
        interval: Duration,
    ) -> Self {
        let interval = if interval.is_zero() {
            warn!("Zero cleanup interval, using the default");
            CLEANUP_INTERVAL
        } else {
            interval
        };
        Self {
            store,
            download_dir: download_dir.into(),
            retention: chrono::Duration::from_std(retention)
                .unwrap_or(chrono::Duration::MAX),
            interval,
        }
    }

    /// Sweep forever. The first sweep happens one interval after start.
    ///
    /// Runs indefinitely and should be spawned as a background task.
    pub async fn run(&self) {
        info!(
            interval_secs = self.interval.as_secs(),
            retention_secs = self.retention.num_seconds(),
            "Starting janitor"
        );

        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        loop {
            ticker.tick().await;
            self.sweep().await;
        }
    }

    pub async fn sweep(&self) -> SweepReport {
        self.sweep_at(Utc::now()).await
    }

    /// Evict every job older than the retention period, whatever its status.
    /// A job still running when evicted keeps running; its record is gone.
    pub async fn sweep_at(&self, now: DateTime<Utc>) -> SweepReport {
        let mut report = SweepReport::default();

        let expired: Vec<_> = self
            .store
            .list()
            .into_iter()
            .filter(|job| job.age(now) > self.retention)
            .collect();

        for job in expired {
            report.files_removed += remove_job_files(&self.download_dir, &job).await;
            if self.store.delete(&job.job_id).is_some() {
                report.evicted += 1;
                debug!(job_id = %job.job_id, status = %job.status, "Evicted job");
            }
        }

        if report.evicted > 0 {
            info!(
                evicted = report.evicted,
                files_removed = report.files_removed,
                "Cleaned up old jobs"
            );
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::local::memory::InMemoryJobStore;
    use crate::domain::jobs::fixtures::new_job;
    use crate::domain::jobs::{Job, JobStatus};
    use tempfile::tempdir;

    fn janitor(store: Arc<InMemoryJobStore>, dir: &std::path::Path) -> Janitor {
        Janitor::new(store, dir, JOB_RETENTION, CLEANUP_INTERVAL)
    }

    #[tokio::test]
    async fn test_sweep_evicts_only_expired_jobs() {
        let dir = tempdir().unwrap();
        let store = Arc::new(InMemoryJobStore::new());
        let old = store.create(new_job());
        let running = store.create(new_job());
        let fresh = store.create(new_job());

        let clip = dir.path().join(format!("clip_{}_Test-Video_720p.mp4", old.job_id));
        std::fs::write(&clip, b"x").unwrap();
        store.update(&old.job_id, &mut |j: &mut Job| j.own(clip.clone()));
        let fragment = dir.path().join(format!("temp_{}.webm.part", running.job_id));
        std::fs::write(&fragment, b"x").unwrap();
        store.update(&running.job_id, &mut |j: &mut Job| {
            j.advance(JobStatus::Downloading, "downloading").unwrap()
        });
        let kept = dir.path().join(format!("clip_{}_Test-Video_720p.mp4", fresh.job_id));
        std::fs::write(&kept, b"x").unwrap();

        let two_hours_ago = Utc::now() - chrono::Duration::hours(2);
        for id in [&old.job_id, &running.job_id] {
            store.update(id, &mut |j: &mut Job| j.created_at = two_hours_ago);
        }

        let report = janitor(store.clone(), dir.path()).sweep().await;
        assert_eq!(
            report,
            SweepReport {
                evicted: 2,
                files_removed: 2
            }
        );
        assert!(store.get(&old.job_id).is_none());
        assert!(store.get(&running.job_id).is_none());
        assert!(store.get(&fresh.job_id).is_some());
        assert!(!clip.exists());
        assert!(!fragment.exists());
        assert!(kept.exists());
    }

    #[tokio::test]
    async fn test_retention_boundary() {
        let dir = tempdir().unwrap();
        let store = Arc::new(InMemoryJobStore::new());
        let job = store.create(new_job());
        let janitor = janitor(store.clone(), dir.path());

        let at_limit = job.created_at + chrono::Duration::seconds(3600);
        assert_eq!(janitor.sweep_at(at_limit).await.evicted, 0);

        let past_limit = at_limit + chrono::Duration::seconds(1);
        assert_eq!(janitor.sweep_at(past_limit).await.evicted, 1);
        assert!(store.list().is_empty());
    }

    #[tokio::test]
    async fn test_huge_retention_keeps_jobs() {
        let dir = tempdir().unwrap();
        let store = Arc::new(InMemoryJobStore::new());
        let job = store.create(new_job());
        let janitor = Janitor::new(
            store.clone(),
            dir.path(),
            Duration::from_secs(u64::MAX),
            CLEANUP_INTERVAL,
        );

        let much_later = job.created_at + chrono::Duration::days(365 * 100);
        assert_eq!(janitor.sweep_at(much_later).await.evicted, 0);
        assert_eq!(store.counts().1, 1);
    }

    #[tokio::test]
    async fn test_zero_interval_does_not_kill_the_loop() {
        let dir = tempdir().unwrap();
        let store = Arc::new(InMemoryJobStore::new());
        let janitor = Janitor::new(store, dir.path(), JOB_RETENTION, Duration::ZERO);
        let task = tokio::spawn(async move { janitor.run().await });

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!task.is_finished());
        task.abort();
    }

    #[tokio::test]
    async fn test_run_waits_one_interval() {
        let dir = tempdir().unwrap();
        let store = Arc::new(InMemoryJobStore::new());
        let job = store.create(new_job());
        store.update(&job.job_id, &mut |j: &mut Job| {
            j.created_at = Utc::now() - chrono::Duration::hours(2)
        });

        let janitor = Janitor::new(
            store.clone(),
            dir.path(),
            JOB_RETENTION,
            Duration::from_millis(100),
        );
        let task = tokio::spawn(async move { janitor.run().await });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(store.counts().1, 1);

        for _ in 0..100 {
            if store.counts().1 == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert_eq!(store.counts().1, 0);
        task.abort();
    }
}
