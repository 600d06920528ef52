//! In-memory `JobRepository`. Jobs are lost on restart.

use crate::domain::jobs::{Job, JobId, NewJob};
use crate::ports::repository::JobRepository;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
pub struct InMemoryJobStore {
    jobs: Mutex<HashMap<JobId, Job>>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    // Poisoning is ignored: a panicking mutator only ever touches its own job.
    fn lock(&self) -> MutexGuard<'_, HashMap<JobId, Job>> {
        self.jobs.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl JobRepository for InMemoryJobStore {
    fn create(&self, draft: NewJob) -> Job {
        let mut jobs = self.lock();
        let mut id = JobId::generate();
        while jobs.contains_key(&id) {
            id = JobId::generate();
        }
        let job = Job::new(id.clone(), draft, Utc::now());
        jobs.insert(id, job.clone());
        job
    }

    fn get(&self, id: &JobId) -> Option<Job> {
        self.lock().get(id).cloned()
    }

    fn update(&self, id: &JobId, mutator: &mut dyn FnMut(&mut Job)) -> Option<Job> {
        let mut jobs = self.lock();
        let job = jobs.get_mut(id)?;
        mutator(job);
        Some(job.clone())
    }

    fn delete(&self, id: &JobId) -> Option<Job> {
        self.lock().remove(id)
    }

    fn list(&self) -> Vec<Job> {
        self.lock().values().cloned().collect()
    }

    fn counts(&self) -> (usize, usize) {
        let jobs = self.lock();
        let active = jobs.values().filter(|j| !j.status.is_terminal()).count();
        (active, jobs.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::jobs::fixtures::new_job;
    use crate::domain::jobs::JobStatus;
    use std::sync::Arc;

    #[test]
    fn test_create_assigns_unique_queued_jobs() {
        let store = InMemoryJobStore::new();
        let a = store.create(new_job());
        let b = store.create(new_job());
        assert_ne!(a.job_id, b.job_id);
        assert_eq!(a.status, JobStatus::Queued);
        assert_eq!(store.counts(), (2, 2));
    }

    #[test]
    fn test_get_returns_snapshot() {
        let store = InMemoryJobStore::new();
        let job = store.create(new_job());

        let mut snapshot = store.get(&job.job_id).unwrap();
        snapshot.message = "scribbled on a copy".into();

        assert_eq!(
            store.get(&job.job_id).unwrap().message,
            "job queued for processing..."
        );
    }

    #[test]
    fn test_update_and_delete() {
        let store = InMemoryJobStore::new();
        let job = store.create(new_job());

        let updated = store
            .update(&job.job_id, &mut |j: &mut Job| {
                j.advance(JobStatus::Downloading, "downloading").unwrap();
            })
            .unwrap();
        assert_eq!(updated.status, JobStatus::Downloading);

        assert!(store.delete(&job.job_id).is_some());
        assert!(store.get(&job.job_id).is_none());
        assert!(store.update(&job.job_id, &mut |_: &mut Job| {}).is_none());
        assert!(store.delete(&job.job_id).is_none());
        assert_eq!(store.counts(), (0, 0));
    }

    #[test]
    fn test_counts_split_active_and_terminal() {
        let store = InMemoryJobStore::new();
        let done = store.create(new_job());
        store.create(new_job());
        store.update(&done.job_id, &mut |j: &mut Job| j.fail("boom").unwrap());
        assert_eq!(store.counts(), (1, 2));
    }

    #[test]
    fn test_concurrent_writers_on_distinct_jobs() {
        let store = Arc::new(InMemoryJobStore::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                std::thread::spawn(move || {
                    let job = store.create(new_job());
                    for status in [JobStatus::Downloading, JobStatus::Clipping] {
                        store.update(&job.job_id, &mut |j: &mut Job| j.advance(status, "").unwrap());
                    }
                    job.job_id
                })
            })
            .collect();

        for handle in handles {
            let id = handle.join().unwrap();
            assert_eq!(store.get(&id).unwrap().status, JobStatus::Clipping);
        }
        assert_eq!(store.list().len(), 8);
    }

    #[test]
    fn test_survives_poisoned_lock() {
        let store = Arc::new(InMemoryJobStore::new());
        let job = store.create(new_job());

        let poisoner = store.clone();
        let id = job.job_id.clone();
        let _ = std::thread::spawn(move || {
            poisoner.update(&id, &mut |_: &mut Job| panic!("executor crashed"));
        })
        .join();

        assert!(store.get(&job.job_id).is_some());
    }
}
