use crate::domain::jobs::{Job, JobId, NewJob};

/// Process-wide job records.
///
/// Every method is a short critical section; callers must never hold on to
/// the store across slow work. Reads return snapshots.
pub trait JobRepository: Send + Sync {
    /// Insert a new `queued` job under a fresh identifier.
    fn create(&self, draft: NewJob) -> Job;

    fn get(&self, id: &JobId) -> Option<Job>;

    /// Apply `mutator` to the stored job and return the resulting snapshot.
    /// Only the job's own executor calls this.
    fn update(&self, id: &JobId, mutator: &mut dyn FnMut(&mut Job)) -> Option<Job>;

    /// Remove the record. Only the janitor calls this.
    fn delete(&self, id: &JobId) -> Option<Job>;

    fn list(&self) -> Vec<Job>;

    /// `(active, total)` job counts.
    fn counts(&self) -> (usize, usize);
}
