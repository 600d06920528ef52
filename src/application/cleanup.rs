//! Best-effort removal of job files. Failures are logged, never returned.

use crate::domain::artifact::ArtifactNames;
use crate::domain::jobs::{Job, JobId};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Remove one file; a missing file counts as already removed.
pub async fn remove_file_logged(path: &Path) -> bool {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {
            debug!(path = %path.display(), "Removed file");
            true
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => false,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to remove file");
            false
        }
    }
}

/// Remove the files a job registered as its own.
pub async fn remove_owned(paths: &[PathBuf]) -> usize {
    let mut removed = 0;
    for path in paths {
        if remove_file_logged(path).await {
            removed += 1;
        }
    }
    removed
}

/// Files in `dir` whose name satisfies `matches`.
pub async fn scan_dir(dir: &Path, matches: impl Fn(&str) -> bool) -> io::Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(found),
        Err(e) => return Err(e),
    };
    while let Some(entry) = entries.next_entry().await? {
        if let Some(name) = entry.file_name().to_str() {
            if matches(name) {
                found.push(entry.path());
            }
        }
    }
    found.sort();
    Ok(found)
}

/// Remove everything a job owns, plus any stray file in `dir` carrying its id
/// (resolver fragments the job never registered).
pub async fn remove_job_files(dir: &Path, job: &Job) -> usize {
    remove_owned(&job.artifacts).await + remove_id_files(dir, &job.job_id).await
}

/// Remove every file in `dir` whose name carries `job_id`. Works without the
/// job record.
pub async fn remove_id_files(dir: &Path, job_id: &JobId) -> usize {
    let names = ArtifactNames::new(job_id);
    match scan_dir(dir, |name| names.owns(name)).await {
        Ok(strays) => remove_owned(&strays).await,
        Err(e) => {
            warn!(
                job_id = %job_id,
                dir = %dir.display(),
                error = %e,
                "Cleanup scan failed"
            );
            0
        }
    }
}
