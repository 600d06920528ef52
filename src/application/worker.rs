use super::cleanup::{remove_file_logged, remove_id_files, remove_job_files, scan_dir};
use crate::domain::artifact::{ArtifactNames, MIN_CLIP_BYTES};
use crate::domain::jobs::{Artifact, Job, JobId, JobStatus};
use crate::domain::timecode::validate_time_range;
use crate::error::JobError;
use crate::ports::clipper::{ClipRequest, Clipper};
use crate::ports::repository::JobRepository;
use crate::ports::resolver::SourceResolver;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Default wall-clock limit for one clip step.
pub const CLIP_TIMEOUT: Duration = Duration::from_secs(300);

const PANIC_MESSAGE: &str = "Internal error while processing job";

#[derive(Debug, Clone)]
pub struct ExecutorSettings {
    pub download_dir: PathBuf,
    pub clip_timeout: Duration,
}

impl ExecutorSettings {
    pub fn new(download_dir: impl Into<PathBuf>) -> Self {
        Self {
            download_dir: download_dir.into(),
            clip_timeout: CLIP_TIMEOUT,
        }
    }
}

/// Drives each job from `queued` to a terminal state.
///
/// Every job runs in its own task and is the only writer of its record. Slow
/// steps (download, clip) run with no store lock held.
pub struct JobExecutor {
    store: Arc<dyn JobRepository>,
    resolver: Arc<dyn SourceResolver>,
    clipper: Arc<dyn Clipper>,
    settings: ExecutorSettings,
}

impl JobExecutor {
    pub fn new(
        store: Arc<dyn JobRepository>,
        resolver: Arc<dyn SourceResolver>,
        clipper: Arc<dyn Clipper>,
        settings: ExecutorSettings,
    ) -> Self {
        Self {
            store,
            resolver,
            clipper,
            settings,
        }
    }

    pub fn download_dir(&self) -> &Path {
        &self.settings.download_dir
    }

    /// Run the job on its own task. A panic inside the job moves it to `error`
    /// instead of leaving it stuck.
    pub fn spawn(self: &Arc<Self>, job_id: JobId) -> JoinHandle<()> {
        let executor = Arc::clone(self);
        let id = job_id.clone();
        let task = tokio::spawn(async move {
            executor.run(&id).await;
        });

        let executor = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(e) = task.await {
                if e.is_panic() {
                    error!(job_id = %job_id, "Job task panicked");
                    executor.abort(&job_id, PANIC_MESSAGE).await;
                }
            }
        })
    }

    /// Execute the job to completion and return its final status, or `None`
    /// if the record is gone.
    pub async fn run(&self, job_id: &JobId) -> Option<JobStatus> {
        let job = match self.store.get(job_id) {
            Some(job) => job,
            None => {
                warn!(job_id = %job_id, "Job vanished before it started");
                return None;
            }
        };

        info!(
            job_id = %job_id,
            url = %job.url,
            start = %job.start_time,
            end = %job.end_time,
            quality = %job.quality,
            "Starting job"
        );

        match self.execute(&job).await {
            Ok(artifact) => self.finish(job_id, artifact).await,
            Err(e) => self.abort(job_id, &e.to_string()).await,
        }
    }

    async fn execute(&self, job: &Job) -> Result<Artifact, JobError> {
        let id = &job.job_id;
        let names = ArtifactNames::new(id);
        let dir = self.download_dir();

        self.transition(
            id,
            JobStatus::Downloading,
            format!("downloading video in {}...", job.quality),
        );
        tokio::fs::create_dir_all(dir).await?;

        let selector = job.quality.format_selector();
        self.resolver
            .download(&job.url, &selector, &names.temp_template(dir))
            .await
            .map_err(|e| JobError::DownloadFailed(e.cause()))?;

        let range = validate_time_range(&job.start_time, &job.end_time, job.video_info.duration)?;

        let downloaded = locate_download(dir, &names).await?;
        self.own(id, downloaded.clone());
        info!(job_id = %id, file = %downloaded.display(), "Found downloaded file");

        self.transition(id, JobStatus::Clipping, "creating clip...");

        let filename = names.clip_filename(&job.video_info.title, job.quality);
        let output = dir.join(&filename);
        self.own(id, output.clone());

        let request = ClipRequest {
            input: downloaded.clone(),
            output: output.clone(),
            start: range.start,
            duration: range.duration,
        };
        info!(job_id = %id, start = range.start, end = range.end, "Creating clip");

        match tokio::time::timeout(self.settings.clip_timeout, self.clipper.clip(&request)).await
        {
            Err(_) => {
                return Err(JobError::ClippingFailed(format!(
                    "timed out after {} seconds",
                    self.settings.clip_timeout.as_secs()
                )))
            }
            Ok(Err(e)) => return Err(JobError::ClippingFailed(e.cause())),
            Ok(Ok(())) => {}
        }

        let size = match tokio::fs::metadata(&output).await {
            Ok(meta) => meta.len(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(JobError::OutputMissing),
            Err(e) => return Err(e.into()),
        };
        if size < MIN_CLIP_BYTES {
            return Err(JobError::OutputTooSmall { size });
        }

        if remove_file_logged(&downloaded).await {
            self.store
                .update(id, &mut |j: &mut Job| j.disown(&downloaded));
        }

        Ok(Artifact {
            path: output,
            filename,
            size,
        })
    }

    async fn finish(&self, job_id: &JobId, artifact: Artifact) -> Option<JobStatus> {
        let mut outcome = Ok(());
        let updated = self
            .store
            .update(job_id, &mut |j: &mut Job| outcome = j.complete(&artifact));

        match (updated, outcome) {
            (Some(job), Ok(())) => {
                info!(
                    job_id = %job_id,
                    file = %artifact.filename,
                    size_mb = artifact.size as f64 / (1024.0 * 1024.0),
                    "Job completed"
                );
                Some(job.status)
            }
            (Some(job), Err(e)) => {
                warn!(job_id = %job_id, error = %e, "Could not record completion");
                Some(job.status)
            }
            (None, _) => {
                // Evicted mid-run: nothing owns the clip any more.
                warn!(job_id = %job_id, "Job evicted before completion, discarding clip");
                remove_file_logged(&artifact.path).await;
                None
            }
        }
    }

    /// Move the job to `error` and remove whatever files it left behind.
    async fn abort(&self, job_id: &JobId, message: &str) -> Option<JobStatus> {
        error!(job_id = %job_id, error = message, "Job failed");

        let mut snapshot = None;
        let updated = self.store.update(job_id, &mut |j: &mut Job| {
            if let Err(e) = j.fail(message) {
                warn!(job_id = %j.job_id, error = %e, "Not marking job as failed");
            }
            snapshot = Some(j.clone());
        });

        let removed = match &snapshot {
            Some(job) if job.status == JobStatus::Error => {
                let removed = remove_job_files(self.download_dir(), job).await;
                self.store
                    .update(job_id, &mut |j: &mut Job| j.artifacts.clear());
                removed
            }
            Some(_) => 0,
            None => {
                // Evicted mid-run: only the id in the file names is left.
                warn!(job_id = %job_id, "Job evicted before failing, removing its files");
                remove_id_files(self.download_dir(), job_id).await
            }
        };
        if removed > 0 {
            info!(job_id = %job_id, removed, "Cleaned up job files");
        }
        updated.map(|j| j.status)
    }

    fn transition(&self, id: &JobId, next: JobStatus, message: impl Into<String>) {
        let message = message.into();
        let mut outcome = Ok(());
        let updated = self.store.update(id, &mut |j: &mut Job| {
            outcome = j.advance(next, message.clone());
        });
        match (updated, outcome) {
            (None, _) => warn!(job_id = %id, status = %next, "Job evicted while running"),
            (Some(_), Err(e)) => warn!(job_id = %id, error = %e, "Rejected status change"),
            (Some(_), Ok(())) => info!(job_id = %id, status = %next, "Job status changed"),
        }
    }

    fn own(&self, id: &JobId, path: PathBuf) {
        self.store.update(id, &mut |j: &mut Job| j.own(path.clone()));
    }
}

/// Find the resolver's output; it chooses the extension.
async fn locate_download(dir: &Path, names: &ArtifactNames<'_>) -> Result<PathBuf, JobError> {
    let prefix = names.temp_prefix();
    let candidates = scan_dir(dir, |name| {
        name.starts_with(&prefix) && !name.ends_with(".part") && !name.ends_with(".ytdl")
    })
    .await?;

    candidates
        .into_iter()
        .next()
        .ok_or(JobError::DownloadMissing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::local::memory::InMemoryJobStore;
    use crate::domain::jobs::fixtures::new_job;
    use crate::domain::jobs::NewJob;
    use crate::error::{MediaError, MediaResult};
    use crate::ports::clipper::MockClipper;
    use crate::ports::resolver::MockSourceResolver;
    use async_trait::async_trait;
    use tempfile::{tempdir, TempDir};

    /// Resolver that writes `bytes` to the template with an `.mp4` extension.
    fn downloading_resolver(bytes: usize) -> MockSourceResolver {
        let mut resolver = MockSourceResolver::new();
        resolver
            .expect_download()
            .times(1)
            .returning(move |_, _, template| {
                let path = template.to_string_lossy().replace("%(ext)s", "mp4");
                std::fs::write(path, vec![0u8; bytes])?;
                Ok(())
            });
        resolver
    }

    /// Clipper that writes `bytes` to the requested output.
    fn writing_clipper(bytes: usize) -> MockClipper {
        let mut clipper = MockClipper::new();
        clipper.expect_clip().times(1).returning(move |req| {
            std::fs::write(&req.output, vec![1u8; bytes])?;
            Ok(())
        });
        clipper
    }

    struct Harness {
        dir: TempDir,
        store: Arc<InMemoryJobStore>,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                dir: tempdir().unwrap(),
                store: Arc::new(InMemoryJobStore::new()),
            }
        }

        fn executor(
            &self,
            resolver: impl SourceResolver + 'static,
            clipper: impl Clipper + 'static,
        ) -> Arc<JobExecutor> {
            let mut settings = ExecutorSettings::new(self.dir.path());
            settings.clip_timeout = Duration::from_millis(200);
            Arc::new(JobExecutor::new(
                self.store.clone(),
                Arc::new(resolver),
                Arc::new(clipper),
                settings,
            ))
        }

        fn submit(&self, draft: NewJob) -> JobId {
            self.store.create(draft).job_id
        }

        fn files(&self) -> Vec<String> {
            let mut names: Vec<String> = std::fs::read_dir(self.dir.path())
                .unwrap()
                .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
                .collect();
            names.sort();
            names
        }
    }

    #[tokio::test]
    async fn test_happy_path_completes_and_removes_temp() {
        let h = Harness::new();
        let id = h.submit(new_job());
        let executor = h.executor(downloading_resolver(10_000), writing_clipper(4096));

        assert_eq!(executor.run(&id).await, Some(JobStatus::Completed));

        let job = h.store.get(&id).unwrap();
        let expected = format!("clip_{}_Test-Video_720p.mp4", id);
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.message, "clip ready for download!");
        assert_eq!(job.download_url, Some(format!("/download/{}", id)));
        assert_eq!(job.filename.as_deref(), Some(expected.as_str()));
        assert_eq!(job.file_size, Some(4096));
        assert_eq!(job.artifacts, vec![h.dir.path().join(&expected)]);
        assert_eq!(h.files(), vec![expected]);
    }

    #[tokio::test]
    async fn test_collaborators_receive_job_parameters() {
        let h = Harness::new();
        let id = h.submit(new_job());
        let store = h.store.clone();
        let seen_id = id.clone();

        let mut resolver = MockSourceResolver::new();
        resolver
            .expect_download()
            .times(1)
            .returning(move |url, selector, template| {
                assert_eq!(url.to_string(), "https://youtu.be/abc123");
                assert_eq!(selector.to_string(), "bestvideo[height=720]+bestaudio/best");
                assert_eq!(
                    store.get(&seen_id).unwrap().status,
                    JobStatus::Downloading
                );
                let path = template.to_string_lossy().replace("%(ext)s", "webm");
                std::fs::write(path, b"video")?;
                Ok(())
            });

        let store = h.store.clone();
        let seen_id = id.clone();
        let mut clipper = MockClipper::new();
        clipper.expect_clip().times(1).returning(move |req| {
            assert_eq!((req.start, req.duration), (10, 30));
            assert!(req.input.to_string_lossy().ends_with(".webm"));
            assert_eq!(store.get(&seen_id).unwrap().status, JobStatus::Clipping);
            std::fs::write(&req.output, vec![0u8; 2048])?;
            Ok(())
        });

        assert_eq!(h.store.get(&id).unwrap().status, JobStatus::Queued);
        assert_eq!(h.executor(resolver, clipper).run(&id).await, Some(JobStatus::Completed));
    }

    #[tokio::test]
    async fn test_download_failure() {
        let h = Harness::new();
        let id = h.submit(new_job());

        let mut resolver = MockSourceResolver::new();
        resolver.expect_download().times(1).returning(|_, _, template| {
            let partial = template.to_string_lossy().replace("%(ext)s", "mp4.part");
            std::fs::write(partial, b"half")?;
            Err(MediaError::process_failed("yt-dlp", "ERROR: HTTP Error 403", Some(1)))
        });
        let mut clipper = MockClipper::new();
        clipper.expect_clip().times(0);

        assert_eq!(h.executor(resolver, clipper).run(&id).await, Some(JobStatus::Error));
        let job = h.store.get(&id).unwrap();
        assert_eq!(job.message, "Download failed: ERROR: HTTP Error 403");
        assert!(h.files().is_empty());
    }

    #[tokio::test]
    async fn test_missing_download() {
        let h = Harness::new();
        let id = h.submit(new_job());

        let mut resolver = MockSourceResolver::new();
        resolver.expect_download().times(1).returning(|_, _, _| Ok(()));
        let mut clipper = MockClipper::new();
        clipper.expect_clip().times(0);

        h.executor(resolver, clipper).run(&id).await;
        assert_eq!(h.store.get(&id).unwrap().message, "Downloaded file not found");
    }

    #[tokio::test]
    async fn test_range_is_rechecked_after_download() {
        let h = Harness::new();
        let mut draft = new_job();
        draft.end_time = "5:00".into();
        let id = h.submit(draft);

        let mut clipper = MockClipper::new();
        clipper.expect_clip().times(0);

        h.executor(downloading_resolver(100), clipper).run(&id).await;
        let job = h.store.get(&id).unwrap();
        assert_eq!(job.status, JobStatus::Error);
        assert_eq!(job.message, "End time exceeds video duration");
        assert!(h.files().is_empty());
    }

    #[tokio::test]
    async fn test_clipper_failure_reports_stderr_and_cleans_up() {
        let h = Harness::new();
        let id = h.submit(new_job());

        let mut clipper = MockClipper::new();
        clipper.expect_clip().times(1).returning(|req| {
            std::fs::write(&req.output, b"partial")?;
            Err(MediaError::process_failed(
                "ffmpeg",
                "Invalid data found when processing input\n",
                Some(1),
            ))
        });

        h.executor(downloading_resolver(100), clipper).run(&id).await;
        let job = h.store.get(&id).unwrap();
        assert_eq!(job.status, JobStatus::Error);
        assert_eq!(
            job.message,
            "Video processing failed: Invalid data found when processing input"
        );
        assert!(job.artifacts.is_empty());
        assert!(h.files().is_empty());
    }

    #[tokio::test]
    async fn test_tiny_output_is_rejected() {
        let h = Harness::new();
        let id = h.submit(new_job());

        h.executor(downloading_resolver(100), writing_clipper(1023))
            .run(&id)
            .await;
        let job = h.store.get(&id).unwrap();
        assert_eq!(
            job.message,
            "Output file is too small - processing may have failed"
        );
        assert!(h.files().is_empty());
    }

    #[tokio::test]
    async fn test_output_not_created() {
        let h = Harness::new();
        let id = h.submit(new_job());

        let mut clipper = MockClipper::new();
        clipper.expect_clip().times(1).returning(|_| Ok(()));

        h.executor(downloading_resolver(100), clipper).run(&id).await;
        assert_eq!(h.store.get(&id).unwrap().message, "Output file was not created");
    }

    struct StalledClipper;

    #[async_trait]
    impl Clipper for StalledClipper {
        async fn clip(&self, _request: &ClipRequest) -> MediaResult<()> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_clip_timeout() {
        let h = Harness::new();
        let id = h.submit(new_job());

        h.executor(downloading_resolver(100), StalledClipper)
            .run(&id)
            .await;
        let job = h.store.get(&id).unwrap();
        assert_eq!(job.status, JobStatus::Error);
        assert!(job.message.starts_with("Video processing failed: timed out"));
        assert!(h.files().is_empty());
    }

    struct PanickingClipper;

    #[async_trait]
    impl Clipper for PanickingClipper {
        async fn clip(&self, _request: &ClipRequest) -> MediaResult<()> {
            panic!("clipper bug");
        }
    }

    #[tokio::test]
    async fn test_panic_is_isolated_to_its_job() {
        let h = Harness::new();
        let broken = h.submit(new_job());
        let healthy = h.submit(new_job());

        let crashing = h.executor(downloading_resolver(100), PanickingClipper);
        let working = h.executor(downloading_resolver(100), writing_clipper(2048));

        let (a, b) = tokio::join!(crashing.spawn(broken.clone()), working.spawn(healthy.clone()));
        a.unwrap();
        b.unwrap();

        let broken = h.store.get(&broken).unwrap();
        assert_eq!(broken.status, JobStatus::Error);
        assert_eq!(broken.message, PANIC_MESSAGE);
        assert_eq!(h.store.get(&healthy).unwrap().status, JobStatus::Completed);
        assert_eq!(h.files().len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_jobs_same_url_never_collide() {
        let h = Harness::new();
        let ids: Vec<JobId> = (0..4).map(|_| h.submit(new_job())).collect();

        let mut resolver = MockSourceResolver::new();
        resolver.expect_download().times(4).returning(|_, _, template| {
            let path = template.to_string_lossy().replace("%(ext)s", "mp4");
            std::fs::write(path, b"video")?;
            Ok(())
        });
        let mut clipper = MockClipper::new();
        clipper.expect_clip().times(4).returning(|req| {
            std::fs::write(&req.output, vec![0u8; 2048])?;
            Ok(())
        });
        let executor = h.executor(resolver, clipper);

        let handles: Vec<_> = ids.iter().map(|id| executor.spawn(id.clone())).collect();
        for handle in futures::future::join_all(handles).await {
            handle.unwrap();
        }

        let mut filenames: Vec<String> = ids
            .iter()
            .map(|id| h.store.get(id).unwrap().filename.unwrap())
            .collect();
        filenames.sort();
        filenames.dedup();
        assert_eq!(filenames.len(), 4);
        assert_eq!(h.files(), filenames);
    }

    #[tokio::test]
    async fn test_failure_after_eviction_still_removes_files() {
        let h = Harness::new();
        let id = h.submit(new_job());

        let store = h.store.clone();
        let evicted = id.clone();
        let mut resolver = MockSourceResolver::new();
        resolver
            .expect_download()
            .times(1)
            .returning(move |_, _, template| {
                let path = template.to_string_lossy().replace("%(ext)s", "mp4");
                std::fs::write(path, b"video")?;
                store.delete(&evicted);
                Ok(())
            });
        let mut clipper = MockClipper::new();
        clipper.expect_clip().times(1).returning(|req| {
            std::fs::write(&req.output, b"partial")?;
            Err(MediaError::process_failed("ffmpeg", "Conversion failed!", Some(1)))
        });

        assert_eq!(h.executor(resolver, clipper).run(&id).await, None);
        assert!(h.store.get(&id).is_none());
        assert!(h.files().is_empty());
    }

    #[tokio::test]
    async fn test_completion_after_eviction_discards_clip() {
        let h = Harness::new();
        let id = h.submit(new_job());

        let store = h.store.clone();
        let evicted = id.clone();
        let mut clipper = MockClipper::new();
        clipper.expect_clip().times(1).returning(move |req| {
            std::fs::write(&req.output, vec![0u8; 2048])?;
            store.delete(&evicted);
            Ok(())
        });

        assert_eq!(
            h.executor(downloading_resolver(100), clipper).run(&id).await,
            None
        );
        assert!(h.store.get(&id).is_none());
        assert!(h.files().is_empty());
    }

    #[tokio::test]
    async fn test_vanished_job_is_skipped() {
        let h = Harness::new();
        let mut resolver = MockSourceResolver::new();
        resolver.expect_download().times(0);
        let mut clipper = MockClipper::new();
        clipper.expect_clip().times(0);

        let executor = h.executor(resolver, clipper);
        assert_eq!(executor.run(&JobId::from("nope")).await, None);
    }
}
