use log::{info, warn};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::errors::DbResult;

use super::repository::ExportLogRepository;
use super::reshape::reshape;
use super::schemas::measurement_batch;
use super::types::{
    ExportError, ExportJob, ExportedFile, JobFailure, JobStage, LocationDay, EXPORT_FIELDS,
};
use super::writer::{partition_key, ExportWriter};

/// Logs the time spent on one job when dropped, whichever way the job ends.
struct ExportTimer {
    job: ExportJob,
    start: Instant,
}

impl ExportTimer {
    fn start(job: ExportJob) -> Self {
        Self {
            job,
            start: Instant::now(),
        }
    }
}

impl Drop for ExportTimer {
    fn drop(&mut self) {
        info!(
            "export seconds: {:.4} ({})",
            self.start.elapsed().as_secs_f64(),
            self.job
        );
    }
}

/// Runs export jobs one after another against a single store and destination.
pub struct ExportService {
    repo: Arc<dyn ExportLogRepository>,
    writer: ExportWriter,
    limit: i64,
    job_timeout: Option<Duration>,
}

impl std::fmt::Debug for ExportService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportService")
            .field("repo", &"<ExportLogRepository>")
            .field("format", &self.writer.format())
            .field("limit", &self.limit)
            .field("job_timeout", &self.job_timeout)
            .finish()
    }
}

impl ExportService {
    pub fn new(repo: Arc<dyn ExportLogRepository>, writer: ExportWriter, limit: i64) -> Self {
        Self {
            repo,
            writer,
            limit,
            job_timeout: None,
        }
    }

    /// Abandon any job still running after `timeout`. `None` waits indefinitely.
    pub fn with_job_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.job_timeout = timeout;
        self
    }

    /// Export one location/day: fetch, reshape, write, then mark it exported.
    ///
    /// Failures are logged and returned, never propagated as panics, so a
    /// caller iterating over many jobs can simply carry on.
    pub async fn export_data(&self, job: ExportJob) -> Result<ExportedFile, JobFailure> {
        let _timer = ExportTimer::start(job);

        let outcome = match self.job_timeout {
            Some(timeout) => match tokio::time::timeout(timeout, self.run_job(job)).await {
                Ok(outcome) => outcome,
                Err(_) => Err(JobFailure {
                    job,
                    stage: None,
                    source: ExportError::Timeout(timeout),
                }),
            },
            None => self.run_job(job).await,
        };

        match &outcome {
            Ok(file) => info!("exported {} rows for {} to {}", file.rows, job, file.key),
            Err(failure) => warn!("Error processing {}", failure),
        }
        outcome
    }

    async fn run_job(&self, job: ExportJob) -> Result<ExportedFile, JobFailure> {
        let rows = self
            .repo
            .fetch_measurements(&job)
            .await
            .map_err(|e| JobFailure::at(job, JobStage::Fetch, e.into()))?;

        // The partition country comes from the first row.
        let first = rows
            .first()
            .ok_or_else(|| JobFailure::at(job, JobStage::Reshape, ExportError::NoMeasurements))?;
        let country = first
            .country
            .clone()
            .ok_or_else(|| JobFailure::at(job, JobStage::Reshape, ExportError::MissingCountry))?;

        let table = measurement_batch(&rows)
            .and_then(|table| reshape(table, &EXPORT_FIELDS))
            .map_err(|e| JobFailure::at(job, JobStage::Reshape, e))?;

        let key = partition_key(self.writer.format(), &country, &job);
        let file = self
            .writer
            .write(&job, &table, &key)
            .await
            .map_err(|e| JobFailure::at(job, JobStage::Write, e))?;

        self.repo
            .mark_exported(&job)
            .await
            .map_err(|e| JobFailure::at(job, JobStage::MarkExported, e.into()))?;

        Ok(file)
    }

    /// Export up to `limit` pending location/days, in the order the store returns them.
    ///
    /// Returns every job that was attempted. Individual failures only show up
    /// in the log and as still-pending entries on the next run.
    pub async fn export_pending(&self) -> DbResult<Vec<ExportJob>> {
        let start = Instant::now();
        let jobs = self.repo.list_pending(self.limit).await?;

        let mut failed = 0usize;
        for job in &jobs {
            if self.export_data(*job).await.is_err() {
                failed += 1;
            }
        }

        info!(
            "export_pending: {}; failed: {}; seconds: {:.4}",
            jobs.len(),
            failed,
            start.elapsed().as_secs_f64()
        );
        Ok(jobs)
    }

    /// Re-queue everything in the store, then run a pending batch.
    pub async fn export_all(&self) -> DbResult<Vec<ExportJob>> {
        let queued = self.repo.reset_queue().await?;
        info!("reset export queue: {} location/days queued", queued);
        self.export_pending().await
    }

    pub async fn location_days(&self) -> DbResult<Vec<LocationDay>> {
        self.repo.list_location_days(self.limit).await
    }
}
