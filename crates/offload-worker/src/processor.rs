//! Offload processor: drains due queue jobs to the remote store.
//!
//! One cycle takes the cycle lease, recovers jobs orphaned by an interrupted
//! cycle, then claims and transfers up to `batch_size` due jobs in
//! scheduled-time order. A job's failure is recorded on the job and never
//! aborts the batch; a persistence failure aborts the whole cycle.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use offload_core::config::offload::OffloadSettings;
use offload_core::config::worker::WorkerConfig;
use offload_core::error::{AppError, ErrorKind};
use offload_core::result::AppResult;
use offload_core::traits::settings::SettingsProvider;
use offload_core::traits::storage::RemoteStore;
use offload_core::traits::tenant::{TenantContext, TenantScope};
use offload_core::types::id::TenantId;
use offload_database::store::{QueueStore, ResourceStore};
use offload_entity::job::{JobStatus, QueueJob, StatusCounts};

/// Outcome counts of one processing cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleReport {
    /// Due jobs returned by the queue
    pub selected: usize,
    /// Jobs transferred and deleted
    pub succeeded: usize,
    /// Jobs whose attempt failed (rescheduled or parked)
    pub failed: usize,
    /// Jobs not transferred: claimed by another cycle first, or their
    /// resource is local-only
    pub skipped: usize,
}

/// Orchestrates queue → remote store transfers
#[derive(Debug)]
pub struct OffloadProcessor {
    queue: Arc<dyn QueueStore>,
    resources: Arc<dyn ResourceStore>,
    remote: Arc<dyn RemoteStore>,
    settings: Arc<dyn SettingsProvider>,
    tenants: Arc<dyn TenantContext>,
    config: WorkerConfig,
    /// In-process guard; the lease covers other processes
    running: Mutex<()>,
}

impl OffloadProcessor {
    /// Create a new processor
    pub fn new(
        queue: Arc<dyn QueueStore>,
        resources: Arc<dyn ResourceStore>,
        remote: Arc<dyn RemoteStore>,
        settings: Arc<dyn SettingsProvider>,
        tenants: Arc<dyn TenantContext>,
        config: WorkerConfig,
    ) -> Self {
        Self {
            queue,
            resources,
            remote,
            settings,
            tenants,
            config,
            running: Mutex::new(()),
        }
    }

    /// Worker configuration in use
    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Run one processing cycle, optionally scoped to a tenant.
    ///
    /// Returns `ConfigIncomplete` when the offload settings are missing and
    /// `Busy` when another cycle holds the lease; in both cases nothing in
    /// the queue is touched. `StorageUnavailable` means the cycle aborted
    /// and should be retried by the next trigger.
    pub async fn run_cycle(&self, tenant_id: Option<TenantId>) -> AppResult<CycleReport> {
        let settings = self.settings.snapshot();
        settings.require_complete()?;

        let Ok(_running) = self.running.try_lock() else {
            return Err(AppError::busy("A processing cycle is already running"));
        };

        let holder = format!("cycle-{}", uuid::Uuid::new_v4());
        if !self
            .queue
            .try_acquire_lease(&holder, self.lease_ttl(&settings))
            .await?
        {
            return Err(AppError::busy("Another process holds the cycle lease"));
        }
        tracing::debug!(holder = %holder, tenant_id = ?tenant_id, "Cycle lease acquired");

        let result = self.drain(&settings, tenant_id).await;

        if let Err(e) = self.queue.release_lease(&holder).await {
            tracing::warn!(holder = %holder, "Failed to release cycle lease: {}", e);
        }

        match &result {
            Ok(report) if report.selected > 0 => tracing::info!(
                tenant_id = ?tenant_id,
                selected = report.selected,
                succeeded = report.succeeded,
                failed = report.failed,
                skipped = report.skipped,
                "Offload cycle finished"
            ),
            Ok(_) => tracing::debug!(tenant_id = ?tenant_id, "Offload cycle found no due jobs"),
            Err(e) => tracing::error!(tenant_id = ?tenant_id, "Offload cycle aborted: {}", e),
        }
        result
    }

    /// Return failed jobs to pending, optionally scoped to a tenant
    pub async fn retry_failed(&self, tenant_id: Option<TenantId>) -> AppResult<u64> {
        let reset = self
            .queue
            .reset_failed(tenant_id, self.config.retry_grace())
            .await?;
        tracing::info!(tenant_id = ?tenant_id, reset = reset, "Reset failed offload jobs");
        Ok(reset)
    }

    /// Job counts per status, optionally scoped to a tenant
    pub async fn status(&self, tenant_id: Option<TenantId>) -> AppResult<StatusCounts> {
        self.queue.count_by_status(tenant_id).await
    }

    /// Lease lifetime: at least long enough for a full batch of timed-out
    /// transfers.
    fn lease_ttl(&self, settings: &OffloadSettings) -> chrono::Duration {
        let worst_case = self
            .config
            .batch_size
            .saturating_mul(i64::try_from(settings.transfer_timeout_seconds).unwrap_or(i64::MAX))
            .saturating_add(60);
        self.config
            .lease_ttl()
            .max(chrono::Duration::seconds(worst_case))
    }

    async fn drain(
        &self,
        settings: &OffloadSettings,
        tenant_id: Option<TenantId>,
    ) -> AppResult<CycleReport> {
        let recovered = self.queue.requeue_orphaned().await?;
        if recovered > 0 {
            tracing::warn!(recovered = recovered, "Requeued jobs orphaned by an interrupted cycle");
        }

        let jobs = self
            .queue
            .fetch_due(tenant_id, self.config.batch_size)
            .await?;
        let mut report = CycleReport {
            selected: jobs.len(),
            ..CycleReport::default()
        };

        for job in jobs {
            if !self.queue.mark_processing(job.id).await? {
                tracing::debug!(job_id = %job.id, "Job already claimed, skipping");
                report.skipped += 1;
                continue;
            }
            tracing::debug!(job_id = %job.id, attempts = job.attempts, "Claimed job");

            match self.transfer(settings, &job).await {
                Ok(true) => {
                    self.queue.complete(job.id).await?;
                    report.succeeded += 1;
                }
                Ok(false) => {
                    self.queue.complete(job.id).await?;
                    report.skipped += 1;
                }
                Err(e) if is_job_failure(&e) => {
                    self.record_failure(&job, &e).await?;
                    report.failed += 1;
                }
                Err(e) => return Err(e),
            }
        }

        Ok(report)
    }

    /// Upload one job's file and persist the outcome against its resource,
    /// acting as the job's tenant for exactly that span.
    ///
    /// Returns `false` without uploading when the resource is local-only.
    /// Only the original file's job sets the resource's URL.
    async fn transfer(&self, settings: &OffloadSettings, job: &QueueJob) -> AppResult<bool> {
        if self.is_local_only(job).await? {
            tracing::info!(
                job_id = %job.id,
                tenant_id = %job.tenant_id,
                resource_id = %job.resource_id,
                "Resource is local-only, dropping job"
            );
            return Ok(false);
        }

        let path = PathBuf::from(&job.file_path);
        let remote_key = self.remote.remote_key(settings, &path)?;

        let scope = TenantScope::enter(self.tenants.as_ref(), job.tenant_id);
        let receipt = self.remote.upload(settings, &path, &remote_key).await?;
        let pinned = if !job.resource_id.is_known() {
            false
        } else if job.is_variant {
            self.is_local_only(job).await?
        } else {
            !self
                .resources
                .mark_offloaded(
                    job.tenant_id,
                    job.resource_id,
                    &receipt.public_url,
                    &receipt.remote_key,
                )
                .await?
        };
        drop(scope);

        tracing::info!(
            job_id = %job.id,
            tenant_id = %job.tenant_id,
            resource_id = %job.resource_id,
            variant = job.is_variant,
            url = %receipt.public_url,
            "Offloaded file"
        );

        if pinned {
            tracing::warn!(
                job_id = %job.id,
                resource_id = %job.resource_id,
                "Resource became local-only during transfer, keeping local copy"
            );
        } else if settings.delete_local_after_offload {
            remove_local_copy(&path).await;
        }
        Ok(true)
    }

    async fn is_local_only(&self, job: &QueueJob) -> AppResult<bool> {
        if !job.resource_id.is_known() {
            return Ok(false);
        }
        Ok(self
            .resources
            .find(job.tenant_id, job.resource_id)
            .await?
            .is_some_and(|r| r.is_local_only()))
    }

    async fn record_failure(&self, job: &QueueJob, error: &AppError) -> AppResult<()> {
        let park_now = error.kind == ErrorKind::Validation
            || (error.kind == ErrorKind::FileMissing && self.config.fail_fast_missing_files);
        let max_attempts = if park_now { 1 } else { self.config.max_attempts };

        let outcome = self
            .queue
            .fail_and_reschedule(job.id, self.config.retry_delay(), max_attempts)
            .await?;

        match outcome {
            Some(JobStatus::Failed) => tracing::error!(
                job_id = %job.id,
                tenant_id = %job.tenant_id,
                attempts = job.attempts + 1,
                "Offload job parked as failed: {}",
                error
            ),
            Some(_) => tracing::warn!(
                job_id = %job.id,
                tenant_id = %job.tenant_id,
                attempts = job.attempts + 1,
                retry_in_seconds = self.config.retry_delay_seconds,
                "Offload attempt failed, rescheduled: {}",
                error
            ),
            None => tracing::warn!(
                job_id = %job.id,
                "Job left processing before its failure could be recorded"
            ),
        }
        Ok(())
    }
}

/// Failures recorded on the job rather than aborting the cycle
fn is_job_failure(error: &AppError) -> bool {
    error.is_job_failure() || error.kind == ErrorKind::Validation
}

async fn remove_local_copy(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => tracing::debug!(path = %path.display(), "Removed local copy"),
        Err(e) => tracing::warn!(path = %path.display(), "Failed to remove local copy: {}", e),
    }
}
