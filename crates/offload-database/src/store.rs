//! Persistence traits for the offload queue and per-resource state.
//!
//! Two implementations are provided:
//! - PostgreSQL ([`crate::repositories`]), every mutation a single
//!   conditional statement
//! - In-memory ([`crate::memory`]), guarded by a `tokio::sync::Mutex`
//!
//! Every operation fails with `StorageUnavailable` when the backend cannot
//! be reached.

use async_trait::async_trait;
use chrono::Duration;

use offload_core::result::AppResult;
use offload_core::types::id::{JobId, ResourceId, TenantId};
use offload_entity::job::{JobStatus, QueueJob, StatusCounts};
use offload_entity::resource::{OffloadSummary, ResourceOffload};

/// Durable queue of offload jobs.
#[async_trait]
pub trait QueueStore: Send + Sync + std::fmt::Debug + 'static {
    /// Insert a pending job due `delay` from now and return its id.
    ///
    /// The same file may be enqueued more than once.
    async fn enqueue(
        &self,
        tenant_id: TenantId,
        resource_id: ResourceId,
        file_path: &str,
        delay: Duration,
    ) -> AppResult<JobId>;

    /// Insert a pending job for a derived rendition of a resource.
    ///
    /// Variant jobs upload their file but never set the resource's URL.
    async fn enqueue_variant(
        &self,
        tenant_id: TenantId,
        resource_id: ResourceId,
        file_path: &str,
        delay: Duration,
    ) -> AppResult<JobId>;

    /// Up to `limit` pending jobs whose scheduled time has passed, oldest
    /// first, optionally scoped to one tenant.
    async fn fetch_due(&self, tenant_id: Option<TenantId>, limit: i64) -> AppResult<Vec<QueueJob>>;

    /// Look up a job by id.
    async fn find(&self, job_id: JobId) -> AppResult<Option<QueueJob>>;

    /// Claim a job for processing.
    ///
    /// Returns `false` when the job is no longer `pending` (another cycle
    /// claimed it, or it was removed).
    async fn mark_processing(&self, job_id: JobId) -> AppResult<bool>;

    /// Delete a successfully transferred job.
    async fn complete(&self, job_id: JobId) -> AppResult<()>;

    /// Record a failed attempt.
    ///
    /// Increments `attempts`; parks the job as `failed` once the count
    /// reaches `max_attempts`, otherwise returns it to `pending` due
    /// `retry_delay` from now. Returns the resulting status, or `None` when
    /// the job was not `processing`.
    async fn fail_and_reschedule(
        &self,
        job_id: JobId,
        retry_delay: Duration,
        max_attempts: i32,
    ) -> AppResult<Option<JobStatus>>;

    /// Return jobs left `processing` by an interrupted cycle to `pending`,
    /// due immediately. Only safe while holding the cycle lease. Returns the
    /// number recovered.
    async fn requeue_orphaned(&self) -> AppResult<u64>;

    /// Return every `failed` job (optionally for one tenant) to `pending`
    /// with zero attempts, due `grace` from now. Returns the number reset.
    async fn reset_failed(&self, tenant_id: Option<TenantId>, grace: Duration) -> AppResult<u64>;

    /// Job counts per status.
    async fn count_by_status(&self, tenant_id: Option<TenantId>) -> AppResult<StatusCounts>;

    /// Take the cycle lease for `ttl` unless another live holder has it.
    /// An expired lease is taken over.
    async fn try_acquire_lease(&self, holder: &str, ttl: Duration) -> AppResult<bool>;

    /// Give up the cycle lease if `holder` still owns it.
    async fn release_lease(&self, holder: &str) -> AppResult<()>;
}

/// Offload state recorded against resources.
#[async_trait]
pub trait ResourceStore: Send + Sync + std::fmt::Debug + 'static {
    /// Record that a resource is now served from the CDN.
    ///
    /// Returns `false` without writing when the resource is local-only.
    async fn mark_offloaded(
        &self,
        tenant_id: TenantId,
        resource_id: ResourceId,
        cdn_url: &str,
        remote_path: &str,
    ) -> AppResult<bool>;

    /// Pin a resource to local storage.
    async fn mark_local_only(&self, tenant_id: TenantId, resource_id: ResourceId) -> AppResult<()>;

    /// Look up a resource's offload record.
    async fn find(
        &self,
        tenant_id: TenantId,
        resource_id: ResourceId,
    ) -> AppResult<Option<ResourceOffload>>;

    /// Resource counts per state.
    async fn summary(&self, tenant_id: Option<TenantId>) -> AppResult<OffloadSummary>;
}
