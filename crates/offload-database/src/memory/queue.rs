//! In-memory queue store.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;
use tracing::debug;

use offload_core::result::AppResult;
use offload_core::types::clock::Clock;
use offload_core::types::id::{JobId, ResourceId, TenantId};
use offload_entity::job::{JobStatus, QueueJob, StatusCounts};

use crate::store::QueueStore;

/// Holder of the cycle lease.
#[derive(Debug, Clone)]
struct Lease {
    holder: String,
    expires_at: DateTime<Utc>,
}

/// Internal state for the memory-based queue.
#[derive(Debug, Default)]
struct InnerState {
    /// Last assigned job id.
    last_id: i64,
    /// Jobs keyed by id.
    jobs: BTreeMap<JobId, QueueJob>,
    /// Current cycle lease, if any.
    lease: Option<Lease>,
}

/// In-memory queue store using a Tokio mutex for thread safety.
///
/// Suitable for single-node deployments only. Each operation runs under the
/// lock, which gives it the same atomicity as one conditional statement.
#[derive(Debug, Clone)]
pub struct MemoryQueueStore {
    state: Arc<Mutex<InnerState>>,
    clock: Arc<dyn Clock>,
}

impl MemoryQueueStore {
    /// Creates an empty queue driven by `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Arc::new(Mutex::new(InnerState::default())),
            clock,
        }
    }

    async fn insert(
        &self,
        tenant_id: TenantId,
        resource_id: ResourceId,
        file_path: &str,
        is_variant: bool,
        delay: Duration,
    ) -> JobId {
        let mut state = self.state.lock().await;
        state.last_id += 1;
        let id = JobId(state.last_id);

        state.jobs.insert(
            id,
            QueueJob {
                id,
                tenant_id,
                resource_id,
                file_path: file_path.to_string(),
                is_variant,
                status: JobStatus::Pending,
                scheduled_time: self.clock.now() + delay,
                attempts: 0,
            },
        );
        debug!(job_id = %id, tenant_id = %tenant_id, is_variant, "Inserted queue row");
        id
    }
}

fn tenant_matches(filter: Option<TenantId>, tenant_id: TenantId) -> bool {
    filter.is_none_or(|t| t == tenant_id)
}

#[async_trait]
impl QueueStore for MemoryQueueStore {
    async fn enqueue(
        &self,
        tenant_id: TenantId,
        resource_id: ResourceId,
        file_path: &str,
        delay: Duration,
    ) -> AppResult<JobId> {
        Ok(self.insert(tenant_id, resource_id, file_path, false, delay).await)
    }

    async fn enqueue_variant(
        &self,
        tenant_id: TenantId,
        resource_id: ResourceId,
        file_path: &str,
        delay: Duration,
    ) -> AppResult<JobId> {
        Ok(self.insert(tenant_id, resource_id, file_path, true, delay).await)
    }

    async fn fetch_due(&self, tenant_id: Option<TenantId>, limit: i64) -> AppResult<Vec<QueueJob>> {
        let now = self.clock.now();
        let state = self.state.lock().await;

        let mut due: Vec<QueueJob> = state
            .jobs
            .values()
            .filter(|job| job.is_due(now) && tenant_matches(tenant_id, job.tenant_id))
            .cloned()
            .collect();
        due.sort_by_key(|job| (job.scheduled_time, job.id));
        due.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(due)
    }

    async fn find(&self, job_id: JobId) -> AppResult<Option<QueueJob>> {
        let state = self.state.lock().await;
        Ok(state.jobs.get(&job_id).cloned())
    }

    async fn mark_processing(&self, job_id: JobId) -> AppResult<bool> {
        let mut state = self.state.lock().await;
        match state.jobs.get_mut(&job_id) {
            Some(job) if job.status.can_transition_to(JobStatus::Processing) => {
                job.status = JobStatus::Processing;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn complete(&self, job_id: JobId) -> AppResult<()> {
        let mut state = self.state.lock().await;
        state.jobs.remove(&job_id);
        Ok(())
    }

    async fn fail_and_reschedule(
        &self,
        job_id: JobId,
        retry_delay: Duration,
        max_attempts: i32,
    ) -> AppResult<Option<JobStatus>> {
        let now = self.clock.now();
        let mut state = self.state.lock().await;
        let Some(job) = state.jobs.get_mut(&job_id) else {
            return Ok(None);
        };
        if !job.status.can_transition_to(JobStatus::Failed) {
            return Ok(None);
        }

        job.attempts += 1;
        if job.attempts >= max_attempts {
            job.status = JobStatus::Failed;
        } else {
            job.status = JobStatus::Pending;
            job.scheduled_time = now + retry_delay;
        }
        Ok(Some(job.status))
    }

    async fn requeue_orphaned(&self) -> AppResult<u64> {
        let now = self.clock.now();
        let mut state = self.state.lock().await;

        let mut recovered = 0;
        for job in state.jobs.values_mut() {
            if job.status == JobStatus::Processing {
                job.status = JobStatus::Pending;
                job.scheduled_time = now;
                recovered += 1;
            }
        }
        Ok(recovered)
    }

    async fn reset_failed(&self, tenant_id: Option<TenantId>, grace: Duration) -> AppResult<u64> {
        let due_at = self.clock.now() + grace;
        let mut state = self.state.lock().await;

        let mut reset = 0;
        for job in state.jobs.values_mut() {
            if job.status == JobStatus::Failed && tenant_matches(tenant_id, job.tenant_id) {
                job.status = JobStatus::Pending;
                job.attempts = 0;
                job.scheduled_time = due_at;
                reset += 1;
            }
        }
        Ok(reset)
    }

    async fn count_by_status(&self, tenant_id: Option<TenantId>) -> AppResult<StatusCounts> {
        let state = self.state.lock().await;
        let mut counts = StatusCounts::default();
        for job in state.jobs.values() {
            if tenant_matches(tenant_id, job.tenant_id) {
                counts.record(job.status, 1);
            }
        }
        Ok(counts)
    }

    async fn try_acquire_lease(&self, holder: &str, ttl: Duration) -> AppResult<bool> {
        let now = self.clock.now();
        let mut state = self.state.lock().await;

        let free = match &state.lease {
            None => true,
            Some(lease) => lease.expires_at <= now || lease.holder == holder,
        };
        if free {
            state.lease = Some(Lease {
                holder: holder.to_string(),
                expires_at: now + ttl,
            });
        }
        Ok(free)
    }

    async fn release_lease(&self, holder: &str) -> AppResult<()> {
        let mut state = self.state.lock().await;
        if state.lease.as_ref().is_some_and(|l| l.holder == holder) {
            state.lease = None;
        }
        Ok(())
    }
}
