//! Queue repository implementation.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use sqlx::PgPool;
use tracing::debug;

use offload_core::error::{AppError, ErrorKind};
use offload_core::result::AppResult;
use offload_core::types::clock::Clock;
use offload_core::types::id::{JobId, ResourceId, TenantId};
use offload_entity::job::{JobStatus, QueueJob, StatusCounts};

use crate::store::QueueStore;

const JOB_COLUMNS: &str =
    "id, tenant_id, resource_id, file_path, is_variant, status, scheduled_time, attempts";

/// Repository for the `offload_queue` and `offload_cycle_lease` tables.
///
/// Timestamps come from the injected clock so due-time decisions agree with
/// the processor's view of "now".
#[derive(Debug, Clone)]
pub struct QueueRepository {
    pool: PgPool,
    clock: Arc<dyn Clock>,
}

impl QueueRepository {
    /// Create a new queue repository.
    pub fn new(pool: PgPool, clock: Arc<dyn Clock>) -> Self {
        Self { pool, clock }
    }

    async fn insert_job(
        &self,
        tenant_id: TenantId,
        resource_id: ResourceId,
        file_path: &str,
        is_variant: bool,
        delay: Duration,
    ) -> AppResult<JobId> {
        let scheduled_time = self.clock.now() + delay;
        let id = sqlx::query_scalar::<_, JobId>(
            "INSERT INTO offload_queue \
                (tenant_id, resource_id, file_path, is_variant, status, scheduled_time, attempts) \
             VALUES ($1, $2, $3, $4, 'pending', $5, 0) RETURNING id",
        )
        .bind(tenant_id)
        .bind(resource_id)
        .bind(file_path)
        .bind(is_variant)
        .bind(scheduled_time)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("Failed to enqueue job"))?;

        debug!(job_id = %id, tenant_id = %tenant_id, is_variant, "Inserted queue row");
        Ok(id)
    }
}

fn db_error(message: &'static str) -> impl FnOnce(sqlx::Error) -> AppError {
    move |e| AppError::with_source(ErrorKind::StorageUnavailable, message, e)
}

#[async_trait]
impl QueueStore for QueueRepository {
    async fn enqueue(
        &self,
        tenant_id: TenantId,
        resource_id: ResourceId,
        file_path: &str,
        delay: Duration,
    ) -> AppResult<JobId> {
        self.insert_job(tenant_id, resource_id, file_path, false, delay)
            .await
    }

    async fn enqueue_variant(
        &self,
        tenant_id: TenantId,
        resource_id: ResourceId,
        file_path: &str,
        delay: Duration,
    ) -> AppResult<JobId> {
        self.insert_job(tenant_id, resource_id, file_path, true, delay)
            .await
    }

    async fn fetch_due(&self, tenant_id: Option<TenantId>, limit: i64) -> AppResult<Vec<QueueJob>> {
        sqlx::query_as::<_, QueueJob>(&format!(
            "SELECT {JOB_COLUMNS} FROM offload_queue \
             WHERE status = 'pending' AND scheduled_time <= $1 \
             AND ($2::BIGINT IS NULL OR tenant_id = $2) \
             ORDER BY scheduled_time ASC, id ASC LIMIT $3"
        ))
        .bind(self.clock.now())
        .bind(tenant_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to fetch due jobs"))
    }

    async fn find(&self, job_id: JobId) -> AppResult<Option<QueueJob>> {
        sqlx::query_as::<_, QueueJob>(&format!(
            "SELECT {JOB_COLUMNS} FROM offload_queue WHERE id = $1"
        ))
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to find job"))
    }

    async fn mark_processing(&self, job_id: JobId) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE offload_queue SET status = 'processing' WHERE id = $1 AND status = 'pending'",
        )
        .bind(job_id)
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to claim job"))?;
        Ok(result.rows_affected() == 1)
    }

    async fn complete(&self, job_id: JobId) -> AppResult<()> {
        sqlx::query("DELETE FROM offload_queue WHERE id = $1")
            .bind(job_id)
            .execute(&self.pool)
            .await
            .map_err(db_error("Failed to complete job"))?;
        Ok(())
    }

    async fn fail_and_reschedule(
        &self,
        job_id: JobId,
        retry_delay: Duration,
        max_attempts: i32,
    ) -> AppResult<Option<JobStatus>> {
        let retry_at = self.clock.now() + retry_delay;
        sqlx::query_scalar::<_, JobStatus>(
            "UPDATE offload_queue SET \
                attempts = attempts + 1, \
                status = CASE WHEN attempts + 1 >= $3 \
                    THEN 'failed'::offload_job_status ELSE 'pending'::offload_job_status END, \
                scheduled_time = CASE WHEN attempts + 1 >= $3 THEN scheduled_time ELSE $2 END \
             WHERE id = $1 AND status = 'processing' \
             RETURNING status",
        )
        .bind(job_id)
        .bind(retry_at)
        .bind(max_attempts)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to reschedule job"))
    }

    async fn requeue_orphaned(&self) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE offload_queue SET status = 'pending', scheduled_time = $1 \
             WHERE status = 'processing'",
        )
        .bind(self.clock.now())
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to requeue orphaned jobs"))?;
        Ok(result.rows_affected())
    }

    async fn reset_failed(&self, tenant_id: Option<TenantId>, grace: Duration) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE offload_queue SET status = 'pending', attempts = 0, scheduled_time = $2 \
             WHERE status = 'failed' AND ($1::BIGINT IS NULL OR tenant_id = $1)",
        )
        .bind(tenant_id)
        .bind(self.clock.now() + grace)
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to reset failed jobs"))?;
        Ok(result.rows_affected())
    }

    async fn count_by_status(&self, tenant_id: Option<TenantId>) -> AppResult<StatusCounts> {
        let rows = sqlx::query_as::<_, (JobStatus, i64)>(
            "SELECT status, COUNT(*) FROM offload_queue \
             WHERE ($1::BIGINT IS NULL OR tenant_id = $1) GROUP BY status",
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to count jobs"))?;

        let mut counts = StatusCounts::default();
        for (status, count) in rows {
            counts.record(status, count);
        }
        Ok(counts)
    }

    async fn try_acquire_lease(&self, holder: &str, ttl: Duration) -> AppResult<bool> {
        let now = self.clock.now();
        let acquired = sqlx::query_scalar::<_, String>(
            "INSERT INTO offload_cycle_lease (id, holder, expires_at) VALUES (1, $1, $2) \
             ON CONFLICT (id) DO UPDATE SET holder = EXCLUDED.holder, expires_at = EXCLUDED.expires_at \
             WHERE offload_cycle_lease.expires_at <= $3 OR offload_cycle_lease.holder = $1 \
             RETURNING holder",
        )
        .bind(holder)
        .bind(now + ttl)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to acquire cycle lease"))?;
        Ok(acquired.is_some())
    }

    async fn release_lease(&self, holder: &str) -> AppResult<()> {
        sqlx::query("DELETE FROM offload_cycle_lease WHERE id = 1 AND holder = $1")
            .bind(holder)
            .execute(&self.pool)
            .await
            .map_err(db_error("Failed to release cycle lease"))?;
        Ok(())
    }
}
