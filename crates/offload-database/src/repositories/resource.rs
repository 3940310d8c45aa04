//! Resource offload repository implementation.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;

use offload_core::error::{AppError, ErrorKind};
use offload_core::result::AppResult;
use offload_core::types::clock::Clock;
use offload_core::types::id::{ResourceId, TenantId};
use offload_entity::resource::{OffloadState, OffloadSummary, ResourceOffload};

use crate::store::ResourceStore;

/// Repository for the `offload_resources` table.
#[derive(Debug, Clone)]
pub struct ResourceRepository {
    pool: PgPool,
    clock: Arc<dyn Clock>,
}

impl ResourceRepository {
    /// Create a new resource repository.
    pub fn new(pool: PgPool, clock: Arc<dyn Clock>) -> Self {
        Self { pool, clock }
    }
}

#[async_trait]
impl ResourceStore for ResourceRepository {
    async fn mark_offloaded(
        &self,
        tenant_id: TenantId,
        resource_id: ResourceId,
        cdn_url: &str,
        remote_path: &str,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            "INSERT INTO offload_resources (tenant_id, resource_id, state, cdn_url, remote_path, updated_at) \
             VALUES ($1, $2, 'offloaded', $3, $4, $5) \
             ON CONFLICT (tenant_id, resource_id) DO UPDATE SET \
                state = 'offloaded', cdn_url = EXCLUDED.cdn_url, \
                remote_path = EXCLUDED.remote_path, updated_at = EXCLUDED.updated_at \
             WHERE offload_resources.state <> 'local_only'",
        )
        .bind(tenant_id)
        .bind(resource_id)
        .bind(cdn_url)
        .bind(remote_path)
        .bind(self.clock.now())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(
                ErrorKind::StorageUnavailable,
                "Failed to mark resource offloaded",
                e,
            )
        })?;
        Ok(result.rows_affected() == 1)
    }

    async fn mark_local_only(&self, tenant_id: TenantId, resource_id: ResourceId) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO offload_resources (tenant_id, resource_id, state, updated_at) \
             VALUES ($1, $2, 'local_only', $3) \
             ON CONFLICT (tenant_id, resource_id) DO UPDATE SET \
                state = 'local_only', cdn_url = NULL, remote_path = NULL, \
                updated_at = EXCLUDED.updated_at",
        )
        .bind(tenant_id)
        .bind(resource_id)
        .bind(self.clock.now())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(
                ErrorKind::StorageUnavailable,
                "Failed to mark resource local-only",
                e,
            )
        })?;
        Ok(())
    }

    async fn find(
        &self,
        tenant_id: TenantId,
        resource_id: ResourceId,
    ) -> AppResult<Option<ResourceOffload>> {
        sqlx::query_as::<_, ResourceOffload>(
            "SELECT tenant_id, resource_id, state, cdn_url, remote_path, updated_at \
             FROM offload_resources WHERE tenant_id = $1 AND resource_id = $2",
        )
        .bind(tenant_id)
        .bind(resource_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::StorageUnavailable, "Failed to find resource", e)
        })
    }

    async fn summary(&self, tenant_id: Option<TenantId>) -> AppResult<OffloadSummary> {
        let rows = sqlx::query_as::<_, (OffloadState, i64)>(
            "SELECT state, COUNT(*) FROM offload_resources \
             WHERE ($1::BIGINT IS NULL OR tenant_id = $1) GROUP BY state",
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(
                ErrorKind::StorageUnavailable,
                "Failed to summarize resources",
                e,
            )
        })?;

        let mut summary = OffloadSummary::default();
        for (state, count) in rows {
            match state {
                OffloadState::Offloaded => summary.offloaded = count,
                OffloadState::LocalOnly => summary.local_only = count,
            }
        }
        Ok(summary)
    }
}
