//! In-memory resource store.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use offload_core::result::AppResult;
use offload_core::types::clock::Clock;
use offload_core::types::id::{ResourceId, TenantId};
use offload_entity::resource::{OffloadState, OffloadSummary, ResourceOffload};

use crate::store::ResourceStore;

/// In-memory resource store keyed by `(tenant, resource)`.
#[derive(Debug, Clone)]
pub struct MemoryResourceStore {
    records: Arc<Mutex<HashMap<(TenantId, ResourceId), ResourceOffload>>>,
    clock: Arc<dyn Clock>,
}

impl MemoryResourceStore {
    /// Creates an empty store.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            records: Arc::new(Mutex::new(HashMap::new())),
            clock,
        }
    }
}

#[async_trait]
impl ResourceStore for MemoryResourceStore {
    async fn mark_offloaded(
        &self,
        tenant_id: TenantId,
        resource_id: ResourceId,
        cdn_url: &str,
        remote_path: &str,
    ) -> AppResult<bool> {
        let mut records = self.records.lock().await;
        if records
            .get(&(tenant_id, resource_id))
            .is_some_and(ResourceOffload::is_local_only)
        {
            return Ok(false);
        }
        let record = ResourceOffload {
            tenant_id,
            resource_id,
            state: OffloadState::Offloaded,
            cdn_url: Some(cdn_url.to_string()),
            remote_path: Some(remote_path.to_string()),
            updated_at: self.clock.now(),
        };
        records.insert((tenant_id, resource_id), record);
        Ok(true)
    }

    async fn mark_local_only(&self, tenant_id: TenantId, resource_id: ResourceId) -> AppResult<()> {
        let record = ResourceOffload {
            tenant_id,
            resource_id,
            state: OffloadState::LocalOnly,
            cdn_url: None,
            remote_path: None,
            updated_at: self.clock.now(),
        };
        self.records
            .lock()
            .await
            .insert((tenant_id, resource_id), record);
        Ok(())
    }

    async fn find(
        &self,
        tenant_id: TenantId,
        resource_id: ResourceId,
    ) -> AppResult<Option<ResourceOffload>> {
        Ok(self
            .records
            .lock()
            .await
            .get(&(tenant_id, resource_id))
            .cloned())
    }

    async fn summary(&self, tenant_id: Option<TenantId>) -> AppResult<OffloadSummary> {
        let records = self.records.lock().await;
        let mut summary = OffloadSummary::default();
        for record in records
            .values()
            .filter(|r| tenant_id.is_none_or(|t| t == r.tenant_id))
        {
            match record.state {
                OffloadState::Offloaded => summary.offloaded += 1,
                OffloadState::LocalOnly => summary.local_only += 1,
            }
        }
        Ok(summary)
    }
}
