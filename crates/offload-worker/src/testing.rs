//! Test doubles shared by the worker's unit tests.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use offload_core::config::offload::OffloadSettings;
use offload_core::config::worker::WorkerConfig;
use offload_core::error::AppError;
use offload_core::result::AppResult;
use offload_core::traits::settings::StaticSettings;
use offload_core::traits::storage::{RemoteStore, UploadReceipt};
use offload_core::traits::tenant::TenantContext;
use offload_core::types::clock::ManualClock;
use offload_core::types::id::{ResourceId, TenantId};
use offload_database::memory::{MemoryQueueStore, MemoryResourceStore};
use offload_database::store::ResourceStore;
use offload_entity::resource::{OffloadSummary, ResourceOffload};

use crate::processor::OffloadProcessor;

pub fn complete_settings() -> OffloadSettings {
    OffloadSettings {
        api_key: "key".into(),
        storage_zone: "zone".into(),
        cdn_url: "https://cdn.example.net".into(),
        uploads_root: "/uploads".into(),
        ..OffloadSettings::default()
    }
}

/// Tenant context that tracks the active tenant.
#[derive(Debug, Default)]
pub struct RecordingTenants {
    stack: Mutex<Vec<TenantId>>,
    switches: Mutex<usize>,
}

impl RecordingTenants {
    pub fn active(&self) -> Option<TenantId> {
        self.stack.lock().unwrap().last().copied()
    }

    pub fn switches(&self) -> usize {
        *self.switches.lock().unwrap()
    }
}

impl TenantContext for RecordingTenants {
    fn switch_to(&self, tenant: TenantId) {
        self.stack.lock().unwrap().push(tenant);
        *self.switches.lock().unwrap() += 1;
    }

    fn restore(&self) {
        self.stack.lock().unwrap().pop();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteBehavior {
    Succeed,
    MissingFile,
    TransferFailure,
}

/// Remote store double that records every upload attempt.
#[derive(Debug)]
pub struct FakeRemote {
    tenants: Arc<RecordingTenants>,
    behavior: Mutex<RemoteBehavior>,
    failing_paths: Mutex<Vec<String>>,
    uploads: Mutex<Vec<(String, Option<TenantId>)>>,
}

impl FakeRemote {
    pub fn new(tenants: Arc<RecordingTenants>) -> Self {
        Self {
            tenants,
            behavior: Mutex::new(RemoteBehavior::Succeed),
            failing_paths: Mutex::new(Vec::new()),
            uploads: Mutex::new(Vec::new()),
        }
    }

    pub fn set_behavior(&self, behavior: RemoteBehavior) {
        *self.behavior.lock().unwrap() = behavior;
    }

    pub fn fail_path(&self, path: &str) {
        self.failing_paths.lock().unwrap().push(path.to_string());
    }

    pub fn upload_count(&self) -> usize {
        self.uploads.lock().unwrap().len()
    }

    pub fn uploaded_paths(&self) -> Vec<String> {
        self.uploads
            .lock()
            .unwrap()
            .iter()
            .map(|(p, _)| p.clone())
            .collect()
    }

    pub fn active_tenants(&self) -> Vec<Option<TenantId>> {
        self.uploads.lock().unwrap().iter().map(|(_, t)| *t).collect()
    }
}

#[async_trait]
impl RemoteStore for FakeRemote {
    fn provider_type(&self) -> &str {
        "fake"
    }

    fn remote_key(&self, settings: &OffloadSettings, file_path: &Path) -> AppResult<String> {
        file_path
            .strip_prefix(&settings.uploads_root)
            .map(|p| p.to_string_lossy().into_owned())
            .map_err(|_| AppError::validation("outside uploads root"))
    }

    async fn upload(
        &self,
        settings: &OffloadSettings,
        file_path: &Path,
        remote_key: &str,
    ) -> AppResult<UploadReceipt> {
        let path = file_path.to_string_lossy().into_owned();
        self.uploads
            .lock()
            .unwrap()
            .push((path.clone(), self.tenants.active()));

        if self.failing_paths.lock().unwrap().contains(&path) {
            return Err(AppError::transfer("HTTP 500"));
        }
        match *self.behavior.lock().unwrap() {
            RemoteBehavior::Succeed => Ok(UploadReceipt {
                remote_key: remote_key.to_string(),
                public_url: settings.public_url(remote_key),
                bytes: 1,
            }),
            RemoteBehavior::MissingFile => Err(AppError::file_missing(path)),
            RemoteBehavior::TransferFailure => Err(AppError::transfer("HTTP 503")),
        }
    }
}

/// Resource store that can be switched into an unreachable state.
#[derive(Debug)]
pub struct FlakyResources {
    inner: MemoryResourceStore,
    unavailable: AtomicBool,
}

impl FlakyResources {
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check(&self) -> AppResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AppError::storage_unavailable("database down"));
        }
        Ok(())
    }
}

#[async_trait]
impl ResourceStore for FlakyResources {
    async fn mark_offloaded(
        &self,
        tenant_id: TenantId,
        resource_id: ResourceId,
        cdn_url: &str,
        remote_path: &str,
    ) -> AppResult<bool> {
        self.check()?;
        self.inner
            .mark_offloaded(tenant_id, resource_id, cdn_url, remote_path)
            .await
    }

    async fn mark_local_only(&self, tenant_id: TenantId, resource_id: ResourceId) -> AppResult<()> {
        self.check()?;
        self.inner.mark_local_only(tenant_id, resource_id).await
    }

    async fn find(
        &self,
        tenant_id: TenantId,
        resource_id: ResourceId,
    ) -> AppResult<Option<ResourceOffload>> {
        self.check()?;
        self.inner.find(tenant_id, resource_id).await
    }

    async fn summary(&self, tenant_id: Option<TenantId>) -> AppResult<OffloadSummary> {
        self.check()?;
        self.inner.summary(tenant_id).await
    }
}

/// Processor wired to in-memory stores and test doubles.
pub struct Harness {
    pub clock: Arc<ManualClock>,
    pub queue: Arc<MemoryQueueStore>,
    pub resources: Arc<FlakyResources>,
    pub remote: Arc<FakeRemote>,
    pub settings: Arc<StaticSettings>,
    pub tenants: Arc<RecordingTenants>,
    pub processor: Arc<OffloadProcessor>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(WorkerConfig::default())
    }

    pub fn with_config(config: WorkerConfig) -> Self {
        let clock = Arc::new(ManualClock::default());
        let queue = Arc::new(MemoryQueueStore::new(clock.clone()));
        let resources = Arc::new(FlakyResources {
            inner: MemoryResourceStore::new(clock.clone()),
            unavailable: AtomicBool::new(false),
        });
        let tenants = Arc::new(RecordingTenants::default());
        let remote = Arc::new(FakeRemote::new(tenants.clone()));
        let settings = Arc::new(StaticSettings::new(complete_settings()));

        let processor = Arc::new(OffloadProcessor::new(
            queue.clone(),
            resources.clone(),
            remote.clone(),
            settings.clone(),
            tenants.clone(),
            config,
        ));

        Self {
            clock,
            queue,
            resources,
            remote,
            settings,
            tenants,
            processor,
        }
    }
}
