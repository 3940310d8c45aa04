//! Intake hook: decides whether a new upload stays local or is queued.
//!
//! The classification is made once, from the original file's extension,
//! and applied to every derived variant of the same upload.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use offload_core::error::AppError;
use offload_core::events::upload::UploadEvent;
use offload_core::result::AppResult;
use offload_core::traits::settings::SettingsProvider;
use offload_core::types::id::JobId;
use offload_database::store::{QueueStore, ResourceStore};
use offload_entity::job::MAX_FILE_PATH_LEN;

/// What the intake hook did with an upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", content = "job_ids", rename_all = "snake_case")]
pub enum IntakeDecision {
    /// Offloading is not configured, or not enabled for the tenant
    Disabled,
    /// The resource was already pinned to local storage
    AlreadyLocal,
    /// The file type is retained locally; the resource is now local-only
    LocalOnly,
    /// The original and its variants were queued
    Enqueued(Vec<JobId>),
}

/// Consumes upload events from the host
#[derive(Debug, Clone)]
pub struct IntakeHook {
    queue: Arc<dyn QueueStore>,
    resources: Arc<dyn ResourceStore>,
    settings: Arc<dyn SettingsProvider>,
}

impl IntakeHook {
    /// Create a new intake hook
    pub fn new(
        queue: Arc<dyn QueueStore>,
        resources: Arc<dyn ResourceStore>,
        settings: Arc<dyn SettingsProvider>,
    ) -> Self {
        Self {
            queue,
            resources,
            settings,
        }
    }

    /// Handle one upload event
    pub async fn on_upload(&self, event: &UploadEvent) -> AppResult<IntakeDecision> {
        let settings = self.settings.snapshot();
        if !settings.is_complete() || !settings.is_enabled_for(event.tenant_id) {
            tracing::debug!(
                tenant_id = %event.tenant_id,
                "Offload disabled for tenant, leaving upload local"
            );
            return Ok(IntakeDecision::Disabled);
        }

        if event.resource_id.is_known() {
            let existing = self
                .resources
                .find(event.tenant_id, event.resource_id)
                .await?;
            if existing.is_some_and(|r| r.is_local_only()) {
                tracing::debug!(
                    tenant_id = %event.tenant_id,
                    resource_id = %event.resource_id,
                    "Resource is local-only, not enqueueing"
                );
                return Ok(IntakeDecision::AlreadyLocal);
            }
        }

        if settings.retains_locally(&event.file_path) {
            if event.resource_id.is_known() {
                self.resources
                    .mark_local_only(event.tenant_id, event.resource_id)
                    .await?;
            }
            tracing::info!(
                tenant_id = %event.tenant_id,
                resource_id = %event.resource_id,
                path = %event.file_path.display(),
                "Upload retained locally"
            );
            return Ok(IntakeDecision::LocalOnly);
        }

        let paths: Vec<String> = event
            .all_paths()
            .map(|p| p.to_string_lossy().into_owned())
            .collect();
        if let Some(long) = paths.iter().find(|p| p.len() > MAX_FILE_PATH_LEN) {
            return Err(AppError::validation(format!(
                "File path exceeds {MAX_FILE_PATH_LEN} bytes: {long}"
            )));
        }

        let delay = settings.offload_delay();
        let mut job_ids = Vec::with_capacity(paths.len());
        for (index, path) in paths.iter().enumerate() {
            let job_id = if index == 0 {
                self.queue
                    .enqueue(event.tenant_id, event.resource_id, path, delay)
                    .await?
            } else {
                self.queue
                    .enqueue_variant(event.tenant_id, event.resource_id, path, delay)
                    .await?
            };
            tracing::info!(
                job_id = %job_id,
                tenant_id = %event.tenant_id,
                resource_id = %event.resource_id,
                path = %path,
                variant = index > 0,
                delay_seconds = settings.offload_delay_seconds,
                "Enqueued upload for offload"
            );
            job_ids.push(job_id);
        }

        Ok(IntakeDecision::Enqueued(job_ids))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use offload_core::config::offload::OffloadSettings;
    use offload_core::types::clock::Clock;
    use offload_core::types::id::{ResourceId, TenantId};
    use offload_entity::job::JobStatus;

    use super::*;
    use crate::testing::{Harness, complete_settings};

    fn hook(h: &Harness) -> IntakeHook {
        IntakeHook::new(h.queue.clone(), h.resources.clone(), h.settings.clone())
    }

    #[tokio::test]
    async fn test_retained_extension_marks_local_only() {
        let h = Harness::new();
        let event = UploadEvent::new(TenantId(1), ResourceId(3), "/uploads/data.json")
            .with_variant("copy", "/uploads/data-copy.json");

        let decision = hook(&h).on_upload(&event).await.unwrap();
        assert_eq!(decision, IntakeDecision::LocalOnly);
        assert_eq!(h.queue.count_by_status(None).await.unwrap().total(), 0);

        let record = h
            .resources
            .find(TenantId(1), ResourceId(3))
            .await
            .unwrap()
            .unwrap();
        assert!(record.is_local_only());
    }

    #[tokio::test]
    async fn test_original_and_variants_are_enqueued_with_delay() {
        let h = Harness::new();
        let event = UploadEvent::new(TenantId(2), ResourceId(8), "/uploads/photo.jpg")
            .with_variant("thumbnail", "/uploads/photo-150x150.jpg")
            .with_variant("medium", "/uploads/photo-300x200.json");

        let IntakeDecision::Enqueued(ids) = hook(&h).on_upload(&event).await.unwrap() else {
            panic!("expected the upload to be enqueued");
        };
        assert_eq!(ids.len(), 3);

        for id in &ids {
            let job = h.queue.find(*id).await.unwrap().unwrap();
            assert_eq!(job.status, JobStatus::Pending);
            assert_eq!(job.attempts, 0);
            assert_eq!(job.tenant_id, TenantId(2));
            assert_eq!(job.resource_id, ResourceId(8));
            assert_eq!(job.scheduled_time, h.clock.now() + Duration::seconds(300));
        }
        assert!(!h.queue.find(ids[0]).await.unwrap().unwrap().is_variant);
        let last = h.queue.find(ids[2]).await.unwrap().unwrap();
        assert_eq!(last.file_path, "/uploads/photo-300x200.json");
        assert!(last.is_variant);

        assert!(h.queue.fetch_due(None, 20).await.unwrap().is_empty());
        h.clock.advance(Duration::seconds(300));
        assert_eq!(h.queue.fetch_due(None, 20).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_local_only_resource_is_not_enqueued() {
        let h = Harness::new();
        h.resources
            .mark_local_only(TenantId(1), ResourceId(4))
            .await
            .unwrap();

        let event = UploadEvent::new(TenantId(1), ResourceId(4), "/uploads/regenerated.png");
        let decision = hook(&h).on_upload(&event).await.unwrap();
        assert_eq!(decision, IntakeDecision::AlreadyLocal);
        assert_eq!(h.queue.count_by_status(None).await.unwrap().total(), 0);
    }

    #[tokio::test]
    async fn test_disabled_tenant_and_incomplete_settings() {
        let h = Harness::new();
        h.settings.replace(OffloadSettings {
            enabled_tenants: vec![TenantId(1)],
            ..complete_settings()
        });
        let event = UploadEvent::new(TenantId(2), ResourceId(1), "/uploads/a.png");
        assert_eq!(
            hook(&h).on_upload(&event).await.unwrap(),
            IntakeDecision::Disabled
        );

        h.settings.replace(OffloadSettings::default());
        let event = UploadEvent::new(TenantId(1), ResourceId(1), "/uploads/a.png");
        assert_eq!(
            hook(&h).on_upload(&event).await.unwrap(),
            IntakeDecision::Disabled
        );
        assert_eq!(h.queue.count_by_status(None).await.unwrap().total(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_uploads_are_enqueued_twice() {
        let h = Harness::new();
        let event = UploadEvent::new(TenantId(1), ResourceId(1), "/uploads/a.png");
        hook(&h).on_upload(&event).await.unwrap();
        hook(&h).on_upload(&event).await.unwrap();
        assert_eq!(h.queue.count_by_status(None).await.unwrap().pending, 2);
    }

    #[tokio::test]
    async fn test_overlong_path_is_rejected_before_enqueue() {
        let h = Harness::new();
        let long_name = format!("/uploads/{}.png", "a".repeat(MAX_FILE_PATH_LEN));
        let event = UploadEvent::new(TenantId(1), ResourceId(1), "/uploads/ok.png")
            .with_variant("thumbnail", long_name);

        let err = hook(&h).on_upload(&event).await.unwrap_err();
        assert_eq!(err.kind, offload_core::error::ErrorKind::Validation);
        assert_eq!(h.queue.count_by_status(None).await.unwrap().total(), 0);
    }
}
