//! Queue job entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use offload_core::types::id::{JobId, ResourceId, TenantId};

use super::status::JobStatus;

/// Longest file path the queue can hold.
pub const MAX_FILE_PATH_LEN: usize = 255;

/// One enqueued offload task.
///
/// Only `status`, `scheduled_time` and `attempts` change after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct QueueJob {
    /// Store-assigned, monotonically increasing identifier.
    pub id: JobId,
    /// Site that owns the file.
    pub tenant_id: TenantId,
    /// Media object the file belongs to (0 when unknown).
    pub resource_id: ResourceId,
    /// Absolute path of the local file to transfer.
    pub file_path: String,
    /// Derived rendition rather than the resource's original file.
    pub is_variant: bool,
    /// Current status.
    pub status: JobStatus,
    /// Earliest instant the job may be processed.
    pub scheduled_time: DateTime<Utc>,
    /// Failed attempts so far.
    pub attempts: i32,
}

impl QueueJob {
    /// Whether the job may be selected at `now`.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.status == JobStatus::Pending && self.scheduled_time <= now
    }
}
