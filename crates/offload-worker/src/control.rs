//! Manual triggers: "process now", "retry failed" and status queries.
//!
//! Every trigger checks the caller's privilege before touching the queue
//! and answers with an [`Ack`] carrying a human-readable message. Internal
//! error detail never reaches the caller.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use offload_core::error::{AppError, ErrorKind};
use offload_core::result::AppResult;
use offload_core::types::id::TenantId;
use offload_entity::job::StatusCounts;

use crate::processor::OffloadProcessor;

/// Who is invoking a manual trigger
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    /// Display name used in logs
    pub name: String,
    /// Whether the caller holds administrative privilege
    pub is_admin: bool,
}

impl Caller {
    /// An administrative caller
    pub fn admin(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_admin: true,
        }
    }

    /// A caller without privileges
    pub fn anonymous() -> Self {
        Self {
            name: "anonymous".to_string(),
            is_admin: false,
        }
    }

    fn require_admin(&self) -> AppResult<()> {
        if self.is_admin {
            return Ok(());
        }
        tracing::warn!(caller = %self.name, "Rejected offload trigger from unprivileged caller");
        Err(AppError::permission_denied(
            "Administrative privilege is required",
        ))
    }
}

/// Acknowledgment returned by a manual trigger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    /// Whether the trigger did its work
    pub success: bool,
    /// Human-readable outcome
    pub message: String,
}

impl Ack {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Manual control surface over the processor
#[derive(Debug, Clone)]
pub struct OffloadControl {
    processor: Arc<OffloadProcessor>,
}

impl OffloadControl {
    /// Create a new control surface
    pub fn new(processor: Arc<OffloadProcessor>) -> Self {
        Self { processor }
    }

    /// Run a cycle now, optionally scoped to a tenant
    pub async fn process_now(&self, caller: &Caller, tenant_id: Option<TenantId>) -> AppResult<Ack> {
        caller.require_admin()?;
        tracing::info!(caller = %caller.name, tenant_id = ?tenant_id, "Manual offload cycle requested");

        Ok(match self.processor.run_cycle(tenant_id).await {
            Ok(report) if report.selected == 0 => Ack::ok("No files were due for offloading"),
            Ok(report) => Ack::ok(format!(
                "Processed {} file(s): {} offloaded, {} failed, {} skipped",
                report.selected, report.succeeded, report.failed, report.skipped
            )),
            Err(e) => {
                tracing::warn!(caller = %caller.name, "Manual offload cycle did not run: {}", e);
                Ack::failed(public_message(&e))
            }
        })
    }

    /// Reset failed jobs, optionally scoped to a tenant
    pub async fn retry_failed(&self, caller: &Caller, tenant_id: Option<TenantId>) -> AppResult<Ack> {
        caller.require_admin()?;
        tracing::info!(caller = %caller.name, tenant_id = ?tenant_id, "Manual retry of failed jobs requested");

        Ok(match self.processor.retry_failed(tenant_id).await {
            Ok(0) => Ack::ok("There were no failed files to retry"),
            Ok(reset) => Ack::ok(format!("{reset} failed file(s) queued for retry")),
            Err(e) => {
                tracing::warn!(caller = %caller.name, "Retry of failed jobs did not run: {}", e);
                Ack::failed(public_message(&e))
            }
        })
    }

    /// Job counts per status, optionally scoped to a tenant
    pub async fn status(&self, caller: &Caller, tenant_id: Option<TenantId>) -> AppResult<StatusCounts> {
        caller.require_admin()?;
        self.processor.status(tenant_id).await
    }
}

fn public_message(error: &AppError) -> String {
    match error.kind {
        ErrorKind::ConfigIncomplete => {
            "Offload settings are incomplete: API key, storage zone and CDN URL are required"
                .to_string()
        }
        ErrorKind::Busy => "A processing cycle is already running, try again shortly".to_string(),
        ErrorKind::StorageUnavailable => {
            "The offload queue is temporarily unavailable, try again later".to_string()
        }
        _ => "Processing failed, see server logs for details".to_string(),
    }
}
