//! Offload queue management commands.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use offload_core::config::AppConfig;
use offload_core::error::AppError;
use offload_core::events::upload::UploadEvent;
use offload_core::types::id::{ResourceId, TenantId};
use offload_database::store::{QueueStore, ResourceStore};
use offload_entity::job::QueueJob;
use offload_worker::IntakeDecision;

use super::Context;
use crate::output::{self, Fields, OutputFormat, Tone};

/// Arguments for queue commands
#[derive(Debug, Args)]
pub struct QueueArgs {
    /// Queue subcommand
    #[command(subcommand)]
    pub command: QueueCommand,
}

/// Queue subcommands
#[derive(Debug, Subcommand)]
pub enum QueueCommand {
    /// Show job and resource counts
    Status {
        /// Restrict to one tenant
        #[arg(short, long)]
        tenant: Option<TenantId>,
    },
    /// List jobs that are due for processing
    Due {
        /// Restrict to one tenant
        #[arg(short, long)]
        tenant: Option<TenantId>,
        /// Maximum number of jobs to list
        #[arg(short, long, default_value_t = 50)]
        limit: i64,
    },
    /// Run one processing cycle now
    Process {
        /// Restrict to one tenant
        #[arg(short, long)]
        tenant: Option<TenantId>,
    },
    /// Return failed jobs to the queue
    Retry {
        /// Restrict to one tenant
        #[arg(short, long)]
        tenant: Option<TenantId>,
    },
    /// Feed an uploaded file through the intake hook
    Enqueue {
        /// Owning tenant
        #[arg(short, long)]
        tenant: TenantId,
        /// Owning resource (0 when unknown)
        #[arg(short, long, default_value_t = ResourceId(0))]
        resource: ResourceId,
        /// Derived renditions as `name=path`
        #[arg(long = "variant", value_parser = parse_variant)]
        variants: Vec<(String, PathBuf)>,
        /// Absolute path of the uploaded file
        file: PathBuf,
    },
}

/// One due job as a table row
#[derive(Debug, Serialize, Tabled)]
struct JobRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Tenant")]
    tenant: i64,
    #[tabled(rename = "Resource")]
    resource: i64,
    #[tabled(rename = "Attempts")]
    attempts: i32,
    #[tabled(rename = "Scheduled")]
    scheduled: String,
    #[tabled(rename = "Kind")]
    kind: &'static str,
    #[tabled(rename = "File")]
    file: String,
}

impl From<QueueJob> for JobRow {
    fn from(job: QueueJob) -> Self {
        Self {
            id: job.id.get(),
            tenant: job.tenant_id.get(),
            resource: job.resource_id.get(),
            attempts: job.attempts,
            scheduled: job.scheduled_time.format("%Y-%m-%d %H:%M:%S").to_string(),
            kind: if job.is_variant { "variant" } else { "original" },
            file: job.file_path,
        }
    }
}

#[derive(Debug, Serialize)]
struct StatusView {
    pending: i64,
    processing: i64,
    failed: i64,
    offloaded: i64,
    local_only: i64,
}

#[derive(Debug, Serialize)]
struct RetryView {
    reset: u64,
}

/// Execute queue commands
pub async fn execute(
    args: &QueueArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let ctx = Context::connect(config).await?;

    match &args.command {
        QueueCommand::Status { tenant } => {
            let counts = ctx.queue.count_by_status(*tenant).await?;
            let summary = ctx.resources.summary(*tenant).await?;
            let view = StatusView {
                pending: counts.pending,
                processing: counts.processing,
                failed: counts.failed,
                offloaded: summary.offloaded,
                local_only: summary.local_only,
            };
            output::emit(&view, format, |v| {
                println!("Offload Queue Status:");
                Fields::new()
                    .add("Pending", v.pending)
                    .add("Processing", v.processing)
                    .add("Failed", v.failed)
                    .add("Offloaded resources", v.offloaded)
                    .add("Local-only resources", v.local_only)
                    .add("Worker enabled", config.worker.enabled)
                    .add("Schedule", &config.worker.schedule)
                    .print();
            })?;
        }
        QueueCommand::Due { tenant, limit } => {
            let rows: Vec<JobRow> = ctx
                .queue
                .fetch_due(*tenant, *limit)
                .await?
                .into_iter()
                .map(JobRow::from)
                .collect();
            output::emit_rows(&rows, format, "No jobs are due.")?;
        }
        QueueCommand::Process { tenant } => {
            let report = ctx.processor.run_cycle(*tenant).await?;
            output::emit(&report, format, |r| {
                if r.selected == 0 {
                    output::notice(Tone::Attention, "No files were due for offloading.");
                } else {
                    output::notice(
                        Tone::Done,
                        &format!(
                            "Processed {} file(s): {} offloaded, {} failed, {} skipped",
                            r.selected, r.succeeded, r.failed, r.skipped
                        ),
                    );
                }
            })?;
        }
        QueueCommand::Retry { tenant } => {
            let reset = ctx.processor.retry_failed(*tenant).await?;
            output::emit(&RetryView { reset }, format, |v| {
                output::notice(
                    Tone::Done,
                    &format!("{} failed file(s) queued for retry", v.reset),
                );
            })?;
        }
        QueueCommand::Enqueue {
            tenant,
            resource,
            variants,
            file,
        } => {
            if !file.is_absolute() {
                return Err(AppError::validation("The file path must be absolute"));
            }
            let event = variants.iter().fold(
                UploadEvent::new(*tenant, *resource, file.clone()),
                |event, (name, path)| event.with_variant(name.clone(), path.clone()),
            );
            let decision = ctx.intake().on_upload(&event).await?;
            output::emit(&decision, format, |d| match d {
                IntakeDecision::Disabled => {
                    output::notice(Tone::Attention, "Offloading is not enabled for this tenant.")
                }
                IntakeDecision::AlreadyLocal => {
                    output::notice(Tone::Attention, "The resource is pinned to local storage.")
                }
                IntakeDecision::LocalOnly => {
                    output::notice(Tone::Done, "File type is retained locally.")
                }
                IntakeDecision::Enqueued(ids) => {
                    output::notice(Tone::Done, &format!("Enqueued {} file(s)", ids.len()))
                }
            })?;
        }
    }

    ctx.db.close().await;
    Ok(())
}

fn parse_variant(raw: &str) -> Result<(String, PathBuf), String> {
    let (name, path) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected name=path, got '{raw}'"))?;
    if name.is_empty() || path.is_empty() {
        return Err(format!("expected name=path, got '{raw}'"));
    }
    Ok((name.to_string(), PathBuf::from(path)))
}
