//! Cron scheduler for the periodic offload cycle.

use std::sync::Arc;

use tokio_cron_scheduler::{Job as CronJob, JobScheduler};

use offload_core::error::{AppError, ErrorKind};

use crate::processor::OffloadProcessor;

/// Cron-based driver of the unscoped offload cycle
pub struct CronScheduler {
    /// The underlying job scheduler
    scheduler: JobScheduler,
    /// Processor invoked on every tick
    processor: Arc<OffloadProcessor>,
}

impl std::fmt::Debug for CronScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CronScheduler").finish()
    }
}

impl CronScheduler {
    /// Create a new cron scheduler
    pub async fn new(processor: Arc<OffloadProcessor>) -> Result<Self, AppError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::internal(format!("Failed to create scheduler: {}", e)))?;

        Ok(Self {
            scheduler,
            processor,
        })
    }

    /// Register the periodic offload cycle on `schedule`
    pub async fn register_offload_cycle(&self, schedule: &str) -> Result<(), AppError> {
        let processor = Arc::clone(&self.processor);
        let job = CronJob::new_async(schedule, move |_uuid, _lock| {
            let processor = Arc::clone(&processor);
            Box::pin(async move {
                tracing::debug!("Timer tick: running offload cycle");
                run_timer_cycle(&processor).await;
            })
        })
        .map_err(|e| {
            AppError::configuration(format!("Invalid offload schedule '{}': {}", schedule, e))
        })?;

        self.scheduler.add(job).await.map_err(|e| {
            AppError::internal(format!("Failed to add offload schedule: {}", e))
        })?;

        tracing::info!("Registered: offload_cycle ({})", schedule);
        Ok(())
    }

    /// Start the scheduler
    pub async fn start(&self) -> Result<(), AppError> {
        self.scheduler
            .start()
            .await
            .map_err(|e| AppError::internal(format!("Failed to start scheduler: {}", e)))?;

        tracing::info!("Cron scheduler started");
        Ok(())
    }

    /// Shutdown the scheduler
    pub async fn shutdown(&mut self) -> Result<(), AppError> {
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::internal(format!("Failed to shutdown scheduler: {}", e)))?;

        tracing::info!("Cron scheduler shut down");
        Ok(())
    }
}

/// One timer-triggered cycle. Incomplete settings and a held lease are
/// routine and never surface as errors.
async fn run_timer_cycle(processor: &OffloadProcessor) {
    match processor.run_cycle(None).await {
        Ok(_) => {}
        Err(e) if e.kind == ErrorKind::ConfigIncomplete => {
            tracing::debug!("Offload settings incomplete, skipping timer cycle");
        }
        Err(e) if e.kind == ErrorKind::Busy => {
            tracing::info!("Skipping timer cycle: {}", e.message);
        }
        Err(e) => {
            tracing::error!("Timer-triggered offload cycle failed: {}", e);
        }
    }
}
