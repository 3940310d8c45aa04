//! Database migration management commands.

use clap::{Args, Subcommand};

use offload_core::config::AppConfig;
use offload_core::error::AppError;
use offload_database::DatabasePool;

use crate::output::{self, Tone};

/// Arguments for the migrate command
#[derive(Debug, Args)]
pub struct MigrateArgs {
    /// Migration subcommand
    #[command(subcommand)]
    pub command: MigrateCommand,
}

/// Migration subcommands
#[derive(Debug, Subcommand)]
pub enum MigrateCommand {
    /// Run all pending migrations
    Run,
}

/// Execute migration commands
pub async fn execute(args: &MigrateArgs, config: &AppConfig) -> Result<(), AppError> {
    let db = DatabasePool::connect(&config.database).await?;

    match &args.command {
        MigrateCommand::Run => {
            println!("Running queue database migrations...");
            offload_database::migration::run_migrations(db.pool()).await?;
            let health = db.ping().await?;
            if health.queue_ready {
                output::notice(
                    Tone::Done,
                    &format!("Queue schema is up to date ({} ms round trip).", health.latency_ms),
                );
            } else {
                output::notice(Tone::Failure, "Migrations ran but offload_queue is missing.");
            }
        }
    }

    db.close().await;
    Ok(())
}
