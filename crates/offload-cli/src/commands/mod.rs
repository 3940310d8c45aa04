//! CLI command definitions and dispatch.

pub mod config;
pub mod migrate;
pub mod queue;
pub mod resolve;

use std::sync::Arc;

use clap::{Parser, Subcommand};

use offload_core::config::AppConfig;
use offload_core::error::AppError;
use offload_core::traits::settings::StaticSettings;
use offload_core::traits::tenant::NoopTenantContext;
use offload_core::types::clock::{Clock, SystemClock};
use offload_database::{DatabasePool, QueueRepository, ResourceRepository};
use offload_storage::BunnyStore;
use offload_worker::{IntakeHook, OffloadProcessor, UrlResolver};

use crate::output::OutputFormat;

/// CDN Offload: move uploaded media to a CDN storage zone
#[derive(Debug, Parser)]
#[command(name = "offload-cli", version, about, long_about = None)]
pub struct Cli {
    /// Path to an extra configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Configuration environment overlay (config/{env}.toml)
    #[arg(long, env = "OFFLOAD_ENV", default_value = "development")]
    pub env: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Database migration management
    Migrate(migrate::MigrateArgs),
    /// Offload queue management
    Queue(queue::QueueArgs),
    /// Resolve the URL a resource is served from
    Resolve(resolve::ResolveArgs),
    /// Configuration inspection
    Config(config::ConfigArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> Result<(), AppError> {
        let config = AppConfig::load(self.config.as_deref(), &self.env)?;
        match &self.command {
            Commands::Migrate(args) => migrate::execute(args, &config).await,
            Commands::Queue(args) => queue::execute(args, &config, self.format).await,
            Commands::Resolve(args) => resolve::execute(args, &config, self.format).await,
            Commands::Config(args) => config::execute(args, &config, self.format),
        }
    }
}

/// Stores and pipeline components wired against the configured database
pub struct Context {
    pub db: DatabasePool,
    pub queue: Arc<QueueRepository>,
    pub resources: Arc<ResourceRepository>,
    pub settings: Arc<StaticSettings>,
    pub processor: OffloadProcessor,
}

impl Context {
    /// Connect to the database and build the pipeline
    pub async fn connect(config: &AppConfig) -> Result<Self, AppError> {
        let db = DatabasePool::connect(&config.database).await?;
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let queue = Arc::new(QueueRepository::new(db.pool().clone(), clock.clone()));
        let resources = Arc::new(ResourceRepository::new(db.pool().clone(), clock));
        let settings = Arc::new(StaticSettings::new(config.offload.clone()));

        let processor = OffloadProcessor::new(
            queue.clone(),
            resources.clone(),
            Arc::new(BunnyStore::new()?),
            settings.clone(),
            Arc::new(NoopTenantContext),
            config.worker.clone(),
        );

        Ok(Self {
            db,
            queue,
            resources,
            settings,
            processor,
        })
    }

    pub fn intake(&self) -> IntakeHook {
        IntakeHook::new(
            self.queue.clone(),
            self.resources.clone(),
            self.settings.clone(),
        )
    }

    pub fn resolver(&self) -> UrlResolver {
        UrlResolver::new(self.resources.clone(), self.settings.clone())
    }
}
