//! Configuration inspection commands.

use clap::{Args, Subcommand};
use serde::Serialize;

use offload_core::config::AppConfig;
use offload_core::error::AppError;
use offload_database::connection::redact_url;

use crate::output::{self, Fields, OutputFormat, Tone};

/// Arguments for config commands
#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Config subcommand
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Config subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Check that the offload settings are complete
    Check,
}

#[derive(Debug, Serialize)]
struct ConfigReport<'a> {
    complete: bool,
    missing: Vec<&'static str>,
    database_url: String,
    api_key: String,
    storage_zone: &'a str,
    cdn_url: &'a str,
    retained_extensions: Vec<String>,
    offload_delay_seconds: u64,
    schedule: &'a str,
}

/// Execute config commands
pub fn execute(args: &ConfigArgs, config: &AppConfig, format: OutputFormat) -> Result<(), AppError> {
    match &args.command {
        ConfigCommand::Check => {
            let offload = &config.offload;
            let report = ConfigReport {
                complete: offload.is_complete(),
                missing: offload.missing_fields(),
                database_url: redact_url(&config.database.url),
                api_key: redact_secret(&offload.api_key),
                storage_zone: &offload.storage_zone,
                cdn_url: &offload.cdn_url,
                retained_extensions: offload.retained_extensions(),
                offload_delay_seconds: offload.offload_delay_seconds,
                schedule: &config.worker.schedule,
            };
            output::emit(&report, format, |r| {
                if r.complete {
                    output::notice(Tone::Done, "Offload settings are complete.");
                } else {
                    output::notice(
                        Tone::Attention,
                        &format!("Missing settings: {}", r.missing.join(", ")),
                    );
                }
                Fields::new()
                    .add("Database", &r.database_url)
                    .add("API key", &r.api_key)
                    .add("Storage zone", r.storage_zone)
                    .add("CDN URL", r.cdn_url)
                    .add("Kept local", r.retained_extensions.join(", "))
                    .add("Offload delay (s)", r.offload_delay_seconds)
                    .add("Schedule", r.schedule)
                    .print();
            })?;
        }
    }
    Ok(())
}

/// Show only the last four characters of a secret.
fn redact_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    match chars.len() {
        0 => "(unset)".to_string(),
        n if n <= 8 => "****".to_string(),
        n => format!("****{}", chars[n - 4..].iter().collect::<String>()),
    }
}
