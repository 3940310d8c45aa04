//! Background worker configuration.

use serde::{Deserialize, Serialize};

/// Offload processor and scheduler configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Whether the periodic drainer is enabled.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Cron expression (with seconds) for the periodic cycle.
    #[serde(default = "default_schedule")]
    pub schedule: String,
    /// Maximum number of due jobs handled per cycle.
    #[serde(default = "default_batch_size")]
    pub batch_size: i64,
    /// Delay before a failed job becomes due again, in seconds.
    #[serde(default = "default_retry_delay")]
    pub retry_delay_seconds: u64,
    /// Failed attempts after which a job is parked as `failed`.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: i32,
    /// Delay applied to jobs reset by "retry failed", in seconds.
    #[serde(default = "default_retry_grace")]
    pub retry_grace_seconds: u64,
    /// Lifetime of the cycle lease, in seconds. A crashed holder's lease
    /// can be taken over after this long.
    #[serde(default = "default_lease")]
    pub lease_seconds: u64,
    /// Park jobs whose local file is gone instead of retrying them.
    #[serde(default)]
    pub fail_fast_missing_files: bool,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            schedule: default_schedule(),
            batch_size: default_batch_size(),
            retry_delay_seconds: default_retry_delay(),
            max_attempts: default_max_attempts(),
            retry_grace_seconds: default_retry_grace(),
            lease_seconds: default_lease(),
            fail_fast_missing_files: false,
        }
    }
}

impl WorkerConfig {
    /// Retry delay as a `chrono::Duration`.
    pub fn retry_delay(&self) -> chrono::Duration {
        seconds(self.retry_delay_seconds)
    }

    /// Retry grace delay as a `chrono::Duration`.
    pub fn retry_grace(&self) -> chrono::Duration {
        seconds(self.retry_grace_seconds)
    }

    /// Lease lifetime as a `chrono::Duration`.
    pub fn lease_ttl(&self) -> chrono::Duration {
        seconds(self.lease_seconds)
    }
}

fn seconds(value: u64) -> chrono::Duration {
    chrono::Duration::seconds(i64::try_from(value).unwrap_or(i64::MAX))
}

fn default_true() -> bool {
    true
}

fn default_schedule() -> String {
    "0 */5 * * * *".to_string()
}

fn default_batch_size() -> i64 {
    20
}

fn default_retry_delay() -> u64 {
    900
}

fn default_max_attempts() -> i32 {
    5
}

fn default_retry_grace() -> u64 {
    60
}

fn default_lease() -> u64 {
    600
}
