//! Job status enumeration and per-status counts.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Status of a queue job. Succeeded jobs are deleted, so there is no
/// terminal success state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "offload_job_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Waiting for its scheduled time.
    Pending,
    /// Claimed by a processing cycle.
    Processing,
    /// Exhausted its attempts; waits for a manual reset.
    Failed,
}

impl JobStatus {
    /// Return the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Failed => "failed",
        }
    }

    /// Whether `self -> next` is a legal transition.
    ///
    /// A failed job must go back through `pending` before it can be claimed.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Processing)
                | (Self::Processing, Self::Pending)
                | (Self::Processing, Self::Failed)
                | (Self::Failed, Self::Pending)
        )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "failed" => Ok(Self::Failed),
            other => Err(format!("unknown job status: {other}")),
        }
    }
}

/// Aggregate job counts, optionally scoped to one tenant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    /// Jobs waiting to be processed.
    pub pending: i64,
    /// Jobs currently claimed.
    pub processing: i64,
    /// Jobs parked after exhausting their attempts.
    pub failed: i64,
}

impl StatusCounts {
    /// Add `count` jobs with `status`.
    pub fn record(&mut self, status: JobStatus, count: i64) {
        match status {
            JobStatus::Pending => self.pending += count,
            JobStatus::Processing => self.processing += count,
            JobStatus::Failed => self.failed += count,
        }
    }

    /// Total number of jobs in the queue.
    pub fn total(&self) -> i64 {
        self.pending + self.processing + self.failed
    }
}
