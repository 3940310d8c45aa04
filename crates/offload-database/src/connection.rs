//! PostgreSQL connection pool and reachability check.

use std::time::{Duration, Instant};

use serde::Serialize;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::{info, warn};

use offload_core::config::DatabaseConfig;
use offload_core::error::{AppError, ErrorKind};

/// Result of pinging the queue database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DatabaseHealth {
    /// Round-trip time of the check query.
    pub latency_ms: u64,
    /// Whether the `offload_queue` table exists, i.e. migrations ran.
    pub queue_ready: bool,
}

/// Connection pool shared by the queue and resource repositories.
#[derive(Debug, Clone)]
pub struct DatabasePool {
    pool: PgPool,
}

impl DatabasePool {
    /// Open the pool described by `config`.
    ///
    /// Unreachable databases surface as `StorageUnavailable`, the same kind
    /// the repositories report.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, AppError> {
        let target = redact_url(&config.url);
        info!(
            url = %target,
            max_connections = config.max_connections,
            "Connecting to queue database"
        );

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections.min(config.max_connections))
            .acquire_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .idle_timeout(Duration::from_secs(config.idle_timeout_seconds))
            .connect(&config.url)
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::StorageUnavailable,
                    format!("Queue database {target} is unreachable"),
                    e,
                )
            })?;

        Ok(Self { pool })
    }

    /// The underlying sqlx pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Measure a round trip and check that the queue schema is in place.
    pub async fn ping(&self) -> Result<DatabaseHealth, AppError> {
        let started = Instant::now();
        let queue_ready = sqlx::query_scalar::<_, bool>(
            "SELECT to_regclass('offload_queue') IS NOT NULL",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::StorageUnavailable, "Queue database ping failed", e)
        })?;
        let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        if !queue_ready {
            warn!("Queue database reachable but offload_queue is missing");
        }
        Ok(DatabaseHealth {
            latency_ms,
            queue_ready,
        })
    }

    /// Drain and close every connection.
    pub async fn close(&self) {
        self.pool.close().await;
        info!("Queue database pool closed");
    }
}

/// Hide credentials in a connection URL: the userinfo password and any
/// `password=` query parameter.
pub fn redact_url(url: &str) -> String {
    let (scheme, rest) = url.split_once("://").unwrap_or(("", url));
    let (authority, tail) = match rest.find(['/', '?']) {
        Some(i) => rest.split_at(i),
        None => (rest, ""),
    };

    let authority = match authority.rsplit_once('@') {
        Some((userinfo, host)) => match userinfo.split_once(':') {
            Some((user, _)) => format!("{user}:****@{host}"),
            None => authority.to_string(),
        },
        None => authority.to_string(),
    };

    let tail = match tail.split_once('?') {
        Some((path, query)) => {
            let query: Vec<String> = query
                .split('&')
                .map(|pair| match pair.split_once('=') {
                    Some((key, _)) if key.eq_ignore_ascii_case("password") => {
                        format!("{key}=****")
                    }
                    _ => pair.to_string(),
                })
                .collect();
            format!("{path}?{}", query.join("&"))
        }
        None => tail.to_string(),
    };

    if scheme.is_empty() {
        format!("{authority}{tail}")
    } else {
        format!("{scheme}://{authority}{tail}")
    }
}
