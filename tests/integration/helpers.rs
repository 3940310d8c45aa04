//! Shared test helpers for integration tests.

use std::sync::Arc;

use chrono::{SubsecRound, Utc};

use offload_core::config::DatabaseConfig;
use offload_core::types::clock::ManualClock;
use offload_core::types::id::TenantId;
use offload_database::{DatabasePool, QueueRepository, ResourceRepository};

/// Repositories over a migrated test database, driven by a manual clock
pub struct TestDb {
    pub clock: Arc<ManualClock>,
    pub queue: QueueRepository,
    pub resources: ResourceRepository,
    /// Tenant unique to this test, so concurrent tests never see each
    /// other's rows
    pub tenant: TenantId,
}

impl TestDb {
    pub async fn new() -> Self {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let config = DatabaseConfig {
            url,
            max_connections: 5,
            min_connections: 1,
            connect_timeout_seconds: 10,
            idle_timeout_seconds: 60,
        };
        let db = DatabasePool::connect(&config)
            .await
            .expect("Failed to connect to test database");
        offload_database::migration::run_migrations(db.pool())
            .await
            .expect("Failed to run migrations");

        // Postgres keeps microseconds
        let clock = Arc::new(ManualClock::new(Utc::now().trunc_subsecs(6)));
        let tenant = TenantId((uuid::Uuid::new_v4().as_u128() as i64) & i64::MAX);

        Self {
            queue: QueueRepository::new(db.pool().clone(), clock.clone()),
            resources: ResourceRepository::new(db.pool().clone(), clock.clone()),
            clock,
            tenant,
        }
    }
}
