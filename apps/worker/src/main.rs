//! Quotaguard activity retention worker.

#![forbid(unsafe_code)]

mod worker_config;

use std::sync::Arc;

use quotaguard_application::{
    ActivityLog, ActivityRetentionService, SystemClock, standard_policy_set,
};
use quotaguard_core::{AppError, AppResult};
use quotaguard_domain::QuotaPolicySet;
use quotaguard_infrastructure::{PostgresActivityStore, RedisActivityStore};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::{error, info, warn};

use crate::worker_config::{ActivityStoreConfig, WorkerConfig, init_tracing};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = WorkerConfig::load()?;
    let policies = Arc::new(standard_policy_set(&config.quota_settings)?);

    if config.migrate_only {
        if let ActivityStoreConfig::Postgres { database_url } = &config.activity_store {
            connect_and_migrate(database_url.as_str()).await?;
        }
        info!("database migrations applied successfully");
        return Ok(());
    }

    let activity_log = build_activity_log(&config.activity_store, &policies).await?;
    let retention_service =
        ActivityRetentionService::new(activity_log, policies.clone(), Arc::new(SystemClock));

    info!(
        policy_count = policies.len(),
        retention_interval_secs = config.retention_interval.as_secs(),
        "quotaguard-worker started"
    );

    loop {
        match retention_service.purge_expired().await {
            Ok(_) => {}
            Err(error) if error.is_transient() => {
                warn!(error = %error, "failed to purge expired activity, retrying next sweep");
            }
            Err(error) => {
                error!(error = %error, "activity purge failed");
                return Err(error);
            }
        }

        tokio::time::sleep(config.retention_interval).await;
    }
}

async fn build_activity_log(
    store: &ActivityStoreConfig,
    policies: &QuotaPolicySet,
) -> AppResult<Arc<dyn ActivityLog>> {
    match store {
        ActivityStoreConfig::Postgres { database_url } => {
            let pool = connect_and_migrate(database_url.as_str()).await?;
            Ok(Arc::new(PostgresActivityStore::new(pool)))
        }
        ActivityStoreConfig::Redis {
            redis_url,
            key_prefix,
        } => {
            let client = redis::Client::open(redis_url.as_str()).map_err(|error| {
                AppError::Validation(format!("invalid REDIS_URL '{redis_url}': {error}"))
            })?;
            let retention = policies.longest_window().ok_or_else(|| {
                AppError::Configuration("no quota policies are configured".to_owned())
            })?;

            Ok(Arc::new(RedisActivityStore::new(
                client,
                key_prefix.as_str(),
                retention,
            )?))
        }
    }
}

async fn connect_and_migrate(database_url: &str) -> AppResult<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await
        .map_err(|error| AppError::Unavailable(format!("failed to connect to database: {error}")))?;

    sqlx::migrate!("../../crates/infrastructure/migrations")
        .run(&pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to run migrations: {error}")))?;

    Ok(pool)
}
