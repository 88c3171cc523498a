use std::env;
use std::time::Duration;

use quotaguard_application::QuotaSettings;
use quotaguard_core::{AppError, AppResult};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivityStoreConfig {
    Postgres { database_url: String },
    Redis { redis_url: String, key_prefix: String },
}

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub migrate_only: bool,
    pub activity_store: ActivityStoreConfig,
    pub retention_interval: Duration,
    pub quota_settings: QuotaSettings,
}

impl WorkerConfig {
    pub fn load() -> AppResult<Self> {
        let migrate_only = env::args().nth(1).as_deref() == Some("migrate");
        Self::from_lookup(migrate_only, |name| env::var(name).ok())
    }

    pub fn from_lookup<F>(migrate_only: bool, lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let store = lookup("ACTIVITY_STORE").unwrap_or_else(|| "postgres".to_owned());
        let activity_store = if migrate_only {
            ActivityStoreConfig::Postgres {
                database_url: required(&lookup, "DATABASE_URL")?,
            }
        } else {
            match store.trim() {
                "postgres" => ActivityStoreConfig::Postgres {
                    database_url: required(&lookup, "DATABASE_URL")?,
                },
                "redis" => ActivityStoreConfig::Redis {
                    redis_url: required(&lookup, "REDIS_URL")?,
                    key_prefix: lookup("REDIS_KEY_PREFIX")
                        .map(|value| value.trim().to_owned())
                        .filter(|value| !value.is_empty())
                        .unwrap_or_else(|| "quotaguard".to_owned()),
                },
                other => {
                    return Err(AppError::Validation(format!(
                        "ACTIVITY_STORE must be either 'postgres' or 'redis', got '{other}'"
                    )));
                }
            }
        };

        let retention_interval_secs = match lookup("RETENTION_INTERVAL_SECS") {
            Some(value) => value.trim().parse::<u64>().map_err(|error| {
                AppError::Validation(format!(
                    "invalid RETENTION_INTERVAL_SECS value '{value}': {error}"
                ))
            })?,
            None => 300,
        };

        if retention_interval_secs == 0 {
            return Err(AppError::Validation(
                "RETENTION_INTERVAL_SECS must be greater than zero".to_owned(),
            ));
        }

        Ok(Self {
            migrate_only,
            activity_store,
            retention_interval: Duration::from_secs(retention_interval_secs),
            quota_settings: QuotaSettings::from_lookup(&lookup)?,
        })
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required<F>(lookup: &F, name: &str) -> AppResult<String>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(value) if !value.trim().is_empty() => Ok(value),
        Some(_) => Err(AppError::Validation(format!("{name} must not be empty"))),
        None => Err(AppError::Validation(format!("{name} is required"))),
    }
}
