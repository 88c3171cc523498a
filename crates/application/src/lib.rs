//! Application services and ports.

#![forbid(unsafe_code)]

mod quota_engine;
mod quota_ports;
mod quota_settings;
mod retention_service;

pub use quota_engine::{QuotaEngine, QuotaRequest};
pub use quota_ports::{ActivityLog, Clock, EventCountQuery, EventCounter, FixedClock, SystemClock};
pub use quota_settings::{QuotaSettings, standard_policy_set};
pub use retention_service::ActivityRetentionService;
