//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod in_memory_activity_store;
mod postgres_activity_store;
mod redis_activity_store;

pub use in_memory_activity_store::InMemoryActivityStore;
pub use postgres_activity_store::PostgresActivityStore;
pub use redis_activity_store::RedisActivityStore;
