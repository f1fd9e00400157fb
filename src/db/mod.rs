pub mod postgres;
pub mod redis;
pub mod slot;

pub use self::postgres::{create_pool, run_migrations};
pub use self::redis::{create_redis_client, RedisSlot};
pub use self::slot::{InteractionSlot, MemorySlot};
