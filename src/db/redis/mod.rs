pub mod slot;

pub use slot::create_redis_client;
pub use slot::RedisSlot;
