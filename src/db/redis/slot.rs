use redis::AsyncCommands;
use redis::Client;

use crate::db::slot::InteractionSlot;
use crate::error::AppResult;

/// Creates a Redis client for the interaction slot
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

/// Interaction slot stored under one Redis key
///
/// Unlike a cache entry the key carries no TTL, and writes complete before
/// `write` returns so the slot never lags behind the in-memory collection.
#[derive(Clone)]
pub struct RedisSlot {
    redis_client: Client,
    key: String,
}

impl RedisSlot {
    pub fn new(redis_client: Client, key: impl Into<String>) -> Self {
        Self {
            redis_client,
            key: key.into(),
        }
    }
}

#[async_trait::async_trait]
impl InteractionSlot for RedisSlot {
    async fn read(&self) -> AppResult<Option<String>> {
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let snapshot: Option<String> = conn.get(&self.key).await?;
        Ok(snapshot)
    }

    async fn write(&self, snapshot: String) -> AppResult<()> {
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let _: () = conn.set(&self.key, snapshot).await?;
        tracing::debug!(key = %self.key, "Interaction snapshot written");
        Ok(())
    }

    fn name(&self) -> &str {
        &self.key
    }
}
