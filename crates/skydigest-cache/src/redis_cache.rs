//! Redis-backed shared cache.

use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands};
use skydigest_core::{error::SkyError, traits::SharedCache};
use std::time::Duration;
use tracing::info;

/// Shared cache on a Redis server. Every operation is a single command, so
/// `set_if_absent` is atomic across processes.
#[derive(Clone)]
pub struct RedisCache {
    manager: ConnectionManager,
}

impl RedisCache {
    /// Open a managed connection. The manager reconnects on its own after the
    /// initial handshake succeeds.
    pub async fn connect(redis_url: &str) -> Result<Self, SkyError> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| SkyError::Cache(format!("invalid redis url: {e}")))?;
        let manager = client
            .get_connection_manager()
            .await
            .map_err(|e| SkyError::Cache(format!("failed to connect to redis: {e}")))?;
        info!("Connected to shared cache at {}", redact(redis_url));
        Ok(Self { manager })
    }
}

/// Redis rejects `EX 0`; sub-second TTLs round up to one second.
fn ttl_secs(ttl: Duration) -> u64 {
    ttl.as_secs().max(1)
}

/// Strip credentials from a connection URL before logging it.
fn redact(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme), Some(at)) if at > scheme => {
            format!("{}://***@{}", &url[..scheme], &url[at + 1..])
        }
        _ => url.to_string(),
    }
}

#[async_trait]
impl SharedCache for RedisCache {
    fn name(&self) -> &str {
        "redis"
    }

    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> Result<bool, SkyError> {
        let mut conn = self.manager.clone();
        let reply: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("NX")
            .arg("EX")
            .arg(ttl_secs(ttl))
            .query_async(&mut conn)
            .await
            .map_err(|e| SkyError::Cache(format!("SET NX {key} failed: {e}")))?;
        Ok(reply.is_some())
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), SkyError> {
        let mut conn = self.manager.clone();
        conn.set_ex::<_, _, ()>(key, value, ttl_secs(ttl))
            .await
            .map_err(|e| SkyError::Cache(format!("SET EX {key} failed: {e}")))?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, SkyError> {
        let mut conn = self.manager.clone();
        conn.get(key)
            .await
            .map_err(|e| SkyError::Cache(format!("GET {key} failed: {e}")))
    }

    async fn delete(&self, key: &str) -> Result<(), SkyError> {
        let mut conn = self.manager.clone();
        conn.del::<_, ()>(key)
            .await
            .map_err(|e| SkyError::Cache(format!("DEL {key} failed: {e}")))?;
        Ok(())
    }
}
