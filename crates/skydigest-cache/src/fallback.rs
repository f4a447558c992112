//! Shared cache with a process-local fallback.
//!
//! Every operation goes to the shared backend first, bounded by a timeout.
//! When the backend is missing, errors, or times out, the operation is served
//! by a [`LocalCache`] instead and the degradation is logged at `warn!`.
//! While degraded, guarantees hold per process only.

use crate::{local::LocalCache, redis_cache::RedisCache};
use async_trait::async_trait;
use skydigest_core::{config::CacheConfig, error::SkyError, traits::SharedCache};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

pub struct FallbackCache {
    shared: Option<Arc<dyn SharedCache>>,
    local: LocalCache,
    timeout: Duration,
    /// Set while the last shared-cache call failed.
    degraded: AtomicBool,
}

impl FallbackCache {
    pub fn new(shared: Option<Arc<dyn SharedCache>>, timeout: Duration) -> Self {
        if shared.is_none() {
            warn!("no shared cache configured: idempotency and admin sessions are process-local");
        }
        Self {
            shared,
            local: LocalCache::new(),
            timeout,
            degraded: AtomicBool::new(false),
        }
    }

    /// Process-local only.
    pub fn local_only() -> Self {
        Self::new(None, Duration::from_secs(1))
    }

    /// Build from config: Redis when `redis_url` is set and reachable,
    /// otherwise process-local.
    pub async fn from_config(config: &CacheConfig) -> Self {
        if config.redis_url.trim().is_empty() {
            return Self::new(None, config.timeout());
        }
        let connect = tokio::time::timeout(config.timeout(), RedisCache::connect(&config.redis_url));
        match connect.await {
            Ok(Ok(redis)) => {
                let shared: Arc<dyn SharedCache> = Arc::new(redis);
                Self::new(Some(shared), config.timeout())
            }
            Ok(Err(e)) => {
                warn!("shared cache unavailable, degrading to process-local: {e}");
                Self::new(None, config.timeout())
            }
            Err(_) => {
                warn!("shared cache connect timed out, degrading to process-local");
                Self::new(None, config.timeout())
            }
        }
    }

    /// Whether a shared backend is configured.
    pub fn is_shared(&self) -> bool {
        self.shared.is_some()
    }

    /// Whether the last shared call fell back to local state.
    pub fn is_degraded(&self) -> bool {
        self.shared.is_none() || self.degraded.load(Ordering::Relaxed)
    }

    /// Run `op` against the shared backend. `None` means fall back.
    async fn try_shared<T, F, Fut>(&self, what: &str, op: F) -> Option<T>
    where
        F: FnOnce(Arc<dyn SharedCache>) -> Fut,
        Fut: Future<Output = Result<T, SkyError>>,
    {
        let shared = self.shared.clone()?;
        let name = shared.name().to_string();
        match tokio::time::timeout(self.timeout, op(shared)).await {
            Ok(Ok(value)) => {
                if self.degraded.swap(false, Ordering::Relaxed) {
                    info!("shared cache {name} recovered");
                }
                Some(value)
            }
            Ok(Err(e)) => {
                self.degraded.store(true, Ordering::Relaxed);
                warn!("shared cache {name} {what} failed, using process-local state: {e}");
                None
            }
            Err(_) => {
                self.degraded.store(true, Ordering::Relaxed);
                warn!(
                    "shared cache {name} {what} timed out after {:?}, using process-local state",
                    self.timeout
                );
                None
            }
        }
    }
}

#[async_trait]
impl SharedCache for FallbackCache {
    fn name(&self) -> &str {
        match &self.shared {
            Some(shared) => shared.name(),
            None => self.local.name(),
        }
    }

    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> Result<bool, SkyError> {
        let shared = self
            .try_shared("set_if_absent", |c| async move {
                c.set_if_absent(key, value, ttl).await
            })
            .await;
        match shared {
            Some(stored) => Ok(stored),
            None => self.local.set_if_absent(key, value, ttl).await,
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), SkyError> {
        let shared = self
            .try_shared("set", |c| async move { c.set(key, value, ttl).await })
            .await;
        match shared {
            Some(()) => Ok(()),
            None => self.local.set(key, value, ttl).await,
        }
    }

    async fn get(&self, key: &str) -> Result<Option<String>, SkyError> {
        let shared = self
            .try_shared("get", |c| async move { c.get(key).await })
            .await;
        match shared {
            Some(Some(value)) => Ok(Some(value)),
            // Values written while degraded live only here.
            Some(None) | None => self.local.get(key).await,
        }
    }

    async fn delete(&self, key: &str) -> Result<(), SkyError> {
        self.try_shared("delete", |c| async move { c.delete(key).await })
            .await;
        self.local.delete(key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    /// Backend that fails every call.
    struct BrokenCache {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SharedCache for BrokenCache {
        fn name(&self) -> &str {
            "broken"
        }
        async fn set_if_absent(&self, _: &str, _: &str, _: Duration) -> Result<bool, SkyError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(SkyError::Cache("connection refused".into()))
        }
        async fn set(&self, _: &str, _: &str, _: Duration) -> Result<(), SkyError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(SkyError::Cache("connection refused".into()))
        }
        async fn get(&self, _: &str) -> Result<Option<String>, SkyError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(SkyError::Cache("connection refused".into()))
        }
        async fn delete(&self, _: &str) -> Result<(), SkyError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(SkyError::Cache("connection refused".into()))
        }
    }

    /// Backend that never answers in time.
    struct HangingCache;

    #[async_trait]
    impl SharedCache for HangingCache {
        fn name(&self) -> &str {
            "hanging"
        }
        async fn set_if_absent(&self, _: &str, _: &str, _: Duration) -> Result<bool, SkyError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(true)
        }
        async fn set(&self, _: &str, _: &str, _: Duration) -> Result<(), SkyError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(())
        }
        async fn get(&self, _: &str) -> Result<Option<String>, SkyError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(None)
        }
        async fn delete(&self, _: &str) -> Result<(), SkyError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_shared_backend_used_when_healthy() {
        let backend = Arc::new(LocalCache::new());
        let shared: Arc<dyn SharedCache> = backend.clone();
        let cache = FallbackCache::new(Some(shared), Duration::from_secs(1));
        assert!(cache
            .set_if_absent("k", "1", Duration::from_secs(60))
            .await
            .unwrap());
        assert_eq!(backend.get("k").await.unwrap().as_deref(), Some("1"));
        assert!(!cache.is_degraded());
        assert_eq!(cache.name(), "local");
    }

    #[tokio::test]
    async fn test_errors_fall_back_to_local() {
        let backend = Arc::new(BrokenCache {
            calls: AtomicUsize::new(0),
        });
        let shared: Arc<dyn SharedCache> = backend.clone();
        let cache = FallbackCache::new(Some(shared), Duration::from_secs(1));
        let ttl = Duration::from_secs(60);

        assert!(cache.set_if_absent("evt", "1", ttl).await.unwrap());
        assert!(!cache.set_if_absent("evt", "1", ttl).await.unwrap());
        assert!(cache.is_degraded());

        cache.set("s", "v", ttl).await.unwrap();
        assert_eq!(cache.get("s").await.unwrap().as_deref(), Some("v"));
        cache.delete("s").await.unwrap();
        assert!(cache.get("s").await.unwrap().is_none());

        assert_eq!(backend.calls.load(Ordering::SeqCst), 6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeouts_fall_back_to_local() {
        let shared: Arc<dyn SharedCache> = Arc::new(HangingCache);
        let cache = FallbackCache::new(Some(shared), Duration::from_millis(200));
        assert!(cache
            .set_if_absent("evt", "1", Duration::from_secs(60))
            .await
            .unwrap());
        assert!(cache.is_degraded());
    }

    #[tokio::test]
    async fn test_local_only_is_degraded() {
        let cache = FallbackCache::local_only();
        assert!(!cache.is_shared());
        assert!(cache.is_degraded());
        assert!(cache
            .set_if_absent("k", "1", Duration::from_secs(60))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_from_config_without_url_is_local() {
        let cache = FallbackCache::from_config(&CacheConfig::default()).await;
        assert!(!cache.is_shared());
    }
}
