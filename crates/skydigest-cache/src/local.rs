//! Process-local TTL cache.

use async_trait::async_trait;
use skydigest_core::{error::SkyError, traits::SharedCache};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

/// Expired entries are swept once every this many writes.
const SWEEP_EVERY: usize = 256;

struct Inner {
    entries: HashMap<String, (String, Instant)>,
    writes: usize,
}

/// In-memory key/value store with per-key expiry.
///
/// Atomic within one process only. Used when no shared cache is configured
/// and as the fallback when the shared cache is unreachable.
pub struct LocalCache {
    inner: Mutex<Inner>,
}

impl Default for LocalCache {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalCache {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                writes: 0,
            }),
        }
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.lock()
            .entries
            .values()
            .filter(|(_, expires)| *expires > now)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A poisoned map is still structurally valid.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn insert(inner: &mut Inner, key: &str, value: &str, ttl: Duration, now: Instant) {
        inner
            .entries
            .insert(key.to_string(), (value.to_string(), now + ttl));
        inner.writes += 1;
        if inner.writes % SWEEP_EVERY == 0 {
            inner.entries.retain(|_, (_, expires)| *expires > now);
        }
    }
}

#[async_trait]
impl SharedCache for LocalCache {
    fn name(&self) -> &str {
        "local"
    }

    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> Result<bool, SkyError> {
        let now = Instant::now();
        let mut inner = self.lock();
        let live = inner
            .entries
            .get(key)
            .is_some_and(|(_, expires)| *expires > now);
        if live {
            return Ok(false);
        }
        Self::insert(&mut inner, key, value, ttl, now);
        Ok(true)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), SkyError> {
        let now = Instant::now();
        let mut inner = self.lock();
        Self::insert(&mut inner, key, value, ttl, now);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, SkyError> {
        let now = Instant::now();
        let mut inner = self.lock();
        match inner.entries.get(key) {
            Some((value, expires)) if *expires > now => Ok(Some(value.clone())),
            Some(_) => {
                inner.entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, key: &str) -> Result<(), SkyError> {
        self.lock().entries.remove(key);
        Ok(())
    }
}
