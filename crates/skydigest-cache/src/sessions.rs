//! Admin session store.
//!
//! A successful `login` grants elevated rights to a subject (the sender, or
//! the conversation when the platform gives no sender) for a fixed TTL.
//! Subjects are hashed before they become cache keys.

use sha2::{Digest, Sha256};
use skydigest_core::{error::SkyError, traits::SharedCache};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

/// Why a login was refused.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error("invalid admin code")]
    InvalidCode,

    #[error("admin login is not configured")]
    NotConfigured,

    #[error(transparent)]
    Cache(#[from] SkyError),
}

/// Constant-time string comparison to prevent timing attacks on secrets.
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes()
        .zip(b.bytes())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}

#[derive(Clone)]
pub struct AdminSessions {
    cache: Arc<dyn SharedCache>,
    prefix: String,
    code: String,
    ttl: Duration,
}

impl AdminSessions {
    pub fn new(cache: Arc<dyn SharedCache>, prefix: &str, code: &str, ttl: Duration) -> Self {
        Self {
            cache,
            prefix: prefix.to_string(),
            code: code.trim().to_string(),
            ttl,
        }
    }

    /// Whether an admin code is configured at all.
    pub fn is_configured(&self) -> bool {
        !self.code.is_empty()
    }

    fn key(&self, subject: &str) -> String {
        let digest = Sha256::digest(subject.as_bytes());
        format!("{}:admin:{}", self.prefix, hex::encode(digest))
    }

    /// Grant a session to `subject`. A repeated login resets the TTL.
    pub async fn login(&self, subject: &str, code: &str) -> Result<(), AdminError> {
        if !self.is_configured() {
            return Err(AdminError::NotConfigured);
        }
        if !constant_time_eq(code.trim(), &self.code) {
            warn!("admin login rejected: invalid code");
            return Err(AdminError::InvalidCode);
        }
        self.cache.set(&self.key(subject), "1", self.ttl).await?;
        info!("admin session granted for {:?}", self.ttl);
        Ok(())
    }

    /// End the session for `subject`. No-op when none exists.
    pub async fn logout(&self, subject: &str) -> Result<(), SkyError> {
        self.cache.delete(&self.key(subject)).await
    }

    /// Whether the sender, or failing that the conversation, holds a live session.
    pub async fn is_admin(&self, sender_id: Option<&str>, conversation_id: &str) -> bool {
        let subjects = sender_id
            .filter(|s| !s.trim().is_empty())
            .into_iter()
            .chain(std::iter::once(conversation_id));
        for subject in subjects {
            match self.cache.get(&self.key(subject)).await {
                Ok(Some(_)) => return true,
                Ok(None) => {}
                Err(e) => warn!("admin session lookup failed: {e}"),
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::local::LocalCache;

    const SIX_HOURS: Duration = Duration::from_secs(6 * 3600);

    fn sessions(code: &str) -> (AdminSessions, Arc<LocalCache>) {
        let cache = Arc::new(LocalCache::new());
        let shared: Arc<dyn SharedCache> = cache.clone();
        (AdminSessions::new(shared, "test", code, SIX_HOURS), cache)
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq("secret", "secret"));
        assert!(!constant_time_eq("secret", "secreT"));
        assert!(!constant_time_eq("secret", "secret!"));
        assert!(constant_time_eq("", ""));
    }

    #[tokio::test]
    async fn test_login_rejects_wrong_code() {
        let (s, cache) = sessions("hunter2");
        assert!(matches!(
            s.login("u1", "wrong").await,
            Err(AdminError::InvalidCode)
        ));
        assert!(!s.is_admin(Some("u1"), "c1").await);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_login_without_configured_code() {
        let (s, _) = sessions("   ");
        assert!(!s.is_configured());
        assert!(matches!(
            s.login("u1", "").await,
            Err(AdminError::NotConfigured)
        ));
    }

    #[tokio::test]
    async fn test_login_logout_cycle() {
        let (s, _) = sessions("hunter2");
        s.login("u1", " hunter2 ").await.unwrap();
        assert!(s.is_admin(Some("u1"), "c1").await);
        assert!(!s.is_admin(Some("u2"), "c1").await);

        s.logout("u1").await.unwrap();
        assert!(!s.is_admin(Some("u1"), "c1").await);
        s.logout("u1").await.unwrap();
    }

    #[tokio::test]
    async fn test_conversation_subject_fallback() {
        let (s, _) = sessions("hunter2");
        s.login("c1", "hunter2").await.unwrap();
        assert!(s.is_admin(None, "c1").await);
        assert!(s.is_admin(Some("anyone"), "c1").await);
        assert!(!s.is_admin(None, "c2").await);
    }

    #[tokio::test]
    async fn test_keys_do_not_contain_raw_subject() {
        let (s, _) = sessions("hunter2");
        let key = s.key("user-42");
        assert!(key.starts_with("test:admin:"));
        assert!(!key.contains("user-42"));
        assert_eq!(key.len(), "test:admin:".len() + 64);
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_expires_after_ttl() {
        let (s, _) = sessions("hunter2");
        s.login("u1", "hunter2").await.unwrap();

        tokio::time::advance(SIX_HOURS - Duration::from_secs(1)).await;
        assert!(s.is_admin(Some("u1"), "c1").await);

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(!s.is_admin(Some("u1"), "c1").await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_relogin_resets_ttl() {
        let (s, _) = sessions("hunter2");
        s.login("u1", "hunter2").await.unwrap();
        tokio::time::advance(Duration::from_secs(5 * 3600)).await;
        s.login("u1", "hunter2").await.unwrap();
        tokio::time::advance(Duration::from_secs(5 * 3600)).await;
        assert!(s.is_admin(Some("u1"), "c1").await);
    }
}
