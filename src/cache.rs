//! Short-lived verification codes, keyed by email.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use redis::AsyncCommands;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::error::AppError;

#[async_trait]
pub trait CodeStore: Send + Sync {
    /// Store `code` for `email`, replacing any previous one.
    async fn put(&self, email: &str, code: &str, ttl: Duration) -> Result<(), AppError>;

    /// `None` once the entry expired or was never written.
    async fn get(&self, email: &str) -> Result<Option<String>, AppError>;

    async fn remove(&self, email: &str) -> Result<(), AppError>;
}

fn key(email: &str) -> String {
    format!("email_verification:{}", email)
}

pub struct RedisCodeStore {
    connection: ConnectionManager,
}

impl RedisCodeStore {
    pub async fn connect(redis_url: &str) -> Result<Self, AppError> {
        let config = ConnectionManagerConfig::new()
            .set_number_of_retries(1)
            .set_connection_timeout(Duration::from_millis(500));

        let client = redis::Client::open(redis_url)?;
        let connection = client.get_connection_manager_with_config(config).await?;

        Ok(Self { connection })
    }
}

#[async_trait]
impl CodeStore for RedisCodeStore {
    async fn put(&self, email: &str, code: &str, ttl: Duration) -> Result<(), AppError> {
        let mut conn = self.connection.clone();
        conn.set_ex::<_, _, ()>(key(email), code, ttl.as_secs().max(1)).await?;
        Ok(())
    }

    async fn get(&self, email: &str) -> Result<Option<String>, AppError> {
        let mut conn = self.connection.clone();
        let code: Option<String> = conn.get(key(email)).await?;
        Ok(code)
    }

    async fn remove(&self, email: &str) -> Result<(), AppError> {
        let mut conn = self.connection.clone();
        conn.del::<_, ()>(key(email)).await?;
        Ok(())
    }
}

/// In-process store for single-node setups and tests.
/// Tracks code -> deadline per email and drops entries lazily.
#[derive(Clone, Default)]
pub struct MemoryCodeStore {
    state: Arc<Mutex<HashMap<String, (String, Instant)>>>,
}

impl MemoryCodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Periodic cleanup of expired entries
    pub async fn cleanup(&self) {
        let mut state = self.state.lock().await;
        let now = Instant::now();
        state.retain(|_, (_, deadline)| *deadline > now);
    }
}

#[async_trait]
impl CodeStore for MemoryCodeStore {
    async fn put(&self, email: &str, code: &str, ttl: Duration) -> Result<(), AppError> {
        let mut state = self.state.lock().await;
        state.insert(key(email), (code.to_string(), Instant::now() + ttl));
        Ok(())
    }

    async fn get(&self, email: &str) -> Result<Option<String>, AppError> {
        let mut state = self.state.lock().await;
        let key = key(email);

        match state.get(&key) {
            Some((code, deadline)) if *deadline > Instant::now() => Ok(Some(code.clone())),
            Some(_) => {
                state.remove(&key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn remove(&self, email: &str) -> Result<(), AppError> {
        self.state.lock().await.remove(&key(email));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIVE_MINUTES: Duration = Duration::from_secs(300);

    #[tokio::test(start_paused = true)]
    async fn test_code_expires_after_ttl() {
        let store = MemoryCodeStore::new();
        store.put("a@x.com", "1234", FIVE_MINUTES).await.unwrap();

        tokio::time::advance(Duration::from_secs(299)).await;
        assert_eq!(store.get("a@x.com").await.unwrap().as_deref(), Some("1234"));

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(store.get("a@x.com").await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_put_replaces_code_and_ttl() {
        let store = MemoryCodeStore::new();
        store.put("a@x.com", "1111", FIVE_MINUTES).await.unwrap();

        tokio::time::advance(Duration::from_secs(240)).await;
        store.put("a@x.com", "2222", FIVE_MINUTES).await.unwrap();

        tokio::time::advance(Duration::from_secs(240)).await;
        assert_eq!(store.get("a@x.com").await.unwrap().as_deref(), Some("2222"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_drops_only_expired() {
        let store = MemoryCodeStore::new();
        store.put("old@x.com", "1111", Duration::from_secs(10)).await.unwrap();
        store.put("new@x.com", "2222", FIVE_MINUTES).await.unwrap();

        tokio::time::advance(Duration::from_secs(11)).await;
        store.cleanup().await;

        assert_eq!(store.state.lock().await.len(), 1);
        assert!(store.get("new@x.com").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_remove() {
        let store = MemoryCodeStore::new();
        store.put("a@x.com", "1234", FIVE_MINUTES).await.unwrap();
        store.remove("a@x.com").await.unwrap();
        assert_eq!(store.get("a@x.com").await.unwrap(), None);
    }
}
