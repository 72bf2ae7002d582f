use async_trait::async_trait;
use chrono::Duration;

/// Key-value cache with optional per-entry time-to-live.
#[async_trait]
pub trait Cache<K, V>: Send + Sync
where
    K: Send + Sync,
    V: Send + Sync,
{
    /// Returns the live value for `key`, or `None` when absent or expired.
    async fn get(&self, key: &K) -> Option<V>;

    /// Stores `value`, replacing any previous entry. `None` never expires.
    async fn put(&self, key: K, value: V, ttl: Option<Duration>);

    async fn remove(&self, key: &K);

    async fn clear(&self);
}
