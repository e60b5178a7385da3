//! Generic expiring key-value storage owned by the calling application.
//!
//! The OAuth core never persists anything on its own. Applications that need
//! to correlate an authorization redirect with its PKCE verifier, or keep
//! sessions around between requests, plug a [`SessionStore`] in at the edge.

use async_trait::async_trait;
use miette::Diagnostic;
use std::collections::HashMap;
use std::error::Error as StdError;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

/// Errors emitted by session stores.
#[derive(Debug, thiserror::Error, Diagnostic)]
pub enum SessionStoreError {
    /// Any error from a backend implementation
    #[error(transparent)]
    #[diagnostic(code(matrica::session_store::other))]
    Other(#[from] Box<dyn StdError + Send + Sync>),
}

/// Pluggable storage for arbitrary session records.
#[async_trait]
pub trait SessionStore<K, T>: Send + Sync
where
    K: Eq + Hash,
    T: Clone,
{
    /// Get the value for `key` if present and not expired.
    async fn get(&self, key: &K) -> Option<T>;
    /// Persist the given value, optionally expiring after `ttl`.
    async fn set(&self, key: K, value: T, ttl: Option<Duration>) -> Result<(), SessionStoreError>;
    /// Delete the given key. Deleting a missing key is not an error.
    async fn del(&self, key: &K) -> Result<(), SessionStoreError>;
    /// Remove `key` and return its value if it was present and not expired.
    ///
    /// Lookup and removal are one step: of two concurrent callers for the same
    /// key, at most one gets the value.
    async fn take(&self, key: &K) -> Result<Option<T>, SessionStoreError>;
}

#[derive(Clone)]
struct Entry<T> {
    value: T,
    expires_at: Option<Instant>,
}

impl<T> Entry<T> {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// In-memory session store suitable for short-lived state and tests.
#[derive(Clone)]
pub struct MemorySessionStore<K, T>(Arc<RwLock<HashMap<K, Entry<T>>>>);

impl<K, T> Default for MemorySessionStore<K, T> {
    fn default() -> Self {
        Self(Arc::new(RwLock::new(HashMap::new())))
    }
}

impl<K, T> MemorySessionStore<K, T>
where
    K: Eq + Hash,
{
    /// Number of live (unexpired) entries.
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.0
            .read()
            .await
            .values()
            .filter(|e| !e.is_expired(now))
            .count()
    }

    /// True when no live entries remain.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Drop every expired entry.
    pub async fn purge_expired(&self) {
        let now = Instant::now();
        let mut map = self.0.write().await;
        let before = map.len();
        map.retain(|_, e| !e.is_expired(now));
        #[cfg(feature = "tracing")]
        tracing::debug!(purged = before - map.len(), "purged expired session entries");
        #[cfg(not(feature = "tracing"))]
        let _ = before;
    }

    /// Drop `key` if it is expired as of `now`, re-checking under the write
    /// lock. Returns the value if the entry turned out to be live.
    async fn evict_expired(&self, key: &K, now: Instant) -> Option<T>
    where
        T: Clone,
    {
        let mut map = self.0.write().await;
        let live = map
            .get(key)
            .map(|e| (!e.is_expired(now)).then(|| e.value.clone()));
        match live {
            Some(None) => {
                map.remove(key);
                None
            }
            Some(value) => value,
            None => None,
        }
    }
}

#[async_trait]
impl<K, T> SessionStore<K, T> for MemorySessionStore<K, T>
where
    K: Eq + Hash + Send + Sync,
    T: Clone + Send + Sync + 'static,
{
    async fn get(&self, key: &K) -> Option<T> {
        let now = Instant::now();
        {
            let map = self.0.read().await;
            match map.get(key) {
                Some(entry) if !entry.is_expired(now) => return Some(entry.value.clone()),
                Some(_) => {}
                None => return None,
            }
        }
        // expired: drop it so the map doesn't grow unbounded
        self.evict_expired(key, now).await
    }

    async fn set(&self, key: K, value: T, ttl: Option<Duration>) -> Result<(), SessionStoreError> {
        let expires_at = ttl.map(|ttl| Instant::now() + ttl);
        self.0
            .write()
            .await
            .insert(key, Entry { value, expires_at });
        Ok(())
    }

    async fn del(&self, key: &K) -> Result<(), SessionStoreError> {
        self.0.write().await.remove(key);
        Ok(())
    }

    async fn take(&self, key: &K) -> Result<Option<T>, SessionStoreError> {
        let now = Instant::now();
        let entry = self.0.write().await.remove(key);
        Ok(entry.filter(|e| !e.is_expired(now)).map(|e| e.value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_get_del() {
        let store = MemorySessionStore::<String, u32>::default();
        store.set("a".into(), 1, None).await.unwrap();
        assert_eq!(store.get(&"a".to_string()).await, Some(1));
        store.del(&"a".to_string()).await.unwrap();
        assert_eq!(store.get(&"a".to_string()).await, None);
        // deleting twice is fine
        store.del(&"a".to_string()).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn entries_expire_after_ttl() {
        let store = MemorySessionStore::<&'static str, &'static str>::default();
        store
            .set("state", "verifier", Some(Duration::from_secs(60)))
            .await
            .unwrap();
        store.set("forever", "x", None).await.unwrap();

        tokio::time::advance(Duration::from_secs(59)).await;
        assert_eq!(store.get(&"state").await, Some("verifier"));

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(store.get(&"state").await, None);
        assert_eq!(store.get(&"forever").await, Some("x"));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn eviction_keeps_an_entry_replaced_after_expiry() {
        let store = MemorySessionStore::<&'static str, u32>::default();
        store.set("k", 1, Some(Duration::from_secs(1))).await.unwrap();
        tokio::time::advance(Duration::from_secs(2)).await;
        let seen_expired_at = Instant::now();

        // a writer lands between the read that saw the stale entry and the eviction
        store.set("k", 2, Some(Duration::from_secs(60))).await.unwrap();
        assert_eq!(store.evict_expired(&"k", seen_expired_at).await, Some(2));
        assert_eq!(store.get(&"k").await, Some(2));

        tokio::time::advance(Duration::from_secs(61)).await;
        assert_eq!(store.evict_expired(&"k", Instant::now()).await, None);
        assert_eq!(store.0.read().await.len(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn take_removes_and_returns_once() {
        let store = MemorySessionStore::<&'static str, &'static str>::default();
        store.set("s", "v", Some(Duration::from_secs(10))).await.unwrap();
        let (a, b) = tokio::join!(store.take(&"s"), store.take(&"s"));
        let got: Vec<_> = [a.unwrap(), b.unwrap()].into_iter().flatten().collect();
        assert_eq!(got, vec!["v"]);
        assert!(store.is_empty().await);

        store.set("old", "x", Some(Duration::from_secs(1))).await.unwrap();
        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(store.take(&"old").await.unwrap(), None);
        assert_eq!(store.0.read().await.len(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn purge_drops_expired_entries() {
        let store = MemorySessionStore::<u8, u8>::default();
        store.set(1, 1, Some(Duration::from_secs(1))).await.unwrap();
        store.set(2, 2, Some(Duration::from_secs(10))).await.unwrap();
        tokio::time::advance(Duration::from_secs(5)).await;
        store.purge_expired().await;
        assert_eq!(store.0.read().await.len(), 1);
        assert!(!store.is_empty().await);
    }
}
