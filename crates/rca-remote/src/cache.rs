//! Key-based query cache using moka
//!
//! Read queries are cached by [`QueryKey`]; writes invalidate the keys they
//! affect. The cache sits behind the [`QueryCache`] capability so the store
//! can be swapped (e.g. for a shared or persistent one) without touching the
//! query layer.

use crate::config::CacheConfig;
use async_trait::async_trait;
use moka::future::Cache;
use std::any::Any;
use std::fmt::{self, Debug, Display, Formatter};
use std::sync::Arc;

/// Cached query result, type-erased
pub type CachedValue = Arc<dyn Any + Send + Sync>;

/// Identity of a read query
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    Application(String),
    PrincipalInvestigators,
    /// Activities, optionally filtered by principal investigator
    ResearchActivities(Option<String>),
    ActivityStaff(String),
    Comments(String),
}

impl Display for QueryKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Application(id) => write!(f, "application/{id}"),
            Self::PrincipalInvestigators => f.write_str("principal-investigators"),
            Self::ResearchActivities(None) => f.write_str("research-activities"),
            Self::ResearchActivities(Some(pi)) => write!(f, "research-activities?pi={pi}"),
            Self::ActivityStaff(id) => write!(f, "research-activities/{id}/staff"),
            Self::Comments(id) => write!(f, "application/{id}/comments"),
        }
    }
}

/// Cache capability used by the query layer
#[async_trait]
pub trait QueryCache: Send + Sync + Debug {
    /// Cached value for `key`
    async fn get(&self, key: &QueryKey) -> Option<CachedValue>;

    /// Store a value
    async fn set(&self, key: QueryKey, value: CachedValue);

    /// Drop a value
    async fn invalidate(&self, key: &QueryKey);
}

/// Typed read on top of [`QueryCache::get`]
pub async fn get_typed<T>(cache: &dyn QueryCache, key: &QueryKey) -> Option<T>
where
    T: Clone + Send + Sync + 'static,
{
    cache
        .get(key)
        .await
        .and_then(|value| value.downcast_ref::<T>().cloned())
}

/// Statistics for cache monitoring
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheStats {
    /// Number of entries in cache
    pub entry_count: u64,
}

/// In-process [`QueryCache`] with LRU eviction and optional TTL
#[derive(Debug, Clone)]
pub struct MokaQueryCache {
    inner: Cache<QueryKey, CachedValue>,
}

impl MokaQueryCache {
    /// Create cache with max capacity
    #[inline]
    #[must_use]
    pub fn new(max_capacity: u64) -> Self {
        Self {
            inner: Cache::new(max_capacity),
        }
    }

    /// Create cache from settings
    #[must_use]
    pub fn from_config(config: &CacheConfig) -> Self {
        let mut builder = Cache::builder().max_capacity(config.capacity);
        if let Some(ttl) = config.ttl() {
            builder = builder.time_to_live(ttl);
        }
        Self {
            inner: builder.build(),
        }
    }

    /// Invalidate all entries
    #[inline]
    pub fn invalidate_all(&self) {
        self.inner.invalidate_all();
    }

    /// Get cache statistics
    #[inline]
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entry_count: self.inner.entry_count(),
        }
    }
}

impl Default for MokaQueryCache {
    fn default() -> Self {
        Self::from_config(&CacheConfig::default())
    }
}

#[async_trait]
impl QueryCache for MokaQueryCache {
    async fn get(&self, key: &QueryKey) -> Option<CachedValue> {
        self.inner.get(key).await
    }

    async fn set(&self, key: QueryKey, value: CachedValue) {
        self.inner.insert(key, value).await;
    }

    async fn invalidate(&self, key: &QueryKey) {
        self.inner.invalidate(key).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_then_get_typed() {
        let cache = MokaQueryCache::new(100);
        let key = QueryKey::Application("app-1".into());
        cache.set(key.clone(), Arc::new("cached".to_string())).await;

        let hit: Option<String> = get_typed(&cache, &key).await;
        assert_eq!(hit.as_deref(), Some("cached"));
    }

    #[tokio::test]
    async fn wrong_type_is_a_miss() {
        let cache = MokaQueryCache::new(100);
        let key = QueryKey::PrincipalInvestigators;
        cache.set(key.clone(), Arc::new(7_u32)).await;

        let miss: Option<String> = get_typed(&cache, &key).await;
        assert!(miss.is_none());
    }

    #[tokio::test]
    async fn invalidate_removes_entry() {
        let cache = MokaQueryCache::default();
        let key = QueryKey::Comments("app-1".into());
        cache.set(key.clone(), Arc::new(Vec::<String>::new())).await;
        cache.invalidate(&key).await;
        assert!(cache.get(&key).await.is_none());
    }

    #[tokio::test]
    async fn filtered_activities_are_distinct_keys() {
        let cache = MokaQueryCache::new(100);
        cache
            .set(QueryKey::ResearchActivities(None), Arc::new(1_u8))
            .await;
        assert!(cache
            .get(&QueryKey::ResearchActivities(Some("pi-1".into())))
            .await
            .is_none());
    }

    #[test]
    fn key_display() {
        assert_eq!(
            QueryKey::ActivityStaff("ra-9".into()).to_string(),
            "research-activities/ra-9/staff"
        );
    }
}
