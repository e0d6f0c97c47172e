//! Cache-aside resolution of a path to its registration.

use std::sync::Arc;

use tracing::{debug, warn};

use hookrelay_types::error::DispatchError;
use hookrelay_types::event::{EventRegistration, cache_key, normalize_path};

use crate::cache::LookupCache;
use crate::repository::event::EventRepository;

/// Resolves paths to registrations, consulting the cache first.
///
/// The cache is never authoritative: cache errors and undecodable entries
/// fall through to the registry.
pub struct EventResolver<E, K> {
    events: Arc<E>,
    cache: Arc<K>,
}

impl<E: EventRepository, K: LookupCache> EventResolver<E, K> {
    pub fn new(events: Arc<E>, cache: Arc<K>) -> Self {
        Self { events, cache }
    }

    /// Resolve a raw path. Unknown paths yield `EventNotRegistered`.
    pub async fn resolve(&self, path: &str) -> Result<EventRegistration, DispatchError> {
        let path = normalize_path(path);
        let key = cache_key(&path);

        if let Some(registration) = self.cached(&key).await {
            debug!(path = %path, "registration cache hit");
            return Ok(registration);
        }

        let registration = self
            .events
            .find_by_path(&path)
            .await?
            .ok_or_else(|| DispatchError::EventNotRegistered(path.clone()))?;

        self.fill(&key, &registration).await;
        Ok(registration)
    }

    async fn cached(&self, key: &str) -> Option<EventRegistration> {
        let raw = match self.cache.get(key).await {
            Ok(raw) => raw?,
            Err(e) => {
                warn!(key, error = %e, "cache lookup failed, reading registry");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(registration) => Some(registration),
            Err(e) => {
                warn!(key, error = %e, "discarding undecodable cache entry");
                if let Err(e) = self.cache.invalidate(key).await {
                    warn!(key, error = %e, "cache invalidation failed");
                }
                None
            }
        }
    }

    async fn fill(&self, key: &str, registration: &EventRegistration) {
        let raw = match serde_json::to_string(registration) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key, error = %e, "could not encode registration for cache");
                return;
            }
        };
        if let Err(e) = self.cache.set(key, raw).await {
            warn!(key, error = %e, "cache write failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MemoryCache, MemoryEvents, registration};
    use hookrelay_types::workflow::WorkflowId;

    fn resolver(events: MemoryEvents, cache: MemoryCache) -> (EventResolver<MemoryEvents, MemoryCache>, Arc<MemoryEvents>, Arc<MemoryCache>) {
        let events = Arc::new(events);
        let cache = Arc::new(cache);
        (
            EventResolver::new(Arc::clone(&events), Arc::clone(&cache)),
            events,
            cache,
        )
    }

    #[tokio::test]
    async fn test_miss_reads_registry_and_fills_cache() {
        let (resolver, events, cache) = resolver(
            MemoryEvents::with(vec![registration("slack/team-a", &[("wf-1", &["Trigger"])])]),
            MemoryCache::new(),
        );

        let found = resolver.resolve("/slack/team-a/").await.unwrap();
        assert_eq!(found.path, "slack/team-a");
        assert_eq!(events.find_calls(), 1);
        assert!(cache.raw("event:slack/team-a").is_some());

        let again = resolver.resolve("slack/team-a").await.unwrap();
        assert_eq!(again, found);
        assert_eq!(events.find_calls(), 1);
    }

    #[tokio::test]
    async fn test_cache_and_registry_agree() {
        let stored = registration("hook", &[("wf-1", &["A", "B"]), ("wf-2", &["C"])]);
        let (resolver, _, cache) = resolver(MemoryEvents::with(vec![stored.clone()]), MemoryCache::new());

        let first = resolver.resolve("hook").await.unwrap();
        let cached: EventRegistration =
            serde_json::from_str(&cache.raw("event:hook").unwrap()).unwrap();
        let second = resolver.resolve("hook").await.unwrap();

        assert_eq!(first, stored);
        assert_eq!(cached, stored);
        assert_eq!(second, stored);
    }

    #[tokio::test]
    async fn test_unknown_path_is_not_registered() {
        let (resolver, _, cache) = resolver(MemoryEvents::new(), MemoryCache::new());

        let err = resolver.resolve("nope/").await.unwrap_err();
        assert!(matches!(err, DispatchError::EventNotRegistered(p) if p == "nope"));
        assert!(cache.raw("event:nope").is_none());
    }

    #[tokio::test]
    async fn test_cache_failure_degrades_to_registry() {
        let (resolver, events, _) = resolver(
            MemoryEvents::with(vec![registration("hook", &[("wf-1", &["Trigger"])])]),
            MemoryCache::new().failing(),
        );

        let found = resolver.resolve("hook").await.unwrap();
        assert!(found.usages.contains_key(&WorkflowId::new("wf-1")));
        resolver.resolve("hook").await.unwrap();
        assert_eq!(events.find_calls(), 2);
    }

    #[tokio::test]
    async fn test_corrupt_cache_entry_is_a_miss() {
        let cache = MemoryCache::new();
        cache.insert_raw("event:hook", "{not json");
        let (resolver, events, cache) = resolver(
            MemoryEvents::with(vec![registration("hook", &[("wf-1", &["Trigger"])])]),
            cache,
        );

        let found = resolver.resolve("hook").await.unwrap();
        assert_eq!(found.path, "hook");
        assert_eq!(events.find_calls(), 1);
        let refilled: EventRegistration =
            serde_json::from_str(&cache.raw("event:hook").unwrap()).unwrap();
        assert_eq!(refilled, found);
    }
}
