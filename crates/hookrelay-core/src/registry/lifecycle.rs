//! Registration and deregistration of trigger nodes on event paths.

use std::sync::Arc;

use tracing::{info, warn};

use hookrelay_types::error::RepositoryError;
use hookrelay_types::event::{EventRegistration, cache_key, normalize_path};
use hookrelay_types::workflow::WorkflowId;

use crate::cache::LookupCache;
use crate::repository::event::EventRepository;

/// Maintains registrations and invalidates cached lookups on every change.
pub struct EventRegistry<E, K> {
    events: Arc<E>,
    cache: Arc<K>,
}

impl<E: EventRepository, K: LookupCache> EventRegistry<E, K> {
    pub fn new(events: Arc<E>, cache: Arc<K>) -> Self {
        Self { events, cache }
    }

    /// Bind a trigger node of a workflow to a path, creating the
    /// registration if needed. Binding the same node twice is a no-op.
    pub async fn register_trigger(
        &self,
        path: &str,
        workflow_id: &WorkflowId,
        node: &str,
    ) -> Result<EventRegistration, RepositoryError> {
        let path = normalize_path(path);
        let mut registration = self
            .events
            .find_by_path(&path)
            .await?
            .unwrap_or_else(|| EventRegistration::new(&path));

        if registration.add_usage(workflow_id.clone(), node) {
            self.events.save(&registration).await?;
            self.invalidate(&path).await;
            info!(path = %path, workflow_id = %workflow_id, node, "trigger registered");
        }
        Ok(registration)
    }

    /// Unbind one trigger node. The registration is deleted once nothing
    /// references it. Returns whether the node was bound.
    pub async fn deregister_trigger(
        &self,
        path: &str,
        workflow_id: &WorkflowId,
        node: &str,
    ) -> Result<bool, RepositoryError> {
        let path = normalize_path(path);
        let Some(mut registration) = self.events.find_by_path(&path).await? else {
            return Ok(false);
        };

        if !registration.remove_usage(workflow_id, node) {
            return Ok(false);
        }
        self.store(&registration).await?;
        info!(path = %path, workflow_id = %workflow_id, node, "trigger deregistered");
        Ok(true)
    }

    /// Unbind every trigger of a workflow across all paths. Returns the
    /// paths that changed.
    pub async fn deregister_workflow(
        &self,
        workflow_id: &WorkflowId,
    ) -> Result<Vec<String>, RepositoryError> {
        let mut changed = Vec::new();
        for mut registration in self.events.find_by_workflow(workflow_id).await? {
            if registration.remove_workflow(workflow_id) {
                self.store(&registration).await?;
                changed.push(registration.path);
            }
        }
        info!(workflow_id = %workflow_id, paths = changed.len(), "workflow deregistered");
        Ok(changed)
    }

    pub async fn find(&self, path: &str) -> Result<Option<EventRegistration>, RepositoryError> {
        self.events.find_by_path(&normalize_path(path)).await
    }

    pub async fn list(&self) -> Result<Vec<EventRegistration>, RepositoryError> {
        self.events.list().await
    }

    /// Save a modified registration, or delete it when it has no usages left.
    async fn store(&self, registration: &EventRegistration) -> Result<(), RepositoryError> {
        if registration.is_empty() {
            self.events.delete(&registration.path).await?;
        } else {
            self.events.save(registration).await?;
        }
        self.invalidate(&registration.path).await;
        Ok(())
    }

    async fn invalidate(&self, path: &str) {
        let key = cache_key(path);
        if let Err(e) = self.cache.invalidate(&key).await {
            warn!(key = %key, error = %e, "cache invalidation failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::EventResolver;
    use crate::test_support::{MemoryCache, MemoryEvents};

    fn setup() -> (
        EventRegistry<MemoryEvents, MemoryCache>,
        EventResolver<MemoryEvents, MemoryCache>,
        Arc<MemoryEvents>,
    ) {
        let events = Arc::new(MemoryEvents::new());
        let cache = Arc::new(MemoryCache::new());
        (
            EventRegistry::new(Arc::clone(&events), Arc::clone(&cache)),
            EventResolver::new(Arc::clone(&events), cache),
            events,
        )
    }

    #[tokio::test]
    async fn test_register_then_deregister_round_trip() {
        let (registry, resolver, events) = setup();
        let wf = WorkflowId::new("wf-1");

        registry.register_trigger("/slack/team-a/", &wf, "Trigger").await.unwrap();
        let found = resolver.resolve("slack/team-a").await.unwrap();
        assert_eq!(found.usages.get(&wf), Some(&vec!["Trigger".to_string()]));

        let changed = registry.deregister_workflow(&wf).await.unwrap();
        assert_eq!(changed, vec!["slack/team-a".to_string()]);
        assert!(events.is_empty());
        assert!(resolver.resolve("slack/team-a").await.is_err());
    }

    #[tokio::test]
    async fn test_register_is_idempotent_per_node() {
        let (registry, _, _) = setup();
        let wf = WorkflowId::new("wf-1");

        registry.register_trigger("hook", &wf, "A").await.unwrap();
        registry.register_trigger("hook", &wf, "A").await.unwrap();
        let registration = registry.register_trigger("hook", &wf, "B").await.unwrap();

        assert_eq!(
            registration.usages.get(&wf),
            Some(&vec!["A".to_string(), "B".to_string()])
        );
    }

    #[tokio::test]
    async fn test_register_invalidates_cached_lookup() {
        let (registry, resolver, _) = setup();
        let wf1 = WorkflowId::new("wf-1");
        let wf2 = WorkflowId::new("wf-2");

        registry.register_trigger("hook", &wf1, "A").await.unwrap();
        assert_eq!(resolver.resolve("hook").await.unwrap().usages.len(), 1);

        registry.register_trigger("hook", &wf2, "B").await.unwrap();
        assert_eq!(resolver.resolve("hook").await.unwrap().usages.len(), 2);
    }

    #[tokio::test]
    async fn test_deregister_workflow_keeps_other_workflows() {
        let (registry, resolver, _) = setup();
        let wf1 = WorkflowId::new("wf-1");
        let wf2 = WorkflowId::new("wf-2");

        registry.register_trigger("hook", &wf1, "A").await.unwrap();
        registry.register_trigger("hook", &wf2, "B").await.unwrap();
        registry.register_trigger("other", &wf1, "C").await.unwrap();
        resolver.resolve("hook").await.unwrap();

        let mut changed = registry.deregister_workflow(&wf1).await.unwrap();
        changed.sort();
        assert_eq!(changed, vec!["hook".to_string(), "other".to_string()]);

        let remaining = resolver.resolve("hook").await.unwrap();
        assert!(!remaining.usages.contains_key(&wf1));
        assert!(remaining.usages.contains_key(&wf2));
        assert!(resolver.resolve("other").await.is_err());
    }

    #[tokio::test]
    async fn test_deregister_single_trigger() {
        let (registry, _, _) = setup();
        let wf = WorkflowId::new("wf-1");

        registry.register_trigger("hook", &wf, "A").await.unwrap();
        registry.register_trigger("hook", &wf, "B").await.unwrap();

        assert!(registry.deregister_trigger("hook", &wf, "A").await.unwrap());
        assert!(!registry.deregister_trigger("hook", &wf, "A").await.unwrap());
        assert!(!registry.deregister_trigger("missing", &wf, "A").await.unwrap());

        let registration = registry.find("hook").await.unwrap().unwrap();
        assert_eq!(registration.usages.get(&wf), Some(&vec!["B".to_string()]));
        assert_eq!(registry.list().await.unwrap().len(), 1);
    }
}
