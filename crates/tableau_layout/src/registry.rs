//! Registry of live collections
//!
//! Collections join when their view attaches and leave when it detaches,
//! possibly in the middle of an animation cycle. The registry is injected
//! into the orchestrator rather than living in a global, and every cycle
//! iterates over a `snapshot()` so joins and leaves never invalidate an
//! in-progress walk.

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;
use tableau_core::CollectionId;

use crate::collection::Collection;
use crate::error::{LayoutError, Result};

/// Shared handle to a registered collection
pub type SharedCollection = Rc<RefCell<Collection>>;

/// Ordered set of live collections, keyed by id.
///
/// Registration order is significant: identity resolution ingests
/// collections in this order, so it decides equal-version tie-breaks.
#[derive(Default)]
pub struct CollectionRegistry {
    collections: RefCell<IndexMap<CollectionId, SharedCollection>>,
}

impl CollectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a collection, returning its shared handle
    pub fn register(&self, collection: Collection) -> Result<SharedCollection> {
        let shared = Rc::new(RefCell::new(collection));
        self.register_shared(shared.clone())?;
        Ok(shared)
    }

    /// Register an already shared collection
    pub fn register_shared(&self, collection: SharedCollection) -> Result<()> {
        let id = collection.borrow().id().clone();
        let mut collections = self.collections.borrow_mut();
        if collections.contains_key(&id) {
            return Err(LayoutError::DuplicateCollection(id));
        }
        tracing::debug!(collection = %id, "collection registered");
        collections.insert(id, collection);
        Ok(())
    }

    /// Unregister a collection, keeping the order of the remaining ones
    pub fn unregister(&self, id: &CollectionId) -> Result<SharedCollection> {
        let removed = self.collections.borrow_mut().shift_remove(id);
        match removed {
            Some(collection) => {
                tracing::debug!(collection = %id, "collection unregistered");
                Ok(collection)
            }
            None => Err(LayoutError::UnknownCollection(id.clone())),
        }
    }

    pub fn get(&self, id: &CollectionId) -> Option<SharedCollection> {
        self.collections.borrow().get(id).cloned()
    }

    pub fn contains(&self, id: &CollectionId) -> bool {
        self.collections.borrow().contains_key(id)
    }

    /// Defensive copy of the live collections, in registration order
    pub fn snapshot(&self) -> Vec<SharedCollection> {
        self.collections.borrow().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.collections.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.collections.borrow().is_empty()
    }
}

impl std::fmt::Debug for CollectionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.collections.borrow().keys())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tableau_core::NodeId;

    #[test]
    fn test_register_and_unregister() {
        let registry = CollectionRegistry::new();
        registry
            .register(Collection::new("deck", NodeId::new(1)))
            .unwrap();
        registry
            .register(Collection::new("hand", NodeId::new(2)))
            .unwrap();
        assert_eq!(registry.len(), 2);

        let err = registry
            .register(Collection::new("deck", NodeId::new(3)))
            .unwrap_err();
        assert_eq!(err, LayoutError::DuplicateCollection(CollectionId::new("deck")));

        registry.unregister(&CollectionId::new("deck")).unwrap();
        assert!(!registry.contains(&CollectionId::new("deck")));
        assert!(matches!(
            registry.unregister(&CollectionId::new("deck")),
            Err(LayoutError::UnknownCollection(_))
        ));
    }

    #[test]
    fn test_snapshot_survives_mutation() {
        let registry = CollectionRegistry::new();
        for (i, name) in ["a", "b", "c"].iter().enumerate() {
            registry
                .register(Collection::new(*name, NodeId::new(i as u64)))
                .unwrap();
        }

        let snapshot = registry.snapshot();
        registry.unregister(&CollectionId::new("b")).unwrap();
        registry
            .register(Collection::new("d", NodeId::new(9)))
            .unwrap();

        let names: Vec<_> = snapshot
            .iter()
            .map(|c| c.borrow().id().to_string())
            .collect();
        assert_eq!(names, ["a", "b", "c"]);

        let names: Vec<_> = registry
            .snapshot()
            .iter()
            .map(|c| c.borrow().id().to_string())
            .collect();
        assert_eq!(names, ["a", "c", "d"]);
    }
}
