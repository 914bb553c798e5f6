//! Collections ("stacks")
//!
//! A collection is an ordered, named container of entities: a deck, a hand,
//! a discard pile. Entity order drives layout. Besides its members, a
//! collection remembers the render version at which each identity last
//! became visible in it; identity resolution reads this to guess where a
//! vanished identity went.
//!
//! The version bookkeeping is written only here, by arrangement ingestion.
//! The orchestrator reads it but never writes it.

use rustc_hash::{FxHashMap, FxHashSet};
use tableau_core::{CollectionId, EntityId, NodeId, PropValue, PropertyMap, Version};

use crate::entity::Entity;

/// Anything in an arrangement that names an entity
pub trait Descriptor {
    fn entity_id(&self) -> EntityId;
}

impl Descriptor for EntityId {
    fn entity_id(&self) -> EntityId {
        self.clone()
    }
}

impl Descriptor for &str {
    fn entity_id(&self) -> EntityId {
        EntityId::new(self)
    }
}

/// What changed when an arrangement was applied
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ArrangementDiff {
    /// Identities that became newly visible
    pub added: Vec<EntityId>,
    /// Identities that were visible and no longer are
    pub removed: Vec<EntityId>,
    /// Identities that stayed (possibly re-ordered)
    pub kept: Vec<EntityId>,
}

/// An ordered, named container of entities
pub struct Collection {
    id: CollectionId,
    node: NodeId,
    entities: Vec<Box<dyn Entity>>,
    last_seen_version: FxHashMap<EntityId, Version>,
    no_animate: bool,
}

impl Collection {
    pub fn new(id: impl Into<CollectionId>, node: NodeId) -> Self {
        Self {
            id: id.into(),
            node,
            entities: Vec::new(),
            last_seen_version: FxHashMap::default(),
            no_animate: false,
        }
    }

    pub fn id(&self) -> &CollectionId {
        &self.id
    }

    /// Host box of the collection itself
    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn entities(&self) -> &[Box<dyn Entity>] {
        &self.entities
    }

    pub fn entities_mut(&mut self) -> &mut [Box<dyn Entity>] {
        &mut self.entities
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn entity(&self, id: &EntityId) -> Option<&dyn Entity> {
        self.entities
            .iter()
            .find(|e| e.id() == id)
            .map(|e| &**e)
    }

    pub fn entity_mut(&mut self, id: &EntityId) -> Option<&mut Box<dyn Entity>> {
        self.entities.iter_mut().find(|e| e.id() == id)
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        !id.is_spacer() && self.entities.iter().any(|e| e.id() == id)
    }

    /// Append an entity without touching version bookkeeping.
    ///
    /// Used for transient exit placeholders, which are not "visible" members.
    pub fn push(&mut self, entity: Box<dyn Entity>) {
        self.entities.push(entity);
    }

    /// Remove the first entity with this identity
    pub fn remove(&mut self, id: &EntityId) -> Option<Box<dyn Entity>> {
        let index = self.entities.iter().position(|e| e.id() == id)?;
        Some(self.entities.remove(index))
    }

    /// Remove every exit placeholder, returning them
    pub fn drain_exit_placeholders(&mut self) -> Vec<Box<dyn Entity>> {
        let (placeholders, members): (Vec<_>, Vec<_>) = std::mem::take(&mut self.entities)
            .into_iter()
            .partition(|e| e.is_exit_placeholder());
        self.entities = members;
        placeholders
    }

    // ========================================================================
    // Version bookkeeping
    // ========================================================================

    /// Render version at which each identity last became visible here
    pub fn last_seen_version(&self) -> &FxHashMap<EntityId, Version> {
        &self.last_seen_version
    }

    /// Record that `id` became visible in this collection at `version`
    pub fn mark_seen(&mut self, id: EntityId, version: Version) {
        if id.is_spacer() {
            return;
        }
        self.last_seen_version.insert(id, version);
    }

    /// Replace the members with a new arrangement.
    ///
    /// `None` means the collection is empty. Entities whose identity survives
    /// are kept as-is and re-ordered; new identities are built with `build`
    /// and marked seen at `version`. Exit placeholders are left in place at
    /// the end so an in-flight exit keeps playing.
    pub fn apply_arrangement<D, F>(
        &mut self,
        arrangement: Option<&[D]>,
        version: Version,
        mut build: F,
    ) -> ArrangementDiff
    where
        D: Descriptor,
        F: FnMut(&D) -> Box<dyn Entity>,
    {
        let descriptors = arrangement.unwrap_or(&[]);
        let mut diff = ArrangementDiff::default();

        let mut previous: FxHashMap<EntityId, Box<dyn Entity>> = FxHashMap::default();
        let mut placeholders = Vec::new();
        for entity in self.entities.drain(..) {
            if entity.is_exit_placeholder() {
                placeholders.push(entity);
            } else if !entity.id().is_spacer() {
                previous.insert(entity.id().clone(), entity);
            }
        }

        let mut seen: FxHashSet<EntityId> = FxHashSet::default();
        let mut next = Vec::with_capacity(descriptors.len() + placeholders.len());
        for descriptor in descriptors {
            let id = descriptor.entity_id();
            if id.is_spacer() {
                next.push(build(descriptor));
                continue;
            }
            if !seen.insert(id.clone()) {
                tracing::warn!(collection = %self.id, entity = %id, "duplicate identity in arrangement");
            }
            match previous.remove(&id) {
                Some(entity) => {
                    diff.kept.push(id);
                    next.push(entity);
                }
                None => {
                    self.last_seen_version.insert(id.clone(), version);
                    diff.added.push(id);
                    next.push(build(descriptor));
                }
            }
        }

        diff.removed = previous.into_keys().collect();
        diff.removed.sort();

        next.extend(placeholders);
        self.entities = next;

        tracing::trace!(
            collection = %self.id,
            version,
            added = diff.added.len(),
            removed = diff.removed.len(),
            "arrangement applied"
        );
        diff
    }

    // ========================================================================
    // Animation support
    // ========================================================================

    /// Whether host transitions are suspended for this collection
    pub fn no_animate(&self) -> bool {
        self.no_animate
    }

    pub fn set_no_animate(&mut self, no_animate: bool) {
        self.no_animate = no_animate;
    }

    /// Union of the animating properties declared by current members
    pub fn declared_properties(&self) -> Vec<String> {
        let mut properties: Vec<String> = Vec::new();
        for entity in self.tracked() {
            for property in entity.animating_properties() {
                if !properties.contains(property) {
                    properties.push(property.clone());
                }
            }
        }
        properties
    }

    /// Fallback property values for an entity that has no concrete
    /// before/after counterpart in this collection.
    ///
    /// For each property, the majority value among current members wins;
    /// ties go to the value encountered first. Properties no member carries
    /// are absent from the result.
    pub fn animating_prop_defaults(&self, properties: &[String]) -> PropertyMap {
        let snapshots: Vec<PropertyMap> = self
            .tracked()
            .map(|entity| entity.animating_prop_values())
            .collect();

        let mut defaults = PropertyMap::new();
        for property in properties {
            let mut tally: Vec<(&PropValue, usize)> = Vec::new();
            for value in snapshots.iter().filter_map(|s| s.get(property)) {
                match tally.iter_mut().find(|(v, _)| *v == value) {
                    Some((_, count)) => *count += 1,
                    None => tally.push((value, 1)),
                }
            }

            let mut best: Option<(&PropValue, usize)> = None;
            for (value, count) in tally {
                if best.map_or(true, |(_, c)| count > c) {
                    best = Some((value, count));
                }
            }
            if let Some((value, _)) = best {
                defaults.insert(property.clone(), value.clone());
            }
        }
        defaults
    }

    /// Members that take part in tracking (no spacers, no placeholders)
    fn tracked(&self) -> impl Iterator<Item = &Box<dyn Entity>> {
        self.entities
            .iter()
            .filter(|e| !e.id().is_spacer() && !e.is_exit_placeholder())
    }
}

impl std::fmt::Debug for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection")
            .field("id", &self.id)
            .field("node", &self.node)
            .field("entities", &self.entities.iter().map(|e| e.id()).collect::<Vec<_>>())
            .field("no_animate", &self.no_animate)
            .finish()
    }
}
