//! FLIP cycle orchestration
//!
//! One cycle runs in two halves around the caller's state mutation:
//!
//! ```text
//! prepare()            caller mutates arrangements        animate().await
//!   First: measure  ->  (Collection::apply_arrangement)  ->  Last: measure again
//!                                                            Invert: jump back
//!                                                            Play: release
//! ```
//!
//! `animate()` resolves once every transition has been started. Completion
//! signals arrive later through `transition_ended()`, and the cycle settles
//! when the last outstanding identity completes or is forfeited.
//!
//! All style writes of one phase happen before any read of the next, with a
//! forced layout and a `render_settled()` barrier between the inverted and
//! the final writes. Transitions are suspended on every entity while
//! measuring and restored right before release.

use std::rc::Rc;

use indexmap::map::Entry;
use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};
use tableau_core::{Bounds, CollectionId, EntityId, NodeId, PropertyMap};
use tableau_layout::{
    collect_locations, Collection, CollectionRegistry, Entity, PossibleLocations, SharedCollection,
    TransitionOutcome,
};
use tracing::{debug, trace, warn};

use crate::aggregator::CompletionAggregator;
use crate::config::FlipConfig;
use crate::error::{AnimationError, Result};
use crate::events::{AnimationEvent, ListenerId, Listeners};
use crate::host::{measure, RenderHost};
use crate::placeholder::ExitPlaceholder;
use crate::policy::{AnimationPolicy, ResolvedPolicy};
use crate::record::{AfterState, AnimationRecord, BeforeState, RecordOrigin};

// ============================================================================
// Cycle state
// ============================================================================

/// Where the orchestrator is within a cycle
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CyclePhase {
    /// No cycle has been prepared yet
    #[default]
    Idle,
    /// Before snapshot taken, waiting for `animate()`
    Prepared,
    /// Transitions suspended, after snapshot being taken
    Measuring,
    /// Inverted styles being written
    Inverting,
    /// Transitions released, waiting for completions
    Playing,
    /// Every transition of the cycle completed or was forfeited
    Settled,
}

/// Summary of one `animate()` call
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub cycle: u64,
    /// Live entities measured after the mutation
    pub measured: usize,
    /// Entities (placeholders included) that were inverted and released
    pub animated: usize,
    /// Entities that borrowed a before snapshot from another collection
    pub stand_ins: usize,
    /// Exit placeholders created
    pub exits: usize,
    /// Vanished identities with no registered collection to exit to
    pub dropped: usize,
}

/// Collection geometry and majority values captured by `prepare()`
#[derive(Clone, Debug)]
struct CollectionSnapshot {
    bounds: Bounds,
    defaults: PropertyMap,
}

// ============================================================================
// Orchestrator
// ============================================================================

/// Drives FLIP cycles over every collection of a registry
pub struct FlipOrchestrator<H: RenderHost> {
    host: H,
    registry: Rc<CollectionRegistry>,
    /// Common ancestor all bounds are measured against
    root: NodeId,
    config: FlipConfig,
    policy: ResolvedPolicy,
    phase: CyclePhase,
    cycle: u64,
    /// Before snapshot, in measurement order
    records: IndexMap<EntityId, AnimationRecord<H::Content>>,
    snapshots: FxHashMap<CollectionId, CollectionSnapshot>,
    /// Collection holding each identity the aggregator waits on
    homes: FxHashMap<EntityId, CollectionId>,
    aggregator: CompletionAggregator,
    listeners: Listeners,
}

impl<H: RenderHost> FlipOrchestrator<H> {
    pub fn new(
        host: H,
        registry: Rc<CollectionRegistry>,
        root: NodeId,
        config: FlipConfig,
        policy: AnimationPolicy,
    ) -> Self {
        let policy = policy.resolve(&config);
        Self {
            host,
            registry,
            root,
            config,
            policy,
            phase: CyclePhase::Idle,
            cycle: 0,
            records: IndexMap::new(),
            snapshots: FxHashMap::default(),
            homes: FxHashMap::default(),
            aggregator: CompletionAggregator::new(),
            listeners: Listeners::default(),
        }
    }

    pub fn with_defaults(host: H, registry: Rc<CollectionRegistry>, root: NodeId) -> Self {
        Self::new(
            host,
            registry,
            root,
            FlipConfig::default(),
            AnimationPolicy::default(),
        )
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn registry(&self) -> &Rc<CollectionRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &FlipConfig {
        &self.config
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn phase(&self) -> CyclePhase {
        self.phase
    }

    /// Number of the current (or last) cycle; 0 before the first `prepare()`
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub fn record(&self, id: &EntityId) -> Option<&AnimationRecord<H::Content>> {
        self.records.get(id)
    }

    /// Records of the current cycle, in before-snapshot order
    pub fn records(&self) -> impl Iterator<Item = &AnimationRecord<H::Content>> {
        self.records.values()
    }

    /// Identities the current cycle still waits on
    pub fn outstanding(&self) -> usize {
        self.aggregator.outstanding()
    }

    pub fn is_animating(&self) -> bool {
        self.phase == CyclePhase::Playing
    }

    // ========================================================================
    // Events
    // ========================================================================

    pub fn subscribe<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&AnimationEvent) + 'static,
    {
        self.listeners.insert(Box::new(listener))
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    // ========================================================================
    // First
    // ========================================================================

    /// Snapshot every tracked entity before the caller mutates arrangements.
    ///
    /// Allowed in any phase. A cycle that is still playing is superseded:
    /// its expectations are dropped and the in-flight styles are measured as
    /// they currently appear.
    pub fn prepare(&mut self) {
        let collections = self.registry.snapshot();

        if matches!(self.phase, CyclePhase::Measuring | CyclePhase::Inverting) {
            debug!(cycle = self.cycle, phase = ?self.phase, "recovering abandoned animate()");
            restore_transitions(&collections);
        }

        self.cycle += 1;
        self.records.clear();
        self.snapshots.clear();
        self.homes.clear();
        self.aggregator.begin_cycle(self.cycle);

        for shared in &collections {
            let collection = shared.borrow();
            self.snapshots.insert(
                collection.id().clone(),
                CollectionSnapshot {
                    bounds: measure(&self.host, collection.node(), self.root),
                    defaults: collection.animating_prop_defaults(&collection.declared_properties()),
                },
            );

            for entity in collection.entities() {
                let id = entity.id();
                if id.is_spacer() {
                    continue;
                }

                let placeholder = entity.is_exit_placeholder();
                match self.records.get(id).map(|r| r.before.from_exit) {
                    None | Some(true) if !placeholder => {}
                    None => {}
                    Some(_) if placeholder => {
                        trace!(entity = %id, "placeholder shadowed by live entity");
                        continue;
                    }
                    Some(_) => {
                        warn!(cycle = self.cycle, entity = %id, collection = %collection.id(), "duplicate identity, keeping first");
                        continue;
                    }
                }

                let before = self.capture(&**entity, &collection);
                trace!(entity = %id, bounds = ?before.bounds, "measured before");
                self.records.insert(
                    id.clone(),
                    AnimationRecord::new(id.clone(), RecordOrigin::Measured, before),
                );
            }
        }

        self.phase = CyclePhase::Prepared;
        debug!(
            cycle = self.cycle,
            collections = collections.len(),
            entities = self.records.len(),
            "cycle prepared"
        );
    }

    fn capture(&self, entity: &dyn Entity, collection: &Collection) -> BeforeState<H::Content> {
        let node = entity.node();
        let content = if self.policy.keeps_content(entity) {
            self.host.clone_content(node)
        } else {
            None
        };

        BeforeState {
            bounds: measure(&self.host, node, self.root),
            transform: self.host.computed_transform(node),
            opacity: self.host.computed_opacity(node),
            props: entity.animating_prop_values(),
            content,
            collection: collection.id().clone(),
            from_exit: entity.is_exit_placeholder(),
        }
    }

    // ========================================================================
    // Last, Invert, Play
    // ========================================================================

    /// Measure the new arrangement, invert every entity that changed and
    /// release their transitions.
    ///
    /// Resolves once all transitions have been started. Requires a
    /// preceding `prepare()`.
    pub async fn animate(&mut self) -> Result<CycleReport> {
        if self.phase != CyclePhase::Prepared {
            return Err(AnimationError::NotPrepared { phase: self.phase });
        }
        let cycle = self.cycle;
        let mut report = CycleReport {
            cycle,
            ..CycleReport::default()
        };

        self.host.render_settled().await;

        // Last
        self.phase = CyclePhase::Measuring;
        let collections = self.registry.snapshot();
        let live: FxHashMap<CollectionId, SharedCollection> = collections
            .iter()
            .map(|shared| (shared.borrow().id().clone(), shared.clone()))
            .collect();

        for shared in &collections {
            let mut collection = shared.borrow_mut();
            collection.set_no_animate(true);
            for entity in collection.entities_mut() {
                entity.reset_animating();
                entity.set_no_animate(true);
            }
            for ghost in collection.drain_exit_placeholders() {
                trace!(entity = %ghost.id(), "purging placeholder of an earlier cycle");
                self.host.remove_node(ghost.node());
            }
        }

        let locations = collect_locations(&collections);
        let mut seen: FxHashSet<EntityId> = FxHashSet::default();
        let mut animating: Vec<(CollectionId, EntityId)> = Vec::new();

        for shared in &collections {
            let collection = shared.borrow();
            for entity in collection.entities() {
                let id = entity.id();
                if id.is_spacer() {
                    continue;
                }
                if !seen.insert(id.clone()) {
                    warn!(cycle, entity = %id, collection = %collection.id(), "duplicate identity after mutation, ignoring");
                    continue;
                }
                report.measured += 1;

                let node = entity.node();
                let after = AfterState {
                    bounds: measure(&self.host, node, self.root),
                    transform: self.host.computed_transform(node),
                    opacity: self.host.computed_opacity(node),
                    props: entity.animating_prop_values(),
                    collection: collection.id().clone(),
                };
                trace!(entity = %id, bounds = ?after.bounds, "measured after");

                let record = match self.records.entry(id.clone()) {
                    Entry::Occupied(entry) => entry.into_mut(),
                    Entry::Vacant(entry) => {
                        match stand_in(&locations, &self.snapshots, id, &after) {
                            Some((source, before)) => {
                                trace!(entity = %id, source = %source, "borrowing stand-in before");
                                report.stand_ins += 1;
                                entry.insert(AnimationRecord::new(
                                    id.clone(),
                                    RecordOrigin::StandIn(source),
                                    before,
                                ))
                            }
                            None => {
                                trace!(entity = %id, "appeared without history");
                                continue;
                            }
                        }
                    }
                };

                record.resolve(after, &**entity);
                if record.needs_animation {
                    animating.push((collection.id().clone(), id.clone()));
                }
            }
        }

        // Identities that vanished leave through a placeholder
        let orphans: Vec<EntityId> = self
            .records
            .keys()
            .filter(|id| !seen.contains(*id))
            .cloned()
            .collect();

        for id in orphans {
            let Some(record) = self.records.get_mut(&id) else {
                continue;
            };
            let Some(destination) = exit_destination(&locations, &live, &id, &record.before.collection)
            else {
                debug!(cycle, entity = %id, "no registered collection to exit to, dropping");
                report.dropped += 1;
                continue;
            };

            let shared = &live[&destination];
            let mut collection = shared.borrow_mut();

            let keys: Vec<String> = record.before.props.keys().cloned().collect();
            let mut props = record.before.props.clone();
            for (key, value) in collection.animating_prop_defaults(&keys) {
                props.insert(key, value);
            }

            let node = self.host.create_exit_node(collection.node(), &id);
            let mut placeholder = ExitPlaceholder::new(id.clone(), node, props.clone());
            placeholder.set_no_animate(true);

            let after = AfterState {
                bounds: measure(&self.host, node, self.root),
                transform: self.host.computed_transform(node),
                opacity: self.config.exit_opacity,
                props,
                collection: destination.clone(),
            };
            record.origin = RecordOrigin::Exit(destination.clone());
            record.resolve(after, &placeholder);

            if record.needs_animation {
                trace!(entity = %id, destination = %destination, "exit placeholder created");
                collection.push(Box::new(placeholder));
                animating.push((destination, id));
                report.exits += 1;
            } else {
                trace!(entity = %id, "exit needs no animation");
                self.host.remove_node(node);
            }
        }

        // Invert
        self.phase = CyclePhase::Inverting;
        let mut announced = false;
        for (collection_id, id) in &animating {
            let Some(record) = self.records.get(id) else {
                continue;
            };
            let rotated = record
                .after
                .as_ref()
                .map_or(false, |after| self.policy.rotated(&record.before.props, &after.props));
            let Some(params) = record.invert_params(rotated) else {
                continue;
            };

            let shared = &live[collection_id];
            if !shared.borrow().contains(id) {
                continue;
            }
            if !announced {
                self.listeners.emit(AnimationEvent::WillAnimate { cycle });
                announced = true;
            }

            let mut collection = shared.borrow_mut();
            let Some(entity) = collection.entity_mut(id) else {
                continue;
            };
            trace!(entity = %id, transform = %params.transform, rotated, "inverting");
            entity.prepare_animation(&params);
            if entity.is_exit_placeholder() {
                if let Some(content) = &record.before.content {
                    self.host.splice_content(entity.node(), content);
                }
            }

            self.aggregator.expect(id.clone());
            self.homes.insert(id.clone(), collection_id.clone());
            report.animated += 1;
        }

        self.host.force_layout();
        restore_transitions(&collections);
        self.host.render_settled().await;

        // Play
        self.phase = CyclePhase::Playing;
        let duration = self.policy.duration;
        for (collection_id, id) in &animating {
            if !self.aggregator.is_waiting_for(id) {
                continue;
            }
            let params = self.records.get(id).and_then(|r| r.play_params(duration));

            // The collection or the entity may have gone while we yielded
            let shared = self.registry.get(collection_id);
            let started = match (&shared, params) {
                (Some(shared), Some(params)) => shared
                    .borrow_mut()
                    .entity_mut(id)
                    .map(|entity| entity.start_animation(&params)),
                _ => None,
            };

            match (started, shared) {
                (Some(0), Some(shared)) => {
                    trace!(entity = %id, "nothing to wait for");
                    self.homes.remove(id);
                    self.dismiss_placeholder(&shared, id);
                    self.aggregator.complete(id);
                }
                (Some(pending), _) => {
                    trace!(entity = %id, pending, "playing");
                }
                (None, _) => {
                    debug!(cycle, entity = %id, "entity left before its transition started");
                    self.homes.remove(id);
                    self.aggregator.forfeit(id);
                }
            }
        }

        debug!(
            cycle,
            measured = report.measured,
            animated = report.animated,
            stand_ins = report.stand_ins,
            exits = report.exits,
            dropped = report.dropped,
            "transitions started"
        );

        if self.aggregator.arm() {
            self.settle();
        }
        Ok(report)
    }

    /// Run `animate()` to completion on the current thread
    pub fn animate_blocking(&mut self) -> Result<CycleReport> {
        pollster::block_on(self.animate())
    }

    // ========================================================================
    // Completion routing
    // ========================================================================

    /// Route a host completion signal for `property` of `id`.
    ///
    /// Signals for identities the current cycle does not wait on are
    /// reported as `Unexpected` and otherwise ignored.
    pub fn transition_ended(&mut self, id: &EntityId, property: &str) -> TransitionOutcome {
        let Some(collection_id) = self.homes.get(id).cloned() else {
            trace!(cycle = self.cycle, entity = %id, property, "stale completion");
            return TransitionOutcome::Unexpected;
        };
        let Some(shared) = self.registry.get(&collection_id) else {
            self.before_orphaned(id);
            return TransitionOutcome::Unexpected;
        };

        let outcome = shared
            .borrow_mut()
            .entity_mut(id)
            .map_or(TransitionOutcome::Unexpected, |entity| {
                entity.transition_ended(property)
            });

        if outcome == TransitionOutcome::Settled {
            self.homes.remove(id);
            self.dismiss_placeholder(&shared, id);
            if self.aggregator.complete(id) {
                self.settle();
            }
        }
        outcome
    }

    /// `id` left the tree before its completion signal fired
    pub fn before_orphaned(&mut self, id: &EntityId) {
        let Some(home) = self.homes.remove(id) else {
            return;
        };
        if let Some(shared) = self.registry.get(&home) {
            self.dismiss_placeholder(&shared, id);
        }
        if self.aggregator.forfeit(id) {
            self.settle();
        }
    }

    /// Unregister a collection, forfeiting every identity of the current
    /// cycle that was animating inside it
    pub fn detach_collection(&mut self, id: &CollectionId) -> Result<SharedCollection> {
        let detached = self.registry.unregister(id)?;

        for ghost in detached.borrow_mut().drain_exit_placeholders() {
            self.host.remove_node(ghost.node());
        }

        let gone: Vec<EntityId> = self
            .homes
            .iter()
            .filter(|(_, home)| *home == id)
            .map(|(entity, _)| entity.clone())
            .collect();
        for entity in gone {
            self.before_orphaned(&entity);
        }
        Ok(detached)
    }

    fn dismiss_placeholder(&mut self, collection: &SharedCollection, id: &EntityId) {
        let mut collection = collection.borrow_mut();
        let is_placeholder = collection
            .entity(id)
            .map_or(false, |entity| entity.is_exit_placeholder());
        if !is_placeholder {
            return;
        }
        if let Some(placeholder) = collection.remove(id) {
            trace!(entity = %id, "exit placeholder removed");
            self.host.remove_node(placeholder.node());
        }
    }

    fn settle(&mut self) {
        self.phase = CyclePhase::Settled;
        debug!(cycle = self.cycle, "cycle settled");
        self.listeners
            .emit(AnimationEvent::AnimationDone { cycle: self.cycle });
    }
}

impl<H: RenderHost> std::fmt::Debug for FlipOrchestrator<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlipOrchestrator")
            .field("root", &self.root)
            .field("phase", &self.phase)
            .field("cycle", &self.cycle)
            .field("records", &self.records.len())
            .field("outstanding", &self.aggregator.outstanding())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn restore_transitions(collections: &[SharedCollection]) {
    for shared in collections {
        let mut collection = shared.borrow_mut();
        collection.set_no_animate(false);
        for entity in collection.entities_mut() {
            entity.set_no_animate(false);
        }
    }
}

/// Before snapshot for an entity that was not measured by `prepare()`,
/// borrowed from the first other collection it plausibly came from
fn stand_in<C>(
    locations: &PossibleLocations,
    snapshots: &FxHashMap<CollectionId, CollectionSnapshot>,
    id: &EntityId,
    after: &AfterState,
) -> Option<(CollectionId, BeforeState<C>)> {
    let location = locations.get(id)?;
    let (source, snapshot) = location
        .candidates()
        .filter(|sighting| sighting.collection != after.collection)
        .find_map(|sighting| {
            snapshots
                .get(&sighting.collection)
                .map(|snapshot| (sighting.collection.clone(), snapshot))
        })?;

    let mut props = after.props.clone();
    for (key, value) in props.iter_mut() {
        if let Some(default) = snapshot.defaults.get(key) {
            *value = default.clone();
        }
    }

    let before = BeforeState {
        bounds: snapshot.bounds,
        transform: after.transform.clone(),
        opacity: after.opacity,
        props,
        content: None,
        collection: source.clone(),
        from_exit: false,
    };
    Some((source, before))
}

/// Collection a vanished identity exits to: its previous home, else its
/// current home, else where it was measured, whichever is still registered
fn exit_destination(
    locations: &PossibleLocations,
    live: &FxHashMap<CollectionId, SharedCollection>,
    id: &EntityId,
    source: &CollectionId,
) -> Option<CollectionId> {
    locations
        .get(id)
        .and_then(|location| {
            location
                .candidates()
                .map(|sighting| &sighting.collection)
                .find(|collection| live.contains_key(*collection))
        })
        .or_else(|| live.contains_key(source).then_some(source))
        .cloned()
}
