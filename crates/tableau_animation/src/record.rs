//! Per-identity animation records
//!
//! A record is created for every identity measured by `prepare()` (or
//! borrowed as a stand-in during `animate()`), completed with the
//! post-mutation measurement, and discarded when the next cycle starts.

use std::time::Duration;

use tableau_core::{compute_inverse_transform, Bounds, CollectionId, EntityId, PropertyMap};
use tableau_core::{OPACITY, TRANSFORM};
use tableau_layout::{Entity, InvertParams, PlayParams};

/// How the before half of a record was obtained
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecordOrigin {
    /// Measured from a live entity during `prepare()`
    Measured,
    /// Borrowed from a collection the identity plausibly came from
    StandIn(CollectionId),
    /// Resolved to a synthesized exit placeholder
    Exit(CollectionId),
}

/// Snapshot taken before the arrangement changed
#[derive(Clone, Debug)]
pub struct BeforeState<C> {
    pub bounds: Bounds,
    pub transform: String,
    pub opacity: f32,
    pub props: PropertyMap,
    pub content: Option<C>,
    /// Collection the identity was measured in
    pub collection: CollectionId,
    /// Measured from an exit placeholder of an earlier cycle
    pub from_exit: bool,
}

/// Snapshot taken after the arrangement changed
#[derive(Clone, Debug, PartialEq)]
pub struct AfterState {
    pub bounds: Bounds,
    pub transform: String,
    pub opacity: f32,
    pub props: PropertyMap,
    pub collection: CollectionId,
}

/// Everything the orchestrator knows about one identity in one cycle
#[derive(Clone, Debug)]
pub struct AnimationRecord<C> {
    pub id: EntityId,
    pub origin: RecordOrigin,
    pub before: BeforeState<C>,
    pub after: Option<AfterState>,
    /// Position, scale or applied transform differ
    pub needs_host_transition: bool,
    /// Anything observable differs (host transition, opacity, properties)
    pub needs_animation: bool,
    /// Opacity differs
    pub opacity_changed: bool,
    /// Declared properties whose value differs
    pub changed_properties: Vec<String>,
}

impl<C> AnimationRecord<C> {
    pub fn new(id: EntityId, origin: RecordOrigin, before: BeforeState<C>) -> Self {
        Self {
            id,
            origin,
            before,
            after: None,
            needs_host_transition: false,
            needs_animation: false,
            opacity_changed: false,
            changed_properties: Vec::new(),
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.after.is_some()
    }

    /// Complete the record with the post-mutation snapshot and decide what
    /// actually needs to move.
    ///
    /// Comparisons are exact. Properties the entity declares it will never
    /// transition are left out, since the host would never report their
    /// completion.
    pub fn resolve(&mut self, after: AfterState, entity: &dyn Entity) {
        let before = &self.before;

        self.needs_host_transition = !entity.will_not_animate(TRANSFORM)
            && (before.bounds != after.bounds || before.transform != after.transform);

        self.opacity_changed = !entity.will_not_animate(OPACITY) && before.opacity != after.opacity;

        self.changed_properties = entity
            .animating_properties()
            .iter()
            .filter(|property| !entity.will_not_animate(property))
            .filter(|property| {
                matches!(
                    (before.props.get(*property), after.props.get(*property)),
                    (Some(b), Some(a)) if b != a
                )
            })
            .cloned()
            .collect();

        self.needs_animation =
            self.needs_host_transition || self.opacity_changed || !self.changed_properties.is_empty();
        self.after = Some(after);
    }

    /// Styles that make the new box look like the old one.
    ///
    /// Without a host transition the transform is left at its final value,
    /// so the host never sees a geometry change it would not report.
    pub fn invert_params(&self, rotated: bool) -> Option<InvertParams> {
        let after = self.after.as_ref()?;
        let transform = if self.needs_host_transition {
            compute_inverse_transform(&self.before.bounds, &after.bounds, rotated)
                .to_css(&self.before.transform)
        } else {
            after.transform.clone()
        };

        Some(InvertParams {
            props: self.before.props.clone(),
            transform,
            opacity: self.before.opacity,
        })
    }

    /// Final styles to release towards
    pub fn play_params(&self, duration: Duration) -> Option<PlayParams> {
        let after = self.after.as_ref()?;
        Some(PlayParams {
            props: after.props.clone(),
            transform: after.transform.clone(),
            opacity: after.opacity,
            expect_host_transition: self.needs_host_transition,
            expect_opacity_transition: self.opacity_changed,
            changed_properties: self.changed_properties.clone(),
            duration,
        })
    }
}
