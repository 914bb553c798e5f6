//! Entity capability contract
//!
//! An entity is one visual item (a card, a token) with a stable identity.
//! The orchestrator never knows what an entity looks like; it only reads its
//! declared animating properties and drives it through two calls per cycle:
//!
//! 1. `prepare_animation` - jump to the inverted (old-looking) state
//! 2. `start_animation` - release towards the natural state under a transition
//!
//! The entity then reports each finished host transition through
//! `transition_ended`, and tells the caller when its last expected signal
//! arrived.

use std::time::Duration;

use smallvec::SmallVec;
use tableau_core::{EntityId, NodeId, PropertyMap, OPACITY, TRANSFORM};

// ============================================================================
// Parameters
// ============================================================================

/// Inverted styles applied right before transitions are released
#[derive(Clone, Debug, PartialEq)]
pub struct InvertParams {
    /// Property values from before the arrangement changed
    pub props: PropertyMap,
    /// Transform string that puts the box back over its old position
    pub transform: String,
    /// Opacity from before the arrangement changed
    pub opacity: f32,
}

/// Final styles the entity transitions to
#[derive(Clone, Debug, PartialEq)]
pub struct PlayParams {
    /// Property values after the arrangement changed
    pub props: PropertyMap,
    /// Natural transform of the box in its new position
    pub transform: String,
    /// Natural opacity in its new position
    pub opacity: f32,
    /// The host will fire a completion signal for the transform
    pub expect_host_transition: bool,
    /// The host will fire a completion signal for opacity
    pub expect_opacity_transition: bool,
    /// Declared properties whose value actually differs from before
    pub changed_properties: Vec<String>,
    /// Transition length the entity should use
    pub duration: Duration,
}

impl PlayParams {
    /// Every completion signal this play is expected to produce
    pub fn expected_signals(&self) -> impl Iterator<Item = &str> + '_ {
        let host: Option<&str> = self.expect_host_transition.then_some(TRANSFORM);
        let opacity: Option<&str> = self.expect_opacity_transition.then_some(OPACITY);
        host.into_iter()
            .chain(opacity)
            .chain(self.changed_properties.iter().map(String::as_str))
    }
}

// ============================================================================
// Completion tracking
// ============================================================================

/// Result of feeding one host completion signal to an entity
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// That was the last expected signal
    Settled,
    /// More signals are still expected
    Pending,
    /// The signal was not expected (stale cycle, or never registered)
    Unexpected,
}

/// Expected completion signals of one entity.
///
/// Entities embed one of these and forward `start_animation`,
/// `transition_ended` and `reset_animating` to it.
#[derive(Clone, Debug, Default)]
pub struct TransitionTracker {
    pending: SmallVec<[String; 4]>,
}

impl TransitionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one expected signal. Duplicate registrations collapse.
    pub fn expect(&mut self, property: &str) {
        if !self.pending.iter().any(|p| p == property) {
            self.pending.push(property.to_string());
        }
    }

    /// Register every signal of a play, returning how many are pending
    pub fn expect_play(&mut self, params: &PlayParams) -> usize {
        for property in params.expected_signals() {
            self.expect(property);
        }
        self.pending.len()
    }

    /// Consume one signal
    pub fn finish(&mut self, property: &str) -> TransitionOutcome {
        match self.pending.iter().position(|p| p == property) {
            Some(index) => {
                self.pending.remove(index);
                if self.pending.is_empty() {
                    TransitionOutcome::Settled
                } else {
                    TransitionOutcome::Pending
                }
            }
            None => TransitionOutcome::Unexpected,
        }
    }

    /// Drop every pending expectation. Idempotent.
    pub fn reset(&mut self) {
        self.pending.clear();
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn is_animating(&self) -> bool {
        !self.pending.is_empty()
    }
}

// ============================================================================
// Entity trait
// ============================================================================

/// Capability surface of a visual entity
pub trait Entity {
    /// Stable identity. The spacer identity opts out of all tracking.
    fn id(&self) -> &EntityId;

    /// Host box of this entity
    fn node(&self) -> NodeId;

    /// Names of the entity's own properties that take part in transitions
    fn animating_properties(&self) -> &[String];

    /// Current values of the declared animating properties
    fn animating_prop_values(&self) -> PropertyMap;

    /// Apply before-values and the inverted transform. Called once, before
    /// transitions are released.
    fn prepare_animation(&mut self, params: &InvertParams);

    /// Apply after-values and the final transform, registering completion
    /// signals only for what actually changes. Returns the number of signals
    /// now pending; zero means the entity is already settled.
    fn start_animation(&mut self, params: &PlayParams) -> usize;

    /// Feed a host completion signal for `property`
    fn transition_ended(&mut self, property: &str) -> TransitionOutcome;

    /// Discard pending expectations from an earlier cycle. Idempotent.
    fn reset_animating(&mut self);

    /// Suspend (`true`) or restore (`false`) host transitions on this entity
    fn set_no_animate(&mut self, no_animate: bool);

    /// The host will never fire a completion for `property` on this entity
    /// (e.g. spacer-style rendering that has no box to transition).
    fn will_not_animate(&self, _property: &str) -> bool {
        false
    }

    /// Clone the entity's rendered content at prepare time, so an exit
    /// placeholder can show it while leaving
    fn keeps_content(&self) -> bool {
        false
    }

    /// Transient exit placeholder synthesized by the orchestrator
    fn is_exit_placeholder(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn play(host: bool, opacity: bool, changed: &[&str]) -> PlayParams {
        PlayParams {
            props: PropertyMap::new(),
            transform: String::new(),
            opacity: 1.0,
            expect_host_transition: host,
            expect_opacity_transition: opacity,
            changed_properties: changed.iter().map(|s| s.to_string()).collect(),
            duration: Duration::from_millis(300),
        }
    }

    #[test]
    fn test_expected_signals() {
        let params = play(true, false, &["face_up"]);
        let signals: Vec<_> = params.expected_signals().collect();
        assert_eq!(signals, [TRANSFORM, "face_up"]);

        let params = play(false, false, &[]);
        assert_eq!(params.expected_signals().count(), 0);
    }

    #[test]
    fn test_tracker_settles_on_last_signal() {
        let mut tracker = TransitionTracker::new();
        assert_eq!(tracker.expect_play(&play(true, true, &[])), 2);

        assert_eq!(tracker.finish(OPACITY), TransitionOutcome::Pending);
        assert_eq!(tracker.finish(OPACITY), TransitionOutcome::Unexpected);
        assert_eq!(tracker.finish(TRANSFORM), TransitionOutcome::Settled);
        assert!(!tracker.is_animating());
    }

    #[test]
    fn test_tracker_reset_is_idempotent() {
        let mut tracker = TransitionTracker::new();
        tracker.expect(TRANSFORM);
        tracker.expect(TRANSFORM);
        assert_eq!(tracker.pending_count(), 1);

        tracker.reset();
        tracker.reset();
        assert_eq!(tracker.pending_count(), 0);
        assert_eq!(tracker.finish(TRANSFORM), TransitionOutcome::Unexpected);
    }
}
