//! Exit placeholders
//!
//! When an identity vanishes (a card slides into a face-down deck), its box
//! is gone before anything can animate. The orchestrator appends a
//! placeholder to the destination collection instead: a transient entity
//! with the vanished identity that transitions from the old box to the
//! destination's neutral placement and then removes itself.

use tableau_core::{EntityId, NodeId, PropertyMap};
use tableau_layout::{Entity, InvertParams, PlayParams, TransitionOutcome, TransitionTracker};

/// Transient stand-in for an identity that left view
#[derive(Debug)]
pub struct ExitPlaceholder {
    id: EntityId,
    node: NodeId,
    properties: Vec<String>,
    props: PropertyMap,
    transform: String,
    opacity: f32,
    no_animate: bool,
    tracker: TransitionTracker,
}

impl ExitPlaceholder {
    /// Placeholder showing `props` (the destination's defaults) at rest
    pub fn new(id: EntityId, node: NodeId, props: PropertyMap) -> Self {
        Self {
            id,
            node,
            properties: props.keys().cloned().collect(),
            props,
            transform: "none".to_string(),
            opacity: 1.0,
            no_animate: false,
            tracker: TransitionTracker::new(),
        }
    }

    /// Last transform written to the placeholder
    pub fn transform(&self) -> &str {
        &self.transform
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }
}

impl Entity for ExitPlaceholder {
    fn id(&self) -> &EntityId {
        &self.id
    }

    fn node(&self) -> NodeId {
        self.node
    }

    fn animating_properties(&self) -> &[String] {
        &self.properties
    }

    fn animating_prop_values(&self) -> PropertyMap {
        self.props.clone()
    }

    fn prepare_animation(&mut self, params: &InvertParams) {
        self.props = params.props.clone();
        self.transform = params.transform.clone();
        self.opacity = params.opacity;
    }

    fn start_animation(&mut self, params: &PlayParams) -> usize {
        self.props = params.props.clone();
        self.transform = params.transform.clone();
        self.opacity = params.opacity;
        self.tracker.expect_play(params)
    }

    fn transition_ended(&mut self, property: &str) -> TransitionOutcome {
        self.tracker.finish(property)
    }

    fn reset_animating(&mut self) {
        self.tracker.reset();
    }

    fn set_no_animate(&mut self, no_animate: bool) {
        self.no_animate = no_animate;
    }

    fn is_exit_placeholder(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tableau_core::{PropValue, OPACITY, TRANSFORM};

    #[test]
    fn test_placeholder_plays_and_settles() {
        let mut defaults = PropertyMap::new();
        defaults.insert("face_up".into(), PropValue::Bool(false));
        let mut exit = ExitPlaceholder::new(EntityId::new("ace"), NodeId::new(9), defaults.clone());
        assert!(exit.is_exit_placeholder());
        assert_eq!(exit.animating_properties(), ["face_up"]);

        let mut face_up = PropertyMap::new();
        face_up.insert("face_up".into(), PropValue::Bool(true));
        exit.prepare_animation(&InvertParams {
            props: face_up,
            transform: "translateY(10px) translateX(0px) scale(1)".into(),
            opacity: 1.0,
        });
        assert_eq!(exit.animating_prop_values().get("face_up"), Some(&PropValue::Bool(true)));

        let pending = exit.start_animation(&PlayParams {
            props: defaults,
            transform: "none".into(),
            opacity: 0.0,
            expect_host_transition: true,
            expect_opacity_transition: true,
            changed_properties: vec!["face_up".into()],
            duration: Duration::from_millis(300),
        });
        assert_eq!(pending, 3);
        assert_eq!(exit.opacity(), 0.0);
        assert_eq!(exit.transform(), "none");

        assert_eq!(exit.transition_ended(TRANSFORM), TransitionOutcome::Pending);
        assert_eq!(exit.transition_ended(OPACITY), TransitionOutcome::Pending);
        assert_eq!(exit.transition_ended("face_up"), TransitionOutcome::Settled);
    }
}
