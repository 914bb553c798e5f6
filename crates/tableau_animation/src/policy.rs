//! Optional caller capabilities
//!
//! A caller can refine how the orchestrator treats its entities without
//! implementing a full trait: every capability is optional, and the set is
//! resolved exactly once when the orchestrator is built. Nothing is probed
//! per cycle.

use std::time::Duration;

use tableau_core::{is_quarter_turn_change, EntityId, PropertyMap};
use tableau_layout::Entity;

use crate::config::FlipConfig;

type RotationCheck = Box<dyn Fn(&PropertyMap, &PropertyMap) -> bool>;
type ContentCheck = Box<dyn Fn(&EntityId) -> bool>;

/// Optional overrides of engine behavior
#[derive(Default)]
pub struct AnimationPolicy {
    /// Transition length; overrides `FlipConfig::transition_ms`
    pub animation_length: Option<Duration>,
    /// Decide whether a box turned by a quarter turn between before and after
    pub is_rotated: Option<RotationCheck>,
    /// Clone content of these identities even if the entity does not ask
    pub keep_content: Option<ContentCheck>,
}

impl AnimationPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_animation_length(mut self, length: Duration) -> Self {
        self.animation_length = Some(length);
        self
    }

    pub fn with_rotation_check<F>(mut self, check: F) -> Self
    where
        F: Fn(&PropertyMap, &PropertyMap) -> bool + 'static,
    {
        self.is_rotated = Some(Box::new(check));
        self
    }

    pub fn with_keep_content<F>(mut self, check: F) -> Self
    where
        F: Fn(&EntityId) -> bool + 'static,
    {
        self.keep_content = Some(Box::new(check));
        self
    }

    /// Fill every missing capability from `config`
    pub(crate) fn resolve(self, config: &FlipConfig) -> ResolvedPolicy {
        let is_rotated = self.is_rotated.unwrap_or_else(|| {
            let property = config.rotation_property.clone();
            let check: RotationCheck = Box::new(move |before: &PropertyMap, after: &PropertyMap| {
                is_quarter_turn_change(before.get(&property), after.get(&property))
            });
            check
        });

        ResolvedPolicy {
            duration: self.animation_length.unwrap_or_else(|| config.transition()),
            is_rotated,
            keep_content: self.keep_content,
            clone_content: config.clone_exit_content,
        }
    }
}

impl std::fmt::Debug for AnimationPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnimationPolicy")
            .field("animation_length", &self.animation_length)
            .field("is_rotated", &self.is_rotated.is_some())
            .field("keep_content", &self.keep_content.is_some())
            .finish()
    }
}

/// Policy with every capability filled in
pub(crate) struct ResolvedPolicy {
    pub duration: Duration,
    is_rotated: RotationCheck,
    keep_content: Option<ContentCheck>,
    clone_content: bool,
}

impl ResolvedPolicy {
    pub fn rotated(&self, before: &PropertyMap, after: &PropertyMap) -> bool {
        (self.is_rotated)(before, after)
    }

    pub fn keeps_content(&self, entity: &dyn Entity) -> bool {
        self.clone_content
            && (entity.keeps_content()
                || self
                    .keep_content
                    .as_ref()
                    .map_or(false, |check| check(entity.id())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tableau_core::PropValue;

    fn props(rotated: bool) -> PropertyMap {
        let mut props = PropertyMap::new();
        props.insert("rotated".into(), PropValue::Bool(rotated));
        props
    }

    #[test]
    fn test_defaults_come_from_config() {
        let config = FlipConfig::default().with_transition_ms(200);
        let policy = AnimationPolicy::new().resolve(&config);

        assert_eq!(policy.duration, Duration::from_millis(200));
        assert!(policy.rotated(&props(false), &props(true)));
        assert!(!policy.rotated(&props(true), &props(true)));
    }

    #[test]
    fn test_overrides_win() {
        let config = FlipConfig::default();
        let policy = AnimationPolicy::new()
            .with_animation_length(Duration::from_millis(50))
            .with_rotation_check(|_, _| false)
            .resolve(&config);

        assert_eq!(policy.duration, Duration::from_millis(50));
        assert!(!policy.rotated(&props(false), &props(true)));
    }

    #[test]
    fn test_custom_rotation_property() {
        let config = FlipConfig::default().with_rotation_property("tapped");
        let policy = AnimationPolicy::new().resolve(&config);

        let mut before = PropertyMap::new();
        before.insert("tapped".into(), PropValue::Number(0.0));
        let mut after = PropertyMap::new();
        after.insert("tapped".into(), PropValue::Number(90.0));
        assert!(policy.rotated(&before, &after));
        assert!(!policy.rotated(&props(false), &props(true)));
    }
}
