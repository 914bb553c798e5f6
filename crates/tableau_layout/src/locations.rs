//! Identity resolution
//!
//! When an identity disappears from view (a card slides into a face-down
//! deck) or appears somewhere without having been measured (it was hidden
//! under the top card), the orchestrator needs a plausible place it came
//! from or went to. Collections remember the render version at which each
//! identity last became visible in them; folding those memories together
//! gives, per identity, the two most recent homes:
//!
//! - **current**: the highest version seen across all collections
//! - **previous**: the runner-up, usually where it was before that
//!
//! No collection-to-collection pointers are needed.

use rustc_hash::FxHashMap;
use tableau_core::{CollectionId, EntityId, Version};

use crate::collection::Collection;
use crate::registry::SharedCollection;

/// One collection's memory of an identity
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sighting {
    pub version: Version,
    pub collection: CollectionId,
}

/// The two most recent homes of an identity
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PossibleLocation {
    /// Most recent sighting (presumed current home)
    pub current: Sighting,
    /// Second most recent sighting (presumed previous home)
    pub previous: Option<Sighting>,
}

impl PossibleLocation {
    fn new(sighting: Sighting) -> Self {
        Self {
            current: sighting,
            previous: None,
        }
    }

    /// The previous home when known, otherwise the current one
    pub fn preferred(&self) -> &Sighting {
        self.previous.as_ref().unwrap_or(&self.current)
    }

    /// Homes in preference order: previous first, then current
    pub fn candidates(&self) -> impl Iterator<Item = &Sighting> {
        self.previous.iter().chain(std::iter::once(&self.current))
    }

    /// Fold one more sighting in, keeping the two most recent.
    ///
    /// A strictly greater version wins; an equal version never displaces an
    /// earlier record and only fills the runner-up slot when it is empty.
    fn offer(&mut self, sighting: Sighting) {
        if sighting.version > self.current.version {
            let displaced = std::mem::replace(&mut self.current, sighting);
            self.previous = Some(displaced);
            return;
        }

        let takes_runner_up = match &self.previous {
            None => true,
            Some(previous) => sighting.version > previous.version,
        };
        if takes_runner_up {
            self.previous = Some(sighting);
        }
    }
}

/// Identity → two most recent homes
pub type PossibleLocations = FxHashMap<EntityId, PossibleLocation>;

/// Fold one collection's version memory into `locations`.
///
/// Call once per collection, in registration order.
pub fn ingest(locations: &mut PossibleLocations, collection: &Collection) {
    for (id, &version) in collection.last_seen_version() {
        let sighting = Sighting {
            version,
            collection: collection.id().clone(),
        };
        match locations.get_mut(id) {
            Some(location) => location.offer(sighting),
            None => {
                locations.insert(id.clone(), PossibleLocation::new(sighting));
            }
        }
    }
}

/// Ingest every collection of a registry snapshot, in order
pub fn collect_locations(collections: &[SharedCollection]) -> PossibleLocations {
    let mut locations = PossibleLocations::default();
    for collection in collections {
        ingest(&mut locations, &collection.borrow());
    }
    locations
}

#[cfg(test)]
mod tests {
    use super::*;
    use tableau_core::NodeId;

    fn collection(name: &str, seen: &[(&str, Version)]) -> Collection {
        let mut collection = Collection::new(name, NodeId::new(0));
        for (id, version) in seen {
            collection.mark_seen(EntityId::new(id), *version);
        }
        collection
    }

    fn locate(collections: &[Collection]) -> PossibleLocations {
        let mut locations = PossibleLocations::default();
        for c in collections {
            ingest(&mut locations, c);
        }
        locations
    }

    #[test]
    fn test_highest_version_is_current() {
        let locations = locate(&[
            collection("deck", &[("ace", 1)]),
            collection("hand", &[("ace", 7)]),
            collection("pile", &[("ace", 4)]),
        ]);

        let ace = &locations[&EntityId::new("ace")];
        assert_eq!(ace.current.collection.as_str(), "hand");
        assert_eq!(ace.current.version, 7);
        assert_eq!(ace.previous.as_ref().unwrap().collection.as_str(), "pile");
        assert_eq!(ace.preferred().collection.as_str(), "pile");
    }

    #[test]
    fn test_equal_versions_prefer_earlier_registered() {
        for _ in 0..10 {
            let locations = locate(&[
                collection("left", &[("ace", 3)]),
                collection("right", &[("ace", 3)]),
            ]);
            let ace = &locations[&EntityId::new("ace")];
            assert_eq!(ace.current.collection.as_str(), "left");
            assert_eq!(ace.previous.as_ref().unwrap().collection.as_str(), "right");
        }
    }

    #[test]
    fn test_third_equal_contender_is_ignored() {
        let locations = locate(&[
            collection("a", &[("ace", 3)]),
            collection("b", &[("ace", 3)]),
            collection("c", &[("ace", 3)]),
        ]);
        let ace = &locations[&EntityId::new("ace")];
        assert_eq!(ace.current.collection.as_str(), "a");
        assert_eq!(ace.previous.as_ref().unwrap().collection.as_str(), "b");
    }

    #[test]
    fn test_runner_up_is_replaced_by_newer_sighting() {
        let locations = locate(&[
            collection("a", &[("ace", 10)]),
            collection("b", &[("ace", 2)]),
            collection("c", &[("ace", 5)]),
        ]);
        let ace = &locations[&EntityId::new("ace")];
        assert_eq!(ace.current.collection.as_str(), "a");
        assert_eq!(ace.previous.as_ref().unwrap().version, 5);
    }

    #[test]
    fn test_single_home_has_no_previous() {
        let locations = locate(&[collection("deck", &[("ace", 1), ("two", 1)])]);
        let ace = &locations[&EntityId::new("ace")];
        assert!(ace.previous.is_none());
        assert_eq!(ace.preferred().collection.as_str(), "deck");
        assert_eq!(ace.candidates().count(), 1);
        assert_eq!(locations.len(), 2);
    }
}
