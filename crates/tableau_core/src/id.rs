//! Stable identities for entities, collections and host nodes.
//!
//! Entity identities come from the game state (a card id, a token id) and are
//! unique within one animation cycle. The empty identity marks a spacer: a
//! non-animating filler the layout inserts to keep positions stable. Spacers
//! never take part in tracking.

use std::fmt;
use std::sync::Arc;

/// Opaque identity of a visual entity.
///
/// Cheap to clone; identities are copied into every record, location map and
/// aggregator set of a cycle.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(Arc<str>);

impl EntityId {
    /// Create an identity from any string-like value
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(Arc::from(id.as_ref()))
    }

    /// The spacer identity (empty string)
    pub fn spacer() -> Self {
        Self(Arc::from(""))
    }

    /// Whether this identity marks a non-animating spacer
    pub fn is_spacer(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_spacer() {
            write!(f, "EntityId(<spacer>)")
        } else {
            write!(f, "EntityId({})", self.0)
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for EntityId {
    fn from(id: String) -> Self {
        Self(Arc::from(id))
    }
}

impl AsRef<str> for EntityId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Name of a collection ("stack"): a deck, a hand, a discard pile
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CollectionId(Arc<str>);

impl CollectionId {
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(Arc::from(id.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for CollectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CollectionId({})", self.0)
    }
}

impl fmt::Display for CollectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CollectionId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for CollectionId {
    fn from(id: String) -> Self {
        Self(Arc::from(id))
    }
}

/// Handle to a box owned by the rendering host.
///
/// The host hands these out for entity and collection boxes; the engine only
/// passes them back through `RenderHost` calls.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

impl NodeId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Monotonic render-pass counter supplied by the caller
pub type Version = u64;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spacer_identity() {
        assert!(EntityId::spacer().is_spacer());
        assert!(EntityId::new("").is_spacer());
        assert!(!EntityId::new("card-1").is_spacer());
    }

    #[test]
    fn test_entity_id_equality_across_sources() {
        let a = EntityId::from("king-of-hearts");
        let b = EntityId::from(String::from("king-of-hearts"));
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "king-of-hearts");
        assert_eq!(format!("{}", a), "king-of-hearts");
    }

    #[test]
    fn test_debug_marks_spacer() {
        assert_eq!(format!("{:?}", EntityId::spacer()), "EntityId(<spacer>)");
        assert_eq!(format!("{:?}", CollectionId::new("deck")), "CollectionId(deck)");
    }
}
