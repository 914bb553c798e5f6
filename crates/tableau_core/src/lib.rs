//! Tableau Core
//!
//! Foundational types for the Tableau transition engine:
//!
//! - **Identities**: `EntityId`, `CollectionId`, host `NodeId` handles and render `Version`s
//! - **Property values**: the small declared set of entity properties that animate
//! - **Geometry**: offset-chain measurement relative to a fixed ancestor
//! - **Inversion math**: the FLIP "invert" transform (translate + scale, rotation-aware)
//!
//! # Example
//!
//! ```rust
//! use tableau_core::{compute_inverse_transform, Bounds};
//!
//! let before = Bounds::new(0.0, 0.0, 100.0, 60.0);
//! let after = Bounds::new(0.0, 0.0, 50.0, 50.0);
//!
//! let invert = compute_inverse_transform(&before, &after, true);
//! assert!((invert.scale - 1.2).abs() < 1e-6);
//! ```

pub mod geometry;
pub mod id;
pub mod value;

pub use geometry::{
    compute_inverse_transform, measure_rectangle, Bounds, InverseTransform, OffsetChain,
    OffsetFrame, Size,
};
pub use id::{CollectionId, EntityId, NodeId, Version};
pub use value::{is_quarter_turn_change, PropValue, PropertyMap};

/// Property name the host reports for geometry transitions
pub const TRANSFORM: &str = "transform";

/// Property name the host reports for opacity transitions
pub const OPACITY: &str = "opacity";
