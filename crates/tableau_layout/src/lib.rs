//! Tableau Layout
//!
//! The layout side of the transition engine: everything that knows *where*
//! entities live, but nothing about how they are animated.
//!
//! - **Entity contract**: the capability surface every visual entity exposes
//! - **Collections**: ordered, named stacks that remember when each identity was last visible
//! - **Registry**: the injectable set of live collections
//! - **Identity resolution**: which collections a vanished identity most plausibly belongs to
//!
//! # Example
//!
//! ```ignore
//! use tableau_layout::{ingest, Collection, CollectionRegistry, PossibleLocations};
//!
//! let registry = CollectionRegistry::new();
//! let hand = registry.register(Collection::new("hand", hand_node))?;
//!
//! hand.borrow_mut()
//!     .apply_arrangement(Some(&cards), version, |card| make_card(card));
//!
//! let mut locations = PossibleLocations::default();
//! for collection in registry.snapshot() {
//!     ingest(&mut locations, &collection.borrow());
//! }
//! ```

pub mod collection;
pub mod entity;
pub mod error;
pub mod locations;
pub mod registry;

pub use collection::{ArrangementDiff, Collection, Descriptor};
pub use entity::{Entity, InvertParams, PlayParams, TransitionOutcome, TransitionTracker};
pub use error::{LayoutError, Result};
pub use locations::{collect_locations, ingest, PossibleLocation, PossibleLocations, Sighting};
pub use registry::{CollectionRegistry, SharedCollection};
