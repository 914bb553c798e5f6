//! Tableau Animation
//!
//! FLIP (First, Last, Invert, Play) transition orchestration for board-game
//! scenes. When the authoritative game state jumps (a card is dealt, a deck
//! is shuffled, a token is captured), every visual entity glides from where
//! it was to where it now is.
//!
//! # Features
//!
//! - **Two-phase cycles**: `prepare()` before the state mutation, `animate()` after
//! - **Identity tracking**: entities that move between collections animate across them
//! - **Stand-ins**: entities that appear without history fly in from where they plausibly came from
//! - **Exit placeholders**: entities that vanish fly out to where they plausibly went
//! - **Completion aggregation**: exactly one `AnimationDone` per cycle
//! - **Host hooks**: all geometry reads and synchronization go through `RenderHost`
//!
//! # Example
//!
//! ```ignore
//! use tableau_animation::{FlipConfig, FlipOrchestrator, AnimationPolicy};
//!
//! let mut flip = FlipOrchestrator::new(host, registry.clone(), root, FlipConfig::snappy(), AnimationPolicy::new());
//!
//! flip.prepare();
//! hand.borrow_mut().apply_arrangement(Some(&cards), version, make_card);
//! let report = flip.animate().await?;
//!
//! // later, from the host's transition-end handler
//! flip.transition_ended(&card_id, "transform");
//! ```

pub mod aggregator;
pub mod config;
pub mod error;
pub mod events;
pub mod host;
pub mod orchestrator;
pub mod placeholder;
pub mod policy;
pub mod record;


pub use aggregator::CompletionAggregator;
pub use config::FlipConfig;
pub use error::{AnimationError, ConfigError, Result};
pub use events::{AnimationEvent, ListenerId};
pub use host::{measure, RenderHost, YieldNow};
pub use orchestrator::{CycleReport, CyclePhase, FlipOrchestrator};
pub use placeholder::ExitPlaceholder;
pub use policy::AnimationPolicy;
pub use record::{AfterState, AnimationRecord, BeforeState, RecordOrigin};
