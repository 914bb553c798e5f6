//! Cycle lifecycle events

use slotmap::{new_key_type, SlotMap};

new_key_type! {
    /// Handle to a registered event listener
    pub struct ListenerId;
}

/// Lifecycle notifications of an animation cycle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnimationEvent {
    /// The first entity of the cycle is about to be inverted
    WillAnimate { cycle: u64 },
    /// Every transition of the cycle completed or was forfeited
    AnimationDone { cycle: u64 },
}

impl AnimationEvent {
    pub fn cycle(&self) -> u64 {
        match *self {
            AnimationEvent::WillAnimate { cycle } | AnimationEvent::AnimationDone { cycle } => cycle,
        }
    }
}

type Listener = Box<dyn FnMut(&AnimationEvent)>;

/// Registered listeners
#[derive(Default)]
pub(crate) struct Listeners {
    listeners: SlotMap<ListenerId, Listener>,
}

impl Listeners {
    pub fn insert(&mut self, listener: Listener) -> ListenerId {
        self.listeners.insert(listener)
    }

    pub fn remove(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id).is_some()
    }

    pub fn emit(&mut self, event: AnimationEvent) {
        tracing::trace!(?event, listeners = self.listeners.len(), "emit");
        for (_, listener) in self.listeners.iter_mut() {
            listener(&event);
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }
}
