//! Rendering host hooks
//!
//! The orchestrator never touches a renderer directly. Everything it needs
//! from the environment that owns boxes, computed styles and layout goes
//! through `RenderHost`:
//!
//! - geometry and computed-style reads (what is *actually* on screen, which
//!   can differ from a requested style while a transition is in flight)
//! - content cloning for exit placeholders
//! - creating and removing placeholder boxes
//! - two synchronization points: a forced layout read between the inverted
//!   and final writes, and `render_settled()`, awaited once before measuring
//!   and once before the final writes

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tableau_core::{measure_rectangle, Bounds, EntityId, NodeId, OffsetChain, Size};

/// Environment that owns rendered boxes
pub trait RenderHost {
    /// Cloned rendered content of an entity (markup, a texture, a draw list)
    type Content: Clone;

    /// Offset-parent chain of `node`, innermost frame first
    fn offset_chain(&self, node: NodeId) -> OffsetChain;

    /// Layout size of `node`, without transforms
    fn size(&self, node: NodeId) -> Size;

    /// Transform currently in effect on `node` (`"none"` when there is none)
    fn computed_transform(&self, node: NodeId) -> String;

    /// Opacity currently in effect on `node`
    fn computed_opacity(&self, node: NodeId) -> f32;

    /// Clone the rendered content of `node`
    fn clone_content(&self, _node: NodeId) -> Option<Self::Content> {
        None
    }

    /// Show previously cloned content inside `node`
    fn splice_content(&mut self, _node: NodeId, _content: &Self::Content) {}

    /// Create a box for an exit placeholder inside the `collection` box, at
    /// the collection's neutral placement
    fn create_exit_node(&mut self, collection: NodeId, entity: &EntityId) -> NodeId;

    /// Destroy a box created by `create_exit_node`
    fn remove_node(&mut self, node: NodeId);

    /// Flush pending layout so every style written so far is committed
    fn force_layout(&mut self);

    /// Resolve once pending visual mutations are committed.
    ///
    /// The default yields twice to the executor, which is enough for hosts
    /// whose mutations settle within two scheduler turns.
    fn render_settled(&mut self) -> impl Future<Output = ()> {
        YieldNow::turns(2)
    }
}

/// Measure `node` relative to `root` through the host
pub fn measure<H: RenderHost + ?Sized>(host: &H, node: NodeId, root: NodeId) -> Bounds {
    measure_rectangle(host.offset_chain(node), host.size(node), root)
}

/// Future that yields to the executor a fixed number of times
#[derive(Debug, Clone)]
pub struct YieldNow {
    remaining: u32,
}

impl YieldNow {
    pub fn turns(turns: u32) -> Self {
        Self { remaining: turns }
    }
}

impl Future for YieldNow {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.remaining == 0 {
            return Poll::Ready(());
        }
        self.remaining -= 1;
        cx.waker().wake_by_ref();
        Poll::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::task::Wake;

    struct CountingWaker(AtomicUsize);

    impl Wake for CountingWaker {
        fn wake(self: Arc<Self>) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }

        fn wake_by_ref(self: &Arc<Self>) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_yield_now_yields_exactly_n_times() {
        let counter = Arc::new(CountingWaker(AtomicUsize::new(0)));
        let waker: std::task::Waker = counter.clone().into();
        let mut cx = Context::from_waker(&waker);

        let mut future = YieldNow::turns(2);
        assert!(Pin::new(&mut future).poll(&mut cx).is_pending());
        assert!(Pin::new(&mut future).poll(&mut cx).is_pending());
        assert!(Pin::new(&mut future).poll(&mut cx).is_ready());
        assert_eq!(counter.0.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_yield_now_completes_under_block_on() {
        pollster::block_on(YieldNow::turns(5));
    }
}
