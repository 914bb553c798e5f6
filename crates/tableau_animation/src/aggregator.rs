//! Completion aggregation
//!
//! Every entity that starts animating in a cycle registers its identity
//! here. Completions and forfeits remove identities; once the cycle is armed
//! (all transitions started) and the outstanding set drains, the cycle is
//! settled. Settlement is reported exactly once per cycle no matter how
//! completions interleave.

use rustc_hash::FxHashSet;
use tableau_core::EntityId;

/// Outstanding identities of the current cycle
#[derive(Debug, Default)]
pub struct CompletionAggregator {
    cycle: u64,
    outstanding: FxHashSet<EntityId>,
    armed: bool,
    fired: bool,
}

impl CompletionAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a fresh cycle, dropping whatever the previous one still waited on
    pub fn begin_cycle(&mut self, cycle: u64) {
        if !self.outstanding.is_empty() {
            tracing::debug!(
                cycle = self.cycle,
                abandoned = self.outstanding.len(),
                "previous cycle abandoned before settling"
            );
        }
        self.cycle = cycle;
        self.outstanding.clear();
        self.armed = false;
        self.fired = false;
    }

    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Wait for `id` in the current cycle
    pub fn expect(&mut self, id: EntityId) {
        if self.fired {
            tracing::warn!(cycle = self.cycle, entity = %id, "expectation after settlement ignored");
            return;
        }
        self.outstanding.insert(id);
    }

    /// `id` finished its transitions. Returns `true` if this settled the cycle.
    pub fn complete(&mut self, id: &EntityId) -> bool {
        if !self.outstanding.remove(id) {
            tracing::trace!(cycle = self.cycle, entity = %id, "stale completion ignored");
            return false;
        }
        self.try_fire()
    }

    /// `id` will never complete (detached, removed). Returns `true` if this
    /// settled the cycle.
    pub fn forfeit(&mut self, id: &EntityId) -> bool {
        if !self.outstanding.remove(id) {
            return false;
        }
        tracing::debug!(cycle = self.cycle, entity = %id, "expectation forfeited");
        self.try_fire()
    }

    /// Every transition of the cycle has been started. Returns `true` if
    /// nothing was outstanding, which settles the cycle right away.
    pub fn arm(&mut self) -> bool {
        self.armed = true;
        self.try_fire()
    }

    pub fn is_waiting_for(&self, id: &EntityId) -> bool {
        self.outstanding.contains(id)
    }

    pub fn outstanding(&self) -> usize {
        self.outstanding.len()
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn is_settled(&self) -> bool {
        self.fired
    }

    fn try_fire(&mut self) -> bool {
        if self.armed && !self.fired && self.outstanding.is_empty() {
            self.fired = true;
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(names: &[&str]) -> Vec<EntityId> {
        names.iter().map(|n| EntityId::new(n)).collect()
    }

    #[test]
    fn test_settles_once_in_any_order() {
        let orders: [[usize; 3]; 3] = [[0, 1, 2], [2, 1, 0], [1, 2, 0]];
        for order in orders {
            let entities = ids(&["a", "b", "c"]);
            let mut aggregator = CompletionAggregator::new();
            aggregator.begin_cycle(1);
            for id in &entities {
                aggregator.expect(id.clone());
            }
            assert!(!aggregator.arm());

            let fired: Vec<bool> = order
                .iter()
                .map(|&i| aggregator.complete(&entities[i]))
                .collect();
            assert_eq!(fired, [false, false, true]);
            assert!(aggregator.is_settled());

            // Duplicate completions after settling are stale.
            assert!(!aggregator.complete(&entities[0]));
        }
    }

    #[test]
    fn test_completions_before_arming_settle_on_arm() {
        let mut aggregator = CompletionAggregator::new();
        aggregator.begin_cycle(1);
        aggregator.expect(EntityId::new("a"));

        assert!(!aggregator.complete(&EntityId::new("a")));
        assert!(aggregator.arm());
        assert!(!aggregator.arm());
    }

    #[test]
    fn test_nothing_outstanding_settles_at_arm() {
        let mut aggregator = CompletionAggregator::new();
        aggregator.begin_cycle(4);
        assert!(aggregator.arm());
        assert_eq!(aggregator.cycle(), 4);
    }

    #[test]
    fn test_forfeit_counts_as_completion() {
        let mut aggregator = CompletionAggregator::new();
        aggregator.begin_cycle(1);
        aggregator.expect(EntityId::new("a"));
        aggregator.expect(EntityId::new("b"));
        aggregator.arm();

        assert!(!aggregator.forfeit(&EntityId::new("a")));
        assert!(!aggregator.forfeit(&EntityId::new("a")));
        assert!(aggregator.complete(&EntityId::new("b")));
    }

    #[test]
    fn test_new_cycle_drops_stale_expectations() {
        let mut aggregator = CompletionAggregator::new();
        aggregator.begin_cycle(1);
        aggregator.expect(EntityId::new("a"));
        aggregator.arm();

        aggregator.begin_cycle(2);
        assert_eq!(aggregator.outstanding(), 0);
        assert!(!aggregator.is_armed());
        assert!(!aggregator.complete(&EntityId::new("a")));
    }
}
