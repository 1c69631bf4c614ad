//! Mark-and-Sweep Collector
//!
//! A collection is one synchronous call: mark from the root stack, sweep the
//! whole registry, then recompute the allocation threshold from what
//! survived. Nothing else touches the heap or the stack while it runs.

use std::time::{Duration, Instant};

use super::GcConfig;
use super::allocator::{Heap, SlotSweep};
use super::mark::MarkPhase;
use super::root_set::RootStack;
use super::statistics::GcStatistics;

/// Why a collection ran
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionTrigger {
    /// The live object count reached the threshold on allocation
    Threshold,
    /// Requested through `collect`
    Forced,
}

/// Result of a garbage collection cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionResult {
    pub trigger: CollectionTrigger,
    /// Live objects when the cycle started
    pub objects_before: usize,
    pub objects_marked: usize,
    pub objects_collected: usize,
    pub objects_surviving: usize,
    pub threshold_before: usize,
    pub threshold_after: usize,
    pub duration: Duration,
}

/// Garbage collector state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectorState {
    Idle,
    Marking,
    Sweeping,
}

/// Main garbage collector implementation
#[derive(Debug)]
pub struct GcCollector {
    state: CollectorState,
    mark_phase: MarkPhase,
    /// Object count at which the next allocation collects first
    threshold: usize,
    /// Floor for the recomputed threshold
    min_threshold: usize,
    statistics: GcStatistics,
}

impl GcCollector {
    pub fn new(config: &GcConfig) -> Self {
        Self {
            state: CollectorState::Idle,
            mark_phase: MarkPhase::new(),
            threshold: config.initial_threshold,
            min_threshold: config.min_threshold,
            statistics: GcStatistics::new(),
        }
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    pub fn state(&self) -> CollectorState {
        self.state
    }

    pub fn statistics(&self) -> &GcStatistics {
        &self.statistics
    }

    /// Whether the next allocation must collect first
    pub fn should_collect(&self, heap: &Heap) -> bool {
        heap.object_count() >= self.threshold
    }

    pub fn record_allocation(&mut self, heap: &Heap) {
        self.statistics.record_allocation(heap.object_count());
    }

    /// Run a full mark-and-sweep cycle and retune the threshold.
    pub fn collect(
        &mut self,
        heap: &mut Heap,
        roots: &RootStack,
        trigger: CollectionTrigger,
    ) -> CollectionResult {
        debug_assert_eq!(
            self.state,
            CollectorState::Idle,
            "collection re-entered while already running"
        );

        let start = Instant::now();
        let objects_before = heap.object_count();
        let threshold_before = self.threshold;

        tracing::debug!(
            "GC started ({:?}): {} objects, {} roots, threshold {}",
            trigger,
            objects_before,
            roots.len(),
            threshold_before
        );

        self.state = CollectorState::Marking;
        let objects_marked = self.mark_phase.mark_all(heap, roots.roots()).objects_marked;

        self.state = CollectorState::Sweeping;
        let objects_collected = Self::sweep(heap);

        self.threshold = self.next_threshold(heap.object_count());
        self.mark_phase.reset();
        self.state = CollectorState::Idle;

        let result = CollectionResult {
            trigger,
            objects_before,
            objects_marked,
            objects_collected,
            objects_surviving: heap.object_count(),
            threshold_before,
            threshold_after: self.threshold,
            duration: start.elapsed(),
        };
        self.statistics.record_collection(&result);

        tracing::info!(
            "GC completed: collected {} objects, {} surviving, next threshold {} in {:?}",
            result.objects_collected,
            result.objects_surviving,
            result.threshold_after,
            result.duration
        );

        result
    }

    /// Visit every slot once: free the unmarked, unmark the rest.
    fn sweep(heap: &mut Heap) -> usize {
        let mut freed = 0;
        for index in 0..heap.slot_count() {
            if heap.sweep_slot(index) == SlotSweep::Freed {
                freed += 1;
            }
        }
        freed
    }

    /// Double the survivors. With no floor this reaches zero when nothing
    /// survives, so the next allocation collects again.
    fn next_threshold(&self, surviving: usize) -> usize {
        surviving.saturating_mul(2).max(self.min_threshold)
    }
}
