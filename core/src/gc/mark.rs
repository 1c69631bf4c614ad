//! Marking Phase Implementation
//!
//! Marking walks everything reachable from the root stack and sets the mark
//! bit in each object's slot. Pending references sit on an explicit work-list
//! instead of the call stack, so arbitrarily deep pair chains cannot overflow
//! it. A reference that is already marked is skipped, which both terminates
//! cycles and keeps shared sub-graphs from being traced twice.

use std::time::{Duration, Instant};

use super::allocator::Heap;
use super::handle::ObjectRef;

/// State of the marking phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkState {
    NotStarted,
    InProgress,
    Completed,
}

/// Statistics for one marking pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkStatistics {
    /// Objects whose mark bit was set
    pub objects_marked: usize,
    /// References popped off the work-list, duplicates included
    pub references_traversed: usize,
    /// Largest work-list length seen
    pub peak_worklist_size: usize,
    pub duration: Duration,
}

/// Marking phase implementation
#[derive(Debug)]
pub struct MarkPhase {
    state: MarkState,
    worklist: Vec<ObjectRef>,
    statistics: MarkStatistics,
}

impl MarkPhase {
    pub fn new() -> Self {
        Self {
            state: MarkState::NotStarted,
            worklist: Vec::new(),
            statistics: MarkStatistics::default(),
        }
    }

    /// Mark every object reachable from `roots`.
    pub fn mark_all(
        &mut self,
        heap: &mut Heap,
        roots: impl IntoIterator<Item = ObjectRef>,
    ) -> &MarkStatistics {
        let start = Instant::now();
        self.state = MarkState::InProgress;
        self.statistics = MarkStatistics::default();
        self.worklist.clear();
        self.worklist.extend(roots);
        self.statistics.peak_worklist_size = self.worklist.len();

        tracing::debug!(
            "Started marking phase with {} root references",
            self.worklist.len()
        );

        while let Some(handle) = self.worklist.pop() {
            self.statistics.references_traversed += 1;

            let Some(object) = heap.try_mark(handle) else {
                continue;
            };
            self.statistics.objects_marked += 1;

            // Push second first so `first` is traced first.
            if let Some((first, second)) = object.as_pair() {
                self.worklist.push(second);
                self.worklist.push(first);
                self.statistics.peak_worklist_size =
                    self.statistics.peak_worklist_size.max(self.worklist.len());
            }
        }

        self.statistics.duration = start.elapsed();
        self.state = MarkState::Completed;

        tracing::debug!(
            "Marking complete: {} objects marked, {} references traversed",
            self.statistics.objects_marked,
            self.statistics.references_traversed
        );

        &self.statistics
    }

    pub fn state(&self) -> MarkState {
        self.state
    }

    pub fn statistics(&self) -> &MarkStatistics {
        &self.statistics
    }

    /// Reset for next collection
    pub fn reset(&mut self) {
        self.state = MarkState::NotStarted;
        self.worklist.clear();
        self.statistics = MarkStatistics::default();
    }
}

impl Default for MarkPhase {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::super::object::Object;
    use super::*;

    #[test]
    fn test_marks_only_reachable() {
        let mut heap = Heap::new();
        let a = heap.allocate(Object::Scalar(1));
        let b = heap.allocate(Object::Scalar(2));
        let garbage = heap.allocate(Object::Scalar(3));
        let pair = heap.allocate(Object::Pair {
            first: a,
            second: b,
        });

        let mut phase = MarkPhase::new();
        let stats = phase.mark_all(&mut heap, [pair]).clone();

        assert_eq!(stats.objects_marked, 3);
        assert!(heap.is_marked(pair));
        assert!(heap.is_marked(a));
        assert!(heap.is_marked(b));
        assert!(!heap.is_marked(garbage));
        assert_eq!(phase.state(), MarkState::Completed);
    }

    #[test]
    fn test_shared_child_marked_once() {
        let mut heap = Heap::new();
        let shared = heap.allocate(Object::Scalar(9));
        let left = heap.allocate(Object::Pair {
            first: shared,
            second: shared,
        });
        let right = heap.allocate(Object::Pair {
            first: shared,
            second: left,
        });

        let mut phase = MarkPhase::new();
        let stats = phase.mark_all(&mut heap, [left, right, left]);

        assert_eq!(stats.objects_marked, 3);
        assert!(stats.references_traversed > stats.objects_marked);
    }

    #[test]
    fn test_self_cycle_terminates() {
        let mut heap = Heap::new();
        let seed = heap.allocate(Object::Scalar(0));
        let pair = heap.allocate(Object::Pair {
            first: seed,
            second: seed,
        });
        if let Some(Object::Pair { second, .. }) = heap.get_mut(pair) {
            *second = pair;
        }

        let mut phase = MarkPhase::new();
        let stats = phase.mark_all(&mut heap, [pair]);
        assert_eq!(stats.objects_marked, 2);
    }

    #[test]
    fn test_deep_chain_does_not_recurse() {
        let mut heap = Heap::new();
        let mut tail = heap.allocate(Object::Scalar(0));
        for _ in 0..100_000 {
            tail = heap.allocate(Object::Pair {
                first: tail,
                second: tail,
            });
        }

        let mut phase = MarkPhase::new();
        let stats = phase.mark_all(&mut heap, [tail]);
        assert_eq!(stats.objects_marked, 100_001);
    }
}
