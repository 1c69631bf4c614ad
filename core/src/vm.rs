//! The stack VM that drives the collector.
//!
//! Every operation checks its stack preconditions before touching the heap,
//! so a failed operation leaves the object count and stack exactly as they
//! were.

use std::collections::HashSet;

use crate::error::{GcError, Result};
use crate::gc::{
    CollectionResult, CollectionTrigger, GcCollector, GcConfig, GcStatistics, Heap, Object,
    ObjectRef, PairField, RootStack,
};

/// Nesting depth past which `render` elides sub-terms
const RENDER_DEPTH_LIMIT: usize = 64;

/// Pairs `render` expands before eliding the rest. Shared sub-terms are
/// expanded once per occurrence.
const RENDER_PAIR_BUDGET: usize = 1024;

#[derive(Debug)]
pub struct Vm {
    config: GcConfig,
    heap: Heap,
    stack: RootStack,
    collector: GcCollector,
}

impl Vm {
    pub fn new(stack_max: usize, initial_threshold: usize) -> Self {
        Self::with_config(GcConfig::new(stack_max, initial_threshold))
    }

    pub fn with_config(config: GcConfig) -> Self {
        tracing::debug!(
            "creating VM: stack_max={}, initial_threshold={}, min_threshold={}",
            config.stack_max,
            config.initial_threshold,
            config.min_threshold
        );
        Self {
            heap: Heap::new(),
            stack: RootStack::new(config.stack_max),
            collector: GcCollector::new(&config),
            config,
        }
    }

    /// Collect if the threshold has been reached. Anything the caller still
    /// needs must be on the stack.
    fn reserve(&mut self) {
        if self.collector.should_collect(&self.heap) {
            self.collector
                .collect(&mut self.heap, &self.stack, CollectionTrigger::Threshold);
        }
    }

    fn record(&mut self, object: Object) -> ObjectRef {
        let handle = self.heap.allocate(object);
        self.collector.record_allocation(&self.heap);
        handle
    }

    fn allocate(&mut self, object: Object) -> ObjectRef {
        self.reserve();
        self.record(object)
    }

    pub fn push_scalar(&mut self, value: i64) -> Result<ObjectRef> {
        if self.stack.is_full() {
            return Err(GcError::StackOverflow {
                capacity: self.stack.capacity(),
            });
        }
        let handle = self.allocate(Object::Scalar(value));
        self.stack.push(handle)?;
        Ok(handle)
    }

    /// Replace the top two entries with a pair of them. The lower entry
    /// becomes `first`, the top becomes `second`.
    pub fn push_pair(&mut self) -> Result<ObjectRef> {
        self.stack.require(2)?;

        // Operands stay on the stack across a triggered collection.
        self.reserve();

        let second = self.stack.pop()?;
        let first = self.stack.pop()?;
        let handle = self.record(Object::Pair { first, second });
        self.stack.push(handle)?;
        Ok(handle)
    }

    pub fn pop(&mut self) -> Result<ObjectRef> {
        self.stack.pop()
    }

    /// Push another reference to the top entry without allocating.
    pub fn dup(&mut self) -> Result<ObjectRef> {
        let top = self.stack.peek(0).ok_or(GcError::StackUnderflow {
            needed: 1,
            available: 0,
        })?;
        self.stack.push(top)?;
        Ok(top)
    }

    pub fn set_first(&mut self) -> Result<ObjectRef> {
        self.set_field(PairField::First)
    }

    pub fn set_second(&mut self) -> Result<ObjectRef> {
        self.set_field(PairField::Second)
    }

    /// Pop a value and store it into `field` of the pair left on top.
    fn set_field(&mut self, field: PairField) -> Result<ObjectRef> {
        self.stack.require(2)?;
        let value = self.stack.peek(0).ok_or(GcError::StackUnderflow {
            needed: 2,
            available: 0,
        })?;
        let target = self.stack.peek(1).ok_or(GcError::StackUnderflow {
            needed: 2,
            available: 1,
        })?;
        self.write_field(target, field, value)?;
        self.stack.pop()?;
        Ok(target)
    }

    /// Overwrite one field of a live pair.
    pub fn write_field(
        &mut self,
        target: ObjectRef,
        field: PairField,
        value: ObjectRef,
    ) -> Result<()> {
        if !self.heap.is_alive(value) {
            return Err(GcError::StaleHandle);
        }
        match self.heap.get_mut(target) {
            None => Err(GcError::StaleHandle),
            Some(Object::Scalar(_)) => Err(GcError::NotAPair),
            Some(Object::Pair { first, second }) => {
                match field {
                    PairField::First => *first = value,
                    PairField::Second => *second = value,
                }
                tracing::trace!("set {:?} of {} to {}", field, target, value);
                Ok(())
            }
        }
    }

    /// Run a full collection now, regardless of the threshold.
    pub fn collect(&mut self) -> CollectionResult {
        self.collector
            .collect(&mut self.heap, &self.stack, CollectionTrigger::Forced)
    }

    pub fn live_object_count(&self) -> usize {
        self.heap.object_count()
    }

    pub fn stack_depth(&self) -> usize {
        self.stack.len()
    }

    pub fn current_threshold(&self) -> usize {
        self.collector.threshold()
    }

    pub fn config(&self) -> &GcConfig {
        &self.config
    }

    pub fn statistics(&self) -> &GcStatistics {
        self.collector.statistics()
    }

    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    pub fn get(&self, handle: ObjectRef) -> Option<Object> {
        self.heap.get(handle).copied()
    }

    pub fn is_alive(&self, handle: ObjectRef) -> bool {
        self.heap.is_alive(handle)
    }

    pub fn peek(&self) -> Option<ObjectRef> {
        self.stack.peek(0)
    }

    /// Stack contents, bottom to top
    pub fn roots(&self) -> impl Iterator<Item = ObjectRef> + '_ {
        self.stack.roots()
    }

    /// Drop every root. Objects stay allocated until the next collection.
    pub fn clear_stack(&mut self) {
        self.stack.clear();
    }

    /// Render an object as `(first . second)` with scalars as numbers.
    /// A pair reached again inside itself prints as `<cycle>`. At most
    /// `RENDER_PAIR_BUDGET` pairs are expanded; the rest print as `...`.
    pub fn render(&self, handle: ObjectRef) -> Option<String> {
        self.heap.get(handle)?;
        let mut render = Render {
            path: HashSet::new(),
            budget: RENDER_PAIR_BUDGET,
            out: String::new(),
        };
        self.render_into(handle, 0, &mut render);
        Some(render.out)
    }

    fn render_into(&self, handle: ObjectRef, depth: usize, render: &mut Render) {
        match self.heap.get(handle) {
            None => render.out.push_str("<freed>"),
            Some(Object::Scalar(value)) => render.out.push_str(&value.to_string()),
            Some(Object::Pair { .. }) if render.path.contains(&handle) => {
                render.out.push_str("<cycle>")
            }
            Some(Object::Pair { .. }) if depth >= RENDER_DEPTH_LIMIT || render.budget == 0 => {
                render.out.push_str("...")
            }
            Some(&Object::Pair { first, second }) => {
                render.budget -= 1;
                render.path.insert(handle);
                render.out.push('(');
                self.render_into(first, depth + 1, render);
                render.out.push_str(" . ");
                self.render_into(second, depth + 1, render);
                render.out.push(')');
                render.path.remove(&handle);
            }
        }
    }
}

/// Scratch state for one `render` call
struct Render {
    /// Pairs on the way down from the root being rendered
    path: HashSet<ObjectRef>,
    /// Pairs that may still be expanded
    budget: usize,
    out: String,
}

impl Default for Vm {
    fn default() -> Self {
        Self::with_config(GcConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_scalar_roots_object() {
        let mut vm = Vm::default();
        let handle = vm.push_scalar(5).unwrap();

        assert_eq!(vm.stack_depth(), 1);
        assert_eq!(vm.live_object_count(), 1);
        assert_eq!(vm.get(handle), Some(Object::Scalar(5)));
    }

    #[test]
    fn test_push_pair_field_order() {
        let mut vm = Vm::default();
        let a = vm.push_scalar(1).unwrap();
        let b = vm.push_scalar(2).unwrap();
        let pair = vm.push_pair().unwrap();

        assert_eq!(
            vm.get(pair),
            Some(Object::Pair {
                first: a,
                second: b
            })
        );
        assert_eq!(vm.peek(), Some(pair));
        assert_eq!(vm.render(pair).as_deref(), Some("(1 . 2)"));
    }

    #[test]
    fn test_push_pair_underflow_leaves_state() {
        let mut vm = Vm::default();
        vm.push_scalar(1).unwrap();

        assert_eq!(
            vm.push_pair(),
            Err(GcError::StackUnderflow {
                needed: 2,
                available: 1
            })
        );
        assert_eq!(vm.stack_depth(), 1);
        assert_eq!(vm.live_object_count(), 1);
    }

    #[test]
    fn test_push_scalar_overflow_allocates_nothing() {
        let mut vm = Vm::new(2, 16);
        vm.push_scalar(1).unwrap();
        vm.push_scalar(2).unwrap();

        assert_eq!(
            vm.push_scalar(3),
            Err(GcError::StackOverflow { capacity: 2 })
        );
        assert_eq!(vm.live_object_count(), 2);
        assert_eq!(vm.stack_depth(), 2);
    }

    #[test]
    fn test_triggered_collection_keeps_pair_operands() {
        let mut vm = Vm::new(16, 3);
        let a = vm.push_scalar(1).unwrap();
        vm.push_scalar(2).unwrap();
        vm.pop().unwrap();
        let b = vm.push_scalar(3).unwrap();

        // Three objects allocated: the pair's allocation collects first.
        let pair = vm.push_pair().unwrap();

        assert_eq!(vm.statistics().threshold_collections, 1);
        assert!(vm.is_alive(a));
        assert!(vm.is_alive(b));
        assert_eq!(vm.render(pair).as_deref(), Some("(1 . 3)"));
        assert_eq!(vm.live_object_count(), 3);
    }

    #[test]
    fn test_dup_shares_reference() {
        let mut vm = Vm::default();
        let a = vm.push_scalar(4).unwrap();
        assert_eq!(vm.dup().unwrap(), a);
        let pair = vm.push_pair().unwrap();

        assert_eq!(vm.live_object_count(), 2);
        assert_eq!(vm.render(pair).as_deref(), Some("(4 . 4)"));
    }

    #[test]
    fn test_dup_on_empty_stack() {
        let mut vm = Vm::default();
        assert!(matches!(vm.dup(), Err(GcError::StackUnderflow { .. })));
    }

    #[test]
    fn test_set_second_builds_cycle() {
        let mut vm = Vm::default();
        vm.push_scalar(1).unwrap();
        vm.push_scalar(2).unwrap();
        let pair = vm.push_pair().unwrap();
        vm.dup().unwrap();
        assert_eq!(vm.set_second().unwrap(), pair);

        assert_eq!(vm.stack_depth(), 1);
        assert_eq!(vm.render(pair).as_deref(), Some("(1 . <cycle>)"));
    }

    #[test]
    fn test_set_first_on_scalar_fails_cleanly() {
        let mut vm = Vm::default();
        vm.push_scalar(1).unwrap();
        vm.push_scalar(2).unwrap();

        assert_eq!(vm.set_first(), Err(GcError::NotAPair));
        assert_eq!(vm.stack_depth(), 2);
    }

    #[test]
    fn test_write_field_rejects_stale_value() {
        let mut vm = Vm::default();
        let stale = vm.push_scalar(1).unwrap();
        vm.pop().unwrap();
        vm.collect();

        vm.push_scalar(2).unwrap();
        vm.push_scalar(3).unwrap();
        let pair = vm.push_pair().unwrap();

        assert_eq!(
            vm.write_field(pair, PairField::First, stale),
            Err(GcError::StaleHandle)
        );
    }

    #[test]
    fn test_render_shared_subterm_is_not_a_cycle() {
        let mut vm = Vm::default();
        vm.push_scalar(7).unwrap();
        vm.push_scalar(8).unwrap();
        let inner = vm.push_pair().unwrap();
        vm.dup().unwrap();
        let outer = vm.push_pair().unwrap();

        assert!(vm.is_alive(inner));
        assert_eq!(vm.render(outer).as_deref(), Some("((7 . 8) . (7 . 8))"));
    }

    #[test]
    fn test_render_doubling_chain_is_bounded() {
        let mut vm = Vm::default();
        vm.push_scalar(1).unwrap();
        for _ in 0..40 {
            vm.dup().unwrap();
            vm.push_pair().unwrap();
        }
        assert_eq!(vm.live_object_count(), 41);

        let top = vm.peek().unwrap();
        let rendered = vm.render(top).unwrap();

        assert!(rendered.starts_with("(((("));
        assert!(rendered.contains("..."));
        assert!(rendered.len() < 16 * RENDER_PAIR_BUDGET, "{}", rendered.len());
    }
}
