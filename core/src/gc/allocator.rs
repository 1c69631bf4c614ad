//! Object Registry and Allocator
//!
//! Every object lives in a slot of a single arena. The arena is the registry:
//! a slot holding an object means "allocated and not yet collected". Freed
//! slots go onto a free list and are handed out again by later allocations,
//! with their generation bumped so old handles no longer resolve.

use super::handle::{Generation, ObjectRef};
use super::object::Object;

/// One arena slot
#[derive(Debug, Clone)]
struct Slot {
    generation: Generation,
    /// Collector bookkeeping; false outside a collection
    marked: bool,
    object: Option<Object>,
}

/// What happened to a slot during sweep
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SlotSweep {
    /// Nothing allocated here
    Vacant,
    /// Unmarked object released
    Freed,
    /// Marked object kept and unmarked
    Retained,
}

/// The registry of live objects
#[derive(Debug, Default)]
pub struct Heap {
    slots: Vec<Slot>,
    free_list: Vec<u32>,
    object_count: usize,
    total_allocated: u64,
}

impl Heap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new object in the registry and return its handle.
    ///
    /// This never collects; collection is driven by the VM before it calls
    /// in here.
    pub fn allocate(&mut self, object: Object) -> ObjectRef {
        self.object_count += 1;
        self.total_allocated += 1;

        let handle = if let Some(index) = self.free_list.pop() {
            let slot = &mut self.slots[index as usize];
            slot.marked = false;
            slot.object = Some(object);
            ObjectRef::new(index, slot.generation)
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: Generation::default(),
                marked: false,
                object: Some(object),
            });
            ObjectRef::new(index, Generation::default())
        };

        tracing::trace!("allocated {:?} at {}", object.kind(), handle);
        handle
    }

    fn slot(&self, handle: ObjectRef) -> Option<&Slot> {
        self.slots
            .get(handle.index())
            .filter(|slot| slot.generation == handle.generation && slot.object.is_some())
    }

    fn slot_mut(&mut self, handle: ObjectRef) -> Option<&mut Slot> {
        self.slots
            .get_mut(handle.index())
            .filter(|slot| slot.generation == handle.generation && slot.object.is_some())
    }

    pub fn get(&self, handle: ObjectRef) -> Option<&Object> {
        self.slot(handle).and_then(|slot| slot.object.as_ref())
    }

    pub fn get_mut(&mut self, handle: ObjectRef) -> Option<&mut Object> {
        self.slot_mut(handle).and_then(|slot| slot.object.as_mut())
    }

    pub fn is_alive(&self, handle: ObjectRef) -> bool {
        self.slot(handle).is_some()
    }

    pub fn is_marked(&self, handle: ObjectRef) -> bool {
        self.slot(handle).is_some_and(|slot| slot.marked)
    }

    /// Set the mark bit. Returns the object only when it was not marked
    /// before, so callers trace each object once.
    pub(crate) fn try_mark(&mut self, handle: ObjectRef) -> Option<Object> {
        let slot = self.slot_mut(handle)?;
        if slot.marked {
            return None;
        }
        slot.marked = true;
        slot.object
    }

    /// Release the slot if unmarked, otherwise clear its mark.
    pub(crate) fn sweep_slot(&mut self, index: usize) -> SlotSweep {
        let slot = &mut self.slots[index];
        match (slot.object, slot.marked) {
            (None, _) => SlotSweep::Vacant,
            (Some(_), true) => {
                slot.marked = false;
                SlotSweep::Retained
            }
            (Some(object), false) => {
                slot.object = None;
                slot.generation = slot.generation.next();
                self.free_list.push(index as u32);
                self.object_count -= 1;
                tracing::trace!("freed {:?} in slot {}", object.kind(), index);
                SlotSweep::Freed
            }
        }
    }

    /// Objects currently in the registry
    pub fn object_count(&self) -> usize {
        self.object_count
    }

    /// Arena size, vacant slots included
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn free_slot_count(&self) -> usize {
        self.free_list.len()
    }

    /// Objects ever allocated through this heap
    pub fn total_allocated(&self) -> u64 {
        self.total_allocated
    }

    /// Live objects in slot order
    pub fn iter(&self) -> impl Iterator<Item = (ObjectRef, &Object)> + '_ {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.object
                .as_ref()
                .map(|object| (ObjectRef::new(index as u32, slot.generation), object))
        })
    }

    pub fn any_marked(&self) -> bool {
        self.slots.iter().any(|slot| slot.marked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_counts_objects() {
        let mut heap = Heap::new();
        let a = heap.allocate(Object::Scalar(1));
        let b = heap.allocate(Object::Scalar(2));

        assert_eq!(heap.object_count(), 2);
        assert_eq!(heap.get(a), Some(&Object::Scalar(1)));
        assert_eq!(heap.get(b), Some(&Object::Scalar(2)));
        assert!(!heap.is_marked(a));
    }

    #[test]
    fn test_sweep_frees_unmarked_and_reuses_slot() {
        let mut heap = Heap::new();
        let a = heap.allocate(Object::Scalar(1));

        assert_eq!(heap.sweep_slot(a.index()), SlotSweep::Freed);
        assert_eq!(heap.object_count(), 0);
        assert!(!heap.is_alive(a));
        assert_eq!(heap.free_slot_count(), 1);

        let b = heap.allocate(Object::Scalar(2));
        assert_eq!(a.index(), b.index(), "Heap should reuse freed slot");
        assert_ne!(a, b);
        assert_eq!(heap.get(a), None, "Stale handle must not resolve");
        assert_eq!(heap.get(b), Some(&Object::Scalar(2)));
    }

    #[test]
    fn test_sweep_keeps_marked_and_clears_mark() {
        let mut heap = Heap::new();
        let a = heap.allocate(Object::Scalar(1));

        assert_eq!(heap.try_mark(a), Some(Object::Scalar(1)));
        assert_eq!(heap.try_mark(a), None, "second mark is a no-op");
        assert_eq!(heap.sweep_slot(a.index()), SlotSweep::Retained);
        assert!(heap.is_alive(a));
        assert!(!heap.any_marked());
        assert_eq!(heap.sweep_slot(a.index()), SlotSweep::Freed);
        assert_eq!(heap.sweep_slot(a.index()), SlotSweep::Vacant);
    }

    #[test]
    fn test_iter_skips_vacant_slots() {
        let mut heap = Heap::new();
        let a = heap.allocate(Object::Scalar(1));
        let b = heap.allocate(Object::Scalar(2));
        heap.try_mark(b);
        heap.sweep_slot(a.index());

        let live: Vec<_> = heap.iter().map(|(handle, _)| handle).collect();
        assert_eq!(live, vec![b]);
        assert_eq!(heap.total_allocated(), 2);
        assert_eq!(heap.slot_count(), 2);
    }
}
