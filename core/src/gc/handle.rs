//! Object handles
//!
//! Handles are plain `Copy` values naming an arena slot. A generation counter
//! travels with the slot index so a handle outliving its object is detected
//! instead of silently aliasing whatever reuses the slot.

use std::fmt;

/// Generation counter for detecting stale handles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Generation(pub u32);

impl Generation {
    pub fn next(&self) -> Self {
        Self(self.0.wrapping_add(1))
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

/// Non-owning reference to an object in the registry.
///
/// The registry owns every object; stack entries and pair fields only hold
/// these handles. A handle stays valid until its object is swept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectRef {
    pub(crate) index: u32,
    pub(crate) generation: Generation,
}

impl ObjectRef {
    pub(crate) fn new(index: u32, generation: Generation) -> Self {
        Self { index, generation }
    }

    /// Slot index inside the registry arena
    pub fn index(&self) -> usize {
        self.index as usize
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}@{}", self.index, self.generation.0)
    }
}
