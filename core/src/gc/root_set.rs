//! Root Set
//!
//! The VM operand stack is the whole root set: anything on it is live by
//! definition. The stack has a fixed capacity and reports overflow and
//! underflow as errors rather than aborting.

use super::handle::ObjectRef;
use crate::error::{GcError, Result};

/// Bounded stack of root references
#[derive(Debug, Clone)]
pub struct RootStack {
    entries: Vec<ObjectRef>,
    capacity: usize,
}

impl RootStack {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Push a reference. Fails when the stack already holds `capacity`
    /// entries.
    pub fn push(&mut self, handle: ObjectRef) -> Result<()> {
        if self.is_full() {
            return Err(GcError::StackOverflow {
                capacity: self.capacity,
            });
        }
        self.entries.push(handle);
        Ok(())
    }

    pub fn pop(&mut self) -> Result<ObjectRef> {
        self.entries.pop().ok_or(GcError::StackUnderflow {
            needed: 1,
            available: 0,
        })
    }

    /// Entry `depth` positions below the top (0 is the top)
    pub fn peek(&self, depth: usize) -> Option<ObjectRef> {
        self.entries
            .len()
            .checked_sub(depth + 1)
            .map(|index| self.entries[index])
    }

    /// Fail unless at least `needed` entries are present
    pub fn require(&self, needed: usize) -> Result<()> {
        if self.entries.len() < needed {
            return Err(GcError::StackUnderflow {
                needed,
                available: self.entries.len(),
            });
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Roots from bottom to top
    pub fn roots(&self) -> impl Iterator<Item = ObjectRef> + '_ {
        self.entries.iter().copied()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
