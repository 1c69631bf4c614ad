//! Garbage Collection System
//!
//! A stop-the-world mark-and-sweep collector over scalar and pair objects.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐    ┌─────────────────┐    ┌─────────────────┐
//! │   RootStack     │───▶│   MarkPhase     │───▶│   Sweep         │
//! │ (operand stack) │    │  (work-list)    │    │ (whole arena)   │
//! └─────────────────┘    └─────────────────┘    └─────────────────┘
//!                                                        │
//!                                                        ▼
//!                                               threshold = 2 × live
//! ```
//!
//! The [`Heap`] arena is the registry of every allocated object and the only
//! owner of object storage. Stack entries and pair fields are [`ObjectRef`]
//! handles into it.

pub mod allocator;
pub mod collector;
pub mod handle;
pub mod mark;
pub mod object;
pub mod root_set;
pub mod statistics;

pub use allocator::Heap;
pub use collector::{CollectionResult, CollectionTrigger, CollectorState, GcCollector};
pub use handle::{Generation, ObjectRef};
pub use mark::{MarkPhase, MarkState, MarkStatistics};
pub use object::{Object, ObjectKind, PairField};
pub use root_set::RootStack;
pub use statistics::GcStatistics;

/// Maximum number of roots the stack holds
pub const DEFAULT_STACK_MAX: usize = 256;

/// Object count at which the first collection runs
pub const DEFAULT_INITIAL_THRESHOLD: usize = 16;

/// Configuration for a VM and its collector. Fixed once the VM is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GcConfig {
    /// Root stack capacity
    pub stack_max: usize,
    /// Threshold before the first collection has run
    pub initial_threshold: usize,
    /// Lower bound for the recomputed threshold (0 = no clamp)
    pub min_threshold: usize,
}

impl GcConfig {
    pub fn new(stack_max: usize, initial_threshold: usize) -> Self {
        Self {
            stack_max,
            initial_threshold,
            min_threshold: 0,
        }
    }

    pub fn with_stack_max(mut self, stack_max: usize) -> Self {
        self.stack_max = stack_max;
        self
    }

    pub fn with_initial_threshold(mut self, initial_threshold: usize) -> Self {
        self.initial_threshold = initial_threshold;
        self
    }

    pub fn with_min_threshold(mut self, min_threshold: usize) -> Self {
        self.min_threshold = min_threshold;
        self
    }
}

impl Default for GcConfig {
    fn default() -> Self {
        Self::new(DEFAULT_STACK_MAX, DEFAULT_INITIAL_THRESHOLD)
    }
}
