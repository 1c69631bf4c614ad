//! Garbage Collection Statistics
//!
//! Cumulative counters across every collection a VM has run.

use std::fmt;
use std::time::Duration;

use super::collector::{CollectionResult, CollectionTrigger};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GcStatistics {
    /// Total collections performed
    pub total_collections: u64,
    /// Collections started by the allocation threshold
    pub threshold_collections: u64,
    /// Collections requested explicitly
    pub forced_collections: u64,

    pub total_objects_allocated: u64,
    pub total_objects_collected: u64,
    pub total_objects_marked: u64,

    /// Highest live object count seen right after an allocation
    pub peak_object_count: usize,

    /// Total time spent in GC
    pub total_gc_time: Duration,

    pub last_collection: Option<CollectionResult>,
}

impl GcStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_allocation(&mut self, object_count: usize) {
        self.total_objects_allocated += 1;
        self.peak_object_count = self.peak_object_count.max(object_count);
    }

    pub fn record_collection(&mut self, result: &CollectionResult) {
        self.total_collections += 1;
        match result.trigger {
            CollectionTrigger::Threshold => self.threshold_collections += 1,
            CollectionTrigger::Forced => self.forced_collections += 1,
        }
        self.total_objects_collected += result.objects_collected as u64;
        self.total_objects_marked += result.objects_marked as u64;
        self.total_gc_time += result.duration;
        self.last_collection = Some(result.clone());
    }

    pub fn average_collection_time(&self) -> Duration {
        if self.total_collections == 0 {
            return Duration::ZERO;
        }
        let nanos = self.total_gc_time.as_nanos() / u128::from(self.total_collections);
        Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
    }
}

impl fmt::Display for GcStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "collections: {} ({} threshold, {} forced)",
            self.total_collections, self.threshold_collections, self.forced_collections
        )?;
        writeln!(f, "objects allocated: {}", self.total_objects_allocated)?;
        writeln!(f, "objects collected: {}", self.total_objects_collected)?;
        writeln!(f, "peak live objects: {}", self.peak_object_count)?;
        write!(
            f,
            "gc time: {:?} total, {:?} average",
            self.total_gc_time,
            self.average_collection_time()
        )
    }
}
