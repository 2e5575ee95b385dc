/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use std::cell::RefCell;

use thread_local::ThreadLocal;

use super::{BlockStatistics, BoundedHistogram};

/// Allocation-size histograms are exact up to this bound; larger values are
/// clamped into the top bucket.
const SIZE_BOUND: usize = 1 << 21;

/// The per-worker statistics of one tracker, merged at build time.
pub(crate) struct TrackerStats {
    pub(crate) heap_allocations: BoundedHistogram,
    pub(crate) native_allocations: BoundedHistogram,
    pub(crate) page_sizes: BoundedHistogram,
    pub(crate) header_bits: BoundedHistogram,
    pub(crate) header_allocations: BoundedHistogram,
    pub(crate) blocks: BlockStatistics,
}

impl TrackerStats {
    pub(crate) fn new() -> Self {
        Self {
            heap_allocations: BoundedHistogram::new(SIZE_BOUND),
            native_allocations: BoundedHistogram::new(SIZE_BOUND),
            page_sizes: BoundedHistogram::new(SIZE_BOUND),
            header_bits: BoundedHistogram::new(SIZE_BOUND),
            header_allocations: BoundedHistogram::new(SIZE_BOUND),
            blocks: BlockStatistics::new(),
        }
    }

    fn add(&mut self, other: &Self) {
        self.heap_allocations.add(&other.heap_allocations);
        self.native_allocations.add(&other.native_allocations);
        self.page_sizes.add(&other.page_sizes);
        self.header_bits.add(&other.header_bits);
        self.header_allocations.add(&other.header_allocations);
        self.blocks.add(&other.blocks);
    }
}

/// Records the allocation and block events of one build.
///
/// A tracker is explicit configuration of a compressor factory. The
/// [empty](MemoryTracker::empty) tracker is a zero-cost no-op; the
/// [full](MemoryTracker::full) tracker keeps one set of histograms per
/// worker thread and merges them when the factory builds its list, so the
/// recording paths never contend.
pub struct MemoryTracker {
    inner: Option<ThreadLocal<RefCell<TrackerStats>>>,
}

impl MemoryTracker {
    /// A tracker that records nothing.
    pub fn empty() -> Self {
        Self { inner: None }
    }

    /// A tracker that records everything.
    pub fn full() -> Self {
        Self {
            inner: Some(ThreadLocal::new()),
        }
    }

    /// Returns true if this tracker records events.
    pub fn is_tracking(&self) -> bool {
        self.inner.is_some()
    }

    #[inline]
    fn with(&self, record: impl FnOnce(&mut TrackerStats)) {
        if let Some(locals) = &self.inner {
            record(&mut locals.get_or(|| RefCell::new(TrackerStats::new())).borrow_mut());
        }
    }

    /// Records an on-heap allocation of the given size in bytes.
    pub fn record_heap_allocation(&self, bytes: usize) {
        self.with(|stats| stats.heap_allocations.record(bytes as u64));
    }

    /// Records an off-heap allocation of the given size in bytes.
    pub fn record_native_allocation(&self, bytes: usize) {
        self.with(|stats| stats.native_allocations.record(bytes as u64));
    }

    /// Records the size in bytes of a new page.
    pub fn record_page_size(&self, bytes: usize) {
        self.with(|stats| stats.page_sizes.record(bytes as u64));
    }

    /// Records the number of header bits of a compressed block.
    pub fn record_header_bits(&self, bits: usize) {
        self.with(|stats| stats.header_bits.record(bits as u64));
    }

    /// Records the size in bytes of the header of a compressed block.
    pub fn record_header_allocation(&self, bytes: usize) {
        self.with(|stats| stats.header_allocations.record(bytes as u64));
    }

    /// Records the block statistics of one bit-packed block.
    pub fn record_block(&self, values: &[u64]) {
        self.with(|stats| stats.blocks.record_block(values));
    }

    /// Merges the per-worker statistics into a single aggregate.
    pub(crate) fn finish(self) -> TrackerStats {
        match self.inner {
            None => TrackerStats::new(),
            Some(locals) => {
                let mut merged = TrackerStats::new();
                for local in locals {
                    merged.add(&local.into_inner());
                }
                merged
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_tracker_records_nothing() {
        let tracker = MemoryTracker::empty();
        tracker.record_heap_allocation(100);
        tracker.record_block(&[1, 2, 3]);
        let stats = tracker.finish();
        assert!(stats.heap_allocations.is_empty());
        assert_eq!(stats.blocks.block_count(), 0);
    }

    #[test]
    fn full_tracker_merges_workers() {
        let tracker = MemoryTracker::full();
        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    tracker.record_heap_allocation(64);
                    tracker.record_block(&[1; 64]);
                });
            }
        });
        let stats = tracker.finish();
        assert_eq!(stats.heap_allocations.total(), 4);
        assert_eq!(stats.blocks.block_count(), 4);
    }
}
