/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! The final queryable adjacency structures.
//!
//! An adjacency list owns its pages and the degree and offset tables; it is
//! write-once, read-many. Cursors borrow the pages and own their scratch
//! block, so many cursors can stream concurrently from the same list.
//!
//! Page addressing is a shift and a mask: an offset is
//! `page_index << PAGE_SHIFT | index_in_page`.

mod mixed;
mod packed;
mod uncompressed;
mod varlong;

pub use mixed::{MixedAdjacencyList, MixedCursor};
pub use packed::PackedAdjacencyList;
pub use uncompressed::{UncompressedAdjacencyList, UncompressedProperties};
pub use varlong::VarLongAdjacencyList;

use crate::cursor::{AdjacencyCursor, PropertyCursor};
use crate::stats::{BlockInfo, ImmutableHistogram, TrackerStats};

/// Streams the whole neighbor list of `node` into a vector. Convenience for
/// tests and debugging.
pub fn collect_neighbors<L: AdjacencyList>(list: &L, node: u64) -> Vec<u64> {
    list.adjacency_cursor(node).into_iter().collect()
}

/// The queryable adjacency-list capability.
pub trait AdjacencyList {
    /// The cursor type streaming one source's neighbors.
    type Cursor<'a>: AdjacencyCursor + Clone
    where
        Self: 'a;

    /// Returns the number of source slots.
    fn node_count(&self) -> usize;

    /// Returns the degree of `node`: the number of neighbors after
    /// aggregation.
    fn degree(&self, node: u64) -> usize;

    /// Returns a cursor over the neighbors of `node`.
    fn adjacency_cursor(&self, node: u64) -> Self::Cursor<'_>;

    /// Re-initializes `reuse` over the neighbors of `node`, keeping its
    /// scratch allocations.
    fn adjacency_cursor_reuse<'a>(&'a self, reuse: &mut Self::Cursor<'a>, node: u64);

    /// Returns an unpositioned cursor, to be bound to a source later via
    /// [`adjacency_cursor_reuse`](Self::adjacency_cursor_reuse).
    fn raw_adjacency_cursor(&self) -> Self::Cursor<'_>;

    /// Returns the memory footprint and build statistics of this list.
    fn memory_info(&self) -> MemoryInfo;
}

/// The queryable edge-property capability: the k-th value of a source's
/// property cursor belongs to the k-th neighbor of its adjacency cursor.
pub trait AdjacencyProperties {
    /// The cursor type streaming one source's property values.
    type Cursor<'a>: PropertyCursor + Clone
    where
        Self: 'a;

    /// Returns the number of source slots.
    fn node_count(&self) -> usize;

    /// Returns the degree of `node`.
    fn degree(&self, node: u64) -> usize;

    /// Returns a cursor over the property values of `node`.
    fn property_cursor(&self, node: u64) -> Self::Cursor<'_>;

    /// Returns the memory footprint of this property list.
    fn memory_info(&self) -> MemoryInfo;
}

/// Memory footprint and build statistics of a list.
#[derive(Clone, Debug)]
pub struct MemoryInfo {
    /// Number of pages backing the list.
    pub page_count: usize,
    /// Bytes of on-heap page storage.
    pub bytes_on_heap: u64,
    /// Bytes of off-heap page storage.
    pub bytes_off_heap: u64,
    /// Sizes of the on-heap allocations made during the build.
    pub heap_allocations: ImmutableHistogram,
    /// Sizes of the off-heap allocations made during the build.
    pub native_allocations: ImmutableHistogram,
    /// Sizes of the pages backing the list.
    pub page_sizes: ImmutableHistogram,
    /// Bits spent on block headers, per compressed list.
    pub header_bits: ImmutableHistogram,
    /// Bytes spent on block headers, per compressed list.
    pub header_allocations: ImmutableHistogram,
    /// Block-level compression statistics, if any blocks were recorded.
    pub blocks: Option<BlockInfo>,
}

impl MemoryInfo {
    /// Statistics of a list backed by on-heap pages of the given byte
    /// sizes.
    pub(crate) fn on_heap(pages: impl Iterator<Item = usize>, stats: TrackerStats) -> Self {
        Self::from_parts(pages, stats, true)
    }

    /// Statistics of a list backed by off-heap pages of the given byte
    /// sizes.
    pub(crate) fn off_heap(pages: impl Iterator<Item = usize>, stats: TrackerStats) -> Self {
        Self::from_parts(pages, stats, false)
    }

    /// Page-derived statistics of a property list.
    pub(crate) fn for_word_pages(pages: &[Box<[u64]>]) -> Self {
        Self::on_heap(pages.iter().map(|page| 8 * page.len()), TrackerStats::new())
    }

    fn from_parts(
        pages: impl Iterator<Item = usize>,
        mut stats: TrackerStats,
        on_heap: bool,
    ) -> Self {
        let mut page_count = 0;
        let mut bytes = 0u64;
        for size in pages {
            page_count += 1;
            bytes += size as u64;
            stats.page_sizes.record(size as u64);
        }
        Self {
            page_count,
            bytes_on_heap: if on_heap { bytes } else { 0 },
            bytes_off_heap: if on_heap { 0 } else { bytes },
            heap_allocations: stats.heap_allocations.snapshot(),
            native_allocations: stats.native_allocations.snapshot(),
            page_sizes: stats.page_sizes.snapshot(),
            header_bits: stats.header_bits.snapshot(),
            header_allocations: stats.header_allocations.snapshot(),
            blocks: (stats.blocks.block_count() > 0).then(|| stats.blocks.snapshot()),
        }
    }

    /// Returns the combined statistics of two lists.
    pub fn merge(&self, other: &Self) -> Self {
        Self {
            page_count: self.page_count + other.page_count,
            bytes_on_heap: self.bytes_on_heap + other.bytes_on_heap,
            bytes_off_heap: self.bytes_off_heap + other.bytes_off_heap,
            heap_allocations: self.heap_allocations.merge(&other.heap_allocations),
            native_allocations: self.native_allocations.merge(&other.native_allocations),
            page_sizes: self.page_sizes.merge(&other.page_sizes),
            header_bits: self.header_bits.merge(&other.header_bits),
            header_allocations: self.header_allocations.merge(&other.header_allocations),
            blocks: match (&self.blocks, &other.blocks) {
                (Some(a), Some(b)) => Some(a.merge(b)),
                (Some(a), None) => Some(a.clone()),
                (None, Some(b)) => Some(b.clone()),
                (None, None) => None,
            },
        }
    }
}
