/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use super::{AdjacencyList, MemoryInfo, PackedAdjacencyList, VarLongAdjacencyList};
use crate::cursor::{AdjacencyCursor, PackedCursor, VarLongCursor};

/// A composite of a packed and a varlong adjacency list built over the same
/// source stream and sharing the degree and offset tables.
///
/// Sources with a degree of at least the threshold were written to (and are
/// read from) the packed list; all others live in the varlong list. The
/// dispatch is a single match on the degree at cursor creation.
pub struct MixedAdjacencyList {
    packed: PackedAdjacencyList,
    varlong: VarLongAdjacencyList,
    threshold: usize,
}

impl MixedAdjacencyList {
    pub(crate) fn new(
        packed: PackedAdjacencyList,
        varlong: VarLongAdjacencyList,
        threshold: usize,
    ) -> Self {
        Self {
            packed,
            varlong,
            threshold,
        }
    }

    /// Returns the degree at or above which sources use the packed list.
    pub fn threshold(&self) -> usize {
        self.threshold
    }
}

/// The cursor of a [`MixedAdjacencyList`]: one of the two branch cursors.
#[derive(Clone)]
pub enum MixedCursor<'a> {
    Packed(PackedCursor<'a>),
    VarLong(VarLongCursor<'a>),
}

impl AdjacencyCursor for MixedCursor<'_> {
    fn size(&self) -> usize {
        match self {
            MixedCursor::Packed(cursor) => cursor.size(),
            MixedCursor::VarLong(cursor) => cursor.size(),
        }
    }

    fn remaining(&self) -> usize {
        match self {
            MixedCursor::Packed(cursor) => cursor.remaining(),
            MixedCursor::VarLong(cursor) => cursor.remaining(),
        }
    }

    fn next(&mut self) -> u64 {
        match self {
            MixedCursor::Packed(cursor) => cursor.next(),
            MixedCursor::VarLong(cursor) => cursor.next(),
        }
    }

    fn peek(&mut self) -> u64 {
        match self {
            MixedCursor::Packed(cursor) => cursor.peek(),
            MixedCursor::VarLong(cursor) => cursor.peek(),
        }
    }

    fn advance_by(&mut self, n: usize) -> u64 {
        match self {
            MixedCursor::Packed(cursor) => cursor.advance_by(n),
            MixedCursor::VarLong(cursor) => cursor.advance_by(n),
        }
    }

    fn skip_until(&mut self, target: u64) -> u64 {
        match self {
            MixedCursor::Packed(cursor) => cursor.skip_until(target),
            MixedCursor::VarLong(cursor) => cursor.skip_until(target),
        }
    }

    fn advance(&mut self, target: u64) -> u64 {
        match self {
            MixedCursor::Packed(cursor) => cursor.advance(target),
            MixedCursor::VarLong(cursor) => cursor.advance(target),
        }
    }

    fn copy_from(&mut self, other: &Self) {
        self.clone_from(other);
    }
}

impl AdjacencyList for MixedAdjacencyList {
    type Cursor<'a>
        = MixedCursor<'a>
    where
        Self: 'a;

    fn node_count(&self) -> usize {
        self.varlong.node_count()
    }

    /// The degree is always answered by the varlong list; the tables are
    /// shared, so both branches agree.
    fn degree(&self, node: u64) -> usize {
        self.varlong.degree(node)
    }

    fn adjacency_cursor(&self, node: u64) -> MixedCursor<'_> {
        if self.degree(node) >= self.threshold {
            MixedCursor::Packed(self.packed.adjacency_cursor(node))
        } else {
            MixedCursor::VarLong(self.varlong.adjacency_cursor(node))
        }
    }

    /// Reuses the cursor only if it is the branch the node dispatches to;
    /// otherwise a fresh cursor of the right branch replaces it.
    fn adjacency_cursor_reuse<'a>(&'a self, reuse: &mut MixedCursor<'a>, node: u64) {
        let packed = self.degree(node) >= self.threshold;
        match (packed, reuse) {
            (true, MixedCursor::Packed(cursor)) => self.packed.adjacency_cursor_reuse(cursor, node),
            (false, MixedCursor::VarLong(cursor)) => {
                self.varlong.adjacency_cursor_reuse(cursor, node)
            }
            (_, reuse) => *reuse = self.adjacency_cursor(node),
        }
    }

    /// Raw access favors the lighter branch.
    fn raw_adjacency_cursor(&self) -> MixedCursor<'_> {
        MixedCursor::VarLong(self.varlong.raw_adjacency_cursor())
    }

    /// The merged view: page counts and page-size histograms are summed,
    /// on-heap statistics come from the varlong branch, off-heap and header
    /// statistics from the packed branch.
    fn memory_info(&self) -> MemoryInfo {
        let packed = self.packed.memory_info();
        let varlong = self.varlong.memory_info();
        MemoryInfo {
            page_count: packed.page_count + varlong.page_count,
            bytes_on_heap: varlong.bytes_on_heap,
            bytes_off_heap: packed.bytes_off_heap,
            heap_allocations: varlong.heap_allocations,
            native_allocations: packed.native_allocations,
            page_sizes: packed.page_sizes.merge(&varlong.page_sizes),
            header_bits: packed.header_bits,
            header_allocations: packed.header_allocations,
            blocks: packed.blocks,
        }
    }
}
