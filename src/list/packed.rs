/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use std::sync::Arc;

use super::{AdjacencyList, MemoryInfo};
use crate::allocator::{index_in_page, page_index, Address};
use crate::compress::PackingStrategy;
use crate::cursor::PackedCursor;

/// An adjacency list whose neighbor blocks are bit-packed in off-heap
/// pages.
///
/// The list owns its pages: dropping it releases the native memory
/// deterministically.
pub struct PackedAdjacencyList {
    pages: Vec<Address>,
    strategy: PackingStrategy,
    degrees: Arc<[u32]>,
    offsets: Arc<[u64]>,
    memory_info: MemoryInfo,
}

impl PackedAdjacencyList {
    pub(crate) fn new(
        pages: Vec<Address>,
        strategy: PackingStrategy,
        degrees: Arc<[u32]>,
        offsets: Arc<[u64]>,
        memory_info: MemoryInfo,
    ) -> Self {
        Self {
            pages,
            strategy,
            degrees,
            offsets,
            memory_info,
        }
    }

    /// Returns the tail flavor this list was packed with.
    pub fn strategy(&self) -> PackingStrategy {
        self.strategy
    }
}

impl AdjacencyList for PackedAdjacencyList {
    type Cursor<'a>
        = PackedCursor<'a>
    where
        Self: 'a;

    fn node_count(&self) -> usize {
        self.degrees.len()
    }

    fn degree(&self, node: u64) -> usize {
        self.degrees[node as usize] as usize
    }

    fn adjacency_cursor(&self, node: u64) -> PackedCursor<'_> {
        let mut cursor = PackedCursor::empty(self.strategy);
        self.adjacency_cursor_reuse(&mut cursor, node);
        cursor
    }

    fn adjacency_cursor_reuse<'a>(&'a self, reuse: &mut PackedCursor<'a>, node: u64) {
        let degree = self.degrees[node as usize] as usize;
        if degree == 0 {
            reuse.init(&[], 0, 0, self.strategy);
            return;
        }
        let offset = self.offsets[node as usize];
        let page = self.pages[page_index(offset)].as_slice();
        reuse.init(page, index_in_page(offset), degree, self.strategy);
    }

    fn raw_adjacency_cursor(&self) -> PackedCursor<'_> {
        PackedCursor::empty(self.strategy)
    }

    fn memory_info(&self) -> MemoryInfo {
        self.memory_info.clone()
    }
}
