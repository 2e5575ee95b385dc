/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use std::sync::Arc;

use super::{AdjacencyList, MemoryInfo};
use crate::allocator::{index_in_page, page_index};
use crate::cursor::VarLongCursor;

/// An adjacency list whose neighbor blocks are delta-varlong byte streams
/// in on-heap pages.
pub struct VarLongAdjacencyList {
    pages: Vec<Box<[u8]>>,
    degrees: Arc<[u32]>,
    offsets: Arc<[u64]>,
    memory_info: MemoryInfo,
}

impl VarLongAdjacencyList {
    pub(crate) fn new(
        pages: Vec<Box<[u8]>>,
        degrees: Arc<[u32]>,
        offsets: Arc<[u64]>,
        memory_info: MemoryInfo,
    ) -> Self {
        Self {
            pages,
            degrees,
            offsets,
            memory_info,
        }
    }

    /// Returns the compressed block of `node` (from its offset to the end
    /// of its page) and its degree, or `None` for an empty list.
    fn block(&self, node: u64) -> Option<(&[u8], usize)> {
        let degree = self.degrees[node as usize] as usize;
        if degree == 0 {
            return None;
        }
        let offset = self.offsets[node as usize];
        let page = &self.pages[page_index(offset)];
        Some((&page[index_in_page(offset)..], degree))
    }
}

impl AdjacencyList for VarLongAdjacencyList {
    type Cursor<'a>
        = VarLongCursor<'a>
    where
        Self: 'a;

    fn node_count(&self) -> usize {
        self.degrees.len()
    }

    fn degree(&self, node: u64) -> usize {
        self.degrees[node as usize] as usize
    }

    fn adjacency_cursor(&self, node: u64) -> VarLongCursor<'_> {
        let mut cursor = VarLongCursor::empty();
        self.adjacency_cursor_reuse(&mut cursor, node);
        cursor
    }

    fn adjacency_cursor_reuse<'a>(&'a self, reuse: &mut VarLongCursor<'a>, node: u64) {
        match self.block(node) {
            Some((data, degree)) => reuse.init(data, degree),
            None => reuse.init(&[], 0),
        }
    }

    fn raw_adjacency_cursor(&self) -> VarLongCursor<'_> {
        VarLongCursor::empty()
    }

    fn memory_info(&self) -> MemoryInfo {
        self.memory_info.clone()
    }
}
