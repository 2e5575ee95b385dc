/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use std::sync::Arc;

use super::{AdjacencyList, AdjacencyProperties, MemoryInfo};
use crate::allocator::{index_in_page, page_index};
use crate::cursor::{UncompressedCursor, UncompressedPropertyCursor};

/// An adjacency list whose neighbor lists are plain sorted ids in on-heap
/// word pages.
pub struct UncompressedAdjacencyList {
    pages: Vec<Box<[u64]>>,
    degrees: Arc<[u32]>,
    offsets: Arc<[u64]>,
    memory_info: MemoryInfo,
}

impl UncompressedAdjacencyList {
    pub(crate) fn new(
        pages: Vec<Box<[u64]>>,
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

    fn slice(&self, node: u64) -> &[u64] {
        let degree = self.degrees[node as usize] as usize;
        if degree == 0 {
            return &[];
        }
        let offset = self.offsets[node as usize];
        let index = index_in_page(offset);
        &self.pages[page_index(offset)][index..index + degree]
    }
}

impl AdjacencyList for UncompressedAdjacencyList {
    type Cursor<'a>
        = UncompressedCursor<'a>
    where
        Self: 'a;

    fn node_count(&self) -> usize {
        self.degrees.len()
    }

    fn degree(&self, node: u64) -> usize {
        self.degrees[node as usize] as usize
    }

    fn adjacency_cursor(&self, node: u64) -> UncompressedCursor<'_> {
        let mut cursor = UncompressedCursor::empty();
        self.adjacency_cursor_reuse(&mut cursor, node);
        cursor
    }

    fn adjacency_cursor_reuse<'a>(&'a self, reuse: &mut UncompressedCursor<'a>, node: u64) {
        reuse.init(self.slice(node));
    }

    fn raw_adjacency_cursor(&self) -> UncompressedCursor<'_> {
        UncompressedCursor::empty()
    }

    fn memory_info(&self) -> MemoryInfo {
        self.memory_info.clone()
    }
}

/// One uncompressed property stream, sharing the property offsets (and the
/// degrees) of its adjacency list.
pub struct UncompressedProperties {
    pages: Vec<Box<[u64]>>,
    degrees: Arc<[u32]>,
    offsets: Arc<[u64]>,
    memory_info: MemoryInfo,
}

impl UncompressedProperties {
    pub(crate) fn new(
        pages: Vec<Box<[u64]>>,
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
}

impl AdjacencyProperties for UncompressedProperties {
    type Cursor<'a>
        = UncompressedPropertyCursor<'a>
    where
        Self: 'a;

    fn node_count(&self) -> usize {
        self.degrees.len()
    }

    fn degree(&self, node: u64) -> usize {
        self.degrees[node as usize] as usize
    }

    fn property_cursor(&self, node: u64) -> UncompressedPropertyCursor<'_> {
        let degree = self.degrees[node as usize] as usize;
        if degree == 0 {
            return UncompressedPropertyCursor::new(&[]);
        }
        let offset = self.offsets[node as usize];
        let index = index_in_page(offset);
        UncompressedPropertyCursor::new(&self.pages[page_index(offset)][index..index + degree])
    }

    fn memory_info(&self) -> MemoryInfo {
        self.memory_info.clone()
    }
}
