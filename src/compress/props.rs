/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Aligned storage of edge-property streams.
//!
//! Properties are stored uncompressed, one 64-bit word per edge, in word
//! pages. The first stream allocates through a plain bump allocator and its
//! offsets are canonical: every other stream replays them through a
//! positional allocator over its own page array, so that all streams of a
//! source share the same offset and are identically indexed by the position
//! of the corresponding target in the decompressed neighbor list.

use std::sync::Arc;

use crate::allocator::{
    AllocationError, BumpAllocator, LocalAllocator, PositionalAllocator, WordPage,
};
use crate::list::{MemoryInfo, UncompressedProperties};
use crate::stats::MemoryTracker;

/// One bump allocator per property stream.
pub(crate) struct PropertyAllocators {
    first: BumpAllocator<WordPage>,
    rest: Vec<BumpAllocator<WordPage>>,
}

impl PropertyAllocators {
    /// Returns allocators for `streams` property streams, or `None` if the
    /// graph has no properties.
    pub(crate) fn new(streams: usize) -> Option<Self> {
        if streams == 0 {
            return None;
        }
        Some(Self {
            first: BumpAllocator::new(),
            rest: (1..streams).map(|_| BumpAllocator::new()).collect(),
        })
    }

    /// Returns a per-worker writer.
    pub(crate) fn local(&self) -> LocalPropertyWriter<'_> {
        LocalPropertyWriter {
            first: self.first.local_allocator(),
            rest: self
                .rest
                .iter()
                .map(BumpAllocator::positional_allocator)
                .collect(),
        }
    }

    /// Seals every stream into its property list.
    pub(crate) fn into_lists(
        self,
        degrees: Arc<[u32]>,
        offsets: Arc<[u64]>,
    ) -> Vec<UncompressedProperties> {
        std::iter::once(self.first)
            .chain(self.rest)
            .map(|allocator| {
                let pages: Vec<Box<[u64]>> = allocator.into_pages();
                let memory_info = MemoryInfo::for_word_pages(&pages);
                UncompressedProperties::new(pages, degrees.clone(), offsets.clone(), memory_info)
            })
            .collect()
    }
}

/// A per-worker writer filling all property streams for one source at the
/// same offset.
pub(crate) struct LocalPropertyWriter<'a> {
    first: LocalAllocator<'a, WordPage>,
    rest: Vec<PositionalAllocator<'a, WordPage>>,
}

impl LocalPropertyWriter<'_> {
    /// Writes the first `length` values of every stream and returns the
    /// offset they share.
    pub(crate) fn write(
        &mut self,
        properties: &[Vec<u64>],
        length: usize,
        tracker: &MemoryTracker,
    ) -> Result<u64, AllocationError> {
        debug_assert_eq!(properties.len(), self.rest.len() + 1);
        let offset = self.first.insert(&properties[0][..length])?;
        for (positional, stream) in self.rest.iter_mut().zip(&properties[1..]) {
            positional.insert_at(offset, &stream[..length])?;
        }
        tracker.record_heap_allocation(8 * length * properties.len());
        Ok(offset)
    }
}
