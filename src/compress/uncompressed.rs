/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use std::sync::Arc;

use anyhow::Context;

use super::{
    validate_properties, AdjacencyCompressor, AdjacencyCompressorFactory, AdjacencySorter,
    Aggregation, CompressorConfig, PropertyAllocators, SharedTables,
};
use crate::allocator::{BumpAllocator, LocalAllocator, WordPage};
use crate::list::{MemoryInfo, UncompressedAdjacencyList, UncompressedProperties};
use crate::stats::MemoryTracker;

/// Factory for uncompressed adjacency lists.
///
/// Neighbor lists are stored as plain sorted 64-bit ids in word pages; the
/// cursor answers ordered queries by binary search. Sorting and aggregation
/// still apply, only the encoding step is skipped.
pub struct UncompressedCompressorFactory {
    tables: Arc<SharedTables>,
    words: BumpAllocator<WordPage>,
    properties: Option<PropertyAllocators>,
    aggregations: Vec<Aggregation>,
    topology_aggregation: Aggregation,
    tracker: MemoryTracker,
}

impl UncompressedCompressorFactory {
    pub fn new(node_count: usize, config: CompressorConfig, tracker: MemoryTracker) -> Self {
        config.validate();
        Self {
            tables: Arc::new(SharedTables::new(node_count)),
            words: BumpAllocator::new(),
            properties: PropertyAllocators::new(config.property_streams),
            aggregations: if config.property_streams > 0 {
                config.aggregations.clone()
            } else {
                Vec::new()
            },
            topology_aggregation: config.topology_aggregation(),
            tracker,
        }
    }
}

impl AdjacencyCompressorFactory for UncompressedCompressorFactory {
    type Compressor<'a>
        = UncompressedCompressor<'a>
    where
        Self: 'a;
    type Output = (UncompressedAdjacencyList, Vec<UncompressedProperties>);

    fn compressor(&self) -> UncompressedCompressor<'_> {
        UncompressedCompressor {
            tables: &self.tables,
            words: self.words.local_allocator(),
            properties: self.properties.as_ref().map(PropertyAllocators::local),
            aggregations: &self.aggregations,
            topology_aggregation: self.topology_aggregation,
            sorter: AdjacencySorter::new(),
            tracker: &self.tracker,
        }
    }

    fn node_count(&self) -> usize {
        self.tables.node_count()
    }

    fn property_streams(&self) -> usize {
        self.aggregations.len()
    }

    fn build(self) -> anyhow::Result<Self::Output> {
        let stats = self.tracker.finish();
        let pages: Vec<Box<[u64]>> = self.words.into_pages();
        let memory_info = MemoryInfo::on_heap(pages.iter().map(|page| 8 * page.len()), stats);
        let tables = Arc::try_unwrap(self.tables)
            .ok()
            .context("the shared tables are still referenced; drop all compressors first")?;
        let (degrees, adjacency_offsets, property_offsets) = tables.into_parts();
        let list =
            UncompressedAdjacencyList::new(pages, degrees.clone(), adjacency_offsets, memory_info);
        let properties = self
            .properties
            .map(|allocators| allocators.into_lists(degrees, property_offsets))
            .unwrap_or_default();
        Ok((list, properties))
    }
}

/// Per-worker compressor of [`UncompressedCompressorFactory`].
pub struct UncompressedCompressor<'a> {
    tables: &'a SharedTables,
    words: LocalAllocator<'a, WordPage>,
    properties: Option<super::LocalPropertyWriter<'a>>,
    aggregations: &'a [Aggregation],
    topology_aggregation: Aggregation,
    sorter: AdjacencySorter,
    tracker: &'a MemoryTracker,
}

impl AdjacencyCompressor for UncompressedCompressor<'_> {
    fn compress(
        &mut self,
        node: u64,
        targets: &mut [u64],
        properties: &mut [Vec<u64>],
    ) -> anyhow::Result<usize> {
        validate_properties(
            targets.len(),
            self.aggregations.len(),
            self.properties.is_some(),
            properties,
        );
        let length = if properties.is_empty() {
            self.sorter.aggregate(targets, self.topology_aggregation)
        } else {
            self.sorter
                .aggregate_with_properties(targets, properties, self.aggregations)
        };
        if length == 0 {
            self.tables.record(node, 0, 0, 0);
            return Ok(0);
        }
        let adjacency_offset = self.words.insert(&targets[..length])?;
        self.tracker.record_heap_allocation(8 * length);
        let property_offset = match &mut self.properties {
            Some(writer) => writer.write(properties, length, self.tracker)?,
            None => 0,
        };
        self.tables
            .record(node, length as u32, adjacency_offset, property_offset);
        Ok(length)
    }
}
