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
    Aggregation, CompressorConfig, PackedEncoder, PackingStrategy, PropertyAllocators,
    SharedTables,
};
use crate::allocator::{Address, BumpAllocator};
use crate::list::{MemoryInfo, PackedAdjacencyList, UncompressedProperties};
use crate::stats::MemoryTracker;

/// Factory for bit-packed adjacency lists.
///
/// Neighbor lists are stored off heap as 64-value blocks packed at the
/// per-block minimal bit width, with the tail flavor selected by
/// [`PackingStrategy`].
pub struct PackedCompressorFactory {
    tables: Arc<SharedTables>,
    pages: BumpAllocator<Address>,
    properties: Option<PropertyAllocators>,
    aggregations: Vec<Aggregation>,
    topology_aggregation: Aggregation,
    strategy: PackingStrategy,
    tracker: MemoryTracker,
}

impl PackedCompressorFactory {
    pub fn new(node_count: usize, config: CompressorConfig, tracker: MemoryTracker) -> Self {
        config.validate();
        Self::with_tables(Arc::new(SharedTables::new(node_count)), &config, tracker)
    }

    pub(crate) fn with_tables(
        tables: Arc<SharedTables>,
        config: &CompressorConfig,
        tracker: MemoryTracker,
    ) -> Self {
        Self {
            tables,
            pages: BumpAllocator::new(),
            properties: PropertyAllocators::new(config.property_streams),
            aggregations: if config.property_streams > 0 {
                config.aggregations.clone()
            } else {
                Vec::new()
            },
            topology_aggregation: config.topology_aggregation(),
            strategy: config.strategy,
            tracker,
        }
    }
}

impl AdjacencyCompressorFactory for PackedCompressorFactory {
    type Compressor<'a>
        = PackedCompressor<'a>
    where
        Self: 'a;
    type Output = (PackedAdjacencyList, Vec<UncompressedProperties>);

    fn compressor(&self) -> PackedCompressor<'_> {
        PackedCompressor {
            tables: &self.tables,
            encoder: PackedEncoder::new(self.strategy, self.pages.local_allocator()),
            properties: self.properties.as_ref().map(PropertyAllocators::local),
            aggregations: &self.aggregations,
            topology_aggregation: self.topology_aggregation,
            strategy: self.strategy,
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
        let pages: Vec<Address> = self.pages.into_pages();
        let memory_info = MemoryInfo::off_heap(pages.iter().map(Address::bytes), stats);
        log::info!(
            "Built packed adjacency list ({:?}): {} pages, {} bytes off heap",
            self.strategy,
            memory_info.page_count,
            memory_info.bytes_off_heap
        );
        let tables = Arc::try_unwrap(self.tables)
            .ok()
            .context("the shared tables are still referenced; drop all compressors first")?;
        let (degrees, adjacency_offsets, property_offsets) = tables.into_parts();
        let list = PackedAdjacencyList::new(
            pages,
            self.strategy,
            degrees.clone(),
            adjacency_offsets,
            memory_info,
        );
        let properties = self
            .properties
            .map(|allocators| allocators.into_lists(degrees, property_offsets))
            .unwrap_or_default();
        Ok((list, properties))
    }
}

/// Per-worker compressor of [`PackedCompressorFactory`].
pub struct PackedCompressor<'a> {
    tables: &'a SharedTables,
    encoder: PackedEncoder<'a>,
    properties: Option<super::LocalPropertyWriter<'a>>,
    aggregations: &'a [Aggregation],
    topology_aggregation: Aggregation,
    strategy: PackingStrategy,
    sorter: AdjacencySorter,
    tracker: &'a MemoryTracker,
}

impl AdjacencyCompressor for PackedCompressor<'_> {
    fn compress(
        &mut self,
        node: u64,
        targets: &mut [u64],
        properties: &mut [Vec<u64>],
    ) -> anyhow::Result<usize> {
        assert!(
            properties.is_empty() || self.strategy != PackingStrategy::BlockAlignedTail,
            "the block-aligned tail strategy does not support properties"
        );
        validate_properties(
            targets.len(),
            self.aggregations.len(),
            self.properties.is_some(),
            properties,
        );
        let length = if properties.is_empty() {
            self.sorter.delta_encode(targets, self.topology_aggregation)
        } else {
            self.sorter
                .delta_encode_with_properties(targets, properties, self.aggregations)
        };
        if length == 0 {
            self.tables.record(node, 0, 0, 0);
            return Ok(0);
        }
        let adjacency_offset = self.encoder.encode(&targets[..length], self.tracker)?;
        let property_offset = match &mut self.properties {
            Some(writer) => writer.write(properties, length, self.tracker)?,
            None => 0,
        };
        self.tables
            .record(node, length as u32, adjacency_offset, property_offset);
        Ok(length)
    }
}
