/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use std::sync::Arc;

use anyhow::Context;

use super::delta::delta_in_place;
use super::{
    validate_properties, AdjacencyCompressor, AdjacencyCompressorFactory, AdjacencySorter,
    Aggregation, CompressorConfig, PackedEncoder, PackingStrategy, PropertyAllocators,
    SharedTables, VarLongEncoder,
};
use crate::allocator::{Address, BumpAllocator, BytePage};
use crate::list::{
    AdjacencyList, MemoryInfo, MixedAdjacencyList, PackedAdjacencyList, UncompressedProperties,
    VarLongAdjacencyList,
};
use crate::stats::MemoryTracker;

/// Factory for mixed adjacency lists.
///
/// A mixed list is a packed and a varlong list built over the same source
/// stream and sharing the degree and offset tables: each source is written
/// to exactly one of the two, chosen by its post-aggregation degree, so the
/// branch taken at compression time always matches the branch the cursor
/// dispatch takes from the degree table.
///
/// Each branch keeps its own [`MemoryTracker`], so the merged
/// [memory info](MixedAdjacencyList::memory_info) can report on-heap and
/// off-heap statistics separately.
pub struct MixedCompressorFactory {
    tables: Arc<SharedTables>,
    packed_pages: BumpAllocator<Address>,
    byte_pages: BumpAllocator<BytePage>,
    properties: Option<PropertyAllocators>,
    aggregations: Vec<Aggregation>,
    topology_aggregation: Aggregation,
    strategy: PackingStrategy,
    threshold: usize,
    packed_tracker: MemoryTracker,
    varlong_tracker: MemoryTracker,
}

impl MixedCompressorFactory {
    pub fn new(
        node_count: usize,
        config: CompressorConfig,
        packed_tracker: MemoryTracker,
        varlong_tracker: MemoryTracker,
    ) -> Self {
        config.validate();
        assert!(
            config.packing_threshold > 0,
            "the packing threshold must be positive"
        );
        assert!(
            config.property_streams == 0 || config.strategy != PackingStrategy::BlockAlignedTail,
            "the block-aligned tail strategy does not support properties"
        );
        Self {
            tables: Arc::new(SharedTables::new(node_count)),
            packed_pages: BumpAllocator::new(),
            byte_pages: BumpAllocator::new(),
            properties: PropertyAllocators::new(config.property_streams),
            aggregations: if config.property_streams > 0 {
                config.aggregations.clone()
            } else {
                Vec::new()
            },
            topology_aggregation: config.topology_aggregation(),
            strategy: config.strategy,
            threshold: config.packing_threshold,
            packed_tracker,
            varlong_tracker,
        }
    }
}

impl AdjacencyCompressorFactory for MixedCompressorFactory {
    type Compressor<'a>
        = MixedCompressor<'a>
    where
        Self: 'a;
    type Output = (MixedAdjacencyList, Vec<UncompressedProperties>);

    fn compressor(&self) -> MixedCompressor<'_> {
        MixedCompressor {
            tables: &self.tables,
            packed: PackedEncoder::new(self.strategy, self.packed_pages.local_allocator()),
            varlong: VarLongEncoder::new(self.byte_pages.local_allocator()),
            properties: self.properties.as_ref().map(PropertyAllocators::local),
            aggregations: &self.aggregations,
            topology_aggregation: self.topology_aggregation,
            threshold: self.threshold,
            sorter: AdjacencySorter::new(),
            packed_tracker: &self.packed_tracker,
            varlong_tracker: &self.varlong_tracker,
        }
    }

    fn node_count(&self) -> usize {
        self.tables.node_count()
    }

    fn property_streams(&self) -> usize {
        self.aggregations.len()
    }

    fn build(self) -> anyhow::Result<Self::Output> {
        let packed_stats = self.packed_tracker.finish();
        let packed_pages: Vec<Address> = self.packed_pages.into_pages();
        let packed_info = MemoryInfo::off_heap(packed_pages.iter().map(Address::bytes), packed_stats);

        let varlong_stats = self.varlong_tracker.finish();
        let byte_pages: Vec<Box<[u8]>> = self.byte_pages.into_pages();
        let varlong_info =
            MemoryInfo::on_heap(byte_pages.iter().map(|page| page.len()), varlong_stats);

        let tables = Arc::try_unwrap(self.tables)
            .ok()
            .context("the shared tables are still referenced; drop all compressors first")?;
        let (degrees, adjacency_offsets, property_offsets) = tables.into_parts();

        let packed = PackedAdjacencyList::new(
            packed_pages,
            self.strategy,
            degrees.clone(),
            adjacency_offsets.clone(),
            packed_info,
        );
        let varlong = VarLongAdjacencyList::new(
            byte_pages,
            degrees.clone(),
            adjacency_offsets,
            varlong_info,
        );
        let list = MixedAdjacencyList::new(packed, varlong, self.threshold);
        log::info!(
            "Built mixed adjacency list: threshold {}, {} pages",
            self.threshold,
            list.memory_info().page_count
        );
        let properties = self
            .properties
            .map(|allocators| allocators.into_lists(degrees, property_offsets))
            .unwrap_or_default();
        Ok((list, properties))
    }
}

/// Per-worker compressor of [`MixedCompressorFactory`].
///
/// Aggregation happens once, up front; the deduplicated absolute targets
/// are then delta-encoded and routed to one of the two encoders by the
/// post-aggregation degree.
pub struct MixedCompressor<'a> {
    tables: &'a SharedTables,
    packed: PackedEncoder<'a>,
    varlong: VarLongEncoder<'a>,
    properties: Option<super::LocalPropertyWriter<'a>>,
    aggregations: &'a [Aggregation],
    topology_aggregation: Aggregation,
    threshold: usize,
    sorter: AdjacencySorter,
    packed_tracker: &'a MemoryTracker,
    varlong_tracker: &'a MemoryTracker,
}

impl AdjacencyCompressor for MixedCompressor<'_> {
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
        delta_in_place(&mut targets[..length]);
        let adjacency_offset = if length >= self.threshold {
            self.packed.encode(&targets[..length], self.packed_tracker)?
        } else {
            self.varlong.encode(&targets[..length], self.varlong_tracker)?
        };
        let property_offset = match &mut self.properties {
            Some(writer) => writer.write(properties, length, self.varlong_tracker)?,
            None => 0,
        };
        self.tables
            .record(node, length as u32, adjacency_offset, property_offset);
        Ok(length)
    }
}
