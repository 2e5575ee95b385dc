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
    Aggregation, CompressorConfig, PropertyAllocators, SharedTables, VarLongEncoder,
};
use crate::allocator::{BumpAllocator, BytePage};
use crate::list::{MemoryInfo, UncompressedProperties, VarLongAdjacencyList};
use crate::stats::MemoryTracker;

/// Factory for delta-varlong adjacency lists.
///
/// The whole neighbor list of a source is stored as varlong bytes: the
/// first target followed by the deltas between consecutive targets.
pub struct VarLongCompressorFactory {
    tables: Arc<SharedTables>,
    bytes: BumpAllocator<BytePage>,
    properties: Option<PropertyAllocators>,
    aggregations: Vec<Aggregation>,
    topology_aggregation: Aggregation,
    tracker: MemoryTracker,
}

impl VarLongCompressorFactory {
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
            bytes: BumpAllocator::new(),
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

impl AdjacencyCompressorFactory for VarLongCompressorFactory {
    type Compressor<'a>
        = VarLongCompressor<'a>
    where
        Self: 'a;
    type Output = (VarLongAdjacencyList, Vec<UncompressedProperties>);

    fn compressor(&self) -> VarLongCompressor<'_> {
        VarLongCompressor {
            tables: &self.tables,
            encoder: VarLongEncoder::new(self.bytes.local_allocator()),
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
        let pages: Vec<Box<[u8]>> = self.bytes.into_pages();
        let memory_info = MemoryInfo::on_heap(pages.iter().map(|page| page.len()), stats);
        log::info!(
            "Built varlong adjacency list: {} pages, {} bytes on heap",
            memory_info.page_count,
            memory_info.bytes_on_heap
        );
        let tables = Arc::try_unwrap(self.tables)
            .ok()
            .context("the shared tables are still referenced; drop all compressors first")?;
        let (degrees, adjacency_offsets, property_offsets) = tables.into_parts();
        let list =
            VarLongAdjacencyList::new(pages, degrees.clone(), adjacency_offsets, memory_info);
        let properties = self
            .properties
            .map(|allocators| allocators.into_lists(degrees, property_offsets))
            .unwrap_or_default();
        Ok((list, properties))
    }
}

/// Per-worker compressor of [`VarLongCompressorFactory`].
pub struct VarLongCompressor<'a> {
    tables: &'a SharedTables,
    encoder: VarLongEncoder<'a>,
    properties: Option<super::LocalPropertyWriter<'a>>,
    aggregations: &'a [Aggregation],
    topology_aggregation: Aggregation,
    sorter: AdjacencySorter,
    tracker: &'a MemoryTracker,
}

impl AdjacencyCompressor for VarLongCompressor<'_> {
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
