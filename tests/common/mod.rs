/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

#![allow(dead_code)]

use adjpack::prelude::*;
use rand::prelude::*;
use rand::rngs::SmallRng;

/// Returns `degree` distinct sorted ids drawn from `[0, bound)`.
pub fn random_sorted_unique(rng: &mut SmallRng, degree: usize, bound: u64) -> Vec<u64> {
    assert!(bound >= degree as u64);
    let mut seen = std::collections::BTreeSet::new();
    while seen.len() < degree {
        seen.insert(rng.random_range(0..bound));
    }
    seen.into_iter().collect()
}

/// Compresses one neighbor list per node with a single compressor.
pub fn compress_all<F: AdjacencyCompressorFactory>(
    factory: &F,
    lists: &[Vec<u64>],
) -> anyhow::Result<()> {
    let mut compressor = factory.compressor();
    for (node, list) in lists.iter().enumerate() {
        let mut targets = list.clone();
        compressor.compress(node as u64, &mut targets, &mut [])?;
    }
    Ok(())
}

/// Like [`compress_all`], with one property stream array per node.
pub fn compress_all_with_properties<F: AdjacencyCompressorFactory>(
    factory: &F,
    lists: &[(Vec<u64>, Vec<Vec<u64>>)],
) -> anyhow::Result<()> {
    let mut compressor = factory.compressor();
    for (node, (list, properties)) in lists.iter().enumerate() {
        let mut targets = list.clone();
        let mut properties = properties.clone();
        compressor.compress(node as u64, &mut targets, &mut properties)?;
    }
    Ok(())
}

/// Streams all property values of `node`.
pub fn collect_properties<P: AdjacencyProperties>(properties: &P, node: u64) -> Vec<u64> {
    let mut cursor = properties.property_cursor(node);
    let mut values = Vec::new();
    while cursor.has_next() {
        values.push(cursor.next());
    }
    values
}

/// The sorted deduplicated version of `targets`.
pub fn sorted_unique(targets: &[u64]) -> Vec<u64> {
    let mut sorted: Vec<u64> = targets.to_vec();
    sorted.sort_unstable();
    sorted.dedup();
    sorted
}

/// Packed configurations exercised by the round-trip suites.
pub const PACKING_STRATEGIES: [PackingStrategy; 4] = [
    PackingStrategy::PackedTail,
    PackingStrategy::VarLongTail,
    PackingStrategy::BlockAlignedTail,
    PackingStrategy::InlinedHeadPackedTail,
];

/// The degree grid of the round-trip suites: empty, single, both sides of
/// the block boundaries, and a large list.
pub const DEGREES: [usize; 9] = [0, 1, 2, 63, 64, 65, 127, 128, 1000];
