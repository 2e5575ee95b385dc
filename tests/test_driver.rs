/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

mod common;

use adjpack::prelude::*;
use anyhow::Result;
use common::*;

const NODE_COUNT: u64 = 5000;

/// A deterministic pseudo-random neighbor list for `node`: degrees vary
/// from 0 to ~600, crossing the mixed threshold, with duplicates thrown in.
fn fill_targets(node: u64, targets: &mut Vec<u64>) {
    let degree = (node.wrapping_mul(0x9E37_79B9_7F4A_7C15) % 601) as usize;
    let mut state = node.wrapping_mul(0xA24B_AED4_963E_E407).wrapping_add(1);
    for _ in 0..degree {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        targets.push(state % (1 << 34));
    }
    // Some parallel edges.
    if degree > 10 {
        let duplicate = targets[3];
        targets.push(duplicate);
        targets.push(duplicate);
    }
}

#[test]
fn parallel_build_matches_sequential_build() -> Result<()> {
    env_logger::builder().is_test(true).try_init().ok();
    let config = CompressorConfig::topology(Aggregation::Single);

    let parallel = MixedCompressorFactory::new(
        NODE_COUNT as usize,
        config.clone(),
        MemoryTracker::empty(),
        MemoryTracker::empty(),
    );
    par_compress(&parallel, NODE_COUNT, |node, targets, _| {
        fill_targets(node, targets)
    })?;
    let (parallel_list, _) = parallel.build()?;

    let sequential = MixedCompressorFactory::new(
        NODE_COUNT as usize,
        config,
        MemoryTracker::empty(),
        MemoryTracker::empty(),
    );
    {
        let mut compressor = sequential.compressor();
        let mut targets = Vec::new();
        for node in 0..NODE_COUNT {
            targets.clear();
            fill_targets(node, &mut targets);
            compressor.compress(node, &mut targets, &mut [])?;
        }
    }
    let (sequential_list, _) = sequential.build()?;

    assert_eq!(parallel_list.node_count(), sequential_list.node_count());
    for node in 0..NODE_COUNT {
        assert_eq!(
            parallel_list.degree(node),
            sequential_list.degree(node),
            "node {}",
            node
        );
        assert_eq!(
            collect_neighbors(&parallel_list, node),
            collect_neighbors(&sequential_list, node),
            "node {}",
            node
        );
    }
    Ok(())
}

#[test]
fn parallel_build_with_full_tracking() -> Result<()> {
    let factory = VarLongCompressorFactory::new(
        1000,
        CompressorConfig::topology(Aggregation::Single),
        MemoryTracker::full(),
    );
    par_compress(&factory, 1000, |node, targets, _| {
        targets.extend((0..node % 50).map(|k| node + k))
    })?;
    let (list, _) = factory.build()?;
    let info = list.memory_info();
    // 1000 nodes, 980 of them non-empty (degree node % 50 > 0).
    assert_eq!(info.heap_allocations.total(), 980);
    assert!(info.bytes_on_heap > 0);
    assert_eq!(info.page_sizes.total() as usize, info.page_count);
    assert!(info.blocks.is_none());
    Ok(())
}

#[test]
fn parallel_build_with_properties() -> Result<()> {
    let node_count = 800u64;
    let factory = VarLongCompressorFactory::new(
        node_count as usize,
        CompressorConfig::with_properties(vec![Aggregation::Sum, Aggregation::Max]),
        MemoryTracker::empty(),
    );
    par_compress(&factory, node_count, |node, targets, properties| {
        for k in 0..node % 40 {
            let target = node + 7 * k;
            targets.push(target);
            properties[0].push((target as f64).to_bits());
            properties[1].push((k as f64).to_bits());
        }
    })?;
    let (list, properties) = factory.build()?;
    assert_eq!(properties.len(), 2);
    for node in 0..node_count {
        let neighbors = collect_neighbors(&list, node);
        assert_eq!(neighbors.len(), (node % 40) as usize);
        let sums = collect_properties(&properties[0], node);
        for (neighbor, sum) in neighbors.iter().zip(sums) {
            assert_eq!(f64::from_bits(sum), *neighbor as f64);
        }
    }
    Ok(())
}
