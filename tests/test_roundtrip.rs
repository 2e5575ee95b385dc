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
use rand::rngs::SmallRng;
use rand::SeedableRng;

fn degree_grid_lists() -> Vec<Vec<u64>> {
    let mut rng = SmallRng::seed_from_u64(0x0DDC0FFE);
    DEGREES
        .iter()
        .map(|&degree| random_sorted_unique(&mut rng, degree, 1 << 40))
        .collect()
}

fn check_round_trip<L: AdjacencyList>(list: &L, expected: &[Vec<u64>]) {
    assert_eq!(list.node_count(), expected.len());
    for (node, targets) in expected.iter().enumerate() {
        let node = node as u64;
        assert_eq!(list.degree(node), targets.len(), "node {}", node);
        assert_eq!(
            &collect_neighbors(list, node),
            targets,
            "node {}",
            node
        );
        let mut cursor = list.adjacency_cursor(node);
        assert_eq!(cursor.size(), targets.len());
        for _ in 0..targets.len() {
            cursor.next();
        }
        assert_eq!(cursor.next(), NOT_FOUND);
        assert_eq!(cursor.next(), NOT_FOUND);
    }
}

#[test]
fn varlong_round_trip() -> Result<()> {
    let lists = degree_grid_lists();
    let factory = VarLongCompressorFactory::new(
        lists.len(),
        CompressorConfig::default(),
        MemoryTracker::empty(),
    );
    compress_all(&factory, &lists)?;
    let (list, _) = factory.build()?;
    check_round_trip(&list, &lists);
    Ok(())
}

#[test]
fn uncompressed_round_trip() -> Result<()> {
    let lists = degree_grid_lists();
    let factory = UncompressedCompressorFactory::new(
        lists.len(),
        CompressorConfig::default(),
        MemoryTracker::empty(),
    );
    compress_all(&factory, &lists)?;
    let (list, _) = factory.build()?;
    check_round_trip(&list, &lists);
    Ok(())
}

#[test]
fn packed_round_trip_all_strategies() -> Result<()> {
    let lists = degree_grid_lists();
    for strategy in PACKING_STRATEGIES {
        let config = CompressorConfig {
            strategy,
            ..CompressorConfig::default()
        };
        let factory =
            PackedCompressorFactory::new(lists.len(), config, MemoryTracker::empty());
        compress_all(&factory, &lists)?;
        let (list, _) = factory.build()?;
        assert_eq!(list.strategy(), strategy);
        check_round_trip(&list, &lists);
    }
    Ok(())
}

#[test]
fn mixed_round_trip() -> Result<()> {
    let lists = degree_grid_lists();
    let factory = MixedCompressorFactory::new(
        lists.len(),
        CompressorConfig::default(),
        MemoryTracker::empty(),
        MemoryTracker::empty(),
    );
    compress_all(&factory, &lists)?;
    let (list, _) = factory.build()?;
    check_round_trip(&list, &lists);
    Ok(())
}

#[test]
fn duplicates_are_aggregated() -> Result<()> {
    let mut rng = SmallRng::seed_from_u64(42);
    let mut lists = Vec::new();
    for &degree in &DEGREES {
        let unique = random_sorted_unique(&mut rng, degree, 1 << 32);
        // Repeat every target three times, unsorted.
        let mut targets: Vec<u64> = unique.iter().flat_map(|&t| [t, t, t]).collect();
        targets.reverse();
        lists.push(targets);
    }
    for strategy in PACKING_STRATEGIES {
        let config = CompressorConfig {
            aggregations: vec![Aggregation::Sum],
            strategy,
            ..CompressorConfig::default()
        };
        let factory =
            PackedCompressorFactory::new(lists.len(), config, MemoryTracker::empty());
        compress_all(&factory, &lists)?;
        let (list, _) = factory.build()?;
        for (node, targets) in lists.iter().enumerate() {
            let expected = sorted_unique(targets);
            assert_eq!(list.degree(node as u64), expected.len());
            assert_eq!(collect_neighbors(&list, node as u64), expected);
        }
    }
    Ok(())
}

#[test]
fn none_preserves_parallel_edges() -> Result<()> {
    let targets = vec![7u64, 3, 7, 7, 1];
    let factory = VarLongCompressorFactory::new(
        1,
        CompressorConfig::topology(Aggregation::None),
        MemoryTracker::empty(),
    );
    compress_all(&factory, std::slice::from_ref(&targets))?;
    let (list, _) = factory.build()?;
    assert_eq!(list.degree(0), 5);
    assert_eq!(collect_neighbors(&list, 0), vec![1, 3, 7, 7, 7]);
    Ok(())
}

#[test]
fn empty_source_consumes_nothing() -> Result<()> {
    // Source 7 has no targets at all: degree 0, an empty cursor, no pages.
    let lists: Vec<Vec<u64>> = (0..8).map(|_| Vec::new()).collect();
    let factory = VarLongCompressorFactory::new(
        lists.len(),
        CompressorConfig::default(),
        MemoryTracker::empty(),
    );
    compress_all(&factory, &lists)?;
    let (list, _) = factory.build()?;
    assert_eq!(list.degree(7), 0);
    let mut cursor = list.adjacency_cursor(7);
    assert!(!cursor.has_next());
    assert_eq!(cursor.next(), NOT_FOUND);
    let info = list.memory_info();
    assert_eq!(info.page_count, 0);
    assert_eq!(info.bytes_on_heap, 0);
    assert_eq!(info.bytes_off_heap, 0);
    Ok(())
}

#[test]
fn inlined_head_single_target() -> Result<()> {
    // One header byte of width 0 plus varlong(42): an 8-byte allocation.
    let config = CompressorConfig {
        strategy: PackingStrategy::InlinedHeadPackedTail,
        ..CompressorConfig::default()
    };
    let factory = PackedCompressorFactory::new(1, config, MemoryTracker::full());
    compress_all(&factory, &[vec![42]])?;
    let (list, _) = factory.build()?;
    assert_eq!(collect_neighbors(&list, 0), vec![42]);
    let mut cursor = list.adjacency_cursor(0);
    assert_eq!(cursor.next(), 42);
    assert_eq!(cursor.next(), NOT_FOUND);
    let info = list.memory_info();
    assert_eq!(info.native_allocations.max(), 8);
    assert_eq!(info.header_allocations.max(), 1);
    Ok(())
}

#[test]
fn packed_tail_block_boundary() -> Result<()> {
    // 128 consecutive ids: two full blocks of width 1 (all deltas are one),
    // two header bytes, 16 bytes of packed data.
    let targets: Vec<u64> = (0..=127).collect();
    let config = CompressorConfig {
        strategy: PackingStrategy::PackedTail,
        ..CompressorConfig::default()
    };
    let factory = PackedCompressorFactory::new(1, config, MemoryTracker::full());
    compress_all(&factory, std::slice::from_ref(&targets))?;
    let (list, _) = factory.build()?;
    assert_eq!(collect_neighbors(&list, 0), targets);
    let info = list.memory_info();
    // align8(2 header bytes) + 2 * 8 packed bytes.
    assert_eq!(info.native_allocations.max(), 24);
    assert_eq!(info.header_allocations.max(), 2);
    let blocks = info.blocks.expect("block statistics were tracked");
    assert_eq!(blocks.block_count, 2);
    assert_eq!(blocks.max_bits.max(), 1);
    Ok(())
}

/// Round-trips every strategy over every degree in `0..=600`, crossing
/// every block-boundary and threshold case one by one.
#[cfg_attr(feature = "slow_tests", test)]
#[cfg_attr(not(feature = "slow_tests"), allow(dead_code))]
fn exhaustive_degrees_round_trip() -> Result<()> {
    let mut rng = SmallRng::seed_from_u64(0xE4A0_5717);
    for degree in 0..=600usize {
        let targets = random_sorted_unique(&mut rng, degree, 1 << 48);
        for strategy in PACKING_STRATEGIES {
            let config = CompressorConfig {
                strategy,
                ..CompressorConfig::default()
            };
            let factory = PackedCompressorFactory::new(1, config, MemoryTracker::empty());
            compress_all(&factory, std::slice::from_ref(&targets))?;
            let (list, _) = factory.build()?;
            assert_eq!(
                collect_neighbors(&list, 0),
                targets,
                "strategy {:?}, degree {}",
                strategy,
                degree
            );
        }
        let factory = MixedCompressorFactory::new(
            1,
            CompressorConfig::default(),
            MemoryTracker::empty(),
            MemoryTracker::empty(),
        );
        compress_all(&factory, std::slice::from_ref(&targets))?;
        let (list, _) = factory.build()?;
        assert_eq!(collect_neighbors(&list, 0), targets, "mixed, degree {}", degree);
    }
    Ok(())
}

#[test]
fn varlong_tail_at_one_hundred() -> Result<()> {
    // One packed block of width 1 plus 36 single-byte varlong deltas:
    // align8(1) + 8 + 36 = 52, aligned up to 56.
    let targets: Vec<u64> = (0..100).collect();
    let config = CompressorConfig {
        strategy: PackingStrategy::VarLongTail,
        ..CompressorConfig::default()
    };
    let factory = PackedCompressorFactory::new(1, config, MemoryTracker::full());
    compress_all(&factory, std::slice::from_ref(&targets))?;
    let (list, _) = factory.build()?;
    assert_eq!(collect_neighbors(&list, 0), targets);
    let info = list.memory_info();
    assert_eq!(info.native_allocations.max(), 56);
    assert_eq!(info.header_allocations.max(), 1);
    Ok(())
}
