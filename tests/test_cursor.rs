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

/// Runs the cursor laws against every list implementation over the same
/// neighbor list, which crosses several block boundaries.
fn check_cursor_laws<L: AdjacencyList>(list: &L, targets: &[u64]) {
    let node = 0u64;
    let degree = targets.len();
    assert_eq!(list.degree(node), degree);

    // remaining() decreases exactly by one per next() until it reaches 0.
    let mut cursor = list.adjacency_cursor(node);
    assert_eq!(cursor.size(), degree);
    for consumed in 0..degree {
        assert_eq!(cursor.remaining(), degree - consumed);
        assert!(cursor.has_next());
        assert_eq!(cursor.next(), targets[consumed]);
    }
    assert_eq!(cursor.remaining(), 0);
    assert!(!cursor.has_next());
    assert_eq!(cursor.next(), NOT_FOUND);
    assert_eq!(cursor.next(), NOT_FOUND);

    // peek() is idempotent and agrees with next().
    let mut cursor = list.adjacency_cursor(node);
    for &expected in targets {
        assert_eq!(cursor.peek(), cursor.peek());
        assert_eq!(cursor.peek(), expected);
        assert_eq!(cursor.next(), expected);
    }
    assert_eq!(cursor.peek(), NOT_FOUND);

    // advance_by(n) equals n + 1 calls to next().
    for n in [0usize, 1, 5, 63, 64, 65, 200] {
        if n < degree {
            let mut cursor = list.adjacency_cursor(node);
            assert_eq!(cursor.advance_by(n), targets[n], "n = {}", n);
            if n + 1 < degree {
                assert_eq!(cursor.next(), targets[n + 1]);
            }
        } else {
            let mut cursor = list.adjacency_cursor(node);
            assert_eq!(cursor.advance_by(n), NOT_FOUND);
            assert_eq!(cursor.next(), NOT_FOUND);
        }
    }

    // advance(t) returns the first value >= t and equals skip_until(t - 1).
    for probe_index in [0usize, 1, degree / 2, degree.saturating_sub(1)] {
        let target = targets[probe_index];
        let mut cursor = list.adjacency_cursor(node);
        assert_eq!(cursor.advance(target), target);
        if target > 0 {
            let mut cursor = list.adjacency_cursor(node);
            assert_eq!(cursor.skip_until(target - 1), target);
        }
        // skip_until(t) yields the first value strictly greater.
        let mut cursor = list.adjacency_cursor(node);
        let expected_after = targets.get(probe_index + 1).copied().unwrap_or(NOT_FOUND);
        assert_eq!(cursor.skip_until(target), expected_after);
    }
    let mut cursor = list.adjacency_cursor(node);
    assert_eq!(cursor.advance(targets[degree - 1] + 1), NOT_FOUND);

    // copy_from() snapshots a position: both cursors continue identically.
    let mut cursor = list.adjacency_cursor(node);
    for _ in 0..degree / 2 {
        cursor.next();
    }
    let mut snapshot = list.raw_adjacency_cursor();
    snapshot.copy_from(&cursor);
    assert_eq!(snapshot.remaining(), cursor.remaining());
    for _ in degree / 2..degree {
        assert_eq!(snapshot.next(), cursor.next());
    }

    // Cursor reuse re-initializes in place.
    let mut cursor = list.adjacency_cursor(node);
    for _ in 0..degree.min(7) {
        cursor.next();
    }
    list.adjacency_cursor_reuse(&mut cursor, node);
    assert_eq!(cursor.remaining(), degree);
    assert_eq!(cursor.next(), targets[0]);
}

fn probe_targets() -> Vec<u64> {
    let mut rng = SmallRng::seed_from_u64(0xAD1ACC);
    random_sorted_unique(&mut rng, 500, 1 << 44)
}

#[test]
fn varlong_cursor_laws() -> Result<()> {
    let targets = probe_targets();
    let factory = VarLongCompressorFactory::new(
        1,
        CompressorConfig::default(),
        MemoryTracker::empty(),
    );
    compress_all(&factory, std::slice::from_ref(&targets))?;
    let (list, _) = factory.build()?;
    check_cursor_laws(&list, &targets);
    Ok(())
}

#[test]
fn uncompressed_cursor_laws() -> Result<()> {
    let targets = probe_targets();
    let factory = UncompressedCompressorFactory::new(
        1,
        CompressorConfig::default(),
        MemoryTracker::empty(),
    );
    compress_all(&factory, std::slice::from_ref(&targets))?;
    let (list, _) = factory.build()?;
    check_cursor_laws(&list, &targets);
    Ok(())
}

#[test]
fn packed_cursor_laws_all_strategies() -> Result<()> {
    let targets = probe_targets();
    for strategy in PACKING_STRATEGIES {
        let config = CompressorConfig {
            strategy,
            ..CompressorConfig::default()
        };
        let factory = PackedCompressorFactory::new(1, config, MemoryTracker::empty());
        compress_all(&factory, std::slice::from_ref(&targets))?;
        let (list, _) = factory.build()?;
        check_cursor_laws(&list, &targets);
    }
    Ok(())
}

#[test]
fn mixed_cursor_laws_both_branches() -> Result<()> {
    let mut rng = SmallRng::seed_from_u64(7);
    // One source per branch of the mixed list.
    let lists = vec![
        random_sorted_unique(&mut rng, 600, 1 << 40),
        random_sorted_unique(&mut rng, 500, 1 << 40),
    ];
    let factory = MixedCompressorFactory::new(
        lists.len(),
        CompressorConfig::default(),
        MemoryTracker::empty(),
        MemoryTracker::empty(),
    );
    compress_all(&factory, &lists)?;
    let (list, _) = factory.build()?;
    check_cursor_laws(&list, &lists[0]);
    for (node, targets) in lists.iter().enumerate() {
        assert_eq!(&collect_neighbors(&list, node as u64), targets);
    }
    Ok(())
}
