/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! The shared degree and offset tables.
//!
//! Three arrays with one slot per source node: the post-aggregation degree,
//! the offset of the compressed neighbor block, and the offset shared by all
//! property streams. Workers process disjoint sources, so each slot is
//! written by exactly one thread; the slots are [`SyncCell`]s so that the
//! disjoint writes can happen through a shared reference without
//! synchronization.

use std::sync::Arc;

use sync_cell_slice::SyncCell;

/// Allocates a zero-filled boxed slice of sync cells.
fn sync_boxed<T: Copy + Default>(len: usize) -> Box<[SyncCell<T>]> {
    let boxed = vec![T::default(); len].into_boxed_slice();
    // SAFETY: SyncCell<T> is a transparent wrapper around Cell<T>, which is
    // a transparent wrapper around T, so the slice layouts coincide.
    unsafe { Box::from_raw(Box::into_raw(boxed) as *mut [SyncCell<T>]) }
}

/// Unwraps the cells of a boxed slice filled by [`sync_boxed`].
fn unwrap_cells<T: Copy>(cells: Box<[SyncCell<T>]>) -> Box<[T]> {
    // SAFETY: as in sync_boxed, the layouts coincide.
    unsafe { Box::from_raw(Box::into_raw(cells) as *mut [T]) }
}

/// The degree, adjacency-offset and property-offset tables shared by all
/// workers of a factory (and, for a mixed factory, by both branches).
pub(crate) struct SharedTables {
    degrees: Box<[SyncCell<u32>]>,
    adjacency_offsets: Box<[SyncCell<u64>]>,
    property_offsets: Box<[SyncCell<u64>]>,
}

impl SharedTables {
    pub(crate) fn new(node_count: usize) -> Self {
        Self {
            degrees: sync_boxed(node_count),
            adjacency_offsets: sync_boxed(node_count),
            property_offsets: sync_boxed(node_count),
        }
    }

    pub(crate) fn node_count(&self) -> usize {
        self.degrees.len()
    }

    /// Records the compression result for one source.
    ///
    /// Once written, a source's slots never change.
    pub(crate) fn record(&self, node: u64, degree: u32, adjacency_offset: u64, property_offset: u64) {
        let node = node as usize;
        // SAFETY: workers process disjoint sources, so each slot is written
        // by exactly one thread and read only after the build.
        unsafe {
            self.degrees[node].set(degree);
            self.adjacency_offsets[node].set(adjacency_offset);
            self.property_offsets[node].set(property_offset);
        }
    }

    /// Unwraps the tables into shareable read-only slices.
    pub(crate) fn into_parts(self) -> (Arc<[u32]>, Arc<[u64]>, Arc<[u64]>) {
        (
            unwrap_cells(self.degrees).into(),
            unwrap_cells(self.adjacency_offsets).into(),
            unwrap_cells(self.property_offsets).into(),
        )
    }
}
