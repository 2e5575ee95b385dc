/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Page-based bump allocation.
//!
//! Compressed adjacency data is stored in fixed-size [pages](Page) handed out
//! by a [`BumpAllocator`]. Each worker thread obtains a [`LocalAllocator`],
//! which bump-allocates inside a thread-local page and falls back to the
//! shared allocator only to obtain a new page, so the fast path is a pointer
//! bump plus an atomic counter in the worst case.
//!
//! Allocations are addressed by a 64-bit logical [offset](offset_in_pages)
//! combining a page index and an index inside the page. An allocation never
//! straddles a page boundary: requests larger than [`PAGE_SIZE`] get a
//! dedicated, exactly-sized page of their own.
//!
//! [`PositionalAllocator`] is the replay variant used to keep parallel
//! property streams aligned: it writes at offsets previously returned by the
//! allocator of the first stream, growing its own page array as needed.

mod address;
mod bump;

pub use address::Address;
pub use bump::{
    index_in_page, offset_in_pages, page_index, BumpAllocator, BytePage, HeapPage, LocalAllocator,
    Page, PositionalAllocator, WordPage, PAGE_MASK, PAGE_SHIFT, PAGE_SIZE,
};

use thiserror::Error;

/// Errors raised by page allocation.
///
/// Running out of native memory is the only allocation failure surfaced to
/// callers: a build that hits it cannot produce a partial result and should
/// be aborted, dropping the allocators.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocationError {
    /// Allocation of an off-heap page failed.
    #[error("allocation of an off-heap page of {0} bytes failed")]
    NativeAllocation(usize),
}
