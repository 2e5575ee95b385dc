/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! The encoding strategies.
//!
//! Encoders consume a delta-encoded neighbor list (first absolute value
//! followed by positive deltas) and write a compressed block into page
//! storage, returning its offset. All scratch buffers are reused across
//! calls.
//!
//! The bit-packed layouts share a common shape:
//!
//! ```text
//! [ header: one width byte per packed block ]
//! [ varlong-encoded first value            (inlined-head only) ]
//! [ pad up to an 8-byte boundary ]
//! [ packed block 0 | packed block 1 | ... ]
//! [ varlong-encoded tail deltas            (varlong-tail only) ]
//! [ pad up to an 8-byte boundary ]
//! ```
//!
//! The total allocation size is rounded up to 8 bytes, so packed data stays
//! 8-byte aligned inside its page. The compressed block carries no degree
//! field: the degree table is authoritative and decoders derive the block
//! count from it.

use super::{align8, packed_block_count, PackingStrategy};
use crate::allocator::{Address, AllocationError, BytePage, LocalAllocator};
use crate::encoding::{bits_needed, bytes_needed, encode_into, encode_slice, pack, BLOCK_SIZE};
use crate::stats::MemoryTracker;

/// Encodes a delta list as a plain varlong byte sequence.
pub(crate) struct VarLongEncoder<'a> {
    bytes: LocalAllocator<'a, BytePage>,
    scratch: Vec<u8>,
}

impl<'a> VarLongEncoder<'a> {
    pub(crate) fn new(bytes: LocalAllocator<'a, BytePage>) -> Self {
        Self {
            bytes,
            scratch: Vec::new(),
        }
    }

    /// Writes the list and returns its offset.
    pub(crate) fn encode(
        &mut self,
        values: &[u64],
        tracker: &MemoryTracker,
    ) -> Result<u64, AllocationError> {
        debug_assert!(!values.is_empty());
        self.scratch.clear();
        encode_slice(values, &mut self.scratch);
        let offset = self.bytes.insert(&self.scratch)?;
        tracker.record_heap_allocation(self.scratch.len());
        Ok(offset)
    }
}

/// Encodes a delta list with one of the bit-packed layouts.
pub(crate) struct PackedEncoder<'a> {
    strategy: PackingStrategy,
    pages: LocalAllocator<'a, Address>,
    widths: Vec<u8>,
    scratch: Vec<u8>,
    padded: [u64; BLOCK_SIZE],
}

impl<'a> PackedEncoder<'a> {
    pub(crate) fn new(strategy: PackingStrategy, pages: LocalAllocator<'a, Address>) -> Self {
        Self {
            strategy,
            pages,
            widths: Vec::new(),
            scratch: Vec::new(),
            padded: [0; BLOCK_SIZE],
        }
    }

    /// Writes the list and returns its offset.
    pub(crate) fn encode(
        &mut self,
        values: &[u64],
        tracker: &MemoryTracker,
    ) -> Result<u64, AllocationError> {
        debug_assert!(!values.is_empty());
        match self.strategy {
            PackingStrategy::PackedTail => self.assemble_packed_tail(values, tracker),
            PackingStrategy::VarLongTail => self.assemble_varlong_tail(values, tracker),
            PackingStrategy::BlockAlignedTail => self.assemble_block_aligned(values, tracker),
            PackingStrategy::InlinedHeadPackedTail => self.assemble_inlined_head(values, tracker),
        }
        let header_bytes = self.widths.len();
        tracker.record_header_allocation(header_bytes);
        tracker.record_header_bits(8 * header_bytes);
        let offset = self.pages.insert(&self.scratch)?;
        tracker.record_native_allocation(self.scratch.len());
        Ok(offset)
    }

    /// Computes the per-block widths of `chunks` and lays out the header.
    fn begin(&mut self, chunks: std::slice::Chunks<'_, u64>, tracker: &MemoryTracker) {
        self.widths.clear();
        for chunk in chunks {
            self.widths.push(bits_needed(chunk));
            tracker.record_block(chunk);
        }
        self.scratch.clear();
        self.scratch.extend_from_slice(&self.widths);
    }

    /// Packs `chunks` after the current scratch content, 8-byte aligned,
    /// with the final partial chunk (if any) packed for just its values.
    fn pack_chunks(&mut self, chunks: std::slice::Chunks<'_, u64>) {
        let mut position = align8(self.scratch.len());
        for (chunk, &width) in chunks.zip(self.widths.iter()) {
            let needed = bytes_needed(width, chunk.len());
            self.scratch.resize(position + needed, 0);
            pack(width, chunk, &mut self.scratch[position..position + needed]);
            position += needed;
        }
        self.scratch.resize(align8(position), 0);
    }

    fn assemble_packed_tail(&mut self, values: &[u64], tracker: &MemoryTracker) {
        self.begin(values.chunks(BLOCK_SIZE), tracker);
        self.pack_chunks(values.chunks(BLOCK_SIZE));
    }

    fn assemble_varlong_tail(&mut self, values: &[u64], tracker: &MemoryTracker) {
        let packed_values = (values.len() / BLOCK_SIZE) * BLOCK_SIZE;
        let (packed, tail) = values.split_at(packed_values);
        self.begin(packed.chunks(BLOCK_SIZE), tracker);
        self.pack_chunks(packed.chunks(BLOCK_SIZE));
        encode_slice(tail, &mut self.scratch);
        let total = align8(self.scratch.len());
        self.scratch.resize(total, 0);
    }

    fn assemble_block_aligned(&mut self, values: &[u64], tracker: &MemoryTracker) {
        self.begin(values.chunks(BLOCK_SIZE), tracker);
        let mut position = align8(self.scratch.len());
        for (chunk, &width) in values.chunks(BLOCK_SIZE).zip(self.widths.iter()) {
            // Every block is stored as a full 64 values; the tail is padded
            // with zero deltas, hidden by the degree bound at read time.
            let block: &[u64] = if chunk.len() == BLOCK_SIZE {
                chunk
            } else {
                self.padded[..chunk.len()].copy_from_slice(chunk);
                self.padded[chunk.len()..].fill(0);
                &self.padded
            };
            let needed = bytes_needed(width, BLOCK_SIZE);
            self.scratch.resize(position + needed, 0);
            pack(width, block, &mut self.scratch[position..position + needed]);
            position += needed;
        }
        self.scratch.resize(align8(position), 0);
    }

    fn assemble_inlined_head(&mut self, values: &[u64], tracker: &MemoryTracker) {
        let (head, tail) = values.split_first().unwrap();
        self.widths.clear();
        if tail.is_empty() {
            // A degree-1 list still stores one header byte for its empty
            // tail block.
            self.widths.push(0);
        } else {
            for chunk in tail.chunks(BLOCK_SIZE) {
                self.widths.push(bits_needed(chunk));
                tracker.record_block(chunk);
            }
        }
        debug_assert_eq!(
            self.widths.len(),
            packed_block_count(self.strategy, values.len())
        );
        self.scratch.clear();
        self.scratch.extend_from_slice(&self.widths);
        encode_into(*head, &mut self.scratch);
        self.pack_chunks(tail.chunks(BLOCK_SIZE));
    }
}
