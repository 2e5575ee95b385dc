/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use super::{AdjacencyCursor, NOT_FOUND};
use crate::compress::{align8, packed_block_count, PackingStrategy};
use crate::encoding::{bytes_needed, decode_delta_chunk, unpack, varlong, BLOCK_SIZE};

/// A cursor over a bit-packed neighbor list.
///
/// The header bytes give each packed block's bit width; the number of
/// header bytes is derived from the degree with the same formula the packer
/// used. Blocks are unpacked on demand into the scratch block and
/// delta-decoded by a prefix sum seeded with the last value of the previous
/// block.
///
/// Under the inlined-head layout the first value is varlong-decoded at
/// initialization and placed in the last slot of the scratch block, with the
/// position pointing at it: the first advance returns it and the next
/// refill continues seamlessly with block 0 of the packed tail.
#[derive(Clone)]
pub struct PackedCursor<'a> {
    strategy: PackingStrategy,
    header: &'a [u8],
    data: &'a [u8],
    pos: usize,
    block_id: usize,
    packed_blocks: usize,
    block: [u64; BLOCK_SIZE],
    idx: usize,
    block_len: usize,
    last_value: u64,
    to_decode: usize,
    size: usize,
}

impl<'a> PackedCursor<'a> {
    /// Returns an exhausted cursor bound to no list.
    pub(crate) fn empty(strategy: PackingStrategy) -> Self {
        Self {
            strategy,
            header: &[],
            data: &[],
            pos: 0,
            block_id: 0,
            packed_blocks: 0,
            block: [0; BLOCK_SIZE],
            idx: 0,
            block_len: 0,
            last_value: 0,
            to_decode: 0,
            size: 0,
        }
    }

    /// Rebinds this cursor to a list of `degree` values whose compressed
    /// block starts at `in_page` inside `page`.
    pub(crate) fn init(
        &mut self,
        page: &'a [u8],
        in_page: usize,
        degree: usize,
        strategy: PackingStrategy,
    ) {
        self.strategy = strategy;
        self.size = degree;
        self.idx = 0;
        self.block_len = 0;
        self.last_value = 0;
        self.block_id = 0;
        self.pos = 0;
        if degree == 0 {
            self.header = &[];
            self.data = &[];
            self.packed_blocks = 0;
            self.to_decode = 0;
            return;
        }
        let data = &page[in_page..];
        let blocks = packed_block_count(strategy, degree);
        self.packed_blocks = blocks;
        self.header = &data[..blocks];
        let mut header_end = blocks;
        if strategy == PackingStrategy::InlinedHeadPackedTail {
            let head = varlong::decode(data, &mut header_end);
            self.block[BLOCK_SIZE - 1] = head;
            self.idx = BLOCK_SIZE - 1;
            self.block_len = BLOCK_SIZE;
            self.last_value = head;
            self.to_decode = degree - 1;
            self.data = &data[align8(header_end)..];
        } else {
            self.to_decode = degree;
            self.data = &data[align8(header_end)..];
            self.refill();
        }
    }

    /// Decompresses the next block into the scratch buffer.
    fn refill(&mut self) {
        debug_assert!(self.to_decode > 0);
        match self.strategy {
            PackingStrategy::PackedTail | PackingStrategy::InlinedHeadPackedTail => {
                let bits = self.header[self.block_id];
                let count = self.to_decode.min(BLOCK_SIZE);
                let bytes = bytes_needed(bits, count);
                unpack(
                    bits,
                    &self.data[self.pos..self.pos + bytes],
                    &mut self.block[..count],
                );
                self.pos += bytes;
                self.decode_deltas(count);
            }
            PackingStrategy::BlockAlignedTail => {
                // The tail block is stored as a full 64 values padded with
                // zero deltas; the degree bound hides the padding.
                let bits = self.header[self.block_id];
                let bytes = bytes_needed(bits, BLOCK_SIZE);
                unpack(bits, &self.data[self.pos..self.pos + bytes], &mut self.block);
                self.pos += bytes;
                let count = self.to_decode.min(BLOCK_SIZE);
                self.decode_deltas(count);
            }
            PackingStrategy::VarLongTail => {
                if self.block_id < self.packed_blocks {
                    let bits = self.header[self.block_id];
                    let bytes = bytes_needed(bits, BLOCK_SIZE);
                    unpack(bits, &self.data[self.pos..self.pos + bytes], &mut self.block);
                    self.pos += bytes;
                    self.decode_deltas(BLOCK_SIZE);
                } else {
                    // Past the packed blocks the remainder is a plain
                    // varlong delta stream.
                    let count = self.to_decode;
                    self.last_value = decode_delta_chunk(
                        self.data,
                        &mut self.pos,
                        self.last_value,
                        &mut self.block[..count],
                    );
                    self.idx = 0;
                    self.block_len = count;
                    self.to_decode = 0;
                    self.block_id += 1;
                }
            }
        }
    }

    /// Prefix-sums the first `count` freshly unpacked deltas.
    fn decode_deltas(&mut self, count: usize) {
        let mut last = self.last_value;
        for slot in &mut self.block[..count] {
            last += *slot;
            *slot = last;
        }
        self.last_value = last;
        self.idx = 0;
        self.block_len = count;
        self.to_decode -= count;
        self.block_id += 1;
    }
}

impl AdjacencyCursor for PackedCursor<'_> {
    fn size(&self) -> usize {
        self.size
    }

    fn remaining(&self) -> usize {
        self.block_len - self.idx + self.to_decode
    }

    fn next(&mut self) -> u64 {
        if self.idx == self.block_len {
            if self.to_decode == 0 {
                return NOT_FOUND;
            }
            self.refill();
        }
        let value = self.block[self.idx];
        self.idx += 1;
        value
    }

    fn peek(&mut self) -> u64 {
        if self.idx == self.block_len {
            if self.to_decode == 0 {
                return NOT_FOUND;
            }
            self.refill();
        }
        self.block[self.idx]
    }

    fn advance_by(&mut self, mut n: usize) -> u64 {
        loop {
            let available = self.block_len - self.idx;
            if n < available {
                self.idx += n;
                let value = self.block[self.idx];
                self.idx += 1;
                return value;
            }
            n -= available;
            self.idx = self.block_len;
            if self.to_decode == 0 {
                return NOT_FOUND;
            }
            self.refill();
        }
    }

    fn skip_until(&mut self, target: u64) -> u64 {
        loop {
            while self.idx < self.block_len {
                let value = self.block[self.idx];
                self.idx += 1;
                if value > target {
                    return value;
                }
            }
            if self.to_decode == 0 {
                return NOT_FOUND;
            }
            self.refill();
        }
    }

    fn advance(&mut self, target: u64) -> u64 {
        loop {
            while self.idx < self.block_len {
                let value = self.block[self.idx];
                self.idx += 1;
                if value >= target {
                    return value;
                }
            }
            if self.to_decode == 0 {
                return NOT_FOUND;
            }
            self.refill();
        }
    }

    fn copy_from(&mut self, other: &Self) {
        self.clone_from(other);
    }
}
