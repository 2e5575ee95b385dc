/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use super::{AdjacencyCursor, NOT_FOUND};
use crate::encoding::{decode_delta_chunk, BLOCK_SIZE};

/// A cursor over a delta-varlong neighbor list.
///
/// The byte stream is decoded 64 values at a time into the scratch block,
/// prefix-summing the deltas onto the last value of the previous chunk.
#[derive(Clone)]
pub struct VarLongCursor<'a> {
    data: &'a [u8],
    pos: usize,
    block: [u64; BLOCK_SIZE],
    idx: usize,
    block_len: usize,
    last_value: u64,
    to_decode: usize,
    size: usize,
}

impl<'a> VarLongCursor<'a> {
    /// Returns an exhausted cursor bound to no list.
    pub(crate) fn empty() -> Self {
        Self {
            data: &[],
            pos: 0,
            block: [0; BLOCK_SIZE],
            idx: 0,
            block_len: 0,
            last_value: 0,
            to_decode: 0,
            size: 0,
        }
    }

    /// Rebinds this cursor to a list of `degree` values starting at the
    /// beginning of `data`.
    pub(crate) fn init(&mut self, data: &'a [u8], degree: usize) {
        self.data = data;
        self.pos = 0;
        self.idx = 0;
        self.block_len = 0;
        self.last_value = 0;
        self.to_decode = degree;
        self.size = degree;
        if degree > 0 {
            self.refill();
        }
    }

    fn refill(&mut self) {
        debug_assert!(self.to_decode > 0);
        let chunk = self.to_decode.min(BLOCK_SIZE);
        self.last_value = decode_delta_chunk(
            self.data,
            &mut self.pos,
            self.last_value,
            &mut self.block[..chunk],
        );
        self.to_decode -= chunk;
        self.idx = 0;
        self.block_len = chunk;
    }
}

impl AdjacencyCursor for VarLongCursor<'_> {
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
