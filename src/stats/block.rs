/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use super::{BoundedHistogram, ImmutableHistogram};
use crate::encoding::BLOCK_SIZE;

/// Per-block compression statistics.
///
/// For every bit-packed block the per-value bit widths are collected into a
/// working histogram, from which a set of derived features is recorded into
/// aggregate histograms; a patched-frame-of-reference cost scan additionally
/// estimates how many bits a smaller width plus explicit exceptions would
/// save.
///
/// One instance per worker; [`add`](Self::add) merges workers into a single
/// aggregate at the end of a build.
pub struct BlockStatistics {
    block_count: u64,
    bits_per_value: BoundedHistogram,
    mean_bits: BoundedHistogram,
    median_bits: BoundedHistogram,
    std_dev_bits: BoundedHistogram,
    min_bits: BoundedHistogram,
    max_bits: BoundedHistogram,
    index_of_min_value: BoundedHistogram,
    index_of_max_value: BoundedHistogram,
    head_tail_diff_bits: BoundedHistogram,
    best_max_diff_bits: BoundedHistogram,
    pfor_exceptions: BoundedHistogram,
}

impl Default for BlockStatistics {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockStatistics {
    pub fn new() -> Self {
        Self {
            block_count: 0,
            bits_per_value: BoundedHistogram::new(64),
            mean_bits: BoundedHistogram::new(64),
            median_bits: BoundedHistogram::new(64),
            std_dev_bits: BoundedHistogram::new(64),
            min_bits: BoundedHistogram::new(64),
            max_bits: BoundedHistogram::new(64),
            index_of_min_value: BoundedHistogram::new(BLOCK_SIZE - 1),
            index_of_max_value: BoundedHistogram::new(BLOCK_SIZE - 1),
            head_tail_diff_bits: BoundedHistogram::new(64),
            best_max_diff_bits: BoundedHistogram::new(64),
            pfor_exceptions: BoundedHistogram::new(BLOCK_SIZE),
        }
    }

    /// Returns the number of blocks recorded.
    pub fn block_count(&self) -> u64 {
        self.block_count
    }

    /// Records the statistics of one block of delta values.
    pub fn record_block(&mut self, values: &[u64]) {
        if values.is_empty() {
            return;
        }
        self.block_count += 1;
        self.bits_per_value.reset();

        let mut min_bits = u32::MAX;
        let mut max_bits = 0u32;
        let mut index_of_min = 0;
        let mut index_of_max = 0;
        for (index, &value) in values.iter().enumerate() {
            let bits = u64::BITS - value.leading_zeros();
            self.bits_per_value.record(bits as u64);
            if bits < min_bits {
                min_bits = bits;
                index_of_min = index;
            }
            if bits > max_bits {
                max_bits = bits;
                index_of_max = index;
            }
        }

        self.mean_bits.record(self.bits_per_value.mean().round() as u64);
        self.median_bits.record(self.bits_per_value.median());
        self.std_dev_bits
            .record(self.bits_per_value.std_dev().round() as u64);
        self.min_bits.record(min_bits as u64);
        self.max_bits.record(max_bits as u64);
        self.index_of_min_value.record(index_of_min as u64);
        self.index_of_max_value.record(index_of_max as u64);

        let head_bits = u64::BITS - values[0].leading_zeros();
        let tail_max_bits = values[1..]
            .iter()
            .map(|&value| u64::BITS - value.leading_zeros())
            .max()
            .unwrap_or(0);
        self.head_tail_diff_bits
            .record(head_bits.saturating_sub(tail_max_bits) as u64);

        self.record_pfor(values.len() as u64, max_bits as u64);
    }

    /// Scans candidate widths below the block maximum: packing at a smaller
    /// width pays for each exception with its marker plus the width
    /// difference, except that a difference of a single bit needs no
    /// exception payload.
    fn record_pfor(&mut self, length: u64, max_bits: u64) {
        let mut best_cost = max_bits * length;
        let mut best_diff = 0;
        let mut best_exceptions = 0;
        let mut cumulative = 0;
        for bits in 0..max_bits {
            cumulative += self.bits_per_value.frequency(bits);
            let exceptions = length - cumulative;
            let exception_bits = if max_bits - bits == 1 {
                8
            } else {
                max_bits - bits + 8
            };
            let cost = bits * length + exceptions * exception_bits;
            if cost < best_cost {
                best_cost = cost;
                best_diff = max_bits - bits;
                best_exceptions = exceptions;
            }
        }
        self.best_max_diff_bits.record(best_diff);
        self.pfor_exceptions.record(best_exceptions);
    }

    /// Merges the aggregate histograms of `other` into this instance.
    pub fn add(&mut self, other: &Self) {
        self.block_count += other.block_count;
        self.mean_bits.add(&other.mean_bits);
        self.median_bits.add(&other.median_bits);
        self.std_dev_bits.add(&other.std_dev_bits);
        self.min_bits.add(&other.min_bits);
        self.max_bits.add(&other.max_bits);
        self.index_of_min_value.add(&other.index_of_min_value);
        self.index_of_max_value.add(&other.index_of_max_value);
        self.head_tail_diff_bits.add(&other.head_tail_diff_bits);
        self.best_max_diff_bits.add(&other.best_max_diff_bits);
        self.pfor_exceptions.add(&other.pfor_exceptions);
    }

    /// Returns a read-only snapshot of the aggregate histograms.
    pub fn snapshot(&self) -> BlockInfo {
        BlockInfo {
            block_count: self.block_count,
            mean_bits: self.mean_bits.snapshot(),
            median_bits: self.median_bits.snapshot(),
            std_dev_bits: self.std_dev_bits.snapshot(),
            min_bits: self.min_bits.snapshot(),
            max_bits: self.max_bits.snapshot(),
            index_of_min_value: self.index_of_min_value.snapshot(),
            index_of_max_value: self.index_of_max_value.snapshot(),
            head_tail_diff_bits: self.head_tail_diff_bits.snapshot(),
            best_max_diff_bits: self.best_max_diff_bits.snapshot(),
            pfor_exceptions: self.pfor_exceptions.snapshot(),
        }
    }
}

/// Read-only block-level statistics of a built adjacency list.
#[derive(Clone, Debug)]
pub struct BlockInfo {
    pub block_count: u64,
    pub mean_bits: ImmutableHistogram,
    pub median_bits: ImmutableHistogram,
    pub std_dev_bits: ImmutableHistogram,
    pub min_bits: ImmutableHistogram,
    pub max_bits: ImmutableHistogram,
    pub index_of_min_value: ImmutableHistogram,
    pub index_of_max_value: ImmutableHistogram,
    pub head_tail_diff_bits: ImmutableHistogram,
    pub best_max_diff_bits: ImmutableHistogram,
    pub pfor_exceptions: ImmutableHistogram,
}

impl BlockInfo {
    /// Merges the statistics of two lists.
    pub fn merge(&self, other: &Self) -> Self {
        Self {
            block_count: self.block_count + other.block_count,
            mean_bits: self.mean_bits.merge(&other.mean_bits),
            median_bits: self.median_bits.merge(&other.median_bits),
            std_dev_bits: self.std_dev_bits.merge(&other.std_dev_bits),
            min_bits: self.min_bits.merge(&other.min_bits),
            max_bits: self.max_bits.merge(&other.max_bits),
            index_of_min_value: self.index_of_min_value.merge(&other.index_of_min_value),
            index_of_max_value: self.index_of_max_value.merge(&other.index_of_max_value),
            head_tail_diff_bits: self.head_tail_diff_bits.merge(&other.head_tail_diff_bits),
            best_max_diff_bits: self.best_max_diff_bits.merge(&other.best_max_diff_bits),
            pfor_exceptions: self.pfor_exceptions.merge(&other.pfor_exceptions),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_block_features() {
        let mut statistics = BlockStatistics::new();
        // Head of 10 bits, tail deltas of one bit each.
        let mut block = [1u64; 64];
        block[0] = 1 << 9;
        statistics.record_block(&block);

        assert_eq!(statistics.block_count(), 1);
        assert_eq!(statistics.max_bits.max(), 10);
        assert_eq!(statistics.min_bits.max(), 1);
        assert_eq!(statistics.index_of_max_value.max(), 0);
        assert_eq!(statistics.head_tail_diff_bits.max(), 9);
        // Packing at one bit with a single 10-bit exception beats packing
        // everything at ten bits.
        assert_eq!(statistics.best_max_diff_bits.max(), 9);
        assert_eq!(statistics.pfor_exceptions.max(), 1);
    }

    #[test]
    fn merge_sums_blocks() {
        let mut a = BlockStatistics::new();
        let mut b = BlockStatistics::new();
        a.record_block(&[1; 64]);
        b.record_block(&[3; 64]);
        b.record_block(&[7; 64]);
        a.add(&b);
        assert_eq!(a.block_count(), 3);
        assert_eq!(a.max_bits.total(), 3);
    }
}
