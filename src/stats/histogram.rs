/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use std::sync::Arc;

/// An exact integer histogram over `[0, upper_bound]`.
///
/// Values above the upper bound are clamped into the top bucket. The count
/// array grows lazily up to the bound, so a histogram with a large bound
/// costs memory proportional to the largest value actually recorded.
///
/// Percentiles use the nearest-rank definition: `percentile(p)` is the
/// smallest recorded value whose cumulative count reaches
/// `ceil(p / 100 · total)` (at least one).
///
/// # Examples
///
/// ```
/// use adjpack::stats::BoundedHistogram;
///
/// let mut histogram = BoundedHistogram::new(64);
/// histogram.record(2);
/// histogram.record(2);
/// histogram.record(10);
/// assert_eq!(histogram.total(), 3);
/// assert_eq!(histogram.median(), 2);
/// assert_eq!(histogram.max(), 10);
/// ```
#[derive(Clone, Debug)]
pub struct BoundedHistogram {
    counts: Vec<u64>,
    upper_bound: usize,
    total: u64,
}

impl BoundedHistogram {
    /// Creates an empty histogram over `[0, upper_bound]`.
    pub fn new(upper_bound: usize) -> Self {
        Self {
            counts: Vec::new(),
            upper_bound,
            total: 0,
        }
    }

    /// Returns the inclusive upper bound.
    pub fn upper_bound(&self) -> usize {
        self.upper_bound
    }

    /// Records one occurrence of `value`, clamped to the upper bound.
    pub fn record(&mut self, value: u64) {
        self.record_count(value, 1);
    }

    /// Records `count` occurrences of `value`, clamped to the upper bound.
    pub fn record_count(&mut self, value: u64, count: u64) {
        if count == 0 {
            return;
        }
        let index = (value as usize).min(self.upper_bound);
        if index >= self.counts.len() {
            self.counts.resize(index + 1, 0);
        }
        self.counts[index] += count;
        self.total += count;
    }

    /// Returns the number of recorded occurrences of `value`.
    pub fn frequency(&self, value: u64) -> u64 {
        let index = (value as usize).min(self.upper_bound);
        self.counts.get(index).copied().unwrap_or(0)
    }

    /// Returns the total number of recorded values.
    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Returns the smallest recorded value, or 0 if the histogram is empty.
    pub fn min(&self) -> u64 {
        min_of(&self.counts)
    }

    /// Returns the largest recorded value, or 0 if the histogram is empty.
    pub fn max(&self) -> u64 {
        max_of(&self.counts)
    }

    /// Returns the mean of the recorded values, or 0 if the histogram is
    /// empty.
    pub fn mean(&self) -> f64 {
        mean_of(&self.counts, self.total)
    }

    /// Returns the nearest-rank percentile `p` ∈ [0, 100].
    pub fn percentile(&self, p: f64) -> u64 {
        percentile_of(&self.counts, self.total, p)
    }

    /// Returns the median, i.e. the 50th percentile.
    pub fn median(&self) -> u64 {
        self.percentile(50.0)
    }

    /// Returns the population standard deviation of the recorded values, or
    /// 0 if the histogram is empty.
    pub fn std_dev(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        let mean = self.mean();
        let mut sum = 0.0;
        for (value, &count) in self.counts.iter().enumerate() {
            if count > 0 {
                let diff = value as f64 - mean;
                sum += diff * diff * count as f64;
            }
        }
        (sum / self.total as f64).sqrt()
    }

    /// Forgets all recorded values.
    pub fn reset(&mut self) {
        self.counts.clear();
        self.total = 0;
    }

    /// Adds all values recorded by `other`.
    pub fn add(&mut self, other: &Self) {
        self.upper_bound = self.upper_bound.max(other.upper_bound);
        for (value, &count) in other.counts.iter().enumerate() {
            self.record_count(value as u64, count);
        }
    }

    /// Returns a read-only snapshot.
    pub fn snapshot(&self) -> ImmutableHistogram {
        let trimmed = self.counts.len() - self.counts.iter().rev().take_while(|&&c| c == 0).count();
        ImmutableHistogram {
            counts: self.counts[..trimmed].into(),
            total: self.total,
        }
    }
}

/// A read-only histogram snapshot with summary accessors and an exact
/// merge.
///
/// The default value is the empty histogram: every summary is zero.
#[derive(Clone, Debug)]
pub struct ImmutableHistogram {
    counts: Arc<[u64]>,
    total: u64,
}

impl Default for ImmutableHistogram {
    fn default() -> Self {
        Self {
            counts: Vec::new().into(),
            total: 0,
        }
    }
}

impl ImmutableHistogram {
    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    pub fn min(&self) -> u64 {
        min_of(&self.counts)
    }

    pub fn max(&self) -> u64 {
        max_of(&self.counts)
    }

    pub fn mean(&self) -> f64 {
        mean_of(&self.counts, self.total)
    }

    pub fn percentile(&self, p: f64) -> u64 {
        percentile_of(&self.counts, self.total, p)
    }

    pub fn p50(&self) -> u64 {
        self.percentile(50.0)
    }

    pub fn p75(&self) -> u64 {
        self.percentile(75.0)
    }

    pub fn p90(&self) -> u64 {
        self.percentile(90.0)
    }

    pub fn p95(&self) -> u64 {
        self.percentile(95.0)
    }

    pub fn p99(&self) -> u64 {
        self.percentile(99.0)
    }

    pub fn p999(&self) -> u64 {
        self.percentile(99.9)
    }

    /// Returns a histogram holding the values of both.
    pub fn merge(&self, other: &Self) -> Self {
        let mut counts = vec![0; self.counts.len().max(other.counts.len())];
        for (slot, &count) in counts.iter_mut().zip(self.counts.iter()) {
            *slot += count;
        }
        for (slot, &count) in counts.iter_mut().zip(other.counts.iter()) {
            *slot += count;
        }
        Self {
            counts: counts.into(),
            total: self.total + other.total,
        }
    }
}

fn min_of(counts: &[u64]) -> u64 {
    counts
        .iter()
        .position(|&count| count > 0)
        .unwrap_or(0) as u64
}

fn max_of(counts: &[u64]) -> u64 {
    counts
        .iter()
        .rposition(|&count| count > 0)
        .unwrap_or(0) as u64
}

fn mean_of(counts: &[u64], total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let sum: f64 = counts
        .iter()
        .enumerate()
        .map(|(value, &count)| value as f64 * count as f64)
        .sum();
    sum / total as f64
}

fn percentile_of(counts: &[u64], total: u64, p: f64) -> u64 {
    if total == 0 {
        return 0;
    }
    let rank = ((p / 100.0 * total as f64).ceil() as u64).clamp(1, total);
    let mut cumulative = 0;
    for (value, &count) in counts.iter().enumerate() {
        cumulative += count;
        if cumulative >= rank {
            return value as u64;
        }
    }
    max_of(counts)
}
