/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use dsi_progress_logger::{concurrent_progress_logger, ProgressLog};
use rayon::prelude::*;

use super::{AdjacencyCompressor, AdjacencyCompressorFactory};

/// Compresses all sources of a graph in parallel.
///
/// The node range is split into chunks; each chunk is processed by one
/// worker holding its own compressor and scratch buffers. For every node the
/// supplier fills the target buffer (and one value buffer per property
/// stream, each of which must end up exactly as long as the target buffer);
/// buffers arrive cleared.
///
/// Sources are compressed in no particular order across chunks; offsets are
/// assigned in allocation order, so consumers must not assume any relation
/// between node ids and offsets.
pub fn par_compress<F, S>(factory: &F, node_count: u64, supplier: S) -> anyhow::Result<()>
where
    F: AdjacencyCompressorFactory,
    S: Fn(u64, &mut Vec<u64>, &mut [Vec<u64>]) + Sync,
{
    let streams = factory.property_streams();
    let chunk_size = (node_count as usize)
        .div_ceil(8 * num_cpus::get())
        .max(1024) as u64;

    let mut pl = concurrent_progress_logger![
        log_target = "adjpack::compress::driver",
        item_name = "node",
        local_speed = true,
        expected_updates = Some(node_count as usize),
    ];
    pl.start("Compressing adjacency lists in parallel...");

    let chunks: Vec<std::ops::Range<u64>> = (0..node_count)
        .step_by(chunk_size as usize)
        .map(|start| start..(start + chunk_size).min(node_count))
        .collect();

    chunks
        .into_par_iter()
        .try_for_each_with(pl.clone(), |pl, chunk| {
            log::debug!("Compressing nodes {}..{}", chunk.start, chunk.end);
            let mut compressor = factory.compressor();
            let mut targets = Vec::new();
            let mut properties = vec![Vec::new(); streams];
            for node in chunk {
                targets.clear();
                for stream in &mut properties {
                    stream.clear();
                }
                supplier(node, &mut targets, &mut properties);
                compressor.compress(node, &mut targets, &mut properties)?;
                pl.update();
            }
            anyhow::Ok(())
        })?;

    pl.done();
    Ok(())
}
