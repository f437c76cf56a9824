/*
 * SPDX-FileCopyrightText: 2025 The rankprop developers
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use crate::cli::{get_thread_pool, ArcsArgs, NumThreadsArg};
use crate::prelude::*;
use anyhow::{Context, Result};
use clap::{ArgMatches, Args, Command, FromArgMatches, ValueEnum};
use dsi_progress_logger::prelude::*;
use std::io::{BufReader, BufWriter, Write};
use std::path::PathBuf;

pub const COMMAND_NAME: &str = "rank";

/// The rank-propagation variant.
#[derive(ValueEnum, Debug, Clone, Copy, Default)]
pub enum CliVariant {
    /// Classic PageRank.
    #[default]
    Pagerank,
    /// PageRank with shares proportional to the weights of the arcs.
    Weighted,
    /// PageRank with the average degree added to the degree of each node.
    Articlerank,
    /// Eigenvector centrality, with deltas normalized at each iteration.
    Eigenvector,
}

/// The direction in which arcs are followed.
#[derive(ValueEnum, Debug, Clone, Copy, Default)]
pub enum CliDirection {
    /// From source to target.
    #[default]
    Out,
    /// From target to source.
    In,
    /// Both ways.
    Both,
}

impl From<CliDirection> for Direction {
    fn from(direction: CliDirection) -> Self {
        match direction {
            CliDirection::Out => Direction::Outgoing,
            CliDirection::In => Direction::Incoming,
            CliDirection::Both => Direction::Both,
        }
    }
}

/// The normalization applied to scores before printing them.
#[derive(ValueEnum, Debug, Clone, Copy, Default)]
pub enum CliNormalization {
    /// Print raw scores.
    #[default]
    None,
    /// Divide scores by their maximum.
    Max,
    /// Divide scores by their L1 norm.
    L1,
    /// Divide scores by their L2 norm.
    L2,
}

impl From<CliNormalization> for Normalization {
    fn from(normalization: CliNormalization) -> Self {
        match normalization {
            CliNormalization::None => Normalization::None,
            CliNormalization::Max => Normalization::Max,
            CliNormalization::L1 => Normalization::L1Norm,
            CliNormalization::L2 => Normalization::L2Norm,
        }
    }
}

#[derive(Args, Debug)]
#[command(about = "Computes PageRank-like centralities of a graph read from a list of arcs, printing for each node its original id and its score.", long_about = None)]
pub struct CliArgs {
    /// The file containing the arcs, or `-` for standard input.
    pub arcs: PathBuf,

    #[arg(short, long)]
    /// Where to write the scores; standard output if missing.
    pub output: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = CliVariant::Pagerank)]
    /// The variant to compute.
    pub variant: CliVariant,

    #[arg(short, long, default_value_t = 20)]
    /// The number of iterations.
    pub iterations: usize,

    #[arg(short, long, default_value_t = 0.85)]
    /// The damping factor (must be in the interval [0 . . 1)).
    pub damping: f64,

    #[arg(short, long = "source")]
    /// A source node (an id as it appears in the arcs) for personalized
    /// PageRank; can be repeated.
    pub sources: Vec<u64>,

    #[arg(long, value_enum, default_value_t = CliDirection::Out)]
    /// The direction in which arcs are followed.
    pub direction: CliDirection,

    #[arg(long, default_value_t = 10_000)]
    /// The target number of nodes of a partition (0 for no limit).
    pub batch_size: usize,

    #[arg(long)]
    /// Use 64-bit node ids, single-precision accumulation and memory-aware
    /// concurrency.
    pub huge: bool,

    #[arg(long)]
    /// Snapshot the weights of the arcs before iterating (weighted variant
    /// only).
    pub cache_weights: bool,

    #[arg(long, value_enum, default_value_t = CliNormalization::None)]
    /// The normalization applied to scores.
    pub normalization: CliNormalization,

    #[arg(long)]
    /// Print only the nodes with the largest scores.
    pub top: Option<usize>,

    #[clap(flatten)]
    pub arcs_args: ArcsArgs,

    #[clap(flatten)]
    pub num_threads: NumThreadsArg,
}

impl CliArgs {
    /// Returns the configuration of the computation.
    pub fn to_config(&self) -> RankConfig {
        RankConfig {
            variant: match self.variant {
                CliVariant::Pagerank => Variant::PageRank,
                CliVariant::Weighted => Variant::Weighted {
                    cache_weights: self.cache_weights,
                },
                CliVariant::Articlerank => Variant::ArticleRank,
                CliVariant::Eigenvector => Variant::Eigenvector,
            },
            damping_factor: self.damping,
            iterations: self.iterations,
            source_nodes: self.sources.clone(),
            concurrency: self.num_threads.num_threads,
            batch_size: self.batch_size,
            direction: self.direction.into(),
            huge: self.huge,
            normalization: self.normalization.into(),
        }
    }
}

pub fn cli(command: Command) -> Command {
    let sub_command = CliArgs::augment_args(Command::new(COMMAND_NAME)).display_order(0);
    command.subcommand(sub_command)
}

pub fn main(submatches: &ArgMatches) -> Result<()> {
    let args = CliArgs::from_arg_matches(submatches)?;
    let config = args.to_config();
    config.validate()?;

    let options = ArcsOptions::from(&args.arcs_args);
    let graph = if args.arcs.as_os_str() == "-" {
        log::info!("Reading arcs from standard input");
        read_arcs(std::io::stdin().lock(), &options)?
    } else {
        log::info!("Reading arcs from {}", args.arcs.display());
        let file = std::fs::File::open(&args.arcs)
            .with_context(|| format!("Could not open {}", args.arcs.display()))?;
        read_arcs(BufReader::new(file), &options)
            .with_context(|| format!("Could not read arcs from {}", args.arcs.display()))?
    };
    log::info!(
        "Graph with {} nodes and {} arcs",
        graph.num_nodes(),
        graph.num_relationships()
    );

    let mut pl = ProgressLogger::default();
    pl.display_memory(true);
    if let Some(duration) = submatches.get_one("log-interval") {
        pl.log_interval(*duration);
    }

    let thread_pool = (args.num_threads.num_threads > 1)
        .then(|| get_thread_pool(args.num_threads.num_threads));
    let scores = config.run(&graph, thread_pool.as_ref(), &mut pl)?;

    match &args.output {
        Some(path) => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("Could not create {}", path.display()))?;
            write_scores(&graph, &scores, args.top, BufWriter::new(file))
                .with_context(|| format!("Could not write scores to {}", path.display()))
        }
        None => write_scores(&graph, &scores, args.top, BufWriter::new(std::io::stdout().lock())),
    }
}

/// Writes the original id and the score of each node, one per line.
///
/// If `top` is present, only the `top` nodes with the largest scores are
/// written, by decreasing score; otherwise, all nodes are written in
/// mapped-id order.
pub fn write_scores(
    graph: &impl IdMapping,
    scores: &[f64],
    top: Option<usize>,
    mut out: impl Write,
) -> Result<()> {
    let mut nodes: Vec<usize> = (0..scores.len()).collect();
    if let Some(top) = top {
        nodes.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]).then(a.cmp(&b)));
        nodes.truncate(top);
    }
    for node in nodes {
        writeln!(out, "{}\t{}", graph.to_original_node_id(node), scores[node])?;
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_scores() -> Result<()> {
        let graph = VecGraph::empty(3).with_original_ids(vec![10, 20, 30]);
        let scores = [0.5, 2.0, 1.0];
        let mut out = Vec::new();
        write_scores(&graph, &scores, None, &mut out)?;
        assert_eq!(String::from_utf8(out)?, "10\t0.5\n20\t2\n30\t1\n");

        let mut out = Vec::new();
        write_scores(&graph, &scores, Some(2), &mut out)?;
        assert_eq!(String::from_utf8(out)?, "20\t2\n30\t1\n");
        Ok(())
    }
}
