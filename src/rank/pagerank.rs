/*
 * SPDX-FileCopyrightText: 2025 The rankprop developers
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use super::budget::{find_ideal_concurrency, InstanceSizes};
use super::compute_step::{ComputeStep, StepContext};
use super::compute_steps::ComputeSteps;
use super::degree::DegreeComputer;
use super::partition::*;
use super::result::{CentralityResult, Normalization, RankResult};
use super::variant::*;
use super::width::*;
use crate::traits::*;
use crate::utils::*;
use anyhow::ensure;
use dsi_progress_logger::{no_logging, ProgressLog};
use itertools::Itertools;
use rayon::ThreadPool;
use std::sync::atomic::AtomicBool;

static NO_TRACKING: AllocationTracker = AllocationTracker::disabled();

/// A partitioned, parallel rank-propagation computation.
///
/// The nodes of the graph are split into partitions carrying roughly the
/// same number of relationships, and partitions are merged into groups, one
/// per [compute step](ComputeStep). At each iteration every step pushes the
/// deltas of its nodes to the steps owning their neighbors, and then
/// combines what it received into ranks; the
/// [variant](super::variant::RankVariant) decides the shares and the
/// combination.
///
/// The width `W` selects the [standard](Standard) engine (at most 2³² − 1
/// nodes, fixed-point accumulation) or the [huge](Huge) one (64-bit ids,
/// single-precision accumulation, concurrency bounded by a
/// [memory budget](MemoryBudget)).
///
/// The computation is sequential unless a [thread pool](Self::thread_pool)
/// is provided and the concurrency is not one; results do not depend on the
/// concurrency, up to floating-point accumulation order on the huge width.
///
/// # Examples
///
/// ```
/// use rankprop::prelude::*;
///
/// let graph = VecGraph::from_arcs(3, [(0, 1), (1, 2), (2, 0), (0, 2)]);
/// let mut pr = PageRank::new(&graph, PlainPageRank);
/// pr.damping_factor(0.85).compute(20);
///
/// assert_eq!(pr.result().len(), 3);
/// assert!(pr.result().score(2) > pr.result().score(1));
/// ```
///
/// Personalized PageRank on the huge width:
///
/// ```
/// use rankprop::prelude::*;
///
/// let graph = VecGraph::from_arcs(4, [(0, 1), (1, 2), (2, 0), (3, 0)]);
/// let mut pr = PageRank::huge(&graph, PlainPageRank);
/// pr.source_nodes([0]).compute(10);
///
/// // Node 3 is not reachable from the source
/// assert_eq!(pr.result().score(3), 0.0);
/// ```
pub struct PageRank<'a, G: Graph, V: RankVariant, W: IdWidth = Standard> {
    graph: &'a G,
    variant: V,
    damping_factor: f64,
    source_nodes: Vec<u64>,
    concurrency: usize,
    batch_size: usize,
    direction: Direction,
    pool: Option<&'a ThreadPool>,
    budget: &'a dyn MemoryBudget,
    tracker: &'a AllocationTracker,
    termination: Option<&'a AtomicBool>,

    result: Option<RankResult<W>>,
    iterations: usize,
}

impl<G: Graph, V: RankVariant, W: IdWidth> core::fmt::Debug for PageRank<'_, G, V, W> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PageRank")
            .field("variant", &self.variant)
            .field("width", &W::NAME)
            .field("damping_factor", &self.damping_factor)
            .field("source_nodes", &self.source_nodes.len())
            .field("concurrency", &self.concurrency)
            .field("batch_size", &self.batch_size)
            .field("direction", &self.direction)
            .field("iterations", &self.iterations)
            .finish_non_exhaustive()
    }
}

impl<'a, G: Graph, V: RankVariant> PageRank<'a, G, V, Standard> {
    /// Creates a new computation on the standard width.
    ///
    /// # Panics
    ///
    /// Panics if the graph has more than 2³² − 1 nodes.
    pub fn new(graph: &'a G, variant: V) -> Self {
        Self::with_width(graph, variant)
    }
}

impl<'a, G: Graph, V: RankVariant> PageRank<'a, G, V, Huge> {
    /// Creates a new computation on the huge width.
    pub fn huge(graph: &'a G, variant: V) -> Self {
        Self::with_width(graph, variant)
    }
}

impl<'a, G: Graph, V: RankVariant, W: IdWidth> PageRank<'a, G, V, W> {
    /// The default damping factor.
    pub const DEFAULT_DAMPING_FACTOR: f64 = 0.85;
    /// The default batch size, in nodes.
    pub const DEFAULT_BATCH_SIZE: usize = 10_000;

    fn with_width(graph: &'a G, variant: V) -> Self {
        assert!(
            graph.num_nodes() <= W::MAX_NODE_COUNT,
            "The {} width supports at most {} nodes, but the graph has {} nodes",
            W::NAME,
            W::MAX_NODE_COUNT,
            graph.num_nodes()
        );
        Self {
            graph,
            variant,
            damping_factor: Self::DEFAULT_DAMPING_FACTOR,
            source_nodes: Vec::new(),
            concurrency: num_cpus::get(),
            batch_size: Self::DEFAULT_BATCH_SIZE,
            direction: Direction::default(),
            pool: None,
            budget: &SystemMemory,
            tracker: &NO_TRACKING,
            termination: None,
            result: None,
            iterations: 0,
        }
    }

    /// Sets the damping factor.
    ///
    /// # Panics
    ///
    /// Panics if `damping_factor` is not in the interval [0 . . 1).
    pub fn damping_factor(&mut self, damping_factor: f64) -> &mut Self {
        assert!(
            (0.0..1.0).contains(&damping_factor),
            "The damping factor must be in [0 . . 1), got {damping_factor}"
        );
        self.damping_factor = damping_factor;
        self
    }

    /// Sets the source nodes, as original ids, computing personalized
    /// PageRank.
    ///
    /// Ids that do not belong to the graph are ignored. An empty set of
    /// source nodes means the whole graph.
    pub fn source_nodes(&mut self, source_nodes: impl IntoIterator<Item = u64>) -> &mut Self {
        self.source_nodes = source_nodes.into_iter().collect();
        self
    }

    /// Sets the concurrency, that is, the maximum number of compute steps.
    ///
    /// Zero means one compute step per partition. The default is the number
    /// of available CPUs.
    pub fn concurrency(&mut self, concurrency: usize) -> &mut Self {
        self.concurrency = concurrency;
        self
    }

    /// Sets the target size of a partition, in nodes.
    ///
    /// The target is converted into a number of relationships assuming an
    /// average degree of eight; zero means no limit.
    pub fn batch_size(&mut self, batch_size: usize) -> &mut Self {
        self.batch_size = batch_size;
        self
    }

    /// Sets the direction in which relationships are followed.
    pub fn direction(&mut self, direction: Direction) -> &mut Self {
        self.direction = direction;
        self
    }

    /// Sets the thread pool on which compute steps run.
    ///
    /// Without a pool, the computation runs on the current thread.
    pub fn thread_pool(&mut self, pool: &'a ThreadPool) -> &mut Self {
        self.pool = Some(pool);
        self
    }

    /// Sets the source of the available memory used to bound concurrency on
    /// the huge width.
    ///
    /// The default is the memory available on the host.
    pub fn memory_budget(&mut self, budget: &'a dyn MemoryBudget) -> &mut Self {
        self.budget = budget;
        self
    }

    /// Sets the tracker with which allocations are registered.
    ///
    /// All tracked bytes are released by the time the computation ends,
    /// with the exception of the ranks, which are released by
    /// [`release`](Self::release).
    pub fn tracker(&mut self, tracker: &'a AllocationTracker) -> &mut Self {
        self.tracker = tracker;
        self
    }

    /// Sets a flag that, once true, stops the computation before the next
    /// iteration.
    pub fn termination_flag(&mut self, flag: &'a AtomicBool) -> &mut Self {
        self.termination = Some(flag);
        self
    }

    /// Returns the number of iterations completed by the last computation.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Runs the given number of iterations.
    ///
    /// # Panics
    ///
    /// Panics if `iterations` is zero.
    pub fn compute(&mut self, iterations: usize) -> &mut Self {
        self.compute_with_logging(iterations, no_logging![])
    }

    /// Runs the given number of iterations, logging progress on `pl`.
    ///
    /// # Panics
    ///
    /// Panics if `iterations` is zero.
    pub fn compute_with_logging(
        &mut self,
        iterations: usize,
        pl: &mut impl ProgressLog,
    ) -> &mut Self {
        assert!(
            iterations >= 1,
            "The number of iterations must be at least one"
        );
        let graph = self.graph;
        let n = graph.num_nodes();

        let source_nodes: Vec<usize> = self
            .source_nodes
            .iter()
            .filter_map(|&id| graph.to_mapped_node_id(id))
            .sorted_unstable()
            .dedup()
            .collect();

        log::info!("Variant: {:?}", self.variant);
        log::info!("Width: {}", W::NAME);
        log::info!("Damping factor: {}", self.damping_factor);
        log::info!("Direction: {}", self.direction);
        if self.source_nodes.is_empty() {
            log::info!("Source nodes: all");
        } else {
            log::info!(
                "Source nodes: {} ({} requested)",
                source_nodes.len(),
                self.source_nodes.len()
            );
        }

        let pool = self.pool.filter(|_| self.concurrency != 1);
        let partitions = if pool.is_none() && n <= W::MAX_PARTITION_NODES {
            single_partition(n)
        } else {
            partition_graph(
                graph,
                self.direction,
                adjust_batch_size(self.batch_size),
                W::MAX_PARTITION_NODES,
            )
        };
        let concurrency = match pool {
            None => 1,
            Some(_) if W::BUDGETED => {
                find_ideal_concurrency::<W>(
                    n,
                    &partitions,
                    self.concurrency,
                    self.budget,
                    InstanceSizes::of::<W, G, V>(),
                )
            }
            Some(_) => self.concurrency,
        };
        let groups = PartitionGroups::<W>::merge(&partitions, concurrency);
        log::debug!(
            "{} partition(s) merged into {} group(s)",
            partitions.len(),
            groups.len()
        );

        let cache = self
            .variant
            .degree_computer()
            .compute(graph, self.direction, pool, self.tracker);

        let ctx = StepContext {
            graph,
            variant: &self.variant,
            cache: &cache,
            groups: &groups,
            tracker: self.tracker,
            direction: self.direction,
            damping_factor: self.damping_factor,
            source_nodes: &source_nodes,
        };
        let steps = (0..groups.len())
            .map(|index| ComputeStep::new(ctx, index))
            .collect();
        let mut compute_steps = ComputeSteps::new(steps, pool, self.variant.normalizes());
        compute_steps.run(iterations, self.termination, pl);

        self.iterations = compute_steps.iterations();
        let result = compute_steps.into_result();
        self.tracker.remove(cache.size_in_bytes());
        self.tracker.add(size_of_f64_array(result.len()));
        self.result = Some(result);
        self
    }

    /// Returns the result of the last computation.
    ///
    /// # Panics
    ///
    /// Panics if no computation has been run since the creation of this
    /// instance or the last call to [`release`](Self::release).
    pub fn result(&self) -> &RankResult<W> {
        match &self.result {
            Some(result) => result,
            None => panic!("No result available: call compute first"),
        }
    }

    /// Consumes this computation, returning its result.
    ///
    /// # Panics
    ///
    /// Panics if no computation has been run.
    pub fn into_result(mut self) -> RankResult<W> {
        match self.result.take() {
            Some(result) => {
                self.tracker.remove(size_of_f64_array(result.len()));
                result
            }
            None => panic!("No result available: call compute first"),
        }
    }

    /// Releases the result.
    pub fn release(&mut self) {
        if let Some(result) = self.result.take() {
            self.tracker.remove(size_of_f64_array(result.len()));
        }
    }
}

/// The parameters of a computation, selecting variant and width at run
/// time.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RankConfig {
    pub variant: Variant,
    pub damping_factor: f64,
    pub iterations: usize,
    /// Original ids of the source nodes; empty for the whole graph.
    pub source_nodes: Vec<u64>,
    /// Zero means one compute step per partition.
    pub concurrency: usize,
    pub batch_size: usize,
    pub direction: Direction,
    /// Whether to use the [huge](Huge) width.
    pub huge: bool,
    pub normalization: Normalization,
}

impl Default for RankConfig {
    fn default() -> Self {
        Self {
            variant: Variant::default(),
            damping_factor: 0.85,
            iterations: 20,
            source_nodes: Vec::new(),
            concurrency: num_cpus::get(),
            batch_size: 10_000,
            direction: Direction::default(),
            huge: false,
            normalization: Normalization::default(),
        }
    }
}

impl RankConfig {
    /// Checks that the parameters are consistent.
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            (0.0..1.0).contains(&self.damping_factor),
            "The damping factor must be in [0 . . 1), got {}",
            self.damping_factor
        );
        ensure!(
            self.iterations >= 1,
            "The number of iterations must be at least one"
        );
        Ok(())
    }

    /// Runs the computation on `graph`, returning the (normalized) scores
    /// indexed by mapped node id.
    pub fn run<G: Graph>(
        &self,
        graph: &G,
        pool: Option<&ThreadPool>,
        pl: &mut impl ProgressLog,
    ) -> anyhow::Result<Vec<f64>> {
        self.validate()?;
        ensure!(
            self.huge || graph.num_nodes() <= Standard::MAX_NODE_COUNT,
            "The graph has {} nodes, which exceeds the standard width; use the huge width",
            graph.num_nodes()
        );
        let cache_weights = match self.variant {
            Variant::Weighted { cache_weights } => cache_weights,
            _ => false,
        };
        Ok(match (self.variant, self.huge) {
            (Variant::PageRank, false) => {
                self.run_with(&mut PageRank::new(graph, PlainPageRank), pool, pl)
            }
            (Variant::PageRank, true) => {
                self.run_with(&mut PageRank::huge(graph, PlainPageRank), pool, pl)
            }
            (Variant::Weighted { .. }, false) => self.run_with(
                &mut PageRank::new(graph, WeightedPageRank { cache_weights }),
                pool,
                pl,
            ),
            (Variant::Weighted { .. }, true) => self.run_with(
                &mut PageRank::huge(graph, WeightedPageRank { cache_weights }),
                pool,
                pl,
            ),
            (Variant::ArticleRank, false) => {
                self.run_with(&mut PageRank::new(graph, ArticleRank), pool, pl)
            }
            (Variant::ArticleRank, true) => {
                self.run_with(&mut PageRank::huge(graph, ArticleRank), pool, pl)
            }
            (Variant::Eigenvector, false) => {
                self.run_with(&mut PageRank::new(graph, EigenvectorCentrality), pool, pl)
            }
            (Variant::Eigenvector, true) => {
                self.run_with(&mut PageRank::huge(graph, EigenvectorCentrality), pool, pl)
            }
        })
    }

    fn run_with<'a, G: Graph, V: RankVariant, W: IdWidth>(
        &self,
        pr: &mut PageRank<'a, G, V, W>,
        pool: Option<&'a ThreadPool>,
        pl: &mut impl ProgressLog,
    ) -> Vec<f64> {
        pr.damping_factor(self.damping_factor)
            .source_nodes(self.source_nodes.iter().copied())
            .concurrency(self.concurrency)
            .batch_size(self.batch_size)
            .direction(self.direction);
        if let Some(pool) = pool {
            pr.thread_pool(pool);
        }
        pr.compute_with_logging(self.iterations, pl);

        let result = pr.result();
        log::info!(
            "Completed {} iteration(s); max: {}, L1 norm: {}, L2 norm: {}",
            pr.iterations(),
            result.compute_max(),
            result.compute_l1_norm(),
            result.compute_l2_norm()
        );
        let scores = self.normalization.apply(result).to_vec();
        pr.release();
        scores
    }
}
