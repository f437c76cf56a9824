/*
 * SPDX-FileCopyrightText: 2025 The rankprop developers
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use super::degree::DegreeCache;
use super::partition::PartitionGroups;
use super::state::StepState;
use super::variant::RankVariant;
use super::width::IdWidth;
use crate::traits::*;
use crate::utils::*;
use kahan::KahanSum;

/// The parameters shared by all compute steps of a computation.
pub struct StepContext<'a, W: IdWidth, G: Graph, V: RankVariant> {
    pub graph: &'a G,
    pub variant: &'a V,
    pub cache: &'a DegreeCache,
    pub groups: &'a PartitionGroups<W>,
    pub tracker: &'a AllocationTracker,
    pub direction: Direction,
    /// The damping factor chosen by the user.
    pub damping_factor: f64,
    /// Sorted mapped ids of the source nodes; empty for the whole graph.
    pub source_nodes: &'a [usize],
}

// Derived Clone and Copy would require bounds on the type parameters
impl<W: IdWidth, G: Graph, V: RankVariant> Clone for StepContext<'_, W, G, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<W: IdWidth, G: Graph, V: RankVariant> Copy for StepContext<'_, W, G, V> {}

/// The worker owning a group of partitions.
///
/// Each call to [`run`](ComputeStep::run) performs the phase corresponding to
/// the current [state](StepState) and then moves to the next state:
///
/// - `Init` allocates the buffers and seeds the initial ranks;
/// - `Calc` distributes the delta of each node with a positive delta,
///   writing shares into the outbound row of the group owning the target;
/// - `Sync` drains the inbound rows, one per group, combining their sums
///   into ranks and deltas;
/// - `Norm` divides the deltas, but not the ranks, by the global norm set with
///   [`prepare_normalize_deltas`](ComputeStep::prepare_normalize_deltas).
///
/// Outbound rows (indexed by destination group) and inbound rows (indexed by
/// source group) are moved between steps by the
/// [coordinator](super::ComputeSteps) between phases: during `Calc` a step
/// is the only writer of its outbound rows, and during `Sync` the only
/// reader of its inbound rows.
pub struct ComputeStep<'a, W: IdWidth, G: Graph, V: RankVariant> {
    ctx: StepContext<'a, W, G, V>,
    index: usize,
    start_node: usize,
    node_count: usize,
    damping: f64,
    state: StepState,
    l2_norm: f64,
    page_rank: Box<[f64]>,
    deltas: Box<[f64]>,
    next_scores: Vec<Box<[W::Score]>>,
    prev_scores: Vec<Box<[W::Score]>>,
}

impl<W: IdWidth, G: Graph, V: RankVariant> core::fmt::Debug for ComputeStep<'_, W, G, V> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ComputeStep")
            .field("index", &self.index)
            .field("start_node", &self.start_node)
            .field("node_count", &self.node_count)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl<'a, W: IdWidth, G: Graph, V: RankVariant> ComputeStep<'a, W, G, V> {
    /// Creates the step owning the group of the given index.
    ///
    /// No buffer is allocated until the `Init` phase.
    pub fn new(ctx: StepContext<'a, W, G, V>, index: usize) -> Self {
        assert!(
            index < ctx.groups.len(),
            "Group index {} out of range (there are {} groups)",
            index,
            ctx.groups.len()
        );
        Self {
            index,
            start_node: ctx.groups.start_node(index),
            node_count: ctx.groups.lengths()[index],
            damping: ctx.variant.damping(ctx.damping_factor),
            state: StepState::Init,
            l2_norm: 1.0,
            page_rank: Box::default(),
            deltas: Box::default(),
            next_scores: Vec::new(),
            prev_scores: Vec::new(),
            ctx,
        }
    }

    /// Performs the current phase and advances the state.
    pub fn run(&mut self) {
        match self.state {
            StepState::Init => self.initialize(),
            StepState::Calc => self.single_iteration(),
            StepState::Sync => self.combine_scores(),
            StepState::Norm => self.normalize_deltas(),
        }
        self.state = self.state.next(self.ctx.variant.normalizes());
    }

    /// Returns the phase the next call to [`run`](Self::run) will perform.
    pub fn state(&self) -> StepState {
        self.state
    }

    /// Returns the index of the group owned by this step.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Returns the first node owned by this step.
    pub fn start_node(&self) -> usize {
        self.start_node
    }

    /// Returns the number of nodes owned by this step.
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    /// Returns the current rank estimates.
    pub fn page_rank(&self) -> &[f64] {
        &self.page_rank
    }

    /// Returns the deltas to be distributed at the next iteration.
    pub fn deltas(&self) -> &[f64] {
        &self.deltas
    }

    /// Returns the sum of the squares of the deltas.
    pub fn sum_of_squared_deltas(&self) -> KahanSum<f64> {
        self.deltas
            .iter()
            .fold(KahanSum::new(), |acc, &delta| acc + delta * delta)
    }

    /// Moves out the outbound rows, indexed by destination group.
    pub fn take_next_scores(&mut self) -> Vec<Box<[W::Score]>> {
        core::mem::take(&mut self.next_scores)
    }

    /// Hands to this step its inbound rows, indexed by source group.
    pub fn prepare_next_iteration(&mut self, prev_scores: Vec<Box<[W::Score]>>) {
        debug_assert!(prev_scores.iter().all(|row| row.len() == self.node_count));
        self.prev_scores = prev_scores;
    }

    /// Moves out the inbound rows, indexed by source group.
    pub fn take_prev_scores(&mut self) -> Vec<Box<[W::Score]>> {
        core::mem::take(&mut self.prev_scores)
    }

    /// Returns to this step its outbound rows, indexed by destination group.
    pub fn restore_next_scores(&mut self, next_scores: Vec<Box<[W::Score]>>) {
        debug_assert_eq!(next_scores.len(), self.ctx.groups.len());
        self.next_scores = next_scores;
    }

    /// Sets the norm used by the next `Norm` phase.
    pub fn prepare_normalize_deltas(&mut self, l2_norm: f64) {
        self.l2_norm = l2_norm;
    }

    /// Returns the rank estimates, releasing all buffers.
    pub fn into_page_rank(mut self) -> Box<[f64]> {
        self.release();
        let page_rank = core::mem::take(&mut self.page_rank);
        self.ctx.tracker.remove(size_of_f64_array(page_rank.len()));
        page_rank
    }

    /// Releases the deltas and the score rows.
    ///
    /// Ranks are kept, so that results can still be read.
    pub fn release(&mut self) {
        let bytes = size_of_f64_array(self.deltas.len())
            + self
                .next_scores
                .iter()
                .chain(self.prev_scores.iter())
                .map(|row| size_of_slice::<W::Score>(row.len()))
                .sum::<u64>();
        self.deltas = Box::default();
        self.next_scores = Vec::new();
        self.prev_scores = Vec::new();
        self.ctx.tracker.remove(bytes);
    }

    fn initialize(&mut self) {
        let ctx = self.ctx;
        let n = self.node_count;
        self.next_scores = ctx
            .groups
            .lengths()
            .iter()
            .map(|&len| vec![W::Score::default(); len].into_boxed_slice())
            .collect();

        let initial_value = ctx
            .variant
            .initial_value(1.0 - ctx.damping_factor, ctx.groups_node_count());
        let mut page_rank = vec![0.0; n].into_boxed_slice();
        if ctx.source_nodes.is_empty() || !ctx.variant.honors_source_nodes() {
            page_rank.fill(initial_value);
        } else {
            let end_node = self.start_node + n;
            let first = ctx.source_nodes.partition_point(|&node| node < self.start_node);
            for &node in ctx.source_nodes[first..]
                .iter()
                .take_while(|&&node| node < end_node)
            {
                page_rank[node - self.start_node] = initial_value;
            }
        }
        self.deltas = page_rank.clone();
        self.page_rank = page_rank;

        ctx.tracker.add(
            2 * size_of_f64_array(n)
                + ctx
                    .groups
                    .lengths()
                    .iter()
                    .map(|&len| size_of_slice::<W::Score>(len))
                    .sum::<u64>(),
        );
    }

    fn single_iteration(&mut self) {
        let StepContext {
            graph,
            variant,
            cache,
            groups,
            direction,
            ..
        } = self.ctx;
        let next_scores = &mut self.next_scores;
        debug_assert_eq!(next_scores.len(), groups.len());
        for (local, &delta) in self.deltas.iter().enumerate() {
            if delta > 0.0 {
                let node = self.start_node + local;
                variant.distribute(graph, direction, node, delta, cache, |target, share| {
                    let (group, index) = groups.locate(target);
                    W::add_share(&mut next_scores[group][index], share);
                });
            }
        }
    }

    fn combine_scores(&mut self) {
        debug_assert!(!self.prev_scores.is_empty());
        let variant = self.ctx.variant;
        for (i, (rank, delta)) in self
            .page_rank
            .iter_mut()
            .zip(self.deltas.iter_mut())
            .enumerate()
        {
            let sum = W::drain(self.prev_scores.iter_mut().map(|scores| &mut scores[i]));
            variant.combine(rank, delta, sum, self.damping);
        }
    }

    fn normalize_deltas(&mut self) {
        let l2_norm = self.l2_norm;
        self.deltas.iter_mut().for_each(|delta| *delta /= l2_norm);
    }
}

impl<W: IdWidth, G: Graph, V: RankVariant> StepContext<'_, W, G, V> {
    /// Returns the total number of nodes covered by the groups.
    fn groups_node_count(&self) -> usize {
        self.groups.lengths().iter().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphs::prelude::*;
    use crate::rank::partition::Partition;
    use crate::rank::variant::*;
    use crate::rank::width::*;

    #[test]
    fn test_single_step_cycle() {
        // 0 -> 1 -> 2 -> 0
        let g = VecGraph::from_arcs(3, [(0, 1), (1, 2), (2, 0)]);
        let groups = PartitionGroups::<Huge>::merge(&[Partition::new(0, 3)], 1);
        let cache = DegreeCache::default();
        let tracker = AllocationTracker::new();
        let ctx = StepContext {
            graph: &g,
            variant: &PlainPageRank,
            cache: &cache,
            groups: &groups,
            tracker: &tracker,
            direction: Direction::Outgoing,
            damping_factor: 0.85,
            source_nodes: &[],
        };
        let alpha = 1.0 - 0.85;
        let mut step = ComputeStep::new(ctx, 0);
        assert_eq!(step.state(), StepState::Init);
        step.run();
        assert_eq!(step.state(), StepState::Calc);
        assert_eq!(step.page_rank(), &[alpha, alpha, alpha]);
        assert!(tracker.tracked() > 0);

        step.run();
        assert_eq!(step.state(), StepState::Sync);
        let rows = step.take_next_scores();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][1], alpha as f32);
        step.prepare_next_iteration(rows);
        step.run();
        assert_eq!(step.state(), StepState::Calc);
        let rows = step.take_prev_scores();
        assert!(rows[0].iter().all(|&x| x == 0.0));
        step.restore_next_scores(rows);

        let expected = alpha + 0.85 * (alpha as f32 as f64);
        for &rank in step.page_rank() {
            assert!((rank - expected).abs() < 1E-12);
        }

        let ranks = step.into_page_rank();
        assert_eq!(ranks.len(), 3);
        assert_eq!(tracker.tracked(), 0);
    }

    #[test]
    fn test_source_nodes() {
        let g = VecGraph::from_arcs(6, [(0, 1), (4, 5)]);
        let groups = PartitionGroups::<Standard>::merge(&[Partition::new(0, 3), Partition::new(3, 3)], 2);
        let cache = DegreeCache::default();
        let tracker = AllocationTracker::disabled();
        let ctx = StepContext {
            graph: &g,
            variant: &PlainPageRank,
            cache: &cache,
            groups: &groups,
            tracker: &tracker,
            direction: Direction::Outgoing,
            damping_factor: 0.85,
            source_nodes: &[1, 4, 5],
        };
        let alpha = 1.0 - 0.85;
        let mut first = ComputeStep::new(ctx, 0);
        let mut second = ComputeStep::new(ctx, 1);
        first.run();
        second.run();
        assert_eq!(first.page_rank(), &[0.0, alpha, 0.0]);
        assert_eq!(second.page_rank(), &[0.0, alpha, alpha]);

        // Eigenvector centrality ignores source nodes
        let ctx = StepContext {
            variant: &EigenvectorCentrality,
            graph: &g,
            cache: &cache,
            groups: &groups,
            tracker: &tracker,
            direction: Direction::Outgoing,
            damping_factor: 0.85,
            source_nodes: &[1],
        };
        let mut step = ComputeStep::new(ctx, 1);
        step.run();
        assert!(step.page_rank().iter().all(|&x| x == 1.0 / 6.0));
    }

    #[test]
    fn test_normalize() {
        let g = VecGraph::from_arcs(2, [(0, 1), (1, 0)]);
        let groups = PartitionGroups::<Huge>::merge(&[Partition::new(0, 2)], 1);
        let cache = DegreeCache::default();
        let tracker = AllocationTracker::disabled();
        let ctx = StepContext {
            graph: &g,
            variant: &EigenvectorCentrality,
            cache: &cache,
            groups: &groups,
            tracker: &tracker,
            direction: Direction::Outgoing,
            damping_factor: 0.85,
            source_nodes: &[],
        };
        let mut step = ComputeStep::new(ctx, 0);
        step.run(); // init
        step.run(); // calc
        let rows = step.take_next_scores();
        step.prepare_next_iteration(rows);
        step.run(); // sync
        assert_eq!(step.state(), StepState::Norm);
        let norm = step.sum_of_squared_deltas().sum().sqrt();
        step.prepare_normalize_deltas(norm);
        step.run();
        assert_eq!(step.state(), StepState::Calc);
        let l2 = step.sum_of_squared_deltas().sum().sqrt();
        assert!((l2 - 1.0).abs() < 1E-6);
        // Ranks accumulate the unnormalized sums
        assert_eq!(step.page_rank(), &[1.0, 1.0]);
    }
}
