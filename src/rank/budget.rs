/*
 * SPDX-FileCopyrightText: 2025 The rankprop developers
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Memory-aware concurrency.
//!
//! Each compute step owns one score row per group, so the memory used by the
//! score-transpose buffers grows with the square of the number of groups.
//! Before creating the steps, [`find_ideal_concurrency`] estimates the
//! memory needed by the requested concurrency and lowers it until the
//! estimate fits the available memory. Concurrency is never raised, and
//! never lowered below one.

use super::compute_step::ComputeStep;
use super::compute_steps::ComputeSteps;
use super::partition::{Partition, PartitionGroups};
use super::variant::RankVariant;
use super::width::IdWidth;
use crate::traits::Graph;
use crate::utils::*;

/// The sizes of the fixed parts of a computation: a compute step and the
/// coordinator, not including the buffers they own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstanceSizes {
    pub step: u64,
    pub coordinator: u64,
}

impl InstanceSizes {
    /// Measures the steps and coordinator of a computation on graphs of type
    /// `G` with variant `V`.
    pub fn of<'a, W: IdWidth, G: Graph + 'a, V: RankVariant + 'a>() -> Self {
        Self {
            step: size_of_instance::<ComputeStep<'a, W, G, V>>(),
            coordinator: size_of_instance::<ComputeSteps<'a, W, G, V>>(),
        }
    }
}

/// Estimates the number of bytes used by a computation on the given
/// partitions with the given concurrency.
///
/// The estimate accounts for the ranks and deltas of all groups (shared),
/// and for the score rows each step holds for every group (per thread).
pub fn memory_usage_for<W: IdWidth>(
    concurrency: usize,
    partitions: &[Partition],
    sizes: InstanceSizes,
) -> u64 {
    let groups = PartitionGroups::<W>::merge(partitions, concurrency);
    let steps = groups.len();

    let mut shared = 0u64;
    let mut per_thread = 0u64;
    for &len in groups.lengths() {
        shared = shared.saturating_add(size_of_f64_array(len) << 1);
        per_thread = per_thread.saturating_add(size_of_slice::<W::Score>(len));
    }

    per_thread = per_thread
        .saturating_mul(steps as u64)
        .saturating_add(sizes.step)
        .saturating_add(size_of_object_array(steps));
    shared = shared
        .saturating_add(sizes.coordinator)
        .saturating_add(size_of_u64_array(steps) << 1);

    shared.saturating_add(per_thread)
}

/// Estimates the number of bytes freed by removing one thread when `node_count`
/// nodes are split among `concurrency` threads.
pub fn memory_usage_per_thread(node_count: usize, concurrency: usize, sizes: InstanceSizes) -> u64 {
    let concurrency = concurrency.max(1);
    let nodes_per_thread = thread_size(concurrency, node_count);
    size_of_i32_array(nodes_per_thread)
        .saturating_mul(concurrency as u64)
        .saturating_add(sizes.step)
}

/// Returns the largest concurrency not exceeding `concurrency` whose
/// estimated memory usage fits `available_bytes`, or one if none does.
pub fn max_concurrency_by_memory<W: IdWidth>(
    node_count: usize,
    concurrency: usize,
    available_bytes: u64,
    partitions: &[Partition],
    sizes: InstanceSizes,
) -> usize {
    let mut new_concurrency = concurrency.max(1);
    let per_thread = memory_usage_per_thread(node_count, concurrency, sizes).max(1);

    let mut memory_usage = memory_usage_for::<W>(new_concurrency, partitions, sizes);
    while memory_usage > available_bytes && new_concurrency > 1 {
        let overflow = memory_usage - available_bytes;
        let reduction = usize::try_from(overflow.div_ceil(per_thread)).unwrap_or(usize::MAX);
        new_concurrency = new_concurrency.saturating_sub(reduction).max(1);
        memory_usage = memory_usage_for::<W>(new_concurrency, partitions, sizes);
    }
    new_concurrency
}

/// Returns the concurrency to use for a computation on the given partitions.
///
/// A requested concurrency of zero means one thread per partition. If the
/// estimated memory usage of the requested concurrency exceeds the budget,
/// concurrency is lowered and a warning is logged.
pub fn find_ideal_concurrency<W: IdWidth>(
    node_count: usize,
    partitions: &[Partition],
    requested: usize,
    budget: &dyn MemoryBudget,
    sizes: InstanceSizes,
) -> usize {
    let concurrency = match requested {
        0 => partitions.len(),
        _ => requested,
    };
    let available = budget.available_bytes();

    log::debug!(
        "Nodes: {}, concurrency: {}, available memory: {}, estimated memory usage: {}",
        node_count,
        concurrency,
        humanize_bytes(available),
        humanize_bytes(memory_usage_for::<W>(concurrency, partitions, sizes))
    );

    let max_concurrency = max_concurrency_by_memory::<W>(node_count, concurrency, available, partitions, sizes);
    if concurrency > max_concurrency {
        log::warn!(
            "Requested concurrency of {} would require {} but only {} are available; concurrency will be throttled to {} to use only {}",
            concurrency,
            humanize_bytes(memory_usage_for::<W>(concurrency, partitions, sizes)),
            humanize_bytes(available),
            max_concurrency,
            humanize_bytes(memory_usage_for::<W>(max_concurrency, partitions, sizes)),
        );
        return max_concurrency;
    }
    concurrency
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphs::vec_graph::VecGraph;
    use crate::rank::variant::PlainPageRank;
    use crate::rank::width::Huge;

    fn partitions() -> Vec<Partition> {
        (0..8).map(|i| Partition::new(i * 1000, 1000)).collect()
    }

    fn sizes() -> InstanceSizes {
        InstanceSizes::of::<Huge, VecGraph, PlainPageRank>()
    }

    #[test]
    fn test_memory_usage_grows_with_concurrency() {
        let partitions = partitions();
        let usage: Vec<u64> = [1, 2, 4, 8]
            .into_iter()
            .map(|c| memory_usage_for::<Huge>(c, &partitions, sizes()))
            .collect();
        assert!(usage.windows(2).all(|w| w[0] < w[1]));
        // Ranks and deltas are shared
        assert!(usage[0] > 2 * size_of_f64_array(8000));
    }

    #[test]
    fn test_per_thread() {
        let base = memory_usage_per_thread(0, 1, sizes());
        assert_eq!(base, sizes().step);
        assert_eq!(memory_usage_per_thread(1000, 4, sizes()), base + 4 * 250 * 4);
        assert_eq!(memory_usage_per_thread(1001, 4, sizes()), base + 4 * 251 * 4);
    }

    #[test]
    fn test_throttling() {
        let partitions = partitions();
        let sizes = sizes();
        let budget = memory_usage_for::<Huge>(2, &partitions, sizes);
        assert_eq!(max_concurrency_by_memory::<Huge>(8000, 8, budget, &partitions, sizes), 2);
        assert_eq!(
            find_ideal_concurrency::<Huge>(8000, &partitions, 8, &FixedBudget(budget), sizes),
            2
        );
        // Never below one
        assert_eq!(max_concurrency_by_memory::<Huge>(8000, 8, 0, &partitions, sizes), 1);
        // Never raised
        assert_eq!(
            find_ideal_concurrency::<Huge>(8000, &partitions, 3, &UnboundedBudget, sizes),
            3
        );
        assert_eq!(
            find_ideal_concurrency::<Huge>(8000, &partitions, 0, &UnboundedBudget, sizes),
            8
        );
    }

    #[test]
    fn test_instance_sizes() {
        let partitions = partitions();
        let sizes = sizes();
        assert!(sizes.step > 0 && sizes.coordinator > 0);
        let larger = InstanceSizes {
            step: sizes.step + 100,
            coordinator: sizes.coordinator + 10,
        };
        assert_eq!(
            memory_usage_for::<Huge>(4, &partitions, larger),
            memory_usage_for::<Huge>(4, &partitions, sizes) + 110
        );
        assert_eq!(
            memory_usage_per_thread(1000, 4, larger),
            memory_usage_per_thread(1000, 4, sizes) + 100
        );
    }
}
