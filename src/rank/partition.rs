/*
 * SPDX-FileCopyrightText: 2025 The rankprop developers
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Partitioning of the node-id space.
//!
//! Nodes are split into contiguous ranges carrying roughly the same number
//! of relationships: [`partition_graph`] walks nodes in id order,
//! accumulating their degree until a relationship target is reached. Since
//! the target is expressed by users as a number of nodes, it is first
//! corrected by [`adjust_batch_size`].
//!
//! Consecutive partitions are then merged by [`PartitionGroups::merge`] into
//! at most as many groups as the requested concurrency; each group is
//! handled by a single [compute step](super::ComputeStep).

use super::width::IdWidth;
use crate::traits::*;
use crate::utils::thread_size;
use core::marker::PhantomData;

/// A contiguous range of nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partition {
    pub start_node: usize,
    pub node_count: usize,
}

impl Partition {
    pub fn new(start_node: usize, node_count: usize) -> Self {
        Self {
            start_node,
            node_count,
        }
    }

    /// Returns the first node after this partition.
    #[inline(always)]
    pub fn end_node(&self) -> usize {
        self.start_node + self.node_count
    }

    /// Returns whether `node_count` more nodes can be added to this partition
    /// without exceeding `ceiling` nodes.
    #[inline(always)]
    pub fn fits(&self, node_count: usize, ceiling: usize) -> bool {
        ceiling.saturating_sub(self.node_count) >= node_count
    }
}

/// Corrects a batch size expressed in nodes into a number of relationships,
/// assuming an average degree of eight.
///
/// A batch size of zero, or one whose correction overflows, means no limit.
pub fn adjust_batch_size(batch_size: usize) -> usize {
    match batch_size {
        0 => usize::MAX,
        _ => batch_size.checked_mul(8).unwrap_or(usize::MAX),
    }
}

/// Splits the nodes of `graph` into partitions whose accumulated degree (in
/// the given direction) reaches `batch_size`, and whose number of nodes does
/// not exceed `ceiling`.
///
/// A partition always contains at least one node, unless the graph is empty,
/// in which case a single empty partition is returned.
pub fn partition_graph<G: IdMapping + Degrees>(
    graph: &G,
    direction: Direction,
    batch_size: usize,
    ceiling: usize,
) -> Vec<Partition> {
    assert!(ceiling > 0, "The partition ceiling must be positive");
    let n = graph.num_nodes();
    if n == 0 {
        return vec![Partition::new(0, 0)];
    }
    let batch_size = batch_size as u64;
    let mut partitions = Vec::new();
    let mut start = 0;
    while start < n {
        let mut degree = 0u64;
        let mut end = start;
        while end < n && degree < batch_size && end - start < ceiling {
            degree += graph.degree(end, direction) as u64;
            end += 1;
        }
        partitions.push(Partition::new(start, end - start));
        start = end;
    }
    partitions
}

/// Returns a single partition containing all nodes.
pub fn single_partition(node_count: usize) -> Vec<Partition> {
    vec![Partition::new(0, node_count)]
}

/// Groups of consecutive partitions, each handled by one compute step.
///
/// Group starts are stored using the id type of the width, and
/// [`locate`](PartitionGroups::locate) finds the group of a node by binary
/// search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionGroups<W: IdWidth> {
    starts: Box<[W::Id]>,
    lengths: Box<[usize]>,
    _marker: PhantomData<W>,
}

impl<W: IdWidth> PartitionGroups<W> {
    /// Merges consecutive partitions into at most `concurrency` groups
    /// containing the same number of partitions, without exceeding
    /// [`W::MAX_PARTITION_NODES`](IdWidth::MAX_PARTITION_NODES) nodes per
    /// group.
    ///
    /// The number of groups may exceed `concurrency` only if the ceiling
    /// forces it. A concurrency of zero means one group per partition.
    pub fn merge(partitions: &[Partition], concurrency: usize) -> Self {
        assert!(!partitions.is_empty(), "At least one partition is required");
        let per_group = match concurrency {
            0 => 1,
            _ => thread_size(concurrency, partitions.len()),
        };

        let mut starts = Vec::new();
        let mut lengths = Vec::new();
        let mut iter = partitions.iter().peekable();
        while let Some(first) = iter.next() {
            let mut group = *first;
            let mut parts = 1;
            while parts < per_group {
                match iter.peek() {
                    Some(next) if group.fits(next.node_count, W::MAX_PARTITION_NODES) => {
                        debug_assert_eq!(group.end_node(), next.start_node);
                        group.node_count += next.node_count;
                        parts += 1;
                        iter.next();
                    }
                    _ => break,
                }
            }
            starts.push(W::to_id(group.start_node));
            lengths.push(group.node_count);
        }

        Self {
            starts: starts.into_boxed_slice(),
            lengths: lengths.into_boxed_slice(),
            _marker: PhantomData,
        }
    }

    /// Returns the number of groups.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.starts.len()
    }

    /// Returns true if there are no groups.
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.starts.is_empty()
    }

    /// Returns the first node of each group.
    #[inline(always)]
    pub fn starts(&self) -> &[W::Id] {
        &self.starts
    }

    /// Returns the number of nodes of each group.
    #[inline(always)]
    pub fn lengths(&self) -> &[usize] {
        &self.lengths
    }

    /// Returns the first node of a group.
    #[inline(always)]
    pub fn start_node(&self, group: usize) -> usize {
        Into::<u64>::into(self.starts[group]) as usize
    }

    /// Returns the group containing `node` and the index of `node` inside
    /// the group.
    #[inline(always)]
    pub fn locate(&self, node: usize) -> (usize, usize) {
        let group = match self.starts.binary_search(&W::to_id(node)) {
            Ok(group) => group,
            Err(insertion) => insertion - 1,
        };
        (group, node - self.start_node(group))
    }
}
