/*
 * SPDX-FileCopyrightText: 2025 The rankprop developers
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

/*!

Basic traits to access a read-only graph by node.

Nodes are identified by _mapped_ ids in the range [0 . . *n*), where *n* is
the [number of nodes](IdMapping::num_nodes). The graph store the view was
built from may use different, _original_ ids: [`IdMapping`] translates
between the two.

*/

use core::fmt::Display;

/// The direction in which relationships are followed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Direction {
    /// Follow relationships from their source to their target.
    #[default]
    Outgoing,
    /// Follow relationships from their target to their source.
    Incoming,
    /// Follow relationships in both directions, that is, treat the graph as
    /// undirected. Outgoing relationships are visited first.
    Both,
}

impl Display for Direction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Direction::Outgoing => f.write_str("outgoing"),
            Direction::Incoming => f.write_str("incoming"),
            Direction::Both => f.write_str("both"),
        }
    }
}

/// Translation between the original ids of a graph store and the dense
/// mapped ids used by the algorithms.
pub trait IdMapping {
    /// Returns the number of nodes of the graph.
    fn num_nodes(&self) -> usize;

    /// Returns the mapped id of an original id, or `None` if the original id
    /// does not belong to this view of the graph.
    ///
    /// The default implementation is the identity on [0 . . *n*).
    fn to_mapped_node_id(&self, original: u64) -> Option<usize> {
        usize::try_from(original)
            .ok()
            .filter(|&node| node < self.num_nodes())
    }

    /// Returns the original id of a mapped id.
    ///
    /// The default implementation is the identity.
    fn to_original_node_id(&self, node: usize) -> u64 {
        node as u64
    }
}

/// Per-node degrees.
pub trait Degrees {
    /// Returns the number of relationships of `node` in the given direction.
    fn degree(&self, node: usize, direction: Direction) -> usize;
}

/// Visit of the relationships of a node.
///
/// Implementations must be usable concurrently through shared references:
/// every worker of the engine receives its own `&` borrow, which plays the
/// role of an independent cursor.
pub trait RelationshipIterator {
    /// Calls `f(source, target)` on each relationship of `node` in the given
    /// direction, where `source` is always `node`. The visit stops as soon
    /// as `f` returns `false`.
    ///
    /// The order of the visit is unspecified.
    fn for_each_relationship(
        &self,
        node: usize,
        direction: Direction,
        f: impl FnMut(usize, usize) -> bool,
    );
}

/// Weights of relationships.
pub trait RelationshipWeights: RelationshipIterator {
    /// Returns the weight of the relationship from `source` to `target`, or a
    /// default weight if there is no such relationship or it carries no
    /// weight.
    fn weight(&self, source: usize, target: usize) -> f64;

    /// Calls `f(source, target, weight)` on each relationship of `node` in the
    /// given direction. The visit stops as soon as `f` returns `false`.
    ///
    /// The default implementation looks up every weight with
    /// [`weight`](RelationshipWeights::weight); implementations storing weights
    /// alongside the adjacency lists should override it.
    fn for_each_weighted_relationship(
        &self,
        node: usize,
        direction: Direction,
        mut f: impl FnMut(usize, usize, f64) -> bool,
    ) {
        self.for_each_relationship(node, direction, |source, target| {
            f(source, target, self.weight(source, target))
        });
    }
}

/// A read-only graph view, shareable among threads.
pub trait Graph: IdMapping + Degrees + RelationshipIterator + RelationshipWeights + Sync {
    /// Returns the number of relationships of the graph.
    fn num_relationships(&self) -> u64;
}
