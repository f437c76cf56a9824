/*
 * SPDX-FileCopyrightText: 2025 The rankprop developers
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Rank-propagation rules.
//!
//! All variants share the same iteration: at each step, every node with a
//! positive delta distributes shares of it along its relationships, and
//! every node combines the shares it received into its new delta and rank.
//! A variant decides the initial values, how a delta is split into shares,
//! and how received shares are combined:
//!
//! | Variant                    | Share along an edge                   | Damped | Initial value       |
//! |----------------------------|---------------------------------------|--------|---------------------|
//! | [`PlainPageRank`]          | δ / *d*                               | yes    | 1 − α               |
//! | [`WeightedPageRank`]       | δ · *w* / *W*                         | yes    | 1 − α               |
//! | [`ArticleRank`]            | δ / (*d* + *d̄*)                       | yes    | 1 − α               |
//! | [`EigenvectorCentrality`]  | δ                                     | no     | 1 / *n*             |
//!
//! Here *d* is the degree of the node, *d̄* the average degree of the graph,
//! *w* the weight of the edge and *W* the sum of the positive weights of the
//! edges of the node.

use super::degree::*;
use crate::traits::*;
use core::fmt::{Debug, Display};

/// A rank-propagation rule.
pub trait RankVariant: Debug + Send + Sync {
    /// The computer of the auxiliary statistics needed by this variant.
    type Computer: DegreeComputer;

    /// Returns the computer of the auxiliary statistics needed by this
    /// variant.
    fn degree_computer(&self) -> Self::Computer;

    /// Returns the initial rank of a node, given the teleportation
    /// probability `alpha` (one minus the damping factor) and the number of
    /// nodes.
    fn initial_value(&self, alpha: f64, _node_count: usize) -> f64 {
        alpha
    }

    /// Returns whether initial values are restricted to source nodes, when
    /// source nodes are given.
    fn honors_source_nodes(&self) -> bool {
        true
    }

    /// Returns the damping applied when combining received shares.
    fn damping(&self, damping_factor: f64) -> f64 {
        damping_factor
    }

    /// Splits the delta of `node` into shares, calling `emit(target, share)`
    /// for each share.
    fn distribute<G: Graph>(
        &self,
        graph: &G,
        direction: Direction,
        node: usize,
        delta: f64,
        cache: &DegreeCache,
        emit: impl FnMut(usize, f64),
    );

    /// Combines the sum of the shares received by a node into its rank and
    /// its delta for the next iteration.
    #[inline(always)]
    fn combine(&self, rank: &mut f64, delta: &mut f64, sum: f64, damping: f64) {
        *delta = damping * sum;
        *rank += *delta;
    }

    /// Returns whether deltas are divided by their global L2 norm after
    /// each iteration.
    fn normalizes(&self) -> bool {
        false
    }
}

/// Classic PageRank: deltas are divided evenly among relationships.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainPageRank;

impl RankVariant for PlainPageRank {
    type Computer = NoDegrees;

    fn degree_computer(&self) -> NoDegrees {
        NoDegrees
    }

    #[inline(always)]
    fn distribute<G: Graph>(
        &self,
        graph: &G,
        direction: Direction,
        node: usize,
        delta: f64,
        _cache: &DegreeCache,
        mut emit: impl FnMut(usize, f64),
    ) {
        let degree = graph.degree(node, direction);
        if degree == 0 {
            return;
        }
        let share = delta / degree as f64;
        graph.for_each_relationship(node, direction, |_, target| {
            emit(target, share);
            true
        });
    }
}

/// Weighted PageRank: deltas are divided proportionally to the weights of
/// relationships.
///
/// Relationships with a non-positive weight receive nothing, and nodes whose
/// positive weights sum to zero distribute nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeightedPageRank {
    /// Whether to snapshot weights before iterating instead of reading them
    /// from the graph at each iteration.
    pub cache_weights: bool,
}

impl RankVariant for WeightedPageRank {
    type Computer = AggregatedWeights;

    fn degree_computer(&self) -> AggregatedWeights {
        AggregatedWeights {
            cache_weights: self.cache_weights,
        }
    }

    #[inline(always)]
    fn distribute<G: Graph>(
        &self,
        graph: &G,
        direction: Direction,
        node: usize,
        delta: f64,
        cache: &DegreeCache,
        mut emit: impl FnMut(usize, f64),
    ) {
        let Some(aggregated_weights) = cache.aggregated_weights.as_deref() else {
            return;
        };
        let total = aggregated_weights[node];
        if total <= 0.0 {
            return;
        }
        match &cache.weights {
            Some(weights) => {
                for (target, weight) in weights.of(node) {
                    emit(target, delta * (weight / total));
                }
            }
            None => graph.for_each_weighted_relationship(node, direction, |_, target, weight| {
                if weight > 0.0 {
                    emit(target, delta * (weight / total));
                }
                true
            }),
        }
    }
}

/// ArticleRank: the average degree of the graph is added to the degree of
/// each node, reducing the influence of nodes with few relationships.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArticleRank;

impl RankVariant for ArticleRank {
    type Computer = AverageDegree;

    fn degree_computer(&self) -> AverageDegree {
        AverageDegree
    }

    #[inline(always)]
    fn distribute<G: Graph>(
        &self,
        graph: &G,
        direction: Direction,
        node: usize,
        delta: f64,
        cache: &DegreeCache,
        mut emit: impl FnMut(usize, f64),
    ) {
        let degree = graph.degree(node, direction);
        if degree == 0 {
            return;
        }
        let share = delta / (degree as f64 + cache.average_degree.unwrap_or(0.0));
        graph.for_each_relationship(node, direction, |_, target| {
            emit(target, share);
            true
        });
    }
}

/// Eigenvector centrality: undamped propagation of the whole delta along
/// every relationship. Deltas are divided by their global L2 norm after each
/// iteration, while ranks keep accumulating the unnormalized sums.
///
/// Source nodes are ignored, and every node starts from 1 / *n*.
#[derive(Debug, Clone, Copy, Default)]
pub struct EigenvectorCentrality;

impl RankVariant for EigenvectorCentrality {
    type Computer = NoDegrees;

    fn degree_computer(&self) -> NoDegrees {
        NoDegrees
    }

    fn initial_value(&self, _alpha: f64, node_count: usize) -> f64 {
        1.0 / node_count as f64
    }

    fn honors_source_nodes(&self) -> bool {
        false
    }

    fn damping(&self, _damping_factor: f64) -> f64 {
        1.0
    }

    #[inline(always)]
    fn distribute<G: Graph>(
        &self,
        graph: &G,
        direction: Direction,
        node: usize,
        delta: f64,
        _cache: &DegreeCache,
        mut emit: impl FnMut(usize, f64),
    ) {
        graph.for_each_relationship(node, direction, |_, target| {
            emit(target, delta);
            true
        });
    }

    fn normalizes(&self) -> bool {
        true
    }
}

/// Runtime selector of a [variant](RankVariant).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Variant {
    /// [`PlainPageRank`].
    #[default]
    PageRank,
    /// [`WeightedPageRank`].
    Weighted { cache_weights: bool },
    /// [`ArticleRank`].
    ArticleRank,
    /// [`EigenvectorCentrality`].
    Eigenvector,
}

impl Display for Variant {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Variant::PageRank => f.write_str("PageRank"),
            Variant::Weighted {
                cache_weights: false,
            } => f.write_str("weighted PageRank"),
            Variant::Weighted {
                cache_weights: true,
            } => f.write_str("weighted PageRank (cached weights)"),
            Variant::ArticleRank => f.write_str("ArticleRank"),
            Variant::Eigenvector => f.write_str("eigenvector centrality"),
        }
    }
}
