/*
 * SPDX-FileCopyrightText: 2025 The rankprop developers
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Per-variant auxiliary statistics.
//!
//! Before iterating, each [variant](super::variant::RankVariant) computes a
//! [`DegreeCache`] through its [`DegreeComputer`]. The cache is immutable
//! afterwards and shared read-only by all compute steps.

use crate::traits::*;
use crate::utils::*;
use kahan::KahanSum;
use rayon::prelude::*;
use rayon::ThreadPool;

/// Outgoing weights of all nodes, stored contiguously.
///
/// Only relationships with a positive weight are stored.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedWeights {
    offsets: Box<[usize]>,
    targets: Box<[usize]>,
    weights: Box<[f64]>,
}

impl CachedWeights {
    /// Returns the targets and weights of the relationships of `node`.
    #[inline(always)]
    pub fn of(&self, node: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        let range = self.offsets[node]..self.offsets[node + 1];
        self.targets[range.clone()]
            .iter()
            .copied()
            .zip(self.weights[range].iter().copied())
    }

    /// Returns the number of cached relationships.
    pub fn num_relationships(&self) -> usize {
        self.targets.len()
    }

    fn size_in_bytes(&self) -> u64 {
        size_of_slice::<usize>(self.offsets.len())
            + size_of_slice::<usize>(self.targets.len())
            + size_of_f64_array(self.weights.len())
    }
}

/// Statistics computed once before the iteration starts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DegreeCache {
    /// The average degree of the graph.
    pub average_degree: Option<f64>,
    /// For each node, the sum of the positive weights of its relationships.
    pub aggregated_weights: Option<Box<[f64]>>,
    /// A snapshot of the positive weights of all relationships.
    pub weights: Option<CachedWeights>,
}

impl DegreeCache {
    /// Returns the number of bytes held by this cache.
    pub fn size_in_bytes(&self) -> u64 {
        self.aggregated_weights
            .as_ref()
            .map_or(0, |w| size_of_f64_array(w.len()))
            + self.weights.as_ref().map_or(0, CachedWeights::size_in_bytes)
    }
}

/// Computes a [`DegreeCache`].
pub trait DegreeComputer {
    /// Computes the cache for the relationships of `graph` in the given
    /// direction, using `pool`, if present, or the current thread.
    ///
    /// The bytes held by the returned cache are registered with `tracker`.
    fn compute<G: Graph>(
        &self,
        graph: &G,
        direction: Direction,
        pool: Option<&ThreadPool>,
        tracker: &AllocationTracker,
    ) -> DegreeCache;
}

/// Computes nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDegrees;

impl DegreeComputer for NoDegrees {
    fn compute<G: Graph>(
        &self,
        _graph: &G,
        _direction: Direction,
        _pool: Option<&ThreadPool>,
        _tracker: &AllocationTracker,
    ) -> DegreeCache {
        DegreeCache::default()
    }
}

/// Computes the average degree of the graph.
///
/// The average degree of an empty graph is zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct AverageDegree;

impl DegreeComputer for AverageDegree {
    fn compute<G: Graph>(
        &self,
        graph: &G,
        direction: Direction,
        pool: Option<&ThreadPool>,
        _tracker: &AllocationTracker,
    ) -> DegreeCache {
        let n = graph.num_nodes();
        if n == 0 {
            return DegreeCache {
                average_degree: Some(0.0),
                ..Default::default()
            };
        }
        let degree = |node: usize| graph.degree(node, direction) as f64;
        let sum = match pool {
            Some(pool) => pool.install(|| {
                (0..n)
                    .into_par_iter()
                    .with_min_len(RAYON_MIN_LEN)
                    .fold(KahanSum::<f64>::new, |acc, node| acc + degree(node))
                    .reduce(KahanSum::<f64>::new, |a, b| a + b)
            }),
            None => (0..n).fold(KahanSum::<f64>::new(), |acc, node| acc + degree(node)),
        };
        let average_degree = sum.sum() / n as f64;
        log::debug!("Average degree: {}", average_degree);
        DegreeCache {
            average_degree: Some(average_degree),
            ..Default::default()
        }
    }
}

/// Computes, for each node, the sum of the positive weights of its
/// relationships, optionally caching the weights themselves.
///
/// Non-positive weights do not contribute to the sum, and are not cached.
#[derive(Debug, Clone, Copy, Default)]
pub struct AggregatedWeights {
    pub cache_weights: bool,
}

impl DegreeComputer for AggregatedWeights {
    fn compute<G: Graph>(
        &self,
        graph: &G,
        direction: Direction,
        pool: Option<&ThreadPool>,
        tracker: &AllocationTracker,
    ) -> DegreeCache {
        let n = graph.num_nodes();
        let aggregate = |node: usize| {
            let mut sum = KahanSum::<f64>::new();
            graph.for_each_weighted_relationship(node, direction, |_, _, weight| {
                if weight > 0.0 {
                    sum += weight;
                }
                true
            });
            sum.sum()
        };
        let aggregated_weights: Box<[f64]> = match pool {
            Some(pool) => pool.install(|| {
                (0..n)
                    .into_par_iter()
                    .with_min_len(RAYON_MIN_LEN)
                    .map(aggregate)
                    .collect::<Vec<_>>()
                    .into_boxed_slice()
            }),
            None => (0..n).map(aggregate).collect(),
        };

        let weights = self.cache_weights.then(|| {
            // Offsets are computed sequentially, as they depend on all
            // previous nodes
            let mut offsets = Vec::with_capacity(n + 1);
            let mut targets = Vec::new();
            let mut weights = Vec::new();
            offsets.push(0);
            for node in 0..n {
                graph.for_each_weighted_relationship(node, direction, |_, target, weight| {
                    if weight > 0.0 {
                        targets.push(target);
                        weights.push(weight);
                    }
                    true
                });
                offsets.push(targets.len());
            }
            CachedWeights {
                offsets: offsets.into_boxed_slice(),
                targets: targets.into_boxed_slice(),
                weights: weights.into_boxed_slice(),
            }
        });

        let cache = DegreeCache {
            average_degree: None,
            aggregated_weights: Some(aggregated_weights),
            weights,
        };
        tracker.add(cache.size_in_bytes());
        log::debug!(
            "Aggregated weights computed ({} cached relationships)",
            cache
                .weights
                .as_ref()
                .map_or(0, CachedWeights::num_relationships)
        );
        cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphs::prelude::*;

    fn pool() -> ThreadPool {
        rayon::ThreadPoolBuilder::new()
            .num_threads(3)
            .build()
            .expect("Failed to create thread pool")
    }

    #[test]
    fn test_no_degrees() {
        let g = VecGraph::from_arcs(3, [(0, 1)]);
        let cache = NoDegrees.compute(&g, Direction::Outgoing, None, &AllocationTracker::new());
        assert_eq!(cache, DegreeCache::default());
    }

    #[test]
    fn test_average_degree() {
        let g = VecGraph::from_arcs(4, [(0, 1), (0, 2), (1, 2), (3, 0), (3, 1), (3, 2)]);
        let pool = pool();
        for pool in [None, Some(&pool)] {
            let cache = AverageDegree.compute(&g, Direction::Outgoing, pool, &AllocationTracker::new());
            assert_eq!(cache.average_degree, Some(1.5));
            let cache = AverageDegree.compute(&g, Direction::Both, pool, &AllocationTracker::new());
            assert_eq!(cache.average_degree, Some(3.0));
        }
        let empty = VecGraph::empty(0);
        let cache = AverageDegree.compute(&empty, Direction::Outgoing, None, &AllocationTracker::new());
        assert_eq!(cache.average_degree, Some(0.0));
    }

    #[test]
    fn test_aggregated_weights() {
        let g = VecGraph::from_weighted_arcs(
            3,
            [(0, 1, 0.25), (0, 2, 0.5), (0, 0, -1.0), (1, 2, 0.0), (2, 0, 3.0)],
        );
        let pool = pool();
        for pool in [None, Some(&pool)] {
            let tracker = AllocationTracker::new();
            let cache = AggregatedWeights {
                cache_weights: true,
            }
            .compute(&g, Direction::Outgoing, pool, &tracker);
            assert_eq!(cache.aggregated_weights.as_deref(), Some(&[0.75, 0.0, 3.0][..]));
            let weights = cache.weights.as_ref().unwrap();
            assert_eq!(weights.num_relationships(), 3);
            assert_eq!(weights.of(0).collect::<Vec<_>>(), vec![(1, 0.25), (2, 0.5)]);
            assert_eq!(weights.of(1).count(), 0);
            assert_eq!(tracker.tracked(), cache.size_in_bytes());
        }

        let cache = AggregatedWeights::default().compute(
            &g,
            Direction::Incoming,
            None,
            &AllocationTracker::disabled(),
        );
        assert_eq!(cache.aggregated_weights.as_deref(), Some(&[3.0, 0.25, 0.5][..]));
        assert!(cache.weights.is_none());
    }
}
