/*
 * SPDX-FileCopyrightText: 2025 The rankprop developers
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use super::vec_graph::VecGraph;
use rand::{rngs::SmallRng, Rng, SeedableRng};

/// Provides a deterministic generator of Erdös-Rényi random graphs.
///
/// The Erdös-Rényi random graph model is a simple model for generating random
/// graphs. It is parameterized by the number of nodes `n` and the probability
/// `p` of an arc between any two nodes. In this implementation, loops are never
/// included.
///
/// The time required to generate the graph is quadratic in `n`.
#[derive(Debug, Clone)]
pub struct ErdosRenyi {
    n: usize,
    p: f64,
    seed: u64,
}

impl ErdosRenyi {
    /// Create a new Erdös-Rényi random graph, given the number of
    /// nodes, the probability of an edge between any two nodes, and a
    /// seed for the [pseudorandom number generator](SmallRng).
    pub fn new(n: usize, p: f64, seed: u64) -> Self {
        assert!((0.0..=1.0).contains(&p), "p must be in [0..1]");
        Self { n, p, seed }
    }

    /// Returns the number of nodes of the graph.
    pub fn num_nodes(&self) -> usize {
        self.n
    }

    /// Returns an iterator over the arcs of the graph in lexicographical
    /// order.
    pub fn arcs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let mut rng = SmallRng::seed_from_u64(self.seed);
        (0..self.n).flat_map(move |x| {
            (0..self.n)
                .filter(|&y| y != x && rng.random_bool(self.p))
                .map(|y| (x, y))
                .collect::<Vec<_>>()
        })
    }

    /// Materializes the graph.
    pub fn to_vec_graph(&self) -> VecGraph {
        VecGraph::from_arcs(self.n, self.arcs())
    }

    /// Materializes the graph, assigning to each arc a weight drawn
    /// uniformly from `[0 . . max_weight)`.
    pub fn to_weighted_vec_graph(&self, max_weight: f64) -> VecGraph {
        assert!(max_weight > 0.0, "The maximum weight must be positive");
        let mut rng = SmallRng::seed_from_u64(self.seed.wrapping_add(1));
        let arcs: Vec<_> = self.arcs().collect();
        VecGraph::from_weighted_arcs(
            self.n,
            arcs.into_iter()
                .map(|(x, y)| (x, y, rng.random_range(0.0..max_weight))),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::*;

    #[test]
    fn test_er() {
        let g = ErdosRenyi::new(10, 0.3, 0);
        let a: Vec<_> = g.arcs().collect();
        let b: Vec<_> = g.arcs().collect();
        assert_eq!(a, b);
        assert!(a.iter().all(|&(x, y)| x != y && x < 10 && y < 10));

        let v = g.to_vec_graph();
        assert_eq!(v.num_relationships(), a.len() as u64);
    }

    #[test]
    fn test_weighted() {
        let g = ErdosRenyi::new(20, 0.2, 1).to_weighted_vec_graph(2.0);
        for node in 0..g.num_nodes() {
            g.for_each_weighted_relationship(node, Direction::Outgoing, |_, _, w| {
                assert!((0.0..2.0).contains(&w));
                true
            });
        }
    }
}
