/*
 * SPDX-FileCopyrightText: 2025 The rankprop developers
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use crate::traits::*;
use std::collections::HashMap;

/// An in-memory [`Graph`] implementation based on vectors of successors and
/// predecessors.
///
/// Arcs may carry a weight; arcs without a weight are reported with the
/// [default weight](VecGraph::set_default_weight), which is 1 unless
/// otherwise specified. Parallel arcs are allowed.
///
/// Optionally, the graph can carry a table of original ids, so that the
/// [`IdMapping`] translation is not the identity.
#[derive(Clone, Debug, PartialEq)]
pub struct VecGraph {
    /// The number of arcs in the graph.
    number_of_arcs: u64,
    /// For each node, its list of successors and optional arc weights.
    succ: Vec<Vec<(usize, Option<f64>)>>,
    /// For each node, its list of predecessors and optional arc weights.
    pred: Vec<Vec<(usize, Option<f64>)>>,
    /// The weight of arcs inserted without one.
    default_weight: f64,
    /// Original ids, indexed by mapped id.
    original_ids: Option<Vec<u64>>,
    /// Inverse of `original_ids`.
    mapped_ids: HashMap<u64, usize>,
}

impl core::default::Default for VecGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl VecGraph {
    /// Creates a new empty graph.
    pub fn new() -> Self {
        Self::empty(0)
    }

    /// Creates a new graph with `n` nodes and no arcs.
    pub fn empty(n: usize) -> Self {
        Self {
            number_of_arcs: 0,
            succ: Vec::from_iter((0..n).map(|_| Vec::new())),
            pred: Vec::from_iter((0..n).map(|_| Vec::new())),
            default_weight: 1.0,
            original_ids: None,
            mapped_ids: HashMap::new(),
        }
    }

    /// Creates a graph with `n` nodes from an [`IntoIterator`] of arcs.
    ///
    /// # Panics
    ///
    /// If an arc refers to a node not smaller than `n`.
    pub fn from_arcs(n: usize, arcs: impl IntoIterator<Item = (usize, usize)>) -> Self {
        let mut g = Self::empty(n);
        g.add_arcs(arcs);
        g
    }

    /// Creates a graph with `n` nodes from an [`IntoIterator`] of weighted
    /// arcs.
    ///
    /// # Panics
    ///
    /// If an arc refers to a node not smaller than `n`.
    pub fn from_weighted_arcs(n: usize, arcs: impl IntoIterator<Item = (usize, usize, f64)>) -> Self {
        let mut g = Self::empty(n);
        for (u, v, w) in arcs {
            g.add_weighted_arc(u, v, w);
        }
        g
    }

    /// Sets the weight reported for arcs inserted without a weight.
    pub fn set_default_weight(&mut self, default_weight: f64) -> &mut Self {
        self.default_weight = default_weight;
        self
    }

    /// Sets the original ids of the nodes.
    ///
    /// # Panics
    ///
    /// If the number of ids is not the number of nodes, or if ids are
    /// duplicated.
    pub fn with_original_ids(mut self, original_ids: Vec<u64>) -> Self {
        assert_eq!(
            original_ids.len(),
            self.succ.len(),
            "The number of original ids ({}) does not match the number of nodes ({})",
            original_ids.len(),
            self.succ.len()
        );
        self.mapped_ids = original_ids
            .iter()
            .enumerate()
            .map(|(node, &original)| (original, node))
            .collect();
        assert_eq!(
            self.mapped_ids.len(),
            original_ids.len(),
            "Original ids must be distinct"
        );
        self.original_ids = Some(original_ids);
        self
    }

    /// Adds an isolated node to the graph and returns its id.
    pub fn add_node(&mut self) -> usize {
        assert!(
            self.original_ids.is_none(),
            "Cannot add nodes to a graph with original ids"
        );
        self.succ.push(Vec::new());
        self.pred.push(Vec::new());
        self.succ.len() - 1
    }

    /// Adds an unweighted arc to the graph.
    ///
    /// # Panics
    ///
    /// If the given nodes are not smaller than the number of nodes in the
    /// graph.
    pub fn add_arc(&mut self, u: usize, v: usize) {
        self.push_arc(u, v, None);
    }

    /// Adds a weighted arc to the graph.
    ///
    /// # Panics
    ///
    /// If the given nodes are not smaller than the number of nodes in the
    /// graph.
    pub fn add_weighted_arc(&mut self, u: usize, v: usize, w: f64) {
        self.push_arc(u, v, Some(w));
    }

    /// Adds unweighted arcs from an [`IntoIterator`].
    pub fn add_arcs(&mut self, arcs: impl IntoIterator<Item = (usize, usize)>) {
        for (u, v) in arcs {
            self.add_arc(u, v);
        }
    }

    fn push_arc(&mut self, u: usize, v: usize, w: Option<f64>) {
        let max = u.max(v);
        if max >= self.succ.len() {
            panic!(
                "Node {} does not exist (the graph has {} nodes)",
                max,
                self.succ.len(),
            );
        }
        self.succ[u].push((v, w));
        self.pred[v].push((u, w));
        self.number_of_arcs += 1;
    }

    /// Returns the successors of a node.
    pub fn successors(&self, node: usize) -> impl Iterator<Item = usize> + '_ {
        self.succ[node].iter().map(|&(v, _)| v)
    }

    /// Returns the predecessors of a node.
    pub fn predecessors(&self, node: usize) -> impl Iterator<Item = usize> + '_ {
        self.pred[node].iter().map(|&(u, _)| u)
    }

    #[inline(always)]
    fn lists(&self, node: usize, direction: Direction) -> [&[(usize, Option<f64>)]; 2] {
        match direction {
            Direction::Outgoing => [&self.succ[node], &[]],
            Direction::Incoming => [&self.pred[node], &[]],
            Direction::Both => [&self.succ[node], &self.pred[node]],
        }
    }
}

impl IdMapping for VecGraph {
    #[inline(always)]
    fn num_nodes(&self) -> usize {
        self.succ.len()
    }

    fn to_mapped_node_id(&self, original: u64) -> Option<usize> {
        match &self.original_ids {
            Some(_) => self.mapped_ids.get(&original).copied(),
            None => usize::try_from(original)
                .ok()
                .filter(|&node| node < self.num_nodes()),
        }
    }

    fn to_original_node_id(&self, node: usize) -> u64 {
        match &self.original_ids {
            Some(ids) => ids[node],
            None => node as u64,
        }
    }
}

impl Degrees for VecGraph {
    #[inline(always)]
    fn degree(&self, node: usize, direction: Direction) -> usize {
        let [a, b] = self.lists(node, direction);
        a.len() + b.len()
    }
}

impl RelationshipIterator for VecGraph {
    fn for_each_relationship(
        &self,
        node: usize,
        direction: Direction,
        mut f: impl FnMut(usize, usize) -> bool,
    ) {
        for list in self.lists(node, direction) {
            for &(target, _) in list {
                if !f(node, target) {
                    return;
                }
            }
        }
    }
}

impl RelationshipWeights for VecGraph {
    fn weight(&self, source: usize, target: usize) -> f64 {
        self.succ[source]
            .iter()
            .chain(self.pred[source].iter())
            .find(|&&(other, _)| other == target)
            .and_then(|&(_, w)| w)
            .unwrap_or(self.default_weight)
    }

    fn for_each_weighted_relationship(
        &self,
        node: usize,
        direction: Direction,
        mut f: impl FnMut(usize, usize, f64) -> bool,
    ) {
        for list in self.lists(node, direction) {
            for &(target, w) in list {
                if !f(node, target, w.unwrap_or(self.default_weight)) {
                    return;
                }
            }
        }
    }
}

impl Graph for VecGraph {
    #[inline(always)]
    fn num_relationships(&self) -> u64 {
        self.number_of_arcs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directions() {
        let g = VecGraph::from_arcs(4, [(0, 1), (0, 2), (1, 2), (3, 0)]);
        assert_eq!(g.num_relationships(), 4);
        assert_eq!(g.degree(0, Direction::Outgoing), 2);
        assert_eq!(g.degree(0, Direction::Incoming), 1);
        assert_eq!(g.degree(0, Direction::Both), 3);

        let mut visited = vec![];
        g.for_each_relationship(0, Direction::Both, |s, t| {
            visited.push((s, t));
            true
        });
        assert_eq!(visited, vec![(0, 1), (0, 2), (0, 3)]);
    }

    #[test]
    fn test_early_stop() {
        let g = VecGraph::from_arcs(4, [(0, 1), (0, 2), (0, 3)]);
        let mut count = 0;
        g.for_each_relationship(0, Direction::Outgoing, |_, _| {
            count += 1;
            count < 2
        });
        assert_eq!(count, 2);
    }

    #[test]
    fn test_weights() {
        let mut g = VecGraph::from_weighted_arcs(3, [(0, 1, 0.5), (1, 2, 2.0)]);
        g.add_arc(2, 0);
        assert_eq!(g.weight(0, 1), 0.5);
        assert_eq!(g.weight(2, 0), 1.0);
        // Incoming view sees the weight of the reversed arc
        assert_eq!(g.weight(2, 1), 2.0);
        g.set_default_weight(0.0);
        assert_eq!(g.weight(2, 0), 0.0);

        let mut seen = vec![];
        g.for_each_weighted_relationship(1, Direction::Incoming, |s, t, w| {
            seen.push((s, t, w));
            true
        });
        assert_eq!(seen, vec![(1, 0, 0.5)]);
    }

    #[test]
    fn test_original_ids() {
        let g = VecGraph::from_arcs(3, [(0, 1)]).with_original_ids(vec![10, 20, 30]);
        assert_eq!(g.to_mapped_node_id(20), Some(1));
        assert_eq!(g.to_mapped_node_id(1), None);
        assert_eq!(g.to_original_node_id(2), 30);

        let h = VecGraph::empty(3);
        assert_eq!(h.to_mapped_node_id(2), Some(2));
        assert_eq!(h.to_mapped_node_id(3), None);
    }

    #[test]
    #[should_panic]
    fn test_missing_node() {
        VecGraph::from_arcs(2, [(0, 2)]);
    }
}
