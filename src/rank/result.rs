/*
 * SPDX-FileCopyrightText: 2025 The rankprop developers
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Results of a rank computation.
//!
//! Scores are indexed by mapped node id. A computation with a single compute
//! step yields [`DenseRanks`], a single array; otherwise, the arrays of the
//! steps are kept as they are in [`PartitionedRanks`], and a score lookup
//! binary-searches the starts of the partitions.

use super::width::IdWidth;
use core::fmt::Display;
use core::marker::PhantomData;
use kahan::KahanSum;

/// Read-only access to the scores of a centrality computation.
pub trait CentralityResult {
    /// Returns the score of a node, given its mapped id.
    fn score(&self, node: usize) -> f64;

    /// Returns the number of nodes.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the maximum score, or zero if there are no nodes.
    fn compute_max(&self) -> f64 {
        (0..self.len()).map(|node| self.score(node)).fold(0.0, f64::max)
    }

    /// Returns the sum of the absolute values of the scores.
    fn compute_l1_norm(&self) -> f64 {
        (0..self.len())
            .fold(KahanSum::new(), |acc, node| acc + self.score(node).abs())
            .sum()
    }

    /// Returns the Euclidean norm of the scores.
    fn compute_l2_norm(&self) -> f64 {
        (0..self.len())
            .fold(KahanSum::new(), |acc, node| {
                let score = self.score(node);
                acc + score * score
            })
            .sum()
            .sqrt()
    }

    /// Returns the scores as a vector indexed by mapped node id.
    fn to_vec(&self) -> Vec<f64> {
        (0..self.len()).map(|node| self.score(node)).collect()
    }
}

/// Scores stored in a single array.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseRanks {
    ranks: Box<[f64]>,
}

impl DenseRanks {
    pub fn new(ranks: Box<[f64]>) -> Self {
        Self { ranks }
    }

    /// Returns the underlying array.
    pub fn as_slice(&self) -> &[f64] {
        &self.ranks
    }

    pub fn into_inner(self) -> Box<[f64]> {
        self.ranks
    }
}

impl CentralityResult for DenseRanks {
    #[inline(always)]
    fn score(&self, node: usize) -> f64 {
        self.ranks[node]
    }

    fn len(&self) -> usize {
        self.ranks.len()
    }

    fn to_vec(&self) -> Vec<f64> {
        self.ranks.to_vec()
    }
}

/// Scores stored in one array per group of partitions.
#[derive(Debug, Clone, PartialEq)]
pub struct PartitionedRanks<W: IdWidth> {
    starts: Box<[W::Id]>,
    ranks: Box<[Box<[f64]>]>,
    len: usize,
    _marker: PhantomData<W>,
}

impl<W: IdWidth> PartitionedRanks<W> {
    /// Creates partitioned scores from the first node of each array and the
    /// arrays themselves.
    ///
    /// The arrays must be contiguous: each start must be the previous start
    /// plus the length of the previous array, and the first start must be
    /// zero.
    pub fn new(starts: Box<[W::Id]>, ranks: Box<[Box<[f64]>]>) -> Self {
        assert_eq!(
            starts.len(),
            ranks.len(),
            "The number of starts ({}) differs from the number of arrays ({})",
            starts.len(),
            ranks.len()
        );
        let mut len = 0_usize;
        for (&start, ranks) in starts.iter().zip(ranks.iter()) {
            assert_eq!(
                Into::<u64>::into(start),
                len as u64,
                "Arrays are not contiguous"
            );
            len += ranks.len();
        }
        Self {
            starts,
            ranks,
            len,
            _marker: PhantomData,
        }
    }

    /// Returns the first node of each array.
    pub fn starts(&self) -> &[W::Id] {
        &self.starts
    }

    /// Returns the arrays.
    pub fn ranks(&self) -> &[Box<[f64]>] {
        &self.ranks
    }
}

impl<W: IdWidth> CentralityResult for PartitionedRanks<W> {
    #[inline(always)]
    fn score(&self, node: usize) -> f64 {
        assert!(
            node < self.len,
            "Node {} out of range (there are {} nodes)",
            node,
            self.len
        );
        let node = node as u64;
        let group = self
            .starts
            .partition_point(|&start| Into::<u64>::into(start) <= node)
            - 1;
        self.ranks[group][(node - Into::<u64>::into(self.starts[group])) as usize]
    }

    fn len(&self) -> usize {
        self.len
    }

    fn to_vec(&self) -> Vec<f64> {
        self.ranks.iter().flat_map(|ranks| ranks.iter().copied()).collect()
    }
}

/// The result of a computation, in one of its two layouts.
#[derive(Debug, Clone, PartialEq)]
pub enum RankResult<W: IdWidth> {
    Dense(DenseRanks),
    Partitioned(PartitionedRanks<W>),
}

impl<W: IdWidth> CentralityResult for RankResult<W> {
    #[inline(always)]
    fn score(&self, node: usize) -> f64 {
        match self {
            RankResult::Dense(ranks) => ranks.score(node),
            RankResult::Partitioned(ranks) => ranks.score(node),
        }
    }

    fn len(&self) -> usize {
        match self {
            RankResult::Dense(ranks) => ranks.len(),
            RankResult::Partitioned(ranks) => ranks.len(),
        }
    }

    fn to_vec(&self) -> Vec<f64> {
        match self {
            RankResult::Dense(ranks) => ranks.to_vec(),
            RankResult::Partitioned(ranks) => ranks.to_vec(),
        }
    }
}

/// A post-processing of scores, dividing them by one of their statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Normalization {
    /// Scores are left unchanged.
    #[default]
    None,
    /// Scores are divided by their maximum.
    Max,
    /// Scores are divided by their L1 norm.
    L1Norm,
    /// Scores are divided by their L2 norm.
    L2Norm,
}

impl Normalization {
    /// Returns a view of `result` with normalized scores.
    ///
    /// If the chosen statistic is not positive, scores are left unchanged.
    pub fn apply<R: CentralityResult>(self, result: &R) -> NormalizedResult<'_, R> {
        let divisor = match self {
            Normalization::None => 1.0,
            Normalization::Max => result.compute_max(),
            Normalization::L1Norm => result.compute_l1_norm(),
            Normalization::L2Norm => result.compute_l2_norm(),
        };
        NormalizedResult {
            result,
            divisor: if divisor > 0.0 { divisor } else { 1.0 },
        }
    }
}

impl Display for Normalization {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            Normalization::None => "none",
            Normalization::Max => "max",
            Normalization::L1Norm => "L1 norm",
            Normalization::L2Norm => "L2 norm",
        })
    }
}

/// Scores of a [`CentralityResult`] divided by a constant.
#[derive(Debug, Clone, Copy)]
pub struct NormalizedResult<'a, R> {
    result: &'a R,
    divisor: f64,
}

impl<R> NormalizedResult<'_, R> {
    /// Returns the divisor applied to scores.
    pub fn divisor(&self) -> f64 {
        self.divisor
    }
}

impl<R: CentralityResult> CentralityResult for NormalizedResult<'_, R> {
    #[inline(always)]
    fn score(&self, node: usize) -> f64 {
        self.result.score(node) / self.divisor
    }

    fn len(&self) -> usize {
        self.result.len()
    }
}
