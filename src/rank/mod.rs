/*
 * SPDX-FileCopyrightText: 2025 The rankprop developers
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Partitioned rank propagation.
//!
//! The entry point is [`PageRank`], which computes PageRank, personalized
//! PageRank, weighted PageRank, ArticleRank or eigenvector centrality
//! depending on its [variant](variant::RankVariant). [`RankConfig`] selects
//! variant and [width](width::IdWidth) at run time.
//!
//! The computation proceeds in rounds of phases run by one
//! [`ComputeStep`] per group of partitions, under the control of
//! [`ComputeSteps`]; every phase ends with a barrier, and contributions
//! between steps travel through rows of slots whose ownership is moved
//! between steps between phases. No locks are involved.

pub mod budget;
pub mod degree;
pub mod partition;
pub mod result;
pub mod state;
pub mod variant;
pub mod width;

mod compute_step;
pub use compute_step::*;

mod compute_steps;
pub use compute_steps::*;

mod pagerank;
pub use pagerank::*;

pub mod prelude {
    pub use super::result::{
        CentralityResult, DenseRanks, Normalization, NormalizedResult, PartitionedRanks,
        RankResult,
    };
    pub use super::variant::{
        ArticleRank, EigenvectorCentrality, PlainPageRank, RankVariant, Variant,
        WeightedPageRank,
    };
    pub use super::width::{Huge, IdWidth, Standard};
    pub use super::{PageRank, RankConfig};
}
