/*
 * SPDX-FileCopyrightText: 2025 The rankprop developers
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! In-memory implementations of the [graph traits](crate::traits).

pub mod arcs;
pub mod random;
pub mod vec_graph;

pub mod prelude {
    pub use super::arcs::{read_arcs, ArcsOptions, ParseArcsError};
    pub use super::random::ErdosRenyi;
    pub use super::vec_graph::VecGraph;
}
