/*
 * SPDX-FileCopyrightText: 2025 The rankprop developers
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Traits describing the read-only graph views the rank engine consumes.
//!
//! The engine never loads or stores graphs: it works on any type
//! implementing [`Graph`], which bundles the [id mapping](IdMapping), the
//! [degrees](Degrees), the [relationship visit](RelationshipIterator) and
//! the [relationship weights](RelationshipWeights) of an already
//! materialized graph.

pub mod graph;
pub use graph::*;
