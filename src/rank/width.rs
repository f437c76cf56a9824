/*
 * SPDX-FileCopyrightText: 2025 The rankprop developers
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Node-id widths.
//!
//! The engine comes in two flavors sharing the same algorithmic shape:
//!
//! - [`Standard`] stores partition offsets as `u32` and accumulates
//!   cross-partition contributions in fixed point: every share is multiplied
//!   by [`Standard::SCALE`], truncated to an `i32` and added with saturating
//!   integer arithmetic, so the result does not depend on the order of
//!   accumulation;
//! - [`Huge`] stores partition offsets as `u64`, bounds the number of nodes
//!   of a partition so that local indices always fit in 31 bits, accumulates
//!   contributions in `f32` slots, and sizes its concurrency according to a
//!   [memory budget](crate::utils::MemoryBudget).
//!
//! In both cases the running rank estimates are kept in `f64`.

use core::fmt::Debug;

/// A node-id width, selecting id types, score slots and partition limits.
pub trait IdWidth: Debug + Clone + Copy + Default + Send + Sync + 'static {
    /// The type used to store node ids, such as partition offsets.
    type Id: Debug + Copy + Ord + Send + Sync + Into<u64>;
    /// The type of the slots through which contributions are handed from a
    /// partition to another.
    type Score: Debug + Copy + Default + Send + Sync;

    /// A human-readable name for logging.
    const NAME: &'static str;
    /// The largest number of nodes supported.
    const MAX_NODE_COUNT: usize;
    /// The largest number of nodes in a partition or group of partitions.
    const MAX_PARTITION_NODES: usize;
    /// Whether concurrency is adjusted to the available memory.
    const BUDGETED: bool;

    /// Converts a node to an [`Id`](IdWidth::Id).
    ///
    /// The node must be smaller than [`MAX_NODE_COUNT`](IdWidth::MAX_NODE_COUNT).
    fn to_id(node: usize) -> Self::Id;

    /// Adds a share to a slot, returning whether a write happened.
    ///
    /// Shares that round to zero in the slot representation are skipped.
    fn add_share(slot: &mut Self::Score, share: f64) -> bool;

    /// Returns the sum of the given slots and resets them to zero.
    fn drain<'s>(slots: impl IntoIterator<Item = &'s mut Self::Score>) -> f64
    where
        Self::Score: 's;
}

/// 32-bit node ids with fixed-point accumulation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Standard;

impl Standard {
    /// The fixed-point scale of shares.
    pub const SCALE: f64 = 100_000.0;
}

impl IdWidth for Standard {
    type Id = u32;
    type Score = i32;

    const NAME: &'static str = "standard";
    const MAX_NODE_COUNT: usize = u32::MAX as usize;
    const MAX_PARTITION_NODES: usize = usize::MAX;
    const BUDGETED: bool = false;

    #[inline(always)]
    fn to_id(node: usize) -> u32 {
        debug_assert!(node <= Self::MAX_NODE_COUNT);
        node as u32
    }

    #[inline(always)]
    fn add_share(slot: &mut i32, share: f64) -> bool {
        // Saturating float-to-int conversion, truncating toward zero
        let fixed = (share * Self::SCALE) as i32;
        if fixed == 0 {
            return false;
        }
        *slot = slot.saturating_add(fixed);
        true
    }

    #[inline(always)]
    fn drain<'s>(slots: impl IntoIterator<Item = &'s mut i32>) -> f64 {
        // Summing in integer arithmetic makes the result independent of the
        // number of slots
        let mut sum = 0i64;
        for slot in slots {
            sum += *slot as i64;
            *slot = 0;
        }
        sum as f64 / Self::SCALE
    }
}

/// 64-bit node ids with single-precision accumulation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Huge;

impl IdWidth for Huge {
    type Id = u64;
    type Score = f32;

    const NAME: &'static str = "huge";
    const MAX_NODE_COUNT: usize = usize::MAX;
    const MAX_PARTITION_NODES: usize = (i32::MAX as usize - 32) >> 1;
    const BUDGETED: bool = true;

    #[inline(always)]
    fn to_id(node: usize) -> u64 {
        node as u64
    }

    #[inline(always)]
    fn add_share(slot: &mut f32, share: f64) -> bool {
        let share = share as f32;
        if share == 0.0 {
            return false;
        }
        *slot += share;
        true
    }

    #[inline(always)]
    fn drain<'s>(slots: impl IntoIterator<Item = &'s mut f32>) -> f64 {
        let mut sum = 0.0;
        for slot in slots {
            sum += *slot as f64;
            *slot = 0.0;
        }
        sum
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_point() {
        let mut slot = 0;
        assert!(Standard::add_share(&mut slot, 0.123456789));
        assert_eq!(slot, 12345);
        // Below the resolution
        assert!(!Standard::add_share(&mut slot, 0.000009));
        assert_eq!(slot, 12345);
        assert!(Standard::add_share(&mut slot, 1.0));
        let mut other = 7;
        assert_eq!(Standard::drain([&mut slot, &mut other]), 1.12352);
        assert_eq!((slot, other), (0, 0));
    }

    #[test]
    fn test_saturation() {
        let mut slot = 0;
        Standard::add_share(&mut slot, 20_000.0);
        Standard::add_share(&mut slot, 20_000.0);
        assert_eq!(slot, i32::MAX);
        Standard::add_share(&mut slot, f64::INFINITY);
        assert_eq!(slot, i32::MAX);
    }

    #[test]
    fn test_single_precision() {
        let mut slot = 0.0;
        assert!(Huge::add_share(&mut slot, 0.25));
        assert!(Huge::add_share(&mut slot, 0.5));
        assert!(!Huge::add_share(&mut slot, 1E-50));
        assert_eq!(Huge::drain([&mut slot]), 0.75);
        assert_eq!(slot, 0.0);
    }

    #[test]
    fn test_limits() {
        assert_eq!(Huge::MAX_PARTITION_NODES, 1_073_741_807);
        assert_eq!(Standard::to_id(42), 42u32);
        assert_eq!(Huge::to_id(42), 42u64);
    }
}
