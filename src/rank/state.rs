/*
 * SPDX-FileCopyrightText: 2025 The rankprop developers
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use core::fmt::Display;

/// The phase a [compute step](super::ComputeStep) will perform when it is
/// next run.
///
/// The cycle is `Init → Calc → Sync → Calc → …`, with a `Norm` phase between
/// `Sync` and `Calc` for variants that renormalize their deltas at each
/// iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StepState {
    /// Allocates buffers and seeds initial values.
    #[default]
    Init,
    /// Distributes deltas to the partitions owning the targets.
    Calc,
    /// Combines the contributions received from all partitions.
    Sync,
    /// Divides deltas by the global norm.
    Norm,
}

impl StepState {
    /// Returns the state following this one.
    pub fn next(self, normalizes: bool) -> StepState {
        match self {
            StepState::Init => StepState::Calc,
            StepState::Calc => StepState::Sync,
            StepState::Sync if normalizes => StepState::Norm,
            StepState::Sync => StepState::Calc,
            StepState::Norm => StepState::Calc,
        }
    }
}

impl Display for StepState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            StepState::Init => f.write_str("init"),
            StepState::Calc => f.write_str("calc"),
            StepState::Sync => f.write_str("sync"),
            StepState::Norm => f.write_str("norm"),
        }
    }
}
