/*
 * SPDX-FileCopyrightText: 2025 The rankprop developers
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use super::compute_step::ComputeStep;
use super::result::{DenseRanks, PartitionedRanks, RankResult};
use super::variant::RankVariant;
use super::width::IdWidth;
use crate::traits::*;
use dsi_progress_logger::ProgressLog;
use kahan::KahanSum;
use rayon::prelude::*;
use rayon::ThreadPool;
use std::sync::atomic::{AtomicBool, Ordering};

/// The coordinator of the [compute steps](ComputeStep) of a computation.
///
/// Each iteration runs the phases `Calc`, `Sync` and, for normalizing
/// variants, `Norm` on all steps; a phase starts only after the previous one
/// has completed on every step. Between `Calc` and `Sync` the outbound rows
/// of every step are transposed into the inbound rows of their readers, and
/// after `Sync` they are handed back to their writers: rows are moved, never
/// copied.
///
/// Phases run on the given thread pool, or sequentially on the current
/// thread if there is no pool or a single step.
pub struct ComputeSteps<'a, W: IdWidth, G: Graph, V: RankVariant> {
    steps: Vec<ComputeStep<'a, W, G, V>>,
    pool: Option<&'a ThreadPool>,
    normalizes: bool,
    iterations: usize,
}

impl<W: IdWidth, G: Graph, V: RankVariant> core::fmt::Debug for ComputeSteps<'_, W, G, V> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ComputeSteps")
            .field("steps", &self.steps)
            .field("parallel", &self.pool.is_some())
            .field("normalizes", &self.normalizes)
            .field("iterations", &self.iterations)
            .finish()
    }
}

impl<'a, W: IdWidth, G: Graph, V: RankVariant> ComputeSteps<'a, W, G, V> {
    /// Creates a coordinator for the given steps, which must be in group
    /// order and not yet initialized.
    pub fn new(steps: Vec<ComputeStep<'a, W, G, V>>, pool: Option<&'a ThreadPool>, normalizes: bool) -> Self {
        assert!(!steps.is_empty(), "At least one compute step is required");
        debug_assert!(steps.iter().enumerate().all(|(i, step)| step.index() == i));
        Self {
            steps,
            pool,
            normalizes,
            iterations: 0,
        }
    }

    /// Returns the steps.
    pub fn steps(&self) -> &[ComputeStep<'a, W, G, V>] {
        &self.steps
    }

    /// Returns the number of iterations completed so far.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Initializes the steps and runs `iterations` iterations.
    ///
    /// If `termination` becomes true, the computation stops before the next
    /// iteration, leaving the ranks of the last completed iteration.
    pub fn run(
        &mut self,
        iterations: usize,
        termination: Option<&AtomicBool>,
        pl: &mut impl ProgressLog,
    ) {
        self.run_phase();

        pl.item_name("iteration");
        pl.expected_updates(Some(iterations));
        pl.start(format!(
            "Iterating on {} compute step(s) ({} width)...",
            self.steps.len(),
            W::NAME
        ));

        for _ in 0..iterations {
            if termination.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
                log::info!(
                    "Computation terminated after {} iteration(s)",
                    self.iterations
                );
                break;
            }

            // Calc
            self.run_phase();
            self.synchronize_scores();
            // Sync
            self.run_phase();
            self.return_scores();

            if self.normalizes {
                let l2_norm = self.compute_norm();
                for step in &mut self.steps {
                    step.prepare_normalize_deltas(l2_norm);
                }
                // Norm
                self.run_phase();
            }

            self.iterations += 1;
            pl.update();
        }

        pl.done();
    }

    /// Runs the current phase on all steps, returning when all of them are
    /// done.
    fn run_phase(&mut self) {
        match self.pool {
            Some(pool) if self.steps.len() > 1 => {
                let steps = &mut self.steps;
                pool.install(|| steps.par_iter_mut().for_each(ComputeStep::run));
            }
            _ => self.steps.iter_mut().for_each(ComputeStep::run),
        }
    }

    /// Moves the outbound row of each writer towards each reader.
    fn synchronize_scores(&mut self) {
        let mut inbound: Vec<Vec<_>> = (0..self.steps.len())
            .map(|_| Vec::with_capacity(self.steps.len()))
            .collect();
        for step in &mut self.steps {
            for (reader, row) in step.take_next_scores().into_iter().enumerate() {
                inbound[reader].push(row);
            }
        }
        for (step, rows) in self.steps.iter_mut().zip(inbound) {
            step.prepare_next_iteration(rows);
        }
    }

    /// Moves back the inbound rows of each reader to their writers.
    fn return_scores(&mut self) {
        let mut outbound: Vec<Vec<_>> = (0..self.steps.len())
            .map(|_| Vec::with_capacity(self.steps.len()))
            .collect();
        for step in &mut self.steps {
            for (writer, row) in step.take_prev_scores().into_iter().enumerate() {
                outbound[writer].push(row);
            }
        }
        for (step, rows) in self.steps.iter_mut().zip(outbound) {
            step.restore_next_scores(rows);
        }
    }

    /// Returns the L2 norm of all deltas, or one if the norm is not positive
    /// or not finite.
    fn compute_norm(&self) -> f64 {
        let sum = match self.pool {
            Some(pool) if self.steps.len() > 1 => pool.install(|| {
                self.steps
                    .par_iter()
                    .map(ComputeStep::sum_of_squared_deltas)
                    .reduce(KahanSum::new, |a, b| a + b)
            }),
            _ => self
                .steps
                .iter()
                .map(ComputeStep::sum_of_squared_deltas)
                .fold(KahanSum::new(), |a, b| a + b),
        };
        let l2_norm = sum.sum().sqrt();
        if l2_norm > 0.0 && l2_norm.is_finite() {
            l2_norm
        } else {
            1.0
        }
    }

    /// Returns a copy of the current ranks.
    pub fn result(&self) -> RankResult<W> {
        match self.steps.as_slice() {
            [step] => RankResult::Dense(DenseRanks::new(step.page_rank().into())),
            steps => RankResult::Partitioned(PartitionedRanks::new(
                steps.iter().map(|step| W::to_id(step.start_node())).collect(),
                steps.iter().map(|step| step.page_rank().into()).collect(),
            )),
        }
    }

    /// Releases all buffers, returning the ranks.
    pub fn into_result(self) -> RankResult<W> {
        let starts: Box<[W::Id]> = self
            .steps
            .iter()
            .map(|step| W::to_id(step.start_node()))
            .collect();
        let mut ranks: Vec<Box<[f64]>> = self
            .steps
            .into_iter()
            .map(ComputeStep::into_page_rank)
            .collect();
        if ranks.len() == 1 {
            if let Some(ranks) = ranks.pop() {
                return RankResult::Dense(DenseRanks::new(ranks));
            }
        }
        RankResult::Partitioned(PartitionedRanks::new(starts, ranks.into_boxed_slice()))
    }
}
