//! Solve result representation.

use std::time::Duration;

use crate::cost::COST_SENTINEL;
use crate::ledger::BestLedger;
use crate::solver::{SearchStats, Strategy};
use crate::tree::FloorTree;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Outcome of a solve: the best floorplan plus run bookkeeping.
#[derive(Debug, Clone)]
pub struct SolveResult {
    /// Best tree found, packed and scored. `None` if no worker produced a
    /// finite-cost layout before the deadline.
    pub best: Option<FloorTree>,
    /// Cost of the best tree (sentinel when `best` is `None`).
    pub cost: f64,
    pub chip_width: f64,
    pub chip_height: f64,
    pub chip_area: f64,
    pub inl: f64,
    /// When the best solution was discovered, relative to solve start.
    pub found_at: Option<Duration>,
    /// Total wall-clock time of the solve.
    pub elapsed: Duration,
    /// Strategy that produced the result.
    pub strategy: Strategy,
    /// Worker threads used.
    pub workers: usize,
    /// Complete SA runs started across all workers.
    pub sa_runs: u64,
    /// Proposals attempted across all workers.
    pub moves_total: u64,
    /// Proposals accepted across all workers.
    pub moves_accepted: u64,
}

impl SolveResult {
    /// Assembles a result from the ledger and counters after a solve.
    pub(crate) fn collect(
        strategy: Strategy,
        workers: usize,
        ledger: &BestLedger,
        stats: &SearchStats,
        elapsed: Duration,
    ) -> Self {
        let best = ledger.best();
        let (cost, chip_width, chip_height, chip_area, inl) = match &best {
            Some((tree, _)) => (
                tree.cost,
                tree.chip_width,
                tree.chip_height,
                tree.chip_area,
                tree.inl,
            ),
            None => (COST_SENTINEL, 0.0, 0.0, 0.0, 0.0),
        };
        Self {
            found_at: best.as_ref().map(|(_, at)| *at),
            best: best.map(|(tree, _)| tree),
            cost,
            chip_width,
            chip_height,
            chip_area,
            inl,
            elapsed,
            strategy,
            workers,
            sa_runs: stats.sa_runs(),
            moves_total: stats.moves_total(),
            moves_accepted: stats.moves_accepted(),
        }
    }

    /// Scalar digest of the result for reports and serialisation.
    pub fn summary(&self) -> SolveSummary {
        SolveSummary {
            strategy: self.strategy.tag().to_string(),
            cost: self.cost,
            chip_width: self.chip_width,
            chip_height: self.chip_height,
            chip_area: self.chip_area,
            inl: self.inl,
            found_at_secs: self.found_at.map(|d| d.as_secs_f64()),
            elapsed_secs: self.elapsed.as_secs_f64(),
            workers: self.workers,
            sa_runs: self.sa_runs,
            moves_total: self.moves_total,
            moves_accepted: self.moves_accepted,
        }
    }
}

/// Flat, serialisable summary of a solve.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SolveSummary {
    pub strategy: String,
    pub cost: f64,
    pub chip_width: f64,
    pub chip_height: f64,
    pub chip_area: f64,
    pub inl: f64,
    pub found_at_secs: Option<f64>,
    pub elapsed_secs: f64,
    pub workers: usize,
    pub sa_runs: u64,
    pub moves_total: u64,
    pub moves_accepted: u64,
}
