//! Solver configuration and strategy dispatch.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use crate::catalog::BlockCatalog;
use crate::error::Result;
use crate::ledger::{BestLedger, ImprovementSink};
use crate::result::SolveResult;
use crate::sa::SaHyperparams;
use crate::{multistart, parallel_moves, tempering};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Parallelisation strategy over the annealing search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Strategy {
    /// Independent multistart: one full SA per worker, repeated (coarse).
    #[default]
    MultiStartCoarse,
    /// Parallel tempering with neighbour replica exchange (medium).
    ParallelTemperingMedium,
    /// Parallel move generation: team-evaluated candidates (fine).
    ParallelMovesFine,
}

impl Strategy {
    /// Parses a strategy tag. Unknown tags warn and fall back to the
    /// coarse multistart strategy.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "MultiStart_Coarse" => Self::MultiStartCoarse,
            "ParallelTempering_Medium" => Self::ParallelTemperingMedium,
            "ParallelMoves_Fine" => Self::ParallelMovesFine,
            other => {
                log::warn!("unknown strategy tag '{other}', falling back to MultiStart_Coarse");
                Self::MultiStartCoarse
            }
        }
    }

    /// Canonical tag for this strategy.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::MultiStartCoarse => "MultiStart_Coarse",
            Self::ParallelTemperingMedium => "ParallelTempering_Medium",
            Self::ParallelMovesFine => "ParallelMoves_Fine",
        }
    }

    /// Hyperparameter bundle this strategy defaults to.
    pub fn default_params(&self) -> SaHyperparams {
        match self {
            Self::ParallelMovesFine => SaHyperparams::fine_grained(),
            _ => SaHyperparams::default(),
        }
    }
}

/// Wall-clock budget for a solve; the only cancellation signal.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    start: Instant,
    limit: Duration,
}

impl Deadline {
    /// Starts the clock now.
    pub fn new(limit: Duration) -> Self {
        Self {
            start: Instant::now(),
            limit,
        }
    }

    /// True once the budget is spent.
    pub fn expired(&self) -> bool {
        self.start.elapsed() >= self.limit
    }

    /// Time since the deadline started.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// The instant the clock started.
    pub fn started(&self) -> Instant {
        self.start
    }
}

/// Shared search counters, updated lock-free by every worker.
#[derive(Debug, Default)]
pub struct SearchStats {
    sa_runs: AtomicU64,
    moves_total: AtomicU64,
    moves_accepted: AtomicU64,
}

impl SearchStats {
    pub fn record_run(&self) {
        self.sa_runs.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_move(&self) {
        self.moves_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_accept(&self) {
        self.moves_accepted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn sa_runs(&self) -> u64 {
        self.sa_runs.load(Ordering::Relaxed)
    }

    pub fn moves_total(&self) -> u64 {
        self.moves_total.load(Ordering::Relaxed)
    }

    pub fn moves_accepted(&self) -> u64 {
        self.moves_accepted.load(Ordering::Relaxed)
    }
}

/// Configuration for a solve.
#[derive(Debug, Clone)]
pub struct SolverConfig {
    /// Parallelisation strategy.
    pub strategy: Strategy,
    /// Wall-clock budget in whole seconds.
    pub time_limit_secs: u64,
    /// Worker count (0 = all available hardware threads).
    pub threads: usize,
    /// Annealing schedule.
    pub params: SaHyperparams,
}

impl Default for SolverConfig {
    fn default() -> Self {
        let strategy = Strategy::default();
        Self {
            strategy,
            time_limit_secs: 595,
            threads: 0,
            params: strategy.default_params(),
        }
    }
}

impl SolverConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the strategy and its default hyperparameters.
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self.params = strategy.default_params();
        self
    }

    /// Sets the time limit in seconds.
    pub fn with_time_limit_secs(mut self, secs: u64) -> Self {
        self.time_limit_secs = secs;
        self
    }

    /// Sets the worker count (0 = auto).
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Overrides the hyperparameter bundle.
    pub fn with_params(mut self, params: SaHyperparams) -> Self {
        self.params = params;
        self
    }

    /// Resolved worker count, clamped to the host's available parallelism.
    pub fn worker_count(&self) -> usize {
        let available = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        if self.threads == 0 {
            available
        } else {
            self.threads.min(available)
        }
    }
}

/// Seeds a worker RNG from the wall clock and the worker id, so no two
/// workers of a run share a seed.
pub(crate) fn worker_seed(worker: usize) -> u64 {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0);
    nanos.wrapping_add(worker as u64)
}

/// Runs the configured strategy to the deadline and returns the best
/// floorplan found, feeding every global improvement to `sink`.
pub fn solve(
    catalog: &BlockCatalog,
    config: &SolverConfig,
    sink: Option<ImprovementSink>,
) -> Result<SolveResult> {
    config.params.validate()?;

    let deadline = Deadline::new(Duration::from_secs(config.time_limit_secs));
    let ledger = BestLedger::new(deadline.started(), sink);
    let stats = SearchStats::default();
    let workers = config.worker_count();
    log::info!(
        "solving {} blocks with {} on {workers} workers, {}s budget",
        catalog.len(),
        config.strategy.tag(),
        config.time_limit_secs
    );

    match config.strategy {
        Strategy::MultiStartCoarse => {
            multistart::run(catalog, &config.params, &deadline, workers, &ledger, &stats)
        }
        Strategy::ParallelTemperingMedium => {
            tempering::run(catalog, &config.params, &deadline, workers, &ledger, &stats)
        }
        Strategy::ParallelMovesFine => {
            parallel_moves::run(catalog, &config.params, &deadline, workers, &ledger, &stats)
        }
    }

    Ok(SolveResult::collect(
        config.strategy,
        workers,
        &ledger,
        &stats,
        deadline.elapsed(),
    ))
}
