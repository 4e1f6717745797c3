//! Independent multistart annealing (coarse-grained parallelism).
//!
//! Every worker owns its tree and RNG outright and runs complete SA
//! restarts until the deadline. There is no cross-worker communication in
//! the hot loop; the only serialisation point is the ledger merge when a
//! worker exits.

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::catalog::BlockCatalog;
use crate::ledger::BestLedger;
use crate::sa::{self, SaHyperparams};
use crate::solver::{worker_seed, Deadline, SearchStats};
use crate::tree::FloorTree;

/// Runs `workers` independent restart loops until the deadline.
pub fn run(
    catalog: &BlockCatalog,
    params: &SaHyperparams,
    deadline: &Deadline,
    workers: usize,
    ledger: &BestLedger,
    stats: &SearchStats,
) {
    std::thread::scope(|scope| {
        for worker in 0..workers {
            scope.spawn(move || {
                let mut rng = StdRng::seed_from_u64(worker_seed(worker));
                let mut best: Option<FloorTree> = None;

                while !deadline.expired() {
                    stats.record_run();
                    let run_best = sa::anneal(catalog, params, deadline, &mut rng, stats);
                    if best.as_ref().map_or(true, |b| run_best.cost < b.cost) {
                        best = Some(run_best);
                    }
                }

                if let Some(best) = best {
                    if ledger.offer(&best) {
                        log::info!(
                            "worker {worker} found new global best cost {:.4}",
                            best.cost
                        );
                    }
                }
            });
        }
    });
}
