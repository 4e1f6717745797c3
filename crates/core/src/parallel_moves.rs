//! Parallel move generation (fine-grained parallelism).
//!
//! Outer structure mirrors multistart, but every proposal fans out W
//! candidate perturbations of the current tree, evaluated concurrently on
//! the rayon pool; the nested team region is flattened through the global
//! pool rather than given threads of its own. The caller alone selects the
//! cheapest candidate and applies the Metropolis decision, so acceptance
//! stays single-writer. The per-proposal synchronisation makes this
//! strategy worthwhile only when a single evaluation is expensive.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::catalog::BlockCatalog;
use crate::cost::evaluate;
use crate::ledger::BestLedger;
use crate::pack::pack;
use crate::sa::{self, SaHyperparams};
use crate::solver::{worker_seed, Deadline, SearchStats};
use crate::tree::FloorTree;

/// Runs `workers` restart loops whose proposals are team-evaluated.
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
                    let run_best =
                        anneal_team(catalog, params, deadline, workers, &mut rng, stats);
                    if best.as_ref().map_or(true, |b| run_best.cost < b.cost) {
                        best = Some(run_best);
                    }
                }

                if let Some(best) = best {
                    if ledger.offer(&best) {
                        log::info!(
                            "worker {worker} (fine) found new global best cost {:.4}",
                            best.cost
                        );
                    }
                }
            });
        }
    });
}

/// One SA run whose every proposal is the cheapest of `team` parallel
/// candidates.
fn anneal_team(
    catalog: &BlockCatalog,
    params: &SaHyperparams,
    deadline: &Deadline,
    team: usize,
    rng: &mut impl Rng,
    stats: &SearchStats,
) -> FloorTree {
    let mut current = FloorTree::random(catalog, rng);
    pack(&mut current);
    evaluate(&mut current, catalog);
    let mut best = current.clone();

    let steps = params.steps_per_temp(catalog.len());
    let mut temperature = params.t_start;

    while temperature > params.t_min && !deadline.expired() {
        for _ in 0..steps {
            stats.record_move();
            // Candidate RNGs are derived from this run's RNG so restarts
            // stay independent across workers.
            let base_seed: u64 = rng.gen();
            let current_ref = &current;
            let winner = (0..team)
                .into_par_iter()
                .map(|k| {
                    let mut candidate_rng =
                        StdRng::seed_from_u64(base_seed.wrapping_add(k as u64));
                    sa::propose(current_ref, catalog, &mut candidate_rng)
                })
                .min_by(|a, b| a.cost.total_cmp(&b.cost));

            // The selected candidate alone faces the acceptance test.
            if let Some(winner) = winner {
                let delta = winner.cost - current.cost;
                if sa::metropolis_accepts(delta, temperature, rng) {
                    stats.record_accept();
                    current = winner;
                    if current.cost < best.cost {
                        best = current.clone();
                    }
                }
            }
        }
        temperature *= params.cooling_rate;
    }
    best
}
