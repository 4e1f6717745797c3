//! Parallel tempering / replica exchange (medium-grained parallelism).
//!
//! W replicas anneal at W fixed, geometrically spaced temperatures. Between
//! sweeps, neighbouring replicas may swap states under the Metropolis-
//! Hastings exchange criterion; temperatures stay bound to their slot.
//! Rounds are fenced with a reusable barrier, and the clock is read exactly
//! once per round (by the exchange worker) so every worker makes the same
//! continue/stop decision.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Barrier, Mutex};

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

/// Probability of exchanging two neighbouring replicas.
pub fn swap_probability(cost_a: f64, cost_b: f64, temp_a: f64, temp_b: f64) -> f64 {
    ((cost_a - cost_b) * (1.0 / temp_a - 1.0 / temp_b)).exp().min(1.0)
}

/// Geometric temperature ladder from T_start (slot 0) down to T_min.
pub fn temperature_ladder(params: &SaHyperparams, workers: usize) -> Vec<f64> {
    if workers <= 1 {
        return vec![params.t_start];
    }
    let alpha = (params.t_min / params.t_start).powf(1.0 / (workers - 1) as f64);
    (0..workers)
        .map(|i| params.t_start * alpha.powi(i as i32))
        .collect()
}

/// Runs replica-exchange annealing until the deadline.
pub fn run(
    catalog: &BlockCatalog,
    params: &SaHyperparams,
    deadline: &Deadline,
    workers: usize,
    ledger: &BestLedger,
    stats: &SearchStats,
) {
    let temperatures = temperature_ladder(params, workers);
    let steps_per_swap = params.steps_per_temp(catalog.len());

    // Initialise every replica in parallel, then seed the ledger with the
    // cheapest of them.
    let replicas: Vec<FloorTree> = (0..workers)
        .into_par_iter()
        .map(|i| {
            stats.record_run();
            let mut rng = StdRng::seed_from_u64(worker_seed(i));
            let mut tree = FloorTree::random(catalog, &mut rng);
            pack(&mut tree);
            evaluate(&mut tree, catalog);
            tree
        })
        .collect();
    if let Some(cheapest) = replicas.iter().min_by(|a, b| a.cost.total_cmp(&b.cost)) {
        ledger.offer(cheapest);
    }

    let replicas: Vec<Mutex<FloorTree>> = replicas.into_iter().map(Mutex::new).collect();
    let barrier = Barrier::new(workers);
    let done = AtomicBool::new(deadline.expired());

    std::thread::scope(|scope| {
        for worker in 0..workers {
            let replicas = &replicas;
            let temperatures = &temperatures;
            let barrier = &barrier;
            let done = &done;

            scope.spawn(move || {
                let mut rng = StdRng::seed_from_u64(worker_seed(workers + worker));
                // Only slot 0 drives exchanges, with an RNG of its own.
                let mut exchange_rng = StdRng::seed_from_u64(worker_seed(2 * workers + worker));
                let temperature = temperatures[worker];

                loop {
                    if done.load(Ordering::Relaxed) {
                        break;
                    }

                    // Sweep phase: this worker owns its replica exclusively.
                    {
                        let mut replica = replicas[worker].lock().unwrap();
                        for _ in 0..steps_per_swap {
                            stats.record_move();
                            let candidate = sa::propose(&replica, catalog, &mut rng);
                            let delta = candidate.cost - replica.cost;
                            if sa::metropolis_accepts(delta, temperature, &mut rng) {
                                stats.record_accept();
                                *replica = candidate;
                            }
                        }
                    }

                    barrier.wait();

                    if worker == 0 {
                        exchange(replicas, temperatures, &mut exchange_rng, ledger);
                        if deadline.expired() {
                            done.store(true, Ordering::Relaxed);
                        }
                    }

                    barrier.wait();
                }
            });
        }
    });
}

/// Exchange phase, run by the designated worker between barriers: attempt
/// each neighbour swap in ladder order, then fold every replica into the
/// ledger.
fn exchange(
    replicas: &[Mutex<FloorTree>],
    temperatures: &[f64],
    rng: &mut StdRng,
    ledger: &BestLedger,
) {
    for i in 0..replicas.len().saturating_sub(1) {
        let mut a = replicas[i].lock().unwrap();
        let mut b = replicas[i + 1].lock().unwrap();
        let prob = swap_probability(a.cost, b.cost, temperatures[i], temperatures[i + 1]);
        if prob > rng.gen::<f64>() {
            std::mem::swap(&mut *a, &mut *b);
        }
    }
    for replica in replicas {
        let replica = replica.lock().unwrap();
        if ledger.offer(&replica) {
            log::info!("tempering found new global best cost {:.4}", replica.cost);
        }
    }
}
