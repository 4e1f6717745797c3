//! Simulated-annealing kernel.
//!
//! A single run starts from a fresh random tree and walks a geometric
//! cooling schedule, doing `max(1, ceil(factor * n))` Metropolis proposals
//! per temperature. The kernel never blocks; the wall-clock deadline is the
//! only thing that stops it early, checked between temperature steps so a
//! micro-loop always finishes once started.

use rand::Rng;

use crate::catalog::BlockCatalog;
use crate::cost::evaluate;
use crate::error::{Error, Result};
use crate::pack::pack;
use crate::perturb::perturb;
use crate::solver::{Deadline, SearchStats};
use crate::tree::FloorTree;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Annealing schedule parameters, injected per run.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SaHyperparams {
    /// Initial temperature.
    pub t_start: f64,
    /// Final temperature; the run stops when T drops below it.
    pub t_min: f64,
    /// Multiplicative cooling factor per temperature step.
    pub cooling_rate: f64,
    /// Proposals per temperature = ceil(steps_factor * block count).
    pub steps_factor: f64,
}

impl Default for SaHyperparams {
    fn default() -> Self {
        Self {
            t_start: 1e5,
            t_min: 1e-2,
            cooling_rate: 0.98,
            steps_factor: 2.0,
        }
    }
}

impl SaHyperparams {
    /// Creates the default parameter bundle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Preset for the fine-grained strategy: each step is expensive and
    /// greedy, so cooling is much slower and sweeps are shorter.
    pub fn fine_grained() -> Self {
        Self {
            t_start: 1e6,
            t_min: 1e-2,
            cooling_rate: 0.995,
            steps_factor: 0.5,
        }
    }

    /// Sets the initial temperature.
    pub fn with_t_start(mut self, t: f64) -> Self {
        self.t_start = t;
        self
    }

    /// Sets the final temperature.
    pub fn with_t_min(mut self, t: f64) -> Self {
        self.t_min = t;
        self
    }

    /// Sets the cooling rate.
    pub fn with_cooling_rate(mut self, rate: f64) -> Self {
        self.cooling_rate = rate;
        self
    }

    /// Sets the steps-per-temperature factor.
    pub fn with_steps_factor(mut self, factor: f64) -> Self {
        self.steps_factor = factor;
        self
    }

    /// Checks T_start > T_min > 0, 0 < cooling_rate < 1 and factor > 0.
    pub fn validate(&self) -> Result<()> {
        if !(self.t_min > 0.0 && self.t_start > self.t_min) {
            return Err(Error::InvalidParams(format!(
                "need T_start > T_min > 0, got T_start={} T_min={}",
                self.t_start, self.t_min
            )));
        }
        if !(self.cooling_rate > 0.0 && self.cooling_rate < 1.0) {
            return Err(Error::InvalidParams(format!(
                "cooling_rate must be in (0, 1), got {}",
                self.cooling_rate
            )));
        }
        if !(self.steps_factor > 0.0) {
            return Err(Error::InvalidParams(format!(
                "steps_factor must be positive, got {}",
                self.steps_factor
            )));
        }
        Ok(())
    }

    /// Proposals per temperature for a catalogue of `n` blocks.
    pub fn steps_per_temp(&self, n: usize) -> usize {
        ((self.steps_factor * n as f64).ceil() as usize).max(1)
    }
}

/// Metropolis criterion: always accept improvements, otherwise accept with
/// probability exp(-delta / temperature).
pub fn metropolis_accepts(delta: f64, temperature: f64, rng: &mut impl Rng) -> bool {
    delta < 0.0 || (-delta / temperature).exp() > rng.gen::<f64>()
}

/// One proposal: clone the current tree, mutate, repack, re-score.
pub fn propose(current: &FloorTree, catalog: &BlockCatalog, rng: &mut impl Rng) -> FloorTree {
    let mut candidate = current.clone();
    perturb(&mut candidate, catalog, rng);
    pack(&mut candidate);
    evaluate(&mut candidate, catalog);
    candidate
}

/// A complete annealing run from a fresh random tree; returns best-in-run.
pub fn anneal(
    catalog: &BlockCatalog,
    params: &SaHyperparams,
    deadline: &Deadline,
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
            let candidate = propose(&current, catalog, rng);
            let delta = candidate.cost - current.cost;
            if metropolis_accepts(delta, temperature, rng) {
                stats.record_accept();
                current = candidate;
                if current.cost < best.cost {
                    best = current.clone();
                }
            }
        }
        temperature *= params.cooling_rate;
        log::debug!(
            "annealing: T={temperature:.4e} current={:.4} best={:.4}",
            current.cost,
            best.cost
        );
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::io::Cursor;
    use std::time::Duration;

    fn catalog(input: &str) -> BlockCatalog {
        BlockCatalog::from_reader(Cursor::new(input)).unwrap()
    }

    #[test]
    fn test_params_validation() {
        assert!(SaHyperparams::default().validate().is_ok());
        assert!(SaHyperparams::fine_grained().validate().is_ok());
        assert!(SaHyperparams::default().with_t_min(0.0).validate().is_err());
        assert!(SaHyperparams::default()
            .with_t_start(1e-3)
            .validate()
            .is_err());
        assert!(SaHyperparams::default()
            .with_cooling_rate(1.0)
            .validate()
            .is_err());
        assert!(SaHyperparams::default()
            .with_steps_factor(0.0)
            .validate()
            .is_err());
    }

    #[test]
    fn test_steps_per_temp_rounds_up_and_floors_at_one() {
        let params = SaHyperparams::default().with_steps_factor(0.5);
        assert_eq!(params.steps_per_temp(0), 1);
        assert_eq!(params.steps_per_temp(1), 1);
        assert_eq!(params.steps_per_temp(3), 2);
        assert_eq!(params.steps_per_temp(10), 5);
    }

    #[test]
    fn test_metropolis_always_accepts_improvement() {
        let mut rng = StdRng::seed_from_u64(0);
        for _ in 0..100 {
            assert!(metropolis_accepts(-1e-6, 1e-9, &mut rng));
        }
    }

    #[test]
    fn test_metropolis_rate_matches_boltzmann() {
        // For delta >= 0 the acceptance frequency must track exp(-delta/T)
        // to within sampling error.
        let mut rng = StdRng::seed_from_u64(12345);
        let (delta, temperature): (f64, f64) = (1.0, 2.0);
        let expected = (-delta / temperature).exp();
        let trials = 200_000;
        let accepted = (0..trials)
            .filter(|_| metropolis_accepts(delta, temperature, &mut rng))
            .count();
        let rate = accepted as f64 / trials as f64;
        assert!(
            (rate - expected).abs() < 0.01,
            "rate {rate} vs expected {expected}"
        );
    }

    #[test]
    fn test_anneal_returns_scored_valid_tree() {
        let catalog = catalog(
            "B1 (10 40 1 1) (40 10 1 1)\nB2 (10 10 1 1)\nB3 (20 15 1 1)\n",
        );
        let params = SaHyperparams::default()
            .with_t_start(100.0)
            .with_t_min(1.0)
            .with_cooling_rate(0.8);
        let deadline = Deadline::new(Duration::from_secs(5));
        let stats = SearchStats::default();
        let mut rng = StdRng::seed_from_u64(7);

        let best = anneal(&catalog, &params, &deadline, &mut rng, &stats);
        assert!(best.is_valid(&catalog));
        assert!(best.cost < crate::cost::COST_SENTINEL);
        assert!(stats.moves_total() > 0);
        assert!(stats.moves_accepted() <= stats.moves_total());
    }
}
