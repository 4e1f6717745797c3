//! Thread-safe ledger of the best solution found so far.
//!
//! The single piece of global mutable state in a solve. Updates are a
//! compare-and-replace under a mutex, and the critical section stays short:
//! compare the cost, swap the record, emit one improvement event.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::cost::COST_SENTINEL;
use crate::tree::FloorTree;

/// One global-best improvement, as seen by the event sink.
#[derive(Debug, Clone, Copy)]
pub struct Improvement {
    /// Seconds since the solve started.
    pub seconds: f64,
    /// The new best cost.
    pub cost: f64,
}

/// Callback invoked for every accepted improvement.
pub type ImprovementSink = Box<dyn Fn(&Improvement) + Send + Sync>;

struct BestSlot {
    tree: Option<FloorTree>,
    cost: f64,
    found_at: Duration,
}

/// Shared global-best record. Never rolls back: an offer is accepted only
/// if it is strictly cheaper than the stored record.
pub struct BestLedger {
    start: Instant,
    sink: Option<ImprovementSink>,
    slot: Mutex<BestSlot>,
}

impl BestLedger {
    /// Creates an empty ledger; `start` anchors improvement timestamps.
    pub fn new(start: Instant, sink: Option<ImprovementSink>) -> Self {
        Self {
            start,
            sink,
            slot: Mutex::new(BestSlot {
                tree: None,
                cost: COST_SENTINEL,
                found_at: Duration::ZERO,
            }),
        }
    }

    /// Compare-and-replace: installs `candidate` if strictly cheaper.
    /// Returns whether the record changed.
    pub fn offer(&self, candidate: &FloorTree) -> bool {
        let mut slot = self.slot.lock().unwrap();
        if candidate.cost < slot.cost {
            slot.cost = candidate.cost;
            slot.tree = Some(candidate.clone());
            slot.found_at = self.start.elapsed();
            if let Some(sink) = &self.sink {
                sink(&Improvement {
                    seconds: slot.found_at.as_secs_f64(),
                    cost: slot.cost,
                });
            }
            true
        } else {
            false
        }
    }

    /// Current best cost (sentinel when nothing has been recorded).
    pub fn best_cost(&self) -> f64 {
        self.slot.lock().unwrap().cost
    }

    /// Snapshot of the best record and its discovery time.
    pub fn best(&self) -> Option<(FloorTree, Duration)> {
        let slot = self.slot.lock().unwrap();
        slot.tree.clone().map(|tree| (tree, slot.found_at))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::BlockCatalog;
    use crate::cost::evaluate;
    use crate::pack::pack;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn scored_tree(cost: f64) -> FloorTree {
        let catalog =
            BlockCatalog::from_reader(Cursor::new("A1 (10 10 1 1)\n")).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        let mut tree = FloorTree::random(&catalog, &mut rng);
        pack(&mut tree);
        evaluate(&mut tree, &catalog);
        tree.cost = cost;
        tree
    }

    #[test]
    fn test_offer_accepts_only_strict_improvements() {
        let ledger = BestLedger::new(Instant::now(), None);
        assert!(ledger.offer(&scored_tree(100.0)));
        assert!(!ledger.offer(&scored_tree(100.0)));
        assert!(!ledger.offer(&scored_tree(150.0)));
        assert!(ledger.offer(&scored_tree(90.0)));
        assert_eq!(ledger.best_cost(), 90.0);
    }

    #[test]
    fn test_events_fire_once_per_improvement() {
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();
        let sink: ImprovementSink = Box::new(move |imp| {
            assert!(imp.seconds >= 0.0);
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let ledger = BestLedger::new(Instant::now(), Some(sink));

        ledger.offer(&scored_tree(100.0));
        ledger.offer(&scored_tree(200.0));
        ledger.offer(&scored_tree(50.0));
        assert_eq!(fired.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_empty_ledger_reports_nothing() {
        let ledger = BestLedger::new(Instant::now(), None);
        assert!(ledger.best().is_none());
        assert_eq!(ledger.best_cost(), COST_SENTINEL);
    }
}
