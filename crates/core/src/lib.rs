//! # Blockplan Core
//!
//! Simulated-annealing floorplanner for VLSI hard macros over a B*-tree
//! placement representation.
//!
//! Given a catalogue of rectangular blocks, each with one or more allowed
//! shapes, the solver searches for a placement minimising a weighted blend
//! of bounding-box area, aspect-ratio penalty and INL (a regularity metric
//! over name-ordered block-to-centre distances), within a wall-clock
//! budget.
//!
//! ## Components
//!
//! - **Catalogue**: [`BlockCatalog`], [`Block`], [`ShapeVariant`] and the
//!   numeric-suffix name order used by INL and the output format
//! - **State**: [`FloorTree`] - a dense-array B*-tree with cached chip
//!   totals, cloned wholesale on every proposal
//! - **Packing**: [`Contour`] skyline plus the pre-order [`pack`] routine
//! - **Scoring**: [`evaluate`] (area, aspect penalty, INL)
//! - **Search**: [`perturb`] operators, the [`anneal`] kernel and the
//!   [`SaHyperparams`] schedule
//! - **Parallel strategies**: selected via [`Strategy`]
//!
//! ## Parallel strategies
//!
//! | Strategy | Granularity | Description |
//! |----------|-------------|-------------|
//! | `MultiStartCoarse` | Coarse | Independent full restarts per worker |
//! | `ParallelTemperingMedium` | Medium | Fixed temperature ladder with neighbour replica exchange |
//! | `ParallelMovesFine` | Fine | Team-evaluated candidate moves per proposal |
//!
//! ## Quick start
//!
//! ```no_run
//! use blockplan_core::{solve, BlockCatalog, SolverConfig, Strategy};
//! use std::io::Cursor;
//!
//! let catalog = BlockCatalog::from_reader(Cursor::new(
//!     "MM1 (10 20 1 1) (20 10 1 1)\nMM2 (15 15 1 1)\n",
//! ))?;
//! let config = SolverConfig::new()
//!     .with_strategy(Strategy::MultiStartCoarse)
//!     .with_time_limit_secs(10);
//! let result = solve(&catalog, &config, None)?;
//! println!("best cost {:.4}", result.cost);
//! # Ok::<(), blockplan_core::Error>(())
//! ```
//!
//! ## Feature flags
//!
//! - `serde`: serialisation support for config and summary types

pub mod catalog;
pub mod contour;
pub mod cost;
pub mod error;
pub mod io;
pub mod ledger;
pub mod multistart;
pub mod pack;
pub mod parallel_moves;
pub mod perturb;
pub mod result;
pub mod sa;
pub mod solver;
pub mod tempering;
pub mod tree;

// Re-exports
pub use catalog::{compare_block_names, Block, BlockCatalog, ShapeVariant};
pub use contour::Contour;
pub use cost::{aspect_penalty, compute_inl, evaluate, COST_SENTINEL};
pub use error::{Error, Result};
pub use ledger::{BestLedger, Improvement, ImprovementSink};
pub use pack::pack;
pub use perturb::{attach, detach, perturb};
pub use result::{SolveResult, SolveSummary};
pub use sa::{anneal, metropolis_accepts, propose, SaHyperparams};
pub use solver::{solve, Deadline, SearchStats, SolverConfig, Strategy};
pub use tree::{FloorTree, Node};
