//! Island-model genetic programming over caller-defined expression trees.
//!
//! The engine evolves symbolic program trees to minimize a caller-supplied
//! fitness function. Candidate evaluation is entirely the caller's concern:
//! trees carry the operator identifiers the caller registered, and the
//! fitness callback traverses them however it likes. The engine guarantees
//! argument ordering and arity consistency, nothing more.
//!
//! ```no_run
//! use archipelago::{run, ModuleTree, Op, PrimitiveSet, Report, RunConfig};
//!
//! let primitives = PrimitiveSet::new(
//!     vec!["x".into()],
//!     vec![1.0, 2.0],
//!     vec![Op::new("+", 2), Op::new("*", 2)],
//! );
//! let cfg = RunConfig::new(5, 20, 4, 100, 6, primitives);
//! let outcome = run(
//!     &cfg,
//!     |individual: &ModuleTree| Ok(individual.body.size() as f64),
//!     |report| {
//!         if let Report::Best { fitness, .. } = report {
//!             println!("best error so far: {fitness}");
//!         }
//!     },
//! )?;
//! println!("winner: {}", outcome.best);
//! # Ok::<(), archipelago::Error>(())
//! ```

pub mod ast;
pub mod config;
pub mod error;
pub mod gp;

pub use ast::{Branch, ModuleTree, Op, Tree};
pub use config::{PrimitiveSet, RunConfig};
pub use error::{Error, Result};
pub use gp::generate::BuildMode;
pub use gp::islands::{Report, RunOutcome};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Validate the configuration, seed one RNG per island from the master
/// seed, grow the initial populations, and drive the island loop to
/// completion. Returns the final islands plus the best individual observed
/// anywhere during the run.
///
/// The fitness callback is invoked from worker threads and must be `Sync`;
/// the reporting callback only ever runs on the caller's thread, between
/// migration rounds.
pub fn run<F, R>(cfg: &RunConfig, fitness: F, mut report: R) -> Result<RunOutcome>
where
    F: Fn(&ModuleTree) -> anyhow::Result<f64> + Sync,
    R: FnMut(Report<'_>),
{
    cfg.validate()?;
    let mut master = match cfg.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut rngs: Vec<StdRng> = (0..cfg.num_islands)
        .map(|_| StdRng::seed_from_u64(master.gen()))
        .collect();
    let islands = rngs
        .iter_mut()
        .map(|rng| gp::generate::create_population(rng, cfg))
        .collect::<Result<Vec<_>>>()?;
    log::info!(
        "starting run: {} island(s) of {} individuals, {} round(s) of {} generation(s)",
        cfg.num_islands,
        cfg.population_size,
        cfg.migrations,
        cfg.iterations
    );
    gp::islands::island_generations(cfg, islands, &mut rngs, &mut master, &fitness, &mut report)
}
