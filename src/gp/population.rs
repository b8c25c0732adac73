//! Fitness evaluation, tournament selection, and the per-island
//! generational loop.

use rand::Rng;

use crate::ast::ModuleTree;
use crate::config::RunConfig;
use crate::error::{Error, Result};
use crate::gp::genetic_ops::{crossover_module, mutate_module};
use crate::gp::surgery::truncate_module;

/// A fitness-callback failure, carried to the driver for reporting.
#[derive(Debug, Clone)]
pub struct FailureRecord {
    pub tree: ModuleTree,
    pub message: String,
}

/// One island's result after a [`generations`] call.
#[derive(Debug, Clone)]
pub struct EvolveOutcome {
    pub population: Vec<ModuleTree>,
    pub best: ModuleTree,
    pub fitness: f64,
    pub failures: Vec<FailureRecord>,
}

/// Score a population, invoking the callback once per distinct tree. A
/// failed, non-finite, or negative evaluation scores as infinity so the
/// tree loses every tournament; the failure is recorded, never fatal.
pub fn score_population<F>(
    population: &[ModuleTree],
    fitness: &F,
    failures: &mut Vec<FailureRecord>,
) -> Vec<(ModuleTree, f64)>
where
    F: Fn(&ModuleTree) -> anyhow::Result<f64>,
{
    let mut scored: Vec<(ModuleTree, f64)> = Vec::with_capacity(population.len());
    for tree in population {
        let score = match scored.iter().find(|(seen, _)| seen == tree) {
            Some((_, score)) => *score,
            None => match fitness(tree) {
                Ok(value) if value.is_finite() && value >= 0.0 => value,
                Ok(value) => {
                    log::warn!("fitness callback returned {value} for {tree}; scoring as infinity");
                    failures.push(FailureRecord {
                        tree: tree.clone(),
                        message: format!("fitness value {value} out of range"),
                    });
                    f64::INFINITY
                }
                Err(err) => {
                    log::warn!("fitness callback failed for {tree}: {err:#}");
                    failures.push(FailureRecord {
                        tree: tree.clone(),
                        message: format!("{err:#}"),
                    });
                    f64::INFINITY
                }
            },
        };
        scored.push((tree.clone(), score));
    }
    scored
}

/// Sample `size` individuals uniformly with replacement, then cross the two
/// fittest of the sample. A sample of one is crossed with itself.
pub fn tournament(
    rng: &mut impl Rng,
    scored: &[(ModuleTree, f64)],
    size: usize,
) -> Result<ModuleTree> {
    if scored.is_empty() {
        return Err(Error::Unreachable("tournament over an empty population"));
    }
    let mut sample: Vec<&(ModuleTree, f64)> = (0..size)
        .map(|_| &scored[rng.gen_range(0..scored.len())])
        .collect();
    sample.sort_by(|a, b| a.1.total_cmp(&b.1));
    let best = sample[0];
    let second = sample.get(1).copied().unwrap_or(best);
    crossover_module(rng, &best.0, &second.0)
}

/// Run up to `count` generations: score, track the best individual seen so
/// far, return early on a perfect one, otherwise select, mutate, truncate,
/// and re-insert the best as the elite.
pub fn generations<F>(
    rng: &mut impl Rng,
    count: usize,
    mut population: Vec<ModuleTree>,
    cfg: &RunConfig,
    fitness: &F,
) -> Result<EvolveOutcome>
where
    F: Fn(&ModuleTree) -> anyhow::Result<f64>,
{
    let mut failures = Vec::new();
    let mut best: Option<(ModuleTree, f64)> = None;

    for generation in 0..count {
        let scored = score_population(&population, fitness, &mut failures);
        update_best(&mut best, &scored)?;
        let (best_tree, best_fitness) = match &best {
            Some((tree, fitness)) => (tree.clone(), *fitness),
            None => return Err(Error::Unreachable("scored an empty population")),
        };
        if best_fitness == 0.0 {
            return Ok(EvolveOutcome {
                population,
                best: best_tree,
                fitness: 0.0,
                failures,
            });
        }
        log::debug!("generation {generation}: best fitness {best_fitness}");

        let mut next = Vec::with_capacity(population.len());
        for _ in 0..population.len() {
            let child = tournament(rng, &scored, cfg.tournament_size)?;
            let child = mutate_module(rng, &child, cfg)?;
            next.push(truncate_module(rng, &child, cfg.max_depth)?);
        }
        if let Some(slot) = next.first_mut() {
            *slot = best_tree;
        }
        population = next;
    }

    // a zero-generation call still owes the caller a best individual
    if best.is_none() {
        let scored = score_population(&population, fitness, &mut failures);
        update_best(&mut best, &scored)?;
    }
    match best {
        Some((tree, fitness)) => Ok(EvolveOutcome {
            population,
            best: tree,
            fitness,
            failures,
        }),
        None => Err(Error::Unreachable("scored an empty population")),
    }
}

fn update_best(best: &mut Option<(ModuleTree, f64)>, scored: &[(ModuleTree, f64)]) -> Result<()> {
    let Some(leader) = scored.iter().min_by(|a, b| a.1.total_cmp(&b.1)) else {
        return Err(Error::Unreachable("scored an empty population"));
    };
    let improves = match best.as_ref() {
        Some((_, incumbent)) => leader.1 < *incumbent,
        None => true,
    };
    if improves {
        *best = Some((leader.0.clone(), leader.1));
    }
    Ok(())
}
