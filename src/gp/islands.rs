//! The coarse-grained parallel outer loop: N islands, periodic migration,
//! global best tracking, early exit.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use rayon::prelude::*;

use crate::ast::ModuleTree;
use crate::config::RunConfig;
use crate::error::{Error, Result};
use crate::gp::population::{generations, EvolveOutcome, FailureRecord};

/// Events delivered to the caller's reporting callback. `Best` arrives once
/// per migration round; `Failure` at most once per offending tree per
/// round.
#[derive(Debug)]
pub enum Report<'a> {
    Best { tree: &'a ModuleTree, fitness: f64 },
    Failure { tree: &'a ModuleTree, message: &'a str },
}

/// Everything a run hands back: the final islands, the best individual
/// observed anywhere, and its fitness.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub islands: Vec<Vec<ModuleTree>>,
    pub best: ModuleTree,
    pub fitness: f64,
}

/// One migration step. Each island contributes one uniformly chosen
/// individual and receives the pick of its successor island, so every
/// migrant crosses an island boundary. The receiving island sheds one
/// random member, keeping sizes constant.
pub fn island_crossover(rng: &mut impl Rng, islands: &mut [Vec<ModuleTree>]) {
    if islands.iter().any(Vec::is_empty) {
        return;
    }
    let picks: Vec<ModuleTree> = islands
        .iter()
        .map(|island| island[rng.gen_range(0..island.len())].clone())
        .collect();
    for (i, island) in islands.iter_mut().enumerate() {
        let migrant = picks[(i + 1) % picks.len()].clone();
        island.shuffle(rng);
        island.pop();
        island.insert(0, migrant);
    }
}

/// Drive up to `cfg.migrations` rounds: migrate (when there is more than
/// one island), run every island's generational loop in parallel, fold
/// local bests into the global best, report, and stop early on a perfect
/// individual. Each island owns its RNG; the driver RNG is only touched
/// between rounds.
pub fn island_generations<F, R>(
    cfg: &RunConfig,
    mut islands: Vec<Vec<ModuleTree>>,
    rngs: &mut [StdRng],
    driver_rng: &mut StdRng,
    fitness: &F,
    report: &mut R,
) -> Result<RunOutcome>
where
    F: Fn(&ModuleTree) -> anyhow::Result<f64> + Sync,
    R: FnMut(Report<'_>),
{
    let mut global: Option<(ModuleTree, f64)> = None;

    for round in 0..cfg.migrations {
        if islands.len() > 1 {
            island_crossover(driver_rng, &mut islands);
        }

        let outcomes = islands
            .into_par_iter()
            .zip(rngs.par_iter_mut())
            .map(|(population, rng)| generations(rng, cfg.iterations, population, cfg, fitness))
            .collect::<Result<Vec<EvolveOutcome>>>()?;

        islands = Vec::with_capacity(outcomes.len());
        let mut round_failures: Vec<FailureRecord> = Vec::new();
        for outcome in outcomes {
            let EvolveOutcome {
                population,
                best,
                fitness: local_fitness,
                failures,
            } = outcome;
            islands.push(population);
            round_failures.extend(failures);
            let improves = match global.as_ref() {
                Some((_, incumbent)) => local_fitness < *incumbent,
                None => true,
            };
            if improves {
                global = Some((best, local_fitness));
            }
        }

        let mut reported: Vec<&ModuleTree> = Vec::new();
        for record in &round_failures {
            if !reported.contains(&&record.tree) {
                report(Report::Failure {
                    tree: &record.tree,
                    message: &record.message,
                });
                reported.push(&record.tree);
            }
        }

        let Some((best_tree, best_fitness)) = &global else {
            return Err(Error::Unreachable("no island produced a best individual"));
        };
        log::debug!("migration round {round}: global best fitness {best_fitness}");
        report(Report::Best {
            tree: best_tree,
            fitness: *best_fitness,
        });
        if *best_fitness == 0.0 {
            break;
        }
    }

    match global {
        Some((best, fitness)) => Ok(RunOutcome {
            islands,
            best,
            fitness,
        }),
        None => Err(Error::Unreachable("no island produced a best individual")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Tree;
    use rand::SeedableRng;

    fn island_of(symbol: &str, size: usize) -> Vec<ModuleTree> {
        (0..size)
            .map(|_| ModuleTree::plain(Tree::Terminal(symbol.into())))
            .collect()
    }

    #[test]
    fn migration_preserves_island_sizes() {
        let mut islands = vec![island_of("a", 5), island_of("b", 5), island_of("c", 5)];
        let mut rng = StdRng::seed_from_u64(0);
        island_crossover(&mut rng, &mut islands);
        for island in &islands {
            assert_eq!(island.len(), 5);
        }
    }

    #[test]
    fn every_island_receives_a_foreign_individual() {
        let mut islands = vec![island_of("a", 4), island_of("b", 4), island_of("c", 4)];
        let mut rng = StdRng::seed_from_u64(1);
        island_crossover(&mut rng, &mut islands);
        let expect = ["b", "c", "a"];
        for (island, migrant) in islands.iter().zip(expect) {
            assert!(island.contains(&ModuleTree::plain(Tree::Terminal(migrant.into()))));
        }
    }

    #[test]
    fn migrants_land_at_the_front() {
        let mut islands = vec![island_of("a", 3), island_of("b", 3)];
        let mut rng = StdRng::seed_from_u64(2);
        island_crossover(&mut rng, &mut islands);
        assert_eq!(islands[0][0], ModuleTree::plain(Tree::Terminal("b".into())));
        assert_eq!(islands[1][0], ModuleTree::plain(Tree::Terminal("a".into())));
    }
}
