//! Mutation and crossover, over plain trees and over module-wrapped trees.

use rand::Rng;

use crate::ast::{Branch, ModuleTree, Tree};
use crate::config::{PrimitiveSet, RunConfig};
use crate::error::{Error, Result};
use crate::gp::generate::{branch_primitives, build_tree, result_primitives, BuildMode};
use crate::gp::surgery::{rand_subtree, replace_subtree};

/// With probability `probability`, apply one of three mutation kinds chosen
/// uniformly: graft a freshly grown subtree, graft a random terminal, or
/// lift a random sub-tree to the root. Otherwise return the tree unchanged.
pub fn mutate_tree(
    rng: &mut impl Rng,
    tree: &Tree,
    prims: &PrimitiveSet,
    probability: f64,
    depth: usize,
) -> Result<Tree> {
    if !(0.0..=1.0).contains(&probability) {
        return Err(Error::InvalidConfig(format!(
            "mutation probability must lie in [0, 1], got {probability}"
        )));
    }
    if !rng.gen_bool(probability) {
        return Ok(tree.clone());
    }
    Ok(match rng.gen_range(0..3) {
        0 => {
            let graft = build_tree(rng, prims, depth, depth, BuildMode::Grow)?;
            replace_subtree(rng, tree, graft)
        }
        1 => {
            let graft = prims.random_terminal(rng)?;
            replace_subtree(rng, tree, graft)
        }
        _ => rand_subtree(rng, tree),
    })
}

/// Graft a random sub-tree of `donor` into a random position of `skeleton`.
/// Strictly asymmetric; one child per mating.
pub fn crossover(rng: &mut impl Rng, skeleton: &Tree, donor: &Tree) -> Tree {
    let graft = rand_subtree(rng, donor);
    replace_subtree(rng, skeleton, graft)
}

/// Module-aware mutation: a fair coin sends the mutation into the result
/// body or into one uniformly chosen branch (always the body when there are
/// no branches). Grafts are grown over the vocabulary the target was grown
/// over. Branch names, parameter vectors, and loop limits are never touched.
pub fn mutate_module(rng: &mut impl Rng, module: &ModuleTree, cfg: &RunConfig) -> Result<ModuleTree> {
    if module.branches.is_empty() || rng.gen_bool(0.5) {
        let prims = result_primitives(cfg);
        let body = mutate_tree(
            rng,
            &module.body,
            &prims,
            cfg.mutation_probability,
            cfg.mutation_depth,
        )?;
        return Ok(ModuleTree {
            branches: module.branches.clone(),
            body,
        });
    }

    let idx = rng.gen_range(0..module.branches.len());
    let prims = branch_primitives(cfg, idx);
    let mut branches = module.branches.clone();
    branches[idx] = match &module.branches[idx] {
        Branch::Function { name, params, body } => Branch::Function {
            name: name.clone(),
            params: params.clone(),
            body: mutate_tree(rng, body, &prims, cfg.mutation_probability, cfg.mutation_depth)?,
        },
        Branch::Loop {
            name,
            init,
            cond,
            body,
            update,
            limit,
        } => Branch::Loop {
            name: name.clone(),
            init: mutate_tree(rng, init, &prims, cfg.mutation_probability, cfg.mutation_depth)?,
            cond: mutate_tree(rng, cond, &prims, cfg.mutation_probability, cfg.mutation_depth)?,
            body: mutate_tree(rng, body, &prims, cfg.mutation_probability, cfg.mutation_depth)?,
            update: mutate_tree(rng, update, &prims, cfg.mutation_probability, cfg.mutation_depth)?,
            limit: *limit,
        },
    };
    Ok(ModuleTree {
        branches,
        body: module.body.clone(),
    })
}

/// Module-aware crossover: the same body-or-branch coin as
/// [`mutate_module`]. Branch crossover recombines one slot's bodies and
/// keeps the identifier, parameter vector, and loop limit of the first
/// parent. Both parents must carry the same envelope shape.
pub fn crossover_module(
    rng: &mut impl Rng,
    first: &ModuleTree,
    second: &ModuleTree,
) -> Result<ModuleTree> {
    if first.branches.is_empty() || rng.gen_bool(0.5) {
        return Ok(ModuleTree {
            branches: first.branches.clone(),
            body: crossover(rng, &first.body, &second.body),
        });
    }

    let idx = rng.gen_range(0..first.branches.len());
    let Some(donor) = second.branches.get(idx) else {
        return Err(Error::Unreachable("mismatched module envelopes in crossover"));
    };
    let mut branches = first.branches.clone();
    branches[idx] = match (&first.branches[idx], donor) {
        (
            Branch::Function { name, params, body },
            Branch::Function { body: donor_body, .. },
        ) => Branch::Function {
            name: name.clone(),
            params: params.clone(),
            body: crossover(rng, body, donor_body),
        },
        (
            Branch::Loop {
                name,
                init,
                cond,
                body,
                update,
                limit,
            },
            Branch::Loop {
                init: donor_init,
                cond: donor_cond,
                body: donor_body,
                update: donor_update,
                ..
            },
        ) => Branch::Loop {
            name: name.clone(),
            init: crossover(rng, init, donor_init),
            cond: crossover(rng, cond, donor_cond),
            body: crossover(rng, body, donor_body),
            update: crossover(rng, update, donor_update),
            limit: *limit,
        },
        _ => return Err(Error::Unreachable("mismatched module envelopes in crossover")),
    };
    Ok(ModuleTree {
        branches,
        body: first.body.clone(),
    })
}

/// Mutate every individual independently. With zero mutation probability
/// this is an element-wise identity.
pub fn mutate_population(
    rng: &mut impl Rng,
    population: &[ModuleTree],
    cfg: &RunConfig,
) -> Result<Vec<ModuleTree>> {
    population
        .iter()
        .map(|individual| mutate_module(rng, individual, cfg))
        .collect()
}
