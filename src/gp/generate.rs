//! Random tree construction and population seeding.

use rand::Rng;

use crate::ast::{Branch, ModuleTree, Op, Tree};
use crate::config::{PrimitiveSet, RunConfig};
use crate::error::{Error, Result};

/// Builder modes: `Grow` may stop a path early at any level at or below
/// `depth_min`; `Fill` always reaches `depth_max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildMode {
    Grow,
    Fill,
}

/// Build a random tree of height at most `depth_max`.
///
/// - `depth_max == 0` yields a random terminal.
/// - In `Grow` mode, once `depth_min` levels of recursion have passed, a
///   fair coin may stop any path at a terminal.
/// - Otherwise a uniformly chosen operator is applied to `arity` recursive
///   children built with both depths decremented.
pub fn build_tree(
    rng: &mut impl Rng,
    prims: &PrimitiveSet,
    depth_max: usize,
    depth_min: usize,
    mode: BuildMode,
) -> Result<Tree> {
    if depth_max > 0 && prims.functions.is_empty() {
        return Err(Error::InvalidConfig("function set is empty".into()));
    }
    if depth_max == 0 {
        return prims.random_terminal(rng);
    }
    if mode == BuildMode::Grow && depth_min == 0 && rng.gen_bool(0.5) {
        return prims.random_terminal(rng);
    }
    let func = prims.random_function(rng)?;
    let (name, arity) = (func.name.clone(), func.arity);
    let mut args = Vec::with_capacity(arity);
    for _ in 0..arity {
        args.push(build_tree(
            rng,
            prims,
            depth_max - 1,
            depth_min.saturating_sub(1),
            mode,
        )?);
    }
    Ok(Tree::App(name, args))
}

/// Seed one island: ramped half-and-half, with depth uniform in
/// `[1, mutation_depth]` and mode decided by a fair coin per individual.
pub fn create_population(rng: &mut impl Rng, cfg: &RunConfig) -> Result<Vec<ModuleTree>> {
    (0..cfg.population_size)
        .map(|_| create_individual(rng, cfg))
        .collect()
}

pub fn create_individual(rng: &mut impl Rng, cfg: &RunConfig) -> Result<ModuleTree> {
    let depth = rng.gen_range(1..=cfg.mutation_depth);
    let mode = if rng.gen_bool(0.5) {
        BuildMode::Grow
    } else {
        BuildMode::Fill
    };
    if cfg.uses_modules() {
        create_module_tree(rng, cfg, depth, mode)
    } else {
        Ok(ModuleTree::plain(build_tree(
            rng,
            &cfg.primitives,
            depth,
            depth,
            mode,
        )?))
    }
}

/// Build the let-envelope: function branches `adf<i>` grown over the
/// terminal set augmented with their parameters and over the lower-indexed
/// branches only (calls form a DAG, so no recursion cycles), loop branches
/// `adl<i>` with four body slots and the configured iteration limit, and a
/// result body grown over the original terminals plus the loop result
/// symbols and every function-branch callable.
pub fn create_module_tree(
    rng: &mut impl Rng,
    cfg: &RunConfig,
    depth: usize,
    mode: BuildMode,
) -> Result<ModuleTree> {
    let mut branches = Vec::with_capacity(cfg.adf_count + cfg.adl_count);
    for i in 0..cfg.adf_count {
        let prims = function_branch_primitives(cfg, i);
        branches.push(Branch::Function {
            name: format!("adf{i}"),
            params: (0..cfg.adf_arity).map(|k| format!("arg{k}")).collect(),
            body: build_tree(rng, &prims, depth, depth, mode)?,
        });
    }
    for i in 0..cfg.adl_count {
        let prims = loop_branch_primitives(cfg);
        branches.push(Branch::Loop {
            name: format!("adl{i}"),
            init: build_tree(rng, &prims, depth, depth, mode)?,
            cond: build_tree(rng, &prims, depth, depth, mode)?,
            body: build_tree(rng, &prims, depth, depth, mode)?,
            update: build_tree(rng, &prims, depth, depth, mode)?,
            limit: cfg.adl_limit,
        });
    }
    let body = build_tree(rng, &result_primitives(cfg), depth, depth, mode)?;
    Ok(ModuleTree { branches, body })
}

/// Vocabulary for the body of function branch `index`: the caller's
/// terminals plus the branch parameters, the caller's functions plus the
/// lower-indexed function branches.
pub(crate) fn function_branch_primitives(cfg: &RunConfig, index: usize) -> PrimitiveSet {
    let mut prims = cfg.primitives.clone();
    prims
        .terminals
        .extend((0..cfg.adf_arity).map(|k| format!("arg{k}")));
    prims
        .functions
        .extend((0..index).map(|j| Op::new(format!("adf{j}"), cfg.adf_arity)));
    prims
}

/// Loop-branch slots may call every function branch but see no parameters.
pub(crate) fn loop_branch_primitives(cfg: &RunConfig) -> PrimitiveSet {
    let mut prims = cfg.primitives.clone();
    prims
        .functions
        .extend((0..cfg.adf_count).map(|j| Op::new(format!("adf{j}"), cfg.adf_arity)));
    prims
}

/// The result body sees loop results as extra terminals and every function
/// branch as a callable.
pub(crate) fn result_primitives(cfg: &RunConfig) -> PrimitiveSet {
    let mut prims = cfg.primitives.clone();
    prims
        .terminals
        .extend((0..cfg.adl_count).map(|i| format!("adl{i}")));
    prims
        .functions
        .extend((0..cfg.adf_count).map(|j| Op::new(format!("adf{j}"), cfg.adf_arity)));
    prims
}

/// Vocabulary the branch at `index` was grown over, for branch-local
/// variation. Function branches occupy the low indices.
pub(crate) fn branch_primitives(cfg: &RunConfig, index: usize) -> PrimitiveSet {
    if index < cfg.adf_count {
        function_branch_primitives(cfg, index)
    } else {
        loop_branch_primitives(cfg)
    }
}
