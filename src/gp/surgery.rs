//! Sub-tree addressing: random selection, replacement, and height-bounded
//! truncation.

use rand::Rng;

use crate::ast::{Branch, ModuleTree, Tree};
use crate::error::{Error, Result};

/// Rounds of re-selection before truncation gives up.
const TRUNCATE_ROUNDS: usize = 10_000;

/// Select a sub-tree by a random descending walk of at most
/// `uniform[0, height]` steps. The walk stops at leaves, at childless
/// applications, and when the step budget runs out, which biases selection
/// toward shallow cuts (the root included). That bias is deliberate.
pub fn rand_subtree(rng: &mut impl Rng, tree: &Tree) -> Tree {
    let n = rng.gen_range(0..=tree.height());
    rand_subtree_at(rng, tree, n)
}

/// As [`rand_subtree`], with an explicit step budget. Each descent draws a
/// fresh budget uniform in `[0, n)`.
pub fn rand_subtree_at(rng: &mut impl Rng, tree: &Tree, n: usize) -> Tree {
    match tree {
        Tree::App(_, args) if n > 0 && !args.is_empty() => {
            let child = &args[rng.gen_range(0..args.len())];
            let next = rng.gen_range(0..n);
            rand_subtree_at(rng, child, next)
        }
        _ => tree.clone(),
    }
}

/// Rebuild `tree` along a random descending walk and splice `graft` in at
/// the stopping point (the same stop condition as [`rand_subtree`]).
pub fn replace_subtree(rng: &mut impl Rng, tree: &Tree, graft: Tree) -> Tree {
    let n = rng.gen_range(0..=tree.height());
    replace_subtree_at(rng, tree, graft, n)
}

pub fn replace_subtree_at(rng: &mut impl Rng, tree: &Tree, graft: Tree, n: usize) -> Tree {
    match tree {
        Tree::App(op, args) if n > 0 && !args.is_empty() => {
            let idx = rng.gen_range(0..args.len());
            let next = rng.gen_range(0..n);
            let mut rebuilt = args.clone();
            rebuilt[idx] = replace_subtree_at(rng, &args[idx], graft, next);
            Tree::App(op.clone(), rebuilt)
        }
        _ => graft,
    }
}

/// Replace `tree` by random sub-trees of itself until its height fits
/// `bound`. Leaves sit at height 0, so this terminates for every
/// well-formed tree; a tree that defeats the bound after many rounds is an
/// invariant violation.
pub fn truncate(rng: &mut impl Rng, tree: &Tree, bound: usize) -> Result<Tree> {
    let mut current = tree.clone();
    for _ in 0..TRUNCATE_ROUNDS {
        if current.height() <= bound {
            return Ok(current);
        }
        current = rand_subtree(rng, &current);
    }
    Err(Error::Unreachable("truncation failed to reduce tree height"))
}

/// Truncate each branch body and the result body independently, leaving the
/// envelope untouched.
pub fn truncate_module(rng: &mut impl Rng, module: &ModuleTree, bound: usize) -> Result<ModuleTree> {
    let mut branches = Vec::with_capacity(module.branches.len());
    for branch in &module.branches {
        branches.push(match branch {
            Branch::Function { name, params, body } => Branch::Function {
                name: name.clone(),
                params: params.clone(),
                body: truncate(rng, body, bound)?,
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
                init: truncate(rng, init, bound)?,
                cond: truncate(rng, cond, bound)?,
                body: truncate(rng, body, bound)?,
                update: truncate(rng, update, bound)?,
                limit: *limit,
            },
        });
    }
    Ok(ModuleTree {
        branches,
        body: truncate(rng, &module.body, bound)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Op;
    use crate::config::PrimitiveSet;
    use crate::gp::generate::{build_tree, BuildMode};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn arithmetic() -> PrimitiveSet {
        PrimitiveSet::new(
            vec!["x".into()],
            vec![1.0],
            vec![Op::new("+", 2), Op::new("*", 2)],
        )
    }

    #[test]
    fn selected_subtrees_are_structural_subexpressions() {
        let prims = arithmetic();
        let mut rng = StdRng::seed_from_u64(0);
        for _ in 0..60 {
            let tree = build_tree(&mut rng, &prims, 4, 4, BuildMode::Fill).unwrap();
            let sub = rand_subtree(&mut rng, &tree);
            assert!(tree.contains(&sub));
            assert!(sub.height() <= tree.height());
        }
    }

    #[test]
    fn replacement_keeps_arities_consistent() {
        let prims = arithmetic();
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..60 {
            let tree = build_tree(&mut rng, &prims, 4, 4, BuildMode::Fill).unwrap();
            let graft = build_tree(&mut rng, &prims, 2, 0, BuildMode::Grow).unwrap();
            let spliced = replace_subtree(&mut rng, &tree, graft.clone());
            assert!(spliced.is_well_formed(&prims.functions));
            assert!(spliced.contains(&graft));
        }
    }

    #[test]
    fn replacing_a_leaf_returns_the_graft() {
        let mut rng = StdRng::seed_from_u64(2);
        let leaf = Tree::Terminal("x".into());
        let graft = Tree::Number(7.0);
        assert_eq!(replace_subtree(&mut rng, &leaf, graft.clone()), graft);
    }

    #[test]
    fn truncation_enforces_the_bound() {
        let prims = arithmetic();
        let mut rng = StdRng::seed_from_u64(3);
        for bound in 0..4 {
            for _ in 0..40 {
                let tree = build_tree(&mut rng, &prims, 5, 5, BuildMode::Fill).unwrap();
                let cut = truncate(&mut rng, &tree, bound).unwrap();
                assert!(cut.height() <= bound);
                assert!(cut.is_well_formed(&prims.functions));
            }
        }
    }

    #[test]
    fn truncation_to_zero_leaves_a_leaf() {
        let prims = arithmetic();
        let mut rng = StdRng::seed_from_u64(4);
        let tree = build_tree(&mut rng, &prims, 3, 3, BuildMode::Fill).unwrap();
        let cut = truncate(&mut rng, &tree, 0).unwrap();
        assert_eq!(cut.height(), 0);
    }

    #[test]
    fn module_truncation_preserves_the_envelope() {
        let module = ModuleTree {
            branches: vec![
                Branch::Function {
                    name: "adf0".into(),
                    params: vec!["arg0".into()],
                    body: Tree::App(
                        "+".into(),
                        vec![
                            Tree::App(
                                "+".into(),
                                vec![Tree::Terminal("arg0".into()), Tree::Number(1.0)],
                            ),
                            Tree::Number(1.0),
                        ],
                    ),
                },
                Branch::Loop {
                    name: "adl0".into(),
                    init: Tree::Number(0.0),
                    cond: Tree::Terminal("x".into()),
                    body: Tree::App(
                        "*".into(),
                        vec![Tree::Terminal("x".into()), Tree::Terminal("x".into())],
                    ),
                    update: Tree::Terminal("x".into()),
                    limit: 25,
                },
            ],
            body: Tree::App(
                "*".into(),
                vec![Tree::Terminal("x".into()), Tree::Number(2.0)],
            ),
        };
        let mut rng = StdRng::seed_from_u64(5);
        let cut = truncate_module(&mut rng, &module, 1).unwrap();

        assert_eq!(cut.branches.len(), module.branches.len());
        for (before, after) in module.branches.iter().zip(&cut.branches) {
            assert_eq!(before.name(), after.name());
        }
        match &cut.branches[0] {
            Branch::Function { params, body, .. } => {
                assert_eq!(params, &vec!["arg0".to_string()]);
                assert!(body.height() <= 1);
            }
            other => panic!("expected a function branch, got {other:?}"),
        }
        match &cut.branches[1] {
            Branch::Loop { limit, .. } => assert_eq!(*limit, 25),
            other => panic!("expected a loop branch, got {other:?}"),
        }
        assert!(cut.body.height() <= 1);
    }
}
