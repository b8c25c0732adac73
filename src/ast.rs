//! The expression-tree value model shared by every subsystem.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An operator usable as an internal tree node: an identifier that is opaque
/// to the engine plus its fixed child count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Op {
    pub name: String,
    pub arity: usize,
}

impl Op {
    pub fn new(name: impl Into<String>, arity: usize) -> Self {
        Self {
            name: name.into(),
            arity,
        }
    }
}

/// A candidate expression: a terminal leaf (variable symbol or numeric
/// literal) or an application of an operator to its children. Trees are
/// immutable values; variation always builds new ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Tree {
    Terminal(String),
    Number(f64),
    App(String, Vec<Tree>),
}

impl Tree {
    /// Longest root-to-leaf path, leaves at height 0. A childless
    /// application counts as a leaf.
    pub fn height(&self) -> usize {
        match self {
            Tree::Terminal(_) | Tree::Number(_) => 0,
            Tree::App(_, args) => args.iter().map(Tree::height).max().map_or(0, |h| h + 1),
        }
    }

    /// Total node count.
    pub fn size(&self) -> usize {
        match self {
            Tree::Terminal(_) | Tree::Number(_) => 1,
            Tree::App(_, args) => 1 + args.iter().map(Tree::size).sum::<usize>(),
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Tree::Terminal(_) | Tree::Number(_))
    }

    /// True when every application node carries exactly as many children as
    /// its operator declares. Operators absent from `ops` fail the check.
    pub fn is_well_formed(&self, ops: &[Op]) -> bool {
        match self {
            Tree::Terminal(_) | Tree::Number(_) => true,
            Tree::App(name, args) => {
                ops.iter().any(|op| op.name == *name && op.arity == args.len())
                    && args.iter().all(|arg| arg.is_well_formed(ops))
            }
        }
    }

    /// True when `other` occurs in `self` as a structural sub-expression.
    pub fn contains(&self, other: &Tree) -> bool {
        if self == other {
            return true;
        }
        match self {
            Tree::App(_, args) => args.iter().any(|arg| arg.contains(other)),
            _ => false,
        }
    }
}

impl fmt::Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tree::Terminal(sym) => write!(f, "{sym}"),
            Tree::Number(value) => write!(f, "{value}"),
            Tree::App(op, args) => {
                write!(f, "({op}")?;
                for arg in args {
                    write!(f, " {arg}")?;
                }
                write!(f, ")")
            }
        }
    }
}

/// A named branch packaged inside the let-envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Branch {
    /// An automatically defined function, callable from the result body and
    /// from higher-indexed function branches.
    Function {
        name: String,
        params: Vec<String>,
        body: Tree,
    },
    /// An automatically defined loop: init/cond/body/update slots plus a
    /// hard iteration bound.
    Loop {
        name: String,
        init: Tree,
        cond: Tree,
        body: Tree,
        update: Tree,
        limit: u32,
    },
}

impl Branch {
    pub fn name(&self) -> &str {
        match self {
            Branch::Function { name, .. } | Branch::Loop { name, .. } => name,
        }
    }
}

/// A let-envelope: named branches plus the result-defining body. Variation
/// only ever touches branch bodies and the result body; branch count, names,
/// parameter vectors, and loop limits are preserved for the whole run. With
/// no branches the wrapper is an identity around `body`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleTree {
    pub branches: Vec<Branch>,
    pub body: Tree,
}

impl ModuleTree {
    pub fn plain(body: Tree) -> Self {
        Self {
            branches: Vec::new(),
            body,
        }
    }
}

impl fmt::Display for ModuleTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.branches.is_empty() {
            return write!(f, "{}", self.body);
        }
        write!(f, "(let (")?;
        for (i, branch) in self.branches.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            match branch {
                Branch::Function { name, params, body } => {
                    write!(f, "({name} ({}) {body})", params.join(" "))?;
                }
                Branch::Loop {
                    name,
                    init,
                    cond,
                    body,
                    update,
                    limit,
                } => {
                    write!(f, "({name} {init} {cond} {body} {update} {limit})")?;
                }
            }
        }
        write!(f, ") {})", self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Tree {
        Tree::App(
            "+".into(),
            vec![
                Tree::App(
                    "*".into(),
                    vec![Tree::Terminal("x".into()), Tree::Number(2.0)],
                ),
                Tree::Terminal("y".into()),
            ],
        )
    }

    #[test]
    fn height_counts_the_longest_path() {
        assert_eq!(sample().height(), 2);
        assert_eq!(Tree::Terminal("x".into()).height(), 0);
        assert_eq!(Tree::App("z".into(), vec![]).height(), 0);
    }

    #[test]
    fn size_counts_every_node() {
        assert_eq!(sample().size(), 5);
        assert_eq!(Tree::Number(1.0).size(), 1);
    }

    #[test]
    fn well_formedness_checks_arities() {
        let ops = [Op::new("+", 2), Op::new("*", 2)];
        assert!(sample().is_well_formed(&ops));

        let missing_arg = Tree::App("+".into(), vec![Tree::Terminal("x".into())]);
        assert!(!missing_arg.is_well_formed(&ops));

        let unknown_op = Tree::App("/".into(), vec![Tree::Number(1.0), Tree::Number(2.0)]);
        assert!(!unknown_op.is_well_formed(&ops));
    }

    #[test]
    fn display_renders_s_expressions() {
        assert_eq!(sample().to_string(), "(+ (* x 2) y)");
    }

    #[test]
    fn contains_finds_structural_subexpressions() {
        let tree = sample();
        assert!(tree.contains(&tree));
        assert!(tree.contains(&Tree::Terminal("y".into())));
        assert!(tree.contains(&Tree::App(
            "*".into(),
            vec![Tree::Terminal("x".into()), Tree::Number(2.0)],
        )));
        assert!(!tree.contains(&Tree::Terminal("z".into())));
    }

    #[test]
    fn module_display_wraps_branches_in_a_let_form() {
        let module = ModuleTree {
            branches: vec![Branch::Function {
                name: "adf0".into(),
                params: vec!["arg0".into()],
                body: Tree::Terminal("arg0".into()),
            }],
            body: Tree::Terminal("x".into()),
        };
        assert_eq!(module.to_string(), "(let ((adf0 (arg0) arg0)) x)");
    }
}
