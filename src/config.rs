//! Caller-supplied language and run parameters, validated once at entry and
//! passed by reference to every subsystem.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::ast::{Op, Tree};
use crate::error::{Error, Result};

/// The language candidates are built from: variable symbols, optional
/// numeric literals, and operators with fixed arities.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PrimitiveSet {
    pub terminals: Vec<String>,
    pub numbers: Vec<f64>,
    pub functions: Vec<Op>,
}

impl PrimitiveSet {
    pub fn new(terminals: Vec<String>, numbers: Vec<f64>, functions: Vec<Op>) -> Self {
        Self {
            terminals,
            numbers,
            functions,
        }
    }

    /// Draw a terminal leaf: variables with probability ½, numbers
    /// otherwise. An empty number list always falls back to variables, and
    /// vice versa.
    pub fn random_terminal(&self, rng: &mut impl Rng) -> Result<Tree> {
        match (self.terminals.as_slice(), self.numbers.as_slice()) {
            ([], []) => Err(Error::InvalidConfig(
                "terminal and number sets are both empty".into(),
            )),
            (vars, []) => Ok(Tree::Terminal(vars[rng.gen_range(0..vars.len())].clone())),
            ([], nums) => Ok(Tree::Number(nums[rng.gen_range(0..nums.len())])),
            (vars, nums) => {
                if rng.gen_bool(0.5) {
                    Ok(Tree::Terminal(vars[rng.gen_range(0..vars.len())].clone()))
                } else {
                    Ok(Tree::Number(nums[rng.gen_range(0..nums.len())]))
                }
            }
        }
    }

    pub(crate) fn random_function(&self, rng: &mut impl Rng) -> Result<&Op> {
        if self.functions.is_empty() {
            return Err(Error::InvalidConfig("function set is empty".into()));
        }
        Ok(&self.functions[rng.gen_range(0..self.functions.len())])
    }
}

/// Immutable configuration for a whole run. Constructed with the required
/// parameters; the remaining fields start at their documented defaults and
/// can be overwritten before calling [`run`](crate::run).
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Generations per island between migrations.
    pub iterations: usize,
    /// Number of migration rounds.
    pub migrations: usize,
    pub num_islands: usize,
    pub population_size: usize,
    /// Tournament sample size; larger means stronger selection pressure.
    pub tournament_size: usize,
    /// Per-individual mutation coin.
    pub mutation_probability: f64,
    /// Depth bound for population seeding and mutation-grown subtrees.
    pub mutation_depth: usize,
    /// Post-truncation height bound.
    pub max_depth: usize,
    pub primitives: PrimitiveSet,
    /// Number of automatically defined function branches.
    pub adf_count: usize,
    /// Parameter count of each function branch.
    pub adf_arity: usize,
    /// Number of automatically defined loop branches.
    pub adl_count: usize,
    /// Iteration bound baked into each loop branch.
    pub adl_limit: u32,
    /// Master seed. A fixed seed reproduces the whole run.
    pub seed: Option<u64>,
}

impl RunConfig {
    pub fn new(
        iterations: usize,
        migrations: usize,
        num_islands: usize,
        population_size: usize,
        max_depth: usize,
        primitives: PrimitiveSet,
    ) -> Self {
        Self {
            iterations,
            migrations,
            num_islands,
            population_size,
            tournament_size: 3,
            mutation_probability: 0.1,
            mutation_depth: 6,
            max_depth,
            primitives,
            adf_count: 0,
            adf_arity: 1,
            adl_count: 0,
            adl_limit: 25,
            seed: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let counts = [
            ("iterations", self.iterations),
            ("migrations", self.migrations),
            ("num_islands", self.num_islands),
            ("population_size", self.population_size),
            ("tournament_size", self.tournament_size),
            ("mutation_depth", self.mutation_depth),
        ];
        for (name, value) in counts {
            if value == 0 {
                return Self::reject(format!("{name} must be at least 1"));
            }
        }
        if !(0.0..=1.0).contains(&self.mutation_probability) {
            return Self::reject(format!(
                "mutation_probability must lie in [0, 1], got {}",
                self.mutation_probability
            ));
        }
        if self.max_depth > 0 && self.primitives.functions.is_empty() {
            return Self::reject("function set must be non-empty when max_depth > 0".into());
        }
        if self.primitives.terminals.is_empty() && self.primitives.numbers.is_empty() {
            return Self::reject("terminal and number sets are both empty".into());
        }
        if self.adf_count > 0 && self.adf_arity == 0 {
            return Self::reject("adf_arity must be at least 1 when function branches are requested".into());
        }
        if self.adl_count > 0 && self.adl_limit == 0 {
            return Self::reject("adl_limit must be at least 1 when loop branches are requested".into());
        }
        Ok(())
    }

    pub(crate) fn uses_modules(&self) -> bool {
        self.adf_count > 0 || self.adl_count > 0
    }

    fn reject(message: String) -> Result<()> {
        log::error!("rejecting configuration: {message}");
        Err(Error::InvalidConfig(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn arithmetic() -> PrimitiveSet {
        PrimitiveSet::new(
            vec!["x".into()],
            vec![1.0, 2.0],
            vec![Op::new("+", 2), Op::new("*", 2)],
        )
    }

    #[test]
    fn defaults_match_the_documented_values() {
        let cfg = RunConfig::new(5, 10, 4, 50, 8, arithmetic());
        assert_eq!(cfg.tournament_size, 3);
        assert_eq!(cfg.mutation_probability, 0.1);
        assert_eq!(cfg.mutation_depth, 6);
        assert_eq!(cfg.adf_count, 0);
        assert_eq!(cfg.adf_arity, 1);
        assert_eq!(cfg.adl_count, 0);
        assert_eq!(cfg.adl_limit, 25);
        assert!(cfg.seed.is_none());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn zero_counts_are_rejected() {
        let mut cfg = RunConfig::new(5, 10, 4, 50, 8, arithmetic());
        cfg.population_size = 0;
        assert!(matches!(cfg.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn functions_are_required_with_positive_depth() {
        let prims = PrimitiveSet::new(vec!["x".into()], vec![], vec![]);
        let cfg = RunConfig::new(5, 10, 4, 50, 8, prims);
        assert!(matches!(cfg.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn some_terminal_source_is_required() {
        let prims = PrimitiveSet::new(vec![], vec![], vec![Op::new("+", 2)]);
        let cfg = RunConfig::new(5, 10, 4, 50, 8, prims);
        assert!(matches!(cfg.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn out_of_range_mutation_probability_is_rejected() {
        let mut cfg = RunConfig::new(5, 10, 4, 50, 8, arithmetic());
        cfg.mutation_probability = 1.5;
        assert!(matches!(cfg.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn random_terminal_falls_back_when_numbers_are_empty() {
        let prims = PrimitiveSet::new(vec!["x".into()], vec![], vec![]);
        let mut rng = StdRng::seed_from_u64(0);
        for _ in 0..50 {
            assert!(matches!(
                prims.random_terminal(&mut rng).unwrap(),
                Tree::Terminal(_)
            ));
        }
    }

    #[test]
    fn random_terminal_without_variables_draws_numbers() {
        let prims = PrimitiveSet::new(vec![], vec![3.0], vec![]);
        let mut rng = StdRng::seed_from_u64(0);
        for _ in 0..50 {
            assert!(matches!(
                prims.random_terminal(&mut rng).unwrap(),
                Tree::Number(_)
            ));
        }
    }

    #[test]
    fn an_empty_language_has_no_terminals() {
        let prims = PrimitiveSet::default();
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(
            prims.random_terminal(&mut rng),
            Err(Error::InvalidConfig(_))
        ));
    }
}
