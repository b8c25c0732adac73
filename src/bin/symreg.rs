// Symbolic regression demo: evolve an arithmetic expression matching
// f(x) = x^3 + x + 3 on integer samples, embedding the engine the way a
// caller would.

use anyhow::{anyhow, Result};

use archipelago::{run, ModuleTree, Op, PrimitiveSet, Report, RunConfig, Tree};

fn target(x: f64) -> f64 {
    x * x * x + x + 3.0
}

fn samples() -> Vec<(f64, f64)> {
    (-5..=5).map(|x| (x as f64, target(x as f64))).collect()
}

/// Plain recursive arithmetic over the operator names registered below.
fn eval(tree: &Tree, x: f64) -> Result<f64> {
    match tree {
        Tree::Terminal(name) if name == "x" => Ok(x),
        Tree::Terminal(name) => Err(anyhow!("unknown terminal {name}")),
        Tree::Number(value) => Ok(*value),
        Tree::App(op, args) => {
            let (Some(lhs), Some(rhs)) = (args.first(), args.get(1)) else {
                return Err(anyhow!("operator {op} expects two arguments"));
            };
            let lhs = eval(lhs, x)?;
            let rhs = eval(rhs, x)?;
            match op.as_str() {
                "+" => Ok(lhs + rhs),
                "-" => Ok(lhs - rhs),
                "*" => Ok(lhs * rhs),
                other => Err(anyhow!("unknown operator {other}")),
            }
        }
    }
}

fn fitness(individual: &ModuleTree, samples: &[(f64, f64)]) -> Result<f64> {
    let mut error = 0.0;
    for (x, y) in samples {
        error += (eval(&individual.body, *x)? - y).abs();
    }
    Ok(error)
}

fn main() -> Result<()> {
    env_logger::init();

    let samples = samples();
    let primitives = PrimitiveSet::new(
        vec!["x".into()],
        vec![1.0, 2.0, 3.0],
        vec![Op::new("+", 2), Op::new("-", 2), Op::new("*", 2)],
    );
    let mut cfg = RunConfig::new(5, 40, 4, 200, 6, primitives);
    cfg.mutation_depth = 4;

    let outcome = run(
        &cfg,
        |individual| fitness(individual, &samples),
        |report| match report {
            Report::Best { tree, fitness } => println!("best so far: {tree}  (error {fitness})"),
            Report::Failure { tree, message } => println!("rejected {tree}: {message}"),
        },
    )?;

    println!("\nbest individual: {}", outcome.best);
    println!("error: {}", outcome.fitness);
    println!("as JSON: {}", serde_json::to_string_pretty(&outcome.best)?);
    Ok(())
}
