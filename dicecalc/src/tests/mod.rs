
// Model tests
mod analysis;

mod evaluator;


use crate::{evaluate, parse_expression, Distribution, Env, Value};
use std::sync::Arc;

/// Evaluate `text` in `env` and unwrap the distribution.
fn roll_in(text: &str, env: &Env) -> Arc<Distribution> {
    let expr = parse_expression(text).unwrap_or_else(|e| panic!("{}: {}", text, e));
    match evaluate(&expr, env).unwrap_or_else(|e| panic!("{}: {}", text, e)) {
        Value::Distribution(distribution) => distribution,
        Value::Function(_) => panic!("{} evaluated to a function", text),
    }
}

fn roll(text: &str) -> Arc<Distribution> {
    roll_in(text, &Env::new())
}

fn env(bindings: &[(&str, f64)]) -> Env {
    bindings
        .iter()
        .fold(Env::new(), |env, (name, value)| {
            env.update(Arc::from(*name), Value::constant(*value))
        })
}

fn approx(actual: Option<f64>, expected: f64) -> bool {
    actual.is_some_and(|actual| (actual - expected).abs() < 1e-9)
}
