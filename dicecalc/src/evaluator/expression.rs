//! Expression evaluation
//!
//! Recursively evaluates expressions to values. Every node above a leaf goes
//! through the cache when the context carries one.

use super::cache::CacheKey;
use super::context::{EvaluationContext, Env};
use super::operations;
use crate::distribution::{Distribution, DistributionBuilder};
use crate::semantic::LEVEL_NAME;
use crate::{DiceError, DiceResult, Expression, ExpressionKind, Function, Value};
use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::One;

/// Evaluate an expression in `env`.
///
/// Errors carry the span of the node that failed when it has one.
pub fn evaluate_expression(
    expr: &Expression,
    env: &Env,
    context: &mut EvaluationContext,
) -> DiceResult<Value> {
    if expr.is_leaf() {
        return evaluate_node(expr, env, context);
    }

    let key = context.cache.as_ref().and_then(|_| {
        let dependencies = crate::analysis::runtime_dependencies(expr, env);
        (dependencies.len() <= context.limits.max_cached_dependencies)
            .then(|| CacheKey::new(expr, &dependencies, env))
    });

    if let (Some(key), Some(cache)) = (&key, context.cache.as_deref_mut()) {
        if let Some(value) = cache.lookup(key) {
            return Ok(value);
        }
    }

    let value = evaluate_node(expr, env, context)?;

    if let (Some(key), Some(cache)) = (key, context.cache.as_deref_mut()) {
        cache.store(key, value.clone());
    }
    Ok(value)
}

fn evaluate_node(
    expr: &Expression,
    env: &Env,
    context: &mut EvaluationContext,
) -> DiceResult<Value> {
    match &expr.kind {
        ExpressionKind::Literal(value) => Ok(Value::constant(*value)),

        ExpressionKind::Die(faces) => Ok(Distribution::uniform(*faces).into()),

        ExpressionKind::Name(name) => lookup(name, expr, env),

        ExpressionKind::Level(threshold) => {
            let level = lookup(LEVEL_NAME, expr, env)?;
            let level = operand(&level, "lvl", expr)?;
            Ok(operations::level_threshold(level, *threshold).into())
        }

        ExpressionKind::Binary(lhs, op, rhs) => {
            let lhs = evaluate_expression(lhs, env, context)?;
            let rhs = evaluate_expression(rhs, env, context)?;
            let symbol = if op.is_multiplication() { "*" } else { op.symbol() };
            let result = operations::apply_binary(
                operand(&lhs, symbol, expr)?,
                *op,
                operand(&rhs, symbol, expr)?,
                context.limits,
            )
            .map_err(|error| locate(error, expr))?;
            Ok(result.into())
        }

        ExpressionKind::Unary(op, inner) => {
            let inner = evaluate_expression(inner, env, context)?;
            let inner = operand(&inner, op.symbol(), expr)?;
            Ok(operations::apply_unary(*op, inner).into())
        }

        ExpressionKind::Call(callee, args) => {
            let callee_value = evaluate_expression(callee, env, context)?;
            let function = match callee_value {
                Value::Function(function) => function,
                Value::Distribution(_) => {
                    return Err(DiceError::eval(
                        format!("Cannot call '{}': it is not a function", callee),
                        expr.span,
                    ))
                }
            };

            let mut values = Vec::with_capacity(args.len());
            for arg in args {
                values.push(evaluate_expression(arg, env, context)?);
            }

            context.enter_call().map_err(|error| locate(error, expr))?;
            let result = apply_function(&function, &values, env, context);
            context.exit_call();
            result.map(Value::from).map_err(|error| locate(error, expr))
        }

        ExpressionKind::Function(function) => Ok(Value::Function(function.clone())),
    }
}

fn lookup(name: &str, expr: &Expression, env: &Env) -> DiceResult<Value> {
    env.get(name)
        .cloned()
        .ok_or_else(|| DiceError::eval(format!("Unknown name '{}'", name), expr.span))
}

fn operand<'v>(value: &'v Value, op: &str, expr: &Expression) -> DiceResult<&'v Distribution> {
    match value {
        Value::Distribution(distribution) => Ok(distribution),
        Value::Function(_) => Err(DiceError::eval(
            format!("Cannot apply '{}' to a function", op),
            expr.span,
        )),
    }
}

/// Attach the node's span to an error raised without one.
fn locate(error: DiceError, expr: &Expression) -> DiceError {
    match error {
        DiceError::Eval(mut details) if details.span.is_none() => {
            details.span = expr.span;
            DiceError::Eval(details)
        }
        other => other,
    }
}

/// Weighted accumulator for one function application.
struct Application<'f> {
    function: &'f Function,
    args: &'f [Value],
    out: DistributionBuilder,
    /// Factor the output has been scaled by so far to keep one denominator
    grown: BigUint,
}

/// Apply `function` to evaluated arguments.
///
/// Distribution arguments branch once per outcome, binding the parameter to
/// that single outcome; function arguments bind directly. The body runs in the
/// caller's environment extended with the bindings.
pub fn apply_function(
    function: &Function,
    args: &[Value],
    env: &Env,
    context: &mut EvaluationContext,
) -> DiceResult<Distribution> {
    let arity = function.params.len();
    if args.len() < arity {
        return Err(DiceError::eval(
            format!(
                "Function expects {} argument{} but {} {} supplied",
                arity,
                if arity == 1 { "" } else { "s" },
                args.len(),
                if args.len() == 1 { "was" } else { "were" }
            ),
            None,
        ));
    }

    // extra arguments were evaluated by the caller but bind nothing
    let args = &args[..arity];
    let total = args
        .iter()
        .filter_map(Value::as_distribution)
        .fold(BigUint::one(), |product, arg| product * arg.total());

    let mut application = Application {
        function,
        args,
        out: DistributionBuilder::new(total),
        grown: BigUint::one(),
    };
    bind(&mut application, 0, env.clone(), BigUint::one(), context)?;

    let mut out = application.out;
    out.simplify();
    Ok(out.build())
}

fn bind(
    application: &mut Application,
    index: usize,
    env: Env,
    weight: BigUint,
    context: &mut EvaluationContext,
) -> DiceResult<()> {
    let args = application.args;
    let Some(arg) = args.get(index) else {
        return merge(application, &env, &weight, context);
    };
    let param = application.function.params[index].clone();

    match arg {
        Value::Function(_) => {
            let env = env.update(param, arg.clone());
            bind(application, index + 1, env, weight, context)
        }
        Value::Distribution(distribution) => {
            for (value, count) in distribution.bins() {
                let env = env.update(param.clone(), Value::constant(value));
                bind(application, index + 1, env, &weight * count, context)?;
            }
            Ok(())
        }
    }
}

/// Evaluate the body with every parameter bound and fold its result into the
/// output on a common denominator.
fn merge(
    application: &mut Application,
    env: &Env,
    weight: &BigUint,
    context: &mut EvaluationContext,
) -> DiceResult<()> {
    let produced = evaluate_expression(&application.function.body, env, context)?;
    let Value::Distribution(produced) = produced else {
        return Err(DiceError::eval("Functions can only return numbers", None));
    };

    let divisor = application.grown.gcd(produced.total());
    if &divisor != produced.total() {
        let by = produced.total() / &divisor;
        application.out.grow(&by);
        application.grown *= by;
    }

    let scale = weight * &application.grown / produced.total();
    for (value, count) in produced.bins() {
        application.out.add(value, count * &scale);
    }
    Ok(())
}
