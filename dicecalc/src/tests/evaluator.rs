use super::{approx, env, roll, roll_in};
use crate::evaluator::context::EvaluationContext;
use crate::evaluator::evaluate_expression;
use crate::{evaluate, parse_expression, DiceError, Distribution, Env, ResourceLimits, Value};
use num_bigint::BigUint;

fn eval_error(text: &str, env: &Env) -> DiceError {
    let expr = parse_expression(text).unwrap();
    match evaluate(&expr, env) {
        Err(error) => error,
        Ok(value) => panic!("{} should fail, got {:?}", text, value),
    }
}

fn eval_message(text: &str) -> String {
    eval_error(text, &Env::new()).message()
}

#[test]
fn test_constants_and_arithmetic() {
    assert_eq!(roll("1 + 2 * 3").as_constant(), Some(7.0));
    assert_eq!(roll("2 ^ 10").as_constant(), Some(1024.0));
    assert_eq!(roll("7 / 2").as_constant(), Some(3.0));
    assert_eq!(roll("(0 - 7) / 2").as_constant(), Some(-4.0));
    assert_eq!(roll("-7 / 2").as_constant(), Some(-3.0));
    assert_eq!(roll("2.5 * 3").as_constant(), Some(7.0));
    assert_eq!(roll("5 - -3").as_constant(), Some(8.0));
}

#[test]
fn test_comparisons_are_indicators() {
    let hit = roll("d20 >= 11");
    assert_eq!(hit.total(), &BigUint::from(20u32));
    assert_eq!(hit.count(1.0), BigUint::from(10u32));
    assert_eq!(hit.count(0.0), BigUint::from(10u32));
    assert_eq!(roll("3 == 3").as_constant(), Some(1.0));
    assert_eq!(roll("3 != 3").as_constant(), Some(0.0));
    assert_eq!(roll("2 < 1").as_constant(), Some(0.0));
}

#[test]
fn test_repetition_is_convolution() {
    assert_eq!(*roll("(1+1)d4"), *roll("2d4"));
    assert_eq!(*roll("3 * d6"), *roll("3d6"));
    assert_eq!(roll("2d4").total(), &BigUint::from(16u32));
    assert_eq!(roll("0 d6").as_constant(), Some(0.0));
    assert_eq!(*roll("1 d6"), Distribution::uniform(6));
}

#[test]
fn test_random_repetition_count() {
    // d2 copies of d4: half the time 1d4, half the time 2d4
    let distribution = roll("d2 d4");
    assert_eq!(distribution.total(), &BigUint::from(32u32));
    assert!(approx(distribution.average(), 3.75));
    assert_eq!(distribution.min(), Some(1.0));
    assert_eq!(distribution.max(), Some(8.0));
    assert_eq!(distribution.count(2.0), BigUint::from(5u32));
}

#[test]
fn test_fractional_and_negative_multipliers_scale() {
    let halved = roll("0.5 d6");
    assert_eq!(halved.total(), &BigUint::from(6u32));
    assert_eq!(halved.count(0.0), BigUint::from(1u32));
    assert_eq!(halved.count(1.0), BigUint::from(2u32));
    assert_eq!(halved.count(3.0), BigUint::from(1u32));

    let negated = roll("(0 - 2) d6");
    assert_eq!(negated.min(), Some(-12.0));
    assert_eq!(negated.max(), Some(-2.0));
    assert_eq!(negated.len(), 6);
}

#[test]
fn test_named_and_rounding_operators() {
    assert_eq!(roll("min[3][5]").as_constant(), Some(3.0));
    assert_eq!(roll("max[3][5]").as_constant(), Some(5.0));
    assert_eq!(roll("max[1][2][9]").as_constant(), Some(9.0));
    assert_eq!(roll("floor[2.5]").as_constant(), Some(2.0));
    assert_eq!(roll("ceil[2.5]").as_constant(), Some(3.0));

    let advantage = roll("max[d20][d20]");
    assert_eq!(advantage.total(), &BigUint::from(400u32));
    assert_eq!(advantage.count(20.0), BigUint::from(39u32));
}

#[test]
fn test_level_thresholds() {
    let level_five = env(&[("level", 5.0)]);
    assert_eq!(roll_in("lvl3", &level_five).as_constant(), Some(2.0));
    assert_eq!(roll_in("lvl7", &level_five).as_constant(), Some(0.0));
    assert_eq!(*roll_in("lvl3[8]d6", &level_five), *roll("10d6"));
}

#[test]
fn test_level_without_parameter() {
    assert_eq!(eval_message("lvl1"), "Unknown name 'level'");
}

#[test]
fn test_names_resolve_in_environment() {
    let bindings = env(&[("spellmod", 5.0), ("ac", 15.0)]);
    let hit = roll_in("d20 + spellmod >= ac", &bindings);
    assert_eq!(hit.count(1.0), BigUint::from(11u32));
    assert_eq!(eval_message("foo + 1"), "Unknown name 'foo'");
}

#[test]
fn test_function_application() {
    let hit = roll("fn x { x >= 11 }[d20]");
    assert_eq!(hit.total(), &BigUint::from(2u32), "result is simplified");
    assert_eq!(hit.probability(1.0), 0.5);

    assert_eq!(*roll("fn x { x d4 }[d2]"), *roll("d2 d4"));
    assert_eq!(roll("fn a b { a + b }[3][4]").as_constant(), Some(7.0));
    assert_eq!(*roll("fn a b { a + b }[d6][d6]"), *roll("2d6"));
    assert_eq!(roll("fn { 7 }[1]").as_constant(), Some(7.0));
}

#[test]
fn test_function_arguments_may_be_functions() {
    let twice = roll("fn f x { f[f[x]] }[fn y { y + 1 }][3]");
    assert_eq!(twice.as_constant(), Some(5.0));
}

#[test]
fn test_free_names_resolve_at_call_site() {
    let bindings = env(&[("bonus", 3.0)]);
    assert_eq!(
        roll_in("fn x { x + bonus }[1]", &bindings).as_constant(),
        Some(4.0)
    );
}

#[test]
fn test_extra_arguments_are_ignored() {
    assert_eq!(roll("fn x { x }[2][d6]").as_constant(), Some(2.0));
}

#[test]
fn test_function_errors() {
    assert_eq!(
        eval_message("fn a b { a + b }[1]"),
        "Function expects 2 arguments but 1 was supplied"
    );
    assert_eq!(
        eval_message("fn a b c { a }[1][2]"),
        "Function expects 3 arguments but 2 were supplied"
    );
    assert_eq!(eval_message("3[1]"), "Cannot call '3': it is not a function");
    assert_eq!(eval_message("fn x { x } + 1"), "Cannot apply '+' to a function");
    assert_eq!(eval_message("2 fn x { x }"), "Cannot apply '*' to a function");
    assert_eq!(
        eval_message("fn x { fn y { y } }[1]"),
        "Functions can only return numbers"
    );
}

#[test]
fn test_function_literal_is_a_value() {
    let expr = parse_expression("fn x { x }").unwrap();
    assert!(matches!(evaluate(&expr, &Env::new()), Ok(Value::Function(_))));
}

#[test]
fn test_division_by_zero() {
    assert_eq!(eval_message("d6 / 0"), "Division by zero");
    assert_eq!(eval_message("d6 / (d2 - 1)"), "Division by zero");
    assert!(roll("d6 / d2").max() == Some(6.0));
}

#[test]
fn test_errors_carry_spans() {
    let error = eval_error("1 + foo", &Env::new());
    let span = error.span().unwrap();
    assert_eq!((span.start, span.end), (4, 7));
}

#[test]
fn test_repetition_limit() {
    let limits = ResourceLimits {
        max_repetitions: 10,
        ..ResourceLimits::default()
    };
    let expr = parse_expression("20d6").unwrap();
    let mut context = EvaluationContext::new(&limits, None);
    match evaluate_expression(&expr, &Env::new(), &mut context) {
        Err(DiceError::ResourceLimitExceeded { limit_name, .. }) => {
            assert_eq!(limit_name, "max_repetitions")
        }
        other => panic!("Expected a repetition limit error, got {:?}", other),
    }
}

#[test]
fn test_call_depth_limit() {
    let limits = ResourceLimits {
        max_call_depth: 16,
        ..ResourceLimits::default()
    };
    let expr = parse_expression("fn f { f[f] }[fn f { f[f] }]").unwrap();
    let mut context = EvaluationContext::new(&limits, None);
    match evaluate_expression(&expr, &Env::new(), &mut context) {
        Err(DiceError::ResourceLimitExceeded { limit_name, .. }) => {
            assert_eq!(limit_name, "max_call_depth")
        }
        other => panic!("Expected a call depth error, got {:?}", other),
    }
}
