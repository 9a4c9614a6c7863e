use crate::analysis::{collect_free_names, definition_references, runtime_dependencies};
use crate::{parse_expression, Env, Expression, Value};
use indexmap::IndexMap;
use std::sync::Arc;

fn names(list: &[Arc<str>]) -> Vec<&str> {
    list.iter().map(|name| &**name).collect()
}

fn function_value(text: &str) -> Value {
    let expr = parse_expression(text).unwrap();
    match expr.kind {
        crate::ExpressionKind::Function(function) => Value::Function(function),
        other => panic!("Expected a function literal, got {:?}", other),
    }
}

#[test]
fn test_free_names_sorted_and_deduplicated() {
    let expr = parse_expression("area dexh lvl3[8]d6 + area").unwrap();
    assert_eq!(names(&collect_free_names(&expr)), vec!["area", "dexh", "level"]);
    assert_eq!(names(expr.free_names()), vec!["area", "dexh", "level"]);
}

#[test]
fn test_function_parameters_are_bound() {
    let expr = parse_expression("fn roll { roll + spellmod >= ac }[d20]").unwrap();
    assert_eq!(names(expr.free_names()), vec!["ac", "spellmod"]);

    let nested = parse_expression("fn a { fn b { a + b + c }[1] }").unwrap();
    assert_eq!(names(nested.free_names()), vec!["c"]);
}

#[test]
fn test_literals_have_no_free_names() {
    let expr: Expression = parse_expression("3d6 + min[1][d4]").unwrap();
    assert!(expr.free_names().is_empty());
}

#[test]
fn test_runtime_dependencies_follow_function_bindings() {
    let env = Env::new()
        .update(Arc::from("attack"), function_value("fn x { x + bonus >= ac }"))
        .update(Arc::from("bonus"), Value::constant(5.0));

    let expr = parse_expression("attack[d20]").unwrap();
    assert_eq!(names(expr.free_names()), vec!["attack"]);
    assert_eq!(
        names(&runtime_dependencies(&expr, &env)),
        vec!["ac", "attack", "bonus"]
    );
}

#[test]
fn test_runtime_dependencies_terminate_on_mutual_functions() {
    let env = Env::new()
        .update(Arc::from("f"), function_value("fn x { g[x] }"))
        .update(Arc::from("g"), function_value("fn x { f[x] }"));
    let expr = parse_expression("f[1]").unwrap();
    assert_eq!(names(&runtime_dependencies(&expr, &env)), vec!["f", "g"]);
}

#[test]
fn test_definition_references() {
    let mut definitions = IndexMap::new();
    definitions.insert("spellmod".to_string(), ());
    definitions.insert("unused".to_string(), ());

    let expr = parse_expression("d20 + spellmod >= ac").unwrap();
    assert_eq!(names(&definition_references(&expr, &definitions)), vec!["spellmod"]);
}
