//! Reference and dependency analysis utilities
//!
//! Extracts the free names of expressions. Used by the definition resolver to
//! order named definitions and by the evaluator to build cache keys.

use crate::evaluator::context::Env;
use crate::semantic::LEVEL_NAME;
use crate::{Expression, ExpressionKind, Value};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Collect the free names of an expression, sorted and deduplicated.
///
/// A name is free when it is not bound by a parameter of an enclosing
/// function literal inside the expression. `lvlN` terms read `level`.
///
/// # Examples
/// ```text
/// Expression: area dexh lvl3[8]d6
/// Returns: ["area", "dexh", "level"]
///
/// Expression: fn roll { roll + spellmod >= ac }[d20]
/// Returns: ["ac", "spellmod"]
/// ```
pub fn collect_free_names(expr: &Expression) -> Vec<Arc<str>> {
    let mut names = BTreeSet::new();
    collect_names(expr, &mut names);
    names.into_iter().collect()
}

fn collect_names(expr: &Expression, names: &mut BTreeSet<Arc<str>>) {
    match &expr.kind {
        ExpressionKind::Name(name) => {
            names.insert(name.clone());
        }
        ExpressionKind::Level(_) => {
            names.insert(Arc::from(LEVEL_NAME));
        }
        ExpressionKind::Binary(lhs, _, rhs) => {
            names.extend(lhs.free_names().iter().cloned());
            names.extend(rhs.free_names().iter().cloned());
        }
        ExpressionKind::Unary(_, inner) => {
            names.extend(inner.free_names().iter().cloned());
        }
        ExpressionKind::Call(callee, args) => {
            names.extend(callee.free_names().iter().cloned());
            for arg in args {
                names.extend(arg.free_names().iter().cloned());
            }
        }
        ExpressionKind::Function(function) => {
            names.extend(function.free_names());
        }
        ExpressionKind::Literal(_) | ExpressionKind::Die(_) => {}
    }
}

/// Names whose current values determine the result of evaluating `expr` in `env`.
///
/// Starts from the syntactic free names and follows every name bound to a
/// function: because function bodies resolve free names at the call site,
/// their free names are dependencies of the caller too.
pub fn runtime_dependencies(expr: &Expression, env: &Env) -> Vec<Arc<str>> {
    let mut seen: BTreeSet<Arc<str>> = BTreeSet::new();
    let mut pending: Vec<Arc<str>> = expr.free_names().to_vec();

    while let Some(name) = pending.pop() {
        if !seen.insert(name.clone()) {
            continue;
        }
        if let Some(Value::Function(function)) = env.get(&name) {
            pending.extend(function.free_names());
        }
    }

    seen.into_iter().collect()
}

/// Names referenced by `expr` that are also named definitions, in sorted order.
pub fn definition_references<V>(
    expr: &Expression,
    definitions: &indexmap::IndexMap<String, V>,
) -> Vec<Arc<str>> {
    expr.free_names()
        .iter()
        .filter(|name| definitions.contains_key(&name[..]))
        .cloned()
        .collect()
}
