//! Collection evaluation
//!
//! Evaluates a parsed document by:
//! 1. Binding parameters (overrides first, then declared defaults)
//! 2. Resolving named definitions in dependency order
//! 3. Evaluating every formula independently
//! 4. Sorting results by descending mean

pub mod cache;
pub mod context;
pub mod expression;
pub mod operations;

use crate::analysis::definition_references;
use crate::{
    Definition, DiceError, DiceResult, Diagnostic, Document, Expression, FormulaResult,
    ResourceLimits, Value,
};
use cache::Cache;
use context::{Env, EvaluationContext};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

pub use expression::evaluate_expression;

/// Evaluate a single expression without a cache, using default limits.
pub fn evaluate(expr: &Expression, env: &Env) -> DiceResult<Value> {
    let limits = ResourceLimits::default();
    let mut context = EvaluationContext::new(&limits, None);
    evaluate_expression(expr, env, &mut context)
}

/// Evaluates collection documents
#[derive(Default)]
pub struct Evaluator;

impl Evaluator {
    /// Evaluate every formula of `document`.
    ///
    /// Failures are collected as diagnostics; one failing definition or
    /// formula never prevents the others from being evaluated.
    pub fn evaluate_document(
        &self,
        document: &Document,
        overrides: &HashMap<String, i64>,
        limits: &ResourceLimits,
        cache: Option<&mut Cache>,
    ) -> (Vec<FormulaResult>, Vec<Diagnostic>) {
        let mut context = EvaluationContext::new(limits, cache);

        let globals = bind_parameters(document, overrides);

        let mut resolver = DefinitionResolver {
            definitions: &document.definitions,
            marks: HashMap::new(),
            path: Vec::new(),
            globals,
            diagnostics: Vec::new(),
        };
        for name in document.definitions.keys() {
            resolver.resolve(name, &mut context);
        }
        let DefinitionResolver {
            globals,
            marks,
            mut diagnostics,
            ..
        } = resolver;
        debug!(
            definitions = document.definitions.len(),
            failed = marks.values().filter(|mark| **mark == Mark::Failed).count(),
            "definitions resolved"
        );

        let mut results = Vec::with_capacity(document.formulas.len());
        for formula in &document.formulas {
            let failed = definition_references(&formula.expression, &document.definitions)
                .into_iter()
                .find(|name| marks.get(&**name) == Some(&Mark::Failed));
            if let Some(dependency) = failed {
                diagnostics.push(Diagnostic::named(
                    &formula.name,
                    failed_dependency(&dependency, &formula.expression),
                ));
                continue;
            }

            match evaluate_expression(&formula.expression, &globals, &mut context) {
                Ok(Value::Distribution(distribution)) => {
                    results.push(FormulaResult::new(&formula.name, formula.line, distribution));
                }
                Ok(Value::Function(_)) => diagnostics.push(Diagnostic::named(
                    &formula.name,
                    DiceError::eval("Formula must evaluate to a number", formula.expression.span),
                )),
                Err(error) => diagnostics.push(Diagnostic::named(&formula.name, error)),
            }
        }
        debug!(
            formulas = results.len(),
            errors = diagnostics.len(),
            "formulas analyzed"
        );

        sort_results(&mut results);
        (results, diagnostics)
    }
}

/// Order by descending mean (no mean last), then name, then line.
pub fn sort_results(results: &mut [FormulaResult]) {
    results.sort_by(|a, b| {
        let by_mean = match (a.mean, b.mean) {
            (Some(a), Some(b)) => b.total_cmp(&a),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        by_mean
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.line.cmp(&b.line))
    });
}

fn bind_parameters(document: &Document, overrides: &HashMap<String, i64>) -> Env {
    let mut globals = Env::new();
    for parameter in document.parameters() {
        let value = overrides
            .get(&parameter.id)
            .copied()
            .unwrap_or(parameter.default);
        globals.insert(Arc::from(parameter.id.as_str()), Value::constant(value as f64));
    }
    for id in overrides.keys() {
        if !document.parameters().any(|parameter| &parameter.id == id) {
            debug!(parameter = %id, "ignoring override for undeclared parameter");
        }
    }
    globals
}

fn failed_dependency(dependency: &str, expr: &Expression) -> DiceError {
    DiceError::eval(
        format!(
            "depends on definition '{}', which could not be evaluated",
            dependency
        ),
        expr.span,
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    InProgress,
    Done,
    Failed,
}

/// Depth-first definition evaluation with three-state marking.
struct DefinitionResolver<'d> {
    definitions: &'d indexmap::IndexMap<String, Definition>,
    marks: HashMap<&'d str, Mark>,
    /// Definitions currently in progress, outermost first
    path: Vec<&'d str>,
    globals: Env,
    diagnostics: Vec<Diagnostic>,
}

impl<'d> DefinitionResolver<'d> {
    /// Evaluate `name` after its dependencies and bind it as a global.
    /// Returns whether the definition is now bound.
    fn resolve(&mut self, name: &'d str, context: &mut EvaluationContext) -> bool {
        match self.marks.get(name) {
            Some(Mark::Done) => return true,
            Some(Mark::Failed) | Some(Mark::InProgress) => return false,
            None => {}
        }
        let definitions = self.definitions;
        let Some((name, definition)) = definitions.get_key_value(name) else {
            return false;
        };
        let name = name.as_str();

        self.marks.insert(name, Mark::InProgress);
        self.path.push(name);
        let outcome = self.resolve_dependencies(definition, context).and_then(|()| {
            evaluate_expression(&definition.expression, &self.globals, context)
        });
        self.path.pop();

        match outcome {
            Ok(value) => {
                self.globals.insert(Arc::from(name), value);
                self.marks.insert(name, Mark::Done);
                true
            }
            Err(error) => {
                self.diagnostics.push(Diagnostic::named(name, error));
                self.marks.insert(name, Mark::Failed);
                false
            }
        }
    }

    fn resolve_dependencies(
        &mut self,
        definition: &'d Definition,
        context: &mut EvaluationContext,
    ) -> Result<(), DiceError> {
        let definitions = self.definitions;
        for dependency in definition_references(&definition.expression, definitions) {
            let Some((dependency, _)) = definitions.get_key_value(&*dependency) else {
                continue;
            };
            let dependency = dependency.as_str();

            if self.marks.get(dependency) == Some(&Mark::InProgress) {
                let start = self
                    .path
                    .iter()
                    .position(|name| *name == dependency)
                    .unwrap_or(0);
                let mut cycle: Vec<String> =
                    self.path[start..].iter().map(|name| name.to_string()).collect();
                cycle.push(dependency.to_string());
                return Err(DiceError::CircularDependency(cycle));
            }

            if !self.resolve(dependency, context) {
                return Err(failed_dependency(dependency, &definition.expression));
            }
        }
        Ok(())
    }
}
