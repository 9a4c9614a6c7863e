use crate::evaluator::cache::{Cache, CacheStats};
use crate::evaluator::Evaluator;
use crate::{parse_document, CollectionAnalysis, Diagnostic, ResourceLimits};
use std::collections::HashMap;
use tracing::debug;

/// The dice analysis engine.
///
/// Owns the evaluation cache, which persists across [`Engine::analyze`] calls
/// so that re-analyzing an edited document only recomputes what changed.
/// Not meant to be shared between concurrent analyses.
pub struct Engine {
    cache: Cache,
    evaluator: Evaluator,
    limits: ResourceLimits,
}

impl Default for Engine {
    fn default() -> Self {
        Self {
            cache: Cache::new(),
            evaluator: Evaluator,
            limits: ResourceLimits::default(),
        }
    }
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine with custom resource limits
    pub fn with_limits(limits: ResourceLimits) -> Self {
        Self {
            limits,
            ..Self::default()
        }
    }

    pub fn limits(&self) -> &ResourceLimits {
        &self.limits
    }

    /// Analyze a collection document.
    ///
    /// `overrides` maps parameter ids to values replacing their declared
    /// defaults. Every failure ends up in [`CollectionAnalysis::errors`].
    pub fn analyze(&mut self, source: &str, overrides: &HashMap<String, i64>) -> CollectionAnalysis {
        let parsed = match parse_document(source, &self.limits) {
            Ok(parsed) => parsed,
            Err(error) => {
                return CollectionAnalysis {
                    results: Vec::new(),
                    errors: vec![Diagnostic::named("Document", error)],
                    parameter_groups: Vec::new(),
                }
            }
        };

        let (results, evaluation_errors) = self.evaluator.evaluate_document(
            &parsed.document,
            overrides,
            &self.limits,
            Some(&mut self.cache),
        );

        let mut errors = parsed.diagnostics;
        errors.extend(evaluation_errors);

        let stats = self.cache.stats();
        debug!(
            results = results.len(),
            errors = errors.len(),
            cache_entries = stats.entries,
            cache_hits = stats.hits,
            "analysis complete"
        );

        CollectionAnalysis {
            results,
            errors,
            parameter_groups: parsed.document.parameter_groups,
        }
    }

    /// Drop cache entries not used since the previous sweep.
    ///
    /// Call after an analysis completes. Returns the number of evicted entries.
    pub fn sweep_cache(&mut self) -> usize {
        self.cache.sweep()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}
