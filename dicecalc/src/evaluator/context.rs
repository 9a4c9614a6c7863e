//! Evaluation context
//!
//! Holds the state shared by every node evaluated during one analysis run:
//! limits, the optional cache and the current function-call depth.

use super::cache::Cache;
use crate::{DiceError, DiceResult, ResourceLimits, Value};
use std::sync::Arc;

/// Name → value bindings, extended by copy (`Env::update`) and never mutated
/// through a shared alias.
pub type Env = im::HashMap<Arc<str>, Value>;

pub struct EvaluationContext<'a> {
    pub limits: &'a ResourceLimits,

    /// Memo table shared across runs; `None` evaluates without caching
    pub cache: Option<&'a mut Cache>,

    call_depth: usize,
}

impl<'a> EvaluationContext<'a> {
    pub fn new(limits: &'a ResourceLimits, cache: Option<&'a mut Cache>) -> Self {
        Self {
            limits,
            cache,
            call_depth: 0,
        }
    }

    /// Enter one function application, failing once the nesting limit is hit.
    pub fn enter_call(&mut self) -> DiceResult<()> {
        if self.call_depth >= self.limits.max_call_depth {
            return Err(DiceError::ResourceLimitExceeded {
                limit_name: "max_call_depth".to_string(),
                limit_value: self.limits.max_call_depth.to_string(),
                actual_value: (self.call_depth + 1).to_string(),
                suggestion: "Check for functions that call themselves through a parameter"
                    .to_string(),
            });
        }
        self.call_depth += 1;
        Ok(())
    }

    pub fn exit_call(&mut self) {
        self.call_depth = self.call_depth.saturating_sub(1);
    }
}
