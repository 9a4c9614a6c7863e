use crate::distribution::Distribution;
use crate::semantic::Function;
use std::sync::Arc;

/// Result of evaluating an expression
///
/// Both variants are cheap to clone; cached values are shared, never copied.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Distribution(Arc<Distribution>),
    /// A closure with no captured environment
    Function(Arc<Function>),
}

impl Value {
    pub fn constant(value: f64) -> Self {
        Value::Distribution(Arc::new(Distribution::singular(value)))
    }

    pub fn as_distribution(&self) -> Option<&Arc<Distribution>> {
        match self {
            Value::Distribution(distribution) => Some(distribution),
            Value::Function(_) => None,
        }
    }
}

impl From<Distribution> for Value {
    fn from(distribution: Distribution) -> Self {
        Value::Distribution(Arc::new(distribution))
    }
}
