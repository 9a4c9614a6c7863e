use crate::distribution::Distribution;
use crate::{DiceError, ParameterGroup};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt;
use std::sync::Arc;

/// Result of analyzing a collection document
///
/// Always returned, even when some items failed: failures are listed in
/// `errors` next to the results that could be computed.
#[derive(Debug, Clone, serde::Serialize)]
pub struct CollectionAnalysis {
    /// Formula results, by descending mean, then name, then line
    pub results: Vec<FormulaResult>,
    pub errors: Vec<Diagnostic>,
    /// Declared parameter groups, echoed for UI consumption
    pub parameter_groups: Vec<ParameterGroup>,
}

impl CollectionAnalysis {
    pub fn result(&self, name: &str) -> Option<&FormulaResult> {
        self.results.iter().find(|result| result.name == name)
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Statistics for one successfully evaluated formula
#[derive(Debug, Clone, serde::Serialize)]
pub struct FormulaResult {
    pub name: String,
    pub line: usize,
    #[serde(skip)]
    pub distribution: Arc<Distribution>,
    pub mean: Option<f64>,
    pub stddev: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    /// Outcome → approximate probability, ascending by outcome
    #[serde(serialize_with = "serialize_probabilities")]
    pub probabilities: Vec<(f64, f64)>,
}

impl FormulaResult {
    pub fn new(name: impl Into<String>, line: usize, distribution: Arc<Distribution>) -> Self {
        Self {
            name: name.into(),
            line,
            mean: distribution.average(),
            stddev: distribution.stddev(),
            min: distribution.min(),
            max: distribution.max(),
            probabilities: distribution.probabilities(),
            distribution,
        }
    }
}

/// Outcomes become object keys: `{"3": 0.0046, "4": 0.0138}`
fn serialize_probabilities<S: Serializer>(
    probabilities: &[(f64, f64)],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(probabilities.len()))?;
    for (outcome, probability) in probabilities {
        map.serialize_entry(&outcome.to_string(), probability)?;
    }
    map.end()
}

/// An error attributed to one item of a document
///
/// The label is the item's name when one is known, `Line <n>` otherwise.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub label: String,
    pub error: DiceError,
}

impl Diagnostic {
    pub fn named(name: impl Into<String>, error: DiceError) -> Self {
        Self {
            label: name.into(),
            error,
        }
    }

    pub fn line(line: usize, error: DiceError) -> Self {
        Self {
            label: format!("Line {}", line),
            error,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.label, self.error)
    }
}

impl Serialize for Diagnostic {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
