//! # Dicecalc Engine
//!
//! **Exact damage distributions for tabletop formulas**
//!
//! Dicecalc computes exact discrete probability distributions from short
//! formulas mixing dice, arithmetic, comparisons, parameters, named
//! definitions and functions. Probabilities are kept as arbitrary-precision
//! counts and only converted to floats for display.
//!
//! ## Quick Start
//!
//! ```rust
//! use dicecalc::Engine;
//! use std::collections::HashMap;
//!
//! let mut engine = Engine::new();
//! let analysis = engine.analyze(
//!     r#"
//!         [min=1][max=9] level ? Slot level = 3
//!         Fireball: lvl3[8]d6
//!     "#,
//!     &HashMap::new(),
//! );
//!
//! let fireball = analysis.result("Fireball").unwrap();
//! assert_eq!(fireball.mean, Some(28.0));
//! assert!(analysis.errors.is_empty());
//! ```
//!
//! ## Core Concepts
//!
//! ### Formulas
//! `name: expression` lines are analyzed and reported with their mean,
//! standard deviation, range and probability table.
//!
//! ### Multiplication is repetition
//! When the left operand of `*` (or of two terms written side by side) is a
//! non-negative integer count, the right operand is rolled that many times
//! and summed: `3d6`, `(3 + lvl1)(1d4 + 1)`.
//!
//! ### Definitions and parameters
//! `name = expression` lines are evaluated once and shared by every formula.
//! `name ? Label = default` lines declare tunable integers.
//!
//! ### Functions
//! `fn roll { ... }[d20]` evaluates the body once per outcome of the
//! argument. Free names in a body resolve where the function is called.

pub mod analysis;
pub mod ast;
pub mod bundled;
pub mod distribution;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod hash;
pub mod parser;
pub mod resource_limits;
pub mod response;
pub mod semantic;
pub mod value;

#[cfg(target_arch = "wasm32")]
pub mod wasm;

pub use ast::{SourceOrigin, Span};
pub use distribution::{Distribution, DistributionBuilder};
pub use engine::Engine;
pub use error::{DiceError, ErrorDetails};
pub use evaluator::cache::{Cache, CacheStats};
pub use evaluator::context::Env;
pub use evaluator::evaluate;
pub use parser::{parse_document, parse_expression, ParsedDocument};
pub use resource_limits::ResourceLimits;
pub use response::{CollectionAnalysis, Diagnostic, FormulaResult};
pub use semantic::*;
pub use value::Value;

/// Result type for dice engine operations
pub type DiceResult<T> = Result<T, DiceError>;

#[cfg(test)]
mod tests;
