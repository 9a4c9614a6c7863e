//! Operators over exact distributions
//!
//! Every binary operator is an outcome-wise cross product of the two
//! histograms, except multiplication by a non-negative integer count, which
//! is iterated convolution.

use crate::distribution::{Distribution, DistributionBuilder};
use crate::semantic::{BinaryOperator, UnaryOperator};
use crate::{DiceError, DiceResult, ResourceLimits};
use num_traits::{ToPrimitive, Zero};
use tracing::trace;

/// Apply a binary operator to two distributions.
///
/// # Examples
/// ```text
/// d4 + 1    = {2:1, 3:1, 4:1, 5:1} / 4
/// d2 >= 2   = {0:1, 1:1} / 2
/// 3 d6      = 3-fold convolution of d6, total 216
/// 0.5 d6    = floor(0.5 * face), total 6
/// ```
pub fn apply_binary(
    lhs: &Distribution,
    op: BinaryOperator,
    rhs: &Distribution,
    limits: &ResourceLimits,
) -> DiceResult<Distribution> {
    if op.is_multiplication() && is_repetition_count(lhs) {
        return convolve(lhs, rhs, limits);
    }
    if op == BinaryOperator::Divide && rhs.bins().any(|(value, _)| value == 0.0) {
        return Err(DiceError::eval("Division by zero", None));
    }
    Ok(cross_product(lhs, rhs, |a, b| binary_outcome(op, a, b)))
}

fn binary_outcome(op: BinaryOperator, a: f64, b: f64) -> f64 {
    let truth = |holds: bool| if holds { 1.0 } else { 0.0 };
    match op {
        BinaryOperator::Add => a + b,
        BinaryOperator::Subtract => a - b,
        BinaryOperator::Multiply | BinaryOperator::Juxtapose => (a * b).floor(),
        BinaryOperator::Divide => (a / b).floor(),
        BinaryOperator::Power => a.powf(b),
        BinaryOperator::Less => truth(a < b),
        BinaryOperator::Greater => truth(a > b),
        BinaryOperator::LessEqual => truth(a <= b),
        BinaryOperator::GreaterEqual => truth(a >= b),
        BinaryOperator::Equal => truth(a == b),
        BinaryOperator::NotEqual => truth(a != b),
        BinaryOperator::Min => a.min(b),
        BinaryOperator::Max => a.max(b),
    }
}

pub fn apply_unary(op: UnaryOperator, inner: &Distribution) -> Distribution {
    match op {
        UnaryOperator::Negate => inner.map(|value| -value),
        UnaryOperator::Floor => inner.map(f64::floor),
        UnaryOperator::Ceil => inner.map(f64::ceil),
    }
}

/// `max(level - threshold, 0)` for every outcome of `level`.
pub fn level_threshold(level: &Distribution, threshold: u32) -> Distribution {
    let threshold = f64::from(threshold);
    level.map(|value| (value - threshold).max(0.0))
}

/// Every outcome is a non-negative integer and at least one is 2 or more.
fn is_repetition_count(distribution: &Distribution) -> bool {
    !distribution.is_empty()
        && distribution
            .bins()
            .all(|(value, _)| value >= 0.0 && value.fract() == 0.0)
        && distribution.bins().any(|(value, _)| value >= 2.0)
}

fn cross_product(
    lhs: &Distribution,
    rhs: &Distribution,
    combine: impl Fn(f64, f64) -> f64,
) -> Distribution {
    let mut builder = DistributionBuilder::new(lhs.total() * rhs.total());
    for (a, lhs_count) in lhs.bins() {
        for (b, rhs_count) in rhs.bins() {
            builder.add(combine(a, b), lhs_count * rhs_count);
        }
    }
    builder.build()
}

/// Draw a count `c` from `lhs`, then sum `c` independent draws of `rhs`.
///
/// A running convolution is extended by one copy of `rhs` per step, and each
/// count's contribution is scaled by `rhs.total^(max - c)` so every term
/// shares the denominator `lhs.total * rhs.total^max`.
fn convolve(
    lhs: &Distribution,
    rhs: &Distribution,
    limits: &ResourceLimits,
) -> DiceResult<Distribution> {
    let largest = lhs.max().unwrap_or(0.0);
    let max = match largest.to_u64() {
        Some(max) if max <= limits.max_repetitions => max,
        _ => {
            return Err(DiceError::ResourceLimitExceeded {
                limit_name: "max_repetitions".to_string(),
                limit_value: limits.max_repetitions.to_string(),
                actual_value: largest.to_string(),
                suggestion: "Roll fewer dice in a single term".to_string(),
            });
        }
    };
    // bounded by max_repetitions above
    let max = max as u32;
    trace!(repetitions = max, faces = rhs.len(), "convolving");

    let mut builder = DistributionBuilder::new(lhs.total() * rhs.total().pow(max));
    let mut running = Distribution::singular(0.0);
    for count in 0..=max {
        let weight = lhs.count(f64::from(count));
        if !weight.is_zero() {
            let scale = weight * rhs.total().pow(max - count);
            for (value, running_count) in running.bins() {
                builder.add(value, running_count * &scale);
            }
        }
        if count < max {
            running = cross_product(&running, rhs, |a, b| a + b);
        }
    }

    let mut result = builder;
    result.simplify();
    Ok(result.build())
}
