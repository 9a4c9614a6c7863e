//! Exact discrete distributions
//!
//! A distribution maps outcomes to arbitrary-precision counts over a common
//! total. Probabilities are `count / total` and are only turned into floats
//! at the very end, through 2^53 fixed-point scaling.
//!
//! Distributions are built through [`DistributionBuilder`] and frozen by
//! [`DistributionBuilder::build`]; a built distribution is never mutated.

use indexmap::IndexMap;
use num_bigint::{BigInt, BigUint};
use num_integer::Integer;
use num_traits::{FromPrimitive, One, ToPrimitive, Zero};
use std::sync::OnceLock;

/// 2^53 as a float: the fixed-point scale for exact-to-float conversion.
const FIXED_ONE: f64 = 9_007_199_254_740_992.0;

/// Histogram key: the bit pattern of an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Outcome(u64);

impl Outcome {
    fn value(self) -> f64 {
        f64::from_bits(self.0)
    }
}

fn outcome(value: f64) -> Outcome {
    // -0.0 and 0.0 share one bin
    Outcome(if value == 0.0 { 0.0f64 } else { value }.to_bits())
}

fn fixed_one() -> BigUint {
    BigUint::one() << 53u32
}

/// An exact finite probability mass function.
#[derive(Debug, Clone)]
pub struct Distribution {
    bins: IndexMap<Outcome, BigUint>,
    total: BigUint,
    hash: OnceLock<u32>,
}

impl PartialEq for Distribution {
    /// Bin-for-bin equality: same outcomes, same counts, same total.
    fn eq(&self, other: &Self) -> bool {
        self.total == other.total && self.bins == other.bins
    }
}

impl Distribution {
    /// Build a distribution from `(value, count)` pairs, accumulating duplicates.
    pub fn create<C: Into<BigUint>>(histogram: impl IntoIterator<Item = (f64, C)>) -> Self {
        let mut builder = DistributionBuilder::new(BigUint::zero());
        for (value, count) in histogram {
            let count = count.into();
            builder.total += &count;
            builder.add(value, count);
        }
        builder.build()
    }

    /// The one-point distribution of a constant.
    pub fn singular(value: f64) -> Self {
        Self::create([(value, 1u32)])
    }

    /// A fair die with faces `1..=faces`.
    pub fn uniform(faces: u32) -> Self {
        Self::create((1..=faces).map(|face| (f64::from(face), 1u32)))
    }

    pub fn empty() -> Self {
        Self::create(std::iter::empty::<(f64, u32)>())
    }

    pub fn total(&self) -> &BigUint {
        &self.total
    }

    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    /// Bins in insertion order.
    pub fn bins(&self) -> impl Iterator<Item = (f64, &BigUint)> + '_ {
        self.bins.iter().map(|(value, count)| (value.value(), count))
    }

    /// Outcomes in ascending order.
    pub fn outcomes(&self) -> Vec<f64> {
        let mut outcomes: Vec<f64> = self.bins.keys().map(|value| value.value()).collect();
        outcomes.sort_by(|a, b| a.total_cmp(b));
        outcomes
    }

    pub fn count(&self, value: f64) -> BigUint {
        self.bins
            .get(&outcome(value))
            .cloned()
            .unwrap_or_else(BigUint::zero)
    }

    /// A single outcome with probability one.
    pub fn as_constant(&self) -> Option<f64> {
        match self.bins.iter().next() {
            Some((value, _)) if self.bins.len() == 1 => Some(value.value()),
            _ => None,
        }
    }

    /// Memoized hash of the histogram; see [`crate::hash::distribution`].
    pub fn structural_hash(&self) -> u32 {
        *self.hash.get_or_init(|| crate::hash::distribution(self))
    }

    /// Copy with every count divided by the GCD of all counts.
    pub fn simplified(&self) -> Self {
        let mut builder = DistributionBuilder::from(self.clone());
        builder.simplify();
        builder.build()
    }

    /// Copy with every count and the total multiplied by `factor`.
    pub fn grown(&self, factor: &BigUint) -> Self {
        let mut builder = DistributionBuilder::from(self.clone());
        builder.grow(factor);
        builder.build()
    }

    /// Apply `f` to every outcome, merging bins that collide.
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        let mut builder = DistributionBuilder::new(self.total.clone());
        for (value, count) in self.bins() {
            builder.add(f(value), count.clone());
        }
        builder.build()
    }

    /// Exact probability of `value`, converted through 2^53 fixed point.
    pub fn probability(&self, value: f64) -> f64 {
        self.fixed_point_ratio(&self.count(value))
    }

    /// Outcome → approximate probability, ascending by outcome.
    pub fn probabilities(&self) -> Vec<(f64, f64)> {
        self.outcomes()
            .into_iter()
            .map(|value| (value, self.probability(value)))
            .collect()
    }

    fn fixed_point_ratio(&self, count: &BigUint) -> f64 {
        if self.total.is_zero() {
            return 0.0;
        }
        let scaled = count * fixed_one() / &self.total;
        scaled.to_f64().unwrap_or(f64::INFINITY) / FIXED_ONE
    }

    /// Sum of `round(f(value) * 2^53) * count`, divided by the total.
    fn fixed_point_mean(&self, f: impl Fn(f64) -> f64) -> Option<f64> {
        if self.total.is_zero() {
            return None;
        }
        let mut sum = BigInt::zero();
        for (value, count) in self.bins() {
            let scaled = BigInt::from_f64((f(value) * FIXED_ONE).round())?;
            sum += scaled * BigInt::from(count.clone());
        }
        let quotient = sum / BigInt::from(self.total.clone());
        Some(quotient.to_f64()? / FIXED_ONE)
    }

    pub fn average(&self) -> Option<f64> {
        self.fixed_point_mean(|value| value)
    }

    pub fn stddev(&self) -> Option<f64> {
        let average = self.average()?;
        let variance = self.fixed_point_mean(|value| (value - average).powi(2))?;
        Some(variance.sqrt())
    }

    pub fn min(&self) -> Option<f64> {
        self.bins.keys().map(|value| value.value()).reduce(f64::min)
    }

    pub fn max(&self) -> Option<f64> {
        self.bins.keys().map(|value| value.value()).reduce(f64::max)
    }

    /// Largest outcome whose count is at least `min_probability` of the modal count.
    pub fn max_reasonable(&self, min_probability: f64) -> Option<f64> {
        self.reasonable_outcomes(min_probability).reduce(f64::max)
    }

    /// Smallest outcome whose count is at least `min_probability` of the modal count.
    pub fn min_reasonable(&self, min_probability: f64) -> Option<f64> {
        self.reasonable_outcomes(min_probability).reduce(f64::min)
    }

    fn reasonable_outcomes(&self, min_probability: f64) -> impl Iterator<Item = f64> + '_ {
        let modal = self.bins.values().max().cloned().unwrap_or_else(BigUint::zero);
        // count / modal >= p  <=>  count * 2^53 >= round(p * 2^53) * modal
        let threshold = BigUint::from_f64((min_probability.max(0.0) * FIXED_ONE).round())
            .map(|p| p * &modal);
        self.bins.iter().filter_map(move |(value, count)| {
            let threshold = threshold.as_ref()?;
            (count * fixed_one() >= *threshold && !count.is_zero()).then_some(value.value())
        })
    }
}

/// Insertion-ordered accumulator for a distribution under construction.
///
/// The total is tracked separately from the bins: operators that know their
/// final denominator up front (cross products, convolution, function
/// application) set it at creation and grow it explicitly.
#[derive(Debug, Clone)]
pub struct DistributionBuilder {
    bins: IndexMap<Outcome, BigUint>,
    total: BigUint,
}

impl DistributionBuilder {
    pub fn new(total: BigUint) -> Self {
        Self {
            bins: IndexMap::new(),
            total,
        }
    }

    pub fn total(&self) -> &BigUint {
        &self.total
    }

    pub fn add(&mut self, value: f64, count: BigUint) {
        *self.bins.entry(outcome(value)).or_insert_with(BigUint::zero) += count;
    }

    /// Multiply every count and the total by `factor`.
    pub fn grow(&mut self, factor: &BigUint) {
        for count in self.bins.values_mut() {
            *count *= factor;
        }
        self.total *= factor;
    }

    /// Divide every count and the total by the GCD of the counts.
    ///
    /// No-op when the GCD is 0 or 1.
    pub fn simplify(&mut self) {
        let divisor = self
            .bins
            .values()
            .fold(BigUint::zero(), |acc, count| acc.gcd(count));
        if divisor <= BigUint::one() {
            return;
        }
        for count in self.bins.values_mut() {
            *count /= &divisor;
        }
        self.total /= &divisor;
    }

    pub fn build(self) -> Distribution {
        debug_assert!(
            self.bins.values().sum::<BigUint>() == self.total,
            "distribution total must equal the sum of its counts"
        );
        Distribution {
            bins: self.bins,
            total: self.total,
            hash: OnceLock::new(),
        }
    }
}

impl From<Distribution> for DistributionBuilder {
    fn from(distribution: Distribution) -> Self {
        Self {
            bins: distribution.bins,
            total: distribution.total,
        }
    }
}
