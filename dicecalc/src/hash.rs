//! Deterministic 32-bit structural hashing
//!
//! Hashes feed the evaluation cache only. Every combinator threads a running
//! `u32` state through an fxhash-style rotate-xor-multiply step, so the same
//! structure always produces the same key across runs and platforms.

use crate::distribution::Distribution;
use crate::evaluator::context::Env;
use crate::semantic::{BinaryOperator, Expression, ExpressionKind, Function};
use crate::Value;
use std::sync::Arc;

const SEED_CALL: u32 = 4351;
const SEED_DIE: u32 = 7354;
const SEED_FUNCTION: u32 = 3842;
const SEED_LITERAL: u32 = 6381;
const SEED_LEVEL: u32 = 3741;
const SEED_NAME: u32 = 7834;
const SEED_BINARY: u32 = 9815;
const SEED_UNARY: u32 = 6781;

const SEED_UNDEFINED: u32 = 4231;
const SEED_DISTRIBUTION: u32 = 8123;
const SEED_CLOSURE: u32 = 1592;

/// Mix one 32-bit word into the running state.
pub fn int(state: u32, value: u32) -> u32 {
    (state.rotate_left(5) ^ value).wrapping_mul(0x27220a95)
}

fn length(state: u32, value: usize) -> u32 {
    int(state, value as u32)
}

/// Hash a number by its bit pattern, low word first. `-0.0` hashes as `0.0`.
pub fn number(state: u32, value: f64) -> u32 {
    let bits = if value == 0.0 { 0u64 } else { value.to_bits() };
    let state = int(state, bits as u32);
    int(state, (bits >> 32) as u32)
}

pub fn string(state: u32, text: &str) -> u32 {
    let state = length(state, text.chars().count());
    text.chars().fold(state, |state, c| int(state, c as u32))
}

/// Hash a distribution's histogram.
///
/// Each bin is hashed from the same starting state and the bin hashes are
/// summed, so the result does not depend on insertion order.
pub fn distribution(distribution: &Distribution) -> u32 {
    let state = length(0, distribution.len());
    let bins = distribution.bins().fold(0u32, |acc, (value, count)| {
        let mut bin = number(state, value);
        let digits = count.to_u32_digits();
        for digit in &digits {
            bin = int(bin, *digit);
        }
        bin = length(bin, digits.len());
        acc.wrapping_add(bin)
    });
    int(state, bins)
}

pub fn function(state: u32, function: &Function) -> u32 {
    let mut state = length(state, function.params.len());
    for param in &function.params {
        state = string(state, param);
    }
    int(state, function.body.structural_hash())
}

/// Hash a value, or the absence of one for unbound names.
pub fn value(state: u32, value: Option<&Value>) -> u32 {
    match value {
        None => int(state, SEED_UNDEFINED),
        Some(Value::Distribution(distribution)) => {
            int(int(state, SEED_DISTRIBUTION), distribution.structural_hash())
        }
        Some(Value::Function(closure)) => function(int(state, SEED_CLOSURE), closure),
    }
}

fn operator_name(op: BinaryOperator) -> &'static str {
    match op {
        // juxtaposition and `*` are the same operation
        BinaryOperator::Juxtapose => BinaryOperator::Multiply.symbol(),
        other => other.symbol(),
    }
}

/// Structural hash of one node. Children contribute their memoized hashes.
///
/// Callers should use [`Expression::structural_hash`], which memoizes this.
pub fn expression(expr: &Expression) -> u32 {
    match &expr.kind {
        ExpressionKind::Call(callee, args) => {
            let mut state = length(int(0, SEED_CALL), args.len());
            for arg in args {
                state = int(state, arg.structural_hash());
            }
            int(state, callee.structural_hash())
        }
        ExpressionKind::Die(faces) => int(int(0, SEED_DIE), *faces),
        ExpressionKind::Function(closure) => function(int(0, SEED_FUNCTION), closure),
        ExpressionKind::Literal(value) => number(int(0, SEED_LITERAL), *value),
        ExpressionKind::Level(threshold) => int(int(0, SEED_LEVEL), *threshold),
        ExpressionKind::Name(name) => string(int(0, SEED_NAME), name),
        ExpressionKind::Binary(lhs, op, rhs) => {
            let state = string(int(0, SEED_BINARY), operator_name(*op));
            let state = int(state, lhs.structural_hash());
            int(state, rhs.structural_hash())
        }
        ExpressionKind::Unary(op, inner) => {
            let state = string(int(0, SEED_UNARY), op.symbol());
            int(state, inner.structural_hash())
        }
    }
}

/// Hash the current values of `names` in `env`, in the given order.
pub fn dependencies(names: &[Arc<str>], env: &Env) -> u32 {
    names.iter().fold(0, |state, name| {
        let state = string(state, name);
        value(state, env.get(name))
    })
}
