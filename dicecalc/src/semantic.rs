//! Expression and document model
//!
//! Expressions are immutable once parsed. Each node lazily memoizes its
//! structural hash and the sorted list of free names it depends on.

use crate::ast::Span;
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// Parameter that `lvlN` terms read.
pub const LEVEL_NAME: &str = "level";

/// An expression node with its source span.
#[derive(Debug, Clone)]
pub struct Expression {
    pub kind: ExpressionKind,
    pub span: Option<Span>,
    height: usize,
    hash: OnceLock<u32>,
    free_names: OnceLock<Arc<[Arc<str>]>>,
}

impl Expression {
    pub fn new(kind: ExpressionKind, span: Option<Span>) -> Self {
        let height = kind.child_height() + 1;
        Self {
            kind,
            span,
            height,
            hash: OnceLock::new(),
            free_names: OnceLock::new(),
        }
    }

    /// Expression without a source location (tests, synthesized nodes)
    pub fn bare(kind: ExpressionKind) -> Self {
        Self::new(kind, None)
    }

    /// Nodes on the longest path from here to a leaf, this one included.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Structural hash of this node, computed once.
    pub fn structural_hash(&self) -> u32 {
        *self.hash.get_or_init(|| crate::hash::expression(self))
    }

    /// Sorted, deduplicated names this expression reads from its environment.
    pub fn free_names(&self) -> &[Arc<str>] {
        self.free_names
            .get_or_init(|| crate::analysis::collect_free_names(self).into())
    }

    /// Leaves are evaluated directly and never go through the cache.
    pub fn is_leaf(&self) -> bool {
        matches!(
            self.kind,
            ExpressionKind::Literal(_)
                | ExpressionKind::Die(_)
                | ExpressionKind::Name(_)
                | ExpressionKind::Level(_)
                | ExpressionKind::Function(_)
        )
    }
}

impl PartialEq for Expression {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

/// The kind of expression
#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionKind {
    Literal(f64),
    /// Uniform die with faces 1..=n
    Die(u32),
    Name(Arc<str>),
    /// `max(level - k, 0)`
    Level(u32),
    Binary(Box<Expression>, BinaryOperator, Box<Expression>),
    Unary(UnaryOperator, Box<Expression>),
    Call(Box<Expression>, Vec<Expression>),
    Function(Arc<Function>),
}

impl ExpressionKind {
    fn child_height(&self) -> usize {
        match self {
            ExpressionKind::Literal(_)
            | ExpressionKind::Die(_)
            | ExpressionKind::Name(_)
            | ExpressionKind::Level(_) => 0,
            ExpressionKind::Binary(lhs, _, rhs) => lhs.height.max(rhs.height),
            ExpressionKind::Unary(_, inner) => inner.height,
            ExpressionKind::Call(callee, args) => args
                .iter()
                .map(|arg| arg.height)
                .fold(callee.height, usize::max),
            ExpressionKind::Function(function) => function.body.height,
        }
    }
}

/// A function literal, and the closure value it evaluates to.
///
/// Closures capture nothing: free names in the body resolve against the
/// environment of the call site.
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub params: Vec<Arc<str>>,
    pub body: Expression,
}

impl Function {
    pub fn new(params: Vec<Arc<str>>, body: Expression) -> Self {
        Self { params, body }
    }

    /// Free names of the body that are not parameters.
    pub fn free_names(&self) -> Vec<Arc<str>> {
        self.body
            .free_names()
            .iter()
            .filter(|name| !self.params.contains(name))
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Associativity {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    Equal,
    NotEqual,
    Add,
    Subtract,
    /// Two atoms written next to each other
    Juxtapose,
    Multiply,
    Divide,
    Power,
    Min,
    Max,
}

impl BinaryOperator {
    /// Infix operators in the order the lexer must try them (longest first).
    pub const INFIX: [BinaryOperator; 12] = [
        BinaryOperator::LessEqual,
        BinaryOperator::GreaterEqual,
        BinaryOperator::Equal,
        BinaryOperator::NotEqual,
        BinaryOperator::Less,
        BinaryOperator::Greater,
        BinaryOperator::Add,
        BinaryOperator::Subtract,
        BinaryOperator::Multiply,
        BinaryOperator::Divide,
        BinaryOperator::Power,
        BinaryOperator::Juxtapose,
    ];

    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOperator::Less => "<",
            BinaryOperator::Greater => ">",
            BinaryOperator::LessEqual => "<=",
            BinaryOperator::GreaterEqual => ">=",
            BinaryOperator::Equal => "==",
            BinaryOperator::NotEqual => "!=",
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Juxtapose => "",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Power => "^",
            BinaryOperator::Min => "min",
            BinaryOperator::Max => "max",
        }
    }

    /// Operator named with a bracketed operand chain, `min[a][b]`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "min" => Some(BinaryOperator::Min),
            "max" => Some(BinaryOperator::Max),
            _ => None,
        }
    }

    /// Binding strength and associativity for infix use.
    ///
    /// Named operators never appear infix; they report the tightest binding.
    pub fn precedence(&self) -> (u8, Associativity) {
        use Associativity::*;
        match self {
            BinaryOperator::Less
            | BinaryOperator::Greater
            | BinaryOperator::LessEqual
            | BinaryOperator::GreaterEqual
            | BinaryOperator::Equal
            | BinaryOperator::NotEqual => (9, Left),
            BinaryOperator::Add | BinaryOperator::Subtract => (10, Left),
            // multiplication is repeated convolution, so it groups to the right
            BinaryOperator::Juxtapose | BinaryOperator::Multiply => (11, Right),
            // tighter than multiplication so constant ratios stay conventional
            BinaryOperator::Divide => (12, Left),
            BinaryOperator::Power => (13, Right),
            BinaryOperator::Min | BinaryOperator::Max => (u8::MAX, Left),
        }
    }

    pub fn is_multiplication(&self) -> bool {
        matches!(self, BinaryOperator::Multiply | BinaryOperator::Juxtapose)
    }

    pub fn is_named(&self) -> bool {
        matches!(self, BinaryOperator::Min | BinaryOperator::Max)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    Negate,
    Floor,
    Ceil,
}

impl UnaryOperator {
    /// Precedence the operand of a prefix operator is parsed at.
    pub const PREFIX_PRECEDENCE: u8 = 10;

    pub fn symbol(&self) -> &'static str {
        match self {
            UnaryOperator::Negate => "-",
            UnaryOperator::Floor => "floor",
            UnaryOperator::Ceil => "ceil",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "floor" => Some(UnaryOperator::Floor),
            "ceil" => Some(UnaryOperator::Ceil),
            _ => None,
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ExpressionKind::Literal(value) => write!(f, "{}", value),
            ExpressionKind::Die(faces) => write!(f, "d{}", faces),
            ExpressionKind::Name(name) => write!(f, "{}", name),
            ExpressionKind::Level(level) => write!(f, "lvl{}", level),
            ExpressionKind::Binary(lhs, op, rhs) if op.is_named() => {
                write!(f, "{}[{}][{}]", op.symbol(), lhs, rhs)
            }
            ExpressionKind::Binary(lhs, BinaryOperator::Juxtapose, rhs) => {
                write!(f, "({} {})", lhs, rhs)
            }
            ExpressionKind::Binary(lhs, op, rhs) => {
                write!(f, "({} {} {})", lhs, op.symbol(), rhs)
            }
            ExpressionKind::Unary(UnaryOperator::Negate, inner) => write!(f, "-{}", inner),
            ExpressionKind::Unary(op, inner) => write!(f, "{}[{}]", op.symbol(), inner),
            ExpressionKind::Call(callee, args) => {
                write!(f, "{}", callee)?;
                for arg in args {
                    write!(f, "[{}]", arg)?;
                }
                Ok(())
            }
            ExpressionKind::Function(function) => {
                write!(f, "(fn")?;
                for param in &function.params {
                    write!(f, " {}", param)?;
                }
                write!(f, " {{ {} }})", function.body)
            }
        }
    }
}

/// A named formula line, `name: expression`
#[derive(Debug, Clone)]
pub struct Formula {
    pub name: String,
    pub line: usize,
    pub expression: Expression,
}

/// A reusable definition line, `name = expression`
#[derive(Debug, Clone)]
pub struct Definition {
    pub name: String,
    pub line: usize,
    pub expression: Expression,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Flow {
    #[default]
    Column,
    Row,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct GroupAttributes {
    pub flow: Flow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ParameterKind {
    #[default]
    Number,
    Range,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParameterAttributes {
    #[serde(rename = "type")]
    pub kind: ParameterKind,
    pub min: i64,
    pub max: i64,
    pub step: i64,
}

impl Default for ParameterAttributes {
    fn default() -> Self {
        Self {
            kind: ParameterKind::Number,
            min: -20,
            max: 20,
            step: 1,
        }
    }
}

/// A user-tunable parameter, `[attrs] id ? Label = default`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterDeclaration {
    pub id: String,
    pub label: String,
    pub default: i64,
    pub attributes: ParameterAttributes,
    #[serde(skip)]
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct ParameterGroup {
    pub name: String,
    pub attributes: GroupAttributes,
    pub parameters: Vec<ParameterDeclaration>,
}

/// A parsed collection document
#[derive(Debug, Clone)]
pub struct Document {
    pub formulas: Vec<Formula>,
    pub definitions: IndexMap<String, Definition>,
    pub parameter_groups: Vec<ParameterGroup>,
}

impl Default for Document {
    fn default() -> Self {
        Self {
            formulas: Vec::new(),
            definitions: IndexMap::new(),
            // parameters declared before any group marker land here
            parameter_groups: vec![ParameterGroup::default()],
        }
    }
}

impl Document {
    pub fn parameters(&self) -> impl Iterator<Item = &ParameterDeclaration> {
        self.parameter_groups
            .iter()
            .flat_map(|group| group.parameters.iter())
    }

    /// Whether `name` is already taken by a definition or a parameter.
    pub fn is_defined(&self, name: &str) -> bool {
        self.definitions.contains_key(name) || self.parameters().any(|param| param.id == name)
    }
}
