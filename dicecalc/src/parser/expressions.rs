//! Expression parsing
//!
//! Precedence climbing over the operator table in [`BinaryOperator`].
//! Works directly on characters: the expression grammar has juxtaposition
//! and whitespace-sensitive bracket chains, which a token stream would lose.

use crate::ast::{SourceOrigin, Span};
use crate::semantic::*;
use crate::{DiceError, DiceResult, ResourceLimits};
use std::sync::Arc;

/// What follows a complete operand
enum Continuation {
    Binary(BinaryOperator, usize),
    Call,
}

pub struct ExpressionParser<'a> {
    src: &'a str,
    pos: usize,
    origin: SourceOrigin,
    depth: usize,
    max_depth: usize,
}

/// Parse a complete expression; trailing text is an error.
pub fn parse(text: &str, origin: SourceOrigin, limits: &ResourceLimits) -> DiceResult<Expression> {
    let mut parser = ExpressionParser::new(text, origin, limits.max_expression_depth);
    let expr = parser.expression(0)?;
    parser.skip_whitespace();
    match parser.peek() {
        None => Ok(expr),
        Some(')') => Err(parser.error_here("Unmatched closing parenthesis")),
        Some(']') => Err(parser.error_here("Unmatched closing square bracket")),
        Some('}') => Err(parser.error_here("Unmatched closing brace")),
        Some(c) => Err(parser.error_here(format!("Unexpected '{}'", c))),
    }
}

impl<'a> ExpressionParser<'a> {
    pub fn new(src: &'a str, origin: SourceOrigin, max_depth: usize) -> Self {
        Self {
            src,
            pos: 0,
            origin,
            depth: 0,
            max_depth,
        }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn take_while(&mut self, accept: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        while self.peek().is_some_and(&accept) {
            self.bump();
        }
        &self.src[start..self.pos]
    }

    fn span_from(&self, start: usize) -> Span {
        self.origin.span(start, self.pos)
    }

    fn error_from(&self, start: usize, message: impl Into<String>) -> DiceError {
        DiceError::syntax(message, self.span_from(start))
    }

    fn error_here(&self, message: impl Into<String>) -> DiceError {
        let end = self.pos + self.peek().map_or(0, char::len_utf8);
        DiceError::syntax(message, self.origin.span(self.pos, end))
    }

    fn node(&self, kind: ExpressionKind, start: usize) -> Expression {
        Expression::new(kind, Some(self.span_from(start)))
    }

    fn expect_close(&mut self, close: char, message: &str) -> DiceResult<()> {
        self.skip_whitespace();
        if self.eat(close) {
            Ok(())
        } else {
            Err(self.error_here(message))
        }
    }

    fn depth_exceeded(&self, actual: usize) -> DiceError {
        DiceError::ResourceLimitExceeded {
            limit_name: "max_expression_depth".to_string(),
            limit_value: self.max_depth.to_string(),
            actual_value: actual.to_string(),
            suggestion: "Split the expression into named definitions".to_string(),
        }
    }

    /// Reject trees taller than the depth limit, however they were built.
    fn checked(&self, expr: Expression) -> DiceResult<Expression> {
        if expr.height() > self.max_depth {
            return Err(self.depth_exceeded(expr.height()));
        }
        Ok(expr)
    }

    /// Parse operands and operators binding at least as tightly as `min_precedence`.
    pub fn expression(&mut self, min_precedence: u8) -> DiceResult<Expression> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(self.depth_exceeded(self.depth));
        }

        let mut lhs = self.atom()?;
        while let Some(continuation) = self.continuation() {
            match continuation {
                Continuation::Call => {
                    let call = self.call(lhs)?;
                    lhs = self.checked(call)?;
                }
                Continuation::Binary(op, width) => {
                    let (precedence, associativity) = op.precedence();
                    if precedence < min_precedence {
                        break;
                    }
                    self.pos += width;
                    let next = match associativity {
                        Associativity::Left => precedence + 1,
                        Associativity::Right => precedence,
                    };
                    let rhs = self.expression(next)?;
                    lhs = self.checked(binary(lhs, op, rhs))?;
                }
            }
        }

        self.depth -= 1;
        self.checked(lhs)
    }

    /// Look past whitespace for an infix operator, a juxtaposed operand or a call.
    fn continuation(&mut self) -> Option<Continuation> {
        self.skip_whitespace();
        let c = self.peek()?;
        if c.is_ascii_alphanumeric() || c == '_' || c == '(' {
            return Some(Continuation::Binary(BinaryOperator::Juxtapose, 0));
        }
        if c == '[' {
            return Some(Continuation::Call);
        }
        let rest = &self.src[self.pos..];
        BinaryOperator::INFIX
            .iter()
            .filter(|op| !op.symbol().is_empty())
            .find(|op| rest.starts_with(op.symbol()))
            .map(|op| Continuation::Binary(*op, op.symbol().len()))
    }

    fn atom(&mut self) -> DiceResult<Expression> {
        self.skip_whitespace();
        let start = self.pos;
        match self.peek() {
            None => Err(self.error_here("Unexpected end of expression")),
            Some('(') => {
                self.bump();
                let inner = self.expression(0)?;
                self.expect_close(')', "Unclosed parenthesis")?;
                Ok(inner)
            }
            Some('-') => {
                self.bump();
                let operand = self.expression(UnaryOperator::PREFIX_PRECEDENCE + 1)?;
                Ok(self.node(
                    ExpressionKind::Unary(UnaryOperator::Negate, Box::new(operand)),
                    start,
                ))
            }
            Some(c) if c.is_ascii_digit() || c == '.' => self.number(),
            Some(c) if c.is_ascii_alphabetic() || c == '_' => self.word(),
            Some(c) => Err(self.error_here(format!("Unexpected character '{}'", c))),
        }
    }

    fn number(&mut self) -> DiceResult<Expression> {
        let start = self.pos;
        self.take_while(|c| c.is_ascii_digit());
        self.eat('.');
        self.take_while(|c| c.is_ascii_digit());
        let literal = &self.src[start..self.pos];
        match literal.parse::<f64>() {
            Ok(value) => Ok(self.node(ExpressionKind::Literal(value), start)),
            Err(_) => Err(self.error_from(start, format!("Invalid numeric literal '{}'", literal))),
        }
    }

    fn word(&mut self) -> DiceResult<Expression> {
        let start = self.pos;
        let word = self.take_while(|c| c.is_ascii_alphanumeric() || c == '_');
        let keyword = word.to_ascii_lowercase();

        if let Some(faces) = numbered(&keyword, "d") {
            let faces = faces.map_err(|_| self.error_from(start, "Die has too many faces"))?;
            return Ok(self.node(ExpressionKind::Die(faces), start));
        }
        if let Some(threshold) = numbered(&keyword, "lvl") {
            let threshold =
                threshold.map_err(|_| self.error_from(start, "Level threshold is too large"))?;
            return self.level(threshold, start);
        }
        if let Some(op) = BinaryOperator::from_name(&keyword) {
            return self.named_binary(op, start);
        }
        if let Some(op) = UnaryOperator::from_name(&keyword) {
            return self.named_unary(op, start);
        }
        if keyword == "fn" {
            return self.function(start);
        }
        Ok(self.node(ExpressionKind::Name(Arc::from(word)), start))
    }

    fn bracketed(&mut self) -> DiceResult<Expression> {
        self.bump();
        let inner = self.expression(0)?;
        self.expect_close(']', "Unclosed square bracket")?;
        Ok(inner)
    }

    /// `lvlN` or `lvlN[expr]`, the latter meaning `expr + lvlN`.
    fn level(&mut self, threshold: u32, start: usize) -> DiceResult<Expression> {
        let level = self.node(ExpressionKind::Level(threshold), start);
        let end = self.pos;
        self.skip_whitespace();
        if self.peek() != Some('[') {
            self.pos = end;
            return Ok(level);
        }
        let base = self.bracketed()?;
        Ok(self.node(
            ExpressionKind::Binary(Box::new(base), BinaryOperator::Add, Box::new(level)),
            start,
        ))
    }

    /// `min[a][b][c]` folds left: `min[min[a][b]][c]`.
    fn named_binary(&mut self, op: BinaryOperator, start: usize) -> DiceResult<Expression> {
        let mut folded: Option<Expression> = None;
        while self.peek() == Some('[') {
            let operand = self.bracketed()?;
            folded = Some(match folded {
                None => operand,
                Some(lhs) => self.checked(self.node(
                    ExpressionKind::Binary(Box::new(lhs), op, Box::new(operand)),
                    start,
                ))?,
            });
        }
        folded.ok_or_else(|| {
            self.error_from(start, format!("Operator {} expects arguments", op.symbol()))
        })
    }

    fn named_unary(&mut self, op: UnaryOperator, start: usize) -> DiceResult<Expression> {
        if self.peek() != Some('[') {
            return Err(self.error_from(
                start,
                format!("Operator {} expects one argument", op.symbol()),
            ));
        }
        let operand = self.bracketed()?;
        if self.peek() == Some('[') {
            return Err(self.error_here(format!(
                "Operator {} takes exactly one argument",
                op.symbol()
            )));
        }
        Ok(self.node(ExpressionKind::Unary(op, Box::new(operand)), start))
    }

    /// `fn p1 p2 { body }`
    fn function(&mut self, start: usize) -> DiceResult<Expression> {
        let mut params: Vec<Arc<str>> = Vec::new();
        loop {
            self.skip_whitespace();
            match self.peek() {
                Some('{') => {
                    self.bump();
                    break;
                }
                Some(c) if c.is_ascii_alphabetic() || c == '_' => {
                    let param = self.take_while(|c| c.is_ascii_alphanumeric() || c == '_');
                    params.push(Arc::from(param));
                }
                Some(_) => return Err(self.error_here("Expected function parameters")),
                None => return Err(self.error_here("Unexpected end of expression")),
            }
        }
        let body = self.expression(0)?;
        self.expect_close('}', "Function body does not close")?;
        Ok(self.node(
            ExpressionKind::Function(Arc::new(Function::new(params, body))),
            start,
        ))
    }

    /// `f[a][b]`: one call with every immediately chained bracket as an argument.
    fn call(&mut self, callee: Expression) -> DiceResult<Expression> {
        let mut args = Vec::new();
        while self.peek() == Some('[') {
            args.push(self.bracketed()?);
        }
        let span = join(callee.span, Some(self.origin.span(self.pos, self.pos)));
        Ok(Expression::new(
            ExpressionKind::Call(Box::new(callee), args),
            span,
        ))
    }
}

/// `prefix` followed by a number without a leading zero, e.g. `d20`, `lvl3`.
fn numbered(word: &str, prefix: &str) -> Option<Result<u32, std::num::ParseIntError>> {
    let digits = word.strip_prefix(prefix)?;
    let valid = digits.chars().all(|c| c.is_ascii_digit())
        && digits.chars().next().is_some_and(|c| c != '0');
    valid.then(|| digits.parse::<u32>())
}

fn binary(lhs: Expression, op: BinaryOperator, rhs: Expression) -> Expression {
    let span = join(lhs.span, rhs.span);
    Expression::new(ExpressionKind::Binary(Box::new(lhs), op, Box::new(rhs)), span)
}

fn join(first: Option<Span>, last: Option<Span>) -> Option<Span> {
    match (first, last) {
        (Some(first), Some(last)) => Some(first.to(last)),
        (first, last) => first.or(last),
    }
}
