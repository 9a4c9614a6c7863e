use crate::ast::Span;
use std::fmt;

/// Detailed error information with an optional source location
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorDetails {
    pub message: String,
    pub span: Option<Span>,
    pub suggestion: Option<String>,
}

/// Error types for the dice engine
#[derive(Debug, Clone, PartialEq)]
pub enum DiceError {
    /// Malformed expression text
    Syntax(Box<ErrorDetails>),

    /// Malformed directive line, duplicate name or invalid attribute
    Document(Box<ErrorDetails>),

    /// Circular dependency among named definitions, listed in reference order
    /// with the first name repeated at the end
    CircularDependency(Vec<String>),

    /// Runtime error during evaluation
    Eval(Box<ErrorDetails>),

    ResourceLimitExceeded {
        limit_name: String,
        limit_value: String,
        actual_value: String,
        suggestion: String,
    },
}

impl DiceError {
    fn details(message: impl Into<String>, span: Option<Span>) -> Box<ErrorDetails> {
        Box::new(ErrorDetails {
            message: message.into(),
            span,
            suggestion: None,
        })
    }

    pub fn syntax(message: impl Into<String>, span: Span) -> Self {
        Self::Syntax(Self::details(message, Some(span)))
    }

    pub fn document(message: impl Into<String>, span: Option<Span>) -> Self {
        Self::Document(Self::details(message, span))
    }

    /// Create a document error with a suggestion
    pub fn document_with_suggestion(
        message: impl Into<String>,
        span: Option<Span>,
        suggestion: impl Into<String>,
    ) -> Self {
        Self::Document(Box::new(ErrorDetails {
            message: message.into(),
            span,
            suggestion: Some(suggestion.into()),
        }))
    }

    pub fn eval(message: impl Into<String>, span: Option<Span>) -> Self {
        Self::Eval(Self::details(message, span))
    }

    /// Source location of the error, when it has one
    pub fn span(&self) -> Option<Span> {
        match self {
            DiceError::Syntax(details) | DiceError::Document(details) | DiceError::Eval(details) => {
                details.span
            }
            DiceError::CircularDependency(_) | DiceError::ResourceLimitExceeded { .. } => None,
        }
    }

    /// The bare message, without kind prefix or location
    pub fn message(&self) -> String {
        match self {
            DiceError::Syntax(details) | DiceError::Document(details) | DiceError::Eval(details) => {
                details.message.clone()
            }
            DiceError::CircularDependency(cycle) => cycle.join(" -> "),
            DiceError::ResourceLimitExceeded {
                limit_name,
                limit_value,
                actual_value,
                ..
            } => format!("{} is {} (limit {})", limit_name, actual_value, limit_value),
        }
    }
}

fn write_located(f: &mut fmt::Formatter<'_>, kind: &str, details: &ErrorDetails) -> fmt::Result {
    write!(f, "{}: {}", kind, details.message)?;
    if let Some(suggestion) = &details.suggestion {
        write!(f, " (suggestion: {})", suggestion)?;
    }
    if let Some(span) = &details.span {
        write!(f, " at {}:{}", span.line, span.col)?;
    }
    Ok(())
}

impl fmt::Display for DiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiceError::Syntax(details) => write_located(f, "Syntax error", details),
            DiceError::Document(details) => write_located(f, "Document error", details),
            DiceError::Eval(details) => write_located(f, "Evaluation error", details),
            DiceError::CircularDependency(cycle) => {
                write!(f, "Circular dependency: {}", cycle.join(" -> "))
            }
            DiceError::ResourceLimitExceeded {
                limit_name,
                limit_value,
                actual_value,
                suggestion,
            } => write!(
                f,
                "Resource limit exceeded: {} (limit: {}, actual: {}). {}",
                limit_name, limit_value, actual_value, suggestion
            ),
        }
    }
}

impl std::error::Error for DiceError {}
