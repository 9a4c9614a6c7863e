//! Display attributes of parameter groups and parameter declarations
//!
//! Attributes are written as bracketed `[key=value]` pairs in front of the
//! directive. Unknown keys are rejected; omitted keys take their defaults.

use crate::ast::{SourceOrigin, Span};
use crate::parser::Rule;
use crate::semantic::{Flow, GroupAttributes, ParameterAttributes, ParameterKind};
use crate::{DiceError, DiceResult};
use pest::iterators::Pair;

/// One `[key=value]` pair as written
#[derive(Debug, Clone)]
pub struct RawAttribute {
    pub key: String,
    pub value: Option<String>,
    pub span: Span,
}

pub fn parse_raw_attribute(pair: Pair<Rule>, origin: SourceOrigin) -> RawAttribute {
    let span = Span::from_pest_span(pair.as_span(), origin);
    let mut key = String::new();
    let mut value = None;
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::attribute_key => key = inner.as_str().to_string(),
            Rule::attribute_value => value = Some(inner.as_str().to_string()),
            _ => {}
        }
    }
    RawAttribute { key, value, span }
}

pub fn group_attributes(raw: &[RawAttribute]) -> DiceResult<GroupAttributes> {
    let mut attributes = GroupAttributes::default();
    for attribute in raw {
        match attribute.key.as_str() {
            "flow" => {
                attributes.flow = enumerated(
                    attribute,
                    &[("column", Flow::Column), ("row", Flow::Row)],
                )?
            }
            _ => return Err(unknown(attribute)),
        }
    }
    Ok(attributes)
}

pub fn parameter_attributes(raw: &[RawAttribute]) -> DiceResult<ParameterAttributes> {
    let mut attributes = ParameterAttributes::default();
    for attribute in raw {
        match attribute.key.as_str() {
            "type" => {
                attributes.kind = enumerated(
                    attribute,
                    &[("number", ParameterKind::Number), ("range", ParameterKind::Range)],
                )?
            }
            "min" => attributes.min = integer(attribute)?,
            "max" => attributes.max = integer(attribute)?,
            "step" => attributes.step = integer(attribute)?,
            _ => return Err(unknown(attribute)),
        }
    }
    if attributes.min > attributes.max {
        return Err(DiceError::document(
            format!(
                "Invalid attributes: min {} is greater than max {}",
                attributes.min, attributes.max
            ),
            raw.first().map(|attribute| attribute.span),
        ));
    }
    Ok(attributes)
}

fn unknown(attribute: &RawAttribute) -> DiceError {
    DiceError::document(
        format!("Unknown attribute \"{}\"", attribute.key),
        Some(attribute.span),
    )
}

fn enumerated<T: Copy>(attribute: &RawAttribute, choices: &[(&str, T)]) -> DiceResult<T> {
    let raw = attribute.value.as_deref().unwrap_or("");
    choices
        .iter()
        .find(|(name, _)| *name == raw)
        .map(|(_, value)| *value)
        .ok_or_else(|| {
            let names: Vec<&str> = choices.iter().map(|(name, _)| *name).collect();
            DiceError::document_with_suggestion(
                format!("Invalid attribute {} \"{}\"", attribute.key, raw),
                Some(attribute.span),
                format!("expected one of {}", names.join(", ")),
            )
        })
}

fn integer(attribute: &RawAttribute) -> DiceResult<i64> {
    let raw = attribute.value.as_deref().unwrap_or("");
    raw.parse::<i64>().map_err(|_| {
        DiceError::document_with_suggestion(
            format!("Invalid attribute {} \"{}\"", attribute.key, raw),
            Some(attribute.span),
            "expected an integer",
        )
    })
}
