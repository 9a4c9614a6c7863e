use crate::ast::{SourceOrigin, Span};
use crate::error::DiceError;
use crate::resource_limits::ResourceLimits;
use crate::response::Diagnostic;
use crate::semantic::*;
use crate::DiceResult;
use attributes::RawAttribute;
use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;
use tracing::debug;

pub mod attributes;
pub mod expressions;

#[derive(Parser)]
#[grammar = "src/parser/document.pest"]
pub struct DocumentParser;

/// A document together with the diagnostics of the lines that were skipped
#[derive(Debug, Clone, Default)]
pub struct ParsedDocument {
    pub document: Document,
    pub diagnostics: Vec<Diagnostic>,
}

/// Parse a standalone expression, e.g. `3d6 + 2`.
pub fn parse_expression(text: &str) -> DiceResult<Expression> {
    expressions::parse(text, SourceOrigin::detached(), &ResourceLimits::default())
}

/// Parse a collection document line by line.
///
/// A malformed line is reported and skipped; only a document over the size
/// limit fails as a whole.
pub fn parse_document(content: &str, limits: &ResourceLimits) -> DiceResult<ParsedDocument> {
    if content.len() > limits.max_document_bytes {
        return Err(DiceError::ResourceLimitExceeded {
            limit_name: "max_document_bytes".to_string(),
            limit_value: format!(
                "{} bytes ({} MB)",
                limits.max_document_bytes,
                limits.max_document_bytes / (1024 * 1024)
            ),
            actual_value: format!(
                "{} bytes ({:.2} MB)",
                content.len(),
                content.len() as f64 / (1024.0 * 1024.0)
            ),
            suggestion: "Split the collection into smaller documents".to_string(),
        });
    }

    let mut parsed = ParsedDocument::default();
    let mut offset = 0;
    for (index, raw_line) in content.split('\n').enumerate() {
        let line_number = index + 1;
        let origin = SourceOrigin::new(offset, line_number, 1);
        offset += raw_line.len() + 1;

        let line = match raw_line.find('#') {
            Some(comment) => &raw_line[..comment],
            None => raw_line,
        };
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }

        if let Err(diagnostic) = parse_line(line, origin, line_number, &mut parsed.document, limits)
        {
            parsed.diagnostics.push(diagnostic);
        }
    }

    debug!(
        formulas = parsed.document.formulas.len(),
        definitions = parsed.document.definitions.len(),
        parameters = parsed.document.parameters().count(),
        errors = parsed.diagnostics.len(),
        "document parsed"
    );
    Ok(parsed)
}

fn parse_line(
    line: &str,
    origin: SourceOrigin,
    line_number: usize,
    document: &mut Document,
    limits: &ResourceLimits,
) -> Result<(), Diagnostic> {
    let mut pairs = DocumentParser::parse(Rule::line, line).map_err(|e| {
        let position = match e.location {
            pest::error::InputLocation::Pos(pos) => pos,
            pest::error::InputLocation::Span((start, _)) => start,
        };
        Diagnostic::line(
            line_number,
            DiceError::document("Invalid syntax", Some(origin.span(position, line.len()))),
        )
    })?;

    let directive = pairs
        .next()
        .and_then(|line_pair| line_pair.into_inner().next())
        .ok_or_else(|| {
            Diagnostic::line(
                line_number,
                DiceError::document("Invalid syntax", Some(origin.span(0, line.len()))),
            )
        })?;

    match directive.as_rule() {
        Rule::formula => parse_formula(directive, origin, line_number, document, limits),
        Rule::definition => parse_definition(directive, origin, line_number, document, limits),
        Rule::group => parse_group(directive, origin, line_number, document),
        Rule::parameter => parse_parameter(directive, origin, line_number, document),
        _ => Err(Diagnostic::line(
            line_number,
            DiceError::document("Invalid syntax", Some(origin.span(0, line.len()))),
        )),
    }
}

fn span_of(pair: &Pair<Rule>, origin: SourceOrigin) -> Span {
    Span::from_pest_span(pair.as_span(), origin)
}

fn parse_text(
    pair: &Pair<Rule>,
    origin: SourceOrigin,
    limits: &ResourceLimits,
) -> DiceResult<Expression> {
    expressions::parse(pair.as_str(), origin.advance(pair.as_span().start()), limits)
}

fn parse_formula(
    pair: Pair<Rule>,
    origin: SourceOrigin,
    line_number: usize,
    document: &mut Document,
    limits: &ResourceLimits,
) -> Result<(), Diagnostic> {
    let mut name = "";
    let mut name_span = origin.span(0, 0);
    let mut expression = None;
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::formula_name => {
                name = inner.as_str().trim();
                name_span = span_of(&inner, origin);
            }
            Rule::expression_text => {
                expression = Some(parse_text(&inner, origin, limits));
            }
            _ => {}
        }
    }

    if name.is_empty() {
        return Err(Diagnostic::line(
            line_number,
            DiceError::document("Formula name cannot be empty", Some(name_span)),
        ));
    }
    let expression = expression
        .unwrap_or_else(|| Err(DiceError::syntax("Unexpected end of expression", name_span)))
        .map_err(|error| Diagnostic::named(name, error))?;

    document.formulas.push(Formula {
        name: name.to_string(),
        line: line_number,
        expression,
    });
    Ok(())
}

fn parse_definition(
    pair: Pair<Rule>,
    origin: SourceOrigin,
    line_number: usize,
    document: &mut Document,
    limits: &ResourceLimits,
) -> Result<(), Diagnostic> {
    let mut inner = pair.into_inner();
    let (Some(name_pair), Some(text)) = (inner.next(), inner.next()) else {
        return Err(Diagnostic::line(
            line_number,
            DiceError::document("Invalid definition", Some(origin.span(0, 0))),
        ));
    };
    let name = name_pair.as_str();

    if document.is_defined(name) {
        return Err(Diagnostic::named(
            name,
            DiceError::document_with_suggestion(
                format!("Duplicate definition of '{}'", name),
                Some(span_of(&name_pair, origin)),
                "Rename one of the definitions",
            ),
        ));
    }

    let expression =
        parse_text(&text, origin, limits).map_err(|error| Diagnostic::named(name, error))?;
    document.definitions.insert(
        name.to_string(),
        Definition {
            name: name.to_string(),
            line: line_number,
            expression,
        },
    );
    Ok(())
}

fn parse_group(
    pair: Pair<Rule>,
    origin: SourceOrigin,
    line_number: usize,
    document: &mut Document,
) -> Result<(), Diagnostic> {
    let mut raw: Vec<RawAttribute> = Vec::new();
    let mut name = "";
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::attribute => raw.push(attributes::parse_raw_attribute(inner, origin)),
            Rule::rest_of_line => name = inner.as_str().trim(),
            _ => {}
        }
    }

    let attributes = attributes::group_attributes(&raw).map_err(|error| {
        if name.is_empty() {
            Diagnostic::line(line_number, error)
        } else {
            Diagnostic::named(name, error)
        }
    })?;
    document.parameter_groups.push(ParameterGroup {
        name: name.to_string(),
        attributes,
        parameters: Vec::new(),
    });
    Ok(())
}

fn parse_parameter(
    pair: Pair<Rule>,
    origin: SourceOrigin,
    line_number: usize,
    document: &mut Document,
) -> Result<(), Diagnostic> {
    let mut raw: Vec<RawAttribute> = Vec::new();
    let mut id = "";
    let mut id_span = origin.span(0, 0);
    let mut label = "";
    let mut default = "";
    let mut default_span = origin.span(0, 0);
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::attribute => raw.push(attributes::parse_raw_attribute(inner, origin)),
            Rule::identifier => {
                id = inner.as_str();
                id_span = span_of(&inner, origin);
            }
            Rule::parameter_label => label = inner.as_str().trim(),
            Rule::parameter_default => {
                default = inner.as_str().trim();
                default_span = span_of(&inner, origin);
            }
            _ => {}
        }
    }

    let fail = |error: DiceError| Diagnostic::named(id, error);

    let attributes = attributes::parameter_attributes(&raw).map_err(fail)?;
    if label.is_empty() {
        return Err(fail(DiceError::document(
            "Parameter label cannot be empty",
            Some(id_span),
        )));
    }
    if default.is_empty() {
        return Err(fail(DiceError::document(
            format!("Supply a default for parameter {}", id),
            Some(id_span),
        )));
    }
    let default = default.parse::<i64>().map_err(|_| {
        fail(DiceError::document(
            format!(
                "Default for parameter {} must be an integer, found '{}'",
                id, default
            ),
            Some(default_span),
        ))
    })?;
    if document.is_defined(id) {
        return Err(fail(DiceError::document_with_suggestion(
            format!("Duplicate definition of '{}'", id),
            Some(id_span),
            "Rename the parameter or the definition",
        )));
    }

    let declaration = ParameterDeclaration {
        id: id.to_string(),
        label: label.to_string(),
        default,
        attributes,
        line: line_number,
    };
    match document.parameter_groups.last_mut() {
        Some(group) => group.parameters.push(declaration),
        None => document.parameter_groups.push(ParameterGroup {
            parameters: vec![declaration],
            ..ParameterGroup::default()
        }),
    }
    Ok(())
}
