use ariadne::{Color, Label, Report, ReportKind, Source};
use dicecalc::{DiceError, Diagnostic};

fn error_kind(error: &DiceError) -> &'static str {
    match error {
        DiceError::Syntax(_) => "Syntax error",
        DiceError::Document(_) => "Document error",
        DiceError::Eval(_) => "Evaluation error",
        DiceError::CircularDependency(_) => "Circular dependency",
        DiceError::ResourceLimitExceeded { .. } => "Resource limit exceeded",
    }
}

/// Format an error that has no document to point into
pub fn format_error(error: &DiceError) -> String {
    match error {
        DiceError::ResourceLimitExceeded {
            limit_name,
            limit_value,
            actual_value,
            suggestion,
        } => {
            format!(
                "Resource limit exceeded: {}\n  Limit: {}\n  Actual: {}\n  {}",
                limit_name, limit_value, actual_value, suggestion
            )
        }
        _ => error.to_string(),
    }
}

/// Format a diagnostic with fancy terminal output using Ariadne, pointing at
/// its span inside `source`
pub fn format_diagnostic(diagnostic: &Diagnostic, source_id: &str, source: &str) -> String {
    let error = &diagnostic.error;
    let span = match error.span() {
        Some(span) if span.end <= source.len() => span,
        _ => {
            return format!("{}: {}", diagnostic.label, format_error(error));
        }
    };

    let message = format!(
        "{}: {}: {} (line {})",
        diagnostic.label,
        error_kind(error),
        error.message(),
        span.line
    );

    let mut report = Report::build(ReportKind::Error, source_id, span.start)
        .with_message(message)
        .with_label(
            Label::new((source_id, span.start..span.end))
                .with_message("")
                .with_color(Color::Red),
        );

    if let DiceError::Syntax(details) | DiceError::Document(details) | DiceError::Eval(details) =
        error
    {
        if let Some(suggestion) = &details.suggestion {
            report = report.with_help(suggestion);
        }
    }

    let mut output = Vec::new();
    match report
        .finish()
        .write((source_id, Source::from(source)), &mut output)
    {
        Ok(_) => String::from_utf8_lossy(&output).to_string(),
        Err(_) => diagnostic.to_string(),
    }
}
