use comfy_table::{presets::UTF8_FULL, Cell, CellAlignment, Row, Table};
use dicecalc::bundled::Bundle;
use dicecalc::{parse_document, CollectionAnalysis, Document, FormulaResult, ResourceLimits};

/// Outcomes rarer than this share of the most likely outcome are left out of histograms
const HISTOGRAM_CUTOFF: f64 = 0.01;
const HISTOGRAM_WIDTH: f64 = 40.0;

pub struct Formatter {}

impl Default for Formatter {
    fn default() -> Self {
        Self::new()
    }
}

impl Formatter {
    pub fn new() -> Self {
        Self {}
    }

    pub fn format_analysis(&self, analysis: &CollectionAnalysis, histogram: bool) -> String {
        if analysis.results.is_empty() {
            return "No formulas to show\n".to_string();
        }

        let mut output = self.format_results_table(&analysis.results);
        output.push('\n');

        if histogram {
            for result in &analysis.results {
                output.push('\n');
                output.push_str(&self.format_histogram(result));
            }
        }

        output
    }

    fn format_results_table(&self, results: &[FormulaResult]) -> String {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(Row::from(vec![
            Cell::new("Formula").set_alignment(CellAlignment::Left),
            Cell::new("Mean").set_alignment(CellAlignment::Right),
            Cell::new("Std dev").set_alignment(CellAlignment::Right),
            Cell::new("Min").set_alignment(CellAlignment::Right),
            Cell::new("Max").set_alignment(CellAlignment::Right),
        ]));

        for result in results {
            table.add_row(Row::from(vec![
                Cell::new(&result.name),
                Cell::new(format_optional(result.mean)).set_alignment(CellAlignment::Right),
                Cell::new(format_optional(result.stddev)).set_alignment(CellAlignment::Right),
                Cell::new(format_optional(result.min)).set_alignment(CellAlignment::Right),
                Cell::new(format_optional(result.max)).set_alignment(CellAlignment::Right),
            ]));
        }

        table.to_string()
    }

    /// One bar per likely outcome, scaled to the most likely one
    pub fn format_histogram(&self, result: &FormulaResult) -> String {
        let distribution = &result.distribution;
        let (Some(low), Some(high)) = (
            distribution.min_reasonable(HISTOGRAM_CUTOFF),
            distribution.max_reasonable(HISTOGRAM_CUTOFF),
        ) else {
            return format!("{}: no outcomes\n", result.name);
        };

        let shown: Vec<(f64, f64)> = result
            .probabilities
            .iter()
            .copied()
            .filter(|(outcome, _)| *outcome >= low && *outcome <= high)
            .collect();
        let peak = shown.iter().map(|(_, p)| *p).fold(0.0, f64::max);
        let label_width = shown
            .iter()
            .map(|(outcome, _)| format_number(*outcome).len())
            .max()
            .unwrap_or(1);

        let mut output = format!("{}\n", result.name);
        for (outcome, probability) in shown {
            let bar = if peak > 0.0 {
                (probability / peak * HISTOGRAM_WIDTH).round() as usize
            } else {
                0
            };
            output.push_str(&format!(
                "{:>width$} │ {:>6.2}% {}\n",
                format_number(outcome),
                probability * 100.0,
                "█".repeat(bar),
                width = label_width
            ));
        }
        output
    }

    pub fn format_document(&self, document: &Document) -> String {
        let mut output = String::new();

        let parameter_count = document.parameters().count();
        output.push_str(&format!("parameters ({}):\n", parameter_count));
        if parameter_count > 0 {
            let mut table = Table::new();
            table.load_preset(UTF8_FULL);
            table.set_header(Row::from(vec!["Group", "Id", "Label", "Default", "Range"]));
            for group in &document.parameter_groups {
                for parameter in &group.parameters {
                    let attributes = &parameter.attributes;
                    table.add_row(Row::from(vec![
                        group.name.clone(),
                        parameter.id.clone(),
                        parameter.label.clone(),
                        parameter.default.to_string(),
                        format!("{}..={} step {}", attributes.min, attributes.max, attributes.step),
                    ]));
                }
            }
            output.push_str(&table.to_string());
            output.push('\n');
        }

        output.push_str(&format!("\ndefinitions ({}):\n", document.definitions.len()));
        for definition in document.definitions.values() {
            output.push_str(&format!(
                "  - {} = {}\n",
                definition.name, definition.expression
            ));
        }

        output.push_str(&format!("\nformulas ({}):\n", document.formulas.len()));
        for formula in &document.formulas {
            output.push_str(&format!("  - {}: {}\n", formula.name, formula.expression));
        }
        output
    }

    pub fn format_bundles(&self, bundles: &[Bundle]) -> String {
        let mut output = String::new();
        output.push_str(&format!("{} bundled collections\n\n", bundles.len()));
        for bundle in bundles {
            match parse_document(bundle.source, &ResourceLimits::default()) {
                Ok(parsed) => output.push_str(&format!(
                    "{}: {} parameters, {} formulas\n",
                    bundle.name,
                    parsed.document.parameters().count(),
                    parsed.document.formulas.len()
                )),
                Err(_) => output.push_str(&format!("{}\n", bundle.name)),
            }
        }
        output
    }
}

fn format_optional(value: Option<f64>) -> String {
    value.map(format_number).unwrap_or_else(|| "-".to_string())
}

/// At most two decimals, without trailing zeros
fn format_number(value: f64) -> String {
    let rounded = format!("{:.2}", value);
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    if trimmed == "-0" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dicecalc::Engine;
    use std::collections::HashMap;

    fn analyze(source: &str) -> CollectionAnalysis {
        Engine::new().analyze(source, &HashMap::new())
    }

    #[test]
    fn test_number_formatting() {
        assert_eq!(format_number(10.0), "10");
        assert_eq!(format_number(10.5), "10.5");
        assert_eq!(format_number(13.825), "13.83");
        assert_eq!(format_number(-0.001), "0");
        assert_eq!(format_number(-3.0), "-3");
        assert_eq!(format_optional(None), "-");
    }

    #[test]
    fn test_results_table() {
        let formatter = Formatter::new();
        let output = formatter.format_analysis(&analyze("Greatsword: 2d6 + 3\nDagger: d4"), false);

        assert!(output.contains("Formula"));
        assert!(output.contains("Greatsword"));
        assert!(output.contains("10"));
        assert!(output.contains("15"));
        assert!(!output.contains('█'));

        let greatsword = output.find("Greatsword").unwrap();
        let dagger = output.find("Dagger").unwrap();
        assert!(greatsword < dagger, "results keep their analysis order");
    }

    #[test]
    fn test_histogram() {
        let formatter = Formatter::new();
        let analysis = analyze("Coin: d2");
        let output = formatter.format_histogram(&analysis.results[0]);

        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines[0], "Coin");
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("1 │  50.00% "));
        assert_eq!(lines[1].matches('█').count(), 40);
    }

    #[test]
    fn test_histogram_skips_unlikely_tails() {
        let formatter = Formatter::new();
        let analysis = analyze("Fireball: 8d6");
        let output = formatter.format_histogram(&analysis.results[0]);

        // 8 and 48 each have a single way out of 1_679_616
        assert!(!output.contains("\n 8 │"));
        assert!(!output.contains("\n48 │"));
        assert!(output.contains("28 │"));
    }

    #[test]
    fn test_empty_analysis() {
        let formatter = Formatter::new();
        assert_eq!(
            formatter.format_analysis(&analyze("# nothing here"), true),
            "No formulas to show\n"
        );
    }

    #[test]
    fn test_document_structure() {
        let parsed = parse_document(
            "[min=1][max=9] level ? Slot level = 3\nbonus = 2\nBolt: lvl1[2]d6 + bonus",
            &ResourceLimits::default(),
        )
        .unwrap();
        let output = Formatter::new().format_document(&parsed.document);

        assert!(output.contains("parameters (1):"));
        assert!(output.contains("Slot level"));
        assert!(output.contains("1..=9 step 1"));
        assert!(output.contains("definitions (1):\n  - bonus = 2\n"));
        assert!(output.contains("formulas (1):\n  - Bolt: "));
    }

    #[test]
    fn test_bundle_listing() {
        let output = Formatter::new().format_bundles(dicecalc::bundled::BUNDLES);
        assert!(output.starts_with("2 bundled collections"));
        assert!(output.contains("Example: "));
        assert!(output.contains("D&D 5e Wizard: "));
    }
}
