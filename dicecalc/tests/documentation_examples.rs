//! Tests for the bundled collections
//!
//! Ensures every shipped demo document analyzes without errors and that its
//! headline spells keep producing the expected averages.

use dicecalc::bundled::{self, BUNDLES};
use dicecalc::{CollectionAnalysis, Engine};
use std::collections::HashMap;

fn analyze_bundle(name: &str, overrides: &[(&str, i64)]) -> CollectionAnalysis {
    let bundle = bundled::find(name).unwrap_or_else(|| panic!("no bundle named {}", name));
    let overrides: HashMap<String, i64> = overrides
        .iter()
        .map(|(id, value)| (id.to_string(), *value))
        .collect();
    let analysis = Engine::new().analyze(bundle.source, &overrides);
    assert!(
        analysis.errors.is_empty(),
        "{} has errors: {:?}",
        name,
        analysis.errors
    );
    analysis
}

fn mean(analysis: &CollectionAnalysis, formula: &str) -> f64 {
    analysis
        .result(formula)
        .and_then(|result| result.mean)
        .unwrap_or_else(|| panic!("missing result {}", formula))
}

#[test]
fn test_bundle_files_match_their_sources() {
    for bundle in BUNDLES {
        let path = match bundle.name {
            "Example" => "../demos/example.dice",
            "D&D 5e Wizard" => "../demos/wizard.dice",
            other => panic!("unexpected bundle {}", other),
        };
        let content = std::fs::read_to_string(path)
            .unwrap_or_else(|e| panic!("Failed to read {}: {}", path, e));
        assert_eq!(content, bundle.source);
    }
}

#[test]
fn test_example_bundle() {
    let analysis = analyze_bundle("Example", &[]);
    assert_eq!(analysis.results.len(), 7);
    assert_eq!(mean(&analysis, "Magic Missile"), 10.5);
    assert_eq!(mean(&analysis, "Cloud of Daggers"), 10.0);

    let groups: Vec<&str> = analysis
        .parameter_groups
        .iter()
        .map(|group| group.name.as_str())
        .collect();
    assert_eq!(groups, vec!["", "", "Your attributes", "Enemy attributes"]);
}

#[test]
fn test_example_bundle_upcast() {
    let base = analyze_bundle("Example", &[]);
    let upcast = analyze_bundle("Example", &[("level", 5)]);
    for formula in ["Magic Missile", "Cloud of Daggers", "Fireball", "Scorching Ray"] {
        assert!(
            mean(&upcast, formula) > mean(&base, formula),
            "{} should grow with slot level",
            formula
        );
    }
    assert_eq!(mean(&upcast, "Magic Missile"), 24.5);
}

#[test]
fn test_example_bundle_area_targets() {
    let single = analyze_bundle("Example", &[]);
    let triple = analyze_bundle("Example", &[("area", 3)]);
    let ratio = mean(&triple, "Fireball") / mean(&single, "Fireball");
    assert!((ratio - 3.0).abs() < 1e-9);
    assert_eq!(mean(&triple, "Catapult"), mean(&single, "Catapult"));
}

#[test]
fn test_wizard_bundle() {
    let analysis = analyze_bundle("D&D 5e Wizard", &[]);
    assert!(analysis.results.len() > 30);
    assert!(analysis.result("Jim's Magic Missile").is_some());
    assert_eq!(mean(&analysis, "Magic Missile"), 10.5);
    assert_eq!(
        mean(&analysis, "Fireball"),
        mean(&analysis, "Lightning Bolt")
    );

    let means: Vec<f64> = analysis.results.iter().filter_map(|r| r.mean).collect();
    assert!(means.windows(2).all(|pair| pair[0] >= pair[1]));
}

#[test]
fn test_wizard_bundle_harder_target() {
    let easy = analyze_bundle("D&D 5e Wizard", &[("ac", 10)]);
    let hard = analyze_bundle("D&D 5e Wizard", &[("ac", 25)]);
    assert!(mean(&hard, "Chromatic Orb") < mean(&easy, "Chromatic Orb"));
    assert_eq!(mean(&hard, "Magic Missile"), mean(&easy, "Magic Missile"));
}
