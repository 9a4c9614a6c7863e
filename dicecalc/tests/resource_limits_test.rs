use dicecalc::{DiceError, Engine, ResourceLimits};
use std::collections::HashMap;

fn limit_name(error: &DiceError) -> Option<&str> {
    match error {
        DiceError::ResourceLimitExceeded { limit_name, .. } => Some(limit_name),
        _ => None,
    }
}

#[test]
fn test_document_size_limit() {
    let limits = ResourceLimits {
        max_document_bytes: 100,
        ..ResourceLimits::default()
    };
    let mut engine = Engine::with_limits(limits);

    let large = "Bolt: 2d6\n".repeat(20); // 200 bytes
    let analysis = engine.analyze(&large, &HashMap::new());
    assert!(analysis.results.is_empty());
    assert_eq!(analysis.errors.len(), 1);
    assert_eq!(analysis.errors[0].label, "Document");
    assert_eq!(limit_name(&analysis.errors[0].error), Some("max_document_bytes"));
}

#[test]
fn test_document_just_under_limit() {
    let limits = ResourceLimits {
        max_document_bytes: 1000,
        ..ResourceLimits::default()
    };
    let mut engine = Engine::with_limits(limits);
    let analysis = engine.analyze("Bolt: 2d6\nSpark: d4", &HashMap::new());
    assert!(analysis.errors.is_empty());
    assert_eq!(analysis.results.len(), 2);
}

#[test]
fn test_expression_depth_limit_is_per_formula() {
    let limits = ResourceLimits {
        max_expression_depth: 20,
        ..ResourceLimits::default()
    };
    let deep = format!("{}1{}", "(".repeat(50), ")".repeat(50));
    let code = format!("Deep: {}\nShallow: (((1)))", deep);

    let analysis = Engine::with_limits(limits).analyze(&code, &HashMap::new());
    assert_eq!(analysis.errors.len(), 1);
    assert_eq!(analysis.errors[0].label, "Deep");
    assert_eq!(limit_name(&analysis.errors[0].error), Some("max_expression_depth"));
    assert!(analysis.result("Shallow").is_some());
}

#[test]
fn test_repetition_limit() {
    let limits = ResourceLimits {
        max_repetitions: 50,
        ..ResourceLimits::default()
    };
    let mut engine = Engine::with_limits(limits);
    let analysis = engine.analyze("Many: 100d6\nFew: 50d6", &HashMap::new());
    assert_eq!(analysis.errors.len(), 1);
    assert_eq!(limit_name(&analysis.errors[0].error), Some("max_repetitions"));
    assert!(analysis.result("Few").is_some());
}

#[test]
fn test_repetition_count_beyond_integer_range() {
    let code = "Huge: 2^64 d6\nAstronomical: 10^300 d6\nFine: 2d6";
    let analysis = Engine::new().analyze(code, &HashMap::new());

    assert_eq!(analysis.errors.len(), 2, "{:?}", analysis.errors);
    for diagnostic in &analysis.errors {
        assert_eq!(limit_name(&diagnostic.error), Some("max_repetitions"));
    }
    assert!(analysis.result("Huge").is_none());
    assert_eq!(analysis.result("Fine").unwrap().mean, Some(7.0));
}

#[test]
fn test_long_operator_chain_hits_depth_limit() {
    let chain = vec!["1"; 3000].join("+");
    let code = format!("Long: {}\nShort: 1+1+1", chain);
    let analysis = Engine::new().analyze(&code, &HashMap::new());

    assert_eq!(analysis.errors.len(), 1);
    assert_eq!(analysis.errors[0].label, "Long");
    assert_eq!(limit_name(&analysis.errors[0].error), Some("max_expression_depth"));
    assert_eq!(analysis.result("Short").unwrap().mean, Some(3.0));
}

#[test]
fn test_call_depth_limit() {
    let code = r#"
omega = fn f { f[f] }
g = fn h x { h[h][x] }
Boom: omega[omega]
Loop: g[g][1]
Safe: 1
"#;
    let analysis = Engine::new().analyze(code, &HashMap::new());

    for label in ["Boom", "Loop"] {
        let diagnostic = analysis
            .errors
            .iter()
            .find(|d| d.label == label)
            .unwrap_or_else(|| panic!("runaway recursion in {} is reported", label));
        assert_eq!(limit_name(&diagnostic.error), Some("max_call_depth"));
    }
    assert!(analysis.result("Safe").is_some());
}

#[test]
fn test_default_limits_accept_realistic_documents() {
    let code = r#"
[min=1][max=20] level ? Character level = 20
Meteor Swarm: 4 (20d6 + 20d6)
Wish: max[lvl1[40]d6][lvl1[40]d8]
"#;
    let analysis = Engine::new().analyze(code, &HashMap::new());
    assert!(analysis.errors.is_empty(), "{:?}", analysis.errors);
}
