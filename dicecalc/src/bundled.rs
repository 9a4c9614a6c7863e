//! Collections shipped with the engine

/// A named, ready-to-analyze collection document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bundle {
    pub name: &'static str,
    pub source: &'static str,
}

/// A small selection of spells and parameters showing every feature
pub const EXAMPLE: Bundle = Bundle {
    name: "Example",
    source: include_str!("../../demos/example.dice"),
};

pub const WIZARD: Bundle = Bundle {
    name: "D&D 5e Wizard",
    source: include_str!("../../demos/wizard.dice"),
};

pub const BUNDLES: &[Bundle] = &[EXAMPLE, WIZARD];

/// Find a bundle by name, ignoring ASCII case.
pub fn find(name: &str) -> Option<&'static Bundle> {
    BUNDLES
        .iter()
        .find(|bundle| bundle.name.eq_ignore_ascii_case(name))
}
