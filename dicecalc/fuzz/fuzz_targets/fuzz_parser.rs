#![no_main]

use dicecalc::{parse_document, ResourceLimits};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let _ = parse_document(s, &ResourceLimits::default());
    }
});
