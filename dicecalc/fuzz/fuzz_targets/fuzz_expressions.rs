#![no_main]

use dicecalc::{parse_expression, DiceError};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(expr) = parse_expression(s) {
            // printed expressions are fully parenthesized, so only the depth
            // limit may reject them
            let printed = expr.to_string();
            match parse_expression(&printed) {
                Ok(_) | Err(DiceError::ResourceLimitExceeded { .. }) => {}
                Err(e) => panic!("{:?} printed as {:?}: {}", s, printed, e),
            }
        }
    }
});
