//! Fuzz the DIMACS result parsers
//!
//! Solver output comes from an external process, so both parsers must
//! reject malformed text with an error rather than panic.

#![no_main]

use libfuzzer_sys::fuzz_target;
use relsat::backend::{parse_competition_output, parse_result_file};

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        let num_vars = input.len() as u32 % 64;
        if let Ok(Some(model)) = parse_result_file(input, num_vars) {
            assert_eq!(model.num_vars(), num_vars);
        }
        if let Ok(Some(model)) = parse_competition_output(input, num_vars) {
            assert_eq!(model.num_vars(), num_vars);
        }
    }
});
