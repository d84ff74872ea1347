//! Fuzz target for summary record parsing.
//!
//! Tests that `parse_summary_content` handles arbitrary input without panicking.

#![no_main]

use std::path::Path;

use libfuzzer_sys::fuzz_target;
use sp_common::Observable;
use sp_core::record::parse_summary_content;

fuzz_target!(|data: &str| {
    // The parser should never panic, only return Error::Parse for malformed input
    if let Ok(record) = parse_summary_content(data, Path::new("fuzz.dat")) {
        assert_eq!(record.rows(), record.controls.len() + 1);
        for row in std::iter::once(&record.physical).chain(&record.controls) {
            assert!(Observable::ALL.iter().all(|&f| row.get(f).is_finite()));
        }
    }
});
