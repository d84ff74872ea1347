//! Fuzz target for analysis.json configuration parsing.
//!
//! Tests that JSON parsing and semantic validation handle arbitrary input
//! without panicking.

#![no_main]

use libfuzzer_sys::fuzz_target;
use sp_config::validate::validate_config;
use sp_config::AnalysisConfig;

fuzz_target!(|data: &[u8]| {
    if let Ok(config) = serde_json::from_slice::<AnalysisConfig>(data) {
        let _ = validate_config(&config);
    }
});
