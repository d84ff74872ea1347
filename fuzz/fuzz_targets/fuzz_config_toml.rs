//! Fuzz target for analysis.toml configuration parsing.

#![no_main]

use libfuzzer_sys::fuzz_target;
use sp_config::validate::validate_config;
use sp_config::AnalysisConfig;

fuzz_target!(|data: &str| {
    if let Ok(config) = AnalysisConfig::from_toml_str(data) {
        let _ = validate_config(&config);
    }
});
