//! Satellite plane statistics configuration loading and validation.
//!
//! This crate provides:
//! - The typed [`AnalysisConfig`] passed explicitly into every core operation
//! - Config resolution (CLI → env → XDG → defaults)
//! - Semantic validation
//! - Config snapshots for reproducible reports

pub mod analysis;
pub mod resolve;
pub mod snapshot;
pub mod validate;

pub use analysis::{AnalysisConfig, FieldSelection, MeanErrorDivisor, LEGACY_MEAN_ERROR_DIVISOR};
pub use resolve::{load_config, resolve_config, ConfigSource, LoadedConfig};
pub use snapshot::ConfigSnapshot;
pub use validate::{ValidationError, ValidationResult};

/// Schema version for configuration files.
pub const CONFIG_SCHEMA_VERSION: &str = "1.0.0";
