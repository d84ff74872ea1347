//! Configuration validation errors and semantic validation.

use std::collections::HashSet;

use thiserror::Error;

use crate::analysis::AnalysisConfig;

/// Validation result type.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Configuration validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Semantic validation failed: {0}")]
    SemanticError(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: String, actual: String },
}

impl ValidationError {
    /// Error code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            ValidationError::IoError(_) => 60,
            ValidationError::ParseError(_) => 61,
            ValidationError::SemanticError(_) => 63,
            ValidationError::InvalidValue { .. } => 65,
            ValidationError::VersionMismatch { .. } => 66,
        }
    }
}

impl From<ValidationError> for sp_common::Error {
    fn from(err: ValidationError) -> Self {
        sp_common::Error::Config(err.to_string())
    }
}

/// Validate an analysis configuration semantically.
pub fn validate_config(config: &AnalysisConfig) -> ValidationResult<()> {
    if config.schema_version != crate::CONFIG_SCHEMA_VERSION {
        return Err(ValidationError::VersionMismatch {
            expected: crate::CONFIG_SCHEMA_VERSION.to_string(),
            actual: config.schema_version.clone(),
        });
    }

    if config.fields.is_empty() {
        return Err(ValidationError::InvalidValue {
            field: "fields".to_string(),
            message: "At least one field must be selected".to_string(),
        });
    }
    if config.aggregated_fields.is_empty() {
        return Err(ValidationError::InvalidValue {
            field: "aggregated_fields".to_string(),
            message: "At least one field must be aggregated".to_string(),
        });
    }

    let mut seen = HashSet::new();
    for field in &config.fields {
        if !seen.insert(*field) {
            return Err(ValidationError::InvalidValue {
                field: "fields".to_string(),
                message: format!("Duplicate field {}", field),
            });
        }
        if !config.aggregated_fields.contains(field) {
            return Err(ValidationError::SemanticError(format!(
                "Field {} is compared but not aggregated",
                field
            )));
        }
    }

    let mut seen = HashSet::new();
    for field in &config.aggregated_fields {
        if !seen.insert(*field) {
            return Err(ValidationError::InvalidValue {
                field: "aggregated_fields".to_string(),
                message: format!("Duplicate field {}", field),
            });
        }
    }

    if config.n_controls == 0 {
        return Err(ValidationError::InvalidValue {
            field: "n_controls".to_string(),
            message: "Must be at least 1".to_string(),
        });
    }

    if config.sample_count == 0 {
        return Err(ValidationError::InvalidValue {
            field: "sample_count".to_string(),
            message: "Must be at least 1".to_string(),
        });
    }

    validate_quantiles(&config.quantiles)?;

    if config.n_sat_min > config.n_sat_max {
        return Err(ValidationError::InvalidValue {
            field: "n_sat_min".to_string(),
            message: format!(
                "Must not exceed n_sat_max ({} > {})",
                config.n_sat_min, config.n_sat_max
            ),
        });
    }

    Ok(())
}

/// Quantiles must lie in (0, 1) and be strictly increasing.
fn validate_quantiles(quantiles: &[f64]) -> ValidationResult<()> {
    for (i, q) in quantiles.iter().enumerate() {
        if !(*q > 0.0 && *q < 1.0) {
            return Err(ValidationError::InvalidValue {
                field: format!("quantiles[{}]", i),
                message: format!("Must be in (0, 1), got {}", q),
            });
        }
    }
    if quantiles.windows(2).any(|w| w[0] >= w[1]) {
        return Err(ValidationError::InvalidValue {
            field: "quantiles".to_string(),
            message: "Must be strictly increasing".to_string(),
        });
    }
    Ok(())
}
