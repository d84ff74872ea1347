//! Analysis configuration types.
//!
//! Every knob the statistics pipeline reads lives here and is passed
//! explicitly; there are no module-level field lists.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sp_common::Observable;

use crate::validate::ValidationError;

/// Divisor historically applied to the jackknife mean error.
///
/// The covariance error divides by the group count; the mean error in the
/// published analysis divided by this constant instead. Kept as the default
/// so results stay comparable with earlier runs.
pub const LEGACY_MEAN_ERROR_DIVISOR: f64 = 20.0;

/// How the jackknife mean error is normalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeanErrorDivisor {
    /// Divide by [`LEGACY_MEAN_ERROR_DIVISOR`] regardless of the group count.
    #[default]
    LegacyFixed,
    /// Divide by the number of groups, matching the covariance error.
    GroupCount,
}

impl MeanErrorDivisor {
    /// Divisor to apply for `n_groups` leave-one-out replicates.
    pub fn divisor(self, n_groups: usize) -> f64 {
        match self {
            MeanErrorDivisor::LegacyFixed => LEGACY_MEAN_ERROR_DIVISOR,
            MeanErrorDivisor::GroupCount => n_groups as f64,
        }
    }
}

impl std::fmt::Display for MeanErrorDivisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MeanErrorDivisor::LegacyFixed => write!(f, "legacy_fixed"),
            MeanErrorDivisor::GroupCount => write!(f, "group_count"),
        }
    }
}

impl std::str::FromStr for MeanErrorDivisor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "legacy_fixed" | "legacy" | "fixed" => Ok(MeanErrorDivisor::LegacyFixed),
            "group_count" | "n" => Ok(MeanErrorDivisor::GroupCount),
            _ => Err(format!("unknown mean error divisor: {}", s)),
        }
    }
}

/// Ordered set of observables that are normalized and compared.
///
/// Row `i` of every normalized matrix and covariance corresponds to
/// `fields[i]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSelection {
    fields: Vec<Observable>,
}

impl FieldSelection {
    pub fn new(fields: Vec<Observable>) -> Self {
        FieldSelection { fields }
    }

    /// Ordered fields.
    pub fn fields(&self) -> &[Observable] {
        &self.fields
    }

    /// Index → field mapping, e.g. `{0: width, 1: ca_ratio, 2: ba_ratio}`.
    pub fn field_index_map(&self) -> BTreeMap<usize, Observable> {
        self.fields.iter().copied().enumerate().collect()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Field at a row index.
    pub fn get(&self, index: usize) -> Option<Observable> {
        self.fields.get(index).copied()
    }
}

impl Default for FieldSelection {
    fn default() -> Self {
        FieldSelection::new(default_fields())
    }
}

/// Complete analysis configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_schema_version")]
    pub schema_version: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Ordered fields that are normalized and compared.
    #[serde(default = "default_fields")]
    pub fields: Vec<Observable>,

    /// Fields collected into each experiment.
    #[serde(default = "default_aggregated_fields")]
    pub aggregated_fields: Vec<Observable>,

    /// Randomized control rows consumed per summary file.
    #[serde(default = "default_n_controls")]
    pub n_controls: usize,

    #[serde(default)]
    pub mean_error_divisor: MeanErrorDivisor,

    /// Draws from the Gaussian model per host.
    #[serde(default = "default_sample_count")]
    pub sample_count: usize,

    /// Seed for the Gaussian model sampler; entropy-seeded when absent.
    #[serde(default)]
    pub seed: Option<u64>,

    /// Quantiles reported for the model draws.
    #[serde(default = "default_quantiles")]
    pub quantiles: Vec<f64>,

    #[serde(default = "default_n_sat_min")]
    pub n_sat_min: u32,

    #[serde(default = "default_n_sat_max")]
    pub n_sat_max: u32,
}

fn default_schema_version() -> String {
    crate::CONFIG_SCHEMA_VERSION.to_string()
}

fn default_fields() -> Vec<Observable> {
    vec![Observable::Width, Observable::CaRatio, Observable::BaRatio]
}

fn default_aggregated_fields() -> Vec<Observable> {
    Observable::ALL.to_vec()
}

fn default_n_controls() -> usize {
    100
}

fn default_sample_count() -> usize {
    100_000
}

fn default_quantiles() -> Vec<f64> {
    vec![0.16, 0.5, 0.84]
}

fn default_n_sat_min() -> u32 {
    11
}

fn default_n_sat_max() -> u32 {
    15
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            schema_version: default_schema_version(),
            description: None,
            fields: default_fields(),
            aggregated_fields: default_aggregated_fields(),
            n_controls: default_n_controls(),
            mean_error_divisor: MeanErrorDivisor::default(),
            sample_count: default_sample_count(),
            seed: None,
            quantiles: default_quantiles(),
            n_sat_min: default_n_sat_min(),
            n_sat_max: default_n_sat_max(),
        }
    }
}

impl AnalysisConfig {
    /// Parse file content as TOML for a `.toml` path and as JSON otherwise.
    pub fn from_file_content(path: &Path, content: &str) -> Result<Self, ValidationError> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::from_toml_str(content),
            _ => Self::from_json_str(content),
        }
    }

    /// Parse from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self, ValidationError> {
        serde_json::from_str(json)
            .map_err(|e| ValidationError::ParseError(format!("Invalid JSON: {}", e)))
    }

    /// Parse from a TOML string.
    pub fn from_toml_str(text: &str) -> Result<Self, ValidationError> {
        toml::from_str(text).map_err(|e| ValidationError::ParseError(format!("Invalid TOML: {}", e)))
    }

    /// The explicit field selection handed to the normalizer and estimator.
    pub fn field_selection(&self) -> FieldSelection {
        FieldSelection::new(self.fields.clone())
    }

    /// Inclusive n_sat range used by range reports.
    pub fn n_sat_range(&self) -> std::ops::RangeInclusive<u32> {
        self.n_sat_min..=self.n_sat_max
    }
}
