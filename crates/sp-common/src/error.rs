//! Error types for satellite plane statistics.
//!
//! Every failure in the pipeline surfaces as an [`Error`] with:
//! - A stable numeric code for machine parsing
//! - A category for grouping
//! - A short headline and a remediation hint for humans
//!
//! # Human-Facing Output
//!
//! ```text
//! ✗ Division By Zero
//!   Reason: randomized std of width is zero for group index 2
//!   Fix: The randomized controls for this group carry no spread; ...
//! ```
//!
//! # Agent-Facing Output
//!
//! ```json
//! {
//!   "code": 40,
//!   "category": "numerical",
//!   "message": "randomized std of width is zero for group index 2",
//!   "context": { "field": "width", "group_index": 2 }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;

use crate::host::Host;
use crate::observable::Observable;

/// Result type alias for satellite plane operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Configuration file errors.
    Config,
    /// Summary file parsing and discovery errors.
    Data,
    /// Not enough groups or samples for the requested statistic.
    Sample,
    /// Numerical failures (zero variance, non-factorizable covariance).
    Numerical,
    /// File I/O and serialization errors.
    Io,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Config => write!(f, "config"),
            ErrorCategory::Data => write!(f, "data"),
            ErrorCategory::Sample => write!(f, "sample"),
            ErrorCategory::Numerical => write!(f, "numerical"),
            ErrorCategory::Io => write!(f, "io"),
        }
    }
}

/// Unified error type for satellite plane statistics.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (10-19)
    #[error("configuration error: {0}")]
    Config(String),

    // Data errors (20-29)
    #[error("failed to parse {}{}: {message}", path.display(), line.map(|l| format!(" (line {l})")).unwrap_or_default())]
    Parse {
        path: PathBuf,
        line: Option<usize>,
        message: String,
    },

    #[error("missing {host} counterpart for group {group_id} (n_sat={n_sat}): {}", path.display())]
    MissingCounterpart {
        host: Host,
        group_id: u64,
        n_sat: u32,
        path: PathBuf,
    },

    // Sample-size errors (30-39)
    #[error("insufficient data: {0}")]
    InsufficientData(String),

    #[error("group index {index} out of range for experiment with {points} points")]
    IndexOutOfRange { index: usize, points: usize },

    // Numerical errors (40-49)
    #[error("randomized std of {field} is zero for group index {group_index}")]
    DivideByZero {
        field: Observable,
        group_index: usize,
    },

    #[error("numerical instability detected: {0}")]
    NumericalInstability(String),

    // I/O errors (60-69)
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns the error code for this error type.
    ///
    /// Error codes are stable and grouped by category:
    /// - 10-19: Configuration errors
    /// - 20-29: Data errors
    /// - 30-39: Sample-size errors
    /// - 40-49: Numerical errors
    /// - 60-69: I/O errors
    pub fn code(&self) -> u32 {
        match self {
            Error::Config(_) => 10,
            Error::Parse { .. } => 20,
            Error::MissingCounterpart { .. } => 21,
            Error::InsufficientData(_) => 30,
            Error::IndexOutOfRange { .. } => 31,
            Error::DivideByZero { .. } => 40,
            Error::NumericalInstability(_) => 41,
            Error::Io { .. } => 60,
            Error::Json(_) => 61,
        }
    }

    /// Returns the error category for grouping and filtering.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Config(_) => ErrorCategory::Config,
            Error::Parse { .. } | Error::MissingCounterpart { .. } => ErrorCategory::Data,
            Error::InsufficientData(_) | Error::IndexOutOfRange { .. } => ErrorCategory::Sample,
            Error::DivideByZero { .. } | Error::NumericalInstability(_) => {
                ErrorCategory::Numerical
            }
            Error::Io { .. } | Error::Json(_) => ErrorCategory::Io,
        }
    }

    /// Returns a human-readable remediation hint.
    pub fn remediation(&self) -> &'static str {
        match self {
            Error::Config(_) => {
                "Run 'sp-core config validate' and check the analysis config file syntax."
            }
            Error::Parse { .. } => {
                "Each row needs 8 whitespace-separated floats: minr maxr ca_ratio ba_ratio a center width mu."
            }
            Error::MissingCounterpart { .. } => {
                "Every M31 summary file needs an MW file with the same group id and n_sat."
            }
            Error::InsufficientData(_) => {
                "Check the input directory and n_sat value; the statistic needs more groups or control rows."
            }
            Error::IndexOutOfRange { .. } => {
                "Leave-one-out indices must be smaller than the number of groups."
            }
            Error::DivideByZero { .. } => {
                "The randomized controls for this group carry no spread; regenerate them or drop the group."
            }
            Error::NumericalInstability(_) => {
                "A value was not finite or the covariance could not be factorized; inspect the input files and the jackknife estimate."
            }
            Error::Io { .. } => "Check that the path exists and is readable.",
            Error::Json(_) => "Invalid JSON; check the file syntax.",
        }
    }

    /// Returns a short headline for human-readable output.
    pub fn headline(&self) -> &'static str {
        match self {
            Error::Config(_) => "Configuration Error",
            Error::Parse { .. } => "Summary Parse Error",
            Error::MissingCounterpart { .. } => "Missing Counterpart File",
            Error::InsufficientData(_) => "Insufficient Data",
            Error::IndexOutOfRange { .. } => "Index Out Of Range",
            Error::DivideByZero { .. } => "Division By Zero",
            Error::NumericalInstability(_) => "Numerical Instability",
            Error::Io { .. } => "I/O Error",
            Error::Json(_) => "Serialization Error",
        }
    }

    /// Convenience constructor for I/O failures tied to a path.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

/// Structured error for JSON output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// Stable error code.
    pub code: u32,

    /// Error category for grouping.
    pub category: ErrorCategory,

    /// Human-readable error message.
    pub message: String,

    /// Additional structured context (e.g., path, group id).
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub context: HashMap<String, serde_json::Value>,
}

impl From<&Error> for StructuredError {
    fn from(err: &Error) -> Self {
        let mut context = HashMap::new();

        match err {
            Error::Parse { path, line, .. } => {
                context.insert("path".to_string(), serde_json::json!(path));
                if let Some(line) = line {
                    context.insert("line".to_string(), serde_json::json!(line));
                }
            }
            Error::MissingCounterpart {
                host,
                group_id,
                n_sat,
                path,
            } => {
                context.insert("host".to_string(), serde_json::json!(host));
                context.insert("group_id".to_string(), serde_json::json!(group_id));
                context.insert("n_sat".to_string(), serde_json::json!(n_sat));
                context.insert("path".to_string(), serde_json::json!(path));
            }
            Error::IndexOutOfRange { index, points } => {
                context.insert("index".to_string(), serde_json::json!(index));
                context.insert("points".to_string(), serde_json::json!(points));
            }
            Error::DivideByZero { field, group_index } => {
                context.insert("field".to_string(), serde_json::json!(field));
                context.insert("group_index".to_string(), serde_json::json!(group_index));
            }
            Error::Io { path, .. } => {
                context.insert("path".to_string(), serde_json::json!(path));
            }
            _ => {}
        }

        StructuredError {
            code: err.code(),
            category: err.category(),
            message: err.to_string(),
            context,
        }
    }
}

impl StructuredError {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(r#"{{"code":{},"error":"serialization_failed"}}"#, self.code)
        })
    }
}

/// Format an error for human-readable stderr output.
///
/// Output format:
/// ```text
/// ✗ [Headline]
///   Reason: [Error message]
///   Fix: [Remediation hint]
/// ```
pub fn format_error_human(err: &Error, use_color: bool) -> String {
    let (red, cyan, reset) = if use_color {
        ("\x1b[31m", "\x1b[36m", "\x1b[0m")
    } else {
        ("", "", "")
    };

    format!(
        "{red}✗{reset} {headline}\n  Reason: {message}\n  {cyan}Fix:{reset} {remediation}",
        red = red,
        cyan = cyan,
        reset = reset,
        headline = err.headline(),
        message = err,
        remediation = err.remediation()
    )
}
