//! Exit codes for the sp-core CLI.
//!
//! Exit codes communicate the outcome without requiring output parsing.
//!
//! Exit code ranges:
//! - 0: Success
//! - 10-19: User/data errors (recoverable by fixing inputs or configuration)
//! - 20-29: Internal and I/O errors

use sp_common::{Error, ErrorCategory};

/// Exit codes for sp-core operations.
///
/// These codes are a stable contract for automation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success: report produced
    Clean = 0,

    // ========================================================================
    // User / Data Errors (10-19)
    // ========================================================================
    /// Invalid arguments
    ArgsError = 10,

    /// Malformed summary file or missing host counterpart
    DataError = 11,

    /// Not enough groups or control rows for the statistic
    InsufficientData = 12,

    /// Zero randomized spread or non-factorizable covariance
    NumericalError = 13,

    /// Configuration file invalid
    ConfigError = 14,

    // ========================================================================
    // Internal Errors (20-29)
    // ========================================================================
    /// Internal error (bug - please report)
    InternalError = 20,

    /// I/O error
    IoError = 21,
}

impl ExitCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Check if this exit code is a user/data error (codes 10-19).
    pub fn is_user_error(self) -> bool {
        (10..20).contains(&(self as i32))
    }

    /// Check if this exit code is an internal error (codes 20-29).
    pub fn is_internal_error(self) -> bool {
        (self as i32) >= 20
    }

    /// Get the error code name as a string constant (for JSON output).
    pub fn code_name(&self) -> &'static str {
        match self {
            ExitCode::Clean => "OK_CLEAN",
            ExitCode::ArgsError => "ERR_ARGS",
            ExitCode::DataError => "ERR_DATA",
            ExitCode::InsufficientData => "ERR_INSUFFICIENT_DATA",
            ExitCode::NumericalError => "ERR_NUMERICAL",
            ExitCode::ConfigError => "ERR_CONFIG",
            ExitCode::InternalError => "ERR_INTERNAL",
            ExitCode::IoError => "ERR_IO",
        }
    }
}

impl From<&Error> for ExitCode {
    fn from(err: &Error) -> Self {
        match err.category() {
            ErrorCategory::Config => ExitCode::ConfigError,
            ErrorCategory::Data => ExitCode::DataError,
            ErrorCategory::Sample => ExitCode::InsufficientData,
            ErrorCategory::Numerical => ExitCode::NumericalError,
            ErrorCategory::Io => match err {
                Error::Json(_) => ExitCode::InternalError,
                _ => ExitCode::IoError,
            },
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code_name(), self.as_i32())
    }
}
