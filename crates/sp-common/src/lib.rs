//! Satellite plane statistics common types and errors.
//!
//! This crate provides foundational types shared across the workspace:
//! - Host identities (M31 / MW analogs)
//! - Observable plane-shape statistics and series keys
//! - Common error types with stable codes
//! - Output format specifications

pub mod error;
pub mod host;
pub mod observable;
pub mod output;

pub use error::{format_error_human, Error, ErrorCategory, Result, StructuredError};
pub use host::Host;
pub use observable::{Observable, SeriesComponent, SeriesKey};
pub use output::OutputFormat;
