//! Core math modules.

pub mod aggregate;
pub mod covariance;
pub mod moments;
pub mod quantile;
