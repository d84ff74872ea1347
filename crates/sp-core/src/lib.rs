//! Satellite Plane Statistics Core Library
//!
//! This library provides the statistics pipeline:
//! - Summary record loading and experiment aggregation
//! - Randomized-baseline normalization
//! - Jackknife covariance estimation
//! - Gaussian model sampling and comparison
//! - Report builders, logging and exit codes for the CLI
//!
//! The binary entry point is in `main.rs`.

pub mod exit_codes;
pub mod experiment;
pub mod gaussian;
pub mod jackknife;
pub mod logging;
pub mod normalize;
pub mod record;
pub mod report;

pub use experiment::{
    discover_groups, load_experiment, AggregationMode, DetailedExperiment, Experiment,
    ExperimentPair, LoadedExperiments,
};
pub use gaussian::{GaussianModel, ModelComparison};
pub use jackknife::{covariance_and_mean, jackknife_covariance, JackknifeEstimate};
pub use normalize::{normalize, NormalizedObservation};
pub use record::{load_summary, SummaryRecord, SummaryRow};
