//! Structured event definitions for logging.
//!
//! Events follow a consistent schema for machine-parseable JSONL output.
//! All events carry the run id and the pipeline stage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Log levels for events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<tracing::Level> for Level {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::TRACE => Level::Trace,
            tracing::Level::DEBUG => Level::Debug,
            tracing::Level::INFO => Level::Info,
            tracing::Level::WARN => Level::Warn,
            tracing::Level::ERROR => Level::Error,
        }
    }
}

/// Stages of the statistics pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Startup and configuration.
    Init,
    /// Summary file discovery and parsing.
    Load,
    /// Per-group aggregation into experiments.
    Aggregate,
    /// Randomized-baseline normalization.
    Normalize,
    /// Leave-one-out covariance estimation.
    Jackknife,
    /// Gaussian model sampling.
    Sample,
    /// Report rendering and artifact output.
    Report,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::Init => "init",
            Stage::Load => "load",
            Stage::Aggregate => "aggregate",
            Stage::Normalize => "normalize",
            Stage::Jackknife => "jackknife",
            Stage::Sample => "sample",
            Stage::Report => "report",
        };
        write!(f, "{}", s)
    }
}

/// Standard event names used as tracing targets.
pub mod event_names {
    // Run lifecycle
    pub const RUN_STARTED: &str = "run.started";
    pub const RUN_FINISHED: &str = "run.finished";
    pub const RUN_FAILED: &str = "run.failed";

    // Load stage
    pub const LOAD_GROUPS_DISCOVERED: &str = "load.groups_discovered";
    pub const LOAD_SUMMARY_PARSED: &str = "load.summary_parsed";

    // Aggregate stage
    pub const AGGREGATE_GROUP_LOADED: &str = "aggregate.group_loaded";
    pub const AGGREGATE_FINISHED: &str = "aggregate.finished";
    pub const AGGREGATE_EMPTY: &str = "aggregate.empty";

    // Normalize stage
    pub const NORMALIZE_FINISHED: &str = "normalize.finished";

    // Jackknife stage
    pub const JACKKNIFE_STARTED: &str = "jackknife.started";
    pub const JACKKNIFE_REPLICATE: &str = "jackknife.replicate";
    pub const JACKKNIFE_FINISHED: &str = "jackknife.finished";

    // Sample stage
    pub const SAMPLE_JITTER_APPLIED: &str = "sample.jitter_applied";
    pub const SAMPLE_FINISHED: &str = "sample.finished";

    // Report stage
    pub const REPORT_NSAT_SKIPPED: &str = "report.n_sat_skipped";
    pub const REPORT_ARTIFACT_WRITTEN: &str = "report.artifact_written";

    // Config/init events
    pub const CONFIG_LOADED: &str = "config.loaded";
    pub const CONFIG_DEFAULT_USED: &str = "config.default_used";
    pub const CONFIG_ERROR: &str = "config.error";
}

/// A structured log event for JSONL output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEvent {
    pub ts: DateTime<Utc>,

    pub level: Level,

    /// Event name (e.g., "run.started", "jackknife.finished").
    pub event: String,

    /// Unique ID for this invocation of sp-core.
    pub run_id: String,

    /// Subcommand being executed, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    pub stage: Stage,

    pub message: String,

    /// Additional structured fields (stable keys).
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub fields: HashMap<String, serde_json::Value>,
}

impl LogEvent {
    pub fn new(
        level: Level,
        event: impl Into<String>,
        run_id: impl Into<String>,
        stage: Stage,
        message: impl Into<String>,
    ) -> Self {
        LogEvent {
            ts: Utc::now(),
            level,
            event: event.into(),
            run_id: run_id.into(),
            command: None,
            stage,
            message: message.into(),
            fields: HashMap::new(),
        }
    }

    /// Add a field to the event.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.fields.insert(key.into(), v);
        }
        self
    }

    /// Serialize to a single JSON line.
    pub fn to_jsonl(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(
                r#"{{"error":"serialization_failed","event":"{}"}}"#,
                self.event
            )
        })
    }
}

/// Context for generating log events with a consistent run id.
#[derive(Debug, Clone)]
pub struct LogContext {
    pub run_id: String,
    pub command: Option<String>,
}

impl LogContext {
    pub fn new(run_id: impl Into<String>) -> Self {
        LogContext {
            run_id: run_id.into(),
            command: None,
        }
    }

    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    /// Create an event with this context.
    pub fn event(
        &self,
        level: Level,
        event: impl Into<String>,
        stage: Stage,
        message: impl Into<String>,
    ) -> LogEvent {
        let mut e = LogEvent::new(level, event, &self.run_id, stage, message);
        e.command.clone_from(&self.command);
        e
    }

    pub fn info(&self, event: impl Into<String>, stage: Stage, message: impl Into<String>) -> LogEvent {
        self.event(Level::Info, event, stage, message)
    }

    pub fn warn(&self, event: impl Into<String>, stage: Stage, message: impl Into<String>) -> LogEvent {
        self.event(Level::Warn, event, stage, message)
    }

    pub fn error(&self, event: impl Into<String>, stage: Stage, message: impl Into<String>) -> LogEvent {
        self.event(Level::Error, event, stage, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_event_serialization() {
        let event = LogEvent::new(
            Level::Info,
            "jackknife.finished",
            "run-12345",
            Stage::Jackknife,
            "Jackknife estimate ready",
        )
        .with_field("groups", 12);

        let json = event.to_jsonl();
        assert!(json.contains(r#""event":"jackknife.finished""#));
        assert!(json.contains(r#""level":"info""#));
        assert!(json.contains(r#""stage":"jackknife""#));
        assert!(json.contains(r#""run_id":"run-12345""#));
        assert!(json.contains(r#""groups":12"#));
        assert!(!json.contains("command"));
    }

    #[test]
    fn test_log_context() {
        let ctx = LogContext::new("run-abc").with_command("covariance");

        let event = ctx.warn("report.n_sat_skipped", Stage::Report, "no groups");
        assert_eq!(event.run_id, "run-abc");
        assert_eq!(event.command.as_deref(), Some("covariance"));
        assert_eq!(event.level, Level::Warn);
        assert_eq!(event.stage, Stage::Report);
    }

    #[test]
    fn test_stage_display_matches_serde() {
        for stage in [Stage::Init, Stage::Load, Stage::Jackknife, Stage::Sample] {
            assert_eq!(
                serde_json::to_string(&stage).unwrap(),
                format!("\"{}\"", stage)
            );
        }
    }

    #[test]
    fn test_event_names_are_dotted_by_stage() {
        assert!(event_names::AGGREGATE_GROUP_LOADED.starts_with("aggregate."));
        assert!(event_names::JACKKNIFE_FINISHED.starts_with("jackknife."));
        assert!(event_names::SAMPLE_JITTER_APPLIED.starts_with("sample."));
    }
}
