//! Configuration snapshots for reproducible reports.
//!
//! A snapshot captures the exact configuration behind a report so that the
//! numbers can be traced back to the settings that produced them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::analysis::{AnalysisConfig, MeanErrorDivisor};
use crate::resolve::LoadedConfig;

/// A frozen snapshot of configuration state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    /// When this snapshot was taken.
    pub timestamp: DateTime<Utc>,

    /// Schema version of the configuration.
    pub schema_version: String,

    /// Path the config was loaded from.
    #[serde(default)]
    pub path: Option<String>,

    /// Source of the configuration.
    pub source: String,

    /// SHA-256 of the effective configuration (file content, or the
    /// serialized defaults).
    pub config_hash: String,

    /// Key configuration values for quick reference.
    pub summary: ConfigSummary,
}

/// Summary of key configuration values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSummary {
    pub fields: Vec<String>,
    pub n_controls: usize,
    pub mean_error_divisor: MeanErrorDivisor,
    pub sample_count: usize,
    pub seed: Option<u64>,
}

impl ConfigSnapshot {
    /// Create a snapshot from a loaded configuration.
    pub fn new(loaded: &LoadedConfig) -> Self {
        let config_hash = loaded.content_hash.clone().unwrap_or_else(|| {
            hash_content(&serde_json::to_string(&loaded.config).unwrap_or_default())
        });

        ConfigSnapshot {
            timestamp: Utc::now(),
            schema_version: loaded.config.schema_version.clone(),
            path: loaded.path.as_ref().map(|p| p.display().to_string()),
            source: loaded.source.to_string(),
            config_hash,
            summary: ConfigSummary::from_config(&loaded.config),
        }
    }

    /// Serialize snapshot to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize snapshot from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Check if this snapshot matches another (same config).
    pub fn matches(&self, other: &ConfigSnapshot) -> bool {
        self.config_hash == other.config_hash
    }

    /// Get a short identifier for this snapshot (first 12 chars of hash).
    pub fn short_id(&self) -> &str {
        &self.config_hash[..12.min(self.config_hash.len())]
    }
}

impl ConfigSummary {
    fn from_config(config: &AnalysisConfig) -> Self {
        ConfigSummary {
            fields: config.fields.iter().map(|f| f.name().to_string()).collect(),
            n_controls: config.n_controls,
            mean_error_divisor: config.mean_error_divisor,
            sample_count: config.sample_count,
            seed: config.seed,
        }
    }
}

/// Hash content with SHA-256 and return hex string.
pub(crate) fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::ConfigSource;

    fn defaults() -> LoadedConfig {
        LoadedConfig {
            config: AnalysisConfig::default(),
            path: None,
            source: ConfigSource::BuiltinDefault,
            content_hash: None,
        }
    }

    #[test]
    fn test_defaults_snapshot() {
        let snapshot = ConfigSnapshot::new(&defaults());
        assert_eq!(snapshot.schema_version, crate::CONFIG_SCHEMA_VERSION);
        assert!(snapshot.path.is_none());
        assert_eq!(snapshot.source, "builtin default");
        assert_eq!(snapshot.summary.fields, vec!["width", "ca_ratio", "ba_ratio"]);
    }

    #[test]
    fn test_snapshot_short_id() {
        let snapshot = ConfigSnapshot::new(&defaults());
        assert_eq!(snapshot.short_id().len(), 12);
    }

    #[test]
    fn test_snapshot_matches() {
        let s1 = ConfigSnapshot::new(&defaults());
        let s2 = ConfigSnapshot::new(&defaults());
        assert!(s1.matches(&s2));

        let mut other = defaults();
        other.config.seed = Some(7);
        let s3 = ConfigSnapshot::new(&other);
        assert!(!s1.matches(&s3));
    }

    #[test]
    fn test_file_hash_is_used_when_present() {
        let mut loaded = defaults();
        loaded.content_hash = Some(hash_content("{}"));
        let snapshot = ConfigSnapshot::new(&loaded);
        assert_eq!(snapshot.config_hash, hash_content("{}"));
    }

    #[test]
    fn test_hash_content() {
        let hash1 = hash_content("test");
        let hash2 = hash_content("test");
        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn test_snapshot_json_roundtrip() {
        let snapshot = ConfigSnapshot::new(&defaults());
        let json = snapshot.to_json().unwrap();
        let restored = ConfigSnapshot::from_json(&json).unwrap();
        assert!(snapshot.matches(&restored));
    }
}
