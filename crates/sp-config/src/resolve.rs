//! Configuration resolution and path discovery.
//!
//! Resolution order: CLI argument → environment variables → XDG paths → system → defaults.

use std::path::{Path, PathBuf};

use crate::analysis::AnalysisConfig;
use crate::snapshot::hash_content;
use crate::validate::{validate_config, ValidationError, ValidationResult};

/// Where a configuration file was found.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConfigSource {
    /// Explicitly provided via CLI argument.
    CliArgument,

    /// Set via environment variable.
    Environment,

    /// Found in XDG config directory.
    XdgConfig,

    /// Found in /etc/satplane/.
    SystemConfig,

    /// Using built-in defaults.
    #[default]
    BuiltinDefault,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::CliArgument => write!(f, "CLI argument"),
            ConfigSource::Environment => write!(f, "environment variable"),
            ConfigSource::XdgConfig => write!(f, "XDG config"),
            ConfigSource::SystemConfig => write!(f, "system config"),
            ConfigSource::BuiltinDefault => write!(f, "builtin default"),
        }
    }
}

/// Environment variable names.
pub const ENV_CONFIG_PATH: &str = "SATPLANE_CONFIG";
pub const ENV_CONFIG_DIR: &str = "SATPLANE_CONFIG_DIR";

/// Config file names, in lookup order within a directory.
const CONFIG_FILENAMES: [&str; 2] = ["analysis.json", "analysis.toml"];

/// Application name for XDG directories.
const APP_NAME: &str = "satplane";

/// A validated configuration with provenance.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: AnalysisConfig,
    /// File the config came from (None for built-in defaults).
    pub path: Option<PathBuf>,
    pub source: ConfigSource,
    /// SHA-256 of the file content (None for built-in defaults).
    pub content_hash: Option<String>,
}

/// Resolve the analysis config path using the standard resolution order.
///
/// Resolution order:
/// 1. Explicit CLI path (if provided)
/// 2. SATPLANE_CONFIG environment variable
/// 3. SATPLANE_CONFIG_DIR environment variable + filename
/// 4. XDG config directory (~/.config/satplane/)
/// 5. System config (/etc/satplane/)
/// 6. Built-in defaults (None)
pub fn resolve_config(cli_path: Option<&Path>) -> (Option<PathBuf>, ConfigSource) {
    // 1. CLI argument
    if let Some(path) = cli_path {
        return (Some(path.to_path_buf()), ConfigSource::CliArgument);
    }

    // 2. Environment variable (direct path)
    if let Ok(env_path) = std::env::var(ENV_CONFIG_PATH) {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return (Some(path), ConfigSource::Environment);
        }
    }

    // 3. Environment variable (config dir)
    if let Ok(config_dir) = std::env::var(ENV_CONFIG_DIR) {
        if let Some(path) = find_in_dir(Path::new(&config_dir)) {
            return (Some(path), ConfigSource::Environment);
        }
    }

    // 4. XDG config directory
    if let Some(dir) = xdg_config_dir() {
        if let Some(path) = find_in_dir(&dir) {
            return (Some(path), ConfigSource::XdgConfig);
        }
    }

    // 5. System config
    if let Some(path) = find_in_dir(&system_config_dir()) {
        return (Some(path), ConfigSource::SystemConfig);
    }

    // 6. Built-in defaults
    (None, ConfigSource::BuiltinDefault)
}

/// Resolve, read, parse and validate the analysis configuration.
///
/// An explicit CLI path that cannot be read is an error; the other sources
/// are only consulted when their files exist.
pub fn load_config(cli_path: Option<&Path>) -> ValidationResult<LoadedConfig> {
    let (path, source) = resolve_config(cli_path);

    let Some(path) = path else {
        let config = AnalysisConfig::default();
        validate_config(&config)?;
        return Ok(LoadedConfig {
            config,
            path: None,
            source,
            content_hash: None,
        });
    };

    let content = std::fs::read_to_string(&path).map_err(|e| {
        ValidationError::IoError(format!("Failed to read {}: {}", path.display(), e))
    })?;
    let config = AnalysisConfig::from_file_content(&path, &content)?;
    validate_config(&config)?;

    Ok(LoadedConfig {
        config,
        content_hash: Some(hash_content(&content)),
        path: Some(path),
        source,
    })
}

fn find_in_dir(dir: &Path) -> Option<PathBuf> {
    CONFIG_FILENAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.exists())
}

/// Get the XDG config directory for satplane.
pub fn xdg_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join(APP_NAME))
}

/// Get the system config directory for satplane.
pub fn system_config_dir() -> PathBuf {
    PathBuf::from("/etc").join(APP_NAME)
}
