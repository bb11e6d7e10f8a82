//! Configuration loading and entry filtering.
//!
//! Configuration is read from TOML. Every section and field is optional:
//!
//! ```toml
//! [cleanup]
//! target = "/tmp"
//! max_age_days = 30
//! large_file_mb = 100
//!
//! [logging]
//! enabled = true
//! log_dir = "/var/log/housekeep"
//!
//! [filters]
//! skip_hidden = false
//! filenames = ["lost+found"]
//! extensions = ["lock"]
//! patterns = ["*.pid", "**/.git/**"]
//! regex = ["^keep_"]
//! include_patterns = []
//! ```
//!
//! Entries excluded by `[filters]` are left alone by every policy.

use glob::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the per-directory configuration file.
pub const LOCAL_CONFIG_FILE: &str = ".housekeeprc.toml";

/// Errors that can occur during configuration loading and filter compilation.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at the specified path.
    #[error("Configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),
    /// Invalid TOML syntax or structure.
    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),
    /// Invalid glob pattern provided.
    #[error("Invalid glob pattern '{pattern}': {reason}")]
    InvalidGlobPattern { pattern: String, reason: String },
    /// Invalid regex pattern provided.
    #[error("Invalid regex pattern '{pattern}': {reason}")]
    InvalidRegexPattern { pattern: String, reason: String },
    /// IO error while reading configuration.
    #[error("IO error reading configuration: {0}")]
    IoError(String),
}

/// Complete configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HousekeepConfig {
    #[serde(default)]
    pub cleanup: CleanupSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
    #[serde(default)]
    pub filters: FilterRules,
}

/// Defaults for the cleanup commands.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanupSettings {
    /// Directory the daily cleanup runs against.
    #[serde(default = "default_target")]
    pub target: PathBuf,
    /// Files last modified longer ago than this are deleted.
    #[serde(default = "default_max_age_days")]
    pub max_age_days: u64,
    /// Size threshold, in mebibytes, for large file search.
    #[serde(default = "default_large_file_mb")]
    pub large_file_mb: u64,
}

fn default_target() -> PathBuf {
    PathBuf::from("/tmp")
}

fn default_max_age_days() -> u64 {
    30
}

fn default_large_file_mb() -> u64 {
    100
}

impl Default for CleanupSettings {
    fn default() -> Self {
        Self {
            target: default_target(),
            max_age_days: default_max_age_days(),
            large_file_mb: default_large_file_mb(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Whether to write a daily log file in addition to the console.
    #[serde(default = "default_logging_enabled")]
    pub enabled: bool,
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
}

fn default_logging_enabled() -> bool {
    true
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("/var/log/housekeep")
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            enabled: default_logging_enabled(),
            log_dir: default_log_dir(),
        }
    }
}

/// Rules for leaving entries untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterRules {
    /// Skip entries whose name starts with a dot.
    #[serde(default)]
    pub skip_hidden: bool,

    /// Exact names to skip (e.g. "lost+found").
    #[serde(default)]
    pub filenames: Vec<String>,

    /// Extensions to skip, compared case-insensitively.
    #[serde(default)]
    pub extensions: Vec<String>,

    /// Glob patterns matched against the full path.
    #[serde(default)]
    pub patterns: Vec<String>,

    /// Regex patterns matched against the entry name.
    #[serde(default)]
    pub regex: Vec<String>,

    /// Glob patterns that override every skip rule.
    #[serde(default)]
    pub include_patterns: Vec<String>,
}

impl HousekeepConfig {
    /// Load configuration, falling back to defaults.
    ///
    /// Lookup order:
    /// 1. `config_path`, if provided
    /// 2. `.housekeeprc.toml` in the current directory
    /// 3. `~/.config/housekeep/config.toml`
    /// 4. Built-in defaults
    ///
    /// # Errors
    ///
    /// Returns an error if an explicit file is missing, or if any file found
    /// cannot be read or parsed.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(LOCAL_CONFIG_FILE);
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Ok(home) = std::env::var("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("housekeep")
                .join("config.toml");
            if home_config.exists() {
                return Self::load_from_file(&home_config);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))
    }
}

impl FilterRules {
    /// Compile into matchers.
    ///
    /// # Errors
    ///
    /// Returns an error if any glob or regex pattern is invalid.
    pub fn compile(&self) -> Result<CompiledFilters, ConfigError> {
        CompiledFilters::new(self)
    }
}

fn compile_globs(patterns: &[String]) -> Result<Vec<Pattern>, ConfigError> {
    patterns
        .iter()
        .map(|pattern| {
            Pattern::new(pattern).map_err(|e| ConfigError::InvalidGlobPattern {
                pattern: pattern.clone(),
                reason: e.msg.to_string(),
            })
        })
        .collect()
}

/// Pre-compiled filter rules.
#[derive(Debug, Clone, Default)]
pub struct CompiledFilters {
    skip_hidden: bool,
    filenames: HashSet<String>,
    extensions: HashSet<String>,
    patterns: Vec<Pattern>,
    regexes: Vec<Regex>,
    include_patterns: Vec<Pattern>,
}

impl CompiledFilters {
    fn new(rules: &FilterRules) -> Result<Self, ConfigError> {
        let regexes = rules
            .regex
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| ConfigError::InvalidRegexPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            skip_hidden: rules.skip_hidden,
            filenames: rules.filenames.iter().cloned().collect(),
            extensions: rules
                .extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_lowercase())
                .collect(),
            patterns: compile_globs(&rules.patterns)?,
            regexes,
            include_patterns: compile_globs(&rules.include_patterns)?,
        })
    }

    /// True when no rule can ever exclude anything.
    pub fn is_empty(&self) -> bool {
        !self.skip_hidden
            && self.filenames.is_empty()
            && self.extensions.is_empty()
            && self.patterns.is_empty()
            && self.regexes.is_empty()
    }

    /// Whether `path` should be left alone.
    ///
    /// Include patterns win over everything; otherwise the hidden, name,
    /// extension, glob and regex rules are tried in that order.
    pub fn is_excluded(&self, path: &Path) -> bool {
        if self.is_empty() {
            return false;
        }

        if self
            .include_patterns
            .iter()
            .any(|pattern| pattern.matches_path(path))
        {
            return false;
        }

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();

        if self.skip_hidden && file_name.starts_with('.') {
            return true;
        }

        if self.filenames.contains(file_name.as_ref()) {
            return true;
        }

        if let Some(ext) = path.extension() {
            let ext_lower = ext.to_string_lossy().to_lowercase();
            if self.extensions.contains(&ext_lower) {
                return true;
            }
        }

        if self.patterns.iter().any(|pattern| pattern.matches_path(path)) {
            return true;
        }

        self.regexes.iter().any(|regex| regex.is_match(&file_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = HousekeepConfig::default();
        assert_eq!(config.cleanup.target, PathBuf::from("/tmp"));
        assert_eq!(config.cleanup.max_age_days, 30);
        assert_eq!(config.cleanup.large_file_mb, 100);
        assert!(config.logging.enabled);
        assert_eq!(config.logging.log_dir, PathBuf::from("/var/log/housekeep"));
    }

    #[test]
    fn test_default_filters_exclude_nothing() {
        let filters = FilterRules::default().compile().unwrap();
        assert!(filters.is_empty());
        assert!(!filters.is_excluded(Path::new("/tmp/.hidden")));
        assert!(!filters.is_excluded(Path::new("/tmp/anything.txt")));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = HousekeepConfig::from_toml(
            r#"
            [cleanup]
            max_age_days = 7
            "#,
        )
        .unwrap();

        assert_eq!(config.cleanup.max_age_days, 7);
        assert_eq!(config.cleanup.large_file_mb, 100);
        assert_eq!(config.cleanup.target, PathBuf::from("/tmp"));
        assert!(config.filters.filenames.is_empty());
    }

    #[test]
    fn test_invalid_toml_rejected() {
        let result = HousekeepConfig::from_toml("[cleanup\nmax_age_days = ");
        assert!(matches!(result, Err(ConfigError::ConfigInvalid(_))));
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let result = HousekeepConfig::load(Some(Path::new("/no/such/housekeep.toml")));
        assert!(matches!(result, Err(ConfigError::ConfigNotFound(_))));
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
            [logging]
            enabled = false

            [filters]
            filenames = ["lost+found"]
            "#,
        )
        .unwrap();

        let config = HousekeepConfig::load(Some(&path)).unwrap();
        assert!(!config.logging.enabled);
        assert_eq!(config.filters.filenames, vec!["lost+found"]);
    }

    #[test]
    fn test_exclude_rules() {
        let rules = FilterRules {
            skip_hidden: true,
            filenames: vec!["lost+found".to_string()],
            extensions: vec![".LOCK".to_string()],
            patterns: vec!["*.pid".to_string()],
            regex: vec!["^keep_".to_string()],
            include_patterns: vec!["*/.important".to_string()],
        };
        let filters = rules.compile().unwrap();

        assert!(filters.is_excluded(Path::new("/srv/.cache")));
        assert!(filters.is_excluded(Path::new("/srv/lost+found")));
        assert!(filters.is_excluded(Path::new("/srv/db.lock")));
        assert!(filters.is_excluded(Path::new("/srv/app.pid")));
        assert!(filters.is_excluded(Path::new("/srv/keep_me.txt")));
        assert!(!filters.is_excluded(Path::new("/srv/.important")));
        assert!(!filters.is_excluded(Path::new("/srv/report.txt")));
    }

    #[test]
    fn test_invalid_patterns_rejected() {
        let bad_regex = FilterRules {
            regex: vec!["[unclosed".to_string()],
            ..Default::default()
        };
        assert!(matches!(
            bad_regex.compile(),
            Err(ConfigError::InvalidRegexPattern { .. })
        ));

        let bad_glob = FilterRules {
            patterns: vec!["[".to_string()],
            ..Default::default()
        };
        assert!(matches!(
            bad_glob.compile(),
            Err(ConfigError::InvalidGlobPattern { .. })
        ));
    }
}
