//! Configuration management for mermaider.
//!
//! Parses `mermaider.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories. Every setting is
//! optional; command line values given via [`CliSettings`] take precedence.
//!
//! ```toml
//! [build]
//! input_dir = "docs"
//! output_dir = "diagrams"
//! exclude = ["drafts/**"]
//! jobs = 4
//!
//! [kroki]
//! url = "${KROKI_URL:-https://kroki.io}"
//! timeout_secs = 30
//! ```
//!
//! Paths in the file are relative to the directory containing it.
//!
//! ## Environment Variable Expansion
//!
//! `kroki.url` supports `${VAR}` (error if unset) and `${VAR:-default}`.

mod expand;

use std::path::{Path, PathBuf};
use std::time::Duration;

use glob::Pattern;
use serde::Deserialize;

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override input directory.
    pub input_dir: Option<PathBuf>,
    /// Override output directory.
    pub output_dir: Option<PathBuf>,
    /// Override Kroki server URL.
    pub kroki_url: Option<String>,
    /// Override render worker count.
    pub jobs: Option<usize>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "mermaider.toml";

/// Public Kroki instance used when no server is configured.
const DEFAULT_KROKI_URL: &str = "https://kroki.io";

/// Default HTTP timeout for Kroki requests, in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Build configuration (paths are relative strings from TOML).
    build: BuildConfigRaw,
    /// Kroki server configuration.
    pub kroki: KrokiConfig,

    /// Resolved build configuration (set after loading).
    #[serde(skip)]
    pub build_resolved: BuildSettings,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// Raw build configuration as parsed from TOML.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BuildConfigRaw {
    input_dir: Option<String>,
    output_dir: Option<String>,
    exclude: Vec<String>,
    jobs: Option<usize>,
}

/// Resolved build configuration.
#[derive(Debug, Default)]
pub struct BuildSettings {
    /// Directory containing source documents.
    pub input_dir: Option<PathBuf>,
    /// Directory receiving rendered diagrams.
    pub output_dir: Option<PathBuf>,
    /// Input paths to skip.
    pub exclude: Vec<Pattern>,
    /// Render worker count (`None` uses available parallelism).
    pub jobs: Option<usize>,
}

/// Kroki server configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct KrokiConfig {
    /// Server base URL.
    pub url: String,
    /// HTTP timeout per diagram, in seconds.
    pub timeout_secs: u64,
}

impl Default for KrokiConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_KROKI_URL.to_owned(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl KrokiConfig {
    /// HTTP timeout per diagram.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`kroki.url`").
        field: String,
        /// Error message (e.g., "${`KROKI_URL`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Require a URL field to use http:// or https:// scheme.
fn require_http_url(url: &str, field: &str) -> Result<(), ConfigError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{field} must start with http:// or https://"
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `mermaider.toml` in current directory and parents.
    /// Without a config file every setting has its default and both
    /// directories are unset.
    ///
    /// CLI settings are applied after loading and path resolution, and the
    /// result is validated.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails or
    /// a value is invalid.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        config.validate()?;
        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(input_dir) = &settings.input_dir {
            self.build_resolved.input_dir = Some(input_dir.clone());
        }
        if let Some(output_dir) = &settings.output_dir {
            self.build_resolved.output_dir = Some(output_dir.clone());
        }
        if let Some(kroki_url) = &settings.kroki_url {
            self.kroki.url.clone_from(kroki_url);
        }
        if let Some(jobs) = settings.jobs {
            self.build_resolved.jobs = Some(jobs);
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        discover_from(&std::env::current_dir().ok()?)
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        config.kroki.url = expand::expand_env(&config.kroki.url, "kroki.url")?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir)?;
        config.config_path = Some(path.to_path_buf());

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.kroki.url, "kroki.url")?;
        require_http_url(&self.kroki.url, "kroki.url")?;

        if self.kroki.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "kroki.timeout_secs must be greater than 0".to_owned(),
            ));
        }
        if self.build_resolved.jobs == Some(0) {
            return Err(ConfigError::Validation(
                "build.jobs must be greater than 0".to_owned(),
            ));
        }

        Ok(())
    }

    /// Resolve relative paths against the config directory and compile
    /// exclude patterns.
    fn resolve_paths(&mut self, config_dir: &Path) -> Result<(), ConfigError> {
        let resolve = |path: Option<&str>| path.map(|p| config_dir.join(p));

        let exclude: Vec<Pattern> = self
            .build
            .exclude
            .iter()
            .map(|raw| {
                Pattern::new(raw).map_err(|e| {
                    ConfigError::Validation(format!("build.exclude: invalid pattern {raw:?}: {e}"))
                })
            })
            .collect::<Result<_, _>>()?;

        self.build_resolved = BuildSettings {
            input_dir: resolve(self.build.input_dir.as_deref()),
            output_dir: resolve(self.build.output_dir.as_deref()),
            exclude,
            jobs: self.build.jobs,
        };

        Ok(())
    }
}

/// Search `start` and its parents for a config file.
fn discover_from(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();
    loop {
        let candidate = current.join(CONFIG_FILENAME);
        if candidate.is_file() {
            return Some(candidate);
        }
        if !current.pop() {
            return None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.kroki.url, "https://kroki.io");
        assert_eq!(config.kroki.timeout(), Duration::from_secs(30));
        assert!(config.build_resolved.input_dir.is_none());
        assert!(config.build_resolved.output_dir.is_none());
        assert!(config.build_resolved.exclude.is_empty());
        assert!(config.build_resolved.jobs.is_none());
        config.validate().unwrap();
    }

    #[test]
    fn test_parse_minimal_config() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.kroki.url, "https://kroki.io");
        assert_eq!(config.kroki.timeout_secs, 30);
    }

    #[test]
    fn test_parse_kroki_config() {
        let toml = r#"
[kroki]
url = "http://localhost:8000"
timeout_secs = 5
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.kroki.url, "http://localhost:8000");
        assert_eq!(config.kroki.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_resolve_paths() {
        let toml = r#"
[build]
input_dir = "docs"
output_dir = "site/diagrams"
exclude = ["drafts/**", "*.tmp"]
jobs = 4
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        config.resolve_paths(Path::new("/project")).unwrap();

        let build = &config.build_resolved;
        assert_eq!(build.input_dir, Some(PathBuf::from("/project/docs")));
        assert_eq!(
            build.output_dir,
            Some(PathBuf::from("/project/site/diagrams"))
        );
        assert_eq!(build.jobs, Some(4));
        let patterns: Vec<_> = build.exclude.iter().map(Pattern::as_str).collect();
        assert_eq!(patterns, vec!["drafts/**", "*.tmp"]);
    }

    #[test]
    fn test_invalid_exclude_pattern() {
        let toml = r#"
[build]
exclude = ["[unclosed"]
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        let err = config.resolve_paths(Path::new("/project")).unwrap_err();

        assert!(
            matches!(err, ConfigError::Validation(_)),
            "Expected ConfigError::Validation, got {err:?}"
        );
        assert!(err.to_string().contains("build.exclude"));
    }

    #[test]
    fn test_unknown_section_is_ignored() {
        let toml = r#"
[server]
port = 8080
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.kroki.url, "https://kroki.io");
    }

    #[test]
    fn test_apply_cli_settings_directories() {
        let mut config = Config::default();
        let overrides = CliSettings {
            input_dir: Some(PathBuf::from("in")),
            output_dir: Some(PathBuf::from("out")),
            ..Default::default()
        };

        config.apply_cli_settings(&overrides);

        assert_eq!(config.build_resolved.input_dir, Some(PathBuf::from("in")));
        assert_eq!(config.build_resolved.output_dir, Some(PathBuf::from("out")));
        assert_eq!(config.kroki.url, "https://kroki.io"); // Unchanged
    }

    #[test]
    fn test_apply_cli_settings_override_file_values() {
        let toml = r#"
[build]
input_dir = "docs"
jobs = 2

[kroki]
url = "https://kroki.example.com"
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        config.resolve_paths(Path::new("/project")).unwrap();
        let overrides = CliSettings {
            kroki_url: Some("http://localhost:8000".to_owned()),
            jobs: Some(8),
            ..Default::default()
        };

        config.apply_cli_settings(&overrides);

        assert_eq!(config.kroki.url, "http://localhost:8000");
        assert_eq!(config.build_resolved.jobs, Some(8));
        assert_eq!(
            config.build_resolved.input_dir,
            Some(PathBuf::from("/project/docs"))
        );
    }

    #[test]
    fn test_apply_cli_settings_empty() {
        let mut config = Config::default();
        config.apply_cli_settings(&CliSettings::default());

        assert!(config.build_resolved.input_dir.is_none());
        assert_eq!(config.kroki.url, "https://kroki.io");
    }

    #[test]
    fn test_validate_kroki_url_empty() {
        let mut config = Config::default();
        config.kroki.url = String::new();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("kroki.url cannot be empty"));
    }

    #[test]
    fn test_validate_kroki_url_invalid_scheme() {
        let mut config = Config::default();
        config.kroki.url = "ftp://kroki.io".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("must start with http://"));
    }

    #[test]
    fn test_validate_timeout_zero() {
        let mut config = Config::default();
        config.kroki.timeout_secs = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_validate_jobs_zero() {
        let mut config = Config::default();
        config.apply_cli_settings(&CliSettings {
            jobs: Some(0),
            ..Default::default()
        });
        let err = config.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Configuration error: build.jobs must be greater than 0"
        );
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(
            &path,
            "[build]\ninput_dir = \"docs\"\noutput_dir = \"out\"\n\n[kroki]\ntimeout_secs = 10\n",
        )
        .unwrap();

        let config = Config::load(Some(&path), None).unwrap();

        assert_eq!(config.config_path, Some(path));
        assert_eq!(config.build_resolved.input_dir, Some(dir.path().join("docs")));
        assert_eq!(config.build_resolved.output_dir, Some(dir.path().join("out")));
        assert_eq!(config.kroki.timeout_secs, 10);
    }

    #[test]
    fn test_load_expands_kroki_url() {
        // SAFETY: variable name is unique to this test
        unsafe {
            std::env::remove_var("MERMAIDER_TEST_CONFIG_KROKI_URL");
        }
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(
            &path,
            "[kroki]\nurl = \"${MERMAIDER_TEST_CONFIG_KROKI_URL:-http://kroki.local}\"\n",
        )
        .unwrap();

        let config = Config::load(Some(&path), None).unwrap();

        assert_eq!(config.kroki.url, "http://kroki.local");
    }

    #[test]
    fn test_load_missing_explicit_file() {
        let err = Config::load(Some(Path::new("/nonexistent/mermaider.toml")), None).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_load_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "[build\n").unwrap();

        let err = Config::load(Some(&path), None).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_validates_cli_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "").unwrap();
        let settings = CliSettings {
            kroki_url: Some("localhost:8000".to_owned()),
            ..Default::default()
        };

        let err = Config::load(Some(&path), Some(&settings)).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_discover_from_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(dir.path().join(CONFIG_FILENAME), "").unwrap();

        assert_eq!(
            discover_from(&nested),
            Some(dir.path().join(CONFIG_FILENAME))
        );
    }

    #[test]
    fn test_discover_from_without_config() {
        let dir = tempfile::tempdir().unwrap();
        // The temp dir's ancestors are outside the test's control, so only
        // check that a config inside the tree is not invented.
        let found = discover_from(dir.path());
        assert!(found.is_none_or(|p| !p.starts_with(dir.path())));
    }
}
