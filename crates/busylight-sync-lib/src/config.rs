//! Application configuration: TOML-based, platform-aware paths.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::color::parse_color;
use crate::device::LUXAFOR_FLAG;
use crate::http::{BasicAuth, Credential};
use crate::reconcile::BusyColors;

const CONFIG_FILE: &str = "config.toml";

/// Settings for one status source, keyed by source type name in [`Config::sources`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default)]
    pub basic_auth: BasicAuth,

    /// Replaces the source's built-in API base URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl SourceConfig {
    pub fn basic_auth(username: &str, password: &str) -> Self {
        SourceConfig {
            basic_auth: BasicAuth::new(username, password),
            base_url: None,
        }
    }

    /// No credential of any supported scheme is set.
    pub fn is_empty(&self) -> bool {
        self.basic_auth.is_empty()
    }

    pub fn credential(&self) -> Option<Credential> {
        if self.basic_auth.is_empty() {
            None
        } else {
            Some(Credential::BasicAuth(self.basic_auth.clone()))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Color shown while any source is busy (hex or name). Default: "#FF0000".
    #[serde(default = "default_busy_color")]
    pub busy_color: String,

    /// Color shown while every source is idle. Default: "#00FF00".
    #[serde(default = "default_idle_color")]
    pub idle_color: String,

    /// Delay between two reconciliation ticks.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Per-request timeout applied to every source poll.
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,

    /// Device type names to open at startup.
    #[serde(default = "default_devices")]
    pub devices: Vec<String>,

    /// Source type name → settings. Polled in key order.
    #[serde(default)]
    pub sources: BTreeMap<String, SourceConfig>,
}

fn default_busy_color() -> String {
    "#FF0000".into()
}
fn default_idle_color() -> String {
    "#00FF00".into()
}
fn default_poll_interval_ms() -> u64 {
    1000
}
fn default_http_timeout_secs() -> u64 {
    10
}
fn default_devices() -> Vec<String> {
    vec![LUXAFOR_FLAG.to_string()]
}

impl Default for Config {
    fn default() -> Self {
        Config {
            busy_color: default_busy_color(),
            idle_color: default_idle_color(),
            poll_interval_ms: default_poll_interval_ms(),
            http_timeout_secs: default_http_timeout_secs(),
            devices: default_devices(),
            sources: BTreeMap::new(),
        }
    }
}

// ── Errors ──

/// Problems [`Config::validate`] can report.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    NoSources,
    /// Source names with no credential, sorted.
    EmptyCredentials(Vec<String>),
    InvalidColor { field: &'static str, reason: String },
    SameColors,
    ZeroInterval,
    ZeroTimeout,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::NoSources => write!(f, "no app in configuration file"),
            ValidationError::EmptyCredentials(names) if names.len() == 1 => {
                write!(f, "{} configuration is empty", names[0])
            }
            ValidationError::EmptyCredentials(names) => {
                write!(f, "{} configurations are empty", names.join(", "))
            }
            ValidationError::InvalidColor { field, reason } => {
                write!(f, "Invalid {field}: {reason}")
            }
            ValidationError::SameColors => {
                write!(f, "busy_color and idle_color must be different")
            }
            ValidationError::ZeroInterval => write!(f, "poll_interval_ms must be greater than 0"),
            ValidationError::ZeroTimeout => write!(f, "http_timeout_secs must be greater than 0"),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    NotFound(PathBuf),
    IsDirectory(PathBuf),
    Io(std::io::Error),
    Parse(toml::de::Error),
    Invalid(Vec<ValidationError>),
    /// The platform has no config directory and no `--config` was given.
    NoConfigDir,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::NotFound(path) => {
                write!(f, "no configuration file was found at {}", path.display())
            }
            ConfigError::IsDirectory(path) => write!(f, "{} is a directory", path.display()),
            ConfigError::Io(e) => write!(f, "Cannot read configuration: {e}"),
            ConfigError::Parse(e) => write!(f, "Invalid configuration file: {e}"),
            ConfigError::Invalid(errors) => {
                let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
                write!(f, "{}", messages.join("; "))
            }
            ConfigError::NoConfigDir => write!(f, "no configuration directory on this platform"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
            _ => None,
        }
    }
}

impl Config {
    /// Platform-specific config directory.
    pub fn dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("busylight-sync"))
    }

    /// Full path to config file.
    pub fn path() -> Option<PathBuf> {
        Self::dir().map(|d| d.join(CONFIG_FILE))
    }

    /// `explicit` if given, else the platform default path.
    pub fn resolve_path(explicit: Option<&Path>) -> Result<PathBuf, ConfigError> {
        match explicit {
            Some(path) => Ok(path.to_path_buf()),
            None => Self::path().ok_or(ConfigError::NoConfigDir),
        }
    }

    /// Parse the file at `path`. Does not validate.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if path.is_dir() {
            return Err(ConfigError::IsDirectory(path.to_path_buf()));
        }
        let contents = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ConfigError::NotFound(path.to_path_buf()),
            _ => ConfigError::Io(e),
        })?;
        toml::from_str(&contents).map_err(ConfigError::Parse)
    }

    /// Resolve, parse and validate. Returns the config and the path it came from.
    pub fn load(explicit: Option<&Path>) -> Result<(Self, PathBuf), ConfigError> {
        let path = Self::resolve_path(explicit)?;
        let config = Self::load_from(&path)?;
        config.validate().map_err(ConfigError::Invalid)?;
        log::debug!("[config] loaded {}", path.display());
        Ok((config, path))
    }

    /// Validate the entire config, collecting all errors.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.sources.is_empty() {
            errors.push(ValidationError::NoSources);
        }

        let empty = self.empty_source_names();
        if !empty.is_empty() {
            errors.push(ValidationError::EmptyCredentials(empty));
        }

        let busy = parse_color(&self.busy_color);
        let idle = parse_color(&self.idle_color);
        match (&busy, &idle) {
            (Ok(b), Ok(i)) if b == i => errors.push(ValidationError::SameColors),
            _ => {}
        }
        if let Err(e) = busy {
            errors.push(ValidationError::InvalidColor {
                field: "busy_color",
                reason: e.to_string(),
            });
        }
        if let Err(e) = idle {
            errors.push(ValidationError::InvalidColor {
                field: "idle_color",
                reason: e.to_string(),
            });
        }

        if self.poll_interval_ms == 0 {
            errors.push(ValidationError::ZeroInterval);
        }
        if self.http_timeout_secs == 0 {
            errors.push(ValidationError::ZeroTimeout);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Names of sources without credentials, in key order.
    pub fn empty_source_names(&self) -> Vec<String> {
        self.sources
            .iter()
            .filter(|(_, source)| source.is_empty())
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub fn busy_colors(&self) -> crate::error::Result<BusyColors> {
        Ok(BusyColors {
            busy: parse_color(&self.busy_color)?,
            idle: parse_color(&self.idle_color)?,
        })
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// Copy with every non-empty credential field replaced by `***`.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        for source in copy.sources.values_mut() {
            let auth = &mut source.basic_auth;
            if !auth.username.is_empty() {
                auth.username = "***".into();
            }
            if !auth.password.is_empty() {
                auth.password = "***".into();
            }
        }
        copy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;

    fn with_sources(sources: &[(&str, SourceConfig)]) -> Config {
        Config {
            sources: sources
                .iter()
                .map(|(name, cfg)| (name.to_string(), cfg.clone()))
                .collect(),
            ..Config::default()
        }
    }

    fn filled() -> SourceConfig {
        SourceConfig::basic_auth("foobar", "spameggs")
    }

    // ── Defaults ──

    #[test]
    fn defaults() {
        let c = Config::default();
        assert_eq!(c.busy_color, "#FF0000");
        assert_eq!(c.idle_color, "#00FF00");
        assert_eq!(c.poll_interval(), Duration::from_secs(1));
        assert_eq!(c.http_timeout(), Duration::from_secs(10));
        assert_eq!(c.devices, vec!["luxafor-flag"]);
        assert!(c.sources.is_empty());
    }

    #[test]
    fn empty_toml_gives_defaults() {
        let c: Config = toml::from_str("").unwrap();
        assert_eq!(c, Config::default());
    }

    #[test]
    fn parses_sources_table() {
        let toml_str = r#"
            busy_color = "orange"
            devices = ["virtual"]

            [sources.toggl.basic_auth]
            username = "0123456789abcdef"
            password = "api_token"

            [sources.fake]
            base_url = "http://127.0.0.1:9999/api"
            basic_auth = { username = "u", password = "p" }
        "#;
        let c: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(c.busy_color, "orange");
        assert_eq!(c.idle_color, "#00FF00");
        assert_eq!(c.devices, vec!["virtual"]);
        assert_eq!(c.sources.keys().collect::<Vec<_>>(), vec!["fake", "toggl"]);
        assert_eq!(c.sources["toggl"].basic_auth.password, "api_token");
        assert_eq!(
            c.sources["fake"].base_url.as_deref(),
            Some("http://127.0.0.1:9999/api")
        );
    }

    #[test]
    fn wrong_type_is_parse_error() {
        let result: Result<Config, _> = toml::from_str("poll_interval_ms = \"fast\"");
        assert!(result.is_err());
    }

    #[test]
    fn config_path_ends_with_toml() {
        if let Some(path) = Config::path() {
            assert!(path.ends_with("busylight-sync/config.toml"));
        }
    }

    // ── Credentials ──

    #[test]
    fn source_credential_presence() {
        assert!(SourceConfig::default().is_empty());
        assert!(SourceConfig::default().credential().is_none());
        assert!(!SourceConfig::basic_auth("foobar", "").is_empty());
        assert_eq!(
            filled().credential(),
            Some(Credential::BasicAuth(BasicAuth::new("foobar", "spameggs")))
        );
    }

    // ── Validation ──

    #[test]
    fn validate_no_sources() {
        let errors = Config::default().validate().unwrap_err();
        assert_eq!(errors, vec![ValidationError::NoSources]);
        assert_eq!(errors[0].to_string(), "no app in configuration file");
    }

    #[test]
    fn validate_filled_sources_ok() {
        assert!(with_sources(&[("foo", filled())]).validate().is_ok());
        assert!(
            with_sources(&[("foo", filled()), ("bar", filled())])
                .validate()
                .is_ok()
        );
    }

    #[test]
    fn validate_one_empty_source() {
        let errors = with_sources(&[("foo", SourceConfig::default())])
            .validate()
            .unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].to_string(), "foo configuration is empty");
    }

    #[test]
    fn validate_two_empty_sources_sorted() {
        let errors = with_sources(&[
            ("foo", SourceConfig::default()),
            ("bar", SourceConfig::default()),
        ])
        .validate()
        .unwrap_err();
        assert_eq!(errors[0].to_string(), "bar, foo configurations are empty");
    }

    #[test]
    fn validate_one_of_two_empty() {
        let errors = with_sources(&[("foo", filled()), ("bar", SourceConfig::default())])
            .validate()
            .unwrap_err();
        assert_eq!(errors[0].to_string(), "bar configuration is empty");
    }

    #[test]
    fn validate_invalid_color() {
        let mut c = with_sources(&[("foo", filled())]);
        c.idle_color = "not-a-color".into();
        let errors = c.validate().unwrap_err();
        assert!(matches!(
            &errors[0],
            ValidationError::InvalidColor { field: "idle_color", .. }
        ));
    }

    #[test]
    fn validate_same_colors_after_parsing() {
        let mut c = with_sources(&[("foo", filled())]);
        c.busy_color = "red".into();
        c.idle_color = "#ff0000".into();
        assert_eq!(c.validate().unwrap_err(), vec![ValidationError::SameColors]);
    }

    #[test]
    fn validate_collects_multiple_errors() {
        let c = Config {
            busy_color: "nope".into(),
            poll_interval_ms: 0,
            http_timeout_secs: 0,
            ..Config::default()
        };
        let errors = c.validate().unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.contains(&ValidationError::NoSources));
        assert!(errors.contains(&ValidationError::ZeroInterval));
        assert!(errors.contains(&ValidationError::ZeroTimeout));
    }

    #[test]
    fn busy_colors_parsed() {
        let c = Config::default();
        let colors = c.busy_colors().unwrap();
        assert_eq!(colors.busy, Color::RED);
        assert_eq!(colors.idle, Color::GREEN);
    }

    #[test]
    fn redacted_hides_credentials() {
        let c = with_sources(&[("foo", filled()), ("bar", SourceConfig::basic_auth("", "x"))]);
        let r = c.redacted();
        assert_eq!(r.sources["foo"].basic_auth, BasicAuth::new("***", "***"));
        assert_eq!(r.sources["bar"].basic_auth, BasicAuth::new("", "***"));
        assert_eq!(c.sources["foo"].basic_auth.password, "spameggs");
    }

    // ── Loading ──

    #[test]
    fn load_from_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
        assert!(
            err.to_string()
                .starts_with("no configuration file was found")
        );
    }

    #[test]
    fn load_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load_from(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::IsDirectory(_)));
        assert_eq!(err.to_string(), format!("{} is a directory", dir.path().display()));
    }

    #[test]
    fn load_from_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "this is { not valid toml").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn load_validates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[sources.foo]\n").unwrap();
        let err = Config::load(Some(&path)).unwrap_err();
        assert_eq!(err.to_string(), "foo configuration is empty");
    }

    #[test]
    fn load_valid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[sources.toggl.basic_auth]\nusername = \"tok\"\npassword = \"api_token\"\n",
        )
        .unwrap();
        let (config, loaded_from) = Config::load(Some(&path)).unwrap();
        assert_eq!(loaded_from, path);
        assert_eq!(config.sources.len(), 1);
    }
}
