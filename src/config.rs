//! Configuration management for watch-process.
//!
//! This module handles loading, merging, and validating configuration from files
//! and CLI arguments. It supports YAML, JSON, and TOML formats.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::cli::{Args, ConfigFormat};
use crate::platform::Platform;
use crate::types::{TypeError, TypeMap, DEFAULT_TYPES};

// Default configuration constants
pub const DEFAULT_INTERVAL_SECS: u64 = 5;
pub const DEFAULT_HOSTNAME_COMMAND: &str = "hostname";

/// Locations probed when no config file is given.
const DEFAULT_CONFIG_PATHS: &[&str] = &[
    "/etc/watch-process/watch-process.yaml",
    "/etc/watch-process/watch-process.yml",
    "/etc/watch-process/watch-process.json",
    "/etc/watch-process/watch-process.toml",
    "./watch-process.yaml",
    "./watch-process.yml",
    "./watch-process.json",
    "./watch-process.toml",
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("'tag' parameter is required")]
    MissingTag,

    #[error("'{0}' must be greater than zero")]
    ZeroDuration(&'static str),

    #[error("'keys' must not be empty")]
    EmptyKeys,

    #[error("invalid duration '{value}': {reason}")]
    InvalidDuration { value: String, reason: String },

    #[error("invalid types: {0}")]
    Types(#[from] TypeError),

    #[error("hostname command '{command}' failed: {reason}")]
    Hostname { command: String, reason: String },

    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Duration that reads either a number of seconds or a humantime string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigDuration(pub Duration);

impl ConfigDuration {
    pub fn from_secs(secs: u64) -> Self {
        Self(Duration::from_secs(secs))
    }

    /// Parses `"5s"`, `"1m 30s"` or a bare number of seconds.
    pub fn parse(value: &str) -> Result<Self, ConfigError> {
        let value = value.trim();
        if let Ok(secs) = value.parse::<f64>() {
            return Self::from_secs_f64(secs).ok_or_else(|| ConfigError::InvalidDuration {
                value: value.to_string(),
                reason: "must be a finite, non-negative number of seconds".into(),
            });
        }
        humantime::parse_duration(value)
            .map(Self)
            .map_err(|e| ConfigError::InvalidDuration {
                value: value.to_string(),
                reason: e.to_string(),
            })
    }

    fn from_secs_f64(secs: f64) -> Option<Self> {
        Duration::try_from_secs_f64(secs).ok().map(Self)
    }
}

impl Serialize for ConfigDuration {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&humantime::format_duration(self.0).to_string())
    }
}

impl<'de> Deserialize<'de> for ConfigDuration {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Secs(u64),
            Float(f64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Secs(secs) => Ok(Self::from_secs(secs)),
            Raw::Float(secs) => Self::from_secs_f64(secs)
                .ok_or_else(|| D::Error::custom("duration must be a non-negative number")),
            Raw::Text(text) => Self::parse(&text).map_err(D::Error::custom),
        }
    }
}

/// Sampler configuration. Loaded once at startup and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Tag attached to every record. Required.
    pub tag: Option<String>,

    /// Listing command override, used verbatim.
    pub command: Option<String>,

    /// Field names for the listing columns, in order.
    pub keys: Option<Vec<String>>,

    pub interval: Option<ConfigDuration>,

    /// Upper bound for one tick; defaults to the interval.
    pub timeout: Option<ConfigDuration>,

    /// Allow-list of user names. Absent or empty disables filtering.
    #[serde(alias = "lookup-user")]
    pub lookup_user: Option<Vec<String>>,

    #[serde(alias = "hostname-command")]
    pub hostname_command: Option<String>,

    /// Field type declarations (`name:type,...`).
    pub types: Option<String>,

    /// Listing layout; detected from the running OS when absent.
    pub platform: Option<Platform>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tag: None,
            command: None,
            keys: None,
            interval: Some(ConfigDuration::from_secs(DEFAULT_INTERVAL_SECS)),
            timeout: None,
            lookup_user: None,
            hostname_command: Some(DEFAULT_HOSTNAME_COMMAND.to_string()),
            types: Some(DEFAULT_TYPES.to_string()),
            platform: None,
        }
    }
}

impl Config {
    pub fn effective_platform(&self) -> Platform {
        self.platform.unwrap_or_else(Platform::detect)
    }

    pub fn effective_keys(&self, platform: Platform) -> Vec<String> {
        self.keys
            .clone()
            .unwrap_or_else(|| platform.default_keys())
    }

    pub fn interval(&self) -> Duration {
        self.interval
            .map(|d| d.0)
            .unwrap_or(Duration::from_secs(DEFAULT_INTERVAL_SECS))
    }

    pub fn timeout(&self) -> Duration {
        self.timeout.map(|d| d.0).unwrap_or_else(|| self.interval())
    }

    /// The user allow-list, `None` when filtering is disabled.
    pub fn lookup_user(&self) -> Option<Vec<String>> {
        self.lookup_user.clone().filter(|users| !users.is_empty())
    }

    pub fn hostname_command(&self) -> &str {
        self.hostname_command
            .as_deref()
            .unwrap_or(DEFAULT_HOSTNAME_COMMAND)
    }

    pub fn type_map(&self) -> Result<TypeMap, TypeError> {
        TypeMap::parse(self.types.as_deref().unwrap_or(DEFAULT_TYPES))
    }
}

/// Validate effective config (used by --check-config and at startup)
pub fn validate_effective_config(cfg: &Config) -> Result<(), ConfigError> {
    match cfg.tag.as_deref() {
        Some(tag) if !tag.trim().is_empty() => {}
        _ => return Err(ConfigError::MissingTag),
    }

    if cfg.interval().is_zero() {
        return Err(ConfigError::ZeroDuration("interval"));
    }
    if cfg.timeout().is_zero() {
        return Err(ConfigError::ZeroDuration("timeout"));
    }

    if cfg.keys.as_ref().is_some_and(|keys| keys.is_empty()) {
        return Err(ConfigError::EmptyKeys);
    }

    cfg.type_map()?;

    Ok(())
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Resolves configuration from CLI args, config file, and defaults.
/// This enforces precedence: CLI (if provided) > config file > default.
pub fn resolve_config(args: &Args) -> Result<Config, ConfigError> {
    let mut config = if args.no_config {
        Config::default()
    } else {
        load_config(args.config.as_deref())?
    };

    if let Some(tag) = &args.tag {
        config.tag = Some(tag.clone());
    }
    if let Some(command) = &args.ps_command {
        config.command = Some(command.clone());
    }
    if let Some(keys) = &args.keys {
        config.keys = Some(split_list(keys));
    }
    if let Some(interval) = &args.interval {
        config.interval = Some(ConfigDuration::parse(interval)?);
    }
    if let Some(timeout) = &args.timeout {
        config.timeout = Some(ConfigDuration::parse(timeout)?);
    }
    if let Some(users) = &args.lookup_user {
        config.lookup_user = Some(split_list(users));
    }
    if let Some(hostname_command) = &args.hostname_command {
        config.hostname_command = Some(hostname_command.clone());
    }
    if let Some(types) = &args.types {
        config.types = Some(types.clone());
    }
    if let Some(platform) = args.platform {
        config.platform = Some(platform.into());
    }

    Ok(config)
}

/// Loads a config file, falling back to the default locations and then to
/// built-in defaults.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => match DEFAULT_CONFIG_PATHS.iter().find(|p| Path::new(p).exists()) {
            Some(p) => PathBuf::from(p),
            None => return Ok(Config::default()),
        },
    };

    let content = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
        path: path.clone(),
        source,
    })?;

    let parse_error = |message: String| ConfigError::Parse {
        path: path.clone(),
        message,
    };

    let loaded: Config = match path.extension().and_then(|s| s.to_str()) {
        Some("json") => serde_json::from_str(&content).map_err(|e| parse_error(e.to_string()))?,
        Some("toml") => toml::from_str(&content).map_err(|e| parse_error(e.to_string()))?,
        // Default to YAML
        _ => serde_yaml::from_str(&content).map_err(|e| parse_error(e.to_string()))?,
    };
    info!("Loaded configuration from: {}", path.display());

    Ok(merge_defaults(loaded))
}

/// Fills fields a config file left out with the built-in defaults.
fn merge_defaults(loaded: Config) -> Config {
    let defaults = Config::default();
    Config {
        interval: loaded.interval.or(defaults.interval),
        hostname_command: loaded.hostname_command.or(defaults.hostname_command),
        types: loaded.types.or(defaults.types),
        ..loaded
    }
}

/// Serializes the configuration in the requested format.
pub fn render_config(config: &Config, format: &ConfigFormat) -> anyhow::Result<String> {
    let output = match format {
        ConfigFormat::Json => serde_json::to_string_pretty(config)?,
        ConfigFormat::Toml => toml::to_string_pretty(config)?,
        ConfigFormat::Yaml => serde_yaml::to_string(config)?,
    };
    Ok(output)
}

/// Shows configuration in requested format
pub fn show_config(config: &Config, format: &ConfigFormat) -> anyhow::Result<()> {
    println!("{}", render_config(config, format)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> Config {
        Config {
            tag: Some("ps.host".into()),
            ..Config::default()
        }
    }

    #[test]
    fn test_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.interval(), Duration::from_secs(5));
        assert_eq!(cfg.timeout(), Duration::from_secs(5));
        assert_eq!(cfg.hostname_command(), "hostname");
        assert!(cfg.lookup_user().is_none());
        assert_eq!(cfg.type_map().unwrap().len(), 6);
    }

    #[test]
    fn test_missing_tag_is_rejected() {
        let err = validate_effective_config(&Config::default()).unwrap_err();
        assert!(matches!(err, ConfigError::MissingTag));

        let blank = Config {
            tag: Some("  ".into()),
            ..Config::default()
        };
        assert!(matches!(
            validate_effective_config(&blank),
            Err(ConfigError::MissingTag)
        ));
        assert!(validate_effective_config(&valid()).is_ok());
    }

    #[test]
    fn test_zero_interval_and_empty_keys_are_rejected() {
        let cfg = Config {
            interval: Some(ConfigDuration::from_secs(0)),
            ..valid()
        };
        assert!(matches!(
            validate_effective_config(&cfg),
            Err(ConfigError::ZeroDuration("interval"))
        ));

        let cfg = Config {
            keys: Some(vec![]),
            ..valid()
        };
        assert!(matches!(
            validate_effective_config(&cfg),
            Err(ConfigError::EmptyKeys)
        ));
    }

    #[test]
    fn test_bad_types_are_rejected() {
        let cfg = Config {
            types: Some("pid:number".into()),
            ..valid()
        };
        assert!(matches!(
            validate_effective_config(&cfg),
            Err(ConfigError::Types(_))
        ));
    }

    #[test]
    fn test_empty_lookup_user_disables_filtering() {
        let cfg = Config {
            lookup_user: Some(vec![]),
            ..valid()
        };
        assert!(cfg.lookup_user().is_none());
    }

    #[test]
    fn test_config_duration_parse() {
        assert_eq!(ConfigDuration::parse("5s").unwrap().0, Duration::from_secs(5));
        assert_eq!(ConfigDuration::parse("1m 30s").unwrap().0, Duration::from_secs(90));
        assert_eq!(ConfigDuration::parse("10").unwrap().0, Duration::from_secs(10));
        assert_eq!(
            ConfigDuration::parse("0.5").unwrap().0,
            Duration::from_millis(500)
        );
        assert!(ConfigDuration::parse("soon").is_err());
        assert!(ConfigDuration::parse("-1").is_err());
    }

    #[test]
    fn test_config_duration_deserialize_forms() {
        let cfg: Config = serde_yaml::from_str("tag: a\ninterval: 10\ntimeout: 2s\n").unwrap();
        assert_eq!(cfg.interval(), Duration::from_secs(10));
        assert_eq!(cfg.timeout(), Duration::from_secs(2));
    }

    #[test]
    fn test_resolve_config_cli_overrides() {
        let args = Args {
            no_config: true,
            tag: Some("ps.${hostname}".into()),
            keys: Some("user, pid ,command".into()),
            interval: Some("2s".into()),
            lookup_user: Some("alice,bob".into()),
            platform: Some(crate::cli::PlatformArg::Mac),
            ..Args::default()
        };
        let cfg = resolve_config(&args).unwrap();
        assert_eq!(cfg.tag.as_deref(), Some("ps.${hostname}"));
        assert_eq!(
            cfg.keys,
            Some(vec!["user".to_string(), "pid".to_string(), "command".to_string()])
        );
        assert_eq!(cfg.interval(), Duration::from_secs(2));
        assert_eq!(cfg.lookup_user(), Some(vec!["alice".into(), "bob".into()]));
        assert_eq!(cfg.effective_platform(), Platform::Mac);
    }

    #[test]
    fn test_render_config_formats() {
        let cfg = valid();
        for format in [ConfigFormat::Yaml, ConfigFormat::Json, ConfigFormat::Toml] {
            let out = render_config(&cfg, &format).unwrap();
            assert!(out.contains("ps.host"), "{format:?}: {out}");
            assert!(out.contains("5s"), "{format:?}: {out}");
        }
    }
}
