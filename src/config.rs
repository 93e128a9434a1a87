//! Configuration module for riggs-feed.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::{FeedError, Result};

/// File name of the feed when no path is configured.
pub const DEFAULT_FEED_FILE: &str = "feed.xml";

/// Query parameters stripped from links before they are used as identity.
pub const DEFAULT_TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "utm_id",
    "fbclid",
    "gclid",
    "igshid",
    "mc_cid",
    "mc_eid",
];

/// Feed storage and item policy.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    /// Path to the feed file. Relative paths resolve against the working
    /// directory. Unset means `feed.xml` beside the tool, see [`FeedConfig::resolve_path`].
    #[serde(default)]
    pub path: Option<String>,
    /// Maximum number of items kept in the feed.
    #[serde(default = "default_max_items")]
    pub max_items: usize,
    /// Query parameter keys removed during link canonicalization.
    #[serde(default = "default_tracking_params")]
    pub tracking_params: Vec<String>,
}

fn default_max_items() -> usize {
    50
}

fn default_tracking_params() -> Vec<String> {
    DEFAULT_TRACKING_PARAMS
        .iter()
        .map(|p| p.to_string())
        .collect()
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            path: None,
            max_items: default_max_items(),
            tracking_params: default_tracking_params(),
        }
    }
}

impl FeedConfig {
    /// Location of the feed file.
    ///
    /// A configured path is used as given. Without one, the feed lives one
    /// level above the directory holding the executable, so a tool installed
    /// as `site/bin/riggs-feed` writes `site/feed.xml`.
    pub fn resolve_path(&self) -> Result<PathBuf> {
        match &self.path {
            Some(path) => Ok(PathBuf::from(path)),
            None => Ok(feed_path_beside(&std::env::current_exe()?)),
        }
    }
}

fn feed_path_beside(exe: &Path) -> PathBuf {
    let bin_dir = exe.parent().unwrap_or_else(|| Path::new("."));
    bin_dir.parent().unwrap_or(bin_dir).join(DEFAULT_FEED_FILE)
}

/// Channel metadata used when the feed file is created or repaired.
#[derive(Debug, Clone, Deserialize)]
pub struct ChannelConfig {
    /// Channel title.
    #[serde(default = "default_channel_title")]
    pub title: String,
    /// Channel link.
    #[serde(default = "default_channel_link")]
    pub link: String,
    /// Channel description.
    #[serde(default = "default_channel_description")]
    pub description: String,
}

fn default_channel_title() -> String {
    "Riggs Autoposts".to_string()
}

fn default_channel_link() -> String {
    "https://4x4trailrunners.com/".to_string()
}

fn default_channel_description() -> String {
    "Automated feed from Riggs".to_string()
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            title: default_channel_title(),
            link: default_channel_link(),
            description: default_channel_description(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Optional log file; console output goes to stderr either way.
    #[serde(default)]
    pub file: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Feed configuration.
    #[serde(default)]
    pub feed: FeedConfig,
    /// Default channel metadata.
    #[serde(default)]
    pub channel: ChannelConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| FeedError::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file, or use defaults if the file does not exist.
    ///
    /// Environment overrides are applied in both cases.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = if path.as_ref().exists() {
            Self::load(path)?
        } else {
            Self::default()
        };
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| FeedError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `RIGGS_FEED_PATH`: Override the feed file path
    /// - `RIGGS_FEED_MAX_ITEMS`: Override the item cap
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(path) = std::env::var("RIGGS_FEED_PATH") {
            if !path.is_empty() {
                self.feed.path = Some(path);
            }
        }
        if let Ok(max_items) = std::env::var("RIGGS_FEED_MAX_ITEMS") {
            self.feed.max_items = max_items.parse().map_err(|_| {
                FeedError::Config(format!(
                    "RIGGS_FEED_MAX_ITEMS must be a positive integer, got {max_items:?}"
                ))
            })?;
        }
        Ok(())
    }

    /// Validate the configuration.
    ///
    /// Returns an error if:
    /// - `max_items` is zero
    /// - the feed path is empty
    pub fn validate(&self) -> Result<()> {
        if self.feed.max_items == 0 {
            return Err(FeedError::Config(
                "feed.max_items must be at least 1".to_string(),
            ));
        }
        if matches!(self.feed.path.as_deref(), Some(path) if path.trim().is_empty()) {
            return Err(FeedError::Config("feed.path must not be empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert!(config.feed.path.is_none());
        assert_eq!(config.feed.max_items, 50);
        assert_eq!(config.feed.tracking_params.len(), 11);
        assert!(config.feed.tracking_params.contains(&"fbclid".to_string()));

        assert_eq!(config.channel.title, "Riggs Autoposts");
        assert_eq!(config.channel.link, "https://4x4trailrunners.com/");
        assert_eq!(config.channel.description, "Automated feed from Riggs");

        assert_eq!(config.logging.level, "info");
        assert!(config.logging.file.is_none());
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[feed]
path = "public/feed.xml"
max_items = 20
tracking_params = ["utm_source", "ref"]

[channel]
title = "Trail Runners"
link = "https://example.com/"
description = "Trail reports"

[logging]
level = "debug"
file = "logs/riggs-feed.log"
"#;

        let config = Config::parse(toml).unwrap();

        assert_eq!(config.feed.path.as_deref(), Some("public/feed.xml"));
        assert_eq!(config.feed.max_items, 20);
        assert_eq!(config.feed.tracking_params, vec!["utm_source", "ref"]);

        assert_eq!(config.channel.title, "Trail Runners");
        assert_eq!(config.channel.link, "https://example.com/");
        assert_eq!(config.channel.description, "Trail reports");

        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.file.as_deref(), Some("logs/riggs-feed.log"));
    }

    #[test]
    fn test_parse_partial_config() {
        let toml = r#"
[feed]
max_items = 10
"#;

        let config = Config::parse(toml).unwrap();

        assert_eq!(config.feed.max_items, 10);
        assert!(config.feed.path.is_none());
        assert_eq!(config.feed.tracking_params.len(), 11);
        assert_eq!(config.channel.title, "Riggs Autoposts");
    }

    #[test]
    fn test_parse_empty_config() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.feed.max_items, 50);
    }

    #[test]
    fn test_parse_invalid_config() {
        let err = Config::parse("[feed\nmax_items = 1").unwrap_err();
        assert!(matches!(err, FeedError::Config(_)));
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("riggs-feed.toml");
        std::fs::write(&path, "[channel]\ntitle = \"From File\"\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.channel.title, "From File");
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = Config::load(dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err, FeedError::Config(_)));
    }

    #[test]
    fn test_validate_default() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_zero_max_items() {
        let mut config = Config::default();
        config.feed.max_items = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_empty_path() {
        let mut config = Config::default();
        config.feed.path = Some("  ".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_configured_path_used_as_given() {
        let feed = FeedConfig {
            path: Some("public/feed.xml".to_string()),
            ..FeedConfig::default()
        };
        assert_eq!(feed.resolve_path().unwrap(), PathBuf::from("public/feed.xml"));
    }

    #[test]
    fn test_default_path_beside_tool() {
        assert_eq!(
            feed_path_beside(Path::new("/srv/site/bin/riggs-feed")),
            PathBuf::from("/srv/site/feed.xml")
        );
        assert_eq!(
            feed_path_beside(Path::new("/riggs-feed")),
            PathBuf::from("/feed.xml")
        );
    }

    #[test]
    fn test_default_path_follows_executable() {
        let exe = std::env::current_exe().unwrap();
        let expected = exe.parent().unwrap().parent().unwrap().join("feed.xml");
        assert_eq!(FeedConfig::default().resolve_path().unwrap(), expected);
    }
}
