use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::clean::roles::DEFAULT_PANELIST_PATTERNS;
use crate::clean::PanelistMatcher;
use crate::ingest::webinar::DEFAULT_TOPIC_PREFIX;
use crate::ingest::CleanOptions;
use crate::report::DateFormat;

/// Top-level zoomclean config file structure. Every key is optional.
#[derive(Debug, Deserialize, Serialize, Default, Clone, PartialEq)]
pub struct CleanerConfig {
    pub panelist_patterns: Option<String>,
    pub topic_prefix: Option<String>,
    pub date_format: Option<DateFormat>,
    pub bom: Option<bool>,
    pub strict_dates: Option<bool>,
}

impl CleanerConfig {
    /// Load config from `path`. Returns default if the file doesn't exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(CleanerConfig::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

/// Command-line overrides; `None` falls through to env, file, then default.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub exclude: Option<String>,
    pub date_format: Option<String>,
    pub no_bom: bool,
    pub strict_dates: bool,
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub panelist_patterns: String,
    pub topic_prefix: String,
    pub date_format: DateFormat,
    pub bom: bool,
    pub strict_dates: bool,
}

impl Settings {
    /// Resolve each setting through the chain: CLI flag > env var > config file > default.
    pub fn resolve(overrides: &Overrides, config: &CleanerConfig) -> Result<Self> {
        let panelist_patterns = resolve_list_setting(
            overrides.exclude.as_deref(),
            "ZOOMCLEAN_EXCLUDE",
            config.panelist_patterns.as_deref(),
        )
        .unwrap_or_else(|| DEFAULT_PANELIST_PATTERNS.to_string());

        let date_format = match resolve_setting(
            overrides.date_format.as_deref(),
            "ZOOMCLEAN_DATE_FORMAT",
            None,
        ) {
            Some(s) => DateFormat::from_str(&s)
                .with_context(|| format!("Unknown date format: {s}. Use: iso, day-first"))?,
            None => config.date_format.unwrap_or_default(),
        };

        Ok(Settings {
            panelist_patterns,
            topic_prefix: config
                .topic_prefix
                .clone()
                .unwrap_or_else(|| DEFAULT_TOPIC_PREFIX.to_string()),
            date_format,
            bom: !overrides.no_bom && config.bom.unwrap_or(true),
            strict_dates: overrides.strict_dates || config.strict_dates.unwrap_or(false),
        })
    }

    pub fn clean_options(&self) -> Result<CleanOptions> {
        let panelists = PanelistMatcher::parse(&self.panelist_patterns)
            .with_context(|| format!("Invalid panelist patterns: {}", self.panelist_patterns))?;
        Ok(CleanOptions {
            panelists,
            topic_prefix: self.topic_prefix.clone(),
            strict_dates: self.strict_dates,
        })
    }

    /// Display effective settings, one `key = value` per line.
    pub fn display(&self) -> String {
        [
            format!("panelist_patterns = \"{}\"", self.panelist_patterns),
            format!("topic_prefix = \"{}\"", self.topic_prefix),
            format!("date_format = \"{}\"", self.date_format.as_str()),
            format!("bom = {}", self.bom),
            format!("strict_dates = {}", self.strict_dates),
        ]
        .join("\n")
    }
}

/// First non-empty value of: CLI flag, environment variable, config entry.
fn resolve_setting(cli_flag: Option<&str>, env_var_name: &str, config: Option<&str>) -> Option<String> {
    // 1. CLI flag
    if let Some(v) = cli_flag {
        if !v.trim().is_empty() {
            return Some(v.to_string());
        }
    }

    // 2. Environment variable
    if let Ok(val) = std::env::var(env_var_name) {
        if !val.trim().is_empty() {
            return Some(val);
        }
    }

    // 3. Config file
    config.filter(|v| !v.trim().is_empty()).map(str::to_string)
}

/// First value that is set at all. An empty list means "nobody" and stops the chain.
fn resolve_list_setting(cli_flag: Option<&str>, env_var_name: &str, config: Option<&str>) -> Option<String> {
    cli_flag
        .map(str::to_string)
        .or_else(|| std::env::var(env_var_name).ok())
        .or_else(|| config.map(str::to_string))
}

/// Path to the config file: ~/.zoomclean/config.toml
pub fn default_config_path() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".zoomclean").join("config.toml"))
}

/// Default config template content.
pub fn default_config_template() -> &'static str {
    r#"# ~/.zoomclean/config.toml
# Resolution order: CLI flag > env var > this file > built-in default

# Meeting participants whose name contains any of these (case-insensitive)
# are counted as panelists. An empty string counts everyone as an attendee.
# Env: ZOOMCLEAN_EXCLUDE
# panelist_patterns = "admin, iblooming, interpreter, host"

# Stripped from the start of webinar topics.
# topic_prefix = "iBlooming: "

# "iso" (YYYY-MM-DD) or "day-first" (DD/MM/YYYY). Env: ZOOMCLEAN_DATE_FORMAT
# date_format = "iso"

# Write a UTF-8 byte-order mark so spreadsheets detect the encoding.
# bom = true

# Reject files whose session date cannot be parsed instead of keeping them
# with an empty date.
# strict_dates = false
"#
}

/// Create the default config file if it doesn't already exist.
pub fn init_config(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    std::fs::write(path, default_config_template())?;
    Ok(true)
}
