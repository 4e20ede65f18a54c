//! TOML configuration parsing and validation.
//!
//! ```toml
//! [source]
//! kind = "sqlite"          # sqlite | file | http
//! timeout_secs = 10
//!
//! [source.sqlite]
//! path = "./data/catalog.sqlite"
//!
//! [matching]
//! fuzzy_threshold = 70.0
//!
//! [classification]
//! multiplier = 1.5
//! ```
//!
//! `[matching]` and `[classification]` are optional; omitted keys take the
//! engine defaults.

use anyhow::{bail, Context, Result};
use ecomatch_core::{ClassificationPolicy, EngineSettings, MatchPolicy};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub source: SourceConfig,
    #[serde(default)]
    pub matching: MatchPolicy,
    #[serde(default)]
    pub classification: ClassificationPolicy,
}

/// Which catalog backend feeds the engine.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Sqlite,
    File,
    Http,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Sqlite => "sqlite",
            SourceKind::File => "file",
            SourceKind::Http => "http",
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SourceConfig {
    #[serde(default = "default_kind")]
    pub kind: SourceKind,
    /// Upper bound on one catalog fetch.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    pub sqlite: Option<SqliteSourceConfig>,
    pub file: Option<FileSourceConfig>,
    pub http: Option<HttpSourceConfig>,
}

fn default_kind() -> SourceKind {
    SourceKind::Sqlite
}
fn default_timeout_secs() -> u64 {
    10
}

impl SourceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SqliteSourceConfig {
    pub path: PathBuf,
}

/// A JSON / JSON Lines file, or a directory of them.
#[derive(Debug, Deserialize, Clone)]
pub struct FileSourceConfig {
    pub path: PathBuf,
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
}

fn default_include_globs() -> Vec<String> {
    vec!["**/*.json".to_string(), "**/*.jsonl".to_string()]
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpSourceConfig {
    /// Product listing endpoint.
    pub url: String,
    /// Environment variable holding a bearer token, if the endpoint needs one.
    #[serde(default)]
    pub token_env: Option<String>,
}

impl Config {
    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            matching: self.matching,
            classification: self.classification,
        }
    }

    /// SQLite database path; `init` and `import` need one regardless of `kind`.
    pub fn sqlite_path(&self) -> Result<&Path> {
        self.source
            .sqlite
            .as_ref()
            .map(|s| s.path.as_path())
            .ok_or_else(|| anyhow::anyhow!("[source.sqlite] is not configured"))
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_config(&content)
}

pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;

    // Validate source
    if config.source.timeout_secs == 0 {
        bail!("source.timeout_secs must be > 0");
    }
    let section_present = match config.source.kind {
        SourceKind::Sqlite => config.source.sqlite.is_some(),
        SourceKind::File => config.source.file.is_some(),
        SourceKind::Http => config.source.http.is_some(),
    };
    if !section_present {
        bail!(
            "source.kind is '{}' but [source.{}] is missing",
            config.source.kind.as_str(),
            config.source.kind.as_str()
        );
    }
    if let Some(http) = &config.source.http {
        if !(http.url.starts_with("http://") || http.url.starts_with("https://")) {
            bail!("source.http.url must start with http:// or https://");
        }
    }

    // Validate matching
    let m = &config.matching;
    for (key, value) in [
        ("fuzzy_threshold", m.fuzzy_threshold),
        ("keyword_threshold", m.keyword_threshold),
        ("name_threshold", m.name_threshold),
    ] {
        if !(0.0..=100.0).contains(&value) {
            bail!("matching.{} must be in [0, 100]", key);
        }
    }
    if !(0.0..=1.0).contains(&m.semantic_threshold) {
        bail!("matching.semantic_threshold must be in [0.0, 1.0]");
    }

    // Validate classification
    if !(config.classification.multiplier > 0.0) {
        bail!("classification.multiplier must be > 0");
    }
    if config.classification.min_threshold < 0.0 {
        bail!("classification.min_threshold must be >= 0");
    }

    Ok(config)
}
