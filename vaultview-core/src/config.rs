//! Configuration parsing and management.

use crate::images::SearchLimits;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    ParseError(#[from] serde_yaml::Error),
}

/// Main configuration struct matching the vaultview.yml schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default = "default_static_url_prefix")]
    pub static_url_prefix: String,

    #[serde(default)]
    pub markdown: MarkdownConfig,

    #[serde(default)]
    pub images: SearchLimits,

    // Internal: path to config file (for relative path resolution)
    #[serde(skip)]
    config_path: Option<PathBuf>,
}

fn default_static_url_prefix() -> String {
    String::from("/static/")
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_content")]
    pub content: PathBuf,

    #[serde(rename = "static", default = "default_static")]
    pub static_dir: PathBuf,
}

fn default_content() -> PathBuf {
    PathBuf::from("content")
}

fn default_static() -> PathBuf {
    PathBuf::from("static")
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            content: default_content(),
            static_dir: default_static(),
        }
    }
}

/// Renderer switches
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkdownConfig {
    /// Soft line breaks render as `<br />`
    #[serde(default = "default_true")]
    pub hard_breaks: bool,

    /// Syntax highlight fenced code that names a language; off keeps the
    /// plain `<pre><code class="language-x">` block
    #[serde(default)]
    pub highlight_code: bool,
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self {
            hard_breaks: true,
            highlight_code: false,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::from_yaml(&contents)?;

        // Store config file path for relative path resolution
        config.config_path = Some(path.to_path_buf());

        Ok(config)
    }

    /// Parse configuration from YAML text; an empty document is all defaults
    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(contents)?)
    }

    /// Get the content directory, resolved relative to config file
    pub fn content_dir(&self) -> PathBuf {
        self.resolve_path(&self.paths.content)
    }

    /// Get the static asset directory, resolved relative to config file
    pub fn static_dir(&self) -> PathBuf {
        self.resolve_path(&self.paths.static_dir)
    }

    /// Normalized URL prefix for resolved images ("/static/" style)
    pub fn normalized_static_url_prefix(&self) -> String {
        normalize_url_prefix(&self.static_url_prefix)
    }

    /// Path of the file this config was loaded from, if any
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// Resolve a path relative to the config file location
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            return path.to_path_buf();
        }
        match self.config_path.as_deref().and_then(Path::parent) {
            Some(parent) => parent.join(path),
            None => path.to_path_buf(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            paths: PathsConfig::default(),
            static_url_prefix: default_static_url_prefix(),
            markdown: MarkdownConfig::default(),
            images: SearchLimits::default(),
            config_path: None,
        }
    }
}

/// Ensure URL prefixes have a leading and trailing slash
pub fn normalize_url_prefix(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return "/".to_string();
    }

    let mut s = trimmed.to_string();
    if !s.starts_with('/') {
        s.insert(0, '/');
    }
    if !s.ends_with('/') {
        s.push('/');
    }

    while s.contains("//") {
        s = s.replace("//", "/");
    }
    s
}
