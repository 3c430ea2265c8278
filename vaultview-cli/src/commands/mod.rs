//! CLI command implementations.

pub mod index;
pub mod render;

pub use index::{file_tree, index_vault};
pub use render::{render_file, show_frontmatter};

use anyhow::{Context, Result};
use std::path::Path;
use vaultview_core::Config;

/// Load the config file, or fall back to defaults relative to the current
/// directory when it does not exist.
pub fn load_config(config_path: &Path) -> Result<Config> {
    if !config_path.exists() {
        tracing::debug!(
            "{} not found, using default configuration",
            config_path.display()
        );
        return Ok(Config::default());
    }
    Config::from_file(config_path)
        .with_context(|| format!("Failed to load configuration from {}", config_path.display()))
}
