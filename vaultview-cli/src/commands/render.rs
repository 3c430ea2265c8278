//! Render a single file, or show its frontmatter.

use super::load_config;
use anyhow::{Context, Result};
use std::path::Path;
use vaultview_core::{Document, DocumentPipeline};

/// Run the full pipeline on one file and print HTML (or JSON).
pub fn render_file(config_path: &Path, file: &Path, json: bool) -> Result<()> {
    let config = load_config(config_path)?;
    let pipeline = DocumentPipeline::from_config(&config);

    let rendered = pipeline
        .render_file(file)
        .with_context(|| format!("Failed to render {}", file.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&rendered)?);
    } else {
        print!("{}", rendered.html);
    }

    Ok(())
}

/// Print the frontmatter mapping of a file as JSON.
pub fn show_frontmatter(file: &Path) -> Result<()> {
    let raw = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let document = Document::parse(raw);
    println!("{}", serde_json::to_string_pretty(&document.frontmatter)?);
    Ok(())
}
