//! List the vault's documents and print its file tree.

use super::load_config;
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;
use vaultview_core::{DocumentPipeline, DocumentSummary, VaultIndex, Visibility};

#[derive(Serialize)]
struct IndexReport<'a> {
    root: String,
    count: usize,
    documents: Vec<&'a DocumentSummary>,
}

fn scan(config_path: &Path) -> Result<VaultIndex> {
    let config = load_config(config_path)?;
    let content_dir = config.content_dir();
    let pipeline = DocumentPipeline::from_config(&config);
    pipeline
        .reindex(&content_dir)
        .with_context(|| format!("Failed to index {}", content_dir.display()))
}

/// Scan the content directory and list documents, newest first.
pub fn index_vault(config_path: &Path, visibility: Visibility, json: bool) -> Result<()> {
    let index = scan(config_path)?;
    let documents = index.summaries(visibility);

    if json {
        let report = IndexReport {
            root: index.root().display().to_string(),
            count: documents.len(),
            documents,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{} document(s) in {}", documents.len(), index.root().display());
    for doc in documents {
        let modified = doc.modified.with_timezone(&chrono::Local);
        let marker = if doc.published { "public" } else { "private" };
        let tags = if doc.tags.is_empty() {
            String::new()
        } else {
            format!(" #{}", doc.tags.join(" #"))
        };
        println!(
            "{}  [{}]  {}  ({}){}",
            modified.format("%Y-%m-%d %H:%M"),
            marker,
            doc.title,
            doc.path,
            tags
        );
    }

    Ok(())
}

/// Print the nested file tree as JSON.
pub fn file_tree(config_path: &Path, visibility: Visibility) -> Result<()> {
    let index = scan(config_path)?;
    let tree = index.file_tree(visibility);
    println!("{}", serde_json::to_string_pretty(&tree)?);
    Ok(())
}
