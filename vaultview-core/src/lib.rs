//! # vaultview-core
//!
//! Core library for rendering an Obsidian vault as HTML.
//!
//! This crate provides the frontmatter splitter, the Obsidian markdown
//! extensions (admonitions, callouts, highlight marks, card links, image
//! embeds), the document pipeline that sequences them, and a metadata index
//! over a content directory.

pub mod config;
pub mod frontmatter;
pub mod images;
pub mod markdown;
pub mod models;
pub mod pipeline;
pub mod vault;

pub use config::{Config, ConfigError, MarkdownConfig};
pub use frontmatter::split_frontmatter;
pub use images::{ImageRef, ImageResolver, SearchLimits};
pub use markdown::MarkdownRenderer;
pub use models::{Document, DocumentSummary, FileTreeNode, Frontmatter, Visibility};
pub use pipeline::{render_document, DocumentPipeline, PipelineError, RenderedDocument};
pub use vault::{VaultError, VaultIndex};
