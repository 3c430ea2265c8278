//! Document processing pipeline.
//!
//! Flow: raw text → split frontmatter → normalize admonitions
//!       → resolve image embeds → parse + render
//!
//! The pipeline owns its image resolver; [`DocumentPipeline::reindex`] is the
//! one place its cache is invalidated.

use crate::config::Config;
use crate::frontmatter::split_frontmatter;
use crate::images::ImageResolver;
use crate::markdown::{AdmonitionNormalizer, MarkdownRenderer};
use crate::models::Frontmatter;
use crate::vault::{VaultError, VaultIndex};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Vault(#[from] VaultError),
}

/// Output of a single document render
#[derive(Debug, Clone, Serialize)]
pub struct RenderedDocument {
    pub frontmatter: Frontmatter,
    pub html: String,
}

/// The main document processing pipeline
pub struct DocumentPipeline {
    renderer: MarkdownRenderer,
    normalizer: AdmonitionNormalizer,
    images: Arc<ImageResolver>,
}

impl DocumentPipeline {
    pub fn new(renderer: MarkdownRenderer, images: Arc<ImageResolver>) -> Self {
        Self {
            renderer,
            normalizer: AdmonitionNormalizer::new(),
            images,
        }
    }

    /// Pipeline wired from configuration
    pub fn from_config(config: &Config) -> Self {
        let images = ImageResolver::with_limits(
            config.static_dir(),
            config.normalized_static_url_prefix(),
            config.images,
        );
        Self::new(
            MarkdownRenderer::with_options(config.markdown.clone()),
            Arc::new(images),
        )
    }

    pub fn images(&self) -> &Arc<ImageResolver> {
        &self.images
    }

    pub fn renderer(&self) -> &MarkdownRenderer {
        &self.renderer
    }

    /// Run every stage on raw file text. Never fails: irregular input
    /// degrades to literal output.
    pub fn render_document(&self, raw: &str) -> RenderedDocument {
        let (frontmatter, body) = split_frontmatter(raw);
        let html = self.render_body(body);
        RenderedDocument { frontmatter, html }
    }

    /// Stages after the frontmatter split
    pub fn render_body(&self, body: &str) -> String {
        let normalized = self.normalizer.normalize(body);
        let with_images = self.images.rewrite_embeds(&normalized);
        self.renderer.render(&with_images)
    }

    /// Read and render one file
    pub fn render_file(&self, path: &Path) -> Result<RenderedDocument, PipelineError> {
        let bytes = std::fs::read(path).map_err(|source| PipelineError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!("rendering {}", path.display());
        Ok(self.render_document(&String::from_utf8_lossy(&bytes)))
    }

    /// Rebuild the vault index and drop cached image resolutions together
    pub fn reindex(&self, content_dir: &Path) -> Result<VaultIndex, PipelineError> {
        let index = VaultIndex::scan(content_dir)?;
        self.images.invalidate();
        Ok(index)
    }
}

/// One-shot render of raw document text against a static asset root
pub fn render_document(raw: &str, static_root: &Path) -> String {
    let config = Config::default();
    let images = ImageResolver::with_limits(
        static_root,
        config.normalized_static_url_prefix(),
        config.images,
    );
    DocumentPipeline::new(MarkdownRenderer::new(), Arc::new(images))
        .render_document(raw)
        .html
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn pipeline(static_root: &Path) -> DocumentPipeline {
        DocumentPipeline::new(
            MarkdownRenderer::new(),
            Arc::new(ImageResolver::new(static_root, "/static/")),
        )
    }

    #[test]
    fn test_stage_order() {
        let assets = tempfile::tempdir().unwrap();
        fs::write(assets.path().join("pic.png"), b"x").unwrap();

        let raw = "---\ntitle: Doc\n---\n```ad-note\n![[pic.png|50]]\n```\n";
        let rendered = pipeline(assets.path()).render_document(raw);

        assert_eq!(rendered.frontmatter.title().as_deref(), Some("Doc"));
        assert!(rendered.html.contains("callout callout-note"));
        assert!(rendered
            .html
            .contains(r#"<img src="/static/pic.png" alt="pic.png" width="50" class="obsidian-image">"#));
        assert!(!rendered.html.contains("title: Doc"));
    }

    #[test]
    fn test_render_file_missing() {
        let assets = tempfile::tempdir().unwrap();
        let err = pipeline(assets.path())
            .render_file(Path::new("/no/such/file.md"))
            .unwrap_err();
        assert!(matches!(err, PipelineError::Read { .. }));
    }

    #[test]
    fn test_reindex_invalidates_image_cache() {
        let assets = tempfile::tempdir().unwrap();
        let content = tempfile::tempdir().unwrap();
        fs::write(assets.path().join("pic.png"), b"x").unwrap();
        fs::write(content.path().join("note.md"), "![[pic.png]]").unwrap();

        let pipeline = pipeline(assets.path());
        pipeline.render_document("![[pic.png]]");
        assert_eq!(pipeline.images().cached_len(), 1);

        let index = pipeline.reindex(content.path()).unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(pipeline.images().cached_len(), 0);
    }

    #[test]
    fn test_free_render_document() {
        let assets = tempfile::tempdir().unwrap();
        let html = render_document("==hi== ![[none.png]]", assets.path());
        assert_eq!(html, "<p><mark>hi</mark> ![[none.png]]</p>\n");
    }
}
