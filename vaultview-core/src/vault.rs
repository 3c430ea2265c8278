//! Metadata index over a content directory of markdown files.

use crate::models::{Document, DocumentSummary, FileTreeNode, Visibility};
use chrono::{DateTime, Utc};
use regex::Regex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;
use walkdir::WalkDir;

const PREVIEW_CHARS: usize = 200;

#[derive(Error, Debug)]
pub enum VaultError {
    #[error("Content directory not found: {0}")]
    MissingDirectory(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to walk content directory: {0}")]
    Walk(#[from] walkdir::Error),
}

/// Summaries of every markdown file under a content directory
#[derive(Debug, Clone, Default)]
pub struct VaultIndex {
    root: PathBuf,
    documents: Vec<DocumentSummary>,
}

impl VaultIndex {
    /// Read every `.md` file under `content_dir`. Unreadable files are
    /// skipped with a warning.
    pub fn scan(content_dir: &Path) -> Result<Self, VaultError> {
        if !content_dir.is_dir() {
            return Err(VaultError::MissingDirectory(content_dir.to_path_buf()));
        }

        let mut documents = Vec::new();
        for entry in WalkDir::new(content_dir).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                // An unreadable root is fatal; anything deeper is skipped
                Err(e) if e.depth() == 0 => return Err(e.into()),
                Err(e) => {
                    tracing::warn!("skipping unreadable entry: {}", e);
                    continue;
                }
            };
            if !entry.file_type().is_file() || !is_markdown(entry.path()) {
                continue;
            }

            match summarize(content_dir, entry.path()) {
                Ok(summary) => documents.push(summary),
                Err(e) => tracing::warn!("skipping {}: {}", entry.path().display(), e),
            }
        }

        // Newest first; path keeps equal timestamps in a stable order
        documents.sort_by(|a, b| b.modified.cmp(&a.modified).then_with(|| a.path.cmp(&b.path)));

        tracing::info!(
            "indexed {} document(s) in {}",
            documents.len(),
            content_dir.display()
        );

        Ok(Self {
            root: content_dir.to_path_buf(),
            documents,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Documents admitted by `visibility`, newest first
    pub fn summaries(&self, visibility: Visibility) -> Vec<&DocumentSummary> {
        self.documents
            .iter()
            .filter(|doc| visibility.admits(doc.published))
            .collect()
    }

    /// Look up a document by its relative path
    pub fn get(&self, path: &str) -> Option<&DocumentSummary> {
        self.documents.iter().find(|doc| doc.path == path)
    }

    /// Nested directory tree of the admitted documents. Directories with no
    /// admitted documents do not appear.
    pub fn file_tree(&self, visibility: Visibility) -> Vec<FileTreeNode> {
        let mut root = TreeBuilder::default();
        for doc in self.summaries(visibility) {
            let mut parts: Vec<&str> = doc.path.split('/').collect();
            parts.pop();

            let mut level = &mut root;
            for part in parts {
                level = level.dirs.entry(part.to_string()).or_default();
            }
            level.files.push(FileTreeNode::File {
                name: doc.name.clone(),
                title: doc.title.clone(),
                path: doc.path.clone(),
            });
        }

        let mut tree = root.into_nodes();
        FileTreeNode::sort_recursive(&mut tree);
        tree
    }
}

#[derive(Default)]
struct TreeBuilder {
    dirs: BTreeMap<String, TreeBuilder>,
    files: Vec<FileTreeNode>,
}

impl TreeBuilder {
    fn into_nodes(self) -> Vec<FileTreeNode> {
        let mut nodes: Vec<FileTreeNode> = self
            .dirs
            .into_iter()
            .map(|(name, dir)| FileTreeNode::Directory {
                name,
                children: dir.into_nodes(),
            })
            .collect();
        nodes.extend(self.files);
        nodes
    }
}

fn is_markdown(path: &Path) -> bool {
    path.extension().map(|ext| ext == "md").unwrap_or(false)
}

fn summarize(root: &Path, path: &Path) -> Result<DocumentSummary, VaultError> {
    let bytes = std::fs::read(path)?;
    let document = Document::parse(String::from_utf8_lossy(&bytes).into_owned());
    let modified: DateTime<Utc> = std::fs::metadata(path)?.modified()?.into();

    let relative = path.strip_prefix(root).unwrap_or(path);
    let rel_path = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/");
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let frontmatter = document.frontmatter;
    Ok(DocumentSummary {
        name,
        path: rel_path,
        title: frontmatter.title().unwrap_or(stem),
        tags: frontmatter.tags(),
        published: frontmatter.is_published(),
        modified,
        preview: preview(&document.body),
        frontmatter,
    })
}

fn tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]+>").expect("valid regex"))
}

/// Plain-text preview: tags removed, newlines flattened, first 200 chars
pub fn preview(body: &str) -> String {
    let stripped = tag_regex().replace_all(body, "");
    let flattened = stripped.replace("\r\n", " ").replace('\n', " ");
    flattened.trim().chars().take(PREVIEW_CHARS).collect()
}
