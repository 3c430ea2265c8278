//! Content model structs for documents, frontmatter and vault listings.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

/// Date layouts Obsidian plugins commonly write into frontmatter.
const DATE_TIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S"];

/// Frontmatter metadata from markdown files
///
/// The raw YAML mapping; unknown keys are kept as written.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Frontmatter(Mapping);

impl Frontmatter {
    pub fn new(mapping: Mapping) -> Self {
        Self(mapping)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn as_mapping(&self) -> &Mapping {
        &self.0
    }

    pub fn into_mapping(self) -> Mapping {
        self.0
    }

    /// Display title, if the frontmatter carries a non-blank scalar `title`
    pub fn title(&self) -> Option<String> {
        self.get("title")
            .and_then(scalar_to_string)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    /// Tags from either `tags: foo` or `tags: [foo, "#bar"]`, without leading `#`
    pub fn tags(&self) -> Vec<String> {
        let raw: Vec<String> = match self.get("tags") {
            Some(Value::Sequence(items)) => items.iter().filter_map(scalar_to_string).collect(),
            Some(other) => scalar_to_string(other).into_iter().collect(),
            None => Vec::new(),
        };

        raw.iter()
            .map(|t| t.trim().trim_start_matches('#').to_string())
            .filter(|t| !t.is_empty())
            .collect()
    }

    /// Whether the note opted into public visibility with `publish: true`
    pub fn is_published(&self) -> bool {
        match self.get("publish") {
            Some(Value::Bool(flag)) => *flag,
            Some(Value::String(s)) => s.trim().eq_ignore_ascii_case("true"),
            _ => false,
        }
    }

    /// Parse a date-valued key using the Obsidian date layouts
    pub fn date(&self, key: &str) -> Option<NaiveDateTime> {
        self.get(key)
            .and_then(scalar_to_string)
            .and_then(|s| parse_obsidian_date(&s))
    }

    pub fn modified(&self) -> Option<NaiveDateTime> {
        self.date("modified")
    }

    pub fn updated(&self) -> Option<NaiveDateTime> {
        self.date("updated")
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Parse the date strings Obsidian writes (`2024-03-01`, `2024-03-01 12:30`, ...)
pub fn parse_obsidian_date(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    DATE_TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// A single vault file as read from disk
#[derive(Debug, Clone)]
pub struct Document {
    /// Raw file contents
    pub raw: String,

    /// Parsed frontmatter (empty when absent or malformed)
    pub frontmatter: Frontmatter,

    /// Markdown body without the frontmatter block
    pub body: String,
}

impl Document {
    pub fn parse(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let (frontmatter, body) = crate::frontmatter::split_frontmatter(&raw);
        let body = body.to_string();
        Self {
            raw,
            frontmatter,
            body,
        }
    }
}

/// Which documents a listing should include
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    All,
    Public,
    Private,
}

impl Visibility {
    pub fn admits(&self, published: bool) -> bool {
        match self {
            Visibility::All => true,
            Visibility::Public => published,
            Visibility::Private => !published,
        }
    }
}

/// Listing entry for a markdown file in the vault
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentSummary {
    /// File name (e.g., "note.md")
    pub name: String,

    /// Path relative to the content directory, `/`-separated
    pub path: String,

    /// Frontmatter title or the file stem
    pub title: String,

    pub tags: Vec<String>,

    pub published: bool,

    /// File modification time
    pub modified: DateTime<Utc>,

    /// Plain-text preview of the body
    pub preview: String,

    pub frontmatter: Frontmatter,
}

/// Nested directory listing for navigation sidebars
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FileTreeNode {
    Directory {
        name: String,
        children: Vec<FileTreeNode>,
    },
    File {
        name: String,
        title: String,
        path: String,
    },
}

impl FileTreeNode {
    pub fn name(&self) -> &str {
        match self {
            FileTreeNode::Directory { name, .. } | FileTreeNode::File { name, .. } => name,
        }
    }

    fn sort_key(&self) -> (u8, String) {
        match self {
            FileTreeNode::Directory { name, .. } => (0, name.to_lowercase()),
            FileTreeNode::File { title, .. } => (1, title.to_lowercase()),
        }
    }

    /// Directories first, then case-insensitive by title/name, recursively
    pub fn sort_recursive(nodes: &mut [FileTreeNode]) {
        nodes.sort_by_key(|n| n.sort_key());
        for node in nodes.iter_mut() {
            if let FileTreeNode::Directory { children, .. } = node {
                Self::sort_recursive(children);
            }
        }
    }
}
