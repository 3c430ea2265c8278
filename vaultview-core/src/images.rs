//! Wiki-link image embeds: `![[name]]` / `![[name|WxH]]` to `<img>` tags.
//!
//! Names resolve against a static asset directory by case-insensitive file
//! name. Hits are cached per resolver; [`ImageResolver::invalidate`] swaps the
//! whole cache at once so readers see either the old or the new state.

use parking_lot::RwLock;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use walkdir::WalkDir;

/// Extensions that count as "the name already has an extension"
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "svg", "webp", "bmp"];

/// Bounds on a single asset directory search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchLimits {
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

fn default_max_depth() -> usize {
    16
}

fn default_max_entries() -> usize {
    50_000
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            max_entries: default_max_entries(),
        }
    }
}

/// An embed reference as written in the document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    pub raw_name: String,
    pub size_spec: Option<String>,
}

impl ImageRef {
    pub fn new(raw_name: impl Into<String>, size_spec: Option<String>) -> Self {
        Self {
            raw_name: raw_name.into(),
            size_spec,
        }
    }

    /// `W` gives a width, `WxH` a width and height. Anything that is not
    /// purely numeric (an alias, `300px`, ...) gives no size at all.
    pub fn size(&self) -> Option<(String, Option<String>)> {
        let spec = self.size_spec.as_deref()?.trim();
        let numeric = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());

        match spec.split_once(['x', 'X']) {
            Some((w, h)) if numeric(w) && numeric(h) => Some((w.to_string(), Some(h.to_string()))),
            Some(_) => None,
            None if numeric(spec) => Some((spec.to_string(), None)),
            None => None,
        }
    }

    /// `<img>` markup pointing at `url`
    pub fn to_html(&self, url: &str) -> String {
        let mut attrs = String::new();
        if let Some((width, height)) = self.size() {
            attrs.push_str(&format!(r#" width="{width}""#));
            if let Some(height) = height {
                attrs.push_str(&format!(r#" height="{height}""#));
            }
        }
        format!(
            r#"<img src="{}" alt="{}"{} class="obsidian-image">"#,
            html_escape(url),
            html_escape(&self.raw_name),
            attrs
        )
    }
}

#[derive(Debug, Default)]
struct ImageCache {
    generation: u64,
    entries: HashMap<String, String>,
}

/// Resolves embed names to URLs under a static asset root
#[derive(Debug)]
pub struct ImageResolver {
    root: PathBuf,
    url_prefix: String,
    limits: SearchLimits,
    cache: RwLock<ImageCache>,
}

impl ImageResolver {
    pub fn new(root: impl Into<PathBuf>, url_prefix: impl Into<String>) -> Self {
        Self::with_limits(root, url_prefix, SearchLimits::default())
    }

    pub fn with_limits(
        root: impl Into<PathBuf>,
        url_prefix: impl Into<String>,
        limits: SearchLimits,
    ) -> Self {
        Self {
            root: root.into(),
            url_prefix: crate::config::normalize_url_prefix(&url_prefix.into()),
            limits,
            cache: RwLock::new(ImageCache::default()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a raw embed name to a URL, searching the asset root on a miss
    pub fn resolve(&self, raw_name: &str) -> Option<String> {
        let key = raw_name.trim().to_lowercase();
        if key.is_empty() {
            return None;
        }

        let generation = {
            let cache = self.cache.read();
            if let Some(url) = cache.entries.get(&key) {
                return Some(url.clone());
            }
            cache.generation
        };

        let path = self.search(&key)?;
        let url = self.url_for(&path);

        let mut cache = self.cache.write();
        // A reindex that happened during the search makes this result stale
        if cache.generation == generation {
            cache.entries.insert(key, url.clone());
        }
        Some(url)
    }

    /// Drop every cached resolution in one swap
    pub fn invalidate(&self) {
        let mut cache = self.cache.write();
        let generation = cache.generation.wrapping_add(1);
        let stale = std::mem::replace(
            &mut *cache,
            ImageCache {
                generation,
                entries: HashMap::new(),
            },
        );
        tracing::debug!("image cache invalidated ({} entries)", stale.entries.len());
    }

    pub fn cached_len(&self) -> usize {
        self.cache.read().entries.len()
    }

    /// Replace every resolvable `![[...]]` embed in `text`. Plain `[[...]]`
    /// links and unresolvable embeds are left exactly as written.
    pub fn rewrite_embeds(&self, text: &str) -> String {
        wikilink_regex()
            .replace_all(text, |caps: &Captures| {
                let whole = caps.get(0).map(|m| m.as_str()).unwrap_or_default();
                if !whole.starts_with('!') {
                    return whole.to_string();
                }
                let image = ImageRef::new(
                    caps.get(1).map(|m| m.as_str().trim()).unwrap_or_default(),
                    caps.get(2).map(|m| m.as_str().to_string()),
                );
                match self.resolve(&image.raw_name) {
                    Some(url) => image.to_html(&url),
                    None => {
                        tracing::debug!("unresolved image embed {:?}", image.raw_name);
                        whole.to_string()
                    }
                }
            })
            .into_owned()
    }

    /// Walk the asset root in sorted order. An exact name wins over a
    /// `name.*` match wherever it is; the first wildcard match is kept as
    /// the fallback.
    fn search(&self, key: &str) -> Option<PathBuf> {
        if !self.root.is_dir() {
            return None;
        }

        let allow_wildcard = !has_image_extension(key);
        let wildcard_prefix = format!("{key}.");
        let mut wildcard: Option<PathBuf> = None;

        let walker = WalkDir::new(&self.root)
            .max_depth(self.limits.max_depth)
            .sort_by_file_name()
            .into_iter();

        for (visited, entry) in walker.enumerate() {
            if visited >= self.limits.max_entries {
                tracing::warn!(
                    "image search for {:?} stopped after {} entries in {}",
                    key,
                    self.limits.max_entries,
                    self.root.display()
                );
                break;
            }
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::debug!("skipping unreadable asset entry: {}", e);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let name = entry.file_name().to_string_lossy().to_lowercase();
            if name == key {
                return Some(entry.into_path());
            }
            if allow_wildcard && wildcard.is_none() && name.starts_with(&wildcard_prefix) {
                wildcard = Some(entry.into_path());
            }
        }

        wildcard
    }

    fn url_for(&self, path: &Path) -> String {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        let segments: Vec<String> = relative
            .components()
            .map(|c| urlencoding::encode(&c.as_os_str().to_string_lossy()).into_owned())
            .collect();
        format!("{}{}", self.url_prefix, segments.join("/"))
    }
}

fn wikilink_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"!?\[\[([^\]|]+)(?:\|([^\]]+))?\]\]").expect("valid regex"))
}

fn has_image_extension(name: &str) -> bool {
    name.rsplit_once('.')
        .map(|(_, ext)| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
