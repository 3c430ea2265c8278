//! Obsidian admonition fences rewritten as callout blockquotes.
//!
//! ````text
//! ```ad-warning
//! title: Careful
//! Body text
//! ```
//! ````
//!
//! becomes `> [!WARNING] Careful` followed by `> Body text`. Admonitions may
//! nest inside each other (each level adds one `> ` prefix) and may contain
//! plain code fences, which are carried through with the current prefix but
//! never add one themselves.

use regex::Regex;
use std::sync::OnceLock;

/// Visual width of a tab when measuring fence indentation
const TAB_WIDTH: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Admonition,
    Code,
}

/// An open fence on the normalizer stack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FenceFrame {
    pub kind: FrameKind,
    pub fence_char: char,
    pub fence_len: usize,
    pub indent: usize,
}

impl FenceFrame {
    /// Closing requires the same character, at least the opening length and
    /// exactly the opening indentation.
    fn is_closed_by(&self, fence: &FenceLine<'_>) -> bool {
        self.fence_char == fence.fence_char
            && fence.fence_len >= self.fence_len
            && self.indent == fence.indent
    }
}

/// A line that looks like a fence: indentation, 3+ backticks or tildes, info.
#[derive(Debug, PartialEq, Eq)]
struct FenceLine<'a> {
    indent: usize,
    fence_char: char,
    fence_len: usize,
    info: &'a str,
}

fn parse_fence(line: &str) -> Option<FenceLine<'_>> {
    let trimmed = line.trim_start();
    let leading = &line[..line.len() - trimmed.len()];
    let indent = leading
        .chars()
        .map(|c| if c == '\t' { TAB_WIDTH } else { 1 })
        .sum();

    let fence_char = trimmed.chars().next().filter(|c| *c == '`' || *c == '~')?;
    let fence_len = trimmed.chars().take_while(|c| *c == fence_char).count();
    if fence_len < 3 {
        return None;
    }

    Some(FenceLine {
        indent,
        fence_char,
        fence_len,
        info: trimmed[fence_len..].trim(),
    })
}

fn admonition_type_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^ad-(\w+)").expect("valid regex"))
}

/// Admonition type named by a fence info string (`ad-note` → `note`)
pub fn admonition_type(info: &str) -> Option<String> {
    admonition_type_regex()
        .captures(info.trim())
        .map(|caps| caps[1].to_lowercase())
}

/// Explicit `title:` line that may follow an admonition opener
pub fn title_line(line: &str) -> Option<&str> {
    line.trim().strip_prefix("title:").map(str::trim)
}

pub(crate) fn capitalize(input: &str) -> String {
    let mut chars = input.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
    }
}

/// Line-oriented rewriter from admonition fences to callout blockquotes
#[derive(Debug, Default)]
pub struct AdmonitionNormalizer;

impl AdmonitionNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// Rewrite every `ad-TYPE` fence in `content` into `> [!TYPE] Title` syntax
    ///
    /// Fences still open at end of input are left open: the blockquote simply
    /// runs to the end of the document, which is what a markdown parser does
    /// with an unterminated quote anyway.
    pub fn normalize(&self, content: &str) -> String {
        let mut pass = NormalizePass::default();
        let mut lines = content.split('\n').peekable();

        while let Some(line) = lines.next() {
            let Some(fence) = parse_fence(line) else {
                pass.emit(line);
                continue;
            };

            if let Some(kind) = admonition_type(fence.info) {
                let mut title = None;
                if let Some(explicit) = lines.peek().and_then(|next| title_line(next)) {
                    title = Some(explicit.to_string()).filter(|t| !t.is_empty());
                    lines.next();
                }
                let title = title.unwrap_or_else(|| capitalize(&kind));
                pass.emit(&format!("> [!{}] {}", kind.to_uppercase(), title));
                pass.push(FrameKind::Admonition, &fence);
            } else if !pass.close_matching(line, &fence) {
                pass.push(FrameKind::Code, &fence);
                pass.emit(line);
            }
        }

        if !pass.stack.is_empty() {
            tracing::debug!(
                "{} fence(s) still open at end of input: {:?}",
                pass.stack.len(),
                pass.stack
            );
        }

        pass.output.join("\n")
    }
}

#[derive(Default)]
struct NormalizePass {
    stack: Vec<FenceFrame>,
    output: Vec<String>,
}

impl NormalizePass {
    fn prefix(&self) -> String {
        self.stack
            .iter()
            .filter(|frame| frame.kind == FrameKind::Admonition)
            .map(|_| "> ")
            .collect()
    }

    fn emit(&mut self, line: &str) {
        let prefixed = format!("{}{}", self.prefix(), line);
        self.output.push(prefixed);
    }

    fn push(&mut self, kind: FrameKind, fence: &FenceLine<'_>) {
        self.stack.push(FenceFrame {
            kind,
            fence_char: fence.fence_char,
            fence_len: fence.fence_len,
            indent: fence.indent,
        });
    }

    /// Pop every frame on top of the stack this fence can close.
    ///
    /// A code frame re-emits the fence line as its closing fence; an
    /// admonition frame ends silently. Returns whether anything was closed.
    fn close_matching(&mut self, line: &str, fence: &FenceLine<'_>) -> bool {
        let mut closed_any = false;

        while let Some(top) = self.stack.last() {
            if !top.is_closed_by(fence) {
                break;
            }
            let popped = self.stack.pop();
            closed_any = true;
            if matches!(popped, Some(frame) if frame.kind == FrameKind::Code) {
                self.emit(line);
            }
        }

        closed_any
    }
}

/// Convenience wrapper around [`AdmonitionNormalizer::normalize`]
pub fn normalize_admonitions(content: &str) -> String {
    AdmonitionNormalizer::new().normalize(content)
}
