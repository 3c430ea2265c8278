//! Frontmatter parsing from markdown files.

use crate::models::Frontmatter;
use serde_yaml::Value;

const DELIMITER: &str = "---";
const BOM: char = '\u{feff}';

/// A line of the source with its byte span; `end` includes the line terminator.
struct Line<'a> {
    text: &'a str,
    start: usize,
    end: usize,
}

fn lines_with_offsets(content: &str) -> impl Iterator<Item = Line<'_>> {
    let mut offset = 0;
    std::iter::from_fn(move || {
        if offset >= content.len() {
            return None;
        }
        let rest = &content[offset..];
        let (raw, consumed) = match rest.find('\n') {
            Some(pos) => (&rest[..pos], pos + 1),
            None => (rest, rest.len()),
        };
        let line = Line {
            text: raw.strip_suffix('\r').unwrap_or(raw),
            start: offset,
            end: offset + consumed,
        };
        offset += consumed;
        Some(line)
    })
}

fn is_delimiter(line: &str) -> bool {
    line.trim_end() == DELIMITER
}

/// Split a leading `---` YAML block from markdown content
///
/// Returns a tuple of (frontmatter, markdown_body). The body keeps the
/// original line endings and starts right after the closing delimiter line.
/// Missing, unterminated or malformed frontmatter yields an empty mapping and
/// the untouched input.
///
/// # Example
///
/// ```
/// use vaultview_core::frontmatter::split_frontmatter;
///
/// let content = "---\ntitle: My Post\npublish: true\n---\n# Hello World\n";
///
/// let (fm, body) = split_frontmatter(content);
/// assert_eq!(fm.title().as_deref(), Some("My Post"));
/// assert!(fm.is_published());
/// assert_eq!(body, "# Hello World\n");
/// ```
pub fn split_frontmatter(text: &str) -> (Frontmatter, &str) {
    let content = text.strip_prefix(BOM).unwrap_or(text);
    let mut lines = lines_with_offsets(content);

    match lines.next() {
        Some(first) if is_delimiter(first.text) => {
            let yaml_start = first.end;
            let Some(closing) = lines.find(|line| is_delimiter(line.text)) else {
                tracing::debug!("frontmatter opened but never closed; treating as body");
                return (Frontmatter::default(), text);
            };

            let yaml = content[yaml_start..closing.start].replace("\r\n", "\n");
            match parse_mapping(&yaml) {
                Some(frontmatter) => (frontmatter, &content[closing.end..]),
                None => (Frontmatter::default(), text),
            }
        }
        _ => (Frontmatter::default(), text),
    }
}

fn parse_mapping(yaml: &str) -> Option<Frontmatter> {
    match serde_yaml::from_str::<Value>(yaml) {
        Ok(Value::Mapping(mapping)) => Some(Frontmatter::new(mapping)),
        Ok(Value::Null) => Some(Frontmatter::default()),
        Ok(other) => {
            tracing::debug!("frontmatter is not a mapping ({:?}); ignoring", other);
            None
        }
        Err(e) => {
            tracing::debug!("invalid frontmatter YAML: {}", e);
            None
        }
    }
}

/// Extract just the frontmatter without the body
pub fn extract_frontmatter(content: &str) -> Frontmatter {
    split_frontmatter(content).0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_frontmatter() {
        let content = r#"---
title: Test Post
tags:
  - rust
  - programming
publish: true
---

# Hello World

This is the content."#;

        let (fm, body) = split_frontmatter(content);
        assert_eq!(fm.title().as_deref(), Some("Test Post"));
        assert_eq!(fm.tags(), vec!["rust", "programming"]);
        assert!(fm.is_published());
        assert_eq!(body, "\n# Hello World\n\nThis is the content.");
    }

    #[test]
    fn test_parse_no_frontmatter() {
        let content = "# Just Content\n\nNo frontmatter here.";
        let (fm, body) = split_frontmatter(content);
        assert!(fm.is_empty());
        assert_eq!(body, content);
    }

    #[test]
    fn test_delimiter_must_be_first_line() {
        let content = "\n---\ntitle: Late\n---\nBody";
        let (fm, body) = split_frontmatter(content);
        assert!(fm.is_empty());
        assert_eq!(body, content);
    }

    #[test]
    fn test_invalid_yaml_keeps_original_text() {
        let content = "---\ntitle: Test\ninvalid yaml: [unclosed\n---\n\nContent.";
        let (fm, body) = split_frontmatter(content);
        assert!(fm.is_empty());
        assert_eq!(body, content);
    }

    #[test]
    fn test_scalar_yaml_is_not_frontmatter() {
        let content = "---\njust a sentence\n---\nBody";
        let (fm, body) = split_frontmatter(content);
        assert!(fm.is_empty());
        assert_eq!(body, content);
    }

    #[test]
    fn test_unterminated_block() {
        let content = "---\ntitle: Never closed\n\nBody";
        let (fm, body) = split_frontmatter(content);
        assert!(fm.is_empty());
        assert_eq!(body, content);
    }

    #[test]
    fn test_crlf_body_keeps_line_endings() {
        let content = "---\r\ntitle: Windows\r\n---\r\nLine one\r\nLine two\r\n";
        let (fm, body) = split_frontmatter(content);
        assert_eq!(fm.title().as_deref(), Some("Windows"));
        assert_eq!(body, "Line one\r\nLine two\r\n");
    }

    #[test]
    fn test_byte_order_mark_is_skipped() {
        let content = "\u{feff}---\ntitle: BOM\n---\nBody";
        let (fm, body) = split_frontmatter(content);
        assert_eq!(fm.title().as_deref(), Some("BOM"));
        assert_eq!(body, "Body");
    }

    #[test]
    fn test_empty_block() {
        let (fm, body) = split_frontmatter("---\n---\nBody\n");
        assert!(fm.is_empty());
        assert_eq!(body, "Body\n");
    }

    #[test]
    fn test_closing_delimiter_at_end_of_input() {
        let (fm, body) = split_frontmatter("---\ntitle: X\n---");
        assert_eq!(fm.title().as_deref(), Some("X"));
        assert_eq!(body, "");
    }

    #[test]
    fn test_only_one_trailing_newline_consumed() {
        let (_, body) = split_frontmatter("---\ntitle: X\n---\n\n\nBody");
        assert_eq!(body, "\n\nBody");
    }

    #[test]
    fn test_resplitting_body_is_identity() {
        let (fm, body) = split_frontmatter("---\ntitle: X\n---\nHello\n\nWorld\n");
        assert_eq!(fm.title().as_deref(), Some("X"));

        let (again, same) = split_frontmatter(body);
        assert!(again.is_empty());
        assert_eq!(same, body);
    }

    #[test]
    fn test_text_without_delimiter_is_identity() {
        for text in ["", "plain", "-- not a delimiter\n", "----\nx: 1\n----\n", " ---\n"] {
            let (fm, body) = split_frontmatter(text);
            assert!(fm.is_empty(), "unexpected frontmatter for {:?}", text);
            assert_eq!(body, text);
        }
    }
}
