//! Heading-level splitting of Markdown text.
//!
//! Splitting is line based and fence aware: a `## ...` line inside a
//! ```` ``` ```` or `~~~` block is content, not a heading. A fence only
//! closes on the marker that opened it.

use std::sync::LazyLock;

use regex::Regex;

/// One block of a split document: the heading that opened it (if any) and
/// the raw text up to the next heading of the same level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadingBlock {
    /// Heading label, trimmed. `None` for text preceding the first heading.
    pub heading: Option<String>,
    /// Raw content lines joined with `\n`.
    pub content: String,
}

/// ATX heading: 1-6 hashes, whitespace, label, optional closing hashes.
static HEADING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(#{1,6})[ \t]+(.+?)(?:[ \t]+#+)?[ \t]*$").expect("valid regex")
});

/// Parse a single line as a heading, returning `(level, label)`.
pub fn parse_heading(line: &str) -> Option<(usize, &str)> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    HEADING_RE.captures(line).map(|caps| {
        let level = caps.get(1).map_or(0, |m| m.as_str().len());
        let label = caps.get(2).map_or("", |m| m.as_str()).trim();
        (level, label)
    })
}

/// Split Markdown into blocks at headings of exactly `level`.
///
/// Text before the first heading becomes a block with `heading: None`; it is
/// omitted when empty. Headings of other levels stay inside the content.
pub fn split_by_headings(markdown: &str, level: usize) -> Vec<HeadingBlock> {
    let mut blocks = Vec::new();
    let mut heading: Option<String> = None;
    let mut lines: Vec<&str> = Vec::new();
    // Opening fence marker and run length while inside a code block.
    let mut fence: Option<(char, usize)> = None;

    for line in markdown.split('\n') {
        if let Some((marker, len)) = fence_marker(line) {
            match fence {
                None => fence = Some((marker, len)),
                Some((open, open_len)) if open == marker && len >= open_len => {
                    if line.trim_start()[len..].trim().is_empty() {
                        fence = None;
                    }
                }
                Some(_) => {}
            }
            lines.push(line);
            continue;
        }

        if fence.is_none() {
            if let Some((found, label)) = parse_heading(line) {
                if found == level {
                    flush(&mut blocks, heading.take(), &mut lines);
                    heading = Some(label.to_string());
                    continue;
                }
            }
        }

        lines.push(line);
    }

    flush(&mut blocks, heading, &mut lines);
    blocks
}

/// Fence character and run length when `line` starts a code fence.
fn fence_marker(line: &str) -> Option<(char, usize)> {
    let trimmed = line.trim_start();
    let marker = trimmed.chars().next().filter(|c| *c == '`' || *c == '~')?;
    let len = trimmed.chars().take_while(|c| *c == marker).count();
    (len >= 3).then_some((marker, len))
}

fn flush(blocks: &mut Vec<HeadingBlock>, heading: Option<String>, lines: &mut Vec<&str>) {
    let content = lines.join("\n");
    lines.clear();

    if heading.is_none() && content.trim().is_empty() {
        return;
    }

    blocks.push(HeadingBlock { heading, content });
}

/// Normalize heading text for lookup: trim and lowercase.
pub fn normalize_heading(text: &str) -> String {
    text.trim().to_lowercase()
}
