//! Diagram extraction from fenced code blocks.
//!
//! Documents are scanned line by line. Code fences follow `CommonMark`: three or
//! more backticks or tildes open a block, and the closing fence must use the
//! same character and be at least as long as the opening one. Every fenced
//! block is tracked so that fences nested inside other blocks are not
//! mistaken for diagrams, but only `mermaid` blocks are yielded.

use std::iter::{Enumerate, FusedIterator};
use std::path::Path;
use std::str::Lines;

use crate::consts::TARGET_EXTENSION;

/// A diagram found in a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramBlock {
    /// Zero-based ordinal of this diagram within its document.
    pub index: usize,
    /// One-based line number of the opening fence.
    pub line: usize,
    /// Diagram source between the fences, newline terminated.
    pub source: String,
    /// Explicit output basename from a `name=` fence attribute.
    pub name: Option<String>,
}

impl DiagramBlock {
    /// File name of the rendered target for a document with the given stem.
    ///
    /// - explicit name `overview` -> `overview.svg`
    /// - first unnamed diagram of `guide.md` -> `guide.svg`
    /// - third unnamed diagram of `guide.md` -> `guide-2.svg`
    #[must_use]
    pub fn target_name(&self, stem: &str) -> String {
        match &self.name {
            Some(name) => {
                let suffix = format!(".{TARGET_EXTENSION}");
                let name = name.strip_suffix(&suffix).unwrap_or(name);
                format!("{name}{suffix}")
            }
            None if self.index == 0 => format!("{stem}.{TARGET_EXTENSION}"),
            None => format!("{stem}-{}.{TARGET_EXTENSION}", self.index),
        }
    }
}

/// Lazy iterator over the diagrams of a document.
///
/// Cloning the iterator restarts extraction from the clone point, so a fresh
/// [`extract`] call or a clone taken before iteration replays every block.
#[derive(Debug, Clone)]
pub struct DiagramBlocks<'a> {
    lines: Enumerate<Lines<'a>>,
    next_index: usize,
}

/// Extract diagram blocks from document text.
///
/// Content before the first and after the last fence is ignored. An
/// unterminated fence discards the rest of the document, while blocks closed
/// before it are still returned.
#[must_use]
pub fn extract(text: &str) -> DiagramBlocks<'_> {
    DiagramBlocks {
        lines: text.lines().enumerate(),
        next_index: 0,
    }
}

impl Iterator for DiagramBlocks<'_> {
    type Item = DiagramBlock;

    fn next(&mut self) -> Option<DiagramBlock> {
        loop {
            let (line_idx, line) = self.lines.next()?;
            let Some(fence) = OpenFence::detect(line) else {
                continue;
            };

            let (language, name) = parse_fence_info(fence.info);
            let is_diagram = is_diagram_language(language);

            let mut source = String::new();
            let mut closed = false;
            for (_, body_line) in self.lines.by_ref() {
                if fence.is_closed_by(body_line) {
                    closed = true;
                    break;
                }
                if is_diagram {
                    source.push_str(strip_indent(body_line, fence.indent));
                    source.push('\n');
                }
            }

            if !closed {
                return None;
            }
            if !is_diagram {
                continue;
            }

            let index = self.next_index;
            self.next_index += 1;
            return Some(DiagramBlock {
                index,
                line: line_idx + 1,
                source,
                name,
            });
        }
    }
}

impl FusedIterator for DiagramBlocks<'_> {}

/// An opening code fence.
#[derive(Debug)]
struct OpenFence<'a> {
    /// Character used for the fence (backtick or tilde).
    fence_char: char,
    /// Length of the opening fence (minimum length for closing).
    fence_len: usize,
    /// Leading spaces before the fence.
    indent: usize,
    /// Info string after the fence characters.
    info: &'a str,
}

impl<'a> OpenFence<'a> {
    /// Detect if a line starts a code fence.
    fn detect(line: &'a str) -> Option<Self> {
        let trimmed = line.trim_start();
        let first = trimmed.chars().next()?;
        if first != '`' && first != '~' {
            return None;
        }

        let fence_len = trimmed.chars().take_while(|&c| c == first).count();
        if fence_len < 3 {
            return None;
        }

        // Fence characters are ASCII, so the count is also a byte offset
        let info = trimmed[fence_len..].trim();
        // Backtick info strings cannot contain backticks (inline code)
        if first == '`' && info.contains('`') {
            return None;
        }

        Some(Self {
            fence_char: first,
            fence_len,
            indent: line.len() - trimmed.len(),
            info,
        })
    }

    /// Check if a line is a valid closing fence for this block.
    ///
    /// The closing fence must:
    /// - Use the same character as opening
    /// - Be at least as long as opening
    /// - Contain only fence characters (optionally followed by whitespace)
    fn is_closed_by(&self, line: &str) -> bool {
        let trimmed = line.trim_start();
        if !trimmed.starts_with(self.fence_char) {
            return false;
        }

        let count = trimmed.chars().take_while(|&c| c == self.fence_char).count();
        if count < self.fence_len {
            return false;
        }

        trimmed[count..].chars().all(char::is_whitespace)
    }
}

/// Whether a fence language denotes a Mermaid diagram.
///
/// Accepts `kroki-mermaid` for compatibility with the `MkDocs` Kroki plugin.
fn is_diagram_language(language: &str) -> bool {
    language.strip_prefix("kroki-").unwrap_or(language) == "mermaid"
}

/// Parse fence info string into language and explicit target name.
///
/// Format: `language [key=value ...]`, where values may be quoted. Only the
/// last path component of a `name` value is kept, and hidden names are ignored.
fn parse_fence_info(info: &str) -> (&str, Option<String>) {
    let info = info.trim_start();
    let (language, attrs) = info.split_once(char::is_whitespace).unwrap_or((info, ""));

    let name = split_attrs(attrs)
        .into_iter()
        .filter_map(|attr| {
            let (key, value) = attr.split_once('=')?;
            let file = Path::new(value).file_name()?.to_str()?;
            (key == "name" && !file.starts_with('.')).then(|| file.to_owned())
        })
        .next_back();

    (language, name)
}

/// Split attributes on whitespace outside of `"` or `'` quotes, dropping the
/// quotes. An unterminated quote runs to the end of the string.
fn split_attrs(attrs: &str) -> Vec<String> {
    let mut attrs_out = Vec::new();
    let mut current = String::new();
    let mut quote = None;

    for c in attrs.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => current.push(c),
            None if c == '"' || c == '\'' => quote = Some(c),
            None if c.is_whitespace() => {
                if !current.is_empty() {
                    attrs_out.push(std::mem::take(&mut current));
                }
            }
            None => current.push(c),
        }
    }
    if !current.is_empty() {
        attrs_out.push(current);
    }
    attrs_out
}

/// Remove up to `indent` leading spaces from a content line.
fn strip_indent(line: &str, indent: usize) -> &str {
    let spaces = line.bytes().take(indent).take_while(|&b| b == b' ').count();
    &line[spaces..]
}
