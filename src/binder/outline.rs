//! Markdown outline binder
//!
//! The binder is a Markdown document whose list items link to node files:
//!
//! ```text
//! # My Novel
//!
//! - [Part One](part-one.md)
//!   - [Chapter 1](ch-1.md)
//!   - [Chapter 2](ch-2.md)
//! - [Part Two](part-two.md)
//! ```
//!
//! Nesting is two spaces per level. Lines that are not link items are kept
//! byte for byte, and so are the line endings of existing lines.

use crate::binder::{BinderMutator, MutationParams, MutationResult, Position};
use crate::core::diagnostic::Diagnostic;
use crate::core::ids::NODE_EXTENSION;
use crate::error::{QuireError, Result};
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

static ITEM_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<indent> *)[-*+] \[(?:[^\]\\]|\\.)*\]\((?P<target>[^)\s]+)\)\s*$")
        .expect("valid binder item regex")
});

const INDENT: &str = "  ";

pub const PARENT_NOT_FOUND: &str = "BND001";
pub const SIBLING_NOT_FOUND: &str = "BND002";
pub const ALREADY_REFERENCED: &str = "BND003";
pub const DUPLICATE_FORCED: &str = "BND101";
pub const INDEX_OUT_OF_RANGE: &str = "BND102";

/// A link item in the binder
#[derive(Debug, Clone)]
struct Entry {
    line: usize,
    depth: usize,
    target: String,
}

/// Binder engine for Markdown outlines
#[derive(Debug, Clone, Copy, Default)]
pub struct OutlineBinder;

impl OutlineBinder {
    pub fn new() -> Self {
        Self
    }

    /// Files referenced by the binder, in document order
    pub fn references(binder: &[u8]) -> Result<Vec<String>> {
        let text = decode(binder)?;
        let lines = split_lines(text);
        Ok(parse_entries(&lines).into_iter().map(|e| e.target).collect())
    }
}

impl BinderMutator for OutlineBinder {
    fn add_reference(&self, binder: &[u8], params: &MutationParams) -> Result<MutationResult> {
        let text = decode(binder)?;
        let mut lines: Vec<String> = split_lines(text).into_iter().map(String::from).collect();
        let entries = parse_entries(&lines);
        let mut diagnostics = Vec::new();

        if entries.iter().any(|e| same_node(&e.target, &params.target)) {
            let message = format!("{} is already referenced in the binder", params.target);
            if !params.force {
                return Ok(MutationResult::unchanged(
                    binder,
                    vec![Diagnostic::error(ALREADY_REFERENCED, message)],
                ));
            }
            diagnostics.push(Diagnostic::warning(DUPLICATE_FORCED, message));
        }

        // index of the parent entry, None for the root
        let parent = match params.parent.as_deref() {
            None | Some(".") | Some("") => None,
            Some(selector) => match entries.iter().position(|e| same_node(&e.target, selector)) {
                Some(index) => Some(index),
                None => {
                    return Ok(MutationResult::unchanged(
                        binder,
                        vec![Diagnostic::error(
                            PARENT_NOT_FOUND,
                            format!("parent not found: {}", selector),
                        )],
                    ));
                }
            },
        };

        let depth = parent.map_or(0, |p| entries[p].depth + 1);
        let children: Vec<usize> = match parent {
            None => (0..entries.len())
                .filter(|&i| entries[i].depth == 0)
                .collect(),
            Some(p) => (p + 1..subtree_end(&entries, p))
                .filter(|&i| entries[i].depth == depth)
                .collect(),
        };

        let append_line = match (children.last(), parent) {
            (Some(&last), _) => line_after_subtree(&entries, last),
            (None, Some(p)) => entries[p].line + 1,
            (None, None) => lines.len(),
        };

        let insert_at = match &params.position {
            Position::Last => append_line,
            Position::First => children
                .first()
                .map_or(append_line, |&c| entries[c].line),
            Position::At(index) => match children.get(*index) {
                Some(&c) => entries[c].line,
                None => {
                    if *index > children.len() {
                        diagnostics.push(Diagnostic::warning(
                            INDEX_OUT_OF_RANGE,
                            format!(
                                "index {} is past the {} existing children; appending",
                                index,
                                children.len()
                            ),
                        ));
                    }
                    append_line
                }
            },
            Position::Before(selector) | Position::After(selector) => {
                let sibling = children
                    .iter()
                    .copied()
                    .find(|&c| same_node(&entries[c].target, selector));
                match (sibling, &params.position) {
                    (Some(c), Position::Before(_)) => entries[c].line,
                    (Some(c), _) => line_after_subtree(&entries, c),
                    (None, _) => {
                        return Ok(MutationResult::unchanged(
                            binder,
                            vec![Diagnostic::error(
                                SIBLING_NOT_FOUND,
                                format!("sibling not found: {}", selector),
                            )],
                        ));
                    }
                }
            }
        };

        let eol = detect_line_ending(&lines);
        if insert_at == lines.len() {
            if let Some(last) = lines.last_mut() {
                if !last.ends_with('\n') {
                    last.push_str(eol);
                }
            }
        }

        let title = if params.title.is_empty() {
            params
                .target
                .strip_suffix(&format!(".{}", NODE_EXTENSION))
                .unwrap_or(&params.target)
        } else {
            &params.title
        };
        let item = format!(
            "{}- [{}]({}){}",
            INDENT.repeat(depth),
            escape_link_text(title),
            params.target,
            eol
        );
        debug!("Inserting binder item at line {}: {}", insert_at, item.trim_end());
        lines.insert(insert_at, item);

        Ok(MutationResult::new(binder, lines.concat().into_bytes(), diagnostics))
    }
}

fn decode(binder: &[u8]) -> Result<&str> {
    std::str::from_utf8(binder)
        .map_err(|e| QuireError::parse("parsing binder", format!("not valid UTF-8: {}", e)))
}

fn split_lines(text: &str) -> Vec<&str> {
    text.split_inclusive('\n').collect()
}

fn parse_entries<S: AsRef<str>>(lines: &[S]) -> Vec<Entry> {
    lines
        .iter()
        .enumerate()
        .filter_map(|(line, text)| {
            let text = text.as_ref().trim_end_matches(['\n', '\r']);
            ITEM_RE.captures(text).map(|caps| Entry {
                line,
                depth: caps["indent"].len() / INDENT.len(),
                target: caps["target"].to_string(),
            })
        })
        .collect()
}

/// Index one past the last entry nested under `entries[index]`
fn subtree_end(entries: &[Entry], index: usize) -> usize {
    let depth = entries[index].depth;
    entries[index + 1..]
        .iter()
        .position(|e| e.depth <= depth)
        .map_or(entries.len(), |offset| index + 1 + offset)
}

/// Line just below the subtree rooted at `entries[index]`
fn line_after_subtree(entries: &[Entry], index: usize) -> usize {
    entries[subtree_end(entries, index) - 1].line + 1
}

fn same_node(target: &str, selector: &str) -> bool {
    let suffix = format!(".{}", NODE_EXTENSION);
    target.strip_suffix(&suffix).unwrap_or(target) == selector.strip_suffix(&suffix).unwrap_or(selector)
}

fn detect_line_ending<S: AsRef<str>>(lines: &[S]) -> &'static str {
    match lines.first() {
        Some(line) if line.as_ref().ends_with("\r\n") => "\r\n",
        _ => "\n",
    }
}

fn escape_link_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '[' | ']') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
