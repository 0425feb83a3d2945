//! Split and parse YAML frontmatter for notes.
//!
//! Hand-rolled YAML (no serde_yaml) - only `visibility` and
//! `visibility_emails` are recognized; unknown keys pass through untouched so
//! notes can carry arbitrary metadata for other tools.

use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

use crate::models::{NoteMetadata, Visibility};

// Delimiter, newline, minimal metadata span, newline, delimiter, optional
// trailing newline. Anything else is body.
static FRONTMATTER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\A---\n(.*?)\n---\n?").unwrap());
static TOP_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z0-9_-]+):[ \t]*(.*)$").unwrap());
static SUB_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^  ([^\s:][^:]*):[ \t]*(.*)$").unwrap());

/// Split a document into (metadata block, body).
///
/// The block is the uncropped text between the delimiters; the body is
/// everything after the closing delimiter, untrimmed. A document that does
/// not start with `---`, or whose closing delimiter is missing, is all body.
pub fn split_frontmatter(document: &str) -> (Option<&str>, &str) {
    if !document.starts_with("---") {
        return (None, document);
    }

    match FRONTMATTER_RE.captures(document) {
        Some(caps) => {
            let matched_end = caps.get(0).map(|m| m.end()).unwrap_or(0);
            let block = caps.get(1).map(|m| m.as_str()).unwrap_or("");
            (Some(block), &document[matched_end..])
        }
        None => (None, document),
    }
}

/// Parse the recognized subset of a metadata block.
///
/// Line-oriented: blank lines and `#` comments are skipped, a top-level key
/// is `key: rest` at column zero. Malformed input never fails - a field that
/// cannot be read is left unset.
pub fn parse_metadata(block: &str) -> NoteMetadata {
    let lines: Vec<&str> = block.lines().collect();
    let mut metadata = NoteMetadata::default();

    let mut i = 0;
    while i < lines.len() {
        let line = lines[i];
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            i += 1;
            continue;
        }

        let Some(caps) = TOP_KEY_RE.captures(line) else {
            i += 1;
            continue;
        };
        let key = caps.get(1).map(|m| m.as_str()).unwrap_or("");
        let rest = caps.get(2).map(|m| m.as_str()).unwrap_or("").trim();
        i += 1;

        match key {
            "visibility" => {
                if rest.is_empty() {
                    let (items, next) = consume_block_list(&lines, i, "  ");
                    i = next;
                    if !items.is_empty() {
                        metadata.visibility = Some(Visibility::Many(items));
                    }
                } else if rest.starts_with('[') {
                    metadata.visibility = Some(Visibility::Many(parse_inline_list(rest)));
                } else {
                    metadata.visibility = Some(Visibility::One(rest.to_string()));
                }
            }
            "visibility_emails" => {
                let (map, next) = consume_term_map(&lines, i);
                i = next;
                if !map.is_empty() {
                    metadata.visibility_emails = Some(map);
                }
            }
            _ => {}
        }
    }

    metadata
}

/// Consume consecutive `{indent}- value` lines starting at `start`.
/// Returns the trimmed items and the index of the first non-item line.
fn consume_block_list(lines: &[&str], start: usize, indent: &str) -> (Vec<String>, usize) {
    let mut items = Vec::new();
    let mut i = start;
    while i < lines.len() {
        let Some(value) = block_list_item(lines[i], indent) else {
            break;
        };
        items.push(value.trim().to_string());
        i += 1;
    }
    (items, i)
}

fn block_list_item<'a>(line: &'a str, indent: &str) -> Option<&'a str> {
    line.strip_prefix(indent)?.strip_prefix("- ")
}

/// Consume the nested `  term: rest` map under `visibility_emails`.
///
/// Scanning stops, without consuming the line, at the next top-level key or
/// a bare delimiter; lines matching neither shape are skipped.
fn consume_term_map(lines: &[&str], start: usize) -> (HashMap<String, Vec<String>>, usize) {
    let mut map = HashMap::new();
    let mut i = start;
    while i < lines.len() {
        let line = lines[i];
        if TOP_KEY_RE.is_match(line) || line.trim() == "---" {
            break;
        }

        let Some(caps) = SUB_KEY_RE.captures(line) else {
            i += 1;
            continue;
        };
        let term = caps.get(1).map(|m| m.as_str()).unwrap_or("").trim().to_string();
        let rest = caps.get(2).map(|m| m.as_str()).unwrap_or("").trim();
        i += 1;

        if rest.starts_with('[') {
            map.insert(term, parse_inline_list(rest));
        } else if rest.is_empty() {
            // Assigned even when the list turns out empty.
            let (items, next) = consume_block_list(lines, i, "    ");
            i = next;
            map.insert(term, items);
        } else {
            map.insert(term, vec![rest.to_string()]);
        }
    }
    (map, i)
}

/// Parse an inline list like `[friends, work]`: strip the surrounding
/// brackets, split on commas, trim, drop empties.
fn parse_inline_list(s: &str) -> Vec<String> {
    let s = s.trim();
    let inner = s.strip_prefix('[').unwrap_or(s);
    let inner = inner.strip_suffix(']').unwrap_or(inner);

    inner
        .split(',')
        .map(|item| item.trim())
        .filter(|item| !item.is_empty())
        .map(|item| item.to_string())
        .collect()
}
