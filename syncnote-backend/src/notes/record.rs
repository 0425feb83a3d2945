//! Canonical note record construction from raw document text.

use chrono::Utc;
use uuid::Uuid;

use super::frontmatter::{parse_metadata, split_frontmatter};
use crate::models::NoteRecord;

/// Parse a raw document into a fresh `NoteRecord`.
///
/// The record is stamped with the current time; callers holding a
/// storage-derived timestamp override `last_modified` after construction.
/// Without a caller-supplied `id` a random v4 UUID is generated.
pub fn parse_document(text: &str, id: Option<String>, source_name: Option<String>) -> NoteRecord {
    let (block, body) = split_frontmatter(text);
    let metadata = parse_metadata(block.unwrap_or(""));

    let frontmatter = block
        .filter(|b| !b.trim().is_empty())
        .map(|b| b.to_string());

    NoteRecord {
        id: id.unwrap_or_else(|| Uuid::new_v4().to_string()),
        body: body.trim_start().to_string(),
        metadata,
        frontmatter,
        source_name,
        last_modified: Utc::now().timestamp_millis(),
        auto_update_timestamp: false,
    }
}
