//! Shared-note discovery: the precise second stage over a coarse candidate
//! scan.
//!
//! Candidates arrive from a cheap substring containment scan across all
//! owners. That scan is a performance expedient, never a security boundary;
//! every candidate is re-parsed and judged by the visibility resolver here.

use std::collections::HashSet;

use super::visibility::can_view;
use crate::models::{CandidateRow, NoteRecord};
use crate::notes::parse_document;

/// Filter candidate rows down to the notes the viewer may read,
/// deduplicated by id and ordered newest first (ties by id).
pub fn discover(viewer_email: &str, candidates: Vec<CandidateRow>) -> Vec<NoteRecord> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut shared: Vec<NoteRecord> = Vec::new();

    for row in candidates {
        let mut note = parse_document(&row.markdown, Some(row.id), row.source_name);
        note.last_modified = row.last_modified;

        if !can_view(&note, viewer_email) {
            continue;
        }

        // Ids are only unique per owner, so the first candidate occurrence
        // decides which owner's note survives a cross-owner collision.
        if !seen.insert(note.id.clone()) {
            log::debug!("[SHARE] duplicate note id '{}' dropped from discovery", note.id);
            continue;
        }

        shared.push(note);
    }

    shared.sort_by(|a, b| {
        b.last_modified
            .cmp(&a.last_modified)
            .then_with(|| a.id.cmp(&b.id))
    });

    shared
}
