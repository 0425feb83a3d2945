//! Decides whether a viewer may see a note, from the note's own metadata.

use std::collections::HashMap;

use crate::models::{NoteRecord, Visibility};

/// Normalize the authored `visibility` value into an ordered list of
/// non-empty trimmed terms. Absent metadata normalizes to an empty list.
pub fn visibility_terms(visibility: Option<&Visibility>) -> Vec<String> {
    let raw: Vec<&str> = match visibility {
        Some(Visibility::One(term)) => vec![term.as_str()],
        Some(Visibility::Many(terms)) => terms.iter().map(|t| t.as_str()).collect(),
        None => Vec::new(),
    };

    raw.into_iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_string())
        .collect()
}

/// A note is visible to a viewer when any of its visibility terms maps to an
/// email list containing the viewer. A note with no terms is private.
///
/// Term keys are tried exactly as stored first, then case-insensitively;
/// emails compare trimmed and lowercased on both sides.
pub fn can_view(note: &NoteRecord, viewer_email: &str) -> bool {
    let terms = visibility_terms(note.metadata.visibility.as_ref());
    if terms.is_empty() {
        return false;
    }

    let empty = HashMap::new();
    let emails = note.metadata.visibility_emails.as_ref().unwrap_or(&empty);

    let folded: HashMap<String, &Vec<String>> = emails
        .iter()
        .map(|(key, list)| (key.trim().to_lowercase(), list))
        .collect();

    let viewer = viewer_email.trim().to_lowercase();

    for term in &terms {
        if let Some(list) = emails.get(term) {
            if contains_email(list, &viewer) {
                return true;
            }
        }
        if let Some(list) = folded.get(&term.to_lowercase()) {
            if contains_email(list, &viewer) {
                return true;
            }
        }
    }

    false
}

fn contains_email(list: &[String], viewer: &str) -> bool {
    list.iter().any(|email| email.trim().to_lowercase() == viewer)
}
