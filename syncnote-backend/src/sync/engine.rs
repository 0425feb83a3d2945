//! Sync engine - merges incoming note batches, replaces visibility terms,
//! and answers shared-note queries.

use chrono::Utc;
use rusqlite::Result as SqliteResult;
use std::sync::Arc;

use crate::db::Database;
use crate::models::{NoteInput, NoteRecord, SyncRequest, VisibilityTerm};
use crate::notes::parse_document;
use crate::sharing::discover;

pub struct SyncEngine {
    db: Arc<Database>,
}

impl SyncEngine {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Apply one full sync call: merge the note batch, then replace the
    /// owner's visibility terms when the call carries them. An omitted term
    /// set leaves stored terms untouched; an empty one clears them.
    pub fn sync(&self, owner: &str, request: SyncRequest) -> SqliteResult<()> {
        self.sync_notes(owner, request.notes)?;
        if let Some(terms) = request.visibility_terms {
            self.replace_visibility_terms(owner, terms)?;
        }
        Ok(())
    }

    /// Merge a batch of incoming notes under last-writer-wins.
    ///
    /// Items missing a timestamp are stamped with the current time before
    /// comparison. Each write is an independent conditional upsert applied
    /// in input order; an item that loses to a newer stored row is dropped
    /// silently, and a failure mid-batch leaves earlier items applied.
    pub fn sync_notes(&self, owner: &str, notes: Vec<NoteInput>) -> SqliteResult<()> {
        let total = notes.len();
        let mut applied = 0usize;

        for note in notes {
            let last_modified = note
                .last_modified
                .unwrap_or_else(|| Utc::now().timestamp_millis());

            let written = self.db.conditional_upsert_note(
                owner,
                &note.id,
                &note.markdown,
                note.source_name.as_deref(),
                last_modified,
            )?;
            if written {
                applied += 1;
            }
        }

        log::debug!("[SYNC] {}: applied {}/{} note(s)", owner, applied, total);
        Ok(())
    }

    /// Replace the owner's visibility terms wholesale.
    ///
    /// Emails are trimmed, lowercased and deduplicated; entries without an
    /// `@` are rejected. A repeated term name keeps its last occurrence.
    pub fn replace_visibility_terms(
        &self,
        owner: &str,
        terms: Vec<VisibilityTerm>,
    ) -> SqliteResult<()> {
        let mut sanitized: Vec<VisibilityTerm> = Vec::new();

        for term in terms {
            let name = term.term.trim().to_string();
            if name.is_empty() {
                continue;
            }
            let emails = sanitize_emails(&term.emails);
            if let Some(existing) = sanitized.iter_mut().find(|t| t.term == name) {
                existing.emails = emails;
            } else {
                sanitized.push(VisibilityTerm { term: name, emails });
            }
        }

        self.db.replace_visibility_terms(owner, &sanitized)
    }

    /// List the owner's notes as parsed records, newest first.
    pub fn list_notes(&self, owner: &str) -> SqliteResult<Vec<NoteRecord>> {
        let rows = self.db.list_notes_by_owner(owner)?;
        Ok(rows
            .into_iter()
            .map(|row| {
                let mut note = parse_document(&row.markdown, Some(row.id), row.source_name);
                note.last_modified = row.last_modified;
                note
            })
            .collect())
    }

    /// Fetch one of the owner's notes as a parsed record.
    pub fn get_note(&self, owner: &str, id: &str) -> SqliteResult<Option<NoteRecord>> {
        let row = self.db.get_note(owner, id)?;
        Ok(row.map(|row| {
            let mut note = parse_document(&row.markdown, Some(row.id), row.source_name);
            note.last_modified = row.last_modified;
            note
        }))
    }

    /// Delete one of the owner's notes. Returns whether a row existed.
    pub fn delete_note(&self, owner: &str, id: &str) -> SqliteResult<bool> {
        self.db.delete_note(owner, id)
    }

    /// List the owner's visibility terms, alphabetical.
    pub fn list_visibility_terms(&self, owner: &str) -> SqliteResult<Vec<VisibilityTerm>> {
        self.db.list_visibility_terms(owner)
    }

    /// Find every note, across all owners, shared with the viewer.
    ///
    /// Two stages: a coarse substring scan over raw documents, then the
    /// visibility resolver on each parsed candidate. The scan keeps the
    /// per-document parse off notes that can never match.
    pub fn find_shared_with(&self, viewer_email: &str) -> SqliteResult<Vec<NoteRecord>> {
        let needle = viewer_email.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }

        let candidates = self.db.scan_candidates_containing(&needle)?;
        let shared = discover(viewer_email, candidates);
        log::debug!("[SHARE] {} note(s) shared with {}", shared.len(), needle);
        Ok(shared)
    }
}

fn sanitize_emails(emails: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for email in emails {
        let email = email.trim().to_lowercase();
        if email.is_empty() {
            continue;
        }
        if !email.contains('@') {
            log::debug!("[SYNC] rejected invalid email '{}'", email);
            continue;
        }
        if !out.contains(&email) {
            out.push(email);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn engine(dir: &tempfile::TempDir) -> SyncEngine {
        let _ = env_logger::builder().is_test(true).try_init();
        let db_path = dir.path().join("test.db");
        let db = Database::new(db_path.to_str().unwrap()).expect("Failed to open database");
        SyncEngine::new(Arc::new(db))
    }

    fn input(id: &str, markdown: &str, last_modified: Option<i64>) -> NoteInput {
        NoteInput {
            id: id.to_string(),
            markdown: markdown.to_string(),
            source_name: None,
            last_modified,
        }
    }

    fn shared_doc(email: &str) -> String {
        format!(
            "---\nvisibility: [friends]\nvisibility_emails:\n  friends: [{}]\n---\nBody",
            email
        )
    }

    #[test]
    fn test_newer_then_older_keeps_newer() {
        let dir = tempdir().unwrap();
        let engine = engine(&dir);

        engine
            .sync_notes("alice", vec![input("n1", "first", Some(100))])
            .unwrap();
        engine
            .sync_notes("alice", vec![input("n1", "late arrival", Some(50))])
            .unwrap();

        let note = engine.get_note("alice", "n1").unwrap().unwrap();
        assert_eq!(note.body, "first");
        assert_eq!(note.last_modified, 100);
    }

    #[test]
    fn test_equal_timestamp_favors_latest_call() {
        let dir = tempdir().unwrap();
        let engine = engine(&dir);

        engine
            .sync_notes("alice", vec![input("n1", "first", Some(100))])
            .unwrap();
        engine
            .sync_notes("alice", vec![input("n1", "second", Some(100))])
            .unwrap();

        let note = engine.get_note("alice", "n1").unwrap().unwrap();
        assert_eq!(note.body, "second");
    }

    #[test]
    fn test_missing_timestamp_stamped_with_now() {
        let dir = tempdir().unwrap();
        let engine = engine(&dir);

        let before = Utc::now().timestamp_millis();
        engine
            .sync_notes("alice", vec![input("n1", "unstamped", None)])
            .unwrap();
        let after = Utc::now().timestamp_millis();

        let note = engine.get_note("alice", "n1").unwrap().unwrap();
        assert!(note.last_modified >= before && note.last_modified <= after);
    }

    #[test]
    fn test_batch_items_applied_in_input_order() {
        let dir = tempdir().unwrap();
        let engine = engine(&dir);

        engine
            .sync_notes(
                "alice",
                vec![
                    input("n1", "first", Some(100)),
                    input("n1", "second", Some(100)),
                ],
            )
            .unwrap();

        let note = engine.get_note("alice", "n1").unwrap().unwrap();
        assert_eq!(note.body, "second");
    }

    #[test]
    fn test_sync_omitting_terms_leaves_them() {
        let dir = tempdir().unwrap();
        let engine = engine(&dir);

        engine
            .sync(
                "alice",
                SyncRequest {
                    notes: vec![],
                    visibility_terms: Some(vec![VisibilityTerm {
                        term: "friends".to_string(),
                        emails: vec!["bob@x.com".to_string()],
                    }]),
                },
            )
            .unwrap();

        engine
            .sync(
                "alice",
                SyncRequest {
                    notes: vec![input("n1", "hi", Some(1))],
                    visibility_terms: None,
                },
            )
            .unwrap();
        assert_eq!(engine.list_visibility_terms("alice").unwrap().len(), 1);

        engine
            .sync(
                "alice",
                SyncRequest {
                    notes: vec![],
                    visibility_terms: Some(vec![]),
                },
            )
            .unwrap();
        assert!(engine.list_visibility_terms("alice").unwrap().is_empty());
    }

    #[test]
    fn test_terms_sanitized() {
        let dir = tempdir().unwrap();
        let engine = engine(&dir);

        engine
            .replace_visibility_terms(
                "alice",
                vec![VisibilityTerm {
                    term: " friends ".to_string(),
                    emails: vec![
                        "  Bob@X.com ".to_string(),
                        "bob@x.com".to_string(),
                        "not-an-email".to_string(),
                        "".to_string(),
                    ],
                }],
            )
            .unwrap();

        let terms = engine.list_visibility_terms("alice").unwrap();
        assert_eq!(terms.len(), 1);
        assert_eq!(terms[0].term, "friends");
        assert_eq!(terms[0].emails, vec!["bob@x.com".to_string()]);
    }

    #[test]
    fn test_duplicate_term_keeps_last() {
        let dir = tempdir().unwrap();
        let engine = engine(&dir);

        engine
            .replace_visibility_terms(
                "alice",
                vec![
                    VisibilityTerm {
                        term: "friends".to_string(),
                        emails: vec!["old@x.com".to_string()],
                    },
                    VisibilityTerm {
                        term: "friends".to_string(),
                        emails: vec!["new@x.com".to_string()],
                    },
                ],
            )
            .unwrap();

        let terms = engine.list_visibility_terms("alice").unwrap();
        assert_eq!(terms.len(), 1);
        assert_eq!(terms[0].emails, vec!["new@x.com".to_string()]);
    }

    #[test]
    fn test_list_notes_parses_rows() {
        let dir = tempdir().unwrap();
        let engine = engine(&dir);

        engine
            .sync_notes(
                "alice",
                vec![input("n1", &shared_doc("bob@x.com"), Some(100))],
            )
            .unwrap();

        let notes = engine.list_notes("alice").unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].id, "n1");
        assert_eq!(notes[0].body, "Body");
        assert_eq!(notes[0].last_modified, 100);
        assert!(notes[0].metadata.visibility.is_some());
    }

    #[test]
    fn test_find_shared_with_end_to_end() {
        let dir = tempdir().unwrap();
        let engine = engine(&dir);

        engine
            .sync_notes(
                "alice",
                vec![
                    input("a1", &shared_doc("bob@x.com"), Some(100)),
                    input("a2", "---\nvisibility: [friends]\n---\nmentions bob@x.com", Some(100)),
                    input("a3", "private note", Some(100)),
                ],
            )
            .unwrap();
        engine
            .sync_notes(
                "carol",
                vec![input("c1", &shared_doc("Bob@X.com"), Some(200))],
            )
            .unwrap();

        let shared = engine.find_shared_with("bob@x.com").unwrap();
        let ids: Vec<&str> = shared.iter().map(|n| n.id.as_str()).collect();
        // Carol's note is newer; Alice's a2 names the email but grants no
        // access, and a3 never reaches the parser at all.
        assert_eq!(ids, vec!["c1", "a1"]);
    }

    #[test]
    fn test_find_shared_with_blank_viewer() {
        let dir = tempdir().unwrap();
        let engine = engine(&dir);
        assert!(engine.find_shared_with("   ").unwrap().is_empty());
    }

    #[test]
    fn test_delete_note() {
        let dir = tempdir().unwrap();
        let engine = engine(&dir);

        engine
            .sync_notes("alice", vec![input("n1", "x", Some(1))])
            .unwrap();
        assert!(engine.delete_note("alice", "n1").unwrap());
        assert!(!engine.delete_note("alice", "n1").unwrap());
        assert!(engine.get_note("alice", "n1").unwrap().is_none());
    }
}
