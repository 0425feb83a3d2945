//! Note row operations - conditional last-writer-wins upsert, listing, and
//! the discovery pre-filter scan.

use chrono::Utc;
use rusqlite::{params, Result as SqliteResult};

use super::super::Database;
use crate::models::{CandidateRow, NoteRow};

impl Database {
    /// Upsert a note row, applying the write only when the incoming
    /// timestamp is not older than the stored one. Returns whether the row
    /// was written. Evaluation is atomic per row: the predicate and the
    /// update are one statement.
    pub fn conditional_upsert_note(
        &self,
        owner: &str,
        id: &str,
        markdown: &str,
        source_name: Option<&str>,
        last_modified: i64,
    ) -> SqliteResult<bool> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now().to_rfc3339();

        let changed = conn.execute(
            "INSERT INTO notes (owner, id, markdown, source_name, last_modified, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(owner, id) DO UPDATE SET
                 markdown = excluded.markdown,
                 source_name = excluded.source_name,
                 last_modified = excluded.last_modified,
                 updated_at = excluded.updated_at
             WHERE excluded.last_modified >= notes.last_modified",
            params![owner, id, markdown, source_name, last_modified, &now],
        )?;

        Ok(changed > 0)
    }

    /// List an owner's notes, newest first; the server-side update time
    /// breaks client-timestamp ties.
    pub fn list_notes_by_owner(&self, owner: &str) -> SqliteResult<Vec<NoteRow>> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn.prepare(
            "SELECT id, markdown, source_name, last_modified FROM notes
             WHERE owner = ?1
             ORDER BY last_modified DESC, updated_at DESC",
        )?;

        let rows = stmt
            .query_map([owner], |row| {
                Ok(NoteRow {
                    id: row.get(0)?,
                    markdown: row.get(1)?,
                    source_name: row.get(2)?,
                    last_modified: row.get(3)?,
                })
            })?
            .filter_map(|r| match r {
                Ok(row) => Some(row),
                Err(e) => {
                    log::warn!("[NOTES] skipping unreadable note row: {}", e);
                    None
                }
            })
            .collect();

        Ok(rows)
    }

    /// Fetch a single note row.
    pub fn get_note(&self, owner: &str, id: &str) -> SqliteResult<Option<NoteRow>> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn.prepare(
            "SELECT id, markdown, source_name, last_modified FROM notes
             WHERE owner = ?1 AND id = ?2",
        )?;

        let row = stmt
            .query_row(params![owner, id], |row| {
                Ok(NoteRow {
                    id: row.get(0)?,
                    markdown: row.get(1)?,
                    source_name: row.get(2)?,
                    last_modified: row.get(3)?,
                })
            })
            .ok();

        Ok(row)
    }

    /// Delete a note row. Returns whether a row existed.
    pub fn delete_note(&self, owner: &str, id: &str) -> SqliteResult<bool> {
        let conn = self.conn.lock().unwrap();
        let rows_affected = conn.execute(
            "DELETE FROM notes WHERE owner = ?1 AND id = ?2",
            params![owner, id],
        )?;
        Ok(rows_affected > 0)
    }

    /// Coarse discovery pre-filter: every row, across owners, whose raw
    /// document contains the needle (case-insensitive). Not an access
    /// decision - the visibility resolver makes that call on the parsed
    /// records.
    pub fn scan_candidates_containing(&self, needle: &str) -> SqliteResult<Vec<CandidateRow>> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn.prepare(
            "SELECT owner, id, markdown, source_name, last_modified FROM notes
             WHERE instr(lower(markdown), lower(?1)) > 0
             ORDER BY last_modified DESC, updated_at DESC",
        )?;

        let rows = stmt
            .query_map([needle], |row| {
                Ok(CandidateRow {
                    owner: row.get(0)?,
                    id: row.get(1)?,
                    markdown: row.get(2)?,
                    source_name: row.get(3)?,
                    last_modified: row.get(4)?,
                })
            })?
            .filter_map(|r| match r {
                Ok(row) => Some(row),
                Err(e) => {
                    log::warn!("[NOTES] skipping unreadable candidate row: {}", e);
                    None
                }
            })
            .collect();

        Ok(rows)
    }
}
