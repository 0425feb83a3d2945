//! Visibility term rows - an owner's sharing groups, replaced wholesale.

use chrono::Utc;
use rusqlite::{params, Result as SqliteResult};

use super::super::Database;
use crate::models::VisibilityTerm;

impl Database {
    /// Replace every term the owner has with the given set:
    /// delete-all-then-insert in one transaction, so readers never observe
    /// a half-applied set. An empty set therefore clears the owner's terms.
    pub fn replace_visibility_terms(
        &self,
        owner: &str,
        terms: &[VisibilityTerm],
    ) -> SqliteResult<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        let now = Utc::now().to_rfc3339();

        tx.execute("DELETE FROM visibility_terms WHERE owner = ?1", [owner])?;

        for term in terms {
            let emails =
                serde_json::to_string(&term.emails).unwrap_or_else(|_| "[]".to_string());
            tx.execute(
                "INSERT OR REPLACE INTO visibility_terms (owner, term, emails, updated_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![owner, term.term, emails, &now],
            )?;
        }

        tx.commit()
    }

    /// List an owner's terms, alphabetical.
    pub fn list_visibility_terms(&self, owner: &str) -> SqliteResult<Vec<VisibilityTerm>> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn.prepare(
            "SELECT term, emails FROM visibility_terms WHERE owner = ?1 ORDER BY term ASC",
        )?;

        let terms = stmt
            .query_map([owner], |row| {
                let term: String = row.get(0)?;
                let emails_json: String = row.get(1)?;
                Ok((term, emails_json))
            })?
            .filter_map(|r| match r {
                Ok(pair) => Some(pair),
                Err(e) => {
                    log::warn!("[TERMS] skipping unreadable term row: {}", e);
                    None
                }
            })
            .map(|(term, emails_json)| {
                let emails = serde_json::from_str(&emails_json).unwrap_or_else(|e| {
                    log::warn!("[TERMS] bad email list stored for '{}': {}", term, e);
                    Vec::new()
                });
                VisibilityTerm { term, emails }
            })
            .collect();

        Ok(terms)
    }
}
