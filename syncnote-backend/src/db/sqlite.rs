//! SQLite-backed document store.
//!
//! One connection behind a mutex; table operations live in `tables/`, one
//! module per table. The conditional-upsert semantics the merge policy
//! relies on are enforced here, at the storage boundary.

use rusqlite::{Connection, Result as SqliteResult};
use std::path::Path;
use std::sync::Mutex;

pub struct Database {
    pub(crate) conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) the database file and ensure the schema exists.
    pub fn new(database_url: &str) -> SqliteResult<Self> {
        if let Some(parent) = Path::new(database_url).parent() {
            std::fs::create_dir_all(parent).ok();
        }

        let conn = Connection::open(database_url)?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.create_tables()?;

        Ok(db)
    }

    fn create_tables(&self) -> SqliteResult<()> {
        let conn = self.conn.lock().unwrap();

        // Note ids are only unique per owner; the composite key is the
        // identity the sync predicate is evaluated against.
        conn.execute(
            "CREATE TABLE IF NOT EXISTS notes (
                owner TEXT NOT NULL,
                id TEXT NOT NULL,
                markdown TEXT NOT NULL,
                source_name TEXT,
                last_modified INTEGER NOT NULL,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (owner, id)
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS visibility_terms (
                owner TEXT NOT NULL,
                term TEXT NOT NULL,
                emails TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (owner, term)
            )",
            [],
        )?;

        Ok(())
    }
}
