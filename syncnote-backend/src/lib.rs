//! syncnote-backend - note synchronization and shared-visibility core.
//!
//! Synchronizes markdown notes across a user's devices with a
//! last-writer-wins merge keyed by client timestamps, and resolves, from
//! frontmatter metadata, which other users may view a note. The HTTP shell
//! (routing, sessions, CORS) lives outside this crate; it owns an
//! [`AppContext`] and calls into the [`sync::SyncEngine`].

pub mod config;
pub mod db;
pub mod models;
pub mod notes;
pub mod sharing;
pub mod sync;

use std::sync::Arc;

use config::Config;
use db::Database;
use sync::SyncEngine;

/// Lifecycle-scoped application context.
///
/// Constructed once at startup and passed down explicitly; nothing in this
/// crate holds process-wide mutable state.
pub struct AppContext {
    pub config: Config,
    pub db: Arc<Database>,
    pub sync: SyncEngine,
}

impl AppContext {
    pub fn initialize(config: Config) -> rusqlite::Result<Self> {
        let db = Arc::new(Database::new(&config.database_url)?);
        let sync = SyncEngine::new(db.clone());
        log::info!("[INIT] document store ready at {}", config.database_url);

        Ok(Self { config, db, sync })
    }
}
