use std::env;

/// Environment variable names - single source of truth
pub mod env_vars {
    pub const PORT: &str = "SYNC_PORT";
    pub const DATABASE_URL: &str = "DATABASE_URL";
}

/// Default values
pub mod defaults {
    pub const PORT: u16 = 8080;
    pub const DATABASE_URL: &str = "./.db/syncnote.db";
}

#[derive(Clone, Debug)]
pub struct Config {
    /// Port the shell binds; carried here so the whole runtime config lives
    /// in one place.
    pub port: u16,
    /// Path to the SQLite document store.
    pub database_url: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            port: env::var(env_vars::PORT)
                .unwrap_or_else(|_| defaults::PORT.to_string())
                .parse()
                .expect("SYNC_PORT must be a valid number"),
            database_url: env::var(env_vars::DATABASE_URL)
                .unwrap_or_else(|_| defaults::DATABASE_URL.to_string()),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: defaults::PORT,
            database_url: defaults::DATABASE_URL.to_string(),
        }
    }
}
