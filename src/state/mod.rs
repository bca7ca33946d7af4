//! Persistent [`StateStore`](crate::traits::StateStore) backends.
//!
//! All cross-invocation memory of tiletoggle lives here: the process itself
//! handles one command and exits.  [`SqliteStore`] keeps the three
//! collections in a small SQLite database that every invocation opens.

pub mod schema;
pub mod sqlite;

pub use sqlite::SqliteStore;

use std::path::PathBuf;

/// Errors produced by a state store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// A write addressed a name that has no tracked id.
    #[error("window '{0}' is not tracked")]
    NotTracked(String),
    /// The name or kind cannot be tracked.
    #[error("cannot track '{name}' as a {kind} window")]
    NotTrackable { name: String, kind: String },
}

/// Default database location (`$XDG_STATE_HOME/tiletoggle/state.db`).
pub fn default_path() -> PathBuf {
    let base = std::env::var("XDG_STATE_HOME").unwrap_or_else(|_| {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        format!("{}/.local/state", home)
    });
    PathBuf::from(base).join("tiletoggle").join("state.db")
}
